//! Agent start and readiness confirmation.

use std::time::Duration;

use anyhow::{Context as _, Result};

use crate::command_runner::{command_failed, stdout_text};
use crate::config::AgentConfiguration;
use crate::output::{OutputContext, progress};
use crate::status::{self, AgentStatus};
use crate::toolchain::Toolchain;

/// Grace period before the single status re-check. Agent bring-up is
/// asynchronous; the process often reports STOPPED for a few seconds after
/// a successful start command.
const STARTUP_GRACE: Duration = Duration::from_secs(10);

/// Start the agent and confirm it reached READY or ACTIVE.
///
/// Queries status once after the start command; a STOPPED result earns one
/// grace period and exactly one re-query. Anything short of READY/ACTIVE
/// after that is a startup failure.
///
/// # Errors
///
/// Returns an error if the start command or a status query fails, or if the
/// agent does not come up.
pub async fn start_and_confirm(
    tc: &impl Toolchain,
    cfg: &AgentConfiguration,
    out: &OutputContext,
) -> Result<AgentStatus> {
    out.info(&format!("Starting agent {}", cfg.agent.name));
    let output = tc
        .start_agent(&cfg.coordination.name, &cfg.agent.name)
        .await
        .context("running fteStartAgent")?;
    if !output.status.success() {
        return Err(command_failed("fteStartAgent", &output));
    }

    out.info(&format!("Verifying status of agent {}", cfg.agent.name));
    let mut agent_status = query_status(tc, cfg).await?;

    if agent_status == AgentStatus::Stopped {
        let pb = out
            .show_progress()
            .then(|| progress::spinner("agent not started yet, rechecking shortly..."));
        if pb.is_none() {
            out.info("Agent not started yet. Waiting before one status re-check.");
        }
        tokio::time::sleep(STARTUP_GRACE).await;
        if let Some(pb) = pb {
            progress::finish_ok(&pb, "grace period elapsed; rechecking agent status");
        }
        agent_status = query_status(tc, cfg).await?;
    }

    if agent_status.is_started() {
        out.success(&format!("Agent {} has started.", cfg.agent.name));
        Ok(agent_status)
    } else {
        anyhow::bail!(
            "agent {} did not reach READY or ACTIVE (last status: {agent_status:?})",
            cfg.agent.name
        )
    }
}

/// Create every configured resource monitor. Monitors are independent: a
/// failing one is reported and the sweep continues with the rest.
pub async fn provision_monitors(
    tc: &impl Toolchain,
    cfg: &AgentConfiguration,
    out: &OutputContext,
) {
    for (monitor_name, watch_dir) in &cfg.agent.resource_monitors {
        out.info(&format!("Creating resource monitor {monitor_name}"));
        let result = tc
            .create_monitor(
                &cfg.coordination.name,
                &cfg.agent.qmgr_name,
                &cfg.agent.name,
                monitor_name,
                watch_dir,
            )
            .await;
        match result {
            Ok(output) if output.status.success() => {}
            Ok(output) => out.error(&format!(
                "{:#}",
                command_failed("fteCreateMonitor", &output)
            )),
            Err(e) => out.error(&format!("fteCreateMonitor could not run: {e:#}")),
        }
    }
}

async fn query_status(tc: &impl Toolchain, cfg: &AgentConfiguration) -> Result<AgentStatus> {
    let output = tc
        .agent_status(&cfg.coordination.name, &cfg.agent.name)
        .await
        .context("running fteListAgents")?;
    if !output.status.success() {
        return Err(command_failed("fteListAgents", &output));
    }
    Ok(status::classify(&stdout_text(&output)))
}
