//! End-to-end supervision flow.
//!
//! Wires the pipeline together: resolve the toolchain, provision (unless
//! start-only), start and confirm the agent, then run the monitoring loop
//! concurrently with the signal listener and the log tailer until the
//! operator stops the agent or the agent stops answering.

use std::pin::pin;
use std::sync::Arc;

use anyhow::Result;

use crate::command_runner::{TokioCommandRunner, command_failed};
use crate::config::AgentConfiguration;
use crate::logtail;
use crate::monitor::{PollOutcome, StatusPoller};
use crate::output::OutputContext;
use crate::paths;
use crate::setup;
use crate::shutdown::{self, ShutdownFlag};
use crate::startup;
use crate::toolchain::{FteCli, Toolchain, ToolchainPaths};

/// Run the supervisor with the production toolchain.
///
/// # Errors
///
/// Returns an error on toolchain resolution, provisioning, startup, or
/// monitoring failure. Returns `Ok` only after an operator-requested
/// shutdown completes.
pub async fn run(cfg: &AgentConfiguration, start_only: bool, out: &OutputContext) -> Result<()> {
    let tc_paths = ToolchainPaths::resolve()?;
    let toolchain = FteCli::new(TokioCommandRunner, tc_paths, cfg.data_path.clone());
    run_with(&toolchain, cfg, start_only, out).await
}

/// Supervision flow over an abstract toolchain.
///
/// # Errors
///
/// See [`run`].
pub async fn run_with(
    toolchain: &impl Toolchain,
    cfg: &AgentConfiguration,
    start_only: bool,
    out: &OutputContext,
) -> Result<()> {
    provision_and_start(toolchain, cfg, start_only, out).await?;

    out.info(&format!("Starting to monitor status of agent {}", cfg.agent.name));
    let flag = Arc::new(ShutdownFlag::new());

    let tail = cfg.show_agent_logs.then(|| {
        let log_path =
            paths::agent_output_log(&cfg.data_path, &cfg.coordination.name, &cfg.agent.name);
        tokio::spawn(logtail::tail_log(
            log_path,
            cfg.display_line_count,
            Arc::clone(&flag),
            Arc::new(out.clone()),
        ))
    });

    let mut poller = StatusPoller::new(toolchain, cfg, Arc::clone(&flag), out);
    let mut poll = pin!(poller.run());

    let outcome = tokio::select! {
        result = &mut poll => result?,
        signal = shutdown::wait_for_signal() => {
            let signal = signal?;
            out.info(&format!("Received {signal}. Stopping agent {}", cfg.agent.name));
            flag.request();
            // Stop command and draining poller run concurrently; each
            // invocation owns its own output buffers.
            let (stop_result, poll_result) = tokio::join!(
                toolchain.stop_agent_immediate(&cfg.coordination.name, &cfg.agent.name),
                &mut poll,
            );
            match stop_result {
                Ok(output) if output.status.success() => {
                    out.success(&format!("Stopped agent {}", cfg.agent.name));
                }
                Ok(output) => out.warn(&format!("{:#}", command_failed("fteStopAgent", &output))),
                Err(e) => out.warn(&format!("fteStopAgent could not run: {e:#}")),
            }
            poll_result?
        }
    };

    if let Some(handle) = tail {
        handle.abort();
    }

    match outcome {
        PollOutcome::ShutdownRequested => {
            out.success("Supervision ended at operator request.");
            Ok(())
        }
        PollOutcome::AgentUnresponsive => anyhow::bail!(
            "agent {} is no longer responding; supervision ended",
            cfg.agent.name
        ),
    }
}

/// The pre-monitoring phase: provisioning (unless start-only), startup
/// confirmation, resource monitors (unless start-only).
///
/// # Errors
///
/// Returns an error when provisioning or startup confirmation fails.
pub async fn provision_and_start(
    toolchain: &impl Toolchain,
    cfg: &AgentConfiguration,
    start_only: bool,
    out: &OutputContext,
) -> Result<()> {
    if start_only {
        out.info("Start-only mode: skipping agent provisioning.");
    } else {
        setup::run(toolchain, cfg, out).await?;
    }

    startup::start_and_confirm(toolchain, cfg, out).await?;

    if !start_only {
        startup::provision_monitors(toolchain, cfg, out).await;
    }
    Ok(())
}
