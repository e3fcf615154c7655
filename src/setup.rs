//! The four-step provisioning pipeline.
//!
//! Steps run strictly in order; the first failure aborts the pipeline with
//! the command's captured output. There is no rollback — the toolchain's
//! setup commands are idempotent (`-f`), so the fix is to re-run.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::command_runner::command_failed;
use crate::config::{AgentConfiguration, AgentKind};
use crate::output::OutputContext;
use crate::paths;
use crate::toolchain::{self, Toolchain};

/// Run the full provisioning pipeline: coordination setup, commands setup,
/// agent creation, properties patch.
///
/// # Errors
///
/// Returns an error when any step cannot run or exits non-zero; earlier
/// steps are not rolled back.
pub async fn run(
    tc: &impl Toolchain,
    cfg: &AgentConfiguration,
    out: &OutputContext,
) -> Result<()> {
    out.info(&format!(
        "Setting up coordination configuration {} for agent {}",
        cfg.coordination.name, cfg.agent.name
    ));
    let output = tc
        .setup_coordination(&cfg.coordination)
        .await
        .context("running fteSetupCoordination")?;
    if !output.status.success() {
        return Err(command_failed(toolchain::SETUP_COORDINATION, &output));
    }

    out.info(&format!(
        "Setting up commands configuration {} for agent {}",
        cfg.commands.name, cfg.agent.name
    ));
    let output = tc
        .setup_commands(&cfg.coordination.name, &cfg.commands)
        .await
        .context("running fteSetupCommands")?;
    if !output.status.success() {
        return Err(command_failed(toolchain::SETUP_COMMANDS, &output));
    }

    let output = match cfg.agent.kind {
        AgentKind::Standard => {
            out.info(&format!("Creating standard agent {}", cfg.agent.name));
            tc.create_standard_agent(&cfg.coordination.name, &cfg.agent)
                .await
                .context("running fteCreateAgent")?
        }
        AgentKind::Bridge => {
            out.info(&format!("Creating protocol-bridge agent {}", cfg.agent.name));
            tc.create_bridge_agent(&cfg.coordination.name, &cfg.agent)
                .await
                .context("running fteCreateBridgeAgent")?
        }
    };
    if !output.status.success() {
        return Err(command_failed("create agent", &output));
    }

    let properties_file = paths::agent_properties(
        &cfg.data_path,
        &cfg.coordination.name,
        &cfg.agent.name,
    );
    append_properties(&properties_file, &cfg.agent.additional_properties)
        .context("patching agent.properties")?;

    out.success(&format!("Agent {} provisioned.", cfg.agent.name));
    Ok(())
}

/// Append every configured property as a `key=value` line. The file is
/// opened in append mode; existing content is never touched. Entries are
/// independent lines, so iteration order does not matter.
///
/// # Errors
///
/// Returns an error if the properties file cannot be opened or written.
pub fn append_properties(path: &Path, properties: &BTreeMap<String, String>) -> Result<()> {
    if properties.is_empty() {
        return Ok(());
    }
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open {} for append", path.display()))?;

    // Leading newline in case the existing file does not end with one.
    writeln!(file).with_context(|| format!("cannot write {}", path.display()))?;
    for (key, value) in properties {
        writeln!(file, "{key}={value}")
            .with_context(|| format!("cannot write {}", path.display()))?;
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
