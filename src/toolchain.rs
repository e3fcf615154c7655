//! MFT toolchain abstraction — enables test doubles for all `fte*` commands.
//!
//! The trait has one method per toolchain operation the supervisor drives.
//! The production implementation resolves every command on PATH up front
//! (a missing command is fatal before any setup step runs) and invokes them
//! through a [`CommandRunner`] with `BFG_DATA` set in the child environment.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::Result;

use crate::command_runner::CommandRunner;
use crate::config::{AgentSettings, QmgrSettings};
use crate::error::ToolchainError;

// ── Command names ────────────────────────────────────────────────────────────

pub const SETUP_COORDINATION: &str = "fteSetupCoordination";
pub const SETUP_COMMANDS: &str = "fteSetupCommands";
pub const CREATE_AGENT: &str = "fteCreateAgent";
pub const CREATE_BRIDGE_AGENT: &str = "fteCreateBridgeAgent";
pub const START_AGENT: &str = "fteStartAgent";
pub const STOP_AGENT: &str = "fteStopAgent";
pub const LIST_AGENTS: &str = "fteListAgents";
pub const PING_AGENT: &str = "ftePingAgent";
pub const CREATE_MONITOR: &str = "fteCreateMonitor";

/// Environment variable the toolchain reads to locate its data directory.
pub const DATA_PATH_ENV: &str = "BFG_DATA";

// ── Trait ────────────────────────────────────────────────────────────────────

/// Abstraction over the MFT command suite, enabling test doubles.
///
/// Every method returns the raw captured [`Output`]; interpreting exit
/// status and output text is the caller's job. An `Err` always means the
/// command could not be launched.
#[allow(async_fn_in_trait)]
pub trait Toolchain {
    /// Run `fteSetupCoordination` for the coordination queue manager.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned.
    async fn setup_coordination(&self, coordination: &QmgrSettings) -> Result<Output>;

    /// Run `fteSetupCommands` scoped to the coordination queue manager.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned.
    async fn setup_commands(
        &self,
        coordination_name: &str,
        commands: &QmgrSettings,
    ) -> Result<Output>;

    /// Run `fteCreateAgent` for a standard agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned.
    async fn create_standard_agent(
        &self,
        coordination_name: &str,
        agent: &AgentSettings,
    ) -> Result<Output>;

    /// Run `fteCreateBridgeAgent`, composing bridge parameters from the
    /// agent's configuration. Optional parameters that are absent from the
    /// configuration are omitted, never passed as empty strings.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned.
    async fn create_bridge_agent(
        &self,
        coordination_name: &str,
        agent: &AgentSettings,
    ) -> Result<Output>;

    /// Run `fteStartAgent -p <coordination> <agent>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned.
    async fn start_agent(&self, coordination_name: &str, agent_name: &str) -> Result<Output>;

    /// Run `fteStopAgent -p <coordination> <agent> -i` (immediate stop).
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned.
    async fn stop_agent_immediate(
        &self,
        coordination_name: &str,
        agent_name: &str,
    ) -> Result<Output>;

    /// Run `fteListAgents -p <coordination> <agent>` to query status.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned.
    async fn agent_status(&self, coordination_name: &str, agent_name: &str) -> Result<Output>;

    /// Run `ftePingAgent -p <commandsQMgr> <agent>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned.
    async fn ping_agent(&self, commands_qmgr_name: &str, agent_name: &str) -> Result<Output>;

    /// Run `fteCreateMonitor` for one resource monitor definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned.
    async fn create_monitor(
        &self,
        coordination_name: &str,
        agent_qmgr_name: &str,
        agent_name: &str,
        monitor_name: &str,
        watch_dir: &str,
    ) -> Result<Output>;
}

// ── Resolution ───────────────────────────────────────────────────────────────

/// Absolute paths of every toolchain command, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ToolchainPaths {
    setup_coordination: PathBuf,
    setup_commands: PathBuf,
    create_agent: PathBuf,
    create_bridge_agent: PathBuf,
    start_agent: PathBuf,
    stop_agent: PathBuf,
    list_agents: PathBuf,
    ping_agent: PathBuf,
    create_monitor: PathBuf,
}

impl ToolchainPaths {
    /// Resolve all nine commands on PATH.
    ///
    /// # Errors
    ///
    /// Returns `ToolchainError::CommandNotFound` for the first command that
    /// cannot be located. The whole toolchain is an all-or-nothing
    /// installation; a partial one aborts the supervisor before any setup
    /// step runs.
    pub fn resolve() -> Result<Self, ToolchainError> {
        Ok(Self {
            setup_coordination: find(SETUP_COORDINATION)?,
            setup_commands: find(SETUP_COMMANDS)?,
            create_agent: find(CREATE_AGENT)?,
            create_bridge_agent: find(CREATE_BRIDGE_AGENT)?,
            start_agent: find(START_AGENT)?,
            stop_agent: find(STOP_AGENT)?,
            list_agents: find(LIST_AGENTS)?,
            ping_agent: find(PING_AGENT)?,
            create_monitor: find(CREATE_MONITOR)?,
        })
    }
}

fn find(name: &'static str) -> Result<PathBuf, ToolchainError> {
    which::which(name).map_err(|source| ToolchainError::CommandNotFound { name, source })
}

// ── Argument builders ────────────────────────────────────────────────────────

fn push_flag(args: &mut Vec<String>, flag: &str, value: &str) {
    args.push(flag.to_string());
    args.push(value.to_string());
}

fn push_opt(args: &mut Vec<String>, flag: &str, value: Option<&String>) {
    if let Some(v) = value {
        push_flag(args, flag, v);
    }
}

/// Arguments for `fteSetupCoordination`.
#[must_use]
pub fn setup_coordination_args(coordination: &QmgrSettings) -> Vec<String> {
    let mut args = Vec::new();
    push_flag(&mut args, "-coordinationQMgr", &coordination.name);
    push_opt(&mut args, "-coordinationQMgrHost", coordination.host.as_ref());
    push_opt(&mut args, "-coordinationQMgrPort", coordination.port.as_ref());
    push_opt(
        &mut args,
        "-coordinationQMgrChannel",
        coordination.channel.as_ref(),
    );
    args.push("-f".to_string());
    args
}

/// Arguments for `fteSetupCommands`.
#[must_use]
pub fn setup_commands_args(coordination_name: &str, commands: &QmgrSettings) -> Vec<String> {
    let mut args = Vec::new();
    push_flag(&mut args, "-p", coordination_name);
    push_flag(&mut args, "-connectionQMgr", &commands.name);
    push_opt(&mut args, "-connectionQMgrHost", commands.host.as_ref());
    push_opt(&mut args, "-connectionQMgrPort", commands.port.as_ref());
    push_opt(&mut args, "-connectionQMgrChannel", commands.channel.as_ref());
    args.push("-f".to_string());
    args
}

/// Base arguments shared by both create-agent variants.
fn agent_base_args(coordination_name: &str, agent: &AgentSettings) -> Vec<String> {
    let mut args = Vec::new();
    push_flag(&mut args, "-p", coordination_name);
    push_flag(&mut args, "-agentName", &agent.name);
    push_flag(&mut args, "-agentQMgr", &agent.qmgr_name);
    push_opt(&mut args, "-agentQMgrHost", agent.qmgr_host.as_ref());
    push_opt(&mut args, "-agentQMgrPort", agent.qmgr_port.as_ref());
    push_opt(&mut args, "-agentQMgrChannel", agent.qmgr_channel.as_ref());
    push_flag(&mut args, "-credentialsFile", &agent.credentials_file);
    args
}

/// Arguments for `fteCreateAgent` (standard agent).
#[must_use]
pub fn standard_agent_args(coordination_name: &str, agent: &AgentSettings) -> Vec<String> {
    let mut args = agent_base_args(coordination_name, agent);
    args.push("-f".to_string());
    args
}

/// Arguments for `fteCreateBridgeAgent`.
///
/// Server type defaults to `FTP` and server host to `localhost` when unset.
/// The server locale is only meaningful for FTP-family servers; it is
/// omitted when the effective server type is `SFTP` even if configured.
#[must_use]
pub fn bridge_agent_args(coordination_name: &str, agent: &AgentSettings) -> Vec<String> {
    let bridge = &agent.bridge;
    let server_type = bridge.server_type.as_deref().unwrap_or("FTP");
    let server_host = bridge.server_host.as_deref().unwrap_or("localhost");

    let mut args = agent_base_args(coordination_name, agent);
    push_flag(&mut args, "-bt", server_type);
    push_flag(&mut args, "-bh", server_host);
    push_opt(&mut args, "-btz", bridge.server_timezone.as_ref());
    push_opt(&mut args, "-bm", bridge.server_platform.as_ref());
    if server_type != "SFTP" {
        push_opt(&mut args, "-bsl", bridge.server_locale.as_ref());
    }
    push_opt(&mut args, "-bfe", bridge.server_file_encoding.as_ref());
    push_opt(&mut args, "-bp", bridge.server_port.as_ref());
    push_opt(&mut args, "-bts", bridge.server_trust_store_file.as_ref());
    push_opt(&mut args, "-blw", bridge.server_limited_write.as_ref());
    push_opt(&mut args, "-blf", bridge.server_list_format.as_ref());
    args.push("-f".to_string());
    args
}

/// Arguments for `fteCreateMonitor`.
#[must_use]
pub fn create_monitor_args(
    coordination_name: &str,
    agent_qmgr_name: &str,
    agent_name: &str,
    monitor_name: &str,
    watch_dir: &str,
) -> Vec<String> {
    let mut args = Vec::new();
    push_flag(&mut args, "-p", coordination_name);
    push_flag(&mut args, "-mm", agent_qmgr_name);
    push_flag(&mut args, "-ma", agent_name);
    push_flag(&mut args, "-mn", monitor_name);
    push_flag(&mut args, "-ix", watch_dir);
    args.push("-f".to_string());
    args
}

// ── Production implementation ────────────────────────────────────────────────

/// Production toolchain — shells out to the resolved `fte*` binaries.
pub struct FteCli<R> {
    runner: R,
    paths: ToolchainPaths,
    data_path: String,
}

impl<R: CommandRunner> FteCli<R> {
    pub fn new(runner: R, paths: ToolchainPaths, data_path: impl Into<String>) -> Self {
        Self {
            runner,
            paths,
            data_path: data_path.into(),
        }
    }

    async fn run(&self, program: &Path, args: &[String]) -> Result<Output> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.runner
            .run(program, &args, &[(DATA_PATH_ENV, &self.data_path)])
            .await
    }
}

impl<R: CommandRunner> Toolchain for FteCli<R> {
    async fn setup_coordination(&self, coordination: &QmgrSettings) -> Result<Output> {
        let args = setup_coordination_args(coordination);
        self.run(&self.paths.setup_coordination, &args).await
    }

    async fn setup_commands(
        &self,
        coordination_name: &str,
        commands: &QmgrSettings,
    ) -> Result<Output> {
        let args = setup_commands_args(coordination_name, commands);
        self.run(&self.paths.setup_commands, &args).await
    }

    async fn create_standard_agent(
        &self,
        coordination_name: &str,
        agent: &AgentSettings,
    ) -> Result<Output> {
        let args = standard_agent_args(coordination_name, agent);
        self.run(&self.paths.create_agent, &args).await
    }

    async fn create_bridge_agent(
        &self,
        coordination_name: &str,
        agent: &AgentSettings,
    ) -> Result<Output> {
        let args = bridge_agent_args(coordination_name, agent);
        self.run(&self.paths.create_bridge_agent, &args).await
    }

    async fn start_agent(&self, coordination_name: &str, agent_name: &str) -> Result<Output> {
        let args = vec![
            "-p".to_string(),
            coordination_name.to_string(),
            agent_name.to_string(),
        ];
        self.run(&self.paths.start_agent, &args).await
    }

    async fn stop_agent_immediate(
        &self,
        coordination_name: &str,
        agent_name: &str,
    ) -> Result<Output> {
        let args = vec![
            "-p".to_string(),
            coordination_name.to_string(),
            agent_name.to_string(),
            "-i".to_string(),
        ];
        self.run(&self.paths.stop_agent, &args).await
    }

    async fn agent_status(&self, coordination_name: &str, agent_name: &str) -> Result<Output> {
        let args = vec![
            "-p".to_string(),
            coordination_name.to_string(),
            agent_name.to_string(),
        ];
        self.run(&self.paths.list_agents, &args).await
    }

    async fn ping_agent(&self, commands_qmgr_name: &str, agent_name: &str) -> Result<Output> {
        let args = vec![
            "-p".to_string(),
            commands_qmgr_name.to_string(),
            agent_name.to_string(),
        ];
        self.run(&self.paths.ping_agent, &args).await
    }

    async fn create_monitor(
        &self,
        coordination_name: &str,
        agent_qmgr_name: &str,
        agent_name: &str,
        monitor_name: &str,
        watch_dir: &str,
    ) -> Result<Output> {
        let args = create_monitor_args(
            coordination_name,
            agent_qmgr_name,
            agent_name,
            monitor_name,
            watch_dir,
        );
        self.run(&self.paths.create_monitor, &args).await
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
