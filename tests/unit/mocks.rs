//! Shared mock infrastructure for unit tests.
//!
//! Provides a scripted [`Toolchain`] double plus output helpers so each
//! test file doesn't have to re-define the same boilerplate.

#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Output};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use stevedore::config::{
    AgentConfiguration, AgentKind, AgentSettings, BridgeSettings, QmgrSettings,
};
use stevedore::toolchain::Toolchain;

// ── Output helpers ────────────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(stderr: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(1 << 8),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Configuration fixture ─────────────────────────────────────────────────────

/// A fully-populated, validated configuration for driving components.
pub fn test_config(kind: AgentKind) -> AgentConfiguration {
    AgentConfiguration {
        data_path: "/mftdata".to_string(),
        poll_interval: Duration::from_secs(60),
        show_agent_logs: false,
        display_line_count: 10,
        coordination: QmgrSettings {
            name: "COORDQM".to_string(),
            host: Some("coord.example".to_string()),
            port: Some("1414".to_string()),
            channel: Some("MFT.SVRCONN".to_string()),
        },
        commands: QmgrSettings {
            name: "CMDQM".to_string(),
            host: None,
            port: None,
            channel: None,
        },
        agent: AgentSettings {
            name: "SRC".to_string(),
            kind,
            qmgr_name: "AGENTQM".to_string(),
            qmgr_host: None,
            qmgr_port: None,
            qmgr_channel: None,
            credentials_file: "/mftdata/cred.xml".to_string(),
            bridge: BridgeSettings::default(),
            additional_properties: std::collections::BTreeMap::new(),
            resource_monitors: std::collections::BTreeMap::new(),
        },
    }
}

// ── Scripted toolchain ────────────────────────────────────────────────────────

/// Canned [`Toolchain`]: records every call, replays scripted status/ping
/// outputs, and optionally makes one named operation exit non-zero.
#[derive(Default)]
pub struct ScriptedToolchain {
    calls: Mutex<Vec<&'static str>>,
    status_script: Mutex<VecDeque<Output>>,
    ping_script: Mutex<VecDeque<Output>>,
    fail_step: Option<&'static str>,
}

impl ScriptedToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script successive `agent_status` outputs, oldest first.
    pub fn with_statuses(statuses: &[&str]) -> Self {
        let tc = Self::default();
        *tc.status_script.lock().expect("lock") =
            statuses.iter().map(|t| ok_output(t.as_bytes())).collect();
        tc
    }

    /// Script the next `ping_agent` output.
    #[must_use]
    pub fn with_ping(self, text: &str) -> Self {
        self.ping_script
            .lock()
            .expect("lock")
            .push_back(ok_output(text.as_bytes()));
        self
    }

    /// Make the named operation exit non-zero.
    #[must_use]
    pub fn failing(mut self, step: &'static str) -> Self {
        self.fail_step = Some(step);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|c| **c == name)
            .count()
    }

    fn exec(&self, name: &'static str) -> Output {
        self.calls.lock().expect("lock").push(name);
        if self.fail_step == Some(name) {
            err_output(b"simulated failure")
        } else {
            ok_output(b"")
        }
    }
}

impl Toolchain for ScriptedToolchain {
    async fn setup_coordination(&self, _: &QmgrSettings) -> Result<Output> {
        Ok(self.exec("setup_coordination"))
    }

    async fn setup_commands(&self, _: &str, _: &QmgrSettings) -> Result<Output> {
        Ok(self.exec("setup_commands"))
    }

    async fn create_standard_agent(&self, _: &str, _: &AgentSettings) -> Result<Output> {
        Ok(self.exec("create_standard_agent"))
    }

    async fn create_bridge_agent(&self, _: &str, _: &AgentSettings) -> Result<Output> {
        Ok(self.exec("create_bridge_agent"))
    }

    async fn start_agent(&self, _: &str, _: &str) -> Result<Output> {
        Ok(self.exec("start_agent"))
    }

    async fn stop_agent_immediate(&self, _: &str, _: &str) -> Result<Output> {
        Ok(self.exec("stop_agent_immediate"))
    }

    async fn agent_status(&self, _: &str, _: &str) -> Result<Output> {
        self.calls.lock().expect("lock").push("agent_status");
        if self.fail_step == Some("agent_status") {
            return Ok(err_output(b"simulated failure"));
        }
        Ok(self
            .status_script
            .lock()
            .expect("lock")
            .pop_front()
            .expect("status script exhausted"))
    }

    async fn ping_agent(&self, _: &str, _: &str) -> Result<Output> {
        self.calls.lock().expect("lock").push("ping_agent");
        if self.fail_step == Some("ping_agent") {
            return Ok(err_output(b"simulated failure"));
        }
        Ok(self
            .ping_script
            .lock()
            .expect("lock")
            .pop_front()
            .expect("ping script exhausted"))
    }

    async fn create_monitor(
        &self,
        _: &str,
        _: &str,
        _: &str,
        _: &str,
        _: &str,
    ) -> Result<Output> {
        Ok(self.exec("create_monitor"))
    }
}
