//! Liveness monitoring state machine.
//!
//! Polls agent status at a fixed interval, escalates an UNKNOWN status to a
//! ping probe, and ends supervision when the agent is confirmed
//! unresponsive or the operator requests shutdown. There is no backoff and
//! no automatic restart: unresponsiveness ends supervision.

use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::command_runner::{command_failed, stdout_text};
use crate::config::AgentConfiguration;
use crate::output::OutputContext;
use crate::shutdown::ShutdownFlag;
use crate::status::{self, AgentStatus};
use crate::toolchain::Toolchain;

/// Why the monitoring loop ended. Command failures (which could not run or
/// exited non-zero) surface as errors instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The shutdown flag was observed; clean stop.
    ShutdownRequested,
    /// The agent failed to answer a ping; it is no longer viable.
    AgentUnresponsive,
}

enum PollState {
    Polling,
    PingCheck,
    Sleeping,
    Terminated,
}

/// The monitoring loop and its working state. Owned by the supervisor task;
/// the shutdown handler only ever sets the shared flag.
pub struct StatusPoller<'a, T> {
    toolchain: &'a T,
    cfg: &'a AgentConfiguration,
    shutdown: Arc<ShutdownFlag>,
    out: &'a OutputContext,
    last_status: AgentStatus,
}

impl<'a, T: Toolchain> StatusPoller<'a, T> {
    pub fn new(
        toolchain: &'a T,
        cfg: &'a AgentConfiguration,
        shutdown: Arc<ShutdownFlag>,
        out: &'a OutputContext,
    ) -> Self {
        Self {
            toolchain,
            cfg,
            shutdown,
            out,
            last_status: AgentStatus::Other,
        }
    }

    /// Last status observed by the loop.
    #[must_use]
    pub fn last_status(&self) -> AgentStatus {
        self.last_status
    }

    /// Drive the state machine until shutdown or termination.
    ///
    /// # Errors
    ///
    /// Returns an error when a status query or ping probe cannot run or
    /// exits non-zero; both are unrecoverable for supervision.
    pub async fn run(&mut self) -> Result<PollOutcome> {
        let agent_name = &self.cfg.agent.name;
        let mut state = PollState::Polling;
        loop {
            state = match state {
                PollState::Polling => {
                    let output = self
                        .toolchain
                        .agent_status(&self.cfg.coordination.name, agent_name)
                        .await
                        .context("running fteListAgents")?;
                    if !output.status.success() {
                        return Err(command_failed("fteListAgents", &output));
                    }
                    self.last_status = status::classify(&stdout_text(&output));
                    if self.last_status == AgentStatus::Unknown {
                        self.out
                            .warn(&format!("Agent {agent_name} status unknown. Pinging the agent"));
                        PollState::PingCheck
                    } else {
                        self.out.info(&format!("Agent {agent_name} is running"));
                        PollState::Sleeping
                    }
                }
                PollState::PingCheck => {
                    let output = self
                        .toolchain
                        .ping_agent(&self.cfg.commands.name, agent_name)
                        .await
                        .context("running ftePingAgent")?;
                    if !output.status.success() {
                        return Err(command_failed("ftePingAgent", &output));
                    }
                    if status::ping_unresponsive(&stdout_text(&output)) {
                        PollState::Terminated
                    } else {
                        // Agent answered; the unknown status was transient.
                        PollState::Sleeping
                    }
                }
                PollState::Sleeping => {
                    if self.shutdown.is_requested() {
                        return Ok(PollOutcome::ShutdownRequested);
                    }
                    tokio::select! {
                        () = tokio::time::sleep(self.cfg.poll_interval) => {}
                        () = self.shutdown.requested() => {}
                    }
                    // Re-check so a shutdown that landed during the sleep
                    // exits without another status query.
                    if self.shutdown.is_requested() {
                        return Ok(PollOutcome::ShutdownRequested);
                    }
                    PollState::Polling
                }
                PollState::Terminated => {
                    self.out.error(&format!(
                        "Agent {agent_name} did not respond to ping. Ending supervision"
                    ));
                    return Ok(PollOutcome::AgentUnresponsive);
                }
            };
        }
    }
}
