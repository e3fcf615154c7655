//! Agent status classification from toolchain output.
//!
//! `fteListAgents` and `ftePingAgent` report free text, not a structured
//! format. The substrings below are the entire contract: everything the
//! supervisor decides about liveness flows through these two functions, so
//! they stay pure and isolated here.

/// Agent status inferred from the text of a status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    /// Agent process is not running.
    Stopped,
    /// Queue manager has not heard from the agent recently.
    Unknown,
    /// Agent is running and idle.
    Ready,
    /// Agent is running and processing transfers.
    Active,
    /// Anything unrecognized. Treated conservatively: keep polling.
    Other,
}

/// Message code emitted by `ftePingAgent` when the agent does not answer
/// within the ping timeout. Toolchain-contract data; do not re-derive.
pub const PING_NO_RESPONSE: &str = "BFGCL0214I";

/// Classify the output of a status query.
#[must_use]
pub fn classify(text: &str) -> AgentStatus {
    if text.contains("UNKNOWN") {
        AgentStatus::Unknown
    } else if text.contains("STOPPED") {
        AgentStatus::Stopped
    } else if text.contains("READY") {
        AgentStatus::Ready
    } else if text.contains("ACTIVE") {
        AgentStatus::Active
    } else {
        AgentStatus::Other
    }
}

/// Returns `true` when ping output signals that the agent did not respond.
#[must_use]
pub fn ping_unresponsive(text: &str) -> bool {
    text.contains(PING_NO_RESPONSE)
}

impl AgentStatus {
    /// Whether the agent counts as started for startup confirmation.
    #[must_use]
    pub fn is_started(self) -> bool {
        matches!(self, Self::Ready | Self::Active)
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
