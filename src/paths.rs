//! Filesystem layout of the MFT data directory.
//!
//! The toolchain lays agent state out under the data root by coordination
//! queue manager and agent name. These helpers are the only place that
//! layout is spelled out.

use std::path::PathBuf;

/// Path to the agent's properties file, patched during setup.
#[must_use]
pub fn agent_properties(data_path: &str, coordination_qmgr: &str, agent_name: &str) -> PathBuf {
    PathBuf::from(data_path)
        .join("mqft")
        .join("config")
        .join(coordination_qmgr)
        .join("agents")
        .join(agent_name)
        .join("agent.properties")
}

/// Path to the agent's rolling output log, tailed during monitoring.
#[must_use]
pub fn agent_output_log(data_path: &str, coordination_qmgr: &str, agent_name: &str) -> PathBuf {
    PathBuf::from(data_path)
        .join("mqft")
        .join("logs")
        .join(coordination_qmgr)
        .join("agents")
        .join(agent_name)
        .join("logs")
        .join("output0.log")
}
