//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config;
use crate::output::OutputContext;
use crate::supervisor;

/// Provision and supervise an MQ managed file-transfer agent
#[derive(Parser)]
#[command(name = "stevedore", version, arg_required_else_help = true)]
pub struct Cli {
    /// Path to the agent configuration JSON document
    pub config: PathBuf,

    /// Start and supervise an already-provisioned agent (skip setup,
    /// agent creation, properties patch, and resource monitors)
    #[arg(long)]
    pub start_only: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

impl Cli {
    /// Execute the supervisor.
    ///
    /// # Errors
    ///
    /// Returns an error on configuration, toolchain resolution,
    /// provisioning, startup, or monitoring failure.
    pub async fn run(self) -> Result<()> {
        let out = OutputContext::new(self.no_color, self.quiet);
        let cfg = config::load(&self.config)?;
        out.kv("Configuration", &self.config.display().to_string());
        supervisor::run(&cfg, self.start_only, &out).await
    }
}
