//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to
//! `anyhow::Error` via the `?` operator.

use thiserror::Error;

// ── Configuration errors ──────────────────────────────────────────────────────

/// Errors raised while validating the agent configuration document.
///
/// Validation runs before any toolchain command is resolved or invoked, so
/// a missing required setting never reaches the toolchain.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting '{0}' in the agent configuration document.")]
    MissingField(&'static str),
}

// ── Toolchain errors ──────────────────────────────────────────────────────────

/// Errors related to locating the external MFT command suite.
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("Required command '{name}' was not found on PATH. Is the MFT toolchain installed?")]
    CommandNotFound {
        name: &'static str,
        #[source]
        source: which::Error,
    },
}
