//! Signal-driven shutdown signalling.
//!
//! A single [`ShutdownFlag`] is shared between the signal listener, the
//! status poller, and the log tailer. The listener sets it exactly once;
//! everyone else only reads it. The flag carries a notifier so sleeps can
//! be interrupted instead of running out their full interval.

use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tokio::sync::Notify;

/// Shutdown-requested flag, set once, observed cooperatively.
#[derive(Default)]
pub struct ShutdownFlag {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark shutdown as requested and wake every waiter.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is requested. Returns immediately if it already
    /// has been. The notified future is enabled before the flag re-check so
    /// a `request()` landing between the two cannot be missed.
    pub async fn requested(&self) {
        if self.is_requested() {
            return;
        }
        let mut notified = pin!(self.notify.notified());
        notified.as_mut().enable();
        if self.is_requested() {
            return;
        }
        notified.await;
    }
}

/// Wait for the first interrupt or termination signal. Returns the signal
/// name for operator reporting.
///
/// # Errors
///
/// Returns an error if the signal listeners cannot be installed.
#[cfg(unix)]
pub async fn wait_for_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt =
        signal(SignalKind::interrupt()).context("cannot listen for SIGINT")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("cannot listen for SIGTERM")?;

    tokio::select! {
        _ = interrupt.recv() => Ok("SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

/// Wait for Ctrl-C on platforms without unix signals.
///
/// # Errors
///
/// Returns an error if the signal listener cannot be installed.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("cannot listen for Ctrl-C")?;
    Ok("interrupt")
}
