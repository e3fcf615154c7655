//! Bounded backlog and live follow of the agent's own output log.
//!
//! Runs as an independent task for the process lifetime. Strictly
//! read-only: the tailer surfaces what the agent writes, it never touches
//! agent state. A log file that cannot be opened degrades to a reported
//! error; monitoring continues without visible logs.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::output::OutputContext;
use crate::shutdown::ShutdownFlag;

/// Pause between read attempts once the follow loop reaches end-of-file.
const FOLLOW_RETRY: Duration = Duration::from_millis(250);

// ── Ring buffer ──────────────────────────────────────────────────────────────

/// Bounded FIFO of the most recent log lines, used for the initial backlog
/// dump before live follow takes over.
#[derive(Debug)]
pub struct LogRingBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogRingBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a line, evicting the oldest when at capacity.
    pub fn push(&mut self, line: String) {
        self.lines.push_back(line);
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate the buffered lines oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

// ── Tail task ────────────────────────────────────────────────────────────────

/// Tail the agent log at `path`: dump the last `backlog` lines once the
/// initial read catches up, then follow appended lines until shutdown.
pub async fn tail_log(
    path: PathBuf,
    backlog: usize,
    shutdown: Arc<ShutdownFlag>,
    out: Arc<OutputContext>,
) {
    let file = match File::open(&path).await {
        Ok(f) => f,
        Err(e) => {
            out.error(&format!("cannot open agent log {}: {e}", path.display()));
            return;
        }
    };
    let mut reader = BufReader::new(file);

    // Backlog: read to the current end of file, keeping the newest lines.
    let mut ring = LogRingBuffer::new(backlog);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => ring.push(strip_newline(&line).to_string()),
            Err(e) => {
                out.error(&format!("error reading agent log: {e}"));
                return;
            }
        }
    }

    out.header("───────────────────────── agent log ─────────────────────────");
    for buffered in ring.iter() {
        println!("{buffered}");
    }

    // Live follow. A read that ends without a newline is a partial line
    // still being written; keep accumulating until the newline arrives.
    line.clear();
    loop {
        match reader.read_line(&mut line).await {
            Ok(0) => {
                tokio::select! {
                    () = tokio::time::sleep(FOLLOW_RETRY) => {}
                    () = shutdown.requested() => return,
                }
            }
            Ok(_) => {
                if line.ends_with('\n') {
                    println!("{}", strip_newline(&line));
                    line.clear();
                }
            }
            Err(e) => {
                out.error(&format!("error reading agent log: {e}"));
                return;
            }
        }
    }
}

fn strip_newline(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

// ── Unit tests ───────────────────────────────────────────────────────────────
