//! Task model and the run/poll/tail workflow.

use std::io::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::resources::ProjectApi;
use crate::error::Result;

/// Statuses a task can never leave.
pub const TERMINAL_STATUSES: [&str; 4] = ["success", "error", "stopped", "rejected"];

/// Default poll interval in seconds.
pub const DEFAULT_POLL_SECS: u64 = 5;

/// Whether a task status is terminal.
pub fn is_terminal(status: &str) -> bool {
    TERMINAL_STATUSES.contains(&status)
}

/// One execution instance of a template.
///
/// Unknown fields are kept so the displayed object matches what the server
/// sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Task id
    pub id: i64,
    /// Template this task ran
    #[serde(default)]
    pub template_id: Option<i64>,
    /// Current lifecycle status
    #[serde(default)]
    pub status: String,
    /// Start timestamp, if started
    #[serde(default)]
    pub start: Option<String>,
    /// End timestamp, if finished
    #[serde(default)]
    pub end: Option<String>,
    /// Operator-supplied message
    #[serde(default)]
    pub message: Option<String>,
    /// Everything else the server reported
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Whether the task has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        is_terminal(&self.status)
    }

    /// Process exit code for a finished task: 0 for success, 2 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.status == "success" {
            0
        } else {
            2
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Payload for a task run request. Optional fields are omitted entirely when
/// unset, matching what the server expects.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunRequest {
    /// Template to run
    pub template_id: i64,
    /// Extra CLI arguments as a JSON array string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
    /// Task message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Debug mode
    #[serde(skip_serializing_if = "is_false")]
    pub debug: bool,
    /// Check mode
    #[serde(skip_serializing_if = "is_false")]
    pub dry_run: bool,
    /// Diff mode
    #[serde(skip_serializing_if = "is_false")]
    pub diff: bool,
    /// Host limit pattern
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
}

/// How to wait for a submitted task.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Fixed interval between polls
    pub poll_interval: Duration,
    /// Stream newly appended raw output to the sink while waiting
    pub tail: bool,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            tail: false,
        }
    }
}

/// Polls a task at a fixed interval until it reaches a terminal status.
///
/// Each iteration sleeps first, then re-fetches the task; when tailing, the
/// raw output is fetched too and only the suffix beyond the previously
/// observed length is written to `sink`. The loop is deliberately unbounded:
/// absent an external signal it runs until the task finishes.
pub async fn wait_for_task<W: Write + Send>(
    project: &ProjectApi<'_>,
    task_id: i64,
    options: &WaitOptions,
    sink: &mut W,
) -> Result<Task> {
    let mut seen_len = 0usize;
    loop {
        tokio::time::sleep(options.poll_interval).await;
        let task = project.task(task_id).await?;

        if options.tail {
            let raw = project.task_raw_output(task_id).await?;
            if raw.len() > seen_len {
                // A rewritten (non-append-only) log can leave the old
                // boundary inside a multi-byte character; skip the write and
                // resync instead of panicking on the slice.
                if let Some(suffix) = raw.get(seen_len..) {
                    sink.write_all(suffix.as_bytes())?;
                    sink.flush()?;
                }
                seen_len = raw.len();
            }
        }

        if task.is_finished() {
            return Ok(task);
        }
    }
}
