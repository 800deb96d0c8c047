//! Playbook lifecycle callbacks.
//!
//! The host execution engine drives a flat set of lifecycle hooks; a stdout
//! callback decides, per event, whether to render anything. The contract is a
//! capability trait with one method per event and no-op defaults, so a plugin
//! only implements the events it cares about.

pub mod review;

pub use review::ReviewCallback;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message payload of a runner result.
///
/// `debug` tasks may carry either a single string or a list of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DebugPayload {
    /// A single message line
    Line(String),
    /// A list of message lines, rendered one per line
    Lines(Vec<String>),
}

impl DebugPayload {
    /// Iterates over the payload as individual lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        match self {
            DebugPayload::Line(line) => std::slice::from_ref(line),
            DebugPayload::Lines(lines) => lines.as_slice(),
        }
        .iter()
        .map(String::as_str)
    }

    /// Joins the payload into one string.
    pub fn to_text(&self) -> String {
        match self {
            DebugPayload::Line(line) => line.clone(),
            DebugPayload::Lines(lines) => lines.join("\n"),
        }
    }
}

/// Result of one task on one host, as delivered by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerResult {
    /// Host the task ran on
    pub host: String,
    /// Name of the task
    pub task_name: String,
    /// Fully qualified or short action name (e.g. `debug`)
    pub action: String,
    /// Message payload, if the module produced one
    #[serde(default)]
    pub msg: Option<DebugPayload>,
    /// Captured stderr, if any
    #[serde(default)]
    pub stderr: Option<String>,
}

impl RunnerResult {
    /// Whether this result came from a debug task.
    pub fn is_debug(&self) -> bool {
        matches!(self.action.as_str(), "debug" | "ansible.builtin.debug")
    }

    /// Failure text: the message, falling back to captured stderr.
    pub fn failure_text(&self) -> String {
        match &self.msg {
            Some(payload) => payload.to_text(),
            None => self.stderr.clone().unwrap_or_default(),
        }
    }
}

/// Per-host counters for the final recap.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HostSummary {
    /// Successful tasks
    pub ok: u32,
    /// Tasks that made changes
    pub changed: u32,
    /// Unreachable attempts
    pub unreachable: u32,
    /// Failed tasks
    pub failures: u32,
    /// Skipped tasks
    pub skipped: u32,
}

impl HostSummary {
    /// Whether this host should be recapped in the error style.
    pub fn has_failures(&self) -> bool {
        self.failures > 0 || self.unreachable > 0
    }
}

/// Aggregated statistics passed at finalization.
///
/// Hosts iterate in sorted order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Counters per processed host
    pub hosts: BTreeMap<String, HostSummary>,
}

/// Lifecycle hooks invoked by the host execution engine.
///
/// Every method defaults to a no-op; implementors override only the events
/// they render.
#[async_trait]
pub trait PlaybookCallback: Send + Sync {
    /// Called when a play starts.
    async fn on_play_start(&self, name: &str) {
        let _ = name;
    }

    /// Called when a task starts.
    async fn on_task_start(&self, name: &str, is_conditional: bool) {
        let _ = (name, is_conditional);
    }

    /// Called when a task succeeds on a host.
    async fn on_runner_ok(&self, result: &RunnerResult) {
        let _ = result;
    }

    /// Called when a task fails on a host.
    async fn on_runner_failed(&self, result: &RunnerResult, ignore_errors: bool) {
        let _ = (result, ignore_errors);
    }

    /// Called when a task is skipped on a host.
    async fn on_runner_skipped(&self, result: &RunnerResult) {
        let _ = result;
    }

    /// Called when a host is unreachable.
    async fn on_runner_unreachable(&self, result: &RunnerResult) {
        let _ = result;
    }

    /// Called once at the end with aggregated statistics.
    async fn on_stats(&self, stats: &RunStats) {
        let _ = stats;
    }

    /// Called when a file is included.
    async fn on_include(&self, included_file: &str) {
        let _ = included_file;
    }

    /// Called when no hosts matched the play pattern.
    async fn on_no_hosts_matched(&self) {}

    /// Called when no hosts remain to run on.
    async fn on_no_hosts_remaining(&self) {}
}
