//! Review stdout callback.
//!
//! Clean output for read-only audit playbooks where the debug output IS the
//! report: play names become section banners, debug msg content is printed
//! verbatim with no task header or ok prefix, failures and unreachable hosts
//! are always shown, and everything else is suppressed.

use std::io::{self, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use colored::Colorize;

use super::{PlaybookCallback, RunStats, RunnerResult};

const BANNER_WIDTH: usize = 60;

/// Stdout callback that shows only debug messages, failures and the recap.
pub struct ReviewCallback {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ReviewCallback {
    /// Creates a review callback writing to stdout.
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    /// Creates a review callback writing to the given sink.
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(writer),
        }
    }

    fn say(&self, line: &str) {
        let mut out = self.out.lock().expect("writer lock poisoned");
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }

    /// Formats a failure line: host, task name, and message or stderr.
    fn format_failure(result: &RunnerResult) -> String {
        format!(
            "FAILED [{}] {}: {}",
            result.host,
            result.task_name,
            result.failure_text()
        )
    }

    /// Formats one recap line for a host.
    fn format_stats_line(host: &str, summary: &super::HostSummary) -> String {
        format!(
            "{host} : ok={} changed={} unreachable={} failures={} skipped={}",
            summary.ok, summary.changed, summary.unreachable, summary.failures, summary.skipped
        )
    }
}

impl Default for ReviewCallback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybookCallback for ReviewCallback {
    /// Unnamed plays get no banner at all.
    async fn on_play_start(&self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        let bar = "=".repeat(BANNER_WIDTH);
        self.say(&format!("\n{}", bar.cyan().bold()));
        self.say(&format!("  {name}").cyan().bold().to_string());
        self.say(&bar.cyan().bold().to_string());
    }

    /// Debug msg content is printed verbatim, one line per list element.
    async fn on_runner_ok(&self, result: &RunnerResult) {
        if !result.is_debug() {
            return;
        }
        match &result.msg {
            Some(payload) => {
                for line in payload.lines() {
                    self.say(line);
                }
            }
            None => self.say(""),
        }
    }

    async fn on_runner_failed(&self, result: &RunnerResult, ignore_errors: bool) {
        if ignore_errors {
            return;
        }
        self.say(&Self::format_failure(result).red().to_string());
    }

    async fn on_runner_unreachable(&self, result: &RunnerResult) {
        let msg = result
            .msg
            .as_ref()
            .map(super::DebugPayload::to_text)
            .unwrap_or_default();
        self.say(&format!("UNREACHABLE [{}]: {msg}", result.host).red().to_string());
    }

    async fn on_stats(&self, stats: &RunStats) {
        self.say("");
        for (host, summary) in &stats.hosts {
            let line = Self::format_stats_line(host, summary);
            if summary.has_failures() {
                self.say(&line.red().to_string());
            } else {
                self.say(&line.green().to_string());
            }
        }
    }

    async fn on_no_hosts_matched(&self) {
        self.say(&"No hosts matched".yellow().to_string());
    }

    async fn on_no_hosts_remaining(&self) {
        self.say(&"No more hosts remaining".red().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{DebugPayload, HostSummary};
    use std::sync::Arc;

    /// Shared in-memory sink so the test can read what the callback wrote.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture() -> (ReviewCallback, SharedBuf) {
        // Keep assertions on plain text regardless of tty detection.
        colored::control::set_override(false);
        let buf = SharedBuf::default();
        let callback = ReviewCallback::with_writer(Box::new(buf.clone()));
        (callback, buf)
    }

    fn captured(buf: &SharedBuf) -> String {
        String::from_utf8(buf.0.lock().unwrap().clone()).unwrap()
    }

    fn debug_result(msg: DebugPayload) -> RunnerResult {
        RunnerResult {
            host: "web1".to_string(),
            task_name: "Report".to_string(),
            action: "debug".to_string(),
            msg: Some(msg),
            stderr: None,
        }
    }

    #[tokio::test]
    async fn list_payload_emits_one_line_per_element_in_order() {
        let (callback, buf) = capture();
        let lines = vec!["first".to_string(), "second".to_string(), "third".to_string()];
        callback
            .on_runner_ok(&debug_result(DebugPayload::Lines(lines)))
            .await;
        assert_eq!(captured(&buf), "first\nsecond\nthird\n");
    }

    #[tokio::test]
    async fn string_payload_emits_verbatim_without_prefix() {
        let (callback, buf) = capture();
        callback
            .on_runner_ok(&debug_result(DebugPayload::Line("disk ok: 42%".to_string())))
            .await;
        assert_eq!(captured(&buf), "disk ok: 42%\n");
    }

    #[tokio::test]
    async fn non_debug_ok_results_are_silent() {
        let (callback, buf) = capture();
        let mut result = debug_result(DebugPayload::Line("hidden".to_string()));
        result.action = "ansible.builtin.uri".to_string();
        callback.on_runner_ok(&result).await;
        assert_eq!(captured(&buf), "");
    }

    #[tokio::test]
    async fn ignorable_failure_produces_no_output() {
        let (callback, buf) = capture();
        let result = debug_result(DebugPayload::Line("boom".to_string()));
        callback.on_runner_failed(&result, true).await;
        assert_eq!(captured(&buf), "");
    }

    #[tokio::test]
    async fn failure_includes_host_task_and_message() {
        let (callback, buf) = capture();
        let result = RunnerResult {
            host: "db1".to_string(),
            task_name: "Dump schema".to_string(),
            action: "command".to_string(),
            msg: None,
            stderr: Some("mysqldump: access denied".to_string()),
        };
        callback.on_runner_failed(&result, false).await;
        let out = captured(&buf);
        assert!(out.contains("FAILED [db1]"));
        assert!(out.contains("Dump schema"));
        assert!(out.contains("mysqldump: access denied"));
    }

    #[tokio::test]
    async fn unreachable_line_names_host() {
        let (callback, buf) = capture();
        let result = RunnerResult {
            host: "pve3".to_string(),
            task_name: "Gathering Facts".to_string(),
            action: "gather_facts".to_string(),
            msg: Some(DebugPayload::Line("Connection refused".to_string())),
            stderr: None,
        };
        callback.on_runner_unreachable(&result).await;
        assert_eq!(captured(&buf), "UNREACHABLE [pve3]: Connection refused\n");
    }

    #[tokio::test]
    async fn unnamed_play_gets_no_banner() {
        let (callback, buf) = capture();
        callback.on_play_start("   ").await;
        assert_eq!(captured(&buf), "");
    }

    #[tokio::test]
    async fn named_play_gets_banner() {
        let (callback, buf) = capture();
        callback.on_play_start("Review PVE").await;
        let out = captured(&buf);
        assert!(out.contains(&"=".repeat(60)));
        assert!(out.contains("  Review PVE"));
    }

    #[tokio::test]
    async fn stats_hosts_render_sorted() {
        let (callback, buf) = capture();
        let mut stats = RunStats::default();
        stats.hosts.insert("zeta".to_string(), HostSummary::default());
        stats.hosts.insert("alpha".to_string(), HostSummary::default());
        callback.on_stats(&stats).await;
        let out = captured(&buf);
        let alpha = out.find("alpha").unwrap();
        let zeta = out.find("zeta").unwrap();
        assert!(alpha < zeta);
    }

    #[test]
    fn stats_line_format() {
        let summary = HostSummary {
            ok: 5,
            changed: 2,
            unreachable: 0,
            failures: 1,
            skipped: 3,
        };
        let line = ReviewCallback::format_stats_line("web1", &summary);
        assert_eq!(line, "web1 : ok=5 changed=2 unreachable=0 failures=1 skipped=3");
    }

    #[test]
    fn failure_style_switches_on_counts() {
        let clean = HostSummary::default();
        assert!(!clean.has_failures());
        let failed = HostSummary {
            failures: 1,
            ..HostSummary::default()
        };
        assert!(failed.has_failures());
        let unreachable = HostSummary {
            unreachable: 2,
            ..HostSummary::default()
        };
        assert!(unreachable.has_failures());
    }
}
