//! Scenario reporting.
//!
//! A [`ScenarioReport`] collects one [`StepRecord`] per checkout step. Runs
//! are fail-fast, so a report holds passed steps, at most one failure, and
//! the skipped remainder.
//!
//! ```text
//! reports/
//! ├── checkout-20261016-101500-3f2a9c1e.json
//! ├── checkout-20261016-101500-3f2a9c1e.html
//! └── checkout-20261016-101500-3f2a9c1e-failure.png   (failed CDP runs only)
//! ```
//!
//! The stem ends with the first eight hex digits of the run id, so runs
//! started in the same second never overwrite each other. The HTML report
//! is self-contained: a failure screenshot is inlined as a data URI.

use crate::result::{ErrorKind, FlowError, FlowResult};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Outcome of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Step passed
    Passed,
    /// Step failed; the run stopped here
    Failed,
    /// Step never ran because an earlier one failed
    Skipped,
}

impl StepStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Record of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step name
    pub name: String,
    /// Outcome
    pub status: StepStatus,
    /// Wall time spent in the step
    pub duration_ms: u64,
    /// Error classification if failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Error message if failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepRecord {
    /// Create a passing record
    #[must_use]
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Passed,
            duration_ms: millis(duration),
            error_kind: None,
            error: None,
        }
    }

    /// Create a failing record
    #[must_use]
    pub fn failed(name: impl Into<String>, duration: Duration, error: &FlowError) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Failed,
            duration_ms: millis(duration),
            error_kind: Some(error.kind()),
            error: Some(error.to_string()),
        }
    }

    /// Create a skipped record
    #[must_use]
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Skipped,
            duration_ms: 0,
            error_kind: None,
            error: None,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Files written by [`ScenarioReport::write_to`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFiles {
    /// JSON report
    pub json: PathBuf,
    /// HTML report
    pub html: PathBuf,
    /// Failure screenshot, when one was captured
    pub screenshot: Option<PathBuf>,
}

/// Report of one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Run id
    pub id: Uuid,
    /// Scenario name
    pub scenario: String,
    /// Application under test
    pub base_url: String,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end, set by [`finish`](Self::finish)
    pub finished_at: Option<DateTime<Utc>>,
    /// Last state reached
    pub reached: Option<String>,
    /// Per-step records in execution order
    pub steps: Vec<StepRecord>,
    /// PNG captured at the failing step
    #[serde(skip)]
    pub screenshot: Option<Vec<u8>>,
}

impl ScenarioReport {
    /// Start a report
    #[must_use]
    pub fn new(scenario: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            scenario: scenario.into(),
            base_url: base_url.into(),
            started_at: Utc::now(),
            finished_at: None,
            reached: None,
            steps: Vec::new(),
            screenshot: None,
        }
    }

    /// Append a step record
    pub fn record(&mut self, step: StepRecord) {
        self.steps.push(step);
    }

    /// Attach a failure screenshot
    pub fn attach_screenshot(&mut self, png: Vec<u8>) {
        self.screenshot = Some(png);
    }

    /// Close the report at `reached`
    pub fn finish(&mut self, reached: impl Into<String>) {
        self.reached = Some(reached.into());
        self.finished_at = Some(Utc::now());
    }

    /// Number of passed steps
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.steps.iter().filter(|s| s.status.is_passed()).count()
    }

    /// Number of recorded steps
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.steps.len()
    }

    /// True when at least one step ran and none failed or was skipped
    #[must_use]
    pub fn all_passed(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.status.is_passed())
    }

    /// The failing step, if any
    #[must_use]
    pub fn failure(&self) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.status.is_failed())
    }

    /// Sum of step durations
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.steps.iter().map(|s| s.duration_ms).sum())
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        let verdict = if self.all_passed() { "PASSED" } else { "FAILED" };
        format!(
            "{}: {verdict} {}/{} steps ({:.2}s)",
            self.scenario,
            self.passed_count(),
            self.total_count(),
            self.total_duration().as_secs_f64()
        )
    }

    /// File stem shared by every artifact of this run
    #[must_use]
    pub fn file_stem(&self) -> String {
        let id = self.id.simple().to_string();
        format!(
            "{}-{}-{}",
            self.scenario,
            self.started_at.format("%Y%m%d-%H%M%S"),
            &id[..8]
        )
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> FlowResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render HTML report content
    #[must_use]
    pub fn render_html(&self) -> String {
        let mut html = String::new();
        html.push_str(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Shopflow Scenario Report</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; }
        .summary { background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }
        .step { padding: 10px; margin: 5px 0; border-radius: 4px; }
        .step.pass { background: #e8f5e9; border-left: 4px solid #4caf50; }
        .step.fail { background: #ffebee; border-left: 4px solid #f44336; }
        .step.skip { background: #fff3e0; border-left: 4px solid #ff9800; }
        .error { color: #d32f2f; font-family: monospace; white-space: pre-wrap; }
        .screenshot { max-width: 100%; margin-top: 10px; border: 1px solid #ccc; }
    </style>
</head>
<body>
"#,
        );

        let _ = write!(
            html,
            r#"<div class="summary">
    <h1>{}</h1>
    <h2>{}</h2>
    <p>Target: {}</p>
    <p>Run: {} at {}</p>
</div>
"#,
            escape_html(&self.scenario),
            escape_html(&self.summary()),
            escape_html(&self.base_url),
            self.id,
            self.started_at.to_rfc3339()
        );

        html.push_str("<h2>Steps</h2>\n");
        for step in &self.steps {
            let class = match step.status {
                StepStatus::Passed => "pass",
                StepStatus::Failed => "fail",
                StepStatus::Skipped => "skip",
            };
            let _ = writeln!(
                html,
                r#"<div class="step {class}">
    <strong>{}</strong> - {:?} ({}ms)"#,
                escape_html(&step.name),
                step.status,
                step.duration_ms
            );
            if let Some(error) = &step.error {
                let _ = writeln!(html, r#"    <div class="error">{}</div>"#, escape_html(error));
            }
            if step.status.is_failed() {
                if let Some(png) = &self.screenshot {
                    let _ = writeln!(
                        html,
                        r#"    <img class="screenshot" alt="screenshot at {}" src="data:image/png;base64,{}">"#,
                        escape_html(&step.name),
                        base64::engine::general_purpose::STANDARD.encode(png)
                    );
                }
            }
            html.push_str("</div>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    /// Write JSON, HTML and any failure screenshot into `dir`
    pub fn write_to(&self, dir: impl AsRef<Path>) -> FlowResult<ReportFiles> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| FlowError::environment(dir, format!("cannot create reports dir: {e}")))?;

        let stem = self.file_stem();
        let json = dir.join(format!("{stem}.json"));
        let html = dir.join(format!("{stem}.html"));
        write_file(&json, self.to_json()?.as_bytes())?;
        write_file(&html, self.render_html().as_bytes())?;

        let screenshot = match &self.screenshot {
            Some(png) => {
                let path = dir.join(format!("{stem}-failure.png"));
                write_file(&path, png)?;
                Some(path)
            }
            None => None,
        };

        tracing::info!(json = %json.display(), html = %html.display(), "report written");
        Ok(ReportFiles {
            json,
            html,
            screenshot,
        })
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> FlowResult<()> {
    std::fs::write(path, bytes).map_err(|e| FlowError::environment(path, format!("cannot write: {e}")))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn failed_report() -> ScenarioReport {
        let mut report = ScenarioReport::new("checkout", "https://shop.test");
        report.record(StepRecord::passed("logged_in", Duration::from_millis(1200)));
        let err = FlowError::mismatch("URL", "equal to \"https://shop.test/\"", "https://shop.test/<x>")
            .in_step("cart_reviewed");
        report.record(StepRecord::failed("cart_reviewed", Duration::from_millis(300), &err));
        report.record(StepRecord::skipped("checkout_reviewed"));
        report.finish("logged_in");
        report
    }

    mod record_tests {
        use super::*;

        #[test]
        fn test_failed_record_carries_kind() {
            let report = failed_report();
            let failure = report.failure().unwrap();
            assert_eq!(failure.name, "cart_reviewed");
            assert_eq!(failure.error_kind, Some(ErrorKind::AssertionMismatch));
            assert!(failure.error.as_deref().unwrap().contains("cart_reviewed"));
        }

        #[test]
        fn test_counts_and_summary() {
            let report = failed_report();
            assert_eq!(report.passed_count(), 1);
            assert_eq!(report.total_count(), 3);
            assert!(!report.all_passed());
            assert_eq!(report.total_duration(), Duration::from_millis(1500));
            assert_eq!(report.summary(), "checkout: FAILED 1/3 steps (1.50s)");
        }

        #[test]
        fn test_empty_report_is_not_passed() {
            assert!(!ScenarioReport::new("checkout", "https://shop.test").all_passed());
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn test_html_escapes_error_text() {
            let html = failed_report().render_html();
            assert!(html.contains("<div class=\"step fail\">"));
            assert!(html.contains("&lt;x&gt;"));
            assert!(!html.contains("<x>"));
        }

        #[test]
        fn test_html_inlines_failure_screenshot() {
            let mut report = failed_report();
            assert!(!report.render_html().contains("data:image/png"));

            report.attach_screenshot(vec![0x89, b'P', b'N', b'G']);
            let html = report.render_html();
            assert!(html.contains(r#"src="data:image/png;base64,iVBORw==""#));
            assert!(html.contains(r#"alt="screenshot at cart_reviewed""#));
            assert_eq!(html.matches("<img").count(), 1);
        }

        #[test]
        fn test_json_has_steps_and_reached_state() {
            let report = failed_report();
            let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
            assert_eq!(value["reached"], "logged_in");
            assert_eq!(value["steps"][1]["status"], "failed");
            assert_eq!(value["steps"][1]["error_kind"], "AssertionMismatch");
            assert!(value["steps"][0].get("error").is_none());
        }
    }

    mod write_tests {
        use super::*;

        #[test]
        fn test_write_to_creates_timestamped_files() {
            let dir = tempfile::tempdir().unwrap();
            let mut report = failed_report();
            report.attach_screenshot(vec![0x89, b'P', b'N', b'G']);

            let files = report.write_to(dir.path().join("reports")).unwrap();
            let json_name = files.json.file_name().unwrap().to_str().unwrap().to_string();
            assert!(json_name.starts_with("checkout-"));
            assert!(json_name.ends_with(".json"));
            assert!(files.html.exists());
            assert_eq!(
                std::fs::read(files.screenshot.unwrap()).unwrap(),
                vec![0x89, b'P', b'N', b'G']
            );
        }

        #[test]
        fn test_runs_in_same_second_keep_separate_files() {
            let dir = tempfile::tempdir().unwrap();
            let first = failed_report();
            let mut second = failed_report();
            second.started_at = first.started_at;

            let a = first.write_to(dir.path()).unwrap();
            let b = second.write_to(dir.path()).unwrap();
            assert_ne!(a.json, b.json);
            assert_ne!(a.html, b.html);
            assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 4);
        }

        #[test]
        fn test_passing_run_has_no_screenshot() {
            let dir = tempfile::tempdir().unwrap();
            let mut report = ScenarioReport::new("checkout", "https://shop.test");
            report.record(StepRecord::passed("logged_in", Duration::from_millis(5)));
            report.finish("logged_in");
            let files = report.write_to(dir.path()).unwrap();
            assert!(files.screenshot.is_none());
        }
    }
}
