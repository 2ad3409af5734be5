//! Console output for scenario runs

use console::{style, Term};
use shopflow::{ReportFiles, ScenarioReport, StepStatus};

/// Prints step results and the run summary to stderr
#[derive(Debug)]
pub struct ConsoleReporter {
    term: Term,
    quiet: bool,
}

impl ConsoleReporter {
    /// Create a reporter
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            quiet,
        }
    }

    /// One line per step, then the summary
    pub fn print_report(&self, report: &ScenarioReport) {
        if !self.quiet {
            for step in &report.steps {
                self.line(&format_step(step.status, &step.name, step.duration_ms));
                if let Some(error) = &step.error {
                    self.line(&format!("    {}", style(error).red()));
                }
            }
        }
        let summary = report.summary();
        if report.all_passed() {
            self.line(&style(summary).green().bold().to_string());
        } else {
            self.line(&style(summary).red().bold().to_string());
        }
    }

    /// Paths of written report files
    pub fn print_files(&self, files: &ReportFiles) {
        if self.quiet {
            return;
        }
        self.line(&format!("Report: {}", files.json.display()));
        self.line(&format!("Report: {}", files.html.display()));
        if let Some(png) = &files.screenshot {
            self.line(&format!("Screenshot: {}", png.display()));
        }
    }

    /// Informational message, suppressed in quiet mode
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.line(message);
        }
    }

    fn line(&self, text: &str) {
        // stderr gone means nobody is listening
        let _ = self.term.write_line(text);
    }
}

fn format_step(status: StepStatus, name: &str, duration_ms: u64) -> String {
    let marker = match status {
        StepStatus::Passed => style("✓").green(),
        StepStatus::Failed => style("✗").red(),
        StepStatus::Skipped => style("-").dim(),
    };
    format!("  {marker} {name} ({duration_ms}ms)")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_step_includes_name_and_duration() {
        let line = console::strip_ansi_codes(&format_step(StepStatus::Passed, "logged_in", 812))
            .to_string();
        assert_eq!(line, "  ✓ logged_in (812ms)");
    }

    #[test]
    fn test_skipped_marker() {
        let line =
            console::strip_ansi_codes(&format_step(StepStatus::Skipped, "returned_home", 0))
                .to_string();
        assert!(line.starts_with("  - returned_home"));
    }
}
