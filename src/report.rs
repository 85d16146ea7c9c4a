//! Scenario outcome reporting and the pull-request CSV output.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::{CheckError, CheckResult};

#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub scenario: String,
    pub passed: bool,
    pub failures: Vec<String>,
    pub details: Vec<String>,
    pub duration: Duration,
}

impl ScenarioReport {
    /// Report for a scenario that aborted with an error before it could
    /// record anything.
    pub fn errored(scenario: &str, err: &CheckError) -> Self {
        Self {
            scenario: scenario.to_string(),
            passed: false,
            failures: vec![err.to_string()],
            details: Vec::new(),
            duration: Duration::ZERO,
        }
    }
}

/// Accumulates notes and failures while a scenario runs; `finish` turns it
/// into the report. Pass/fail is simply "no failures recorded".
pub struct ScenarioRecorder {
    scenario: String,
    failures: Vec<String>,
    details: Vec<String>,
    started: Instant,
}

impl ScenarioRecorder {
    pub fn new(scenario: &str) -> Self {
        tracing::info!("=== Scenario: {} ===", scenario);
        Self {
            scenario: scenario.to_string(),
            failures: Vec::new(),
            details: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn note(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("[{}] {}", self.scenario, message);
        self.details.push(message);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("[{}] {}", self.scenario, message);
        self.failures.push(message);
    }

    pub fn finish(self) -> ScenarioReport {
        ScenarioReport {
            passed: self.failures.is_empty(),
            scenario: self.scenario,
            failures: self.failures,
            details: self.details,
            duration: self.started.elapsed(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<ScenarioReport>,
}

impl RunSummary {
    pub fn push(&mut self, report: ScenarioReport) {
        self.reports.push(report);
    }

    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(|r| r.passed)
    }

    pub fn render(&self) -> String {
        let mut out = String::from("\nRun summary\n-----------\n");
        for report in &self.reports {
            let verdict = if report.passed { "PASS" } else { "FAIL" };
            out.push_str(&format!(
                "{:<24} {}  ({:.1}s)\n",
                report.scenario,
                verdict,
                report.duration.as_secs_f64()
            ));
            for failure in &report.failures {
                out.push_str(&format!("    - {}\n", failure));
            }
        }
        let failed = self.reports.iter().filter(|r| !r.passed).count();
        out.push_str(&format!(
            "{} scenario(s), {} failed\n",
            self.reports.len(),
            failed
        ));
        out
    }
}

/// One scraped pull request. `createdDate` is whatever the list page
/// exposes, typically an ISO timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestRecord {
    pub title: String,
    pub author: String,
    pub created_date: String,
}

pub const PR_CSV_HEADER: &str = "PR Name,Created Date,Author";

/// Quote a CSV field, doubling interior quotes.
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

pub fn render_pull_request_csv(records: &[PullRequestRecord]) -> String {
    let mut out = String::from(PR_CSV_HEADER);
    out.push('\n');
    for record in records {
        out.push_str(&format!(
            "{},{},{}\n",
            csv_field(&record.title),
            csv_field(&record.created_date),
            csv_field(&record.author),
        ));
    }
    out
}

/// Write the CSV once per run under a timestamp-qualified name so
/// concurrent contexts never collide.
pub fn write_pull_request_csv(
    dir: &Path,
    records: &[PullRequestRecord],
) -> CheckResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let filename = format!("pull_requests_{}.csv", Utc::now().format("%Y%m%dT%H%M%S%.3fZ"));
    let path = dir.join(filename);
    std::fs::write(&path, render_pull_request_csv(records))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> PullRequestRecord {
        PullRequestRecord {
            title: title.to_string(),
            author: "octocat".to_string(),
            created_date: "2026-08-01T12:00:00Z".to_string(),
        }
    }

    /// Minimal parser for the quoted-field dialect the writer emits.
    fn parse_line(line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut chars = line.chars().peekable();
        let mut in_quotes = false;
        while let Some(c) = chars.next() {
            match c {
                '"' if in_quotes => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        current.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                '"' => in_quotes = true,
                ',' if !in_quotes => {
                    fields.push(std::mem::take(&mut current));
                }
                c => current.push(c),
            }
        }
        fields.push(current);
        fields
    }

    #[test]
    fn header_and_column_order() {
        let csv = render_pull_request_csv(&[record("Fix panic")]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(PR_CSV_HEADER));
        let row = parse_line(lines.next().unwrap());
        assert_eq!(row, vec!["Fix panic", "2026-08-01T12:00:00Z", "octocat"]);
    }

    #[test]
    fn interior_quotes_round_trip() {
        let title = r#"Support "quoted" selectors, really"#;
        let csv = render_pull_request_csv(&[record(title)]);
        let row_line = csv.lines().nth(1).unwrap();
        assert!(row_line.contains(r#""Support ""quoted"" selectors, really""#));
        let row = parse_line(row_line);
        assert_eq!(row[0], title);
    }

    #[test]
    fn csv_written_to_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pull_request_csv(dir.path(), &[record("A")]).unwrap();
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("pull_requests_"));
        assert!(name.ends_with(".csv"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(PR_CSV_HEADER));
    }

    #[test]
    fn recorder_verdicts() {
        let mut rec = ScenarioRecorder::new("demo");
        rec.note("checked one thing");
        let report = rec.finish();
        assert!(report.passed);

        let mut rec = ScenarioRecorder::new("demo");
        rec.fail("broken link");
        let report = rec.finish();
        assert!(!report.passed);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn summary_renders_failures() {
        let mut summary = RunSummary::default();
        let mut rec = ScenarioRecorder::new("links");
        rec.fail("https://x.com/dead returned 404");
        summary.push(rec.finish());
        assert!(!summary.all_passed());
        let rendered = summary.render();
        assert!(rendered.contains("FAIL"));
        assert!(rendered.contains("404"));
        assert!(rendered.contains("1 failed"));
    }
}
