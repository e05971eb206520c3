//! Reporter - per-case records and HTML / JUnit / JSON rendering.
//!
//! Records are appended in run order and never changed afterwards. Whether a
//! record counts as a failure depends on the [`GatePolicy`] the report was
//! created with:
//!
//! ```text
//!  CaseRecord ─► Report ─┬─► render_html   (people)
//!                        ├─► render_junit  (CI: failing → <failure>, tolerated → <skipped>)
//!                        └─► render_json   (tooling)
//! ```

use crate::case::TestCase;
use crate::classify::Classification;
use crate::result::ProbeResult;
use crate::verdict::{CaseOutcome, GatePolicy, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One finished case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// `<id> - <name> (Row <n>)`
    pub title: String,
    /// Case identifier
    pub case_id: String,
    /// Sheet row
    pub row: u32,
    /// Classification the case ran under
    pub classification: Classification,
    /// Outcome of the last attempt
    pub outcome: CaseOutcome,
    /// Attempts made, retries included
    pub attempts: u32,
    /// When the last attempt finished
    pub timestamp: DateTime<Utc>,
}

impl CaseRecord {
    /// Record `outcome` for `case`
    #[must_use]
    pub fn new(case: &TestCase, outcome: CaseOutcome, attempts: u32) -> Self {
        Self {
            title: case.title(),
            case_id: case.id().to_string(),
            row: case.row_number(),
            classification: case.classification(),
            outcome,
            attempts,
            timestamp: Utc::now(),
        }
    }

    /// Verdict of the record
    #[must_use]
    pub const fn verdict(&self) -> Verdict {
        self.outcome.verdict
    }
}

/// Results of one suite run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Suite name
    pub suite_name: String,
    /// Gate the run is judged by
    pub gate: GatePolicy,
    /// Base URL the cases ran against
    pub base_url: String,
    /// Finished cases, in run order
    records: Vec<CaseRecord>,
    /// Titles of cases skipped after a fail-fast stop
    not_run: Vec<String>,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end, once finished
    pub finished_at: Option<DateTime<Utc>>,
    /// Directory attachment links are made relative to
    #[serde(skip)]
    artifacts_dir: Option<PathBuf>,
}

impl Report {
    /// Create an empty report
    #[must_use]
    pub fn new(suite_name: impl Into<String>, gate: GatePolicy) -> Self {
        Self {
            suite_name: suite_name.into(),
            gate,
            base_url: String::new(),
            records: Vec::new(),
            not_run: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
            artifacts_dir: None,
        }
    }

    /// Set the base URL shown in the report header
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Link attachments relative to `dir`
    #[must_use]
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = Some(dir.into());
        self
    }

    /// Append a finished case
    pub fn record(&mut self, record: CaseRecord) {
        self.records.push(record);
    }

    /// Note a case that was never run
    pub fn mark_not_run(&mut self, case: &TestCase) {
        self.not_run.push(case.title());
    }

    /// Mark the run finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Finished cases
    #[must_use]
    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    /// Titles of cases that were not run
    #[must_use]
    pub fn not_run(&self) -> &[String] {
        &self.not_run
    }

    /// Number of finished cases with `verdict`
    #[must_use]
    pub fn count(&self, verdict: Verdict) -> usize {
        self.records.iter().filter(|r| r.verdict() == verdict).count()
    }

    /// Number of finished cases
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    /// Number of passing cases
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count(Verdict::Pass)
    }

    /// Records the gate counts as failures
    #[must_use]
    pub fn failures(&self) -> Vec<&CaseRecord> {
        self.records
            .iter()
            .filter(|r| r.verdict().is_failing_under(self.gate))
            .collect()
    }

    /// Pass rate (0.0 to 1.0)
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.records.is_empty() {
            return 1.0;
        }
        self.passed_count() as f64 / self.records.len() as f64
    }

    /// Sum of case durations
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.records.iter().map(|r| r.outcome.elapsed).sum()
    }

    /// Whether the run passes under `policy`
    #[must_use]
    pub fn gate_passed(&self, policy: GatePolicy) -> bool {
        let skipped_fails = policy == GatePolicy::Strict && !self.not_run.is_empty();
        !skipped_fails
            && self
                .records
                .iter()
                .all(|r| !r.verdict().is_failing_under(policy))
    }

    /// Whether the run passes under its own gate
    #[must_use]
    pub fn passed(&self) -> bool {
        self.gate_passed(self.gate)
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{}: {}/{} passed ({:.1}%)",
            self.suite_name,
            self.passed_count(),
            self.total_count(),
            self.pass_rate() * 100.0
        );
        let others: Vec<String> = Verdict::ALL
            .iter()
            .filter(|v| !v.is_pass())
            .filter_map(|v| match self.count(*v) {
                0 => None,
                n => Some(format!("{n} {v}")),
            })
            .collect();
        if !others.is_empty() {
            line.push_str(&format!(", {}", others.join(", ")));
        }
        if !self.not_run.is_empty() {
            line.push_str(&format!(", {} not run", self.not_run.len()));
        }
        line
    }

    fn link(&self, path: &Path) -> String {
        let relative = self
            .artifacts_dir
            .as_deref()
            .and_then(|dir| path.strip_prefix(dir).ok())
            .unwrap_or(path);
        relative.to_string_lossy().replace('\\', "/")
    }

    /// Write the HTML report
    ///
    /// # Errors
    ///
    /// Returns error if file writing fails
    pub fn write_html(&self, output_path: &Path) -> ProbeResult<()> {
        std::fs::write(output_path, self.render_html())?;
        Ok(())
    }

    /// Write the JUnit report
    ///
    /// # Errors
    ///
    /// Returns error if file writing fails
    pub fn write_junit(&self, output_path: &Path) -> ProbeResult<()> {
        std::fs::write(output_path, self.render_junit())?;
        Ok(())
    }

    /// Write the JSON report
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file writing fails
    pub fn write_json(&self, output_path: &Path) -> ProbeResult<()> {
        std::fs::write(output_path, self.render_json()?)?;
        Ok(())
    }

    /// Render the report as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn render_json(&self) -> ProbeResult<String> {
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
    <title>Sinhala Probe Report</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; }
        .summary { background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }
        .progress-bar { background: #ddd; height: 20px; border-radius: 10px; overflow: hidden; }
        .passed { background: #4caf50; height: 100%; }
        table { border-collapse: collapse; width: 100%; }
        th, td { text-align: left; padding: 6px 8px; border-bottom: 1px solid #eee; vertical-align: top; }
        tr.pass { background: #e8f5e9; }
        tr.fail { background: #ffebee; }
        tr.warn { background: #fff3e0; }
        .output { font-family: 'Noto Sans Sinhala', 'Iskoola Pota', sans-serif; white-space: pre-wrap; }
        .reason { color: #d32f2f; font-family: monospace; white-space: pre-wrap; }
        .flag { color: #ef6c00; font-size: 0.9em; }
    </style>
</head>
<body>
"#,
        );

        let finished = self
            .finished_at
            .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
        html.push_str(&format!(
            r#"<div class="summary">
    <h1>{}</h1>
    <p>Target: {} | Gate: {} | Started: {} | Finished: {}</p>
    <h2>Results: {}/{} passed ({:.1}%)</h2>
    <div class="progress-bar">
        <div class="passed" style="width: {:.1}%"></div>
    </div>
    <p>{}</p>
    <p>Duration: {:.2}s</p>
</div>
"#,
            escape_xml(&self.suite_name),
            escape_xml(&self.base_url),
            self.gate,
            self.started_at.to_rfc3339(),
            finished,
            self.passed_count(),
            self.total_count(),
            self.pass_rate() * 100.0,
            self.pass_rate() * 100.0,
            escape_xml(&self.summary()),
            self.total_duration().as_secs_f64()
        ));

        html.push_str(
            "<h2>Cases</h2>\n<table>\n<tr><th>Case</th><th>Class</th><th>Verdict</th><th>Time</th><th>Attempts</th><th>Output</th><th>Details</th><th>Screenshot</th></tr>\n",
        );
        for record in &self.records {
            let verdict = record.verdict();
            let class = if verdict.is_pass() {
                "pass"
            } else if verdict.is_failing_under(self.gate) {
                "fail"
            } else {
                "warn"
            };

            let mut details = String::new();
            if let Some(reason) = &record.outcome.reason {
                details.push_str(&format!(r#"<div class="reason">{}</div>"#, escape_xml(reason)));
            }
            for flag in &record.outcome.flags {
                details.push_str(&format!(r#"<div class="flag">{}</div>"#, escape_xml(flag)));
            }
            let source = record
                .outcome
                .output_source
                .map_or_else(String::new, |s| format!("<br><small>{s}</small>"));
            let shot = record.outcome.screenshot.as_ref().map_or_else(String::new, |a| {
                format!(
                    r#"<a href="{}">{}</a>"#,
                    escape_xml(&self.link(&a.path)),
                    escape_xml(&a.name)
                )
            });

            html.push_str(&format!(
                r#"<tr class="{class}"><td>{}</td><td>{}</td><td>{verdict}</td><td>{:.0}ms</td><td>{}</td><td class="output">{}{source}</td><td>{details}</td><td>{shot}</td></tr>
"#,
                escape_xml(&record.title),
                record.classification,
                record.outcome.elapsed.as_secs_f64() * 1000.0,
                record.attempts,
                escape_xml(&record.outcome.observed_output),
            ));
        }
        html.push_str("</table>\n");

        if !self.not_run.is_empty() {
            html.push_str("<h2>Not Run</h2>\n<ul>\n");
            for title in &self.not_run {
                html.push_str(&format!("<li>{}</li>\n", escape_xml(title)));
            }
            html.push_str("</ul>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    /// Render JUnit XML content
    #[must_use]
    pub fn render_junit(&self) -> String {
        let mut xml = String::new();

        let skipped = self
            .records
            .iter()
            .filter(|r| !r.verdict().is_pass() && !r.verdict().is_failing_under(self.gate))
            .count()
            + self.not_run.len();

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<testsuite name="{}" tests="{}" failures="{}" skipped="{}" time="{:.3}" timestamp="{}">"#,
            escape_xml(&self.suite_name),
            self.total_count() + self.not_run.len(),
            self.failures().len(),
            skipped,
            self.total_duration().as_secs_f64(),
            self.started_at.to_rfc3339()
        ));
        xml.push('\n');

        for record in &self.records {
            let verdict = record.verdict();
            xml.push_str(&format!(
                r#"  <testcase name="{}" classname="{}" time="{:.3}">"#,
                escape_xml(&record.title),
                record.classification,
                record.outcome.elapsed.as_secs_f64()
            ));
            xml.push('\n');

            let message = record
                .outcome
                .reason
                .clone()
                .unwrap_or_else(|| verdict.to_string());
            if verdict.is_failing_under(self.gate) {
                xml.push_str(&format!(
                    r#"    <failure type="{verdict}" message="{}">{}</failure>"#,
                    escape_xml(&message),
                    escape_xml(&message)
                ));
                xml.push('\n');
            } else if !verdict.is_pass() {
                xml.push_str(&format!(
                    r#"    <skipped message="{verdict}: {}"/>"#,
                    escape_xml(&message)
                ));
                xml.push('\n');
            }
            if !record.outcome.observed_output.is_empty() {
                xml.push_str(&format!(
                    "    <system-out>{}</system-out>\n",
                    escape_xml(&record.outcome.observed_output)
                ));
            }

            xml.push_str("  </testcase>\n");
        }

        for title in &self.not_run {
            xml.push_str(&format!(
                "  <testcase name=\"{}\" time=\"0.000\">\n    <skipped message=\"not run after fail-fast stop\"/>\n  </testcase>\n",
                escape_xml(title)
            ));
        }

        xml.push_str("</testsuite>\n");
        xml
    }
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
