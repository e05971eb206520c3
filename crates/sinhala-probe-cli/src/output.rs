//! Console progress and summaries

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use sinhala_probe::{CaseOutcome, CaseRecord, GatePolicy, Report, RunObserver, TestCase, Verdict};

/// Progress reporter for a suite run
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    gate: GatePolicy,
    debug: bool,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            gate: GatePolicy::default(),
            debug: false,
            use_color,
            quiet,
        }
    }

    /// Gate used to tell failures from tolerated verdicts
    #[must_use]
    pub const fn with_gate(mut self, gate: GatePolicy) -> Self {
        self.gate = gate;
        self
    }

    /// Include the reason of each failed attempt in retry lines
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Start a progress bar over `total` cases
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn write_line(&self, line: &str) {
        match self.progress_bar {
            Some(ref pb) if !pb.is_finished() => pb.suspend(|| {
                let _ = self.term.write_line(line);
            }),
            _ => {
                let _ = self.term.write_line(line);
            }
        }
    }

    fn prefixed(&self, symbol: &str, plain: &str, color: &Style, message: &str) -> String {
        let prefix = if self.use_color {
            color.apply_to(symbol).bold().to_string()
        } else {
            plain.to_string()
        };
        format!("{prefix} {message}")
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.write_line(&self.prefixed("✓", "PASS", &Style::new().green(), message));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Failures are printed even in quiet mode
        self.write_line(&self.prefixed("✗", "FAIL", &Style::new().red(), message));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.write_line(&self.prefixed("⚠", "WARN", &Style::new().yellow(), message));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.write_line(&self.prefixed("ℹ", "INFO", &Style::new().blue(), message));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.write_line("");
        self.write_line(&styled);
    }

    /// Print the outcome of one case
    pub fn case_result(&self, record: &CaseRecord) {
        let line = case_line(record);
        match record.verdict() {
            Verdict::Pass => self.success(&line),
            verdict if verdict.is_failing_under(self.gate) => self.failure(&line),
            _ => self.warning(&line),
        }
    }

    /// Print the run summary
    pub fn summary(&self, report: &Report) {
        let gate_passed = report.passed();
        if self.quiet && gate_passed {
            return;
        }

        let duration_secs = report.total_duration().as_secs_f64();
        let status = if gate_passed { "PASSED" } else { "FAILED" };
        let status = if self.use_color {
            let status_style = if gate_passed {
                Style::new().green().bold()
            } else {
                Style::new().red().bold()
            };
            status_style.apply_to(status).to_string()
        } else {
            status.to_string()
        };

        self.write_line("");
        self.write_line(&format!(
            "{status} {} in {duration_secs:.2}s (gate: {})",
            report.summary(),
            report.gate
        ));
    }
}

impl RunObserver for ProgressReporter {
    fn case_started(&mut self, _index: usize, _total: usize, case: &TestCase) {
        self.set_message(&case.title());
    }

    fn case_retrying(&mut self, case: &TestCase, attempt: u32, outcome: &CaseOutcome) {
        self.warning(&self.retry_line(case, attempt, outcome));
    }

    fn case_finished(&mut self, _index: usize, _total: usize, record: &CaseRecord) {
        self.case_result(record);
        self.increment(1);
    }
}

impl ProgressReporter {
    fn retry_line(&self, case: &TestCase, attempt: u32, outcome: &CaseOutcome) -> String {
        let mut line = format!(
            "{} attempt {attempt} ended {}, retrying",
            case.title(),
            outcome.verdict
        );
        if self.debug {
            if let Some(ref reason) = outcome.reason {
                line.push_str(&format!(" ({reason})"));
            }
        }
        line
    }
}

/// One-line description of a finished case
#[must_use]
pub fn case_line(record: &CaseRecord) -> String {
    let mut line = format!(
        "{} [{}] {} in {:.2}s",
        record.title,
        record.classification,
        record.verdict(),
        record.outcome.elapsed.as_secs_f64()
    );
    if record.attempts > 1 {
        line.push_str(&format!(" after {} attempts", record.attempts));
    }
    if let Some(ref reason) = record.outcome.reason {
        line.push_str(&format!(": {reason}"));
    }
    line
}
