//! Verdicts, gate policy and the per-case outcome.
//!
//! A verdict says what happened on the page. Whether that fails the run is a
//! separate question answered by the [`GatePolicy`]:
//!
//! | verdict             | strict | lenient | soft |
//! |---------------------|--------|---------|------|
//! | `pass`              | ok     | ok      | ok   |
//! | `fail`              | FAIL   | FAIL    | ok   |
//! | `no-output-located` | FAIL   | FAIL    | ok   |
//! | `empty-output`      | FAIL   | ok      | ok   |
//! | `inconclusive`      | FAIL   | ok      | ok   |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// What a scenario observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    /// The page behaved as expected
    Pass,
    /// The page behaved wrongly
    Fail,
    /// An output element was found but stayed empty
    EmptyOutput,
    /// No Sinhala text appeared anywhere on the page
    NoOutputLocated,
    /// The case could not be evaluated
    Inconclusive,
}

impl Verdict {
    /// All verdicts, in report order
    pub const ALL: [Self; 5] = [
        Self::Pass,
        Self::Fail,
        Self::EmptyOutput,
        Self::NoOutputLocated,
        Self::Inconclusive,
    ];

    /// Stable kebab-case name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::EmptyOutput => "empty-output",
            Self::NoOutputLocated => "no-output-located",
            Self::Inconclusive => "inconclusive",
        }
    }

    /// Check if the verdict is a pass
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Whether this verdict fails a run gated by `policy`
    #[must_use]
    pub const fn is_failing_under(&self, policy: GatePolicy) -> bool {
        match policy {
            GatePolicy::Strict => !self.is_pass(),
            GatePolicy::Lenient => matches!(self, Self::Fail | Self::NoOutputLocated),
            GatePolicy::Soft => false,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How verdicts map onto a run's exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatePolicy {
    /// Every non-pass verdict fails the run
    #[default]
    Strict,
    /// Only wrong or missing output fails the run
    Lenient,
    /// Nothing fails the run; verdicts are tracked only
    Soft,
}

impl GatePolicy {
    /// Lower-case name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
            Self::Soft => "soft",
        }
    }
}

impl std::fmt::Display for GatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the observed output was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputSource {
    /// An element distinct from the input
    DedicatedElement,
    /// The input element after switching its language tab
    LanguageToggle,
    /// Sinhala lines of the rendered page text
    BodyScan,
}

impl OutputSource {
    /// Stable kebab-case name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DedicatedElement => "dedicated-element",
            Self::LanguageToggle => "language-toggle",
            Self::BodyScan => "body-scan",
        }
    }
}

impl std::fmt::Display for OutputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file written alongside the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Display name
    pub name: String,
    /// MIME type
    pub content_type: String,
    /// Location on disk
    pub path: PathBuf,
}

impl Attachment {
    /// A PNG screenshot
    #[must_use]
    pub fn png(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            content_type: "image/png".to_string(),
            path: path.into(),
        }
    }
}

/// Everything one scenario run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseOutcome {
    /// Verdict
    pub verdict: Verdict,
    /// Last extracted output text
    pub observed_output: String,
    /// Where the output was read from
    pub output_source: Option<OutputSource>,
    /// Explanation for non-pass verdicts and flagged cases
    pub reason: Option<String>,
    /// Wall-clock time of the scenario
    pub elapsed: Duration,
    /// Screenshot taken at the end of the scenario
    pub screenshot: Option<Attachment>,
    /// Warnings that did not change the verdict
    pub flags: Vec<String>,
}

impl CaseOutcome {
    /// Outcome with only a verdict
    #[must_use]
    pub const fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            observed_output: String::new(),
            output_source: None,
            reason: None,
            elapsed: Duration::ZERO,
            screenshot: None,
            flags: Vec::new(),
        }
    }

    /// Failing outcome for an error that stopped the scenario
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::new(Verdict::Fail).with_reason(reason)
    }

    /// Outcome for a case that could not be evaluated
    #[must_use]
    pub fn inconclusive(reason: impl Into<String>) -> Self {
        Self::new(Verdict::Inconclusive).with_reason(reason)
    }

    /// Set the explanation
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Set the observed output and where it came from
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>, source: Option<OutputSource>) -> Self {
        self.observed_output = output.into();
        self.output_source = source;
        self
    }

    /// Add a flag
    #[must_use]
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    /// Set the elapsed time
    #[must_use]
    pub const fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Attach a screenshot
    #[must_use]
    pub fn with_screenshot(mut self, screenshot: Attachment) -> Self {
        self.screenshot = Some(screenshot);
        self
    }
}
