//! Suite configuration.
//!
//! Everything here has a default that matches the public deployment of the
//! transliterator, so an empty YAML file is a valid configuration:
//!
//! ```yaml
//! base_url: https://www.swifttranslator.com/
//! cases: test-data/testcases.xlsx
//! gate: lenient
//! surfaces:
//!   input:
//!     - selector: { by: css, css: "#singlish" }
//! ```

use crate::locator::{Locator, Selector, DEFAULT_RESOLVE_TIMEOUT_MS};
use crate::result::{ProbeError, ProbeResult};
use crate::verdict::GatePolicy;
use crate::wait::{WaitOptions, DEFAULT_POLL_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Public deployment under test
pub const DEFAULT_BASE_URL: &str = "https://www.swifttranslator.com/";

/// Default case workbook
pub const DEFAULT_CASES_PATH: &str = "test-data/testcases.xlsx";

/// Default directory for reports and screenshots
pub const DEFAULT_ARTIFACTS_DIR: &str = "target/sinhala-probe";

/// Extra attempts for failing cases under CI
pub const CI_RETRIES: u32 = 2;

/// What to do with cases that are neither positive nor negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPolicy {
    /// Run with positive expectations and flag the outcome
    #[default]
    Flag,
    /// Do not run; record the case as inconclusive
    Inconclusive,
}

/// Browser window size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// The fixed real-time typing check run once per suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSmoke {
    /// Run the check at the start of every suite
    pub enabled: bool,
    /// Singlish typed key by key
    pub input: String,
    /// Pause after each key
    pub key_delay_ms: u64,
    /// Bound for Sinhala to appear once typing is done
    pub timeout_ms: u64,
}

impl Default for UiSmoke {
    fn default() -> Self {
        Self {
            enabled: true,
            input: "mama oyata aDhara".to_string(),
            key_delay_ms: 50,
            timeout_ms: 30_000,
        }
    }
}

/// Ordered locator chains for the page surfaces the runner touches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Surfaces {
    /// Where Singlish text is typed
    pub input: Vec<Locator>,
    /// An element that shows the transliteration on its own
    pub output: Vec<Locator>,
    /// A control that switches the input element to show Sinhala
    pub toggle: Vec<Locator>,
}

impl Default for Surfaces {
    fn default() -> Self {
        Self {
            input: vec![
                Locator::new(Selector::role("textbox", "Input Your Singlish Text Here")),
                Locator::new(Selector::placeholder("singlish|input")),
                Locator::new(Selector::css("textarea")),
                Locator::new(Selector::css(
                    "input[type=text], input:not([type]), [contenteditable=true], [contenteditable='']",
                )),
            ],
            output: vec![
                Locator::new(Selector::css("textarea")).nth(1),
                Locator::new(Selector::css(
                    "[aria-label*=\"sinhala\" i], [aria-label*=\"output\" i]",
                )),
                Locator::new(Selector::css("#output, .output, [data-testid=\"output\"]")),
            ],
            toggle: vec![
                Locator::new(Selector::role("tab", "Sinhala")),
                Locator::new(Selector::role("button", "Sinhala")),
                Locator::new(Selector::exact_text("Sinhala")).nth(1),
                Locator::new(Selector::exact_text("Sinhala")),
            ],
        }
    }
}

impl Surfaces {
    fn validate(&self) -> ProbeResult<()> {
        if self.input.is_empty() {
            return Err(ProbeError::config("surfaces.input needs at least one locator"));
        }
        self.input
            .iter()
            .chain(&self.output)
            .chain(&self.toggle)
            .try_for_each(|l| l.selector.validate())
    }
}

/// Configuration of one suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Page every case starts from
    pub base_url: String,
    /// Case workbook
    pub cases: PathBuf,
    /// Reports and screenshots go here
    pub artifacts_dir: PathBuf,
    /// Bound for single browser commands
    pub action_timeout_ms: u64,
    /// Bound for reaching DOM-content-loaded
    pub navigation_timeout_ms: u64,
    /// Bound for a whole case, page acquisition included
    pub case_timeout_ms: u64,
    /// Bound for resolving the input surface
    pub input_timeout_ms: u64,
    /// Bound for Sinhala output to appear
    pub output_timeout_ms: u64,
    /// Observation window for negative cases
    pub negative_window_ms: u64,
    /// Sampling interval for every wait
    pub poll_interval_ms: u64,
    /// Parallel workers; only 1 is supported
    pub workers: usize,
    /// Extra attempts for failing cases; `None` means 0, or 2 under CI
    pub retries: Option<u32>,
    /// How verdicts gate the run
    pub gate: GatePolicy,
    /// Handling of unclassified cases
    pub unknown_cases: UnknownPolicy,
    /// Stop after the first failing case
    pub fail_fast: bool,
    /// Run the browser without a window
    pub headless: bool,
    /// Keep the Chromium sandbox enabled
    pub sandbox: bool,
    /// Window size
    pub viewport: Viewport,
    /// Browser binary; auto-detected when unset
    pub chromium_path: Option<PathBuf>,
    /// Locator chains
    pub surfaces: Surfaces,
    /// Real-time typing check
    pub ui_smoke: UiSmoke,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cases: PathBuf::from(DEFAULT_CASES_PATH),
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            action_timeout_ms: 30_000,
            navigation_timeout_ms: 60_000,
            case_timeout_ms: 120_000,
            input_timeout_ms: DEFAULT_RESOLVE_TIMEOUT_MS,
            output_timeout_ms: 20_000,
            negative_window_ms: 3_000,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            workers: 1,
            retries: None,
            gate: GatePolicy::Strict,
            unknown_cases: UnknownPolicy::Flag,
            fail_fast: false,
            headless: true,
            sandbox: true,
            viewport: Viewport::default(),
            chromium_path: None,
            surfaces: Surfaces::default(),
            ui_smoke: UiSmoke::default(),
        }
    }
}

/// Retry count used when none is configured
#[must_use]
pub const fn default_retries(ci: bool) -> u32 {
    if ci {
        CI_RETRIES
    } else {
        0
    }
}

/// Whether the process runs under a CI system
#[must_use]
pub fn running_in_ci() -> bool {
    std::env::var_os("CI").is_some_and(|v| !v.is_empty())
}

impl SuiteConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML; missing keys take their defaults
    ///
    /// # Errors
    ///
    /// Returns an error for malformed YAML or unknown enum values.
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Read a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Render as YAML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the case workbook
    #[must_use]
    pub fn with_cases(mut self, path: impl Into<PathBuf>) -> Self {
        self.cases = path.into();
        self
    }

    /// Set the artifacts directory
    #[must_use]
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    /// Set the retry count
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Set the gate policy
    #[must_use]
    pub const fn with_gate(mut self, gate: GatePolicy) -> Self {
        self.gate = gate;
        self
    }

    /// Set the unknown-classification policy
    #[must_use]
    pub const fn with_unknown_cases(mut self, policy: UnknownPolicy) -> Self {
        self.unknown_cases = policy;
        self
    }

    /// Set fail-fast
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Shrink every wait, for driving scripted pages in tests
    #[must_use]
    pub fn with_fast_waits(mut self, timeout_ms: u64, poll_interval_ms: u64) -> Self {
        self.input_timeout_ms = timeout_ms;
        self.output_timeout_ms = timeout_ms;
        self.negative_window_ms = timeout_ms;
        self.ui_smoke.timeout_ms = timeout_ms;
        self.ui_smoke.key_delay_ms = self.ui_smoke.key_delay_ms.min(poll_interval_ms);
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Turn the real-time typing check on or off
    #[must_use]
    pub const fn with_ui_smoke(mut self, enabled: bool) -> Self {
        self.ui_smoke.enabled = enabled;
        self
    }

    /// Retries in effect, resolving the CI default
    #[must_use]
    pub fn effective_retries(&self) -> u32 {
        self.retries
            .unwrap_or_else(|| default_retries(running_in_ci()))
    }

    /// Bound for single browser commands
    #[must_use]
    pub const fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    /// Bound for navigation
    #[must_use]
    pub const fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Bound for a whole case
    #[must_use]
    pub const fn case_timeout(&self) -> Duration {
        Duration::from_millis(self.case_timeout_ms)
    }

    /// Wait used to resolve the input surface
    #[must_use]
    pub const fn input_wait(&self) -> WaitOptions {
        WaitOptions::from_millis(self.input_timeout_ms, self.poll_interval_ms)
    }

    /// Wait used for positive output
    #[must_use]
    pub const fn output_wait(&self) -> WaitOptions {
        WaitOptions::from_millis(self.output_timeout_ms, self.poll_interval_ms)
    }

    /// Observation window for negative cases
    #[must_use]
    pub const fn negative_wait(&self) -> WaitOptions {
        WaitOptions::from_millis(self.negative_window_ms, self.poll_interval_ms)
    }

    /// Wait used for the real-time typing check
    #[must_use]
    pub const fn ui_smoke_wait(&self) -> WaitOptions {
        WaitOptions::from_millis(self.ui_smoke.timeout_ms, self.poll_interval_ms)
    }

    /// Pause between keys in the real-time typing check
    #[must_use]
    pub const fn ui_smoke_key_delay(&self) -> Duration {
        Duration::from_millis(self.ui_smoke.key_delay_ms)
    }

    /// Check the configuration can drive a run
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] naming the first offending key.
    pub fn validate(&self) -> ProbeResult<()> {
        if self.workers != 1 {
            return Err(ProbeError::config(format!(
                "workers = {}: cases share one page flow and must run on a single worker",
                self.workers
            )));
        }
        let url = self.base_url.trim();
        if !["http://", "https://", "file://"]
            .iter()
            .any(|scheme| url.starts_with(scheme))
        {
            return Err(ProbeError::config(format!(
                "base_url {:?} must be an http(s) or file URL",
                self.base_url
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ProbeError::config("poll_interval_ms must be greater than 0"));
        }
        for (key, value) in [
            ("input_timeout_ms", self.input_timeout_ms),
            ("output_timeout_ms", self.output_timeout_ms),
            ("navigation_timeout_ms", self.navigation_timeout_ms),
            ("case_timeout_ms", self.case_timeout_ms),
            ("negative_window_ms", self.negative_window_ms),
            ("action_timeout_ms", self.action_timeout_ms),
        ] {
            if value <= self.poll_interval_ms {
                return Err(ProbeError::config(format!(
                    "{key} ({value}) must exceed poll_interval_ms ({})",
                    self.poll_interval_ms
                )));
            }
        }
        if self.ui_smoke.enabled {
            if self.ui_smoke.timeout_ms <= self.poll_interval_ms {
                return Err(ProbeError::config(format!(
                    "ui_smoke.timeout_ms ({}) must exceed poll_interval_ms ({})",
                    self.ui_smoke.timeout_ms, self.poll_interval_ms
                )));
            }
            if self.ui_smoke.input.trim().is_empty() {
                return Err(ProbeError::config("ui_smoke.input must not be empty"));
            }
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ProbeError::config("viewport dimensions must be non-zero"));
        }
        self.surfaces.validate()
    }
}
