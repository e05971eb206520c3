//! Scenario Runner
//!
//! Drives one page through one case and turns what it saw into a
//! [`CaseOutcome`]:
//!
//! ```text
//!  goto(base_url, DOMContentLoaded)
//!    └─► resolve input ──none──► Inconclusive
//!          └─► clear + type
//!                └─► output source: dedicated element │ language toggle │ body scan
//!                      └─► wait (positive / empty negative / garbage negative)
//!                            └─► verdict ─► screenshot
//! ```
//!
//! The real-time typing check ([`UI_SMOKE_ID`]) takes a fixed path instead:
//! click the input, type key by key, then wait for new Sinhala text anywhere
//! on the page.
//!
//! The output only ever appears asynchronously, so every observation goes
//! through the polling primitives in [`crate::wait`].

use crate::case::TestCase;
use crate::classify::{is_ui_smoke_id, Classification};
use crate::config::{SuiteConfig, UnknownPolicy};
use crate::driver::{ElementRef, PageDriver};
use crate::locator::{resolve_first, resolve_first_where, resolve_within};
use crate::result::ProbeResult;
use crate::script::{contains_sinhala, longest_sinhala_line};
use crate::verdict::{Attachment, CaseOutcome, OutputSource, Verdict};
use crate::wait::{poll_holds, poll_until, HoldOutcome, LoadState, WaitOutcome};
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Instant;

/// Flag added to outcomes of cases run with positive expectations by default
pub const UNKNOWN_CLASSIFICATION_FLAG: &str = "classification unknown";

/// Identifier of the real-time typing check
pub const UI_SMOKE_ID: &str = "Pos_UI_0001";

/// The real-time typing check as a case; row 0 marks it as not from a sheet
#[must_use]
pub fn ui_smoke_case(config: &SuiteConfig) -> TestCase {
    TestCase::new(
        UI_SMOKE_ID,
        "Output updates automatically in real-time",
        config.ui_smoke.input.clone(),
        "",
        "Positive",
        0,
    )
}

/// Where output is read from during the wait
#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputProbe {
    /// Read the value of an element
    Element {
        element: ElementRef,
        source: OutputSource,
    },
    /// Scan the page text for Sinhala lines that were not there before typing
    Body { baseline: HashSet<String> },
}

impl OutputProbe {
    const fn source(&self) -> OutputSource {
        match self {
            Self::Element { source, .. } => *source,
            Self::Body { .. } => OutputSource::BodyScan,
        }
    }
}

/// Trimmed lines of `text` that contain Sinhala
fn sinhala_lines(text: &str) -> HashSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| contains_sinhala(l))
        .map(ToString::to_string)
        .collect()
}

/// Longest Sinhala line of `body` that is not part of `baseline`
fn fresh_sinhala_line(body: &str, baseline: &HashSet<String>) -> String {
    let fresh: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| !baseline.contains(*l))
        .collect();
    longest_sinhala_line(&fresh.join("\n"))
        .unwrap_or_default()
        .to_string()
}

/// File-system safe name for a case's screenshot
#[must_use]
pub fn screenshot_slug(case: &TestCase) -> String {
    static UNSAFE: OnceLock<Option<Regex>> = OnceLock::new();
    let id = UNSAFE
        .get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").ok())
        .as_ref()
        .map_or_else(
            || case.id().to_string(),
            |re| re.replace_all(case.id(), "_").into_owned(),
        );
    let id = id.trim_matches('_');
    if id.is_empty() {
        format!("row-{}", case.row_number())
    } else {
        format!("{id}-row-{}", case.row_number())
    }
}

/// Runs single cases against a page
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    config: SuiteConfig,
}

impl ScenarioRunner {
    /// Create a runner for `config`
    #[must_use]
    pub fn new(config: SuiteConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Directory screenshots are written to
    #[must_use]
    pub fn screenshot_dir(&self) -> PathBuf {
        self.config.artifacts_dir.join("screenshots")
    }

    /// Run one case on `page`.
    ///
    /// # Errors
    ///
    /// Returns an error only when navigation fails. Everything after that is
    /// folded into the outcome.
    pub async fn run<P: PageDriver + ?Sized>(
        &self,
        page: &P,
        case: &TestCase,
    ) -> ProbeResult<CaseOutcome> {
        let start = Instant::now();
        let unknown = case.classification() == Classification::Unknown;

        if unknown && self.config.unknown_cases == UnknownPolicy::Inconclusive {
            tracing::warn!(case = %case.title(), "unclassified case not run");
            return Ok(CaseOutcome::inconclusive(
                "classification unknown: neither type nor id marks the case positive or negative",
            ));
        }

        tracing::info!(case = %case.title(), class = %case.classification(), "running case");
        page.goto(
            &self.config.base_url,
            LoadState::DomContentLoaded,
            self.config.navigation_timeout(),
        )
        .await?;

        let driven = if is_ui_smoke_id(case.id()) {
            self.drive_ui_smoke(page, case).await
        } else {
            self.drive(page, case).await
        };
        let mut outcome = match driven {
            Ok(outcome) => outcome,
            Err(e) => CaseOutcome::failed(e.to_string()),
        };
        if unknown {
            tracing::warn!(case = %case.title(), "classification unknown, expecting Sinhala output");
            outcome = outcome.with_flag(UNKNOWN_CLASSIFICATION_FLAG);
        }
        outcome = outcome.with_elapsed(start.elapsed());
        if let Some(shot) = self.capture(page, case).await {
            outcome = outcome.with_screenshot(shot);
        }

        tracing::info!(
            case = %case.title(),
            verdict = %outcome.verdict,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "case finished"
        );
        Ok(outcome)
    }

    /// Run the real-time typing check on `page`.
    ///
    /// # Errors
    ///
    /// Returns an error only when navigation fails.
    pub async fn run_ui_smoke<P: PageDriver + ?Sized>(&self, page: &P) -> ProbeResult<CaseOutcome> {
        self.run(page, &ui_smoke_case(&self.config)).await
    }

    /// Click, type key by key, then wait for Sinhala text new to the page
    async fn drive_ui_smoke<P: PageDriver + ?Sized>(
        &self,
        page: &P,
        case: &TestCase,
    ) -> ProbeResult<CaseOutcome> {
        let Some(input) =
            resolve_within(page, &self.config.surfaces.input, &self.config.input_wait()).await
        else {
            return Ok(CaseOutcome::inconclusive(format!(
                "no input surface found within {}ms",
                self.config.input_timeout_ms
            )));
        };
        let input = input.element;
        let baseline = sinhala_lines(&page.body_text().await.unwrap_or_default());

        page.click(&input).await?;
        page.type_text_with_delay(&input, case.input(), self.config.ui_smoke_key_delay())
            .await?;

        let probe = OutputProbe::Body { baseline };
        let source = Some(OutputSource::BodyScan);
        let waited = poll_until(
            &self.config.ui_smoke_wait(),
            || self.sample(page, &probe),
            |s| !s.is_empty(),
        )
        .await;

        Ok(match waited {
            WaitOutcome::Met { value, .. } => {
                CaseOutcome::new(Verdict::Pass).with_output(value, source)
            }
            WaitOutcome::TimedOut { last_error, .. } => {
                let detail = last_error.map_or_else(String::new, |e| format!(" ({e})"));
                CaseOutcome::new(Verdict::NoOutputLocated).with_reason(format!(
                    "no Sinhala text appeared within {}ms of typing{detail}",
                    self.config.ui_smoke.timeout_ms
                ))
            }
        })
    }

    async fn drive<P: PageDriver + ?Sized>(
        &self,
        page: &P,
        case: &TestCase,
    ) -> ProbeResult<CaseOutcome> {
        let Some(input) =
            resolve_within(page, &self.config.surfaces.input, &self.config.input_wait()).await
        else {
            return Ok(CaseOutcome::inconclusive(format!(
                "no input surface found within {}ms",
                self.config.input_timeout_ms
            )));
        };
        let input = input.element;

        let baseline = match page.body_text().await {
            Ok(body) => sinhala_lines(&body),
            Err(e) => {
                tracing::debug!(error = %e, "no baseline body text");
                HashSet::new()
            }
        };

        page.clear(&input).await?;
        if !case.input().is_empty() {
            page.type_text(&input, case.input()).await?;
        }

        let probe = self.output_probe(page, &input, baseline).await;
        tracing::debug!(case = %case.id(), source = %probe.source(), "reading output");

        if case.is_negative() {
            if case.has_empty_input() {
                Ok(self.expect_nothing(page, &probe).await)
            } else {
                Ok(self.expect_survival(page, &probe).await)
            }
        } else {
            Ok(self.expect_sinhala(page, &probe).await)
        }
    }

    /// Pick where to read output from; first success wins
    async fn output_probe<P: PageDriver + ?Sized>(
        &self,
        page: &P,
        input: &ElementRef,
        baseline: HashSet<String>,
    ) -> OutputProbe {
        let surfaces = &self.config.surfaces;

        if let Ok(Some(found)) =
            resolve_first_where(page, &surfaces.output, |e| !e.same_element(input)).await
        {
            return OutputProbe::Element {
                element: found.element,
                source: OutputSource::DedicatedElement,
            };
        }

        if let Ok(Some(toggle)) = resolve_first(page, &surfaces.toggle).await {
            match page.click(&toggle.element).await {
                Ok(()) => {
                    return OutputProbe::Element {
                        element: input.clone(),
                        source: OutputSource::LanguageToggle,
                    }
                }
                Err(e) => tracing::debug!(error = %e, "language toggle not clickable"),
            }
        }

        OutputProbe::Body { baseline }
    }

    async fn sample<P: PageDriver + ?Sized>(
        &self,
        page: &P,
        probe: &OutputProbe,
    ) -> ProbeResult<String> {
        match probe {
            OutputProbe::Element { element, .. } => {
                Ok(page.read_value(element).await?.trim().to_string())
            }
            OutputProbe::Body { baseline } => {
                Ok(fresh_sinhala_line(&page.body_text().await?, baseline))
            }
        }
    }

    /// Positive expectation: non-empty Sinhala output appears
    async fn expect_sinhala<P: PageDriver + ?Sized>(
        &self,
        page: &P,
        probe: &OutputProbe,
    ) -> CaseOutcome {
        let source = Some(probe.source());
        let waited = poll_until(
            &self.config.output_wait(),
            || self.sample(page, probe),
            |s| !s.is_empty() && contains_sinhala(s),
        )
        .await;

        match waited {
            WaitOutcome::Met { value, .. } => {
                CaseOutcome::new(Verdict::Pass).with_output(value, source)
            }
            WaitOutcome::TimedOut {
                last, last_error, ..
            } => {
                let last = last.unwrap_or_default();
                let ms = self.config.output_timeout_ms;
                let outcome = if matches!(probe, OutputProbe::Body { .. }) {
                    CaseOutcome::new(Verdict::NoOutputLocated)
                        .with_reason(format!("no new Sinhala text on the page after {ms}ms"))
                } else if last.is_empty() {
                    let detail = last_error.map_or_else(String::new, |e| format!(" ({e})"));
                    CaseOutcome::new(Verdict::EmptyOutput)
                        .with_reason(format!("output stayed empty for {ms}ms{detail}"))
                } else {
                    CaseOutcome::new(Verdict::Fail)
                        .with_reason(format!("output contains no Sinhala characters: {last:?}"))
                };
                outcome.with_output(last, source)
            }
        }
    }

    /// Negative expectation for blank input: no Sinhala shows up in the window
    async fn expect_nothing<P: PageDriver + ?Sized>(
        &self,
        page: &P,
        probe: &OutputProbe,
    ) -> CaseOutcome {
        let source = Some(probe.source());
        let held = poll_holds(
            &self.config.negative_wait(),
            || self.sample(page, probe),
            |s| !contains_sinhala(s),
        )
        .await;

        match held {
            HoldOutcome::Held { last, .. } => {
                CaseOutcome::new(Verdict::Pass).with_output(last, source)
            }
            HoldOutcome::Broken { value, elapsed, .. } => CaseOutcome::new(Verdict::Fail)
                .with_reason(format!(
                    "Sinhala output appeared for empty input after {}ms",
                    elapsed.as_millis()
                ))
                .with_output(value, source),
            HoldOutcome::Unobserved { last_error, .. } => CaseOutcome::inconclusive(format!(
                "output could not be observed: {}",
                last_error.unwrap_or_else(|| "no sample taken".to_string())
            )),
        }
    }

    /// Negative expectation for garbage input: the page survives it
    async fn expect_survival<P: PageDriver + ?Sized>(
        &self,
        page: &P,
        probe: &OutputProbe,
    ) -> CaseOutcome {
        let source = Some(probe.source());
        let settled = poll_until(
            &self.config.negative_wait(),
            || self.sample(page, probe),
            |_| false,
        )
        .await;
        let last = settled.into_value().unwrap_or_default();

        if page.is_alive().await {
            CaseOutcome::new(Verdict::Pass).with_output(last, source)
        } else {
            CaseOutcome::failed("page stopped responding after invalid input")
                .with_output(last, source)
        }
    }

    /// Save a screenshot; failures are logged and dropped
    async fn capture<P: PageDriver + ?Sized>(&self, page: &P, case: &TestCase) -> Option<Attachment> {
        let bytes = match page.screenshot().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(case = %case.title(), error = %e, "screenshot failed");
                return None;
            }
        };
        let dir = self.screenshot_dir();
        let path = dir.join(format!("{}.png", screenshot_slug(case)));
        let written = match tokio::fs::create_dir_all(&dir).await {
            Ok(()) => tokio::fs::write(&path, bytes).await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => Some(Attachment::png(case.title(), path)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not save screenshot");
                None
            }
        }
    }
}
