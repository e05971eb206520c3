//! Sinhala Probe: spreadsheet-driven browser checks for a Singlish to Sinhala
//! transliteration web app.
//!
//! The application under test is reached only through its rendered page. The
//! crate reads test cases from a workbook, drives one page per case through a
//! [`PageDriver`], waits for the asynchronously rendered transliteration and
//! assigns each case a [`Verdict`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      SINHALA PROBE Architecture                      │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐    ┌─────────┐ │
//! │   │ Workbook   │    │ Suite      │    │ Scenario   │    │ Page    │ │
//! │   │ (xlsx)     │───►│ Runner     │───►│ Runner     │───►│ Driver  │ │
//! │   │ loader     │    │ retries    │    │ wait+judge │    │ CDP/mock│ │
//! │   └────────────┘    └─────┬──────┘    └────────────┘    └─────────┘ │
//! │                           ▼                                          │
//! │                    ┌────────────┐                                    │
//! │                    │ Report     │  HTML / JUnit / JSON               │
//! │                    └────────────┘                                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sinhala_probe::prelude::*;
//!
//! # async fn demo() -> ProbeResult<()> {
//! let config = SuiteConfig::default();
//! let cases = load_cases(&config.cases)?;
//! let runner = SuiteRunner::new(config)?;
//! let mut pages = MockPageSource::new(|_| MockPage::dedicated_layout());
//! let report = runner.run(&mut pages, &cases, &mut NoopObserver).await;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod browser;
mod case;
mod classify;
mod config;
mod driver;
mod loader;
mod locator;
mod mock_page;
mod reporter;
mod result;
mod scenario;
mod script;
mod suite;
mod verdict;
mod wait;

#[cfg(feature = "browser")]
pub use browser::{Browser, ChromiumPage};
pub use browser::BrowserConfig;
pub use case::{TestCase, UNTITLED_CASE};
pub use classify::{classify, is_ui_smoke_id, Classification};
pub use config::{
    default_retries, running_in_ci, SuiteConfig, Surfaces, UiSmoke, UnknownPolicy, Viewport,
    CI_RETRIES, DEFAULT_ARTIFACTS_DIR, DEFAULT_BASE_URL, DEFAULT_CASES_PATH,
};
pub use driver::{ElementRef, PageDriver, PageSource};
pub use loader::{cases_from_rows, load_cases, normalize_header, Field, HeaderMap};
pub use locator::{
    resolve_first, resolve_first_where, resolve_within, Locator, Nth, Resolved, Selector,
    DEFAULT_RESOLVE_TIMEOUT_MS,
};
pub use mock_page::{toy_transliteration, MockPage, MockPageSource, MOCK_PNG};
pub use reporter::{CaseRecord, Report};
pub use result::{ProbeError, ProbeResult};
pub use scenario::{
    screenshot_slug, ui_smoke_case, ScenarioRunner, UI_SMOKE_ID, UNKNOWN_CLASSIFICATION_FLAG,
};
pub use script::{contains_sinhala, is_sinhala, longest_sinhala_line, SINHALA_BLOCK};
pub use suite::{filter_cases, NoopObserver, RunObserver, SuiteRunner, SUITE_NAME};
pub use verdict::{Attachment, CaseOutcome, GatePolicy, OutputSource, Verdict};
pub use wait::{
    poll_holds, poll_until, HoldOutcome, LoadState, WaitOptions, WaitOutcome,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    #[cfg(feature = "browser")]
    pub use super::{Browser, ChromiumPage};
    pub use super::{
        load_cases, BrowserConfig, CaseOutcome, CaseRecord, Classification, GatePolicy,
        Locator, MockPage, MockPageSource, NoopObserver, PageDriver, PageSource, ProbeError,
        ProbeResult, Report, RunObserver, ScenarioRunner, Selector, SuiteConfig, SuiteRunner,
        TestCase, UnknownPolicy, Verdict,
    };
}
