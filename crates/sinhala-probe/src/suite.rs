//! Suite Runner
//!
//! Runs cases strictly one after another, each on a fresh page, and collects
//! the results into a [`Report`]. A case never takes the suite down with it:
//! navigation errors, page acquisition errors and the per-case timeout all
//! become failing outcomes.

use crate::case::TestCase;
use crate::config::SuiteConfig;
use crate::driver::PageSource;
use crate::reporter::{CaseRecord, Report};
use crate::result::{ProbeError, ProbeResult};
use crate::scenario::{ui_smoke_case, ScenarioRunner};
use crate::verdict::CaseOutcome;
use std::time::Instant;
use tokio::time::{timeout_at, Instant as Deadline};

/// Suite name used in reports
pub const SUITE_NAME: &str = "Singlish to Sinhala transliteration";

/// Progress hooks, called from the runner's task
pub trait RunObserver: Send {
    /// A case is about to run for the first time
    fn case_started(&mut self, _index: usize, _total: usize, _case: &TestCase) {}

    /// An attempt failed and the case will be retried
    fn case_retrying(&mut self, _case: &TestCase, _attempt: u32, _outcome: &CaseOutcome) {}

    /// A case has its final record
    fn case_finished(&mut self, _index: usize, _total: usize, _record: &CaseRecord) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Keep the cases whose title contains `pattern`, ignoring case
#[must_use]
pub fn filter_cases(cases: Vec<TestCase>, pattern: &str) -> Vec<TestCase> {
    let pattern = pattern.to_lowercase();
    cases
        .into_iter()
        .filter(|c| c.title().to_lowercase().contains(&pattern))
        .collect()
}

/// Sequential runner over a case list
#[derive(Debug, Clone)]
pub struct SuiteRunner {
    scenario: ScenarioRunner,
    retries: u32,
}

impl SuiteRunner {
    /// Create a runner after validating `config`
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] for an unusable configuration.
    pub fn new(config: SuiteConfig) -> ProbeResult<Self> {
        config.validate()?;
        let retries = config.effective_retries();
        Ok(Self {
            scenario: ScenarioRunner::new(config),
            retries,
        })
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        self.scenario.config()
    }

    /// Extra attempts granted to failing cases
    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.retries
    }

    /// Run `cases` in order, one page each.
    pub async fn run<S: PageSource>(
        &self,
        source: &mut S,
        cases: &[TestCase],
        observer: &mut dyn RunObserver,
    ) -> Report {
        let config = self.config();
        let mut report = Report::new(SUITE_NAME, config.gate)
            .with_base_url(&config.base_url)
            .with_artifacts_dir(&config.artifacts_dir);
        // The real-time typing check runs once, ahead of the sheet
        let smoke = config.ui_smoke.enabled.then(|| ui_smoke_case(config));
        let planned: Vec<&TestCase> = smoke.iter().chain(cases).collect();
        let total = planned.len();
        tracing::info!(total, gate = %config.gate, retries = self.retries, "suite started");

        for (index, &case) in planned.iter().enumerate() {
            observer.case_started(index, total, case);

            let mut attempts = 0;
            let outcome = loop {
                attempts += 1;
                let outcome = self.attempt(source, case).await;
                if !outcome.verdict.is_failing_under(config.gate) || attempts > self.retries {
                    break outcome;
                }
                tracing::info!(case = %case.title(), attempt = attempts, verdict = %outcome.verdict, "retrying case");
                observer.case_retrying(case, attempts, &outcome);
            };

            let failing = outcome.verdict.is_failing_under(config.gate);
            let record = CaseRecord::new(case, outcome, attempts);
            observer.case_finished(index, total, &record);
            report.record(record);

            if failing && config.fail_fast {
                let rest = &planned[index + 1..];
                tracing::warn!(case = %case.title(), not_run = rest.len(), "fail-fast stop");
                for skipped in rest {
                    report.mark_not_run(skipped);
                }
                break;
            }
        }

        report.finish();
        tracing::info!(summary = %report.summary(), "suite finished");
        report
    }

    /// One attempt: acquire, run, release, all inside the case deadline
    async fn attempt<S: PageSource>(&self, source: &mut S, case: &TestCase) -> CaseOutcome {
        let config = self.config();
        let started = Instant::now();
        let deadline = Deadline::now() + config.case_timeout();
        let timed_out = || ProbeError::Timeout {
            ms: config.case_timeout_ms,
        };

        let page = match timeout_at(deadline, source.acquire()).await {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                tracing::error!(case = %case.title(), error = %e, "could not open page");
                return CaseOutcome::failed(e.to_string()).with_elapsed(started.elapsed());
            }
            Err(_) => {
                return CaseOutcome::failed(timed_out().to_string()).with_elapsed(started.elapsed())
            }
        };

        let result = match timeout_at(deadline, self.scenario.run(&page, case)).await {
            Ok(result) => result,
            Err(_) => Err(timed_out()),
        };

        if let Err(e) = source.release(page).await {
            tracing::warn!(case = %case.title(), error = %e, "could not close page");
        }

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(case = %case.title(), error = %e, "case aborted");
                CaseOutcome::failed(e.to_string()).with_elapsed(started.elapsed())
            }
        }
    }
}
