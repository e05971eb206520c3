//! Wait Mechanisms
//!
//! Polling primitives for a target that updates asynchronously and with
//! unpredictable timing. Nothing here knows about the DOM: a wait is a
//! sampler (an async closure producing the current state), a predicate over
//! that state, an interval and a deadline.
//!
//! - [`poll_until`] resolves as soon as the predicate holds.
//! - [`poll_holds`] confirms the predicate keeps holding for the whole window.
//!
//! Running out of time is an ordinary outcome, not an error. Samplers that
//! hang are cut off at the deadline.

use crate::result::ProbeResult;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (250ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

// =============================================================================
// LOAD STATE
// =============================================================================

/// Page load states a navigation can wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// Wait for the `load` event to fire
    #[default]
    Load,
    /// Wait for `DOMContentLoaded` (document parsed, subresources may still load)
    DomContentLoaded,
}

impl LoadState {
    /// Get the JavaScript event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
        }
    }

    /// `document.readyState` values that satisfy this load state
    #[must_use]
    pub const fn ready_states(&self) -> &'static [&'static str] {
        match self {
            Self::Load => &["complete"],
            Self::DomContentLoaded => &["interactive", "complete"],
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create options from a timeout and an interval, both in milliseconds
    #[must_use]
    pub const fn from_millis(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            timeout_ms,
            poll_interval_ms,
        }
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Result of [`poll_until`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    /// The predicate held for `value`
    Met {
        /// Sample that satisfied the predicate
        value: T,
        /// Time spent waiting
        elapsed: Duration,
        /// Number of samples taken
        samples: u32,
    },
    /// The deadline passed first
    TimedOut {
        /// Last successful sample, if any
        last: Option<T>,
        /// Last sampler error, if any
        last_error: Option<String>,
        /// Time spent waiting
        elapsed: Duration,
        /// Number of samples taken
        samples: u32,
    },
}

impl<T> WaitOutcome<T> {
    /// Whether the condition was met
    #[must_use]
    pub const fn is_met(&self) -> bool {
        matches!(self, Self::Met { .. })
    }

    /// The satisfying sample, or the last one seen before the deadline
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Met { value, .. } => Some(value),
            Self::TimedOut { last, .. } => last.as_ref(),
        }
    }

    /// Consume the outcome, returning the best known sample
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Met { value, .. } => Some(value),
            Self::TimedOut { last, .. } => last,
        }
    }

    /// Time spent waiting
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Met { elapsed, .. } | Self::TimedOut { elapsed, .. } => *elapsed,
        }
    }

    /// Number of samples taken
    #[must_use]
    pub const fn samples(&self) -> u32 {
        match self {
            Self::Met { samples, .. } | Self::TimedOut { samples, .. } => *samples,
        }
    }
}

/// Result of [`poll_holds`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldOutcome<T> {
    /// Every successful sample satisfied the predicate
    Held {
        /// Last sample observed
        last: T,
        /// Number of samples taken
        samples: u32,
    },
    /// A sample violated the predicate
    Broken {
        /// The violating sample
        value: T,
        /// Time into the window when it was seen
        elapsed: Duration,
        /// Number of samples taken
        samples: u32,
    },
    /// No sample could be taken at all
    Unobserved {
        /// Last sampler error, if any
        last_error: Option<String>,
        /// Number of attempts
        samples: u32,
    },
}

impl<T> HoldOutcome<T> {
    /// Whether the predicate held through the window
    #[must_use]
    pub const fn held(&self) -> bool {
        matches!(self, Self::Held { .. })
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Sample until `predicate` holds or `options.timeout_ms` elapses.
///
/// The first sample is taken immediately, then one every poll interval; a
/// final sample is taken at the deadline. A sampler error counts as "not
/// met" for that tick.
pub async fn poll_until<T, F, Fut, P>(
    options: &WaitOptions,
    mut sampler: F,
    predicate: P,
) -> WaitOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<T>>,
    P: Fn(&T) -> bool,
{
    let start = Instant::now();
    let deadline = start + options.timeout();
    let mut samples = 0;
    let mut last = None;
    let mut last_error = None;

    loop {
        samples += 1;
        // The sample at the deadline still gets one interval to answer
        let sample_deadline = deadline.max(Instant::now()) + options.poll_interval();
        match timeout_at(sample_deadline, sampler()).await {
            Ok(Ok(value)) if predicate(&value) => {
                return WaitOutcome::Met {
                    value,
                    elapsed: start.elapsed(),
                    samples,
                };
            }
            Ok(Ok(value)) => last = Some(value),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, sample = samples, "sampler failed");
                last_error = Some(e.to_string());
            }
            Err(_) => {
                last_error.get_or_insert_with(|| format!("sample cut off at {}ms", options.timeout_ms));
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return WaitOutcome::TimedOut {
                last,
                last_error,
                elapsed: start.elapsed(),
                samples,
            };
        }
        sleep(options.poll_interval().min(deadline - now)).await;
    }
}

/// Confirm that `predicate` holds on every sample for the whole window.
///
/// A single sample cannot tell "never updated" from "updated and happened to
/// match", so sampling continues until the deadline and at least two samples
/// are always taken. Sampler errors neither confirm nor break the hold.
pub async fn poll_holds<T, F, Fut, P>(
    options: &WaitOptions,
    mut sampler: F,
    predicate: P,
) -> HoldOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<T>>,
    P: Fn(&T) -> bool,
{
    let start = Instant::now();
    let deadline = start + options.timeout();
    let mut samples = 0;
    let mut last = None;
    let mut last_error = None;

    loop {
        samples += 1;
        // A hung sampler still gets one interval past the window
        let sample_deadline = deadline.max(Instant::now()) + options.poll_interval();
        match timeout_at(sample_deadline, sampler()).await {
            Ok(Ok(value)) if !predicate(&value) => {
                return HoldOutcome::Broken {
                    value,
                    elapsed: start.elapsed(),
                    samples,
                };
            }
            Ok(Ok(value)) => last = Some(value),
            Ok(Err(e)) => last_error = Some(e.to_string()),
            Err(_) => {
                last_error.get_or_insert_with(|| "sample cut off".to_string());
            }
        }

        let now = Instant::now();
        if now >= deadline && samples >= 2 {
            return match last {
                Some(last) => HoldOutcome::Held { last, samples },
                None => HoldOutcome::Unobserved {
                    last_error,
                    samples,
                },
            };
        }
        let pause = if now >= deadline {
            options.poll_interval()
        } else {
            options.poll_interval().min(deadline - now)
        };
        sleep(pause).await;
    }
}

// =============================================================================
// TESTS
// =============================================================================
