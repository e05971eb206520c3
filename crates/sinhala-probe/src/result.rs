//! Result and error types for sinhala-probe.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while collecting or running cases
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The case spreadsheet does not exist
    #[error("Case source not found: {}", path.display())]
    CaseSourceNotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// The case spreadsheet exists but cannot be used
    #[error("Case source error: {message}")]
    CaseSource {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// A previously resolved element is gone from the document
    #[error("Element {key} is no longer attached to the page")]
    ElementDetached {
        /// Probe key of the element
        key: String,
    },

    /// Input simulation error
    #[error("Input simulation failed: {message}")]
    Input {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Invalid suite configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }

    /// Create an input error
    #[must_use]
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a case source error
    #[must_use]
    pub fn case_source(message: impl Into<String>) -> Self {
        Self::CaseSource {
            message: message.into(),
        }
    }
}
