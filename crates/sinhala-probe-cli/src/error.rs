//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Suite could not be run
    #[error("Test execution failed: {message}")]
    TestExecution {
        /// Error message
        message: String,
    },

    /// Report generation error
    #[error("Report generation failed: {message}")]
    ReportGeneration {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Probe library error
    #[error("{0}")]
    Probe(#[from] sinhala_probe::ProbeError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a test execution error
    #[must_use]
    pub fn test_execution(message: impl Into<String>) -> Self {
        Self::TestExecution {
            message: message.into(),
        }
    }

    /// Create a report generation error
    #[must_use]
    pub fn report_generation(message: impl Into<String>) -> Self {
        Self::ReportGeneration {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sinhala_probe::ProbeError;
    use std::path::PathBuf;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad gate");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad gate"));
    }

    #[test]
    fn test_test_execution_error() {
        let err = CliError::test_execution("gate failed");
        assert!(err.to_string().contains("Test execution"));
    }

    #[test]
    fn test_report_generation_error() {
        let err = CliError::report_generation("disk full");
        assert!(err.to_string().contains("Report generation"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CliError = io_err.into();
        assert!(matches!(err, CliError::Io(_)));
    }

    #[test]
    fn test_probe_error_keeps_its_message() {
        let err: CliError = ProbeError::CaseSourceNotFound {
            path: PathBuf::from("cases.xlsx"),
        }
        .into();
        assert!(matches!(err, CliError::Probe(_)));
        assert!(err.to_string().contains("cases.xlsx"));
    }
}
