//! Tracing subscriber setup

use crate::config::{CliConfig, LogFormat};
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, falling back to the verbosity level
#[must_use]
pub fn env_filter(config: &CliConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()))
}

/// Install the global subscriber; log lines go to stderr.
///
/// A second call leaves the first subscriber in place.
pub fn init_tracing(config: &CliConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match config.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
