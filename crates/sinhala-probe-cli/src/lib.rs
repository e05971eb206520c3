//! Sinhala Probe CLI library
//!
//! Command-line front end for the `sinhala-probe` crate: argument parsing,
//! console progress, log setup and report writing.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod logging;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, GateArg, ListArgs, ListFormat, LogFormatArg,
    ReportFormat, RunArgs, UnknownArg,
};
pub use config::{CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::{env_filter, init_tracing};
pub use output::{case_line, ProgressReporter};
pub use runner::{
    apply_run_args, collect_cases, effective_config, list_cases, load_suite_config,
    render_case_list, run_suite, show_config, write_reports,
};
