//! Sinhala Probe CLI: browser checks for the transliteration web app
//!
//! ## Usage
//!
//! ```bash
//! sinhala-probe run                          # Run every case in the workbook
//! sinhala-probe run --filter Neg_ --headed   # Watch the negative cases run
//! sinhala-probe list --format json           # Show collected cases
//! sinhala-probe config --config probe.yaml   # Show effective configuration
//! ```

use clap::Parser;
use sinhala_probe_cli::{
    init_tracing, list_cases, run_suite, show_config, Cli, CliConfig, CliResult, ColorChoice,
    Commands, LogFormat, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the command succeeded
fn run() -> CliResult<bool> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    init_tracing(&config);

    match cli.command {
        Commands::Run(args) => {
            let config = config.with_config_file(args.config.clone());
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_suite(&config, &args))
        }
        Commands::List(args) => {
            let config = config.with_config_file(args.config.clone());
            list_cases(&config, &args)?;
            Ok(true)
        }
        Commands::Config(args) => {
            show_config(args.config.as_deref())?;
            Ok(true)
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.clone().into();
    let log_format: LogFormat = cli.log_format.clone().into();

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(color)
        .with_log_format(log_format)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod build_config_tests {
        use super::*;

        #[test]
        fn test_build_config_default() {
            let cli = Cli::parse_from(["sinhala-probe", "config"]);
            let config = build_config(&cli);
            assert_eq!(config.verbosity, Verbosity::Normal);
            assert_eq!(config.log_format, LogFormat::Text);
        }

        #[test]
        fn test_build_config_verbose() {
            let cli = Cli::parse_from(["sinhala-probe", "-v", "config"]);
            assert_eq!(build_config(&cli).verbosity, Verbosity::Verbose);
        }

        #[test]
        fn test_build_config_quiet_wins() {
            let cli = Cli::parse_from(["sinhala-probe", "-q", "-vv", "config"]);
            assert_eq!(build_config(&cli).verbosity, Verbosity::Quiet);
        }

        #[test]
        fn test_build_config_json_logs() {
            let cli = Cli::parse_from(["sinhala-probe", "--log-format", "json", "--color", "never", "config"]);
            let config = build_config(&cli);
            assert_eq!(config.log_format, LogFormat::Json);
            assert_eq!(config.color, ColorChoice::Never);
        }
    }
}
