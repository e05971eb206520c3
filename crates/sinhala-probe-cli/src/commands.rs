//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use sinhala_probe::{GatePolicy, UnknownPolicy};
use std::path::PathBuf;

/// Sinhala Probe: spreadsheet-driven browser checks for a Singlish to Sinhala
/// transliteration web app
#[derive(Parser, Debug)]
#[command(name = "sinhala-probe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (failures and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format (text, json)
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the case workbook against the web app
    Run(RunArgs),

    /// List the cases collected from the workbook
    List(ListArgs),

    /// Show the effective suite configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Case workbook (.xlsx)
    #[arg(long, env = "SINHALA_PROBE_CASES")]
    pub cases: Option<PathBuf>,

    /// Suite configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Page every case starts from
    #[arg(long, env = "SINHALA_PROBE_BASE_URL")]
    pub base_url: Option<String>,

    /// Only run cases whose title contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Extra attempts for failing cases (default: 0, or 2 under CI)
    #[arg(long)]
    pub retries: Option<u32>,

    /// How verdicts gate the exit status
    #[arg(long)]
    pub gate: Option<GateArg>,

    /// How cases with no classification are run
    #[arg(long)]
    pub unknown: Option<UnknownArg>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Disable the Chromium sandbox (containers)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Chromium binary
    #[arg(long, env = "CHROMIUM_PATH")]
    pub chromium: Option<PathBuf>,

    /// Stop after the first failing case
    #[arg(long)]
    pub fail_fast: bool,

    /// Skip the real-time typing check that runs before the sheet
    #[arg(long)]
    pub no_ui_smoke: bool,

    /// Output directory for reports and screenshots
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report formats to write
    #[arg(long, value_delimiter = ',', default_values = ["html", "junit", "json"])]
    pub report: Vec<ReportFormat>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Case workbook (.xlsx)
    #[arg(long, env = "SINHALA_PROBE_CASES")]
    pub cases: Option<PathBuf>,

    /// Suite configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Only list cases whose title contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ListFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Suite configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Report output format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    /// Standalone HTML page
    Html,
    /// JUnit XML for CI systems
    Junit,
    /// Machine-readable JSON
    Json,
}

impl ReportFormat {
    /// File name written into the output directory
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Html => "report.html",
            Self::Junit => "junit.xml",
            Self::Json => "report.json",
        }
    }
}

/// Listing format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListFormat {
    /// One line per case
    #[default]
    Text,
    /// JSON array of cases
    Json,
}

/// Gate argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateArg {
    /// Every case must pass
    Strict,
    /// Only outright failures fail the run
    Lenient,
    /// Report only; never fail the run
    Soft,
}

impl From<GateArg> for GatePolicy {
    fn from(arg: GateArg) -> Self {
        match arg {
            GateArg::Strict => Self::Strict,
            GateArg::Lenient => Self::Lenient,
            GateArg::Soft => Self::Soft,
        }
    }
}

/// Unknown-classification argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnknownArg {
    /// Run as positive and flag the record
    Flag,
    /// Skip the page and record Inconclusive
    Inconclusive,
}

impl From<UnknownArg> for UnknownPolicy {
    fn from(arg: UnknownArg) -> Self {
        match arg {
            UnknownArg::Flag => Self::Flag,
            UnknownArg::Inconclusive => Self::Inconclusive,
        }
    }
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log format argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl From<LogFormatArg> for crate::config::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_run_command() {
            let cli = Cli::parse_from(["sinhala-probe", "run"]);
            let Commands::Run(args) = cli.command else {
                panic!("expected Run command");
            };
            assert!(args.gate.is_none());
            assert!(!args.headed);
            assert!(!args.fail_fast);
            assert!(!args.no_ui_smoke);
            assert_eq!(
                args.report,
                vec![ReportFormat::Html, ReportFormat::Junit, ReportFormat::Json]
            );
        }

        #[test]
        fn test_parse_run_with_everything() {
            let cli = Cli::parse_from([
                "sinhala-probe",
                "run",
                "--cases",
                "sheet.xlsx",
                "--base-url",
                "http://localhost:8080/",
                "--filter",
                "Neg",
                "--retries",
                "3",
                "--gate",
                "lenient",
                "--unknown",
                "inconclusive",
                "--headed",
                "--no-sandbox",
                "--fail-fast",
                "--no-ui-smoke",
                "--output",
                "out",
                "--report",
                "junit,json",
            ]);
            let Commands::Run(args) = cli.command else {
                panic!("expected Run command");
            };
            assert_eq!(args.cases, Some(PathBuf::from("sheet.xlsx")));
            assert_eq!(args.base_url.as_deref(), Some("http://localhost:8080/"));
            assert_eq!(args.filter.as_deref(), Some("Neg"));
            assert_eq!(args.retries, Some(3));
            assert_eq!(args.gate, Some(GateArg::Lenient));
            assert_eq!(args.unknown, Some(UnknownArg::Inconclusive));
            assert!(args.headed);
            assert!(args.no_sandbox);
            assert!(args.fail_fast);
            assert!(args.no_ui_smoke);
            assert_eq!(args.output, Some(PathBuf::from("out")));
            assert_eq!(args.report, vec![ReportFormat::Junit, ReportFormat::Json]);
        }

        #[test]
        fn test_parse_list_json() {
            let cli = Cli::parse_from(["sinhala-probe", "list", "--format", "json"]);
            let Commands::List(args) = cli.command else {
                panic!("expected List command");
            };
            assert_eq!(args.format, ListFormat::Json);
        }

        #[test]
        fn test_parse_config_command() {
            let cli = Cli::parse_from(["sinhala-probe", "config", "--config", "probe.yaml"]);
            let Commands::Config(args) = cli.command else {
                panic!("expected Config command");
            };
            assert_eq!(args.config, Some(PathBuf::from("probe.yaml")));
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = Cli::parse_from(["sinhala-probe", "list", "-vv", "--color", "never"]);
            assert_eq!(cli.verbose, 2);
            assert!(matches!(cli.color, ColorArg::Never));
        }

        #[test]
        fn test_unknown_gate_is_rejected() {
            let result = Cli::try_parse_from(["sinhala-probe", "run", "--gate", "maybe"]);
            assert!(result.is_err());
        }

        #[test]
        fn test_subcommand_required() {
            assert!(Cli::try_parse_from(["sinhala-probe"]).is_err());
        }
    }

    mod conversion_tests {
        use super::*;
        use crate::config::{ColorChoice, LogFormat};

        #[test]
        fn test_gate_conversion() {
            assert_eq!(GatePolicy::from(GateArg::Strict), GatePolicy::Strict);
            assert_eq!(GatePolicy::from(GateArg::Lenient), GatePolicy::Lenient);
            assert_eq!(GatePolicy::from(GateArg::Soft), GatePolicy::Soft);
        }

        #[test]
        fn test_unknown_conversion() {
            assert_eq!(UnknownPolicy::from(UnknownArg::Flag), UnknownPolicy::Flag);
            assert_eq!(
                UnknownPolicy::from(UnknownArg::Inconclusive),
                UnknownPolicy::Inconclusive
            );
        }

        #[test]
        fn test_color_conversion() {
            assert_eq!(ColorChoice::from(ColorArg::Always), ColorChoice::Always);
            assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
            assert_eq!(ColorChoice::from(ColorArg::Auto), ColorChoice::Auto);
        }

        #[test]
        fn test_log_format_conversion() {
            assert_eq!(LogFormat::from(LogFormatArg::Json), LogFormat::Json);
            assert_eq!(LogFormat::from(LogFormatArg::Text), LogFormat::Text);
        }

        #[test]
        fn test_report_file_names() {
            assert_eq!(ReportFormat::Html.file_name(), "report.html");
            assert_eq!(ReportFormat::Junit.file_name(), "junit.xml");
            assert_eq!(ReportFormat::Json.file_name(), "report.json");
        }
    }
}
