//! Command implementations

use crate::commands::{ListArgs, ListFormat, ReportFormat, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use sinhala_probe::{filter_cases, load_cases, Report, SuiteConfig, SuiteRunner, TestCase};
use std::path::{Path, PathBuf};

/// Load the suite configuration file, or the defaults when none is given
pub fn load_suite_config(path: Option<&Path>) -> CliResult<SuiteConfig> {
    match path {
        Some(path) => Ok(SuiteConfig::from_yaml_file(path)?),
        None => Ok(SuiteConfig::default()),
    }
}

/// Layer `run` flags over a loaded configuration
#[must_use]
pub fn apply_run_args(mut config: SuiteConfig, args: &RunArgs) -> SuiteConfig {
    if let Some(ref cases) = args.cases {
        config.cases.clone_from(cases);
    }
    if let Some(ref url) = args.base_url {
        config.base_url.clone_from(url);
    }
    if let Some(retries) = args.retries {
        config.retries = Some(retries);
    }
    if let Some(gate) = args.gate {
        config.gate = gate.into();
    }
    if let Some(unknown) = args.unknown {
        config.unknown_cases = unknown.into();
    }
    if args.headed {
        config.headless = false;
    }
    if args.no_sandbox {
        config.sandbox = false;
    }
    if let Some(ref chromium) = args.chromium {
        config.chromium_path = Some(chromium.clone());
    }
    if args.fail_fast {
        config.fail_fast = true;
    }
    if args.no_ui_smoke {
        config.ui_smoke.enabled = false;
    }
    if let Some(ref output) = args.output {
        config.artifacts_dir.clone_from(output);
    }
    config
}

/// Configuration as it would be used, retries resolved
#[must_use]
pub fn effective_config(config: SuiteConfig) -> SuiteConfig {
    let retries = config.effective_retries();
    SuiteConfig {
        retries: Some(retries),
        ..config
    }
}

/// Collect cases from the workbook, narrowed by `filter`
pub fn collect_cases(path: &Path, filter: Option<&str>) -> CliResult<Vec<TestCase>> {
    let cases = load_cases(path)?;
    Ok(match filter {
        Some(pattern) => filter_cases(cases, pattern),
        None => cases,
    })
}

/// Write the requested report files into `dir`
pub fn write_reports(report: &Report, dir: &Path, formats: &[ReportFormat]) -> CliResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for format in formats {
        let path = dir.join(format.file_name());
        if written.contains(&path) {
            continue;
        }
        let result = match format {
            ReportFormat::Html => report.write_html(&path),
            ReportFormat::Junit => report.write_junit(&path),
            ReportFormat::Json => report.write_json(&path),
        };
        result.map_err(|e| {
            CliError::report_generation(format!("{}: {e}", path.display()))
        })?;
        written.push(path);
    }
    Ok(written)
}

/// Render the case listing
pub fn render_case_list(cases: &[TestCase], format: ListFormat) -> CliResult<String> {
    match format {
        ListFormat::Json => Ok(serde_json::to_string_pretty(cases)
            .map_err(sinhala_probe::ProbeError::from)?),
        ListFormat::Text => Ok(cases
            .iter()
            .map(|case| format!("{} [{}]\n", case.title(), case.classification()))
            .collect()),
    }
}

/// `list`: print the collected cases
pub fn list_cases(config: &CliConfig, args: &ListArgs) -> CliResult<()> {
    let suite = load_suite_config(config.config_file.as_deref())?;
    let path = args.cases.clone().unwrap_or(suite.cases);
    let cases = collect_cases(&path, args.filter.as_deref())?;

    print!("{}", render_case_list(&cases, args.format)?);
    if args.format == ListFormat::Json {
        println!();
    }

    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    reporter.info(&format!("{} cases collected from {}", cases.len(), path.display()));
    Ok(())
}

/// `config`: print the effective suite configuration as YAML
pub fn show_config(path: Option<&Path>) -> CliResult<()> {
    let suite = effective_config(load_suite_config(path)?);
    print!("{}", suite.to_yaml()?);
    Ok(())
}

/// `run`: execute the suite and write reports.
///
/// Returns whether the run passed its gate.
pub async fn run_suite(config: &CliConfig, args: &RunArgs) -> CliResult<bool> {
    let suite = apply_run_args(load_suite_config(config.config_file.as_deref())?, args);
    let cases = collect_cases(&suite.cases, args.filter.as_deref())?;
    if cases.is_empty() {
        return Err(CliError::test_execution(format!(
            "no cases to run in {}",
            suite.cases.display()
        )));
    }

    let runner = SuiteRunner::new(suite.clone())?;
    let mut reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet())
        .with_gate(suite.gate)
        .with_debug(config.verbosity.is_debug());

    let total = cases.len() + usize::from(suite.ui_smoke.enabled);
    reporter.header("Sinhala Probe");
    reporter.info(&format!(
        "{total} cases against {} (gate: {}, retries: {})",
        suite.base_url,
        suite.gate,
        runner.retries()
    ));

    reporter.start_progress(total as u64, "starting");
    let report = execute(&runner, &cases, &mut reporter).await;
    reporter.finish();
    let report = report?;

    for path in write_reports(&report, &suite.artifacts_dir, &args.report)? {
        if config.verbosity.is_verbose() {
            reporter.info(&format!("Report written to {}", path.display()));
        }
    }
    reporter.summary(&report);

    Ok(report.passed())
}

#[cfg(feature = "browser")]
async fn execute(
    runner: &SuiteRunner,
    cases: &[TestCase],
    reporter: &mut ProgressReporter,
) -> CliResult<Report> {
    use sinhala_probe::{Browser, BrowserConfig};

    let mut browser = Browser::launch(BrowserConfig::from_suite(runner.config())).await?;
    let report = runner.run(&mut browser, cases, reporter).await;
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "failed to close browser");
    }
    Ok(report)
}

#[cfg(not(feature = "browser"))]
async fn execute(
    _runner: &SuiteRunner,
    _cases: &[TestCase],
    _reporter: &mut ProgressReporter,
) -> CliResult<Report> {
    Err(CliError::config(
        "browser support not compiled in; rebuild with --features browser",
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands, GateArg};
    use clap::Parser;
    use sinhala_probe::{
        CaseOutcome, CaseRecord, GatePolicy, MockPage, MockPageSource, NoopObserver,
        UnknownPolicy, Verdict,
    };
    use tempfile::TempDir;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["sinhala-probe", "run"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            other => panic!("expected Run, got {other:?}"),
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_no_file_gives_defaults() {
            let config = load_suite_config(None).unwrap();
            assert_eq!(config.base_url, SuiteConfig::default().base_url);
        }

        #[test]
        fn test_missing_file_is_an_error() {
            let dir = TempDir::new().unwrap();
            let result = load_suite_config(Some(&dir.path().join("absent.yaml")));
            assert!(result.is_err());
        }

        #[test]
        fn test_file_is_read() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("probe.yaml");
            std::fs::write(&path, "base_url: http://localhost:3000/\ngate: soft\n").unwrap();
            let config = load_suite_config(Some(&path)).unwrap();
            assert_eq!(config.base_url, "http://localhost:3000/");
            assert_eq!(config.gate, GatePolicy::Soft);
        }

        #[test]
        fn test_flags_override_file_values() {
            let args = run_args(&[
                "--cases",
                "other.xlsx",
                "--base-url",
                "http://127.0.0.1/",
                "--retries",
                "1",
                "--gate",
                "lenient",
                "--unknown",
                "inconclusive",
                "--headed",
                "--no-sandbox",
                "--chromium",
                "/opt/chromium",
                "--fail-fast",
                "--output",
                "out",
            ]);
            let config = apply_run_args(SuiteConfig::default().with_gate(GatePolicy::Soft), &args);
            assert_eq!(config.cases, PathBuf::from("other.xlsx"));
            assert_eq!(config.base_url, "http://127.0.0.1/");
            assert_eq!(config.retries, Some(1));
            assert_eq!(config.gate, GatePolicy::Lenient);
            assert_eq!(config.unknown_cases, UnknownPolicy::Inconclusive);
            assert!(!config.headless);
            assert!(!config.sandbox);
            assert_eq!(config.chromium_path, Some(PathBuf::from("/opt/chromium")));
            assert!(config.fail_fast);
            assert_eq!(config.artifacts_dir, PathBuf::from("out"));
        }

        #[test]
        fn test_no_ui_smoke_flag_disables_typing_check() {
            assert!(apply_run_args(SuiteConfig::default(), &run_args(&[])).ui_smoke.enabled);
            let config = apply_run_args(SuiteConfig::default(), &run_args(&["--no-ui-smoke"]));
            assert!(!config.ui_smoke.enabled);
        }

        #[tokio::test]
        async fn test_run_reads_config_file_from_cli_config() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("probe.yaml");
            let cases = dir.path().join("from-file.xlsx");
            std::fs::write(&path, format!("cases: {}\n", cases.display())).unwrap();

            let mut args = run_args(&[]);
            args.cases = None;
            let config = CliConfig::new().with_config_file(Some(path));
            let err = run_suite(&config, &args).await.unwrap_err();
            assert!(err.to_string().contains("from-file.xlsx"), "{err}");
        }

        #[test]
        fn test_list_reads_config_file_from_cli_config() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("probe.yaml");
            std::fs::write(&path, "cases: listed-from-file.xlsx\n").unwrap();

            let args = ListArgs {
                cases: None,
                config: None,
                filter: None,
                format: ListFormat::Text,
            };
            let config = CliConfig::new().with_config_file(Some(path));
            let err = list_cases(&config, &args).unwrap_err();
            assert!(err.to_string().contains("listed-from-file.xlsx"), "{err}");
        }

        #[test]
        fn test_absent_flags_keep_file_values() {
            let base = SuiteConfig::default()
                .with_base_url("http://example.test/")
                .with_gate(GatePolicy::Soft)
                .with_retries(4);
            let args = run_args(&["--report", "json"]);
            let config = apply_run_args(base.clone(), &args);
            assert_eq!(config.gate, GatePolicy::Soft);
            assert_eq!(config.retries, Some(4));
            assert!(config.headless);
            assert!(config.sandbox);
            if std::env::var_os("SINHALA_PROBE_BASE_URL").is_none() {
                assert_eq!(config.base_url, base.base_url);
            }
        }

        #[test]
        fn test_gate_arg_maps_to_policy() {
            let args = run_args(&["--gate", "strict"]);
            assert_eq!(args.gate, Some(GateArg::Strict));
            let config = apply_run_args(SuiteConfig::default().with_gate(GatePolicy::Soft), &args);
            assert_eq!(config.gate, GatePolicy::Strict);
        }

        #[test]
        fn test_effective_config_resolves_retries() {
            let config = effective_config(SuiteConfig::default().with_retries(3));
            assert_eq!(config.retries, Some(3));
            let resolved = effective_config(SuiteConfig::default());
            assert!(resolved.retries.is_some());
        }
    }

    mod report_tests {
        use super::*;

        fn sample_report() -> Report {
            let case = TestCase::new("Pos_Fun_0001", "Greeting", "ayubowan", "", "Positive", 2);
            let mut report = Report::new("suite", GatePolicy::Strict);
            report.record(CaseRecord::new(&case, CaseOutcome::new(Verdict::Pass), 1));
            report.finish();
            report
        }

        #[test]
        fn test_writes_each_format_once() {
            let dir = TempDir::new().unwrap();
            let out = dir.path().join("nested").join("reports");
            let written = write_reports(
                &sample_report(),
                &out,
                &[ReportFormat::Html, ReportFormat::Junit, ReportFormat::Json, ReportFormat::Json],
            )
            .unwrap();
            assert_eq!(written.len(), 3);
            assert!(out.join("report.html").exists());
            assert!(out.join("junit.xml").exists());
            let json = std::fs::read_to_string(out.join("report.json")).unwrap();
            assert!(json.contains("Pos_Fun_0001"));
        }

        #[test]
        fn test_no_formats_writes_nothing() {
            let dir = TempDir::new().unwrap();
            let written = write_reports(&sample_report(), dir.path(), &[]).unwrap();
            assert!(written.is_empty());
        }
    }

    mod list_tests {
        use super::*;

        fn cases() -> Vec<TestCase> {
            vec![
                TestCase::new("Pos_Fun_0001", "Greeting", "ayubowan", "", "Positive", 2),
                TestCase::new("Neg_Fun_0001", "Empty", "", "", "", 3),
            ]
        }

        #[test]
        fn test_text_listing() {
            let text = render_case_list(&cases(), ListFormat::Text).unwrap();
            let lines: Vec<&str> = text.lines().collect();
            assert_eq!(lines.len(), 2);
            assert_eq!(lines[0], "Pos_Fun_0001 - Greeting (Row 2) [positive]");
            assert_eq!(lines[1], "Neg_Fun_0001 - Empty (Row 3) [negative]");
        }

        #[test]
        fn test_json_listing() {
            let json = render_case_list(&cases(), ListFormat::Json).unwrap();
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value.as_array().map(Vec::len), Some(2));
            assert_eq!(value[1]["classification"], "negative");
        }

        #[test]
        fn test_missing_workbook_is_an_error() {
            let dir = TempDir::new().unwrap();
            let err = collect_cases(&dir.path().join("absent.xlsx"), None).unwrap_err();
            assert!(err.to_string().contains("absent.xlsx"));
        }
    }

    mod observer_tests {
        use super::*;

        #[tokio::test]
        async fn test_reporter_drives_a_mock_suite() {
            let dir = TempDir::new().unwrap();
            let config = SuiteConfig::default()
                .with_artifacts_dir(dir.path())
                .with_retries(0)
                .with_fast_waits(300, 10)
                .with_ui_smoke(false);
            let runner = SuiteRunner::new(config).unwrap();
            let cases = vec![TestCase::new(
                "Pos_Fun_0001",
                "Greeting",
                "mama gedara yanawaa",
                "",
                "Positive",
                2,
            )];
            let mut reporter = ProgressReporter::new(false, true);
            let mut pages = MockPageSource::new(|_| MockPage::dedicated_layout());
            let report = runner.run(&mut pages, &cases, &mut reporter).await;
            assert!(report.passed());

            let quiet = runner.run(&mut pages, &cases, &mut NoopObserver).await;
            assert_eq!(quiet.passed_count(), report.passed_count());
        }
    }
}
