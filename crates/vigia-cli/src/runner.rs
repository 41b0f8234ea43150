//! Scenario execution and reporting for `vigia run` and `vigia list`

use crate::commands::{ListArgs, RunArgs};
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;
use vigia::reporter::{self, ReportFormat};
use vigia::scenario::{Feature, RunSummary, ScenarioRunner, World};
use vigia::suites::{self, Suite};
use vigia::{EnvironmentConfig, FileEvidenceSink};

/// Resolve configuration: `path` (when given) replaces the `VIGIA_CONFIG`
/// lookup, then env overrides apply and the result is validated
pub fn load_config(path: Option<&Path>) -> CliResult<EnvironmentConfig> {
    resolve_config(path, |key| std::env::var(key).ok())
}

fn resolve_config(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> CliResult<EnvironmentConfig> {
    let Some(path) = path else {
        return Ok(EnvironmentConfig::load_with(lookup)?);
    };
    if !path.is_file() {
        return Err(CliError::config(format!(
            "config file {} does not exist",
            path.display()
        )));
    }
    let mut config = EnvironmentConfig::from_file(path)?;
    config.apply_overrides(lookup)?;
    config.validate()?;
    Ok(config)
}

fn check_selection(filter: Option<&str>, tags: &[String]) -> CliResult<()> {
    if filter.is_some_and(|f| f.trim().is_empty()) {
        return Err(CliError::invalid_argument("--filter must not be empty"));
    }
    if tags.iter().any(|t| t.trim_start_matches('@').trim().is_empty()) {
        return Err(CliError::invalid_argument("--tag must name a tag"));
    }
    Ok(())
}

/// Runner configured from `vigia run` flags
#[must_use]
pub fn build_runner<'c>(config: &'c EnvironmentConfig, args: &RunArgs) -> ScenarioRunner<'c> {
    let mut runner = ScenarioRunner::new(config)
        .with_evidence(FileEvidenceSink::new(config.evidence_dir.clone()))
        .with_tags(args.tags.iter().cloned())
        .with_fail_fast(args.fail_fast);
    if let Some(filter) = &args.filter {
        runner = runner.with_name_filter(filter.as_str());
    }
    runner
}

fn run_feature<W: World>(
    runner: &mut ScenarioRunner<'_>,
    feature: &Feature<W>,
    reporter: &ProgressReporter,
    summary: &mut RunSummary,
) {
    if runner.selected(feature).is_empty() {
        return;
    }
    reporter.set_message(&feature.name);
    let result = runner.run_with(feature, |scenario| reporter.scenario_done(scenario));
    summary.push(result);
}

/// Run the selected suites and collect their results
pub fn execute(
    config: &EnvironmentConfig,
    args: &RunArgs,
    reporter: &mut ProgressReporter,
) -> RunSummary {
    let suite = Suite::from(args.suite);
    let mut runner = build_runner(config, args);
    let api = suites::api::feature();
    let storefront = suites::storefront::feature();

    let mut total = 0;
    if suite.includes_api() {
        total += runner.selected(&api).len();
    }
    if suite.includes_storefront() {
        total += runner.selected(&storefront).len();
    }
    info!(%suite, total, "starting run");
    reporter.start_progress(total as u64, "running scenarios");

    let mut summary = RunSummary::new();
    if suite.includes_api() {
        run_feature(&mut runner, &api, reporter, &mut summary);
    }
    if suite.includes_storefront() {
        run_feature(&mut runner, &storefront, reporter, &mut summary);
    }
    reporter.finish();
    summary
}

/// `vigia run`: execute, then print or write the report. Returns whether
/// every scenario passed.
pub fn run(args: &RunArgs, reporter: &mut ProgressReporter) -> CliResult<bool> {
    check_selection(args.filter.as_deref(), &args.tags)?;
    let config = load_config(args.config.as_deref())?;
    let summary = execute(&config, args, reporter);
    let format = ReportFormat::from(args.format);
    match &args.output {
        Some(path) => {
            reporter::write(&summary, format, path).map_err(|e| {
                CliError::report_generation(format!("cannot write {}: {e}", path.display()))
            })?;
            reporter.info(&format!("report written to {}", path.display()));
        }
        None => print!("{}", ensure_newline(reporter::render(&summary, format)?)),
    }
    let line = reporter::summary_line(&summary);
    if summary.success() {
        reporter.success(&line);
    } else {
        reporter.failure(&line);
    }
    Ok(summary.success())
}

fn ensure_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

/// `vigia list`: scenario names grouped by feature, with their tags
pub fn list(args: &ListArgs) -> CliResult<String> {
    check_selection(None, &args.tags)?;
    let suite = Suite::from(args.suite);
    let config = EnvironmentConfig::default();
    let runner = ScenarioRunner::new(&config).with_tags(args.tags.iter().cloned());
    let mut out = String::new();
    if suite.includes_api() {
        list_feature(&mut out, &runner, &suites::api::feature());
    }
    if suite.includes_storefront() {
        list_feature(&mut out, &runner, &suites::storefront::feature());
    }
    Ok(out)
}

fn list_feature<W>(out: &mut String, runner: &ScenarioRunner<'_>, feature: &Feature<W>) {
    let _ = writeln!(out, "Feature: {}", feature.name);
    for scenario in runner.selected(feature) {
        let tags: Vec<String> = scenario.tags.iter().map(|t| format!("@{t}")).collect();
        let _ = writeln!(out, "  {} {}", scenario.name, tags.join(" "));
    }
}

/// `vigia config`: the resolved configuration as YAML
pub fn show_config(path: Option<&Path>) -> CliResult<String> {
    Ok(load_config(path)?.to_yaml()?)
}
