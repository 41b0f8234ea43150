//! Plain-text and JSON reports for a [`RunSummary`].

use crate::result::VigiaResult;
use crate::scenario::{RunSummary, StepStatus};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON of the whole summary
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = crate::VigiaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(crate::VigiaError::config(format!(
                "unknown report format '{other}' (expected text or json)"
            ))),
        }
    }
}

/// One-line summary: `3/4 passed, 1 failed, 0 skipped (75.0%) in 1520ms`
#[must_use]
pub fn summary_line(summary: &RunSummary) -> String {
    let total = summary.total();
    let rate = if total == 0 {
        100.0
    } else {
        summary.passed() as f64 / total as f64 * 100.0
    };
    format!(
        "{}/{} passed, {} failed, {} skipped ({:.1}%) in {}ms",
        summary.passed(),
        total,
        summary.failed(),
        summary.skipped(),
        rate,
        summary.duration_ms
    )
}

/// Full text report: every scenario, failed steps with their errors
#[must_use]
pub fn render_text(summary: &RunSummary) -> String {
    let mut out = format!("Run {}\n", summary.run_id);
    for feature in &summary.features {
        let _ = writeln!(out, "\nFeature: {}", feature.name);
        for scenario in &feature.scenarios {
            let _ = writeln!(
                out,
                "  {} {} ({}ms)",
                scenario.status.symbol(),
                scenario.name,
                scenario.duration_ms
            );
            if scenario.status != StepStatus::Failed {
                continue;
            }
            for step in &scenario.steps {
                let _ = writeln!(out, "      {} {} {}", step.status.symbol(), step.kind, step.text);
                if let Some(error) = &step.error {
                    let _ = writeln!(out, "          {error}");
                }
            }
            if scenario.failed_step().is_none() {
                if let Some(error) = &scenario.error {
                    let _ = writeln!(out, "      {error}");
                }
            }
            if let Some(evidence) = &scenario.evidence {
                for file in evidence.files() {
                    let _ = writeln!(out, "      evidence: {}", file.display());
                }
            }
        }
    }
    let _ = writeln!(out, "\n{}", summary_line(summary));
    out
}

/// Pretty JSON of the summary
pub fn render_json(summary: &RunSummary) -> VigiaResult<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Render in `format`
pub fn render(summary: &RunSummary, format: ReportFormat) -> VigiaResult<String> {
    match format {
        ReportFormat::Text => Ok(render_text(summary)),
        ReportFormat::Json => render_json(summary),
    }
}

/// Render and write to `path`, creating parent directories
pub fn write(summary: &RunSummary, format: ReportFormat, path: &Path) -> VigiaResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render(summary, format)?)?;
    tracing::info!(path = %path.display(), "report written");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::scenario::{FeatureResult, ScenarioResult, StepKind, StepResult};

    fn scenario(name: &str, status: StepStatus, error: Option<&str>) -> ScenarioResult {
        ScenarioResult {
            name: name.into(),
            tags: vec![],
            status,
            steps: vec![StepResult {
                kind: StepKind::Then,
                text: "the total is 1010".into(),
                status,
                duration_ms: 3,
                error: error.map(String::from),
            }],
            duration_ms: 12,
            error: error.map(String::from),
            evidence: None,
        }
    }

    fn summary() -> RunSummary {
        let mut s = RunSummary::new();
        s.push(FeatureResult {
            name: "Storefront".into(),
            scenarios: vec![
                scenario("Cart total", StepStatus::Failed, Some("expected 1010, got 360")),
                scenario("Home ready", StepStatus::Passed, None),
                scenario("Place order", StepStatus::Skipped, None),
            ],
        });
        s
    }

    #[test]
    fn test_summary_line_counts() {
        let line = summary_line(&summary());
        assert!(line.starts_with("1/3 passed, 1 failed, 1 skipped (33.3%)"), "{line}");
    }

    #[test]
    fn test_text_lists_failed_steps_only() {
        let text = render_text(&summary());
        assert!(text.contains("Feature: Storefront"));
        assert!(text.contains("✗ Cart total"));
        assert!(text.contains("expected 1010, got 360"));
        assert_eq!(text.matches("the total is 1010").count(), 1);
    }

    #[test]
    fn test_json_round_trip_keeps_run_id() {
        let s = summary();
        let json = render(&s, ReportFormat::Json).unwrap();
        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.run_id, s.run_id);
        assert_eq!(back.failed(), 1);
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reports/run.json");
        write(&summary(), ReportFormat::Json, &path).unwrap();
        assert!(fs::read_to_string(path).unwrap().contains("\"features\""));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("xml".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_empty_run_is_full_pass_rate() {
        assert!(summary_line(&RunSummary::new()).contains("(100.0%)"));
    }
}
