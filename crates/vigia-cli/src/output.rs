//! Output formatting and progress reporting

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use vigia::scenario::{ScenarioResult, StepStatus};

/// Progress reporter for scenario execution
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet || total == 0 {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Report one finished scenario and advance the bar
    pub fn scenario_done(&self, result: &ScenarioResult) {
        let line = format!("{} ({}ms)", result.name, result.duration_ms);
        let line = match result.status {
            StepStatus::Passed => self.prefixed(&style("✓").green(), "PASS", &line),
            StepStatus::Failed => {
                let error = result.error.as_deref().unwrap_or("failed");
                self.prefixed(&style("✗").red(), "FAIL", &format!("{line}: {error}"))
            }
            StepStatus::Skipped => self.prefixed(&style("-").dim(), "SKIP", &line),
        };
        // Failures print even in quiet mode
        if !self.quiet || result.status == StepStatus::Failed {
            match self.progress_bar {
                Some(ref pb) => pb.println(line),
                None => {
                    let _ = self.term.write_line(&line);
                }
            }
        }
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
    }

    /// Finish progress bar
    pub fn finish(&mut self) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let line = self.prefixed(&style("✓").green(), "PASS", message);
        let _ = self.term.write_line(&line);
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        let line = self.prefixed(&style("✗").red(), "FAIL", message);
        let _ = self.term.write_line(&line);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let line = self.prefixed(&style("ℹ").blue(), "INFO", message);
        let _ = self.term.write_line(&line);
    }

    fn prefixed(&self, symbol: &console::StyledObject<&str>, plain: &str, message: &str) -> String {
        if self.use_color {
            format!("{} {message}", symbol.clone().bold())
        } else {
            format!("{plain} {message}")
        }
    }
}
