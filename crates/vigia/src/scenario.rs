//! Given/When/Then scenarios and the runner that executes them.
//!
//! A [`Feature`] groups [`Scenario`]s over one [`World`] type. The runner
//! builds a fresh world for every scenario, runs its steps strictly in
//! order, stops at the first failing step and always tears the world down.
//!
//! ```no_run
//! use vigia::scenario::{Feature, Scenario, World};
//! use vigia::{EnvironmentConfig, VigiaResult};
//!
//! #[derive(Default)]
//! struct Counter(u32);
//!
//! impl World for Counter {
//!     fn setup(_config: &EnvironmentConfig) -> VigiaResult<Self> {
//!         Ok(Self::default())
//!     }
//! }
//!
//! let feature = Feature::new("counting").scenario(
//!     Scenario::new("increments")
//!         .given("a counter", |_| Ok(()))
//!         .when("it is bumped", |w: &mut Counter| {
//!             w.0 += 1;
//!             Ok(())
//!         })
//!         .then("it reads one", |w| vigia::scenario::ensure_eq(&w.0, &1, "count")),
//! );
//! # let _ = feature;
//! ```

use crate::config::EnvironmentConfig;
use crate::evidence::{Evidence, EvidenceSink, NullEvidenceSink};
use crate::result::{VigiaError, VigiaResult};
use crate::session::BrowserSession;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::{self, Debug, Write as _};
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ============================================================================
// Model
// ============================================================================

/// Gherkin keyword of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    /// Precondition
    Given,
    /// Action
    When,
    /// Outcome
    Then,
    /// Continues the previous keyword
    And,
    /// Negative continuation
    But,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
            Self::But => "But",
        };
        f.write_str(keyword)
    }
}

type StepFn<W> = Box<dyn Fn(&mut W) -> VigiaResult<()> + Send + Sync>;

/// One step: keyword, text and the code behind it
pub struct Step<W> {
    /// Keyword
    pub kind: StepKind,
    /// Human-readable text
    pub text: String,
    run: StepFn<W>,
}

impl<W> Debug for Step<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.text)
    }
}

/// An ordered list of steps over a fresh world
#[derive(Debug)]
pub struct Scenario<W> {
    /// Scenario name
    pub name: String,
    /// Tags without the leading `@`
    pub tags: Vec<String>,
    /// Steps in execution order
    pub steps: Vec<Step<W>>,
}

impl<W> Scenario<W> {
    /// Empty scenario
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Add a tag (`smoke` and `@smoke` are the same tag)
    #[must_use]
    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.trim_start_matches('@').to_string());
        self
    }

    /// Append a step
    #[must_use]
    pub fn step<F>(mut self, kind: StepKind, text: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut W) -> VigiaResult<()> + Send + Sync + 'static,
    {
        self.steps.push(Step {
            kind,
            text: text.into(),
            run: Box::new(run),
        });
        self
    }

    /// Append a `Given` step
    #[must_use]
    pub fn given<F>(self, text: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut W) -> VigiaResult<()> + Send + Sync + 'static,
    {
        self.step(StepKind::Given, text, run)
    }

    /// Append a `When` step
    #[must_use]
    pub fn when<F>(self, text: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut W) -> VigiaResult<()> + Send + Sync + 'static,
    {
        self.step(StepKind::When, text, run)
    }

    /// Append a `Then` step
    #[must_use]
    pub fn then<F>(self, text: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut W) -> VigiaResult<()> + Send + Sync + 'static,
    {
        self.step(StepKind::Then, text, run)
    }

    /// Append an `And` step
    #[must_use]
    pub fn and<F>(self, text: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut W) -> VigiaResult<()> + Send + Sync + 'static,
    {
        self.step(StepKind::And, text, run)
    }

    /// Append a `But` step
    #[must_use]
    pub fn but<F>(self, text: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut W) -> VigiaResult<()> + Send + Sync + 'static,
    {
        self.step(StepKind::But, text, run)
    }

    /// Whether the scenario carries `tag`
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim_start_matches('@');
        self.tags.iter().any(|t| t == tag)
    }
}

/// Named group of scenarios sharing a world type
#[derive(Debug)]
pub struct Feature<W> {
    /// Feature name
    pub name: String,
    /// Scenarios in declaration order
    pub scenarios: Vec<Scenario<W>>,
}

impl<W> Feature<W> {
    /// Empty feature
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenarios: Vec::new(),
        }
    }

    /// Append a scenario
    #[must_use]
    pub fn scenario(mut self, scenario: Scenario<W>) -> Self {
        self.scenarios.push(scenario);
        self
    }
}

/// Per-scenario state; built before the first step, torn down after the last.
pub trait World: Sized {
    /// Acquire the resources a scenario needs
    ///
    /// # Errors
    ///
    /// Any error here fails the scenario before its first step.
    fn setup(config: &EnvironmentConfig) -> VigiaResult<Self>;

    /// Release resources. Runs after every scenario, passed or failed.
    fn teardown(&mut self) -> VigiaResult<()> {
        Ok(())
    }

    /// Browser to capture evidence from, if the world has one
    fn session(&self) -> Option<&dyn BrowserSession> {
        None
    }
}

/// Fail with an assertion error unless `actual == expected`
///
/// # Errors
///
/// [`VigiaError::Assertion`] naming `what` and both values.
pub fn ensure_eq<T: PartialEq + Debug + ?Sized>(actual: &T, expected: &T, what: &str) -> VigiaResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(VigiaError::assertion(format!(
            "{what}: expected {expected:?}, got {actual:?}"
        )))
    }
}

/// Fail with an assertion error unless `condition` holds
pub fn ensure(condition: bool, message: impl Into<String>) -> VigiaResult<()> {
    if condition {
        Ok(())
    } else {
        Err(VigiaError::assertion(message))
    }
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of a step or scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Ran and succeeded
    Passed,
    /// Ran and failed
    Failed,
    /// Not run
    Skipped,
}

impl StepStatus {
    /// Display symbol for text reports
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Passed => "✓",
            Self::Failed => "✗",
            Self::Skipped => "-",
        }
    }
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// Keyword
    pub kind: StepKind,
    /// Step text
    pub text: String,
    /// Outcome
    pub status: StepStatus,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Failure message
    pub error: Option<String>,
}

impl StepResult {
    fn skipped<W>(step: &Step<W>) -> Self {
        Self {
            kind: step.kind,
            text: step.text.clone(),
            status: StepStatus::Skipped,
            duration_ms: 0,
            error: None,
        }
    }
}

/// Outcome of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario name
    pub name: String,
    /// Tags
    pub tags: Vec<String>,
    /// Overall outcome
    pub status: StepStatus,
    /// Per-step outcomes, one per declared step
    pub steps: Vec<StepResult>,
    /// Wall time in milliseconds, setup and teardown included
    pub duration_ms: u64,
    /// First failure
    pub error: Option<String>,
    /// Artifacts captured on failure
    pub evidence: Option<Evidence>,
}

impl ScenarioResult {
    fn skipped<W>(scenario: &Scenario<W>) -> Self {
        Self {
            name: scenario.name.clone(),
            tags: scenario.tags.clone(),
            status: StepStatus::Skipped,
            steps: scenario.steps.iter().map(StepResult::skipped).collect(),
            duration_ms: 0,
            error: None,
            evidence: None,
        }
    }

    /// The step that failed, if any
    #[must_use]
    pub fn failed_step(&self) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.status == StepStatus::Failed)
    }
}

/// Outcome of one feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureResult {
    /// Feature name
    pub name: String,
    /// Scenario outcomes in execution order
    pub scenarios: Vec<ScenarioResult>,
}

/// Everything one `vigia run` produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique id of this run
    pub run_id: Uuid,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Per-feature outcomes
    pub features: Vec<FeatureResult>,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSummary {
    /// Start a new run
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            duration_ms: 0,
            features: Vec::new(),
        }
    }

    /// Record a finished feature and update the duration
    pub fn push(&mut self, feature: FeatureResult) {
        self.features.push(feature);
        let elapsed = Utc::now() - self.started_at;
        self.duration_ms = u64::try_from(elapsed.num_milliseconds()).unwrap_or(0);
    }

    /// Every scenario across features
    pub fn scenarios(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.features.iter().flat_map(|f| f.scenarios.iter())
    }

    fn count(&self, status: StepStatus) -> usize {
        self.scenarios().filter(|s| s.status == status).count()
    }

    /// Scenarios that passed
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(StepStatus::Passed)
    }

    /// Scenarios that failed
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(StepStatus::Failed)
    }

    /// Scenarios that were skipped
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(StepStatus::Skipped)
    }

    /// Total scenarios
    #[must_use]
    pub fn total(&self) -> usize {
        self.scenarios().count()
    }

    /// No scenario failed
    #[must_use]
    pub fn success(&self) -> bool {
        self.failed() == 0
    }

    /// Failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.scenarios()
            .filter(|s| s.status == StepStatus::Failed)
            .collect()
    }
}

// ============================================================================
// Runner
// ============================================================================

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Executes features against an [`EnvironmentConfig`]
pub struct ScenarioRunner<'c> {
    config: &'c EnvironmentConfig,
    sink: Box<dyn EvidenceSink>,
    name_filter: Option<String>,
    tags: Vec<String>,
    fail_fast: bool,
    halted: bool,
}

impl Debug for ScenarioRunner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("name_filter", &self.name_filter)
            .field("tags", &self.tags)
            .field("fail_fast", &self.fail_fast)
            .field("halted", &self.halted)
            .finish_non_exhaustive()
    }
}

impl<'c> ScenarioRunner<'c> {
    /// Runner without evidence capture or filters
    #[must_use]
    pub fn new(config: &'c EnvironmentConfig) -> Self {
        Self {
            config,
            sink: Box::new(NullEvidenceSink),
            name_filter: None,
            tags: Vec::new(),
            fail_fast: false,
            halted: false,
        }
    }

    /// Capture failure evidence into `sink`
    #[must_use]
    pub fn with_evidence(mut self, sink: impl EvidenceSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Only run scenarios whose name contains `filter` (case-insensitive)
    #[must_use]
    pub fn with_name_filter(mut self, filter: impl Into<String>) -> Self {
        self.name_filter = Some(filter.into().to_lowercase());
        self
    }

    /// Only run scenarios carrying at least one of these tags
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = tags
            .into_iter()
            .map(|t| t.trim_start_matches('@').to_string())
            .collect();
        self
    }

    /// Skip everything after the first failed scenario
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Whether a failure stopped the run under fail-fast
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Whether `scenario` passes the name and tag filters
    #[must_use]
    pub fn selects<W>(&self, scenario: &Scenario<W>) -> bool {
        let name_ok = self
            .name_filter
            .as_ref()
            .map_or(true, |f| scenario.name.to_lowercase().contains(f.as_str()));
        let tags_ok = self.tags.is_empty() || self.tags.iter().any(|t| scenario.has_tag(t));
        name_ok && tags_ok
    }

    /// Scenarios of `feature` this runner would execute
    #[must_use]
    pub fn selected<'f, W>(&self, feature: &'f Feature<W>) -> Vec<&'f Scenario<W>> {
        feature.scenarios.iter().filter(|s| self.selects(s)).collect()
    }

    /// Run every selected scenario of `feature`
    pub fn run<W: World>(&mut self, feature: &Feature<W>) -> FeatureResult {
        self.run_with(feature, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_done` after each scenario
    pub fn run_with<W: World>(
        &mut self,
        feature: &Feature<W>,
        mut on_done: impl FnMut(&ScenarioResult),
    ) -> FeatureResult {
        info!(feature = %feature.name, "running feature");
        let mut scenarios = Vec::new();
        for scenario in self.selected(feature) {
            let result = if self.halted {
                ScenarioResult::skipped(scenario)
            } else {
                self.run_scenario(scenario)
            };
            if result.status == StepStatus::Failed && self.fail_fast {
                self.halted = true;
            }
            on_done(&result);
            scenarios.push(result);
        }
        FeatureResult {
            name: feature.name.clone(),
            scenarios,
        }
    }

    /// Run one scenario in a fresh world
    pub fn run_scenario<W: World>(&self, scenario: &Scenario<W>) -> ScenarioResult {
        let start = Instant::now();
        info!(scenario = %scenario.name, "scenario started");
        let mut result = ScenarioResult::skipped(scenario);
        result.status = StepStatus::Passed;

        let mut world = match W::setup(self.config) {
            Ok(world) => world,
            Err(e) => {
                warn!(scenario = %scenario.name, error = %e, "world setup failed");
                let message = format!("setup failed: {e}");
                result.evidence = Some(self.sink.capture(&scenario.name, None, &message));
                result.status = StepStatus::Failed;
                result.error = Some(message);
                result.duration_ms = elapsed_ms(start);
                return result;
            }
        };

        for (index, step) in scenario.steps.iter().enumerate() {
            let step_start = Instant::now();
            debug!(step = %step.text, kind = %step.kind, "step");
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (step.run)(&mut world)))
                .unwrap_or_else(|payload| {
                    Err(VigiaError::assertion(format!(
                        "step panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                });
            let slot = &mut result.steps[index];
            slot.duration_ms = elapsed_ms(step_start);
            match outcome {
                Ok(()) => slot.status = StepStatus::Passed,
                Err(e) => {
                    warn!(scenario = %scenario.name, step = %step.text, error = %e, "step failed");
                    slot.status = StepStatus::Failed;
                    slot.error = Some(e.to_string());
                    result.status = StepStatus::Failed;
                    result.error = Some(format!("{} {}: {e}", step.kind, step.text));
                    break;
                }
            }
        }

        if result.status == StepStatus::Failed {
            let log = failure_log(scenario, &result);
            result.evidence = Some(self.sink.capture(&scenario.name, world.session(), &log));
        }

        if let Err(e) = world.teardown() {
            warn!(scenario = %scenario.name, error = %e, "teardown failed");
            if result.status == StepStatus::Passed {
                result.status = StepStatus::Failed;
                result.error = Some(format!("teardown failed: {e}"));
            }
        }
        drop(world);

        result.duration_ms = elapsed_ms(start);
        info!(
            scenario = %scenario.name,
            status = ?result.status,
            duration_ms = result.duration_ms,
            "scenario finished"
        );
        result
    }
}

fn failure_log<W>(scenario: &Scenario<W>, result: &ScenarioResult) -> String {
    let mut log = format!("Scenario: {}\n", scenario.name);
    for step in &result.steps {
        let _ = writeln!(
            log,
            "  {} {} {} ({}ms)",
            step.status.symbol(),
            step.kind,
            step.text,
            step.duration_ms
        );
        if let Some(error) = &step.error {
            let _ = writeln!(log, "      {error}");
        }
    }
    log
}
