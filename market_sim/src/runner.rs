//! Scenario runner - executes preset scenarios across seeds.

use crate::context::SimContext;
use crate::orchestrator::{ExecutionStatus, SimulationOrchestrator};
use crate::scenarios::ScenarioId;
use market_core::seed::Seed;
use market_env::RunId;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Quality score a run needs to pass.
pub const DEFAULT_PASS_THRESHOLD: f64 = 0.6;

/// Result of running one preset with one seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: Seed,

    /// Whether every model succeeded with acceptable quality
    pub passed: bool,

    /// None if the run was rejected before execution
    pub status: Option<ExecutionStatus>,

    pub quality_score: f64,

    /// Failure message if any
    pub failure_reason: Option<String>,
}

/// Aggregate over a batch of outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub passed: usize,
    pub pass_rate: f64,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl BatchSummary {
    fn from_outcomes(outcomes: Vec<ScenarioOutcome>) -> Self {
        let total = outcomes.len();
        let passed = outcomes.iter().filter(|o| o.passed).count();
        Self {
            total,
            passed,
            pass_rate: if total == 0 { 0.0 } else { passed as f64 / total as f64 },
            outcomes,
        }
    }

    /// Outcomes that did not pass.
    pub fn failures(&self) -> impl Iterator<Item = &ScenarioOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }
}

/// Runs preset scenarios on a virtual clock.
pub struct ScenarioRunner {
    context: std::sync::Arc<SimContext>,
    orchestrator: SimulationOrchestrator<SimContext>,

    /// Quality needed to pass
    pass_threshold: f64,

    /// Virtual time charged per run
    run_cost: Duration,
}

impl ScenarioRunner {
    pub fn new() -> Self {
        let context = SimContext::shared();
        Self {
            orchestrator: SimulationOrchestrator::new(std::sync::Arc::clone(&context)),
            context,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            run_cost: Duration::from_millis(25),
        }
    }

    pub fn with_pass_threshold(mut self, threshold: f64) -> Self {
        self.pass_threshold = threshold;
        self
    }

    pub fn with_enforce_realism(mut self, enforce: bool) -> Self {
        self.orchestrator = self.orchestrator.with_enforce_realism(enforce);
        self
    }

    pub fn context(&self) -> &SimContext {
        &self.context
    }

    /// Runs one preset with an explicit seed.
    pub fn run(&self, scenario: ScenarioId, seed: Seed) -> ScenarioOutcome {
        let mut config = scenario.config();
        config.simulation_parameters.seed = Some(u64::from(seed));
        let run_id = RunId::from_seed((u64::from(seed) << 8) | scenario as u64);

        self.context.advance_time(self.run_cost);
        match self.orchestrator.run(&config, run_id) {
            Ok(result) => {
                let quality_score = result.quality.overall_score;
                let failure_reason = if result.execution_status != ExecutionStatus::Success {
                    Some(
                        result
                            .failures
                            .iter()
                            .map(|(model, reason)| format!("{}: {}", model, reason))
                            .collect::<Vec<_>>()
                            .join("; "),
                    )
                } else if quality_score < self.pass_threshold {
                    Some(format!(
                        "quality {:.2} below {:.2}: {}",
                        quality_score,
                        self.pass_threshold,
                        result.quality.issues.join("; ")
                    ))
                } else {
                    None
                };

                ScenarioOutcome {
                    scenario,
                    seed,
                    passed: failure_reason.is_none(),
                    status: Some(result.execution_status),
                    quality_score,
                    failure_reason,
                }
            }
            Err(e) => {
                warn!("Scenario {} rejected with seed {}: {}", scenario, seed, e);
                ScenarioOutcome {
                    scenario,
                    seed,
                    passed: false,
                    status: None,
                    quality_score: 0.0,
                    failure_reason: Some(e.to_string()),
                }
            }
        }
    }

    /// Runs every scenario with every seed.
    pub fn run_batch(&self, scenarios: &[ScenarioId], seeds: &[Seed]) -> BatchSummary {
        let outcomes = scenarios
            .iter()
            .flat_map(|&scenario| seeds.iter().map(move |&seed| (scenario, seed)))
            .map(|(scenario, seed)| self.run(scenario, seed))
            .collect();

        let summary = BatchSummary::from_outcomes(outcomes);
        info!(
            "Batch finished: {}/{} passed ({:.0}%)",
            summary.passed,
            summary.total,
            summary.pass_rate * 100.0
        );
        summary
    }

    /// Runs every preset with every seed.
    pub fn run_all(&self, seeds: &[Seed]) -> BatchSummary {
        self.run_batch(&ScenarioId::all(), seeds)
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_passes_presets() {
        let runner = ScenarioRunner::new();
        let summary = runner.run_all(&[42, 1907]);

        assert_eq!(summary.total, ScenarioId::all().len() * 2);
        for outcome in summary.failures() {
            panic!("{:?} failed: {:?}", outcome.scenario, outcome.failure_reason);
        }
        assert_eq!(summary.pass_rate, 1.0);
    }

    #[test]
    fn test_invalid_seed_fails_without_status() {
        let outcome = ScenarioRunner::new().run(ScenarioId::ChannelMix, 12345);

        assert!(!outcome.passed);
        assert_eq!(outcome.status, None);
        assert!(outcome.failure_reason.is_some());
    }

    #[test]
    fn test_threshold_above_one_fails_everything() {
        let runner = ScenarioRunner::new().with_pass_threshold(1.01);
        let outcome = runner.run(ScenarioId::ViralGrowth, 42);

        assert!(!outcome.passed);
        assert_eq!(outcome.status, Some(ExecutionStatus::Success));
        assert!(outcome.failure_reason.unwrap().contains("quality"));
    }

    #[test]
    fn test_runs_advance_virtual_clock() {
        let runner = ScenarioRunner::new();
        runner.run_batch(&[ScenarioId::ChannelMix], &[42, 43]);
        assert_eq!(runner.context().time_ns(), 50_000_000);
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let a = ScenarioRunner::new().run(ScenarioId::FullMarket, 2718);
        let b = ScenarioRunner::new().run(ScenarioId::FullMarket, 2718);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_batch() {
        let summary = ScenarioRunner::new().run_batch(&[], &[42]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.pass_rate, 0.0);
    }
}
