//! Simulation Orchestrator - one scenario run, end to end.
//!
//! ```text
//! received ──► required fields ──► bounds ──► seed ──► execute ──► quality ──► result
//!                  │ ConfigError              │ SeedError    │ ModelError
//!                  ▼                          ▼              ▼
//!               returned                   returned     recorded per model,
//!                                                       run continues
//! ```
//!
//! Configuration and seed problems fail fast. A failing model only marks the
//! run `partial` (or `failed` if every model failed).

use crate::executor::{default_executors, ModelOutput, ScenarioExecutor};
use crate::quality::{DefaultQualityAssessor, QualityAssessment, QualityAssessor};
use market_core::bounds::{RealismBoundsPolicy, RealismReport};
use market_core::config::{ModelKind, ScenarioConfig};
use market_core::error::{ConfigError, SeedError};
use market_core::seed::{Seed, SeedManager};
use market_env::{MarketContext, RunId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors that abort a run before any model executes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Seed error: {0}")]
    Seed(#[from] SeedError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Every required model produced output
    Success,

    /// Some models failed
    Partial,

    /// Every model failed
    Failed,
}

impl ExecutionStatus {
    fn from_counts(succeeded: usize, failed: usize) -> Self {
        match (succeeded, failed) {
            (_, 0) => ExecutionStatus::Success,
            (0, _) => ExecutionStatus::Failed,
            _ => ExecutionStatus::Partial,
        }
    }
}

/// Unified result of one scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub run_id: RunId,
    pub scenario_name: String,

    /// Seed every model ran with
    pub seed: Seed,
    pub execution_status: ExecutionStatus,
    pub results: BTreeMap<ModelKind, ModelOutput>,
    pub failures: BTreeMap<ModelKind, String>,

    /// Report on the configuration as received
    pub realism_report: RealismReport,
    pub constraints_applied: bool,
    pub quality: QualityAssessment,
    pub duration_ms: u64,

    /// Configuration the models actually ran with
    pub effective_config: ScenarioConfig,
}

/// Runs scenarios through bounds, seeding, model execution and quality.
pub struct SimulationOrchestrator<C: MarketContext> {
    context: Arc<C>,
    seeds: Arc<SeedManager<C>>,
    bounds: RealismBoundsPolicy,
    executors: BTreeMap<ModelKind, Box<dyn ScenarioExecutor>>,
    assessor: Box<dyn QualityAssessor>,

    /// Clamp out-of-bounds parameters instead of only reporting them
    enforce_realism: bool,
}

impl<C: MarketContext> SimulationOrchestrator<C> {
    /// Creates an orchestrator with default executors and its own seed manager.
    pub fn new(context: Arc<C>) -> Self {
        let seeds = SeedManager::shared(Arc::clone(&context));
        Self::with_seed_manager(context, seeds)
    }

    /// Creates an orchestrator sharing an existing seed manager.
    pub fn with_seed_manager(context: Arc<C>, seeds: Arc<SeedManager<C>>) -> Self {
        let executors = default_executors()
            .into_iter()
            .map(|e| (e.model(), e))
            .collect();
        Self {
            context,
            seeds,
            bounds: RealismBoundsPolicy::new(),
            executors,
            assessor: Box::new(DefaultQualityAssessor::new()),
            enforce_realism: true,
        }
    }

    /// Replaces the executor for the executor's model.
    pub fn with_executor(mut self, executor: Box<dyn ScenarioExecutor>) -> Self {
        self.executors.insert(executor.model(), executor);
        self
    }

    pub fn with_quality_assessor(mut self, assessor: Box<dyn QualityAssessor>) -> Self {
        self.assessor = assessor;
        self
    }

    pub fn with_enforce_realism(mut self, enforce: bool) -> Self {
        self.enforce_realism = enforce;
        self
    }

    pub fn seed_manager(&self) -> &Arc<SeedManager<C>> {
        &self.seeds
    }

    /// Parses and runs a JSON scenario document.
    pub fn run_json(&self, json: &str, run_id: RunId) -> Result<SimulationResult, SimulationError> {
        let config = ScenarioConfig::from_json_str(json)?;
        self.run(&config, run_id)
    }

    /// Runs one scenario.
    pub fn run(&self, config: &ScenarioConfig, run_id: RunId) -> Result<SimulationResult, SimulationError> {
        let started = self.context.now();
        config.check_required()?;
        let scenario_name = config.scenario_name().to_string();
        info!("Starting run {} for scenario {}", run_id, scenario_name);

        // Bounds
        let realism_report = self.bounds.validate(config);
        let constraints_applied = !realism_report.is_realistic && self.enforce_realism;
        let effective_config = if constraints_applied {
            warn!(
                "{} parameters out of bounds, clamping: {}",
                realism_report.violations.len(),
                realism_report.recommendations.join("; ")
            );
            self.bounds.apply_constraints(config)
        } else {
            if !realism_report.is_realistic {
                warn!(
                    "{} parameters out of bounds, continuing unconstrained",
                    realism_report.violations.len()
                );
            }
            config.clone()
        };

        // Seed
        let run_key = run_id.to_string();
        let seed = match effective_config.simulation_parameters.seed {
            Some(raw) => self.seeds.register_external_seed(raw, &run_key, &scenario_name)?,
            None => self.seeds.generate_seed(&run_key, &scenario_name)?,
        };
        info!("Run {} resolved seed {}", run_id, seed);

        // Execute
        let mut results = BTreeMap::new();
        let mut failures = BTreeMap::new();
        for model in effective_config.required_models() {
            let Some(executor) = self.executors.get(&model) else {
                failures.insert(model, "no executor registered".to_string());
                continue;
            };
            match executor.execute(&effective_config, seed) {
                Ok(output) => {
                    results.insert(model, output);
                }
                Err(e) => {
                    error!("Model {} failed in run {}: {}", model, run_id, e);
                    failures.insert(model, e.to_string());
                }
            }
        }
        let execution_status = ExecutionStatus::from_counts(results.len(), failures.len());

        // Quality
        let quality = self.assessor.assess(&effective_config, &results, &failures);
        let duration_ms = u64::try_from(self.context.now().saturating_sub(started).as_millis())
            .unwrap_or(u64::MAX);

        info!(
            "Run {} finished: {:?}, quality {:.2}, {} ms",
            run_id, execution_status, quality.overall_score, duration_ms
        );

        Ok(SimulationResult {
            run_id,
            scenario_name,
            seed,
            execution_status,
            results,
            failures,
            realism_report,
            constraints_applied,
            quality,
            duration_ms,
            effective_config,
        })
    }
}
