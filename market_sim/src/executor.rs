//! Model executors.
//!
//! The orchestrator does not know how a model runs; it holds one
//! [`ScenarioExecutor`] per [`ModelKind`], chosen at construction. The
//! defaults here adapt a scenario section to the matching core model.

use market_core::bias::{BiasAnalyzer, DefaultBiasAnalyzer};
use market_core::channel::{ChannelAllocation, ChannelDynamicsModel, ChannelSimulation};
use market_core::competitor::{CompetitorReactionModel, CompetitorSimulation};
use market_core::config::{ModelKind, ScenarioConfig};
use market_core::consumer::{ConsumerDecisionModel, PopulationSummary};
use market_core::error::ModelError;
use market_core::seed::Seed;
use market_core::social::{SocialProofModel, SocialSimulation};
use serde::{Deserialize, Serialize};

/// Output of one model run, tagged by model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", content = "output", rename_all = "snake_case")]
pub enum ModelOutput {
    ConsumerDecision(PopulationSummary),
    ChannelDynamics(ChannelOutput),
    CompetitorReaction(CompetitorSimulation),
    SocialProof(SocialSimulation),
}

impl ModelOutput {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelOutput::ConsumerDecision(_) => ModelKind::ConsumerDecision,
            ModelOutput::ChannelDynamics(_) => ModelKind::ChannelDynamics,
            ModelOutput::CompetitorReaction(_) => ModelKind::CompetitorReaction,
            ModelOutput::SocialProof(_) => ModelKind::SocialProof,
        }
    }
}

/// Channel simulation plus the optional allocation answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelOutput {
    pub simulation: ChannelSimulation,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation: Option<ChannelAllocation>,
}

/// Trait for running one model against a scenario.
pub trait ScenarioExecutor: Send + Sync {
    /// The model this executor runs.
    fn model(&self) -> ModelKind;

    /// Runs the model with the resolved seed.
    fn execute(&self, config: &ScenarioConfig, seed: Seed) -> Result<ModelOutput, ModelError>;

    /// Returns the name of this executor.
    fn name(&self) -> &str;
}

/// Returns the default executor for every model.
pub fn default_executors() -> Vec<Box<dyn ScenarioExecutor>> {
    vec![
        Box::new(ConsumerExecutor::default()),
        Box::new(ChannelExecutor::default()),
        Box::new(CompetitorExecutor::default()),
        Box::new(SocialExecutor::default()),
    ]
}

// =============================================================================
// DEFAULT EXECUTORS
// =============================================================================

/// Runs the consumer panel through the decision funnel.
pub struct ConsumerExecutor {
    model: ConsumerDecisionModel,
    analyzer: Box<dyn BiasAnalyzer>,
}

impl ConsumerExecutor {
    pub fn new(model: ConsumerDecisionModel, analyzer: Box<dyn BiasAnalyzer>) -> Self {
        Self { model, analyzer }
    }
}

impl Default for ConsumerExecutor {
    fn default() -> Self {
        Self::new(ConsumerDecisionModel::new(), Box::new(DefaultBiasAnalyzer::default()))
    }
}

impl ScenarioExecutor for ConsumerExecutor {
    fn model(&self) -> ModelKind {
        ModelKind::ConsumerDecision
    }

    fn execute(&self, config: &ScenarioConfig, seed: Seed) -> Result<ModelOutput, ModelError> {
        let section = config
            .consumer
            .as_ref()
            .ok_or_else(|| ModelError::missing(self.model().name(), "consumer section"))?;
        if section.profiles.is_empty() {
            return Err(ModelError::missing(self.model().name(), "consumer profiles"));
        }

        self.model
            .simulate_population(
                &section.profiles,
                &section.options,
                &section.context,
                seed,
                self.analyzer.as_ref(),
            )
            .map(ModelOutput::ConsumerDecision)
    }

    fn name(&self) -> &str {
        "consumer_population"
    }
}

/// Runs channel dynamics and, if requested, a budget allocation.
#[derive(Default)]
pub struct ChannelExecutor {
    model: ChannelDynamicsModel,
}

impl ScenarioExecutor for ChannelExecutor {
    fn model(&self) -> ModelKind {
        ModelKind::ChannelDynamics
    }

    fn execute(&self, config: &ScenarioConfig, seed: Seed) -> Result<ModelOutput, ModelError> {
        let section = config
            .channels
            .as_ref()
            .ok_or_else(|| ModelError::missing(self.model().name(), "channels section"))?;
        let signals = config.market_conditions.signals();

        let simulation =
            self.model
                .simulate_scenario(section, config.time_parameters.periods, &signals, seed)?;
        let allocation = section
            .allocation
            .as_ref()
            .map(|request| {
                self.model.optimize_channel_allocation(
                    request.budget,
                    request.target_conversions,
                    &signals,
                    Some(&simulation),
                )
            })
            .transpose()?;

        Ok(ModelOutput::ChannelDynamics(ChannelOutput {
            simulation,
            allocation,
        }))
    }

    fn name(&self) -> &str {
        "channel_dynamics"
    }
}

#[derive(Default)]
pub struct CompetitorExecutor {
    model: CompetitorReactionModel,
}

impl ScenarioExecutor for CompetitorExecutor {
    fn model(&self) -> ModelKind {
        ModelKind::CompetitorReaction
    }

    fn execute(&self, config: &ScenarioConfig, seed: Seed) -> Result<ModelOutput, ModelError> {
        let section = config
            .competitors
            .as_ref()
            .ok_or_else(|| ModelError::missing(self.model().name(), "competitors section"))?;

        self.model
            .simulate(section, config.time_parameters.periods, seed)
            .map(ModelOutput::CompetitorReaction)
    }

    fn name(&self) -> &str {
        "competitor_reaction"
    }
}

#[derive(Default)]
pub struct SocialExecutor {
    model: SocialProofModel,
}

impl ScenarioExecutor for SocialExecutor {
    fn model(&self) -> ModelKind {
        ModelKind::SocialProof
    }

    fn execute(&self, config: &ScenarioConfig, seed: Seed) -> Result<ModelOutput, ModelError> {
        let section = config
            .social
            .as_ref()
            .ok_or_else(|| ModelError::missing(self.model().name(), "social section"))?;

        self.model
            .simulate(section, config.time_parameters.periods, seed)
            .map(ModelOutput::SocialProof)
    }

    fn name(&self) -> &str {
        "social_diffusion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::ScenarioId;

    #[test]
    fn test_default_executors_cover_every_model() {
        let models: Vec<ModelKind> = default_executors().iter().map(|e| e.model()).collect();
        assert_eq!(models, ModelKind::all());
    }

    #[test]
    fn test_missing_section_is_model_error() {
        let config = ScenarioConfig::default();
        for executor in default_executors() {
            assert!(matches!(
                executor.execute(&config, 42),
                Err(ModelError::MissingInput { .. })
            ));
        }
    }

    #[test]
    fn test_output_kind_matches_executor() {
        let config = ScenarioId::FullMarket.config();
        for executor in default_executors() {
            let output = executor.execute(&config, 42).unwrap();
            assert_eq!(output.kind(), executor.model());
        }
    }

    #[test]
    fn test_channel_allocation_attached_when_requested() {
        let config = ScenarioId::ChannelMix.config();
        let output = ChannelExecutor::default().execute(&config, 7).unwrap();
        match output {
            ModelOutput::ChannelDynamics(channel) => assert!(channel.allocation.is_some()),
            other => panic!("unexpected output {:?}", other.kind()),
        }
    }
}
