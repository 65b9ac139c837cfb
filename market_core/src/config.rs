//! Scenario configuration.
//!
//! The upstream layer hands the engine one JSON document per scenario. Every
//! section has serde defaults so partial documents deserialize; the required
//! fields are checked separately by [`ScenarioConfig::check_required`].
//!
//! Unknown top-level fields are kept in `extra` and written back out
//! unchanged, so the bounds policy can never silently drop them.

use crate::channel::ChannelScenario;
use crate::competitor::CompetitorScenario;
use crate::consumer::ConsumerScenario;
use crate::error::ConfigError;
use crate::social::SocialScenario;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// MODEL KINDS
// =============================================================================

/// The behavioral models a scenario can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    ConsumerDecision,
    ChannelDynamics,
    CompetitorReaction,
    SocialProof,
}

impl ModelKind {
    /// Returns every model kind, in execution order.
    pub fn all() -> Vec<ModelKind> {
        vec![
            ModelKind::ConsumerDecision,
            ModelKind::ChannelDynamics,
            ModelKind::CompetitorReaction,
            ModelKind::SocialProof,
        ]
    }

    /// Returns the model name.
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::ConsumerDecision => "consumer_decision",
            ModelKind::ChannelDynamics => "channel_dynamics",
            ModelKind::CompetitorReaction => "competitor_reaction",
            ModelKind::SocialProof => "social_proof",
        }
    }

    /// Returns true if the model steps through `time_parameters.periods`.
    pub fn is_period_based(&self) -> bool {
        !matches!(self, ModelKind::ConsumerDecision)
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

/// Statistical parameters subject to realism bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticalParameters {
    pub confidence_interval: Option<f64>,
    pub p_value_threshold: Option<f64>,
    pub sample_size: Option<f64>,
    pub effect_size: Option<f64>,
}

/// Run-level parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Monte-Carlo iteration count (recorded; must be positive)
    pub iterations: u32,

    /// Scenario name, also a seed-derivation input
    pub scenario_name: String,

    /// Explicit seed. Validated, never substituted.
    pub seed: Option<u64>,

    /// Models to execute
    pub required_models: Vec<ModelKind>,

    /// Statistical parameters
    pub statistics: StatisticalParameters,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            iterations: 1,
            scenario_name: String::new(),
            seed: None,
            required_models: Vec::new(),
            statistics: StatisticalParameters::default(),
        }
    }
}

/// Macro-economic indicators subject to realism bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicIndicators {
    pub interest_rate: Option<f64>,
    pub inflation_rate: Option<f64>,
    pub unemployment_rate: Option<f64>,
    pub gdp_growth: Option<f64>,
}

/// Market conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConditions {
    pub economic_indicators: EconomicIndicators,

    /// Market volatility (bounded as `market_volatility`)
    pub volatility: Option<f64>,
    pub correlation: Option<f64>,
    pub liquidity: Option<f64>,
    pub participation_rate: Option<f64>,

    /// Competition intensity in [0, 1]; not bounded, clipped on use
    pub competition_intensity: Option<f64>,
}

impl MarketConditions {
    /// Collapses the conditions into the scalars the models consume.
    pub fn signals(&self) -> MarketSignals {
        let defaults = MarketSignals::default();
        MarketSignals {
            competition_intensity: self
                .competition_intensity
                .map(crate::sampling::clip01)
                .unwrap_or(defaults.competition_intensity),
            gdp_growth: self
                .economic_indicators
                .gdp_growth
                .filter(|g| g.is_finite())
                .unwrap_or(defaults.gdp_growth),
            volatility: self
                .volatility
                .filter(|v| v.is_finite())
                .unwrap_or(defaults.volatility),
        }
    }
}

/// Scalars derived from [`MarketConditions`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketSignals {
    /// Competition intensity in [0, 1]
    pub competition_intensity: f64,

    /// Real GDP growth rate
    pub gdp_growth: f64,

    /// Market volatility
    pub volatility: f64,
}

impl Default for MarketSignals {
    fn default() -> Self {
        Self {
            competition_intensity: 0.5,
            gdp_growth: 0.02,
            volatility: 0.2,
        }
    }
}

/// Discrete time horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeParameters {
    /// Number of simulated periods
    pub periods: u32,
}

impl Default for TimeParameters {
    fn default() -> Self {
        Self { periods: 12 }
    }
}

// =============================================================================
// SCENARIO CONFIG
// =============================================================================

/// Complete configuration for one scenario run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub simulation_parameters: SimulationParameters,
    pub market_conditions: MarketConditions,
    pub time_parameters: TimeParameters,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<ConsumerScenario>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<ChannelScenario>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitors: Option<CompetitorScenario>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub social: Option<SocialScenario>,

    /// Unknown top-level fields, passed through unchanged
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ScenarioConfig {
    /// Parses a configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serializes the configuration.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Returns the scenario name.
    pub fn scenario_name(&self) -> &str {
        &self.simulation_parameters.scenario_name
    }

    /// Returns the required models, deduplicated, in execution order.
    pub fn required_models(&self) -> Vec<ModelKind> {
        let mut models = self.simulation_parameters.required_models.clone();
        models.sort();
        models.dedup();
        models
    }

    /// Checks the fields a run cannot start without.
    pub fn check_required(&self) -> Result<(), ConfigError> {
        let params = &self.simulation_parameters;

        if params.scenario_name.trim().is_empty() {
            return Err(ConfigError::missing("simulation_parameters.scenario_name"));
        }
        if params.iterations == 0 {
            return Err(ConfigError::invalid(
                "simulation_parameters.iterations",
                "must be positive",
            ));
        }

        let models = self.required_models();
        if models.is_empty() {
            return Err(ConfigError::missing("simulation_parameters.required_models"));
        }

        if models.iter().any(ModelKind::is_period_based) && self.time_parameters.periods == 0 {
            return Err(ConfigError::invalid("time_parameters.periods", "must be positive"));
        }

        for model in models {
            let present = match model {
                ModelKind::ConsumerDecision => self.consumer.is_some(),
                ModelKind::ChannelDynamics => self.channels.is_some(),
                ModelKind::CompetitorReaction => self.competitors.is_some(),
                ModelKind::SocialProof => self.social.is_some(),
            };
            if !present {
                return Err(ConfigError::missing(section_name(model)));
            }
        }

        Ok(())
    }
}

fn section_name(model: ModelKind) -> &'static str {
    match model {
        ModelKind::ConsumerDecision => "consumer",
        ModelKind::ChannelDynamics => "channels",
        ModelKind::CompetitorReaction => "competitors",
        ModelKind::SocialProof => "social",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> &'static str {
        r#"{
            "simulation_parameters": {
                "scenario_name": "launch",
                "iterations": 10,
                "required_models": ["channel_dynamics"]
            },
            "market_conditions": {
                "economic_indicators": { "interest_rate": 0.05 },
                "competition_intensity": 0.4
            },
            "time_parameters": { "periods": 6 },
            "channels": { "strategies": { "seo": 1.0 } },
            "owner": "growth-team"
        }"#
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = ScenarioConfig::from_json_str(minimal_json()).unwrap();

        assert_eq!(config.scenario_name(), "launch");
        assert_eq!(config.simulation_parameters.iterations, 10);
        assert_eq!(config.time_parameters.periods, 6);
        assert_eq!(config.market_conditions.economic_indicators.interest_rate, Some(0.05));
        assert!(config.check_required().is_ok());
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let config = ScenarioConfig::from_json_str(minimal_json()).unwrap();
        assert_eq!(config.extra.get("owner"), Some(&serde_json::json!("growth-team")));

        let json = config.to_json_string().unwrap();
        let reparsed = ScenarioConfig::from_json_str(&json).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_missing_scenario_name() {
        let mut config = ScenarioConfig::from_json_str(minimal_json()).unwrap();
        config.simulation_parameters.scenario_name = "  ".to_string();

        assert_eq!(
            config.check_required(),
            Err(ConfigError::missing("simulation_parameters.scenario_name"))
        );
    }

    #[test]
    fn test_missing_model_section() {
        let mut config = ScenarioConfig::from_json_str(minimal_json()).unwrap();
        config.simulation_parameters.required_models.push(ModelKind::SocialProof);

        assert_eq!(config.check_required(), Err(ConfigError::missing("social")));
    }

    #[test]
    fn test_zero_periods_rejected_for_period_models() {
        let mut config = ScenarioConfig::from_json_str(minimal_json()).unwrap();
        config.time_parameters.periods = 0;

        assert!(matches!(
            config.check_required(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_error_is_config_error() {
        assert!(matches!(
            ScenarioConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_market_signals_defaults_and_clipping() {
        let mut conditions = MarketConditions::default();
        assert_eq!(conditions.signals(), MarketSignals::default());

        conditions.competition_intensity = Some(3.0);
        conditions.economic_indicators.gdp_growth = Some(-0.03);
        let signals = conditions.signals();
        assert_eq!(signals.competition_intensity, 1.0);
        assert_eq!(signals.gdp_growth, -0.03);
    }
}
