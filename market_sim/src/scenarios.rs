//! Named scenario presets.
//!
//! Each preset builds a complete, realistic [`ScenarioConfig`] so a caller
//! (or the batch runner) can exercise the engine without hand-writing JSON.

use market_core::channel::{AllocationRequest, ChannelScenario};
use market_core::competitor::{
    CompetitorPersonality, CompetitorProfile, CompetitorScenario, IntelligenceLevel, MarketState,
    MarketTrend, PricingStrategy, TrendKind,
};
use market_core::config::{
    EconomicIndicators, MarketConditions, ModelKind, ScenarioConfig, SimulationParameters,
    StatisticalParameters, TimeParameters,
};
use market_core::consumer::{ConsumerProfile, ConsumerScenario, DecisionContext, DecisionStyle, ProductOption};
use market_core::social::{NetworkArchetype, Review, SocialScenario};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// New product entering a steady market
    ProductLaunch,

    /// Incumbents answering an aggressive price cut
    PriceWar,

    /// Word-of-mouth growth through a scale-free network
    ViralGrowth,

    /// Four-channel marketing mix with a budget allocation
    ChannelMix,

    /// Large consumer panel, decision funnel only
    ConsumerResearch,

    /// Every model at once
    FullMarket,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::ProductLaunch,
            ScenarioId::PriceWar,
            ScenarioId::ViralGrowth,
            ScenarioId::ChannelMix,
            ScenarioId::ConsumerResearch,
            ScenarioId::FullMarket,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::ProductLaunch => "product_launch",
            ScenarioId::PriceWar => "price_war",
            ScenarioId::ViralGrowth => "viral_growth",
            ScenarioId::ChannelMix => "channel_mix",
            ScenarioId::ConsumerResearch => "consumer_research",
            ScenarioId::FullMarket => "full_market",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::ProductLaunch => "Launch into a steady market: consumers, three channels, small-world buzz",
            ScenarioId::PriceWar => "We cut prices 10%; three incumbents with different personalities respond",
            ScenarioId::ViralGrowth => "500-node scale-free network with strong reviews",
            ScenarioId::ChannelMix => "All four channels plus a $50k allocation request",
            ScenarioId::ConsumerResearch => "60-consumer panel across all decision styles",
            ScenarioId::FullMarket => "Consumers, channels, competitors and social diffusion together",
        }
    }

    /// Returns the models the preset requires.
    pub fn models(&self) -> Vec<ModelKind> {
        match self {
            ScenarioId::ProductLaunch => vec![
                ModelKind::ConsumerDecision,
                ModelKind::ChannelDynamics,
                ModelKind::SocialProof,
            ],
            ScenarioId::PriceWar => vec![ModelKind::ChannelDynamics, ModelKind::CompetitorReaction],
            ScenarioId::ViralGrowth => vec![ModelKind::SocialProof],
            ScenarioId::ChannelMix => vec![ModelKind::ChannelDynamics],
            ScenarioId::ConsumerResearch => vec![ModelKind::ConsumerDecision],
            ScenarioId::FullMarket => ModelKind::all(),
        }
    }

    /// Builds the preset configuration (no explicit seed).
    pub fn config(&self) -> ScenarioConfig {
        let mut config = ScenarioConfig {
            simulation_parameters: SimulationParameters {
                iterations: 1,
                scenario_name: self.name().to_string(),
                seed: None,
                required_models: self.models(),
                statistics: standard_statistics(),
            },
            market_conditions: steady_market(),
            time_parameters: TimeParameters { periods: 12 },
            ..Default::default()
        };

        match self {
            ScenarioId::ProductLaunch => {
                config.consumer = Some(consumer_panel(24));
                config.channels = Some(channels(&[("seo", 1.2), ("social", 1.5), ("email", 0.8)], None));
                config.social = Some(social(NetworkArchetype::SmallWorld, 200, 0.65));
            }
            ScenarioId::PriceWar => {
                config.market_conditions.competition_intensity = Some(0.8);
                config.channels = Some(channels(&[("seo", 1.0), ("social", 2.0)], None));
                config.competitors = Some(incumbents());
            }
            ScenarioId::ViralGrowth => {
                config.time_parameters.periods = 10;
                config.social = Some(social(NetworkArchetype::ScaleFree, 500, 0.8));
            }
            ScenarioId::ChannelMix => {
                config.channels = Some(channels(
                    &[("seo", 1.5), ("social", 2.0), ("email", 1.0), ("direct", 1.2)],
                    Some(AllocationRequest {
                        budget: 50_000.0,
                        target_conversions: 400.0,
                    }),
                ));
            }
            ScenarioId::ConsumerResearch => {
                config.consumer = Some(consumer_panel(60));
            }
            ScenarioId::FullMarket => {
                config.consumer = Some(consumer_panel(40));
                config.channels = Some(channels(
                    &[("seo", 1.5), ("social", 2.0), ("email", 1.0), ("direct", 1.2)],
                    None,
                ));
                config.competitors = Some(incumbents());
                config.social = Some(social(NetworkArchetype::SmallWorld, 300, 0.7));
            }
        }

        config
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "product_launch" | "productlaunch" | "launch" => Ok(ScenarioId::ProductLaunch),
            "price_war" | "pricewar" => Ok(ScenarioId::PriceWar),
            "viral_growth" | "viralgrowth" | "viral" => Ok(ScenarioId::ViralGrowth),
            "channel_mix" | "channelmix" => Ok(ScenarioId::ChannelMix),
            "consumer_research" | "consumerresearch" => Ok(ScenarioId::ConsumerResearch),
            "full_market" | "fullmarket" | "full" => Ok(ScenarioId::FullMarket),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

// =============================================================================
// BUILDING BLOCKS
// =============================================================================

fn standard_statistics() -> StatisticalParameters {
    StatisticalParameters {
        confidence_interval: Some(0.95),
        p_value_threshold: Some(0.05),
        sample_size: Some(1000.0),
        effect_size: Some(0.3),
    }
}

fn steady_market() -> MarketConditions {
    MarketConditions {
        economic_indicators: EconomicIndicators {
            interest_rate: Some(0.05),
            inflation_rate: Some(0.03),
            unemployment_rate: Some(0.045),
            gdp_growth: Some(0.025),
        },
        volatility: Some(0.2),
        correlation: Some(0.3),
        liquidity: Some(0.7),
        participation_rate: Some(0.62),
        competition_intensity: Some(0.5),
    }
}

/// A deterministic spread of consumers across traits and styles.
fn consumer_panel(size: usize) -> ConsumerScenario {
    let styles = [
        DecisionStyle::Analytical,
        DecisionStyle::Intuitive,
        DecisionStyle::Social,
        DecisionStyle::Habitual,
    ];

    let profiles = (0..size)
        .map(|i| {
            let mut p = ConsumerProfile::new(format!("consumer_{:03}", i));
            p.demographics.age = 22 + (i * 7 % 45) as u32;
            p.demographics.income = 30_000.0 + (i * 3_700 % 90_000) as f64;
            p.behavior.risk_tolerance = (i * 37 % 11) as f64;
            p.behavior.brand_loyalty = (i * 53 % 11) as f64;
            p.behavior.price_sensitivity = (i * 29 % 11) as f64;
            p.behavior.attention_span = 2.0 + (i * 7 % 9) as f64;
            p.behavior.problem_sensitivity = 0.4 + 0.1 * (i % 6) as f64;
            p.preferences.decision_style = styles[i % styles.len()];
            p.preferences.current_satisfaction = 0.1 + 0.1 * (i % 5) as f64;
            p
        })
        .collect();

    ConsumerScenario {
        profiles,
        options: vec![
            ProductOption {
                brand_recognition: 0.8,
                brand_reputation: 0.7,
                social_proof: 0.6,
                review_score: 0.7,
                ..ProductOption::new("incumbent", 120.0, 0.7)
            },
            ProductOption {
                brand_recognition: 0.5,
                advertising_intensity: 0.8,
                features: 0.85,
                design: 0.8,
                review_score: 0.8,
                ..ProductOption::new("new_product", 99.0, 0.8)
            },
            ProductOption {
                brand_recognition: 0.4,
                brand_reputation: 0.4,
                convenience: 0.7,
                ..ProductOption::new("budget", 59.0, 0.5)
            },
        ],
        context: DecisionContext::default(),
    }
}

fn channels(strategies: &[(&str, f64)], allocation: Option<AllocationRequest>) -> ChannelScenario {
    ChannelScenario {
        strategies: strategies
            .iter()
            .map(|(name, investment)| (name.to_string(), *investment))
            .collect::<BTreeMap<_, _>>(),
        allocation,
    }
}

fn incumbents() -> CompetitorScenario {
    let market_states = (0..12)
        .map(|period| MarketState {
            period,
            price_change: if period == 1 { -0.10 } else { 0.0 },
            share_growth: if period >= 2 { 0.03 } else { 0.0 },
            feature_launches: u32::from(period == 4),
            marketing_spend_change: if period == 0 { 0.3 } else { 0.0 },
            innovation_index: 0.5,
            our_market_share: 0.05 + 0.01 * f64::from(period),
        })
        .collect();

    CompetitorScenario {
        competitors: vec![
            CompetitorProfile {
                personality: Some(CompetitorPersonality::Aggressive),
                intelligence: IntelligenceLevel::Advanced,
                market_share: 0.35,
                resources: 5_000_000.0,
                ..CompetitorProfile::new("market_leader")
            },
            CompetitorProfile {
                intelligence: IntelligenceLevel::Standard,
                market_share: 0.2,
                resources: 1_500_000.0,
                pricing_strategy: PricingStrategy::Discount,
                ..CompetitorProfile::new("discounter")
            },
            CompetitorProfile {
                personality: Some(CompetitorPersonality::Innovative),
                intelligence: IntelligenceLevel::Basic,
                market_share: 0.08,
                resources: 800_000.0,
                ..CompetitorProfile::new("challenger")
            },
        ],
        market_states,
        trends: vec![
            MarketTrend {
                trend: TrendKind::AiIntegration,
                strength: 0.7,
                period: 3,
            },
            MarketTrend {
                trend: TrendKind::Sustainability,
                strength: 0.4,
                period: 6,
            },
        ],
    }
}

fn social(archetype: NetworkArchetype, population: usize, appeal: f64) -> SocialScenario {
    let reviews = (0..30)
        .map(|i| Review {
            rating: match i % 10 {
                0 => 3,
                1 | 2 | 3 => 4,
                _ => 5,
            },
            verified: i % 3 != 0,
        })
        .collect();

    SocialScenario {
        network_type: archetype,
        population,
        initial_adopters: (0..5).map(|i| i * population / 5).collect(),
        product_appeal: appeal,
        reviews,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::bounds::RealismBoundsPolicy;

    #[test]
    fn test_presets_are_complete_and_realistic() {
        let policy = RealismBoundsPolicy::new();
        for id in ScenarioId::all() {
            let config = id.config();
            assert!(config.check_required().is_ok(), "{} incomplete", id);
            assert!(policy.validate(&config).is_realistic, "{} unrealistic", id);
            assert_eq!(config.scenario_name(), id.name());
        }
    }

    #[test]
    fn test_scenario_names_round_trip() {
        for id in ScenarioId::all() {
            assert_eq!(id.name().parse::<ScenarioId>(), Ok(id));
            assert_eq!(id.to_string(), id.name());
        }
        assert!("nonsense".parse::<ScenarioId>().is_err());
    }

    #[test]
    fn test_full_market_requires_every_model() {
        assert_eq!(ScenarioId::FullMarket.config().required_models(), ModelKind::all());
    }
}
