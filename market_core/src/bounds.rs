//! Realism Bounds Policy
//! =====================
//!
//! Hard-coded plausibility ranges for economic, market and statistical
//! scenario parameters.
//!
//! Diagnosis and remediation are separate operations:
//! - [`RealismBoundsPolicy::validate`] reports violations and never mutates
//! - [`RealismBoundsPolicy::apply_constraints`] clamps a copy of the config
//!
//! The orchestrator decides whether to warn, block or auto-correct.

use crate::config::ScenarioConfig;
use serde::{Deserialize, Serialize};

// =============================================================================
// BOUNDS TABLE
// =============================================================================

/// Category a bounded parameter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundCategory {
    Economic,
    Market,
    Statistical,
}

/// The closed set of parameters with realism bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundedParameter {
    InterestRate,
    InflationRate,
    UnemploymentRate,
    GdpGrowth,
    MarketVolatility,
    Correlation,
    Liquidity,
    ParticipationRate,
    ConfidenceInterval,
    PValueThreshold,
    SampleSize,
    EffectSize,
}

/// An inclusive plausibility range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealismBound {
    pub parameter: BoundedParameter,
    pub category: BoundCategory,
    pub min: f64,
    pub max: f64,
}

impl RealismBound {
    /// Returns true if `value` lies inside the bound.
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Clamps to the nearest edge. Non-finite values go to `min`.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

const fn bound(
    parameter: BoundedParameter,
    category: BoundCategory,
    min: f64,
    max: f64,
) -> RealismBound {
    RealismBound { parameter, category, min, max }
}

/// The bounds table.
pub const REALISM_BOUNDS: [RealismBound; 12] = [
    bound(BoundedParameter::InterestRate, BoundCategory::Economic, 0.0, 0.20),
    bound(BoundedParameter::InflationRate, BoundCategory::Economic, -0.05, 0.20),
    bound(BoundedParameter::UnemploymentRate, BoundCategory::Economic, 0.01, 0.25),
    bound(BoundedParameter::GdpGrowth, BoundCategory::Economic, -0.10, 0.15),
    bound(BoundedParameter::MarketVolatility, BoundCategory::Market, 0.01, 1.0),
    bound(BoundedParameter::Correlation, BoundCategory::Market, -1.0, 1.0),
    bound(BoundedParameter::Liquidity, BoundCategory::Market, 0.0, 1.0),
    bound(BoundedParameter::ParticipationRate, BoundCategory::Market, 0.0, 1.0),
    bound(BoundedParameter::ConfidenceInterval, BoundCategory::Statistical, 0.80, 0.999),
    bound(BoundedParameter::PValueThreshold, BoundCategory::Statistical, 0.001, 0.10),
    bound(BoundedParameter::SampleSize, BoundCategory::Statistical, 30.0, 1_000_000.0),
    bound(BoundedParameter::EffectSize, BoundCategory::Statistical, 0.01, 3.0),
];

impl BoundedParameter {
    /// Returns the parameter name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            BoundedParameter::InterestRate => "interest_rate",
            BoundedParameter::InflationRate => "inflation_rate",
            BoundedParameter::UnemploymentRate => "unemployment_rate",
            BoundedParameter::GdpGrowth => "gdp_growth",
            BoundedParameter::MarketVolatility => "market_volatility",
            BoundedParameter::Correlation => "correlation",
            BoundedParameter::Liquidity => "liquidity",
            BoundedParameter::ParticipationRate => "participation_rate",
            BoundedParameter::ConfidenceInterval => "confidence_interval",
            BoundedParameter::PValueThreshold => "p_value_threshold",
            BoundedParameter::SampleSize => "sample_size",
            BoundedParameter::EffectSize => "effect_size",
        }
    }

    /// Reads the parameter from a config. `None` if unset.
    pub fn value(&self, config: &ScenarioConfig) -> Option<f64> {
        let market = &config.market_conditions;
        let econ = &market.economic_indicators;
        let stats = &config.simulation_parameters.statistics;
        match self {
            BoundedParameter::InterestRate => econ.interest_rate,
            BoundedParameter::InflationRate => econ.inflation_rate,
            BoundedParameter::UnemploymentRate => econ.unemployment_rate,
            BoundedParameter::GdpGrowth => econ.gdp_growth,
            BoundedParameter::MarketVolatility => market.volatility,
            BoundedParameter::Correlation => market.correlation,
            BoundedParameter::Liquidity => market.liquidity,
            BoundedParameter::ParticipationRate => market.participation_rate,
            BoundedParameter::ConfidenceInterval => stats.confidence_interval,
            BoundedParameter::PValueThreshold => stats.p_value_threshold,
            BoundedParameter::SampleSize => stats.sample_size,
            BoundedParameter::EffectSize => stats.effect_size,
        }
    }

    fn value_mut<'a>(&self, config: &'a mut ScenarioConfig) -> Option<&'a mut f64> {
        let market = &mut config.market_conditions;
        let stats = &mut config.simulation_parameters.statistics;
        match self {
            BoundedParameter::InterestRate => market.economic_indicators.interest_rate.as_mut(),
            BoundedParameter::InflationRate => market.economic_indicators.inflation_rate.as_mut(),
            BoundedParameter::UnemploymentRate => market.economic_indicators.unemployment_rate.as_mut(),
            BoundedParameter::GdpGrowth => market.economic_indicators.gdp_growth.as_mut(),
            BoundedParameter::MarketVolatility => market.volatility.as_mut(),
            BoundedParameter::Correlation => market.correlation.as_mut(),
            BoundedParameter::Liquidity => market.liquidity.as_mut(),
            BoundedParameter::ParticipationRate => market.participation_rate.as_mut(),
            BoundedParameter::ConfidenceInterval => stats.confidence_interval.as_mut(),
            BoundedParameter::PValueThreshold => stats.p_value_threshold.as_mut(),
            BoundedParameter::SampleSize => stats.sample_size.as_mut(),
            BoundedParameter::EffectSize => stats.effect_size.as_mut(),
        }
    }
}

// =============================================================================
// REPORT
// =============================================================================

/// One out-of-bounds parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealismViolation {
    pub parameter: BoundedParameter,
    pub category: BoundCategory,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

/// Outcome of [`RealismBoundsPolicy::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealismReport {
    pub is_realistic: bool,
    pub violations: Vec<RealismViolation>,
    pub recommendations: Vec<String>,
}

impl RealismReport {
    /// Returns the violations of one category.
    pub fn violations_in(&self, category: BoundCategory) -> Vec<&RealismViolation> {
        self.violations.iter().filter(|v| v.category == category).collect()
    }
}

// =============================================================================
// POLICY
// =============================================================================

/// Validates and clamps scenario parameters against [`REALISM_BOUNDS`].
#[derive(Debug, Clone, Default)]
pub struct RealismBoundsPolicy;

impl RealismBoundsPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Returns the bound for a parameter.
    pub fn bound_for(&self, parameter: BoundedParameter) -> RealismBound {
        REALISM_BOUNDS
            .iter()
            .copied()
            .find(|b| b.parameter == parameter)
            .unwrap_or(bound(parameter, BoundCategory::Market, f64::MIN, f64::MAX))
    }

    /// Checks every set bounded field. Pure.
    pub fn validate(&self, config: &ScenarioConfig) -> RealismReport {
        let mut violations = Vec::new();
        let mut recommendations = Vec::new();

        for b in REALISM_BOUNDS.iter() {
            let Some(value) = b.parameter.value(config) else {
                continue;
            };
            if b.contains(value) {
                continue;
            }

            violations.push(RealismViolation {
                parameter: b.parameter,
                category: b.category,
                value,
                min: b.min,
                max: b.max,
            });
            recommendations.push(recommendation(b, value));
        }

        RealismReport {
            is_realistic: violations.is_empty(),
            violations,
            recommendations,
        }
    }

    /// Returns a copy with every bounded field clamped into range.
    ///
    /// Fields without a bound are untouched. Idempotent.
    pub fn apply_constraints(&self, config: &ScenarioConfig) -> ScenarioConfig {
        let mut constrained = config.clone();

        for b in REALISM_BOUNDS.iter() {
            if let Some(value) = b.parameter.value_mut(&mut constrained) {
                *value = b.clamp(*value);
            }
        }

        constrained
    }
}

fn recommendation(b: &RealismBound, value: f64) -> String {
    if value.is_nan() {
        return format!(
            "Set {} to a number in [{}, {}]",
            b.parameter.name(),
            b.min,
            b.max
        );
    }

    let edge = if value < b.min { b.min } else { b.max };
    format!(
        "Adjust {} from {} to within [{}, {}] (nearest plausible value {})",
        b.parameter.name(),
        value,
        b.min,
        b.max,
        edge
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config_with(interest: f64, volatility: f64, sample: f64) -> ScenarioConfig {
        let mut config = ScenarioConfig::default();
        config.market_conditions.economic_indicators.interest_rate = Some(interest);
        config.market_conditions.volatility = Some(volatility);
        config.simulation_parameters.statistics.sample_size = Some(sample);
        config
    }

    #[test]
    fn test_realistic_config_passes() {
        let policy = RealismBoundsPolicy::new();
        let report = policy.validate(&config_with(0.05, 0.2, 1000.0));

        assert!(report.is_realistic);
        assert!(report.violations.is_empty());
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_violations_reported_per_category() {
        let policy = RealismBoundsPolicy::new();
        let report = policy.validate(&config_with(0.5, 2.0, 5.0));

        assert!(!report.is_realistic);
        assert_eq!(report.violations.len(), 3);
        assert_eq!(report.recommendations.len(), 3);
        assert_eq!(report.violations_in(BoundCategory::Economic).len(), 1);
        assert_eq!(report.violations_in(BoundCategory::Market).len(), 1);
        assert_eq!(report.violations_in(BoundCategory::Statistical).len(), 1);
    }

    #[test]
    fn test_unset_fields_are_not_violations() {
        let policy = RealismBoundsPolicy::new();
        assert!(policy.validate(&ScenarioConfig::default()).is_realistic);
    }

    #[test]
    fn test_nan_is_violation_and_clamps_to_min() {
        let policy = RealismBoundsPolicy::new();
        let config = config_with(f64::NAN, 0.2, 100.0);

        assert!(!policy.validate(&config).is_realistic);
        let clamped = policy.apply_constraints(&config);
        assert_eq!(clamped.market_conditions.economic_indicators.interest_rate, Some(0.0));
    }

    #[test]
    fn test_apply_constraints_clamps_to_nearest_edge() {
        let policy = RealismBoundsPolicy::new();
        let clamped = policy.apply_constraints(&config_with(-0.3, 7.0, 10.0));

        assert_eq!(clamped.market_conditions.economic_indicators.interest_rate, Some(0.0));
        assert_eq!(clamped.market_conditions.volatility, Some(1.0));
        assert_eq!(clamped.simulation_parameters.statistics.sample_size, Some(30.0));
        assert!(policy.validate(&clamped).is_realistic);
    }

    #[test]
    fn test_apply_constraints_preserves_unbounded_fields() {
        let policy = RealismBoundsPolicy::new();
        let mut config = config_with(0.9, 0.2, 100.0);
        config.market_conditions.competition_intensity = Some(42.0);
        config.time_parameters.periods = 99;
        config.extra.insert("notes".to_string(), serde_json::json!({"k": [1, 2]}));

        let clamped = policy.apply_constraints(&config);
        assert_eq!(clamped.market_conditions.competition_intensity, Some(42.0));
        assert_eq!(clamped.time_parameters.periods, 99);
        assert_eq!(clamped.extra, config.extra);
        assert_eq!(clamped.market_conditions.economic_indicators.unemployment_rate, None);
    }

    proptest! {
        #[test]
        fn prop_apply_constraints_idempotent(
            interest in -10.0f64..10.0,
            inflation in -10.0f64..10.0,
            volatility in -5.0f64..5.0,
            correlation in -5.0f64..5.0,
            p_value in -1.0f64..1.0,
            sample in -1.0e7f64..1.0e7,
        ) {
            let policy = RealismBoundsPolicy::new();
            let mut config = ScenarioConfig::default();
            config.market_conditions.economic_indicators.interest_rate = Some(interest);
            config.market_conditions.economic_indicators.inflation_rate = Some(inflation);
            config.market_conditions.volatility = Some(volatility);
            config.market_conditions.correlation = Some(correlation);
            config.simulation_parameters.statistics.p_value_threshold = Some(p_value);
            config.simulation_parameters.statistics.sample_size = Some(sample);

            let once = policy.apply_constraints(&config);
            let twice = policy.apply_constraints(&once);
            prop_assert_eq!(&once, &twice);
            prop_assert!(policy.validate(&once).is_realistic);
        }
    }
}
