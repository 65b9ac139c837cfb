//! Result quality assessment.
//!
//! Quality is advisory: a low score never fails a run. It is a weighted blend
//! of four scores, each in [0, 1]:
//!
//! ```text
//! completeness   0.30   models that produced output / models required
//! consistency    0.25   outputs are finite, non-negative, rates in [0, 1]
//! statistical    0.25   statistical parameters present and in bounds
//! business       0.20   outputs make commercial sense
//! ```

use crate::executor::ModelOutput;
use market_core::bounds::{BoundedParameter, RealismBoundsPolicy};
use market_core::config::{ModelKind, ScenarioConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weighted quality score with its components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub assessor: String,
    pub overall_score: f64,
    pub completeness: f64,
    pub consistency: f64,
    pub statistical_validity: f64,
    pub business_logic: f64,

    /// Human-readable reasons for lost points
    pub issues: Vec<String>,
}

/// Trait for quality scoring strategies.
pub trait QualityAssessor: Send + Sync {
    /// Scores the outputs of a run.
    fn assess(
        &self,
        config: &ScenarioConfig,
        outputs: &BTreeMap<ModelKind, ModelOutput>,
        failures: &BTreeMap<ModelKind, String>,
    ) -> QualityAssessment;

    /// Returns the name of this assessor.
    fn name(&self) -> &str;
}

/// Component weights. Should sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    pub completeness: f64,
    pub consistency: f64,
    pub statistical: f64,
    pub business: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            completeness: 0.30,
            consistency: 0.25,
            statistical: 0.25,
            business: 0.20,
        }
    }
}

/// Default rule-based assessor.
#[derive(Debug, Clone, Default)]
pub struct DefaultQualityAssessor {
    pub weights: QualityWeights,
}

impl DefaultQualityAssessor {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Pass/fail tally for one family of checks.
#[derive(Default)]
struct Checks {
    passed: usize,
    total: usize,
    issues: Vec<String>,
}

impl Checks {
    fn check(&mut self, ok: bool, issue: impl FnOnce() -> String) {
        self.total += 1;
        if ok {
            self.passed += 1;
        } else {
            self.issues.push(issue());
        }
    }

    /// Fraction passed; 1.0 when nothing was checked.
    fn score(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.passed as f64 / self.total as f64
        }
    }
}

fn unit(x: f64) -> bool {
    x.is_finite() && (0.0..=1.0).contains(&x)
}

fn non_negative(x: f64) -> bool {
    x.is_finite() && x >= 0.0
}

const STATISTICAL_FIELDS: [BoundedParameter; 4] = [
    BoundedParameter::ConfidenceInterval,
    BoundedParameter::PValueThreshold,
    BoundedParameter::SampleSize,
    BoundedParameter::EffectSize,
];

impl QualityAssessor for DefaultQualityAssessor {
    fn assess(
        &self,
        config: &ScenarioConfig,
        outputs: &BTreeMap<ModelKind, ModelOutput>,
        failures: &BTreeMap<ModelKind, String>,
    ) -> QualityAssessment {
        let mut issues = Vec::new();

        // Completeness
        let required = config.required_models();
        let completed = required.iter().filter(|m| outputs.contains_key(m)).count();
        let completeness = if required.is_empty() {
            0.0
        } else {
            completed as f64 / required.len() as f64
        };
        for (model, reason) in failures {
            issues.push(format!("{} failed: {}", model, reason));
        }

        // Consistency and business logic
        let mut consistency = Checks::default();
        let mut business = Checks::default();
        for output in outputs.values() {
            check_output(output, &mut consistency, &mut business);
        }

        // Statistical fields
        let policy = RealismBoundsPolicy::new();
        let valid_stats = STATISTICAL_FIELDS
            .iter()
            .filter(|p| {
                p.value(config)
                    .map(|v| policy.bound_for(**p).contains(v))
                    .unwrap_or(false)
            })
            .count();
        let statistical_validity = valid_stats as f64 / STATISTICAL_FIELDS.len() as f64;
        if valid_stats < STATISTICAL_FIELDS.len() {
            issues.push(format!(
                "{} of {} statistical parameters missing or out of bounds",
                STATISTICAL_FIELDS.len() - valid_stats,
                STATISTICAL_FIELDS.len()
            ));
        }

        issues.extend(consistency.issues.iter().cloned());
        issues.extend(business.issues.iter().cloned());

        let w = &self.weights;
        let overall_score = w.completeness * completeness
            + w.consistency * consistency.score()
            + w.statistical * statistical_validity
            + w.business * business.score();

        QualityAssessment {
            assessor: self.name().to_string(),
            overall_score,
            completeness,
            consistency: consistency.score(),
            statistical_validity,
            business_logic: business.score(),
            issues,
        }
    }

    fn name(&self) -> &str {
        "default"
    }
}

fn check_output(output: &ModelOutput, consistency: &mut Checks, business: &mut Checks) {
    match output {
        ModelOutput::ConsumerDecision(summary) => {
            consistency.check(unit(summary.purchase_rate), || "consumer purchase rate outside [0, 1]".into());
            consistency.check(unit(summary.average_confidence), || "consumer confidence outside [0, 1]".into());
            consistency.check(
                summary.action_counts.values().sum::<usize>() == summary.consumers,
                || "consumer action counts do not add up".into(),
            );
            business.check(summary.consumers > 0, || "consumer panel is empty".into());
            business.check(
                summary.bias_analysis.corrected_purchase_rate <= summary.purchase_rate + 1e-9,
                || "bias-corrected purchase rate exceeds raw rate".into(),
            );
        }
        ModelOutput::ChannelDynamics(channel) => {
            let overall = &channel.simulation.overall_performance;
            consistency.check(
                non_negative(overall.total_traffic)
                    && non_negative(overall.total_conversions)
                    && non_negative(overall.total_cost),
                || "channel totals negative or non-finite".into(),
            );
            consistency.check(
                channel
                    .simulation
                    .channels
                    .values()
                    .all(|c| unit(c.contribution_share)),
                || "channel contribution share outside [0, 1]".into(),
            );
            business.check(overall.total_conversions <= overall.total_traffic, || {
                "channel conversions exceed traffic".into()
            });
            business.check(overall.total_conversions > 0.0, || "channels produced no conversions".into());
            if let Some(allocation) = &channel.allocation {
                business.check(
                    allocation.allocations.values().map(|a| a.budget).sum::<f64>()
                        <= allocation.budget * (1.0 + 1e-9),
                    || "channel allocation exceeds budget".into(),
                );
            }
        }
        ModelOutput::CompetitorReaction(sim) => {
            consistency.check(
                sim.competitors.iter().all(|c| {
                    c.resource_trajectory
                        .iter()
                        .try_fold(c.initial_resources, |prev, r| (*r <= prev + 1e-9).then_some(*r))
                        .is_some()
                }),
                || "competitor resources increased".into(),
            );
            consistency.check(
                sim.competitors.iter().all(|c| unit(c.reaction_effectiveness.success_rate)),
                || "competitor success rate outside [0, 1]".into(),
            );
            business.check(
                sim.competitors
                    .iter()
                    .all(|c| c.final_resources <= c.initial_resources),
                || "competitor ended with more resources than it started".into(),
            );
        }
        ModelOutput::SocialProof(sim) => {
            consistency.check(unit(sim.final_adoption_rate), || "adoption rate outside [0, 1]".into());
            consistency.check(
                sim.adoption_curve.windows(2).all(|w| w[1] >= w[0]),
                || "adoption curve decreased".into(),
            );
            business.check(
                sim.adoption_curve.last() >= sim.adoption_curve.first(),
                || "adoption ended below its starting point".into(),
            );
            if let Some(t) = &sim.testimonials {
                business.check(unit(t.final_belief) && unit(t.final_credibility), || {
                    "testimonial belief or credibility outside [0, 1]".into()
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::default_executors;
    use crate::scenarios::ScenarioId;
    use approx::assert_abs_diff_eq;

    fn run_all(config: &ScenarioConfig) -> BTreeMap<ModelKind, ModelOutput> {
        default_executors()
            .iter()
            .filter(|e| config.required_models().contains(&e.model()))
            .map(|e| (e.model(), e.execute(config, 42).unwrap()))
            .collect()
    }

    #[test]
    fn test_weights_sum_to_one() {
        let w = QualityWeights::default();
        assert_abs_diff_eq!(w.completeness + w.consistency + w.statistical + w.business, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_complete_preset_scores_high() {
        let config = ScenarioId::ChannelMix.config();
        let outputs = run_all(&config);
        let quality = DefaultQualityAssessor::new().assess(&config, &outputs, &BTreeMap::new());

        assert_eq!(quality.completeness, 1.0);
        assert_eq!(quality.statistical_validity, 1.0);
        assert!(quality.overall_score >= 0.9, "score {}", quality.overall_score);
    }

    #[test]
    fn test_failures_lower_completeness() {
        let config = ScenarioId::FullMarket.config();
        let mut outputs = run_all(&config);
        outputs.remove(&ModelKind::SocialProof);
        let failures = BTreeMap::from([(ModelKind::SocialProof, "boom".to_string())]);

        let quality = DefaultQualityAssessor::new().assess(&config, &outputs, &failures);
        assert_abs_diff_eq!(quality.completeness, 0.75);
        assert!(quality.issues.iter().any(|i| i.contains("boom")));
    }

    #[test]
    fn test_missing_statistics_lower_score() {
        let mut config = ScenarioId::ConsumerResearch.config();
        config.simulation_parameters.statistics = Default::default();
        let outputs = run_all(&config);

        let quality = DefaultQualityAssessor::new().assess(&config, &outputs, &BTreeMap::new());
        assert_eq!(quality.statistical_validity, 0.0);
        assert!(quality.overall_score <= 0.75 + 1e-12);
    }
}
