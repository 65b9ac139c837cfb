//! Bias analysis over consumer decision records.
//!
//! The analyzer is a strategy object: callers pick one at construction time
//! and the consumer model hands it finished records. The default analyzer
//! reports how often each bias fired and a purchase rate with bias-driven
//! purchases discounted.

use crate::consumer::{CognitiveBias, DecisionProcessRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of analyzing a batch of decisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiasAnalysis {
    /// Analyzer that produced this report
    pub analyzer: String,

    /// Fraction of records in which each bias was applied
    pub bias_prevalence: BTreeMap<CognitiveBias, f64>,

    /// Purchases where a status-quo or anchoring effect picked the option
    pub biased_purchases: usize,

    pub raw_purchase_rate: f64,

    /// Purchase rate with bias-driven purchases down-weighted
    pub corrected_purchase_rate: f64,

    /// corrected / raw, 1.0 when there were no purchases
    pub correction_factor: f64,
}

/// Strategy for analyzing cognitive-bias effects.
pub trait BiasAnalyzer: Send + Sync {
    /// Analyzes a batch of records.
    fn analyze(&self, records: &[DecisionProcessRecord]) -> BiasAnalysis;

    /// Returns the analyzer name.
    fn name(&self) -> &str;
}

/// Discounts purchases that a bias, not the evaluation, decided.
#[derive(Debug, Clone)]
pub struct DefaultBiasAnalyzer {
    /// Weight removed from a purchase made by status-quo override
    pub status_quo_discount: f64,

    /// Weight removed from a purchase of the anchored option among several
    pub anchoring_discount: f64,
}

impl Default for DefaultBiasAnalyzer {
    fn default() -> Self {
        Self {
            status_quo_discount: 0.5,
            anchoring_discount: 0.25,
        }
    }
}

impl DefaultBiasAnalyzer {
    fn purchase_weight(&self, record: &DecisionProcessRecord) -> (f64, bool) {
        let Some(decision) = &record.stages.purchase_decision else {
            return (0.0, false);
        };
        let Some(position) = decision.chosen_position else {
            return (0.0, false);
        };

        if decision.status_quo_override {
            return (1.0 - self.status_quo_discount, true);
        }

        let considered = record
            .stages
            .evaluation
            .as_ref()
            .map(|e| e.options.len())
            .unwrap_or(0);
        if position == 0 && considered > 1 {
            return (1.0 - self.anchoring_discount, true);
        }

        (1.0, false)
    }
}

impl BiasAnalyzer for DefaultBiasAnalyzer {
    fn analyze(&self, records: &[DecisionProcessRecord]) -> BiasAnalysis {
        if records.is_empty() {
            return BiasAnalysis {
                analyzer: self.name().to_string(),
                correction_factor: 1.0,
                ..Default::default()
            };
        }

        let n = records.len() as f64;
        let mut counts: BTreeMap<CognitiveBias, usize> = BTreeMap::new();
        let mut purchases = 0usize;
        let mut weighted = 0.0;
        let mut biased_purchases = 0usize;

        for record in records {
            for bias in &record.biases_applied {
                *counts.entry(*bias).or_insert(0) += 1;
            }
            if record.purchased() {
                purchases += 1;
                let (weight, biased) = self.purchase_weight(record);
                weighted += weight;
                if biased {
                    biased_purchases += 1;
                }
            }
        }

        let raw = purchases as f64 / n;
        let corrected = weighted / n;

        BiasAnalysis {
            analyzer: self.name().to_string(),
            bias_prevalence: counts.into_iter().map(|(b, c)| (b, c as f64 / n)).collect(),
            biased_purchases,
            raw_purchase_rate: raw,
            corrected_purchase_rate: corrected,
            correction_factor: if purchases == 0 { 1.0 } else { corrected / raw },
        }
    }

    fn name(&self) -> &str {
        "default"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::{ConsumerDecisionModel, ConsumerProfile, DecisionContext, ProductOption};

    #[test]
    fn test_empty_records() {
        let analysis = DefaultBiasAnalyzer::default().analyze(&[]);
        assert_eq!(analysis.raw_purchase_rate, 0.0);
        assert_eq!(analysis.correction_factor, 1.0);
        assert_eq!(analysis.analyzer, "default");
    }

    #[test]
    fn test_corrected_rate_never_exceeds_raw() {
        let model = ConsumerDecisionModel::new();
        let options = vec![
            ProductOption::new("a", 40.0, 0.8),
            ProductOption::new("b", 45.0, 0.82),
            ProductOption::new("c", 90.0, 0.95),
        ];
        let context = DecisionContext {
            information_exposure: 1.0,
            social_influence: 1.0,
        };

        let records: Vec<_> = (0..40u32)
            .map(|i| {
                let mut p = ConsumerProfile::new(format!("c{}", i));
                p.preferences.current_satisfaction = 0.0;
                p.behavior.problem_sensitivity = 1.0;
                p.behavior.brand_loyalty = (i % 11) as f64;
                p.behavior.attention_span = 10.0;
                model.simulate_decision(&p, &options, &context, 1000 + i).unwrap()
            })
            .collect();

        let analysis = DefaultBiasAnalyzer::default().analyze(&records);
        assert!(analysis.corrected_purchase_rate <= analysis.raw_purchase_rate);
        assert!(analysis.correction_factor <= 1.0);
        for prevalence in analysis.bias_prevalence.values() {
            assert!((0.0..=1.0).contains(prevalence));
        }
    }

    #[test]
    fn test_zero_discount_matches_raw_rate() {
        let analyzer = DefaultBiasAnalyzer {
            status_quo_discount: 0.0,
            anchoring_discount: 0.0,
        };
        let model = ConsumerDecisionModel::new();
        let mut p = ConsumerProfile::new("solo");
        p.preferences.current_satisfaction = 0.0;
        p.behavior.problem_sensitivity = 1.0;

        let records: Vec<_> = (1..20u32)
            .map(|s| {
                model
                    .simulate_decision(&p, &[ProductOption::new("x", 10.0, 0.9)], &DecisionContext::default(), s)
                    .unwrap()
            })
            .collect();

        let analysis = analyzer.analyze(&records);
        assert!((analysis.corrected_purchase_rate - analysis.raw_purchase_rate).abs() < 1e-12);
    }
}
