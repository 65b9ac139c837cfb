//! Consumer Decision Model
//!
//! Walks one synthetic buyer through a five-stage bounded-rationality funnel:
//!
//! ```text
//! 1. problem recognition ──(score ≤ 0.6)──► no_action
//!          │
//! 2. information search    availability-ranked, truncated by attention span
//!          │
//! 3. evaluation            anchoring, social proof, loss aversion on price
//!          │
//! 4. purchase decision     satisficing threshold + status-quo override
//!          │
//! 5. post-purchase         satisfaction, regret, advocacy, repurchase
//! ```
//!
//! Each consumer is classified into a segment whose parameter overrides apply
//! to a per-call copy of the model parameters only.

use crate::bias::{BiasAnalysis, BiasAnalyzer};
use crate::error::ModelError;
use crate::sampling::{chance, clip01, gaussian, mean, model_rng};
use crate::seed::Seed;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

const MODEL: &str = "consumer_decision";

/// Stage 1 scores at or below this end the process with `no_action`.
pub const RECOGNITION_THRESHOLD: f64 = 0.6;

/// The first option may replace the best if it scores within this fraction.
pub const STATUS_QUO_WINDOW: f64 = 0.9;

/// Unacceptable-but-close best options (≥ this × threshold) delay the purchase.
pub const DELAY_FRACTION: f64 = 0.8;

// =============================================================================
// CONSUMER PROFILE
// =============================================================================

/// How a consumer approaches a decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStyle {
    #[default]
    Analytical,
    Intuitive,
    Social,
    Habitual,
}

/// Demographic attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Demographics {
    pub age: u32,
    pub income: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Default for Demographics {
    fn default() -> Self {
        Self {
            age: 35,
            income: 55_000.0,
            education: None,
            location: None,
        }
    }
}

/// Behavioral traits. Scores are on a 0-10 scale unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehavioralTraits {
    pub risk_tolerance: f64,
    pub brand_loyalty: f64,
    pub price_sensitivity: f64,
    pub attention_span: f64,

    /// Sensitivity to noticing a problem, in [0, 1]
    pub problem_sensitivity: f64,
}

impl Default for BehavioralTraits {
    fn default() -> Self {
        Self {
            risk_tolerance: 5.0,
            brand_loyalty: 5.0,
            price_sensitivity: 5.0,
            attention_span: 5.0,
            problem_sensitivity: 0.6,
        }
    }
}

/// Market receptivity preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketReceptivity {
    pub decision_style: DecisionStyle,
    pub preferred_channels: Vec<String>,

    /// Satisfaction with the status quo, in [0, 1]
    pub current_satisfaction: f64,
}

impl Default for MarketReceptivity {
    fn default() -> Self {
        Self {
            decision_style: DecisionStyle::default(),
            preferred_channels: Vec::new(),
            current_satisfaction: 0.3,
        }
    }
}

/// A synthetic buyer. Immutable input to one decision simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerProfile {
    pub consumer_id: String,
    pub demographics: Demographics,
    pub behavior: BehavioralTraits,
    pub preferences: MarketReceptivity,
}

impl ConsumerProfile {
    /// Creates a profile with default traits.
    pub fn new(consumer_id: impl Into<String>) -> Self {
        Self {
            consumer_id: consumer_id.into(),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        let b = &self.behavior;
        let scaled = [
            ("risk_tolerance", b.risk_tolerance),
            ("brand_loyalty", b.brand_loyalty),
            ("price_sensitivity", b.price_sensitivity),
            ("attention_span", b.attention_span),
        ];
        for (name, value) in scaled {
            if !(value.is_finite() && (0.0..=10.0).contains(&value)) {
                return Err(ModelError::invalid(
                    MODEL,
                    format!("{}: {} must be in [0, 10], got {}", self.consumer_id, name, value),
                ));
            }
        }

        let unit = [
            ("problem_sensitivity", b.problem_sensitivity),
            ("current_satisfaction", self.preferences.current_satisfaction),
        ];
        for (name, value) in unit {
            if !(value.is_finite() && (0.0..=1.0).contains(&value)) {
                return Err(ModelError::invalid(
                    MODEL,
                    format!("{}: {} must be in [0, 1], got {}", self.consumer_id, name, value),
                ));
            }
        }

        Ok(())
    }
}

// =============================================================================
// OPTIONS & CONTEXT
// =============================================================================

/// A product the consumer may buy. Attributes other than price are in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductOption {
    pub option_id: String,
    pub price: f64,
    pub quality: f64,
    pub brand_reputation: f64,
    pub brand_recognition: f64,
    pub social_proof: f64,
    pub advertising_intensity: f64,
    pub features: f64,
    pub design: f64,
    pub convenience: f64,
    pub review_score: f64,
}

impl Default for ProductOption {
    fn default() -> Self {
        Self {
            option_id: String::new(),
            price: 100.0,
            quality: 0.5,
            brand_reputation: 0.5,
            brand_recognition: 0.5,
            social_proof: 0.5,
            advertising_intensity: 0.5,
            features: 0.5,
            design: 0.5,
            convenience: 0.5,
            review_score: 0.5,
        }
    }
}

impl ProductOption {
    /// Creates an option with neutral attributes.
    pub fn new(option_id: impl Into<String>, price: f64, quality: f64) -> Self {
        Self {
            option_id: option_id.into(),
            price,
            quality,
            ..Default::default()
        }
    }

    fn availability_score(&self) -> f64 {
        0.4 * self.brand_recognition + 0.35 * self.social_proof + 0.25 * self.advertising_intensity
    }

    fn validate(&self) -> Result<(), ModelError> {
        if !(self.price.is_finite() && self.price >= 0.0) {
            return Err(ModelError::invalid(
                MODEL,
                format!("option {}: price must be a non-negative number", self.option_id),
            ));
        }

        let unit = [
            self.quality,
            self.brand_reputation,
            self.brand_recognition,
            self.social_proof,
            self.advertising_intensity,
            self.features,
            self.design,
            self.convenience,
            self.review_score,
        ];
        if unit.iter().any(|v| !(v.is_finite() && (0.0..=1.0).contains(v))) {
            return Err(ModelError::invalid(
                MODEL,
                format!("option {}: attributes must be in [0, 1]", self.option_id),
            ));
        }

        Ok(())
    }
}

/// External stimulus feeding problem recognition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionContext {
    /// Exposure to information about the category, in [0, 1]
    pub information_exposure: f64,

    /// Peer influence, in [0, 1]
    pub social_influence: f64,
}

impl Default for DecisionContext {
    fn default() -> Self {
        Self {
            information_exposure: 0.7,
            social_influence: 0.6,
        }
    }
}

/// Scenario section for the consumer model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerScenario {
    pub profiles: Vec<ConsumerProfile>,
    pub options: Vec<ProductOption>,
    pub context: DecisionContext,
}

// =============================================================================
// SEGMENTS & PARAMETERS
// =============================================================================

/// Archetypal consumer segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerSegment {
    RationalOptimizer,
    Satisficer,
    Impulsive,
    Loyalist,
}

impl ConsumerSegment {
    /// Classifies a consumer from risk tolerance, brand loyalty and style.
    pub fn classify(profile: &ConsumerProfile) -> Self {
        let b = &profile.behavior;
        let style = profile.preferences.decision_style;

        if b.brand_loyalty >= 7.0 {
            ConsumerSegment::Loyalist
        } else if b.risk_tolerance >= 7.0
            && matches!(style, DecisionStyle::Intuitive | DecisionStyle::Social)
        {
            ConsumerSegment::Impulsive
        } else if style == DecisionStyle::Analytical {
            ConsumerSegment::RationalOptimizer
        } else {
            ConsumerSegment::Satisficer
        }
    }

    /// Returns true if the segment accepts "good enough" options.
    pub fn satisfices(&self) -> bool {
        matches!(self, ConsumerSegment::Satisficer | ConsumerSegment::Impulsive)
    }
}

/// Heuristic parameters of the decision process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionParameters {
    /// Minimum overall score for an option to be acceptable
    pub satisficing_threshold: f64,

    /// Boost applied to the first considered option
    pub anchoring_strength: f64,

    /// Loss-aversion coefficient λ applied to price increases
    pub loss_aversion: f64,

    /// Blend weight of an option's social proof into each criterion
    pub social_proof_weight: f64,

    /// Probability of sticking with the first option when it is close
    pub status_quo_bias: f64,

    /// Scales attention span in information search
    pub attention_multiplier: f64,

    /// Scales every perception noise term
    pub noise_scale: f64,
}

impl Default for DecisionParameters {
    fn default() -> Self {
        Self {
            satisficing_threshold: 0.55,
            anchoring_strength: 0.10,
            loss_aversion: 2.25,
            social_proof_weight: 0.20,
            status_quo_bias: 0.30,
            attention_multiplier: 1.0,
            noise_scale: 1.0,
        }
    }
}

impl DecisionParameters {
    /// Returns a copy with the segment's overrides applied.
    pub fn for_segment(&self, segment: ConsumerSegment) -> Self {
        let mut p = self.clone();
        match segment {
            ConsumerSegment::RationalOptimizer => {
                p.satisficing_threshold = 0.65;
                p.anchoring_strength = 0.05;
                p.social_proof_weight = 0.10;
                p.status_quo_bias = 0.10;
                p.attention_multiplier = 1.2;
                p.noise_scale = 0.7;
            }
            ConsumerSegment::Satisficer => {
                p.satisficing_threshold = 0.50;
            }
            ConsumerSegment::Impulsive => {
                p.satisficing_threshold = 0.45;
                p.anchoring_strength = 0.15;
                p.social_proof_weight = 0.35;
                p.status_quo_bias = 0.15;
                p.attention_multiplier = 0.6;
                p.noise_scale = 1.4;
            }
            ConsumerSegment::Loyalist => {
                p.status_quo_bias = 0.75;
                p.loss_aversion = 2.5;
                p.anchoring_strength = 0.20;
            }
        }
        p
    }
}

// =============================================================================
// CRITERIA & BIASES
// =============================================================================

/// Evaluation criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Price,
    Quality,
    BrandReputation,
    Features,
    Reviews,
    Design,
    Convenience,
}

impl Criterion {
    /// Returns the criteria a decision style looks at.
    pub fn for_style(style: DecisionStyle) -> Vec<Criterion> {
        let mut criteria = vec![Criterion::Price, Criterion::Quality, Criterion::BrandReputation];
        match style {
            DecisionStyle::Analytical => {
                criteria.push(Criterion::Features);
                criteria.push(Criterion::Reviews);
            }
            DecisionStyle::Intuitive => criteria.push(Criterion::Design),
            DecisionStyle::Social => criteria.push(Criterion::Reviews),
            DecisionStyle::Habitual => criteria.push(Criterion::Convenience),
        }
        criteria
    }

    fn raw_score(&self, option: &ProductOption, min_price: f64) -> f64 {
        match self {
            Criterion::Price => {
                if option.price <= 0.0 {
                    1.0
                } else {
                    (min_price.max(0.0) / option.price).min(1.0)
                }
            }
            Criterion::Quality => option.quality,
            Criterion::BrandReputation => option.brand_reputation,
            Criterion::Features => option.features,
            Criterion::Reviews => option.review_score,
            Criterion::Design => option.design,
            Criterion::Convenience => option.convenience,
        }
    }

    fn weight(&self, behavior: &BehavioralTraits) -> f64 {
        match self {
            Criterion::Price => 0.2 + 0.4 * behavior.price_sensitivity / 10.0,
            Criterion::Quality => 0.3,
            Criterion::BrandReputation => 0.1 + 0.2 * behavior.brand_loyalty / 10.0,
            _ => 0.15,
        }
    }
}

/// Cognitive biases the model can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CognitiveBias {
    Availability,
    Anchoring,
    SocialProof,
    LossAversion,
    StatusQuo,
    Satisficing,
}

/// Ordered, duplicate-free list of applied biases.
#[derive(Debug, Default)]
struct AppliedBiases(Vec<CognitiveBias>);

impl AppliedBiases {
    fn record(&mut self, bias: CognitiveBias) {
        if !self.0.contains(&bias) {
            self.0.push(bias);
        }
    }
}

// =============================================================================
// DECISION RECORD
// =============================================================================

/// Stage 1 result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemRecognition {
    pub score: f64,
    pub dissatisfaction: f64,
    pub information_exposure: f64,
    pub social_influence: f64,
    pub problem_sensitivity: f64,
    pub triggered: bool,
}

/// An option that made it into the consideration set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedOption {
    pub option_id: String,
    /// Position in the caller's option list
    pub index: usize,
    pub availability_score: f64,
}

/// Stage 2 result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InformationSearch {
    pub options_available: usize,
    pub max_considered: usize,
    pub considered: Vec<RankedOption>,
    pub excluded: Vec<String>,
}

/// One criterion's score for one option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion: Criterion,
    pub raw: f64,
    pub adjusted: f64,
    pub weight: f64,
}

/// Stage 3 result for one option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionEvaluation {
    pub option_id: String,
    pub criteria: Vec<CriterionScore>,
    pub overall_score: f64,
    pub acceptable: bool,
    pub anchored: bool,
}

/// Stage 3 result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub criteria: Vec<Criterion>,
    pub reference_price: f64,
    pub satisficing_threshold: f64,
    pub options: Vec<OptionEvaluation>,
}

/// Stage 4 result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseDecision {
    /// Position of the chosen option in the consideration set
    pub chosen_position: Option<usize>,
    pub best_position: usize,
    pub best_score: f64,
    pub runner_up_score: f64,
    pub status_quo_override: bool,
    pub confidence: f64,
}

/// Stage 5 result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPurchaseEvaluation {
    pub satisfaction: f64,
    pub regret: f64,
    pub recommendation_likelihood: f64,
    pub repurchase_intent: f64,
}

/// Ordered stage trace. Later stages are `None` after early termination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionStages {
    pub problem_recognition: ProblemRecognition,
    pub information_search: Option<InformationSearch>,
    pub evaluation: Option<Evaluation>,
    pub purchase_decision: Option<PurchaseDecision>,
    pub post_purchase: Option<PostPurchaseEvaluation>,
}

/// Outcome of the process, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FinalDecision {
    Purchase { option_id: String, price: f64 },
    DelayPurchase { reason: String },
    NoPurchase { reason: String },
    NoAction { reason: String },
}

/// The untagged action of a [`FinalDecision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Purchase,
    DelayPurchase,
    NoPurchase,
    NoAction,
}

impl FinalDecision {
    pub fn action(&self) -> DecisionAction {
        match self {
            FinalDecision::Purchase { .. } => DecisionAction::Purchase,
            FinalDecision::DelayPurchase { .. } => DecisionAction::DelayPurchase,
            FinalDecision::NoPurchase { .. } => DecisionAction::NoPurchase,
            FinalDecision::NoAction { .. } => DecisionAction::NoAction,
        }
    }
}

/// Full trace of one consumer's decision. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionProcessRecord {
    pub consumer_id: String,
    pub segment: ConsumerSegment,
    pub stages: DecisionStages,
    pub final_decision: FinalDecision,
    pub decision_confidence: f64,
    pub cognitive_load: f64,
    pub biases_applied: Vec<CognitiveBias>,
}

impl DecisionProcessRecord {
    pub fn purchased(&self) -> bool {
        self.final_decision.action() == DecisionAction::Purchase
    }
}

/// Aggregate of a batch of decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSummary {
    pub consumers: usize,
    pub action_counts: BTreeMap<DecisionAction, usize>,
    pub segment_distribution: BTreeMap<ConsumerSegment, usize>,
    pub purchase_rate: f64,
    pub average_confidence: f64,
    pub average_cognitive_load: f64,
    /// Share of purchases per option id
    pub option_share: BTreeMap<String, f64>,
    pub bias_analysis: BiasAnalysis,
    pub records: Vec<DecisionProcessRecord>,
}

// =============================================================================
// MODEL
// =============================================================================

/// The consumer decision model. Holds only immutable base parameters.
#[derive(Debug, Clone, Default)]
pub struct ConsumerDecisionModel {
    base_parameters: DecisionParameters,
}

impl ConsumerDecisionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model with custom base parameters.
    pub fn with_parameters(base_parameters: DecisionParameters) -> Self {
        Self { base_parameters }
    }

    pub fn base_parameters(&self) -> &DecisionParameters {
        &self.base_parameters
    }

    /// Simulates one consumer's decision.
    pub fn simulate_decision(
        &self,
        profile: &ConsumerProfile,
        options: &[ProductOption],
        context: &DecisionContext,
        seed: Seed,
    ) -> Result<DecisionProcessRecord, ModelError> {
        profile.validate()?;
        for option in options {
            option.validate()?;
        }

        let mut rng = model_rng(seed);
        let segment = ConsumerSegment::classify(profile);
        let params = self.base_parameters.for_segment(segment);
        let mut biases = AppliedBiases::default();

        // Stage 1
        let recognition = recognize_problem(profile, context, &params, &mut rng);
        if !recognition.triggered {
            debug!(
                "{}: recognition {:.3} below threshold, no action",
                profile.consumer_id, recognition.score
            );
            let confidence = clip01(1.0 - recognition.score);
            return Ok(DecisionProcessRecord {
                consumer_id: profile.consumer_id.clone(),
                segment,
                stages: DecisionStages {
                    problem_recognition: recognition,
                    information_search: None,
                    evaluation: None,
                    purchase_decision: None,
                    post_purchase: None,
                },
                final_decision: FinalDecision::NoAction {
                    reason: "problem not recognized".to_string(),
                },
                decision_confidence: confidence,
                cognitive_load: 0.0,
                biases_applied: Vec::new(),
            });
        }

        // Stage 2
        let search = search_information(profile, options, &params);
        if search.considered.is_empty() {
            return Ok(DecisionProcessRecord {
                consumer_id: profile.consumer_id.clone(),
                segment,
                stages: DecisionStages {
                    problem_recognition: recognition,
                    information_search: Some(search),
                    evaluation: None,
                    purchase_decision: None,
                    post_purchase: None,
                },
                final_decision: FinalDecision::NoPurchase {
                    reason: "no options available".to_string(),
                },
                decision_confidence: 1.0,
                cognitive_load: 0.0,
                biases_applied: Vec::new(),
            });
        }
        if search.considered.len() < search.options_available {
            biases.record(CognitiveBias::Availability);
        }

        // Stage 3
        let considered: Vec<&ProductOption> =
            search.considered.iter().map(|r| &options[r.index]).collect();
        let evaluation = evaluate_options(profile, &considered, &params, &mut rng, &mut biases);

        // Stage 4
        let decision = decide(&evaluation, &params, &mut rng, &mut biases);

        let final_decision = match decision.chosen_position {
            Some(pos) => {
                if segment.satisfices() {
                    biases.record(CognitiveBias::Satisficing);
                }
                FinalDecision::Purchase {
                    option_id: considered[pos].option_id.clone(),
                    price: considered[pos].price,
                }
            }
            None if decision.best_score >= DELAY_FRACTION * params.satisficing_threshold => {
                FinalDecision::DelayPurchase {
                    reason: format!(
                        "best option scored {:.3}, close to threshold {:.3}",
                        decision.best_score, params.satisficing_threshold
                    ),
                }
            }
            None => FinalDecision::NoPurchase {
                reason: format!(
                    "no option met the satisficing threshold {:.3}",
                    params.satisficing_threshold
                ),
            },
        };

        // Stage 5
        let purchased = decision.chosen_position.is_some();
        let post = post_purchase(profile, decision.confidence, purchased, &params, &mut rng);

        let cognitive_load = clip01(
            (considered.len() * evaluation.criteria.len()) as f64 / 25.0
                + 0.1 * biases.0.len() as f64,
        );

        debug!(
            "{} ({:?}): {:?} with confidence {:.3}",
            profile.consumer_id,
            segment,
            final_decision.action(),
            decision.confidence
        );

        Ok(DecisionProcessRecord {
            consumer_id: profile.consumer_id.clone(),
            segment,
            decision_confidence: decision.confidence,
            stages: DecisionStages {
                problem_recognition: recognition,
                information_search: Some(search),
                evaluation: Some(evaluation),
                purchase_decision: Some(decision),
                post_purchase: Some(post),
            },
            final_decision,
            cognitive_load,
            biases_applied: biases.0,
        })
    }

    /// Simulates a batch of consumers against the same option set.
    ///
    /// Consumer `i` runs with seed `seed + i` (wrapping), so adding consumers
    /// never changes the decisions of earlier ones.
    pub fn simulate_population(
        &self,
        profiles: &[ConsumerProfile],
        options: &[ProductOption],
        context: &DecisionContext,
        seed: Seed,
        analyzer: &dyn BiasAnalyzer,
    ) -> Result<PopulationSummary, ModelError> {
        let records = profiles
            .iter()
            .enumerate()
            .map(|(i, profile)| {
                self.simulate_decision(profile, options, context, seed.wrapping_add(i as Seed))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut action_counts = BTreeMap::new();
        let mut segment_distribution = BTreeMap::new();
        let mut purchases_by_option: BTreeMap<String, usize> = BTreeMap::new();

        for record in &records {
            *action_counts.entry(record.final_decision.action()).or_insert(0) += 1;
            *segment_distribution.entry(record.segment).or_insert(0) += 1;
            if let FinalDecision::Purchase { option_id, .. } = &record.final_decision {
                *purchases_by_option.entry(option_id.clone()).or_insert(0) += 1;
            }
        }

        let purchases: usize = purchases_by_option.values().sum();
        let option_share = purchases_by_option
            .into_iter()
            .map(|(id, n)| (id, n as f64 / purchases as f64))
            .collect();

        let confidences: Vec<f64> = records.iter().map(|r| r.decision_confidence).collect();
        let loads: Vec<f64> = records.iter().map(|r| r.cognitive_load).collect();
        let purchase_rate = if records.is_empty() {
            0.0
        } else {
            purchases as f64 / records.len() as f64
        };

        info!(
            "Consumer population: {} consumers, purchase rate {:.1}%",
            records.len(),
            purchase_rate * 100.0
        );

        Ok(PopulationSummary {
            consumers: records.len(),
            action_counts,
            segment_distribution,
            purchase_rate,
            average_confidence: mean(&confidences),
            average_cognitive_load: mean(&loads),
            option_share,
            bias_analysis: analyzer.analyze(&records),
            records,
        })
    }
}

// =============================================================================
// STAGES
// =============================================================================

fn recognize_problem(
    profile: &ConsumerProfile,
    context: &DecisionContext,
    params: &DecisionParameters,
    rng: &mut ChaCha8Rng,
) -> ProblemRecognition {
    let dissatisfaction = 1.0 - profile.preferences.current_satisfaction;
    let exposure = clip01(context.information_exposure);
    let social = clip01(context.social_influence);
    let sensitivity = profile.behavior.problem_sensitivity;

    let weighted = 0.35 * dissatisfaction + 0.25 * exposure + 0.20 * social + 0.20 * sensitivity;
    let score = clip01(weighted + gaussian(rng, 0.0, 0.1 * params.noise_scale));

    ProblemRecognition {
        score,
        dissatisfaction,
        information_exposure: exposure,
        social_influence: social,
        problem_sensitivity: sensitivity,
        triggered: score > RECOGNITION_THRESHOLD,
    }
}

/// Availability heuristic: rank by how easily an option comes to mind, then
/// keep only as many as attention allows.
fn search_information(
    profile: &ConsumerProfile,
    options: &[ProductOption],
    params: &DecisionParameters,
) -> InformationSearch {
    let mut ranked: Vec<RankedOption> = options
        .iter()
        .enumerate()
        .map(|(index, o)| RankedOption {
            option_id: o.option_id.clone(),
            index,
            availability_score: o.availability_score(),
        })
        .collect();

    // Stable: ties keep the caller's order
    ranked.sort_by(|a, b| b.availability_score.total_cmp(&a.availability_score));

    let max_considered = attention_capacity(profile.behavior.attention_span, params).min(options.len());
    let excluded = ranked
        .split_off(max_considered)
        .into_iter()
        .map(|r| r.option_id)
        .collect();

    InformationSearch {
        options_available: options.len(),
        max_considered,
        considered: ranked,
        excluded,
    }
}

/// Number of options an attention span allows. Non-decreasing in span.
fn attention_capacity(attention_span: f64, params: &DecisionParameters) -> usize {
    let effective = (attention_span * params.attention_multiplier).max(0.0);
    1 + (effective / 2.5).floor() as usize
}

fn evaluate_options(
    profile: &ConsumerProfile,
    considered: &[&ProductOption],
    params: &DecisionParameters,
    rng: &mut ChaCha8Rng,
    biases: &mut AppliedBiases,
) -> Evaluation {
    let criteria = Criterion::for_style(profile.preferences.decision_style);
    let min_price = considered.iter().map(|o| o.price).fold(f64::INFINITY, f64::min);
    let reference_price = considered[0].price;
    let noise_std = 0.05 * params.noise_scale;

    if considered.len() > 1 {
        biases.record(CognitiveBias::Anchoring);
    }
    if params.social_proof_weight > 0.0 {
        biases.record(CognitiveBias::SocialProof);
    }

    let options = considered
        .iter()
        .enumerate()
        .map(|(position, option)| {
            let anchored = position == 0;
            let scores: Vec<CriterionScore> = criteria
                .iter()
                .map(|criterion| {
                    let raw = criterion.raw_score(option, min_price);
                    let mut s = clip01(raw + gaussian(rng, 0.0, noise_std));

                    if anchored {
                        s = clip01(s * (1.0 + params.anchoring_strength));
                    }

                    let w = params.social_proof_weight;
                    s = (1.0 - w) * s + w * option.social_proof;

                    if *criterion == Criterion::Price
                        && reference_price > 0.0
                        && option.price > reference_price
                    {
                        let excess = (option.price - reference_price) / reference_price;
                        s /= 1.0 + (params.loss_aversion - 1.0) * excess;
                        biases.record(CognitiveBias::LossAversion);
                    }

                    CriterionScore {
                        criterion: *criterion,
                        raw,
                        adjusted: clip01(s),
                        weight: criterion.weight(&profile.behavior),
                    }
                })
                .collect();

            let weight_sum: f64 = scores.iter().map(|c| c.weight).sum();
            let overall_score = if weight_sum > 0.0 {
                scores.iter().map(|c| c.weight * c.adjusted).sum::<f64>() / weight_sum
            } else {
                0.0
            };

            OptionEvaluation {
                option_id: option.option_id.clone(),
                criteria: scores,
                overall_score,
                acceptable: overall_score >= params.satisficing_threshold,
                anchored,
            }
        })
        .collect();

    Evaluation {
        criteria,
        reference_price,
        satisficing_threshold: params.satisficing_threshold,
        options,
    }
}

fn decide(
    evaluation: &Evaluation,
    params: &DecisionParameters,
    rng: &mut ChaCha8Rng,
    biases: &mut AppliedBiases,
) -> PurchaseDecision {
    let evals = &evaluation.options;

    // First maximum wins ties
    let best_position = evals
        .iter()
        .enumerate()
        .fold(0, |best, (i, e)| if e.overall_score > evals[best].overall_score { i } else { best });
    let best = &evals[best_position];
    let runner_up_score = evals
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != best_position)
        .map(|(_, e)| e.overall_score)
        .fold(0.0, f64::max);

    let mut chosen_position = None;
    let mut status_quo_override = false;

    if best.acceptable {
        chosen_position = Some(best_position);

        let first = &evals[0];
        if best_position != 0
            && first.acceptable
            && first.overall_score >= STATUS_QUO_WINDOW * best.overall_score
            && chance(rng, params.status_quo_bias)
        {
            chosen_position = Some(0);
            status_quo_override = true;
            biases.record(CognitiveBias::StatusQuo);
        }
    }

    let margin = best.overall_score - runner_up_score;
    let confidence = clip01(
        0.5 + 2.0 * margin
            + (best.overall_score - params.satisficing_threshold)
            + gaussian(rng, 0.0, 0.05),
    );

    PurchaseDecision {
        chosen_position,
        best_position,
        best_score: best.overall_score,
        runner_up_score,
        status_quo_override,
        confidence,
    }
}

fn post_purchase(
    profile: &ConsumerProfile,
    confidence: f64,
    purchased: bool,
    params: &DecisionParameters,
    rng: &mut ChaCha8Rng,
) -> PostPurchaseEvaluation {
    let satisfaction = clip01(0.8 * confidence + 0.1 + gaussian(rng, 0.0, 0.1 * params.noise_scale));
    let regret_noise = gaussian(rng, 0.0, 0.05);
    let advocacy_noise = gaussian(rng, 0.0, 0.1);
    let repurchase_noise = gaussian(rng, 0.0, 0.05);

    if !purchased {
        // Regret here is the felt cost of walking away
        return PostPurchaseEvaluation {
            satisfaction,
            regret: clip01(0.5 * (1.0 - satisfaction) + regret_noise),
            recommendation_likelihood: 0.0,
            repurchase_intent: 0.0,
        };
    }

    PostPurchaseEvaluation {
        satisfaction,
        regret: clip01(1.0 - satisfaction + regret_noise),
        recommendation_likelihood: clip01(0.9 * satisfaction + advocacy_noise),
        repurchase_intent: clip01(
            0.6 * satisfaction + 0.4 * profile.behavior.brand_loyalty / 10.0 + repurchase_noise,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bias::DefaultBiasAnalyzer;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn eager_profile(id: &str) -> ConsumerProfile {
        let mut p = ConsumerProfile::new(id);
        p.preferences.current_satisfaction = 0.05;
        p.behavior.problem_sensitivity = 0.9;
        p
    }

    fn eager_context() -> DecisionContext {
        DecisionContext {
            information_exposure: 0.95,
            social_influence: 0.9,
        }
    }

    fn two_options() -> Vec<ProductOption> {
        vec![
            ProductOption::new("basic", 50.0, 0.7),
            ProductOption::new("premium", 150.0, 0.9),
        ]
    }

    #[test]
    fn test_example_scenario_is_deterministic() {
        let mut profile = ConsumerProfile::new("c-42");
        profile.behavior.risk_tolerance = 6.5;
        profile.behavior.brand_loyalty = 7.2;

        let model = ConsumerDecisionModel::new();
        let context = DecisionContext::default();
        let first = model.simulate_decision(&profile, &two_options(), &context, 42).unwrap();

        for _ in 0..5 {
            let again = model.simulate_decision(&profile, &two_options(), &context, 42).unwrap();
            assert_eq!(again.final_decision.action(), first.final_decision.action());
            assert_abs_diff_eq!(again.decision_confidence, first.decision_confidence, epsilon = 1e-10);
            assert_eq!(
                serde_json::to_string(&again).unwrap(),
                serde_json::to_string(&first).unwrap()
            );
        }

        assert_eq!(first.segment, ConsumerSegment::Loyalist);
        assert!((0.0..=1.0).contains(&first.decision_confidence));
        assert!((0.0..=1.0).contains(&first.cognitive_load));
    }

    #[test]
    fn test_segment_classification() {
        let mut p = ConsumerProfile::new("x");
        p.behavior.brand_loyalty = 8.0;
        assert_eq!(ConsumerSegment::classify(&p), ConsumerSegment::Loyalist);

        p.behavior.brand_loyalty = 3.0;
        p.behavior.risk_tolerance = 8.0;
        p.preferences.decision_style = DecisionStyle::Intuitive;
        assert_eq!(ConsumerSegment::classify(&p), ConsumerSegment::Impulsive);

        p.preferences.decision_style = DecisionStyle::Analytical;
        assert_eq!(ConsumerSegment::classify(&p), ConsumerSegment::RationalOptimizer);

        p.preferences.decision_style = DecisionStyle::Habitual;
        assert_eq!(ConsumerSegment::classify(&p), ConsumerSegment::Satisficer);
    }

    #[test]
    fn test_no_options_yields_no_purchase() {
        let model = ConsumerDecisionModel::new();
        let record = model
            .simulate_decision(&eager_profile("c"), &[], &eager_context(), 7)
            .unwrap();

        match &record.final_decision {
            FinalDecision::NoPurchase { reason } => assert!(reason.contains("no options")),
            other => panic!("expected no_purchase, got {:?}", other),
        }
        assert!(record.stages.evaluation.is_none());
    }

    #[test]
    fn test_low_recognition_yields_no_action() {
        let mut profile = ConsumerProfile::new("content");
        profile.preferences.current_satisfaction = 1.0;
        profile.behavior.problem_sensitivity = 0.0;
        let context = DecisionContext {
            information_exposure: 0.0,
            social_influence: 0.0,
        };

        let record = ConsumerDecisionModel::new()
            .simulate_decision(&profile, &two_options(), &context, 11)
            .unwrap();

        assert_eq!(record.final_decision.action(), DecisionAction::NoAction);
        assert!(!record.stages.problem_recognition.triggered);
        assert!(record.stages.information_search.is_none());
        assert!(record.stages.post_purchase.is_none());
        assert!(record.biases_applied.is_empty());
    }

    #[test]
    fn test_full_funnel_runs_all_stages() {
        let record = ConsumerDecisionModel::new()
            .simulate_decision(&eager_profile("eager"), &two_options(), &eager_context(), 3)
            .unwrap();

        assert!(record.stages.problem_recognition.triggered);
        assert!(record.stages.information_search.is_some());
        assert!(record.stages.evaluation.is_some());
        assert!(record.stages.purchase_decision.is_some());
        assert!(record.stages.post_purchase.is_some());
        assert!(record.biases_applied.contains(&CognitiveBias::SocialProof));
    }

    #[test]
    fn test_loss_aversion_on_pricier_option() {
        // Expensive option listed (and ranked) first is the anchor; the
        // cheap one never exceeds the reference price.
        let mut expensive = ProductOption::new("expensive", 200.0, 0.9);
        expensive.brand_recognition = 0.9;
        let cheap = ProductOption::new("cheap", 100.0, 0.6);

        let mut profile = eager_profile("la");
        profile.behavior.attention_span = 10.0;
        let record = ConsumerDecisionModel::new()
            .simulate_decision(&profile, &[expensive.clone(), cheap.clone()], &eager_context(), 5)
            .unwrap();
        assert!(!record.biases_applied.contains(&CognitiveBias::LossAversion));

        // Cheap anchor: the expensive option is now a loss relative to it
        let mut cheap_first = cheap;
        cheap_first.brand_recognition = 0.95;
        expensive.brand_recognition = 0.1;
        let record = ConsumerDecisionModel::new()
            .simulate_decision(&profile, &[cheap_first, expensive], &eager_context(), 5)
            .unwrap();
        assert!(record.biases_applied.contains(&CognitiveBias::LossAversion));
    }

    #[test]
    fn test_availability_ranking_orders_consideration() {
        let mut low = ProductOption::new("low", 80.0, 0.8);
        low.brand_recognition = 0.1;
        low.social_proof = 0.1;
        low.advertising_intensity = 0.1;
        let mut high = ProductOption::new("high", 80.0, 0.8);
        high.brand_recognition = 0.9;

        let mut profile = eager_profile("rank");
        profile.behavior.attention_span = 0.0;
        let record = ConsumerDecisionModel::new()
            .simulate_decision(&profile, &[low, high], &eager_context(), 9)
            .unwrap();

        let search = record.stages.information_search.unwrap();
        assert_eq!(search.max_considered, 1);
        assert_eq!(search.considered[0].option_id, "high");
        assert_eq!(search.excluded, vec!["low".to_string()]);
        assert!(record.biases_applied.contains(&CognitiveBias::Availability));
    }

    #[test]
    fn test_segment_overrides_do_not_leak_between_calls() {
        let model = ConsumerDecisionModel::new();
        let mut analytical = eager_profile("a");
        analytical.behavior.brand_loyalty = 2.0;

        let mut impulsive = eager_profile("i");
        impulsive.behavior.risk_tolerance = 9.0;
        impulsive.behavior.brand_loyalty = 2.0;
        impulsive.preferences.decision_style = DecisionStyle::Social;

        let fresh = ConsumerDecisionModel::new()
            .simulate_decision(&analytical, &two_options(), &eager_context(), 21)
            .unwrap();
        model.simulate_decision(&impulsive, &two_options(), &eager_context(), 21).unwrap();
        let after = model
            .simulate_decision(&analytical, &two_options(), &eager_context(), 21)
            .unwrap();

        assert_eq!(fresh, after);
        assert_eq!(model.base_parameters(), &DecisionParameters::default());
    }

    /// Habitual, mid-loyalty eager buyer: classified as a satisficer, which
    /// keeps the base status-quo bias and noise scale.
    fn habitual_profile(id: &str) -> ConsumerProfile {
        let mut p = eager_profile(id);
        p.preferences.decision_style = DecisionStyle::Habitual;
        p
    }

    fn noiseless_model(status_quo_bias: f64) -> ConsumerDecisionModel {
        ConsumerDecisionModel::with_parameters(DecisionParameters {
            status_quo_bias,
            noise_scale: 0.0,
            ..DecisionParameters::default()
        })
    }

    #[test]
    fn test_status_quo_keeps_first_considered_option() {
        // Equal availability keeps the caller's order, so the incumbent is first
        let mut incumbent = ProductOption::new("incumbent", 90.0, 0.8);
        incumbent.brand_reputation = 0.8;
        incumbent.convenience = 0.8;
        let mut challenger = ProductOption::new("challenger", 95.0, 1.0);
        challenger.brand_reputation = 1.0;
        challenger.convenience = 1.0;

        let profile = habitual_profile("sq");
        assert_eq!(ConsumerSegment::classify(&profile), ConsumerSegment::Satisficer);

        let record = noiseless_model(1.0)
            .simulate_decision(&profile, &[incumbent.clone(), challenger.clone()], &eager_context(), 8)
            .unwrap();

        let decision = record.stages.purchase_decision.as_ref().unwrap();
        assert_eq!(decision.best_position, 1);
        assert!(decision.status_quo_override);
        assert_eq!(decision.chosen_position, Some(0));
        assert!(record.biases_applied.contains(&CognitiveBias::StatusQuo));
        assert_eq!(
            record.final_decision,
            FinalDecision::Purchase {
                option_id: "incumbent".to_string(),
                price: 90.0,
            }
        );

        // Without the bias the better option wins
        let record = noiseless_model(0.0)
            .simulate_decision(&profile, &[incumbent, challenger], &eager_context(), 8)
            .unwrap();
        assert!(!record.stages.purchase_decision.unwrap().status_quo_override);
        assert!(!record.biases_applied.contains(&CognitiveBias::StatusQuo));
        assert_eq!(record.final_decision.action(), DecisionAction::Purchase);
        match record.final_decision {
            FinalDecision::Purchase { option_id, .. } => assert_eq!(option_id, "challenger"),
            other => panic!("expected purchase, got {:?}", other),
        }
    }

    #[test]
    fn test_near_threshold_option_delays_purchase() {
        let mut mediocre = ProductOption::new("mediocre", 60.0, 0.25);
        mediocre.brand_reputation = 0.25;
        mediocre.convenience = 0.25;
        mediocre.social_proof = 0.0;

        let record = noiseless_model(0.3)
            .simulate_decision(&habitual_profile("delay"), &[mediocre], &eager_context(), 4)
            .unwrap();

        let decision = record.stages.purchase_decision.as_ref().unwrap();
        let threshold = record.stages.evaluation.as_ref().unwrap().satisficing_threshold;
        assert!(decision.best_score < threshold);
        assert!(decision.best_score >= DELAY_FRACTION * threshold);
        assert_eq!(decision.chosen_position, None);
        assert_eq!(record.final_decision.action(), DecisionAction::DelayPurchase);

        let post = record.stages.post_purchase.unwrap();
        assert_eq!(post.recommendation_likelihood, 0.0);
        assert_eq!(post.repurchase_intent, 0.0);
    }

    #[test]
    fn test_invalid_trait_is_model_error() {
        let mut profile = ConsumerProfile::new("bad");
        profile.behavior.risk_tolerance = 11.0;

        let result = ConsumerDecisionModel::new().simulate_decision(
            &profile,
            &two_options(),
            &DecisionContext::default(),
            1,
        );
        assert!(matches!(result, Err(ModelError::InvalidInput { .. })));
    }

    #[test]
    fn test_final_decision_serializes_action_tag() {
        let decision = FinalDecision::DelayPurchase {
            reason: "wait".to_string(),
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["action"], "delay_purchase");
    }

    #[test]
    fn test_population_summary_counts() {
        let profiles: Vec<ConsumerProfile> = (0..20)
            .map(|i| {
                let mut p = eager_profile(&format!("c{}", i));
                p.behavior.brand_loyalty = (i % 10) as f64;
                p.preferences.decision_style = match i % 4 {
                    0 => DecisionStyle::Analytical,
                    1 => DecisionStyle::Intuitive,
                    2 => DecisionStyle::Social,
                    _ => DecisionStyle::Habitual,
                };
                p
            })
            .collect();

        let summary = ConsumerDecisionModel::new()
            .simulate_population(&profiles, &two_options(), &eager_context(), 100, &DefaultBiasAnalyzer::default())
            .unwrap();

        assert_eq!(summary.consumers, 20);
        assert_eq!(summary.action_counts.values().sum::<usize>(), 20);
        assert_eq!(summary.segment_distribution.values().sum::<usize>(), 20);
        assert!((0.0..=1.0).contains(&summary.purchase_rate));
        if !summary.option_share.is_empty() {
            assert_abs_diff_eq!(summary.option_share.values().sum::<f64>(), 1.0, epsilon = 1e-9);
        }
        assert!(summary.bias_analysis.corrected_purchase_rate <= summary.purchase_rate + 1e-12);
    }

    #[test]
    fn test_population_prefix_stable() {
        let profiles: Vec<ConsumerProfile> = (0..6).map(|i| eager_profile(&format!("p{}", i))).collect();
        let model = ConsumerDecisionModel::new();
        let analyzer = DefaultBiasAnalyzer::default();

        let small = model
            .simulate_population(&profiles[..3], &two_options(), &eager_context(), 55, &analyzer)
            .unwrap();
        let large = model
            .simulate_population(&profiles, &two_options(), &eager_context(), 55, &analyzer)
            .unwrap();

        assert_eq!(small.records[..], large.records[..3]);
    }

    proptest! {
        #[test]
        fn prop_attention_span_monotonic(
            a in 0.0f64..10.0,
            b in 0.0f64..10.0,
            seed in 1u32..10_000,
            n in 1usize..8,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let options: Vec<ProductOption> = (0..n)
                .map(|i| {
                    let mut o = ProductOption::new(format!("o{}", i), 20.0 + 10.0 * i as f64, 0.5);
                    o.brand_recognition = (i as f64 * 0.37) % 1.0;
                    o
                })
                .collect();

            let model = ConsumerDecisionModel::new();
            let considered = |span: f64| {
                let mut p = eager_profile("m");
                p.behavior.attention_span = span;
                model
                    .simulate_decision(&p, &options, &eager_context(), seed)
                    .unwrap()
                    .stages
                    .information_search
                    .map(|s| s.considered.len())
                    .unwrap_or(0)
            };

            prop_assert!(considered(lo) <= considered(hi));
        }
    }
}
