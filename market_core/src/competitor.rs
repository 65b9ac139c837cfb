//! Competitor Reaction Model
//!
//! Competitors watch the market through imperfect intelligence, decide
//! whether a detected move is worth answering, and schedule reactions that
//! land after an intelligence delay plus an implementation lead time.
//!
//! Per period, for each competitor in input order:
//!
//! 1. fatigue recovers (×0.9)
//! 2. due reactions are applied (resources re-checked, impact emitted)
//! 3. triggers are detected and gated by `should_react`
//! 4. market trends may cause a strategic shift
//! 5. remaining resources are appended to the trajectory
//!
//! Resources only ever go down.

use crate::error::ModelError;
use crate::sampling::{chance, clip01, model_rng};
use crate::seed::Seed;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

const MODEL: &str = "competitor_reaction";

/// Reactions are refused once fatigue reaches this level.
const FATIGUE_LIMIT: f64 = 0.7;

/// Per-period fatigue recovery factor.
const FATIGUE_DECAY: f64 = 0.9;

/// Share of resources a single reaction may consume.
const MAX_RESOURCE_SHARE: f64 = 0.8;

/// Strategic shifts need this fraction of initial resources left.
const SHIFT_RESOURCE_FLOOR: f64 = 0.3;

/// Fraction of remaining resources a strategic shift costs.
const SHIFT_COST_SHARE: f64 = 0.1;

// =============================================================================
// PERSONALITY & INTELLIGENCE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitorPersonality {
    Aggressive,
    Defensive,
    Innovative,
    PriceLeader,
    NichePlayer,
}

/// Behavioral traits of a personality, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompetitorTraits {
    pub reaction_speed: f64,
    pub price_sensitivity: f64,
    pub innovation_drive: f64,
    pub market_share_focus: f64,
    pub risk_tolerance: f64,
}

impl CompetitorPersonality {
    pub fn traits(&self) -> CompetitorTraits {
        let (reaction_speed, price_sensitivity, innovation_drive, market_share_focus, risk_tolerance) =
            match self {
                CompetitorPersonality::Aggressive => (0.9, 0.7, 0.5, 0.9, 0.8),
                CompetitorPersonality::Defensive => (0.5, 0.6, 0.3, 0.7, 0.3),
                CompetitorPersonality::Innovative => (0.6, 0.3, 0.9, 0.5, 0.7),
                CompetitorPersonality::PriceLeader => (0.8, 0.9, 0.2, 0.8, 0.5),
                CompetitorPersonality::NichePlayer => (0.3, 0.4, 0.6, 0.3, 0.4),
            };
        CompetitorTraits {
            reaction_speed,
            price_sensitivity,
            innovation_drive,
            market_share_focus,
            risk_tolerance,
        }
    }

    /// Only these personalities chase market trends.
    pub fn shifts_strategy(&self) -> bool {
        matches!(self, CompetitorPersonality::Aggressive | CompetitorPersonality::Innovative)
    }
}

/// Quality of a competitor's market intelligence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntelligenceLevel {
    Basic,
    #[default]
    Standard,
    Advanced,
}

impl IntelligenceLevel {
    /// Probability of detecting a real trigger.
    pub fn accuracy(&self) -> f64 {
        match self {
            IntelligenceLevel::Basic => 0.60,
            IntelligenceLevel::Standard => 0.80,
            IntelligenceLevel::Advanced => 0.95,
        }
    }

    /// Periods between a market move and its detection.
    pub fn delay(&self) -> u32 {
        match self {
            IntelligenceLevel::Basic => 3,
            IntelligenceLevel::Standard => 2,
            IntelligenceLevel::Advanced => 1,
        }
    }

    /// Probability of "detecting" a trigger that did not happen.
    pub fn false_positive_rate(&self) -> f64 {
        match self {
            IntelligenceLevel::Basic => 0.15,
            IntelligenceLevel::Standard => 0.08,
            IntelligenceLevel::Advanced => 0.03,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingStrategy {
    Premium,
    #[default]
    Competitive,
    Discount,
}

/// A competitor as supplied by the scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitorProfile {
    pub name: String,

    /// Classified from the other fields when absent
    pub personality: Option<CompetitorPersonality>,
    pub intelligence: IntelligenceLevel,
    pub market_share: f64,
    pub resources: f64,
    pub aggressiveness: f64,
    pub innovation_focus: f64,
    pub pricing_strategy: PricingStrategy,
    pub strategy_focus: String,
}

impl Default for CompetitorProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            personality: None,
            intelligence: IntelligenceLevel::default(),
            market_share: 0.15,
            resources: 1_000_000.0,
            aggressiveness: 0.5,
            innovation_focus: 0.5,
            pricing_strategy: PricingStrategy::default(),
            strategy_focus: "market_share".to_string(),
        }
    }
}

impl CompetitorProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns the given personality, or classifies one.
    pub fn resolved_personality(&self) -> CompetitorPersonality {
        if let Some(p) = self.personality {
            return p;
        }
        if self.aggressiveness > 0.7 {
            CompetitorPersonality::Aggressive
        } else if self.pricing_strategy == PricingStrategy::Discount {
            CompetitorPersonality::PriceLeader
        } else if self.innovation_focus > 0.7 {
            CompetitorPersonality::Innovative
        } else if self.market_share < 0.1 {
            CompetitorPersonality::NichePlayer
        } else {
            CompetitorPersonality::Defensive
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        if !(self.resources.is_finite() && self.resources >= 0.0) {
            return Err(ModelError::invalid(
                MODEL,
                format!("{}: resources must be a non-negative number", self.name),
            ));
        }
        if !(self.market_share.is_finite() && (0.0..=1.0).contains(&self.market_share)) {
            return Err(ModelError::invalid(
                MODEL,
                format!("{}: market share must be in [0, 1]", self.name),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// MARKET INPUTS
// =============================================================================

/// Observable market movement in one period. Periods without a state are calm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketState {
    pub period: u32,

    /// Relative change of our price (negative = cut)
    pub price_change: f64,

    /// Our market-share growth this period
    pub share_growth: f64,
    pub feature_launches: u32,

    /// Relative change of our marketing spend
    pub marketing_spend_change: f64,
    pub innovation_index: f64,
    pub our_market_share: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendKind {
    DigitalTransformation,
    Sustainability,
    AiIntegration,
}

impl TrendKind {
    /// Strategy focus a competitor adopts when shifting toward this trend.
    pub fn focus(&self) -> &'static str {
        match self {
            TrendKind::DigitalTransformation => "digital_channels",
            TrendKind::Sustainability => "sustainable_products",
            TrendKind::AiIntegration => "ai_features",
        }
    }
}

/// A market trend, evaluated once at its period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTrend {
    pub trend: TrendKind,

    /// Strength in [0, 1]
    pub strength: f64,

    #[serde(default)]
    pub period: u32,
}

/// Scenario section for the competitor model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitorScenario {
    pub competitors: Vec<CompetitorProfile>,
    pub market_states: Vec<MarketState>,
    pub trends: Vec<MarketTrend>,
}

// =============================================================================
// REACTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionType {
    PriceMatch,
    PriceCut,
    FeatureMatch,
    MarketingBoost,
    InnovationResponse,
    AcquisitionThreat,
}

/// Static description of a reaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionTemplate {
    pub compatible: &'static [CompetitorPersonality],
    pub base_cost: f64,
    pub implementation_periods: u32,
    pub base_effectiveness: f64,

    /// Market impact at full effectiveness
    pub impact: f64,

    /// Periods the impact lasts
    pub duration: u32,
}

impl ReactionType {
    pub fn all() -> [ReactionType; 6] {
        [
            ReactionType::PriceMatch,
            ReactionType::PriceCut,
            ReactionType::FeatureMatch,
            ReactionType::MarketingBoost,
            ReactionType::InnovationResponse,
            ReactionType::AcquisitionThreat,
        ]
    }

    pub fn template(&self) -> ReactionTemplate {
        use CompetitorPersonality::*;
        match self {
            ReactionType::PriceMatch => ReactionTemplate {
                compatible: &[Aggressive, Defensive, PriceLeader],
                base_cost: 50_000.0,
                implementation_periods: 0,
                base_effectiveness: 0.7,
                impact: 0.08,
                duration: 4,
            },
            ReactionType::PriceCut => ReactionTemplate {
                compatible: &[Aggressive, PriceLeader],
                base_cost: 80_000.0,
                implementation_periods: 1,
                base_effectiveness: 0.6,
                impact: 0.12,
                duration: 6,
            },
            ReactionType::FeatureMatch => ReactionTemplate {
                compatible: &[Aggressive, Defensive, Innovative],
                base_cost: 150_000.0,
                implementation_periods: 3,
                base_effectiveness: 0.55,
                impact: 0.10,
                duration: 8,
            },
            ReactionType::MarketingBoost => ReactionTemplate {
                compatible: &[Aggressive, Defensive, NichePlayer],
                base_cost: 100_000.0,
                implementation_periods: 1,
                base_effectiveness: 0.65,
                impact: 0.06,
                duration: 3,
            },
            ReactionType::InnovationResponse => ReactionTemplate {
                compatible: &[Innovative, NichePlayer],
                base_cost: 250_000.0,
                implementation_periods: 4,
                base_effectiveness: 0.5,
                impact: 0.15,
                duration: 10,
            },
            ReactionType::AcquisitionThreat => ReactionTemplate {
                compatible: &[Aggressive],
                base_cost: 500_000.0,
                implementation_periods: 2,
                base_effectiveness: 0.4,
                impact: 0.20,
                duration: 12,
            },
        }
    }

    /// Returns true if the market state actually contains this trigger.
    pub fn is_triggered(&self, state: &MarketState) -> bool {
        match self {
            ReactionType::PriceMatch => state.price_change <= -0.05,
            ReactionType::PriceCut => state.share_growth >= 0.02,
            ReactionType::FeatureMatch => state.feature_launches >= 1,
            ReactionType::MarketingBoost => state.marketing_spend_change >= 0.2,
            ReactionType::InnovationResponse => state.innovation_index >= 0.6,
            ReactionType::AcquisitionThreat => state.our_market_share >= 0.15,
        }
    }
}

/// Imperfect detection: two independent Bernoulli draws.
///
/// A real trigger is seen with the tier's accuracy; an absent one is
/// "seen" with the tier's false-positive rate.
pub fn detect(triggered: bool, level: IntelligenceLevel, rng: &mut ChaCha8Rng) -> bool {
    if triggered {
        chance(rng, level.accuracy())
    } else {
        chance(rng, level.false_positive_rate())
    }
}

/// A reaction waiting for its scheduled period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingReaction {
    pub reaction: ReactionType,
    pub detected_period: u32,
    pub scheduled_period: u32,
    pub cost: f64,
    pub false_positive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionStatus {
    Applied,
    /// Resources ran out before the scheduled period
    Cancelled,
}

/// A reaction that reached its scheduled period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub reaction: ReactionType,
    pub status: ReactionStatus,
    pub detected_period: u32,
    pub applied_period: u32,
    pub delay: u32,
    pub cost: f64,
    pub effectiveness: f64,
    pub success: bool,
    pub false_positive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketImpact {
    pub competitor: String,
    pub reaction: ReactionType,
    pub period: u32,
    pub magnitude: f64,
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicShift {
    pub trend: TrendKind,
    pub period: u32,
    pub cost: f64,
    pub previous_focus: String,
    pub new_focus: String,
}

/// Post-hoc effectiveness summary for one competitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionEffectiveness {
    /// Applied reactions
    pub total_reactions: usize,
    pub reactions_by_type: BTreeMap<ReactionType, usize>,

    /// Fraction of applied reactions with effectiveness ≥ 0.5
    pub success_rate: f64,

    /// Mean periods between detection and application
    pub average_delay: f64,
    pub total_cost: f64,
    pub total_impact: f64,

    /// Total impact per unit cost, 0 without cost
    pub resource_efficiency: f64,
    pub false_positive_reactions: usize,
    pub cancelled_reactions: usize,
}

impl ReactionEffectiveness {
    fn from_history(history: &[ReactionRecord]) -> Self {
        let applied: Vec<&ReactionRecord> = history
            .iter()
            .filter(|r| r.status == ReactionStatus::Applied)
            .collect();

        let mut reactions_by_type = BTreeMap::new();
        for r in &applied {
            *reactions_by_type.entry(r.reaction).or_insert(0) += 1;
        }

        let n = applied.len();
        let total_cost: f64 = applied.iter().map(|r| r.cost).sum();
        let total_impact: f64 = applied
            .iter()
            .map(|r| r.reaction.template().impact * r.effectiveness)
            .sum();
        let per_reaction = |sum: f64| if n == 0 { 0.0 } else { sum / n as f64 };

        Self {
            total_reactions: n,
            reactions_by_type,
            success_rate: per_reaction(applied.iter().filter(|r| r.success).count() as f64),
            average_delay: per_reaction(applied.iter().map(|r| f64::from(r.delay)).sum()),
            total_cost,
            total_impact,
            resource_efficiency: if total_cost > 0.0 { total_impact / total_cost } else { 0.0 },
            false_positive_reactions: applied.iter().filter(|r| r.false_positive).count(),
            cancelled_reactions: history.len() - n,
        }
    }
}

/// Everything that happened to one competitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorOutcome {
    pub name: String,
    pub personality: CompetitorPersonality,
    pub intelligence: IntelligenceLevel,
    pub initial_resources: f64,
    pub final_resources: f64,
    pub final_fatigue: f64,
    pub strategy_focus: String,
    pub reactions: Vec<ReactionRecord>,

    /// Reactions scheduled past the horizon, never applied
    pub pending: Vec<PendingReaction>,
    pub strategic_shifts: Vec<StrategicShift>,

    /// Remaining resources at the end of each period
    pub resource_trajectory: Vec<f64>,
    pub reaction_effectiveness: ReactionEffectiveness,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorSimulation {
    pub periods: u32,
    pub competitors: Vec<CompetitorOutcome>,
    pub market_impacts: Vec<MarketImpact>,
    pub total_market_impact: f64,
}

// =============================================================================
// SIMULATION STATE
// =============================================================================

struct CompetitorState {
    name: String,
    personality: CompetitorPersonality,
    traits: CompetitorTraits,
    intelligence: IntelligenceLevel,
    market_share: f64,
    initial_resources: f64,
    resources: f64,
    fatigue: f64,
    strategy_focus: String,
    pending: Vec<PendingReaction>,
    history: Vec<ReactionRecord>,
    shifts: Vec<StrategicShift>,
    applied_trends: BTreeSet<TrendKind>,
    resource_trajectory: Vec<f64>,
}

impl CompetitorState {
    fn new(profile: &CompetitorProfile) -> Self {
        let personality = profile.resolved_personality();
        Self {
            name: profile.name.clone(),
            personality,
            traits: personality.traits(),
            intelligence: profile.intelligence,
            market_share: profile.market_share,
            initial_resources: profile.resources,
            resources: profile.resources,
            fatigue: 0.0,
            strategy_focus: profile.strategy_focus.clone(),
            pending: Vec::new(),
            history: Vec::new(),
            shifts: Vec::new(),
            applied_trends: BTreeSet::new(),
            resource_trajectory: Vec::new(),
        }
    }

    fn reaction_cost(&self, reaction: ReactionType) -> f64 {
        reaction.template().base_cost * (0.5 + self.market_share)
    }

    /// Gate for answering a detected trigger. Consumes one draw only when
    /// the deterministic checks pass.
    fn should_react(&self, cost: f64, rng: &mut ChaCha8Rng) -> bool {
        if cost > MAX_RESOURCE_SHARE * self.resources || self.fatigue >= FATIGUE_LIMIT {
            return false;
        }
        if cost / self.resources > self.traits.risk_tolerance {
            return false;
        }
        rng.gen::<f64>() < self.traits.reaction_speed
    }

    fn apply_due(&mut self, period: u32, rng: &mut ChaCha8Rng, impacts: &mut Vec<MarketImpact>) {
        let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.scheduled_period <= period);
        self.pending = later;

        for p in due {
            let delay = period - p.detected_period;
            if p.cost > self.resources {
                debug!("{}: {:?} cancelled, insufficient resources", self.name, p.reaction);
                self.history.push(ReactionRecord {
                    reaction: p.reaction,
                    status: ReactionStatus::Cancelled,
                    detected_period: p.detected_period,
                    applied_period: period,
                    delay,
                    cost: 0.0,
                    effectiveness: 0.0,
                    success: false,
                    false_positive: p.false_positive,
                });
                continue;
            }

            let template = p.reaction.template();
            self.resources -= p.cost;
            let effectiveness = clip01(template.base_effectiveness * rng.gen_range(0.8..1.2));
            self.fatigue += 0.15 * effectiveness;

            impacts.push(MarketImpact {
                competitor: self.name.clone(),
                reaction: p.reaction,
                period,
                magnitude: template.impact * effectiveness,
                duration: template.duration,
            });
            self.history.push(ReactionRecord {
                reaction: p.reaction,
                status: ReactionStatus::Applied,
                detected_period: p.detected_period,
                applied_period: period,
                delay,
                cost: p.cost,
                effectiveness,
                success: effectiveness >= 0.5,
                false_positive: p.false_positive,
            });
        }
    }

    fn detect_and_schedule(&mut self, period: u32, market: &MarketState, rng: &mut ChaCha8Rng) {
        for reaction in ReactionType::all() {
            let template = reaction.template();
            if !template.compatible.contains(&self.personality) {
                continue;
            }

            let triggered = reaction.is_triggered(market);
            if !detect(triggered, self.intelligence, rng) {
                continue;
            }
            if self.pending.iter().any(|p| p.reaction == reaction) {
                continue;
            }

            let cost = self.reaction_cost(reaction);
            if !self.should_react(cost, rng) {
                continue;
            }

            let scheduled_period = period + self.intelligence.delay() + template.implementation_periods;
            debug!(
                "{}: scheduling {:?} for period {} (false positive: {})",
                self.name, reaction, scheduled_period, !triggered
            );
            self.pending.push(PendingReaction {
                reaction,
                detected_period: period,
                scheduled_period,
                cost,
                false_positive: !triggered,
            });
        }
    }

    fn consider_trends(&mut self, period: u32, trends: &[MarketTrend], rng: &mut ChaCha8Rng) {
        if !self.personality.shifts_strategy() {
            return;
        }

        for trend in trends.iter().filter(|t| t.period == period) {
            if self.applied_trends.contains(&trend.trend) {
                continue;
            }
            if self.resources < SHIFT_RESOURCE_FLOOR * self.initial_resources || self.resources <= 0.0 {
                continue;
            }
            if !chance(rng, clip01(trend.strength) * self.traits.innovation_drive) {
                continue;
            }

            let cost = SHIFT_COST_SHARE * self.resources;
            self.resources -= cost;
            self.applied_trends.insert(trend.trend);

            let new_focus = trend.trend.focus().to_string();
            info!("{} shifts strategy toward {}", self.name, new_focus);
            self.shifts.push(StrategicShift {
                trend: trend.trend,
                period,
                cost,
                previous_focus: std::mem::replace(&mut self.strategy_focus, new_focus.clone()),
                new_focus,
            });
        }
    }

    fn into_outcome(self) -> CompetitorOutcome {
        let reaction_effectiveness = ReactionEffectiveness::from_history(&self.history);
        CompetitorOutcome {
            name: self.name,
            personality: self.personality,
            intelligence: self.intelligence,
            initial_resources: self.initial_resources,
            final_resources: self.resources,
            final_fatigue: self.fatigue,
            strategy_focus: self.strategy_focus,
            reactions: self.history,
            pending: self.pending,
            strategic_shifts: self.shifts,
            resource_trajectory: self.resource_trajectory,
            reaction_effectiveness,
        }
    }
}

// =============================================================================
// MODEL
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct CompetitorReactionModel;

impl CompetitorReactionModel {
    pub fn new() -> Self {
        Self
    }

    /// Simulates all competitors over `periods` periods.
    pub fn simulate(
        &self,
        scenario: &CompetitorScenario,
        periods: u32,
        seed: Seed,
    ) -> Result<CompetitorSimulation, ModelError> {
        for profile in &scenario.competitors {
            profile.validate()?;
        }

        let mut rng = model_rng(seed);
        let mut states: Vec<CompetitorState> =
            scenario.competitors.iter().map(CompetitorState::new).collect();
        let mut impacts = Vec::new();
        let calm = MarketState::default();

        for t in 0..periods {
            let market = scenario
                .market_states
                .iter()
                .find(|s| s.period == t)
                .unwrap_or(&calm);

            for state in states.iter_mut() {
                state.fatigue *= FATIGUE_DECAY;
                state.apply_due(t, &mut rng, &mut impacts);
                state.detect_and_schedule(t, market, &mut rng);
                state.consider_trends(t, &scenario.trends, &mut rng);
                state.resource_trajectory.push(state.resources);
            }
        }

        let competitors: Vec<CompetitorOutcome> =
            states.into_iter().map(CompetitorState::into_outcome).collect();
        let total_market_impact = impacts.iter().map(|i| i.magnitude).sum();

        info!(
            "Competitor simulation: {} competitors, {} reactions applied",
            competitors.len(),
            impacts.len()
        );

        Ok(CompetitorSimulation {
            periods,
            competitors,
            market_impacts: impacts,
            total_market_impact,
        })
    }
}
