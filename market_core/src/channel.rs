//! Channel Dynamics Model
//!
//! Turns per-channel investment into traffic, conversions and cost over a
//! number of discrete periods. Each channel carries mutable saturation,
//! momentum and virality potential; pairs of channels that are both invested
//! in heavily enough amplify each other's traffic.
//!
//! All randomness comes from one generator per call, drawn in a fixed order
//! (periods outer, channels in [`ChannelKind`] order inner).

use crate::config::MarketSignals;
use crate::error::ModelError;
use crate::sampling::{chance, exponential, gaussian, model_rng};
use crate::seed::Seed;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::str::FromStr;
use tracing::{debug, info};

const MODEL: &str = "channel_dynamics";

/// Virality only fires above this potential.
const VIRALITY_FLOOR: f64 = 0.3;

/// Momentum is clamped to this range after every update.
const MOMENTUM_RANGE: (f64, f64) = (-0.5, 1.0);

// =============================================================================
// CHANNELS
// =============================================================================

/// Marketing channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    OrganicSearch,
    PaidSocial,
    Email,
    Direct,
}

impl ChannelKind {
    pub fn all() -> [ChannelKind; 4] {
        [
            ChannelKind::OrganicSearch,
            ChannelKind::PaidSocial,
            ChannelKind::Email,
            ChannelKind::Direct,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChannelKind::OrganicSearch => "organic_search",
            ChannelKind::PaidSocial => "paid_social",
            ChannelKind::Email => "email",
            ChannelKind::Direct => "direct",
        }
    }

    /// Returns the static parameters of the channel.
    pub fn parameters(&self) -> ChannelParameters {
        match self {
            ChannelKind::OrganicSearch => ChannelParameters {
                baseline_traffic: 1000.0,
                conversion_rate: 0.025,
                acquisition_cost: 45.0,
                base_virality: 0.10,
                persistence: 0.85,
                seasonal_sensitivity: 0.10,
                saturation_threshold: 0.80,
                saturation_rate: 0.05,
            },
            ChannelKind::PaidSocial => ChannelParameters {
                baseline_traffic: 1500.0,
                conversion_rate: 0.015,
                acquisition_cost: 65.0,
                base_virality: 0.40,
                persistence: 0.60,
                seasonal_sensitivity: 0.30,
                saturation_threshold: 0.70,
                saturation_rate: 0.08,
            },
            ChannelKind::Email => ChannelParameters {
                baseline_traffic: 500.0,
                conversion_rate: 0.045,
                acquisition_cost: 20.0,
                base_virality: 0.05,
                persistence: 0.90,
                seasonal_sensitivity: 0.15,
                saturation_threshold: 0.60,
                saturation_rate: 0.06,
            },
            ChannelKind::Direct => ChannelParameters {
                baseline_traffic: 300.0,
                conversion_rate: 0.060,
                acquisition_cost: 15.0,
                base_virality: 0.02,
                persistence: 0.95,
                seasonal_sensitivity: 0.05,
                saturation_threshold: 0.95,
                saturation_rate: 0.02,
            },
        }
    }

    /// Conversions per $1000 at baseline, on the same scale as
    /// [`ChannelPerformance::efficiency`].
    pub fn baseline_efficiency(&self) -> f64 {
        1000.0 / self.parameters().acquisition_cost
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ChannelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seo" | "organic_search" | "organic" => Ok(ChannelKind::OrganicSearch),
            "social" | "paid_social" => Ok(ChannelKind::PaidSocial),
            "email" => Ok(ChannelKind::Email),
            "direct" => Ok(ChannelKind::Direct),
            other => Err(ModelError::invalid(MODEL, format!("unknown channel '{}'", other))),
        }
    }
}

/// Static channel parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelParameters {
    /// Visitors per period at investment 1.0
    pub baseline_traffic: f64,
    pub conversion_rate: f64,

    /// Cost per acquired customer at baseline
    pub acquisition_cost: f64,
    pub base_virality: f64,

    /// Fraction of momentum carried into the next period
    pub persistence: f64,
    pub seasonal_sensitivity: f64,

    /// Saturation never exceeds this
    pub saturation_threshold: f64,

    /// Per-unit-investment speed at which saturation approaches its threshold
    pub saturation_rate: f64,
}

/// Mutable per-run state of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelState {
    pub kind: ChannelKind,
    pub params: ChannelParameters,
    pub saturation: f64,
    pub momentum: f64,
    pub virality_potential: f64,
}

impl ChannelState {
    pub fn new(kind: ChannelKind) -> Self {
        let params = kind.parameters();
        Self {
            kind,
            virality_potential: params.base_virality,
            params,
            saturation: 0.0,
            momentum: 0.0,
        }
    }

    /// Realized traffic over the baseline × investment expectation.
    fn traffic_ratio(&self, investment: f64, traffic: f64) -> f64 {
        let expected = self.params.baseline_traffic * investment;
        if expected > 0.0 {
            traffic / expected
        } else {
            1.0
        }
    }

    fn advance(&mut self, investment: f64, traffic_ratio: f64, viral_event: bool) {
        let step = (self.params.saturation_rate * investment).min(1.0);
        self.saturation += (self.params.saturation_threshold - self.saturation) * step;
        self.saturation = self.saturation.clamp(0.0, self.params.saturation_threshold);

        self.momentum = (self.momentum * self.params.persistence + 0.1 * (traffic_ratio - 1.0))
            .clamp(MOMENTUM_RANGE.0, MOMENTUM_RANGE.1);

        self.virality_potential = if viral_event {
            (self.virality_potential * 1.2).min(1.0)
        } else {
            self.virality_potential * 0.95
        };
    }
}

/// Two channels that amplify each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSynergy {
    pub a: ChannelKind,
    pub b: ChannelKind,
    pub multiplier: f64,

    /// Combined momentum-weighted investment needed to trigger
    pub threshold: f64,
}

pub const SYNERGIES: [ChannelSynergy; 4] = [
    ChannelSynergy {
        a: ChannelKind::OrganicSearch,
        b: ChannelKind::PaidSocial,
        multiplier: 1.15,
        threshold: 2.5,
    },
    ChannelSynergy {
        a: ChannelKind::PaidSocial,
        b: ChannelKind::Email,
        multiplier: 1.20,
        threshold: 2.5,
    },
    ChannelSynergy {
        a: ChannelKind::OrganicSearch,
        b: ChannelKind::Direct,
        multiplier: 1.10,
        threshold: 2.0,
    },
    ChannelSynergy {
        a: ChannelKind::Email,
        b: ChannelKind::Direct,
        multiplier: 1.10,
        threshold: 2.0,
    },
];

/// Scenario section for the channel model. Keys accept short aliases
/// (`seo`, `social`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelScenario {
    /// Investment multiplier per channel name
    pub strategies: BTreeMap<String, f64>,

    /// Optional allocation request run after the simulation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation: Option<AllocationRequest>,
}

impl ChannelScenario {
    /// Resolves channel names into kinds. Repeated aliases are summed.
    pub fn investments(&self) -> Result<BTreeMap<ChannelKind, f64>, ModelError> {
        let mut out = BTreeMap::new();
        for (name, investment) in &self.strategies {
            let kind: ChannelKind = name.parse()?;
            *out.entry(kind).or_insert(0.0) += *investment;
        }
        Ok(out)
    }
}

/// Budget allocation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub budget: f64,
    pub target_conversions: f64,
}

// =============================================================================
// RESULTS
// =============================================================================

/// One channel in one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodMetrics {
    pub period: u32,
    pub traffic: f64,
    pub viral_traffic: f64,
    pub viral_event: bool,
    pub conversions: f64,
    pub cost: f64,
    pub synergy_multiplier: f64,

    /// State at the end of the period
    pub saturation: f64,
    pub momentum: f64,
    pub virality_potential: f64,
}

/// Aggregate per-channel performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPerformance {
    pub channel: ChannelKind,
    pub investment: f64,
    pub total_traffic: f64,
    pub total_conversions: f64,
    pub total_cost: f64,

    /// Cost per acquisition, 0 without conversions
    pub cpa: f64,

    /// Share of all conversions
    pub contribution_share: f64,

    /// Conversions per $1000
    pub efficiency: f64,
    pub viral_events: u32,
    pub periods: Vec<PeriodMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallPerformance {
    pub total_traffic: f64,
    pub total_conversions: f64,
    pub total_cost: f64,
    pub average_cpa: f64,
    pub overall_efficiency: f64,

    /// Channel with the most conversions
    pub best_channel: Option<ChannelKind>,
}

/// Full channel simulation output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSimulation {
    pub periods: u32,
    pub channels: BTreeMap<ChannelKind, ChannelPerformance>,
    pub overall_performance: OverallPerformance,
    pub synergies_triggered: u32,
}

/// Allocation for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub share: f64,
    pub budget: f64,

    /// Market-adjusted conversions per $1000
    pub efficiency: f64,
    pub expected_conversions: f64,
}

/// Recommended budget split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAllocation {
    pub budget: f64,
    pub target_conversions: f64,
    pub allocations: BTreeMap<ChannelKind, AllocationEntry>,
    pub expected_conversions: f64,
    pub confidence: f64,

    /// True if efficiencies came from a prior simulation
    pub from_history: bool,
}

// =============================================================================
// MODEL
// =============================================================================

/// The channel dynamics model. Stateless; state lives in each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelDynamicsModel;

impl ChannelDynamicsModel {
    pub fn new() -> Self {
        Self
    }

    /// Simulates the given investments over `periods` periods.
    pub fn simulate(
        &self,
        strategies: &BTreeMap<ChannelKind, f64>,
        periods: u32,
        signals: &MarketSignals,
        seed: Seed,
    ) -> Result<ChannelSimulation, ModelError> {
        for (kind, investment) in strategies {
            if !(investment.is_finite() && *investment >= 0.0) {
                return Err(ModelError::invalid(
                    MODEL,
                    format!("investment for {} must be a non-negative number, got {}", kind, investment),
                ));
            }
        }

        let mut rng = model_rng(seed);
        let competition = crate::sampling::clip01(signals.competition_intensity);

        let mut states: BTreeMap<ChannelKind, ChannelState> =
            strategies.keys().map(|k| (*k, ChannelState::new(*k))).collect();
        let mut history: BTreeMap<ChannelKind, Vec<PeriodMetrics>> =
            strategies.keys().map(|k| (*k, Vec::new())).collect();
        let mut synergies_triggered = 0;

        for t in 0..periods {
            let multipliers = synergy_multipliers(strategies, &states, &mut synergies_triggered);
            let season = (2.0 * PI * f64::from(t) / 12.0).sin();

            for (kind, investment) in strategies {
                let Some(state) = states.get_mut(kind) else {
                    continue;
                };
                let synergy = multipliers.get(kind).copied().unwrap_or(1.0);

                let mut metrics =
                    step_channel(state, *investment, season, synergy, competition, &mut rng);
                metrics.period = t;

                let traffic_ratio = state.traffic_ratio(*investment, metrics.traffic);
                state.advance(*investment, traffic_ratio, metrics.viral_event);
                metrics.saturation = state.saturation;
                metrics.momentum = state.momentum;
                metrics.virality_potential = state.virality_potential;

                if let Some(h) = history.get_mut(kind) {
                    h.push(metrics);
                }
            }
        }

        let simulation = aggregate(strategies, periods, history, synergies_triggered);
        info!(
            "Channel simulation: {} channels, {} periods, {:.1} conversions",
            simulation.channels.len(),
            periods,
            simulation.overall_performance.total_conversions
        );
        Ok(simulation)
    }

    /// Simulates a scenario section.
    pub fn simulate_scenario(
        &self,
        scenario: &ChannelScenario,
        periods: u32,
        signals: &MarketSignals,
        seed: Seed,
    ) -> Result<ChannelSimulation, ModelError> {
        self.simulate(&scenario.investments()?, periods, signals, seed)
    }

    /// Splits a budget across channels proportionally to efficiency.
    ///
    /// Efficiencies come from `history` when it has a positive value for the
    /// channel, otherwise from the channel's baseline.
    pub fn optimize_channel_allocation(
        &self,
        budget: f64,
        target_conversions: f64,
        signals: &MarketSignals,
        history: Option<&ChannelSimulation>,
    ) -> Result<ChannelAllocation, ModelError> {
        if !(budget.is_finite() && budget >= 0.0) {
            return Err(ModelError::invalid(MODEL, format!("budget must be a non-negative number, got {}", budget)));
        }
        if !(target_conversions.is_finite() && target_conversions >= 0.0) {
            return Err(ModelError::invalid(
                MODEL,
                format!("target conversions must be a non-negative number, got {}", target_conversions),
            ));
        }

        let competition = crate::sampling::clip01(signals.competition_intensity);
        let mut from_history = false;

        let efficiencies: BTreeMap<ChannelKind, f64> = ChannelKind::all()
            .into_iter()
            .map(|kind| {
                let observed = history
                    .and_then(|h| h.channels.get(&kind))
                    .map(|p| p.efficiency)
                    .filter(|e| *e > 0.0);
                if observed.is_some() {
                    from_history = true;
                }
                let base = observed.unwrap_or_else(|| kind.baseline_efficiency());
                (kind, base * market_multiplier(kind, competition, signals.gdp_growth))
            })
            .collect();

        let total_efficiency: f64 = efficiencies.values().sum();
        let allocations: BTreeMap<ChannelKind, AllocationEntry> = efficiencies
            .into_iter()
            .map(|(kind, efficiency)| {
                let share = if total_efficiency > 0.0 {
                    efficiency / total_efficiency
                } else {
                    0.25
                };
                let channel_budget = budget * share;
                (
                    kind,
                    AllocationEntry {
                        share,
                        budget: channel_budget,
                        efficiency,
                        expected_conversions: channel_budget * efficiency / 1000.0,
                    },
                )
            })
            .collect();

        let expected_conversions: f64 = allocations.values().map(|a| a.expected_conversions).sum();
        let attainment = if target_conversions > 0.0 {
            (expected_conversions / target_conversions).min(1.0)
        } else {
            1.0
        };

        debug!(
            "Allocated {:.0} across {} channels, expecting {:.1} conversions",
            budget,
            allocations.len(),
            expected_conversions
        );

        Ok(ChannelAllocation {
            budget,
            target_conversions,
            allocations,
            expected_conversions,
            confidence: (0.5 + 0.4 * attainment).min(0.9),
            from_history,
        })
    }
}

/// Competition depresses paid social; contraction favours owned channels.
fn market_multiplier(kind: ChannelKind, competition: f64, gdp_growth: f64) -> f64 {
    match kind {
        ChannelKind::PaidSocial => 1.0 - 0.3 * competition,
        ChannelKind::Email | ChannelKind::Direct if gdp_growth < 0.0 => 1.1,
        _ => 1.0,
    }
}

fn synergy_multipliers(
    strategies: &BTreeMap<ChannelKind, f64>,
    states: &BTreeMap<ChannelKind, ChannelState>,
    triggered: &mut u32,
) -> BTreeMap<ChannelKind, f64> {
    let mut multipliers = BTreeMap::new();
    let weighted = |kind: &ChannelKind| -> Option<f64> {
        let investment = strategies.get(kind)?;
        let state = states.get(kind)?;
        Some(investment * (1.0 + state.momentum))
    };

    for synergy in SYNERGIES.iter() {
        let (Some(a), Some(b)) = (weighted(&synergy.a), weighted(&synergy.b)) else {
            continue;
        };
        if a + b > synergy.threshold {
            *triggered += 1;
            *multipliers.entry(synergy.a).or_insert(1.0) *= synergy.multiplier;
            *multipliers.entry(synergy.b).or_insert(1.0) *= synergy.multiplier;
        }
    }

    multipliers
}

fn step_channel(
    state: &ChannelState,
    investment: f64,
    season: f64,
    synergy: f64,
    competition: f64,
    rng: &mut ChaCha8Rng,
) -> PeriodMetrics {
    let p = &state.params;

    let noise = gaussian(rng, 1.0, 0.1).max(0.5);
    let mut traffic = p.baseline_traffic
        * investment
        * (1.0 + state.momentum).max(0.1)
        * (1.0 - state.saturation)
        * (1.0 + p.seasonal_sensitivity * season)
        * noise
        * synergy;

    let mut viral_event = false;
    let mut viral_traffic = 0.0;
    if state.virality_potential > VIRALITY_FLOOR && chance(rng, state.virality_potential * 0.5) {
        viral_event = true;
        viral_traffic = traffic * exponential(rng, 2.0) * state.virality_potential;
        traffic += viral_traffic;
    }

    let conversions = (traffic
        * p.conversion_rate
        * (1.0 - 0.3 * state.saturation)
        * (1.0 - 0.3 * competition)
        * gaussian(rng, 1.0, 0.05))
    .max(0.0);
    let cost = (conversions * p.acquisition_cost * gaussian(rng, 1.0, 0.05)).max(0.0);

    PeriodMetrics {
        period: 0,
        traffic,
        viral_traffic,
        viral_event,
        conversions,
        cost,
        synergy_multiplier: synergy,
        saturation: state.saturation,
        momentum: state.momentum,
        virality_potential: state.virality_potential,
    }
}

fn aggregate(
    strategies: &BTreeMap<ChannelKind, f64>,
    periods: u32,
    history: BTreeMap<ChannelKind, Vec<PeriodMetrics>>,
    synergies_triggered: u32,
) -> ChannelSimulation {
    let total_conversions: f64 = history.values().flatten().map(|m| m.conversions).sum();
    let total_traffic: f64 = history.values().flatten().map(|m| m.traffic).sum();
    let total_cost: f64 = history.values().flatten().map(|m| m.cost).sum();

    let channels: BTreeMap<ChannelKind, ChannelPerformance> = history
        .into_iter()
        .map(|(kind, periods)| {
            let traffic: f64 = periods.iter().map(|m| m.traffic).sum();
            let conversions: f64 = periods.iter().map(|m| m.conversions).sum();
            let cost: f64 = periods.iter().map(|m| m.cost).sum();
            let viral_events = periods.iter().filter(|m| m.viral_event).count() as u32;

            let performance = ChannelPerformance {
                channel: kind,
                investment: strategies.get(&kind).copied().unwrap_or(0.0),
                total_traffic: traffic,
                total_conversions: conversions,
                total_cost: cost,
                cpa: ratio(cost, conversions),
                contribution_share: ratio(conversions, total_conversions),
                efficiency: ratio(conversions, cost) * 1000.0,
                viral_events,
                periods,
            };
            (kind, performance)
        })
        .collect();

    let best_channel = channels
        .values()
        .filter(|p| p.total_conversions > 0.0)
        .fold(None::<&ChannelPerformance>, |best, p| match best {
            Some(b) if b.total_conversions >= p.total_conversions => Some(b),
            _ => Some(p),
        })
        .map(|p| p.channel);

    ChannelSimulation {
        periods,
        channels,
        overall_performance: OverallPerformance {
            total_traffic,
            total_conversions,
            total_cost,
            average_cpa: ratio(total_cost, total_conversions),
            overall_efficiency: ratio(total_conversions, total_cost) * 1000.0,
            best_channel,
        },
        synergies_triggered,
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
