//! Market Core - Seeded Behavioral Models for Market Simulation
//!
//! This library holds everything a single scenario run needs below the
//! orchestration layer:
//! 1. **Seed Manager**: unique, quality-checked 32-bit seeds per run
//! 2. **Realism Bounds**: plausibility ranges for economic, market and statistical inputs
//! 3. **Behavioral Models**: consumer decisions, channel dynamics, competitor
//!    reactions and social diffusion
//!
//! Every model call takes a seed and owns its generator, so the same
//! `(input, seed)` always produces byte-identical output.

pub mod error;
pub mod sampling;
pub mod seed;
pub mod config;
pub mod bounds;
pub mod consumer;
pub mod bias;
pub mod channel;
pub mod competitor;
pub mod social;

// Re-export key types for convenience
pub use error::{ConfigError, ModelError, SeedError};
pub use seed::{is_valid_seed, validate_external_seed, validate_seed, Seed, SeedManager, SeedRecord};
pub use config::{MarketConditions, MarketSignals, ModelKind, ScenarioConfig, SimulationParameters};
pub use bounds::{RealismBoundsPolicy, RealismReport, RealismViolation};
pub use consumer::{ConsumerDecisionModel, ConsumerProfile, DecisionProcessRecord, FinalDecision, PopulationSummary};
pub use bias::{BiasAnalysis, BiasAnalyzer, DefaultBiasAnalyzer};
pub use channel::{ChannelAllocation, ChannelDynamicsModel, ChannelKind, ChannelSimulation};
pub use competitor::{CompetitorReactionModel, CompetitorSimulation};
pub use social::{SocialNetwork, SocialProofModel, SocialSimulation};
