//! Market Simulation Orchestration
//!
//! This crate runs scenario configurations through the behavioral models in
//! `market_core` and returns one unified, reproducible result.
//!
//! # Core Principle: One Seed Per Run
//!
//! All sources of non-determinism are pinned:
//! - **Time**: [`SimContext`] is a virtual clock; nothing reads the wall clock
//! - **Randomness**: every model derives its generator from the run seed
//! - **Ordering**: every keyed output is a `BTreeMap`
//!
//! Running the same configuration with the same explicit seed yields a
//! byte-identical `results` document.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  SimulationOrchestrator                      │
//! │                                                              │
//! │  ScenarioConfig ──► RealismBoundsPolicy ──► SeedManager      │
//! │                                                │             │
//! │        ┌──────────────┬──────────────┬────────▼─────┐       │
//! │   ┌────▼────┐   ┌─────▼────┐   ┌─────▼─────┐  ┌─────▼────┐  │
//! │   │Consumer │   │ Channel  │   │Competitor │  │  Social  │  │
//! │   │Executor │   │ Executor │   │ Executor  │  │ Executor │  │
//! │   └────┬────┘   └─────┬────┘   └─────┬─────┘  └─────┬────┘  │
//! │        └──────────────┴──────┬───────┴──────────────┘       │
//! │                       ┌──────▼──────┐                        │
//! │                       │QualityAssessor                       │
//! │                       └──────┬──────┘                        │
//! └──────────────────────────────┼───────────────────────────────┘
//!                                ▼
//!                         SimulationResult
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use market_sim::{ScenarioId, SimContext, SimulationOrchestrator};
//! use market_env::RunId;
//!
//! let orchestrator = SimulationOrchestrator::new(SimContext::shared());
//! let result = orchestrator.run(&ScenarioId::PriceWar.config(), RunId::new())?;
//! println!("{:?}: {:.2}", result.execution_status, result.quality.overall_score);
//! ```

mod context;
pub mod executor;
pub mod orchestrator;
pub mod quality;
pub mod runner;
pub mod scenarios;

pub use context::SimContext;
pub use executor::{default_executors, ChannelOutput, ModelOutput, ScenarioExecutor};
pub use orchestrator::{ExecutionStatus, SimulationError, SimulationOrchestrator, SimulationResult};
pub use quality::{DefaultQualityAssessor, QualityAssessment, QualityAssessor, QualityWeights};
pub use runner::{BatchSummary, ScenarioOutcome, ScenarioRunner};
pub use scenarios::ScenarioId;
