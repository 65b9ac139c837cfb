//! Market Simulation Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" seam that lets the simulation engine run
//! against either the **real** wall clock or a **virtual** clock.
//!
//! # Core Concept
//!
//! The behavioral models never read the clock themselves. The only places
//! where time leaks into a run are:
//! - Seed derivation (`SeedManager::generate_seed` hashes a timestamp)
//! - Execution metadata (wall-clock duration of a run)
//!
//! Both go through [`MarketContext`], so a test can pin time and get a fully
//! reproducible seed history.
//!
//! # Example
//!
//! ```ignore
//! use market_env::{MarketContext, SystemContext};
//!
//! fn stamp<Ctx: MarketContext>(ctx: &Ctx) -> u64 {
//!     ctx.unix_nanos().unwrap_or(0)
//! }
//! ```

mod context;
mod types;
mod error;
mod system_impl;

pub use context::MarketContext;
pub use types::RunId;
pub use error::EnvError;
pub use system_impl::SystemContext;
