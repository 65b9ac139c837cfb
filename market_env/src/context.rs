//! Core environment context trait for simulation runs.

use crate::error::EnvError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The central interface for environment interaction.
///
/// This trait abstracts the clock so that the engine can run in both
/// production (real time) and test (virtual time) environments.
///
/// # Implementations
///
/// - **Production**: `SystemContext` - wraps `Instant` / `SystemTime`
/// - **Simulation**: `market_sim::SimContext` - a manually advanced clock
///
/// # Determinism
///
/// Model randomness never comes from here; it is seeded per call from the
/// resolved seed. The context only controls *time*.
pub trait MarketContext: Send + Sync + 'static {
    /// Returns the monotonic time since context creation.
    ///
    /// Used for run duration measurements.
    fn now(&self) -> Duration;
    
    /// Returns the wall-clock time.
    ///
    /// Used as the timestamp component of generated seeds.
    fn system_time(&self) -> SystemTime;
    
    /// Returns the wall-clock time as nanoseconds since the Unix epoch.
    fn unix_nanos(&self) -> Result<u64, EnvError> {
        let since_epoch = self
            .system_time()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| EnvError::clock(format!("system time before Unix epoch: {}", e)))?;
        
        // Saturate instead of wrapping: u64 nanoseconds cover ~584 years.
        Ok(u64::try_from(since_epoch.as_nanos()).unwrap_or(u64::MAX))
    }
    
    /// Returns the wall-clock time as milliseconds since the Unix epoch.
    fn unix_millis(&self) -> Result<u64, EnvError> {
        Ok(self.unix_nanos()? / 1_000_000)
    }
}
