//! Production implementation of MarketContext using the system clock.

use crate::MarketContext;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Production context backed by the OS clock.
///
/// This is the "real" implementation used when the engine is embedded in a
/// service. Seeds generated through it differ between invocations.
pub struct SystemContext {
    /// Start time for monotonic duration calculations
    start: Instant,
}

impl SystemContext {
    /// Creates a new SystemContext.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
    
    /// Creates an Arc-wrapped context for sharing across runs.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for SystemContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketContext for SystemContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
    
    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_system_context_monotonic() {
        let ctx = SystemContext::new();
        let t1 = ctx.now();
        std::thread::sleep(Duration::from_millis(5));
        let t2 = ctx.now();
        
        assert!(t2 > t1);
        assert!(t2 - t1 >= Duration::from_millis(5));
    }
    
    #[test]
    fn test_system_context_unix_time() {
        let ctx = SystemContext::new();
        let nanos = ctx.unix_nanos().unwrap();
        let millis = ctx.unix_millis().unwrap();
        
        // Sanity: after 2020-01-01
        assert!(millis > 1_577_836_800_000);
        assert!(nanos / 1_000_000 >= millis - 1_000);
    }
}
