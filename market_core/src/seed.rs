//! Seed Manager - unique, quality-checked seeds for scenario runs.
//!
//! A seed is derived from `(run_id, scenario_name, timestamp)` with a stable
//! 64-bit FNV-1a hash folded to 32 bits. The manager remembers every seed it
//! has issued, so two runs sharing one manager never receive the same seed.
//!
//! Externally supplied seeds are validated but never replaced: if a caller
//! claims reproducibility with a specific seed, a bad seed is an error the
//! caller must see.

use crate::error::SeedError;
use market_env::MarketContext;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// A simulation seed.
pub type Seed = u32;

/// Values rejected outright as "obviously patterned".
const SEQUENTIAL_BLACKLIST: [Seed; 9] = [
    1234,
    4321,
    12345,
    54321,
    12345678,
    87654321,
    123456789,
    987654321,
    1234567890,
];

/// Digit diversity is only judged on seeds with at least this many digits.
const MIN_DIGITS_FOR_DIVERSITY: usize = 4;

/// Seeds with this many distinct digits or fewer are rejected.
const MAX_LOW_DIVERSITY_DIGITS: usize = 2;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// One entry of the append-only seed history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRecord {
    /// The seed handed out
    pub seed: Seed,

    /// Run that received it
    pub run_id: String,

    /// Scenario that received it
    pub scenario_name: String,

    /// Wall-clock time of issue (ms since Unix epoch)
    pub timestamp_ms: u64,

    /// Hash value before the seed was bumped to avoid a collision
    pub substituted_from: Option<Seed>,

    /// True if the seed was supplied by the caller rather than generated
    pub external: bool,
}

#[derive(Debug, Default)]
struct SeedLedger {
    issued: HashSet<Seed>,
    history: Vec<SeedRecord>,
}

/// Issues and validates seeds.
///
/// Uses interior locking so a single manager can be shared (`Arc`) by every
/// run in a process; that sharing is what extends the uniqueness guarantee
/// to the whole process lifetime.
pub struct SeedManager<C: MarketContext> {
    /// Clock used for the timestamp component
    context: Arc<C>,

    /// Issued seeds and history
    ledger: Mutex<SeedLedger>,
}

impl<C: MarketContext> SeedManager<C> {
    /// Creates a new manager with an empty history.
    pub fn new(context: Arc<C>) -> Self {
        Self {
            context,
            ledger: Mutex::new(SeedLedger::default()),
        }
    }

    /// Creates an Arc-wrapped manager for sharing across runs.
    pub fn shared(context: Arc<C>) -> Arc<Self> {
        Arc::new(Self::new(context))
    }

    fn ledger(&self) -> MutexGuard<'_, SeedLedger> {
        // A panic while holding the lock cannot leave the ledger half-written
        // (every mutation is a single push/insert), so recover the guard.
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Derives a fresh seed for `(run_id, scenario_name)`.
    ///
    /// The candidate is bumped (wrapping) until it is both valid and unused.
    pub fn generate_seed(&self, run_id: &str, scenario_name: &str) -> Result<Seed, SeedError> {
        let timestamp_ns = self
            .context
            .unix_nanos()
            .map_err(|e| SeedError::Clock(e.to_string()))?;

        let material = format!("{}_{}_{}", run_id, scenario_name, timestamp_ns);
        let hashed = fold_to_seed(fnv1a_64(material.as_bytes()));

        let mut ledger = self.ledger();
        let mut candidate = hashed;
        while ledger.issued.contains(&candidate) || !is_valid_seed(candidate) {
            candidate = candidate.wrapping_add(1);
        }

        let substituted_from = if candidate != hashed {
            warn!(
                "Seed {} for run {} / {} unavailable, substituted {}",
                hashed, run_id, scenario_name, candidate
            );
            Some(hashed)
        } else {
            None
        };

        ledger.issued.insert(candidate);
        ledger.history.push(SeedRecord {
            seed: candidate,
            run_id: run_id.to_string(),
            scenario_name: scenario_name.to_string(),
            timestamp_ms: timestamp_ns / 1_000_000,
            substituted_from,
            external: false,
        });

        debug!("Issued seed {} for run {} / {}", candidate, run_id, scenario_name);
        Ok(candidate)
    }

    /// Validates a caller-supplied seed and records it in the history.
    ///
    /// Reusing the same external seed is allowed; that is how a caller
    /// reproduces a run.
    pub fn register_external_seed(
        &self,
        raw_seed: u64,
        run_id: &str,
        scenario_name: &str,
    ) -> Result<Seed, SeedError> {
        let seed = validate_external_seed(raw_seed)?;
        let timestamp_ms = self
            .context
            .unix_millis()
            .map_err(|e| SeedError::Clock(e.to_string()))?;

        let mut ledger = self.ledger();
        ledger.issued.insert(seed);
        ledger.history.push(SeedRecord {
            seed,
            run_id: run_id.to_string(),
            scenario_name: scenario_name.to_string(),
            timestamp_ms,
            substituted_from: None,
            external: true,
        });

        Ok(seed)
    }

    /// Returns all history entries for a run, in issue order.
    pub fn history_for_run(&self, run_id: &str) -> Vec<SeedRecord> {
        self.ledger()
            .history
            .iter()
            .filter(|r| r.run_id == run_id)
            .cloned()
            .collect()
    }

    /// Returns the full history, in issue order.
    pub fn history(&self) -> Vec<SeedRecord> {
        self.ledger().history.clone()
    }

    /// Returns the number of distinct seeds issued or registered.
    pub fn issued_count(&self) -> usize {
        self.ledger().issued.len()
    }

    /// Returns true if this manager has already issued `seed`.
    pub fn is_issued(&self, seed: Seed) -> bool {
        self.ledger().issued.contains(&seed)
    }
}

/// Validates a seed against the degenerate-pattern rules.
pub fn validate_seed(seed: Seed) -> Result<Seed, SeedError> {
    if seed == 0 {
        return Err(SeedError::Zero);
    }

    if SEQUENTIAL_BLACKLIST.contains(&seed) {
        return Err(SeedError::SequentialPattern(seed));
    }

    let digits = seed.to_string();
    if digits.len() >= MIN_DIGITS_FOR_DIVERSITY {
        let distinct = digits.chars().collect::<HashSet<_>>().len();
        if distinct <= MAX_LOW_DIVERSITY_DIGITS {
            return Err(SeedError::LowDiversity { seed, distinct });
        }
    }

    Ok(seed)
}

/// Validates a seed that arrived as a wider integer.
pub fn validate_external_seed(raw_seed: u64) -> Result<Seed, SeedError> {
    let seed = Seed::try_from(raw_seed).map_err(|_| SeedError::OutOfRange(raw_seed))?;
    validate_seed(seed)
}

/// Returns true if [`validate_seed`] accepts the seed.
pub fn is_valid_seed(seed: Seed) -> bool {
    validate_seed(seed).is_ok()
}

/// 64-bit FNV-1a. Stable across platforms and process restarts.
fn fnv1a_64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

fn fold_to_seed(hash: u64) -> Seed {
    ((hash >> 32) ^ (hash & 0xffff_ffff)) as Seed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    /// Clock pinned to a fixed instant.
    struct FrozenClock;

    impl MarketContext for FrozenClock {
        fn now(&self) -> Duration {
            Duration::ZERO
        }

        fn system_time(&self) -> SystemTime {
            UNIX_EPOCH + Duration::from_secs(1_704_067_200)
        }
    }

    /// Clock that reports a time before the Unix epoch.
    struct BrokenClock;

    impl MarketContext for BrokenClock {
        fn now(&self) -> Duration {
            Duration::ZERO
        }

        fn system_time(&self) -> SystemTime {
            UNIX_EPOCH - Duration::from_secs(60)
        }
    }

    fn manager() -> SeedManager<FrozenClock> {
        SeedManager::new(Arc::new(FrozenClock))
    }

    #[test]
    fn test_generate_seed_unique_for_many_calls() {
        let mgr = manager();
        let mut seen = HashSet::new();

        for i in 0..500 {
            let seed = mgr.generate_seed(&format!("run-{}", i % 7), "launch").unwrap();
            assert!(seen.insert(seed), "duplicate seed {}", seed);
            assert!(is_valid_seed(seed));
        }

        assert_eq!(mgr.issued_count(), 500);
    }

    #[test]
    fn test_collision_is_substituted_and_logged_in_history() {
        // Frozen clock + same inputs = same hash, so the second call collides
        let mgr = manager();
        let first = mgr.generate_seed("run-a", "launch").unwrap();
        let second = mgr.generate_seed("run-a", "launch").unwrap();

        assert_ne!(first, second);
        let history = mgr.history_for_run("run-a");
        assert_eq!(history.len(), 2);

        // Both calls hashed to the same raw value
        let raw_hash = history[0].substituted_from.unwrap_or(first);
        assert_eq!(history[1].substituted_from, Some(raw_hash));
    }

    #[test]
    fn test_same_inputs_same_seed_across_managers() {
        let a = manager().generate_seed("run-x", "price_war").unwrap();
        let b = manager().generate_seed("run-x", "price_war").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_degenerate_seeds_rejected() {
        assert_eq!(validate_seed(0), Err(SeedError::Zero));
        assert!(matches!(validate_seed(11111111), Err(SeedError::LowDiversity { .. })));
        assert!(matches!(validate_seed(12121212), Err(SeedError::LowDiversity { .. })));
        assert_eq!(validate_seed(12345678), Err(SeedError::SequentialPattern(12345678)));
        assert_eq!(validate_seed(87654321), Err(SeedError::SequentialPattern(87654321)));
        assert!(!is_valid_seed(1234567890));
    }

    #[test]
    fn test_short_seeds_accepted() {
        assert!(is_valid_seed(42));
        assert!(is_valid_seed(7));
        assert!(is_valid_seed(2024));
    }

    #[test]
    fn test_external_seed_out_of_range() {
        let mgr = manager();
        let raw = u64::from(u32::MAX) + 1;
        assert_eq!(
            mgr.register_external_seed(raw, "run", "s"),
            Err(SeedError::OutOfRange(raw))
        );
        assert_eq!(mgr.issued_count(), 0);
    }

    #[test]
    fn test_external_seed_recorded_and_reusable() {
        let mgr = manager();
        assert_eq!(mgr.register_external_seed(42, "run-1", "s").unwrap(), 42);
        assert_eq!(mgr.register_external_seed(42, "run-2", "s").unwrap(), 42);

        assert!(mgr.is_issued(42));
        assert_eq!(mgr.history().len(), 2);
        assert!(mgr.history_for_run("run-2")[0].external);
    }

    #[test]
    fn test_generated_seed_avoids_registered_external_seed() {
        let mgr = manager();
        let natural = manager().generate_seed("run-z", "s").unwrap();
        mgr.register_external_seed(u64::from(natural), "other", "s").unwrap();

        let generated = mgr.generate_seed("run-z", "s").unwrap();
        assert_ne!(generated, natural);
    }

    #[test]
    fn test_external_seed_clock_failure_is_error() {
        let mgr = SeedManager::new(Arc::new(BrokenClock));

        let result = mgr.register_external_seed(42, "run-1", "s");
        assert!(matches!(result, Err(SeedError::Clock(_))));
        assert!(mgr.history().is_empty());
        assert_eq!(mgr.issued_count(), 0);

        assert!(matches!(mgr.generate_seed("run-1", "s"), Err(SeedError::Clock(_))));
    }
}
