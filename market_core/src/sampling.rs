//! Shared sampling helpers.
//!
//! Every model call owns exactly one `ChaCha8Rng`, created here from the
//! resolved seed. ChaCha8 output is platform independent, which is what makes
//! results reproducible across process restarts.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Normal};

/// Creates the private generator for one model call.
pub fn model_rng(seed: u32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(u64::from(seed))
}

/// Draws from N(mean, std_dev). A degenerate deviation returns the mean.
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    match Normal::new(mean, std_dev.max(0.0)) {
        Ok(normal) => normal.sample(rng),
        Err(_) => mean,
    }
}

/// Draws from Exp(lambda). A non-positive rate returns 0.
pub fn exponential<R: Rng + ?Sized>(rng: &mut R, lambda: f64) -> f64 {
    match Exp::new(lambda) {
        Ok(exp) if lambda > 0.0 => exp.sample(rng),
        _ => 0.0,
    }
}

/// Bernoulli trial with probability `p` (clipped to [0, 1]).
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.gen::<f64>() < clip01(p)
}

/// Clips to [0, 1]; NaN maps to 0.
pub fn clip01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_model_rng_is_deterministic() {
        let mut a = model_rng(42);
        let mut b = model_rng(42);
        
        for _ in 0..16 {
            assert_eq!(a.gen::<u64>(), b.gen::<u64>());
        }
    }
    
    #[test]
    fn test_gaussian_degenerate_returns_mean() {
        let mut rng = model_rng(1);
        assert_eq!(gaussian(&mut rng, 3.0, f64::NAN), 3.0);
    }
    
    #[test]
    fn test_clip01() {
        assert_eq!(clip01(-0.5), 0.0);
        assert_eq!(clip01(1.5), 1.0);
        assert_eq!(clip01(f64::NAN), 0.0);
        assert_eq!(clip01(0.25), 0.25);
    }
    
    #[test]
    fn test_exponential_non_positive_rate() {
        let mut rng = model_rng(3);
        assert_eq!(exponential(&mut rng, 0.0), 0.0);
        assert!(exponential(&mut rng, 2.0) >= 0.0);
    }
}
