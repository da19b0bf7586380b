//! Baseline sampling: deciding when a turn runs as a counterfactual.
//!
//! Baseline runs include every arm so later comparison can measure
//! what selection actually saves. The seeded variants exist for replay
//! and tests; production draws go through the injected `RandomSource`.

use crate::domain::ports::{RandomSource, SeededLcg};

/// Decide whether this invocation runs as a baseline.
#[must_use]
pub fn should_run_baseline(baseline_rate: f64, rng: &dyn RandomSource) -> bool {
    rng.next_f64() < baseline_rate
}

/// Reproducible baseline decision: one LCG step from `seed`,
/// normalized to `[0, 1)`.
#[must_use]
pub fn should_run_baseline_seeded(baseline_rate: f64, seed: u32) -> bool {
    let next = SeededLcg::step(seed);
    let uniform = f64::from(next) / (f64::from(u32::MAX) + 1.0);
    uniform < baseline_rate
}

/// Derive a deterministic seed from a session key and timestamp using
/// a polynomial rolling hash over `"{session_key}:{timestamp_ms}"`.
#[must_use]
pub fn generate_baseline_seed(session_key: &str, timestamp_ms: u64) -> u32 {
    let input = format!("{session_key}:{timestamp_ms}");
    let mut hash: u32 = 0;
    for byte in input.bytes() {
        hash = hash.wrapping_mul(31).wrapping_add(u32::from(byte));
    }
    hash
}

/// Recommended baseline rate for a pool of `arm_count` arms.
///
/// Smaller pools need proportionally more baseline coverage per arm to
/// keep every arm's observation count growing.
#[must_use]
pub fn recommended_baseline_rate(arm_count: usize) -> f64 {
    if arm_count <= 10 {
        0.20
    } else if arm_count <= 50 {
        0.10
    } else {
        0.05
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ConstRandom(f64);

    impl RandomSource for ConstRandom {
        fn next_f64(&self) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_should_run_baseline_thresholds() {
        assert!(should_run_baseline(0.10, &ConstRandom(0.05)));
        assert!(!should_run_baseline(0.10, &ConstRandom(0.10)));
        assert!(!should_run_baseline(0.0, &ConstRandom(0.0)));
        assert!(should_run_baseline(1.0, &ConstRandom(0.999)));
    }

    #[test]
    fn test_seeded_decision_is_deterministic() {
        let seed = generate_baseline_seed("session-1", 1_700_000_000_000);
        let first = should_run_baseline_seeded(0.10, seed);
        for _ in 0..10 {
            assert_eq!(should_run_baseline_seeded(0.10, seed), first);
        }
    }

    #[test]
    fn test_seed_varies_with_inputs() {
        let a = generate_baseline_seed("session-1", 1000);
        let b = generate_baseline_seed("session-1", 1001);
        let c = generate_baseline_seed("session-2", 1000);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_seeded_rate_roughly_converges() {
        let runs = 10_000_u32;
        let hits = (0..runs)
            .filter(|&i| {
                let seed = generate_baseline_seed("convergence", u64::from(i));
                should_run_baseline_seeded(0.10, seed)
            })
            .count();
        let fraction = hits as f64 / f64::from(runs);
        assert!(
            (fraction - 0.10).abs() < 0.03,
            "seeded baseline fraction {fraction} outside 0.10 +/- 0.03"
        );
    }

    #[test]
    fn test_recommended_rate_table() {
        assert!((recommended_baseline_rate(1) - 0.20).abs() < f64::EPSILON);
        assert!((recommended_baseline_rate(10) - 0.20).abs() < f64::EPSILON);
        assert!((recommended_baseline_rate(11) - 0.10).abs() < f64::EPSILON);
        assert!((recommended_baseline_rate(50) - 0.10).abs() < f64::EPSILON);
        assert!((recommended_baseline_rate(51) - 0.05).abs() < f64::EPSILON);
        assert!((recommended_baseline_rate(500) - 0.05).abs() < f64::EPSILON);
    }
}
