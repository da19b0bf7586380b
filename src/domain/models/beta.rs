//! Beta-Bernoulli posterior math.
//!
//! Each arm's usefulness probability is modelled as a Beta(alpha, beta)
//! distribution, updated conjugately from observed rewards. Sampling
//! uses the Gamma-ratio method with Marsaglia-Tsang Gamma variates, so
//! Thompson draws reflect the full posterior shape rather than a
//! mean-plus-jitter approximation.

use serde::{Deserialize, Serialize};

use crate::domain::ports::RandomSource;

/// The source an arm came from, which determines its starting prior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmSource {
    /// Intentionally shipped components (tools, skills). Optimistic prior.
    Curated,
    /// Arbitrary workspace content (files). Neutral prior.
    Learned,
}

/// A Beta distribution parameterised by `alpha` and `beta`, used as the
/// conjugate prior for Bernoulli-like arm usefulness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaParams {
    /// Pseudo-count of successes (shape parameter).
    pub alpha: f64,
    /// Pseudo-count of failures (shape parameter).
    pub beta: f64,
}

impl BetaParams {
    /// Create a distribution with the given parameters.
    #[must_use]
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// A uniform (uninformative) prior: Beta(1, 1).
    #[must_use]
    pub fn uniform() -> Self {
        Self::new(1.0, 1.0)
    }

    /// The starting belief for an arm of the given source.
    ///
    /// Curated components get Beta(3, 1) (mean 0.75) so deliberately
    /// shipped arms are not pruned before they accumulate evidence;
    /// learned components get the neutral Beta(1, 1). Priors never go
    /// below 1 so the distribution stays proper.
    #[must_use]
    pub fn initial_prior(source: ArmSource) -> Self {
        match source {
            ArmSource::Curated => Self::new(3.0, 1.0),
            ArmSource::Learned => Self::uniform(),
        }
    }

    /// The mean `alpha / (alpha + beta)`, or 0.5 when both shapes are zero.
    #[must_use]
    pub fn mean(&self) -> f64 {
        let sum = self.alpha + self.beta;
        if sum == 0.0 {
            return 0.5;
        }
        self.alpha / sum
    }

    /// The variance `alpha*beta / ((alpha+beta)^2 (alpha+beta+1))`.
    #[must_use]
    pub fn variance(&self) -> f64 {
        let sum = self.alpha + self.beta;
        if sum == 0.0 {
            return 0.0;
        }
        (self.alpha * self.beta) / (sum.powi(2) * (sum + 1.0))
    }

    /// Conjugate Bayesian update for one observed reward in `[0, 1]`.
    ///
    /// Bernoulli outcomes are 0 or 1; continuous partial credit is
    /// accepted as-is and split across both shapes.
    #[must_use]
    pub fn updated(&self, reward: f64) -> Self {
        let reward = reward.clamp(0.0, 1.0);
        Self::new(self.alpha + reward, self.beta + (1.0 - reward))
    }

    /// Draw one sample from this Beta distribution via the Gamma-ratio
    /// method: `x = Ga / (Ga + Gb)` with `Ga ~ Gamma(alpha, 1)` and
    /// `Gb ~ Gamma(beta, 1)`.
    ///
    /// Returns 0.5 in the degenerate case where both Gamma variates
    /// are zero.
    #[must_use]
    pub fn sample(&self, rng: &dyn RandomSource) -> f64 {
        let ga = sample_gamma(self.alpha, rng);
        let gb = sample_gamma(self.beta, rng);
        let sum = ga + gb;
        if sum == 0.0 {
            return 0.5;
        }
        (ga / sum).clamp(0.0, 1.0)
    }

    /// A credible interval at the given level (e.g. 0.95), using the
    /// normal approximation `mean +/- z * sd` clamped to `[0, 1]`.
    #[must_use]
    pub fn credible_interval(&self, level: f64) -> (f64, f64) {
        let z = z_score(level);
        let mean = self.mean();
        let sd = self.variance().sqrt();
        ((mean - z * sd).max(0.0), (mean + z * sd).min(1.0))
    }
}

impl Default for BetaParams {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Two-sided z value for the common credible levels; 1.96 otherwise.
fn z_score(level: f64) -> f64 {
    if (level - 0.90).abs() < 1e-9 {
        1.645
    } else if (level - 0.99).abs() < 1e-9 {
        2.576
    } else {
        1.96
    }
}

/// One standard-normal variate via Box-Muller.
fn sample_standard_normal(rng: &dyn RandomSource) -> f64 {
    let u1 = rng.next_f64().max(f64::MIN_POSITIVE);
    let u2 = rng.next_f64();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// One `Gamma(shape, 1)` variate via the Marsaglia-Tsang rejection
/// method. Shapes below 1 use the boosting identity
/// `Gamma(a) = Gamma(a + 1) * U^(1/a)`; non-positive shapes yield 0.
fn sample_gamma(shape: f64, rng: &dyn RandomSource) -> f64 {
    if shape <= 0.0 {
        return 0.0;
    }
    if shape < 1.0 {
        let u = rng.next_f64().max(f64::MIN_POSITIVE);
        return sample_gamma(shape + 1.0, rng) * u.powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (3.0 * d.sqrt());
    loop {
        let x = sample_standard_normal(rng);
        let t = 1.0 + c * x;
        if t <= 0.0 {
            continue;
        }
        let v = t * t * t;
        let u = rng.next_f64();

        // Squeeze check avoids the logs on the vast majority of draws.
        if u < 1.0 - 0.0331 * x.powi(4) {
            return d * v;
        }
        if u.max(f64::MIN_POSITIVE).ln() < 0.5 * x * x + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}
