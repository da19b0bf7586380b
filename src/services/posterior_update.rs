//! Applying observed outcomes to arm posteriors.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::domain::models::{ArmId, ArmPosterior, BetaParams};
use crate::domain::ports::PosteriorStore;

/// One observed outcome for an arm. Reward 1.0 means accepted, 0.0
/// rejected; fractional values carry partial credit as-is.
#[derive(Debug, Clone)]
pub struct ArmOutcome {
    pub arm_id: ArmId,
    pub reward: f64,
}

/// A persistence failure for a single arm's update.
#[derive(Debug, Clone)]
pub struct UpdateFailure {
    pub arm_id: ArmId,
    pub reason: String,
}

/// Result of a batched posterior update.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Arms successfully updated and persisted.
    pub updated: usize,
    /// Per-arm failures; siblings still went through.
    pub failures: Vec<UpdateFailure>,
}

/// Applies Bayesian updates to arm posteriors and persists them.
pub struct PosteriorUpdater {
    store: Arc<dyn PosteriorStore>,
}

impl PosteriorUpdater {
    pub fn new(store: Arc<dyn PosteriorStore>) -> Self {
        Self { store }
    }

    /// Apply a batch of outcomes.
    ///
    /// Each arm's posterior is loaded (or lazily initialized from its
    /// source prior), updated conjugately, its pull count incremented
    /// by exactly one, and persisted. One arm's storage failure never
    /// aborts the others; failures are collected and reported.
    pub async fn apply(&self, outcomes: &[ArmOutcome]) -> UpdateReport {
        let mut report = UpdateReport::default();

        for outcome in outcomes {
            match self.apply_one(outcome).await {
                Ok(()) => report.updated += 1,
                Err(reason) => {
                    warn!(arm = %outcome.arm_id, %reason, "posterior update failed");
                    report.failures.push(UpdateFailure {
                        arm_id: outcome.arm_id.clone(),
                        reason,
                    });
                }
            }
        }

        report
    }

    async fn apply_one(&self, outcome: &ArmOutcome) -> Result<(), String> {
        let existing = self
            .store
            .get_posterior(&outcome.arm_id)
            .await
            .map_err(|e| e.to_string())?;

        let mut posterior = existing.unwrap_or_else(|| {
            ArmPosterior::with_prior(outcome.arm_id.clone(), outcome.arm_id.kind().source())
        });

        posterior.params = posterior.params.updated(outcome.reward);
        posterior.pulls += 1;
        posterior.last_updated = Utc::now();

        self.store
            .upsert_posterior(&posterior)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{DomainError, DomainResult};
    use crate::domain::models::RunTrace;
    use crate::domain::ports::{BaselineComparison, StoreSummary, TokenUsageBucket, TraceFilter};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// In-memory store that can be told to fail writes for one arm.
    #[derive(Default)]
    struct FlakyStore {
        posteriors: Mutex<HashMap<ArmId, ArmPosterior>>,
        fail_arm: Option<ArmId>,
    }

    #[async_trait]
    impl PosteriorStore for FlakyStore {
        async fn get_posterior(&self, arm_id: &ArmId) -> DomainResult<Option<ArmPosterior>> {
            Ok(self.posteriors.lock().unwrap().get(arm_id).cloned())
        }

        async fn upsert_posterior(&self, posterior: &ArmPosterior) -> DomainResult<()> {
            if self.fail_arm.as_ref() == Some(&posterior.arm_id) {
                return Err(DomainError::Database("disk on fire".to_string()));
            }
            self.posteriors
                .lock()
                .unwrap()
                .insert(posterior.arm_id.clone(), posterior.clone());
            Ok(())
        }

        async fn load_posteriors(&self) -> DomainResult<HashMap<ArmId, ArmPosterior>> {
            Ok(self.posteriors.lock().unwrap().clone())
        }

        async fn insert_trace(&self, _trace: &RunTrace) -> DomainResult<()> {
            Ok(())
        }

        async fn get_trace(&self, _trace_id: Uuid) -> DomainResult<Option<RunTrace>> {
            Ok(None)
        }

        async fn list_traces(&self, _filter: TraceFilter) -> DomainResult<Vec<RunTrace>> {
            Ok(Vec::new())
        }

        async fn count_traces(&self) -> DomainResult<u64> {
            Ok(0)
        }

        async fn summary(&self) -> DomainResult<StoreSummary> {
            Ok(StoreSummary::default())
        }

        async fn baseline_comparison(&self) -> DomainResult<BaselineComparison> {
            Ok(BaselineComparison::default())
        }

        async fn token_usage_series(&self, _bucket_secs: u64) -> DomainResult<Vec<TokenUsageBucket>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_lazy_init_uses_source_prior() {
        let store = Arc::new(FlakyStore::default());
        let updater = PosteriorUpdater::new(store.clone());

        let tool = ArmId::from_key("tool:exec:bash");
        let file = ArmId::from_key("file:workspace:notes.md");
        let report = updater
            .apply(&[
                ArmOutcome {
                    arm_id: tool.clone(),
                    reward: 1.0,
                },
                ArmOutcome {
                    arm_id: file.clone(),
                    reward: 0.0,
                },
            ])
            .await;

        assert_eq!(report.updated, 2);
        assert!(report.failures.is_empty());

        let map = store.load_posteriors().await.unwrap();
        // Curated prior Beta(3,1) plus one success.
        assert!((map[&tool].params.alpha - 4.0).abs() < f64::EPSILON);
        assert!((map[&tool].params.beta - 1.0).abs() < f64::EPSILON);
        assert_eq!(map[&tool].pulls, 1);
        // Learned prior Beta(1,1) plus one failure.
        assert!((map[&file].params.alpha - 1.0).abs() < f64::EPSILON);
        assert!((map[&file].params.beta - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_pulls_increment_once_per_observation() {
        let store = Arc::new(FlakyStore::default());
        let updater = PosteriorUpdater::new(store.clone());
        let arm = ArmId::from_key("tool:other:calc");

        for _ in 0..5 {
            updater
                .apply(&[ArmOutcome {
                    arm_id: arm.clone(),
                    reward: 1.0,
                }])
                .await;
        }

        let map = store.load_posteriors().await.unwrap();
        assert_eq!(map[&arm].pulls, 5);
        assert!((map[&arm].params.alpha - 8.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_siblings() {
        let bad = ArmId::from_key("tool:other:bad");
        let store = Arc::new(FlakyStore {
            fail_arm: Some(bad.clone()),
            ..FlakyStore::default()
        });
        let updater = PosteriorUpdater::new(store.clone());

        let good = ArmId::from_key("tool:other:good");
        let report = updater
            .apply(&[
                ArmOutcome {
                    arm_id: bad.clone(),
                    reward: 1.0,
                },
                ArmOutcome {
                    arm_id: good.clone(),
                    reward: 1.0,
                },
            ])
            .await;

        assert_eq!(report.updated, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].arm_id, bad);

        let map = store.load_posteriors().await.unwrap();
        assert!(map.contains_key(&good));
        assert!(!map.contains_key(&bad));
    }
}
