//! Bulk lazy expiry over both lifecycles.
//!
//! Expiry is enforced lazily on every operation, so the sweep is an
//! accelerant rather than a correctness requirement: it keeps listings
//! honest between user actions.

use std::sync::Arc;

use crate::infrastructure::ports::{ClockPort, DecisionRepo, PredictionRepo, RepoError};

/// What one sweep pass actually transitioned.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub decisions_expired: usize,
    pub predictions_expired: usize,
}

pub struct ExpirySweep {
    decisions: Arc<dyn DecisionRepo>,
    predictions: Arc<dyn PredictionRepo>,
    clock: Arc<dyn ClockPort>,
}

impl ExpirySweep {
    pub fn new(
        decisions: Arc<dyn DecisionRepo>,
        predictions: Arc<dyn PredictionRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            decisions,
            predictions,
            clock,
        }
    }

    /// Expire everything past its deadline, persisting each transition.
    pub async fn run_once(&self) -> Result<SweepReport, RepoError> {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        for mut decision in self.decisions.list_active_expiring_before(now).await? {
            if decision.expire_if_overdue(now) {
                self.decisions.save(&decision).await?;
                report.decisions_expired += 1;
            }
        }
        for mut prediction in self.predictions.list_active_expiring_before(now).await? {
            if prediction.expire_if_overdue(now) {
                self.predictions.save(&prediction).await?;
                report.predictions_expired += 1;
            }
        }

        if report != SweepReport::default() {
            tracing::info!(
                decisions = report.decisions_expired,
                predictions = report.predictions_expired,
                "expiry sweep transitioned overdue entities"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use plotweave_domain::{
        CharacterId, Decision, DecisionOption, DecisionStatus, Difficulty, Importance,
        NarrativeId, Prediction, PredictionOptions, UserId,
    };

    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::memory::{InMemoryDecisionRepo, InMemoryPredictionRepo};

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().expect("valid timestamp")
    }

    #[tokio::test]
    async fn test_sweep_expires_only_overdue_entities() {
        let decisions = Arc::new(InMemoryDecisionRepo::new());
        let predictions = Arc::new(InMemoryPredictionRepo::new());

        // Critical decision expires after 6h, low after 72h
        let overdue = Decision::new(
            NarrativeId::new(),
            CharacterId::new(),
            UserId::new(),
            "overdue",
            vec![DecisionOption::new("only")],
            Importance::Critical,
            t0(),
        )
        .expect("valid decision");
        let fresh = Decision::new(
            NarrativeId::new(),
            CharacterId::new(),
            UserId::new(),
            "fresh",
            vec![DecisionOption::new("only")],
            Importance::Low,
            t0(),
        )
        .expect("valid decision");
        decisions.save(&overdue).await.expect("save");
        decisions.save(&fresh).await.expect("save");

        let due_prediction = Prediction::new(
            UserId::new(),
            CharacterId::new(),
            NarrativeId::new(),
            "due",
            PredictionOptions::Binary {
                options: vec!["Yes".to_string(), "No".to_string()],
            },
            Difficulty::Easy,
            50,
            10,
            t0(),
            1,
        )
        .expect("valid prediction");
        predictions.save(&due_prediction).await.expect("save");

        let sweep = ExpirySweep::new(
            decisions.clone(),
            predictions.clone(),
            Arc::new(FixedClock(t0() + Duration::days(2))),
        );
        let report = sweep.run_once().await.expect("sweep");
        assert_eq!(report.decisions_expired, 1);
        assert_eq!(report.predictions_expired, 1);

        let reloaded = decisions
            .get(overdue.id())
            .await
            .expect("get")
            .expect("present");
        assert_eq!(reloaded.status(), DecisionStatus::Expired);
        let untouched = decisions
            .get(fresh.id())
            .await
            .expect("get")
            .expect("present");
        assert_eq!(untouched.status(), DecisionStatus::Pending);

        // A second pass finds nothing left to do
        let report = sweep.run_once().await.expect("sweep");
        assert_eq!(report, SweepReport::default());
    }
}
