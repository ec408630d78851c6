//! In-memory repository implementations backed by DashMap.
//!
//! Used by the worker binary and by integration-style tests. Clones on read
//! so callers never hold map guards across awaits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use plotweave_domain::{
    CharacterId, Decision, DecisionId, NarrativeId, Prediction, PredictionId,
};

use crate::infrastructure::ports::{
    CharacterRecord, CharacterRepo, DecisionRepo, NarrativeRecord, NarrativeRepo, PredictionRepo,
    RepoError,
};

#[derive(Default)]
pub struct InMemoryDecisionRepo {
    decisions: DashMap<DecisionId, Decision>,
}

impl InMemoryDecisionRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DecisionRepo for InMemoryDecisionRepo {
    async fn get(&self, id: DecisionId) -> Result<Option<Decision>, RepoError> {
        Ok(self.decisions.get(&id).map(|d| d.clone()))
    }

    async fn save(&self, decision: &Decision) -> Result<(), RepoError> {
        self.decisions.insert(decision.id(), decision.clone());
        Ok(())
    }

    async fn list_for_narrative(
        &self,
        narrative_id: NarrativeId,
    ) -> Result<Vec<Decision>, RepoError> {
        Ok(self
            .decisions
            .iter()
            .filter(|entry| entry.narrative_id() == narrative_id)
            .map(|entry| entry.clone())
            .collect())
    }

    async fn list_active_expiring_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Decision>, RepoError> {
        Ok(self
            .decisions
            .iter()
            .filter(|entry| !entry.status().is_terminal() && entry.expires_at() <= cutoff)
            .map(|entry| entry.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryPredictionRepo {
    predictions: DashMap<PredictionId, Prediction>,
}

impl InMemoryPredictionRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PredictionRepo for InMemoryPredictionRepo {
    async fn get(&self, id: PredictionId) -> Result<Option<Prediction>, RepoError> {
        Ok(self.predictions.get(&id).map(|p| p.clone()))
    }

    async fn save(&self, prediction: &Prediction) -> Result<(), RepoError> {
        self.predictions.insert(prediction.id(), prediction.clone());
        Ok(())
    }

    async fn list_for_narrative(
        &self,
        narrative_id: NarrativeId,
    ) -> Result<Vec<Prediction>, RepoError> {
        Ok(self
            .predictions
            .iter()
            .filter(|entry| entry.narrative_id() == narrative_id)
            .map(|entry| entry.clone())
            .collect())
    }

    async fn list_active_expiring_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Prediction>, RepoError> {
        Ok(self
            .predictions
            .iter()
            .filter(|entry| !entry.status().is_terminal() && entry.deadline() <= cutoff)
            .map(|entry| entry.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryCharacterRepo {
    characters: DashMap<CharacterId, CharacterRecord>,
}

impl InMemoryCharacterRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CharacterRepo for InMemoryCharacterRepo {
    async fn get(&self, id: CharacterId) -> Result<Option<CharacterRecord>, RepoError> {
        Ok(self.characters.get(&id).map(|c| c.clone()))
    }

    async fn save(&self, character: &CharacterRecord) -> Result<(), RepoError> {
        self.characters.insert(character.id, character.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryNarrativeRepo {
    narratives: DashMap<NarrativeId, NarrativeRecord>,
}

impl InMemoryNarrativeRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NarrativeRepo for InMemoryNarrativeRepo {
    async fn get(&self, id: NarrativeId) -> Result<Option<NarrativeRecord>, RepoError> {
        Ok(self.narratives.get(&id).map(|n| n.clone()))
    }

    async fn save(&self, narrative: &NarrativeRecord) -> Result<(), RepoError> {
        self.narratives.insert(narrative.id, narrative.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use plotweave_domain::{DecisionOption, Importance, UserId};

    fn t0() -> DateTime<Utc> {
        Utc::now()
    }

    fn decision(narrative_id: NarrativeId, importance: Importance) -> Decision {
        Decision::new(
            narrative_id,
            CharacterId::new(),
            UserId::new(),
            "A test decision",
            vec![DecisionOption::new("only option")],
            importance,
            t0(),
        )
        .expect("valid decision")
    }

    #[tokio::test]
    async fn test_decision_round_trip_and_narrative_listing() {
        let repo = InMemoryDecisionRepo::new();
        let narrative_id = NarrativeId::new();
        let a = decision(narrative_id, Importance::Medium);
        let b = decision(NarrativeId::new(), Importance::Medium);
        repo.save(&a).await.expect("save");
        repo.save(&b).await.expect("save");

        let loaded = repo.get(a.id()).await.expect("get").expect("present");
        assert_eq!(loaded.id(), a.id());

        let listed = repo.list_for_narrative(narrative_id).await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), a.id());
    }

    #[tokio::test]
    async fn test_expiring_query_filters_by_cutoff_and_status() {
        let repo = InMemoryDecisionRepo::new();
        let narrative_id = NarrativeId::new();
        // Critical expires in 6h, low in 72h
        let soon = decision(narrative_id, Importance::Critical);
        let later = decision(narrative_id, Importance::Low);
        repo.save(&soon).await.expect("save");
        repo.save(&later).await.expect("save");

        let due = repo
            .list_active_expiring_before(t0() + Duration::hours(12))
            .await
            .expect("query");
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id(), soon.id());
    }
}
