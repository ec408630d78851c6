//! Repository port traits for storage access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plotweave_domain::{
    CharacterId, CharacterSnapshot, Decision, DecisionId, NarrativeId, Prediction, PredictionId,
    UserId,
};

use super::error::RepoError;

/// A character as the storage layer sees it: identity plus the stat
/// snapshot the eligibility evaluator consumes.
#[derive(Debug, Clone)]
pub struct CharacterRecord {
    pub id: CharacterId,
    pub owner: UserId,
    pub name: String,
    pub snapshot: CharacterSnapshot,
}

/// A narrative with its membership roster and currently active characters.
#[derive(Debug, Clone)]
pub struct NarrativeRecord {
    pub id: NarrativeId,
    pub title: String,
    pub premise: String,
    pub members: Vec<UserId>,
    pub active_characters: Vec<CharacterId>,
}

impl NarrativeRecord {
    pub fn is_active_member(&self, user_id: UserId) -> bool {
        self.members.contains(&user_id)
    }

    pub fn is_active_character(&self, character_id: CharacterId) -> bool {
        self.active_characters.contains(&character_id)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DecisionRepo: Send + Sync {
    async fn get(&self, id: DecisionId) -> Result<Option<Decision>, RepoError>;
    async fn save(&self, decision: &Decision) -> Result<(), RepoError>;
    async fn list_for_narrative(
        &self,
        narrative_id: NarrativeId,
    ) -> Result<Vec<Decision>, RepoError>;

    /// Open decisions whose deadline falls at or before `cutoff` (sweep query).
    async fn list_active_expiring_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Decision>, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionRepo: Send + Sync {
    async fn get(&self, id: PredictionId) -> Result<Option<Prediction>, RepoError>;
    async fn save(&self, prediction: &Prediction) -> Result<(), RepoError>;
    async fn list_for_narrative(
        &self,
        narrative_id: NarrativeId,
    ) -> Result<Vec<Prediction>, RepoError>;

    /// Open predictions whose deadline falls at or before `cutoff` (sweep query).
    async fn list_active_expiring_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Prediction>, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterRepo: Send + Sync {
    async fn get(&self, id: CharacterId) -> Result<Option<CharacterRecord>, RepoError>;
    async fn save(&self, character: &CharacterRecord) -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NarrativeRepo: Send + Sync {
    async fn get(&self, id: NarrativeId) -> Result<Option<NarrativeRecord>, RepoError>;
    async fn save(&self, narrative: &NarrativeRecord) -> Result<(), RepoError>;
}
