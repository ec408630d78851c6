//! Input and result types for decision operations.

use plotweave_domain::{
    AggregatedEffect, CharacterId, Decision, DecisionOption, Importance, NarrativeId, Outcome,
    SceneId, UserId,
};

/// Input for manually creating a decision.
pub struct CreateDecisionInput {
    pub narrative_id: NarrativeId,
    pub character_id: CharacterId,
    pub user_id: UserId,
    pub title: String,
    pub context: Option<String>,
    pub scene_id: Option<SceneId>,
    pub options: Vec<DecisionOption>,
    pub importance: Importance,
    /// Override for the importance's default time limit, in hours.
    pub time_limit_hours: Option<i64>,
}

/// Input for generating a decision from narrative context.
pub struct GenerateDecisionInput {
    pub narrative_id: NarrativeId,
    pub character_id: CharacterId,
    pub user_id: UserId,
    pub scene_id: Option<SceneId>,
    /// Free-text situation the decision should arise from.
    pub situation: String,
    pub importance: Importance,
}

/// Everything a caller needs after an option is chosen.
#[derive(Debug)]
pub struct ChoiceResult {
    pub decision: Decision,
    pub outcomes: Vec<Outcome>,
    pub effect: AggregatedEffect,
}
