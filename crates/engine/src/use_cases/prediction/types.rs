//! Input and result types for prediction operations.

use plotweave_domain::{
    CharacterId, DecisionId, Difficulty, NarrativeId, Prediction, PredictionKind,
    PredictionOptions, RewardEntry, Selection, UserId,
};

/// Input for manually creating a prediction.
pub struct CreatePredictionInput {
    pub narrative_id: NarrativeId,
    pub character_id: CharacterId,
    pub user_id: UserId,
    /// Decision this prediction forecasts the fallout of, when any.
    pub decision_id: Option<DecisionId>,
    pub title: String,
    pub category: Option<String>,
    pub options: PredictionOptions,
    pub difficulty: Difficulty,
    /// Creator's confidence, 0-100.
    pub confidence: u32,
    pub stake_amount: u32,
    /// Defaults to 7 days when unset.
    pub days_to_resolve: Option<i64>,
}

/// Input for generating a prediction about a narrative's trajectory.
pub struct GeneratePredictionInput {
    pub narrative_id: NarrativeId,
    pub character_id: CharacterId,
    pub user_id: UserId,
    pub kind: PredictionKind,
    /// Free-text topic the prediction should be about.
    pub topic: String,
    pub difficulty: Difficulty,
    pub stake_amount: u32,
    /// Defaults to 14 days when unset.
    pub days_to_resolve: Option<i64>,
}

/// A prediction together with the ledger a lifecycle transition produced.
#[derive(Debug)]
pub struct ResolutionResult {
    pub prediction: Prediction,
    pub rewards: Vec<RewardEntry>,
}

/// Verdict produced by automatic resolution before it is applied.
pub struct AutoResolution {
    pub correct: Selection,
    pub explanation: String,
    pub accuracy: f64,
}
