pub mod decision;
pub mod outcome;
pub mod prediction;

pub use decision::{Decision, DecisionOption, DecisionStatus, Importance};
pub use outcome::{Outcome, OutcomeEffects, RelationshipEffect, ResourceDelta, Unlock};
pub use prediction::{
    Cancellation, Difficulty, Prediction, PredictionKind, PredictionOptions, PredictionStatus,
    Resolution, Selection, Vote,
};
