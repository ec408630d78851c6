//! Core domain model for the decision and prediction resolution engine.
//!
//! This crate is pure: no clock, no RNG, no I/O. Every time-dependent
//! transition takes `now` as a parameter, so the whole lifecycle is
//! deterministic and testable without a runtime.

pub mod effects;
pub mod eligibility;
pub mod entities;
pub mod error;
pub mod ids;
pub mod rewards;
pub mod value_objects;

pub use effects::{aggregate, AggregatedEffect};
pub use eligibility::EligibilityReport;
pub use entities::{
    Cancellation, Decision, DecisionOption, DecisionStatus, Difficulty, Importance, Outcome,
    OutcomeEffects, Prediction, PredictionKind, PredictionOptions, PredictionStatus,
    RelationshipEffect, Resolution, ResourceDelta, Selection, Unlock, Vote,
};
pub use error::DomainError;
pub use ids::{
    CharacterId, DecisionId, NarrativeId, OptionId, PredictionId, SceneId, UserId,
};
pub use rewards::RewardEntry;
pub use value_objects::{
    Audience, CharacterSnapshot, ResourceKind, Resources, Specialty, TraitName,
};
