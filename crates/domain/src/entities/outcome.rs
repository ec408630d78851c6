//! Outcome value objects - generated consequences of a chosen decision option
//!
//! Outcomes are produced by content generation, stored on the owning
//! Decision, and consumed by the outcome aggregator. Generated JSON may omit
//! any effect field, so everything defaults to zero/empty on deserialize.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value_objects::Audience;

/// A single narrative consequence with numeric effects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    /// Narrative description shown to the player
    pub description: String,
    #[serde(default)]
    pub effects: OutcomeEffects,
    #[serde(default)]
    pub unlocks: Vec<Unlock>,
}

impl Outcome {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            effects: OutcomeEffects::default(),
            unlocks: Vec::new(),
        }
    }

    pub fn with_effects(mut self, effects: OutcomeEffects) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_unlock(mut self, unlock: Unlock) -> Self {
        self.unlocks.push(unlock);
        self
    }
}

/// Numeric deltas carried by one outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeEffects {
    #[serde(default)]
    pub influence: i64,
    #[serde(default)]
    pub experience: i64,
    #[serde(default)]
    pub resources: ResourceDelta,
    #[serde(default)]
    pub reputation: BTreeMap<Audience, i64>,
    #[serde(default)]
    pub relationships: Vec<RelationshipEffect>,
}

/// Signed resource deltas (holdings themselves are non-negative; deltas are not)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDelta {
    #[serde(default)]
    pub money: i64,
    #[serde(default)]
    pub connections: i64,
    #[serde(default)]
    pub information: i64,
}

impl ResourceDelta {
    pub fn new(money: i64, connections: i64, information: i64) -> Self {
        Self {
            money,
            connections,
            information,
        }
    }
}

/// Trust/influence delta toward another character.
///
/// Not aggregated numerically - each entry is applied individually by the
/// caller against the target character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEffect {
    /// Target character, by name as generated
    pub character: String,
    #[serde(default)]
    pub trust: i64,
    #[serde(default)]
    pub influence: i64,
}

/// Content unlocked by an outcome (scene, contact, opportunity, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effects_default_to_zero_on_sparse_json() {
        let outcome: Outcome = serde_json::from_str(
            r#"{"description": "You gain a contact.", "effects": {"influence": 5}}"#,
        )
        .expect("deserialize");
        assert_eq!(outcome.effects.influence, 5);
        assert_eq!(outcome.effects.experience, 0);
        assert_eq!(outcome.effects.resources, ResourceDelta::default());
        assert!(outcome.effects.reputation.is_empty());
        assert!(outcome.unlocks.is_empty());
    }

    #[test]
    fn test_unlock_type_key() {
        let unlock: Unlock =
            serde_json::from_str(r#"{"type": "scene", "description": "A back-room meeting"}"#)
                .expect("deserialize");
        assert_eq!(unlock.kind, "scene");
    }
}
