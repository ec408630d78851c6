//! Outcome aggregator - net effect across a decision's generated outcomes
//!
//! Numeric fields sum commutatively, so the result is identical for any
//! ordering of the outcome sequence. Relationship effects are not aggregated
//! numerically; they pass through as one combined sequence for the caller to
//! apply per target character.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::{Outcome, RelationshipEffect, ResourceDelta};
use crate::value_objects::Audience;

/// Net numeric delta ready to apply to a character
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedEffect {
    pub influence: i64,
    pub experience: i64,
    pub resources: ResourceDelta,
    pub reputation: BTreeMap<Audience, i64>,
    /// Pass-through, applied individually by the caller
    pub relationships: Vec<RelationshipEffect>,
}

/// Combine zero or more outcomes into one net effect.
pub fn aggregate(outcomes: &[Outcome]) -> AggregatedEffect {
    let mut total = AggregatedEffect::default();
    for outcome in outcomes {
        let effects = &outcome.effects;
        total.influence += effects.influence;
        total.experience += effects.experience;
        total.resources.money += effects.resources.money;
        total.resources.connections += effects.resources.connections;
        total.resources.information += effects.resources.information;
        for (&audience, &delta) in &effects.reputation {
            *total.reputation.entry(audience).or_insert(0) += delta;
        }
        total
            .relationships
            .extend(effects.relationships.iter().cloned());
    }
    total
}
