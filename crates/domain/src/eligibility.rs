//! Eligibility evaluator - can this character take this option?
//!
//! Pure function of its inputs. Failures are collected, not short-circuited,
//! so callers can present the complete reason list. A requirement with value
//! 0 means "no requirement" and is skipped.

use serde::{Deserialize, Serialize};

use crate::entities::DecisionOption;
use crate::value_objects::{CharacterSnapshot, ResourceKind};

/// Result of an eligibility check with itemized failure reasons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityReport {
    pub eligible: bool,
    pub reasons: Vec<String>,
}

impl EligibilityReport {
    fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            eligible: reasons.is_empty(),
            reasons,
        }
    }
}

/// Evaluate an option's requirements against a character snapshot.
pub fn evaluate(snapshot: &CharacterSnapshot, option: &DecisionOption) -> EligibilityReport {
    let mut reasons = Vec::new();

    for (&name, &level) in &option.required_traits {
        if level > 0 && snapshot.trait_level(name) < level {
            reasons.push(format!("Requires {name} level {level}"));
        }
    }

    for requirement in &option.required_specialties {
        let met = snapshot
            .specialty_level(&requirement.name)
            .is_some_and(|level| level >= requirement.level);
        if !met {
            reasons.push(format!(
                "Requires {} specialty level {}",
                requirement.name, requirement.level
            ));
        }
    }

    if option.influence_required > 0 && snapshot.influence() < option.influence_required {
        reasons.push(format!("Requires {} influence", option.influence_required));
    }

    for kind in ResourceKind::ALL {
        let cost = option.resource_cost.get(kind);
        if cost > 0 && snapshot.resources().get(kind) < cost {
            reasons.push(format!("Requires {cost} {kind}"));
        }
    }

    EligibilityReport::from_reasons(reasons)
}
