//! Decision and outcome generation: prompt construction, typed parsing,
//! deterministic fallbacks.
//!
//! Generation failure never blocks the lifecycle. A failed decision
//! generation yields a fixed two-option template; a failed outcome
//! generation yields a fixed modest-positive outcome. Both paths log a
//! `tracing::warn!` so operators can see fallback rates.

use std::collections::BTreeMap;

use serde::Deserialize;

use plotweave_domain::{
    Audience, CharacterSnapshot, DecisionOption, Importance, Outcome, OutcomeEffects,
    RelationshipEffect, ResourceDelta, Resources, TraitName,
};

/// Generated decision content before it becomes an entity.
pub struct GeneratedDecision {
    pub title: String,
    pub context: String,
    pub options: Vec<DecisionOption>,
}

pub fn decision_system_prompt() -> String {
    "You are a narrative designer for an interactive fiction platform. \
     Respond with a single JSON object and no other text."
        .to_string()
}

/// Prompt asking for a decision with 2-4 gated options.
pub fn decision_prompt(situation: &str, importance: Importance, snapshot: &CharacterSnapshot) -> String {
    format!(
        r#"Create a dramatic decision for a character facing this situation:

{situation}

Importance: {importance} (influence at stake around {guidance}).
Character influence: {influence}. Character resources: {money} money, {connections} connections, {information} information.

Return JSON:
{{
  "title": "...",
  "context": "one paragraph of stakes",
  "options": [
    {{
      "text": "...",
      "description": "...",
      "consequences": "...",
      "requiredTraits": {{"rational": 5}},
      "influenceRequired": 0,
      "resourceCost": {{"money": 0, "connections": 0, "information": 0}}
    }}
  ]
}}

Provide 2 to 4 options. At least one option must have no requirements."#,
        situation = situation,
        importance = importance.as_str(),
        guidance = importance.influence_guidance(),
        influence = snapshot.influence(),
        money = snapshot.resources().money,
        connections = snapshot.resources().connections,
        information = snapshot.resources().information,
    )
}

/// Prompt asking for 1-3 outcomes of a chosen option.
pub fn outcome_prompt(title: &str, option: &DecisionOption) -> String {
    format!(
        r#"A character resolved the decision "{title}" by choosing: {text}
Stated consequences: {consequences}

Describe what actually happens. Return JSON:
{{
  "outcomes": [
    {{
      "description": "...",
      "effects": {{
        "influence": 0,
        "experience": 0,
        "resources": {{"money": 0, "connections": 0, "information": 0}},
        "reputation": {{"public": 0}},
        "relationships": [{{"character": "...", "trust": 0, "influence": 0}}]
      }},
      "unlocks": []
    }}
  ]
}}

Provide 1 to 3 outcomes. Keep numeric effects small and plausible."#,
        title = title,
        text = option.text,
        consequences = option.consequences,
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecisionPayload {
    title: String,
    #[serde(default)]
    context: String,
    options: Vec<OptionPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionPayload {
    text: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    consequences: String,
    #[serde(default)]
    required_traits: BTreeMap<TraitName, u8>,
    #[serde(default)]
    influence_required: u32,
    #[serde(default)]
    resource_cost: Resources,
}

#[derive(Debug, Deserialize)]
struct OutcomesPayload {
    outcomes: Vec<Outcome>,
}

/// Strip markdown code fences some models wrap around JSON.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}

/// Parse generated decision JSON into option entities.
///
/// Returns None on any parse failure; callers fall back to the template.
pub fn parse_decision(text: &str) -> Option<GeneratedDecision> {
    let payload: DecisionPayload = serde_json::from_str(strip_code_fences(text)).ok()?;
    if payload.options.is_empty() {
        return None;
    }
    let options = payload
        .options
        .into_iter()
        .map(|o| {
            let mut option = DecisionOption::new(o.text)
                .with_description(o.description)
                .with_consequences(o.consequences)
                .with_influence_required(o.influence_required)
                .with_resource_cost(o.resource_cost);
            for (name, level) in o.required_traits {
                option = option.with_required_trait(name, level);
            }
            option
        })
        .collect();
    Some(GeneratedDecision {
        title: payload.title,
        context: payload.context,
        options,
    })
}

/// Parse generated outcome JSON.
pub fn parse_outcomes(text: &str) -> Option<Vec<Outcome>> {
    let payload: OutcomesPayload = serde_json::from_str(strip_code_fences(text)).ok()?;
    if payload.outcomes.is_empty() {
        return None;
    }
    Some(payload.outcomes)
}

/// Deterministic decision used when generation fails.
///
/// Two options, neither gated, so the decision is always playable.
pub fn fallback_decision(situation: &str) -> GeneratedDecision {
    GeneratedDecision {
        title: "A Difficult Choice".to_string(),
        context: format!("The situation demands a response: {situation}"),
        options: vec![
            DecisionOption::new("Act decisively")
                .with_description("Commit now and accept the risk.")
                .with_consequences("Bold action draws attention, good and bad."),
            DecisionOption::new("Wait and gather information")
                .with_description("Hold back until the picture is clearer.")
                .with_consequences("Caution costs momentum but preserves options."),
        ],
    }
}

/// Deterministic outcome used when outcome generation fails.
///
/// Fixed modest-positive effect: influence +5, experience +20,
/// connections +2, information +5, public +3, media +2.
pub fn fallback_outcome(option: &DecisionOption) -> Vec<Outcome> {
    let mut reputation = BTreeMap::new();
    reputation.insert(Audience::Public, 3);
    reputation.insert(Audience::Media, 2);
    vec![Outcome::new(format!(
        "Choosing to {} works out reasonably well, though the full consequences will take time to unfold.",
        option.text.to_lowercase()
    ))
    .with_effects(OutcomeEffects {
        influence: 5,
        experience: 20,
        resources: ResourceDelta::new(0, 2, 5),
        reputation,
        relationships: Vec::<RelationshipEffect>::new(),
    })]
}
