//! Decision entity - a character-facing choice point with gated options
//!
//! Lifecycle: created in `pending` (manual) or `active` (generated), resolved
//! only via a successful choose-option call, expired lazily when observed
//! past its deadline, cancelled explicitly from `pending`/`active`.
//!
//! Every transition method takes `now` as a parameter; the entity never reads
//! the clock. Callers persist the entity after each successful transition
//! (and after the lazy expiry transition, which is the one failure path that
//! still writes state).

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::eligibility;
use crate::error::DomainError;
use crate::value_objects::{Audience, CharacterSnapshot, Resources, Specialty, TraitName};
use crate::{CharacterId, DecisionId, NarrativeId, OptionId, SceneId, UserId};

use super::outcome::Outcome;

/// How much a decision matters, driving deadlines and generation guidance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Importance {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Importance {
    /// Default time limit before the decision expires.
    pub fn default_time_limit(&self) -> Duration {
        match self {
            Self::Low => Duration::hours(72),
            Self::Medium => Duration::hours(48),
            Self::High => Duration::hours(24),
            Self::Critical => Duration::hours(6),
        }
    }

    /// Influence level the generator should gate the strongest option behind.
    ///
    /// Generation guidance only - not enforced as an invariant on the entity.
    pub fn influence_guidance(&self) -> u32 {
        match self {
            Self::Low => 10,
            Self::Medium => 25,
            Self::High => 50,
            Self::Critical => 100,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Decision lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    Pending,
    Active,
    Resolved,
    Expired,
    Cancelled,
}

impl DecisionStatus {
    /// Terminal states permit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Expired | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Resolved => "resolved",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

/// One selectable option with its requirements and costs.
///
/// A requirement entry with value 0 means "no requirement" and is skipped
/// during eligibility evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOption {
    pub id: OptionId,
    pub text: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub consequences: String,
    #[serde(default)]
    pub required_traits: BTreeMap<TraitName, u8>,
    #[serde(default)]
    pub required_specialties: Vec<Specialty>,
    #[serde(default)]
    pub influence_required: u32,
    #[serde(default)]
    pub resource_cost: Resources,
    #[serde(default)]
    pub reputation_impact: BTreeMap<Audience, i32>,
}

impl DecisionOption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: OptionId::new(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: OptionId) -> Self {
        self.id = id;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_consequences(mut self, consequences: impl Into<String>) -> Self {
        self.consequences = consequences.into();
        self
    }

    pub fn with_required_trait(mut self, name: TraitName, level: u8) -> Self {
        self.required_traits.insert(name, level.min(10));
        self
    }

    pub fn with_required_specialty(mut self, name: impl Into<String>, level: u8) -> Self {
        self.required_specialties.push(Specialty::new(name, level));
        self
    }

    pub fn with_influence_required(mut self, influence: u32) -> Self {
        self.influence_required = influence;
        self
    }

    pub fn with_resource_cost(mut self, cost: Resources) -> Self {
        self.resource_cost = cost;
        self
    }

    pub fn with_reputation_impact(mut self, audience: Audience, delta: i32) -> Self {
        self.reputation_impact.insert(audience, delta);
        self
    }
}

/// A choice point owned by the creating user, referencing (not owning) a
/// character and narrative by identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    id: DecisionId,
    narrative_id: NarrativeId,
    character_id: CharacterId,
    user_id: UserId,
    scene_id: Option<SceneId>,
    title: String,
    context: String,
    options: Vec<DecisionOption>,
    status: DecisionStatus,
    importance: Importance,
    created_at: DateTime<Utc>,
    /// Seconds from creation to expiry; extended by `extend_deadline`
    time_limit_secs: i64,
    expires_at: DateTime<Utc>,
    chosen_option_id: Option<OptionId>,
    outcomes: Vec<Outcome>,
    resolved_at: Option<DateTime<Utc>>,
    /// Version marker for the storage layer's optimistic concurrency
    updated_at: DateTime<Utc>,
}

impl Decision {
    /// Create a new decision in `pending`.
    ///
    /// `expires_at` is computed from the importance's default time limit;
    /// override with `with_time_limit_secs`. Fails with `InvalidInput` when
    /// the option list is empty.
    pub fn new(
        narrative_id: NarrativeId,
        character_id: CharacterId,
        user_id: UserId,
        title: impl Into<String>,
        options: Vec<DecisionOption>,
        importance: Importance,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if options.is_empty() {
            return Err(DomainError::invalid_input(
                "a decision requires at least one option",
            ));
        }
        let time_limit = importance.default_time_limit();
        Ok(Self {
            id: DecisionId::new(),
            narrative_id,
            character_id,
            user_id,
            scene_id: None,
            title: title.into(),
            context: String::new(),
            options,
            status: DecisionStatus::Pending,
            importance,
            created_at,
            time_limit_secs: time_limit.num_seconds(),
            expires_at: created_at + time_limit,
            chosen_option_id: None,
            outcomes: Vec::new(),
            resolved_at: None,
            updated_at: created_at,
        })
    }

    // === Accessors ===

    pub fn id(&self) -> DecisionId {
        self.id
    }

    pub fn narrative_id(&self) -> NarrativeId {
        self.narrative_id
    }

    pub fn character_id(&self) -> CharacterId {
        self.character_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn scene_id(&self) -> Option<SceneId> {
        self.scene_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn options(&self) -> &[DecisionOption] {
        &self.options
    }

    pub fn option(&self, id: OptionId) -> Option<&DecisionOption> {
        self.options.iter().find(|o| o.id == id)
    }

    pub fn status(&self) -> DecisionStatus {
        self.status
    }

    pub fn importance(&self) -> Importance {
        self.importance
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn time_limit_secs(&self) -> i64 {
        self.time_limit_secs
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn chosen_option_id(&self) -> Option<OptionId> {
        self.chosen_option_id
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // === Builder Methods ===

    /// Set the decision ID (used when loading from storage).
    pub fn with_id(mut self, id: DecisionId) -> Self {
        self.id = id;
        self
    }

    pub fn with_scene(mut self, scene_id: SceneId) -> Self {
        self.scene_id = Some(scene_id);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Override the time limit; recomputes `expires_at` from `created_at`.
    pub fn with_time_limit_secs(mut self, secs: i64) -> Self {
        self.time_limit_secs = secs;
        self.expires_at = self.created_at + Duration::seconds(secs);
        self
    }

    /// Set the initial status (generated decisions start `active`).
    pub fn with_status(mut self, status: DecisionStatus) -> Self {
        self.status = status;
        self
    }

    // === State Transitions ===

    /// Lazily expire the decision if its deadline has passed.
    ///
    /// Returns true when a transition happened (caller must persist).
    pub fn expire_if_overdue(&mut self, now: DateTime<Utc>) -> bool {
        if matches!(self.status, DecisionStatus::Pending | DecisionStatus::Active)
            && now > self.expires_at
        {
            self.status = DecisionStatus::Expired;
            self.updated_at = now;
            true
        } else {
            false
        }
    }

    /// Open a manually created decision for choosing (`pending` -> `active`).
    pub fn activate(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.expire_if_overdue(now) {
            return Err(DomainError::expired(self.expires_at));
        }
        if self.status != DecisionStatus::Pending {
            return Err(DomainError::invalid_state(format!(
                "cannot activate a {} decision",
                self.status.as_str()
            )));
        }
        self.status = DecisionStatus::Active;
        self.updated_at = now;
        Ok(())
    }

    /// Choose an option, resolving the decision.
    ///
    /// Checks run in order: status, deadline (expiring in place on failure),
    /// option existence, eligibility against the snapshot. Only when all pass
    /// does the decision transition to `resolved`. On `Ineligible` the
    /// decision remains `active` and unmodified.
    ///
    /// Returns a clone of the chosen option so the caller can request outcome
    /// generation without holding a borrow on the entity.
    pub fn choose_option(
        &mut self,
        option_id: OptionId,
        snapshot: &CharacterSnapshot,
        now: DateTime<Utc>,
    ) -> Result<DecisionOption, DomainError> {
        if self.status != DecisionStatus::Active {
            return Err(DomainError::invalid_state(format!(
                "cannot choose an option on a {} decision",
                self.status.as_str()
            )));
        }
        if now > self.expires_at {
            self.status = DecisionStatus::Expired;
            self.updated_at = now;
            return Err(DomainError::expired(self.expires_at));
        }
        let option = self
            .option(option_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("DecisionOption", option_id.to_string()))?;

        let report = eligibility::evaluate(snapshot, &option);
        if !report.eligible {
            return Err(DomainError::ineligible(report.reasons));
        }

        self.chosen_option_id = Some(option_id);
        self.status = DecisionStatus::Resolved;
        self.resolved_at = Some(now);
        self.updated_at = now;
        Ok(option)
    }

    /// Record generated outcomes on a resolved decision.
    pub fn attach_outcomes(&mut self, outcomes: Vec<Outcome>, now: DateTime<Utc>) {
        self.outcomes = outcomes;
        self.updated_at = now;
    }

    /// Cancel the decision (only from `pending`/`active`). No outcomes.
    ///
    /// An overdue decision expires instead of cancelling.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.expire_if_overdue(now) {
            return Err(DomainError::expired(self.expires_at));
        }
        if !matches!(self.status, DecisionStatus::Pending | DecisionStatus::Active) {
            return Err(DomainError::invalid_state(format!(
                "cannot cancel a {} decision",
                self.status.as_str()
            )));
        }
        self.status = DecisionStatus::Cancelled;
        self.resolved_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Extend the deadline by `hours` (must be in (0, 72], decision `active`).
    pub fn extend_deadline(&mut self, hours: i64, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !(1..=72).contains(&hours) {
            return Err(DomainError::invalid_input(format!(
                "extension must be between 1 and 72 hours, got {hours}"
            )));
        }
        if self.expire_if_overdue(now) {
            return Err(DomainError::expired(self.expires_at));
        }
        if self.status != DecisionStatus::Active {
            return Err(DomainError::invalid_state(format!(
                "cannot extend a {} decision",
                self.status.as_str()
            )));
        }
        self.time_limit_secs += hours * 3600;
        self.expires_at += Duration::hours(hours);
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().expect("valid timestamp")
    }

    fn two_option_decision() -> Decision {
        let options = vec![
            DecisionOption::new("Act cautiously"),
            DecisionOption::new("Commit your influence").with_influence_required(50),
        ];
        Decision::new(
            NarrativeId::new(),
            CharacterId::new(),
            UserId::new(),
            "A fork in the road",
            options,
            Importance::Medium,
            t0(),
        )
        .expect("valid decision")
    }

    #[test]
    fn test_new_decision_requires_options() {
        let err = Decision::new(
            NarrativeId::new(),
            CharacterId::new(),
            UserId::new(),
            "Empty",
            vec![],
            Importance::Low,
            t0(),
        )
        .expect_err("empty options must be rejected");
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn test_expires_at_follows_importance() {
        let decision = two_option_decision();
        assert_eq!(decision.expires_at(), t0() + Duration::hours(48));
        assert_eq!(decision.time_limit_secs(), 48 * 3600);
    }

    #[test]
    fn test_choose_option_happy_path_and_ineligible() {
        let mut decision = two_option_decision();
        decision.activate(t0()).expect("activate");
        let snapshot = CharacterSnapshot::new().with_influence(10);

        let gated = decision.options()[1].id;
        let err = decision
            .choose_option(gated, &snapshot, t0() + Duration::hours(1))
            .expect_err("influence 10 cannot meet 50");
        assert_eq!(
            err,
            DomainError::ineligible(vec!["Requires 50 influence".to_string()])
        );
        // Ineligible choice leaves the decision active and unresolved
        assert_eq!(decision.status(), DecisionStatus::Active);
        assert_eq!(decision.chosen_option_id(), None);

        let open = decision.options()[0].id;
        let chosen = decision
            .choose_option(open, &snapshot, t0() + Duration::hours(1))
            .expect("ungated option");
        assert_eq!(chosen.text, "Act cautiously");
        assert_eq!(decision.status(), DecisionStatus::Resolved);
        assert_eq!(decision.chosen_option_id(), Some(open));
        assert_eq!(decision.resolved_at(), Some(t0() + Duration::hours(1)));
    }

    #[test]
    fn test_choose_option_from_resolved_is_invalid_state() {
        let mut decision = two_option_decision();
        decision.activate(t0()).expect("activate");
        let snapshot = CharacterSnapshot::new();
        let open = decision.options()[0].id;
        decision
            .choose_option(open, &snapshot, t0())
            .expect("first choice");
        let err = decision
            .choose_option(open, &snapshot, t0())
            .expect_err("second choice must fail");
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn test_choose_option_past_deadline_expires_first() {
        let mut decision = two_option_decision();
        decision.activate(t0()).expect("activate");
        let snapshot = CharacterSnapshot::new();
        let open = decision.options()[0].id;
        let late = t0() + Duration::hours(49);
        let err = decision
            .choose_option(open, &snapshot, late)
            .expect_err("past deadline");
        assert!(err.is_expired());
        assert_eq!(decision.status(), DecisionStatus::Expired);
    }

    #[test]
    fn test_unknown_option_is_not_found() {
        let mut decision = two_option_decision();
        decision.activate(t0()).expect("activate");
        let err = decision
            .choose_option(OptionId::new(), &CharacterSnapshot::new(), t0())
            .expect_err("unknown option");
        assert!(matches!(err, DomainError::NotFound { .. }));
        assert_eq!(decision.status(), DecisionStatus::Active);
    }

    #[test]
    fn test_cancel_only_from_pending_or_active() {
        let mut decision = two_option_decision();
        decision.cancel(t0()).expect("cancel pending");
        assert_eq!(decision.status(), DecisionStatus::Cancelled);

        let err = decision.cancel(t0()).expect_err("cancel cancelled");
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn test_cancel_overdue_decision_expires() {
        let mut decision = two_option_decision();
        decision.activate(t0()).expect("activate");
        let err = decision
            .cancel(t0() + Duration::hours(72))
            .expect_err("overdue decisions expire instead of cancelling");
        assert!(err.is_expired());
        assert_eq!(decision.status(), DecisionStatus::Expired);
    }

    #[test]
    fn test_extend_deadline_bounds() {
        let mut decision = two_option_decision();
        decision.activate(t0()).expect("activate");

        let err = decision
            .extend_deadline(73, t0())
            .expect_err("73 hours is out of bounds");
        assert!(matches!(err, DomainError::InvalidInput(_)));
        let err = decision
            .extend_deadline(0, t0())
            .expect_err("zero hours is out of bounds");
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let before = decision.expires_at();
        decision.extend_deadline(24, t0()).expect("24h extension");
        assert_eq!(decision.expires_at() - before, Duration::seconds(86_400));
        assert_eq!(decision.time_limit_secs(), (48 + 24) * 3600);
    }

    #[test]
    fn test_extend_overdue_decision_expires() {
        let mut decision = two_option_decision();
        decision.activate(t0()).expect("activate");
        let err = decision
            .extend_deadline(24, t0() + Duration::hours(72))
            .expect_err("overdue");
        assert!(err.is_expired());
        assert_eq!(decision.status(), DecisionStatus::Expired);
    }

    #[test]
    fn test_lazy_expiry_is_idempotent() {
        let mut decision = two_option_decision();
        let late = t0() + Duration::hours(100);
        assert!(decision.expire_if_overdue(late));
        assert!(!decision.expire_if_overdue(late));
        assert_eq!(decision.status(), DecisionStatus::Expired);
    }
}
