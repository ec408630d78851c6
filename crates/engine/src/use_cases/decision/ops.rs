//! Decision lifecycle operations.

use std::sync::Arc;

use plotweave_domain::{
    self as domain, effects, eligibility, CharacterSnapshot, Decision, DecisionId, DecisionStatus,
    DomainError, EligibilityReport, OptionId, Outcome, UserId,
};

use crate::infrastructure::ports::{
    CharacterRepo, ClockPort, ContentPort, ContentRequest, DecisionRepo, NarrativeRecord,
    NarrativeRepo,
};
use crate::use_cases::error::OpsError;

use super::generate::{
    decision_prompt, decision_system_prompt, fallback_decision, fallback_outcome, outcome_prompt,
    parse_decision, parse_outcomes,
};
use super::types::{ChoiceResult, CreateDecisionInput, GenerateDecisionInput};

pub struct DecisionOps {
    decisions: Arc<dyn DecisionRepo>,
    characters: Arc<dyn CharacterRepo>,
    narratives: Arc<dyn NarrativeRepo>,
    content: Arc<dyn ContentPort>,
    clock: Arc<dyn ClockPort>,
}

impl DecisionOps {
    pub fn new(
        decisions: Arc<dyn DecisionRepo>,
        characters: Arc<dyn CharacterRepo>,
        narratives: Arc<dyn NarrativeRepo>,
        content: Arc<dyn ContentPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            decisions,
            characters,
            narratives,
            content,
            clock,
        }
    }

    /// Create a decision manually. Starts `pending`.
    pub async fn create(&self, input: CreateDecisionInput) -> Result<Decision, OpsError> {
        let narrative = self
            .require_membership(input.narrative_id, input.user_id)
            .await?;
        self.load_snapshot(input.character_id, input.user_id).await?;
        self.require_active_character(&narrative, input.character_id)?;

        let now = self.clock.now();
        let mut decision = Decision::new(
            input.narrative_id,
            input.character_id,
            input.user_id,
            input.title,
            input.options,
            input.importance,
            now,
        )?;
        if let Some(context) = input.context {
            decision = decision.with_context(context);
        }
        if let Some(scene_id) = input.scene_id {
            decision = decision.with_scene(scene_id);
        }
        if let Some(hours) = input.time_limit_hours {
            if !(1..=8760).contains(&hours) {
                return Err(DomainError::invalid_input(format!(
                    "time limit must be between 1 and 8760 hours, got {hours}"
                ))
                .into());
            }
            decision = decision.with_time_limit_secs(hours * 3600);
        }

        self.decisions.save(&decision).await?;
        Ok(decision)
    }

    /// Generate a decision from a narrative situation. Starts `active`.
    ///
    /// Generation failure falls back to a fixed ungated template so the
    /// story never stalls on a flaky backend.
    pub async fn generate(&self, input: GenerateDecisionInput) -> Result<Decision, OpsError> {
        let narrative = self
            .require_membership(input.narrative_id, input.user_id)
            .await?;
        let snapshot = self.load_snapshot(input.character_id, input.user_id).await?;
        self.require_active_character(&narrative, input.character_id)?;

        let request = ContentRequest::new(decision_prompt(
            &input.situation,
            input.importance,
            &snapshot,
        ))
        .with_system_prompt(decision_system_prompt())
        .with_temperature(0.8);

        let generated = match self.content.generate(request).await {
            Ok(content) => match parse_decision(&content.text) {
                Some(generated) => generated,
                None => {
                    tracing::warn!(
                        narrative_id = %input.narrative_id,
                        "generated decision did not parse, using fallback template"
                    );
                    fallback_decision(&input.situation)
                }
            },
            Err(e) => {
                tracing::warn!(
                    narrative_id = %input.narrative_id,
                    error = %e,
                    "decision generation failed, using fallback template"
                );
                fallback_decision(&input.situation)
            }
        };

        let now = self.clock.now();
        let mut decision = Decision::new(
            input.narrative_id,
            input.character_id,
            input.user_id,
            generated.title,
            generated.options,
            input.importance,
            now,
        )?
        .with_context(generated.context);
        if let Some(scene_id) = input.scene_id {
            decision = decision.with_scene(scene_id);
        }
        decision.activate(now)?;

        self.decisions.save(&decision).await?;
        Ok(decision)
    }

    /// Open a pending decision for choosing.
    pub async fn activate(
        &self,
        decision_id: DecisionId,
        user_id: UserId,
    ) -> Result<Decision, OpsError> {
        let mut decision = self.load_owned(decision_id, user_id).await?;
        let now = self.clock.now();
        if let Err(e) = decision.activate(now) {
            self.persist_if_expired(&decision, &e).await?;
            return Err(e.into());
        }
        self.decisions.save(&decision).await?;
        Ok(decision)
    }

    /// Choose an option, generating and aggregating its outcomes.
    pub async fn choose_option(
        &self,
        decision_id: DecisionId,
        user_id: UserId,
        option_id: OptionId,
    ) -> Result<ChoiceResult, OpsError> {
        let mut decision = self.load_owned(decision_id, user_id).await?;
        let snapshot = self.load_snapshot(decision.character_id(), user_id).await?;

        let now = self.clock.now();
        let option = match decision.choose_option(option_id, &snapshot, now) {
            Ok(option) => option,
            Err(e) => {
                self.persist_if_expired(&decision, &e).await?;
                return Err(e.into());
            }
        };

        let outcomes = self.generate_outcomes(decision.title(), &option).await;
        decision.attach_outcomes(outcomes.clone(), now);
        self.decisions.save(&decision).await?;

        let effect = effects::aggregate(&outcomes);
        Ok(ChoiceResult {
            decision,
            outcomes,
            effect,
        })
    }

    /// Cancel a pending or active decision.
    pub async fn cancel(
        &self,
        decision_id: DecisionId,
        user_id: UserId,
    ) -> Result<Decision, OpsError> {
        let mut decision = self.load_owned(decision_id, user_id).await?;
        if let Err(e) = decision.cancel(self.clock.now()) {
            self.persist_if_expired(&decision, &e).await?;
            return Err(e.into());
        }
        self.decisions.save(&decision).await?;
        Ok(decision)
    }

    /// Extend an active decision's deadline by up to 72 hours.
    pub async fn extend_deadline(
        &self,
        decision_id: DecisionId,
        user_id: UserId,
        hours: i64,
    ) -> Result<Decision, OpsError> {
        let mut decision = self.load_owned(decision_id, user_id).await?;
        let now = self.clock.now();
        if let Err(e) = decision.extend_deadline(hours, now) {
            self.persist_if_expired(&decision, &e).await?;
            return Err(e.into());
        }
        self.decisions.save(&decision).await?;
        Ok(decision)
    }

    /// Read-only eligibility check for one option.
    pub async fn check_eligibility(
        &self,
        decision_id: DecisionId,
        option_id: OptionId,
        user_id: UserId,
    ) -> Result<EligibilityReport, OpsError> {
        let decision = self.load_decision(decision_id).await?;
        let snapshot = self.load_snapshot(decision.character_id(), user_id).await?;
        let option = decision
            .option(option_id)
            .ok_or_else(|| DomainError::not_found("DecisionOption", option_id.to_string()))?;
        Ok(eligibility::evaluate(&snapshot, option))
    }

    // === Helpers ===

    async fn load_decision(&self, decision_id: DecisionId) -> Result<Decision, OpsError> {
        self.decisions
            .get(decision_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Decision", decision_id.to_string()).into())
    }

    async fn load_owned(
        &self,
        decision_id: DecisionId,
        user_id: UserId,
    ) -> Result<Decision, OpsError> {
        let decision = self.load_decision(decision_id).await?;
        if decision.user_id() != user_id {
            return Err(DomainError::forbidden("decision belongs to another user").into());
        }
        Ok(decision)
    }

    async fn load_snapshot(
        &self,
        character_id: domain::CharacterId,
        user_id: UserId,
    ) -> Result<CharacterSnapshot, OpsError> {
        let record = self
            .characters
            .get(character_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Character", character_id.to_string()))?;
        if record.owner != user_id {
            return Err(DomainError::forbidden("character belongs to another user").into());
        }
        Ok(record.snapshot)
    }

    async fn require_membership(
        &self,
        narrative_id: domain::NarrativeId,
        user_id: UserId,
    ) -> Result<NarrativeRecord, OpsError> {
        let narrative = self
            .narratives
            .get(narrative_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Narrative", narrative_id.to_string()))?;
        if !narrative.is_active_member(user_id) {
            return Err(DomainError::forbidden("user is not an active narrative member").into());
        }
        Ok(narrative)
    }

    fn require_active_character(
        &self,
        narrative: &NarrativeRecord,
        character_id: domain::CharacterId,
    ) -> Result<(), OpsError> {
        if !narrative.is_active_character(character_id) {
            return Err(
                DomainError::invalid_state("character is not active in this narrative").into(),
            );
        }
        Ok(())
    }

    /// Persist the lazy expiry transition before surfacing the error.
    async fn persist_if_expired(
        &self,
        decision: &Decision,
        error: &DomainError,
    ) -> Result<(), OpsError> {
        if error.is_expired() && decision.status() == DecisionStatus::Expired {
            self.decisions.save(decision).await?;
        }
        Ok(())
    }

    async fn generate_outcomes(
        &self,
        title: &str,
        option: &domain::DecisionOption,
    ) -> Vec<Outcome> {
        let request = ContentRequest::new(outcome_prompt(title, option))
            .with_system_prompt(decision_system_prompt())
            .with_temperature(0.7);
        match self.content.generate(request).await {
            Ok(content) => match parse_outcomes(&content.text) {
                Some(outcomes) => outcomes,
                None => {
                    tracing::warn!("generated outcomes did not parse, using fallback outcome");
                    fallback_outcome(option)
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "outcome generation failed, using fallback outcome");
                fallback_outcome(option)
            }
        }
    }
}
