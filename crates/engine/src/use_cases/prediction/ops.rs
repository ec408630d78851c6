//! Prediction lifecycle operations.

use std::sync::Arc;

use plotweave_domain::{
    self as domain, DomainError, Prediction, PredictionId, PredictionStatus, Selection, UserId,
};

use crate::infrastructure::ports::{
    CharacterRepo, ClockPort, ContentPort, ContentRequest, NarrativeRecord, NarrativeRepo,
    NewsPort, PredictionRepo,
};
use crate::use_cases::error::OpsError;

use super::generate::{
    fallback_prediction, parse_prediction, parse_resolution, prediction_prompt,
    prediction_system_prompt, resolution_prompt,
};
use super::types::{CreatePredictionInput, GeneratePredictionInput, ResolutionResult};

const DEFAULT_CREATE_DAYS: i64 = 7;
const DEFAULT_GENERATE_DAYS: i64 = 14;

/// Articles fed into the automatic resolution analysis.
const RESOLUTION_ARTICLE_LIMIT: usize = 5;

pub struct PredictionOps {
    predictions: Arc<dyn PredictionRepo>,
    characters: Arc<dyn CharacterRepo>,
    narratives: Arc<dyn NarrativeRepo>,
    content: Arc<dyn ContentPort>,
    news: Arc<dyn NewsPort>,
    clock: Arc<dyn ClockPort>,
}

impl PredictionOps {
    pub fn new(
        predictions: Arc<dyn PredictionRepo>,
        characters: Arc<dyn CharacterRepo>,
        narratives: Arc<dyn NarrativeRepo>,
        content: Arc<dyn ContentPort>,
        news: Arc<dyn NewsPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            predictions,
            characters,
            narratives,
            content,
            news,
            clock,
        }
    }

    /// Create a prediction manually. Open to voting immediately.
    pub async fn create(&self, input: CreatePredictionInput) -> Result<Prediction, OpsError> {
        let narrative = self
            .require_membership(input.narrative_id, input.user_id)
            .await?;
        self.require_owned_character(input.character_id, input.user_id)
            .await?;
        self.require_active_character(&narrative, input.character_id)?;

        let now = self.clock.now();
        let mut prediction = Prediction::new(
            input.user_id,
            input.character_id,
            input.narrative_id,
            input.title,
            input.options,
            input.difficulty,
            input.confidence,
            input.stake_amount,
            now,
            input.days_to_resolve.unwrap_or(DEFAULT_CREATE_DAYS),
        )?;
        if let Some(category) = input.category {
            prediction = prediction.with_category(category);
        }
        if let Some(decision_id) = input.decision_id {
            prediction = prediction.with_decision(decision_id);
        }

        self.predictions.save(&prediction).await?;
        Ok(prediction)
    }

    /// Generate a prediction of the requested type about a topic.
    ///
    /// Generation failure falls back to the fixed template for that type.
    pub async fn generate(&self, input: GeneratePredictionInput) -> Result<Prediction, OpsError> {
        let narrative = self
            .require_membership(input.narrative_id, input.user_id)
            .await?;
        self.require_owned_character(input.character_id, input.user_id)
            .await?;
        self.require_active_character(&narrative, input.character_id)?;

        let now = self.clock.now();
        let request = ContentRequest::new(prediction_prompt(
            input.kind,
            &input.topic,
            input.difficulty,
        ))
        .with_system_prompt(prediction_system_prompt())
        .with_temperature(0.8);

        let generated = match self.content.generate(request).await {
            Ok(content) => match parse_prediction(&content.text, input.kind) {
                Some(generated) => generated,
                None => {
                    tracing::warn!(
                        kind = input.kind.as_str(),
                        "generated prediction did not parse, using fallback template"
                    );
                    fallback_prediction(input.kind, &input.topic, now)
                }
            },
            Err(e) => {
                tracing::warn!(
                    kind = input.kind.as_str(),
                    error = %e,
                    "prediction generation failed, using fallback template"
                );
                fallback_prediction(input.kind, &input.topic, now)
            }
        };

        let prediction = Prediction::new(
            input.user_id,
            input.character_id,
            input.narrative_id,
            generated.title,
            generated.options,
            input.difficulty,
            generated.confidence,
            input.stake_amount,
            now,
            input.days_to_resolve.unwrap_or(DEFAULT_GENERATE_DAYS),
        )?
        .with_category(generated.category);

        self.predictions.save(&prediction).await?;
        Ok(prediction)
    }

    /// Record or replace a narrative member's vote.
    pub async fn vote(
        &self,
        prediction_id: PredictionId,
        user_id: UserId,
        selection: Selection,
        amount: u32,
    ) -> Result<Prediction, OpsError> {
        let mut prediction = self.load_prediction(prediction_id).await?;
        self.require_membership(prediction.narrative_id(), user_id)
            .await?;

        let now = self.clock.now();
        if let Err(e) = prediction.record_vote(user_id, selection, amount, now) {
            self.persist_if_expired(&prediction, &e).await?;
            return Err(e.into());
        }
        self.predictions.save(&prediction).await?;
        Ok(prediction)
    }

    /// Resolve a prediction manually (creator only), returning the ledger.
    pub async fn resolve(
        &self,
        prediction_id: PredictionId,
        user_id: UserId,
        correct: Selection,
        explanation: String,
    ) -> Result<ResolutionResult, OpsError> {
        let mut prediction = self.load_owned(prediction_id, user_id).await?;

        let now = self.clock.now();
        let rewards = match prediction.resolve(correct, explanation, user_id, None, now) {
            Ok(rewards) => rewards,
            Err(e) => {
                self.persist_if_expired(&prediction, &e).await?;
                return Err(e.into());
            }
        };
        self.predictions.save(&prediction).await?;
        Ok(ResolutionResult {
            prediction,
            rewards,
        })
    }

    /// Resolve automatically against recent news.
    ///
    /// An overdue prediction expires (and persists) before any external
    /// call is made. Past that point any failure (news lookup, analysis,
    /// verdict parsing) surfaces as `ResolutionUnavailable` and leaves the
    /// prediction open; unlike generation there is no deterministic
    /// stand-in for a verdict.
    pub async fn auto_resolve(
        &self,
        prediction_id: PredictionId,
        user_id: UserId,
    ) -> Result<ResolutionResult, OpsError> {
        let mut prediction = self.load_owned(prediction_id, user_id).await?;
        let now = self.clock.now();
        if prediction.expire_if_overdue(now) {
            self.predictions.save(&prediction).await?;
            return Err(DomainError::expired(prediction.deadline()).into());
        }
        if prediction.status() != PredictionStatus::Active {
            return Err(DomainError::invalid_state(format!(
                "cannot resolve a {} prediction",
                prediction.status().as_str()
            ))
            .into());
        }

        let query = if prediction.category().is_empty() {
            prediction.title().to_string()
        } else {
            format!("{} {}", prediction.category(), prediction.title())
        };
        let articles = self
            .news
            .search(&query, RESOLUTION_ARTICLE_LIMIT)
            .await
            .map_err(|e| OpsError::resolution_unavailable(e.to_string()))?;
        if articles.is_empty() {
            return Err(OpsError::resolution_unavailable(
                "no recent articles matched the prediction",
            ));
        }

        let request = ContentRequest::new(resolution_prompt(
            prediction.title(),
            prediction.options(),
            &articles,
        ))
        .with_system_prompt(prediction_system_prompt())
        .with_temperature(0.2);
        let content = self
            .content
            .generate(request)
            .await
            .map_err(|e| OpsError::resolution_unavailable(e.to_string()))?;
        let verdict = parse_resolution(&content.text, prediction.options()).ok_or_else(|| {
            OpsError::resolution_unavailable("analysis did not produce a confident verdict")
        })?;

        let rewards = match prediction.resolve(
            verdict.correct,
            verdict.explanation,
            user_id,
            Some(verdict.accuracy),
            now,
        ) {
            Ok(rewards) => rewards,
            Err(e) => {
                self.persist_if_expired(&prediction, &e).await?;
                return Err(e.into());
            }
        };
        self.predictions.save(&prediction).await?;
        Ok(ResolutionResult {
            prediction,
            rewards,
        })
    }

    /// Cancel a prediction (creator only), returning the refund ledger.
    pub async fn cancel(
        &self,
        prediction_id: PredictionId,
        user_id: UserId,
        reason: String,
    ) -> Result<ResolutionResult, OpsError> {
        let mut prediction = self.load_owned(prediction_id, user_id).await?;
        let rewards = match prediction.cancel(reason, self.clock.now()) {
            Ok(rewards) => rewards,
            Err(e) => {
                self.persist_if_expired(&prediction, &e).await?;
                return Err(e.into());
            }
        };
        self.predictions.save(&prediction).await?;
        Ok(ResolutionResult {
            prediction,
            rewards,
        })
    }

    // === Helpers ===

    async fn load_prediction(&self, prediction_id: PredictionId) -> Result<Prediction, OpsError> {
        self.predictions
            .get(prediction_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Prediction", prediction_id.to_string()).into())
    }

    async fn load_owned(
        &self,
        prediction_id: PredictionId,
        user_id: UserId,
    ) -> Result<Prediction, OpsError> {
        let prediction = self.load_prediction(prediction_id).await?;
        if prediction.user_id() != user_id {
            return Err(DomainError::forbidden("prediction belongs to another user").into());
        }
        Ok(prediction)
    }

    async fn require_owned_character(
        &self,
        character_id: domain::CharacterId,
        user_id: UserId,
    ) -> Result<(), OpsError> {
        let record = self
            .characters
            .get(character_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Character", character_id.to_string()))?;
        if record.owner != user_id {
            return Err(DomainError::forbidden("character belongs to another user").into());
        }
        Ok(())
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
        prediction: &Prediction,
        error: &DomainError,
    ) -> Result<(), OpsError> {
        if error.is_expired() && prediction.status() == PredictionStatus::Expired {
            self.predictions.save(prediction).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use plotweave_domain::{
        CharacterId, CharacterSnapshot, Difficulty, NarrativeId, PredictionKind,
        PredictionOptions, RewardEntry,
    };

    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{
        CharacterRecord, GeneratedContent, GenerationError, MockCharacterRepo, MockContentPort,
        MockNarrativeRepo, MockNewsPort, MockPredictionRepo, NarrativeRecord, NewsArticle,
        NewsError,
    };

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().expect("valid timestamp")
    }

    struct Fixture {
        user_id: UserId,
        character_id: CharacterId,
        narrative_id: NarrativeId,
        predictions: MockPredictionRepo,
        characters: MockCharacterRepo,
        narratives: MockNarrativeRepo,
        content: MockContentPort,
        news: MockNewsPort,
        now: DateTime<Utc>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                user_id: UserId::new(),
                character_id: CharacterId::new(),
                narrative_id: NarrativeId::new(),
                predictions: MockPredictionRepo::new(),
                characters: MockCharacterRepo::new(),
                narratives: MockNarrativeRepo::new(),
                content: MockContentPort::new(),
                news: MockNewsPort::new(),
                now: t0(),
            }
        }

        fn with_member_narrative(mut self, extra_members: Vec<UserId>) -> Self {
            let mut members = vec![self.user_id];
            members.extend(extra_members);
            let record = NarrativeRecord {
                id: self.narrative_id,
                title: "City Desk".to_string(),
                premise: "A newsroom drama".to_string(),
                members,
                active_characters: vec![self.character_id],
            };
            self.narratives
                .expect_get()
                .returning(move |_| Ok(Some(record.clone())));
            self
        }

        fn with_character(mut self) -> Self {
            let record = CharacterRecord {
                id: self.character_id,
                owner: self.user_id,
                name: "Vesna".to_string(),
                snapshot: CharacterSnapshot::new(),
            };
            self.characters
                .expect_get()
                .returning(move |_| Ok(Some(record.clone())));
            self
        }

        fn with_stored_prediction(mut self, prediction: Prediction) -> Self {
            self.predictions
                .expect_get()
                .returning(move |_| Ok(Some(prediction.clone())));
            self
        }

        fn expect_saves(mut self, times: usize) -> Self {
            self.predictions
                .expect_save()
                .times(times)
                .returning(|_| Ok(()));
            self
        }

        fn ops(self) -> PredictionOps {
            PredictionOps::new(
                Arc::new(self.predictions),
                Arc::new(self.characters),
                Arc::new(self.narratives),
                Arc::new(self.content),
                Arc::new(self.news),
                Arc::new(FixedClock(self.now)),
            )
        }
    }

    fn binary_prediction(fixture: &Fixture) -> Prediction {
        Prediction::new(
            fixture.user_id,
            fixture.character_id,
            fixture.narrative_id,
            "Will the merger close this quarter?",
            PredictionOptions::Binary {
                options: vec!["Yes".to_string(), "No".to_string()],
            },
            Difficulty::Medium,
            60,
            20,
            t0(),
            7,
        )
        .expect("valid prediction")
    }

    #[tokio::test]
    async fn test_create_defaults_to_seven_days() {
        let fixture = Fixture::new()
            .with_member_narrative(Vec::new())
            .with_character()
            .expect_saves(1);
        let narrative_id = fixture.narrative_id;
        let character_id = fixture.character_id;
        let user_id = fixture.user_id;
        let ops = fixture.ops();

        let prediction = ops
            .create(CreatePredictionInput {
                narrative_id,
                character_id,
                user_id,
                decision_id: None,
                title: "Will the strike end?".to_string(),
                category: Some("labor".to_string()),
                options: PredictionOptions::Binary {
                    options: vec!["Yes".to_string(), "No".to_string()],
                },
                difficulty: Difficulty::Medium,
                confidence: 70,
                stake_amount: 15,
                days_to_resolve: None,
            })
            .await
            .expect("create");
        assert_eq!(prediction.status(), PredictionStatus::Active);
        assert_eq!(prediction.deadline(), t0() + chrono::Duration::days(7));
        assert_eq!(prediction.category(), "labor");
    }

    #[tokio::test]
    async fn test_generate_falls_back_per_type() {
        let mut fixture = Fixture::new()
            .with_member_narrative(Vec::new())
            .with_character()
            .expect_saves(1);
        fixture
            .content
            .expect_generate()
            .returning(|_| Err(GenerationError::RequestFailed("down".to_string())));
        let narrative_id = fixture.narrative_id;
        let character_id = fixture.character_id;
        let user_id = fixture.user_id;
        let ops = fixture.ops();

        let prediction = ops
            .generate(GeneratePredictionInput {
                narrative_id,
                character_id,
                user_id,
                kind: PredictionKind::Range,
                topic: "voter turnout".to_string(),
                difficulty: Difficulty::Hard,
                stake_amount: 10,
                days_to_resolve: None,
            })
            .await
            .expect("fallback template");
        assert_eq!(prediction.kind(), PredictionKind::Range);
        assert_eq!(prediction.deadline(), t0() + chrono::Duration::days(14));
    }

    #[tokio::test]
    async fn test_vote_requires_narrative_membership() {
        let fixture = Fixture::new();
        let prediction = binary_prediction(&fixture);
        let prediction_id = prediction.id();
        let fixture = fixture
            .with_member_narrative(Vec::new())
            .with_stored_prediction(prediction);
        let ops = fixture.ops();

        let err = ops
            .vote(
                prediction_id,
                UserId::new(), // not a member
                Selection::Option { index: 0 },
                10,
            )
            .await
            .expect_err("outsider");
        assert!(matches!(
            err,
            OpsError::Domain(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_manual_resolution_returns_reward_ledger() {
        let fixture = Fixture::new();
        let voter = UserId::new();
        let mut prediction = binary_prediction(&fixture);
        prediction
            .record_vote(voter, Selection::Option { index: 0 }, 20, t0())
            .expect("vote");
        let prediction_id = prediction.id();
        let user_id = fixture.user_id;
        let fixture = fixture.with_stored_prediction(prediction).expect_saves(1);
        let ops = fixture.ops();

        let result = ops
            .resolve(
                prediction_id,
                user_id,
                Selection::Option { index: 0 },
                "The merger closed.".to_string(),
            )
            .await
            .expect("resolve");
        assert_eq!(
            result.rewards,
            vec![RewardEntry {
                user_id: voter,
                amount: 30
            }]
        );
        assert_eq!(result.prediction.status(), PredictionStatus::Resolved);
    }

    #[tokio::test]
    async fn test_auto_resolve_surfaces_unavailable_on_news_failure() {
        let mut fixture = Fixture::new();
        let prediction = binary_prediction(&fixture);
        let prediction_id = prediction.id();
        let user_id = fixture.user_id;
        fixture
            .news
            .expect_search()
            .returning(|_, _| Err(NewsError::RequestFailed("quota exceeded".to_string())));
        // No save expectation: state must not change
        let fixture = fixture.with_stored_prediction(prediction);
        let ops = fixture.ops();

        let err = ops
            .auto_resolve(prediction_id, user_id)
            .await
            .expect_err("news down");
        assert!(matches!(err, OpsError::ResolutionUnavailable(_)));
    }

    #[tokio::test]
    async fn test_auto_resolve_applies_parsed_verdict() {
        let mut fixture = Fixture::new();
        let voter = UserId::new();
        let mut prediction = binary_prediction(&fixture);
        prediction
            .record_vote(voter, Selection::Option { index: 1 }, 10, t0())
            .expect("vote");
        let prediction_id = prediction.id();
        let user_id = fixture.user_id;

        fixture.news.expect_search().returning(|_, _| {
            Ok(vec![NewsArticle {
                title: "Merger talks collapse".to_string(),
                description: "Negotiations ended without a deal.".to_string(),
                source: "Wire".to_string(),
                published_at: None,
                url: "https://example.com/a".to_string(),
            }])
        });
        fixture.content.expect_generate().returning(|_| {
            Ok(GeneratedContent {
                text: r#"{"correct": {"type": "option", "index": 1}, "explanation": "Talks collapsed.", "accuracy": 0.9}"#
                    .to_string(),
                prompt_tokens: None,
                completion_tokens: None,
            })
        });
        let fixture = fixture.with_stored_prediction(prediction).expect_saves(1);
        let ops = fixture.ops();

        let result = ops
            .auto_resolve(prediction_id, user_id)
            .await
            .expect("auto resolve");
        assert_eq!(result.prediction.status(), PredictionStatus::Resolved);
        // The "No" voter staked 10 at medium: round(10 * 1.5) = 15
        assert_eq!(
            result.rewards,
            vec![RewardEntry {
                user_id: voter,
                amount: 15
            }]
        );
        let resolution = result.prediction.resolution().expect("recorded");
        assert_eq!(resolution.accuracy, Some(0.9));
    }

    #[tokio::test]
    async fn test_cancel_returns_refund_ledger() {
        let fixture = Fixture::new();
        let u1 = UserId::new();
        let u2 = UserId::new();
        let mut prediction = binary_prediction(&fixture);
        prediction
            .record_vote(u1, Selection::Option { index: 0 }, 30, t0())
            .expect("vote");
        prediction
            .record_vote(u2, Selection::Option { index: 1 }, 10, t0())
            .expect("vote");
        let prediction_id = prediction.id();
        let user_id = fixture.user_id;
        let fixture = fixture.with_stored_prediction(prediction).expect_saves(1);
        let ops = fixture.ops();

        let result = ops
            .cancel(prediction_id, user_id, "scene was rewritten".to_string())
            .await
            .expect("cancel");
        assert_eq!(
            result.rewards,
            vec![
                RewardEntry {
                    user_id: u1,
                    amount: 30
                },
                RewardEntry {
                    user_id: u2,
                    amount: 10
                },
            ]
        );
        assert_eq!(result.prediction.status(), PredictionStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_after_deadline_persists_expiry() {
        let mut fixture = Fixture::new();
        let mut prediction = binary_prediction(&fixture);
        prediction
            .record_vote(UserId::new(), Selection::Option { index: 0 }, 25, t0())
            .expect("vote");
        let prediction_id = prediction.id();
        let user_id = fixture.user_id;

        fixture.now = t0() + chrono::Duration::days(10);
        let fixture = fixture.with_stored_prediction(prediction).expect_saves(1); // the expiry transition is persisted
        let ops = fixture.ops();

        let err = ops
            .cancel(prediction_id, user_id, "too late".to_string())
            .await
            .expect_err("overdue predictions expire instead of cancelling");
        assert!(matches!(
            err,
            OpsError::Domain(DomainError::Expired { .. })
        ));
    }

    #[tokio::test]
    async fn test_auto_resolve_expires_overdue_prediction_without_external_calls() {
        let mut fixture = Fixture::new();
        let prediction = binary_prediction(&fixture);
        let prediction_id = prediction.id();
        let user_id = fixture.user_id;

        // News and content mocks carry no expectations: touching either
        // after the deadline is a bug.
        fixture.now = t0() + chrono::Duration::days(10);
        let fixture = fixture.with_stored_prediction(prediction).expect_saves(1);
        let ops = fixture.ops();

        let err = ops
            .auto_resolve(prediction_id, user_id)
            .await
            .expect_err("deadline passed");
        assert!(matches!(
            err,
            OpsError::Domain(DomainError::Expired { .. })
        ));
    }
}
