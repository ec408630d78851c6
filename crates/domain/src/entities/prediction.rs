//! Prediction entity - a wagered forecast resolved against real-world events
//!
//! Predictions are open to voting from creation until their deadline. Votes
//! upsert per user (no double counting). Resolution pays winning votes via
//! the reward calculator and returns a ledger; cancellation refunds every
//! stake in full. Once `resolved` or `cancelled` the status is immutable.
//!
//! The five prediction types each carry a different options shape, modeled
//! as a tagged union so shape validation happens at the boundary instead of
//! string checks scattered through the lifecycle logic.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::rewards::{self, RewardEntry};
use crate::{CharacterId, DecisionId, NarrativeId, PredictionId, UserId};

/// Prediction difficulty, driving both reward multiplier tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Extreme,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Extreme => "extreme",
        }
    }
}

/// Prediction lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Pending,
    Active,
    Resolved,
    Expired,
    Cancelled,
}

impl PredictionStatus {
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

/// Discriminant for the five prediction types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionKind {
    Binary,
    Multiple,
    Range,
    Time,
    Compound,
}

impl PredictionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Multiple => "multiple",
            Self::Range => "range",
            Self::Time => "time",
            Self::Compound => "compound",
        }
    }
}

/// Type-specific options shape, tagged by prediction type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PredictionOptions {
    /// Exactly two mutually exclusive outcomes
    Binary { options: Vec<String> },
    /// Two to eight discrete outcomes
    Multiple { options: Vec<String> },
    /// A numeric answer within [min, max]
    Range { min: f64, max: f64, unit: String },
    /// A date answer within [earliest, latest]
    Time {
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    },
    /// A set of conditions; voters pick which will hold
    Compound { conditions: Vec<String> },
}

impl PredictionOptions {
    pub fn kind(&self) -> PredictionKind {
        match self {
            Self::Binary { .. } => PredictionKind::Binary,
            Self::Multiple { .. } => PredictionKind::Multiple,
            Self::Range { .. } => PredictionKind::Range,
            Self::Time { .. } => PredictionKind::Time,
            Self::Compound { .. } => PredictionKind::Compound,
        }
    }

    /// Validate the shape itself (called at the creation boundary).
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            Self::Binary { options } => {
                if options.len() != 2 {
                    return Err(DomainError::invalid_input(format!(
                        "binary predictions require exactly 2 options, got {}",
                        options.len()
                    )));
                }
            }
            Self::Multiple { options } => {
                if !(2..=8).contains(&options.len()) {
                    return Err(DomainError::invalid_input(format!(
                        "multiple-choice predictions require 2-8 options, got {}",
                        options.len()
                    )));
                }
            }
            Self::Range { min, max, .. } => {
                if !min.is_finite() || !max.is_finite() || min >= max {
                    return Err(DomainError::invalid_input(format!(
                        "range predictions require min < max, got [{min}, {max}]"
                    )));
                }
            }
            Self::Time { earliest, latest } => {
                if earliest >= latest {
                    return Err(DomainError::invalid_input(
                        "time predictions require earliest < latest",
                    ));
                }
            }
            Self::Compound { conditions } => {
                if conditions.is_empty() || conditions.len() > 8 {
                    return Err(DomainError::invalid_input(format!(
                        "compound predictions require 1-8 conditions, got {}",
                        conditions.len()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validate a selection against this shape.
    pub fn validate_selection(&self, selection: &Selection) -> Result<(), DomainError> {
        match (self, selection) {
            (Self::Binary { options } | Self::Multiple { options }, Selection::Option { index }) => {
                if *index >= options.len() {
                    return Err(DomainError::invalid_input(format!(
                        "option index {index} out of range (0-{})",
                        options.len() - 1
                    )));
                }
            }
            (Self::Range { min, max, .. }, Selection::Value { value }) => {
                if !value.is_finite() || value < min || value > max {
                    return Err(DomainError::invalid_input(format!(
                        "value {value} outside the range [{min}, {max}]"
                    )));
                }
            }
            (Self::Time { earliest, latest }, Selection::Date { date }) => {
                if date < earliest || date > latest {
                    return Err(DomainError::invalid_input(format!(
                        "date {date} outside [{earliest}, {latest}]"
                    )));
                }
            }
            (Self::Compound { conditions }, Selection::Conditions { indices }) => {
                if indices.is_empty() {
                    return Err(DomainError::invalid_input(
                        "compound selections must name at least one condition",
                    ));
                }
                let mut seen = indices.clone();
                seen.sort_unstable();
                seen.dedup();
                if seen.len() != indices.len() {
                    return Err(DomainError::invalid_input(
                        "compound selections must not repeat condition indices",
                    ));
                }
                if let Some(bad) = indices.iter().find(|&&i| i >= conditions.len()) {
                    return Err(DomainError::invalid_input(format!(
                        "condition index {bad} out of range (0-{})",
                        conditions.len() - 1
                    )));
                }
            }
            _ => {
                return Err(DomainError::invalid_input(format!(
                    "selection shape does not match a {} prediction",
                    self.kind().as_str()
                )));
            }
        }
        Ok(())
    }

    /// Does a vote's selection match the correct selection?
    ///
    /// Index selections match by equality. Range votes match within 5% of
    /// the declared span, time votes within 24 hours, and compound votes
    /// must name exactly the correct condition set.
    pub fn selection_matches(&self, vote: &Selection, correct: &Selection) -> bool {
        match (self, vote, correct) {
            (
                Self::Binary { .. } | Self::Multiple { .. },
                Selection::Option { index: a },
                Selection::Option { index: b },
            ) => a == b,
            (
                Self::Range { min, max, .. },
                Selection::Value { value: a },
                Selection::Value { value: b },
            ) => (a - b).abs() <= (max - min) * 0.05,
            (Self::Time { .. }, Selection::Date { date: a }, Selection::Date { date: b }) => {
                (*a - *b).num_hours().abs() <= 24
            }
            (
                Self::Compound { .. },
                Selection::Conditions { indices: a },
                Selection::Conditions { indices: b },
            ) => {
                let mut a = a.clone();
                let mut b = b.clone();
                a.sort_unstable();
                b.sort_unstable();
                a == b
            }
            _ => false,
        }
    }
}

/// A voter's answer, shape-checked against the prediction's options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Selection {
    Option { index: usize },
    Value { value: f64 },
    Date { date: DateTime<Utc> },
    Conditions { indices: Vec<usize> },
}

/// One user's stake on a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub user_id: UserId,
    pub selection: Selection,
    pub amount: u32,
    pub voted_at: DateTime<Utc>,
}

/// How a prediction was judged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub correct: Selection,
    pub explanation: String,
    pub resolved_at: DateTime<Utc>,
    pub resolved_by: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

/// Why and when a prediction was cancelled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

/// A wagered forecast owned by the creating user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    id: PredictionId,
    user_id: UserId,
    character_id: CharacterId,
    narrative_id: NarrativeId,
    decision_id: Option<DecisionId>,
    title: String,
    category: String,
    options: PredictionOptions,
    difficulty: Difficulty,
    /// Creator's confidence, 0-100
    confidence: u32,
    stake_amount: u32,
    status: PredictionStatus,
    created_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
    votes: Vec<Vote>,
    resolution: Option<Resolution>,
    cancellation: Option<Cancellation>,
    /// Version marker for the storage layer's optimistic concurrency
    updated_at: DateTime<Utc>,
}

impl Prediction {
    /// Create a new prediction, immediately open to voting (`active`).
    ///
    /// `deadline = created_at + days_to_resolve * 86400s`. The options shape
    /// is validated here so nothing malformed enters the state machine.
    pub fn new(
        user_id: UserId,
        character_id: CharacterId,
        narrative_id: NarrativeId,
        title: impl Into<String>,
        options: PredictionOptions,
        difficulty: Difficulty,
        confidence: u32,
        stake_amount: u32,
        created_at: DateTime<Utc>,
        days_to_resolve: i64,
    ) -> Result<Self, DomainError> {
        options.validate()?;
        if !(1..=365).contains(&days_to_resolve) {
            return Err(DomainError::invalid_input(format!(
                "days to resolve must be between 1 and 365, got {days_to_resolve}"
            )));
        }
        if confidence > 100 {
            return Err(DomainError::invalid_input(format!(
                "confidence must be 0-100, got {confidence}"
            )));
        }
        Ok(Self {
            id: PredictionId::new(),
            user_id,
            character_id,
            narrative_id,
            decision_id: None,
            title: title.into(),
            category: String::new(),
            options,
            difficulty,
            confidence,
            stake_amount,
            status: PredictionStatus::Active,
            created_at,
            deadline: created_at + Duration::seconds(days_to_resolve * 86_400),
            votes: Vec::new(),
            resolution: None,
            cancellation: None,
            updated_at: created_at,
        })
    }

    // === Accessors ===

    pub fn id(&self) -> PredictionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn character_id(&self) -> CharacterId {
        self.character_id
    }

    pub fn narrative_id(&self) -> NarrativeId {
        self.narrative_id
    }

    pub fn decision_id(&self) -> Option<DecisionId> {
        self.decision_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn options(&self) -> &PredictionOptions {
        &self.options
    }

    pub fn kind(&self) -> PredictionKind {
        self.options.kind()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn confidence(&self) -> u32 {
        self.confidence
    }

    pub fn stake_amount(&self) -> u32 {
        self.stake_amount
    }

    pub fn status(&self) -> PredictionStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    /// Distinct-voter count (votes upsert per user).
    pub fn participant_count(&self) -> usize {
        self.votes.len()
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    pub fn cancellation(&self) -> Option<&Cancellation> {
        self.cancellation.as_ref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Generation-time reward estimate for the creator's own stake.
    pub fn estimated_reward(&self, accuracy: f64) -> u32 {
        rewards::estimated_reward(self.stake_amount, self.difficulty, self.confidence, accuracy)
    }

    // === Builder Methods ===

    /// Set the prediction ID (used when loading from storage).
    pub fn with_id(mut self, id: PredictionId) -> Self {
        self.id = id;
        self
    }

    pub fn with_decision(mut self, decision_id: DecisionId) -> Self {
        self.decision_id = Some(decision_id);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    // === State Transitions ===

    /// Lazily expire the prediction if its deadline has passed.
    ///
    /// Returns true when a transition happened (caller must persist).
    pub fn expire_if_overdue(&mut self, now: DateTime<Utc>) -> bool {
        if matches!(
            self.status,
            PredictionStatus::Pending | PredictionStatus::Active
        ) && now > self.deadline
        {
            self.status = PredictionStatus::Expired;
            self.updated_at = now;
            true
        } else {
            false
        }
    }

    /// Record (or replace) a user's vote.
    ///
    /// Idempotent per user: a second vote replaces the first, so the vote
    /// list always holds one entry per distinct voter. Stake must be within
    /// [1, 100] and the selection must match the prediction's options shape.
    pub fn record_vote(
        &mut self,
        user_id: UserId,
        selection: Selection,
        amount: u32,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.status != PredictionStatus::Active {
            return Err(DomainError::invalid_state(format!(
                "cannot vote on a {} prediction",
                self.status.as_str()
            )));
        }
        if now > self.deadline {
            self.status = PredictionStatus::Expired;
            self.updated_at = now;
            return Err(DomainError::expired(self.deadline));
        }
        if !(1..=100).contains(&amount) {
            return Err(DomainError::invalid_input(format!(
                "stake must be between 1 and 100, got {amount}"
            )));
        }
        self.options.validate_selection(&selection)?;

        let vote = Vote {
            user_id,
            selection,
            amount,
            voted_at: now,
        };
        if let Some(existing) = self.votes.iter_mut().find(|v| v.user_id == user_id) {
            *existing = vote;
        } else {
            self.votes.push(vote);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Resolve against the correct selection, returning the reward ledger.
    ///
    /// Winning votes pay `vote_reward(amount, difficulty)`; losing votes
    /// forfeit their stake with no further penalty. This does not mutate any
    /// user balance - the caller applies the ledger.
    pub fn resolve(
        &mut self,
        correct: Selection,
        explanation: impl Into<String>,
        resolved_by: UserId,
        accuracy: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<RewardEntry>, DomainError> {
        if self.status != PredictionStatus::Active {
            return Err(DomainError::invalid_state(format!(
                "cannot resolve a {} prediction",
                self.status.as_str()
            )));
        }
        if now > self.deadline {
            self.status = PredictionStatus::Expired;
            self.updated_at = now;
            return Err(DomainError::expired(self.deadline));
        }
        self.options.validate_selection(&correct)?;

        let ledger = self
            .votes
            .iter()
            .filter(|vote| self.options.selection_matches(&vote.selection, &correct))
            .map(|vote| RewardEntry {
                user_id: vote.user_id,
                amount: rewards::vote_reward(vote.amount, self.difficulty),
            })
            .collect();

        self.status = PredictionStatus::Resolved;
        self.resolution = Some(Resolution {
            correct,
            explanation: explanation.into(),
            resolved_at: now,
            resolved_by,
            accuracy,
        });
        self.updated_at = now;
        Ok(ledger)
    }

    /// Cancel the prediction, returning a full-stake refund ledger.
    ///
    /// An overdue prediction expires instead: stakes on an expired
    /// prediction are forfeit, not refunded.
    pub fn cancel(
        &mut self,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<RewardEntry>, DomainError> {
        if self.expire_if_overdue(now) {
            return Err(DomainError::expired(self.deadline));
        }
        if !matches!(
            self.status,
            PredictionStatus::Pending | PredictionStatus::Active
        ) {
            return Err(DomainError::invalid_state(format!(
                "cannot cancel a {} prediction",
                self.status.as_str()
            )));
        }
        let refunds = self
            .votes
            .iter()
            .map(|vote| RewardEntry {
                user_id: vote.user_id,
                amount: vote.amount,
            })
            .collect();
        self.status = PredictionStatus::Cancelled;
        self.cancellation = Some(Cancellation {
            reason: reason.into(),
            cancelled_at: now,
        });
        self.updated_at = now;
        Ok(refunds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().expect("valid timestamp")
    }

    fn binary_prediction(difficulty: Difficulty) -> Prediction {
        Prediction::new(
            UserId::new(),
            CharacterId::new(),
            NarrativeId::new(),
            "Will the merger close this quarter?",
            PredictionOptions::Binary {
                options: vec!["Yes".to_string(), "No".to_string()],
            },
            difficulty,
            60,
            20,
            t0(),
            7,
        )
        .expect("valid prediction")
    }

    #[test]
    fn test_new_prediction_is_active_with_computed_deadline() {
        let prediction = binary_prediction(Difficulty::Medium);
        assert_eq!(prediction.status(), PredictionStatus::Active);
        assert_eq!(prediction.deadline(), t0() + Duration::days(7));
    }

    #[test]
    fn test_binary_options_shape_enforced() {
        let err = Prediction::new(
            UserId::new(),
            CharacterId::new(),
            NarrativeId::new(),
            "Malformed",
            PredictionOptions::Binary {
                options: vec!["Only one".to_string()],
            },
            Difficulty::Easy,
            50,
            10,
            t0(),
            7,
        )
        .expect_err("one option is not binary");
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn test_days_to_resolve_bounds() {
        for bad_days in [0, -3, 366] {
            let err = Prediction::new(
                UserId::new(),
                CharacterId::new(),
                NarrativeId::new(),
                "Out of range",
                PredictionOptions::Binary {
                    options: vec!["Yes".to_string(), "No".to_string()],
                },
                Difficulty::Easy,
                50,
                10,
                t0(),
                bad_days,
            )
            .expect_err("days out of range");
            assert!(matches!(err, DomainError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_vote_upsert_is_idempotent_per_user() {
        let mut prediction = binary_prediction(Difficulty::Medium);
        let voter = UserId::new();
        prediction
            .record_vote(voter, Selection::Option { index: 0 }, 30, t0())
            .expect("first vote");
        prediction
            .record_vote(
                voter,
                Selection::Option { index: 1 },
                10,
                t0() + Duration::hours(1),
            )
            .expect("replacement vote");

        assert_eq!(prediction.participant_count(), 1);
        let vote = &prediction.votes()[0];
        assert_eq!(vote.selection, Selection::Option { index: 1 });
        assert_eq!(vote.amount, 10);
        assert_eq!(vote.voted_at, t0() + Duration::hours(1));
    }

    #[test]
    fn test_vote_stake_bounds() {
        let mut prediction = binary_prediction(Difficulty::Medium);
        for bad in [0, 101] {
            let err = prediction
                .record_vote(UserId::new(), Selection::Option { index: 0 }, bad, t0())
                .expect_err("out of range stake");
            assert!(matches!(err, DomainError::InvalidInput(_)));
        }
        assert_eq!(prediction.participant_count(), 0);
    }

    #[test]
    fn test_vote_selection_shape_checked() {
        let mut prediction = binary_prediction(Difficulty::Medium);
        let err = prediction
            .record_vote(UserId::new(), Selection::Value { value: 0.5 }, 10, t0())
            .expect_err("value selection on a binary prediction");
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let err = prediction
            .record_vote(UserId::new(), Selection::Option { index: 2 }, 10, t0())
            .expect_err("index out of range");
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn test_vote_past_deadline_expires_and_fails() {
        let mut prediction = binary_prediction(Difficulty::Medium);
        let err = prediction
            .record_vote(
                UserId::new(),
                Selection::Option { index: 0 },
                10,
                t0() + Duration::days(8),
            )
            .expect_err("past deadline");
        assert!(err.is_expired());
        assert_eq!(prediction.status(), PredictionStatus::Expired);
    }

    #[test]
    fn test_binary_resolution_reward_ledger() {
        let mut prediction = binary_prediction(Difficulty::Medium);
        let winner = UserId::new();
        let loser = UserId::new();
        prediction
            .record_vote(winner, Selection::Option { index: 0 }, 20, t0())
            .expect("winner vote");
        prediction
            .record_vote(loser, Selection::Option { index: 1 }, 10, t0())
            .expect("loser vote");

        let ledger = prediction
            .resolve(
                Selection::Option { index: 0 },
                "The merger closed on March 30th.",
                UserId::new(),
                None,
                t0() + Duration::days(1),
            )
            .expect("resolve");

        // round(20 * 1.5) = 30; the losing vote receives nothing
        assert_eq!(
            ledger,
            vec![RewardEntry {
                user_id: winner,
                amount: 30
            }]
        );
        assert_eq!(prediction.status(), PredictionStatus::Resolved);
        let resolution = prediction.resolution().expect("resolution recorded");
        assert_eq!(resolution.correct, Selection::Option { index: 0 });
    }

    #[test]
    fn test_resolved_prediction_is_immutable() {
        let mut prediction = binary_prediction(Difficulty::Easy);
        prediction
            .resolve(
                Selection::Option { index: 1 },
                "It did not happen.",
                UserId::new(),
                None,
                t0(),
            )
            .expect("resolve");

        let err = prediction
            .record_vote(UserId::new(), Selection::Option { index: 0 }, 10, t0())
            .expect_err("vote after resolution");
        assert!(matches!(err, DomainError::InvalidState(_)));
        let err = prediction
            .cancel("too late", t0())
            .expect_err("cancel after resolution");
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert!(!prediction.expire_if_overdue(t0() + Duration::days(30)));
        assert_eq!(prediction.status(), PredictionStatus::Resolved);
    }

    #[test]
    fn test_resolve_past_deadline_expires_and_fails() {
        let mut prediction = binary_prediction(Difficulty::Medium);
        let err = prediction
            .resolve(
                Selection::Option { index: 0 },
                "late",
                UserId::new(),
                None,
                t0() + Duration::days(8),
            )
            .expect_err("past deadline");
        assert!(err.is_expired());
        assert_eq!(prediction.status(), PredictionStatus::Expired);
        assert!(prediction.resolution().is_none());
    }

    #[test]
    fn test_cancel_refunds_every_stake_in_full() {
        let mut prediction = binary_prediction(Difficulty::Hard);
        let u1 = UserId::new();
        let u2 = UserId::new();
        prediction
            .record_vote(u1, Selection::Option { index: 0 }, 30, t0())
            .expect("vote");
        prediction
            .record_vote(u2, Selection::Option { index: 1 }, 10, t0())
            .expect("vote");

        let refunds = prediction
            .cancel("narrative was deleted", t0() + Duration::days(1))
            .expect("cancel");
        assert_eq!(
            refunds,
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
        assert_eq!(prediction.status(), PredictionStatus::Cancelled);
        let cancellation = prediction.cancellation().expect("cancellation recorded");
        assert_eq!(cancellation.reason, "narrative was deleted");
    }

    #[test]
    fn test_cancel_past_deadline_expires_and_forfeits_stakes() {
        let mut prediction = binary_prediction(Difficulty::Medium);
        prediction
            .record_vote(UserId::new(), Selection::Option { index: 0 }, 25, t0())
            .expect("vote");

        let err = prediction
            .cancel("too late", t0() + Duration::days(10))
            .expect_err("overdue predictions expire instead of cancelling");
        assert!(err.is_expired());
        assert_eq!(prediction.status(), PredictionStatus::Expired);
        assert!(prediction.cancellation().is_none());
    }

    #[test]
    fn test_range_matching_within_five_percent_of_span() {
        let options = PredictionOptions::Range {
            min: 0.0,
            max: 100.0,
            unit: "percent".to_string(),
        };
        let correct = Selection::Value { value: 50.0 };
        // 5% of the span is 5.0
        assert!(options.selection_matches(&Selection::Value { value: 54.9 }, &correct));
        assert!(!options.selection_matches(&Selection::Value { value: 56.0 }, &correct));
    }

    #[test]
    fn test_time_matching_within_a_day() {
        let options = PredictionOptions::Time {
            earliest: t0(),
            latest: t0() + Duration::days(30),
        };
        let correct = Selection::Date {
            date: t0() + Duration::days(10),
        };
        let close = Selection::Date {
            date: t0() + Duration::days(10) + Duration::hours(20),
        };
        let far = Selection::Date {
            date: t0() + Duration::days(12),
        };
        assert!(options.selection_matches(&close, &correct));
        assert!(!options.selection_matches(&far, &correct));
    }

    #[test]
    fn test_compound_matching_requires_exact_set() {
        let options = PredictionOptions::Compound {
            conditions: vec![
                "Rates fall".to_string(),
                "Exports rise".to_string(),
                "Coalition holds".to_string(),
            ],
        };
        let correct = Selection::Conditions {
            indices: vec![0, 2],
        };
        assert!(options.selection_matches(
            &Selection::Conditions {
                indices: vec![2, 0]
            },
            &correct
        ));
        assert!(!options.selection_matches(
            &Selection::Conditions { indices: vec![0] },
            &correct
        ));
        assert!(!options.selection_matches(
            &Selection::Conditions {
                indices: vec![0, 1, 2]
            },
            &correct
        ));
    }

    #[test]
    fn test_options_serde_tagged_by_type() {
        let options = PredictionOptions::Range {
            min: 1.0,
            max: 9.0,
            unit: "points".to_string(),
        };
        let json = serde_json::to_value(&options).expect("serialize");
        assert_eq!(json["type"], "range");
        assert_eq!(json["min"], 1.0);

        let back: PredictionOptions = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, options);
    }
}
