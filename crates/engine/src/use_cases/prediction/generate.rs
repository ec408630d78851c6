//! Prediction generation and automatic resolution analysis.
//!
//! Generation failures fall back to a fixed template per prediction type.
//! Resolution analysis is the opposite: there is no deterministic stand-in
//! for judging a real-world event, so a failed analysis surfaces as
//! `ResolutionUnavailable` and the prediction stays open.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use plotweave_domain::{Difficulty, PredictionKind, PredictionOptions, Selection};

use crate::infrastructure::ports::NewsArticle;

use super::types::AutoResolution;

/// Generated prediction content before it becomes an entity.
pub struct GeneratedPrediction {
    pub title: String,
    pub category: String,
    pub options: PredictionOptions,
    /// Creator confidence suggested by the generator, 0-100.
    pub confidence: u32,
}

pub fn prediction_system_prompt() -> String {
    "You are a forecasting analyst for an interactive fiction platform. \
     Respond with a single JSON object and no other text."
        .to_string()
}

/// Prompt asking for a prediction of the given type about a topic.
pub fn prediction_prompt(kind: PredictionKind, topic: &str, difficulty: Difficulty) -> String {
    let shape = match kind {
        PredictionKind::Binary => r#""options": {"type": "binary", "options": ["Yes", "No"]}"#,
        PredictionKind::Multiple => {
            r#""options": {"type": "multiple", "options": ["...", "...", "..."]}"#
        }
        PredictionKind::Range => {
            r#""options": {"type": "range", "min": 0, "max": 100, "unit": "..."}"#
        }
        PredictionKind::Time => {
            r#""options": {"type": "time", "earliest": "2025-01-01T00:00:00Z", "latest": "2025-02-01T00:00:00Z"}"#
        }
        PredictionKind::Compound => {
            r#""options": {"type": "compound", "conditions": ["...", "..."]}"#
        }
    };
    format!(
        r#"Create a {kind} prediction about: {topic}

Difficulty: {difficulty}.

Return JSON:
{{
  "title": "...",
  "category": "...",
  {shape},
  "confidence": 60
}}"#,
        kind = kind.as_str(),
        topic = topic,
        difficulty = difficulty.as_str(),
        shape = shape,
    )
}

/// Prompt asking for a verdict given news context.
pub fn resolution_prompt(title: &str, options: &PredictionOptions, articles: &[NewsArticle]) -> String {
    let context: String = articles
        .iter()
        .map(|a| format!("- [{}] {}: {}\n", a.source, a.title, a.description))
        .collect();
    let answer_shape = match options {
        PredictionOptions::Binary { .. } | PredictionOptions::Multiple { .. } => {
            r#""correct": {"type": "option", "index": 0}"#
        }
        PredictionOptions::Range { .. } => r#""correct": {"type": "value", "value": 0}"#,
        PredictionOptions::Time { .. } => {
            r#""correct": {"type": "date", "date": "2025-01-01T00:00:00Z"}"#
        }
        PredictionOptions::Compound { .. } => {
            r#""correct": {"type": "conditions", "indices": [0]}"#
        }
    };
    format!(
        r#"Judge this prediction against recent reporting.

Prediction: {title}
Options: {options}

Recent articles:
{context}

Return JSON:
{{
  {answer_shape},
  "explanation": "one paragraph citing the articles",
  "accuracy": 0.9
}}

"accuracy" is your confidence in the verdict, 0.0 to 1.0. If the articles do
not support a confident verdict, return {{"unresolved": true}} instead."#,
        title = title,
        options = serde_json::to_string(options).unwrap_or_default(),
        context = context,
        answer_shape = answer_shape,
    )
}

#[derive(Debug, Deserialize)]
struct PredictionPayload {
    title: String,
    #[serde(default)]
    category: String,
    options: PredictionOptions,
    #[serde(default = "default_confidence")]
    confidence: u32,
}

fn default_confidence() -> u32 {
    50
}

#[derive(Debug, Deserialize)]
struct ResolutionPayload {
    #[serde(default)]
    unresolved: bool,
    correct: Option<Selection>,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    accuracy: Option<f64>,
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}

/// Parse generated prediction JSON, checking the options shape.
///
/// A payload whose options fail shape validation is rejected so a malformed
/// generation can never enter the state machine.
pub fn parse_prediction(text: &str, expected: PredictionKind) -> Option<GeneratedPrediction> {
    let payload: PredictionPayload = serde_json::from_str(strip_code_fences(text)).ok()?;
    if payload.options.kind() != expected || payload.options.validate().is_err() {
        return None;
    }
    Some(GeneratedPrediction {
        title: payload.title,
        category: payload.category,
        options: payload.options,
        confidence: payload.confidence.min(100),
    })
}

/// Parse a resolution verdict. None means "could not judge".
pub fn parse_resolution(text: &str, options: &PredictionOptions) -> Option<AutoResolution> {
    let payload: ResolutionPayload = serde_json::from_str(strip_code_fences(text)).ok()?;
    if payload.unresolved {
        return None;
    }
    let correct = payload.correct?;
    options.validate_selection(&correct).ok()?;
    Some(AutoResolution {
        correct,
        explanation: payload.explanation,
        accuracy: payload.accuracy.unwrap_or(0.5).clamp(0.0, 1.0),
    })
}

/// Fixed template per prediction type, used when generation fails.
///
/// Numeric templates use a 0-100 span and time templates a 1-30 day window
/// so a failed generation still yields a votable prediction.
pub fn fallback_prediction(kind: PredictionKind, topic: &str, now: DateTime<Utc>) -> GeneratedPrediction {
    let options = match kind {
        PredictionKind::Binary => PredictionOptions::Binary {
            options: vec!["It will happen".to_string(), "It will not happen".to_string()],
        },
        PredictionKind::Multiple => PredictionOptions::Multiple {
            options: vec![
                "Clearly succeeds".to_string(),
                "Mixed result".to_string(),
                "Clearly fails".to_string(),
            ],
        },
        PredictionKind::Range => PredictionOptions::Range {
            min: 0.0,
            max: 100.0,
            unit: "percent".to_string(),
        },
        PredictionKind::Time => PredictionOptions::Time {
            earliest: now + Duration::days(1),
            latest: now + Duration::days(30),
        },
        PredictionKind::Compound => PredictionOptions::Compound {
            conditions: vec![
                "The main development occurs".to_string(),
                "It draws public attention".to_string(),
            ],
        },
    };
    GeneratedPrediction {
        title: format!("What happens with {topic}?"),
        category: "general".to_string(),
        options,
        confidence: 50,
    }
}
