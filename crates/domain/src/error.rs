//! Unified error types for the domain layer
//!
//! Every lifecycle operation surfaces one of these kinds so the HTTP layer
//! can map them to status codes consistently. Errors are structured (kind +
//! message + optional detail payload), never bare strings.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Referenced entity does not exist
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Caller does not own the entity being acted on
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Operation attempted from a state that does not permit it
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Deadline passed; the expiry transition has already been recorded on
    /// the entity by the time this error is returned
    #[error("Expired at {deadline}")]
    Expired { deadline: DateTime<Utc> },

    /// Eligibility check failed; carries the itemized reason list
    #[error("Not eligible: {}", reasons.join("; "))]
    Ineligible { reasons: Vec<String> },

    /// Malformed request data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Auto-resolution could not obtain an answer; safe to retry
    #[error("Resolution unavailable: {0}")]
    ResolutionUnavailable(String),
}

impl DomainError {
    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Creates an invalid state error for disallowed transitions.
    ///
    /// Use this when an operation is attempted from a status that does not
    /// permit it, e.g. choosing an option on a `resolved` decision.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn expired(deadline: DateTime<Utc>) -> Self {
        Self::Expired { deadline }
    }

    pub fn ineligible(reasons: Vec<String>) -> Self {
        Self::Ineligible { reasons }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn resolution_unavailable(msg: impl Into<String>) -> Self {
        Self::ResolutionUnavailable(msg.into())
    }

    /// Check if this is an Expired error (the one failure path that still
    /// writes state before surfacing).
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = DomainError::not_found("Decision", "123e4567-e89b-12d3-a456-426614174000");
        assert!(matches!(err, DomainError::NotFound { .. }));
        assert!(err.to_string().contains("Decision"));
        assert!(err.to_string().contains("123e4567"));
    }

    #[test]
    fn test_ineligible_joins_reasons() {
        let err = DomainError::ineligible(vec![
            "Requires 50 influence".to_string(),
            "Requires 20 money".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Not eligible: Requires 50 influence; Requires 20 money"
        );
    }

    #[test]
    fn test_expired_detection() {
        let err = DomainError::expired(Utc::now());
        assert!(err.is_expired());
        assert!(!DomainError::invalid_input("bad").is_expired());
    }
}
