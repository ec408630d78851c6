//! Error type shared by the lifecycle use cases.

use plotweave_domain::DomainError;

use crate::infrastructure::ports::RepoError;

/// Errors surfaced by decision and prediction operations.
///
/// Domain rule violations and storage failures stay distinguishable so an
/// outer surface can map them to different response classes.
#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    /// Automatic resolution could not reach a confident verdict.
    #[error("Resolution unavailable: {0}")]
    ResolutionUnavailable(String),
}

impl OpsError {
    pub fn resolution_unavailable(message: impl Into<String>) -> Self {
        Self::ResolutionUnavailable(message.into())
    }

    /// Check if this wraps a NotFound from either layer.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Domain(e) => matches!(e, DomainError::NotFound { .. }),
            Self::Repo(e) => e.is_not_found(),
            Self::ResolutionUnavailable(_) => false,
        }
    }
}
