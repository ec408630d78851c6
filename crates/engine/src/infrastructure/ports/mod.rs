//! Port traits - the seams between use cases and infrastructure.

pub mod error;
pub mod external;
pub mod repos;

pub use error::{GenerationError, NewsError, RepoError};
pub use external::{ClockPort, ContentPort, ContentRequest, GeneratedContent, NewsArticle, NewsPort};
pub use repos::{CharacterRecord, CharacterRepo, DecisionRepo, NarrativeRecord, NarrativeRepo, PredictionRepo};

#[cfg(test)]
pub use external::{MockClockPort, MockContentPort, MockNewsPort};
#[cfg(test)]
pub use repos::{MockCharacterRepo, MockDecisionRepo, MockNarrativeRepo, MockPredictionRepo};
