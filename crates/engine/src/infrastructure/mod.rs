//! Infrastructure - adapters behind the port traits.

pub mod clock;
pub mod content;
pub mod memory;
pub mod news;
pub mod ports;
pub mod resilient_content;

pub use clock::SystemClock;
pub use content::CompletionClient;
pub use memory::{
    InMemoryCharacterRepo, InMemoryDecisionRepo, InMemoryNarrativeRepo, InMemoryPredictionRepo,
};
pub use news::NewsApiClient;
pub use resilient_content::{ResilientContentClient, RetryConfig};
