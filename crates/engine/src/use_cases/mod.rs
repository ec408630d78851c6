//! Use cases - lifecycle orchestration over the port traits.

pub mod decision;
pub mod error;
pub mod prediction;
pub mod sweep;

pub use decision::DecisionOps;
pub use error::OpsError;
pub use prediction::PredictionOps;
pub use sweep::{ExpirySweep, SweepReport};
