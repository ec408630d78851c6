//! Prediction lifecycle use cases.

pub mod generate;
pub mod ops;
pub mod types;

pub use ops::PredictionOps;
pub use types::{
    AutoResolution, CreatePredictionInput, GeneratePredictionInput, ResolutionResult,
};
