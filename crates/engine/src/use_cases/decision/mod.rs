//! Decision lifecycle use cases.

pub mod generate;
pub mod ops;
pub mod types;

pub use ops::DecisionOps;
pub use types::{ChoiceResult, CreateDecisionInput, GenerateDecisionInput};
