//! Engine crate: ports, adapters and use cases for the decision and
//! prediction lifecycles. The domain crate holds the state machines; this
//! crate wires them to clocks, storage, content generation and news lookup.

pub mod infrastructure;
pub mod use_cases;

pub use use_cases::{DecisionOps, ExpirySweep, OpsError, PredictionOps};
