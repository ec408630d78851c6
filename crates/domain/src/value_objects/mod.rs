//! Value objects shared across the domain.

mod snapshot;

pub use snapshot::{
    Audience, CharacterSnapshot, ResourceKind, Resources, Specialty, TraitName,
};
