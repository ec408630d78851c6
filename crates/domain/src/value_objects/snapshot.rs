//! Character snapshot - read-only view of a character's stats
//!
//! Characters are an external aggregate; eligibility and effect logic only
//! ever sees this snapshot. Trait and reputation keys are drawn from a fixed
//! closed vocabulary, so they are enums rather than strings.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Personality trait vocabulary, levels 0-10
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraitName {
    Rational,
    Emotional,
    Traditional,
    Innovative,
    Individual,
    Collective,
    Intuitive,
    Planned,
}

impl TraitName {
    pub const ALL: [TraitName; 8] = [
        Self::Rational,
        Self::Emotional,
        Self::Traditional,
        Self::Innovative,
        Self::Individual,
        Self::Collective,
        Self::Intuitive,
        Self::Planned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rational => "rational",
            Self::Emotional => "emotional",
            Self::Traditional => "traditional",
            Self::Innovative => "innovative",
            Self::Individual => "individual",
            Self::Collective => "collective",
            Self::Intuitive => "intuitive",
            Self::Planned => "planned",
        }
    }
}

impl fmt::Display for TraitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reputation audience vocabulary, values in [-100, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Public,
    Government,
    Business,
    Academic,
    Media,
}

impl Audience {
    pub const ALL: [Audience; 5] = [
        Self::Public,
        Self::Government,
        Self::Business,
        Self::Academic,
        Self::Media,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Government => "government",
            Self::Business => "business",
            Self::Academic => "academic",
            Self::Media => "media",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spendable resource vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Money,
    Connections,
    Information,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [Self::Money, Self::Connections, Self::Information];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Money => "money",
            Self::Connections => "connections",
            Self::Information => "information",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Non-negative resource holdings (also used for option costs)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    #[serde(default)]
    pub money: u32,
    #[serde(default)]
    pub connections: u32,
    #[serde(default)]
    pub information: u32,
}

impl Resources {
    pub fn new(money: u32, connections: u32, information: u32) -> Self {
        Self {
            money,
            connections,
            information,
        }
    }

    pub fn get(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Money => self.money,
            ResourceKind::Connections => self.connections,
            ResourceKind::Information => self.information,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.money == 0 && self.connections == 0 && self.information == 0
    }
}

/// A named specialty with a proficiency level (1-10)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specialty {
    pub name: String,
    pub level: u8,
}

impl Specialty {
    pub fn new(name: impl Into<String>, level: u8) -> Self {
        Self {
            name: name.into(),
            level: level.clamp(1, 10),
        }
    }
}

/// Read model of a character's current stats.
///
/// Specialty names are unique per character: `with_specialty` replaces an
/// existing entry of the same name rather than appending a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSnapshot {
    traits: BTreeMap<TraitName, u8>,
    specialties: Vec<Specialty>,
    resources: Resources,
    influence: u32,
    reputation: BTreeMap<Audience, i32>,
}

impl CharacterSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    // === Builder Methods ===

    /// Set a trait level, clamped to 0-10.
    pub fn with_trait(mut self, name: TraitName, level: u8) -> Self {
        self.traits.insert(name, level.min(10));
        self
    }

    /// Set a specialty, replacing any existing specialty of the same name.
    pub fn with_specialty(mut self, name: impl Into<String>, level: u8) -> Self {
        let specialty = Specialty::new(name, level);
        if let Some(existing) = self
            .specialties
            .iter_mut()
            .find(|s| s.name == specialty.name)
        {
            existing.level = specialty.level;
        } else {
            self.specialties.push(specialty);
        }
        self
    }

    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_influence(mut self, influence: u32) -> Self {
        self.influence = influence;
        self
    }

    /// Set a reputation value, clamped to [-100, 100].
    pub fn with_reputation(mut self, audience: Audience, value: i32) -> Self {
        self.reputation.insert(audience, value.clamp(-100, 100));
        self
    }

    // === Accessors ===

    /// Current level for a trait (0 when the trait was never set).
    pub fn trait_level(&self, name: TraitName) -> u8 {
        self.traits.get(&name).copied().unwrap_or(0)
    }

    pub fn specialties(&self) -> &[Specialty] {
        &self.specialties
    }

    /// Level of a named specialty, if the character has it.
    pub fn specialty_level(&self, name: &str) -> Option<u8> {
        self.specialties
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.level)
    }

    pub fn resources(&self) -> Resources {
        self.resources
    }

    pub fn influence(&self) -> u32 {
        self.influence
    }

    /// Current reputation with an audience (0 when never set).
    pub fn reputation(&self, audience: Audience) -> i32 {
        self.reputation.get(&audience).copied().unwrap_or(0)
    }
}
