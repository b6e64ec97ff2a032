//! Species and breed taxonomy.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gate scores strictly below this value resolve to buffalo.
pub const GATE_THRESHOLD: f32 = 0.5;

/// Animal species decided by the species gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Cow,
    Buffalo,
}

impl Species {
    /// Resolve the species from the gate's raw cow-likelihood.
    ///
    /// `p < 0.5` is buffalo, anything else (including exactly 0.5) is cow.
    pub fn from_gate_score(p: f32) -> Self {
        if p < GATE_THRESHOLD {
            Species::Buffalo
        } else {
            Species::Cow
        }
    }

    /// Breed vocabulary for this species, in model output order.
    pub fn breeds(&self) -> &'static [Breed; 5] {
        match self {
            Species::Cow => &COW_BREEDS,
            Species::Buffalo => &BUFFALO_BREEDS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Species::Cow => "cow",
            Species::Buffalo => "buffalo",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Known breeds. Serialized with the labels the breed models were trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Breed {
    // Cow breeds
    #[serde(rename = "Ayshire")]
    Ayshire,
    #[serde(rename = "Brown_swiss")]
    BrownSwiss,
    #[serde(rename = "Holstein_Friesian")]
    HolsteinFriesian,
    #[serde(rename = "Khillari")]
    Khillari,
    #[serde(rename = "Red_Sindhi")]
    RedSindhi,

    // Buffalo breeds
    #[serde(rename = "Banni")]
    Banni,
    #[serde(rename = "Jaffrabadi")]
    Jaffrabadi,
    #[serde(rename = "Nagpuri")]
    Nagpuri,
    #[serde(rename = "Nili_ravi")]
    NiliRavi,
    #[serde(rename = "Toda")]
    Toda,
}

/// Cow breed vocabulary, indexed by the cow breed model's output position.
pub const COW_BREEDS: [Breed; 5] = [
    Breed::Ayshire,
    Breed::BrownSwiss,
    Breed::HolsteinFriesian,
    Breed::Khillari,
    Breed::RedSindhi,
];

/// Buffalo breed vocabulary, indexed by the buffalo breed model's output position.
pub const BUFFALO_BREEDS: [Breed; 5] = [
    Breed::Banni,
    Breed::Jaffrabadi,
    Breed::Nagpuri,
    Breed::NiliRavi,
    Breed::Toda,
];

impl Breed {
    /// Training label for this breed.
    pub fn as_str(&self) -> &'static str {
        match self {
            Breed::Ayshire => "Ayshire",
            Breed::BrownSwiss => "Brown_swiss",
            Breed::HolsteinFriesian => "Holstein_Friesian",
            Breed::Khillari => "Khillari",
            Breed::RedSindhi => "Red_Sindhi",
            Breed::Banni => "Banni",
            Breed::Jaffrabadi => "Jaffrabadi",
            Breed::Nagpuri => "Nagpuri",
            Breed::NiliRavi => "Nili_ravi",
            Breed::Toda => "Toda",
        }
    }

    /// Species this breed belongs to.
    pub fn species(&self) -> Species {
        match self {
            Breed::Ayshire
            | Breed::BrownSwiss
            | Breed::HolsteinFriesian
            | Breed::Khillari
            | Breed::RedSindhi => Species::Cow,
            Breed::Banni | Breed::Jaffrabadi | Breed::Nagpuri | Breed::NiliRavi | Breed::Toda => {
                Species::Buffalo
            }
        }
    }

    /// Look up the breed at `index` in a species vocabulary.
    pub fn from_index(species: Species, index: usize) -> Option<Breed> {
        species.breeds().get(index).copied()
    }
}

impl fmt::Display for Breed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
