//! Species filter and matching heuristics.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Patient;

/// Tutor-level species filter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SpeciesFilter {
    #[serde(rename = "Canino")]
    Canine,
    #[serde(rename = "Felino")]
    Feline,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl SpeciesFilter {
    /// Parse a filter token. Unknown tokens mean no filtering.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "canino" => SpeciesFilter::Canine,
            "felino" => SpeciesFilter::Feline,
            _ => SpeciesFilter::All,
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            SpeciesFilter::Canine => "Canino",
            SpeciesFilter::Feline => "Felino",
            SpeciesFilter::All => "all",
        }
    }

    /// Whether a free-text species value matches this filter.
    pub fn matches_species(&self, species: &str) -> bool {
        let species = species.trim().to_lowercase();
        match self {
            SpeciesFilter::Canine => species == "canino" || species.contains("perro"),
            SpeciesFilter::Feline => species == "felino" || species.contains("gato"),
            SpeciesFilter::All => true,
        }
    }

    /// A tutor qualifies when any of their patients matches.
    pub fn matches_any(&self, patients: &[&Patient]) -> bool {
        match self {
            SpeciesFilter::All => true,
            _ => patients.iter().any(|p| self.matches_species(&p.species)),
        }
    }
}

impl fmt::Display for SpeciesFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}
