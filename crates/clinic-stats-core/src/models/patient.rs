//! Patient models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pet record, owned by exactly one tutor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    /// Owning tutor
    pub tutor_id: String,
    pub name: String,
    /// Free text as typed at the front desk (e.g., "Canino", "perro mestizo", "Felino")
    pub species: String,
    pub breed: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(tutor_id: String, name: String, species: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tutor_id,
            name,
            species,
            breed: None,
            created_at: Utc::now(),
        }
    }

    /// Get the canonical species name (trimmed, lowercase).
    pub fn canonical_species(&self) -> String {
        self.species.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_patient() {
        let patient = Patient::new("tutor-1".into(), "Max".into(), "Canino".into());
        assert_eq!(patient.name, "Max");
        assert_eq!(patient.tutor_id, "tutor-1");
        assert!(patient.breed.is_none());
        assert_eq!(patient.id.len(), 36); // UUID format
    }

    #[test]
    fn test_canonical_species() {
        let patient = Patient::new("tutor-1".into(), "Mishi".into(), "  Felino ".into());
        assert_eq!(patient.canonical_species(), "felino");
    }
}
