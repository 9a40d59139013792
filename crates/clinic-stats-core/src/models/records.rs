//! Per-patient sub-collection records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record carrying the timestamp used for windowing and decay.
pub trait Dated {
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

/// Entry in a patient's clinical history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicalHistoryEntry {
    pub id: String,
    pub patient_id: String,
    pub recorded_at: Option<DateTime<Utc>>,
    pub summary: String,
}

/// A prescription issued to a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub id: String,
    pub patient_id: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub medication: String,
}

/// A recurring product or treatment with a due date (vaccines, antiparasitics).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expirable {
    pub id: String,
    pub patient_id: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub due_at: Option<DateTime<Utc>>,
    /// Whether the clinic already supplied it
    pub supplied: bool,
}

impl Dated for ClinicalHistoryEntry {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.recorded_at
    }
}

impl Dated for Prescription {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }
}

impl Dated for Expirable {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl ClinicalHistoryEntry {
    pub fn new(patient_id: String, summary: String, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            recorded_at: Some(recorded_at),
            summary,
        }
    }
}

impl Prescription {
    pub fn new(patient_id: String, medication: String, issued_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            issued_at: Some(issued_at),
            medication,
        }
    }
}

impl Expirable {
    pub fn new(patient_id: String, name: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            name,
            created_at: Some(created_at),
            due_at: None,
            supplied: false,
        }
    }
}
