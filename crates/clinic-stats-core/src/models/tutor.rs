//! Tutor (customer) models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer account. Owns zero or more patients through `Patient::tutor_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tutor {
    pub id: String,
    pub name: String,
    /// Signed balance; negative means the tutor owes the clinic.
    pub account_balance: f64,
    pub created_at: DateTime<Utc>,
}

impl Tutor {
    /// Create a new tutor with a fresh id and zero balance.
    pub fn new(name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            account_balance: 0.0,
            created_at: Utc::now(),
        }
    }

    /// Reference embedded in sale documents.
    pub fn reference(&self) -> TutorRef {
        TutorRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// Denormalized tutor reference stored inside other documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TutorRef {
    pub id: String,
    pub name: String,
}
