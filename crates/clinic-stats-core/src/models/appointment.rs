//! Clinic and grooming appointment models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which agenda an appointment belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentKind {
    Clinic,
    Grooming,
}

impl AppointmentKind {
    /// Storage name of the collection holding this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentKind::Clinic => "clinic",
            AppointmentKind::Grooming => "grooming",
        }
    }

    /// Parse the storage name back; unknown strings yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "clinic" => Some(AppointmentKind::Clinic),
            "grooming" => Some(AppointmentKind::Grooming),
            _ => None,
        }
    }
}

/// A booked appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub kind: AppointmentKind,
    pub tutor_id: String,
    pub patient_id: Option<String>,
    pub starts_at: DateTime<Utc>,
}

impl Appointment {
    pub fn new(kind: AppointmentKind, tutor_id: String, starts_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            tutor_id,
            patient_id: None,
            starts_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_storage_name() {
        for kind in [AppointmentKind::Clinic, AppointmentKind::Grooming] {
            assert_eq!(AppointmentKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AppointmentKind::parse("surgery"), None);
    }
}
