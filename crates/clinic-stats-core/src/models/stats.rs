//! Computed statistics produced by the aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Appointment, Patient, Sale, Tutor, WindowPair};
use crate::stats::Trend;

/// Raw activity counts behind a tutor's engagement score.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityBreakdown {
    pub purchases: u32,
    pub clinical_history: u32,
    pub prescriptions: u32,
    pub expirables: u32,
    pub expirables_supplied: u32,
    pub clinic_appointments: u32,
    pub grooming_appointments: u32,
    /// Sub-collection fetches that failed and were counted as empty
    pub failed_fetches: u32,
}

/// Per-tutor statistics for the current window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TutorStatRecord {
    pub tutor_id: String,
    pub tutor_name: String,
    pub total_spent: f64,
    pub purchase_count: u32,
    /// Decay-weighted activity sum, rounded
    pub engagement_score: u32,
    pub spend_trend: Trend,
    pub frequency_trend: Trend,
    pub breakdown: ActivityBreakdown,
    pub last_purchase: Option<DateTime<Utc>>,
    pub average_ticket: f64,
    /// Distinct species across all the tutor's patients, first-seen order
    pub species: Vec<String>,
    pub account_balance: f64,
}

/// Ranked customer views returned by `StatsService::calculate_top_customers`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopCustomers {
    pub by_spent: Vec<TutorStatRecord>,
    pub by_frequency: Vec<TutorStatRecord>,
    pub by_engagement: Vec<TutorStatRecord>,
    /// Every qualifying tutor, unranked
    pub all: Vec<TutorStatRecord>,
    pub windows: WindowPair,
    pub generated_at: DateTime<Utc>,
    /// Total per-patient fetches masked as empty
    pub failed_fetches: u32,
}

impl TopCustomers {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Units sold of a single product name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductTally {
    pub name: String,
    pub quantity: u32,
    /// Number of tickets the product appeared on
    pub occurrences: u32,
}

/// Drill-down for a single tutor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TutorDetailedStats {
    pub tutor: Tutor,
    pub windows: WindowPair,
    pub patients: Vec<Patient>,
    /// Current-window sales, newest first
    pub sales: Vec<Sale>,
    pub clinic_appointments: Vec<Appointment>,
    pub grooming_appointments: Vec<Appointment>,
    pub top_products: Vec<ProductTally>,
    pub total_spent: f64,
    pub purchase_count: u32,
    pub average_ticket: f64,
    pub spend_trend: Trend,
    pub frequency_trend: Trend,
    pub last_purchase: Option<DateTime<Utc>>,
}
