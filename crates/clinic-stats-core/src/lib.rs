//! Clinic Stats Core Library
//!
//! Customer analytics for a veterinary clinic and pet store: ranks tutors
//! (pet owners) by spend, purchase frequency and decay-weighted engagement.
//!
//! # Architecture
//!
//! ```text
//!   calculate_top_customers(species, period, limit)
//!                      │
//!              [CACHE: species_period_limit] ──hit──▶ TopCustomers
//!                      │ miss
//!           Window Resolution (current + previous)
//!                      │
//!   ┌──────────┬───────┴──────┬──────────────┐
//!   ▼          ▼              ▼              ▼
//! Tutors   Patients    Sales (both)   Appointments
//!                      │
//!        Batched per-patient reads (20 at a time)
//!   clinical history → prescriptions → expirables
//!                      │
//!          Aggregation → Ranking → Cache
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`store`]: Async document store seam (SQLite and in-memory)
//! - [`models`]: Domain types (Tutor, Patient, Sale, TutorStatRecord, etc.)
//! - [`stats`]: Windows, decay, batching, aggregation, trends and the result cache
//! - [`export`]: CSV export of rankings
//! - [`config`]: Runtime tunables
//! - [`clock`]: Injectable time source

pub mod clock;
pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StatsConfig;
pub use db::Database;
pub use models::{
    ActivityBreakdown, Appointment, AppointmentKind, Patient, Sale, SaleItem, TopCustomers,
    Tutor, TutorDetailedStats, TutorStatRecord,
};
pub use stats::{Period, SpeciesFilter, StatsService, Trend, TrendDirection};
pub use store::{DocumentStore, MemoryStore, SqliteStore};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum ClinicStatsError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

impl From<db::DbError> for ClinicStatsError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => ClinicStatsError::NotFound(what),
            other => ClinicStatsError::DatabaseError(other.to_string()),
        }
    }
}

impl From<store::StoreError> for ClinicStatsError {
    fn from(e: store::StoreError) -> Self {
        ClinicStatsError::DatabaseError(e.to_string())
    }
}

impl From<stats::StatsError> for ClinicStatsError {
    fn from(e: stats::StatsError) -> Self {
        match e {
            stats::StatsError::TutorNotFound(id) => ClinicStatsError::NotFound(id),
            stats::StatsError::Store(inner) => inner.into(),
        }
    }
}

impl From<serde_json::Error> for ClinicStatsError {
    fn from(e: serde_json::Error) -> Self {
        ClinicStatsError::SerializationError(e.to_string())
    }
}

impl From<std::io::Error> for ClinicStatsError {
    fn from(e: std::io::Error) -> Self {
        ClinicStatsError::RuntimeError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicStatsError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicStatsError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
///
/// Tunables are read from `CLINIC_STATS_*` environment variables.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<ClinicStatsCore>, ClinicStatsError> {
    let db = Database::open(&path)?;
    ClinicStatsCore::build(db, StatsConfig::from_env()).map(Arc::new)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<ClinicStatsCore>, ClinicStatsError> {
    let db = Database::open_in_memory()?;
    ClinicStatsCore::build(db, StatsConfig::default()).map(Arc::new)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Receives aggregation progress on the calling thread.
#[uniffi::export(callback_interface)]
pub trait StatsProgressListener: Send + Sync {
    fn on_progress(&self, step: String, progress: u8, message: String);
}

/// Thread-safe database and analytics wrapper for FFI.
#[derive(uniffi::Object)]
pub struct ClinicStatsCore {
    db: Arc<Mutex<Database>>,
    service: StatsService,
    runtime: tokio::runtime::Runtime,
}

impl ClinicStatsCore {
    fn build(db: Database, config: StatsConfig) -> Result<Self, ClinicStatsError> {
        let db = Arc::new(Mutex::new(db));
        let store = SqliteStore::new(Arc::clone(&db));
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            db,
            service: StatsService::new(Arc::new(store), config),
            runtime,
        })
    }

    fn compute_top_customers(
        &self,
        species: &str,
        period: &str,
        limit: u32,
        listener: Option<Box<dyn StatsProgressListener>>,
    ) -> Result<Arc<TopCustomers>, ClinicStatsError> {
        let species = SpeciesFilter::from_token(species);
        let period = Period::from_token(period);

        let callback = listener.map(|listener| {
            Box::new(move |event: stats::ProgressEvent| {
                listener.on_progress(event.step.label().to_string(), event.progress, event.message)
            }) as Box<stats::ProgressCallback>
        });

        let top = self.runtime.block_on(self.service.calculate_top_customers(
            species,
            period,
            limit as usize,
            callback.as_deref(),
        ))?;
        Ok(top)
    }
}

#[uniffi::export]
impl ClinicStatsCore {
    // =========================================================================
    // Tutor Operations
    // =========================================================================

    /// Create a new tutor.
    pub fn create_tutor(
        &self,
        name: String,
        account_balance: f64,
    ) -> Result<FfiTutor, ClinicStatsError> {
        let db = self.db.lock()?;
        let mut tutor = Tutor::new(name);
        tutor.account_balance = account_balance;
        db.insert_tutor(&tutor)?;
        Ok(tutor.into())
    }

    /// Set a tutor's account balance.
    pub fn update_tutor_balance(
        &self,
        tutor_id: String,
        balance: f64,
    ) -> Result<(), ClinicStatsError> {
        let db = self.db.lock()?;
        db.update_tutor_balance(&tutor_id, balance)?;
        Ok(())
    }

    /// List all tutors by name.
    pub fn list_tutors(&self) -> Result<Vec<FfiTutor>, ClinicStatsError> {
        let db = self.db.lock()?;
        let tutors = db.list_tutors()?;
        Ok(tutors.into_iter().map(|t| t.into()).collect())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a patient under a tutor.
    pub fn create_patient(
        &self,
        tutor_id: String,
        name: String,
        species: String,
    ) -> Result<FfiPatient, ClinicStatsError> {
        let db = self.db.lock()?;
        let patient = Patient::new(tutor_id, name, species);
        db.insert_patient(&patient)?;
        Ok(patient.into())
    }

    // =========================================================================
    // Activity Operations
    // =========================================================================

    /// Record a sale ticket. `created_at` is RFC 3339; defaults to now.
    pub fn record_sale(
        &self,
        tutor_id: String,
        total: f64,
        items: Vec<FfiSaleItem>,
        created_at: Option<String>,
    ) -> Result<String, ClinicStatsError> {
        let db = self.db.lock()?;
        let tutor = db.require_tutor(&tutor_id)?;

        let mut sale = Sale::new(
            tutor.reference(),
            total,
            items.into_iter().map(|i| i.into()).collect(),
        );
        if let Some(ts) = created_at {
            sale.created_at = parse_timestamp(&ts)?;
        }
        db.insert_sale(&sale)?;
        Ok(sale.id)
    }

    /// Book a clinic or grooming appointment.
    pub fn record_appointment(
        &self,
        kind: String,
        tutor_id: String,
        patient_id: Option<String>,
        starts_at: String,
    ) -> Result<String, ClinicStatsError> {
        let kind = AppointmentKind::parse(&kind)
            .ok_or_else(|| ClinicStatsError::InvalidInput(format!("appointment kind: {}", kind)))?;
        let starts_at = parse_timestamp(&starts_at)?;

        let db = self.db.lock()?;
        db.require_tutor(&tutor_id)?;
        let mut appointment = Appointment::new(kind, tutor_id, starts_at);
        appointment.patient_id = patient_id;
        db.insert_appointment(&appointment)?;
        Ok(appointment.id)
    }

    /// Add a clinical history entry to a patient's file.
    pub fn record_clinical_history(
        &self,
        patient_id: String,
        summary: String,
        recorded_at: String,
    ) -> Result<String, ClinicStatsError> {
        let recorded_at = parse_timestamp(&recorded_at)?;
        let db = self.db.lock()?;
        let entry = models::ClinicalHistoryEntry::new(patient_id, summary, recorded_at);
        db.insert_clinical_history(&entry)?;
        Ok(entry.id)
    }

    /// Add a prescription to a patient's file.
    pub fn record_prescription(
        &self,
        patient_id: String,
        medication: String,
        issued_at: String,
    ) -> Result<String, ClinicStatsError> {
        let issued_at = parse_timestamp(&issued_at)?;
        let db = self.db.lock()?;
        let prescription = models::Prescription::new(patient_id, medication, issued_at);
        db.insert_prescription(&prescription)?;
        Ok(prescription.id)
    }

    /// Add a recurring product or vaccine reminder to a patient's file.
    pub fn record_expirable(
        &self,
        patient_id: String,
        name: String,
        created_at: String,
        due_at: Option<String>,
        supplied: bool,
    ) -> Result<String, ClinicStatsError> {
        let created_at = parse_timestamp(&created_at)?;
        let due_at = due_at.as_deref().map(parse_timestamp).transpose()?;

        let db = self.db.lock()?;
        let mut expirable = models::Expirable::new(patient_id, name, created_at);
        expirable.due_at = due_at;
        expirable.supplied = supplied;
        db.insert_expirable(&expirable)?;
        Ok(expirable.id)
    }

    // =========================================================================
    // Stats Operations
    // =========================================================================

    /// Rank tutors. Species is `Canino`, `Felino` or `all`; period is
    /// `3months`, `6months`, `1year` or `all`.
    pub fn top_customers(
        &self,
        species: String,
        period: String,
        limit: u32,
        listener: Option<Box<dyn StatsProgressListener>>,
    ) -> Result<FfiTopCustomers, ClinicStatsError> {
        let top = self.compute_top_customers(&species, &period, limit, listener)?;
        Ok(top.as_ref().into())
    }

    /// Rankings as JSON.
    pub fn top_customers_json(
        &self,
        species: String,
        period: String,
        limit: u32,
    ) -> Result<String, ClinicStatsError> {
        let top = self.compute_top_customers(&species, &period, limit, None)?;
        Ok(top.to_json()?)
    }

    /// Drill-down for a single tutor over the given period.
    pub fn tutor_detailed_stats(
        &self,
        tutor_id: String,
        period: String,
    ) -> Result<FfiTutorDetailedStats, ClinicStatsError> {
        let period = Period::from_token(&period);
        let details = self
            .runtime
            .block_on(self.service.tutor_detailed_stats(&tutor_id, period))?;
        Ok(details.into())
    }

    /// Invalidate every cached ranking.
    pub fn clear_stats_cache(&self) {
        self.service.clear_cache();
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export one ranking view as CSV.
    pub fn export_top_customers_csv(
        &self,
        species: String,
        period: String,
        limit: u32,
        view: FfiRankingView,
    ) -> Result<String, ClinicStatsError> {
        let top = self.compute_top_customers(&species, &period, limit, None)?;
        let records = match view {
            FfiRankingView::BySpent => &top.by_spent,
            FfiRankingView::ByFrequency => &top.by_frequency,
            FfiRankingView::ByEngagement => &top.by_engagement,
            FfiRankingView::All => &top.all,
        };
        Ok(export::top_customers_csv(records))
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, ClinicStatsError> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| ClinicStatsError::InvalidInput(format!("timestamp {}: {}", s, e)))
}

// =========================================================================
// FFI Types
// =========================================================================

/// Ranking to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiRankingView {
    BySpent,
    ByFrequency,
    ByEngagement,
    All,
}

/// FFI-safe tutor.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTutor {
    pub id: String,
    pub name: String,
    pub account_balance: f64,
    pub created_at: String,
}

impl From<Tutor> for FfiTutor {
    fn from(tutor: Tutor) -> Self {
        Self {
            id: tutor.id,
            name: tutor.name,
            account_balance: tutor.account_balance,
            created_at: tutor.created_at.to_rfc3339(),
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub tutor_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            tutor_id: patient.tutor_id,
            name: patient.name,
            species: patient.species,
            breed: patient.breed,
        }
    }
}

/// FFI-safe sale line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSaleItem {
    pub name: String,
    pub quantity: u32,
}

impl From<FfiSaleItem> for SaleItem {
    fn from(item: FfiSaleItem) -> Self {
        SaleItem {
            name: item.name,
            quantity: item.quantity,
        }
    }
}

/// FFI-safe trend.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTrend {
    /// `up`, `down`, `stable` or `new`
    pub direction: String,
    pub percentage: f64,
}

impl From<Trend> for FfiTrend {
    fn from(trend: Trend) -> Self {
        Self {
            direction: trend.direction.as_str().to_string(),
            percentage: trend.percentage,
        }
    }
}

/// FFI-safe tutor statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTutorStat {
    pub tutor_id: String,
    pub tutor_name: String,
    pub total_spent: f64,
    pub purchase_count: u32,
    pub engagement_score: u32,
    pub spend_trend: FfiTrend,
    pub frequency_trend: FfiTrend,
    pub last_purchase: Option<String>,
    pub average_ticket: f64,
    pub species: Vec<String>,
    pub account_balance: f64,
    pub failed_fetches: u32,
}

impl From<&TutorStatRecord> for FfiTutorStat {
    fn from(record: &TutorStatRecord) -> Self {
        Self {
            tutor_id: record.tutor_id.clone(),
            tutor_name: record.tutor_name.clone(),
            total_spent: record.total_spent,
            purchase_count: record.purchase_count,
            engagement_score: record.engagement_score,
            spend_trend: record.spend_trend.into(),
            frequency_trend: record.frequency_trend.into(),
            last_purchase: record.last_purchase.map(|ts| ts.to_rfc3339()),
            average_ticket: record.average_ticket,
            species: record.species.clone(),
            account_balance: record.account_balance,
            failed_fetches: record.breakdown.failed_fetches,
        }
    }
}

/// FFI-safe ranking result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTopCustomers {
    pub by_spent: Vec<FfiTutorStat>,
    pub by_frequency: Vec<FfiTutorStat>,
    pub by_engagement: Vec<FfiTutorStat>,
    pub all: Vec<FfiTutorStat>,
    pub window_start: String,
    pub window_end: String,
    pub generated_at: String,
    pub failed_fetches: u32,
}

impl From<&TopCustomers> for FfiTopCustomers {
    fn from(top: &TopCustomers) -> Self {
        let convert = |records: &[TutorStatRecord]| records.iter().map(FfiTutorStat::from).collect();
        Self {
            by_spent: convert(&top.by_spent),
            by_frequency: convert(&top.by_frequency),
            by_engagement: convert(&top.by_engagement),
            all: convert(&top.all),
            window_start: top.windows.current.start.to_rfc3339(),
            window_end: top.windows.current.end.to_rfc3339(),
            generated_at: top.generated_at.to_rfc3339(),
            failed_fetches: top.failed_fetches,
        }
    }
}

/// FFI-safe product tally.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProductTally {
    pub name: String,
    pub quantity: u32,
    pub occurrences: u32,
}

/// FFI-safe tutor drill-down.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTutorDetailedStats {
    pub tutor: FfiTutor,
    pub patients: Vec<FfiPatient>,
    pub sale_count: u32,
    pub clinic_appointment_count: u32,
    pub grooming_appointment_count: u32,
    pub top_products: Vec<FfiProductTally>,
    pub total_spent: f64,
    pub purchase_count: u32,
    pub average_ticket: f64,
    pub spend_trend: FfiTrend,
    pub frequency_trend: FfiTrend,
    pub last_purchase: Option<String>,
}

impl From<TutorDetailedStats> for FfiTutorDetailedStats {
    fn from(details: TutorDetailedStats) -> Self {
        Self {
            tutor: details.tutor.into(),
            patients: details.patients.into_iter().map(|p| p.into()).collect(),
            sale_count: details.sales.len() as u32,
            clinic_appointment_count: details.clinic_appointments.len() as u32,
            grooming_appointment_count: details.grooming_appointments.len() as u32,
            top_products: details
                .top_products
                .into_iter()
                .map(|p| FfiProductTally {
                    name: p.name,
                    quantity: p.quantity,
                    occurrences: p.occurrences,
                })
                .collect(),
            total_spent: details.total_spent,
            purchase_count: details.purchase_count,
            average_ticket: details.average_ticket,
            spend_trend: details.spend_trend.into(),
            frequency_trend: details.frequency_trend.into(),
            last_purchase: details.last_purchase.map(|ts| ts.to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_records_and_ranks() {
        let core = open_database_in_memory().unwrap();
        let ana = core.create_tutor("Ana".into(), 0.0).unwrap();
        core.create_patient(ana.id.clone(), "Toby".into(), "Canino".into())
            .unwrap();
        core.record_sale(
            ana.id.clone(),
            300.0,
            vec![FfiSaleItem {
                name: "Croquetas".into(),
                quantity: 2,
            }],
            None,
        )
        .unwrap();

        let top = core
            .top_customers("all".into(), "6months".into(), 10, None)
            .unwrap();
        assert_eq!(top.by_spent.len(), 1);
        assert_eq!(top.by_spent[0].tutor_id, ana.id);
        assert_eq!(top.by_spent[0].total_spent, 300.0);

        let details = core
            .tutor_detailed_stats(ana.id.clone(), "6months".into())
            .unwrap();
        assert_eq!(details.top_products[0].name, "Croquetas");
        assert_eq!(details.top_products[0].quantity, 2);
    }

    #[test]
    fn test_unknown_tutor_is_not_found() {
        let core = open_database_in_memory().unwrap();
        let err = core
            .tutor_detailed_stats("missing".into(), "6months".into())
            .unwrap_err();
        assert!(matches!(err, ClinicStatsError::NotFound(_)));
    }

    #[test]
    fn test_invalid_appointment_input() {
        let core = open_database_in_memory().unwrap();
        let ana = core.create_tutor("Ana".into(), 0.0).unwrap();

        let kind = core.record_appointment(
            "surgery".into(),
            ana.id.clone(),
            None,
            "2024-03-01T10:00:00Z".into(),
        );
        assert!(matches!(kind, Err(ClinicStatsError::InvalidInput(_))));

        let ts = core.record_appointment("clinic".into(), ana.id, None, "yesterday".into());
        assert!(matches!(ts, Err(ClinicStatsError::InvalidInput(_))));
    }

    #[test]
    fn test_activity_for_unknown_tutor_is_not_found() {
        let core = open_database_in_memory().unwrap();

        let appointment = core.record_appointment(
            "grooming".into(),
            "missing".into(),
            None,
            "2024-03-01T10:00:00Z".into(),
        );
        assert!(matches!(appointment, Err(ClinicStatsError::NotFound(_))));

        let sale = core.record_sale("missing".into(), 10.0, vec![], None);
        assert!(matches!(sale, Err(ClinicStatsError::NotFound(_))));

        let balance = core.update_tutor_balance("missing".into(), 5.0);
        assert!(matches!(balance, Err(ClinicStatsError::NotFound(_))));
    }

    #[test]
    fn test_csv_export_respects_cache_clear() {
        let core = open_database_in_memory().unwrap();
        let ana = core.create_tutor("Ana".into(), 0.0).unwrap();
        core.create_patient(ana.id.clone(), "Mishi".into(), "Felino".into())
            .unwrap();

        let before = core
            .export_top_customers_csv("Felino".into(), "3months".into(), 5, FfiRankingView::All)
            .unwrap();
        assert_eq!(before.lines().count(), 2);

        let luis = core.create_tutor("Luis".into(), 0.0).unwrap();
        core.create_patient(luis.id, "Garfield".into(), "Felino".into())
            .unwrap();

        // Cached result still has one tutor
        let cached = core
            .export_top_customers_csv("Felino".into(), "3months".into(), 5, FfiRankingView::All)
            .unwrap();
        assert_eq!(cached.lines().count(), 2);

        core.clear_stats_cache();
        let fresh = core
            .export_top_customers_csv("Felino".into(), "3months".into(), 5, FfiRankingView::All)
            .unwrap();
        assert_eq!(fresh.lines().count(), 3);
    }
}
