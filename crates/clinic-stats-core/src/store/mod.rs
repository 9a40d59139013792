//! Document store seam used by the analytics pipeline.
//!
//! The aggregator only ever reads. Every method maps to one store query so
//! that read counts are observable (see [`MemoryStore::read_count`]).

mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::DbError;
use crate::models::{
    Appointment, AppointmentKind, ClinicalHistoryEntry, DateWindow, Expirable, Patient,
    Prescription, Sale, Tutor,
};

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All tutors
    async fn tutors(&self) -> StoreResult<Vec<Tutor>>;

    /// A single tutor by id
    async fn tutor(&self, tutor_id: &str) -> StoreResult<Option<Tutor>>;

    /// All patients
    async fn patients(&self) -> StoreResult<Vec<Patient>>;

    /// Patients owned by one tutor
    async fn patients_of(&self, tutor_id: &str) -> StoreResult<Vec<Patient>>;

    /// Sales created inside the window
    async fn sales_between(&self, window: &DateWindow) -> StoreResult<Vec<Sale>>;

    /// One tutor's sales inside the window, newest first
    async fn tutor_sales_between(
        &self,
        tutor_id: &str,
        window: &DateWindow,
    ) -> StoreResult<Vec<Sale>>;

    /// Appointments of one kind starting inside the window
    async fn appointments_between(
        &self,
        kind: AppointmentKind,
        window: &DateWindow,
    ) -> StoreResult<Vec<Appointment>>;

    /// One tutor's appointments of one kind starting inside the window
    async fn tutor_appointments_between(
        &self,
        kind: AppointmentKind,
        tutor_id: &str,
        window: &DateWindow,
    ) -> StoreResult<Vec<Appointment>>;

    /// Clinical history sub-collection of a patient
    async fn clinical_history(&self, patient_id: &str) -> StoreResult<Vec<ClinicalHistoryEntry>>;

    /// Prescriptions sub-collection of a patient
    async fn prescriptions(&self, patient_id: &str) -> StoreResult<Vec<Prescription>>;

    /// Expirables sub-collection of a patient
    async fn expirables(&self, patient_id: &str) -> StoreResult<Vec<Expirable>>;
}
