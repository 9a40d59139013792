//! [`DocumentStore`] backed by the local SQLite [`Database`].

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::{DocumentStore, StoreError, StoreResult};
use crate::db::{Database, DbResult};
use crate::models::{
    Appointment, AppointmentKind, ClinicalHistoryEntry, DateWindow, Expirable, Patient,
    Prescription, Sale, Tutor,
};

/// Thread-safe store over a shared database handle.
///
/// Queries run synchronously under the lock; the guard never crosses an await.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(Arc::new(Mutex::new(Database::open_in_memory()?))))
    }

    /// Shared handle, for writers living next to the analytics.
    pub fn database(&self) -> Arc<Mutex<Database>> {
        Arc::clone(&self.db)
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> DbResult<T>) -> StoreResult<T> {
        let db = self.db.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&db)?)
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn tutors(&self) -> StoreResult<Vec<Tutor>> {
        self.with_db(|db| db.list_tutors())
    }

    async fn tutor(&self, tutor_id: &str) -> StoreResult<Option<Tutor>> {
        self.with_db(|db| db.get_tutor(tutor_id))
    }

    async fn patients(&self) -> StoreResult<Vec<Patient>> {
        self.with_db(|db| db.list_patients())
    }

    async fn patients_of(&self, tutor_id: &str) -> StoreResult<Vec<Patient>> {
        self.with_db(|db| db.list_patients_for_tutor(tutor_id))
    }

    async fn sales_between(&self, window: &DateWindow) -> StoreResult<Vec<Sale>> {
        self.with_db(|db| db.list_sales_between(window))
    }

    async fn tutor_sales_between(
        &self,
        tutor_id: &str,
        window: &DateWindow,
    ) -> StoreResult<Vec<Sale>> {
        self.with_db(|db| db.list_tutor_sales_between(tutor_id, window))
    }

    async fn appointments_between(
        &self,
        kind: AppointmentKind,
        window: &DateWindow,
    ) -> StoreResult<Vec<Appointment>> {
        self.with_db(|db| db.list_appointments_between(kind, window))
    }

    async fn tutor_appointments_between(
        &self,
        kind: AppointmentKind,
        tutor_id: &str,
        window: &DateWindow,
    ) -> StoreResult<Vec<Appointment>> {
        self.with_db(|db| db.list_tutor_appointments_between(kind, tutor_id, window))
    }

    async fn clinical_history(&self, patient_id: &str) -> StoreResult<Vec<ClinicalHistoryEntry>> {
        self.with_db(|db| db.list_clinical_history(patient_id))
    }

    async fn prescriptions(&self, patient_id: &str) -> StoreResult<Vec<Prescription>> {
        self.with_db(|db| db.list_prescriptions(patient_id))
    }

    async fn expirables(&self, patient_id: &str) -> StoreResult<Vec<Expirable>> {
        self.with_db(|db| db.list_expirables(patient_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_through_shared_handle() {
        let store = SqliteStore::open_in_memory().unwrap();
        {
            let db = store.database();
            let db = db.lock().unwrap();
            db.insert_tutor(&Tutor::new("Ana".into())).unwrap();
        }

        let tutors = store.tutors().await.unwrap();
        assert_eq!(tutors.len(), 1);
        assert!(store.tutor("missing").await.unwrap().is_none());
    }
}
