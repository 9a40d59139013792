//! In-process [`DocumentStore`] with read counting and failure injection.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{DocumentStore, StoreError, StoreResult};
use crate::models::{
    Appointment, AppointmentKind, ClinicalHistoryEntry, DateWindow, Expirable, Patient,
    Prescription, Sale, Tutor,
};

/// Store operations, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Tutors,
    Tutor,
    Patients,
    PatientsOf,
    SalesBetween,
    TutorSalesBetween,
    AppointmentsBetween,
    TutorAppointmentsBetween,
    ClinicalHistory,
    Prescriptions,
    Expirables,
}

#[derive(Default)]
struct MemoryData {
    tutors: Vec<Tutor>,
    patients: Vec<Patient>,
    sales: Vec<Sale>,
    appointments: Vec<Appointment>,
    history: Vec<ClinicalHistoryEntry>,
    prescriptions: Vec<Prescription>,
    expirables: Vec<Expirable>,
    failing_ops: HashSet<StoreOp>,
    failing_patients: HashSet<String>,
}

/// Vector-backed store. Every trait call counts as one read.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<MemoryData>,
    reads: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    /// Simulated latency of the per-patient sub-collection reads
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every per-patient read by `latency` so that overlap is observable.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    fn data(&self) -> MutexGuard<'_, MemoryData> {
        match self.data.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn insert_tutor(&self, tutor: Tutor) {
        self.data().tutors.push(tutor);
    }

    pub fn insert_patient(&self, patient: Patient) {
        self.data().patients.push(patient);
    }

    pub fn insert_sale(&self, sale: Sale) {
        self.data().sales.push(sale);
    }

    pub fn insert_appointment(&self, appointment: Appointment) {
        self.data().appointments.push(appointment);
    }

    pub fn insert_clinical_history(&self, entry: ClinicalHistoryEntry) {
        self.data().history.push(entry);
    }

    pub fn insert_prescription(&self, prescription: Prescription) {
        self.data().prescriptions.push(prescription);
    }

    pub fn insert_expirable(&self, expirable: Expirable) {
        self.data().expirables.push(expirable);
    }

    /// Make every call of `op` fail with [`StoreError::Unavailable`].
    pub fn fail_op(&self, op: StoreOp) {
        self.data().failing_ops.insert(op);
    }

    /// Make every sub-collection read of one patient fail.
    pub fn fail_patient(&self, patient_id: &str) {
        self.data().failing_patients.insert(patient_id.to_string());
    }

    /// Remove all injected failures.
    pub fn heal(&self) {
        let mut data = self.data();
        data.failing_ops.clear();
        data.failing_patients.clear();
    }

    /// Number of store reads issued so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn reset_read_count(&self) {
        self.reads.store(0, Ordering::SeqCst);
    }

    /// Highest number of per-patient reads observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn begin(&self, op: StoreOp) -> StoreResult<MutexGuard<'_, MemoryData>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let data = self.data();
        if data.failing_ops.contains(&op) {
            return Err(StoreError::Unavailable(format!("{:?} failed", op)));
        }
        Ok(data)
    }

    async fn patient_read<T: Clone>(
        &self,
        op: StoreOp,
        patient_id: &str,
        select: impl Fn(&MemoryData) -> Vec<T>,
    ) -> StoreResult<Vec<T>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let data = self.begin(op)?;
        if data.failing_patients.contains(patient_id) {
            return Err(StoreError::Unavailable(format!(
                "{:?} failed for patient {}",
                op, patient_id
            )));
        }
        Ok(select(&data))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn tutors(&self) -> StoreResult<Vec<Tutor>> {
        Ok(self.begin(StoreOp::Tutors)?.tutors.clone())
    }

    async fn tutor(&self, tutor_id: &str) -> StoreResult<Option<Tutor>> {
        let data = self.begin(StoreOp::Tutor)?;
        Ok(data.tutors.iter().find(|t| t.id == tutor_id).cloned())
    }

    async fn patients(&self) -> StoreResult<Vec<Patient>> {
        Ok(self.begin(StoreOp::Patients)?.patients.clone())
    }

    async fn patients_of(&self, tutor_id: &str) -> StoreResult<Vec<Patient>> {
        let data = self.begin(StoreOp::PatientsOf)?;
        Ok(data
            .patients
            .iter()
            .filter(|p| p.tutor_id == tutor_id)
            .cloned()
            .collect())
    }

    async fn sales_between(&self, window: &DateWindow) -> StoreResult<Vec<Sale>> {
        let data = self.begin(StoreOp::SalesBetween)?;
        Ok(data
            .sales
            .iter()
            .filter(|s| window.contains(s.created_at))
            .cloned()
            .collect())
    }

    async fn tutor_sales_between(
        &self,
        tutor_id: &str,
        window: &DateWindow,
    ) -> StoreResult<Vec<Sale>> {
        let data = self.begin(StoreOp::TutorSalesBetween)?;
        let mut sales: Vec<Sale> = data
            .sales
            .iter()
            .filter(|s| s.tutor.id == tutor_id && window.contains(s.created_at))
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sales)
    }

    async fn appointments_between(
        &self,
        kind: AppointmentKind,
        window: &DateWindow,
    ) -> StoreResult<Vec<Appointment>> {
        let data = self.begin(StoreOp::AppointmentsBetween)?;
        Ok(data
            .appointments
            .iter()
            .filter(|a| a.kind == kind && window.contains(a.starts_at))
            .cloned()
            .collect())
    }

    async fn tutor_appointments_between(
        &self,
        kind: AppointmentKind,
        tutor_id: &str,
        window: &DateWindow,
    ) -> StoreResult<Vec<Appointment>> {
        let data = self.begin(StoreOp::TutorAppointmentsBetween)?;
        Ok(data
            .appointments
            .iter()
            .filter(|a| a.kind == kind && a.tutor_id == tutor_id && window.contains(a.starts_at))
            .cloned()
            .collect())
    }

    async fn clinical_history(&self, patient_id: &str) -> StoreResult<Vec<ClinicalHistoryEntry>> {
        self.patient_read(StoreOp::ClinicalHistory, patient_id, |data| {
            data.history
                .iter()
                .filter(|e| e.patient_id == patient_id)
                .cloned()
                .collect()
        })
        .await
    }

    async fn prescriptions(&self, patient_id: &str) -> StoreResult<Vec<Prescription>> {
        self.patient_read(StoreOp::Prescriptions, patient_id, |data| {
            data.prescriptions
                .iter()
                .filter(|p| p.patient_id == patient_id)
                .cloned()
                .collect()
        })
        .await
    }

    async fn expirables(&self, patient_id: &str) -> StoreResult<Vec<Expirable>> {
        self.patient_read(StoreOp::Expirables, patient_id, |data| {
            data.expirables
                .iter()
                .filter(|e| e.patient_id == patient_id)
                .cloned()
                .collect()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_call_counts_as_a_read() {
        let store = MemoryStore::new();
        store.insert_tutor(Tutor::new("Ana".into()));

        store.tutors().await.unwrap();
        store.patients().await.unwrap();
        store.clinical_history("p1").await.unwrap();
        assert_eq!(store.read_count(), 3);

        store.reset_read_count();
        assert_eq!(store.read_count(), 0);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new();
        store.fail_op(StoreOp::Patients);
        store.fail_patient("p1");

        assert!(store.patients().await.is_err());
        assert!(store.prescriptions("p1").await.is_err());
        assert!(store.prescriptions("p2").await.is_ok());

        store.heal();
        assert!(store.patients().await.is_ok());
        assert!(store.prescriptions("p1").await.is_ok());
    }
}
