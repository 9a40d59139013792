//! Customer analytics over the clinic's document store.
//!
//! Pipeline: Cache → Window Resolution → Bulk Reads → Batched Sub-collection
//! Reads → Aggregation → Ranking → Cache
//!
//! Concurrent misses for the same key each run the full pipeline; there is no
//! in-flight de-duplication.

mod aggregate;
mod batch;
mod cache;
mod decay;
mod period;
mod progress;
mod species;
mod trend;

pub use aggregate::*;
pub use batch::*;
pub use cache::*;
pub use decay::*;
pub use period::*;
pub use progress::*;
pub use species::*;
pub use trend::*;

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::StatsConfig;
use crate::models::{AppointmentKind, TopCustomers, TutorDetailedStats};
use crate::store::{DocumentStore, StoreError};

const HISTORY_SPAN: ProgressSpan = ProgressSpan::new(20, 25);
const PRESCRIPTIONS_SPAN: ProgressSpan = ProgressSpan::new(45, 25);
const EXPIRABLES_SPAN: ProgressSpan = ProgressSpan::new(70, 25);

/// Stats errors.
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Tutor not found: {0}")]
    TutorNotFound(String),
}

pub type StatsResult<T> = Result<T, StatsError>;

/// Entry point for customer statistics. Owns its result cache.
pub struct StatsService {
    store: Arc<dyn DocumentStore>,
    cache: StatsCache,
    clock: Arc<dyn Clock>,
    config: StatsConfig,
}

impl StatsService {
    /// Create a service on the wall clock.
    pub fn new(store: Arc<dyn DocumentStore>, config: StatsConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn DocumentStore>,
        config: StatsConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cache: StatsCache::new(config.cache_ttl()),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    pub fn cache(&self) -> &StatsCache {
        &self.cache
    }

    /// Drop every cached result so the next call recomputes.
    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Stats cache cleared");
    }

    /// Rank tutors by spend, purchase frequency and engagement.
    ///
    /// Served from the cache when an identical call was computed within the
    /// TTL. Any store failure outside the per-patient sub-collection reads
    /// aborts the whole aggregation.
    pub async fn calculate_top_customers(
        &self,
        species: SpeciesFilter,
        period: Period,
        limit: usize,
        on_progress: Option<&ProgressCallback>,
    ) -> StatsResult<Arc<TopCustomers>> {
        let progress = ProgressReporter::new(on_progress);
        let key = CacheKey {
            species,
            period,
            limit,
        };

        let now = self.clock.now();
        if let Some(cached) = self.cache.get(&key, now) {
            info!(key = %key, "Top customers served from cache");
            progress.report(ProgressStep::Complete, 100, "Loaded from cache");
            return Ok(cached);
        }

        info!(key = %key, "Computing top customers");
        let windows = period.resolve(now, self.config.all_time_start);
        let store = self.store.as_ref();

        let (
            tutors,
            patients,
            current_sales,
            previous_sales,
            clinic_appointments,
            grooming_appointments,
        ) = tokio::try_join!(
            store.tutors(),
            store.patients(),
            store.sales_between(&windows.current),
            store.sales_between(&windows.previous),
            store.appointments_between(AppointmentKind::Clinic, &windows.current),
            store.appointments_between(AppointmentKind::Grooming, &windows.current),
        )?;

        progress.report(
            ProgressStep::Tutors,
            10,
            format!("{} tutors loaded", tutors.len()),
        );
        progress.report(
            ProgressStep::Patients,
            15,
            format!("{} patients loaded", patients.len()),
        );
        progress.report(
            ProgressStep::Sales,
            20,
            format!(
                "{} sales analyzed ({} in previous period)",
                current_sales.len(),
                previous_sales.len()
            ),
        );

        let patient_ids: Vec<String> = qualifying_tutors(&tutors, &patients, species)
            .iter()
            .flat_map(|(_, owned)| owned.iter().map(|p| p.id.clone()))
            .collect();

        let plan = self.config.batch_plan();
        let history = fetch_in_batches(
            &patient_ids,
            move |id: String| async move { store.clinical_history(&id).await },
            &plan,
            &progress,
            ProgressStep::ClinicalHistory,
            HISTORY_SPAN,
        )
        .await;
        let prescriptions = fetch_in_batches(
            &patient_ids,
            move |id: String| async move { store.prescriptions(&id).await },
            &plan,
            &progress,
            ProgressStep::Prescriptions,
            PRESCRIPTIONS_SPAN,
        )
        .await;
        let expirables = fetch_in_batches(
            &patient_ids,
            move |id: String| async move { store.expirables(&id).await },
            &plan,
            &progress,
            ProgressStep::Expirables,
            EXPIRABLES_SPAN,
        )
        .await;

        let snapshot = Snapshot {
            tutors,
            patients,
            current_sales,
            previous_sales,
            clinic_appointments,
            grooming_appointments,
        };
        let subs = SubCollections {
            history,
            prescriptions,
            expirables,
        };

        let records = aggregate(&snapshot, &subs, &windows, species, now);
        let result = Arc::new(rank(records, limit, windows, now));

        self.cache.insert(key, Arc::clone(&result), self.clock.now());
        info!(
            key = %key,
            tutors = result.all.len(),
            failed_fetches = result.failed_fetches,
            "Top customers computed"
        );
        progress.report(
            ProgressStep::Complete,
            100,
            format!("{} customers analyzed", result.all.len()),
        );

        Ok(result)
    }

    /// Drill-down for one tutor over `period`. Never cached.
    pub async fn tutor_detailed_stats(
        &self,
        tutor_id: &str,
        period: Period,
    ) -> StatsResult<TutorDetailedStats> {
        let windows = period.resolve(self.clock.now(), self.config.all_time_start);
        let store = self.store.as_ref();

        let tutor = store
            .tutor(tutor_id)
            .await?
            .ok_or_else(|| StatsError::TutorNotFound(tutor_id.to_string()))?;

        let (patients, sales, previous_sales, clinic_appointments, grooming_appointments) = tokio::try_join!(
            store.patients_of(tutor_id),
            store.tutor_sales_between(tutor_id, &windows.current),
            store.tutor_sales_between(tutor_id, &windows.previous),
            store.tutor_appointments_between(AppointmentKind::Clinic, tutor_id, &windows.current),
            store.tutor_appointments_between(AppointmentKind::Grooming, tutor_id, &windows.current),
        )?;

        let total_spent: f64 = sales.iter().map(|s| s.total).sum();
        let previous_spent: f64 = previous_sales.iter().map(|s| s.total).sum();
        let purchase_count = sales.len() as u32;

        info!(
            tutor_id,
            period = %period,
            sales = sales.len(),
            patients = patients.len(),
            "Tutor detail computed"
        );

        Ok(TutorDetailedStats {
            top_products: top_products(&sales, self.config.top_products),
            last_purchase: sales.iter().map(|s| s.created_at).max(),
            average_ticket: average_ticket(total_spent, purchase_count),
            spend_trend: Trend::compare(total_spent, previous_spent),
            frequency_trend: Trend::compare(purchase_count as f64, previous_sales.len() as f64),
            total_spent,
            purchase_count,
            tutor,
            windows,
            patients,
            sales,
            clinic_appointments,
            grooming_appointments,
        })
    }
}
