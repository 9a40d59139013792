//! Per-tutor aggregation and ranking.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::batch::FetchResults;
use super::decay::decay_weight;
use super::{SpeciesFilter, Trend};
use crate::models::{
    ActivityBreakdown, Appointment, ClinicalHistoryEntry, Dated, DateWindow, Expirable, Patient,
    Prescription, ProductTally, Sale, TopCustomers, Tutor, TutorStatRecord, WindowPair,
};

pub const WEIGHT_CLINICAL_HISTORY: f64 = 2.0;
pub const WEIGHT_PRESCRIPTION: f64 = 2.5;
pub const WEIGHT_EXPIRABLE_SUPPLIED: f64 = 1.5;
pub const WEIGHT_EXPIRABLE_PENDING: f64 = 1.5;
pub const WEIGHT_CLINIC_APPOINTMENT: f64 = 3.0;
pub const WEIGHT_GROOMING_APPOINTMENT: f64 = 2.0;

/// Bulk reads the aggregation runs over.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub tutors: Vec<Tutor>,
    pub patients: Vec<Patient>,
    pub current_sales: Vec<Sale>,
    pub previous_sales: Vec<Sale>,
    pub clinic_appointments: Vec<Appointment>,
    pub grooming_appointments: Vec<Appointment>,
}

/// Per-patient sub-collection reads.
#[derive(Debug, Clone, Default)]
pub struct SubCollections {
    pub history: FetchResults<ClinicalHistoryEntry>,
    pub prescriptions: FetchResults<Prescription>,
    pub expirables: FetchResults<Expirable>,
}

/// Tutors owning at least one patient and passing the species filter, in
/// tutor order, each with all of their patients.
pub fn qualifying_tutors<'a>(
    tutors: &'a [Tutor],
    patients: &'a [Patient],
    filter: SpeciesFilter,
) -> Vec<(&'a Tutor, Vec<&'a Patient>)> {
    let mut by_tutor: HashMap<&str, Vec<&Patient>> = HashMap::new();
    for patient in patients {
        by_tutor.entry(patient.tutor_id.as_str()).or_default().push(patient);
    }

    tutors
        .iter()
        .filter_map(|tutor| {
            let owned = by_tutor.remove(tutor.id.as_str())?;
            filter.matches_any(&owned).then_some((tutor, owned))
        })
        .collect()
}

fn group_by_tutor<'a, T>(
    items: &'a [T],
    tutor_id: impl Fn(&T) -> &str,
) -> HashMap<&'a str, Vec<&'a T>> {
    let mut grouped: HashMap<&str, Vec<&T>> = HashMap::new();
    for item in items {
        grouped.entry(tutor_id(item)).or_default().push(item);
    }
    grouped
}

/// Records without a timestamp are always counted.
fn in_window<T: Dated>(record: &T, window: &DateWindow) -> bool {
    record.timestamp().map_or(true, |ts| window.contains(ts))
}

fn window_sales<'a>(sales: Option<&Vec<&'a Sale>>, window: &DateWindow) -> Vec<&'a Sale> {
    sales
        .map(|sales| {
            sales
                .iter()
                .copied()
                .filter(|s| window.contains(s.created_at))
                .collect()
        })
        .unwrap_or_default()
}

fn window_appointments<'a>(
    appointments: Option<&Vec<&'a Appointment>>,
    window: &DateWindow,
) -> Vec<&'a Appointment> {
    appointments
        .map(|appointments| {
            appointments
                .iter()
                .copied()
                .filter(|a| window.contains(a.starts_at))
                .collect()
        })
        .unwrap_or_default()
}

fn outcome_records<'a, T>(results: &'a FetchResults<T>, patient_id: &str) -> (&'a [T], bool) {
    match results.get(patient_id) {
        Some(outcome) => (outcome.records(), outcome.is_failed()),
        None => (&[], false),
    }
}

/// Fold the snapshot into one record per qualifying tutor.
pub fn aggregate(
    snapshot: &Snapshot,
    subs: &SubCollections,
    windows: &WindowPair,
    filter: SpeciesFilter,
    now: DateTime<Utc>,
) -> Vec<TutorStatRecord> {
    let current_sales = group_by_tutor(&snapshot.current_sales, |s| s.tutor.id.as_str());
    let previous_sales = group_by_tutor(&snapshot.previous_sales, |s| s.tutor.id.as_str());
    let clinic_by_tutor = group_by_tutor(&snapshot.clinic_appointments, |a| a.tutor_id.as_str());
    let grooming_by_tutor =
        group_by_tutor(&snapshot.grooming_appointments, |a| a.tutor_id.as_str());

    qualifying_tutors(&snapshot.tutors, &snapshot.patients, filter)
        .into_iter()
        .map(|(tutor, patients)| {
            let key = tutor.id.as_str();
            let current = window_sales(current_sales.get(key), &windows.current);
            let previous = window_sales(previous_sales.get(key), &windows.previous);
            let clinic = window_appointments(clinic_by_tutor.get(key), &windows.current);
            let grooming = window_appointments(grooming_by_tutor.get(key), &windows.current);

            build_record(
                tutor,
                &patients,
                TutorActivity {
                    current_sales: &current,
                    previous_sales: &previous,
                    clinic_appointments: &clinic,
                    grooming_appointments: &grooming,
                },
                subs,
                &windows.current,
                now,
            )
        })
        .collect()
}

struct TutorActivity<'a> {
    current_sales: &'a [&'a Sale],
    previous_sales: &'a [&'a Sale],
    clinic_appointments: &'a [&'a Appointment],
    grooming_appointments: &'a [&'a Appointment],
}

fn build_record(
    tutor: &Tutor,
    patients: &[&Patient],
    activity: TutorActivity<'_>,
    subs: &SubCollections,
    window: &DateWindow,
    now: DateTime<Utc>,
) -> TutorStatRecord {
    let mut breakdown = ActivityBreakdown::default();
    let mut score = 0.0;

    for patient in patients {
        let (history, failed) = outcome_records(&subs.history, &patient.id);
        breakdown.failed_fetches += failed as u32;
        for entry in history.iter().filter(|e| in_window(*e, window)) {
            breakdown.clinical_history += 1;
            score += WEIGHT_CLINICAL_HISTORY * decay_weight(entry.timestamp(), now);
        }

        let (prescriptions, failed) = outcome_records(&subs.prescriptions, &patient.id);
        breakdown.failed_fetches += failed as u32;
        for prescription in prescriptions.iter().filter(|p| in_window(*p, window)) {
            breakdown.prescriptions += 1;
            score += WEIGHT_PRESCRIPTION * decay_weight(prescription.timestamp(), now);
        }

        let (expirables, failed) = outcome_records(&subs.expirables, &patient.id);
        breakdown.failed_fetches += failed as u32;
        for expirable in expirables.iter().filter(|e| in_window(*e, window)) {
            breakdown.expirables += 1;
            if expirable.supplied {
                breakdown.expirables_supplied += 1;
                score += WEIGHT_EXPIRABLE_SUPPLIED;
            } else {
                score += WEIGHT_EXPIRABLE_PENDING;
            }
        }
    }

    for appointment in activity.clinic_appointments {
        breakdown.clinic_appointments += 1;
        score += WEIGHT_CLINIC_APPOINTMENT * decay_weight(Some(appointment.starts_at), now);
    }
    for appointment in activity.grooming_appointments {
        breakdown.grooming_appointments += 1;
        score += WEIGHT_GROOMING_APPOINTMENT * decay_weight(Some(appointment.starts_at), now);
    }

    let total_spent: f64 = activity.current_sales.iter().map(|s| s.total).sum();
    let previous_spent: f64 = activity.previous_sales.iter().map(|s| s.total).sum();
    let purchase_count = activity.current_sales.len() as u32;
    breakdown.purchases = purchase_count;

    let mut species: Vec<String> = Vec::new();
    for patient in patients {
        if !species.contains(&patient.species) {
            species.push(patient.species.clone());
        }
    }

    TutorStatRecord {
        tutor_id: tutor.id.clone(),
        tutor_name: tutor.name.clone(),
        total_spent,
        purchase_count,
        engagement_score: score.round() as u32,
        spend_trend: Trend::compare(total_spent, previous_spent),
        frequency_trend: Trend::compare(
            purchase_count as f64,
            activity.previous_sales.len() as f64,
        ),
        breakdown,
        last_purchase: activity.current_sales.iter().map(|s| s.created_at).max(),
        average_ticket: average_ticket(total_spent, purchase_count),
        species,
        account_balance: tutor.account_balance,
    }
}

pub fn average_ticket(total: f64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

fn top_by<F>(records: &[TutorStatRecord], limit: usize, mut cmp: F) -> Vec<TutorStatRecord>
where
    F: FnMut(&TutorStatRecord, &TutorStatRecord) -> std::cmp::Ordering,
{
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| cmp(a, b));
    sorted.truncate(limit);
    sorted
}

/// Build the three ranked views plus the full set.
pub fn rank(
    records: Vec<TutorStatRecord>,
    limit: usize,
    windows: WindowPair,
    generated_at: DateTime<Utc>,
) -> TopCustomers {
    let by_spent = top_by(&records, limit, |a, b| b.total_spent.total_cmp(&a.total_spent));
    let by_frequency = top_by(&records, limit, |a, b| b.purchase_count.cmp(&a.purchase_count));
    let by_engagement = top_by(&records, limit, |a, b| {
        b.engagement_score.cmp(&a.engagement_score)
    });
    let failed_fetches = records.iter().map(|r| r.breakdown.failed_fetches).sum();

    TopCustomers {
        by_spent,
        by_frequency,
        by_engagement,
        all: records,
        windows,
        generated_at,
        failed_fetches,
    }
}

/// Units sold per product name, most sold first.
pub fn top_products(sales: &[Sale], limit: usize) -> Vec<ProductTally> {
    let mut tally: HashMap<&str, ProductTally> = HashMap::new();
    for sale in sales {
        for item in &sale.items {
            let entry = tally.entry(item.name.as_str()).or_insert_with(|| ProductTally {
                name: item.name.clone(),
                quantity: 0,
                occurrences: 0,
            });
            entry.quantity += item.quantity;
            entry.occurrences += 1;
        }
    }

    let mut products: Vec<ProductTally> = tally.into_values().collect();
    products.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
    products.truncate(limit);
    products
}
