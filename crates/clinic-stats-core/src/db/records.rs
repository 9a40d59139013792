//! Per-patient sub-collection operations.

use rusqlite::params;

use super::{decode_opt_ts, encode_opt_ts, Database, DbResult};
use crate::models::{ClinicalHistoryEntry, Expirable, Prescription};

impl Database {
    pub fn insert_clinical_history(&self, entry: &ClinicalHistoryEntry) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO clinical_history (id, patient_id, recorded_at, summary) VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.id,
                entry.patient_id,
                encode_opt_ts(&entry.recorded_at),
                entry.summary,
            ],
        )?;
        Ok(())
    }

    pub fn list_clinical_history(&self, patient_id: &str) -> DbResult<Vec<ClinicalHistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, patient_id, recorded_at, summary FROM clinical_history WHERE patient_id = ?",
        )?;
        let rows = stmt.query_map([patient_id], |row| {
            Ok(ClinicalHistoryEntry {
                id: row.get(0)?,
                patient_id: row.get(1)?,
                recorded_at: decode_opt_ts(2, row.get(2)?)?,
                summary: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn insert_prescription(&self, prescription: &Prescription) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO prescriptions (id, patient_id, issued_at, medication) VALUES (?1, ?2, ?3, ?4)",
            params![
                prescription.id,
                prescription.patient_id,
                encode_opt_ts(&prescription.issued_at),
                prescription.medication,
            ],
        )?;
        Ok(())
    }

    pub fn list_prescriptions(&self, patient_id: &str) -> DbResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, patient_id, issued_at, medication FROM prescriptions WHERE patient_id = ?",
        )?;
        let rows = stmt.query_map([patient_id], |row| {
            Ok(Prescription {
                id: row.get(0)?,
                patient_id: row.get(1)?,
                issued_at: decode_opt_ts(2, row.get(2)?)?,
                medication: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn insert_expirable(&self, expirable: &Expirable) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO expirables (id, patient_id, name, created_at, due_at, supplied)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                expirable.id,
                expirable.patient_id,
                expirable.name,
                encode_opt_ts(&expirable.created_at),
                encode_opt_ts(&expirable.due_at),
                expirable.supplied,
            ],
        )?;
        Ok(())
    }

    pub fn list_expirables(&self, patient_id: &str) -> DbResult<Vec<Expirable>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, name, created_at, due_at, supplied
            FROM expirables
            WHERE patient_id = ?
            "#,
        )?;
        let rows = stmt.query_map([patient_id], |row| {
            Ok(Expirable {
                id: row.get(0)?,
                patient_id: row.get(1)?,
                name: row.get(2)?,
                created_at: decode_opt_ts(3, row.get(3)?)?,
                due_at: decode_opt_ts(4, row.get(4)?)?,
                supplied: row.get(5)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Patient, Tutor};
    use chrono::Utc;

    fn setup() -> (Database, Patient) {
        let db = Database::open_in_memory().unwrap();
        let tutor = Tutor::new("Ana".into());
        db.insert_tutor(&tutor).unwrap();
        let patient = Patient::new(tutor.id, "Max".into(), "Canino".into());
        db.insert_patient(&patient).unwrap();
        (db, patient)
    }

    #[test]
    fn test_history_keeps_missing_timestamp() {
        let (db, patient) = setup();
        let mut entry = ClinicalHistoryEntry::new(patient.id.clone(), "Control".into(), Utc::now());
        entry.recorded_at = None;
        db.insert_clinical_history(&entry).unwrap();

        let entries = db.list_clinical_history(&patient.id).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].recorded_at.is_none());
    }

    #[test]
    fn test_expirable_supplied_flag() {
        let (db, patient) = setup();
        let mut vaccine = Expirable::new(patient.id.clone(), "Rabia".into(), Utc::now());
        vaccine.supplied = true;
        db.insert_expirable(&vaccine).unwrap();
        db.insert_prescription(&Prescription::new(
            patient.id.clone(),
            "Carprofeno".into(),
            Utc::now(),
        ))
        .unwrap();

        let expirables = db.list_expirables(&patient.id).unwrap();
        assert!(expirables[0].supplied);
        assert_eq!(db.list_prescriptions(&patient.id).unwrap().len(), 1);
        assert!(db.list_expirables("other").unwrap().is_empty());
    }
}
