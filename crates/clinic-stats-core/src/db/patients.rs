//! Patient database operations.

use rusqlite::{params, Row};

use super::{decode_ts, encode_ts, Database, DbResult};
use crate::models::Patient;

fn row_to_patient(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        tutor_id: row.get(1)?,
        name: row.get(2)?,
        species: row.get(3)?,
        breed: row.get(4)?,
        created_at: decode_ts(5, row.get(5)?)?,
    })
}

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (id, tutor_id, name, species, breed, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                patient.id,
                patient.tutor_id,
                patient.name,
                patient.species,
                patient.breed,
                encode_ts(&patient.created_at),
            ],
        )?;
        Ok(())
    }

    /// List all patients.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, tutor_id, name, species, breed, created_at
            FROM patients
            ORDER BY created_at, id
            "#,
        )?;
        let rows = stmt.query_map([], row_to_patient)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List the patients owned by one tutor.
    pub fn list_patients_for_tutor(&self, tutor_id: &str) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, tutor_id, name, species, breed, created_at
            FROM patients
            WHERE tutor_id = ?
            ORDER BY created_at, id
            "#,
        )?;
        let rows = stmt.query_map([tutor_id], row_to_patient)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tutor;

    fn setup_db() -> (Database, Tutor) {
        let db = Database::open_in_memory().unwrap();
        let tutor = Tutor::new("Ana".into());
        db.insert_tutor(&tutor).unwrap();
        (db, tutor)
    }

    #[test]
    fn test_insert_and_list() {
        let (db, tutor) = setup_db();

        let mut patient = Patient::new(tutor.id.clone(), "Max".into(), "Canino".into());
        patient.breed = Some("Golden Retriever".into());
        db.insert_patient(&patient).unwrap();

        let all = db.list_patients().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].species, "Canino");
        assert_eq!(all[0].breed, Some("Golden Retriever".into()));
    }

    #[test]
    fn test_list_for_tutor() {
        let (db, tutor) = setup_db();
        let other = Tutor::new("Luis".into());
        db.insert_tutor(&other).unwrap();

        db.insert_patient(&Patient::new(tutor.id.clone(), "Max".into(), "Canino".into()))
            .unwrap();
        db.insert_patient(&Patient::new(other.id.clone(), "Mishi".into(), "Felino".into()))
            .unwrap();

        let mine = db.list_patients_for_tutor(&tutor.id).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "Max");
    }

    #[test]
    fn test_patient_requires_existing_tutor() {
        let (db, _) = setup_db();
        let orphan = Patient::new("missing".into(), "Max".into(), "Canino".into());
        assert!(db.insert_patient(&orphan).is_err());
    }
}
