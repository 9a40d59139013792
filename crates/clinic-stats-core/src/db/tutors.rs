//! Tutor database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{decode_ts, encode_ts, Database, DbError, DbResult};
use crate::models::Tutor;

fn row_to_tutor(row: &Row<'_>) -> rusqlite::Result<Tutor> {
    Ok(Tutor {
        id: row.get(0)?,
        name: row.get(1)?,
        account_balance: row.get(2)?,
        created_at: decode_ts(3, row.get(3)?)?,
    })
}

impl Database {
    /// Insert a new tutor.
    pub fn insert_tutor(&self, tutor: &Tutor) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO tutors (id, name, account_balance, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                tutor.id,
                tutor.name,
                tutor.account_balance,
                encode_ts(&tutor.created_at),
            ],
        )?;
        Ok(())
    }

    /// Set a tutor's account balance.
    pub fn update_tutor_balance(&self, tutor_id: &str, balance: f64) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            "UPDATE tutors SET account_balance = ?2 WHERE id = ?1",
            params![tutor_id, balance],
        )?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("tutor {}", tutor_id)));
        }
        Ok(())
    }

    /// Get a tutor that must exist.
    pub fn require_tutor(&self, id: &str) -> DbResult<Tutor> {
        self.get_tutor(id)?
            .ok_or_else(|| DbError::NotFound(format!("tutor {}", id)))
    }

    /// Get a tutor by ID.
    pub fn get_tutor(&self, id: &str) -> DbResult<Option<Tutor>> {
        self.conn
            .query_row(
                "SELECT id, name, account_balance, created_at FROM tutors WHERE id = ?",
                [id],
                row_to_tutor,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all tutors.
    pub fn list_tutors(&self) -> DbResult<Vec<Tutor>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, account_balance, created_at FROM tutors ORDER BY name, id",
        )?;
        let rows = stmt.query_map([], row_to_tutor)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();

        let mut tutor = Tutor::new("Ana".into());
        tutor.account_balance = -150.5;
        db.insert_tutor(&tutor).unwrap();

        let retrieved = db.get_tutor(&tutor.id).unwrap().unwrap();
        assert_eq!(retrieved.name, "Ana");
        assert_eq!(retrieved.account_balance, -150.5);
        assert_eq!(
            retrieved.created_at.timestamp_millis(),
            tutor.created_at.timestamp_millis()
        );
    }

    #[test]
    fn test_update_balance() {
        let db = Database::open_in_memory().unwrap();
        let tutor = Tutor::new("Ana".into());
        db.insert_tutor(&tutor).unwrap();

        db.update_tutor_balance(&tutor.id, 42.0).unwrap();
        assert!(matches!(
            db.update_tutor_balance("missing", 1.0),
            Err(DbError::NotFound(_))
        ));
        assert_eq!(db.get_tutor(&tutor.id).unwrap().unwrap().account_balance, 42.0);
    }

    #[test]
    fn test_list_tutors_sorted_by_name() {
        let db = Database::open_in_memory().unwrap();
        db.insert_tutor(&Tutor::new("Zoe".into())).unwrap();
        db.insert_tutor(&Tutor::new("Bruno".into())).unwrap();

        let names: Vec<_> = db.list_tutors().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Bruno", "Zoe"]);
    }

    #[test]
    fn test_require_tutor() {
        let db = Database::open_in_memory().unwrap();
        let tutor = Tutor::new("Ana".into());
        db.insert_tutor(&tutor).unwrap();

        assert_eq!(db.require_tutor(&tutor.id).unwrap().name, "Ana");
        assert!(matches!(db.require_tutor("missing"), Err(DbError::NotFound(_))));
    }
}
