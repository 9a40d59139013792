//! Appointment database operations.

use rusqlite::types::Type;
use rusqlite::{params, Row};

use super::{decode_ts, encode_ts, Database, DbResult};
use crate::models::{Appointment, AppointmentKind, DateWindow};

fn row_to_appointment(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    let kind: String = row.get(1)?;
    let kind = AppointmentKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("unknown appointment kind: {}", kind).into(),
        )
    })?;

    Ok(Appointment {
        id: row.get(0)?,
        kind,
        tutor_id: row.get(2)?,
        patient_id: row.get(3)?,
        starts_at: decode_ts(4, row.get(4)?)?,
    })
}

impl Database {
    /// Insert an appointment.
    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO appointments (id, kind, tutor_id, patient_id, starts_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                appointment.id,
                appointment.kind.as_str(),
                appointment.tutor_id,
                appointment.patient_id,
                encode_ts(&appointment.starts_at),
            ],
        )?;
        Ok(())
    }

    /// List appointments of one kind starting inside a window.
    pub fn list_appointments_between(
        &self,
        kind: AppointmentKind,
        window: &DateWindow,
    ) -> DbResult<Vec<Appointment>> {
        let sql = format!(
            r#"
            SELECT id, kind, tutor_id, patient_id, starts_at
            FROM appointments
            WHERE kind = ?1 AND starts_at >= ?2 AND starts_at {} ?3
            ORDER BY starts_at
            "#,
            window.end_operator()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                kind.as_str(),
                encode_ts(&window.start),
                encode_ts(&window.end)
            ],
            row_to_appointment,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List one tutor's appointments of one kind starting inside a window.
    pub fn list_tutor_appointments_between(
        &self,
        kind: AppointmentKind,
        tutor_id: &str,
        window: &DateWindow,
    ) -> DbResult<Vec<Appointment>> {
        let sql = format!(
            r#"
            SELECT id, kind, tutor_id, patient_id, starts_at
            FROM appointments
            WHERE kind = ?1 AND tutor_id = ?2 AND starts_at >= ?3 AND starts_at {} ?4
            ORDER BY starts_at
            "#,
            window.end_operator()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                kind.as_str(),
                tutor_id,
                encode_ts(&window.start),
                encode_ts(&window.end)
            ],
            row_to_appointment,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
