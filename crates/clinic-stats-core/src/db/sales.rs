//! Sale database operations.

use rusqlite::{params, Row};

use super::{decode_ts, encode_ts, Database, DbResult};
use crate::models::{DateWindow, Sale, SaleItem, TutorRef};

const SALE_COLUMNS: &str = "id, tutor_id, tutor_name, total, items, created_at";

fn row_to_sale(row: &Row<'_>) -> rusqlite::Result<Sale> {
    let items_json: String = row.get(4)?;
    let items: Vec<SaleItem> = serde_json::from_str(&items_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Sale {
        id: row.get(0)?,
        tutor: TutorRef {
            id: row.get(1)?,
            name: row.get(2)?,
        },
        total: row.get(3)?,
        items,
        created_at: decode_ts(5, row.get(5)?)?,
    })
}

impl Database {
    /// Insert a sale ticket.
    pub fn insert_sale(&self, sale: &Sale) -> DbResult<()> {
        let items_json = serde_json::to_string(&sale.items)?;
        self.conn.execute(
            r#"
            INSERT INTO sales (id, tutor_id, tutor_name, total, items, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                sale.id,
                sale.tutor.id,
                sale.tutor.name,
                sale.total,
                items_json,
                encode_ts(&sale.created_at),
            ],
        )?;
        Ok(())
    }

    /// List sales created inside a window.
    pub fn list_sales_between(&self, window: &DateWindow) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE created_at >= ?1 AND created_at {} ?2 ORDER BY created_at",
            SALE_COLUMNS,
            window.end_operator()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![encode_ts(&window.start), encode_ts(&window.end)],
            row_to_sale,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List one tutor's sales inside a window, newest first.
    pub fn list_tutor_sales_between(
        &self,
        tutor_id: &str,
        window: &DateWindow,
    ) -> DbResult<Vec<Sale>> {
        let sql = format!(
            r#"
            SELECT {} FROM sales
            WHERE tutor_id = ?1 AND created_at >= ?2 AND created_at {} ?3
            ORDER BY created_at DESC
            "#,
            SALE_COLUMNS,
            window.end_operator()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![tutor_id, encode_ts(&window.start), encode_ts(&window.end)],
            row_to_sale,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_sale(tutor: &TutorRef, total: f64, day: u32) -> Sale {
        let mut sale = Sale::new(
            tutor.clone(),
            total,
            vec![SaleItem {
                name: "Croquetas".into(),
                quantity: 1,
            }],
        );
        sale.created_at = Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap();
        sale
    }

    #[test]
    fn test_sales_between_filters_by_window() {
        let db = Database::open_in_memory().unwrap();
        let tutor = TutorRef {
            id: "t1".into(),
            name: "Ana".into(),
        };
        db.insert_sale(&make_sale(&tutor, 10.0, 1)).unwrap();
        db.insert_sale(&make_sale(&tutor, 20.0, 15)).unwrap();
        db.insert_sale(&make_sale(&tutor, 30.0, 30)).unwrap();

        let start = Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap();
        let window = DateWindow::new(start, start + Duration::days(10));
        let sales = db.list_sales_between(&window).unwrap();

        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].total, 20.0);
        assert_eq!(sales[0].items[0].name, "Croquetas");
        assert_eq!(sales[0].tutor, tutor);
    }

    #[test]
    fn test_tutor_sales_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let ana = TutorRef {
            id: "t1".into(),
            name: "Ana".into(),
        };
        let luis = TutorRef {
            id: "t2".into(),
            name: "Luis".into(),
        };
        db.insert_sale(&make_sale(&ana, 10.0, 1)).unwrap();
        db.insert_sale(&make_sale(&ana, 20.0, 2)).unwrap();
        db.insert_sale(&make_sale(&luis, 99.0, 2)).unwrap();

        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let window = DateWindow::new(start, start + Duration::days(31));
        let sales = db.list_tutor_sales_between("t1", &window).unwrap();

        let totals: Vec<_> = sales.iter().map(|s| s.total).collect();
        assert_eq!(totals, vec![20.0, 10.0]);
    }

    #[test]
    fn test_half_open_window_excludes_end() {
        let db = Database::open_in_memory().unwrap();
        let tutor = TutorRef {
            id: "t1".into(),
            name: "Ana".into(),
        };
        db.insert_sale(&make_sale(&tutor, 10.0, 15)).unwrap();

        let boundary = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
        let before = DateWindow::half_open(boundary - Duration::days(10), boundary);
        let after = DateWindow::new(boundary, boundary + Duration::days(10));

        assert!(db.list_sales_between(&before).unwrap().is_empty());
        assert!(db.list_tutor_sales_between("t1", &before).unwrap().is_empty());
        assert_eq!(db.list_sales_between(&after).unwrap().len(), 1);
    }
}
