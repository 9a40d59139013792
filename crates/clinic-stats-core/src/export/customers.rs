//! Customer ranking export.

use crate::models::TutorStatRecord;

/// Prepended so spreadsheet tools detect UTF-8 (tutor names carry accents).
pub const UTF8_BOM: &str = "\u{FEFF}";

const HEADER: &str = "rank,tutor_id,tutor_name,total_spent,purchase_count,average_ticket,engagement_score,spend_trend,frequency_trend,species,last_purchase,account_balance";

/// Export a ranked list to CSV, one row per record in the given order.
pub fn top_customers_csv(records: &[TutorStatRecord]) -> String {
    let mut csv = String::new();

    csv.push_str(UTF8_BOM);
    csv.push_str(HEADER);
    csv.push('\n');

    for (index, record) in records.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{:.2},{},{:.2},{},{},{},{},{},{:.2}\n",
            index + 1,
            escape_csv(&record.tutor_id),
            escape_csv(&record.tutor_name),
            record.total_spent,
            record.purchase_count,
            record.average_ticket,
            record.engagement_score,
            escape_csv(&record.spend_trend.label()),
            escape_csv(&record.frequency_trend.label()),
            escape_csv(&record.species.join("; ")),
            record
                .last_purchase
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_default(),
            record.account_balance,
        ));
    }

    csv
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityBreakdown;
    use crate::stats::{Trend, TrendDirection};

    fn make_record(name: &str, spent: f64) -> TutorStatRecord {
        TutorStatRecord {
            tutor_id: format!("id-{}", name),
            tutor_name: name.to_string(),
            total_spent: spent,
            purchase_count: 2,
            engagement_score: 14,
            spend_trend: Trend {
                direction: TrendDirection::Up,
                percentage: 25.0,
            },
            frequency_trend: Trend::stable(),
            breakdown: ActivityBreakdown::default(),
            last_purchase: None,
            average_ticket: spent / 2.0,
            species: vec!["Canino".into(), "Felino".into()],
            account_balance: -20.0,
        }
    }

    #[test]
    fn test_csv_has_bom_header_and_rows() {
        let csv = top_customers_csv(&[make_record("Ana", 1000.0), make_record("Luis", 500.0)]);

        assert!(csv.starts_with(UTF8_BOM));
        let lines: Vec<&str> = csv.trim_start_matches(UTF8_BOM).lines().collect();
        assert_eq!(lines.len(), 3); // Header + 2 tutors
        assert!(lines[0].starts_with("rank,tutor_id"));
        assert_eq!(
            lines[1],
            "1,id-Ana,Ana,1000.00,2,500.00,14,up 25%,stable,Canino; Felino,,-20.00"
        );
        assert!(lines[2].starts_with("2,id-Luis,Luis,500.00"));
    }

    #[test]
    fn test_names_with_commas_are_quoted() {
        let csv = top_customers_csv(&[make_record("Gómez, Ana", 10.0)]);
        assert!(csv.contains("\"Gómez, Ana\""));
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("line\rbreak"), "\"line\rbreak\"");
    }
}
