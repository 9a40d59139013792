//! Time-decay weighting.

use chrono::{DateTime, Datelike, Utc};

/// Weight lost per calendar month of age.
pub const DECAY_PER_MONTH: f64 = 0.2;

/// Lowest weight a record can decay to.
pub const DECAY_FLOOR: f64 = 0.5;

/// Whole calendar months between `ts` and `now`, never negative.
pub fn months_between(ts: DateTime<Utc>, now: DateTime<Utc>) -> i32 {
    let months = (now.year() - ts.year()) * 12 + now.month() as i32 - ts.month() as i32;
    months.max(0)
}

/// Decay multiplier in `[0.5, 1.0]`.
///
/// A missing timestamp carries full weight.
pub fn decay_weight(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match ts {
        Some(ts) => {
            let months = months_between(ts, now) as f64;
            (1.0 - DECAY_PER_MONTH * months).max(DECAY_FLOOR)
        }
        None => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_same_month_is_full_weight() {
        assert_eq!(decay_weight(Some(at(2024, 6, 1)), at(2024, 6, 30)), 1.0);
    }

    #[test]
    fn test_calendar_months_not_elapsed_days() {
        // One day apart but across a month boundary.
        assert_eq!(months_between(at(2024, 5, 31), at(2024, 6, 1)), 1);
        assert!((decay_weight(Some(at(2024, 5, 31)), at(2024, 6, 1)) - 0.8).abs() < 1e-9);
        assert_eq!(months_between(at(2023, 11, 15), at(2024, 2, 1)), 3);
    }

    #[test]
    fn test_floor() {
        assert_eq!(decay_weight(Some(at(2024, 3, 1)), at(2024, 6, 1)), DECAY_FLOOR);
        assert_eq!(decay_weight(Some(at(2019, 1, 1)), at(2024, 6, 1)), DECAY_FLOOR);
    }

    #[test]
    fn test_missing_timestamp_is_full_weight() {
        assert_eq!(decay_weight(None, at(2024, 6, 1)), 1.0);
    }

    #[test]
    fn test_future_timestamp_is_full_weight() {
        assert_eq!(decay_weight(Some(at(2024, 9, 1)), at(2024, 6, 1)), 1.0);
    }

    proptest! {
        #[test]
        fn prop_weight_stays_in_range(ts in 0i64..4_000_000_000i64, now in 0i64..4_000_000_000i64) {
            let ts = Utc.timestamp_opt(ts, 0).unwrap();
            let now = Utc.timestamp_opt(now, 0).unwrap();
            let weight = decay_weight(Some(ts), now);
            prop_assert!(weight >= DECAY_FLOOR);
            prop_assert!(weight <= 1.0);
        }
    }
}
