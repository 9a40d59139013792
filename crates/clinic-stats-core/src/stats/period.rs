//! Period selector and date-range resolution.

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{DateWindow, WindowPair};

/// Look-back period chosen by the caller.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Period {
    #[serde(rename = "3months")]
    ThreeMonths,
    #[default]
    #[serde(rename = "6months")]
    SixMonths,
    #[serde(rename = "1year")]
    OneYear,
    #[serde(rename = "all")]
    All,
}

impl Period {
    /// Parse a period token. Unknown tokens fall back to six months.
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "3months" => Period::ThreeMonths,
            "6months" => Period::SixMonths,
            "1year" => Period::OneYear,
            "all" => Period::All,
            _ => Period::default(),
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            Period::ThreeMonths => "3months",
            Period::SixMonths => "6months",
            Period::OneYear => "1year",
            Period::All => "all",
        }
    }

    fn months_back(&self) -> Option<u32> {
        match self {
            Period::ThreeMonths => Some(3),
            Period::SixMonths => Some(6),
            Period::OneYear => Some(12),
            Period::All => None,
        }
    }

    /// Resolve the current window ending today and the equally long window
    /// immediately before it.
    ///
    /// `all_time_start` anchors [`Period::All`].
    pub fn resolve(&self, now: DateTime<Utc>, all_time_start: NaiveDate) -> WindowPair {
        let today = now.date_naive();
        let start_date = self
            .months_back()
            .and_then(|months| today.checked_sub_months(Months::new(months)))
            .unwrap_or(all_time_start);

        let start = start_of_day(start_date);
        let end = start_of_day(today) + Duration::days(1) - Duration::milliseconds(1);
        let length = end - start;

        WindowPair {
            current: DateWindow::new(start, end),
            previous: DateWindow::half_open(start - length, start),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
