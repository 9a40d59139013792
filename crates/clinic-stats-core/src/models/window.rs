//! Date windows used to scope queries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Date range, inclusive at `start`. `end` is inclusive unless `end_exclusive`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub end_exclusive: bool,
}

impl DateWindow {
    /// Closed range `[start, end]`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            end_exclusive: false,
        }
    }

    /// Half-open range `[start, end)`, for a window that ends where another begins.
    pub fn half_open(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            end_exclusive: true,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && if self.end_exclusive { ts < self.end } else { ts <= self.end }
    }

    /// SQL comparison operator for the upper bound.
    pub fn end_operator(&self) -> &'static str {
        if self.end_exclusive {
            "<"
        } else {
            "<="
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Current window plus the equally long window right before it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowPair {
    pub current: DateWindow,
    pub previous: DateWindow,
}
