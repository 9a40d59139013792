//! Trend indicators comparing current and previous windows.

use serde::{Deserialize, Serialize};

/// Changes smaller than this many percent are reported as stable.
pub const STABLE_THRESHOLD_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
    New,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Stable => "stable",
            TrendDirection::New => "new",
        }
    }
}

/// Direction plus magnitude of change; `percentage` is never negative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Trend {
    pub direction: TrendDirection,
    pub percentage: f64,
}

impl Trend {
    pub fn stable() -> Self {
        Self {
            direction: TrendDirection::Stable,
            percentage: 0.0,
        }
    }

    /// Compare a current-window value against the previous window.
    pub fn compare(current: f64, previous: f64) -> Self {
        if previous == 0.0 {
            if current == 0.0 {
                return Self::stable();
            }
            return Self {
                direction: TrendDirection::New,
                percentage: 0.0,
            };
        }

        let change = (current - previous) / previous.abs() * 100.0;
        if change.abs() < STABLE_THRESHOLD_PCT {
            return Self::stable();
        }

        Self {
            direction: if change > 0.0 {
                TrendDirection::Up
            } else {
                TrendDirection::Down
            },
            percentage: change.abs().round(),
        }
    }

    /// Short label, e.g. `up 25%`.
    pub fn label(&self) -> String {
        match self.direction {
            TrendDirection::Up | TrendDirection::Down => {
                format!("{} {}%", self.direction.as_str(), self.percentage)
            }
            _ => self.direction.as_str().to_string(),
        }
    }
}
