//! Runtime configuration for the analytics pipeline.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::stats::{BatchPlan, DEFAULT_BATCH_SIZE, DEFAULT_CACHE_TTL_SECS};

/// Environment variable prefix read by [`StatsConfig::from_env`].
pub const ENV_PREFIX: &str = "CLINIC_STATS_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatsConfig {
    /// How long an aggregation result stays valid
    pub cache_ttl_secs: u64,
    /// Per-patient reads in flight per batch
    pub batch_size: usize,
    /// Pause between batches
    pub batch_delay_ms: u64,
    /// Start of the `all` period
    pub all_time_start: NaiveDate,
    /// Products listed in a tutor drill-down
    pub top_products: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: 100,
            all_time_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            top_products: 5,
        }
    }
}

impl StatsConfig {
    /// Defaults overlaid with `CLINIC_STATS_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.overlay(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok());
        config
    }

    /// Parse from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Apply overrides from `lookup`, keyed by the unprefixed upper-case field
    /// name. Unparseable values are ignored.
    pub fn overlay(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn parsed<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
            value.and_then(|v| v.trim().parse().ok())
        }

        if let Some(v) = parsed(lookup("CACHE_TTL_SECS")) {
            self.cache_ttl_secs = v;
        }
        if let Some(v) = parsed(lookup("BATCH_SIZE")) {
            self.batch_size = v;
        }
        if let Some(v) = parsed(lookup("BATCH_DELAY_MS")) {
            self.batch_delay_ms = v;
        }
        if let Some(v) = parsed(lookup("ALL_TIME_START")) {
            self.all_time_start = v;
        }
        if let Some(v) = parsed(lookup("TOP_PRODUCTS")) {
            self.top_products = v;
        }
        self.batch_size = self.batch_size.max(1);
    }

    fn normalized(mut self) -> Self {
        self.batch_size = self.batch_size.max(1);
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::seconds(self.cache_ttl_secs.min(i64::MAX as u64) as i64)
    }

    pub fn batch_plan(&self) -> BatchPlan {
        BatchPlan {
            batch_size: self.batch_size.max(1),
            delay: std::time::Duration::from_millis(self.batch_delay_ms),
        }
    }
}
