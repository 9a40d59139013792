//! TTL cache for aggregation results.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Period, SpeciesFilter};
use crate::models::TopCustomers;

/// Default time-to-live for cached results.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

/// Arguments that fully determine an aggregation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub species: SpeciesFilter,
    pub period: Period,
    pub limit: usize,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.species, self.period, self.limit)
    }
}

struct CacheEntry {
    data: Arc<TopCustomers>,
    written_at: DateTime<Utc>,
}

/// Result cache owned by a `StatsService`.
///
/// Entries are only checked for age on read; stale ones stay in the map until
/// overwritten or cleared. There is no size bound.
pub struct StatsCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl StatsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        // A panic while holding the lock cannot leave an entry half-written.
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Cached result for `key` if it was written less than `ttl` before `now`.
    pub fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<Arc<TopCustomers>> {
        let entries = self.entries();
        let entry = entries.get(key)?;
        if now - entry.written_at < self.ttl {
            Some(Arc::clone(&entry.data))
        } else {
            None
        }
    }

    /// Store a result, replacing any previous entry.
    pub fn insert(&self, key: CacheKey, data: Arc<TopCustomers>, now: DateTime<Utc>) {
        self.entries().insert(
            key,
            CacheEntry {
                data,
                written_at: now,
            },
        );
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Number of entries, including stale ones.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StatsCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_CACHE_TTL_SECS as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateWindow, WindowPair};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    }

    fn result() -> Arc<TopCustomers> {
        let window = DateWindow::new(now(), now());
        Arc::new(TopCustomers {
            by_spent: vec![],
            by_frequency: vec![],
            by_engagement: vec![],
            all: vec![],
            windows: WindowPair {
                current: window,
                previous: window,
            },
            generated_at: now(),
            failed_fetches: 0,
        })
    }

    fn key() -> CacheKey {
        CacheKey {
            species: SpeciesFilter::Canine,
            period: Period::OneYear,
            limit: 10,
        }
    }

    #[test]
    fn test_key_display() {
        assert_eq!(key().to_string(), "Canino_1year_10");
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = StatsCache::default();
        cache.insert(key(), result(), now());

        assert!(cache.get(&key(), now() + Duration::minutes(9)).is_some());
        assert!(cache.get(&key(), now() + Duration::minutes(10)).is_none());
    }

    #[test]
    fn test_keys_do_not_collide() {
        let cache = StatsCache::default();
        cache.insert(key(), result(), now());

        let other = CacheKey { limit: 5, ..key() };
        assert!(cache.get(&other, now()).is_none());
    }

    #[test]
    fn test_stale_entries_are_kept_until_cleared() {
        let cache = StatsCache::new(Duration::seconds(1));
        cache.insert(key(), result(), now());

        assert!(cache.get(&key(), now() + Duration::seconds(5)).is_none());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_overwrite_refreshes_timestamp() {
        let cache = StatsCache::new(Duration::minutes(10));
        cache.insert(key(), result(), now());
        cache.insert(key(), result(), now() + Duration::minutes(8));

        assert!(cache.get(&key(), now() + Duration::minutes(15)).is_some());
    }
}
