use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of cache counters and contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    pub last_cleanup: DateTime<Utc>,
    /// Non-expired entries only
    pub cache_size: usize,
    /// Percent of lookups served from cache, 2 dp
    pub hit_rate: f64,
    /// Mean age of live entries in whole seconds
    #[serde(rename = "avgAge")]
    pub avg_age_seconds: i64,
}

impl CacheStatsSnapshot {
    pub(crate) fn new(
        hits: u64,
        misses: u64,
        total_requests: u64,
        last_cleanup: DateTime<Utc>,
        cache_size: usize,
        total_age_ms: i64,
    ) -> Self {
        let hit_rate = if total_requests > 0 {
            (hits as f64 / total_requests as f64 * 10_000.0).round() / 100.0
        } else {
            0.0
        };
        let avg_age_seconds = if cache_size > 0 {
            (total_age_ms as f64 / cache_size as f64 / 1000.0).round() as i64
        } else {
            0
        };

        Self {
            hits,
            misses,
            total_requests,
            last_cleanup,
            cache_size,
            hit_rate,
            avg_age_seconds,
        }
    }
}
