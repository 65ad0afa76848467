//! Short-lived cache of per-symbol scan results.
//!
//! Entries are keyed by symbol, analysis type, time window and the UTC
//! calendar day, so nothing computed yesterday is ever served today.

mod key;
mod stats;

pub use key::CacheKey;
pub use stats::CacheStatsSnapshot;

use analysis_core::{AnalysisResult, AnalysisType, Clock, SystemClock, TimeWindow};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Default entry lifetime, matched to the upstream refresh interval
pub const DEFAULT_TTL_SECS: i64 = 300;
pub const DEFAULT_CLEANUP_INTERVAL_SECS: i64 = 1800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
    /// Minimum gap between sweeps of expired entries
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
            cleanup_interval: Duration::seconds(DEFAULT_CLEANUP_INTERVAL_SECS),
        }
    }
}

/// Internal cache entry with timestamp
struct CacheEntry {
    data: AnalysisResult,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Concurrent TTL cache for [`AnalysisResult`]s.
///
/// Shared behind an `Arc`; every method takes `&self`.
pub struct ResultCache {
    entries: DashMap<CacheKey, CacheEntry>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
    total_requests: AtomicU64,
    last_cleanup: Mutex<DateTime<Utc>>,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            entries: DashMap::new(),
            config,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            total_requests: AtomicU64::new(0),
            last_cleanup: Mutex::new(now),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn key(&self, symbol: &str, analysis_type: AnalysisType, window: &TimeWindow) -> CacheKey {
        CacheKey::new(symbol, analysis_type, *window, self.clock.now().date_naive())
    }

    /// Look up a live entry. Expired entries are evicted and count as misses.
    pub fn get(
        &self,
        symbol: &str,
        analysis_type: AnalysisType,
        window: &TimeWindow,
    ) -> Option<AnalysisResult> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        let key = self.key(symbol, analysis_type, window);
        let now = self.clock.now();

        if let Some(entry) = self.entries.get(&key) {
            if !entry.is_expired(now) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "cache hit");
                return Some(entry.data.clone());
            }
        }

        // The read guard is released before removing.
        self.entries.remove_if(&key, |_, entry| entry.is_expired(now));
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store `data`, replacing any existing entry for the key with a fresh TTL
    pub fn set(
        &self,
        symbol: &str,
        analysis_type: AnalysisType,
        window: &TimeWindow,
        data: AnalysisResult,
    ) {
        let key = self.key(symbol, analysis_type, window);
        let key_label = key.to_string();
        let now = self.clock.now();

        self.entries.insert(
            key,
            CacheEntry {
                data,
                cached_at: now,
                expires_at: now
                    .checked_add_signed(self.config.ttl)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            },
        );
        tracing::debug!(key = %key_label, ttl_secs = self.config.ttl.num_seconds(), "cached result");

        self.cleanup_if_needed(now);
    }

    /// Partition `symbols` into cached results and symbols that need analysis.
    /// Repeated symbols are looked up once and reported once.
    pub fn get_batch(
        &self,
        symbols: &[String],
        analysis_type: AnalysisType,
        window: &TimeWindow,
    ) -> (HashMap<String, AnalysisResult>, Vec<String>) {
        let mut cached = HashMap::new();
        let mut missing = Vec::new();
        let mut seen = HashSet::new();

        for symbol in symbols {
            if !seen.insert(symbol.as_str()) {
                continue;
            }
            match self.get(symbol, analysis_type, window) {
                Some(result) => {
                    cached.insert(symbol.clone(), result);
                }
                None => missing.push(symbol.clone()),
            }
        }

        tracing::info!(
            hits = cached.len(),
            misses = missing.len(),
            total = symbols.len(),
            "cache batch lookup"
        );
        (cached, missing)
    }

    pub fn set_batch(&self, results: &[AnalysisResult], analysis_type: AnalysisType, window: &TimeWindow) {
        for result in results {
            self.set(&result.symbol, analysis_type, window, result.clone());
        }
    }

    /// Drop every entry for `symbol`, optionally only those of one analysis type.
    /// Returns how many entries were removed.
    pub fn invalidate(&self, symbol: &str, analysis_type: Option<AnalysisType>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.matches(symbol, analysis_type));
        let removed = before.saturating_sub(self.entries.len());

        tracing::info!(
            symbol,
            analysis_type = analysis_type.map(|t| t.as_str()).unwrap_or("ALL"),
            removed,
            "cache invalidated"
        );
        removed
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        let now = self.clock.now();
        let mut live_entries = 0usize;
        let mut total_age_ms = 0i64;

        for entry in self.entries.iter() {
            if !entry.is_expired(now) {
                live_entries += 1;
                total_age_ms += (now - entry.cached_at).num_milliseconds();
            }
        }

        CacheStatsSnapshot::new(
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.total_requests.load(Ordering::Relaxed),
            self.last_cleanup_at(),
            live_entries,
            total_age_ms,
        )
    }

    /// Remove everything and reset the counters
    pub fn clear(&self) {
        let dropped = self.entries.len();
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.total_requests.store(0, Ordering::Relaxed);
        *self.lock_last_cleanup() = self.clock.now();

        tracing::info!(dropped, "cache cleared");
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_cleanup_at(&self) -> DateTime<Utc> {
        *self.lock_last_cleanup()
    }

    fn cleanup_if_needed(&self, now: DateTime<Utc>) {
        {
            let mut last_cleanup = self.lock_last_cleanup();
            if now - *last_cleanup < self.config.cleanup_interval {
                return;
            }
            *last_cleanup = now;
        }

        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::info!(removed, remaining = self.entries.len(), "swept expired cache entries");
        }
    }

    fn lock_last_cleanup(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.last_cleanup
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{InstitutionalSentiment, ManualClock, OptionsFlow, RiskReward, TrendSignal};
    use chrono::TimeZone;

    fn result(symbol: &str, score: u32) -> AnalysisResult {
        AnalysisResult {
            symbol: symbol.to_string(),
            score,
            strength_signals: vec![],
            options_flow: OptionsFlow {
                net_call_buildup: 0.0,
                net_put_buildup: 0.0,
                pcr_trend: TrendSignal::Neutral,
                unusual_activity: vec![],
                max_pain: 100.0,
                support_levels: vec![],
                resistance_levels: vec![],
            },
            risk_reward: RiskReward {
                entry_price: 100.0,
                target_1: 103.0,
                target_2: 106.0,
                stop_loss: 97.0,
                risk_reward_ratio: 1.0,
                probability: 70.0,
            },
            institutional_sentiment: InstitutionalSentiment::Neutral,
            reasoning: String::new(),
            timeframe: "INTRADAY".to_string(),
            confidence: 50,
        }
    }

    fn window() -> TimeWindow {
        TimeWindow::parse("09:15", "15:30").unwrap()
    }

    fn cache_at(start: DateTime<Utc>) -> (ResultCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start));
        let cache = ResultCache::with_clock(CacheConfig::default(), clock.clone());
        (cache, clock)
    }

    fn morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 4, 0, 0).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let (cache, _clock) = cache_at(morning());
        let stored = result("TCS", 80);
        cache.set("TCS", AnalysisType::Comprehensive, &window(), stored.clone());

        assert_eq!(cache.get("TCS", AnalysisType::Comprehensive, &window()), Some(stored));
        assert_eq!(cache.get("TCS", AnalysisType::BullishSetups, &window()), None);

        let other_window = TimeWindow::parse("10:00", "11:00").unwrap();
        assert_eq!(cache.get("TCS", AnalysisType::Comprehensive, &other_window), None);
    }

    #[test]
    fn test_ttl_past_calendar_range_never_expires() {
        let clock = Arc::new(ManualClock::new(morning()));
        let config = CacheConfig {
            ttl: Duration::days(100_000_000),
            ..CacheConfig::default()
        };
        let cache = ResultCache::with_clock(config, clock.clone());
        cache.set("TCS", AnalysisType::Comprehensive, &window(), result("TCS", 80));

        clock.advance(Duration::hours(6));
        assert!(cache.get("TCS", AnalysisType::Comprehensive, &window()).is_some());
    }

    #[test]
    fn test_ttl_expiry() {
        let (cache, clock) = cache_at(morning());
        cache.set("INFY", AnalysisType::Comprehensive, &window(), result("INFY", 70));

        clock.advance(Duration::milliseconds(299_999));
        assert!(cache.get("INFY", AnalysisType::Comprehensive, &window()).is_some());

        clock.advance(Duration::milliseconds(2));
        assert!(cache.get("INFY", AnalysisType::Comprehensive, &window()).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_requests, 2);
        assert!(cache.is_empty(), "expired entry should be evicted on read");
    }

    #[test]
    fn test_day_boundary_isolation() {
        let late = Utc.with_ymd_and_hms(2025, 3, 10, 23, 58, 0).unwrap();
        let (cache, clock) = cache_at(late);
        cache.set("SBIN", AnalysisType::Comprehensive, &window(), result("SBIN", 60));

        clock.advance(Duration::minutes(3));
        assert!(cache.get("SBIN", AnalysisType::Comprehensive, &window()).is_none());
    }

    #[test]
    fn test_batch_partition() {
        let (cache, _clock) = cache_at(morning());
        cache.set("A", AnalysisType::Comprehensive, &window(), result("A", 90));
        cache.set("C", AnalysisType::Comprehensive, &window(), result("C", 85));

        let symbols: Vec<String> = ["A", "B", "C", "D", "A"].iter().map(|s| s.to_string()).collect();
        let (cached, missing) = cache.get_batch(&symbols, AnalysisType::Comprehensive, &window());

        assert_eq!(cached.len(), 2);
        assert!(cached.contains_key("A") && cached.contains_key("C"));
        assert_eq!(missing, vec!["B".to_string(), "D".to_string()]);
        assert!(missing.iter().all(|s| !cached.contains_key(s)));
        assert_eq!(cache.stats().total_requests, 4);
    }

    #[test]
    fn test_set_batch_stores_each_result() {
        let (cache, _clock) = cache_at(morning());
        cache.set_batch(&[result("A", 90), result("B", 80)], AnalysisType::BearishSetups, &window());

        assert_eq!(cache.len(), 2);
        assert_eq!(
            cache.get("B", AnalysisType::BearishSetups, &window()).map(|r| r.score),
            Some(80)
        );
    }

    #[test]
    fn test_invalidate_symbol_and_type() {
        let (cache, _clock) = cache_at(morning());
        cache.set("RELIANCE", AnalysisType::Comprehensive, &window(), result("RELIANCE", 80));
        cache.set("RELIANCE", AnalysisType::BullishSetups, &window(), result("RELIANCE", 80));
        cache.set("RELIANCE2", AnalysisType::Comprehensive, &window(), result("RELIANCE2", 80));

        assert_eq!(cache.invalidate("RELIANCE", Some(AnalysisType::Comprehensive)), 1);
        assert!(cache.get("RELIANCE", AnalysisType::BullishSetups, &window()).is_some());

        cache.set("RELIANCE", AnalysisType::Comprehensive, &window(), result("RELIANCE", 80));
        assert_eq!(cache.invalidate("RELIANCE", None), 2);
        assert!(cache.get("RELIANCE", AnalysisType::Comprehensive, &window()).is_none());
        assert!(cache.get("RELIANCE", AnalysisType::BullishSetups, &window()).is_none());

        // Prefix-sharing symbols are untouched
        assert!(cache.get("RELIANCE2", AnalysisType::Comprehensive, &window()).is_some());
        assert_eq!(cache.invalidate("WIPRO", None), 0);
    }

    #[test]
    fn test_clear_resets_counters() {
        let (cache, clock) = cache_at(morning());
        cache.set("A", AnalysisType::Comprehensive, &window(), result("A", 90));
        cache.get("A", AnalysisType::Comprehensive, &window());
        cache.get("B", AnalysisType::Comprehensive, &window());

        clock.advance(Duration::minutes(1));
        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.cache_size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.last_cleanup, clock.now());
    }

    #[test]
    fn test_stats_hit_rate_and_age() {
        let (cache, clock) = cache_at(morning());
        cache.set("A", AnalysisType::Comprehensive, &window(), result("A", 90));
        clock.advance(Duration::seconds(60));
        cache.set("B", AnalysisType::Comprehensive, &window(), result("B", 90));

        cache.get("A", AnalysisType::Comprehensive, &window());
        cache.get("A", AnalysisType::Comprehensive, &window());
        cache.get("Z", AnalysisType::Comprehensive, &window());

        let stats = cache.stats();
        assert_eq!(stats.cache_size, 2);
        assert_eq!(stats.hit_rate, 66.67);
        assert_eq!(stats.avg_age_seconds, 30);
    }

    #[test]
    fn test_stats_on_empty_cache() {
        let (cache, _clock) = cache_at(morning());
        let stats = cache.stats();
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats.avg_age_seconds, 0);
    }

    #[test]
    fn test_periodic_cleanup_sweeps_expired_entries() {
        let (cache, clock) = cache_at(morning());
        cache.set("OLD", AnalysisType::Comprehensive, &window(), result("OLD", 90));

        clock.advance(Duration::minutes(10));
        cache.set("MID", AnalysisType::Comprehensive, &window(), result("MID", 90));
        assert_eq!(cache.len(), 2, "no sweep before the cleanup interval");

        clock.advance(Duration::minutes(21));
        cache.set("NEW", AnalysisType::Comprehensive, &window(), result("NEW", 90));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.last_cleanup_at(), clock.now());
    }
}
