use analysis_core::{
    AnalysisError, AnalysisResult, AnalysisType, Feed, OptionsDataSource, SymbolFeeds, TimeWindow,
};
use futures_util::future::join_all;
use scanner_cache::ResultCache;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::scoring::{score_symbol, ScoringThresholds};

pub const DEFAULT_MIN_SCORE: u32 = 75;
pub const DEFAULT_MAX_RESULTS: usize = 15;

/// Scan parameters as posted by clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[serde(alias = "start_time", default)]
    pub start_time: String,
    #[serde(alias = "end_time", default)]
    pub end_time: String,
    #[serde(alias = "min_score", default = "default_min_score")]
    pub min_score: u32,
    #[serde(alias = "max_results", default = "default_max_results")]
    pub max_results: usize,
    #[serde(alias = "analysis_type", default)]
    pub analysis_type: AnalysisType,
}

fn default_min_score() -> u32 {
    DEFAULT_MIN_SCORE
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl ScanRequest {
    pub fn new(start_time: &str, end_time: &str) -> Self {
        Self {
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            min_score: DEFAULT_MIN_SCORE,
            max_results: DEFAULT_MAX_RESULTS,
            analysis_type: AnalysisType::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSummary {
    pub cached_results: usize,
    pub fresh_analysis: usize,
    pub cache_hit_rate: f64,
    pub cache_size: usize,
    /// Seconds
    pub cache_age_avg: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_analyzed: usize,
    pub opportunities_found: usize,
    pub processed: usize,
    pub errors: usize,
    pub cache_stats: CacheSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub results: Vec<AnalysisResult>,
    pub summary: ScanSummary,
}

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Symbols analyzed concurrently per batch
    pub batch_size: usize,
    /// Pause between batches to go easy on the upstream provider
    pub batch_pause: Duration,
    pub thresholds: ScoringThresholds,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_pause: Duration::from_secs(1),
            thresholds: ScoringThresholds::default(),
        }
    }
}

/// Cache-first scanner over an options data source
pub struct Scanner {
    source: Arc<dyn OptionsDataSource>,
    cache: Arc<ResultCache>,
    config: ScannerConfig,
}

impl Scanner {
    pub fn new(source: Arc<dyn OptionsDataSource>, cache: Arc<ResultCache>, config: ScannerConfig) -> Self {
        Self { source, cache, config }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub async fn scan(&self, request: &ScanRequest, symbols: &[String]) -> Result<ScanReport, AnalysisError> {
        let window = TimeWindow::parse(&request.start_time, &request.end_time)?;
        let analysis_type = request.analysis_type;

        let mut seen = HashSet::new();
        let symbols: Vec<String> = symbols
            .iter()
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect();

        tracing::info!(
            "🔍 Scanning {} symbols for {} in window {}",
            symbols.len(),
            analysis_type,
            window
        );

        let (cached, missing) = self.cache.get_batch(&symbols, analysis_type, &window);
        let cached_results = cached.len();

        let batch_size = self.config.batch_size.max(1);
        let batch_count = missing.len().div_ceil(batch_size);
        let mut fresh = Vec::new();
        let mut processed = 0usize;
        let mut errors = 0usize;

        for (index, batch) in missing.chunks(batch_size).enumerate() {
            let outcomes = join_all(
                batch
                    .iter()
                    .map(|symbol| self.analyze_symbol(symbol, &window, analysis_type)),
            )
            .await;

            for (symbol, outcome) in batch.iter().zip(outcomes) {
                processed += 1;
                match outcome {
                    Ok(Some(result)) => fresh.push(result),
                    Ok(None) => {}
                    Err(e) => {
                        errors += 1;
                        tracing::warn!("Failed to analyze {}: {}", symbol, e);
                    }
                }
            }

            if index + 1 < batch_count && !self.config.batch_pause.is_zero() {
                tokio::time::sleep(self.config.batch_pause).await;
            }
        }

        if !fresh.is_empty() {
            self.cache.set_batch(&fresh, analysis_type, &window);
        }
        let fresh_analysis = fresh.len();

        let mut results: Vec<AnalysisResult> = cached
            .into_values()
            .chain(fresh)
            .filter(|r| r.score >= request.min_score)
            .collect();
        results.sort_by(|a, b| {
            b.weighted_score()
                .partial_cmp(&a.weighted_score())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        results.truncate(request.max_results);

        let stats = self.cache.stats();
        tracing::info!(
            "✅ Scan complete: {} opportunities from {} symbols ({} cached, {} fresh, {} errors)",
            results.len(),
            symbols.len(),
            cached_results,
            fresh_analysis,
            errors
        );

        Ok(ScanReport {
            summary: ScanSummary {
                total_analyzed: symbols.len(),
                opportunities_found: results.len(),
                processed,
                errors,
                cache_stats: CacheSummary {
                    cached_results,
                    fresh_analysis,
                    cache_hit_rate: stats.hit_rate,
                    cache_size: stats.cache_size,
                    cache_age_avg: stats.avg_age_seconds,
                },
            },
            results,
        })
    }

    /// Fetch all three feeds and score them. Fails only when no feed could
    /// be fetched at all.
    async fn analyze_symbol(
        &self,
        symbol: &str,
        window: &TimeWindow,
        analysis_type: AnalysisType,
    ) -> Result<Option<AnalysisResult>, AnalysisError> {
        let (oi, oi_change, pcr) = tokio::join!(
            self.source.fetch_oi(symbol, window),
            self.source.fetch_oi_change(symbol, window),
            self.source.fetch_pcr(symbol, window),
        );

        let pcr = settle(symbol, "pcr", pcr)
            .retain(|point| window.contains_label(&point.timestamp).unwrap_or(true));
        let feeds = SymbolFeeds {
            oi: settle(symbol, "oi", oi),
            oi_change: settle(symbol, "oi_change", oi_change),
            pcr,
        };

        if feeds.all_unavailable() {
            return Err(AnalysisError::ApiError(format!(
                "all feeds unavailable for {}",
                symbol
            )));
        }

        Ok(score_symbol(symbol, &feeds, analysis_type, &self.config.thresholds))
    }
}

fn settle<T>(symbol: &str, feed: &str, fetched: Result<Feed<T>, AnalysisError>) -> Feed<T> {
    match fetched {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(symbol, feed, error = %e, "feed unavailable");
            Feed::Unavailable(e.to_string())
        }
    }
}
