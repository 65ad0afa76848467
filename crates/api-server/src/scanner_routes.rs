use analysis_core::{AnalysisType, TimeWindow};
use analysis_orchestrator::{ScanReport, ScanRequest};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use scanner_cache::CacheStatsSnapshot;
use serde::{Deserialize, Serialize};

use crate::{ApiResponse, AppError, AppState};

/// Scan response: `{success, results, summary}`
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: ScanReport,
}

#[derive(Debug, Serialize)]
pub struct CacheInfo {
    pub cache_duration: String,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ScannerDiscovery {
    pub available_symbols: Vec<String>,
    pub total_symbols: usize,
    pub analysis_types: Vec<AnalysisType>,
    pub cache_info: CacheInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheQuery {
    pub action: Option<String>,
    pub symbol: Option<String>,
    #[serde(alias = "analysis_type")]
    pub analysis_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CacheActionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<usize>,
    pub stats: CacheStatsSnapshot,
}

pub fn scanner_routes() -> Router<AppState> {
    Router::new()
        .route("/api/advanced-scanner", get(discover).post(run_scan))
        .route("/api/advanced-scanner/cache", get(manage_cache))
}

async fn run_scan(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;

    // Reject a bad window before touching the symbol source
    TimeWindow::parse(&request.start_time, &request.end_time).map_err(AppError::from_analysis)?;

    let symbols = state.symbols.symbols().await.map_err(AppError::from_analysis)?;
    let report = state
        .scanner
        .scan(&request, &symbols)
        .await
        .map_err(AppError::from_analysis)?;

    Ok(Json(ScanResponse {
        success: true,
        report,
    }))
}

async fn discover(State(state): State<AppState>) -> Result<Json<ApiResponse<ScannerDiscovery>>, AppError> {
    let symbols = state.symbols.symbols().await.map_err(AppError::from_analysis)?;
    let ttl_minutes = state.cache.config().ttl.num_minutes();

    Ok(Json(ApiResponse::success(ScannerDiscovery {
        total_symbols: symbols.len(),
        available_symbols: symbols,
        analysis_types: AnalysisType::ALL.to_vec(),
        cache_info: CacheInfo {
            cache_duration: format!("{} minutes", ttl_minutes),
            last_updated: Utc::now(),
        },
    })))
}

async fn manage_cache(
    State(state): State<AppState>,
    Query(query): Query<CacheQuery>,
) -> Result<Json<ApiResponse<CacheActionResult>>, AppError> {
    let cache = &state.cache;

    match query.action.as_deref() {
        None => Ok(Json(ApiResponse::success(CacheActionResult {
            action: None,
            message: None,
            removed: None,
            stats: cache.stats(),
        }))),
        Some("clear") => {
            cache.clear();
            Ok(Json(ApiResponse::success(CacheActionResult {
                action: Some("clear".to_string()),
                message: Some("Cache cleared".to_string()),
                removed: None,
                stats: cache.stats(),
            })))
        }
        Some("invalidate") => {
            let symbol = query
                .symbol
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| AppError::bad_request("Symbol required for invalidation"))?;
            let analysis_type = query
                .analysis_type
                .as_deref()
                .map(str::parse::<AnalysisType>)
                .transpose()
                .map_err(AppError::from_analysis)?;

            let removed = cache.invalidate(symbol, analysis_type);
            let scope = analysis_type.map(|t| format!(" ({})", t)).unwrap_or_default();
            Ok(Json(ApiResponse::success(CacheActionResult {
                action: Some("invalidate".to_string()),
                message: Some(format!("Invalidated {} cache entries for {}{}", removed, symbol, scope)),
                removed: Some(removed),
                stats: cache.stats(),
            })))
        }
        Some(other) => Err(AppError::bad_request(format!(
            "Unknown cache action '{}'. Use 'clear' or 'invalidate'",
            other
        ))),
    }
}
