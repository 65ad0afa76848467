//! HTTP surface of the options flow scanner.

pub mod config;
pub mod scanner_routes;

use analysis_core::{AnalysisError, SymbolSource};
use analysis_orchestrator::{Scanner, ScannerConfig, StaticSymbolSource};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use niftytrader_client::NiftyTraderClient;
use scanner_cache::ResultCache;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub scanner: Arc<Scanner>,
    pub cache: Arc<ResultCache>,
    pub symbols: Arc<dyn SymbolSource>,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Self {
        let client = NiftyTraderClient::new(config.niftytrader.clone());
        let cache = Arc::new(ResultCache::new(config.cache));
        let scanner = Scanner::new(
            Arc::new(client),
            cache.clone(),
            ScannerConfig {
                batch_size: config.batch_size,
                batch_pause: config.batch_pause,
                ..Default::default()
            },
        );

        Self {
            scanner: Arc::new(scanner),
            cache,
            symbols: Arc::new(StaticSymbolSource::from_config(config.symbols.as_deref())),
        }
    }
}

/// Standard JSON envelope: `{success, data}` or `{success: false, error}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler error rendered as an `ApiResponse` failure. Defaults to 500.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn bad_request(message: impl std::fmt::Display) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!("{}", message))
    }

    /// Invalid input maps to 400, everything else to 500
    pub fn from_analysis(error: AnalysisError) -> Self {
        let status = match error {
            AnalysisError::InvalidTimeWindow(_) | AnalysisError::InvalidData(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::with_status(status, error.into())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        } else {
            tracing::debug!("Rejected request: {}", self.error);
        }
        (self.status, Json(ApiResponse::<()>::error(self.error.to_string()))).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Full application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(scanner_routes::scanner_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Install the global tracing subscriber. `RUST_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        "Upstream {} (timeout {}s, {} req/min), cache TTL {}s, batches of {}",
        config.niftytrader.base_url,
        config.niftytrader.timeout.as_secs(),
        config.niftytrader.rate_limit_per_minute,
        config.cache.ttl.num_seconds(),
        config.batch_size
    );

    let state = AppState::from_config(&config);
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", config.bind_addr, e))?;
    tracing::info!("🚀 Scanner API listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
