use analysis_core::{
    AnalysisError, Feed, OIChangeSnapshot, OISnapshot, OptionsDataSource, PCRPoint, TimeWindow,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_BASE_URL: &str = "https://webapi.niftytrader.in/webapi";

const MAX_ATTEMPTS: u32 = 3;
const RETRY_WAIT_SECS: u64 = 15;

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request falls out of the window
            let sleep_dur = match ts.front() {
                Some(&oldest) => (oldest + self.window).saturating_duration_since(now),
                None => Duration::ZERO,
            } + Duration::from_millis(50);
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for NiftyTrader slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Connection settings for the NiftyTrader web API
#[derive(Debug, Clone)]
pub struct NiftyTraderConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Requests allowed per rolling minute
    pub rate_limit_per_minute: usize,
    pub oi_path: String,
    pub oi_change_path: String,
    pub pcr_path: String,
}

impl Default for NiftyTraderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            rate_limit_per_minute: 120,
            oi_path: "/option/oi-data".to_string(),
            oi_change_path: "/option/change-oi-data".to_string(),
            pcr_path: "/option/oi-pcr-data".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct NiftyTraderClient {
    config: NiftyTraderConfig,
    client: Client,
    rate_limiter: RateLimiter,
}

impl NiftyTraderClient {
    pub fn new(config: NiftyTraderConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(browser_headers())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            rate_limiter: RateLimiter::new(config.rate_limit_per_minute, Duration::from_secs(60)),
            config,
            client,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AnalysisError> {
        let request = builder.build().map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        for attempt in 0..MAX_ATTEMPTS {
            self.rate_limiter.acquire().await;
            let req_clone = request.try_clone()
                .ok_or_else(|| AnalysisError::ApiError("Cannot clone request".to_string()))?;
            let response = self.client.execute(req_clone).await
                .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            tracing::warn!(
                "NiftyTrader 429 rate limited, waiting {}s before retry {}/{}",
                RETRY_WAIT_SECS,
                attempt + 1,
                MAX_ATTEMPTS
            );
            tokio::time::sleep(Duration::from_secs(RETRY_WAIT_SECS)).await;
        }

        Err(AnalysisError::ApiError(format!(
            "Rate limited by NiftyTrader after {} retries",
            MAX_ATTEMPTS
        )))
    }

    /// GET a windowed feed and return the raw body
    async fn get_feed_body(
        &self,
        path: &str,
        symbol: &str,
        window: &TimeWindow,
        extra: &[(&str, &str)],
    ) -> Result<String, AnalysisError> {
        let url = self.endpoint(path);
        let start = window.start_label();
        let end = window.end_label();
        let symbol = symbol.to_lowercase();

        let mut query: Vec<(&str, &str)> = vec![
            ("symbol", symbol.as_str()),
            ("start_time", start.as_str()),
            ("end_time", end.as_str()),
        ];
        query.extend_from_slice(extra);

        let response = self.send_request(self.client.get(&url).query(&query)).await?;

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))
    }
}

#[async_trait]
impl OptionsDataSource for NiftyTraderClient {
    async fn fetch_oi(&self, symbol: &str, window: &TimeWindow) -> Result<Feed<OISnapshot>, AnalysisError> {
        let body = self.get_feed_body(&self.config.oi_path, symbol, window, &[]).await?;
        let feed = parse_records_payload(&body)?;
        tracing::debug!(symbol, records = feed.records().len(), "fetched OI snapshots");
        Ok(feed)
    }

    async fn fetch_oi_change(&self, symbol: &str, window: &TimeWindow) -> Result<Feed<OIChangeSnapshot>, AnalysisError> {
        let body = self.get_feed_body(&self.config.oi_change_path, symbol, window, &[]).await?;
        let feed = parse_records_payload(&body)?;
        tracing::debug!(symbol, records = feed.records().len(), "fetched OI change snapshots");
        Ok(feed)
    }

    async fn fetch_pcr(&self, symbol: &str, window: &TimeWindow) -> Result<Feed<PCRPoint>, AnalysisError> {
        let body = self
            .get_feed_body(&self.config.pcr_path, symbol, window, &[("type", "otherpcr"), ("expiry", "")])
            .await?;
        let feed = parse_pcr_payload(&body)?;
        tracing::debug!(symbol, records = feed.records().len(), "fetched PCR series");
        Ok(feed)
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36"),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(REFERER, HeaderValue::from_static("https://niftytrader.in/"));
    headers.insert(ORIGIN, HeaderValue::from_static("https://niftytrader.in"));
    headers
}

// ---- Response envelopes ----

#[derive(Debug, Deserialize)]
struct RecordsEnvelope<T> {
    #[serde(rename = "resultData")]
    result_data: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
struct PcrEnvelope {
    #[serde(rename = "resultData")]
    result_data: Option<PcrPayload>,
    /// Some deployments nest the series under `result`, which otherwise
    /// carries a numeric status code
    result: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PcrPayload {
    #[serde(rename = "oiDatas", default)]
    oi_datas: Option<Vec<PCRPoint>>,
}

/// Decode an envelope carrying its records directly under `resultData`.
/// A missing or null payload is an empty feed.
pub fn parse_records_payload<T: DeserializeOwned>(body: &str) -> Result<Feed<T>, AnalysisError> {
    let envelope: RecordsEnvelope<T> = serde_json::from_str(body)
        .map_err(|e| AnalysisError::InvalidData(format!("malformed feed payload: {}", e)))?;
    Ok(envelope.result_data.map(Feed::from_records).unwrap_or(Feed::Empty))
}

/// Decode the PCR envelope, whose series sits under `resultData.oiDatas`
pub fn parse_pcr_payload(body: &str) -> Result<Feed<PCRPoint>, AnalysisError> {
    let envelope: PcrEnvelope = serde_json::from_str(body)
        .map_err(|e| AnalysisError::InvalidData(format!("malformed PCR payload: {}", e)))?;

    if let Some(points) = envelope.result_data.and_then(|payload| payload.oi_datas) {
        return Ok(Feed::from_records(points));
    }

    match envelope.result.as_ref().and_then(|result| result.get("oiDatas")) {
        Some(series) if !series.is_null() => {
            let points: Vec<PCRPoint> = serde_json::from_value(series.clone())
                .map_err(|e| AnalysisError::InvalidData(format!("malformed PCR series: {}", e)))?;
            Ok(Feed::from_records(points))
        }
        _ => Ok(Feed::Empty),
    }
}
