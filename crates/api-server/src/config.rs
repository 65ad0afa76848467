use anyhow::{bail, Context, Result};
use niftytrader_client::NiftyTraderConfig;
use scanner_cache::{CacheConfig, DEFAULT_CLEANUP_INTERVAL_SECS, DEFAULT_TTL_SECS};
use std::env;
use std::time::Duration;

/// Runtime settings read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub niftytrader: NiftyTraderConfig,
    /// Raw `FNO_SYMBOLS` list, if set
    pub symbols: Option<String>,
    pub cache: CacheConfig,
    pub batch_size: usize,
    pub batch_pause: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = NiftyTraderConfig::default();

        let niftytrader = NiftyTraderConfig {
            base_url: env::var("NIFTYTRADER_BASE_URL").unwrap_or(defaults.base_url),
            timeout: Duration::from_secs(parse_var("NIFTYTRADER_TIMEOUT_SECS", "30")?),
            rate_limit_per_minute: parse_var("NIFTYTRADER_RATE_LIMIT", "120")?,
            oi_path: env::var("NIFTYTRADER_OI_PATH").unwrap_or(defaults.oi_path),
            oi_change_path: env::var("NIFTYTRADER_OI_CHANGE_PATH").unwrap_or(defaults.oi_change_path),
            pcr_path: env::var("NIFTYTRADER_PCR_PATH").unwrap_or(defaults.pcr_path),
        };

        let cache = CacheConfig {
            ttl: parse_seconds("SCANNER_CACHE_TTL_SECS", DEFAULT_TTL_SECS)?,
            cleanup_interval: parse_seconds(
                "SCANNER_CACHE_CLEANUP_SECS",
                DEFAULT_CLEANUP_INTERVAL_SECS,
            )?,
        };

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            niftytrader,
            symbols: env::var("FNO_SYMBOLS").ok(),
            cache,
            batch_size: parse_var("SCANNER_BATCH_SIZE", "5")?,
            batch_pause: Duration::from_millis(parse_var("SCANNER_BATCH_PAUSE_MS", "1000")?),
        })
    }
}

fn parse_var<T>(name: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {}", name))
}

fn parse_seconds(name: &str, default: i64) -> Result<chrono::Duration> {
    positive_seconds(name, parse_var(name, &default.to_string())?)
}

fn positive_seconds(name: &str, secs: i64) -> Result<chrono::Duration> {
    if secs <= 0 {
        bail!("{} must be positive, got {}", name, secs);
    }
    chrono::Duration::try_seconds(secs)
        .with_context(|| format!("{} is out of range: {}", name, secs))
}
