use async_trait::async_trait;
use crate::{AnalysisError, Feed, OIChangeSnapshot, OISnapshot, PCRPoint, TimeWindow};

/// Upstream provider of per-symbol options data.
///
/// `Ok(Feed::Empty)` means the provider answered without a payload;
/// `Err` means the fetch itself failed.
#[async_trait]
pub trait OptionsDataSource: Send + Sync {
    async fn fetch_oi(&self, symbol: &str, window: &TimeWindow) -> Result<Feed<OISnapshot>, AnalysisError>;

    async fn fetch_oi_change(&self, symbol: &str, window: &TimeWindow) -> Result<Feed<OIChangeSnapshot>, AnalysisError>;

    async fn fetch_pcr(&self, symbol: &str, window: &TimeWindow) -> Result<Feed<PCRPoint>, AnalysisError>;
}

/// Source of the tradable symbol universe
#[async_trait]
pub trait SymbolSource: Send + Sync {
    async fn symbols(&self) -> Result<Vec<String>, AnalysisError>;
}
