use analysis_core::{AnalysisError, SymbolSource};
use async_trait::async_trait;

/// Used when no symbol list is configured
pub const DEFAULT_SYMBOLS: [&str; 5] = ["NIFTY", "BANKNIFTY", "RELIANCE", "TCS", "HDFCBANK"];

/// Symbol universe fixed at startup
#[derive(Debug, Clone)]
pub struct StaticSymbolSource {
    symbols: Vec<String>,
}

impl StaticSymbolSource {
    pub fn new(symbols: Vec<String>) -> Self {
        Self { symbols }
    }

    /// Build from a comma-separated list such as `FNO_SYMBOLS`.
    /// `None` falls back to [`DEFAULT_SYMBOLS`]; blanks and repeats are dropped.
    pub fn from_config(list: Option<&str>) -> Self {
        let Some(list) = list else {
            return Self::new(DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect());
        };

        let mut symbols: Vec<String> = Vec::new();
        for symbol in list.split(',').map(|s| s.trim().to_uppercase()) {
            if !symbol.is_empty() && !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        Self::new(symbols)
    }
}

#[async_trait]
impl SymbolSource for StaticSymbolSource {
    async fn symbols(&self) -> Result<Vec<String>, AnalysisError> {
        if self.symbols.is_empty() {
            return Err(AnalysisError::SymbolSourceError(
                "No F&O symbols configured".to_string(),
            ));
        }
        Ok(self.symbols.clone())
    }
}
