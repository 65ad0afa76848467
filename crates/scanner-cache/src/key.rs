use analysis_core::{AnalysisType, TimeWindow};
use chrono::NaiveDate;
use std::fmt;

/// Identity of a cached result.
///
/// `day` is the UTC date the entry was written, which keeps results from
/// leaking across trading sessions even inside the TTL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub analysis_type: AnalysisType,
    pub window: TimeWindow,
    pub day: NaiveDate,
}

impl CacheKey {
    pub fn new(symbol: &str, analysis_type: AnalysisType, window: TimeWindow, day: NaiveDate) -> Self {
        Self {
            symbol: symbol.to_string(),
            analysis_type,
            window,
            day,
        }
    }

    /// Exact symbol match, optionally narrowed to one analysis type
    pub fn matches(&self, symbol: &str, analysis_type: Option<AnalysisType>) -> bool {
        self.symbol == symbol && analysis_type.map_or(true, |t| t == self.analysis_type)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.symbol,
            self.analysis_type,
            self.window,
            self.day.format("%Y-%m-%d")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(symbol: &str, analysis_type: AnalysisType) -> CacheKey {
        CacheKey::new(
            symbol,
            analysis_type,
            TimeWindow::parse("09:15", "15:30").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        )
    }

    #[test]
    fn test_display_format() {
        assert_eq!(
            key("NIFTY", AnalysisType::BullishSetups).to_string(),
            "NIFTY_BULLISH_SETUPS_09:15-15:30_2025-03-10"
        );
    }

    #[test]
    fn test_matches_is_exact() {
        let k = key("TCS", AnalysisType::Comprehensive);
        assert!(k.matches("TCS", None));
        assert!(k.matches("TCS", Some(AnalysisType::Comprehensive)));
        assert!(!k.matches("TCS", Some(AnalysisType::UnusualActivity)));
        assert!(!k.matches("TC", None));
    }
}
