//! Scores options feeds per symbol and runs cache-first scans over a
//! symbol universe.

pub mod scanner;
pub mod scoring;
pub mod symbols;

pub use scanner::{
    CacheSummary, ScanReport, ScanRequest, ScanSummary, Scanner, ScannerConfig, DEFAULT_MAX_RESULTS,
    DEFAULT_MIN_SCORE,
};
pub use scoring::{score_symbol, ScoringThresholds, TIMEFRAME};
pub use symbols::{StaticSymbolSource, DEFAULT_SYMBOLS};
