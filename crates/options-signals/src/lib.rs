//! Options Signal Extractors
//!
//! Pure functions turning raw options-chain snapshots into narrow, typed
//! signals: OI buildup, unusual activity, PCR trend, key levels and
//! institutional flow, plus the trade plan and sentiment label built on top
//! of them. Nothing in here performs I/O.

pub mod buildup;
pub mod flow;
pub mod levels;
pub mod pcr;
pub mod risk_reward;
pub mod sentiment;
pub mod unusual;

pub use buildup::{analyze_buildup, BuildupAnalysis};
pub use flow::{analyze_institutional_flow, InstitutionalFlow};
pub use levels::{calculate_key_levels, is_near_key_level, LevelSide, NearLevel};
pub use pcr::{analyze_pcr_trend, PcrTrend};
pub use risk_reward::{calculate_risk_reward, probability_from_ratio};
pub use sentiment::{bullish_score, classify_sentiment};
pub use unusual::detect_unusual_activity;

/// Round to two decimal places for display of prices and ratios
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
