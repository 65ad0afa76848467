use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::AnalysisError;

/// Open interest at one strike for one polling interval
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OISnapshot {
    #[serde(rename = "strike_price", alias = "strike", default)]
    pub strike: f64,
    #[serde(rename = "expiry_date", alias = "expiry", default)]
    pub expiry: String,
    #[serde(rename = "time", alias = "timestamp", default)]
    pub timestamp: String,
    #[serde(default)]
    pub index_close: f64,
    #[serde(default)]
    pub calls_oi: f64,
    #[serde(default)]
    pub calls_oi_value: f64,
    #[serde(default)]
    pub puts_oi: f64,
    #[serde(default)]
    pub puts_oi_value: f64,
}

/// Change in open interest at one strike within the requested window.
/// `*_value` fields are notional currency, the others are contract counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OIChangeSnapshot {
    #[serde(rename = "strike_price", alias = "strike", default)]
    pub strike: f64,
    #[serde(rename = "expiry_date", alias = "expiry", default)]
    pub expiry: String,
    #[serde(rename = "time", alias = "timestamp", default)]
    pub timestamp: String,
    #[serde(default)]
    pub index_close: f64,
    #[serde(default)]
    pub calls_change_oi: f64,
    #[serde(default)]
    pub calls_change_oi_value: f64,
    #[serde(default)]
    pub puts_change_oi: f64,
    #[serde(default)]
    pub puts_change_oi_value: f64,
}

/// Put/call ratio sample. Sequences are ordered most recent first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PCRPoint {
    #[serde(default)]
    pub pcr: f64,
    #[serde(rename = "time", alias = "timestamp", default)]
    pub timestamp: String,
}

/// Support/resistance levels derived from the OI distribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyLevels {
    /// Strikes below price, ordered by descending put OI
    pub support_levels: Vec<f64>,
    /// Strikes above price, ordered by descending call OI
    pub resistance_levels: Vec<f64>,
    /// Strike carrying the highest aggregate OI
    pub max_pain: f64,
}

/// Three-way directional read used by several extractors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendSignal {
    Bullish,
    Bearish,
    Neutral,
}

impl TrendSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendSignal::Bullish => "BULLISH",
            TrendSignal::Bearish => "BEARISH",
            TrendSignal::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for TrendSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Five-level institutional positioning label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstitutionalSentiment {
    StronglyBullish,
    Bullish,
    Neutral,
    Bearish,
    StronglyBearish,
}

impl InstitutionalSentiment {
    /// Collapse to a plain direction for trade planning
    pub fn direction(&self) -> TrendSignal {
        match self {
            InstitutionalSentiment::StronglyBullish | InstitutionalSentiment::Bullish => {
                TrendSignal::Bullish
            }
            InstitutionalSentiment::StronglyBearish | InstitutionalSentiment::Bearish => {
                TrendSignal::Bearish
            }
            InstitutionalSentiment::Neutral => TrendSignal::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstitutionalSentiment::StronglyBullish => "STRONGLY_BULLISH",
            InstitutionalSentiment::Bullish => "BULLISH",
            InstitutionalSentiment::Neutral => "NEUTRAL",
            InstitutionalSentiment::Bearish => "BEARISH",
            InstitutionalSentiment::StronglyBearish => "STRONGLY_BEARISH",
        }
    }
}

/// Which flavour of setup the caller is scanning for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisType {
    #[default]
    Comprehensive,
    BullishSetups,
    BearishSetups,
    UnusualActivity,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 4] = [
        AnalysisType::BullishSetups,
        AnalysisType::BearishSetups,
        AnalysisType::UnusualActivity,
        AnalysisType::Comprehensive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Comprehensive => "COMPREHENSIVE",
            AnalysisType::BullishSetups => "BULLISH_SETUPS",
            AnalysisType::BearishSetups => "BEARISH_SETUPS",
            AnalysisType::UnusualActivity => "UNUSUAL_ACTIVITY",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COMPREHENSIVE" => Ok(AnalysisType::Comprehensive),
            "BULLISH_SETUPS" => Ok(AnalysisType::BullishSetups),
            "BEARISH_SETUPS" => Ok(AnalysisType::BearishSetups),
            "UNUSUAL_ACTIVITY" => Ok(AnalysisType::UnusualActivity),
            other => Err(AnalysisError::InvalidData(format!(
                "unknown analysis type '{}'",
                other
            ))),
        }
    }
}

/// Tags attached to a result describing which signals fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrengthSignal {
    StrongCallBuildup,
    StrongPutBuildup,
    ModerateOiActivity,
    UnusualActivity,
    OptionsDataAvailable,
    PcrBullish,
    PcrBearish,
    NearSupportLevel,
    NearResistanceLevel,
    InstitutionalFlow,
}

impl StrengthSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrengthSignal::StrongCallBuildup => "STRONG_CALL_BUILDUP",
            StrengthSignal::StrongPutBuildup => "STRONG_PUT_BUILDUP",
            StrengthSignal::ModerateOiActivity => "MODERATE_OI_ACTIVITY",
            StrengthSignal::UnusualActivity => "UNUSUAL_ACTIVITY",
            StrengthSignal::OptionsDataAvailable => "OPTIONS_DATA_AVAILABLE",
            StrengthSignal::PcrBullish => "PCR_BULLISH",
            StrengthSignal::PcrBearish => "PCR_BEARISH",
            StrengthSignal::NearSupportLevel => "NEAR_SUPPORT_LEVEL",
            StrengthSignal::NearResistanceLevel => "NEAR_RESISTANCE_LEVEL",
            StrengthSignal::InstitutionalFlow => "INSTITUTIONAL_FLOW",
        }
    }
}

/// Options positioning summary embedded in a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsFlow {
    pub net_call_buildup: f64,
    pub net_put_buildup: f64,
    pub pcr_trend: TrendSignal,
    pub unusual_activity: Vec<String>,
    pub max_pain: f64,
    pub support_levels: Vec<f64>,
    pub resistance_levels: Vec<f64>,
}

/// Trade plan derived from key levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskReward {
    pub entry_price: f64,
    pub target_1: f64,
    pub target_2: f64,
    pub stop_loss: f64,
    pub risk_reward_ratio: f64,
    /// Percent, 0 to 90
    pub probability: f64,
}

/// Final output of one symbol's scoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub symbol: String,
    /// 0 to 100
    pub score: u32,
    pub strength_signals: Vec<StrengthSignal>,
    pub options_flow: OptionsFlow,
    pub risk_reward: RiskReward,
    pub institutional_sentiment: InstitutionalSentiment,
    pub reasoning: String,
    pub timeframe: String,
    /// 0 to 100
    pub confidence: u32,
}

impl AnalysisResult {
    /// Ranking weight used when ordering scan output
    pub fn weighted_score(&self) -> f64 {
        self.score as f64 * self.confidence as f64 / 100.0
    }

    pub fn has_signal(&self, signal: StrengthSignal) -> bool {
        self.strength_signals.contains(&signal)
    }
}
