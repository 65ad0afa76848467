//! PCR Trend Analysis
//!
//! Compares the latest put/call ratio against the sample halfway back in
//! the window and grades the move on a 0-5 strength scale.

use analysis_core::{PCRPoint, TrendSignal};
use serde::{Deserialize, Serialize};

/// PCR trend read with its strength (0 to 5)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PcrTrend {
    pub signal: TrendSignal,
    pub strength: u8,
    /// Percent change from the midpoint sample to the latest one
    pub change_percent: f64,
}

impl PcrTrend {
    pub fn neutral() -> Self {
        Self {
            signal: TrendSignal::Neutral,
            strength: 0,
            change_percent: 0.0,
        }
    }
}

/// Analyze a most-recent-first PCR series.
pub fn analyze_pcr_trend(points: &[PCRPoint]) -> PcrTrend {
    if points.len() < 2 {
        return PcrTrend::neutral();
    }

    let recent = points[0].pcr;
    let midpoint = points[points.len() / 2].pcr;
    let change_percent = if midpoint == 0.0 {
        0.0
    } else {
        (recent - midpoint) / midpoint * 100.0
    };

    let (signal, strength) = if recent < 0.7 && change_percent < -10.0 {
        (TrendSignal::Bullish, 5)
    } else if recent < 0.8 && change_percent < -5.0 {
        (TrendSignal::Bullish, 4)
    } else if recent > 1.3 && change_percent > 10.0 {
        (TrendSignal::Bearish, 5)
    } else if recent > 1.2 && change_percent > 5.0 {
        (TrendSignal::Bearish, 4)
    } else {
        (TrendSignal::Neutral, 0)
    };

    PcrTrend {
        signal,
        strength,
        change_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<PCRPoint> {
        values
            .iter()
            .map(|&pcr| PCRPoint { pcr, timestamp: String::new() })
            .collect()
    }

    #[test]
    fn test_bearish_strength_five() {
        let trend = analyze_pcr_trend(&series(&[1.4, 1.25, 1.2]));
        assert_eq!(trend.signal, TrendSignal::Bearish);
        assert_eq!(trend.strength, 5);
        assert!((trend.change_percent - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearish_strength_four() {
        // 1.25 vs 1.18 is about +5.9%
        let trend = analyze_pcr_trend(&series(&[1.25, 1.2, 1.18, 1.1]));
        assert_eq!(trend.signal, TrendSignal::Bearish);
        assert_eq!(trend.strength, 4);
    }

    #[test]
    fn test_bullish_tiers() {
        let strong = analyze_pcr_trend(&series(&[0.6, 0.7, 0.75]));
        assert_eq!((strong.signal, strong.strength), (TrendSignal::Bullish, 5));

        let moderate = analyze_pcr_trend(&series(&[0.75, 0.8]));
        assert_eq!((moderate.signal, moderate.strength), (TrendSignal::Bullish, 4));
    }

    #[test]
    fn test_short_or_flat_series_is_neutral() {
        assert_eq!(analyze_pcr_trend(&[]).signal, TrendSignal::Neutral);
        assert_eq!(analyze_pcr_trend(&series(&[0.5])).strength, 0);

        let flat = analyze_pcr_trend(&series(&[1.0, 1.01, 0.99]));
        assert_eq!(flat.signal, TrendSignal::Neutral);
        assert_eq!(flat.strength, 0);
    }

    #[test]
    fn test_zero_midpoint_does_not_divide() {
        let trend = analyze_pcr_trend(&series(&[1.5, 0.0]));
        assert_eq!(trend.change_percent, 0.0);
        assert_eq!(trend.signal, TrendSignal::Neutral);
    }
}
