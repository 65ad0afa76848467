//! OI Buildup Analysis
//!
//! Measures fresh call/put positioning near the money and the overall
//! call-to-put activity ratio across the chain.

use analysis_core::{OIChangeSnapshot, TrendSignal};
use serde::{Deserialize, Serialize};

/// Strikes within this fraction of spot count as at-the-money
pub const ATM_BAND: f64 = 0.05;

/// Buildup summary for one symbol
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildupAnalysis {
    /// Magnitude of net call change value inside the ATM band
    pub net_call_buildup: f64,
    /// Sum of absolute put change value inside the ATM band
    pub net_put_buildup: f64,
    /// Absolute call change value across all strikes
    pub total_calls_value: f64,
    /// Absolute put change value across all strikes
    pub total_puts_value: f64,
    pub call_put_ratio: f64,
    /// Direction of the signed ATM call buildup
    pub call_sentiment: TrendSignal,
}

/// Analyze OI change buildup around `current_price`.
///
/// The signed call buildup only decides `call_sentiment`; the reported
/// buildups are magnitudes and downstream thresholds compare magnitudes.
pub fn analyze_buildup(changes: &[OIChangeSnapshot], current_price: f64) -> BuildupAnalysis {
    let mut signed_call_buildup = 0.0;
    let mut net_put_buildup = 0.0;
    let mut total_calls_value = 0.0;
    let mut total_puts_value = 0.0;

    for change in changes {
        if is_in_atm_band(change.strike, current_price) {
            signed_call_buildup += change.calls_change_oi_value;
            net_put_buildup += change.puts_change_oi_value.abs();
        }

        total_calls_value += change.calls_change_oi_value.abs();
        total_puts_value += change.puts_change_oi_value.abs();
    }

    let call_put_ratio = if total_puts_value == 0.0 {
        1.0
    } else {
        total_calls_value / total_puts_value
    };

    let call_sentiment = if signed_call_buildup > 0.0 {
        TrendSignal::Bullish
    } else {
        TrendSignal::Bearish
    };

    BuildupAnalysis {
        net_call_buildup: signed_call_buildup.abs(),
        net_put_buildup,
        total_calls_value,
        total_puts_value,
        call_put_ratio,
        call_sentiment,
    }
}

fn is_in_atm_band(strike: f64, current_price: f64) -> bool {
    current_price > 0.0 && (strike - current_price).abs() / current_price <= ATM_BAND
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(strike: f64, calls: f64, puts: f64) -> OIChangeSnapshot {
        OIChangeSnapshot {
            strike,
            index_close: 100.0,
            calls_change_oi_value: calls,
            puts_change_oi_value: puts,
            ..Default::default()
        }
    }

    #[test]
    fn test_bullish_buildup_scenario() {
        let result = analyze_buildup(&[change(100.0, 150_000.0, -20_000.0)], 100.0);

        assert_eq!(result.net_call_buildup, 150_000.0);
        assert_eq!(result.net_put_buildup, 20_000.0);
        assert!((result.call_put_ratio - 7.5).abs() < 1e-9);
        assert_eq!(result.call_sentiment, TrendSignal::Bullish);
    }

    #[test]
    fn test_ratio_defaults_to_one_without_put_activity() {
        let result = analyze_buildup(&[change(100.0, 80_000.0, 0.0)], 100.0);
        assert_eq!(result.call_put_ratio, 1.0);
    }

    #[test]
    fn test_negative_call_buildup_keeps_magnitude() {
        let result = analyze_buildup(&[change(101.0, -120_000.0, 10_000.0)], 100.0);

        assert_eq!(result.net_call_buildup, 120_000.0);
        assert_eq!(result.call_sentiment, TrendSignal::Bearish);
    }

    #[test]
    fn test_far_strikes_only_count_toward_totals() {
        let changes = vec![
            change(100.0, 10_000.0, 5_000.0),
            change(130.0, -40_000.0, 0.0),
            change(70.0, 0.0, -15_000.0),
        ];
        let result = analyze_buildup(&changes, 100.0);

        assert_eq!(result.net_call_buildup, 10_000.0);
        assert_eq!(result.net_put_buildup, 5_000.0);
        assert_eq!(result.total_calls_value, 50_000.0);
        assert_eq!(result.total_puts_value, 20_000.0);
        assert!((result.call_put_ratio - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        let changes = vec![change(105.0, 1_000.0, 0.0), change(95.0, 1_000.0, 0.0)];
        let result = analyze_buildup(&changes, 100.0);
        assert_eq!(result.net_call_buildup, 2_000.0);
    }
}
