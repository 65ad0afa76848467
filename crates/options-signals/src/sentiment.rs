//! Institutional Sentiment Classification

use analysis_core::{InstitutionalSentiment, TrendSignal};

/// Signed conviction score in [-6, 6]
pub fn bullish_score(call_put_ratio: f64, pcr_signal: TrendSignal, flow_direction: TrendSignal) -> i32 {
    let mut score = 0;

    if call_put_ratio > 2.0 {
        score += 2;
    } else if call_put_ratio > 1.5 {
        score += 1;
    } else if call_put_ratio < 0.5 {
        score -= 2;
    } else if call_put_ratio < 0.8 {
        score -= 1;
    }

    score += direction_points(pcr_signal);
    score += direction_points(flow_direction);

    score
}

fn direction_points(signal: TrendSignal) -> i32 {
    match signal {
        TrendSignal::Bullish => 2,
        TrendSignal::Bearish => -2,
        TrendSignal::Neutral => 0,
    }
}

pub fn classify_sentiment(
    call_put_ratio: f64,
    pcr_signal: TrendSignal,
    flow_direction: TrendSignal,
) -> InstitutionalSentiment {
    match bullish_score(call_put_ratio, pcr_signal, flow_direction) {
        s if s >= 4 => InstitutionalSentiment::StronglyBullish,
        s if s >= 2 => InstitutionalSentiment::Bullish,
        s if s <= -4 => InstitutionalSentiment::StronglyBearish,
        s if s <= -2 => InstitutionalSentiment::Bearish,
        _ => InstitutionalSentiment::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_range() {
        assert_eq!(bullish_score(3.0, TrendSignal::Bullish, TrendSignal::Bullish), 6);
        assert_eq!(bullish_score(0.2, TrendSignal::Bearish, TrendSignal::Bearish), -6);
        assert_eq!(bullish_score(1.0, TrendSignal::Neutral, TrendSignal::Neutral), 0);
    }

    #[test]
    fn test_ratio_tiers() {
        assert_eq!(bullish_score(1.6, TrendSignal::Neutral, TrendSignal::Neutral), 1);
        assert_eq!(bullish_score(0.7, TrendSignal::Neutral, TrendSignal::Neutral), -1);
        assert_eq!(bullish_score(0.4, TrendSignal::Neutral, TrendSignal::Neutral), -2);
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            classify_sentiment(7.5, TrendSignal::Neutral, TrendSignal::Bullish),
            InstitutionalSentiment::StronglyBullish
        );
        assert_eq!(
            classify_sentiment(1.6, TrendSignal::Neutral, TrendSignal::Neutral),
            InstitutionalSentiment::Neutral
        );
        assert_eq!(
            classify_sentiment(1.0, TrendSignal::Bearish, TrendSignal::Neutral),
            InstitutionalSentiment::Bearish
        );
        assert_eq!(
            classify_sentiment(0.6, TrendSignal::Bearish, TrendSignal::Bearish),
            InstitutionalSentiment::StronglyBearish
        );
        assert_eq!(
            classify_sentiment(2.5, TrendSignal::Neutral, TrendSignal::Neutral),
            InstitutionalSentiment::Bullish
        );
    }
}
