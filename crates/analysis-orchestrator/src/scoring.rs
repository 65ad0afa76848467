//! Composite scoring of one symbol's options feeds.

use analysis_core::{
    AnalysisResult, AnalysisType, InstitutionalSentiment, OptionsFlow, StrengthSignal, SymbolFeeds,
    TrendSignal,
};
use options_signals::{
    analyze_buildup, analyze_institutional_flow, analyze_pcr_trend, calculate_key_levels,
    calculate_risk_reward, classify_sentiment, detect_unusual_activity, is_near_key_level,
    BuildupAnalysis, LevelSide, PcrTrend,
};

pub const TIMEFRAME: &str = "INTRADAY";

const STRONG_CALL_POINTS: (i32, i32) = (25, 20);
const STRONG_PUT_POINTS: (i32, i32) = (20, 15);
const MODERATE_OI_POINTS: (i32, i32) = (10, 8);
const UNUSUAL_BASE_POINTS: i32 = 15;
const UNUSUAL_POINTS_PER_FLAG: i32 = 5;
const UNUSUAL_CONFIDENCE: i32 = 15;
const OPTIONS_DATA_POINTS: (i32, i32) = (5, 5);
const PCR_POINTS_PER_STRENGTH: (i32, i32) = (4, 3);
const KEY_LEVEL_POINTS: (i32, i32) = (15, 10);
const FLOW_CONFIDENCE: i32 = 12;
const MAX_SCORE: i32 = 100;
/// Levels reported per side in a result
const REPORTED_LEVELS: usize = 3;

/// Cut-offs applied while scoring and gating a symbol
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringThresholds {
    /// ATM buildup value for a strong call/put signal
    pub strong_buildup_value: f64,
    pub moderate_buildup_value: f64,
    /// Call/put ratio above which call buildup counts as strong
    pub strong_call_ratio: f64,
    /// Call/put ratio below which put buildup counts as strong
    pub strong_put_ratio: f64,
    /// Flow sub-score must exceed this to contribute
    pub flow_score_floor: f64,

    pub min_score: u32,
    pub min_confidence: u32,
    pub min_risk_reward: f64,

    pub bullish_setup_ratio: f64,
    pub bearish_setup_ratio: f64,
    /// Buildup multiple one side needs over the other to qualify a setup
    pub setup_dominance: f64,
    /// Buildup multiple of the opposite side that disqualifies a setup
    pub setup_veto_dominance: f64,
    pub unusual_setup_min_score: u32,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            strong_buildup_value: 100_000.0,
            moderate_buildup_value: 50_000.0,
            strong_call_ratio: 1.2,
            strong_put_ratio: 0.8,
            flow_score_floor: 15.0,
            min_score: 15,
            min_confidence: 10,
            min_risk_reward: 0.5,
            bullish_setup_ratio: 1.3,
            bearish_setup_ratio: 0.7,
            setup_dominance: 1.5,
            setup_veto_dominance: 2.0,
            unusual_setup_min_score: 25,
        }
    }
}

/// Score a symbol. Returns `None` when there is nothing to analyze or the
/// result fails the quality or analysis-type gate.
pub fn score_symbol(
    symbol: &str,
    feeds: &SymbolFeeds,
    analysis_type: AnalysisType,
    thresholds: &ScoringThresholds,
) -> Option<AnalysisResult> {
    if !feeds.has_any_data() {
        tracing::debug!(symbol, "no options data in any feed");
        return None;
    }
    let Some(current_price) = feeds.current_price() else {
        tracing::debug!(symbol, "no underlying price in OI feeds");
        return None;
    };

    let changes = feeds.oi_change.records();
    let mut score = 0i32;
    let mut confidence = 0i32;
    let mut signals = Vec::new();
    let mut reasons = Vec::new();

    // 1. OI buildup
    let buildup = analyze_buildup(changes, current_price);
    if buildup.net_call_buildup > thresholds.strong_buildup_value
        && buildup.call_put_ratio > thresholds.strong_call_ratio
    {
        score += STRONG_CALL_POINTS.0;
        confidence += STRONG_CALL_POINTS.1;
        signals.push(StrengthSignal::StrongCallBuildup);
        reasons.push(format!(
            "Strong call buildup of {:.0} near the money with call/put ratio {:.2}.",
            buildup.net_call_buildup, buildup.call_put_ratio
        ));
    } else if buildup.net_put_buildup > thresholds.strong_buildup_value
        && buildup.call_put_ratio < thresholds.strong_put_ratio
    {
        score += STRONG_PUT_POINTS.0;
        confidence += STRONG_PUT_POINTS.1;
        signals.push(StrengthSignal::StrongPutBuildup);
        reasons.push(format!(
            "Strong put buildup of {:.0} near the money with call/put ratio {:.2}.",
            buildup.net_put_buildup, buildup.call_put_ratio
        ));
    } else if buildup.net_call_buildup > thresholds.moderate_buildup_value
        || buildup.net_put_buildup > thresholds.moderate_buildup_value
    {
        score += MODERATE_OI_POINTS.0;
        confidence += MODERATE_OI_POINTS.1;
        signals.push(StrengthSignal::ModerateOiActivity);
        reasons.push("Moderate open interest activity near the money.".to_string());
    }

    // 2. Unusual activity
    let unusual_activity = detect_unusual_activity(changes, current_price);
    if !unusual_activity.is_empty() {
        score += UNUSUAL_BASE_POINTS + UNUSUAL_POINTS_PER_FLAG * unusual_activity.len() as i32;
        confidence += UNUSUAL_CONFIDENCE;
        signals.push(StrengthSignal::UnusualActivity);
        reasons.push(format!("Unusual activity: {}.", unusual_activity.join(", ")));
    }
    if !changes.is_empty() {
        score += OPTIONS_DATA_POINTS.0;
        confidence += OPTIONS_DATA_POINTS.1;
        signals.push(StrengthSignal::OptionsDataAvailable);
        reasons.push(format!("Open interest changes available across {} strikes.", changes.len()));
    }

    // 3. PCR trend
    let pcr = analyze_pcr_trend(feeds.pcr.records());
    if let Some(signal) = pcr_signal(&pcr) {
        let strength = i32::from(pcr.strength);
        score += strength * PCR_POINTS_PER_STRENGTH.0;
        confidence += strength * PCR_POINTS_PER_STRENGTH.1;
        signals.push(signal);
        reasons.push(format!(
            "PCR trend {} with a {:+.1}% move (strength {}).",
            pcr.signal.as_str().to_lowercase(),
            pcr.change_percent,
            pcr.strength
        ));
    }

    // 4. Key levels
    let levels = calculate_key_levels(feeds.oi.records(), current_price);
    if let Some(near) = is_near_key_level(current_price, &levels.support_levels, &levels.resistance_levels) {
        score += KEY_LEVEL_POINTS.0;
        confidence += KEY_LEVEL_POINTS.1;
        let (signal, side) = match near.side {
            LevelSide::Support => (StrengthSignal::NearSupportLevel, "support"),
            LevelSide::Resistance => (StrengthSignal::NearResistanceLevel, "resistance"),
        };
        signals.push(signal);
        reasons.push(format!("Price {:.2} is near {} at {}.", current_price, side, near.level));
    }

    // 5. Institutional flow
    let flow = analyze_institutional_flow(changes);
    if flow.flow_score > thresholds.flow_score_floor {
        score += flow.flow_score as i32;
        confidence += FLOW_CONFIDENCE;
        signals.push(StrengthSignal::InstitutionalFlow);
        reasons.push(format!(
            "Institutional flow is {} with net flow of {:.0}.",
            flow.direction.as_str().to_lowercase(),
            flow.net_flow
        ));
    }

    let score = score.clamp(0, MAX_SCORE) as u32;
    let confidence = confidence.clamp(0, MAX_SCORE) as u32;

    let sentiment = classify_sentiment(buildup.call_put_ratio, pcr.signal, flow.direction);
    let risk_reward = calculate_risk_reward(current_price, &levels, sentiment.direction());

    if score < thresholds.min_score
        || confidence < thresholds.min_confidence
        || risk_reward.risk_reward_ratio < thresholds.min_risk_reward
    {
        tracing::debug!(
            symbol,
            score,
            confidence,
            risk_reward_ratio = risk_reward.risk_reward_ratio,
            "rejected by quality gate"
        );
        return None;
    }

    let setup = SetupInputs {
        buildup: &buildup,
        pcr_signal: pcr.signal,
        sentiment,
        score,
        has_unusual: signals.contains(&StrengthSignal::UnusualActivity),
    };
    if !passes_analysis_type(analysis_type, &setup, thresholds) {
        tracing::debug!(symbol, analysis_type = %analysis_type, "rejected by analysis type");
        return None;
    }

    Some(AnalysisResult {
        symbol: symbol.to_string(),
        score,
        strength_signals: signals,
        options_flow: OptionsFlow {
            net_call_buildup: buildup.net_call_buildup,
            net_put_buildup: buildup.net_put_buildup,
            pcr_trend: pcr.signal,
            unusual_activity,
            max_pain: levels.max_pain,
            support_levels: levels.support_levels.iter().take(REPORTED_LEVELS).copied().collect(),
            resistance_levels: levels.resistance_levels.iter().take(REPORTED_LEVELS).copied().collect(),
        },
        risk_reward,
        institutional_sentiment: sentiment,
        reasoning: reasons.join(" ").trim().to_string(),
        timeframe: TIMEFRAME.to_string(),
        confidence,
    })
}

fn pcr_signal(pcr: &PcrTrend) -> Option<StrengthSignal> {
    match pcr.signal {
        TrendSignal::Bullish => Some(StrengthSignal::PcrBullish),
        TrendSignal::Bearish => Some(StrengthSignal::PcrBearish),
        TrendSignal::Neutral => None,
    }
}

struct SetupInputs<'a> {
    buildup: &'a BuildupAnalysis,
    pcr_signal: TrendSignal,
    sentiment: InstitutionalSentiment,
    score: u32,
    has_unusual: bool,
}

fn passes_analysis_type(analysis_type: AnalysisType, setup: &SetupInputs<'_>, t: &ScoringThresholds) -> bool {
    let ratio = setup.buildup.call_put_ratio;
    let net_call = setup.buildup.net_call_buildup;
    let net_put = setup.buildup.net_put_buildup;

    match analysis_type {
        AnalysisType::Comprehensive => true,
        AnalysisType::BullishSetups => {
            let qualifies = ratio > t.bullish_setup_ratio || net_call > t.setup_dominance * net_put;
            let vetoed = setup.sentiment == InstitutionalSentiment::Bearish
                || ratio < 1.0
                || setup.pcr_signal == TrendSignal::Bearish
                || net_put > t.setup_veto_dominance * net_call;
            qualifies && !vetoed
        }
        AnalysisType::BearishSetups => {
            let qualifies = ratio < t.bearish_setup_ratio || net_put > t.setup_dominance * net_call;
            let vetoed = setup.sentiment == InstitutionalSentiment::Bullish
                || ratio > 1.0
                || setup.pcr_signal == TrendSignal::Bullish
                || net_call > t.setup_veto_dominance * net_put;
            qualifies && !vetoed
        }
        AnalysisType::UnusualActivity => setup.has_unusual && setup.score >= t.unusual_setup_min_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{Feed, OIChangeSnapshot, OISnapshot, PCRPoint};

    fn change(strike: f64, calls: f64, puts: f64) -> OIChangeSnapshot {
        OIChangeSnapshot {
            strike,
            index_close: 100.0,
            calls_change_oi_value: calls,
            puts_change_oi_value: puts,
            ..Default::default()
        }
    }

    fn oi(strike: f64, calls_oi: f64, puts_oi: f64) -> OISnapshot {
        OISnapshot {
            strike,
            index_close: 100.0,
            calls_oi,
            puts_oi,
            ..Default::default()
        }
    }

    fn pcr(values: &[f64]) -> Feed<PCRPoint> {
        Feed::from_records(
            values
                .iter()
                .map(|&pcr| PCRPoint { pcr, timestamp: String::new() })
                .collect(),
        )
    }

    fn feeds(oi_rows: Vec<OISnapshot>, changes: Vec<OIChangeSnapshot>, pcr_feed: Feed<PCRPoint>) -> SymbolFeeds {
        SymbolFeeds {
            oi: Feed::from_records(oi_rows),
            oi_change: Feed::from_records(changes),
            pcr: pcr_feed,
        }
    }

    fn score(feeds: &SymbolFeeds, analysis_type: AnalysisType) -> Option<AnalysisResult> {
        score_symbol("TEST", feeds, analysis_type, &ScoringThresholds::default())
    }

    #[test]
    fn test_bullish_buildup_scenario() {
        let feeds = feeds(vec![], vec![change(100.0, 150_000.0, -20_000.0)], Feed::Empty);
        let result = score(&feeds, AnalysisType::Comprehensive).unwrap();

        assert_eq!(result.score, 30);
        assert_eq!(result.confidence, 25);
        assert_eq!(
            result.strength_signals,
            vec![StrengthSignal::StrongCallBuildup, StrengthSignal::OptionsDataAvailable]
        );
        assert_eq!(result.options_flow.net_call_buildup, 150_000.0);
        assert_eq!(result.institutional_sentiment, InstitutionalSentiment::Bullish);
        assert_eq!(result.risk_reward.target_1, 103.0);
        assert_eq!(result.timeframe, "INTRADAY");
        assert!(result.reasoning.starts_with("Strong call buildup"));
    }

    #[test]
    fn test_pcr_bearish_scenario() {
        let feeds = feeds(
            vec![oi(104.0, 5_000.0, 1_000.0)],
            vec![change(100.0, 150_000.0, -20_000.0)],
            pcr(&[1.4, 1.25, 1.2]),
        );
        let result = score(&feeds, AnalysisType::Comprehensive).unwrap();

        assert_eq!(result.score, 50);
        assert_eq!(result.confidence, 40);
        assert!(result.has_signal(StrengthSignal::PcrBearish));
        assert_eq!(result.options_flow.pcr_trend, TrendSignal::Bearish);
        assert_eq!(result.institutional_sentiment, InstitutionalSentiment::Neutral);
        assert_eq!(result.risk_reward.target_1, 104.0);
        assert_eq!(result.risk_reward.risk_reward_ratio, 2.0);
    }

    #[test]
    fn test_quality_gate_rejects_weak_score() {
        let feeds = feeds(vec![], vec![change(100.0, 30_000.0, 0.0)], Feed::Empty);
        assert!(score(&feeds, AnalysisType::Comprehensive).is_none());
    }

    #[test]
    fn test_quality_gate_rejects_poor_risk_reward() {
        // Neutral read with max pain at price leaves no reward
        let feeds = feeds(
            vec![],
            vec![change(100.0, 150_000.0, -20_000.0)],
            pcr(&[1.4, 1.25, 1.2]),
        );
        assert!(score(&feeds, AnalysisType::Comprehensive).is_none());
    }

    #[test]
    fn test_requires_price_and_data() {
        assert!(score(&SymbolFeeds::default(), AnalysisType::Comprehensive).is_none());

        let pcr_only = feeds(vec![], vec![], pcr(&[0.6, 0.7, 0.8]));
        assert!(score(&pcr_only, AnalysisType::Comprehensive).is_none());

        let mut zero_price = change(100.0, 150_000.0, 0.0);
        zero_price.index_close = 0.0;
        assert!(score(&feeds(vec![], vec![zero_price], Feed::Empty), AnalysisType::Comprehensive).is_none());
    }

    #[test]
    fn test_score_and_confidence_are_capped() {
        let feeds = feeds(
            vec![oi(99.0, 100.0, 8_000.0)],
            vec![change(100.0, 20_000_000.0, -1_000_000.0)],
            pcr(&[0.6, 0.7, 0.8]),
        );
        let result = score(&feeds, AnalysisType::Comprehensive).unwrap();

        assert_eq!(result.score, 100);
        assert_eq!(result.confidence, 77);
        assert!(result.has_signal(StrengthSignal::InstitutionalFlow));
        assert!(result.has_signal(StrengthSignal::NearSupportLevel));
        assert!(result.has_signal(StrengthSignal::PcrBullish));
        assert_eq!(result.institutional_sentiment, InstitutionalSentiment::StronglyBullish);
        assert_eq!(result.risk_reward.stop_loss, 99.0);
        assert_eq!(result.risk_reward.risk_reward_ratio, 3.0);
    }

    #[test]
    fn test_flow_sub_score_is_truncated() {
        let feeds = feeds(vec![], vec![change(100.0, 15_500_000.0, -1_000.0)], Feed::Empty);
        let result = score(&feeds, AnalysisType::Comprehensive).unwrap();

        // 25 buildup + 20 unusual + 5 data + 15 flow
        assert_eq!(result.score, 65);
        assert!(result.has_signal(StrengthSignal::InstitutionalFlow));
    }

    #[test]
    fn test_bullish_setup_gate() {
        let bullish = feeds(vec![], vec![change(100.0, 150_000.0, -20_000.0)], Feed::Empty);
        assert!(score(&bullish, AnalysisType::BullishSetups).is_some());
        assert!(score(&bullish, AnalysisType::BearishSetups).is_none());
    }

    #[test]
    fn test_bearish_setup_gate() {
        let bearish = feeds(vec![], vec![change(100.0, -10_000.0, 300_000.0)], Feed::Empty);
        let result = score(&bearish, AnalysisType::BearishSetups).unwrap();

        assert!(result.has_signal(StrengthSignal::StrongPutBuildup));
        assert_eq!(result.institutional_sentiment, InstitutionalSentiment::Bearish);
        assert!(score(&bearish, AnalysisType::BullishSetups).is_none());
    }

    #[test]
    fn test_unusual_activity_gate() {
        let unusual = feeds(vec![], vec![change(100.0, 600_000.0, -10_000.0)], Feed::Empty);
        let result = score(&unusual, AnalysisType::UnusualActivity).unwrap();
        assert_eq!(result.options_flow.unusual_activity, vec!["Large Call Activity at 100".to_string()]);
        assert_eq!(result.score, 50);

        let quiet = feeds(vec![], vec![change(100.0, 150_000.0, -20_000.0)], Feed::Empty);
        assert!(score(&quiet, AnalysisType::UnusualActivity).is_none());
    }

    #[test]
    fn test_reported_levels_are_capped() {
        let rows = (1..=5)
            .map(|i| oi(100.0 - i as f64 * 5.0, 10.0, 1_000.0 * i as f64))
            .chain((1..=5).map(|i| oi(100.0 + i as f64 * 5.0, 1_000.0 * i as f64, 10.0)))
            .collect();
        let feeds = feeds(rows, vec![change(100.0, 150_000.0, -20_000.0)], Feed::Empty);
        let result = score(&feeds, AnalysisType::Comprehensive).unwrap();

        assert_eq!(result.options_flow.support_levels, vec![75.0, 80.0, 85.0]);
        assert_eq!(result.options_flow.resistance_levels, vec![125.0, 120.0, 115.0]);
    }

    #[test]
    fn test_custom_thresholds() {
        let feeds = feeds(vec![], vec![change(100.0, 150_000.0, -20_000.0)], Feed::Empty);
        let strict = ScoringThresholds {
            min_score: 40,
            ..Default::default()
        };
        assert!(score_symbol("TEST", &feeds, AnalysisType::Comprehensive, &strict).is_none());
    }
}
