//! Risk-Reward Calculation
//!
//! Builds an entry/target/stop plan from key levels and a trend direction.

use analysis_core::{KeyLevels, RiskReward, TrendSignal};

use crate::round2;

pub const BASE_PROBABILITY: f64 = 60.0;
pub const PROBABILITY_PER_RATIO: f64 = 10.0;
pub const MAX_PROBABILITY: f64 = 90.0;

/// Plan a trade in the direction of `trend`.
///
/// Missing levels fall back to fixed percentage offsets from price. A
/// neutral trend trades toward max pain.
pub fn calculate_risk_reward(current_price: f64, levels: &KeyLevels, trend: TrendSignal) -> RiskReward {
    let supports = &levels.support_levels;
    let resistances = &levels.resistance_levels;

    let (target_1, target_2, stop_loss) = match trend {
        TrendSignal::Bullish => (
            resistances.first().copied().unwrap_or(current_price * 1.03),
            resistances.get(1).copied().unwrap_or(current_price * 1.06),
            supports.first().copied().unwrap_or(current_price * 0.97),
        ),
        TrendSignal::Bearish => (
            supports.first().copied().unwrap_or(current_price * 0.97),
            supports.get(1).copied().unwrap_or(current_price * 0.94),
            resistances.first().copied().unwrap_or(current_price * 1.03),
        ),
        TrendSignal::Neutral => {
            if levels.max_pain > current_price {
                (levels.max_pain, levels.max_pain * 1.02, current_price * 0.98)
            } else {
                (levels.max_pain, levels.max_pain * 0.98, current_price * 1.02)
            }
        }
    };

    let risk = (current_price - stop_loss).abs();
    let reward = (target_1 - current_price).abs();
    let ratio = if risk == 0.0 { 0.0 } else { reward / risk };

    RiskReward {
        entry_price: round2(current_price),
        target_1: round2(target_1),
        target_2: round2(target_2),
        stop_loss: round2(stop_loss),
        risk_reward_ratio: round2(ratio),
        probability: probability_from_ratio(ratio),
    }
}

/// Success probability (percent) implied by a reward/risk ratio, capped at 90
pub fn probability_from_ratio(ratio: f64) -> f64 {
    (BASE_PROBABILITY + ratio * PROBABILITY_PER_RATIO).min(MAX_PROBABILITY)
}
