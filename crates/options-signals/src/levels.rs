//! Key Level Calculation
//!
//! Derives support, resistance and max pain from the open interest
//! distribution across strikes.

use analysis_core::{KeyLevels, OISnapshot};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Number of support/resistance levels kept
pub const MAX_KEY_LEVELS: usize = 5;
/// Distance (fraction of the level) within which price counts as "near"
pub const NEAR_LEVEL_TOLERANCE: f64 = 0.02;

/// Side of the book a key level sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LevelSide {
    Support,
    Resistance,
}

/// A key level the price is currently trading close to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearLevel {
    pub side: LevelSide,
    pub level: f64,
}

#[derive(Debug, Clone, Copy)]
struct StrikeOI {
    strike: f64,
    calls_oi: f64,
    puts_oi: f64,
}

impl StrikeOI {
    fn total(&self) -> f64 {
        self.calls_oi + self.puts_oi
    }
}

/// Aggregate OI per strike and pick support, resistance and max pain.
pub fn calculate_key_levels(snapshots: &[OISnapshot], current_price: f64) -> KeyLevels {
    let strikes = aggregate_by_strike(snapshots);

    let mut max_pain = current_price;
    let mut max_oi = 0.0;
    for strike in &strikes {
        if strike.total() > max_oi {
            max_oi = strike.total();
            max_pain = strike.strike;
        }
    }

    let mut supports: Vec<&StrikeOI> = strikes.iter().filter(|s| s.strike < current_price).collect();
    supports.sort_by(|a, b| b.puts_oi.partial_cmp(&a.puts_oi).unwrap_or(Ordering::Equal));

    let mut resistances: Vec<&StrikeOI> = strikes.iter().filter(|s| s.strike > current_price).collect();
    resistances.sort_by(|a, b| b.calls_oi.partial_cmp(&a.calls_oi).unwrap_or(Ordering::Equal));

    KeyLevels {
        support_levels: supports.iter().take(MAX_KEY_LEVELS).map(|s| s.strike).collect(),
        resistance_levels: resistances.iter().take(MAX_KEY_LEVELS).map(|s| s.strike).collect(),
        max_pain,
    }
}

/// Sum OI for snapshots sharing a strike, keeping first-seen strike order
fn aggregate_by_strike(snapshots: &[OISnapshot]) -> Vec<StrikeOI> {
    let mut strikes: Vec<StrikeOI> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for snapshot in snapshots {
        let strike_key = (snapshot.strike * 100.0).round() as i64;
        match index.get(&strike_key) {
            Some(&i) => {
                strikes[i].calls_oi += snapshot.calls_oi;
                strikes[i].puts_oi += snapshot.puts_oi;
            }
            None => {
                index.insert(strike_key, strikes.len());
                strikes.push(StrikeOI {
                    strike: snapshot.strike,
                    calls_oi: snapshot.calls_oi,
                    puts_oi: snapshot.puts_oi,
                });
            }
        }
    }

    strikes
}

/// First support, then resistance, level within 2% of `price`.
pub fn is_near_key_level(price: f64, supports: &[f64], resistances: &[f64]) -> Option<NearLevel> {
    let near = |level: f64| level > 0.0 && (price - level).abs() / level <= NEAR_LEVEL_TOLERANCE;

    if let Some(&level) = supports.iter().find(|&&level| near(level)) {
        return Some(NearLevel {
            side: LevelSide::Support,
            level,
        });
    }

    resistances
        .iter()
        .find(|&&level| near(level))
        .map(|&level| NearLevel {
            side: LevelSide::Resistance,
            level,
        })
}
