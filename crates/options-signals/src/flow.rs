//! Institutional Flow
//!
//! Nets bullish positioning (call buying, put selling) against bearish
//! positioning (call selling, put buying) in currency terms.

use analysis_core::{OIChangeSnapshot, TrendSignal};
use serde::{Deserialize, Serialize};

/// Net flow beyond which a direction is assigned
pub const FLOW_DIRECTION_THRESHOLD: f64 = 1_000_000.0;
/// Currency per flow score point
pub const FLOW_SCORE_UNIT: f64 = 1_000_000.0;
pub const MAX_FLOW_SCORE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstitutionalFlow {
    pub call_buying: f64,
    pub call_selling: f64,
    pub put_buying: f64,
    pub put_selling: f64,
    pub net_flow: f64,
    pub direction: TrendSignal,
    /// 0 to 20
    pub flow_score: f64,
}

pub fn analyze_institutional_flow(changes: &[OIChangeSnapshot]) -> InstitutionalFlow {
    let mut call_buying = 0.0;
    let mut call_selling = 0.0;
    let mut put_buying = 0.0;
    let mut put_selling = 0.0;

    for change in changes {
        let calls = change.calls_change_oi_value;
        let puts = change.puts_change_oi_value;

        if calls > 0.0 {
            call_buying += calls;
        } else {
            call_selling += calls.abs();
        }

        if puts > 0.0 {
            put_buying += puts;
        } else {
            put_selling += puts.abs();
        }
    }

    let net_flow = (call_buying + put_selling) - (call_selling + put_buying);

    let direction = if net_flow > FLOW_DIRECTION_THRESHOLD {
        TrendSignal::Bullish
    } else if net_flow < -FLOW_DIRECTION_THRESHOLD {
        TrendSignal::Bearish
    } else {
        TrendSignal::Neutral
    };

    let flow_score = (net_flow.abs() / FLOW_SCORE_UNIT).min(MAX_FLOW_SCORE);

    tracing::trace!(net_flow, ?direction, flow_score, "institutional flow computed");

    InstitutionalFlow {
        call_buying,
        call_selling,
        put_buying,
        put_selling,
        net_flow,
        direction,
        flow_score,
    }
}
