//! Unusual Activity Detection
//!
//! Flags strikes with outsized OI change value, and far out-of-the-money
//! strikes attracting meaningful fresh interest.

use analysis_core::OIChangeSnapshot;

/// Change value above which any strike is flagged as large activity
pub const LARGE_ACTIVITY_VALUE: f64 = 500_000.0;
/// Change value above which a far OTM strike is flagged
pub const FAR_OTM_ACTIVITY_VALUE: f64 = 200_000.0;
/// Distance from spot beyond which a strike is far OTM
pub const FAR_OTM_DISTANCE: f64 = 0.10;
/// Maximum number of flags reported
pub const MAX_UNUSUAL_FLAGS: usize = 3;

/// Return up to three activity descriptions in snapshot order.
pub fn detect_unusual_activity(changes: &[OIChangeSnapshot], current_price: f64) -> Vec<String> {
    let mut flags = Vec::new();

    for change in changes {
        let calls_value = change.calls_change_oi_value.abs();
        let puts_value = change.puts_change_oi_value.abs();

        if calls_value > LARGE_ACTIVITY_VALUE {
            flags.push(format!("Large Call Activity at {}", change.strike));
        }
        if puts_value > LARGE_ACTIVITY_VALUE {
            flags.push(format!("Large Put Activity at {}", change.strike));
        }
        if change.strike > current_price * (1.0 + FAR_OTM_DISTANCE) && calls_value > FAR_OTM_ACTIVITY_VALUE {
            flags.push(format!("Far OTM Call Interest at {}", change.strike));
        }
        if change.strike < current_price * (1.0 - FAR_OTM_DISTANCE) && puts_value > FAR_OTM_ACTIVITY_VALUE {
            flags.push(format!("Far OTM Put Interest at {}", change.strike));
        }

        if flags.len() >= MAX_UNUSUAL_FLAGS {
            break;
        }
    }

    flags.truncate(MAX_UNUSUAL_FLAGS);
    flags
}
