//! Direction-aware stop, target, and trigger price math.
//!
//! Core rule: stops may tighten, never loosen. For longs the stop can only
//! rise; for shorts it can only fall.

use crate::domain::{IndicatorBar, TradeDirection};

/// Stop price at `distance` from `reference`, on the losing side.
pub(crate) fn stop_price(direction: TradeDirection, reference: f64, distance: f64) -> f64 {
    match direction {
        TradeDirection::Long => reference - distance,
        TradeDirection::Short => reference + distance,
    }
}

/// Profit target price at `distance` from `reference`, on the winning side.
pub(crate) fn target_price(direction: TradeDirection, reference: f64, distance: f64) -> f64 {
    match direction {
        TradeDirection::Long => reference + distance,
        TradeDirection::Short => reference - distance,
    }
}

/// Ratchet rule: keep the tighter of the current and candidate stop.
pub(crate) fn tighten(direction: TradeDirection, current: f64, candidate: f64) -> f64 {
    match direction {
        TradeDirection::Long => current.max(candidate),
        TradeDirection::Short => current.min(candidate),
    }
}

/// Whether this bar's range traded through the stop level.
pub(crate) fn stop_hit(direction: TradeDirection, stop: f64, bar: &IndicatorBar) -> bool {
    match direction {
        TradeDirection::Long => bar.low <= stop,
        TradeDirection::Short => bar.high >= stop,
    }
}

/// Whether this bar's range traded through the profit target.
pub(crate) fn target_hit(direction: TradeDirection, target: f64, bar: &IndicatorBar) -> bool {
    match direction {
        TradeDirection::Long => bar.high >= target,
        TradeDirection::Short => bar.low <= target,
    }
}

/// Whether this bar's range traded through a conditional entry level.
pub(crate) fn entry_triggered(direction: TradeDirection, level: f64, bar: &IndicatorBar) -> bool {
    match direction {
        TradeDirection::Long => bar.high >= level,
        TradeDirection::Short => bar.low <= level,
    }
}

/// Risk per unit between a reference price and the stop.
pub(crate) fn unit_risk(direction: TradeDirection, price: f64, stop: f64) -> f64 {
    match direction {
        TradeDirection::Long => price - stop,
        TradeDirection::Short => stop - price,
    }
}
