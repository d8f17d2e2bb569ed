//! Trade — a finalized, closed position.
//!
//! `Trade` is the engine's output contract. Serialized field names are
//! camelCase and exit reasons kebab-case; downstream analysis tooling keys
//! on them, so they are covered by tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::TradeDirection;

/// A single timestamped sample in a per-bar recorded series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimedValue {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitReason {
    /// The armed stop level was traded through.
    StopLoss,
    /// The profit target was traded through.
    ProfitTarget,
    /// The strategy's exit rule signaled.
    ExitRule,
    /// The position was still open after the last bar.
    Finalize,
}

/// Closed trade record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub direction: TradeDirection,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    /// Direction-adjusted profit: exit minus entry for longs, entry minus
    /// exit for shorts.
    pub profit: f64,
    pub profit_pct: f64,
    /// Multiplicative return; cumulative equity is the product of growth
    /// across trades.
    pub growth: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_pct: Option<f64>,
    /// Profit normalized by the unit risk the stop defined at entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rmultiple: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_series: Option<Vec<TimedValue>>,
    /// Bars held, not counting the entry bar.
    pub holding_period: usize,
    pub exit_reason: ExitReason,
    /// Stop price armed at entry, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_price_series: Option<Vec<TimedValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_target: Option<f64>,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }
}
