//! Position — the single open trade, while it is open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::TimedValue;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    Long,
    Short,
}

/// The open position being tracked through the bar loop.
///
/// Created at the open of the entry confirmation bar, marked every bar the
/// position is held, and consumed when converted into a `Trade`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub direction: TradeDirection,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    /// Direction-adjusted profit at the most recent mark.
    pub profit: f64,
    pub profit_pct: f64,
    /// Multiplicative return at the most recent mark (1.0 at entry).
    pub growth: f64,
    /// Bars held, not counting the entry bar.
    pub holding_period: usize,
    /// Stop price armed at entry, if any.
    pub initial_stop_price: Option<f64>,
    /// Stop price currently in effect (ratchets tighter, never looser).
    pub cur_stop_price: Option<f64>,
    pub stop_price_series: Option<Vec<TimedValue>>,
    pub initial_unit_risk: Option<f64>,
    pub initial_risk_pct: Option<f64>,
    pub cur_risk_pct: Option<f64>,
    pub cur_rmultiple: Option<f64>,
    pub risk_series: Option<Vec<TimedValue>>,
    pub profit_target: Option<f64>,
}

impl Position {
    /// Open a fresh position at the given entry fill.
    pub fn open(direction: TradeDirection, entry_time: DateTime<Utc>, entry_price: f64) -> Self {
        Self {
            direction,
            entry_time,
            entry_price,
            profit: 0.0,
            profit_pct: 0.0,
            growth: 1.0,
            holding_period: 0,
            initial_stop_price: None,
            cur_stop_price: None,
            stop_price_series: None,
            initial_unit_risk: None,
            initial_risk_pct: None,
            cur_risk_pct: None,
            cur_rmultiple: None,
            risk_series: None,
            profit_target: None,
        }
    }

    /// Refresh running metrics against a bar's close.
    ///
    /// Does not touch the holding period; see [`Position::tick_bar`].
    pub fn update_mark(&mut self, close: f64) {
        self.profit = match self.direction {
            TradeDirection::Long => close - self.entry_price,
            TradeDirection::Short => self.entry_price - close,
        };
        self.profit_pct = self.profit / self.entry_price * 100.0;
        self.growth = match self.direction {
            TradeDirection::Long => close / self.entry_price,
            TradeDirection::Short => self.entry_price / close,
        };
        if let Some(stop) = self.cur_stop_price {
            let unit_risk = match self.direction {
                TradeDirection::Long => close - stop,
                TradeDirection::Short => stop - close,
            };
            self.cur_risk_pct = Some(unit_risk / self.entry_price * 100.0);
        }
        if let Some(initial_unit_risk) = self.initial_unit_risk {
            self.cur_rmultiple = Some(self.profit / initial_unit_risk);
        }
    }

    /// Increment the bars-held counter (called once per bar held, not on
    /// the entry bar).
    pub fn tick_bar(&mut self) {
        self.holding_period += 1;
    }
}
