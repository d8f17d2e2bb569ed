//! The strategy contract: parameters, lookback, and rule callbacks.
//!
//! A strategy is a record of closures. The entry rule runs while no position
//! is open; the exit rule while one is; the risk rules (stop loss, trailing
//! stop, profit target) return a non-negative price *distance* that the
//! engine converts to a price using the trade direction.
//!
//! `enter_position`/`exit_position` are one-shot intent signals: they record
//! the request and return. Fills happen on a later bar's open, never on the
//! bar the rule ran on.

use std::collections::BTreeMap;

use crate::domain::{Bar, IndicatorBar, Position, TradeDirection};
use crate::series::DataSeries;

/// Named real-valued strategy parameters.
///
/// A `BTreeMap` keeps iteration and serialization order stable so optimizer
/// output never depends on hash order.
pub type Params = BTreeMap<String, f64>;

/// Context handed to the entry rule.
pub struct EntryContext<'a> {
    pub bar: &'a IndicatorBar,
    /// The most recent `lookback_period` bars, oldest first; the newest
    /// element is `bar` itself.
    pub lookback: &'a [IndicatorBar],
    pub parameters: &'a Params,
}

/// Context handed to the exit rule while a position is open.
pub struct OpenContext<'a> {
    pub bar: &'a IndicatorBar,
    pub lookback: &'a [IndicatorBar],
    pub entry_price: f64,
    pub position: &'a Position,
    pub parameters: &'a Params,
}

/// Context handed to the risk rules.
pub struct RiskContext<'a> {
    pub entry_price: f64,
    pub position: &'a Position,
    pub bar: &'a IndicatorBar,
    pub lookback: &'a [IndicatorBar],
    pub parameters: &'a Params,
}

/// Options for an entry signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryOptions {
    /// Direction to trade; defaults to long.
    pub direction: Option<TradeDirection>,
    /// Conditional entry level: the fill waits until a later bar trades
    /// through this price.
    pub entry_price: Option<f64>,
}

impl EntryOptions {
    pub fn long() -> Self {
        Self {
            direction: Some(TradeDirection::Long),
            entry_price: None,
        }
    }

    pub fn short() -> Self {
        Self {
            direction: Some(TradeDirection::Short),
            entry_price: None,
        }
    }

    /// Gate the fill on price trading through `price` on a later bar.
    pub fn with_entry_price(mut self, price: f64) -> Self {
        self.entry_price = Some(price);
        self
    }
}

/// One-shot entry signal handle passed to the entry rule.
#[derive(Debug, Default)]
pub struct EntryIntent {
    requested: Option<EntryOptions>,
}

impl EntryIntent {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Signal intent to open a position. The fill happens at the open of a
    /// later bar, not on the bar the rule ran on.
    pub fn enter_position(&mut self, options: EntryOptions) {
        assert!(
            self.requested.is_none(),
            "enter_position signaled twice on one bar"
        );
        self.requested = Some(options);
    }

    pub(crate) fn take(self) -> Option<EntryOptions> {
        self.requested
    }
}

/// One-shot exit signal handle passed to the exit rule.
#[derive(Debug, Default)]
pub struct ExitIntent {
    requested: bool,
}

impl ExitIntent {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Signal intent to close the open position at the next bar's open.
    pub fn exit_position(&mut self) {
        assert!(!self.requested, "exit_position signaled twice on one bar");
        self.requested = true;
    }

    pub(crate) fn requested(&self) -> bool {
        self.requested
    }
}

/// Computes one indicator bar per input bar, preserving order.
pub type PrepIndicatorsFn =
    dyn Fn(&Params, &DataSeries<Bar>) -> DataSeries<IndicatorBar> + Send + Sync;

/// Entry rule: may signal `enter_position` when no position is open.
pub type EntryRuleFn = dyn Fn(&mut EntryIntent, &EntryContext<'_>) + Send + Sync;

/// Exit rule: may signal `exit_position` while a position is open.
pub type ExitRuleFn = dyn Fn(&mut ExitIntent, &OpenContext<'_>) + Send + Sync;

/// Risk rule: returns a non-negative price distance from its reference
/// price (entry price for stops armed at entry, bar close for the trailing
/// ratchet).
pub type RiskRuleFn = dyn Fn(&RiskContext<'_>) -> f64 + Send + Sync;

/// A rule-based trading strategy.
pub struct Strategy {
    pub parameters: Params,
    /// Bars of history rules need before they run (minimum 1).
    pub lookback_period: usize,
    pub prep_indicators: Option<Box<PrepIndicatorsFn>>,
    pub entry_rule: Box<EntryRuleFn>,
    pub exit_rule: Option<Box<ExitRuleFn>>,
    pub stop_loss: Option<Box<RiskRuleFn>>,
    pub trailing_stop_loss: Option<Box<RiskRuleFn>>,
    pub profit_target: Option<Box<RiskRuleFn>>,
}

impl Strategy {
    /// A strategy with just an entry rule; everything else via `with_*`.
    pub fn new(
        entry_rule: impl Fn(&mut EntryIntent, &EntryContext<'_>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            parameters: Params::new(),
            lookback_period: 1,
            prep_indicators: None,
            entry_rule: Box::new(entry_rule),
            exit_rule: None,
            stop_loss: None,
            trailing_stop_loss: None,
            profit_target: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Params) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_parameter(mut self, name: &str, value: f64) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }

    pub fn with_lookback(mut self, bars: usize) -> Self {
        assert!(bars >= 1, "lookback period must be at least 1");
        self.lookback_period = bars;
        self
    }

    pub fn with_prep_indicators(
        mut self,
        prep: impl Fn(&Params, &DataSeries<Bar>) -> DataSeries<IndicatorBar> + Send + Sync + 'static,
    ) -> Self {
        self.prep_indicators = Some(Box::new(prep));
        self
    }

    pub fn with_exit_rule(
        mut self,
        rule: impl Fn(&mut ExitIntent, &OpenContext<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.exit_rule = Some(Box::new(rule));
        self
    }

    pub fn with_stop_loss(
        mut self,
        rule: impl Fn(&RiskContext<'_>) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.stop_loss = Some(Box::new(rule));
        self
    }

    pub fn with_trailing_stop_loss(
        mut self,
        rule: impl Fn(&RiskContext<'_>) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.trailing_stop_loss = Some(Box::new(rule));
        self
    }

    pub fn with_profit_target(
        mut self,
        rule: impl Fn(&RiskContext<'_>) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.profit_target = Some(Box::new(rule));
        self
    }
}
