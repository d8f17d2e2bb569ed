//! Bar-by-bar backtest loop — the heart of the engine.
//!
//! Single pass over the indicator series, dispatching each bar on the
//! position lifecycle state:
//!
//! 1. Idle: evaluate the entry rule. A signal only records intent; no fill
//!    happens on the signal bar.
//! 2. AwaitingEntry: gate conditional entries on the bar's range, then fill
//!    at the bar's open and arm stops and target. No exit checks run on the
//!    entry bar.
//! 3. Open: check the stop that was in effect at the start of the bar,
//!    ratchet the trailing stop from the close, check the profit target,
//!    mark the position, then evaluate the exit rule. First match wins;
//!    when both stop and target are reachable within one bar the stop takes
//!    attribution (pessimistic convention).
//! 4. ExitPending: close at the bar's open.
//!
//! A position still open after the last bar is finalized at that bar's
//! close.

mod risk;
mod state;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{Bar, ExitReason, IndicatorBar, Position, TimedValue, Trade, TradeDirection};
use crate::lookback::LookbackWindow;
use crate::series::DataSeries;
use crate::strategy::{
    EntryContext, EntryIntent, ExitIntent, OpenContext, Params, RiskContext, Strategy,
};
use state::EngineState;

/// Options controlling optional per-bar recording.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktestOptions {
    /// Record the trailing stop level each bar into
    /// `Trade::stop_price_series`. Only takes effect when the strategy has
    /// a trailing stop.
    pub record_stop_price: bool,
    /// Record the open risk each bar into `Trade::risk_series`.
    pub record_risk: bool,
}

/// Backtest input validation errors.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("input series is empty")]
    EmptyInput,

    #[error("input series has {bars} bars but the strategy needs a lookback of {lookback}")]
    InsufficientBars { bars: usize, lookback: usize },
}

/// Backtest a strategy over a bar series and return the completed trades.
pub fn backtest(
    strategy: &Strategy,
    input: &DataSeries<Bar>,
    options: &BacktestOptions,
) -> Result<Vec<Trade>, BacktestError> {
    backtest_with_parameters(strategy, &strategy.parameters, input, options)
}

/// Backtest with `parameters` substituted for the strategy's own bucket.
///
/// Optimizers call this with each candidate parameter set; the strategy
/// record itself is never mutated.
pub fn backtest_with_parameters(
    strategy: &Strategy,
    parameters: &Params,
    input: &DataSeries<Bar>,
    options: &BacktestOptions,
) -> Result<Vec<Trade>, BacktestError> {
    if input.is_empty() {
        return Err(BacktestError::EmptyInput);
    }
    if input.len() < strategy.lookback_period {
        return Err(BacktestError::InsufficientBars {
            bars: input.len(),
            lookback: strategy.lookback_period,
        });
    }

    let indicator_series: DataSeries<IndicatorBar> = match &strategy.prep_indicators {
        Some(prep) => prep(parameters, input),
        None => input.iter().cloned().map(IndicatorBar::from).collect(),
    };

    let mut lookback = LookbackWindow::new(strategy.lookback_period);
    let mut state = EngineState::Idle;
    let mut trades = Vec::new();

    for bar in indicator_series.iter() {
        lookback.push(bar.clone());
        if !lookback.is_full() {
            continue;
        }
        let current = std::mem::replace(&mut state, EngineState::Idle);
        state = step(
            strategy,
            parameters,
            options,
            current,
            bar,
            lookback.as_slice(),
            &mut trades,
        );
    }

    // A position that survives the data is closed out at the last close.
    if let EngineState::Open(position) | EngineState::ExitPending(position) = state {
        let last = indicator_series
            .last()
            .expect("series was validated non-empty");
        trades.push(close_position(
            position,
            last.time,
            last.close,
            ExitReason::Finalize,
        ));
    }

    Ok(trades)
}

/// Dispatch one bar against the current lifecycle state.
fn step(
    strategy: &Strategy,
    parameters: &Params,
    options: &BacktestOptions,
    state: EngineState,
    bar: &IndicatorBar,
    lookback: &[IndicatorBar],
    trades: &mut Vec<Trade>,
) -> EngineState {
    match state {
        EngineState::Idle => {
            let mut intent = EntryIntent::new();
            let ctx = EntryContext {
                bar,
                lookback,
                parameters,
            };
            (strategy.entry_rule)(&mut intent, &ctx);
            match intent.take() {
                Some(entry) => EngineState::AwaitingEntry {
                    direction: entry.direction.unwrap_or(TradeDirection::Long),
                    conditional_price: entry.entry_price,
                },
                None => EngineState::Idle,
            }
        }

        EngineState::AwaitingEntry {
            direction,
            conditional_price,
        } => {
            if let Some(level) = conditional_price {
                if !risk::entry_triggered(direction, level, bar) {
                    // Level not traded through yet; keep waiting.
                    return EngineState::AwaitingEntry {
                        direction,
                        conditional_price,
                    };
                }
            }
            EngineState::Open(open_position(
                strategy, parameters, options, direction, bar, lookback,
            ))
        }

        EngineState::Open(mut position) => {
            // (a) The stop level in effect at the start of the bar governs
            // the bar, and wins attribution over the profit target.
            if let Some(stop) = position.cur_stop_price {
                if risk::stop_hit(position.direction, stop, bar) {
                    trades.push(close_position(position, bar.time, stop, ExitReason::StopLoss));
                    return EngineState::Idle;
                }
            }

            // (b) Ratchet the trailing stop from this bar's close.
            if let Some(trailing) = &strategy.trailing_stop_loss {
                let distance = trailing(&RiskContext {
                    entry_price: position.entry_price,
                    position: &position,
                    bar,
                    lookback,
                    parameters,
                });
                let candidate = risk::stop_price(position.direction, bar.close, distance);
                let current = position
                    .cur_stop_price
                    .expect("trailing stop was armed at entry");
                let tightened = risk::tighten(position.direction, current, candidate);
                position.cur_stop_price = Some(tightened);
                if options.record_stop_price {
                    if let Some(series) = position.stop_price_series.as_mut() {
                        series.push(TimedValue {
                            time: bar.time,
                            value: tightened,
                        });
                    }
                }
            }

            // (c) Profit target.
            if let Some(target) = position.profit_target {
                if risk::target_hit(position.direction, target, bar) {
                    trades.push(close_position(
                        position,
                        bar.time,
                        target,
                        ExitReason::ProfitTarget,
                    ));
                    return EngineState::Idle;
                }
            }

            // (d) Mark the position at this bar's close.
            position.tick_bar();
            position.update_mark(bar.close);

            // (e) Record open risk.
            if options.record_risk {
                if let (Some(risk_pct), Some(series)) =
                    (position.cur_risk_pct, position.risk_series.as_mut())
                {
                    series.push(TimedValue {
                        time: bar.time,
                        value: risk_pct,
                    });
                }
            }

            // (f) Exit rule.
            if let Some(exit_rule) = &strategy.exit_rule {
                let mut intent = ExitIntent::new();
                let ctx = OpenContext {
                    bar,
                    lookback,
                    entry_price: position.entry_price,
                    position: &position,
                    parameters,
                };
                exit_rule(&mut intent, &ctx);
                if intent.requested() {
                    return EngineState::ExitPending(position);
                }
            }
            EngineState::Open(position)
        }

        EngineState::ExitPending(position) => {
            trades.push(close_position(
                position,
                bar.time,
                bar.open,
                ExitReason::ExitRule,
            ));
            EngineState::Idle
        }
    }
}

/// Create the position at this bar's open and arm its risk management.
///
/// Arming order: fixed stop, then trailing stop (which may only tighten an
/// existing stop), then risk bookkeeping, then profit target.
fn open_position(
    strategy: &Strategy,
    parameters: &Params,
    options: &BacktestOptions,
    direction: TradeDirection,
    bar: &IndicatorBar,
    lookback: &[IndicatorBar],
) -> Position {
    let entry_price = bar.open;
    let mut position = Position::open(direction, bar.time, entry_price);

    if let Some(stop_loss) = &strategy.stop_loss {
        let distance = stop_loss(&RiskContext {
            entry_price,
            position: &position,
            bar,
            lookback,
            parameters,
        });
        let stop = risk::stop_price(direction, entry_price, distance);
        position.initial_stop_price = Some(stop);
        position.cur_stop_price = Some(stop);
    }

    if let Some(trailing) = &strategy.trailing_stop_loss {
        let distance = trailing(&RiskContext {
            entry_price,
            position: &position,
            bar,
            lookback,
            parameters,
        });
        let candidate = risk::stop_price(direction, entry_price, distance);
        let stop = match position.initial_stop_price {
            Some(existing) => risk::tighten(direction, existing, candidate),
            None => candidate,
        };
        position.initial_stop_price = Some(stop);
        position.cur_stop_price = Some(stop);
        if options.record_stop_price {
            position.stop_price_series = Some(vec![TimedValue {
                time: bar.time,
                value: stop,
            }]);
        }
    }

    if let Some(stop) = position.cur_stop_price {
        let unit_risk = risk::unit_risk(direction, entry_price, stop);
        let risk_pct = unit_risk / entry_price * 100.0;
        position.initial_unit_risk = Some(unit_risk);
        position.initial_risk_pct = Some(risk_pct);
        position.cur_risk_pct = Some(risk_pct);
        position.cur_rmultiple = Some(0.0);
        if options.record_risk {
            position.risk_series = Some(vec![TimedValue {
                time: bar.time,
                value: risk_pct,
            }]);
        }
    }

    if let Some(profit_target) = &strategy.profit_target {
        let distance = profit_target(&RiskContext {
            entry_price,
            position: &position,
            bar,
            lookback,
            parameters,
        });
        position.profit_target = Some(risk::target_price(direction, entry_price, distance));
    }

    position
}

/// Convert the position into its final trade record.
fn close_position(
    position: Position,
    exit_time: DateTime<Utc>,
    exit_price: f64,
    exit_reason: ExitReason,
) -> Trade {
    let profit = match position.direction {
        TradeDirection::Long => exit_price - position.entry_price,
        TradeDirection::Short => position.entry_price - exit_price,
    };
    let growth = match position.direction {
        TradeDirection::Long => exit_price / position.entry_price,
        TradeDirection::Short => position.entry_price / exit_price,
    };
    Trade {
        direction: position.direction,
        entry_time: position.entry_time,
        entry_price: position.entry_price,
        exit_time,
        exit_price,
        profit,
        profit_pct: profit / position.entry_price * 100.0,
        growth,
        risk_pct: position.initial_risk_pct,
        rmultiple: position.initial_unit_risk.map(|unit| profit / unit),
        risk_series: position.risk_series,
        holding_period: position.holding_period,
        exit_reason,
        stop_price: position.initial_stop_price,
        stop_price_series: position.stop_price_series,
        profit_target: position.profit_target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::{Duration, TimeZone, Utc};

    fn make_bars(prices: &[(f64, f64, f64, f64)]) -> DataSeries<Bar> {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| {
                Bar::new(
                    base + Duration::days(i as i64),
                    open,
                    high,
                    low,
                    close,
                    1000.0,
                )
            })
            .collect()
    }

    fn flat_bars(n: usize) -> DataSeries<Bar> {
        make_bars(&vec![(100.0, 101.0, 99.0, 100.0); n])
    }

    #[test]
    fn empty_input_is_rejected() {
        let strategy = Strategy::new(|_, _| {});
        let result = backtest(&strategy, &DataSeries::new(Vec::new()), &BacktestOptions::default());
        assert!(matches!(result, Err(BacktestError::EmptyInput)));
    }

    #[test]
    fn input_shorter_than_lookback_is_rejected() {
        let strategy = Strategy::new(|_, _| {}).with_lookback(30);
        let result = backtest(&strategy, &flat_bars(10), &BacktestOptions::default());
        assert!(matches!(
            result,
            Err(BacktestError::InsufficientBars { bars: 10, lookback: 30 })
        ));
    }

    #[test]
    fn no_signal_produces_no_trades() {
        let strategy = Strategy::new(|_, _| {});
        let trades = backtest(&strategy, &flat_bars(20), &BacktestOptions::default()).unwrap();
        assert!(trades.is_empty());
    }

    #[test]
    fn fill_happens_on_the_bar_after_the_signal() {
        // Signal on the first evaluated bar; fill at the second bar's open.
        let bars = make_bars(&[
            (100.0, 101.0, 99.0, 100.0),
            (102.0, 103.0, 101.0, 102.5),
            (103.0, 104.0, 102.0, 103.5),
        ]);
        let strategy = Strategy::new(|intent, ctx| {
            if ctx.bar.open == 100.0 {
                intent.enter_position(crate::strategy::EntryOptions::default());
            }
        });
        let trades = backtest(&strategy, &bars, &BacktestOptions::default()).unwrap();
        assert_eq!(trades.len(), 1);
        let trade = &trades[0];
        assert_eq!(trade.entry_price, 102.0);
        assert_eq!(trade.direction, TradeDirection::Long);
        // Never exited: finalized at the last close.
        assert_eq!(trade.exit_reason, ExitReason::Finalize);
        assert_eq!(trade.exit_price, 103.5);
        assert_eq!(trade.holding_period, 1);
    }

    #[test]
    fn exit_rule_closes_at_next_bar_open() {
        let bars = make_bars(&[
            (100.0, 101.0, 99.0, 100.0), // signal
            (101.0, 102.0, 100.0, 101.5), // entry fill at 101
            (101.5, 103.0, 101.0, 102.0), // exit rule fires
            (104.0, 105.0, 103.0, 104.5), // exit fill at 104
            (105.0, 106.0, 104.0, 105.5),
        ]);
        let strategy = Strategy::new(|intent, ctx| {
            if ctx.bar.open == 100.0 {
                intent.enter_position(crate::strategy::EntryOptions::default());
            }
        })
        .with_exit_rule(|intent, ctx| {
            if ctx.position.holding_period >= 1 {
                intent.exit_position();
            }
        });
        let trades = backtest(&strategy, &bars, &BacktestOptions::default()).unwrap();
        assert_eq!(trades.len(), 1);
        let trade = &trades[0];
        assert_eq!(trade.entry_price, 101.0);
        assert_eq!(trade.exit_price, 104.0);
        assert_eq!(trade.exit_reason, ExitReason::ExitRule);
        assert_eq!(trade.profit, 3.0);
        assert!((trade.growth - 104.0 / 101.0).abs() < 1e-12);
    }

    #[test]
    fn short_profit_is_entry_minus_exit() {
        let bars = make_bars(&[
            (100.0, 101.0, 99.0, 100.0),
            (98.0, 99.0, 96.0, 97.0),
            (96.0, 97.0, 94.0, 95.0),
        ]);
        let strategy = Strategy::new(|intent, ctx| {
            if ctx.bar.open == 100.0 {
                intent.enter_position(crate::strategy::EntryOptions::short());
            }
        });
        let trades = backtest(&strategy, &bars, &BacktestOptions::default()).unwrap();
        assert_eq!(trades.len(), 1);
        let trade = &trades[0];
        assert_eq!(trade.direction, TradeDirection::Short);
        assert_eq!(trade.entry_price, 98.0);
        assert_eq!(trade.exit_price, 95.0);
        assert_eq!(trade.profit, 3.0);
        assert!((trade.growth - 98.0 / 95.0).abs() < 1e-12);
    }

    #[test]
    fn stop_wins_attribution_over_profit_target_on_one_bar() {
        // Bar 2's range reaches both the stop (95) and the target (110);
        // the stop takes attribution.
        let bars = make_bars(&[
            (100.0, 101.0, 99.0, 100.0),
            (100.0, 101.0, 99.0, 100.0),  // entry at 100, stop 95, target 110
            (100.0, 112.0, 94.0, 100.0),  // both levels inside the range
        ]);
        let strategy = Strategy::new(|intent, ctx| {
            if ctx.bar.open == 100.0 {
                intent.enter_position(crate::strategy::EntryOptions::default());
            }
        })
        .with_stop_loss(|_| 5.0)
        .with_profit_target(|_| 10.0);
        let trades = backtest(&strategy, &bars, &BacktestOptions::default()).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_reason, ExitReason::StopLoss);
        assert_eq!(trades[0].exit_price, 95.0);
    }

    #[test]
    fn fixed_stop_records_no_stop_series() {
        let bars = make_bars(&[
            (100.0, 101.0, 99.0, 100.0),
            (100.0, 101.0, 99.0, 100.0),
            (100.0, 101.0, 94.0, 95.0),
        ]);
        let strategy = Strategy::new(|intent, ctx| {
            if ctx.bar.open == 100.0 && ctx.bar.low == 99.0 {
                intent.enter_position(crate::strategy::EntryOptions::default());
            }
        })
        .with_stop_loss(|_| 5.0);
        let options = BacktestOptions {
            record_stop_price: true,
            record_risk: false,
        };
        let trades = backtest(&strategy, &bars, &options).unwrap();
        assert_eq!(trades.len(), 1);
        // Recording is tied to the trailing stop; a fixed stop records nothing.
        assert!(trades[0].stop_price_series.is_none());
        assert_eq!(trades[0].stop_price, Some(95.0));
    }
}
