//! Integration tests for Monte Carlo trade resampling.

use chrono::{TimeZone, Utc};
use tradelab_core::domain::{ExitReason, Trade, TradeDirection};
use tradelab_runner::metrics::compute_equity_curve;
use tradelab_runner::monte_carlo::{monte_carlo, MonteCarloOptions};

fn make_trade(profit: f64) -> Trade {
    let entry_price = 100.0;
    Trade {
        direction: TradeDirection::Long,
        entry_time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        entry_price,
        exit_time: Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap(),
        exit_price: entry_price + profit,
        profit,
        profit_pct: profit,
        growth: (entry_price + profit) / entry_price,
        risk_pct: None,
        rmultiple: None,
        risk_series: None,
        holding_period: 5,
        exit_reason: ExitReason::ExitRule,
        stop_price: None,
        stop_price_series: None,
        profit_target: None,
    }
}

fn population() -> Vec<Trade> {
    vec![
        make_trade(1.0),
        make_trade(-2.0),
        make_trade(3.0),
        make_trade(-4.0),
        make_trade(5.0),
    ]
}

#[test]
fn samples_have_the_requested_shape() {
    let trades = population();
    let samples = monte_carlo(&trades, 10, 7, &MonteCarloOptions::default());

    assert_eq!(samples.len(), 10);
    for sample in &samples {
        assert_eq!(sample.len(), 7);
    }
}

#[test]
fn every_sampled_trade_comes_from_the_population() {
    let trades = population();
    let samples = monte_carlo(&trades, 20, 9, &MonteCarloOptions::default());

    for sample in &samples {
        for trade in sample {
            assert!(trades.contains(trade));
        }
    }
}

#[test]
fn sampling_with_replacement_repeats_trades() {
    let trades = population();
    // 25 draws from a population of 5 must repeat something.
    let samples = monte_carlo(&trades, 1, 25, &MonteCarloOptions::default());
    let profits: Vec<f64> = samples[0].iter().map(|t| t.profit).collect();
    let mut deduped = profits.clone();
    deduped.sort_by(|a, b| a.partial_cmp(b).unwrap());
    deduped.dedup();
    assert!(deduped.len() < profits.len());
}

#[test]
fn empty_population_yields_no_samples() {
    let samples = monte_carlo(&[], 10, 7, &MonteCarloOptions::default());
    assert!(samples.is_empty());
}

#[test]
fn zero_iterations_or_samples_degenerate_cleanly() {
    let trades = population();
    assert!(monte_carlo(&trades, 0, 7, &MonteCarloOptions::default()).is_empty());

    let empties = monte_carlo(&trades, 3, 0, &MonteCarloOptions::default());
    assert_eq!(empties.len(), 3);
    assert!(empties.iter().all(Vec::is_empty));
}

#[test]
fn same_seed_reproduces_the_draws() {
    let trades = population();
    let options = MonteCarloOptions { random_seed: 42 };
    let first = monte_carlo(&trades, 10, 7, &options);
    let second = monte_carlo(&trades, 10, 7, &options);
    assert_eq!(first, second);
}

#[test]
fn different_seeds_draw_differently() {
    let trades = population();
    let first = monte_carlo(&trades, 10, 7, &MonteCarloOptions { random_seed: 1 });
    let second = monte_carlo(&trades, 10, 7, &MonteCarloOptions { random_seed: 2 });
    assert_ne!(first, second);
}

#[test]
fn samples_feed_the_equity_curve() {
    let trades = population();
    let samples = monte_carlo(&trades, 5, 10, &MonteCarloOptions::default());

    for sample in &samples {
        let curve = compute_equity_curve(10_000.0, sample);
        assert_eq!(curve.len(), 11);
        for (i, trade) in sample.iter().enumerate() {
            assert!((curve[i + 1] - curve[i] * trade.growth).abs() < 1e-9);
        }
    }
}
