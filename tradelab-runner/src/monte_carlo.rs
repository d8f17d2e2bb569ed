//! Monte Carlo resampling of a completed-trade population.
//!
//! Draws trades with replacement to build synthetic trade sequences;
//! downstream equity/drawdown reductions over the samples give a
//! distribution instead of a single path.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use tradelab_core::domain::Trade;

/// Options for [`monte_carlo`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MonteCarloOptions {
    pub random_seed: u64,
}

/// Draw `num_iterations` samples of `num_samples` trades each, with
/// replacement. An empty population yields no samples.
pub fn monte_carlo(
    trades: &[Trade],
    num_iterations: usize,
    num_samples: usize,
    options: &MonteCarloOptions,
) -> Vec<Vec<Trade>> {
    if trades.is_empty() {
        return Vec::new();
    }
    let mut rng = ChaCha8Rng::seed_from_u64(options.random_seed);
    (0..num_iterations)
        .map(|_| {
            (0..num_samples)
                .map(|_| trades[rng.gen_range(0..trades.len())].clone())
                .collect()
        })
        .collect()
}
