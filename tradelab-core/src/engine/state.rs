//! Position lifecycle state for the bar loop.

use crate::domain::{Position, TradeDirection};

/// Lifecycle state the dispatcher matches on each bar.
///
/// A position exists exactly when the state is `Open` or `ExitPending`;
/// the variants carry it, so there is no nullable position to assert on.
#[derive(Debug)]
pub(crate) enum EngineState {
    /// No position and no pending entry.
    Idle,
    /// Entry signaled on an earlier bar; waiting for the fill bar (and,
    /// for conditional entries, for price to trade through the level).
    AwaitingEntry {
        direction: TradeDirection,
        conditional_price: Option<f64>,
    },
    /// A position is open.
    Open(Position),
    /// The exit rule fired; the position closes at the next bar's open.
    ExitPending(Position),
}
