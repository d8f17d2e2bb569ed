use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Single OHLCV bar with timestamp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Create a new bar
    pub fn new(time: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self { time, open, high, low, close, volume }
    }

    /// Check the bar's shape: no negative values, a non-inverted high/low
    /// range, and open/close inside that range.
    pub fn validate(&self) -> Result<(), BarError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (field, value) in fields {
            if value < 0.0 {
                return Err(BarError::Negative {
                    time: self.time,
                    field,
                    value,
                });
            }
        }
        if self.high < self.low {
            return Err(BarError::InvertedRange {
                time: self.time,
                high: self.high,
                low: self.low,
            });
        }
        for (field, value) in [("open", self.open), ("close", self.close)] {
            if value < self.low || value > self.high {
                return Err(BarError::OutsideRange {
                    time: self.time,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// A malformed bar.
#[derive(Debug, Error)]
pub enum BarError {
    #[error("bar at {time}: {field} {value} is negative")]
    Negative {
        time: DateTime<Utc>,
        field: &'static str,
        value: f64,
    },

    #[error("bar at {time}: high {high} is below low {low}")]
    InvertedRange {
        time: DateTime<Utc>,
        high: f64,
        low: f64,
    },

    #[error("bar at {time}: {field} {value} lies outside the high/low range")]
    OutsideRange {
        time: DateTime<Utc>,
        field: &'static str,
        value: f64,
    },
}

/// A bar augmented with the named indicator values a strategy's
/// `prep_indicators` step computed for it (e.g. a moving average).
///
/// Values live in a `BTreeMap` for the same reason `Params` does: these
/// bars serialize, and output must not depend on hash iteration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicatorBar {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Additional named series values, keyed by indicator name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, f64>,
}

impl IndicatorBar {
    /// Attach a named indicator value.
    pub fn with_value(mut self, name: &str, value: f64) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    /// Look up a named indicator value.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

impl From<Bar> for IndicatorBar {
    fn from(bar: Bar) -> Self {
        Self {
            time: bar.time,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            values: BTreeMap::new(),
        }
    }
}
