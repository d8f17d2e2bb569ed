//! Parameter definitions and the discrete search grid they induce.
//!
//! Each definition spans one axis of the search space with the values
//! `start, start + step, … ≤ end`. Optimizers work in index space — a
//! coordinate is one index per axis, with axis 0 the outermost (slowest
//! varying) dimension in enumeration order — and materialize named values
//! only when invoking the backtest.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradelab_core::strategy::Params;

/// One tunable parameter and the discrete range to search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDef {
    pub name: String,
    pub starting_value: f64,
    pub ending_value: f64,
    pub step_size: f64,
}

impl ParameterDef {
    pub fn new(name: &str, starting_value: f64, ending_value: f64, step_size: f64) -> Self {
        Self {
            name: name.to_string(),
            starting_value,
            ending_value,
            step_size,
        }
    }

    /// All values on this axis, in order.
    pub fn values(&self) -> Vec<f64> {
        let mut values = Vec::new();
        let mut value = self.starting_value;
        while value <= self.ending_value {
            values.push(value);
            value += self.step_size;
        }
        values
    }

    fn validate(&self) -> Result<(), ParameterError> {
        if self.step_size <= 0.0 {
            return Err(ParameterError::StepNotPositive {
                name: self.name.clone(),
                step_size: self.step_size,
            });
        }
        if self.ending_value < self.starting_value {
            return Err(ParameterError::ReversedRange {
                name: self.name.clone(),
                starting_value: self.starting_value,
                ending_value: self.ending_value,
            });
        }
        Ok(())
    }
}

/// Malformed parameter definitions.
#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("parameter {name:?}: step size must be positive, got {step_size}")]
    StepNotPositive { name: String, step_size: f64 },

    #[error("parameter {name:?}: ending value {ending_value} is below starting value {starting_value}")]
    ReversedRange {
        name: String,
        starting_value: f64,
        ending_value: f64,
    },
}

/// The discrete grid induced by a list of parameter definitions.
#[derive(Debug, Clone)]
pub(crate) struct SearchGrid {
    names: Vec<String>,
    axes: Vec<Vec<f64>>,
}

impl SearchGrid {
    pub fn build(defs: &[ParameterDef]) -> Result<Self, ParameterError> {
        for def in defs {
            def.validate()?;
        }
        Ok(Self {
            names: defs.iter().map(|d| d.name.clone()).collect(),
            axes: defs.iter().map(|d| d.values()).collect(),
        })
    }

    pub fn num_axes(&self) -> usize {
        self.axes.len()
    }

    pub fn axis_len(&self, axis: usize) -> usize {
        self.axes[axis].len()
    }

    /// Total number of coordinates.
    pub fn size(&self) -> usize {
        self.axes.iter().map(Vec::len).product()
    }

    /// Decode the i-th coordinate of the outer-axis-major enumeration.
    pub fn coordinate(&self, mut index: usize) -> Vec<usize> {
        let mut coordinate = vec![0; self.axes.len()];
        for axis in (0..self.axes.len()).rev() {
            let len = self.axes[axis].len();
            coordinate[axis] = index % len;
            index /= len;
        }
        coordinate
    }

    /// Materialize a coordinate as named parameter values.
    pub fn params(&self, coordinate: &[usize]) -> Params {
        self.names
            .iter()
            .zip(&self.axes)
            .zip(coordinate)
            .map(|((name, axis), &i)| (name.clone(), axis[i]))
            .collect()
    }

    /// Neighbors of a coordinate: each axis stepped up by one (while in
    /// bounds), axes in order, then each axis stepped down by one.
    pub fn neighbors(&self, coordinate: &[usize]) -> Vec<Vec<usize>> {
        let mut neighbors = Vec::new();
        for axis in 0..self.axes.len() {
            if coordinate[axis] + 1 < self.axes[axis].len() {
                let mut neighbor = coordinate.to_vec();
                neighbor[axis] += 1;
                neighbors.push(neighbor);
            }
        }
        for axis in 0..self.axes.len() {
            if coordinate[axis] > 0 {
                let mut neighbor = coordinate.to_vec();
                neighbor[axis] -= 1;
                neighbors.push(neighbor);
            }
        }
        neighbors
    }
}
