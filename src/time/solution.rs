use serde::{Deserialize, Serialize};

use crate::core::Generation;

/// Dof vectors indexed by time step; row 0 is the projected payoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    generation: Generation,
    times: Vec<f64>,
    values: Vec<Vec<f64>>,
}

impl Solution {
    pub(crate) fn new(generation: Generation, times: Vec<f64>, values: Vec<Vec<f64>>) -> Self {
        Self {
            generation,
            times,
            values,
        }
    }

    /// Mesh generation the dof vectors belong to.
    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Time nodes of the computed rows.
    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// All rows, oldest first.
    #[inline]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Row of time step `step`.
    #[inline]
    pub fn row(&self, step: usize) -> Option<&[f64]> {
        self.values.get(step).map(Vec::as_slice)
    }

    /// Number of stored rows, including the initial condition.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when no row is stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Last computed row.
    pub fn final_values(&self) -> &[f64] {
        self.values.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Value of `dof` at `step`.
    pub fn value_at(&self, step: usize, dof: usize) -> Option<f64> {
        self.values.get(step).and_then(|row| row.get(dof)).copied()
    }
}
