//! Strategies applying boundary data to an assembled θ-step system.

use super::SpaceDiscretization;
use crate::core::Result;
use crate::linalg::CsrMatrix;

/// Transforms `(A, b)` before the linear solve of a time step.
///
/// `t` is the solver time of the start of the step.
pub trait BoundaryCondition {
    fn apply(
        &self,
        space: &mut dyn SpaceDiscretization,
        a: CsrMatrix,
        b: Vec<f64>,
        t: f64,
    ) -> Result<(CsrMatrix, Vec<f64>)>;
}

/// Leaves the system untouched: only the natural boundary term acts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBoundary;

impl BoundaryCondition for NoBoundary {
    fn apply(
        &self,
        _space: &mut dyn SpaceDiscretization,
        a: CsrMatrix,
        b: Vec<f64>,
        _t: f64,
    ) -> Result<(CsrMatrix, Vec<f64>)> {
        Ok((a, b))
    }
}

/// Imposes the reference price on the dofs of the named boundaries.
///
/// An empty name list disables enforcement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirichletBc {
    boundaries: Vec<String>,
}

impl DirichletBc {
    /// Enforces the reference price on the named boundaries.
    pub fn new<I, S>(boundaries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            boundaries: boundaries.into_iter().map(Into::into).collect(),
        }
    }

    /// Boundary names.
    pub fn boundaries(&self) -> &[String] {
        &self.boundaries
    }
}

impl BoundaryCondition for DirichletBc {
    fn apply(
        &self,
        space: &mut dyn SpaceDiscretization,
        a: CsrMatrix,
        b: Vec<f64>,
        t: f64,
    ) -> Result<(CsrMatrix, Vec<f64>)> {
        if self.boundaries.is_empty() {
            return Ok((a, b));
        }
        let values = space.dirichlet(t)?;
        space.apply_dirichlet(&a, &b, &self.boundaries, &values)
    }
}
