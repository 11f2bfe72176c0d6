//! Spatial discretization of the pricing PDE.

pub mod adaptive;
pub mod boundary;
pub mod forms;
pub mod solver;

pub use adaptive::{AdaptiveMesh, Criterion, MarkingRule};
pub use boundary::{BoundaryCondition, DirichletBc, NoBoundary};
pub use forms::PdeForms;
pub use solver::{SpaceSolver, SpaceSolverBuilder};

use crate::core::{Generation, NumericConfig, Result};
use crate::linalg::CsrMatrix;

/// Operators a time stepper needs from a spatial discretization.
///
/// Vectors and matrices are only valid for the [`Generation`] that produced them.
pub trait SpaceDiscretization {
    fn n_dofs(&self) -> usize;

    fn generation(&self) -> Generation;

    fn config(&self) -> &NumericConfig;

    /// Projected terminal payoff.
    fn initial_condition(&mut self) -> Result<Vec<f64>>;

    /// `(M − θ dt K, M + (1 − θ) dt K)`.
    fn matrices(&self, theta: f64, dt: f64) -> Result<(CsrMatrix, CsrMatrix)>;

    /// Natural-boundary load at solver time `t`.
    fn boundary_term(&self, t: f64) -> Result<Vec<f64>>;

    /// Projected reference price at solver time `t`.
    fn dirichlet(&mut self, t: f64) -> Result<Vec<f64>>;

    /// Eliminates the dofs of `boundaries`, imposing `values` there.
    fn apply_dirichlet(
        &self,
        a: &CsrMatrix,
        b: &[f64],
        boundaries: &[String],
        values: &[f64],
    ) -> Result<(CsrMatrix, Vec<f64>)>;
}
