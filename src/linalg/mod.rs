//! Sparse matrices and linear solvers backing the finite-element engine.

pub mod csr;
pub mod solver;

pub use csr::CsrMatrix;
pub use solver::{IterativeReport, LinearSolver, SolverStatus};
