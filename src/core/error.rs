//! Crate-wide error type.
//!
//! Every fallible operation returns [`Result`]. Nothing in the engine retries:
//! failures propagate to the immediate caller with the failing time index or
//! degree of freedom attached where one is known.

use thiserror::Error;

use super::Generation;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PdeError>;

/// Errors surfaced by the PDE engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PdeError {
    /// Arity of a dynamics model, vector or matrix does not match the mesh/basis.
    #[error("dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    /// An optional collaborator was required but never configured.
    #[error("not configured: {0}")]
    NotConfigured(&'static str),

    /// The linear system of a time step (or projection) could not be solved.
    #[error("singular system at step {step}{}: {message}", dof_suffix(.dof))]
    SingularSystem {
        step: usize,
        dof: Option<usize>,
        message: String,
    },

    /// Input validation error.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A Dirichlet strategy referenced a boundary name the mesh does not define.
    #[error("unknown boundary `{0}`")]
    UnknownBoundary(String),

    /// A dof vector from an earlier mesh generation was passed to a refined space.
    #[error("stale dof vector: space is at {expected}, vector belongs to {found}")]
    StaleGeneration {
        expected: Generation,
        found: Generation,
    },

    /// Requested operation is outside what the bundled FEM backend supports.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

fn dof_suffix(dof: &Option<usize>) -> String {
    dof.map(|d| format!(" (dof {d})")).unwrap_or_default()
}

impl PdeError {
    /// Attaches a time-step index to a singular-system error.
    pub fn at_step(self, step: usize) -> Self {
        match self {
            Self::SingularSystem { dof, message, .. } => Self::SingularSystem { step, dof, message },
            other => other,
        }
    }
}
