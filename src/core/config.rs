use serde::{Deserialize, Serialize};

/// Lagrange element order used for the spatial basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ElementKind {
    /// Piecewise-linear, one dof per vertex.
    P1,
    /// Piecewise-quadratic, one dof per vertex and per edge.
    #[default]
    P2,
}

impl ElementKind {
    /// Polynomial degree of the element.
    pub fn degree(self) -> usize {
        match self {
            Self::P1 => 1,
            Self::P2 => 2,
        }
    }
}

/// Linear solver selection for time-step and projection systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolverKind {
    /// Direct LU up to `direct_solver_max_dofs`, BiCGStab above.
    #[default]
    Auto,
    /// Dense LU factorization (cached while the matrix is unchanged).
    Direct,
    /// Jacobi-preconditioned BiCGStab.
    BiCgStab,
}

/// Numerical configuration threaded through every call that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericConfig {
    /// Regularization of the mean-variance integral near `th = 0`.
    pub eps: f64,
    /// Element used for the spatial basis.
    pub element: ElementKind,
    /// Linear solver strategy.
    pub solver: SolverKind,
    /// Largest system handled by the direct solver under [`SolverKind::Auto`].
    pub direct_solver_max_dofs: usize,
    /// Relative residual target for BiCGStab.
    pub iterative_tolerance: f64,
    /// Iteration cap for BiCGStab.
    pub iterative_max_iter: usize,
}

impl Default for NumericConfig {
    fn default() -> Self {
        Self {
            eps: 1.0e-10,
            element: ElementKind::P2,
            solver: SolverKind::Auto,
            direct_solver_max_dofs: 2_500,
            iterative_tolerance: 1.0e-12,
            iterative_max_iter: 5_000,
        }
    }
}

impl NumericConfig {
    /// Overrides the element order.
    pub fn with_element(mut self, element: ElementKind) -> Self {
        self.element = element;
        self
    }

    /// Overrides the linear solver strategy.
    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Overrides the mean-variance regularization.
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Validates that all tolerances are finite and positive.
    pub fn validate(&self) -> super::Result<()> {
        if !self.eps.is_finite() || self.eps <= 0.0 {
            return Err(super::PdeError::InvalidInput(
                "eps must be finite and > 0".to_string(),
            ));
        }
        if !self.iterative_tolerance.is_finite() || self.iterative_tolerance <= 0.0 {
            return Err(super::PdeError::InvalidInput(
                "iterative_tolerance must be finite and > 0".to_string(),
            ));
        }
        if self.iterative_max_iter == 0 {
            return Err(super::PdeError::InvalidInput(
                "iterative_max_iter must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
