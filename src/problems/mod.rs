//! Ready-made pricing problems bundling dynamics, payoff and boundary strategy.

pub mod credit_risk;
pub mod option_pricing;

pub use credit_risk::{CreditRiskProblem, MonteCarloComparison, credit_risk_monte_carlo};
pub use option_pricing::OptionPricingProblem;

use std::sync::Arc;

use crate::core::OptionType;
use crate::fem::SimplexMesh;
use crate::models::DynamicsModel;
use crate::payoff::Payoff;
use crate::space::{DirichletBc, SpaceSolverBuilder, SpaceSolver};

/// PDE ingredients consumed by [`SpaceSolver`] and the time steppers.
#[derive(Clone)]
pub struct Problem {
    pub dynamics: Arc<dyn DynamicsModel>,
    pub payoff: Arc<dyn Payoff>,
    pub option: OptionType,
    pub boundary_condition: DirichletBc,
}

impl std::fmt::Debug for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Problem")
            .field("dim", &self.dynamics.dim())
            .field("option", &self.option)
            .field("boundary_condition", &self.boundary_condition)
            .finish()
    }
}

impl Problem {
    /// Space-solver builder preloaded with this problem on `mesh`.
    pub fn space(&self, mesh: SimplexMesh) -> SpaceSolverBuilder {
        SpaceSolver::builder()
            .mesh(mesh)
            .dynamics(self.dynamics.clone())
            .payoff(self.payoff.clone())
            .option_type(self.option)
    }
}
