use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Problem;
use crate::core::{ExerciseStyle, OptionType, PdeError, Result};
use crate::fem::{BoundaryPredicate, SimplexMesh, create_mesh};
use crate::models::{CreditRisk, CreditRiskJump};
use crate::payoff::CreditRiskPayoff;
use crate::space::{DirichletBc, SpaceDiscretization, SpaceSolver};
use crate::time::ThetaScheme;

/// Defaultable zero-coupon bond under a constant default intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditRiskProblem {
    pub rate: f64,
    pub default_intensity: f64,
    pub recovery: f64,
    pub boundaries: Vec<String>,
}

impl Default for CreditRiskProblem {
    fn default() -> Self {
        Self {
            rate: 0.03,
            default_intensity: 0.02,
            recovery: 0.4,
            boundaries: vec!["default".to_string(), "survival".to_string()],
        }
    }
}

impl CreditRiskProblem {
    /// Constant-intensity dynamics.
    pub fn dynamics(&self) -> CreditRisk {
        CreditRisk {
            rate: self.rate,
            intensity: self.default_intensity,
        }
    }

    /// Bond loss payoff.
    pub fn payoff(&self) -> CreditRiskPayoff {
        CreditRiskPayoff {
            recovery: self.recovery,
            rate: self.rate,
        }
    }

    /// Bundles dynamics, payoff and Dirichlet strategy.
    pub fn problem(&self) -> Problem {
        Problem {
            dynamics: Arc::new(self.dynamics()),
            payoff: Arc::new(self.payoff()),
            option: OptionType::Put,
            boundary_condition: DirichletBc::new(self.boundaries.iter().cloned()),
        }
    }

    /// Interval `[0, extent]` tagged `default` at the left end and `survival` at the right.
    pub fn mesh(&self, extent: f64, refinements: u32) -> Result<SimplexMesh> {
        let mesh = create_mesh(&[extent], refinements)?;
        let tol = 1e-10 * extent.max(1.0);
        let default: BoundaryPredicate = Arc::new(move |x: &[f64]| x[0].abs() <= tol);
        let survival: BoundaryPredicate = Arc::new(move |x: &[f64]| (x[0] - extent).abs() <= tol);
        Ok(mesh.with_boundaries(vec![
            ("default".to_string(), default),
            ("survival".to_string(), survival),
        ]))
    }
}

/// Mean PDE value over sampled intensities next to the analytic expected loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloComparison {
    pub pde_mean: f64,
    pub analytic_mean: f64,
    pub samples: usize,
}

/// Solves one independent PDE per sampled intensity.
///
/// Intensities are drawn sequentially from `seed`, so results do not depend on
/// whether the solves run in parallel (feature `parallel`). The analytic
/// baseline is `e^{−rT} (1 − R) (1 − e^{−λT})` per sample.
pub fn credit_risk_monte_carlo(
    dynamics: &CreditRiskJump,
    payoff: &CreditRiskPayoff,
    maturity: f64,
    samples: usize,
    seed: u64,
) -> Result<MonteCarloComparison> {
    if samples == 0 {
        return Err(PdeError::InvalidInput("samples must be > 0".to_string()));
    }
    if !maturity.is_finite() || maturity <= 0.0 {
        return Err(PdeError::InvalidInput("maturity must be > 0".to_string()));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let scenarios = (0..samples)
        .map(|_| dynamics.sample(&mut rng))
        .collect::<Result<Vec<_>>>()?;

    let mesh = Arc::new(create_mesh(&[1.0], 1)?);
    let times: Vec<f64> = (0..5).map(|i| maturity * i as f64 / 4.0).collect();
    let discount = (-dynamics.base.rate * maturity).exp();

    let solve_one = |scenario: &CreditRisk| -> Result<(f64, f64)> {
        let mut space = SpaceSolver::builder()
            .mesh(mesh.clone())
            .dynamics(Arc::new(*scenario))
            .payoff(Arc::new(*payoff))
            .option_type(OptionType::Put)
            .build()?;
        let bc = DirichletBc::default();
        let solution = ThetaScheme::crank_nicolson().solve(
            &times,
            &mut space,
            Some(&bc),
            ExerciseStyle::European,
        )?;
        let pde = solution.value_at(solution.len() - 1, 0).ok_or(PdeError::DimensionMismatch {
            context: "credit solution",
            expected: 1,
            found: space.n_dofs(),
        })?;
        let analytic = discount
            * payoff.loss_given_default()
            * (1.0 - (-scenario.intensity * maturity).exp());
        Ok((pde, analytic))
    };

    #[cfg(feature = "parallel")]
    let results = scenarios.par_iter().map(solve_one).collect::<Result<Vec<_>>>()?;
    #[cfg(not(feature = "parallel"))]
    let results = scenarios.iter().map(solve_one).collect::<Result<Vec<_>>>()?;

    let n = samples as f64;
    let (pde_sum, analytic_sum) = results
        .iter()
        .fold((0.0, 0.0), |(p, a), (x, y)| (p + x, a + y));
    debug!(samples, pde = pde_sum / n, analytic = analytic_sum / n, "credit monte carlo");
    Ok(MonteCarloComparison {
        pde_mean: pde_sum / n,
        analytic_mean: analytic_sum / n,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn named_boundaries_on_credit_mesh() {
        let p = CreditRiskProblem::default();
        let mesh = p.mesh(1.0, 2).unwrap();
        assert_eq!(mesh.boundary_facets("default").unwrap().len(), 1);
        assert_eq!(mesh.boundary_facets("survival").unwrap().len(), 1);
    }

    #[test]
    fn dirichlet_credit_problem_discounts_loss() {
        let p = CreditRiskProblem::default();
        let problem = p.problem();
        let mut space = problem.space(p.mesh(1.0, 2).unwrap()).build().unwrap();
        let times = [0.0, 0.25, 0.5, 0.75, 1.0];
        let sol = ThetaScheme::implicit_euler()
            .solve(
                &times,
                &mut space,
                Some(&problem.boundary_condition),
                ExerciseStyle::European,
            )
            .unwrap();
        for v in sol.final_values() {
            assert!(v.is_finite());
            assert!(*v > 0.0 && *v <= 0.6 + 1e-12);
        }
    }

    #[test]
    fn monte_carlo_is_reproducible() {
        let jump = CreditRiskJump::new(0.03, 0.02, 0.3);
        let payoff = CreditRiskPayoff {
            recovery: 0.4,
            rate: 0.03,
        };
        let a = credit_risk_monte_carlo(&jump, &payoff, 1.0, 6, 0).unwrap();
        let b = credit_risk_monte_carlo(&jump, &payoff, 1.0, 6, 0).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.samples, 6);
        assert!(a.analytic_mean > 0.0 && a.analytic_mean < 0.6);
        // The PDE carries the full loss; only discounting acts on a constant payoff.
        let cn = (1.0 - 0.5 * 0.03 * 0.25) / (1.0 + 0.5 * 0.03 * 0.25_f64);
        assert_relative_eq!(a.pde_mean, 0.6 * cn.powi(4), epsilon = 1e-10);
        assert!(credit_risk_monte_carlo(&jump, &payoff, 1.0, 0, 0).is_err());
    }
}
