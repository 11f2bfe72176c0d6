//! Residual-driven refinement around the strike of a Black-Scholes call.

use std::sync::Arc;

use openferric_fem::core::{ElementKind, ExerciseStyle, NumericConfig};
use openferric_fem::fem::create_mesh;
use openferric_fem::models::BlackScholes;
use openferric_fem::payoff::{EuropeanOptionBs, Payoff};
use openferric_fem::space::{AdaptiveMesh, Criterion, MarkingRule, SpaceDiscretization, SpaceSolver};
use openferric_fem::time::ThetaScheme;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let payoff = EuropeanOptionBs::new(1.0, 0.03, 0.0);
    let mut space = SpaceSolver::builder()
        .mesh(create_mesh(&[2.0], 3)?)
        .dynamics(Arc::new(BlackScholes::new(0.03, 0.0, 0.2)))
        .payoff(Arc::new(payoff))
        .config(NumericConfig::default().with_element(ElementKind::P1))
        .adaptive(AdaptiveMesh::new(Criterion::Residual).marking(MarkingRule::Bulk).theta(0.6))
        .build()?;

    let times: Vec<f64> = (0..=10).map(|i| 0.1 * i as f64).collect();
    let exact = payoff.call(1.0, 1.0, 0.04);
    for round in 0..5 {
        let solution = ThetaScheme::crank_nicolson().solve(&times, &mut space, None, ExerciseStyle::European)?;
        let atm = space.nearest_dof(&[1.0])?;
        let px = solution.final_values()[atm];
        println!(
            "round {round}: {:3} cells  {:3} dofs  atm = {px:.6}  err = {:.2e}",
            space.mesh().n_cells(),
            space.n_dofs(),
            px - exact
        );
        space.refine_from(&solution)?;
    }
    Ok(())
}
