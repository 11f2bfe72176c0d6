//! Heston put on `(s, v)` with Dirichlet data on the price edges.

use std::sync::Arc;

use openferric_fem::core::{ExerciseStyle, OptionType};
use openferric_fem::fem::create_mesh;
use openferric_fem::models::Heston;
use openferric_fem::payoff::EuropeanOptionBs;
use openferric_fem::space::{DirichletBc, SpaceDiscretization, SpaceSolver};
use openferric_fem::time::ThetaScheme;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let heston = Heston {
        rate: 0.03,
        dividend_yield: 0.0,
        kappa: 1.5,
        theta: 0.04,
        sigma: 0.3,
        rho: -0.7,
    };
    println!("Feller ratio 2κθ/σ² = {:.3}", heston.cir_number());

    let mut space = SpaceSolver::builder()
        .mesh(create_mesh(&[2.0, 0.5], 4)?)
        .dynamics(Arc::new(heston))
        .payoff(Arc::new(EuropeanOptionBs::new(1.0, 0.03, 0.0)))
        .option_type(OptionType::Put)
        .build()?;
    println!("{} dofs", space.n_dofs());

    let times: Vec<f64> = (0..=10).map(|i| 0.05 * i as f64).collect();
    let bc = DirichletBc::new(["s_min", "s_max"]);
    let solution = ThetaScheme::crank_nicolson().solve(&times, &mut space, Some(&bc), ExerciseStyle::European)?;

    for v in [0.02, 0.04, 0.08] {
        for s in [0.9, 1.0, 1.1] {
            let dof = space.nearest_dof(&[s, v])?;
            let x = space.physical_location(dof);
            println!("  s = {:.3}  v = {:.4}  put = {:.6}", x[0], x[1], solution.final_values()[dof]);
        }
    }
    Ok(())
}
