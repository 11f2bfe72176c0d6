//! Heston with a mean-reverting short rate on a coarse `(s, v, r)` cube.

use std::sync::Arc;

use openferric_fem::core::{ElementKind, ExerciseStyle, NumericConfig};
use openferric_fem::fem::create_mesh;
use openferric_fem::models::Heston3d;
use openferric_fem::payoff::EuropeanOptionBs;
use openferric_fem::space::{SpaceDiscretization, SpaceSolver};
use openferric_fem::time::ThetaScheme;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let dynamics = Heston3d {
        rate: 0.03,
        dividend_yield: 0.0,
        kappa: 1.5,
        theta: 0.04,
        sigma_v: 0.3,
        rho: -0.6,
        kappa_r: 0.5,
        theta_r: 0.03,
        sigma_r: 0.01,
    };
    let mut space = SpaceSolver::builder()
        .mesh(create_mesh(&[2.0, 0.5, 0.1], 2)?)
        .dynamics(Arc::new(dynamics))
        .payoff(Arc::new(EuropeanOptionBs::new(1.0, 0.03, 0.0)))
        .config(NumericConfig::default().with_element(ElementKind::P1))
        .build()?;
    println!("{} dofs, {} tetrahedra", space.n_dofs(), space.mesh().n_cells());

    let times: Vec<f64> = (0..=5).map(|i| 0.1 * i as f64).collect();
    let solution = ThetaScheme::implicit_euler().solve(&times, &mut space, None, ExerciseStyle::European)?;

    for r in [0.0, 0.025, 0.05] {
        let dof = space.nearest_dof(&[1.0, 0.0625, r])?;
        let x = space.physical_location(dof);
        println!(
            "  s = {:.3}  v = {:.4}  r = {:.3}  call = {:.6}",
            x[0],
            x[1],
            x[2],
            solution.final_values()[dof]
        );
    }
    Ok(())
}
