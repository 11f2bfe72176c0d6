//! Black-Scholes call on a uniform interval, compared with the closed form.

use std::sync::Arc;

use openferric_fem::core::{ExerciseStyle, OptionType};
use openferric_fem::fem::create_mesh;
use openferric_fem::models::BlackScholes;
use openferric_fem::payoff::{EuropeanOptionBs, Payoff};
use openferric_fem::space::SpaceSolver;
use openferric_fem::time::ThetaScheme;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let (rate, sigma, strike, maturity) = (0.03, 0.2, 1.0, 1.0);
    let payoff = EuropeanOptionBs::new(strike, rate, 0.0);
    let times: Vec<f64> = (0..=20).map(|i| maturity * i as f64 / 20.0).collect();

    for option in [OptionType::Call, OptionType::Put] {
        let mut space = SpaceSolver::builder()
            .mesh(create_mesh(&[2.0], 5)?)
            .dynamics(Arc::new(BlackScholes::new(rate, 0.0, sigma)))
            .payoff(Arc::new(payoff))
            .option_type(option)
            .build()?;
        let solution = ThetaScheme::crank_nicolson().solve(&times, &mut space, None, ExerciseStyle::European)?;

        println!("{option:?}:");
        for s in [0.8, 0.9, 1.0, 1.1, 1.2] {
            let dof = space.nearest_dof(&[s])?;
            let node = space.physical_location(dof)[0];
            let fem = solution.final_values()[dof];
            let exact = payoff.price(option, maturity, node, sigma * sigma);
            println!("  s = {node:.4}  fem = {fem:.6}  closed form = {exact:.6}  err = {:.2e}", fem - exact);
        }
    }
    Ok(())
}
