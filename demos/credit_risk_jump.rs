//! Expected loss of a defaultable bond under a log-normally jittered intensity.

use openferric_fem::models::CreditRiskJump;
use openferric_fem::problems::{CreditRiskProblem, credit_risk_monte_carlo};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let preset = CreditRiskProblem::default();
    let dynamics = CreditRiskJump::new(preset.rate, preset.default_intensity, 0.5);
    let payoff = preset.payoff();

    for samples in [16, 64, 256] {
        let cmp = credit_risk_monte_carlo(&dynamics, &payoff, 1.0, samples, 7)?;
        println!(
            "samples = {:4}  pde mean = {:.6}  analytic mean = {:.6}  diff = {:.2e}",
            cmp.samples,
            cmp.pde_mean,
            cmp.analytic_mean,
            cmp.pde_mean - cmp.analytic_mean
        );
    }
    Ok(())
}
