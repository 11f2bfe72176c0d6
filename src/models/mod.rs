//! Markov dynamics feeding the Feynman–Kac operator.
//!
//! A model supplies the drift `b`, the diffusion matrix `A` and its row
//! divergence `divA` at physical state coordinates. Matrices are written
//! row-major into caller-provided buffers of length `dim * dim`.

pub mod black_scholes;
pub mod credit;
pub mod heston;

pub use black_scholes::BlackScholes;
pub use credit::{CreditRisk, CreditRiskJump};
pub use heston::{Heston, Heston3d};

use crate::core::{NumericConfig, OptionType, Result};
use crate::payoff::Payoff;

/// Coefficients of `∂u/∂t = ½ A:∇²u + b·∇u − r u` in physical coordinates.
pub trait DynamicsModel: Send + Sync {
    /// Number of state variables.
    fn dim(&self) -> usize;

    /// Discount rate of the `−r u` term.
    fn rate(&self) -> f64;

    fn dividend_yield(&self) -> f64 {
        0.0
    }

    fn drift(&self, x: &[f64], out: &mut [f64]);

    fn diffusion(&self, x: &[f64], out: &mut [f64]);

    fn diffusion_divergence(&self, x: &[f64], out: &mut [f64]);

    /// Expected variance over `[0, th]` starting from variance `v`.
    fn mean_variance(&self, th: f64, v: f64, config: &NumericConfig) -> f64;

    /// Whether [`DynamicsModel::boundary_flux`] contributes a natural-boundary term.
    fn has_natural_boundary(&self) -> bool {
        false
    }

    /// Density of `½ n·(A ∇u)` on the boundary at time-to-maturity `th`.
    fn boundary_flux(
        &self,
        _option: OptionType,
        _payoff: &dyn Payoff,
        _th: f64,
        _x: &[f64],
        _normal: &[f64],
    ) -> f64 {
        0.0
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}
