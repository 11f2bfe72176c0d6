use serde::{Deserialize, Serialize};

use super::DynamicsModel;
use crate::core::{NumericConfig, OptionType, PdeError, Result};
use crate::payoff::Payoff;

/// Geometric Brownian motion for a single asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlackScholes {
    pub rate: f64,
    pub dividend_yield: f64,
    pub sigma: f64,
    /// Adds the natural-boundary flux built from the payoff's closed-form delta.
    #[serde(default)]
    pub natural_boundary: bool,
}

impl BlackScholes {
    /// Creates the dynamics without natural-boundary flux.
    pub fn new(rate: f64, dividend_yield: f64, sigma: f64) -> Self {
        Self {
            rate,
            dividend_yield,
            sigma,
            natural_boundary: false,
        }
    }

    /// Enables the natural-boundary flux term.
    pub fn with_natural_boundary(mut self, enabled: bool) -> Self {
        self.natural_boundary = enabled;
        self
    }

    #[inline]
    fn variance(&self) -> f64 {
        self.sigma * self.sigma
    }
}

impl DynamicsModel for BlackScholes {
    fn dim(&self) -> usize {
        1
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn dividend_yield(&self) -> f64 {
        self.dividend_yield
    }

    fn drift(&self, x: &[f64], out: &mut [f64]) {
        out[0] = (self.rate - self.dividend_yield) * x[0];
    }

    fn diffusion(&self, x: &[f64], out: &mut [f64]) {
        out[0] = self.variance() * x[0] * x[0];
    }

    fn diffusion_divergence(&self, x: &[f64], out: &mut [f64]) {
        out[0] = 2.0 * self.variance() * x[0];
    }

    fn mean_variance(&self, _th: f64, _v: f64, _config: &NumericConfig) -> f64 {
        self.variance()
    }

    fn has_natural_boundary(&self) -> bool {
        self.natural_boundary
    }

    fn boundary_flux(
        &self,
        option: OptionType,
        payoff: &dyn Payoff,
        th: f64,
        x: &[f64],
        normal: &[f64],
    ) -> f64 {
        if !self.natural_boundary {
            return 0.0;
        }
        let s = x[0];
        let delta = payoff.delta(option, th, s, self.variance()).unwrap_or(0.0);
        0.5 * normal[0] * self.variance() * s * s * delta
    }

    fn validate(&self) -> Result<()> {
        if !(self.sigma >= 0.0) || !self.rate.is_finite() || !self.dividend_yield.is_finite() {
            return Err(PdeError::InvalidInput(
                "Black-Scholes needs finite rates and sigma >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payoff::EuropeanOptionBs;
    use approx::assert_relative_eq;

    #[test]
    fn coefficients_match_gbm() {
        let m = BlackScholes::new(0.03, 0.01, 0.2);
        let (mut a, mut da, mut b) = ([0.0], [0.0], [0.0]);
        m.diffusion(&[2.0], &mut a);
        m.diffusion_divergence(&[2.0], &mut da);
        m.drift(&[2.0], &mut b);
        assert_relative_eq!(a[0], 0.16, epsilon = 1e-15);
        assert_relative_eq!(da[0], 0.16, epsilon = 1e-15);
        assert_relative_eq!(b[0], 0.04, epsilon = 1e-15);
        assert_relative_eq!(m.mean_variance(1.0, 0.5, &NumericConfig::default()), 0.04);
    }

    #[test]
    fn flux_is_off_by_default() {
        let m = BlackScholes::new(0.03, 0.0, 0.2);
        let payoff = EuropeanOptionBs::new(1.0, 0.03, 0.0);
        assert!(!m.has_natural_boundary());
        assert_eq!(m.boundary_flux(OptionType::Call, &payoff, 0.5, &[2.0], &[1.0]), 0.0);

        let m = m.with_natural_boundary(true);
        let flux = m.boundary_flux(OptionType::Call, &payoff, 0.5, &[2.0], &[1.0]);
        assert!(flux > 0.0);
    }

    #[test]
    fn negative_sigma_rejected() {
        assert!(BlackScholes::new(0.03, 0.0, -0.1).validate().is_err());
    }
}
