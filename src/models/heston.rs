use serde::{Deserialize, Serialize};

use super::DynamicsModel;
use crate::core::{NumericConfig, PdeError, Result};
use crate::math::one_minus_exp_over;

/// Expected CIR variance averaged over `[0, th]`.
fn cir_mean_variance(kappa: f64, theta: f64, th: f64, v: f64, eps: f64) -> f64 {
    let x = kappa * th + eps;
    one_minus_exp_over(x) * (v - theta) + theta
}

fn check_heston(kappa: f64, theta: f64, sigma: f64, rho: f64) -> Result<()> {
    if kappa < 0.0 || theta < 0.0 || sigma < 0.0 || !(-1.0..=1.0).contains(&rho) {
        return Err(PdeError::InvalidInput(format!(
            "invalid Heston parameters: kappa={kappa}, theta={theta}, sigma={sigma}, rho={rho}"
        )));
    }
    Ok(())
}

/// Stochastic-volatility dynamics on `(s, v)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Heston {
    pub rate: f64,
    pub dividend_yield: f64,
    pub kappa: f64,
    pub theta: f64,
    pub sigma: f64,
    pub rho: f64,
}

impl Heston {
    /// Feller ratio `2κθ/σ²`; the variance stays positive when it exceeds one.
    pub fn cir_number(&self) -> f64 {
        2.0 * self.kappa * self.theta / (self.sigma * self.sigma)
    }
}

impl DynamicsModel for Heston {
    fn dim(&self) -> usize {
        2
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn dividend_yield(&self) -> f64 {
        self.dividend_yield
    }

    fn drift(&self, x: &[f64], out: &mut [f64]) {
        out[0] = (self.rate - self.dividend_yield) * x[0];
        out[1] = self.kappa * (self.theta - x[1]);
    }

    fn diffusion(&self, x: &[f64], out: &mut [f64]) {
        let (s, v) = (x[0], x[1]);
        let cross = self.rho * self.sigma * s * v;
        out[0] = s * s * v;
        out[1] = cross;
        out[2] = cross;
        out[3] = self.sigma * self.sigma * v;
    }

    fn diffusion_divergence(&self, x: &[f64], out: &mut [f64]) {
        let (s, v) = (x[0], x[1]);
        out[0] = 2.0 * s * v + self.rho * self.sigma * s;
        out[1] = self.rho * self.sigma * v + self.sigma * self.sigma;
    }

    fn mean_variance(&self, th: f64, v: f64, config: &NumericConfig) -> f64 {
        cir_mean_variance(self.kappa, self.theta, th, v, config.eps)
    }

    fn validate(&self) -> Result<()> {
        check_heston(self.kappa, self.theta, self.sigma, self.rho)
    }
}

/// Heston dynamics with a mean-reverting short rate on `(s, v, r)`.
///
/// The stock drifts at the state rate; discounting uses the constant `rate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Heston3d {
    pub rate: f64,
    pub dividend_yield: f64,
    pub kappa: f64,
    pub theta: f64,
    pub sigma_v: f64,
    pub rho: f64,
    pub kappa_r: f64,
    pub theta_r: f64,
    pub sigma_r: f64,
}

impl DynamicsModel for Heston3d {
    fn dim(&self) -> usize {
        3
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn dividend_yield(&self) -> f64 {
        self.dividend_yield
    }

    fn drift(&self, x: &[f64], out: &mut [f64]) {
        let (s, v, r) = (x[0], x[1], x[2]);
        out[0] = (r - self.dividend_yield) * s;
        out[1] = self.kappa * (self.theta - v);
        out[2] = self.kappa_r * (self.theta_r - r);
    }

    fn diffusion(&self, x: &[f64], out: &mut [f64]) {
        let (s, v) = (x[0], x[1]);
        let cross = self.rho * self.sigma_v * s * v;
        out.fill(0.0);
        out[0] = s * s * v;
        out[1] = cross;
        out[3] = cross;
        out[4] = self.sigma_v * self.sigma_v * v;
        out[8] = self.sigma_r * self.sigma_r;
    }

    fn diffusion_divergence(&self, x: &[f64], out: &mut [f64]) {
        let (s, v) = (x[0], x[1]);
        out[0] = 2.0 * s * v + self.rho * self.sigma_v * s;
        out[1] = self.rho * self.sigma_v * v + self.sigma_v * self.sigma_v;
        out[2] = 0.0;
    }

    fn mean_variance(&self, th: f64, v: f64, config: &NumericConfig) -> f64 {
        cir_mean_variance(self.kappa, self.theta, th, v, config.eps)
    }

    fn validate(&self) -> Result<()> {
        check_heston(self.kappa, self.theta, self.sigma_v, self.rho)?;
        if self.kappa_r < 0.0 || self.sigma_r < 0.0 {
            return Err(PdeError::InvalidInput(
                "short-rate kappa and sigma must be >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn heston() -> Heston {
        Heston {
            rate: 0.03,
            dividend_yield: 0.0,
            kappa: 1.5,
            theta: 0.04,
            sigma: 0.3,
            rho: -0.7,
        }
    }

    #[test]
    fn diffusion_is_symmetric() {
        let mut a = [0.0; 4];
        heston().diffusion(&[1.2, 0.05], &mut a);
        assert_eq!(a[1], a[2]);
        assert!(a[0] * a[3] - a[1] * a[2] >= 0.0);
    }

    #[test]
    fn mean_variance_limits() {
        let cfg = NumericConfig::default();
        let h = heston();
        assert_relative_eq!(h.mean_variance(0.0, 0.09, &cfg), 0.09, epsilon = 1e-9);
        assert_relative_eq!(h.mean_variance(1e4, 0.09, &cfg), 0.04, epsilon = 1e-5);
        // Starting at the long-run level keeps the mean there.
        assert_relative_eq!(h.mean_variance(2.0, 0.04, &cfg), 0.04, epsilon = 1e-15);
    }

    #[test]
    fn feller_ratio() {
        assert_relative_eq!(heston().cir_number(), 2.0 * 1.5 * 0.04 / 0.09, epsilon = 1e-15);
    }

    #[test]
    fn three_factor_rate_axis_decoupled() {
        let h = Heston3d {
            rate: 0.03,
            dividend_yield: 0.02,
            kappa: 1.0,
            theta: 0.04,
            sigma_v: 0.2,
            rho: 0.0,
            kappa_r: 0.5,
            theta_r: 0.03,
            sigma_r: 0.1,
        };
        let mut a = [1.0; 9];
        h.diffusion(&[1.0, 0.04, 0.05], &mut a);
        assert_eq!(a[2], 0.0);
        assert_eq!(a[6], 0.0);
        assert_relative_eq!(a[8], 0.01, epsilon = 1e-15);
        let mut b = [0.0; 3];
        h.drift(&[1.0, 0.04, 0.05], &mut b);
        assert_relative_eq!(b[0], 0.03, epsilon = 1e-15);
        assert_relative_eq!(b[2], 0.5 * (0.03 - 0.05), epsilon = 1e-15);
        assert!(h.validate().is_ok());
    }

    #[test]
    fn correlation_out_of_range_rejected() {
        let mut h = heston();
        h.rho = 1.5;
        assert!(h.validate().is_err());
    }
}
