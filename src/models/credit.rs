use rand::Rng;
use rand_distr::{Distribution, LogNormal};
use serde::{Deserialize, Serialize};

use super::DynamicsModel;
use crate::core::{NumericConfig, PdeError, Result};

/// Constant default intensity; the state decays at rate `λ` with no diffusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditRisk {
    pub rate: f64,
    pub intensity: f64,
}

impl DynamicsModel for CreditRisk {
    fn dim(&self) -> usize {
        1
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn drift(&self, x: &[f64], out: &mut [f64]) {
        out[0] = -self.intensity * x[0];
    }

    fn diffusion(&self, _x: &[f64], out: &mut [f64]) {
        out[0] = 0.0;
    }

    fn diffusion_divergence(&self, _x: &[f64], out: &mut [f64]) {
        out[0] = 0.0;
    }

    fn mean_variance(&self, _th: f64, _v: f64, _config: &NumericConfig) -> f64 {
        0.0
    }

    fn validate(&self) -> Result<()> {
        if !(self.intensity >= 0.0) {
            return Err(PdeError::InvalidInput(format!(
                "default intensity must be >= 0, got {}",
                self.intensity
            )));
        }
        Ok(())
    }
}

/// Default intensity subject to lognormal jumps between scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditRiskJump {
    pub base: CreditRisk,
    pub jump_vol: f64,
}

impl CreditRiskJump {
    /// Creates jittered intensity dynamics around `intensity`.
    pub fn new(rate: f64, intensity: f64, jump_vol: f64) -> Self {
        Self {
            base: CreditRisk { rate, intensity },
            jump_vol,
        }
    }

    /// Draws a scenario with `λ' ~ LogNormal(ln λ, jump_vol)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<CreditRisk> {
        let dist = LogNormal::new(self.base.intensity.ln(), self.jump_vol)
            .map_err(|e| PdeError::InvalidInput(format!("jump distribution: {e}")))?;
        Ok(CreditRisk {
            rate: self.base.rate,
            intensity: dist.sample(rng),
        })
    }
}

impl DynamicsModel for CreditRiskJump {
    fn dim(&self) -> usize {
        1
    }

    fn rate(&self) -> f64 {
        self.base.rate
    }

    fn drift(&self, x: &[f64], out: &mut [f64]) {
        self.base.drift(x, out);
    }

    fn diffusion(&self, x: &[f64], out: &mut [f64]) {
        self.base.diffusion(x, out);
    }

    fn diffusion_divergence(&self, x: &[f64], out: &mut [f64]) {
        self.base.diffusion_divergence(x, out);
    }

    fn mean_variance(&self, th: f64, v: f64, config: &NumericConfig) -> f64 {
        self.base.mean_variance(th, v, config)
    }

    fn validate(&self) -> Result<()> {
        self.base.validate()?;
        if !(self.jump_vol >= 0.0) {
            return Err(PdeError::InvalidInput("jump_vol must be >= 0".to_string()));
        }
        Ok(())
    }
}
