use serde::{Deserialize, Serialize};

use super::Payoff;

/// Loss on a defaultable zero-coupon bond; only the put side is populated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditRiskPayoff {
    pub recovery: f64,
    pub rate: f64,
}

impl CreditRiskPayoff {
    /// `1 − recovery`.
    pub fn loss_given_default(&self) -> f64 {
        1.0 - self.recovery
    }
}

impl Payoff for CreditRiskPayoff {
    fn call_payoff(&self, _s: f64) -> f64 {
        0.0
    }

    fn put_payoff(&self, _s: f64) -> f64 {
        self.loss_given_default()
    }

    fn call(&self, _th: f64, _s: f64, _v: f64) -> f64 {
        0.0
    }

    fn put(&self, th: f64, _s: f64, _v: f64) -> f64 {
        (-self.rate * th).exp() * self.loss_given_default()
    }
}
