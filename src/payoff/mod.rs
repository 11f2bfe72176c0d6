//! Terminal payoffs and the closed-form prices used as boundary data.

pub mod credit;
pub mod european;

pub use credit::CreditRiskPayoff;
pub use european::EuropeanOptionBs;

use crate::core::OptionType;

/// Intrinsic value at maturity plus a reference price for Dirichlet data.
///
/// `th` is time to maturity and `v` the variance used by the reference price.
pub trait Payoff: Send + Sync {
    fn call_payoff(&self, s: f64) -> f64;

    fn put_payoff(&self, s: f64) -> f64;

    fn call(&self, th: f64, s: f64, v: f64) -> f64;

    fn put(&self, th: f64, s: f64, v: f64) -> f64;

    /// Spot sensitivity of the reference price, when available in closed form.
    fn delta(&self, _option: OptionType, _th: f64, _s: f64, _v: f64) -> Option<f64> {
        None
    }

    fn intrinsic(&self, option: OptionType, s: f64) -> f64 {
        match option {
            OptionType::Call => self.call_payoff(s),
            OptionType::Put => self.put_payoff(s),
        }
    }

    fn price(&self, option: OptionType, th: f64, s: f64, v: f64) -> f64 {
        match option {
            OptionType::Call => self.call(th, s, v),
            OptionType::Put => self.put(th, s, v),
        }
    }
}
