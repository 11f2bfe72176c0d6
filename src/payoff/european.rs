use serde::{Deserialize, Serialize};

use super::Payoff;
use crate::core::OptionType;
use crate::math::{normal_cdf, normal_pdf};

/// European vanilla option priced with Black–Scholes.
///
/// Prices take the total variance rate `v = σ²`; when `th <= 0` or `v <= 0`
/// they collapse to the discounted intrinsic value of the forward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EuropeanOptionBs {
    pub strike: f64,
    pub rate: f64,
    pub dividend_yield: f64,
}

impl EuropeanOptionBs {
    /// Creates an option with the given strike and carry.
    pub fn new(strike: f64, rate: f64, dividend_yield: f64) -> Self {
        Self {
            strike,
            rate,
            dividend_yield,
        }
    }

    /// `e^{−r th}`.
    #[inline]
    pub fn discount_factor(&self, th: f64) -> f64 {
        (-self.rate * th).exp()
    }

    /// `e^{−q th}`.
    #[inline]
    pub fn dividend_discount(&self, th: f64) -> f64 {
        (-self.dividend_yield * th).exp()
    }

    /// Forward of `s` over `th`.
    pub fn forward_price(&self, th: f64, s: f64) -> f64 {
        s * self.dividend_discount(th) / self.discount_factor(th)
    }

    /// Black–Scholes `d1` for variance rate `v`.
    pub fn d1(&self, th: f64, s: f64, v: f64) -> f64 {
        ((self.forward_price(th, s) / self.strike).ln() + 0.5 * v * th) / (v * th).sqrt()
    }

    /// Black–Scholes `d2`.
    pub fn d2(&self, th: f64, s: f64, v: f64) -> f64 {
        self.d1(th, s, v) - (v * th).sqrt()
    }

    #[inline]
    fn degenerate(th: f64, v: f64) -> bool {
        th <= 0.0 || v <= 0.0
    }

    /// Spot delta of the call.
    pub fn call_delta(&self, th: f64, s: f64, v: f64) -> f64 {
        if Self::degenerate(th, v) {
            let f = self.forward_price(th.max(0.0), s);
            return if f > self.strike { self.dividend_discount(th.max(0.0)) } else { 0.0 };
        }
        self.dividend_discount(th) * normal_cdf(self.d1(th, s, v))
    }

    /// Spot delta of the put.
    pub fn put_delta(&self, th: f64, s: f64, v: f64) -> f64 {
        self.call_delta(th, s, v) - self.dividend_discount(th.max(0.0))
    }

    /// Sensitivity to volatility.
    pub fn vega(&self, th: f64, s: f64, v: f64) -> f64 {
        if Self::degenerate(th, v) {
            return 0.0;
        }
        self.strike * self.discount_factor(th) * normal_pdf(self.d2(th, s, v)) * th.sqrt()
    }
}

impl Payoff for EuropeanOptionBs {
    fn call_payoff(&self, s: f64) -> f64 {
        (s - self.strike).max(0.0)
    }

    fn put_payoff(&self, s: f64) -> f64 {
        (self.strike - s).max(0.0)
    }

    fn call(&self, th: f64, s: f64, v: f64) -> f64 {
        if s <= 0.0 {
            return 0.0;
        }
        let df = self.discount_factor(th.max(0.0));
        let fwd = self.forward_price(th.max(0.0), s);
        if Self::degenerate(th, v) {
            return df * (fwd - self.strike).max(0.0);
        }
        df * (fwd * normal_cdf(self.d1(th, s, v)) - self.strike * normal_cdf(self.d2(th, s, v)))
    }

    fn put(&self, th: f64, s: f64, v: f64) -> f64 {
        let df = self.discount_factor(th.max(0.0));
        if s <= 0.0 {
            return df * self.strike;
        }
        let fwd = self.forward_price(th.max(0.0), s);
        if Self::degenerate(th, v) {
            return df * (self.strike - fwd).max(0.0);
        }
        df * (self.strike * normal_cdf(-self.d2(th, s, v)) - fwd * normal_cdf(-self.d1(th, s, v)))
    }

    fn delta(&self, option: OptionType, th: f64, s: f64, v: f64) -> Option<f64> {
        Some(match option {
            OptionType::Call => self.call_delta(th, s, v),
            OptionType::Put => self.put_delta(th, s, v),
        })
    }
}
