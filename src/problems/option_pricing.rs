use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Problem;
use crate::core::OptionType;
use crate::models::BlackScholes;
use crate::payoff::EuropeanOptionBs;
use crate::space::DirichletBc;

/// Black–Scholes vanilla option with Dirichlet data on both ends of the line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionPricingProblem {
    pub strike: f64,
    pub rate: f64,
    pub dividend_yield: f64,
    pub sigma: f64,
    pub option: OptionType,
    pub boundaries: Vec<String>,
}

impl Default for OptionPricingProblem {
    fn default() -> Self {
        Self {
            strike: 1.0,
            rate: 0.03,
            dividend_yield: 0.0,
            sigma: 0.2,
            option: OptionType::Call,
            boundaries: vec!["left".to_string(), "right".to_string()],
        }
    }
}

impl OptionPricingProblem {
    /// Closed-form European payoff.
    pub fn payoff(&self) -> EuropeanOptionBs {
        EuropeanOptionBs::new(self.strike, self.rate, self.dividend_yield)
    }

    /// Black–Scholes dynamics.
    pub fn dynamics(&self) -> BlackScholes {
        BlackScholes::new(self.rate, self.dividend_yield, self.sigma)
    }

    /// Bundles dynamics, payoff and Dirichlet strategy.
    pub fn problem(&self) -> Problem {
        Problem {
            dynamics: Arc::new(self.dynamics()),
            payoff: Arc::new(self.payoff()),
            option: self.option,
            boundary_condition: DirichletBc::new(self.boundaries.iter().cloned()),
        }
    }
}
