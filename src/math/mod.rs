//! Scalar special functions shared by payoffs and dynamics.

use statrs::function::erf::erfc;

/// Standard normal density.
pub fn normal_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF, accurate in both tails.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// `(1 - e^{-x}) / x`, stable near zero.
pub fn one_minus_exp_over(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0 - 0.5 * x
    } else {
        -(-x).exp_m1() / x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cdf_reference_values() {
        assert_relative_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-15);
        assert_relative_eq!(normal_cdf(1.959_963_984_540_054), 0.975, max_relative = 1e-10);
        assert_relative_eq!(normal_cdf(-1.0) + normal_cdf(1.0), 1.0, epsilon = 1e-15);
        assert!(normal_cdf(-40.0) >= 0.0);
    }

    #[test]
    fn expm1_ratio_limits() {
        assert_relative_eq!(one_minus_exp_over(0.0), 1.0);
        assert_relative_eq!(one_minus_exp_over(1.0), 1.0 - (-1.0f64).exp(), epsilon = 1e-15);
    }
}
