//! Weak forms of the Feynman–Kac operator.
//!
//! For `L[u] = ½ A:∇²u + b·∇u − r u`, integration by parts gives
//!
//! ```text
//! k(u, v) = −½ ∫ ∇v·(A∇u) + ∫ v (μ·∇u) − r ∫ u v,   μ = b − ½ divA
//! ```
//!
//! plus the natural-boundary functional `½ ∫_∂Ω v n·(A∇u)`.

use std::sync::Arc;

use crate::core::{OptionType, Result};
use crate::fem::{
    assemble_bilinear, assemble_facet_linear, Basis, BilinearForm, FacetLinearForm, MassForm,
    ShapeValue,
};
use crate::linalg::CsrMatrix;
use crate::models::DynamicsModel;
use crate::payoff::Payoff;
use crate::transform::CoordinateTransform;

/// Mass, stiffness and boundary operators for one dynamics/payoff pair.
#[derive(Clone)]
pub struct PdeForms {
    pub dynamics: Arc<dyn DynamicsModel>,
    pub payoff: Arc<dyn Payoff>,
    pub option: OptionType,
    pub transform: CoordinateTransform,
}

impl std::fmt::Debug for PdeForms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdeForms")
            .field("dim", &self.dynamics.dim())
            .field("option", &self.option)
            .field("transform", &self.transform)
            .finish()
    }
}

/// Drift and diffusion sampled at one quadrature point.
#[derive(Debug, Clone, Copy)]
struct OperatorCoefficients {
    a: [f64; 9],
    mu: [f64; 3],
}

struct StiffnessForm<'a> {
    forms: &'a PdeForms,
    dim: usize,
}

impl BilinearForm for StiffnessForm<'_> {
    type Coefficients = OperatorCoefficients;

    fn coefficients(&self, x: &[f64]) -> OperatorCoefficients {
        let d = self.dim;
        let mut phys = [0.0; 3];
        self.forms.transform.untransform_state(x, &mut phys[..d]);
        let model = &self.forms.dynamics;

        let mut a = [0.0; 9];
        let mut div = [0.0; 3];
        let mut mu = [0.0; 3];
        model.diffusion(&phys[..d], &mut a[..d * d]);
        model.diffusion_divergence(&phys[..d], &mut div[..d]);
        model.drift(&phys[..d], &mut mu[..d]);
        for (m, dv) in mu.iter_mut().zip(&div).take(d) {
            *m -= 0.5 * dv;
        }
        OperatorCoefficients { a, mu }
    }

    fn eval(&self, c: &OperatorCoefficients, u: ShapeValue<'_>, v: ShapeValue<'_>) -> f64 {
        let d = self.dim;
        let mut diffusion = 0.0;
        let mut advection = 0.0;
        for i in 0..d {
            let a_grad_u: f64 = (0..d).map(|j| c.a[i * d + j] * u.grad[j]).sum();
            diffusion += v.grad[i] * a_grad_u;
            advection += c.mu[i] * u.grad[i];
        }
        -0.5 * diffusion + v.value * advection - self.forms.dynamics.rate() * u.value * v.value
    }
}

struct NaturalBoundary<'a> {
    forms: &'a PdeForms,
    th: f64,
    dim: usize,
}

impl FacetLinearForm for NaturalBoundary<'_> {
    fn density(&self, x: &[f64], normal: &[f64]) -> f64 {
        let mut phys = [0.0; 3];
        self.forms.transform.untransform_state(x, &mut phys[..self.dim]);
        self.forms.dynamics.boundary_flux(
            self.forms.option,
            self.forms.payoff.as_ref(),
            self.th,
            &phys[..self.dim],
            normal,
        )
    }
}

impl PdeForms {
    /// Bundles the ingredients of the weak forms.
    pub fn new(
        dynamics: Arc<dyn DynamicsModel>,
        payoff: Arc<dyn Payoff>,
        option: OptionType,
        transform: CoordinateTransform,
    ) -> Self {
        Self {
            dynamics,
            payoff,
            option,
            transform,
        }
    }

    /// `∫ u v`.
    pub fn mass(&self, basis: &Basis) -> Result<CsrMatrix> {
        assemble_bilinear(basis, &MassForm)
    }

    /// Feynman–Kac operator `k(u, v)` in physical coefficients.
    pub fn stiffness(&self, basis: &Basis) -> Result<CsrMatrix> {
        let form = StiffnessForm {
            forms: self,
            dim: basis.dim(),
        };
        assemble_bilinear(basis, &form)
    }

    /// Natural-boundary load at solver time `t`; zero when the model declares none.
    pub fn boundary(&self, basis: &Basis, t: f64) -> Vec<f64> {
        if !self.dynamics.has_natural_boundary() {
            return vec![0.0; basis.n_dofs()];
        }
        let form = NaturalBoundary {
            forms: self,
            th: self.transform.untransform_time(t),
            dim: basis.dim(),
        };
        assemble_facet_linear(basis, &form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ElementKind;
    use crate::fem::create_mesh;
    use crate::models::{BlackScholes, CreditRisk};
    use crate::payoff::{CreditRiskPayoff, EuropeanOptionBs};
    use approx::assert_relative_eq;

    fn bs_forms(model: BlackScholes) -> PdeForms {
        PdeForms::new(
            Arc::new(model),
            Arc::new(EuropeanOptionBs::new(1.0, 0.03, 0.0)),
            OptionType::Call,
            CoordinateTransform::default(),
        )
    }

    fn basis_1d() -> Basis {
        Basis::new(Arc::new(create_mesh(&[2.0], 3).unwrap()), ElementKind::P2).unwrap()
    }

    #[test]
    fn stiffness_on_constants_is_discounting() {
        // ∇1 = 0, so K·1 = −r M·1.
        let basis = basis_1d();
        let forms = bs_forms(BlackScholes::new(0.03, 0.0, 0.2));
        let m = forms.mass(&basis).unwrap();
        let k = forms.stiffness(&basis).unwrap();
        let ones = vec![1.0; basis.n_dofs()];
        let m1 = m.mul_vec(&ones).unwrap();
        let k1 = k.mul_vec(&ones).unwrap();
        for (a, b) in k1.iter().zip(&m1) {
            assert_relative_eq!(*a, -0.03 * b, epsilon = 1e-14);
        }
    }

    #[test]
    fn stiffness_applies_drift_correction() {
        // For u = s: k(s, v) = −½∫σ²s² v' + ∫ v (r − q − σ²) s − r∫ s v.
        let basis = basis_1d();
        let forms = bs_forms(BlackScholes::new(0.05, 0.0, 0.3));
        let k = forms.stiffness(&basis).unwrap();
        let u: Vec<f64> = (0..basis.n_dofs()).map(|i| basis.dof_location(i)[0]).collect();
        let ku = k.mul_vec(&u).unwrap();
        // Summing over all test functions (Σv = 1, Σv' = 0) leaves ∫ (μ − r) s = −σ² ∫ s.
        let total: f64 = ku.iter().sum();
        assert_relative_eq!(total, -0.09 * 2.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_diffusion_yields_finite_operator() {
        let basis = basis_1d();
        let forms = PdeForms::new(
            Arc::new(CreditRisk {
                rate: 0.03,
                intensity: 0.02,
            }),
            Arc::new(CreditRiskPayoff {
                recovery: 0.4,
                rate: 0.03,
            }),
            OptionType::Put,
            CoordinateTransform::default(),
        );
        let k = forms.stiffness(&basis).unwrap();
        assert!(k.to_dense().iter().all(|x| x.is_finite()));
        assert!(forms.boundary(&basis, 0.5).iter().all(|x| *x == 0.0));
    }

    #[test]
    fn natural_boundary_only_when_enabled() {
        let basis = basis_1d();
        let off = bs_forms(BlackScholes::new(0.03, 0.0, 0.2));
        assert!(off.boundary(&basis, 0.5).iter().all(|x| *x == 0.0));
        let on = bs_forms(BlackScholes::new(0.03, 0.0, 0.2).with_natural_boundary(true));
        let load = on.boundary(&basis, 0.5);
        let right = basis.boundary_dofs(&["right"]).unwrap();
        assert_eq!(right.len(), 1);
        assert!(load[right[0]] > 0.0);
    }
}
