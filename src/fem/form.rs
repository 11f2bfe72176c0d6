//! Weak-form integrands.

/// Value and physical gradient of one shape function at a quadrature point.
#[derive(Debug, Clone, Copy)]
pub struct ShapeValue<'a> {
    pub value: f64,
    pub grad: &'a [f64],
}

/// Integrand `a(u, v)` of a bilinear form.
///
/// Coefficients are evaluated once per quadrature point and shared by every
/// trial/test pair of the cell.
pub trait BilinearForm {
    type Coefficients;

    fn coefficients(&self, x: &[f64]) -> Self::Coefficients;

    fn eval(&self, coeffs: &Self::Coefficients, u: ShapeValue<'_>, v: ShapeValue<'_>) -> f64;
}

/// Load `∫ f v` over cells.
pub trait LinearForm {
    fn density(&self, x: &[f64]) -> f64;
}

impl<F> LinearForm for F
where
    F: Fn(&[f64]) -> f64,
{
    fn density(&self, x: &[f64]) -> f64 {
        self(x)
    }
}

/// Load `∫ g v` over boundary facets; `normal` is the outward unit normal.
pub trait FacetLinearForm {
    fn density(&self, x: &[f64], normal: &[f64]) -> f64;
}

/// `∫ u v`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MassForm;

impl BilinearForm for MassForm {
    type Coefficients = ();

    fn coefficients(&self, _x: &[f64]) {}

    #[inline]
    fn eval(&self, _: &(), u: ShapeValue<'_>, v: ShapeValue<'_>) -> f64 {
        u.value * v.value
    }
}

/// `∫ ∇u · ∇v`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LaplaceForm;

impl BilinearForm for LaplaceForm {
    type Coefficients = ();

    fn coefficients(&self, _x: &[f64]) {}

    #[inline]
    fn eval(&self, _: &(), u: ShapeValue<'_>, v: ShapeValue<'_>) -> f64 {
        u.grad.iter().zip(v.grad).map(|(a, b)| a * b).sum()
    }
}
