//! Global assembly of weak forms.

use tracing::debug;

use super::basis::Basis;
use super::form::{BilinearForm, FacetLinearForm, LinearForm, ShapeValue};
use crate::core::Result;
use crate::linalg::{CsrMatrix, LinearSolver};

/// Assembles `A_ij = ∫ a(φ_j, φ_i)` into a sparse matrix.
pub fn assemble_bilinear<F>(basis: &Basis, form: &F) -> Result<CsrMatrix>
where
    F: BilinearForm + ?Sized,
{
    let d = basis.dim();
    let nl = basis.n_local();
    let rule = basis.rule();
    let n_cells = basis.mesh().n_cells();
    let mut triplets = Vec::with_capacity(n_cells * nl * nl);
    let mut values = vec![0.0; nl];
    let mut grads = vec![0.0; nl * d];
    let mut x = vec![0.0; d];
    let mut local = vec![0.0; nl * nl];

    for k in 0..n_cells {
        local.fill(0.0);
        let vol = basis.cell_volume(k);
        for q in 0..rule.len() {
            let bary = rule.point(q);
            basis.to_physical(k, bary, &mut x);
            basis.eval(k, bary, &mut values, &mut grads);
            let coeffs = form.coefficients(&x);
            let w = rule.weight(q) * vol;
            for i in 0..nl {
                let v = ShapeValue {
                    value: values[i],
                    grad: &grads[i * d..(i + 1) * d],
                };
                for j in 0..nl {
                    let u = ShapeValue {
                        value: values[j],
                        grad: &grads[j * d..(j + 1) * d],
                    };
                    local[i * nl + j] += w * form.eval(&coeffs, u, v);
                }
            }
        }
        let dofs = basis.cell_dofs(k);
        for i in 0..nl {
            for j in 0..nl {
                triplets.push((dofs[i], dofs[j], local[i * nl + j]));
            }
        }
    }

    let matrix = CsrMatrix::from_triplets(basis.n_dofs(), basis.n_dofs(), triplets)?;
    debug!(
        n_dofs = basis.n_dofs(),
        nnz = matrix.nnz(),
        cells = n_cells,
        "assembled bilinear form"
    );
    Ok(matrix)
}

/// Assembles `b_i = ∫ f φ_i`.
pub fn assemble_linear<F>(basis: &Basis, form: &F) -> Vec<f64>
where
    F: LinearForm + ?Sized,
{
    let d = basis.dim();
    let nl = basis.n_local();
    let rule = basis.rule();
    let mut out = vec![0.0; basis.n_dofs()];
    let mut values = vec![0.0; nl];
    let mut grads = vec![0.0; nl * d];
    let mut x = vec![0.0; d];

    for k in 0..basis.mesh().n_cells() {
        let vol = basis.cell_volume(k);
        let dofs = basis.cell_dofs(k);
        for q in 0..rule.len() {
            let bary = rule.point(q);
            basis.to_physical(k, bary, &mut x);
            basis.eval(k, bary, &mut values, &mut grads);
            let f = form.density(&x) * rule.weight(q) * vol;
            for (&dof, phi) in dofs.iter().zip(&values) {
                out[dof] += f * phi;
            }
        }
    }
    out
}

/// Assembles `b_i = ∫_∂Ω g φ_i` over every boundary facet.
pub fn assemble_facet_linear<F>(basis: &Basis, form: &F) -> Vec<f64>
where
    F: FacetLinearForm + ?Sized,
{
    let mesh = basis.mesh();
    let d = basis.dim();
    let nl = basis.n_local();
    let rule = basis.facet_rule();
    let mut out = vec![0.0; basis.n_dofs()];
    let mut values = vec![0.0; nl];
    let mut grads = vec![0.0; nl * d];
    let mut x = vec![0.0; d];

    for (f, facet) in mesh.facets().iter().enumerate() {
        if !facet.is_boundary() {
            continue;
        }
        let k = facet.owner;
        let (measure, normal) = basis.facet_geometry(f, k);
        let dofs = basis.cell_dofs(k);
        for q in 0..rule.len() {
            basis.facet_point(f, q, &mut x);
            let g = form.density(&x, &normal);
            if g == 0.0 {
                continue;
            }
            let bary = basis.barycentric(k, &x);
            basis.eval(k, &bary, &mut values, &mut grads);
            let w = g * rule.weight(q) * measure;
            for (&dof, phi) in dofs.iter().zip(&values) {
                out[dof] += w * phi;
            }
        }
    }
    out
}

/// L2 projection of a pointwise function onto the basis: solves `M u = ∫ f v`.
pub fn project<F>(
    basis: &Basis,
    mass: &CsrMatrix,
    f: &F,
    solver: &mut LinearSolver,
) -> Result<Vec<f64>>
where
    F: LinearForm + ?Sized,
{
    let load = assemble_linear(basis, f);
    solver.solve(mass, &load, None)
}
