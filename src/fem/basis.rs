//! Lagrange P1/P2 bases on simplex meshes.

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::DMatrix;

use super::mesh::SimplexMesh;
use super::quadrature::QuadratureRule;
use crate::core::{ElementKind, Generation, PdeError, Result};

/// Affine map `x = x0 + J ξ` of one cell.
#[derive(Debug, Clone)]
struct CellGeometry {
    origin: Vec<f64>,
    inverse: DMatrix<f64>,
    /// Gradients of the barycentric coordinates, `(dim + 1) x dim` row-major.
    bary_grads: Vec<f64>,
    volume: f64,
}

/// Global degrees of freedom for a mesh and element family.
#[derive(Debug, Clone)]
pub struct Basis {
    mesh: Arc<SimplexMesh>,
    element: ElementKind,
    n_dofs: usize,
    local: usize,
    cell_dofs: Vec<usize>,
    dof_locations: Vec<f64>,
    edge_dofs: HashMap<(usize, usize), usize>,
    geometry: Vec<CellGeometry>,
    rule: QuadratureRule,
    facet_rule: QuadratureRule,
}

/// Local edges of a simplex with `n` vertices, in dof order.
fn local_edges(n: usize) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    for i in 0..n {
        for j in i + 1..n {
            edges.push((i, j));
        }
    }
    edges
}

impl Basis {
    /// Numbers the dofs of `element` on `mesh`.
    pub fn new(mesh: Arc<SimplexMesh>, element: ElementKind) -> Result<Self> {
        let dim = mesh.dim();
        let nv = dim + 1;
        let edges = local_edges(nv);
        let local = match element {
            ElementKind::P1 => nv,
            ElementKind::P2 => nv + edges.len(),
        };

        let mut n_dofs = mesh.n_points();
        let mut dof_locations: Vec<f64> = (0..mesh.n_points())
            .flat_map(|i| mesh.point(i).to_vec())
            .collect();
        let mut edge_dofs = HashMap::new();
        let mut cell_dofs = Vec::with_capacity(mesh.n_cells() * local);
        let mut geometry = Vec::with_capacity(mesh.n_cells());

        for k in 0..mesh.n_cells() {
            let cell = mesh.cell(k);
            cell_dofs.extend_from_slice(cell);
            if element == ElementKind::P2 {
                for &(i, j) in &edges {
                    let key = (cell[i].min(cell[j]), cell[i].max(cell[j]));
                    let dof = *edge_dofs.entry(key).or_insert_with(|| {
                        let (a, b) = (mesh.point(key.0), mesh.point(key.1));
                        dof_locations.extend(a.iter().zip(b).map(|(x, y)| 0.5 * (x + y)));
                        n_dofs += 1;
                        n_dofs - 1
                    });
                    cell_dofs.push(dof);
                }
            }
            geometry.push(cell_geometry(&mesh, k)?);
        }

        Ok(Self {
            rule: QuadratureRule::simplex(dim),
            facet_rule: QuadratureRule::simplex(dim - 1),
            mesh,
            element,
            n_dofs,
            local,
            cell_dofs,
            dof_locations,
            edge_dofs,
            geometry,
        })
    }

    /// Mesh this basis lives on.
    #[inline]
    pub fn mesh(&self) -> &Arc<SimplexMesh> {
        &self.mesh
    }

    /// Generation of the underlying mesh.
    #[inline]
    pub fn generation(&self) -> Generation {
        self.mesh.generation()
    }

    /// Element order.
    #[inline]
    pub fn element(&self) -> ElementKind {
        self.element
    }

    /// Spatial dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.mesh.dim()
    }

    /// Number of global degrees of freedom.
    #[inline]
    pub fn n_dofs(&self) -> usize {
        self.n_dofs
    }

    /// Number of local shape functions per cell.
    #[inline]
    pub fn n_local(&self) -> usize {
        self.local
    }

    /// Global dofs of cell `k`, vertices first.
    #[inline]
    pub fn cell_dofs(&self, k: usize) -> &[usize] {
        &self.cell_dofs[k * self.local..(k + 1) * self.local]
    }

    /// Interpolation node of dof `i`.
    #[inline]
    pub fn dof_location(&self, i: usize) -> &[f64] {
        let d = self.dim();
        &self.dof_locations[i * d..(i + 1) * d]
    }

    /// Cell quadrature rule.
    pub fn rule(&self) -> &QuadratureRule {
        &self.rule
    }

    /// Facet quadrature rule.
    pub fn facet_rule(&self) -> &QuadratureRule {
        &self.facet_rule
    }

    /// Volume of cell `k`.
    #[inline]
    pub fn cell_volume(&self, k: usize) -> f64 {
        self.geometry[k].volume
    }

    /// Physical point of barycentric coordinates `bary` in cell `k`.
    pub fn to_physical(&self, k: usize, bary: &[f64], out: &mut [f64]) {
        out.fill(0.0);
        for (&v, &l) in self.mesh.cell(k).iter().zip(bary) {
            for (o, c) in out.iter_mut().zip(self.mesh.point(v)) {
                *o += l * c;
            }
        }
    }

    /// Barycentric coordinates of a physical point with respect to cell `k`.
    pub fn barycentric(&self, k: usize, x: &[f64]) -> Vec<f64> {
        let g = &self.geometry[k];
        let d = self.dim();
        let mut bary = vec![0.0; d + 1];
        let mut rest = 1.0;
        for a in 0..d {
            let xi: f64 = (0..d).map(|b| g.inverse[(a, b)] * (x[b] - g.origin[b])).sum();
            bary[a + 1] = xi;
            rest -= xi;
        }
        bary[0] = rest;
        bary
    }

    /// Shape values and physical gradients of cell `k` at `bary`.
    ///
    /// `grads` is filled row-major, `dim` entries per local function.
    pub fn eval(&self, k: usize, bary: &[f64], values: &mut [f64], grads: &mut [f64]) {
        let d = self.dim();
        let nv = d + 1;
        let gl = &self.geometry[k].bary_grads;
        match self.element {
            ElementKind::P1 => {
                values[..nv].copy_from_slice(&bary[..nv]);
                grads[..nv * d].copy_from_slice(&gl[..nv * d]);
            }
            ElementKind::P2 => {
                for i in 0..nv {
                    let l = bary[i];
                    values[i] = l * (2.0 * l - 1.0);
                    for a in 0..d {
                        grads[i * d + a] = (4.0 * l - 1.0) * gl[i * d + a];
                    }
                }
                for (e, (i, j)) in local_edges(nv).into_iter().enumerate() {
                    let n = nv + e;
                    values[n] = 4.0 * bary[i] * bary[j];
                    for a in 0..d {
                        grads[n * d + a] = 4.0 * (bary[j] * gl[i * d + a] + bary[i] * gl[j * d + a]);
                    }
                }
            }
        }
    }

    /// Finite-element function value of `u` at `bary` in cell `k`.
    pub fn value_at(&self, u: &[f64], k: usize, bary: &[f64]) -> f64 {
        let mut values = vec![0.0; self.local];
        let mut grads = vec![0.0; self.local * self.dim()];
        self.eval(k, bary, &mut values, &mut grads);
        self.cell_dofs(k)
            .iter()
            .zip(&values)
            .map(|(&dof, phi)| u[dof] * phi)
            .sum()
    }

    /// Gradient of the finite-element function `u` at `bary` in cell `k`.
    pub fn gradient_at(&self, u: &[f64], k: usize, bary: &[f64]) -> Vec<f64> {
        let d = self.dim();
        let mut values = vec![0.0; self.local];
        let mut grads = vec![0.0; self.local * d];
        self.eval(k, bary, &mut values, &mut grads);
        let mut out = vec![0.0; d];
        for (i, &dof) in self.cell_dofs(k).iter().enumerate() {
            for a in 0..d {
                out[a] += u[dof] * grads[i * d + a];
            }
        }
        out
    }

    /// Dofs on the union of the named boundaries, sorted and unique.
    pub fn boundary_dofs<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        let mut dofs = Vec::new();
        for name in names {
            for f in self.mesh.boundary_facets(name.as_ref())? {
                let verts = self.mesh.facets()[f].vertices();
                dofs.extend_from_slice(verts);
                if self.element == ElementKind::P2 {
                    for (i, j) in local_edges(verts.len()) {
                        let key = (verts[i].min(verts[j]), verts[i].max(verts[j]));
                        if let Some(&dof) = self.edge_dofs.get(&key) {
                            dofs.push(dof);
                        }
                    }
                }
            }
        }
        dofs.sort_unstable();
        dofs.dedup();
        Ok(dofs)
    }

    /// Dof whose interpolation node is closest to `x`.
    pub fn nearest_dof(&self, x: &[f64]) -> Result<usize> {
        if x.len() != self.dim() {
            return Err(PdeError::DimensionMismatch {
                context: "nearest dof",
                expected: self.dim(),
                found: x.len(),
            });
        }
        let dist = |i: usize| -> f64 {
            self.dof_location(i)
                .iter()
                .zip(x)
                .map(|(a, b)| (a - b) * (a - b))
                .sum()
        };
        (0..self.n_dofs)
            .min_by(|&i, &j| dist(i).total_cmp(&dist(j)))
            .ok_or_else(|| PdeError::InvalidInput("basis has no dofs".to_string()))
    }

    /// Facet measure, points and outward unit normal as seen from `cell`.
    ///
    /// Interval facets are points with unit measure.
    pub fn facet_geometry(&self, facet: usize, cell: usize) -> (f64, Vec<f64>) {
        let mesh = &self.mesh;
        let d = mesh.dim();
        let verts = mesh.facets()[facet].vertices();
        let p = |i: usize| mesh.point(verts[i]);
        let (measure, mut normal) = match d {
            1 => (1.0, vec![1.0]),
            2 => {
                let t = [p(1)[0] - p(0)[0], p(1)[1] - p(0)[1]];
                let len = (t[0] * t[0] + t[1] * t[1]).sqrt();
                (len, vec![t[1] / len, -t[0] / len])
            }
            _ => {
                let e1: Vec<f64> = (0..3).map(|a| p(1)[a] - p(0)[a]).collect();
                let e2: Vec<f64> = (0..3).map(|a| p(2)[a] - p(0)[a]).collect();
                let c = [
                    e1[1] * e2[2] - e1[2] * e2[1],
                    e1[2] * e2[0] - e1[0] * e2[2],
                    e1[0] * e2[1] - e1[1] * e2[0],
                ];
                let len = (c[0] * c[0] + c[1] * c[1] + c[2] * c[2]).sqrt();
                (0.5 * len, c.iter().map(|x| x / len).collect())
            }
        };
        let opposite = mesh
            .cell(cell)
            .iter()
            .copied()
            .find(|v| !verts.contains(v))
            .unwrap_or(verts[0]);
        let inward: f64 = normal
            .iter()
            .enumerate()
            .map(|(a, n)| n * (mesh.point(opposite)[a] - p(0)[a]))
            .sum();
        if inward > 0.0 {
            normal.iter_mut().for_each(|n| *n = -*n);
        }
        (measure, normal)
    }

    /// Physical point of a facet-rule point on facet `facet`.
    pub fn facet_point(&self, facet: usize, q: usize, out: &mut [f64]) {
        out.fill(0.0);
        let verts = self.mesh.facets()[facet].vertices();
        for (&v, &l) in verts.iter().zip(self.facet_rule.point(q)) {
            for (o, c) in out.iter_mut().zip(self.mesh.point(v)) {
                *o += l * c;
            }
        }
    }
}

fn cell_geometry(mesh: &SimplexMesh, k: usize) -> Result<CellGeometry> {
    let d = mesh.dim();
    let cell = mesh.cell(k);
    let origin = mesh.point(cell[0]).to_vec();
    let jac = DMatrix::from_fn(d, d, |a, c| mesh.point(cell[c + 1])[a] - origin[a]);
    let inverse = jac.clone().try_inverse().ok_or_else(|| {
        PdeError::InvalidInput(format!("cell {k} has a singular Jacobian"))
    })?;

    let mut bary_grads = vec![0.0; (d + 1) * d];
    for i in 1..=d {
        for a in 0..d {
            let g = inverse[(i - 1, a)];
            bary_grads[i * d + a] = g;
            bary_grads[a] -= g;
        }
    }
    Ok(CellGeometry {
        origin,
        inverse,
        bary_grads,
        volume: mesh.cell_volume(k),
    })
}
