//! Error-driven mesh adaptation.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{PdeError, Result};
use crate::fem::{Basis, BoundarySet, SimplexMesh};

/// Element error indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Criterion {
    /// Normal-gradient jumps across interior facets, `Σ ½ ∫_E h [∂u/∂n]²`.
    #[default]
    Residual,
    /// Dirichlet energy `∫_K |∇u|²`.
    Gradient,
}

/// Rule turning indicators into a set of elements to refine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarkingRule {
    /// `η_K > θ · max η`.
    #[default]
    Maximum,
    /// Smallest set whose indicators sum to at least `θ · Σ η` (Dörfler).
    Bulk,
    /// The `⌈θ n⌉` largest indicators.
    Quantile,
}

/// Refinement/coarsening controller.
#[derive(Clone)]
pub struct AdaptiveMesh {
    criterion: Criterion,
    theta: f64,
    marking: MarkingRule,
    smoothing: bool,
    boundaries: Option<BoundarySet>,
}

impl fmt::Debug for AdaptiveMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveMesh")
            .field("criterion", &self.criterion)
            .field("theta", &self.theta)
            .field("marking", &self.marking)
            .field("smoothing", &self.smoothing)
            .field(
                "boundaries",
                &self
                    .boundaries
                    .as_ref()
                    .map(|b| b.iter().map(|(n, _)| n.clone()).collect::<Vec<_>>()),
            )
            .finish()
    }
}

impl Default for AdaptiveMesh {
    fn default() -> Self {
        Self::new(Criterion::Residual)
    }
}

impl AdaptiveMesh {
    /// Controller with maximum marking at θ = 0.5 and smoothing on.
    pub fn new(criterion: Criterion) -> Self {
        Self {
            criterion,
            theta: 0.5,
            marking: MarkingRule::Maximum,
            smoothing: true,
            boundaries: None,
        }
    }

    /// Marking parameter in `(0, 1)`.
    pub fn theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    /// Selects the marking rule.
    pub fn marking(mut self, marking: MarkingRule) -> Self {
        self.marking = marking;
        self
    }

    /// Laplacian smoothing after refinement (on by default).
    pub fn smoothing(mut self, enabled: bool) -> Self {
        self.smoothing = enabled;
        self
    }

    /// Boundary predicates re-applied to every adapted mesh.
    ///
    /// Without them an adapted mesh keeps its parent's predicates.
    pub fn boundaries(mut self, boundaries: BoundarySet) -> Self {
        self.boundaries = Some(boundaries);
        self
    }

    /// Error indicator in use.
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    fn validate(&self) -> Result<()> {
        if !(self.theta > 0.0 && self.theta < 1.0) {
            return Err(PdeError::InvalidInput(format!(
                "adaptive theta must lie in (0, 1), got {}",
                self.theta
            )));
        }
        Ok(())
    }

    /// Per-element indicator of the finite-element function `u`.
    pub fn estimate(&self, basis: &Basis, u: &[f64]) -> Result<Vec<f64>> {
        if u.len() != basis.n_dofs() {
            return Err(PdeError::DimensionMismatch {
                context: "error estimate",
                expected: basis.n_dofs(),
                found: u.len(),
            });
        }
        Ok(match self.criterion {
            Criterion::Residual => residual_indicator(basis, u),
            Criterion::Gradient => gradient_indicator(basis, u),
        })
    }

    /// Elements selected by the marking rule.
    pub fn mark(&self, eta: &[f64]) -> Vec<usize> {
        let n = eta.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| eta[b].total_cmp(&eta[a]));
        let mut marked = match self.marking {
            MarkingRule::Maximum => {
                let max = eta.iter().copied().fold(0.0, f64::max);
                (0..n).filter(|&k| eta[k] > self.theta * max).collect()
            }
            MarkingRule::Bulk => {
                let total: f64 = eta.iter().sum();
                let mut acc = 0.0;
                let mut picked = Vec::new();
                for k in order {
                    if total <= 0.0 || acc >= self.theta * total {
                        break;
                    }
                    acc += eta[k];
                    picked.push(k);
                }
                picked
            }
            MarkingRule::Quantile => {
                let count = ((self.theta * n as f64).ceil() as usize).clamp(usize::from(n > 0), n);
                order.truncate(count);
                order
            }
        };
        marked.sort_unstable();
        marked
    }

    /// Refines the marked elements, smooths, and re-tags boundaries.
    pub fn refine(&self, basis: &Basis, u: &[f64]) -> Result<SimplexMesh> {
        self.validate()?;
        let eta = self.estimate(basis, u)?;
        let marked = self.mark(&eta);
        let mesh = basis.mesh();
        let mut refined = mesh.refined(&marked)?;
        if self.smoothing {
            refined = refined.smoothed()?;
        }
        let refined = self.retag(refined);
        debug!(
            criterion = ?self.criterion,
            marked = marked.len(),
            before = mesh.n_cells(),
            after = refined.n_cells(),
            "adaptive refinement"
        );
        Ok(refined)
    }

    /// Removes the half of the elements with the smallest indicators.
    pub fn coarsen(&self, basis: &Basis, u: &[f64]) -> Result<SimplexMesh> {
        let eta = self.estimate(basis, u)?;
        let remove_count = eta.len() / 2;
        if remove_count == 0 {
            return Err(PdeError::InvalidInput(
                "cannot coarsen a single-element mesh".to_string(),
            ));
        }
        let mut order: Vec<usize> = (0..eta.len()).collect();
        order.sort_by(|&a, &b| eta[a].total_cmp(&eta[b]));
        order.truncate(remove_count);
        let mesh = basis.mesh();
        let coarse = self.retag(mesh.remove_elements(&order)?);
        debug!(
            criterion = ?self.criterion,
            removed = remove_count,
            before = mesh.n_cells(),
            after = coarse.n_cells(),
            "adaptive coarsening"
        );
        Ok(coarse)
    }

    fn retag(&self, mesh: SimplexMesh) -> SimplexMesh {
        match &self.boundaries {
            Some(b) => mesh.with_boundaries(b.clone()),
            None => mesh,
        }
    }
}

fn residual_indicator(basis: &Basis, u: &[f64]) -> Vec<f64> {
    let mesh = basis.mesh();
    let d = mesh.dim();
    let rule = basis.facet_rule();
    let mut eta = vec![0.0; mesh.n_cells()];
    let mut x = vec![0.0; d];

    for (f, facet) in mesh.facets().iter().enumerate() {
        let Some(other) = facet.neighbour else {
            continue;
        };
        let owner = facet.owner;
        let (measure, normal) = basis.facet_geometry(f, owner);
        let h = if d == 1 {
            0.5 * (mesh.cell_volume(owner) + mesh.cell_volume(other))
        } else {
            facet_diameter(mesh, facet.vertices())
        };
        let mut integral = 0.0;
        for q in 0..rule.len() {
            basis.facet_point(f, q, &mut x);
            let g1 = basis.gradient_at(u, owner, &basis.barycentric(owner, &x));
            let g2 = basis.gradient_at(u, other, &basis.barycentric(other, &x));
            let jump: f64 = (0..d).map(|a| (g1[a] - g2[a]) * normal[a]).sum();
            integral += rule.weight(q) * jump * jump;
        }
        let eta_e = h * measure * integral;
        eta[owner] += 0.5 * eta_e;
        eta[other] += 0.5 * eta_e;
    }
    eta
}

fn gradient_indicator(basis: &Basis, u: &[f64]) -> Vec<f64> {
    let rule = basis.rule();
    (0..basis.mesh().n_cells())
        .map(|k| {
            let energy: f64 = (0..rule.len())
                .map(|q| {
                    let g = basis.gradient_at(u, k, rule.point(q));
                    rule.weight(q) * g.iter().map(|x| x * x).sum::<f64>()
                })
                .sum();
            energy * basis.cell_volume(k)
        })
        .collect()
}

fn facet_diameter(mesh: &SimplexMesh, verts: &[usize]) -> f64 {
    let mut h: f64 = 0.0;
    for i in 0..verts.len() {
        for j in i + 1..verts.len() {
            let (a, b) = (mesh.point(verts[i]), mesh.point(verts[j]));
            h = h.max(a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt());
        }
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ElementKind;
    use crate::fem::create_mesh;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn basis(n: u32) -> Basis {
        Basis::new(Arc::new(create_mesh(&[1.0, 1.0], n).unwrap()), ElementKind::P1).unwrap()
    }

    fn interpolate(b: &Basis, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
        (0..b.n_dofs()).map(|i| f(b.dof_location(i))).collect()
    }

    #[test]
    fn linear_functions_have_no_jumps() {
        let b = basis(2);
        let u = interpolate(&b, |x| 2.0 * x[0] - x[1]);
        let eta = AdaptiveMesh::new(Criterion::Residual).estimate(&b, &u).unwrap();
        assert!(eta.iter().all(|e| e.abs() < 1e-20));
    }

    #[test]
    fn gradient_energy_of_linear_function() {
        let b = basis(1);
        let u = interpolate(&b, |x| x[0] + 2.0 * x[1]);
        let eta = AdaptiveMesh::new(Criterion::Gradient).estimate(&b, &u).unwrap();
        assert_relative_eq!(eta.iter().sum::<f64>(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn marking_rules() {
        let eta = [1.0, 4.0, 2.0, 0.5];
        let max = AdaptiveMesh::default().theta(0.4);
        assert_eq!(max.mark(&eta), vec![1, 2]);
        let bulk = AdaptiveMesh::default().theta(0.5).marking(MarkingRule::Bulk);
        assert_eq!(bulk.mark(&eta), vec![1]);
        let quantile = AdaptiveMesh::default().theta(0.5).marking(MarkingRule::Quantile);
        assert_eq!(quantile.mark(&eta), vec![1, 2]);
        assert!(max.mark(&[0.0, 0.0]).is_empty());
    }

    #[test]
    fn refine_and_coarsen_change_element_count() {
        let b = basis(2);
        let u = interpolate(&b, |x| x[0] * x[0] + x[1] * x[1]);
        let adaptive = AdaptiveMesh::new(Criterion::Gradient);
        let fine = adaptive.refine(&b, &u).unwrap();
        assert!(fine.n_cells() > b.mesh().n_cells());
        let coarse = adaptive.coarsen(&b, &u).unwrap();
        assert_eq!(coarse.n_cells(), b.mesh().n_cells() - b.mesh().n_cells() / 2);
    }

    #[test]
    fn rejects_theta_outside_unit_interval() {
        let b = basis(1);
        let u = vec![0.0; b.n_dofs()];
        let err = AdaptiveMesh::default().theta(1.5).refine(&b, &u).unwrap_err();
        assert!(matches!(err, PdeError::InvalidInput(_)));
        assert!(matches!(
            AdaptiveMesh::default().estimate(&b, &[1.0]),
            Err(PdeError::DimensionMismatch { .. })
        ));
    }
}
