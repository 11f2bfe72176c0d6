//! Quadrature on reference simplices.
//!
//! Points are stored in barycentric coordinates and weights sum to one, so a
//! rule integrates over any physical simplex by scaling with its volume.

/// Gauss-Legendre nodes on `[-1, 1]`.
const GAUSS_NODES: [f64; 4] = [
    -0.861_136_311_594_052_6,
    -0.339_981_043_584_856_3,
    0.339_981_043_584_856_3,
    0.861_136_311_594_052_6,
];
const GAUSS_WEIGHTS: [f64; 4] = [
    0.347_854_845_137_453_8,
    0.652_145_154_862_546_1,
    0.652_145_154_862_546_1,
    0.347_854_845_137_453_8,
];

/// Quadrature rule on the reference simplex with weights summing to one.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule {
    dim: usize,
    barycentric: Vec<f64>,
    weights: Vec<f64>,
}

impl QuadratureRule {
    /// Collapsed tensor Gauss rule on the reference `dim`-simplex.
    ///
    /// Exact for polynomials of total degree 7 in 1D, 6 on triangles and 5 on
    /// tetrahedra. `dim == 0` is the single-point rule used on 1D facets.
    pub fn simplex(dim: usize) -> Self {
        let unit: Vec<(f64, f64)> = GAUSS_NODES
            .iter()
            .zip(GAUSS_WEIGHTS)
            .map(|(x, w)| (0.5 * (x + 1.0), 0.5 * w))
            .collect();

        let mut barycentric = Vec::new();
        let mut weights = Vec::new();
        let mut push = |xi: &[f64], w: f64| {
            barycentric.push(1.0 - xi.iter().sum::<f64>());
            barycentric.extend_from_slice(xi);
            weights.push(w);
        };
        match dim {
            0 => push(&[], 1.0),
            1 => {
                for &(u, wu) in &unit {
                    push(&[u], wu);
                }
            }
            2 => {
                for &(u, wu) in &unit {
                    for &(v, wv) in &unit {
                        push(&[u, v * (1.0 - u)], 2.0 * wu * wv * (1.0 - u));
                    }
                }
            }
            _ => {
                for &(u, wu) in &unit {
                    for &(v, wv) in &unit {
                        for &(w, ww) in &unit {
                            let jac = (1.0 - u) * (1.0 - u) * (1.0 - v);
                            push(
                                &[u, v * (1.0 - u), w * (1.0 - u) * (1.0 - v)],
                                6.0 * wu * wv * ww * jac,
                            );
                        }
                    }
                }
            }
        }
        Self {
            dim,
            barycentric,
            weights,
        }
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Returns `true` for an empty rule.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Barycentric coordinates of point `q` (`dim + 1` entries).
    #[inline]
    pub fn point(&self, q: usize) -> &[f64] {
        let n = self.dim + 1;
        &self.barycentric[q * n..(q + 1) * n]
    }

    /// Weight of point `q`.
    #[inline]
    pub fn weight(&self, q: usize) -> f64 {
        self.weights[q]
    }
}
