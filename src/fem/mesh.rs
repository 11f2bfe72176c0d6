//! Conforming simplex meshes in one to three dimensions.
//!
//! A mesh is immutable: refinement, smoothing and element removal return a new
//! mesh with a fresh [`Generation`]. Named boundaries are stored as predicates
//! and evaluated on boundary-facet midpoints, so they survive any topology
//! change as long as the predicate set is carried along.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use nalgebra::DMatrix;
use tracing::debug;

use crate::core::{Generation, PdeError, Result};

/// Predicate on physical coordinates selecting a named boundary.
pub type BoundaryPredicate = Arc<dyn Fn(&[f64]) -> bool + Send + Sync>;

/// Named boundary predicates, applied in order.
pub type BoundarySet = Vec<(String, BoundaryPredicate)>;

const NO_VERTEX: usize = usize::MAX;

/// A `(dim-1)`-face shared by one or two cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    vertices: [usize; 3],
    arity: usize,
    /// Cell the outward normal refers to.
    pub owner: usize,
    /// Second cell for interior facets.
    pub neighbour: Option<usize>,
}

impl Facet {
    /// Sorted vertex ids of the facet.
    pub fn vertices(&self) -> &[usize] {
        &self.vertices[..self.arity]
    }

    /// Returns `true` when the facet has no neighbour.
    pub fn is_boundary(&self) -> bool {
        self.neighbour.is_none()
    }
}

/// Simplicial mesh: intervals, triangles or tetrahedra.
#[derive(Clone)]
pub struct SimplexMesh {
    dim: usize,
    points: Vec<f64>,
    cells: Vec<usize>,
    facets: Vec<Facet>,
    boundaries: BoundarySet,
    generation: Generation,
}

impl fmt::Debug for SimplexMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimplexMesh")
            .field("dim", &self.dim)
            .field("n_points", &self.n_points())
            .field("n_cells", &self.n_cells())
            .field("n_facets", &self.facets.len())
            .field(
                "boundaries",
                &self.boundaries.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
            )
            .field("generation", &self.generation)
            .finish()
    }
}

impl SimplexMesh {
    /// Builds a mesh from flat point coordinates and cell connectivity.
    ///
    /// `points` holds `dim` coordinates per vertex and `cells` holds `dim + 1`
    /// vertex ids per cell. Cells are reoriented to positive volume; degenerate
    /// cells are rejected.
    pub fn new(dim: usize, points: Vec<f64>, mut cells: Vec<usize>) -> Result<Self> {
        if !(1..=3).contains(&dim) {
            return Err(PdeError::InvalidInput(format!(
                "mesh dimension must be 1, 2 or 3, got {dim}"
            )));
        }
        if points.len() % dim != 0 || points.iter().any(|p| !p.is_finite()) {
            return Err(PdeError::InvalidInput(
                "point array must hold finite coordinates, dim per vertex".to_string(),
            ));
        }
        let nv = dim + 1;
        if cells.is_empty() || cells.len() % nv != 0 {
            return Err(PdeError::InvalidInput(format!(
                "cell array must be a non-empty multiple of {nv}"
            )));
        }
        let n_points = points.len() / dim;
        if let Some(bad) = cells.iter().find(|&&v| v >= n_points) {
            return Err(PdeError::InvalidInput(format!(
                "cell references vertex {bad} but the mesh has {n_points} points"
            )));
        }

        for cell in cells.chunks_exact_mut(nv) {
            let det = signed_volume_factor(dim, &points, cell);
            if det == 0.0 || !det.is_finite() {
                return Err(PdeError::InvalidInput(format!(
                    "degenerate cell {cell:?}"
                )));
            }
            if det < 0.0 {
                cell.swap(0, 1);
            }
        }

        let facets = build_facets(dim, &cells)?;
        Ok(Self {
            dim,
            points,
            cells,
            facets,
            boundaries: Vec::new(),
            generation: Generation::next(),
        })
    }

    /// Replaces the named boundary predicates. Topology and generation are unchanged.
    pub fn with_boundaries(mut self, boundaries: BoundarySet) -> Self {
        self.boundaries = boundaries;
        self
    }

    /// Spatial dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Generation id of this mesh.
    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Number of vertices.
    #[inline]
    pub fn n_points(&self) -> usize {
        self.points.len() / self.dim
    }

    /// Number of cells.
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.cells.len() / (self.dim + 1)
    }

    /// Coordinates of vertex `i`.
    #[inline]
    pub fn point(&self, i: usize) -> &[f64] {
        &self.points[i * self.dim..(i + 1) * self.dim]
    }

    /// Vertex ids of cell `k`.
    #[inline]
    pub fn cell(&self, k: usize) -> &[usize] {
        let nv = self.dim + 1;
        &self.cells[k * nv..(k + 1) * nv]
    }

    /// All facets, boundary and interior.
    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    /// Boundary predicate set carried by this mesh.
    pub fn boundaries(&self) -> &BoundarySet {
        &self.boundaries
    }

    /// Names of the tagged boundaries.
    pub fn boundary_names(&self) -> impl Iterator<Item = &str> {
        self.boundaries.iter().map(|(n, _)| n.as_str())
    }

    /// Per-axis lower and upper coordinate bounds.
    pub fn bounding_box(&self) -> (Vec<f64>, Vec<f64>) {
        let mut lo = vec![f64::INFINITY; self.dim];
        let mut hi = vec![f64::NEG_INFINITY; self.dim];
        for p in self.points.chunks_exact(self.dim) {
            for a in 0..self.dim {
                lo[a] = lo[a].min(p[a]);
                hi[a] = hi[a].max(p[a]);
            }
        }
        (lo, hi)
    }

    /// Midpoint of a facet.
    pub fn facet_midpoint(&self, facet: &Facet) -> Vec<f64> {
        let mut mid = vec![0.0; self.dim];
        let verts = facet.vertices();
        for &v in verts {
            for (m, c) in mid.iter_mut().zip(self.point(v)) {
                *m += c / verts.len() as f64;
            }
        }
        mid
    }

    /// Indices of the boundary facets tagged `name`.
    pub fn boundary_facets(&self, name: &str) -> Result<Vec<usize>> {
        let (_, predicate) = self
            .boundaries
            .iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| PdeError::UnknownBoundary(name.to_string()))?;
        Ok(self
            .facets
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_boundary() && predicate(&self.facet_midpoint(f)))
            .map(|(i, _)| i)
            .collect())
    }

    /// Volume (length, area) of cell `k`.
    pub fn cell_volume(&self, k: usize) -> f64 {
        let factorial = match self.dim {
            1 => 1.0,
            2 => 2.0,
            _ => 6.0,
        };
        signed_volume_factor(self.dim, &self.points, self.cell(k)).abs() / factorial
    }

    /// Longest edge of cell `k`.
    pub fn cell_diameter(&self, k: usize) -> f64 {
        let cell = self.cell(k);
        let mut h: f64 = 0.0;
        for i in 0..cell.len() {
            for j in i + 1..cell.len() {
                h = h.max(distance(self.point(cell[i]), self.point(cell[j])));
            }
        }
        h
    }

    /// Bisects the longest edge of every marked cell.
    ///
    /// The edge is split in every cell that contains it, so the result stays
    /// conforming in any dimension. Each marked cell is bisected at least once,
    /// hence the element count grows by at least the number of marked cells.
    pub fn refined(&self, marked: &[usize]) -> Result<Self> {
        let nv = self.dim + 1;
        let n_cells = self.n_cells();
        let mut flags = vec![false; n_cells];
        for &k in marked {
            if k >= n_cells {
                return Err(PdeError::InvalidInput(format!(
                    "marked element {k} outside a mesh with {n_cells} cells"
                )));
            }
            flags[k] = true;
        }

        let mut points = self.points.clone();
        let mut cells = self.cells.clone();
        for k in 0..n_cells {
            if !flags[k] {
                continue;
            }
            let (a, b) = longest_edge(self.dim, &points, &cells[k * nv..(k + 1) * nv]);
            let m = points.len() / self.dim;
            for axis in 0..self.dim {
                let mid = 0.5 * (points[a * self.dim + axis] + points[b * self.dim + axis]);
                points.push(mid);
            }

            let current = cells.len() / nv;
            for c in 0..current {
                let cell = &cells[c * nv..(c + 1) * nv];
                if !(cell.contains(&a) && cell.contains(&b)) {
                    continue;
                }
                let mut child = cell.to_vec();
                for v in child.iter_mut() {
                    if *v == a {
                        *v = m;
                    }
                }
                for v in cells[c * nv..(c + 1) * nv].iter_mut() {
                    if *v == b {
                        *v = m;
                    }
                }
                cells.extend_from_slice(&child);
                flags[c] = false;
                flags.push(false);
            }
        }

        let refined = Self::new(self.dim, points, cells)?.with_boundaries(self.boundaries.clone());
        debug!(
            before = n_cells,
            after = refined.n_cells(),
            marked = marked.len(),
            "refined mesh"
        );
        Ok(refined)
    }

    /// One pass of Laplacian smoothing over interior vertices.
    ///
    /// A vertex move is rejected when it would invert or flatten an incident
    /// cell. Interval meshes are returned unchanged: averaging would undo the
    /// grading that refinement just produced.
    pub fn smoothed(&self) -> Result<Self> {
        if self.dim == 1 {
            return Ok(self.clone());
        }
        let nv = self.dim + 1;
        let n_points = self.n_points();
        let mut on_boundary = vec![false; n_points];
        for f in self.facets.iter().filter(|f| f.is_boundary()) {
            for &v in f.vertices() {
                on_boundary[v] = true;
            }
        }
        let mut incident: Vec<Vec<usize>> = vec![Vec::new(); n_points];
        let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); n_points];
        for k in 0..self.n_cells() {
            let cell = self.cell(k);
            for &v in cell {
                incident[v].push(k);
                for &w in cell {
                    if w != v && !neighbours[v].contains(&w) {
                        neighbours[v].push(w);
                    }
                }
            }
        }

        let mut points = self.points.clone();
        for v in 0..n_points {
            if on_boundary[v] || neighbours[v].is_empty() {
                continue;
            }
            let old: Vec<f64> = points[v * self.dim..(v + 1) * self.dim].to_vec();
            let before: Vec<f64> = incident[v]
                .iter()
                .map(|&k| signed_volume_factor(self.dim, &points, &self.cells[k * nv..(k + 1) * nv]))
                .collect();
            for axis in 0..self.dim {
                let avg = neighbours[v]
                    .iter()
                    .map(|&w| points[w * self.dim + axis])
                    .sum::<f64>()
                    / neighbours[v].len() as f64;
                points[v * self.dim + axis] = avg;
            }
            let valid = incident[v].iter().zip(&before).all(|(&k, &old_det)| {
                let det = signed_volume_factor(self.dim, &points, &self.cells[k * nv..(k + 1) * nv]);
                det > 0.05 * old_det
            });
            if !valid {
                points[v * self.dim..(v + 1) * self.dim].copy_from_slice(&old);
            }
        }

        Ok(Self::new(self.dim, points, self.cells.clone())?.with_boundaries(self.boundaries.clone()))
    }

    /// Removes the listed cells and any vertex no longer referenced.
    pub fn remove_elements(&self, indices: &[usize]) -> Result<Self> {
        let nv = self.dim + 1;
        let n_cells = self.n_cells();
        let mut remove = vec![false; n_cells];
        for &k in indices {
            if k >= n_cells {
                return Err(PdeError::InvalidInput(format!(
                    "element {k} outside a mesh with {n_cells} cells"
                )));
            }
            remove[k] = true;
        }
        if remove.iter().all(|&r| r) {
            return Err(PdeError::InvalidInput(
                "cannot remove every element of a mesh".to_string(),
            ));
        }

        let mut renumber = vec![NO_VERTEX; self.n_points()];
        let mut points = Vec::new();
        let mut cells = Vec::with_capacity(self.cells.len());
        for k in (0..n_cells).filter(|&k| !remove[k]) {
            for &v in self.cell(k) {
                if renumber[v] == NO_VERTEX {
                    renumber[v] = points.len() / self.dim;
                    points.extend_from_slice(self.point(v));
                }
                cells.push(renumber[v]);
            }
        }
        debug_assert_eq!(cells.len() % nv, 0);
        Ok(Self::new(self.dim, points, cells)?.with_boundaries(self.boundaries.clone()))
    }
}

/// `dim!` times the signed volume of a simplex.
fn signed_volume_factor(dim: usize, points: &[f64], cell: &[usize]) -> f64 {
    let p = |v: usize, a: usize| points[v * dim + a];
    let x0 = cell[0];
    match dim {
        1 => p(cell[1], 0) - p(x0, 0),
        2 => {
            let (ax, ay) = (p(cell[1], 0) - p(x0, 0), p(cell[1], 1) - p(x0, 1));
            let (bx, by) = (p(cell[2], 0) - p(x0, 0), p(cell[2], 1) - p(x0, 1));
            ax * by - ay * bx
        }
        _ => {
            let j = DMatrix::from_fn(3, 3, |a, c| p(cell[c + 1], a) - p(x0, a));
            j.determinant()
        }
    }
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt()
}

fn longest_edge(dim: usize, points: &[f64], cell: &[usize]) -> (usize, usize) {
    let coords = |v: usize| &points[v * dim..(v + 1) * dim];
    let mut best = (cell[0], cell[1]);
    let mut best_len = -1.0;
    for i in 0..cell.len() {
        for j in i + 1..cell.len() {
            let (a, b) = (cell[i].min(cell[j]), cell[i].max(cell[j]));
            let len = distance(coords(a), coords(b));
            // Ties go to the lexicographically smallest edge so neighbours agree.
            if len > best_len * (1.0 + 1e-12) || (len >= best_len * (1.0 - 1e-12) && (a, b) < best) {
                best = (a, b);
                best_len = len;
            }
        }
    }
    best
}

fn build_facets(dim: usize, cells: &[usize]) -> Result<Vec<Facet>> {
    let nv = dim + 1;
    let mut index: HashMap<[usize; 3], usize> = HashMap::with_capacity(cells.len());
    let mut facets: Vec<Facet> = Vec::with_capacity(cells.len());
    for (k, cell) in cells.chunks_exact(nv).enumerate() {
        for skip in 0..nv {
            let mut key = [NO_VERTEX; 3];
            let mut n = 0;
            for (j, &v) in cell.iter().enumerate() {
                if j != skip {
                    key[n] = v;
                    n += 1;
                }
            }
            key[..n].sort_unstable();
            match index.get(&key) {
                Some(&f) => {
                    if facets[f].neighbour.is_some() {
                        return Err(PdeError::InvalidInput(format!(
                            "facet {:?} shared by more than two cells",
                            &key[..n]
                        )));
                    }
                    facets[f].neighbour = Some(k);
                }
                None => {
                    index.insert(key, facets.len());
                    facets.push(Facet {
                        vertices: key,
                        arity: n,
                        owner: k,
                        neighbour: None,
                    });
                }
            }
        }
    }
    Ok(facets)
}

/// Standard named boundaries of an axis-aligned box.
///
/// Intervals get `left`/`right`; higher dimensions get `s_min`, `s_max`,
/// `v_min`, `v_max`, `r_min`, `r_max` for the price, variance and rate axes.
pub fn box_boundaries(lower: &[f64], upper: &[f64]) -> BoundarySet {
    const AXES: [&str; 3] = ["s", "v", "r"];
    let mut set: BoundarySet = Vec::new();
    for (axis, (&lo, &hi)) in lower.iter().zip(upper).enumerate() {
        let tol = 1e-10 * (hi - lo).abs().max(1.0);
        let (min_name, max_name) = if lower.len() == 1 {
            ("left".to_string(), "right".to_string())
        } else {
            (format!("{}_min", AXES[axis]), format!("{}_max", AXES[axis]))
        };
        let at_min: BoundaryPredicate = Arc::new(move |x: &[f64]| (x[axis] - lo).abs() <= tol);
        let at_max: BoundaryPredicate = Arc::new(move |x: &[f64]| (x[axis] - hi).abs() <= tol);
        set.push((min_name, at_min));
        set.push((max_name, at_max));
    }
    set
}

/// Uniform simplex mesh of `[0, e_0] x ... x [0, e_{d-1}]`.
///
/// Each axis is split into `2^refinements` intervals: `2^n` segments in 1D,
/// `2·4^n` triangles in 2D and `6·8^n` tetrahedra in 3D. Boundaries are
/// tagged with [`box_boundaries`].
pub fn create_mesh(extents: &[f64], refinements: u32) -> Result<SimplexMesh> {
    let dim = extents.len();
    if !(1..=3).contains(&dim) {
        return Err(PdeError::InvalidInput(format!(
            "mesh extents must have 1 to 3 entries, got {dim}"
        )));
    }
    if extents.iter().any(|e| !e.is_finite() || *e <= 0.0) {
        return Err(PdeError::InvalidInput(
            "mesh extents must be finite and > 0".to_string(),
        ));
    }
    let max_refinements = match dim {
        1 => 20,
        2 => 10,
        _ => 6,
    };
    if refinements > max_refinements {
        return Err(PdeError::InvalidInput(format!(
            "at most {max_refinements} refinements supported in {dim}D"
        )));
    }
    let n = 1usize << refinements;
    let axes: Vec<Vec<f64>> = extents
        .iter()
        .map(|&e| (0..=n).map(|i| e * i as f64 / n as f64).collect())
        .collect();
    let mesh = tensor_mesh(&axes)?;
    let lower = vec![0.0; dim];
    Ok(mesh.with_boundaries(box_boundaries(&lower, extents)))
}

/// Simplex mesh on the tensor grid spanned by strictly increasing node lines.
///
/// Squares are split into two triangles and cubes into six Kuhn tetrahedra
/// sharing the main diagonal, which keeps neighbouring cells conforming.
pub fn tensor_mesh(axes: &[Vec<f64>]) -> Result<SimplexMesh> {
    let dim = axes.len();
    if !(1..=3).contains(&dim) {
        return Err(PdeError::InvalidInput(format!(
            "tensor mesh needs 1 to 3 axes, got {dim}"
        )));
    }
    for axis in axes {
        if axis.len() < 2 || axis.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(PdeError::InvalidInput(
                "tensor mesh axes need at least two strictly increasing nodes".to_string(),
            ));
        }
    }
    let len: Vec<usize> = axes.iter().map(Vec::len).collect();
    let stride = |i: usize, j: usize, k: usize| match dim {
        1 => i,
        2 => i + j * len[0],
        _ => i + j * len[0] + k * len[0] * len[1],
    };

    let mut points = Vec::new();
    let nk = if dim == 3 { len[2] } else { 1 };
    let nj = if dim >= 2 { len[1] } else { 1 };
    for k in 0..nk {
        for j in 0..nj {
            for i in 0..len[0] {
                points.push(axes[0][i]);
                if dim >= 2 {
                    points.push(axes[1][j]);
                }
                if dim == 3 {
                    points.push(axes[2][k]);
                }
            }
        }
    }

    let mut cells = Vec::new();
    match dim {
        1 => {
            for i in 0..len[0] - 1 {
                cells.extend_from_slice(&[i, i + 1]);
            }
        }
        2 => {
            for j in 0..len[1] - 1 {
                for i in 0..len[0] - 1 {
                    let (v00, v10) = (stride(i, j, 0), stride(i + 1, j, 0));
                    let (v01, v11) = (stride(i, j + 1, 0), stride(i + 1, j + 1, 0));
                    cells.extend_from_slice(&[v00, v10, v11, v00, v11, v01]);
                }
            }
        }
        _ => {
            const PERMUTATIONS: [[usize; 3]; 6] =
                [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
            for k in 0..len[2] - 1 {
                for j in 0..len[1] - 1 {
                    for i in 0..len[0] - 1 {
                        for perm in PERMUTATIONS {
                            let mut corner = [i, j, k];
                            cells.push(stride(corner[0], corner[1], corner[2]));
                            for axis in perm {
                                corner[axis] += 1;
                                cells.push(stride(corner[0], corner[1], corner[2]));
                            }
                        }
                    }
                }
            }
        }
    }
    SimplexMesh::new(dim, points, cells)
}

/// Triangulated rectangle on explicit node lines, tagged like [`create_mesh`].
pub fn create_tensor_mesh(xs: &[f64], ys: &[f64]) -> Result<SimplexMesh> {
    let mesh = tensor_mesh(&[xs.to_vec(), ys.to_vec()])?;
    let (lower, upper) = mesh.bounding_box();
    Ok(mesh.with_boundaries(box_boundaries(&lower, &upper)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn total_volume(mesh: &SimplexMesh) -> f64 {
        (0..mesh.n_cells()).map(|k| mesh.cell_volume(k)).sum()
    }

    #[test]
    fn create_mesh_rejects_four_dimensions() {
        assert!(matches!(
            create_mesh(&[1.0, 1.0, 1.0, 1.0], 0),
            Err(PdeError::InvalidInput(_))
        ));
    }

    #[test]
    fn create_mesh_spans_extents() {
        let mesh = create_mesh(&[1.0, 2.0], 1).unwrap();
        let (lo, hi) = mesh.bounding_box();
        assert_eq!(lo, vec![0.0, 0.0]);
        assert_eq!(hi, vec![1.0, 2.0]);
        assert_eq!(mesh.n_cells(), 8);
        assert_relative_eq!(total_volume(&mesh), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn element_counts_follow_refinement_level() {
        assert_eq!(create_mesh(&[2.0], 3).unwrap().n_cells(), 8);
        assert_eq!(create_mesh(&[1.0, 1.0], 2).unwrap().n_cells(), 32);
        let cube = create_mesh(&[1.0, 1.0, 1.0], 1).unwrap();
        assert_eq!(cube.n_cells(), 48);
        assert_relative_eq!(total_volume(&cube), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn kuhn_cube_is_conforming() {
        let cube = create_mesh(&[1.0, 1.0, 1.0], 1).unwrap();
        let boundary = cube.facets().iter().filter(|f| f.is_boundary()).count();
        // 6 faces, 4 squares each, 2 triangles per square.
        assert_eq!(boundary, 48);
    }

    #[test]
    fn named_boundaries_select_edge_facets() {
        let mesh = create_mesh(&[1.0, 1.0], 2).unwrap();
        assert_eq!(mesh.boundary_facets("s_min").unwrap().len(), 4);
        assert_eq!(mesh.boundary_facets("v_max").unwrap().len(), 4);
        assert!(matches!(
            mesh.boundary_facets("nowhere"),
            Err(PdeError::UnknownBoundary(_))
        ));
        let line = create_mesh(&[2.0], 2).unwrap();
        assert_eq!(line.boundary_facets("left").unwrap().len(), 1);
        assert_eq!(line.boundary_facets("right").unwrap().len(), 1);
    }

    #[test]
    fn refinement_preserves_volume_and_conformity() {
        let mesh = create_mesh(&[1.0, 1.0], 1).unwrap();
        let refined = mesh.refined(&[0, 3]).unwrap();
        assert!(refined.n_cells() >= mesh.n_cells() + 2);
        assert_relative_eq!(total_volume(&refined), 1.0, epsilon = 1e-12);
        let boundary_len: f64 = refined
            .facets()
            .iter()
            .filter(|f| f.is_boundary())
            .map(|f| distance(refined.point(f.vertices()[0]), refined.point(f.vertices()[1])))
            .sum();
        assert_relative_eq!(boundary_len, 4.0, epsilon = 1e-12);
        assert_ne!(refined.generation(), mesh.generation());
        assert_eq!(refined.boundary_names().count(), 4);
    }

    #[test]
    fn refinement_in_one_and_three_dimensions() {
        let line = create_mesh(&[1.0], 1).unwrap();
        let refined = line.refined(&[1]).unwrap();
        assert_eq!(refined.n_cells(), 3);

        let cube = create_mesh(&[1.0, 1.0, 1.0], 0).unwrap();
        let refined = cube.refined(&[0]).unwrap();
        assert!(refined.n_cells() > cube.n_cells());
        assert_relative_eq!(total_volume(&refined), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn tensor_mesh_uses_given_nodes() {
        let mesh = create_tensor_mesh(&[0.0, 0.5, 1.0], &[0.0, 0.25, 1.0]).unwrap();
        assert_eq!(mesh.n_cells(), 8);
        assert_eq!(mesh.boundary_facets("v_max").unwrap().len(), 2);
        assert!(create_tensor_mesh(&[0.0, 0.0], &[0.0, 1.0]).is_err());
    }

    #[test]
    fn remove_elements_drops_unused_vertices() {
        let mesh = create_mesh(&[1.0], 2).unwrap();
        let coarse = mesh.remove_elements(&[0, 1]).unwrap();
        assert_eq!(coarse.n_cells(), 2);
        assert_eq!(coarse.n_points(), 3);
        assert!(mesh.remove_elements(&[0, 1, 2, 3]).is_err());
    }

    #[test]
    fn smoothing_keeps_cells_valid() {
        let mesh = create_mesh(&[1.0, 1.0], 2).unwrap();
        let refined = mesh.refined(&[0, 1, 2]).unwrap();
        let smooth = refined.smoothed().unwrap();
        assert_eq!(smooth.n_cells(), refined.n_cells());
        assert_relative_eq!(total_volume(&smooth), 1.0, epsilon = 1e-12);
    }
}
