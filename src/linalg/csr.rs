//! Compressed sparse row matrices for assembled FEM operators.
//!
//! Column indices within a row are kept sorted and unique, so two matrices
//! assembled on the same basis share a pattern and compare cheaply.

use nalgebra::DMatrix;

use crate::core::{PdeError, Result};

/// Square or rectangular sparse matrix in CSR layout.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Builds a matrix from `(row, col, value)` triplets, summing duplicates.
    pub fn from_triplets<I>(n_rows: usize, n_cols: usize, triplets: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut entries: Vec<(usize, usize, f64)> = triplets.into_iter().collect();
        if let Some(&(r, c, _)) = entries.iter().find(|(r, c, _)| *r >= n_rows || *c >= n_cols) {
            return Err(PdeError::InvalidInput(format!(
                "triplet ({r}, {c}) outside a {n_rows}x{n_cols} matrix"
            )));
        }
        entries.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut row_ptr = vec![0usize; n_rows + 1];
        let mut col_idx = Vec::with_capacity(entries.len());
        let mut values: Vec<f64> = Vec::with_capacity(entries.len());
        let mut last: Option<(usize, usize)> = None;
        for (r, c, v) in entries {
            if last == Some((r, c)) {
                if let Some(slot) = values.last_mut() {
                    *slot += v;
                }
                continue;
            }
            row_ptr[r + 1] += 1;
            col_idx.push(c);
            values.push(v);
            last = Some((r, c));
        }
        for i in 0..n_rows {
            row_ptr[i + 1] += row_ptr[i];
        }

        Ok(Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Identity matrix of size `n`.
    pub fn identity(n: usize) -> Self {
        Self {
            n_rows: n,
            n_cols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: vec![1.0; n],
        }
    }

    /// Converts a dense row-major matrix, dropping exact zeros.
    pub fn from_dense(n_rows: usize, n_cols: usize, dense: &[f64]) -> Result<Self> {
        if dense.len() != n_rows * n_cols {
            return Err(PdeError::DimensionMismatch {
                context: "dense matrix data",
                expected: n_rows * n_cols,
                found: dense.len(),
            });
        }
        let triplets = dense
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(k, v)| (k / n_cols, k % n_cols, *v));
        Self::from_triplets(n_rows, n_cols, triplets)
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Column indices and values of one row.
    #[inline]
    pub fn row(&self, row: usize) -> (&[usize], &[f64]) {
        let (start, end) = (self.row_ptr[row], self.row_ptr[row + 1]);
        (&self.col_idx[start..end], &self.values[start..end])
    }

    /// Entry `(row, col)`, zero when not stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let (cols, vals) = self.row(row);
        cols.binary_search(&col).map(|k| vals[k]).unwrap_or(0.0)
    }

    /// Main diagonal.
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.n_rows.min(self.n_cols))
            .map(|i| self.get(i, i))
            .collect()
    }

    /// `y = A x`.
    pub fn mul_vec(&self, x: &[f64]) -> Result<Vec<f64>> {
        let mut y = vec![0.0; self.n_rows];
        self.mul_vec_into(x, &mut y)?;
        Ok(y)
    }

    /// `y = A x` into a caller-owned buffer.
    pub fn mul_vec_into(&self, x: &[f64], y: &mut [f64]) -> Result<()> {
        if x.len() != self.n_cols {
            return Err(PdeError::DimensionMismatch {
                context: "matrix-vector product input",
                expected: self.n_cols,
                found: x.len(),
            });
        }
        if y.len() != self.n_rows {
            return Err(PdeError::DimensionMismatch {
                context: "matrix-vector product output",
                expected: self.n_rows,
                found: y.len(),
            });
        }
        for (i, yi) in y.iter_mut().enumerate() {
            let (cols, vals) = self.row(i);
            *yi = cols
                .iter()
                .zip(vals)
                .fold(0.0, |acc, (&c, &v)| v.mul_add(x[c], acc));
        }
        Ok(())
    }

    /// `alpha * self + beta * other`, over the union of both patterns.
    pub fn linear_combination(&self, alpha: f64, other: &Self, beta: f64) -> Result<Self> {
        if self.n_rows != other.n_rows || self.n_cols != other.n_cols {
            return Err(PdeError::DimensionMismatch {
                context: "sparse linear combination",
                expected: self.n_rows,
                found: other.n_rows,
            });
        }
        let mut row_ptr = Vec::with_capacity(self.n_rows + 1);
        let mut col_idx = Vec::with_capacity(self.nnz().max(other.nnz()));
        let mut values = Vec::with_capacity(self.nnz().max(other.nnz()));
        row_ptr.push(0);
        for i in 0..self.n_rows {
            let (ca, va) = self.row(i);
            let (cb, vb) = other.row(i);
            let (mut p, mut q) = (0, 0);
            while p < ca.len() || q < cb.len() {
                let next_a = ca.get(p).copied().unwrap_or(usize::MAX);
                let next_b = cb.get(q).copied().unwrap_or(usize::MAX);
                if next_a == next_b {
                    col_idx.push(next_a);
                    values.push(alpha * va[p] + beta * vb[q]);
                    p += 1;
                    q += 1;
                } else if next_a < next_b {
                    col_idx.push(next_a);
                    values.push(alpha * va[p]);
                    p += 1;
                } else {
                    col_idx.push(next_b);
                    values.push(beta * vb[q]);
                    q += 1;
                }
            }
            row_ptr.push(col_idx.len());
        }
        Ok(Self {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Replaces the listed rows by unit rows and the matching right-hand side
    /// entries by `values[dof]`.
    ///
    /// Rows that are not listed are copied verbatim, so every untouched entry
    /// of `self` and `rhs` is bit-identical in the result.
    pub fn enforce_rows(&self, rhs: &[f64], dofs: &[usize], values: &[f64]) -> Result<(Self, Vec<f64>)> {
        if self.n_rows != self.n_cols {
            return Err(PdeError::InvalidInput(
                "row elimination requires a square matrix".to_string(),
            ));
        }
        if rhs.len() != self.n_rows {
            return Err(PdeError::DimensionMismatch {
                context: "dirichlet right-hand side",
                expected: self.n_rows,
                found: rhs.len(),
            });
        }
        if values.len() != self.n_rows {
            return Err(PdeError::DimensionMismatch {
                context: "dirichlet values",
                expected: self.n_rows,
                found: values.len(),
            });
        }
        let mut eliminated = vec![false; self.n_rows];
        for &d in dofs {
            if d >= self.n_rows {
                return Err(PdeError::InvalidInput(format!(
                    "dirichlet dof {d} outside a system of size {}",
                    self.n_rows
                )));
            }
            eliminated[d] = true;
        }

        let mut row_ptr = Vec::with_capacity(self.n_rows + 1);
        let mut col_idx = Vec::with_capacity(self.nnz());
        let mut new_values = Vec::with_capacity(self.nnz());
        let mut new_rhs = rhs.to_vec();
        row_ptr.push(0);
        for (i, &is_eliminated) in eliminated.iter().enumerate() {
            if is_eliminated {
                col_idx.push(i);
                new_values.push(1.0);
                new_rhs[i] = values[i];
            } else {
                let (cols, vals) = self.row(i);
                col_idx.extend_from_slice(cols);
                new_values.extend_from_slice(vals);
            }
            row_ptr.push(col_idx.len());
        }

        Ok((
            Self {
                n_rows: self.n_rows,
                n_cols: self.n_cols,
                row_ptr,
                col_idx,
                values: new_values,
            },
            new_rhs,
        ))
    }

    /// Dense copy, used by the direct solver.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.n_rows, self.n_cols);
        for i in 0..self.n_rows {
            let (cols, vals) = self.row(i);
            for (&c, &v) in cols.iter().zip(vals) {
                dense[(i, c)] = v;
            }
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tridiag(n: usize) -> CsrMatrix {
        let mut t = Vec::new();
        for i in 0..n {
            t.push((i, i, 4.0));
            if i > 0 {
                t.push((i, i - 1, -1.0));
            }
            if i + 1 < n {
                t.push((i, i + 1, -1.0));
            }
        }
        CsrMatrix::from_triplets(n, n, t).unwrap()
    }

    #[test]
    fn duplicate_triplets_are_summed() {
        let m = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 1.0), (0, 0, 2.5), (1, 0, -1.0)]).unwrap();
        assert_eq!(m.nnz(), 2);
        assert_relative_eq!(m.get(0, 0), 3.5);
        assert_relative_eq!(m.get(1, 0), -1.0);
        assert_eq!(m.get(1, 1), 0.0);
    }

    #[test]
    fn out_of_range_triplet_is_rejected() {
        assert!(CsrMatrix::from_triplets(2, 2, vec![(2, 0, 1.0)]).is_err());
    }

    #[test]
    fn mul_vec_matches_dense_product() {
        let m = tridiag(4);
        let y = m.mul_vec(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(y, vec![2.0, 4.0, 6.0, 13.0]);
    }

    #[test]
    fn linear_combination_merges_patterns() {
        let a = CsrMatrix::identity(3);
        let b = CsrMatrix::from_triplets(3, 3, vec![(0, 2, 1.0), (1, 1, 2.0)]).unwrap();
        let c = a.linear_combination(2.0, &b, -1.0).unwrap();
        assert_relative_eq!(c.get(0, 0), 2.0);
        assert_relative_eq!(c.get(0, 2), -1.0);
        assert_relative_eq!(c.get(1, 1), 0.0);
        assert_relative_eq!(c.get(2, 2), 2.0);
    }

    #[test]
    fn enforce_rows_inserts_missing_diagonal() {
        let a = CsrMatrix::from_dense(2, 2, &[0.0, 1.0, 2.0, 3.0]).unwrap();
        let (a2, b2) = a.enforce_rows(&[5.0, 6.0], &[0], &[0.5, 1.5]).unwrap();
        assert_eq!(a2.row(0), (&[0usize][..], &[1.0][..]));
        assert_eq!(a2.row(1), a.row(1));
        assert_eq!(b2, vec![0.5, 6.0]);
    }
}
