//! Linear solvers for the assembled time-step systems.
//!
//! Small systems go through a dense LU factorization that is cached while the
//! matrix stays unchanged, which is the common case for a θ-scheme with a
//! fixed step. Large systems use Jacobi-preconditioned BiCGStab.

use nalgebra::{DVector, Dyn, LU};
use tracing::{trace, warn};

use super::csr::CsrMatrix;
use crate::core::{NumericConfig, PdeError, Result, SolverKind};

/// Outcome of an iterative solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    Converged,
    Stagnated,
    MaxIterationsReached,
}

/// Convergence report of the last iterative solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterativeReport {
    pub status: SolverStatus,
    pub iterations: usize,
    pub relative_residual: f64,
}

/// Solves `A x = b`, reusing work across calls where possible.
#[derive(Debug)]
pub struct LinearSolver {
    config: NumericConfig,
    factorization: Option<(CsrMatrix, LU<f64, Dyn, Dyn>)>,
    last_report: Option<IterativeReport>,
}

impl LinearSolver {
    /// Creates a solver with no cached factorization.
    pub fn new(config: NumericConfig) -> Self {
        Self {
            config,
            factorization: None,
            last_report: None,
        }
    }

    /// Report of the most recent BiCGStab run, if any.
    pub fn last_report(&self) -> Option<IterativeReport> {
        self.last_report
    }

    /// Solves the system. `guess` seeds the iterative solver and is ignored by LU.
    ///
    /// Failures are reported as [`PdeError::SingularSystem`] with step 0; the
    /// caller attaches its own step index.
    pub fn solve(&mut self, a: &CsrMatrix, b: &[f64], guess: Option<&[f64]>) -> Result<Vec<f64>> {
        let n = a.n_rows();
        if a.n_cols() != n {
            return Err(PdeError::InvalidInput("linear system must be square".to_string()));
        }
        if b.len() != n {
            return Err(PdeError::DimensionMismatch {
                context: "linear system right-hand side",
                expected: n,
                found: b.len(),
            });
        }
        if let Some(dof) = b.iter().position(|v| !v.is_finite()) {
            return Err(PdeError::SingularSystem {
                step: 0,
                dof: Some(dof),
                message: "non-finite right-hand side".to_string(),
            });
        }

        let use_direct = match self.config.solver {
            SolverKind::Direct => true,
            SolverKind::BiCgStab => false,
            SolverKind::Auto => n <= self.config.direct_solver_max_dofs,
        };
        let x = if use_direct {
            self.solve_direct(a, b)?
        } else {
            self.solve_iterative(a, b, guess)?
        };

        if let Some(dof) = x.iter().position(|v| !v.is_finite()) {
            return Err(PdeError::SingularSystem {
                step: 0,
                dof: Some(dof),
                message: "solution is not finite".to_string(),
            });
        }
        Ok(x)
    }

    fn solve_direct(&mut self, a: &CsrMatrix, b: &[f64]) -> Result<Vec<f64>> {
        let reuse = matches!(&self.factorization, Some((cached, _)) if cached == a);
        if !reuse {
            trace!(dofs = a.n_rows(), nnz = a.nnz(), "factorizing system matrix");
            let lu = a.to_dense().lu();
            if !lu.is_invertible() {
                let u = lu.u();
                let dof = (0..u.nrows()).find(|&i| u[(i, i)] == 0.0);
                self.factorization = None;
                return Err(PdeError::SingularSystem {
                    step: 0,
                    dof,
                    message: "zero pivot in LU factorization".to_string(),
                });
            }
            self.factorization = Some((a.clone(), lu));
        }

        let Some((_, lu)) = &self.factorization else {
            return Err(PdeError::NotConfigured("LU factorization"));
        };
        lu.solve(&DVector::from_column_slice(b))
            .map(|x| x.as_slice().to_vec())
            .ok_or_else(|| PdeError::SingularSystem {
                step: 0,
                dof: None,
                message: "LU back-substitution failed".to_string(),
            })
    }

    fn solve_iterative(&mut self, a: &CsrMatrix, b: &[f64], guess: Option<&[f64]>) -> Result<Vec<f64>> {
        let n = a.n_rows();
        let diag = a.diagonal();
        if let Some(dof) = diag.iter().position(|d| d.abs() <= f64::MIN_POSITIVE) {
            return Err(PdeError::SingularSystem {
                step: 0,
                dof: Some(dof),
                message: "zero diagonal entry, Jacobi preconditioner undefined".to_string(),
            });
        }
        let inv_diag: Vec<f64> = diag.iter().map(|d| 1.0 / d).collect();
        let precond = |src: &[f64], dst: &mut [f64]| {
            for ((d, s), w) in dst.iter_mut().zip(src).zip(&inv_diag) {
                *d = s * w;
            }
        };

        let mut x = match guess {
            Some(g) if g.len() == n => g.to_vec(),
            _ => vec![0.0; n],
        };
        let mut ax = vec![0.0; n];
        a.mul_vec_into(&x, &mut ax)?;
        let mut r: Vec<f64> = b.iter().zip(&ax).map(|(bi, ai)| bi - ai).collect();
        let r0 = r.clone();
        let b_norm = norm2(b).max(f64::MIN_POSITIVE);
        if norm2(&r) / b_norm <= self.config.iterative_tolerance {
            self.last_report = Some(IterativeReport {
                status: SolverStatus::Converged,
                iterations: 0,
                relative_residual: norm2(&r) / b_norm,
            });
            return Ok(x);
        }

        let mut p = vec![0.0; n];
        let mut v = vec![0.0; n];
        let mut s = vec![0.0; n];
        let mut t = vec![0.0; n];
        let mut z = vec![0.0; n];
        let (mut rho_old, mut alpha, mut omega) = (1.0_f64, 1.0_f64, 1.0_f64);
        let breakdown = 1.0e-300;

        let mut report = IterativeReport {
            status: SolverStatus::MaxIterationsReached,
            iterations: self.config.iterative_max_iter,
            relative_residual: f64::NAN,
        };
        for iter in 0..self.config.iterative_max_iter {
            let rho = dot(&r0, &r);
            if rho.abs() < breakdown {
                report = IterativeReport {
                    status: SolverStatus::Stagnated,
                    iterations: iter,
                    relative_residual: norm2(&r) / b_norm,
                };
                break;
            }
            let beta = if iter == 0 { 0.0 } else { (rho / rho_old) * (alpha / omega) };
            rho_old = rho;
            for i in 0..n {
                p[i] = r[i] + beta * (p[i] - omega * v[i]);
            }

            precond(&p, &mut z);
            a.mul_vec_into(&z, &mut v)?;
            let r0v = dot(&r0, &v);
            if r0v.abs() < breakdown {
                report = IterativeReport {
                    status: SolverStatus::Stagnated,
                    iterations: iter,
                    relative_residual: norm2(&r) / b_norm,
                };
                break;
            }
            alpha = rho / r0v;
            axpy(alpha, &z, &mut x);
            for i in 0..n {
                s[i] = r[i] - alpha * v[i];
            }
            let s_rel = norm2(&s) / b_norm;
            if s_rel <= self.config.iterative_tolerance {
                report = IterativeReport {
                    status: SolverStatus::Converged,
                    iterations: iter + 1,
                    relative_residual: s_rel,
                };
                break;
            }

            precond(&s, &mut z);
            a.mul_vec_into(&z, &mut t)?;
            let tt = dot(&t, &t);
            omega = if tt < breakdown { 0.0 } else { dot(&t, &s) / tt };
            if omega.abs() < breakdown {
                r.copy_from_slice(&s);
                report = IterativeReport {
                    status: SolverStatus::Stagnated,
                    iterations: iter + 1,
                    relative_residual: s_rel,
                };
                break;
            }
            axpy(omega, &z, &mut x);
            for i in 0..n {
                r[i] = s[i] - omega * t[i];
            }

            let rel = norm2(&r) / b_norm;
            trace!(iteration = iter + 1, residual = rel, "bicgstab");
            if rel <= self.config.iterative_tolerance {
                report = IterativeReport {
                    status: SolverStatus::Converged,
                    iterations: iter + 1,
                    relative_residual: rel,
                };
                break;
            }
            report.relative_residual = rel;
        }

        self.last_report = Some(report);
        match report.status {
            SolverStatus::Converged => Ok(x),
            status => {
                warn!(?status, iterations = report.iterations, residual = report.relative_residual, "bicgstab failed");
                Err(PdeError::SingularSystem {
                    step: 0,
                    dof: None,
                    message: format!(
                        "BiCGStab {status:?} after {} iterations (relative residual {:.3e})",
                        report.iterations, report.relative_residual
                    ),
                })
            }
        }
    }
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).fold(0.0, |acc, (x, y)| x.mul_add(*y, acc))
}

#[inline]
fn norm2(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

#[inline]
fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi = alpha.mul_add(*xi, *yi);
    }
}
