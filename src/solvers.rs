//! Krylov solvers: plain conjugate gradient and ILU(0)-preconditioned CG.
//!
//! No teacher analogue exists -- KLU is a direct sparse LU solver, not an
//! iterative Krylov method -- so these follow the textbook CG/PCG
//! algorithms directly, written in the same `Result`/status-returning,
//! no-panic style the rest of this crate uses. Shape mismatches are a
//! genuine `Err`; non-convergence and breakdown are reported through
//! [`CgStatus`] in the `Ok` outcome, since the caller typically still wants
//! the best-effort `x`.

use crate::error::{SpMatrixError, YaleError};
use crate::ilu::IluFactorization;
use crate::yale::YaleMatrix;

#[derive(Debug, Clone, Copy)]
pub struct CgConfig {
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for CgConfig {
    fn default() -> Self {
        Self {
            max_iter: 20_000,
            tol: 1e-15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CgStatus {
    Converged,
    MaxIterExceeded,
    /// `p . (A p)` collapsed to (near) zero at the given iteration -- the
    /// search direction can no longer make progress.
    Breakdown { iteration: usize },
}

#[derive(Debug, Clone)]
pub struct CgOutcome {
    pub x: Vec<f64>,
    pub iterations: usize,
    pub residual: f64,
    pub status: CgStatus,
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| x * y).sum()
}

fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

fn check_shapes(a: &YaleMatrix, b: &[f64], x0: &[f64]) -> Result<(), SpMatrixError> {
    if b.len() != a.rows() {
        return Err(YaleError::ShapeMismatch {
            expected: (a.rows(), 0),
            actual: (b.len(), 0),
        }
        .into());
    }
    if x0.len() != a.cols() {
        return Err(YaleError::ShapeMismatch {
            expected: (a.cols(), 0),
            actual: (x0.len(), 0),
        }
        .into());
    }
    Ok(())
}

/// Unpreconditioned conjugate gradient for symmetric positive-definite `a`.
///
/// Stopping criterion is relative to the right-hand side, per spec.md
/// §4.4: converged once `‖r‖ ≤ tol·‖b‖`.
pub fn solve_cg(a: &YaleMatrix, b: &[f64], x0: Vec<f64>, config: &CgConfig) -> Result<CgOutcome, SpMatrixError> {
    check_shapes(a, b, &x0)?;
    let n = b.len();
    let mut x = x0;
    let mut ax = vec![0.0; n];
    a.mv(&x, &mut ax)?;

    let b_norm = norm(b);
    let threshold = config.tol * b_norm;

    let mut r: Vec<f64> = b.iter().zip(&ax).map(|(&bi, &axi)| bi - axi).collect();
    let mut p = r.clone();
    let mut rho = dot(&r, &r);

    let mut residual = norm(&r);
    if residual <= threshold {
        return Ok(CgOutcome {
            x,
            iterations: 0,
            residual,
            status: CgStatus::Converged,
        });
    }

    for iter in 0..config.max_iter {
        let mut ap = vec![0.0; n];
        a.mv(&p, &mut ap)?;
        let p_ap = dot(&p, &ap);
        if p_ap <= 0.0 {
            log::warn!("cg breakdown at iteration {iter}: p.Ap = {p_ap} is non-positive");
            return Ok(CgOutcome {
                x,
                iterations: iter,
                residual,
                status: CgStatus::Breakdown { iteration: iter },
            });
        }
        let alpha = rho / p_ap;
        axpy(alpha, &p, &mut x);
        axpy(-alpha, &ap, &mut r);

        residual = norm(&r);
        if residual <= threshold {
            log::debug!("cg converged after {} iterations, residual {residual:.3e}", iter + 1);
            return Ok(CgOutcome {
                x,
                iterations: iter + 1,
                residual,
                status: CgStatus::Converged,
            });
        }

        let rho_new = dot(&r, &r);
        let beta = rho_new / rho;
        for (pi, &ri) in p.iter_mut().zip(&r) {
            *pi = ri + beta * *pi;
        }
        rho = rho_new;
    }

    log::warn!("cg exceeded {} iterations, residual {residual:.3e}", config.max_iter);
    Ok(CgOutcome {
        x,
        iterations: config.max_iter,
        residual,
        status: CgStatus::MaxIterExceeded,
    })
}

/// Conjugate gradient preconditioned by an ILU(0) factorization of (an
/// approximation to) `a`.
///
/// Stopping criterion is relative to the right-hand side, per spec.md
/// §4.4: converged once `‖r‖ ≤ tol·‖b‖`.
pub fn solve_pcg_ilu(
    a: &YaleMatrix,
    precond: &IluFactorization,
    b: &[f64],
    x0: Vec<f64>,
    config: &CgConfig,
) -> Result<CgOutcome, SpMatrixError> {
    check_shapes(a, b, &x0)?;
    let n = b.len();
    let mut x = x0;
    let mut ax = vec![0.0; n];
    a.mv(&x, &mut ax)?;

    let threshold = config.tol * norm(b);

    let mut r: Vec<f64> = b.iter().zip(&ax).map(|(&bi, &axi)| bi - axi).collect();
    let mut residual = norm(&r);
    if residual <= threshold {
        return Ok(CgOutcome {
            x,
            iterations: 0,
            residual,
            status: CgStatus::Converged,
        });
    }

    let mut z = precond.solve(&r)?;
    let mut p = z.clone();
    let mut rho = dot(&r, &z);

    for iter in 0..config.max_iter {
        let mut ap = vec![0.0; n];
        a.mv(&p, &mut ap)?;
        let p_ap = dot(&p, &ap);
        if p_ap <= 0.0 {
            log::warn!("pcg-ilu breakdown at iteration {iter}: p.Ap = {p_ap} is non-positive");
            return Ok(CgOutcome {
                x,
                iterations: iter,
                residual,
                status: CgStatus::Breakdown { iteration: iter },
            });
        }
        let alpha = rho / p_ap;
        axpy(alpha, &p, &mut x);
        axpy(-alpha, &ap, &mut r);

        residual = norm(&r);
        if residual <= threshold {
            log::debug!(
                "pcg-ilu converged after {} iterations, residual {residual:.3e}",
                iter + 1
            );
            return Ok(CgOutcome {
                x,
                iterations: iter + 1,
                residual,
                status: CgStatus::Converged,
            });
        }

        z = precond.solve(&r)?;
        let rho_new = dot(&r, &z);
        let beta = rho_new / rho;
        for (pi, &zi) in p.iter_mut().zip(&z) {
            *pi = zi + beta * *pi;
        }
        rho = rho_new;
    }

    log::warn!(
        "pcg-ilu exceeded {} iterations, residual {residual:.3e}",
        config.max_iter
    );
    Ok(CgOutcome {
        x,
        iterations: config.max_iter,
        residual,
        status: CgStatus::MaxIterExceeded,
    })
}
