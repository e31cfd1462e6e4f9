//! Conjugate-gradient solvers for symmetric positive-semi-definite CSR systems.
//!
//! Both solvers stop when the normalized residual `||r|| / n` drops to `epsilon` times its
//! initial value, or when the iteration budget runs out. Exhausting the budget is not an
//! error: the best iterate is returned with `converged == false`.

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::sparse::SparseMatrix;
use crate::vector::Vector;

#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub x: Vector,
    pub iterations: usize,
    pub converged: bool,
    /// `||b - A x|| / n` at the returned iterate.
    pub normalized_residual: f64,
}

/// Solves `A x = b` by plain conjugate gradient, starting from `x0`.
pub fn solve_conjugate_gradient(
    a: &SparseMatrix,
    b: &Vector,
    x0: Vector,
    max_iterations: usize,
    epsilon: f64,
) -> Result<SolveOutcome> {
    validate(a, b, &x0, max_iterations, epsilon)?;
    let n = a.num_rows();
    if n == 0 {
        return Ok(empty_outcome(x0));
    }
    let rows = n as f64;

    let mut x = x0;
    let mut r = b - &(a * &x);
    let mut d = r.clone();
    let mut delta_new = r.dot(&r);
    let initial_residual = delta_new.sqrt() / rows;
    let threshold = epsilon * initial_residual;
    let mut residual = initial_residual;
    let mut iterations = 0;

    debug!(
        "CG: n={n}, nnz={}, eps={epsilon:.2e}, max_iter={max_iterations}, r0={initial_residual:.6e}",
        a.nnz()
    );

    while iterations < max_iterations && residual > threshold {
        let q = a * &d;
        let dq = d.dot(&q);
        if !(dq > 0.0 && dq.is_finite()) {
            warn!("CG: breakdown with d.Ad = {dq:.4e} at iteration {iterations}");
            break;
        }
        let alpha = delta_new / dq;
        x.add_scaled(alpha, &d);
        r.add_scaled(-alpha, &q);

        let delta_old = delta_new;
        delta_new = r.dot(&r);
        residual = delta_new.sqrt() / rows;
        d.scale_and_add(delta_new / delta_old, &r);
        iterations += 1;

        trace!("CG iter {iterations}: ||r||/n = {residual:.6e}");
    }

    Ok(finish("CG", x, iterations, residual, threshold))
}

/// Solves `A x = b` by conjugate gradient with the Jacobi preconditioner
/// [`SparseMatrix::diagonal_preconditioner`], starting from `x0`.
pub fn solve_preconditioned_conjugate_gradient(
    a: &SparseMatrix,
    b: &Vector,
    x0: Vector,
    max_iterations: usize,
    epsilon: f64,
) -> Result<SolveOutcome> {
    validate(a, b, &x0, max_iterations, epsilon)?;
    let n = a.num_rows();
    if n == 0 {
        return Ok(empty_outcome(x0));
    }
    let rows = n as f64;
    let m_inv = a.diagonal_preconditioner();

    let mut x = x0;
    let mut r = b - &(a * &x);
    let mut d = m_inv.comp_product(&r);
    let mut delta_new = r.dot(&d);
    let initial_residual = r.norm() / rows;
    let threshold = epsilon * initial_residual;
    let mut residual = initial_residual;
    let mut iterations = 0;

    debug!(
        "PCG: n={n}, nnz={}, eps={epsilon:.2e}, max_iter={max_iterations}, r0={initial_residual:.6e}",
        a.nnz()
    );

    while iterations < max_iterations && residual > threshold {
        let q = a * &d;
        let dq = d.dot(&q);
        if !(dq > 0.0 && dq.is_finite()) {
            warn!("PCG: breakdown with d.Ad = {dq:.4e} at iteration {iterations}");
            break;
        }
        let alpha = delta_new / dq;
        x.add_scaled(alpha, &d);
        r.add_scaled(-alpha, &q);
        residual = r.norm() / rows;

        let s = m_inv.comp_product(&r);
        let delta_old = delta_new;
        delta_new = r.dot(&s);
        d.scale_and_add(delta_new / delta_old, &s);
        iterations += 1;

        trace!("PCG iter {iterations}: ||r||/n = {residual:.6e}");
    }

    Ok(finish("PCG", x, iterations, residual, threshold))
}

fn finish(
    label: &str,
    x: Vector,
    iterations: usize,
    residual: f64,
    threshold: f64,
) -> SolveOutcome {
    let converged = residual <= threshold;
    if converged {
        debug!("{label} converged after {iterations} iterations: ||r||/n = {residual:.6e}");
    } else {
        debug!("{label}: no convergence after {iterations} iterations, ||r||/n = {residual:.6e}");
    }
    SolveOutcome {
        x,
        iterations,
        converged,
        normalized_residual: residual,
    }
}

fn empty_outcome(x0: Vector) -> SolveOutcome {
    SolveOutcome {
        x: x0,
        iterations: 0,
        converged: true,
        normalized_residual: 0.0,
    }
}

fn validate(
    a: &SparseMatrix,
    b: &Vector,
    x0: &Vector,
    max_iterations: usize,
    epsilon: f64,
) -> Result<()> {
    if a.num_rows() != a.num_cols() {
        return Err(Error::DimensionMismatch {
            context: "conjugate gradient requires a square matrix",
            expected: a.num_rows(),
            actual: a.num_cols(),
        });
    }
    if b.len() != a.num_rows() {
        return Err(Error::DimensionMismatch {
            context: "right-hand side length",
            expected: a.num_rows(),
            actual: b.len(),
        });
    }
    if x0.len() != a.num_cols() {
        return Err(Error::DimensionMismatch {
            context: "initial guess length",
            expected: a.num_cols(),
            actual: x0.len(),
        });
    }
    if max_iterations == 0 {
        return Err(Error::InvalidParameter {
            name: "max_iterations",
            value: max_iterations.to_string(),
            expected: "at least 1",
        });
    }
    if !(epsilon.is_finite() && epsilon > 0.0) {
        return Err(Error::InvalidParameter {
            name: "epsilon",
            value: epsilon.to_string(),
            expected: "a finite, positive tolerance",
        });
    }
    Ok(())
}
