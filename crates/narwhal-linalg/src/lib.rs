#![forbid(unsafe_code)]

//! Sparse linear algebra used by `narwhal`.
//!
//! The crate is deliberately small: a CSR matrix, a dense vector and two conjugate-gradient
//! variants are all the stress-majorization step needs. Dense reconstruction through `nalgebra`
//! exists for diagnostics and tests only.

pub mod cg;
pub mod error;
pub mod sparse;
pub mod vector;

pub use cg::{SolveOutcome, solve_conjugate_gradient, solve_preconditioned_conjugate_gradient};
pub use error::{Error, Result};
pub use sparse::{CsrBuilder, SparseMatrix};
pub use vector::Vector;
