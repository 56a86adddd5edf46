//! Sparse matrix storage, ILU(0) factorization, and Krylov solvers.
//!
//! Three storage formats cover the matrix's life cycle:
//!
//! - [`builder::BuilderMatrix`] (BUILDER): a growable, mutable structure
//!   used while assembling a matrix entry by entry.
//! - [`yale::YaleMatrix`] (YALE): the sealed three-array compressed form
//!   (CRS or CCS), produced by [`yale::YaleMatrix::from_builder`] once the
//!   builder is sorted via `compress()`.
//! - [`skyline::SkylineMatrix`] (SKYLINE): the symmetric-portrait envelope
//!   format [`ilu::IluFactorization`] factors in place.
//!
//! [`solvers`] implements CG and ILU(0)-preconditioned CG on top of a
//! [`yale::YaleMatrix`] system matrix. [`dump`] renders any of the three
//! formats as text for diagnostics.

pub mod builder;
pub mod dump;
pub mod error;
pub mod ilu;
pub mod perm;
pub mod skyline;
pub mod solvers;
pub mod yale;

/// Floating-point comparison tolerance used throughout the crate for
/// structural and value equality (`YaleMatrix::compare`,
/// `BuilderMatrix::properties`, singular-pivot detection).
pub const EPS: f64 = 2.0 * f64::EPSILON;

pub use builder::{BuilderMatrix, MatrixProperties, Orientation};
pub use error::{BuilderError, IluError, SkylineError, SpMatrixError, SpResult, YaleError};
pub use ilu::IluFactorization;
pub use skyline::SkylineMatrix;
pub use solvers::{CgConfig, CgOutcome, CgStatus, solve_cg, solve_pcg_ilu};
pub use yale::{YaleCmp, YaleMatrix};
