//! Error types for the sparse-matrix core.
//!
//! Each subsystem gets its own enum; [`SpMatrixError`] aggregates them for
//! call sites that cross module boundaries (e.g. building a [`crate::skyline`]
//! view from a [`crate::yale`] matrix). Nothing here ever panics or writes to
//! stderr — every fallible entry point returns one of these.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("index {index} out of range (bound {bound})")]
    IndexOutOfRange { index: usize, bound: usize },
}

#[derive(Debug, Error)]
pub enum YaleError {
    #[error("index {index} out of range (bound {bound})")]
    IndexOutOfRange { index: usize, bound: usize },

    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("format mismatch: operands have different orientations")]
    FormatMismatch,

    #[error("builder is not ordered; call compress() before converting to YALE")]
    NotOrdered,
}

#[derive(Debug, Error)]
pub enum SkylineError {
    #[error("matrix portrait is not symmetric at (row {row}, col {col})")]
    PortraitNotSymmetric { row: usize, col: usize },

    #[error("skyline matrices must be square (rows {rows}, cols {cols})")]
    NotSquare { rows: usize, cols: usize },

    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

#[derive(Debug, Error)]
pub enum IluError {
    #[error("singular pivot at row {row}")]
    SingularPivot { row: usize },
}

#[derive(Debug, Error)]
pub enum SpMatrixError {
    #[error(transparent)]
    Builder(#[from] BuilderError),
    #[error(transparent)]
    Yale(#[from] YaleError),
    #[error(transparent)]
    Skyline(#[from] SkylineError),
    #[error(transparent)]
    Ilu(#[from] IluError),
}

pub type SpResult<T> = Result<T, SpMatrixError>;
