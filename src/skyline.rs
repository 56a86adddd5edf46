//! SKYLINE (profile) storage: the symmetric-portrait envelope format used
//! as ILU(0)'s working storage.
//!
//! No teacher analogue exists (KLU factors general fill-in sparse LU, not a
//! no-fill profile format); the data shape follows
//! `original_source/src/sp_matrix.h`'s `sp_matrix_skyline` directly:
//! `diag`/`lower`/`upper` value arrays plus `iptr` (cumulative row-width
//! offsets) and `jptr` (per-row leftmost-column profile boundary). `lower`
//! and `upper` share the same `(iptr, jptr)` index space -- position `p`
//! in `lower` holds `A[i, j]` and the same position `p` in `upper` holds
//! `A[j, i]`, for the `(i, j)` pair at that profile slot. This aliasing is
//! load-bearing: it's what lets ILU(0) update both triangles from a single
//! index walk.

use crate::builder::{BuilderMatrix, Orientation};
use crate::error::SkylineError;
use crate::yale::YaleMatrix;
use std::collections::HashMap;

/// Symmetric-portrait envelope (profile) matrix.
#[derive(Debug, Clone)]
pub struct SkylineMatrix {
    n: usize,
    pub(crate) diag: Vec<f64>,
    pub(crate) lower: Vec<f64>,
    pub(crate) upper: Vec<f64>,
    pub(crate) iptr: Vec<usize>,
    pub(crate) jptr: Vec<usize>,
}

impl SkylineMatrix {
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn diag(&self) -> &[f64] {
        &self.diag
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn iptr(&self) -> &[usize] {
        &self.iptr
    }

    pub fn jptr(&self) -> &[usize] {
        &self.jptr
    }

    /// Number of stored entries per triangle (the original's `tr_nonzeros`).
    pub fn tr_nonzeros(&self) -> usize {
        self.lower.len()
    }

    /// Total stored entries, both triangles plus diagonal.
    pub fn nonzeros(&self) -> usize {
        self.n + 2 * self.lower.len()
    }

    /// Row `i`'s profile band: `jptr[i]..i`, indexing into `lower`/`upper`
    /// at `iptr[i]..iptr[i + 1]`.
    pub fn row_range(&self, i: usize) -> std::ops::Range<usize> {
        self.iptr[i]..self.iptr[i + 1]
    }

    /// Builds a SKYLINE matrix from a square YALE matrix with a symmetric
    /// sparsity portrait (values need not be symmetric). Errs with
    /// [`SkylineError::PortraitNotSymmetric`] at the first structural
    /// asymmetry found, rather than silently symmetrizing.
    pub fn from_yale(a: &YaleMatrix) -> Result<Self, SkylineError> {
        if a.rows() != a.cols() {
            return Err(SkylineError::NotSquare {
                rows: a.rows(),
                cols: a.cols(),
            });
        }
        let n = a.rows();
        let crs = if a.orientation() == Orientation::RowMajor {
            a.clone()
        } else {
            a.convert(Orientation::RowMajor)
        };

        let mut off_diag: HashMap<(usize, usize), f64> = HashMap::new();
        let mut diag = vec![0.0; n];
        for i in 0..n {
            let (idx, val) = crs.axis_entries(i);
            for (&j, &v) in idx.iter().zip(val) {
                if i == j {
                    diag[i] = v;
                } else {
                    off_diag.insert((i, j), v);
                }
            }
        }

        for &(i, j) in off_diag.keys() {
            if i > j && !off_diag.contains_key(&(j, i)) {
                return Err(SkylineError::PortraitNotSymmetric { row: i, col: j });
            }
        }

        let mut jptr = vec![usize::MAX; n];
        for &(i, j) in off_diag.keys() {
            if i > j {
                jptr[i] = jptr[i].min(j);
            }
        }
        for (i, p) in jptr.iter_mut().enumerate() {
            if *p == usize::MAX {
                *p = i;
            }
        }

        let mut iptr = vec![0usize; n + 1];
        for i in 0..n {
            iptr[i + 1] = iptr[i] + (i - jptr[i]);
        }
        let total = iptr[n];

        let mut lower = vec![0.0; total];
        let mut upper = vec![0.0; total];
        for i in 0..n {
            let start = iptr[i];
            let width = i - jptr[i];
            for k in 0..width {
                let j = jptr[i] + k;
                lower[start + k] = off_diag.get(&(i, j)).copied().unwrap_or(0.0);
                upper[start + k] = off_diag.get(&(j, i)).copied().unwrap_or(0.0);
            }
        }

        log::debug!("skyline from_yale: n={n}, tr_nonzeros={total}");

        Ok(Self {
            n,
            diag,
            lower,
            upper,
            iptr,
            jptr,
        })
    }

    /// Expands back to a general CRS [`YaleMatrix`], explicit zeros within
    /// the profile band included. Used by the diagnostic dump routines and
    /// for round-trip verification.
    pub fn to_yale(&self) -> YaleMatrix {
        let mut builder = BuilderMatrix::new(self.n, self.n, 4, Orientation::RowMajor);
        for i in 0..self.n {
            let _ = builder.add(i, i, self.diag[i]);
            let width = i - self.jptr[i];
            let start = self.iptr[i];
            for k in 0..width {
                let j = self.jptr[i] + k;
                let lv = self.lower[start + k];
                let uv = self.upper[start + k];
                if lv != 0.0 {
                    let _ = builder.add(i, j, lv);
                }
                if uv != 0.0 {
                    let _ = builder.add(j, i, uv);
                }
            }
        }
        builder.compress();
        YaleMatrix::from_builder(&builder).expect("builder sealed above")
    }
}
