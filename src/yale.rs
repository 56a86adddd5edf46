//! YALE storage: the sealed three-array compressed form (CRS or CCS).
//!
//! Grounded on the teacher's `CscMatrix`/`CsrMatrix` (`solver/csc.rs`,
//! `solver/matrix/csr.rs`) merged into a single type carrying an
//! [`Orientation`] tag, per spec.md §3/§4.2.

use crate::EPS;
use crate::builder::{BuilderMatrix, Orientation};
use crate::error::YaleError;
use crate::perm::perm_inverse;

/// Result of comparing the portrait and values of two [`YaleMatrix`]es.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YaleCmp {
    /// Same object (`std::ptr::eq`) -- short-circuits the rest of the
    /// comparison, per spec.md §4.2.
    Same,
    /// Identical portrait and values (within tolerance).
    Equal,
    /// Identical portrait, differing values.
    SamePortrait,
    Different,
}

/// Sealed compressed-storage matrix: CRS (`Orientation::RowMajor`, one
/// offset range per row, column indices stored) or CCS
/// (`Orientation::ColMajor`, one offset range per column, row indices
/// stored).
#[derive(Debug, Clone)]
pub struct YaleMatrix {
    rows: usize,
    cols: usize,
    orientation: Orientation,
    offsets: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl YaleMatrix {
    fn principal_len(&self) -> usize {
        match self.orientation {
            Orientation::RowMajor => self.rows,
            Orientation::ColMajor => self.cols,
        }
    }

    fn cross_len(&self) -> usize {
        match self.orientation {
            Orientation::RowMajor => self.cols,
            Orientation::ColMajor => self.rows,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Seals a compressed, ordered [`BuilderMatrix`] into YALE form.
    /// Errs with [`YaleError::NotOrdered`] if `compress()` was never called.
    pub fn from_builder(builder: &BuilderMatrix) -> Result<Self, YaleError> {
        if !builder.is_ordered() {
            return Err(YaleError::NotOrdered);
        }
        let rows = builder.rows();
        let cols = builder.cols();
        let orientation = builder.orientation();
        let principal_len = match orientation {
            Orientation::RowMajor => rows,
            Orientation::ColMajor => cols,
        };

        let mut offsets = Vec::with_capacity(principal_len + 1);
        offsets.push(0);
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for p in 0..principal_len {
            let (idx, val) = builder.principal_slice(p);
            indices.extend_from_slice(idx);
            values.extend_from_slice(val);
            offsets.push(indices.len());
        }

        Ok(Self {
            rows,
            cols,
            orientation,
            offsets,
            indices,
            values,
        })
    }

    /// Pre-allocates a YALE matrix with `counts[p]` entries reserved per
    /// principal-axis row/column, indices/values zero-initialized. Mirrors
    /// `sp_matrix_yale_init2`: used when the caller fills entries in a
    /// second pass (e.g. ILU workspace allocation) rather than sealing a
    /// builder.
    pub fn with_counts(rows: usize, cols: usize, counts: &[usize], orientation: Orientation) -> Self {
        let principal_len = match orientation {
            Orientation::RowMajor => rows,
            Orientation::ColMajor => cols,
        };
        debug_assert_eq!(counts.len(), principal_len);
        let mut offsets = Vec::with_capacity(principal_len + 1);
        offsets.push(0);
        let mut total = 0;
        for &c in counts {
            total += c;
            offsets.push(total);
        }
        Self {
            rows,
            cols,
            orientation,
            offsets,
            indices: vec![0; total],
            values: vec![0.0; total],
        }
    }

    /// Checks internal structural invariants: monotone offsets, in-range
    /// indices, strictly ascending indices within each principal slice.
    pub fn check_invariants(&self) -> Result<(), YaleError> {
        let principal_len = self.principal_len();
        let cross_len = self.cross_len();
        if self.offsets.len() != principal_len + 1 {
            return Err(YaleError::ShapeMismatch {
                expected: (principal_len + 1, 0),
                actual: (self.offsets.len(), 0),
            });
        }
        for w in self.offsets.windows(2) {
            if w[0] > w[1] {
                return Err(YaleError::ShapeMismatch {
                    expected: (w[0], w[0]),
                    actual: (w[0], w[1]),
                });
            }
        }
        let nnz = *self.offsets.last().unwrap();
        if self.indices.len() != nnz || self.values.len() != nnz {
            return Err(YaleError::ShapeMismatch {
                expected: (nnz, nnz),
                actual: (self.indices.len(), self.values.len()),
            });
        }
        for p in 0..principal_len {
            let start = self.offsets[p];
            let end = self.offsets[p + 1];
            let mut prev: Option<usize> = None;
            for &idx in &self.indices[start..end] {
                if idx >= cross_len {
                    return Err(YaleError::IndexOutOfRange {
                        index: idx,
                        bound: cross_len,
                    });
                }
                if let Some(p0) = prev {
                    if idx <= p0 {
                        return Err(YaleError::IndexOutOfRange { index: idx, bound: p0 });
                    }
                }
                prev = Some(idx);
            }
        }
        Ok(())
    }

    /// The `(indices, values)` slice for principal-axis position `p` (a row
    /// under CRS, a column under CCS).
    pub fn axis_entries(&self, p: usize) -> (&[usize], &[f64]) {
        let start = self.offsets[p];
        let end = self.offsets[p + 1];
        (&self.indices[start..end], &self.values[start..end])
    }

    /// Iterates every stored entry as `(row, col, value)`, independent of
    /// orientation. Used by the diagnostic dump routines.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let orientation = self.orientation;
        (0..self.principal_len()).flat_map(move |p| {
            let (idx, val) = self.axis_entries(p);
            idx.iter().zip(val).map(move |(&c, &v)| match orientation {
                Orientation::RowMajor => (p, c, v),
                Orientation::ColMajor => (c, p, v),
            })
        })
    }

    /// Matrix-vector product `y = A * x`.
    ///
    /// Under CRS this overwrites `y` row by row; under CCS `y` is zeroed
    /// first and then accumulated column by column, since a single column's
    /// contribution touches every row of `y` (spec.md §4.2/§9).
    pub fn mv(&self, x: &[f64], y: &mut [f64]) -> Result<(), YaleError> {
        if x.len() != self.cols {
            return Err(YaleError::ShapeMismatch {
                expected: (self.cols, 0),
                actual: (x.len(), 0),
            });
        }
        if y.len() != self.rows {
            return Err(YaleError::ShapeMismatch {
                expected: (self.rows, 0),
                actual: (y.len(), 0),
            });
        }
        match self.orientation {
            Orientation::RowMajor => {
                for i in 0..self.rows {
                    let (idx, val) = self.axis_entries(i);
                    let mut acc = 0.0;
                    for (&j, &a) in idx.iter().zip(val) {
                        acc += a * x[j];
                    }
                    y[i] = acc;
                }
            }
            Orientation::ColMajor => {
                for yi in y.iter_mut() {
                    *yi = 0.0;
                }
                for j in 0..self.cols {
                    let (idx, val) = self.axis_entries(j);
                    let xj = x[j];
                    for (&i, &a) in idx.iter().zip(val) {
                        y[i] += a * xj;
                    }
                }
            }
        }
        Ok(())
    }

    fn counting_transpose(&self) -> (Vec<usize>, Vec<usize>, Vec<f64>) {
        let principal_len = self.principal_len();
        let cross_len = self.cross_len();
        let nnz = self.indices.len();

        let mut new_offsets = vec![0usize; cross_len + 1];
        for &c in &self.indices {
            new_offsets[c + 1] += 1;
        }
        for k in 0..cross_len {
            new_offsets[k + 1] += new_offsets[k];
        }

        let mut new_indices = vec![0usize; nnz];
        let mut new_values = vec![0.0; nnz];
        let mut next = new_offsets.clone();
        for p in 0..principal_len {
            let start = self.offsets[p];
            let end = self.offsets[p + 1];
            for k in start..end {
                let c = self.indices[k];
                let dest = next[c];
                new_indices[dest] = p;
                new_values[dest] = self.values[k];
                next[c] += 1;
            }
        }
        (new_offsets, new_indices, new_values)
    }

    /// Mathematical transpose `A^T`: swaps rows/cols, keeps the same
    /// orientation tag (a transposed CRS matrix is still stored CRS).
    /// Implemented as a single counting pass, as the teacher's
    /// `transpose_to_csr` does.
    pub fn transpose(&self) -> Self {
        let (offsets, indices, values) = self.counting_transpose();
        Self {
            rows: self.cols,
            cols: self.rows,
            orientation: self.orientation,
            offsets,
            indices,
            values,
        }
    }

    /// Converts storage orientation (CRS <-> CCS) of the *same logical*
    /// matrix. Array-wise this is the same counting pass as [`Self::transpose`]
    /// (CCS of A has identical arrays to CRS of A^T), but `rows`/`cols`
    /// stay as they are since no mathematical transpose takes place.
    pub fn convert(&self, orientation: Orientation) -> Self {
        if orientation == self.orientation {
            return self.clone();
        }
        let (offsets, indices, values) = self.counting_transpose();
        Self {
            rows: self.rows,
            cols: self.cols,
            orientation,
            offsets,
            indices,
            values,
        }
    }

    pub fn convert_inplace(&mut self, orientation: Orientation) {
        if orientation == self.orientation {
            return;
        }
        *self = self.convert(orientation);
    }

    /// Two-sided permutation `P * A * Q`. `p[k]`/`q[k]` give the *old* row
    /// (resp. column) that lands at new position `k`.
    pub fn permute(&self, p: &[usize], q: &[usize]) -> Result<Self, YaleError> {
        if p.len() != self.rows {
            return Err(YaleError::ShapeMismatch {
                expected: (self.rows, 0),
                actual: (p.len(), 0),
            });
        }
        if q.len() != self.cols {
            return Err(YaleError::ShapeMismatch {
                expected: (self.cols, 0),
                actual: (q.len(), 0),
            });
        }
        let qinv = perm_inverse(q);
        let pinv = perm_inverse(p);

        match self.orientation {
            Orientation::RowMajor => {
                let mut builder = BuilderMatrix::new(self.rows, self.cols, 4, Orientation::RowMajor);
                for new_row in 0..self.rows {
                    let old_row = p[new_row];
                    let (idx, val) = self.axis_entries(old_row);
                    for (&old_col, &a) in idx.iter().zip(val) {
                        let new_col = qinv[old_col];
                        builder.add(new_row, new_col, a).map_err(|_| YaleError::IndexOutOfRange {
                            index: new_col,
                            bound: self.cols,
                        })?;
                    }
                }
                builder.compress();
                Self::from_builder(&builder)
            }
            Orientation::ColMajor => {
                let mut builder = BuilderMatrix::new(self.rows, self.cols, 4, Orientation::ColMajor);
                for new_col in 0..self.cols {
                    let old_col = q[new_col];
                    let (idx, val) = self.axis_entries(old_col);
                    for (&old_row, &a) in idx.iter().zip(val) {
                        let new_row = pinv[old_row];
                        builder.add(new_row, new_col, a).map_err(|_| YaleError::IndexOutOfRange {
                            index: new_row,
                            bound: self.rows,
                        })?;
                    }
                }
                builder.compress();
                Self::from_builder(&builder)
            }
        }
    }

    /// Computes `self + alpha * other`. Both operands must share shape and
    /// orientation -- mixing CRS and CCS requires an explicit `convert`
    /// first, since the result's portrait depends on which axis is
    /// principal.
    pub fn axpy(&self, alpha: f64, other: &Self) -> Result<Self, YaleError> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(YaleError::ShapeMismatch {
                expected: (self.rows, self.cols),
                actual: (other.rows, other.cols),
            });
        }
        if self.orientation != other.orientation {
            return Err(YaleError::FormatMismatch);
        }
        let mut builder = BuilderMatrix::new(self.rows, self.cols, 4, self.orientation);
        for (i, j, v) in self.entries() {
            builder.add(i, j, v).expect("shape already validated above");
        }
        for (i, j, v) in other.entries() {
            builder.add(i, j, alpha * v).expect("shape already validated above");
        }
        builder.compress();
        Self::from_builder(&builder)
    }

    /// Compares portrait and values against `other`. Requires matching
    /// shape and orientation; anything else is [`YaleCmp::Different`].
    pub fn compare(&self, other: &Self) -> YaleCmp {
        if std::ptr::eq(self, other) {
            return YaleCmp::Same;
        }
        if self.rows != other.rows || self.cols != other.cols || self.orientation != other.orientation {
            return YaleCmp::Different;
        }
        if self.offsets != other.offsets || self.indices != other.indices {
            return YaleCmp::Different;
        }
        let same_values = self
            .values
            .iter()
            .zip(&other.values)
            .all(|(&a, &b)| (a - b).abs() <= EPS * a.abs().max(b.abs()).max(1.0));
        if same_values {
            YaleCmp::Equal
        } else {
            YaleCmp::SamePortrait
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    // original_source/main.c test_sp_matrix: 7x7 CRS matrix, built directly
    // in the given orientation (entries fed in (row, col, value) order
    // regardless -- BuilderMatrix::add sorts out the axis itself).
    fn balandin(orientation: Orientation) -> YaleMatrix {
        let mut b = BuilderMatrix::new(7, 7, 5, orientation);
        let entries = [
            (0, 0, 9.0), (0, 3, 3.0), (0, 4, 1.0), (0, 6, 1.0),
            (1, 1, 11.0), (1, 2, 2.0), (1, 3, 1.0), (1, 6, 2.0),
            (2, 1, 1.0), (2, 2, 10.0), (2, 3, 2.0),
            (3, 0, 3.0), (3, 1, 1.0), (3, 2, 2.0), (3, 3, 9.0), (3, 4, 1.0),
            (4, 0, 1.0), (4, 3, 1.0), (4, 4, 12.0), (4, 6, 1.0),
            (5, 5, 8.0),
            (6, 0, 1.0), (6, 1, 2.0), (6, 4, 1.0), (6, 6, 8.0),
        ];
        for &(i, j, v) in &entries {
            b.add(i, j, v).unwrap();
        }
        b.compress();
        YaleMatrix::from_builder(&b).unwrap()
    }

    fn balandin_crs() -> YaleMatrix {
        balandin(Orientation::RowMajor)
    }

    #[test]
    fn mv_matches_original_fixture() {
        let a = balandin_crs();
        let x = [1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0];
        let mut y = [0.0; 7];
        a.mv(&x, &mut y).unwrap();
        let expected = [25.0, 34.0, 40.0, 45.0, 42.0, 16.0, 23.0];
        for (got, want) in y.iter().zip(expected) {
            assert_relative_eq!(got, want, epsilon = 1e-9);
        }
    }

    // spec.md §8 testable property #1: converting through any storage
    // format and back to YALE reproduces the canonical matrix.
    #[rstest]
    #[case(Orientation::RowMajor, Orientation::RowMajor)]
    #[case(Orientation::RowMajor, Orientation::ColMajor)]
    #[case(Orientation::ColMajor, Orientation::RowMajor)]
    #[case(Orientation::ColMajor, Orientation::ColMajor)]
    fn format_round_trip_preserves_canonical_matrix(
        #[case] built_as: Orientation,
        #[case] round_trip_through: Orientation,
    ) {
        let canonical = balandin(built_as);
        let converted = canonical.convert(round_trip_through);
        let back = converted.convert(built_as);
        assert_eq!(back.compare(&canonical), YaleCmp::Equal);
    }

    #[test]
    fn mv_requires_matching_shapes() {
        let a = balandin_crs();
        let x = [1.0; 3];
        let mut y = [0.0; 7];
        assert!(matches!(a.mv(&x, &mut y), Err(YaleError::ShapeMismatch { .. })));
    }

    #[test]
    fn convert_round_trips_through_ccs() {
        let a = balandin_crs();
        let ccs = a.convert(Orientation::ColMajor);
        assert_eq!(ccs.orientation(), Orientation::ColMajor);
        assert_eq!(ccs.rows(), a.rows());
        let back = ccs.convert(Orientation::RowMajor);
        assert_eq!(back.compare(&a), YaleCmp::Equal);
    }

    #[test]
    fn transpose_swaps_shape() {
        let a = balandin_crs();
        let at = a.transpose();
        assert_eq!(at.rows(), a.cols());
        assert_eq!(at.cols(), a.rows());
        let att = at.transpose();
        assert_eq!(att.compare(&a), YaleCmp::Equal);
    }

    #[test]
    fn identity_permutation_is_noop() {
        let a = balandin_crs();
        let p: Vec<usize> = (0..7).collect();
        let q: Vec<usize> = (0..7).collect();
        let permuted = a.permute(&p, &q).unwrap();
        assert_eq!(permuted.compare(&a), YaleCmp::Equal);
    }

    #[test]
    fn compare_detects_same_object() {
        let a = balandin_crs();
        assert_eq!(a.compare(&a), YaleCmp::Same);
    }

    #[test]
    fn check_invariants_accepts_sealed_matrix() {
        let a = balandin_crs();
        assert!(a.check_invariants().is_ok());
    }

    #[test]
    fn axpy_negation_zeroes_values() {
        let a = balandin_crs();
        let zeroed = a.axpy(-1.0, &a).unwrap();
        for (_, _, v) in zeroed.entries() {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn axpy_rejects_mismatched_orientation() {
        let a = balandin_crs();
        let ccs = a.convert(Orientation::ColMajor);
        assert!(matches!(a.axpy(1.0, &ccs), Err(YaleError::FormatMismatch)));
    }
}
