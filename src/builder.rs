//! BUILDER storage: a row- or column-oriented matrix under construction.
//!
//! Mirrors the teacher's `MatrixBuilder`/`CscBuilder` (triplet accumulation,
//! sort-then-seal) but restructured per spec.md §3/§4.1 into a persistent,
//! mutable structure-of-arrays: one growable [`IndexedVector`] per row (or
//! column), supporting repeated `add` accumulation and a `get_ptr` handle
//! into live storage, not just a one-shot triplet-to-CSC pass.

use crate::EPS;
use crate::error::BuilderError;

const GROWTH_FACTOR: f64 = 1.5;

/// Storage orientation: one [`IndexedVector`] per row, or one per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    RowMajor,
    ColMajor,
}

/// Matrix classification returned by [`BuilderMatrix::properties`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixProperties {
    General,
    Symmetric,
    SymmetricPortrait,
    SkewSymmetric,
}

/// A growable sparse vector of `(index, value)` pairs.
///
/// `indices`/`values` are allocated to `capacity`; only the first `used`
/// slots hold meaningful data. Indices are unique within a vector (an `add`
/// at an existing index accumulates); they are strictly increasing only
/// after [`IndexedVector::sort`] has been called.
#[derive(Debug, Clone)]
struct IndexedVector {
    indices: Vec<usize>,
    values: Vec<f64>,
    used: usize,
}

impl IndexedVector {
    fn with_capacity(bandwidth: usize) -> Self {
        let cap = bandwidth.max(1);
        Self {
            indices: vec![0; cap],
            values: vec![0.0; cap],
            used: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.indices.len()
    }

    fn find(&self, idx: usize) -> Option<usize> {
        self.indices[..self.used].iter().position(|&i| i == idx)
    }

    fn grow(&mut self) {
        let new_cap = ((self.capacity() as f64 * GROWTH_FACTOR).ceil() as usize)
            .max(self.capacity() + 1);
        self.indices.resize(new_cap, 0);
        self.values.resize(new_cap, 0.0);
    }

    fn push_new(&mut self, idx: usize, value: f64) {
        if self.used == self.capacity() {
            self.grow();
        }
        self.indices[self.used] = idx;
        self.values[self.used] = value;
        self.used += 1;
    }

    /// Accumulates `value` at `idx`, appending if not already present.
    /// Returns the resulting stored value.
    fn add(&mut self, idx: usize, value: f64) -> f64 {
        if let Some(pos) = self.find(idx) {
            self.values[pos] += value;
            self.values[pos]
        } else {
            self.push_new(idx, value);
            value
        }
    }

    fn get_mut(&mut self, idx: usize) -> Option<&mut f64> {
        let pos = self.find(idx)?;
        Some(&mut self.values[pos])
    }

    fn get(&self, idx: usize) -> Option<f64> {
        self.find(idx).map(|pos| self.values[pos])
    }

    /// Sorts the used prefix by index ascending. Rows/columns are typically
    /// tiny (single-digit nnz), so a plain comparison sort is cheap; no need
    /// for a hand-rolled hybrid quicksort/insertion-sort.
    fn sort(&mut self) {
        let mut pairs: Vec<(usize, f64)> = (0..self.used)
            .map(|k| (self.indices[k], self.values[k]))
            .collect();
        pairs.sort_unstable_by_key(|&(idx, _)| idx);
        for (k, (idx, val)) in pairs.into_iter().enumerate() {
            self.indices[k] = idx;
            self.values[k] = val;
        }
    }

    fn clear_values(&mut self) {
        for v in &mut self.values[..self.used] {
            *v = 0.0;
        }
    }
}

/// Row- or column-oriented matrix under construction.
#[derive(Debug, Clone)]
pub struct BuilderMatrix {
    rows: usize,
    cols: usize,
    orientation: Orientation,
    ordered: bool,
    vectors: Vec<IndexedVector>,
}

impl BuilderMatrix {
    /// Allocates an empty builder with `bandwidth` initial capacity per
    /// row/column. Empty is trivially ordered.
    pub fn new(rows: usize, cols: usize, bandwidth: usize, orientation: Orientation) -> Self {
        let n = rows.max(cols).max(1);
        Self {
            rows,
            cols,
            orientation,
            ordered: true,
            vectors: (0..n).map(|_| IndexedVector::with_capacity(bandwidth)).collect(),
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

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    fn principal_len(&self) -> usize {
        match self.orientation {
            Orientation::RowMajor => self.rows,
            Orientation::ColMajor => self.cols,
        }
    }

    /// Maps (row, col) to (principal axis index, cross axis index).
    fn axis(&self, i: usize, j: usize) -> (usize, usize) {
        match self.orientation {
            Orientation::RowMajor => (i, j),
            Orientation::ColMajor => (j, i),
        }
    }

    /// Inverse of [`Self::axis`].
    fn from_axis(&self, principal: usize, cross: usize) -> (usize, usize) {
        match self.orientation {
            Orientation::RowMajor => (principal, cross),
            Orientation::ColMajor => (cross, principal),
        }
    }

    fn check_bounds(&self, i: usize, j: usize) -> Result<(), BuilderError> {
        if i >= self.rows {
            return Err(BuilderError::IndexOutOfRange {
                index: i,
                bound: self.rows,
            });
        }
        if j >= self.cols {
            return Err(BuilderError::IndexOutOfRange {
                index: j,
                bound: self.cols,
            });
        }
        Ok(())
    }

    /// Accumulates `value` into `(i, j)`, appending if the entry doesn't
    /// already exist. Marks the builder unordered. Returns the new stored
    /// value.
    pub fn add(&mut self, i: usize, j: usize, value: f64) -> Result<f64, BuilderError> {
        self.check_bounds(i, j)?;
        let (p, c) = self.axis(i, j);
        self.ordered = false;
        Ok(self.vectors[p].add(c, value))
    }

    /// Mutable handle to the stored scalar at `(i, j)`, or `None` if absent.
    pub fn get_ptr(&mut self, i: usize, j: usize) -> Option<&mut f64> {
        if i >= self.rows || j >= self.cols {
            return None;
        }
        let (p, c) = self.axis(i, j);
        self.vectors[p].get_mut(c)
    }

    fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.rows || j >= self.cols {
            return None;
        }
        let (p, c) = self.axis(i, j);
        self.vectors[p].get(c)
    }

    /// Sorts each row/column by index ascending and marks the builder
    /// ordered, ready for conversion to [`crate::yale::YaleMatrix`].
    pub fn compress(&mut self) {
        let n = self.principal_len();
        log::debug!("builder compress: sorting {n} indexed vectors");
        for v in &mut self.vectors[..n] {
            v.sort();
        }
        self.ordered = true;
    }

    /// Alias for [`Self::compress`], kept for readability at call sites that
    /// are conceptually "reordering" rather than "sealing".
    pub fn reorder(&mut self) {
        self.compress();
    }

    /// Zeroes all stored values, keeping sparsity portrait and `used`.
    pub fn clear(&mut self) {
        for v in &mut self.vectors {
            v.clear_values();
        }
    }

    /// Number of stored (possibly explicit-zero) entries.
    pub fn nnz(&self) -> usize {
        self.vectors[..self.principal_len()].iter().map(|v| v.used).sum()
    }

    /// Converts to the other orientation. If already in `orientation`,
    /// equivalent to [`Clone::clone`]. Otherwise rebuilds via the same
    /// accumulation path `add` uses, which is the counting-pass idiom
    /// generalized to a mutable builder (spec.md §4.1).
    pub fn convert(&self, orientation: Orientation) -> Self {
        if orientation == self.orientation {
            return self.clone();
        }
        let bandwidth = self.vectors.first().map(|v| v.capacity()).unwrap_or(4);
        let mut out = Self::new(self.rows, self.cols, bandwidth, orientation);
        for p in 0..self.principal_len() {
            let v = &self.vectors[p];
            for k in 0..v.used {
                let (i, j) = self.from_axis(p, v.indices[k]);
                let _ = out.add(i, j, v.values[k]);
            }
        }
        if self.ordered {
            out.compress();
        }
        out
    }

    /// In-place version of [`Self::convert`].
    pub fn convert_inplace(&mut self, orientation: Orientation) {
        if orientation == self.orientation {
            return;
        }
        *self = self.convert(orientation);
    }

    /// Classifies the matrix by scanning stored entries.
    pub fn properties(&self) -> MatrixProperties {
        if self.rows != self.cols {
            return MatrixProperties::General;
        }
        use std::collections::HashMap;
        let mut entries: HashMap<(usize, usize), f64> = HashMap::new();
        for p in 0..self.principal_len() {
            let v = &self.vectors[p];
            for k in 0..v.used {
                let (i, j) = self.from_axis(p, v.indices[k]);
                entries.insert((i, j), v.values[k]);
            }
        }
        if entries.is_empty() {
            return MatrixProperties::Symmetric;
        }

        let mut symmetric = true;
        let mut symmetric_portrait = true;
        let mut skew = true;

        for (&(i, j), &val) in entries.iter() {
            if i == j {
                if val.abs() > EPS {
                    skew = false;
                }
                continue;
            }
            match entries.get(&(j, i)) {
                None => {
                    symmetric = false;
                    symmetric_portrait = false;
                    skew = false;
                }
                Some(&other) => {
                    let tol = EPS * val.abs().max(other.abs());
                    if (val - other).abs() > tol {
                        symmetric = false;
                    }
                    if (val + other).abs() > tol {
                        skew = false;
                    }
                }
            }
        }

        if symmetric {
            MatrixProperties::Symmetric
        } else if symmetric_portrait {
            MatrixProperties::SymmetricPortrait
        } else if skew {
            MatrixProperties::SkewSymmetric
        } else {
            MatrixProperties::General
        }
    }

    /// Iterates all stored entries as `(row, col, value)`, in no particular
    /// order. Used by [`crate::yale::YaleMatrix::from_builder`] and the
    /// diagnostic dump routines.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.principal_len()).flat_map(move |p| {
            let v = &self.vectors[p];
            (0..v.used).map(move |k| {
                let (i, j) = self.from_axis(p, v.indices[k]);
                (i, j, v.values[k])
            })
        })
    }

    /// Per-row/column (index slice, value slice) in principal-axis order.
    /// Requires `is_ordered()`; used by `YaleMatrix::from_builder`.
    pub(crate) fn principal_slice(&self, p: usize) -> (&[usize], &[f64]) {
        let v = &self.vectors[p];
        (&v.indices[..v.used], &v.values[..v.used])
    }

    pub(crate) fn principal_used(&self, p: usize) -> usize {
        self.vectors[p].used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balandin_asymmetric() -> BuilderMatrix {
        // matches original_source/main.c test_sp_matrix (row 3 has only
        // (3,2)=2, (3,3)=9, (3,4)=1 -- no (3,0), (3,1) entries).
        let mut m = BuilderMatrix::new(7, 7, 5, Orientation::RowMajor);
        m.add(0, 0, 9.0).unwrap();
        m.add(0, 3, 3.0).unwrap();
        m.add(0, 4, 1.0).unwrap();
        m.add(0, 6, 1.0).unwrap();
        m.add(1, 1, 11.0).unwrap();
        m.add(1, 2, 2.0).unwrap();
        m.add(1, 3, 1.0).unwrap();
        m.add(1, 6, 2.0).unwrap();
        m.add(2, 1, 1.0).unwrap();
        m.add(2, 2, 10.0).unwrap();
        m.add(2, 3, 2.0).unwrap();
        m.add(3, 2, 2.0).unwrap();
        m.add(3, 3, 9.0).unwrap();
        m.add(3, 4, 1.0).unwrap();
        m.add(4, 0, 1.0).unwrap();
        m.add(4, 3, 1.0).unwrap();
        m.add(4, 4, 12.0).unwrap();
        m.add(4, 6, 1.0).unwrap();
        m.add(5, 5, 8.0).unwrap();
        m.add(6, 0, 2.0).unwrap();
        m.add(6, 1, 2.0).unwrap();
        m.add(6, 4, 3.0).unwrap();
        m.add(6, 6, 8.0).unwrap();
        m
    }

    #[test]
    fn add_accumulates_at_existing_index() {
        let mut m = BuilderMatrix::new(2, 2, 2, Orientation::RowMajor);
        assert_eq!(m.add(0, 0, 5.0).unwrap(), 5.0);
        assert_eq!(m.add(0, 0, 3.0).unwrap(), 8.0);
        assert!(!m.is_ordered());
    }

    #[test]
    fn add_out_of_range_errors() {
        let mut m = BuilderMatrix::new(2, 2, 2, Orientation::RowMajor);
        assert!(matches!(
            m.add(2, 0, 1.0),
            Err(BuilderError::IndexOutOfRange { index: 2, bound: 2 })
        ));
    }

    #[test]
    fn get_ptr_mutates_stored_value() {
        let mut m = BuilderMatrix::new(2, 2, 2, Orientation::RowMajor);
        m.add(1, 1, 4.0).unwrap();
        *m.get_ptr(1, 1).unwrap() = 10.0;
        assert_eq!(m.get(1, 1), Some(10.0));
        assert!(m.get_ptr(0, 0).is_none());
    }

    #[test]
    fn compress_sorts_and_marks_ordered() {
        let mut m = BuilderMatrix::new(3, 3, 2, Orientation::RowMajor);
        m.add(0, 2, 1.0).unwrap();
        m.add(0, 0, 2.0).unwrap();
        assert!(!m.is_ordered());
        m.compress();
        assert!(m.is_ordered());
        let (idx, _) = m.principal_slice(0);
        assert_eq!(idx, &[0, 2]);
    }

    #[test]
    fn clear_preserves_portrait() {
        let mut m = BuilderMatrix::new(2, 2, 2, Orientation::RowMajor);
        m.add(0, 1, 7.0).unwrap();
        m.clear();
        assert_eq!(m.get(0, 1), Some(0.0));
        assert_eq!(m.nnz(), 1);
    }

    #[test]
    fn convert_orientation_preserves_entries() {
        let m = balandin_asymmetric();
        let converted = m.convert(Orientation::ColMajor);
        assert_eq!(converted.orientation(), Orientation::ColMajor);
        let mut a: Vec<_> = m.entries().collect();
        let mut b: Vec<_> = converted.entries().collect();
        a.sort_by_key(|&(i, j, _)| (i, j));
        b.sort_by_key(|&(i, j, _)| (i, j));
        assert_eq!(a, b);
    }

    #[test]
    fn properties_general_for_asymmetric_portrait() {
        let m = balandin_asymmetric();
        assert_eq!(m.properties(), MatrixProperties::General);
    }

    #[test]
    fn properties_detects_symmetric() {
        let mut m = BuilderMatrix::new(2, 2, 2, Orientation::RowMajor);
        m.add(0, 0, 1.0).unwrap();
        m.add(0, 1, 2.0).unwrap();
        m.add(1, 0, 2.0).unwrap();
        m.add(1, 1, 3.0).unwrap();
        assert_eq!(m.properties(), MatrixProperties::Symmetric);
    }

    #[test]
    fn properties_detects_skew_symmetric() {
        let mut m = BuilderMatrix::new(2, 2, 2, Orientation::RowMajor);
        m.add(0, 1, 2.0).unwrap();
        m.add(1, 0, -2.0).unwrap();
        assert_eq!(m.properties(), MatrixProperties::SkewSymmetric);
    }
}
