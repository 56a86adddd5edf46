//! Diagnostic text dumps.
//!
//! Grounded on `original_source/src/sp_matrix.h`'s three distinct textual
//! forms (`sp_matrix_printf` / `_printf2` / `_dump`, and their
//! `sp_matrix_yale_*`/`sp_matrix_skyline_dump` counterparts): a sparse
//! triplet listing, a dense grid with `.` for structural zeros, and a raw
//! array dump of the underlying storage. These return `String` rather than
//! writing to stdout -- no module under this crate's library surface
//! prints directly; that's left to whatever binary or test embeds it.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::builder::{BuilderMatrix, Orientation};
use crate::skyline::SkylineMatrix;
use crate::yale::YaleMatrix;

/// Sparse triplet listing: a header line (`rows cols nnz orientation`)
/// followed by one `row col value` line per stored entry, sorted by
/// `(row, col)`.
pub fn dump_builder_triplet(m: &BuilderMatrix) -> String {
    let mut entries: Vec<(usize, usize, f64)> = m.entries().collect();
    entries.sort_by_key(|&(i, j, _)| (i, j));
    let orientation = match m.orientation() {
        Orientation::RowMajor => "row-major",
        Orientation::ColMajor => "col-major",
    };
    let mut out = String::new();
    let _ = writeln!(out, "{} {} {} {orientation}", m.rows(), m.cols(), entries.len());
    for (i, j, v) in entries {
        let _ = writeln!(out, "{i} {j} {v}");
    }
    out
}

/// Sparse triplet listing for a sealed [`YaleMatrix`].
pub fn dump_yale_triplet(m: &YaleMatrix) -> String {
    let mut entries: Vec<(usize, usize, f64)> = m.entries().collect();
    entries.sort_by_key(|&(i, j, _)| (i, j));
    let orientation = match m.orientation() {
        Orientation::RowMajor => "crs",
        Orientation::ColMajor => "ccs",
    };
    let mut out = String::new();
    let _ = writeln!(out, "{} {} {} {orientation}", m.rows(), m.cols(), m.nnz());
    for (i, j, v) in entries {
        let _ = writeln!(out, "{i} {j} {v}");
    }
    out
}

/// Dense grid rendering of a [`YaleMatrix`], structural zeros shown as `.`.
/// Intended for small matrices only (test fixtures, interactive debugging).
pub fn dump_yale_dense(m: &YaleMatrix) -> String {
    let lookup: HashMap<(usize, usize), f64> = m.entries().map(|(i, j, v)| ((i, j), v)).collect();
    let mut out = String::new();
    for i in 0..m.rows() {
        for j in 0..m.cols() {
            if j > 0 {
                out.push(' ');
            }
            match lookup.get(&(i, j)) {
                Some(v) => {
                    let _ = write!(out, "{v:>8.3}");
                }
                None => {
                    let _ = write!(out, "{:>8}", ".");
                }
            }
        }
        out.push('\n');
    }
    out
}

/// Raw storage dump of a [`SkylineMatrix`]: `diag`, `lower`, `upper`,
/// `iptr`, `jptr` printed as-is, mirroring `sp_matrix_skyline_dump`'s
/// array-oriented output (as opposed to the two triplet/grid forms above).
pub fn dump_skyline_raw(m: &SkylineMatrix) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "n {}", m.n());
    let _ = writeln!(out, "diag {:?}", m.diag());
    let _ = writeln!(out, "lower {:?}", m.lower());
    let _ = writeln!(out, "upper {:?}", m.upper());
    let _ = writeln!(out, "iptr {:?}", m.iptr());
    let _ = writeln!(out, "jptr {:?}", m.jptr());
    out
}
