//! Sparse matrices with string labels on both axes
//!
//! Storage is compressed sparse rows. Labels are kept strictly ascending, cells inside a row are
//! sorted by column, and cells holding the zero value are never stored, so two matrices with the
//! same content are structurally equal no matter how they were assembled.
use crate::errors::*;
use crate::persist;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::ops::AddAssign;
use std::path::Path;

/// Values a matrix cell can hold. `Default` is the absent value.
pub trait Cell: Copy + Default + PartialEq + AddAssign + Debug + Send + Sync + 'static {
    fn to_f64(self) -> f64;
}

impl Cell for u64 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}
impl Cell for u32 {
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}
impl Cell for i32 {
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}
impl Cell for i64 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}
impl Cell for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledMatrix<V> {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<V>,
}

impl<V: Cell> Default for LabeledMatrix<V> {
    fn default() -> Self {
        LabeledMatrix::empty()
    }
}

fn check_labels(axis: &str, labels: &[String]) -> Result<()> {
    for pair in labels.windows(2) {
        if pair[0] >= pair[1] {
            return Err(Error::InvalidLabels(format!(
                "{} labels must be strictly ascending but {:?} comes before {:?}",
                axis, pair[0], pair[1]
            )));
        }
    }
    Ok(())
}

fn add<V: Cell>(mut a: V, b: V) -> V {
    a += b;
    a
}

impl<V: Cell> LabeledMatrix<V> {
    pub fn empty() -> Self {
        LabeledMatrix {
            row_labels: vec![],
            col_labels: vec![],
            indptr: vec![0],
            indices: vec![],
            data: vec![],
        }
    }

    /// Assemble from (row, column, value) positions
    ///
    /// Repeated positions are summed. Labels must be sorted and free of duplicates.
    pub fn from_triplets(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        triplets: Vec<(usize, usize, V)>,
    ) -> Result<Self> {
        Self::from_triplets_with(row_labels, col_labels, triplets, add)
    }

    /// Like `from_triplets`, with repeated positions folded by `combine`
    ///
    /// `combine` must not depend on the order of its arguments for the result to be stable.
    pub fn from_triplets_with(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        mut triplets: Vec<(usize, usize, V)>,
        combine: fn(V, V) -> V,
    ) -> Result<Self> {
        check_labels("row", &row_labels)?;
        check_labels("column", &col_labels)?;
        let (h, w) = (row_labels.len(), col_labels.len());
        if let Some(&(r, c, _)) = triplets.iter().find(|&&(r, c, _)| r >= h || c >= w) {
            return Err(Error::InvalidDimensions(format!(
                "cell ({}, {}) is outside a {}x{} matrix",
                r, c, h, w
            )));
        }
        triplets.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut indptr = Vec::with_capacity(h + 1);
        let mut indices = Vec::with_capacity(triplets.len());
        let mut data: Vec<V> = Vec::with_capacity(triplets.len());
        indptr.push(0);
        let mut row = 0;
        let mut last: Option<(usize, usize)> = None;
        for (r, c, v) in triplets {
            while row < r {
                Self::seal_row(&mut indices, &mut data, &mut indptr);
                row += 1;
            }
            if last == Some((r, c)) {
                // Same cell again
                if let Some(d) = data.last_mut() {
                    *d = combine(*d, v);
                }
            } else {
                indices.push(c);
                data.push(v);
                last = Some((r, c));
            }
        }
        while indptr.len() < h + 1 {
            Self::seal_row(&mut indices, &mut data, &mut indptr);
        }
        Ok(LabeledMatrix {
            row_labels,
            col_labels,
            indptr,
            indices,
            data,
        })
    }

    /// Close the row being filled, dropping any cell that summed to zero
    fn seal_row(indices: &mut Vec<usize>, data: &mut Vec<V>, indptr: &mut Vec<usize>) {
        let start = *indptr.last().unwrap_or(&0);
        let mut keep = start;
        for i in start..data.len() {
            if data[i] != V::default() {
                indices[keep] = indices[i];
                data[keep] = data[i];
                keep += 1;
            }
        }
        indices.truncate(keep);
        data.truncate(keep);
        indptr.push(keep);
    }

    /// Assemble from a nested mapping of row label to column label to value
    ///
    /// Entries whose labels are not among `row_labels`/`col_labels` are left out.
    pub fn build<F, R, I, C>(freq: F, row_labels: Vec<String>, col_labels: Vec<String>) -> Result<Self>
    where
        F: IntoIterator<Item = (R, I)>,
        R: AsRef<str>,
        I: IntoIterator<Item = (C, V)>,
        C: AsRef<str>,
    {
        check_labels("row", &row_labels)?;
        check_labels("column", &col_labels)?;
        let mut triplets = vec![];
        for (row, cols) in freq {
            let r = match row_labels.binary_search_by(|l| l.as_str().cmp(row.as_ref())) {
                Ok(r) => r,
                Err(_) => continue,
            };
            for (col, v) in cols {
                if let Ok(c) = col_labels.binary_search_by(|l| l.as_str().cmp(col.as_ref())) {
                    triplets.push((r, c, v));
                }
            }
        }
        Self::from_triplets(row_labels, col_labels, triplets)
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.row_labels.len(), self.col_labels.len())
    }

    /// Number of stored (non-zero) cells
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    fn row_range(&self, r: usize) -> std::ops::Range<usize> {
        self.indptr[r]..self.indptr[r + 1]
    }

    pub fn row_index(&self, label: &str) -> Option<usize> {
        self.row_labels.binary_search_by(|l| l.as_str().cmp(label)).ok()
    }

    pub fn col_index(&self, label: &str) -> Option<usize> {
        self.col_labels.binary_search_by(|l| l.as_str().cmp(label)).ok()
    }

    /// Value at a position, zero when nothing is stored there
    pub fn get_at(&self, r: usize, c: usize) -> V {
        let range = self.row_range(r);
        match self.indices[range.clone()].binary_search(&c) {
            Ok(i) => self.data[range.start + i],
            Err(_) => V::default(),
        }
    }

    /// Value of a labeled cell, `None` if a label is unknown
    pub fn get(&self, row: &str, col: &str) -> Option<V> {
        Some(self.get_at(self.row_index(row)?, self.col_index(col)?))
    }

    /// Stored cells of one row as (column label, value)
    pub fn row(&self, label: &str) -> Vec<(&str, V)> {
        match self.row_index(label) {
            Some(r) => self
                .row_range(r)
                .map(|i| (self.col_labels[self.indices[i]].as_str(), self.data[i]))
                .collect(),
            None => vec![],
        }
    }

    /// All stored cells as (row label, column label, value), row-major
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, V)> + '_ {
        (0..self.row_labels.len()).flat_map(move |r| {
            self.row_range(r).map(move |i| {
                (
                    self.row_labels[r].as_str(),
                    self.col_labels[self.indices[i]].as_str(),
                    self.data[i],
                )
            })
        })
    }

    pub fn total(&self) -> V {
        let mut sum = V::default();
        for &v in &self.data {
            sum += v;
        }
        sum
    }

    pub fn to_dense(&self) -> Array2<V> {
        let mut dense = Array2::from_elem(self.shape(), V::default());
        for r in 0..self.row_labels.len() {
            for i in self.row_range(r) {
                dense[[r, self.indices[i]]] = self.data[i];
            }
        }
        dense
    }

    /// Union the labels and add the values of both
    pub fn merge(&self, other: &LabeledMatrix<V>) -> LabeledMatrix<V> {
        Self::merge_all(&[self, other])
    }

    /// Union the labels of every matrix and add up their values
    ///
    /// Labels are matched by equality, so inputs may overlap in any way. The result does not
    /// depend on the order of the inputs.
    pub fn merge_all(matrices: &[&LabeledMatrix<V>]) -> LabeledMatrix<V> {
        Self::merge_all_with(matrices, add)
    }

    /// Union the labels of every matrix, folding cells present in several with `combine`
    pub fn merge_all_with(matrices: &[&LabeledMatrix<V>], combine: fn(V, V) -> V) -> LabeledMatrix<V> {
        let rows: Vec<String> = matrices
            .iter()
            .flat_map(|m| m.row_labels.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let cols: Vec<String> = matrices
            .iter()
            .flat_map(|m| m.col_labels.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut triplets = Vec::with_capacity(matrices.iter().map(|m| m.nnz()).sum());
        for m in matrices {
            let row_map: Vec<usize> = m
                .row_labels
                .iter()
                .map(|l| rows.binary_search(l).unwrap_or_else(|_| unreachable!()))
                .collect();
            let col_map: Vec<usize> = m
                .col_labels
                .iter()
                .map(|l| cols.binary_search(l).unwrap_or_else(|_| unreachable!()))
                .collect();
            for r in 0..m.row_labels.len() {
                for i in m.row_range(r) {
                    triplets.push((row_map[r], col_map[m.indices[i]], m.data[i]));
                }
            }
        }
        match Self::from_triplets_with(rows, cols, triplets, combine) {
            Ok(merged) => merged,
            // Unions of valid label sets are always valid
            Err(err) => unreachable!("{}", err),
        }
    }

    /// Content equality
    pub fn equal(&self, other: &LabeledMatrix<V>) -> bool {
        self == other
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()>
    where
        V: Serialize,
    {
        persist::save(self, path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self>
    where
        V: for<'de> Deserialize<'de>,
    {
        let m: LabeledMatrix<V> = persist::load(path)?;
        m.validate()?;
        Ok(m)
    }

    /// Check the structure of a matrix that came from outside
    fn validate(&self) -> Result<()> {
        check_labels("row", &self.row_labels)?;
        check_labels("column", &self.col_labels)?;
        let ok = self.indptr.len() == self.row_labels.len() + 1
            && self.indptr.first() == Some(&0)
            && self.indptr.last() == Some(&self.data.len())
            && self.indices.len() == self.data.len()
            && self.indptr.windows(2).all(|p| p[0] <= p[1])
            && self.indices.iter().all(|&c| c < self.col_labels.len())
            && (0..self.row_labels.len())
                .all(|r| self.indices[self.row_range(r)].windows(2).all(|p| p[0] < p[1]))
            && self.data.iter().all(|&v| v != V::default());
        if ok {
            Ok(())
        } else {
            Err(Error::InvalidDimensions(
                "stored matrix structure does not match its labels".to_string(),
            ))
        }
    }
}
