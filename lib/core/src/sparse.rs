//! Compressed sparse row matrix for pairwise course overlap counts

use crate::{Error, Result};

/// A borrowed row of a [`CsrMatrix`]
#[derive(Debug, Clone, Copy)]
pub struct SparseRow<'a> {
    indices: &'a [u32],
    values: &'a [f32],
}

impl<'a> SparseRow<'a> {
    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate `(column, value)` pairs in ascending column order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + 'a {
        self.indices
            .iter()
            .zip(self.values.iter())
            .map(|(&j, &v)| (j as usize, v))
    }

    /// Value at `column`, zero if absent
    pub fn get(&self, column: usize) -> f32 {
        match self.indices.binary_search(&(column as u32)) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// `dense += scale * row`
    pub fn accumulate_into(&self, dense: &mut [f32], scale: f32) {
        for (j, v) in self.iter() {
            if let Some(slot) = dense.get_mut(j) {
                *slot += scale * v;
            }
        }
    }
}

/// Square sparse matrix in CSR layout, columns sorted within each row.
///
/// Only constructed through [`zeros`](Self::zeros),
/// [`from_triplets`](Self::from_triplets) and [`from_rows`](Self::from_rows),
/// so `indptr` always spans `indices`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsrMatrix {
    size: usize,
    indptr: Vec<usize>,
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl CsrMatrix {
    /// Empty `size x size` matrix
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            indptr: vec![0; size + 1],
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(row, column, value)` triplets. Duplicate coordinates are
    /// summed; explicit zeros are dropped.
    pub fn from_triplets(size: usize, mut triplets: Vec<(usize, usize, f32)>) -> Result<Self> {
        if let Some(&(i, j, _)) = triplets.iter().find(|(i, j, _)| *i >= size || *j >= size) {
            return Err(Error::ShapeMismatch {
                what: "overlap matrix entry",
                expected: size,
                actual: i.max(j) + 1,
            });
        }

        triplets.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut indptr = vec![0usize; size + 1];
        let mut indices = Vec::with_capacity(triplets.len());
        let mut values: Vec<f32> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (i, j, v) in triplets {
            if last == Some((i, j)) {
                if let Some(tail) = values.last_mut() {
                    *tail += v;
                }
                continue;
            }
            indices.push(j as u32);
            values.push(v);
            indptr[i + 1] += 1;
            last = Some((i, j));
        }

        for i in 0..size {
            indptr[i + 1] += indptr[i];
        }

        let mut matrix = Self {
            size,
            indptr,
            indices,
            values,
        };
        matrix.prune_zeros();
        Ok(matrix)
    }

    /// Build from per-row `(column, value)` lists, one list per row in order.
    /// Columns must be sorted and unique within a row.
    pub fn from_rows(rows: Vec<Vec<(u32, f32)>>) -> Self {
        let size = rows.len();
        let nnz = rows.iter().map(Vec::len).sum();
        let mut indptr = Vec::with_capacity(size + 1);
        let mut indices = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        indptr.push(0);
        for row in rows {
            for (j, v) in row {
                if v != 0.0 {
                    indices.push(j);
                    values.push(v);
                }
            }
            indptr.push(indices.len());
        }

        Self {
            size,
            indptr,
            indices,
            values,
        }
    }

    fn prune_zeros(&mut self) {
        if self.values.iter().all(|v| *v != 0.0) {
            return;
        }
        let rows: Vec<Vec<(u32, f32)>> = (0..self.size)
            .map(|i| {
                let (start, end) = (self.indptr[i], self.indptr[i + 1]);
                self.indices[start..end]
                    .iter()
                    .copied()
                    .zip(self.values[start..end].iter().copied())
                    .collect()
            })
            .collect();
        *self = Self::from_rows(rows);
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of stored non-zero entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn row(&self, i: usize) -> Option<SparseRow<'_>> {
        if i >= self.size {
            return None;
        }
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        Some(SparseRow {
            indices: &self.indices[start..end],
            values: &self.values[start..end],
        })
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.row(i).map(|row| row.get(j)).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_triplets() {
        let m = CsrMatrix::from_triplets(
            3,
            vec![(2, 0, 1.0), (0, 1, 3.0), (0, 2, 5.0), (0, 1, 1.0), (1, 1, 0.0)],
        )
        .unwrap();

        assert_eq!(m.size(), 3);
        assert_eq!(m.get(0, 1), 4.0);
        assert_eq!(m.get(0, 2), 5.0);
        assert_eq!(m.get(2, 0), 1.0);
        assert_eq!(m.get(1, 1), 0.0);
        assert_eq!(m.nnz(), 3);
        assert!(m.row(1).unwrap().is_empty());
        assert!(m.row(3).is_none());
    }

    #[test]
    fn test_rows_span_indices() {
        // empty leading and trailing rows still index cleanly
        let m = CsrMatrix::from_triplets(5, vec![(2, 4, 2.0), (2, 0, 1.0), (0, 0, 0.0)]).unwrap();
        let lens: Vec<usize> = (0..5).map(|i| m.row(i).unwrap().nnz()).collect();
        assert_eq!(lens, vec![0, 0, 2, 0, 0]);
        assert_eq!(m.row(4).unwrap().iter().count(), 0);
    }

    #[test]
    fn test_out_of_bounds_triplet() {
        let err = CsrMatrix::from_triplets(2, vec![(0, 5, 1.0)]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_accumulate_into() {
        let m = CsrMatrix::from_rows(vec![vec![(1, 3.0), (2, 5.0)], vec![(0, 3.0)], vec![]]);
        let mut dense = vec![0.0; 3];
        m.row(0).unwrap().accumulate_into(&mut dense, 1.0);
        m.row(1).unwrap().accumulate_into(&mut dense, -0.5);
        assert_eq!(dense, vec![-1.5, 3.0, 5.0]);
    }

    #[test]
    fn test_row_iter_sorted() {
        let m = CsrMatrix::from_triplets(2, vec![(0, 1, 2.0), (0, 0, 1.0)]).unwrap();
        let row: Vec<_> = m.row(0).unwrap().iter().collect();
        assert_eq!(row, vec![(0, 1.0), (1, 2.0)]);
    }
}
