//! Dense pairwise distance matrix.

use nalgebra::DMatrix;

use crate::types::Point;

/// Euclidean distances between two point sets.
///
/// Rows are sources, columns are references.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    inner: DMatrix<f64>,
}

impl DistanceMatrix {
    /// Compute all `sources.len() x references.len()` distances.
    pub fn compute(sources: &[Point], references: &[Point]) -> Self {
        let inner = DMatrix::from_fn(sources.len(), references.len(), |i, j| {
            sources[i].distance(&references[j])
        });
        Self { inner }
    }

    pub fn rows(&self) -> usize {
        self.inner.nrows()
    }

    pub fn cols(&self) -> usize {
        self.inner.ncols()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.inner.get((row, col)).copied()
    }

    /// Row-major traversal: `(row, col, distance)` with the column varying fastest.
    pub fn iter_row_major(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let cols = self.cols();
        (0..self.rows()).flat_map(move |i| (0..cols).map(move |j| (i, j, self.inner[(i, j)])))
    }

    /// Smallest entry, if the matrix is non-empty.
    pub fn min(&self) -> Option<f64> {
        if self.inner.is_empty() {
            None
        } else {
            Some(self.inner.min())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_and_values() {
        let sources = [Point::new(0.0, 0.0), Point::new(3.0, 4.0)];
        let references = [Point::new(0.0, 0.0), Point::new(6.0, 8.0), Point::new(0.0, 4.0)];
        let m = DistanceMatrix::compute(&sources, &references);

        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        assert_eq!(m.get(0, 1), Some(10.0));
        assert_eq!(m.get(1, 0), Some(5.0));
        assert_eq!(m.get(1, 2), Some(3.0));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.min(), Some(0.0));
    }

    #[test]
    fn test_row_major_order() {
        let sources = [Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        let references = [Point::new(0.0, 0.0), Point::new(2.0, 0.0)];
        let m = DistanceMatrix::compute(&sources, &references);

        let order: Vec<(usize, usize)> = m.iter_row_major().map(|(i, j, _)| (i, j)).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_empty_sides() {
        let m = DistanceMatrix::compute(&[Point::new(0.0, 0.0)], &[]);
        assert_eq!(m.rows(), 1);
        assert_eq!(m.cols(), 0);
        assert_eq!(m.iter_row_major().count(), 0);
        assert_eq!(m.min(), None);
    }
}
