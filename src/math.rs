use nalgebra as na;
use ndarray::{Array2, ArrayView2};
use num_traits::{Float, NumCast};
use std::cmp::Ordering;

use crate::Centroid;

/// Euclidean distances between every pair, rows are `from`, columns are `to`.
pub fn distance_matrix(from: &[Centroid], to: &[Centroid]) -> Array2<f64> {
    Array2::from_shape_fn((from.len(), to.len()), |(r, c)| distance(&from[r], &to[c]))
}

#[inline]
pub fn distance(a: &Centroid, b: &Centroid) -> f64 {
    let a = na::Point2::new(a.x as f64, a.y as f64);
    let b = na::Point2::new(b.x as f64, b.y as f64);

    na::distance(&a, &b)
}

/// Index of the first minimum of a sequence, `None` when empty.
fn argmin<'a>(values: impl Iterator<Item = &'a f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (idx, &v) in values.enumerate() {
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((idx, v)),
        }
    }

    best.map(|(idx, _)| idx)
}

/// Row indexes ordered by each row's minimum, ascending. Stable: equal
/// minimums keep row order.
pub fn rows_by_min(mat: ArrayView2<'_, f64>) -> Vec<usize> {
    let mins: Vec<f64> = mat
        .rows()
        .into_iter()
        .map(|row| row.iter().cloned().fold(f64::INFINITY, f64::min))
        .collect();

    let mut order: Vec<usize> = (0..mins.len()).collect();
    order.sort_by(|&a, &b| mins[a].partial_cmp(&mins[b]).unwrap_or(Ordering::Equal));
    order
}

/// Column of the first minimum in every row.
pub fn argmin_per_row(mat: ArrayView2<'_, f64>) -> Vec<usize> {
    mat.rows()
        .into_iter()
        .map(|row| argmin(row.iter()).unwrap_or(0))
        .collect()
}

/// Exact mean over everything pushed so far, without keeping the samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningMean<F> {
    sum: F,
    count: usize,
}

impl<F: Float> RunningMean<F> {
    pub fn new() -> Self {
        Self {
            sum: F::zero(),
            count: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, value: F) {
        self.sum = self.sum + value;
        self.count += 1;
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> Option<F> {
        if self.count == 0 {
            return None;
        }

        let n: F = NumCast::from(self.count)?;
        Some(self.sum / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn distances() {
        let a = [Centroid::new(0, 0), Centroid::new(10, 10)];
        let b = [Centroid::new(3, 4)];
        let d = distance_matrix(&a, &b);

        assert_eq!(d.dim(), (2, 1));
        assert_eq!(d[[0, 0]], 5.0);
        assert!((d[[1, 0]] - 85.0f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn rows_ordered_by_their_minimum() {
        let d = array![[9.0, 7.0], [1.0, 8.0], [3.0, 2.0]];

        assert_eq!(rows_by_min(d.view()), vec![1, 2, 0]);
        assert_eq!(argmin_per_row(d.view()), vec![1, 0, 1]);
    }

    #[test]
    fn ties_resolve_by_array_order() {
        let d = array![[4.0, 4.0], [4.0, 1.0], [1.0, 4.0]];

        assert_eq!(rows_by_min(d.view()), vec![1, 2, 0]);
        assert_eq!(argmin_per_row(d.view()), vec![0, 1, 0]);
    }

    #[test]
    fn running_mean() {
        let mut m = RunningMean::<f64>::new();
        assert_eq!(m.mean(), None);

        for y in [20.0, 62.0, 41.0] {
            m.push(y);
        }

        assert_eq!(m.count(), 3);
        assert_eq!(m.mean(), Some(41.0));
    }
}
