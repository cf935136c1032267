//! Association of existing identities (rows) with new centroids (columns).
//!
//! A matcher only pairs indexes of a distance matrix. Registering,
//! disappearing and retiring identities stays in the tracker, so every
//! matcher gets the same growth/shrink behavior for free.

use munkres::{solve_assignment, WeightMatrix};
use ndarray::ArrayView2;

use crate::error::Error;
use crate::math;

/// Cost given to pairs that may never be matched and to padding cells.
const GATED_COST: f64 = 1.0e9;

pub trait Matcher {
    /// Pairs `(row, column)` with every row and every column used at most
    /// once and no pair farther apart than `max_distance`.
    fn assign(&self, dist: ArrayView2<'_, f64>, max_distance: f64)
        -> Result<Vec<(usize, usize)>, Error>;
}

/// Nearest-neighbor matching: identities whose closest centroid is nearest
/// pick first, each taking its own closest centroid if still free.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyMatcher;

impl Matcher for GreedyMatcher {
    fn assign(
        &self,
        dist: ArrayView2<'_, f64>,
        max_distance: f64,
    ) -> Result<Vec<(usize, usize)>, Error> {
        let (nrows, ncols) = dist.dim();
        if nrows == 0 || ncols == 0 {
            return Ok(Vec::new());
        }

        let rows = math::rows_by_min(dist);
        let nearest = math::argmin_per_row(dist);
        let cols: Vec<usize> = rows.iter().map(|&r| nearest[r]).collect();

        let mut used_rows = vec![false; nrows];
        let mut used_cols = vec![false; ncols];
        let mut pairs = Vec::with_capacity(nrows.min(ncols));

        for (row, col) in rows.into_iter().zip(cols) {
            if used_rows[row] || used_cols[col] {
                continue;
            }

            if dist[[row, col]] > max_distance {
                continue;
            }

            used_rows[row] = true;
            used_cols[col] = true;
            pairs.push((row, col));
        }

        Ok(pairs)
    }
}

/// Minimum total distance assignment (Hungarian algorithm).
#[derive(Debug, Clone, Copy, Default)]
pub struct MunkresMatcher;

impl Matcher for MunkresMatcher {
    fn assign(
        &self,
        dist: ArrayView2<'_, f64>,
        max_distance: f64,
    ) -> Result<Vec<(usize, usize)>, Error> {
        let (nrows, ncols) = dist.dim();
        if nrows == 0 || ncols == 0 {
            return Ok(Vec::new());
        }

        let n = nrows.max(ncols);
        let mut weights = Vec::with_capacity(n * n);

        for r in 0..n {
            for c in 0..n {
                let w = if r < nrows && c < ncols && dist[[r, c]] <= max_distance {
                    dist[[r, c]]
                } else {
                    GATED_COST
                };

                weights.push(w);
            }
        }

        let mut mat = WeightMatrix::from_row_vec(n, weights);
        let solution =
            solve_assignment(&mut mat).map_err(|err| Error::Assignment(format!("{:?}", err)))?;

        let mut pairs: Vec<(usize, usize)> = solution
            .into_iter()
            .filter(|p| p.row < nrows && p.column < ncols)
            .filter(|p| dist[[p.row, p.column]] <= max_distance)
            .map(|p| (p.row, p.column))
            .collect();

        pairs.sort_unstable();
        Ok(pairs)
    }
}
