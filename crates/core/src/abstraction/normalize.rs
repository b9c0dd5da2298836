//! Feature normalisation.
//!
//! Two passes per feature column: mean, then population standard
//! deviation, both accumulated in `f64` to suppress round-off over large
//! training sets. Z-scoring is applied in place and skips columns whose
//! deviation is effectively zero, leaving them unscaled. The same recorded
//! statistics normalise runtime queries, never recomputed ones.

use crate::abstraction::FeatureMatrix;

/// A column's standard deviation must clear this before z-scoring divides
/// by it.
pub const STD_EPSILON: f32 = 1e-9;

/// Per-feature normalisation statistics, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStats {
    pub mean: Vec<f32>,
    pub std_dev: Vec<f32>,
}

impl FeatureStats {
    /// Feature dimension these statistics cover.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Z-score a single vector in place with the recorded statistics.
    pub fn apply(&self, row: &mut [f32]) {
        debug_assert_eq!(row.len(), self.dim());
        for (value, (&mean, &std_dev)) in
            row.iter_mut().zip(self.mean.iter().zip(self.std_dev.iter()))
        {
            if std_dev > STD_EPSILON {
                *value = (*value - mean) / std_dev;
            }
        }
    }
}

/// Compute per-column mean and population standard deviation.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn compute_stats(matrix: &FeatureMatrix) -> FeatureStats {
    let dim = matrix.dim();
    let rows = matrix.len();
    if rows == 0 {
        return FeatureStats { mean: vec![0.0; dim], std_dev: vec![0.0; dim] };
    }

    let mut sums = vec![0.0f64; dim];
    for i in 0..rows {
        for (sum, &value) in sums.iter_mut().zip(matrix.row(i)) {
            *sum += f64::from(value);
        }
    }
    let means: Vec<f64> = sums.iter().map(|s| s / rows as f64).collect();

    let mut squares = vec![0.0f64; dim];
    for i in 0..rows {
        for ((square, &mean), &value) in
            squares.iter_mut().zip(means.iter()).zip(matrix.row(i))
        {
            let diff = f64::from(value) - mean;
            *square += diff * diff;
        }
    }

    FeatureStats {
        mean: means.iter().map(|&m| m as f32).collect(),
        std_dev: squares
            .iter()
            .map(|&s| (s / rows as f64).sqrt() as f32)
            .collect(),
    }
}

/// Z-score every row of the matrix in place.
pub fn apply_z_score(matrix: &mut FeatureMatrix, stats: &FeatureStats) {
    let dim = matrix.dim();
    debug_assert_eq!(dim, stats.dim());
    for row in matrix.flat_mut().chunks_mut(dim) {
        stats.apply(row);
    }
}
