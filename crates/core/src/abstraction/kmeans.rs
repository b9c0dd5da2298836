//! K-means clustering (Lloyd's algorithm).
//!
//! Deterministic for a fixed seed and thread count: initialisation draws K
//! points uniformly from the data (with replacement — deliberately simple,
//! no k-means++), assignment breaks ties toward the lowest centroid index,
//! and the parallel phases reduce in worker order.
//!
//! The assignment pass is data-parallel over points with a single inertia
//! reduction. The accumulation pass writes into per-worker sum/count
//! buffers allocated once per run and reset each iteration, then merged
//! serially; centroid update, empty-cluster reseeding and the convergence
//! check are serial.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::abstraction::{AbstractionError, FeatureMatrix};

/// Clustering parameters.
#[derive(Debug, Clone)]
pub struct KMeansParams {
    /// Number of centroids.
    pub k: usize,
    /// Iteration cap; hitting it is not an error.
    pub max_iterations: usize,
    /// Stop once the mean centroid displacement falls below this.
    pub epsilon: f32,
    /// Seed for initialisation and empty-cluster reseeding.
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self { k: 8, max_iterations: 100, epsilon: 1e-6, seed: 123 }
    }
}

/// Per-iteration statistics, surfaced for the external training log.
#[derive(Debug, Clone)]
pub struct IterationStats {
    /// Sum of squared distances from each point to its centroid.
    pub inertia: f64,
    /// Mean Euclidean displacement of centroids vs the previous iteration.
    pub mean_shift: f32,
    /// Empty clusters reseeded this iteration.
    pub reseeded: u32,
    /// Smallest cluster population after assignment.
    pub smallest_cluster: usize,
    /// Largest cluster population after assignment.
    pub largest_cluster: usize,
}

/// Result of a clustering run.
#[derive(Debug)]
pub struct KMeansOutcome {
    /// Final centroids, `k × dim`.
    pub centroids: FeatureMatrix,
    /// Statistics per completed iteration.
    pub iterations: Vec<IterationStats>,
    /// Total empty-cluster reseeds across the run.
    pub reseed_total: u32,
    /// Whether the displacement threshold was reached before the cap.
    pub converged: bool,
}

/// Scratch buffers for one worker's accumulation pass, allocated once per
/// run and zeroed by reset each iteration.
struct WorkerScratch {
    sums: Vec<f64>,
    counts: Vec<u32>,
}

/// Cluster `data` into `params.k` centroids.
///
/// # Errors
///
/// [`AbstractionError::KMeansInvalidArgs`] when the data is empty, `k` is
/// zero, or `k` exceeds the number of points.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn kmeans(data: &FeatureMatrix, params: &KMeansParams) -> Result<KMeansOutcome, AbstractionError> {
    let n = data.len();
    let dim = data.dim();
    let k = params.k;

    if n == 0 {
        return Err(AbstractionError::KMeansInvalidArgs("data is empty".to_string()));
    }
    if k == 0 {
        return Err(AbstractionError::KMeansInvalidArgs("k must be positive".to_string()));
    }
    if k > n {
        return Err(AbstractionError::KMeansInvalidArgs(format!(
            "k ({k}) cannot exceed the number of points ({n})"
        )));
    }

    let mut rng = StdRng::seed_from_u64(params.seed);

    // Random initialisation from the data, replacement permitted.
    let mut centroids = FeatureMatrix::zeros(k, dim);
    for c in 0..k {
        let pick = rng.gen_range(0..n);
        centroids.flat_mut()[c * dim..(c + 1) * dim].copy_from_slice(data.row(pick));
    }
    let mut previous = centroids.clone();

    let workers = rayon::current_num_threads().max(1);
    let rows_per_worker = n.div_ceil(workers).max(1);
    let mut scratch: Vec<WorkerScratch> = (0..n.div_ceil(rows_per_worker))
        .map(|_| WorkerScratch { sums: vec![0.0; k * dim], counts: vec![0; k] })
        .collect();

    let mut assignments = vec![0u16; n];
    let mut iterations = Vec::new();
    let mut reseed_total = 0u32;
    let mut converged = false;

    for _ in 0..params.max_iterations {
        // Assignment: each point to its nearest centroid, lowest index on
        // ties, with the iteration inertia as the only reduction.
        let inertia: f64 = assignments
            .par_chunks_mut(rows_per_worker)
            .enumerate()
            .map(|(worker, slot)| {
                let base = worker * rows_per_worker;
                let mut local = 0.0f64;
                for (offset, assignment) in slot.iter_mut().enumerate() {
                    let (best, dist) = nearest_centroid(data.row(base + offset), &centroids);
                    *assignment = best as u16;
                    local += f64::from(dist);
                }
                local
            })
            .sum();

        // Accumulation: per-worker partial sums in f64, then a serial merge.
        scratch.par_iter_mut().enumerate().for_each(|(worker, s)| {
            s.sums.fill(0.0);
            s.counts.fill(0);
            let start = worker * rows_per_worker;
            let end = (start + rows_per_worker).min(n);
            for i in start..end {
                let cluster = assignments[i] as usize;
                s.counts[cluster] += 1;
                for (d, &value) in data.row(i).iter().enumerate() {
                    s.sums[cluster * dim + d] += f64::from(value);
                }
            }
        });

        let mut sums = vec![0.0f64; k * dim];
        let mut counts = vec![0u32; k];
        for s in &scratch {
            for (total, &part) in sums.iter_mut().zip(&s.sums) {
                *total += part;
            }
            for (total, &part) in counts.iter_mut().zip(&s.counts) {
                *total += part;
            }
        }

        // Update: mean of members, or reseed an empty cluster from a random
        // point.
        let mut reseeded = 0u32;
        for c in 0..k {
            let slot = &mut centroids.flat_mut()[c * dim..(c + 1) * dim];
            if counts[c] == 0 {
                slot.copy_from_slice(data.row(rng.gen_range(0..n)));
                reseeded += 1;
            } else {
                for (d, value) in slot.iter_mut().enumerate() {
                    *value = (sums[c * dim + d] / f64::from(counts[c])) as f32;
                }
            }
        }
        reseed_total += reseeded;

        // Convergence: mean displacement against the previous centroids.
        let mut total_shift = 0.0f32;
        for c in 0..k {
            let mut dist_sq = 0.0f32;
            for (a, b) in centroids.row(c).iter().zip(previous.row(c)) {
                let diff = a - b;
                dist_sq += diff * diff;
            }
            total_shift += dist_sq.sqrt();
        }
        let mean_shift = total_shift / k as f32;

        let populated: Vec<u32> = counts.iter().copied().filter(|&c| c > 0).collect();
        iterations.push(IterationStats {
            inertia,
            mean_shift,
            reseeded,
            smallest_cluster: populated.iter().min().copied().unwrap_or(0) as usize,
            largest_cluster: populated.iter().max().copied().unwrap_or(0) as usize,
        });

        if mean_shift < params.epsilon {
            converged = true;
            break;
        }
        previous
            .flat_mut()
            .copy_from_slice(centroids.flat());
    }

    Ok(KMeansOutcome { centroids, iterations, reseed_total, converged })
}

/// Index and squared distance of the nearest centroid; strict comparison
/// keeps the lowest index on ties.
pub(crate) fn nearest_centroid(point: &[f32], centroids: &FeatureMatrix) -> (usize, f32) {
    let mut best = 0;
    let mut best_dist = f32::MAX;
    for c in 0..centroids.len() {
        let mut dist = 0.0f32;
        for (a, b) in point.iter().zip(centroids.row(c)) {
            let diff = a - b;
            dist += diff * diff;
        }
        if dist < best_dist {
            best_dist = dist;
            best = c;
        }
    }
    (best, best_dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_macros::timed_test;

    fn two_blobs() -> FeatureMatrix {
        // Four points hugging the origin, four hugging (10,10,10,10).
        let mut flat = Vec::new();
        for delta in [0.0f32, 0.1, -0.1, 0.05] {
            flat.extend_from_slice(&[delta, delta, delta, delta]);
        }
        for delta in [0.0f32, 0.1, -0.1, 0.05] {
            flat.extend_from_slice(&[10.0 + delta, 10.0 + delta, 10.0 + delta, 10.0 + delta]);
        }
        FeatureMatrix::from_flat(4, flat)
    }

    #[timed_test]
    fn rejects_bad_arguments() {
        let empty = FeatureMatrix::zeros(0, 3);
        assert!(matches!(
            kmeans(&empty, &KMeansParams { k: 2, ..KMeansParams::default() }),
            Err(AbstractionError::KMeansInvalidArgs(_))
        ));

        let data = FeatureMatrix::zeros(4, 3);
        assert!(matches!(
            kmeans(&data, &KMeansParams { k: 0, ..KMeansParams::default() }),
            Err(AbstractionError::KMeansInvalidArgs(_))
        ));
        assert!(matches!(
            kmeans(&data, &KMeansParams { k: 5, ..KMeansParams::default() }),
            Err(AbstractionError::KMeansInvalidArgs(_))
        ));
    }

    #[timed_test(30)]
    fn splits_two_well_separated_blobs() {
        let data = two_blobs();
        let outcome = kmeans(
            &data,
            &KMeansParams { k: 2, max_iterations: 100, epsilon: 1e-6, seed: 123 },
        )
        .unwrap();

        assert_eq!(outcome.centroids.len(), 2);
        // Each blob's mean is (0.0125, ...) resp. (10.0125, ...).
        let mut found_low = false;
        let mut found_high = false;
        for c in 0..2 {
            let row = outcome.centroids.row(c);
            if (row[0] - 0.0125).abs() < 1e-2 {
                found_low = true;
            }
            if (row[0] - 10.0125).abs() < 1e-2 {
                found_high = true;
            }
        }
        assert!(found_low && found_high, "centroids: {:?}", outcome.centroids);
    }

    #[timed_test(30)]
    fn single_cluster_lands_on_the_grand_mean() {
        let data = two_blobs();
        let outcome = kmeans(
            &data,
            &KMeansParams { k: 1, max_iterations: 50, epsilon: 1e-6, seed: 7 },
        )
        .unwrap();
        for &value in outcome.centroids.row(0) {
            assert!((value - 5.0125).abs() < 1e-3, "grand mean expected, got {value}");
        }
        assert!(outcome.converged);
    }

    #[timed_test(30)]
    fn same_seed_reproduces_the_run() {
        let data = two_blobs();
        let params = KMeansParams { k: 3, max_iterations: 40, epsilon: 0.0, seed: 99 };
        let a = kmeans(&data, &params).unwrap();
        let b = kmeans(&data, &params).unwrap();
        assert_eq!(a.centroids, b.centroids);
        assert_eq!(a.reseed_total, b.reseed_total);
    }

    #[timed_test(30)]
    fn iteration_stats_are_recorded() {
        let data = two_blobs();
        let outcome = kmeans(
            &data,
            &KMeansParams { k: 2, max_iterations: 100, epsilon: 1e-6, seed: 123 },
        )
        .unwrap();
        assert!(!outcome.iterations.is_empty());
        let last = outcome.iterations.last().unwrap();
        assert!(last.inertia.is_finite());
        assert!(last.smallest_cluster >= 1);
        assert!(last.largest_cluster <= 8);
    }

    #[timed_test]
    fn nearest_centroid_breaks_ties_low() {
        let centroids = FeatureMatrix::from_flat(2, vec![1.0, 0.0, 1.0, 0.0, 3.0, 0.0]);
        let (index, dist) = nearest_centroid(&[1.0, 0.0], &centroids);
        assert_eq!(index, 0, "equal-distance tie must pick the lowest index");
        assert!(dist.abs() < 1e-12);
    }
}
