//! Training diagnostics.
//!
//! Summaries of the raw (pre-normalisation) training data — moments,
//! quantiles, outlier counts, histograms, correlation and principal
//! components — plus the per-iteration k-means statistics, and the text
//! formatting for the two log files the trainer writes. None of this is
//! part of the core contract; it exists so a training run can be
//! sanity-checked after the fact.

use crate::abstraction::kmeans::IterationStats;
use crate::abstraction::{FeatureMatrix, TrainingReport};

/// Bins in the per-feature histogram.
pub const HISTOGRAM_BINS: usize = 10;

/// Quantile levels reported per feature, between the minimum and maximum.
pub const QUANTILE_LEVELS: [f64; 7] = [0.01, 0.05, 0.25, 0.50, 0.75, 0.95, 0.99];

/// Distribution summary of one feature column of the raw training data.
#[derive(Debug, Clone)]
pub struct FeatureDistribution {
    pub mean: f64,
    /// Sample standard deviation (Bessel-corrected).
    pub std_dev: f64,
    pub skew: f64,
    /// Excess kurtosis.
    pub kurtosis: f64,
    pub min: f32,
    pub max: f32,
    /// Values at [`QUANTILE_LEVELS`], in order.
    pub quantiles: [f32; QUANTILE_LEVELS.len()],
    /// Samples below mean − 2σ.
    pub low_outliers: u32,
    /// Samples above mean + 2σ.
    pub high_outliers: u32,
    pub histogram: [u32; HISTOGRAM_BINS],
}

impl FeatureDistribution {
    fn empty() -> Self {
        Self {
            mean: 0.0,
            std_dev: 0.0,
            skew: 0.0,
            kurtosis: 0.0,
            min: 0.0,
            max: 0.0,
            quantiles: [0.0; QUANTILE_LEVELS.len()],
            low_outliers: 0,
            high_outliers: 0,
            histogram: [0; HISTOGRAM_BINS],
        }
    }

    /// The median (the 0.50 quantile).
    #[must_use]
    pub fn median(&self) -> f32 {
        self.quantiles[3]
    }
}

/// Summarise every feature column of a matrix.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn summarize(matrix: &FeatureMatrix) -> Vec<FeatureDistribution> {
    let dim = matrix.dim();
    let rows = matrix.len();
    let mut out = Vec::with_capacity(dim);

    for feature in 0..dim {
        let mut values: Vec<f32> = (0..rows).map(|i| matrix.row(i)[feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        if values.is_empty() {
            out.push(FeatureDistribution::empty());
            continue;
        }

        let n = values.len() as f64;
        let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / n;

        let mut m2 = 0.0f64;
        let mut m3 = 0.0f64;
        let mut m4 = 0.0f64;
        for &v in &values {
            let d = f64::from(v) - mean;
            m2 += d * d;
            m3 += d * d * d;
            m4 += d * d * d * d;
        }
        let variance = m2 / n;
        // Bessel's correction for the reported deviation.
        let std_dev = if values.len() > 1 { (m2 / (n - 1.0)).sqrt() } else { 0.0 };

        let (skew, kurtosis) = if variance > 1e-9 {
            let population_sigma = variance.sqrt();
            (
                (m3 / n) / population_sigma.powi(3),
                (m4 / n) / (variance * variance) - 3.0,
            )
        } else {
            (0.0, 0.0)
        };

        let mut quantiles = [0.0f32; QUANTILE_LEVELS.len()];
        for (slot, &level) in quantiles.iter_mut().zip(QUANTILE_LEVELS.iter()) {
            let index = ((level * n) as usize).min(values.len() - 1);
            *slot = values[index];
        }

        let low_threshold = mean - 2.0 * std_dev;
        let high_threshold = mean + 2.0 * std_dev;
        let mut low_outliers = 0u32;
        let mut high_outliers = 0u32;
        for &v in &values {
            if f64::from(v) < low_threshold {
                low_outliers += 1;
            }
            if f64::from(v) > high_threshold {
                high_outliers += 1;
            }
        }

        let min = values[0];
        let max = values[values.len() - 1];
        let range = max - min;
        let mut histogram = [0u32; HISTOGRAM_BINS];
        for &v in &values {
            let bin = if range < 1e-9 {
                0
            } else {
                (((v - min) / range) * (HISTOGRAM_BINS as f32 - 0.001))
                    .floor()
                    .clamp(0.0, HISTOGRAM_BINS as f32 - 1.0) as usize
            };
            histogram[bin] += 1;
        }

        out.push(FeatureDistribution {
            mean,
            std_dev,
            skew,
            kurtosis,
            min,
            max,
            quantiles,
            low_outliers,
            high_outliers,
            histogram,
        });
    }

    out
}

/// Sample covariance matrix (Bessel-corrected) of the feature columns.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn covariance_matrix(matrix: &FeatureMatrix) -> Vec<Vec<f64>> {
    let dim = matrix.dim();
    let rows = matrix.len();
    if rows < 2 {
        return vec![vec![0.0; dim]; dim];
    }
    let n = rows as f64;

    let means: Vec<f64> = (0..dim)
        .map(|f| (0..rows).map(|i| f64::from(matrix.row(i)[f])).sum::<f64>() / n)
        .collect();

    // Covariance sums stay in double precision.
    let mut cov = vec![vec![0.0f64; dim]; dim];
    for i in 0..rows {
        let row = matrix.row(i);
        for a in 0..dim {
            let da = f64::from(row[a]) - means[a];
            for b in a..dim {
                let db = f64::from(row[b]) - means[b];
                cov[a][b] += da * db;
            }
        }
    }
    for a in 0..dim {
        for b in a..dim {
            let value = cov[a][b] / (n - 1.0);
            cov[a][b] = value;
            cov[b][a] = value;
        }
    }
    cov
}

/// Pearson correlation matrix derived from the covariance.
#[must_use]
pub fn correlation_matrix(matrix: &FeatureMatrix) -> Vec<Vec<f64>> {
    let cov = covariance_matrix(matrix);
    let dim = cov.len();
    let mut corr = vec![vec![0.0f64; dim]; dim];
    for a in 0..dim {
        for b in 0..dim {
            let denom = (cov[a][a] * cov[b][b]).sqrt();
            corr[a][b] = if denom > 1e-12 {
                cov[a][b] / denom
            } else if a == b {
                1.0
            } else {
                0.0
            };
        }
    }
    corr
}

/// Principal-component variances of the training data: the eigenvalues of
/// the sample covariance matrix, descending.
#[must_use]
pub fn principal_components(matrix: &FeatureMatrix) -> Vec<f64> {
    symmetric_eigenvalues(covariance_matrix(matrix))
}

/// Eigenvalues of a symmetric matrix via cyclic Jacobi rotations,
/// descending. Small dimensions only (the feature space is 3 or 4 wide).
#[must_use]
pub fn symmetric_eigenvalues(mut m: Vec<Vec<f64>>) -> Vec<f64> {
    let n = m.len();
    if n == 0 {
        return Vec::new();
    }

    for _sweep in 0..100 {
        let mut off_diagonal = 0.0f64;
        for p in 0..n {
            for q in (p + 1)..n {
                off_diagonal += m[p][q] * m[p][q];
            }
        }
        if off_diagonal < 1e-22 {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if m[p][q].abs() < 1e-300 {
                    continue;
                }
                // Angle that zeroes m[p][q] after the two-sided rotation.
                let theta = 0.5 * (2.0 * m[p][q]).atan2(m[q][q] - m[p][p]);
                let (s, c) = theta.sin_cos();

                for k in 0..n {
                    let kp = m[k][p];
                    let kq = m[k][q];
                    m[k][p] = c * kp - s * kq;
                    m[k][q] = s * kp + c * kq;
                }
                for k in 0..n {
                    let pk = m[p][k];
                    let qk = m[q][k];
                    m[p][k] = c * pk - s * qk;
                    m[q][k] = s * pk + c * qk;
                }
            }
        }
    }

    let mut eigenvalues: Vec<f64> = (0..n).map(|i| m[i][i]).collect();
    eigenvalues.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    eigenvalues
}

/// Format the data-distribution report for every trained street.
#[must_use]
pub fn distribution_report(report: &TrainingReport) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out, "DATA DISTRIBUTION BEFORE CLUSTERING");
    for street in &report.streets {
        let _ = writeln!(out);
        let _ = writeln!(out, "== {} ({} samples) ==", street.street.name(), street.samples);

        let _ = writeln!(out, "moments:");
        let _ = writeln!(out, "feature, mean, stddev, skew, kurtosis");
        for (f, d) in street.distribution.iter().enumerate() {
            let _ = writeln!(
                out,
                "F{f}, {:.6}, {:.6}, {:.4}, {:.4}",
                d.mean, d.std_dev, d.skew, d.kurtosis
            );
        }

        let _ = writeln!(out, "quantiles:");
        let _ = writeln!(out, "feature, min, p1, p5, p25, median, p75, p95, p99, max");
        for (f, d) in street.distribution.iter().enumerate() {
            let qs: Vec<String> = d.quantiles.iter().map(|q| format!("{q:.6}")).collect();
            let _ = writeln!(out, "F{f}, {:.6}, {}, {:.6}", d.min, qs.join(", "), d.max);
        }

        let _ = writeln!(out, "outliers beyond two sigma:");
        for (f, d) in street.distribution.iter().enumerate() {
            let _ = writeln!(
                out,
                "F{f}: low {}, high {} of {}",
                d.low_outliers, d.high_outliers, street.samples
            );
        }

        let _ = writeln!(out, "histograms ({HISTOGRAM_BINS} equal-width bins, min..max):");
        for (f, d) in street.distribution.iter().enumerate() {
            let bins: Vec<String> = d.histogram.iter().map(ToString::to_string).collect();
            let _ = writeln!(out, "F{f}: [{}]", bins.join(", "));
        }

        let _ = writeln!(out, "correlation matrix:");
        for row in &street.correlation {
            let cells: Vec<String> = row.iter().map(|v| format!("{v:+.4}")).collect();
            let _ = writeln!(out, "  {}", cells.join("  "));
        }

        let total_variance: f64 = street
            .principal_components
            .iter()
            .filter(|&&v| v > 0.0)
            .sum();
        let _ = writeln!(out, "principal component variances:");
        for (i, &value) in street.principal_components.iter().enumerate() {
            let share = if total_variance > 0.0 {
                100.0 * value.max(0.0) / total_variance
            } else {
                0.0
            };
            let _ = writeln!(out, "PC{i}: {value:.6e} ({share:.2}%)");
        }
    }
    out
}

/// Format the k-means iteration log for every trained street.
#[must_use]
pub fn kmeans_log(report: &TrainingReport) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    for street in &report.streets {
        let _ = writeln!(
            out,
            "== {} (k = {}, n = {}) ==",
            street.street.name(),
            street.centroid_count,
            street.samples
        );
        let _ = writeln!(out, "iter, inertia, mean_shift, reseeded, smallest, largest");
        for (i, stats) in street.iterations.iter().enumerate() {
            let _ = writeln!(
                out,
                "{i}, {:.6}, {:.8}, {}, {}, {}",
                stats.inertia,
                stats.mean_shift,
                stats.reseeded,
                stats.smallest_cluster,
                stats.largest_cluster
            );
        }
        let (initial, last) = inertia_range(&street.iterations);
        let _ = writeln!(
            out,
            "summary: iterations = {}, initial inertia = {initial:.6}, final inertia = {last:.6}, reseeds = {}, converged = {}",
            street.iterations.len(),
            street.reseed_total,
            street.converged
        );
        let _ = writeln!(out);
    }
    out
}

fn inertia_range(iterations: &[IterationStats]) -> (f64, f64) {
    let initial = iterations.first().map_or(0.0, |s| s.inertia);
    let last = iterations.last().map_or(0.0, |s| s.inertia);
    (initial, last)
}
