//! Offline training pipeline.
//!
//! For each street in order: sample raw features, snapshot their
//! distribution for the report, compute and apply the z-score, cluster,
//! and collect the street record. The assembled store is persisted once at
//! the end. A fixed configuration and thread count reproduces the same
//! store byte for byte.

use crate::abstraction::diagnostics::{
    correlation_matrix, principal_components, summarize, FeatureDistribution,
};
use crate::abstraction::kmeans::{kmeans, IterationStats, KMeansParams};
use crate::abstraction::normalize::{apply_z_score, compute_stats};
use crate::abstraction::sampler::sample_street;
use crate::abstraction::{AbstractionError, CentroidStore, Street, StreetRecord};
use crate::config::AbstractionConfig;
use crate::evaluator;

/// Progress callbacks from a training run. Sampling progress arrives from
/// worker threads.
#[derive(Debug, Clone, Copy)]
pub enum TrainProgress {
    /// `done` of `total` deals sampled for a street.
    Sampling { street: Street, done: usize, total: usize },
    /// Clustering started for a street.
    Clustering { street: Street },
    /// Writing the centroid store.
    Persisting,
}

/// Per-street training summary for the diagnostic logs.
#[derive(Debug)]
pub struct StreetTraining {
    pub street: Street,
    pub samples: usize,
    pub centroid_count: usize,
    pub distribution: Vec<FeatureDistribution>,
    pub correlation: Vec<Vec<f64>>,
    /// Eigenvalues of the raw data's covariance matrix, descending.
    pub principal_components: Vec<f64>,
    pub iterations: Vec<IterationStats>,
    pub reseed_total: u32,
    pub converged: bool,
}

/// Summary of a whole training run.
#[derive(Debug)]
pub struct TrainingReport {
    pub streets: Vec<StreetTraining>,
}

/// Train centroids for all three streets and persist them to
/// `config.store_path`.
///
/// Idempotent: the same configuration and thread count rewrites an
/// identical file.
///
/// # Errors
///
/// Clustering argument errors and any I/O failure while writing the store.
pub fn generate_centroids(
    config: &AbstractionConfig,
    on_progress: &(impl Fn(TrainProgress) + Sync),
) -> Result<TrainingReport, AbstractionError> {
    evaluator::initialize();

    let mut streets = Vec::with_capacity(3);
    let flop = train_street(Street::Flop, config, on_progress, &mut streets)?;
    let turn = train_street(Street::Turn, config, on_progress, &mut streets)?;
    let river = train_street(Street::River, config, on_progress, &mut streets)?;
    let store = CentroidStore { flop, turn, river };

    on_progress(TrainProgress::Persisting);
    store.save(&config.store_path)?;

    Ok(TrainingReport { streets })
}

fn train_street(
    street: Street,
    config: &AbstractionConfig,
    on_progress: &(impl Fn(TrainProgress) + Sync),
    streets: &mut Vec<StreetTraining>,
) -> Result<StreetRecord, AbstractionError> {
    let samples = config.samples(street);

    on_progress(TrainProgress::Sampling { street, done: 0, total: samples });
    let mut matrix = sample_street(street, samples, config.sample_seed, &|done| {
        on_progress(TrainProgress::Sampling { street, done, total: samples });
    });

    let distribution = summarize(&matrix);
    let correlation = correlation_matrix(&matrix);
    let components = principal_components(&matrix);

    let stats = compute_stats(&matrix);
    apply_z_score(&mut matrix, &stats);

    on_progress(TrainProgress::Clustering { street });
    let outcome = kmeans(
        &matrix,
        &KMeansParams {
            k: config.buckets(street),
            max_iterations: config.max_iterations,
            epsilon: config.epsilon,
            seed: config.kmeans_seed,
        },
    )?;

    streets.push(StreetTraining {
        street,
        samples,
        centroid_count: outcome.centroids.len(),
        distribution,
        correlation,
        principal_components: components,
        iterations: outcome.iterations,
        reseed_total: outcome.reseed_total,
        converged: outcome.converged,
    });

    Ok(StreetRecord { stats, centroids: outcome.centroids })
}
