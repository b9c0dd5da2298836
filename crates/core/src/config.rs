//! Training configuration.
//!
//! Loadable from a YAML file; every field has a default so the zero-config
//! trainer invocation works out of the box.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::abstraction::Street;

/// Parameters of a centroid training run.
#[derive(Debug, Clone, Deserialize)]
pub struct AbstractionConfig {
    /// Cluster count per street.
    #[serde(default = "default_flop_buckets")]
    pub flop_buckets: usize,
    #[serde(default = "default_turn_buckets")]
    pub turn_buckets: usize,
    #[serde(default = "default_river_buckets")]
    pub river_buckets: usize,

    /// Training sample count per street.
    #[serde(default = "default_flop_samples")]
    pub flop_samples: usize,
    #[serde(default = "default_turn_samples")]
    pub turn_samples: usize,
    #[serde(default = "default_river_samples")]
    pub river_samples: usize,

    /// K-means iteration cap.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// K-means convergence threshold on the mean centroid displacement.
    #[serde(default = "default_epsilon")]
    pub epsilon: f32,

    /// Base seed for the sampling workers (worker `w` uses `seed + w`).
    #[serde(default = "default_sample_seed")]
    pub sample_seed: u64,
    /// Seed for k-means initialisation and reseeding.
    #[serde(default = "default_kmeans_seed")]
    pub kmeans_seed: u64,

    /// Where the centroid store is written and loaded from.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_flop_buckets() -> usize {
    15
}
fn default_turn_buckets() -> usize {
    20
}
fn default_river_buckets() -> usize {
    50
}
fn default_flop_samples() -> usize {
    200_000
}
fn default_turn_samples() -> usize {
    200_000
}
fn default_river_samples() -> usize {
    150_000
}
fn default_max_iterations() -> usize {
    100
}
fn default_epsilon() -> f32 {
    1e-6
}
fn default_sample_seed() -> u64 {
    100
}
fn default_kmeans_seed() -> u64 {
    123
}
fn default_store_path() -> PathBuf {
    PathBuf::from("output/data/centroids.dat")
}

impl Default for AbstractionConfig {
    fn default() -> Self {
        Self {
            flop_buckets: default_flop_buckets(),
            turn_buckets: default_turn_buckets(),
            river_buckets: default_river_buckets(),
            flop_samples: default_flop_samples(),
            turn_samples: default_turn_samples(),
            river_samples: default_river_samples(),
            max_iterations: default_max_iterations(),
            epsilon: default_epsilon(),
            sample_seed: default_sample_seed(),
            kmeans_seed: default_kmeans_seed(),
            store_path: default_store_path(),
        }
    }
}

impl AbstractionConfig {
    /// Load a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read, parsed, or fails
    /// validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_yaml(&content)
    }

    /// Parse a configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error when the YAML is invalid or fails validation.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the parameters for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for street in Street::ALL {
            if self.buckets(street) == 0 {
                return Err(ConfigError::ZeroBuckets(street.name()));
            }
            if self.samples(street) < self.buckets(street) {
                return Err(ConfigError::TooFewSamples {
                    street: street.name(),
                    samples: self.samples(street),
                    buckets: self.buckets(street),
                });
            }
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(ConfigError::BadEpsilon(self.epsilon));
        }
        Ok(())
    }

    /// Sample count for a street.
    #[must_use]
    pub fn samples(&self, street: Street) -> usize {
        match street {
            Street::Flop => self.flop_samples,
            Street::Turn => self.turn_samples,
            Street::River => self.river_samples,
        }
    }

    /// Bucket count for a street.
    #[must_use]
    pub fn buckets(&self, street: Street) -> usize {
        match street {
            Street::Flop => self.flop_buckets,
            Street::Turn => self.turn_buckets,
            Street::River => self.river_buckets,
        }
    }
}

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0} bucket count must be positive")]
    ZeroBuckets(&'static str),

    #[error("{street} has {samples} samples for {buckets} buckets; need at least one per bucket")]
    TooFewSamples {
        street: &'static str,
        samples: usize,
        buckets: usize,
    },

    #[error("max_iterations must be positive")]
    ZeroIterations,

    #[error("epsilon must be positive, got {0}")]
    BadEpsilon(f32),
}
