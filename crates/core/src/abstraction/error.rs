use std::path::PathBuf;

use thiserror::Error;

use crate::cards::CardIndex;

/// Errors surfaced by the abstraction core.
#[derive(Debug, Error)]
pub enum AbstractionError {
    /// A two-character card literal failed to parse.
    #[error("bad card string: {0:?}")]
    BadCardString(String),

    /// The same card appears twice in a deal.
    #[error("duplicate card in deal: index {0}")]
    DuplicateCardInDeal(CardIndex),

    /// A board size outside {0, 3, 4, 5} reached the bucket lookup.
    #[error("invalid board size: {0} cards (expected 0, 3, 4 or 5)")]
    InvalidBoardSize(usize),

    /// K-means was called with unusable arguments.
    #[error("k-means: {0}")]
    KMeansInvalidArgs(String),

    /// No centroid store at the configured path.
    #[error("centroid store missing: {path}")]
    CentroidStoreMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store file does not contain exactly three street records.
    #[error("centroid store truncated: {0}")]
    CentroidStoreTruncated(String),

    /// Training could not persist the centroid store.
    #[error("failed to write centroid store: {0}")]
    IoWriteFailed(#[source] std::io::Error),

    /// Other I/O failure while reading persisted state.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_macros::timed_test;

    #[timed_test]
    fn messages_carry_context() {
        let err = AbstractionError::BadCardString("Zz".to_string());
        assert!(err.to_string().contains("Zz"));

        let err = AbstractionError::InvalidBoardSize(2);
        assert!(err.to_string().contains('2'));

        let err = AbstractionError::KMeansInvalidArgs("k must be positive".to_string());
        assert!(err.to_string().contains("k must be positive"));
    }

    #[timed_test]
    fn missing_store_keeps_path_and_source() {
        let err = AbstractionError::CentroidStoreMissing {
            path: PathBuf::from("output/data/centroids.dat"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("centroids.dat"), "message was {msg:?}");
    }

    #[timed_test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AbstractionError = io.into();
        assert!(matches!(err, AbstractionError::Io(_)));
    }
}
