//! Runtime bucket lookup.
//!
//! Wraps a loaded [`CentroidStore`] and maps `(hand, board)` to a bucket
//! ID: the preflop formula for an empty board, otherwise the street's raw
//! features, the persisted z-score and a nearest-centroid search. Lookups
//! are pure reads over frozen state and safe from any thread.

use std::path::Path;

use crate::abstraction::kmeans::nearest_centroid;
use crate::abstraction::preflop::preflop_bucket;
use crate::abstraction::{raw_features, AbstractionError, CentroidStore, Street};
use crate::cards::CardIndex;

/// Identifier of a strategy-sharing equivalence class: `[0, 168]` preflop,
/// `[0, K-1]` for the street's centroid count postflop.
pub type BucketId = u16;

/// Nearest-centroid bucketer over a frozen centroid store.
#[derive(Debug, Clone)]
pub struct HandBucketer {
    store: CentroidStore,
}

impl HandBucketer {
    /// Wrap an already-loaded store.
    #[must_use]
    pub fn new(store: CentroidStore) -> Self {
        Self { store }
    }

    /// Load the store from disk.
    ///
    /// # Errors
    ///
    /// Propagates [`CentroidStore::load`] failures.
    pub fn load(path: &Path) -> Result<Self, AbstractionError> {
        Ok(Self::new(CentroidStore::load(path)?))
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &CentroidStore {
        &self.store
    }

    /// Bucket count for a street.
    #[must_use]
    pub fn bucket_count(&self, street: Street) -> usize {
        self.store.record(street).centroid_count()
    }

    /// Map a deal to its bucket ID.
    ///
    /// An empty board is preflop; boards of 3, 4 and 5 cards select flop,
    /// turn and river. Hand and board must be distinct valid card indices
    /// (debug-checked; release builds assume the caller).
    ///
    /// # Errors
    ///
    /// [`AbstractionError::InvalidBoardSize`] for any other board length.
    #[allow(clippy::cast_possible_truncation)]
    pub fn bucket(
        &self,
        hand: [CardIndex; 2],
        board: &[CardIndex],
    ) -> Result<BucketId, AbstractionError> {
        if board.is_empty() {
            return Ok(preflop_bucket(hand));
        }
        let street = Street::from_board_len(board.len())?;
        let record = self.store.record(street);
        debug_assert_eq!(
            record.dim(),
            street.feature_dim(),
            "store dimension does not match the {} extractor",
            street.name()
        );

        let mut features = raw_features(street, hand, board);
        record.stats.apply(&mut features);

        let (best, _) = nearest_centroid(&features, &record.centroids);
        Ok(best as BucketId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::normalize::FeatureStats;
    use crate::abstraction::{FeatureMatrix, StreetRecord};
    use crate::cards::parse_hand;
    use test_macros::timed_test;

    /// A store whose river record has identity normalisation and centroids
    /// planted at known equity levels, so bucket IDs are predictable.
    fn planted_store() -> CentroidStore {
        let identity = |d: usize| FeatureStats {
            mean: vec![0.0; d],
            std_dev: vec![1.0; d],
        };
        CentroidStore {
            flop: StreetRecord {
                stats: identity(3),
                centroids: FeatureMatrix::from_flat(3, vec![0.2, 0.0, 0.1, 0.8, 0.0, 0.3]),
            },
            turn: StreetRecord {
                stats: identity(3),
                centroids: FeatureMatrix::from_flat(3, vec![0.25, 0.0, 0.1, 0.75, 0.0, 0.3]),
            },
            river: StreetRecord {
                stats: identity(4),
                // Bucket 0: crushed. Bucket 1: middling. Bucket 2: the nuts.
                centroids: FeatureMatrix::from_flat(
                    4,
                    vec![
                        0.1, 0.0, 0.2, 0.0, //
                        0.5, 0.2, 0.6, 0.0, //
                        1.0, 1.0, 1.0, 0.3,
                    ],
                ),
            },
        }
    }

    #[timed_test]
    fn empty_board_routes_to_preflop() {
        let bucketer = HandBucketer::new(planted_store());
        let hand = parse_hand("AsKs").unwrap();
        assert_eq!(bucketer.bucket(hand, &[]).unwrap(), 90);
    }

    #[timed_test]
    fn rejects_bad_board_sizes() {
        let bucketer = HandBucketer::new(planted_store());
        let hand = parse_hand("AsKs").unwrap();
        for bad in [1usize, 2, 6] {
            let board: Vec<u8> = (10..10 + bad as u8).collect();
            assert!(matches!(
                bucketer.bucket(hand, &board),
                Err(AbstractionError::InvalidBoardSize(n)) if n == bad
            ));
        }
    }

    #[timed_test(10)]
    fn royal_river_lands_in_the_nut_bucket() {
        let bucketer = HandBucketer::new(planted_store());
        let hand = parse_hand("AsKs").unwrap();
        let board: Vec<u8> = ["Qs", "Js", "Ts", "2d", "3c"]
            .iter()
            .map(|c| crate::cards::parse_card(c).unwrap())
            .collect();
        assert_eq!(bucketer.bucket(hand, &board).unwrap(), 2);
    }

    #[timed_test(10)]
    fn air_river_lands_in_the_bottom_bucket() {
        let bucketer = HandBucketer::new(planted_store());
        let hand = parse_hand("7h2c").unwrap();
        let board: Vec<u8> = ["As", "Ks", "Qs", "Js", "9d"]
            .iter()
            .map(|c| crate::cards::parse_card(c).unwrap())
            .collect();
        assert_eq!(bucketer.bucket(hand, &board).unwrap(), 0);
    }

    #[timed_test(10)]
    fn repeated_lookups_are_stable() {
        let bucketer = HandBucketer::new(planted_store());
        let hand = parse_hand("TsTd").unwrap();
        let board: Vec<u8> = ["9c", "5s", "2h", "Kd", "7c"]
            .iter()
            .map(|c| crate::cards::parse_card(c).unwrap())
            .collect();
        let first = bucketer.bucket(hand, &board).unwrap();
        for _ in 0..10 {
            assert_eq!(bucketer.bucket(hand, &board).unwrap(), first);
        }
    }
}
