//! Hand abstraction: per-street feature extraction, offline clustering and
//! runtime bucket lookup.
//!
//! The offline path samples random deals, extracts per-street feature
//! vectors by exhaustive enumeration, z-scores them, clusters with k-means
//! and persists the centroids. The runtime path recomputes the features for
//! a concrete `(hand, board)`, applies the persisted normalisation and
//! returns the nearest centroid's index as the bucket ID. Preflop bypasses
//! all of it with a closed-form 169-class mapping.

mod bucketer;
pub mod diagnostics;
mod error;
mod flop;
pub mod kmeans;
pub mod normalize;
mod pipeline;
mod preflop;
mod river;
pub mod sampler;
mod store;
mod turn;

pub use bucketer::{BucketId, HandBucketer};
pub use error::AbstractionError;
pub use flop::flop_features;
pub use pipeline::{generate_centroids, StreetTraining, TrainProgress, TrainingReport};
pub use preflop::{preflop_bucket, PREFLOP_BUCKETS};
pub use river::river_features;
pub use store::{CentroidStore, StreetRecord};
pub use turn::turn_features;

use crate::cards::{encoded, CardIndex, DECK_SIZE};
use crate::evaluator::HandRank;

/// Postflop street, selected by board size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Street {
    Flop,
    Turn,
    River,
}

impl Street {
    /// All streets in training and store order.
    pub const ALL: [Street; 3] = [Street::Flop, Street::Turn, Street::River];

    /// Select the street for a board size.
    ///
    /// # Errors
    ///
    /// Returns [`AbstractionError::InvalidBoardSize`] unless `len` is 3, 4
    /// or 5.
    pub fn from_board_len(len: usize) -> Result<Self, AbstractionError> {
        match len {
            3 => Ok(Street::Flop),
            4 => Ok(Street::Turn),
            5 => Ok(Street::River),
            n => Err(AbstractionError::InvalidBoardSize(n)),
        }
    }

    /// Number of community cards on this street.
    #[must_use]
    pub const fn board_cards(self) -> usize {
        match self {
            Street::Flop => 3,
            Street::Turn => 4,
            Street::River => 5,
        }
    }

    /// Width of this street's feature vector.
    #[must_use]
    pub const fn feature_dim(self) -> usize {
        match self {
            Street::Flop | Street::Turn => 3,
            Street::River => 4,
        }
    }

    /// Display name, lower case.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Street::Flop => "flop",
            Street::Turn => "turn",
            Street::River => "river",
        }
    }
}

/// Ranks above this are trips or better; the nut-potential ceiling on the
/// flop and turn.
pub const TRIPS_RANK_FLOOR: HandRank = 4995;

/// Ranks above this are two pair or better; the river's strong/weak split.
pub const TWO_PAIR_RANK_FLOOR: HandRank = 4138;

/// Flop and turn feature vector: strength plus drawing character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrengthFeatures {
    /// Effective hand strength: current equity adjusted by positive and
    /// negative potential over the remaining runouts.
    pub ehs: f32,
    /// Signed draw balance in `[-1, 1]`: positive when upside potential
    /// dominates the risk of being outdrawn.
    pub asymmetry: f32,
    /// Fraction of remaining runouts where the hero holds trips or better.
    pub nut_potential: f32,
}

impl StrengthFeatures {
    pub(crate) fn write_into(self, out: &mut [f32]) {
        out[0] = self.ehs;
        out[1] = self.asymmetry;
        out[2] = self.nut_potential;
    }
}

/// River feature vector: realised equity split by opponent strength, plus
/// the blocker effect of the hero's hole cards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiverFeatures {
    /// Equity against a uniform random opponent hand.
    pub equity_total: f32,
    /// Equity restricted to opponent combos holding two pair or better.
    pub equity_vs_strong: f32,
    /// Equity restricted to the remaining (weak) combos.
    pub equity_vs_weak: f32,
    /// How much the hero's cards reduce the opponent's strong combos
    /// relative to the board-only reference distribution, in `[-1, 1]`.
    pub blocker_index: f32,
}

impl RiverFeatures {
    pub(crate) fn write_into(self, out: &mut [f32]) {
        out[0] = self.equity_total;
        out[1] = self.equity_vs_strong;
        out[2] = self.equity_vs_weak;
        out[3] = self.blocker_index;
    }
}

/// Compute the raw (unnormalised) feature vector for a street.
///
/// `board` must carry exactly `street.board_cards()` cards; hand and board
/// must be disjoint valid indices.
#[must_use]
pub fn raw_features(street: Street, hand: [CardIndex; 2], board: &[CardIndex]) -> Vec<f32> {
    let mut out = vec![0.0f32; street.feature_dim()];
    match street {
        Street::Flop => {
            flop_features(hand, [board[0], board[1], board[2]]).write_into(&mut out);
        }
        Street::Turn => {
            turn_features(hand, [board[0], board[1], board[2], board[3]]).write_into(&mut out);
        }
        Street::River => {
            river_features(hand, [board[0], board[1], board[2], board[3], board[4]])
                .write_into(&mut out);
        }
    }
    out
}

/// Row-major `f32` feature storage with a fixed column count.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    dim: usize,
    data: Vec<f32>,
}

impl FeatureMatrix {
    /// A zero-filled matrix of `rows × dim`.
    #[must_use]
    pub fn zeros(rows: usize, dim: usize) -> Self {
        Self { dim, data: vec![0.0; rows * dim] }
    }

    /// Build from a flat row-major buffer. `data.len()` must be a multiple
    /// of `dim`.
    #[must_use]
    pub fn from_flat(dim: usize, data: Vec<f32>) -> Self {
        assert!(dim > 0 && data.len() % dim == 0, "flat data is not row-aligned");
        Self { dim, data }
    }

    /// Feature dimension (column count).
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    /// True when the matrix holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// One row as a slice.
    #[must_use]
    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.dim..(index + 1) * self.dim]
    }

    /// The flat row-major buffer.
    #[must_use]
    pub fn flat(&self) -> &[f32] {
        &self.data
    }

    /// The flat row-major buffer, mutable.
    pub fn flat_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

/// Comparison outcome from the hero's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandState {
    Ahead = 0,
    Tied = 1,
    Behind = 2,
}

impl HandState {
    pub(crate) fn compare(hero: HandRank, villain: HandRank) -> Self {
        match hero.cmp(&villain) {
            std::cmp::Ordering::Greater => HandState::Ahead,
            std::cmp::Ordering::Equal => HandState::Tied,
            std::cmp::Ordering::Less => HandState::Behind,
        }
    }
}

/// Showdown-state counters shared by the flop and turn extractors: per
/// opponent pair the current state, and per runout the current→final
/// transition.
#[derive(Debug, Default)]
pub(crate) struct PotentialTally {
    current: [u32; 3],
    transitions: [[u32; 3]; 3],
}

impl PotentialTally {
    pub(crate) fn record_current(&mut self, state: HandState) {
        self.current[state as usize] += 1;
    }

    pub(crate) fn record_runout(&mut self, current: HandState, fin: HandState) {
        self.transitions[current as usize][fin as usize] += 1;
    }

    /// Current hand strength, ties counting half.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn hand_strength(&self) -> f32 {
        let [ahead, tied, behind] = self.current;
        let total = ahead + tied + behind;
        if total == 0 {
            return 0.0;
        }
        (ahead as f32 + 0.5 * tied as f32) / total as f32
    }

    /// Probability of improving from behind/tied to ahead, normalised per
    /// opponent pair by `runouts_per_pair`.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn positive_potential(&self, runouts_per_pair: f32) -> f32 {
        let hp = &self.transitions;
        let denominator =
            (self.current[HandState::Behind as usize] + self.current[HandState::Tied as usize]) as f32;
        if denominator <= 0.0 {
            return 0.0;
        }
        let gained = hp[HandState::Behind as usize][HandState::Ahead as usize] as f32
            + 0.5 * hp[HandState::Behind as usize][HandState::Tied as usize] as f32
            + 0.5 * hp[HandState::Tied as usize][HandState::Ahead as usize] as f32;
        gained / (denominator * runouts_per_pair)
    }

    /// Probability of falling from ahead/tied to behind, normalised per
    /// opponent pair by `runouts_per_pair`.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn negative_potential(&self, runouts_per_pair: f32) -> f32 {
        let hp = &self.transitions;
        let denominator =
            (self.current[HandState::Ahead as usize] + self.current[HandState::Tied as usize]) as f32;
        if denominator <= 0.0 {
            return 0.0;
        }
        let lost = hp[HandState::Ahead as usize][HandState::Behind as usize] as f32
            + 0.5 * hp[HandState::Ahead as usize][HandState::Tied as usize] as f32
            + 0.5 * hp[HandState::Tied as usize][HandState::Behind as usize] as f32;
        lost / (denominator * runouts_per_pair)
    }
}

const ASYMMETRY_EPSILON: f32 = 1e-6;

/// Effective hand strength: current strength plus expected swing.
pub(crate) fn effective_hand_strength(hs: f32, ppot: f32, npot: f32) -> f32 {
    hs + (1.0 - hs) * ppot - hs * npot
}

/// Signed, unit-bounded balance between drawing upside and downside.
pub(crate) fn asymmetry(hs: f32, ppot: f32, npot: f32) -> f32 {
    let upside = (1.0 - hs) * ppot;
    let downside = hs * npot;
    ((upside - downside) / (upside + downside + ASYMMETRY_EPSILON)).clamp(-1.0, 1.0)
}

/// Bitmask with one bit per used card index.
pub(crate) fn used_mask(cards: &[CardIndex]) -> u64 {
    let mut mask = 0u64;
    for &card in cards {
        debug_assert!((card as usize) < DECK_SIZE, "card index out of range: {card}");
        debug_assert!(mask & (1u64 << card) == 0, "duplicate card in deal: {card}");
        mask |= 1u64 << card;
    }
    mask
}

/// Card indices not present in `used`, ascending.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn live_cards(used: u64) -> Vec<CardIndex> {
    (0..DECK_SIZE as CardIndex)
        .filter(|&c| used & (1u64 << c) == 0)
        .collect()
}

/// Encode a hole pair for evaluation.
pub(crate) fn encoded_pair(hand: [CardIndex; 2]) -> [crate::cards::Card; 2] {
    [encoded(hand[0]), encoded(hand[1])]
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_macros::timed_test;

    #[timed_test]
    fn street_from_board_len() {
        assert_eq!(Street::from_board_len(3).unwrap(), Street::Flop);
        assert_eq!(Street::from_board_len(4).unwrap(), Street::Turn);
        assert_eq!(Street::from_board_len(5).unwrap(), Street::River);
        assert!(matches!(
            Street::from_board_len(2),
            Err(AbstractionError::InvalidBoardSize(2))
        ));
        assert!(Street::from_board_len(0).is_err());
        assert!(Street::from_board_len(6).is_err());
    }

    #[timed_test]
    fn street_dimensions() {
        assert_eq!(Street::Flop.feature_dim(), 3);
        assert_eq!(Street::Turn.feature_dim(), 3);
        assert_eq!(Street::River.feature_dim(), 4);
        assert_eq!(Street::Flop.board_cards(), 3);
        assert_eq!(Street::River.board_cards(), 5);
    }

    #[timed_test]
    fn live_cards_excludes_used() {
        let used = used_mask(&[0, 13, 51]);
        let live = live_cards(used);
        assert_eq!(live.len(), 49);
        assert!(!live.contains(&0));
        assert!(!live.contains(&13));
        assert!(!live.contains(&51));
    }

    #[timed_test]
    fn tally_hand_strength_counts_ties_half() {
        let mut tally = PotentialTally::default();
        tally.record_current(HandState::Ahead);
        tally.record_current(HandState::Ahead);
        tally.record_current(HandState::Tied);
        tally.record_current(HandState::Behind);
        assert!((tally.hand_strength() - 0.625).abs() < 1e-6);
    }

    #[timed_test]
    fn tally_zero_denominators_yield_zero() {
        let tally = PotentialTally::default();
        assert_eq!(tally.positive_potential(990.0), 0.0);
        assert_eq!(tally.negative_potential(990.0), 0.0);
        assert_eq!(tally.hand_strength(), 0.0);
    }

    #[timed_test]
    fn potential_normalisation_uses_runout_factor() {
        let mut tally = PotentialTally::default();
        tally.record_current(HandState::Behind);
        for _ in 0..10 {
            tally.record_runout(HandState::Behind, HandState::Ahead);
        }
        // One behind pair, 10 of its runouts flip to ahead: 10 / (1 * 44).
        assert!((tally.positive_potential(44.0) - 10.0 / 44.0).abs() < 1e-6);
    }

    #[timed_test]
    fn asymmetry_is_clamped_and_signed() {
        assert!(asymmetry(0.2, 0.9, 0.0) > 0.99);
        assert!(asymmetry(0.9, 0.0, 0.9) < -0.99);
        let balanced = asymmetry(0.5, 0.3, 0.3);
        assert!(balanced.abs() < 1e-3);
        for value in [asymmetry(0.0, 1.0, 1.0), asymmetry(1.0, 1.0, 1.0)] {
            assert!((-1.0..=1.0).contains(&value));
        }
    }

    #[timed_test]
    fn effective_hand_strength_formula() {
        let ehs = effective_hand_strength(0.5, 0.2, 0.1);
        assert!((ehs - 0.55).abs() < 1e-6);
    }

    #[timed_test]
    fn feature_matrix_row_access() {
        let m = FeatureMatrix::from_flat(3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(m.len(), 2);
        assert_eq!(m.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
    }
}
