//! Flop feature extraction.
//!
//! Exhaustive over the 47-card residue: 1,081 unordered opponent hole
//! pairs, and for each pair the 990 unordered (turn, river) runouts that
//! avoid it. The hero's 7-card rank depends only on the runout, so it is
//! pre-computed once into a symmetric 52×52 table; the inner loops then
//! cost one table load plus one opponent evaluation per runout.

use crate::abstraction::{
    asymmetry, effective_hand_strength, encoded_pair, live_cards, used_mask, HandState,
    PotentialTally, StrengthFeatures, TRIPS_RANK_FLOOR,
};
use crate::cards::{encoded, CardIndex, DECK_SIZE};
use crate::evaluator::{evaluate_five, evaluate_seven};

/// Unordered (turn, river) pairs per opponent holding: C(45, 2).
const RUNOUTS_PER_PAIR: f32 = 990.0;

/// Compute the flop feature vector for a hole pair and a 3-card board.
///
/// All five card indices must be distinct; in debug builds a duplicate
/// trips an assertion, in release builds the result is unspecified.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn flop_features(hand: [CardIndex; 2], board: [CardIndex; 3]) -> StrengthFeatures {
    let used = used_mask(&[hand[0], hand[1], board[0], board[1], board[2]]);
    let live = live_cards(used);

    let [h0, h1] = encoded_pair(hand);
    let b = [encoded(board[0]), encoded(board[1]), encoded(board[2])];

    let hero_now = evaluate_five(&[h0, h1, b[0], b[1], b[2]]);

    // Hero's best 7-card rank for every unordered (turn, river) pair,
    // stored symmetrically.
    let mut hero_runout = vec![[0u16; DECK_SIZE]; DECK_SIZE];
    for (ti, &t) in live.iter().enumerate() {
        let tc = encoded(t);
        for &r in &live[ti + 1..] {
            let rank = evaluate_seven(&[h0, h1, b[0], b[1], b[2], tc, encoded(r)]);
            hero_runout[t as usize][r as usize] = rank;
            hero_runout[r as usize][t as usize] = rank;
        }
    }

    let mut tally = PotentialTally::default();
    for (i, &v1) in live.iter().enumerate() {
        let v1c = encoded(v1);
        for &v2 in &live[i + 1..] {
            let v2c = encoded(v2);
            let villain_now = evaluate_five(&[b[0], b[1], b[2], v1c, v2c]);
            let current = HandState::compare(hero_now, villain_now);
            tally.record_current(current);

            for (ti, &t) in live.iter().enumerate() {
                if t == v1 || t == v2 {
                    continue;
                }
                let tc = encoded(t);
                for &r in &live[ti + 1..] {
                    if r == v1 || r == v2 {
                        continue;
                    }
                    let hero_best = hero_runout[t as usize][r as usize];
                    let villain_best =
                        evaluate_seven(&[v1c, v2c, b[0], b[1], b[2], tc, encoded(r)]);
                    tally.record_runout(current, HandState::compare(hero_best, villain_best));
                }
            }
        }
    }

    let hs = tally.hand_strength();
    let ppot = tally.positive_potential(RUNOUTS_PER_PAIR);
    let npot = tally.negative_potential(RUNOUTS_PER_PAIR);

    // Fraction of the populated runout cells where the hero holds trips or
    // better.
    let mut nut_hits = 0u32;
    let mut cells = 0u32;
    for (ti, &t) in live.iter().enumerate() {
        for &r in &live[ti + 1..] {
            cells += 1;
            if hero_runout[t as usize][r as usize] > TRIPS_RANK_FLOOR {
                nut_hits += 1;
            }
        }
    }
    let nut_potential = if cells > 0 {
        nut_hits as f32 / cells as f32
    } else {
        0.0
    };

    StrengthFeatures {
        ehs: effective_hand_strength(hs, ppot, npot),
        asymmetry: asymmetry(hs, ppot, npot),
        nut_potential,
    }
}
