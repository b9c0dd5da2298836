//! Turn feature extraction.
//!
//! Same scheme as the flop, one card ahead: opponent pairs come from the
//! 46-card residue, and each pair leaves 44 river cards. The hero's 7-card
//! rank per river is pre-computed once.

use crate::abstraction::{
    asymmetry, effective_hand_strength, encoded_pair, live_cards, used_mask, HandState,
    PotentialTally, StrengthFeatures, TRIPS_RANK_FLOOR,
};
use crate::cards::{encoded, CardIndex, DECK_SIZE};
use crate::evaluator::{evaluate_seven, evaluate_six};

/// River cards left once an opponent holding is fixed: 46 - 2.
const RUNOUTS_PER_PAIR: f32 = 44.0;

/// Compute the turn feature vector for a hole pair and a 4-card board.
///
/// All six card indices must be distinct; in debug builds a duplicate trips
/// an assertion, in release builds the result is unspecified.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn turn_features(hand: [CardIndex; 2], board: [CardIndex; 4]) -> StrengthFeatures {
    let used = used_mask(&[hand[0], hand[1], board[0], board[1], board[2], board[3]]);
    let live = live_cards(used);

    let [h0, h1] = encoded_pair(hand);
    let b = [
        encoded(board[0]),
        encoded(board[1]),
        encoded(board[2]),
        encoded(board[3]),
    ];

    let hero_now = evaluate_six(&[h0, h1, b[0], b[1], b[2], b[3]]);

    // Hero's best 7-card rank per possible river card.
    let mut hero_river = [0u16; DECK_SIZE];
    for &r in &live {
        hero_river[r as usize] = evaluate_seven(&[h0, h1, b[0], b[1], b[2], b[3], encoded(r)]);
    }

    let mut tally = PotentialTally::default();
    for (i, &v1) in live.iter().enumerate() {
        let v1c = encoded(v1);
        for &v2 in &live[i + 1..] {
            let v2c = encoded(v2);
            let villain_now = evaluate_six(&[b[0], b[1], b[2], b[3], v1c, v2c]);
            let current = HandState::compare(hero_now, villain_now);
            tally.record_current(current);

            for &r in &live {
                if r == v1 || r == v2 {
                    continue;
                }
                let hero_best = hero_river[r as usize];
                let villain_best = evaluate_seven(&[v1c, v2c, b[0], b[1], b[2], b[3], encoded(r)]);
                tally.record_runout(current, HandState::compare(hero_best, villain_best));
            }
        }
    }

    let hs = tally.hand_strength();
    let ppot = tally.positive_potential(RUNOUTS_PER_PAIR);
    let npot = tally.negative_potential(RUNOUTS_PER_PAIR);

    // Fraction of the possible river cards that make the hero trips or
    // better.
    let mut nut_hits = 0u32;
    for &r in &live {
        if hero_river[r as usize] > TRIPS_RANK_FLOOR {
            nut_hits += 1;
        }
    }
    let nut_potential = if live.is_empty() {
        0.0
    } else {
        nut_hits as f32 / live.len() as f32
    };

    StrengthFeatures {
        ehs: effective_hand_strength(hs, ppot, npot),
        asymmetry: asymmetry(hs, ppot, npot),
        nut_potential,
    }
}
