//! Hand evaluation.
//!
//! Ranks 5-, 6-, and 7-card hands into `[1, 7462]`, higher is stronger.
//! The five-card core is the classic three-way split: flushes index the
//! flush table by rank bitmask, distinct-rank hands index the unique table,
//! and everything else resolves through the rank-prime product. Six- and
//! seven-card hands rank their best five-card subset, with fast paths that
//! avoid subset enumeration for the common seven-card shapes.
//!
//! The evaluator has no error path: inputs are assumed to be distinct,
//! well-formed cards. Feeding it anything else is a caller bug, not a
//! runtime condition.

mod tables;

use crate::cards::Card;
use tables::tables;

/// Total ordering of five-card hands; 7462 is the royal flush, 1 the worst
/// high card. Ties are exact equality.
pub type HandRank = u16;

/// Force table generation. Evaluation initialises lazily on first use, so
/// this exists only to pay the one-time cost at a chosen point (e.g.
/// process start) instead of inside the first hot loop.
pub fn initialize() {
    let _ = tables();
}

/// Rank a five-card hand.
#[must_use]
pub fn evaluate_five(cards: &[Card; 5]) -> HandRank {
    let t = tables();
    let or_all = cards[0].raw() | cards[1].raw() | cards[2].raw() | cards[3].raw() | cards[4].raw();
    let q = (or_all >> 16) as usize;

    let and_all = cards[0].raw() & cards[1].raw() & cards[2].raw() & cards[3].raw() & cards[4].raw();
    if and_all & 0xF000 != 0 {
        return 7463 - t.flush[q];
    }

    let unique = t.unique[q];
    if unique != 0 {
        return 7463 - unique;
    }

    let product: u32 = cards.iter().map(|c| c.prime()).product();
    7463 - t.paired[&product]
}

/// Rank the best five-card hand out of six cards.
#[must_use]
pub fn evaluate_six(cards: &[Card; 6]) -> HandRank {
    let mut best = 0;
    for skip in 0..6 {
        let mut five = [cards[0]; 5];
        let mut slot = 0;
        for (i, &card) in cards.iter().enumerate() {
            if i != skip {
                five[slot] = card;
                slot += 1;
            }
        }
        best = best.max(evaluate_five(&five));
    }
    best
}

/// Rank the best five-card hand out of seven cards.
#[must_use]
pub fn evaluate_seven(cards: &[Card; 7]) -> HandRank {
    let t = tables();

    let mut suit_counts = [0u8; 4];
    let mut suit_masks = [0u32; 4];
    let mut full_mask = 0u32;
    for card in cards {
        let suit = card.suit();
        suit_counts[suit] += 1;
        suit_masks[suit] |= card.rank_bit();
        full_mask |= card.rank_bit();
    }

    // Five or more of one suit: the hand is that suit's best flush or
    // straight flush, and nothing off-suit can beat it.
    for suit in 0..4 {
        if suit_counts[suit] >= 5 {
            let mask = suit_masks[suit];
            let lookup = straight_window(mask).unwrap_or_else(|| top_five_bits(mask));
            return 7463 - t.flush[lookup as usize];
        }
    }

    // Seven distinct ranks: no pairs possible, so the hand is the highest
    // straight anywhere in the mask, or the top five ranks.
    if full_mask.count_ones() == 7 {
        let lookup = straight_window(full_mask).unwrap_or_else(|| top_five_bits(full_mask));
        return 7463 - t.unique[lookup as usize];
    }

    // Paired board shapes: rank all 21 five-card subsets.
    let mut best = 0;
    for i in 0..7 {
        for j in (i + 1)..7 {
            let mut five = [cards[0]; 5];
            let mut slot = 0;
            for (k, &card) in cards.iter().enumerate() {
                if k != i && k != j {
                    five[slot] = card;
                    slot += 1;
                }
            }
            best = best.max(evaluate_five(&five));
        }
    }
    best
}

/// The 5-bit mask of the highest straight contained in `mask`, if any.
/// Checks the ace-low wheel only after every higher window.
fn straight_window(mask: u32) -> Option<u32> {
    let runs = mask & (mask << 1) & (mask << 2) & (mask << 3) & (mask << 4);
    if runs != 0 {
        let high = 31 - runs.leading_zeros();
        return Some(0x1F << (high - 4));
    }
    if mask & 0x100F == 0x100F {
        return Some(0x100F);
    }
    None
}

/// Keep only the five highest set bits of a rank mask.
fn top_five_bits(mut mask: u32) -> u32 {
    while mask.count_ones() > 5 {
        mask &= mask - 1;
    }
    mask
}
