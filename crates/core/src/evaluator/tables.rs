//! Rank lookup tables for the five-card evaluator.
//!
//! Every five-card hand falls into one of 7,462 equivalence classes. The
//! tables map a hand's class to its canonical value, where 1 is the royal
//! flush and 7462 the worst high card; [`super::evaluate_five`] flips that
//! into the ascending `[1, 7462]` rank the rest of the crate uses.
//!
//! The classes split three ways:
//!
//! - 1,287 rank sets with five distinct ranks, played as a flush
//!   (straight flushes and ordinary flushes) — indexed by the 13-bit rank
//!   bitmask in `flush`;
//! - the same 1,287 rank sets played off-suit (straights and high cards) —
//!   indexed by the rank bitmask in `unique`;
//! - 4,888 rank multisets with at least one repeated rank (pairs through
//!   quads) — keyed by the product of the five rank primes in `paired`.
//!
//! Rather than shipping the tables as static data, they are generated once
//! on first use: enumerate every class, sort by hand strength, assign
//! values in order. The ordering is pinned by the official-rank-table
//! anchors in the evaluator tests (royal flush 1, AAAA-K 11, AAAKK 167,
//! AKQJ9 flush 323, broadway straight 1600, 7-5-4-3-2 high 7462).

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use crate::cards::RANK_PRIMES;

/// Hand-category weights used to order classes; higher beats lower.
const CAT_STRAIGHT_FLUSH: u8 = 8;
const CAT_QUADS: u8 = 7;
const CAT_FULL_HOUSE: u8 = 6;
const CAT_FLUSH: u8 = 5;
const CAT_STRAIGHT: u8 = 4;
const CAT_TRIPS: u8 = 3;
const CAT_TWO_PAIR: u8 = 2;
const CAT_PAIR: u8 = 1;
const CAT_HIGH_CARD: u8 = 0;

pub(crate) struct EvalTables {
    /// Canonical value per 13-bit rank mask when all five cards share a suit.
    pub(crate) flush: Vec<u16>,
    /// Canonical value per 13-bit rank mask when the five ranks are distinct
    /// and the hand is not a flush. Zero marks masks with repeated ranks.
    pub(crate) unique: Vec<u16>,
    /// Canonical value per rank-prime product for hands with repeated ranks.
    pub(crate) paired: FxHashMap<u32, u16>,
}

static TABLES: OnceLock<EvalTables> = OnceLock::new();

/// The process-wide evaluator tables, generated on first use.
pub(crate) fn tables() -> &'static EvalTables {
    TABLES.get_or_init(build_tables)
}

/// Strength key for a five-card class: category first, then the five ranks
/// expanded in tie-break order (group count descending, rank descending).
/// Straights collapse to their high card, with the wheel's high card being
/// the five (index 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ClassKey {
    category: u8,
    ranks: [u8; 5],
}

enum ClassSlot {
    Flush(u16),
    Unique(u16),
    Paired(u32),
}

fn build_tables() -> EvalTables {
    let mut classes: Vec<(ClassKey, ClassSlot)> = Vec::with_capacity(7462);

    // Distinct-rank sets: each 5-bit mask yields one flush class and one
    // off-suit class.
    for mask in 0u32..8192 {
        if mask.count_ones() != 5 {
            continue;
        }
        let ranks = ranks_descending(mask);
        match straight_high(mask) {
            Some(high) => {
                let key = [high, 0, 0, 0, 0];
                classes.push((
                    ClassKey { category: CAT_STRAIGHT_FLUSH, ranks: key },
                    ClassSlot::Flush(mask as u16),
                ));
                classes.push((
                    ClassKey { category: CAT_STRAIGHT, ranks: key },
                    ClassSlot::Unique(mask as u16),
                ));
            }
            None => {
                classes.push((
                    ClassKey { category: CAT_FLUSH, ranks },
                    ClassSlot::Flush(mask as u16),
                ));
                classes.push((
                    ClassKey { category: CAT_HIGH_CARD, ranks },
                    ClassSlot::Unique(mask as u16),
                ));
            }
        }
    }

    // Repeated-rank multisets, enumerated in non-decreasing rank order.
    for r0 in 0..13u8 {
        for r1 in r0..13 {
            for r2 in r1..13 {
                for r3 in r2..13 {
                    for r4 in r3..13 {
                        let multiset = [r0, r1, r2, r3, r4];
                        let mut counts = [0u8; 13];
                        for &r in &multiset {
                            counts[r as usize] += 1;
                        }
                        let max_count = *counts.iter().max().unwrap_or(&0);
                        if max_count == 1 || max_count == 5 {
                            // Distinct ranks are handled above; five of a
                            // rank does not exist in a 4-suit deck.
                            continue;
                        }
                        let key = multiset_key(&counts);
                        let product: u32 = multiset
                            .iter()
                            .map(|&r| RANK_PRIMES[r as usize])
                            .product();
                        classes.push((key, ClassSlot::Paired(product)));
                    }
                }
            }
        }
    }

    debug_assert_eq!(classes.len(), 7462);

    // Strongest class first; canonical value is 1-based position.
    classes.sort_by(|a, b| b.0.cmp(&a.0));

    let mut flush = vec![0u16; 8192];
    let mut unique = vec![0u16; 8192];
    let mut paired = FxHashMap::default();
    paired.reserve(4888);

    #[allow(clippy::cast_possible_truncation)]
    for (position, (_, slot)) in classes.into_iter().enumerate() {
        let value = (position + 1) as u16;
        match slot {
            ClassSlot::Flush(mask) => flush[mask as usize] = value,
            ClassSlot::Unique(mask) => unique[mask as usize] = value,
            ClassSlot::Paired(product) => {
                let prior = paired.insert(product, value);
                debug_assert!(prior.is_none(), "prime product collision: {product}");
            }
        }
    }

    EvalTables { flush, unique, paired }
}

/// Key for a multiset with repeated ranks: groups ordered by count then
/// rank, counts expanded back into five slots.
fn multiset_key(counts: &[u8; 13]) -> ClassKey {
    let mut groups: Vec<(u8, u8)> = counts
        .iter()
        .enumerate()
        .filter(|(_, &c)| c > 0)
        .map(|(rank, &c)| (c, rank as u8))
        .collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));

    let category = match (groups[0].0, groups.get(1).map_or(0, |g| g.0)) {
        (4, _) => CAT_QUADS,
        (3, 2) => CAT_FULL_HOUSE,
        (3, _) => CAT_TRIPS,
        (2, 2) => CAT_TWO_PAIR,
        _ => CAT_PAIR,
    };

    let mut ranks = [0u8; 5];
    let mut slot = 0;
    for (count, rank) in groups {
        for _ in 0..count {
            ranks[slot] = rank;
            slot += 1;
        }
    }

    ClassKey { category, ranks }
}

/// The five ranks of a distinct-rank mask, highest first.
fn ranks_descending(mask: u32) -> [u8; 5] {
    let mut ranks = [0u8; 5];
    let mut slot = 0;
    for rank in (0..13u8).rev() {
        if mask & (1 << rank) != 0 {
            ranks[slot] = rank;
            slot += 1;
        }
    }
    ranks
}

/// The straight high card of a 5-bit rank mask, if it is a straight.
/// The wheel (A-5-4-3-2) reports the five, rank index 3.
fn straight_high(mask: u32) -> Option<u8> {
    for high in (4..=12u8).rev() {
        if mask == 0x1F << (high - 4) {
            return Some(high);
        }
    }
    if mask == 0x100F {
        return Some(3);
    }
    None
}
