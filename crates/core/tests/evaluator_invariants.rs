//! Evaluator invariants: fixed anchors from the official rank table plus
//! randomized cross-checks of the fast 6- and 7-card paths against
//! exhaustive subset enumeration.

use hand_abstraction_core::cards::{encoded, Card, CardIndex};
use hand_abstraction_core::{evaluate_five, evaluate_seven, evaluate_six, parse_card, HandRank};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

fn card(text: &str) -> Card {
    encoded(parse_card(text).expect("test card literal"))
}

/// Reference 7-card rank: maximum over all 21 five-card subsets.
fn reference_seven(cards: &[Card; 7]) -> HandRank {
    let mut best = 0;
    for i in 0..7 {
        for j in (i + 1)..7 {
            let mut five = [cards[0]; 5];
            let mut slot = 0;
            for (k, &c) in cards.iter().enumerate() {
                if k != i && k != j {
                    five[slot] = c;
                    slot += 1;
                }
            }
            best = best.max(evaluate_five(&five));
        }
    }
    best
}

/// Reference 6-card rank: maximum over all 6 five-card subsets.
fn reference_six(cards: &[Card; 6]) -> HandRank {
    let mut best = 0;
    for skip in 0..6 {
        let mut five = [cards[0]; 5];
        let mut slot = 0;
        for (k, &c) in cards.iter().enumerate() {
            if k != skip {
                five[slot] = c;
                slot += 1;
            }
        }
        best = best.max(evaluate_five(&five));
    }
    best
}

fn random_cards<const N: usize>(rng: &mut StdRng) -> [Card; N] {
    let mut deck: Vec<CardIndex> = (0..52).collect();
    deck.shuffle(rng);
    let mut out = [encoded(0); N];
    for (slot, &index) in out.iter_mut().zip(deck.iter()) {
        *slot = encoded(index);
    }
    out
}

#[test]
fn royal_flush_is_the_ceiling() {
    assert_eq!(
        evaluate_five(&[card("As"), card("Ks"), card("Qs"), card("Js"), card("Ts")]),
        7462
    );
}

#[test]
fn worst_high_card_is_the_floor() {
    assert_eq!(
        evaluate_five(&[card("7s"), card("5h"), card("4d"), card("3c"), card("2s")]),
        1
    );
}

#[test]
fn every_rank_is_in_range_over_random_hands() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..10_000 {
        let cards: [Card; 5] = random_cards(&mut rng);
        let rank = evaluate_five(&cards);
        assert!((1..=7462).contains(&rank), "rank {rank} out of range");
    }
}

#[test]
fn seven_card_fast_paths_match_subset_enumeration() {
    let mut rng = StdRng::seed_from_u64(7_777);
    for i in 0..200_000 {
        let cards: [Card; 7] = random_cards(&mut rng);
        let fast = evaluate_seven(&cards);
        let slow = reference_seven(&cards);
        assert_eq!(fast, slow, "mismatch on iteration {i}: {cards:?}");
    }
}

#[test]
#[ignore = "slow: full million-hand sweep"]
fn seven_card_fast_paths_match_subset_enumeration_heavy() {
    let mut rng = StdRng::seed_from_u64(31_337);
    for i in 0..1_000_000 {
        let cards: [Card; 7] = random_cards(&mut rng);
        assert_eq!(
            evaluate_seven(&cards),
            reference_seven(&cards),
            "mismatch on iteration {i}: {cards:?}"
        );
    }
}

#[test]
fn six_card_matches_subset_enumeration() {
    let mut rng = StdRng::seed_from_u64(99);
    for i in 0..100_000 {
        let cards: [Card; 6] = random_cards(&mut rng);
        assert_eq!(
            evaluate_six(&cards),
            reference_six(&cards),
            "mismatch on iteration {i}: {cards:?}"
        );
    }
}

#[test]
fn seven_distinct_ranks_with_buried_straight() {
    // The straight lives in the bottom five of seven distinct ranks; the
    // top-five shortcut alone would miss it.
    let cards = [
        card("Ah"),
        card("Kd"),
        card("8c"),
        card("7s"),
        card("6h"),
        card("5d"),
        card("4c"),
    ];
    assert_eq!(evaluate_seven(&cards), reference_seven(&cards));
    assert_eq!(
        evaluate_seven(&cards),
        evaluate_five(&[card("8h"), card("7d"), card("6c"), card("5s"), card("4d")])
    );
}

#[test]
fn wheel_straight_flush_sits_below_six_high() {
    let wheel = evaluate_five(&[card("Ad"), card("2d"), card("3d"), card("4d"), card("5d")]);
    let six_high = evaluate_five(&[card("2d"), card("3d"), card("4d"), card("5d"), card("6d")]);
    assert!(wheel < six_high);
    // Both still outrank every non-straight-flush hand, e.g. quad aces.
    let quads = evaluate_five(&[card("As"), card("Ah"), card("Ad"), card("Ac"), card("Ks")]);
    assert!(wheel > quads);
}

#[test]
fn ties_are_exact_equality_across_suits() {
    let spades = evaluate_five(&[card("As"), card("Kh"), card("Qd"), card("Jc"), card("9s")]);
    let clubs = evaluate_five(&[card("Ac"), card("Kd"), card("Qh"), card("Js"), card("9c")]);
    assert_eq!(spades, clubs);
}
