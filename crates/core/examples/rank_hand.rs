//! Rank a hand from the command line.
//!
//! ```text
//! cargo run --example rank_hand -- As Ks Qs Js Ts 2d 3c
//! ```
//!
//! Accepts five, six or seven card literals and prints the hand's rank in
//! `[1, 7462]` along with its category.

use hand_abstraction_core::cards::{encoded, Card};
use hand_abstraction_core::{evaluate_five, evaluate_seven, evaluate_six, parse_card, HandRank};

fn category(rank: HandRank) -> &'static str {
    // Category boundaries of the canonical 7,462-class ordering.
    match 7463 - rank {
        1..=10 => "straight flush",
        11..=166 => "four of a kind",
        167..=322 => "full house",
        323..=1599 => "flush",
        1600..=1609 => "straight",
        1610..=2467 => "three of a kind",
        2468..=3325 => "two pair",
        3326..=6185 => "one pair",
        _ => "high card",
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cards: Result<Vec<Card>, _> = args
        .iter()
        .map(|text| parse_card(text).map(encoded))
        .collect();

    let cards = match cards {
        Ok(cards) => cards,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let rank = match cards.len() {
        5 => evaluate_five(&[cards[0], cards[1], cards[2], cards[3], cards[4]]),
        6 => evaluate_six(&[cards[0], cards[1], cards[2], cards[3], cards[4], cards[5]]),
        7 => evaluate_seven(&[
            cards[0], cards[1], cards[2], cards[3], cards[4], cards[5], cards[6],
        ]),
        n => {
            eprintln!("error: expected 5, 6 or 7 cards, got {n}");
            std::process::exit(1);
        }
    };

    println!("{} -> rank {rank} ({})", args.join(" "), category(rank));
}
