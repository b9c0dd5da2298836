//! Print the raw bucketing features for a deal.
//!
//! ```text
//! cargo run --example show_features -- AsKs Qs Js Ts
//! ```
//!
//! The first argument is the hole pair, the rest are board cards (three,
//! four or five of them). No board prints the preflop bucket instead.

use hand_abstraction_core::abstraction::{preflop_bucket, raw_features};
use hand_abstraction_core::cards::CardIndex;
use hand_abstraction_core::{parse_card, parse_hand, Street};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let hand_text = args.next().ok_or("usage: show_features <hand> [board cards...]")?;
    let hand = parse_hand(&hand_text)?;

    let board: Result<Vec<CardIndex>, _> = args.map(|text| parse_card(&text)).collect();
    let board = board?;
    for &card in &board {
        if hand.contains(&card) {
            return Err(format!("board card index {card} is already in the hand").into());
        }
    }

    if board.is_empty() {
        println!("{hand_text}: preflop bucket {}", preflop_bucket(hand));
        return Ok(());
    }

    let street = Street::from_board_len(board.len())?;
    let features = raw_features(street, hand, &board);
    let labels: &[&str] = match street {
        Street::Flop | Street::Turn => &["ehs", "asymmetry", "nut_potential"],
        Street::River => &["equity_total", "equity_vs_strong", "equity_vs_weak", "blocker_index"],
    };

    println!("{hand_text} on {} ({}):", street.name(), board.len());
    for (label, value) in labels.iter().zip(features.iter()) {
        println!("  {label:>16}: {value:+.6}");
    }
    Ok(())
}
