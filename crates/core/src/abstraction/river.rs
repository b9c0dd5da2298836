//! River feature extraction.
//!
//! No cards to come: the features are realised equity against the 990
//! opponent holdings, split into strong (two pair or better) and weak bins,
//! plus a blocker index. The blocker reference distribution enumerates the
//! 1,081 holdings with only the board removed — i.e. including combos that
//! use the hero's own cards — so the index measures how much the hero's
//! holding suppresses the opponent's strong combos relative to what the
//! board alone would allow.

use crate::abstraction::{
    encoded_pair, live_cards, used_mask, RiverFeatures, TWO_PAIR_RANK_FLOOR,
};
use crate::cards::{encoded, CardIndex};
use crate::evaluator::evaluate_seven;

/// Compute the river feature vector for a hole pair and a full board.
///
/// All seven card indices must be distinct; in debug builds a duplicate
/// trips an assertion, in release builds the result is unspecified.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn river_features(hand: [CardIndex; 2], board: [CardIndex; 5]) -> RiverFeatures {
    let [h0, h1] = encoded_pair(hand);
    let b = [
        encoded(board[0]),
        encoded(board[1]),
        encoded(board[2]),
        encoded(board[3]),
        encoded(board[4]),
    ];

    // Reference distribution for the blocker index: hero's cards stay in
    // the deck, only the board is removed.
    let board_only = used_mask(&board);
    let reference_live = live_cards(board_only);
    let mut reference_total = 0u32;
    let mut reference_strong = 0u32;
    for (i, &v1) in reference_live.iter().enumerate() {
        let v1c = encoded(v1);
        for &v2 in &reference_live[i + 1..] {
            let score = evaluate_seven(&[v1c, encoded(v2), b[0], b[1], b[2], b[3], b[4]]);
            reference_total += 1;
            if score > TWO_PAIR_RANK_FLOOR {
                reference_strong += 1;
            }
        }
    }

    // Hero universe: the 990 holdings that avoid hand and board.
    let used = used_mask(&[
        hand[0], hand[1], board[0], board[1], board[2], board[3], board[4],
    ]);
    let live = live_cards(used);

    let hero_rank = evaluate_seven(&[h0, h1, b[0], b[1], b[2], b[3], b[4]]);

    let mut total = 0u32;
    let mut strong = 0u32;
    let mut weak = 0u32;
    let mut wins_all = 0u32;
    let mut ties_all = 0u32;
    let mut wins_strong = 0u32;
    let mut ties_strong = 0u32;
    let mut wins_weak = 0u32;
    let mut ties_weak = 0u32;

    for (i, &v1) in live.iter().enumerate() {
        let v1c = encoded(v1);
        for &v2 in &live[i + 1..] {
            let villain_rank = evaluate_seven(&[v1c, encoded(v2), b[0], b[1], b[2], b[3], b[4]]);
            total += 1;

            let won = hero_rank > villain_rank;
            let tied = hero_rank == villain_rank;
            if won {
                wins_all += 1;
            } else if tied {
                ties_all += 1;
            }

            if villain_rank > TWO_PAIR_RANK_FLOOR {
                strong += 1;
                if won {
                    wins_strong += 1;
                } else if tied {
                    ties_strong += 1;
                }
            } else {
                weak += 1;
                if won {
                    wins_weak += 1;
                } else if tied {
                    ties_weak += 1;
                }
            }
        }
    }

    let equity = |wins: u32, ties: u32, combos: u32| -> f32 {
        if combos == 0 {
            return 0.0;
        }
        (wins as f32 + 0.5 * ties as f32) / combos as f32
    };

    // Expected strong combos: the reference count rescaled from the
    // 1,081-combo board-only universe down to the 990-combo hero universe.
    let blocker_index = if reference_strong > 0 {
        let expected = reference_strong as f32 * (total as f32 / reference_total as f32);
        (1.0 - strong as f32 / expected).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    RiverFeatures {
        equity_total: equity(wins_all, ties_all, total),
        equity_vs_strong: equity(wins_strong, ties_strong, strong),
        equity_vs_weak: equity(wins_weak, ties_weak, weak),
        blocker_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_card;
    use test_macros::timed_test;

    fn card(text: &str) -> CardIndex {
        parse_card(text).expect("test card literal")
    }

    #[timed_test(10)]
    fn royal_flush_river_is_a_lock() {
        let features = river_features(
            [card("As"), card("Ks")],
            [card("Qs"), card("Js"), card("Ts"), card("2d"), card("3c")],
        );
        assert!((features.equity_total - 1.0).abs() < 1e-6);
        assert!((features.equity_vs_strong - 1.0).abs() < 1e-6);
        assert!((features.equity_vs_weak - 1.0).abs() < 1e-6);
        // Holding the As and Ks removes every nut flush and royal combo
        // from the opponent's range.
        assert!(
            features.blocker_index > 0.0 && features.blocker_index <= 1.0,
            "blocker = {}",
            features.blocker_index
        );
    }

    #[timed_test(10)]
    fn air_on_a_four_flush_board_is_nearly_dead() {
        let features = river_features(
            [card("7h"), card("2c")],
            [card("As"), card("Ks"), card("Qs"), card("Js"), card("9d")],
        );
        assert!(
            features.equity_total < 0.3,
            "no pair, no spade should be far behind, got {}",
            features.equity_total
        );
        assert!((-1.0..=1.0).contains(&features.blocker_index));
    }

    #[timed_test(10)]
    fn equity_splits_bracket_the_total() {
        // A solid but beatable hand: top pair on a dry board.
        let features = river_features(
            [card("Ah"), card("Kc")],
            [card("Ad"), card("8s"), card("5c"), card("Jh"), card("2d")],
        );
        for (label, v) in [
            ("total", features.equity_total),
            ("strong", features.equity_vs_strong),
            ("weak", features.equity_vs_weak),
        ] {
            assert!(v.is_finite() && (0.0..=1.0).contains(&v), "{label} = {v}");
        }
        // Strong opponents are harder to beat than weak ones.
        assert!(features.equity_vs_strong <= features.equity_vs_weak);
        assert!(features.equity_total >= features.equity_vs_strong);
        assert!(features.equity_total <= features.equity_vs_weak);
    }

    #[timed_test(10)]
    fn invariant_to_hole_and_board_order() {
        let base = river_features(
            [card("Qh"), card("Jd")],
            [card("9c"), card("5s"), card("2h"), card("Kd"), card("7c")],
        );
        let swapped = river_features(
            [card("Jd"), card("Qh")],
            [card("7c"), card("Kd"), card("2h"), card("9c"), card("5s")],
        );
        assert_eq!(base, swapped);
    }

    #[timed_test(10)]
    fn deterministic_across_calls() {
        let hand = [card("Ts"), card("Td")];
        let board = [card("9c"), card("5s"), card("2h"), card("Kd"), card("7c")];
        assert_eq!(river_features(hand, board), river_features(hand, board));
    }
}
