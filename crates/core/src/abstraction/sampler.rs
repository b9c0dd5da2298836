//! Training-set sampling.
//!
//! Draws uniform random `(hand, board)` deals without replacement and runs
//! the street's feature extractor on each. The sample loop is
//! embarrassingly parallel: the output matrix is pre-sized, each worker
//! fills a disjoint chunk of rows, and each worker owns a private RNG
//! seeded `base_seed + worker_id`. For a fixed thread count the sampled
//! training set is fully reproducible.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::abstraction::{raw_features, FeatureMatrix, Street};
use crate::cards::CardIndex;

/// Draw a uniform deal of two hole cards plus `board.len()` community
/// cards, all distinct, by bitmask rejection.
pub(crate) fn draw_deal<R: Rng>(rng: &mut R, hand: &mut [CardIndex; 2], board: &mut [CardIndex]) {
    let needed = 2 + board.len();
    let mut used = 0u64;
    let mut filled = 0;
    while filled < needed {
        let card = rng.gen_range(0..52u8);
        if used & (1u64 << card) != 0 {
            continue;
        }
        used |= 1u64 << card;
        if filled < 2 {
            hand[filled] = card;
        } else {
            board[filled - 2] = card;
        }
        filled += 1;
    }
}

/// Sample `count` deals for a street and return their raw feature matrix.
///
/// `on_progress` receives the number of completed samples; it is called
/// from worker threads.
pub fn sample_street(
    street: Street,
    count: usize,
    base_seed: u64,
    on_progress: &(impl Fn(usize) + Sync),
) -> FeatureMatrix {
    let dim = street.feature_dim();
    let board_len = street.board_cards();
    let mut matrix = FeatureMatrix::zeros(count, dim);

    let workers = rayon::current_num_threads().max(1);
    let rows_per_worker = count.div_ceil(workers).max(1);
    let done = AtomicUsize::new(0);

    matrix
        .flat_mut()
        .par_chunks_mut(rows_per_worker * dim)
        .enumerate()
        .for_each(|(worker, slot)| {
            let mut rng = StdRng::seed_from_u64(base_seed + worker as u64);
            let mut hand = [0u8; 2];
            let mut board = [0u8; 5];
            for row in slot.chunks_mut(dim) {
                draw_deal(&mut rng, &mut hand, &mut board[..board_len]);
                let features = raw_features(street, hand, &board[..board_len]);
                row.copy_from_slice(&features);
                let completed = done.fetch_add(1, Ordering::Relaxed) + 1;
                on_progress(completed);
            }
        });

    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_macros::timed_test;

    #[timed_test]
    fn draw_deal_produces_distinct_cards() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut hand = [0u8; 2];
        let mut board = [0u8; 5];
        for _ in 0..500 {
            draw_deal(&mut rng, &mut hand, &mut board);
            let mut all = vec![hand[0], hand[1]];
            all.extend_from_slice(&board);
            let unique: std::collections::HashSet<_> = all.iter().collect();
            assert_eq!(unique.len(), 7, "duplicate card in deal {all:?}");
            assert!(all.iter().all(|&c| c < 52));
        }
    }

    #[timed_test]
    fn draw_deal_is_reproducible_per_seed() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let mut hand_a = [0u8; 2];
        let mut hand_b = [0u8; 2];
        let mut board_a = [0u8; 3];
        let mut board_b = [0u8; 3];
        for _ in 0..100 {
            draw_deal(&mut a, &mut hand_a, &mut board_a);
            draw_deal(&mut b, &mut hand_b, &mut board_b);
            assert_eq!(hand_a, hand_b);
            assert_eq!(board_a, board_b);
        }
    }

    #[timed_test(120)]
    fn sampled_river_features_fill_the_matrix() {
        let matrix = sample_street(Street::River, 24, 9, &|_| {});
        assert_eq!(matrix.len(), 24);
        assert_eq!(matrix.dim(), 4);
        for i in 0..matrix.len() {
            let row = matrix.row(i);
            assert!(row[0].is_finite() && (0.0..=1.0).contains(&row[0]));
            assert!((-1.0..=1.0).contains(&row[3]));
        }
    }

    #[timed_test(120)]
    fn sampling_reports_progress() {
        let seen = AtomicUsize::new(0);
        let _ = sample_street(Street::River, 10, 3, &|done| {
            seen.fetch_max(done, Ordering::Relaxed);
        });
        assert_eq!(seen.load(Ordering::Relaxed), 10);
    }
}
