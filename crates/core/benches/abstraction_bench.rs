//! Feature-extraction benchmarks: turn and river enumeration cost per
//! deal. (The flop extractor is ~1M evaluations per deal; bench it by
//! scaling the turn numbers rather than waiting on it here.)

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hand_abstraction_core::abstraction::{river_features, turn_features};
use hand_abstraction_core::cards::CardIndex;
use hand_abstraction_core::{evaluator, parse_card};

fn card(text: &str) -> CardIndex {
    parse_card(text).expect("bench card literal")
}

fn bench_turn_features(c: &mut Criterion) {
    evaluator::initialize();
    let hand = [card("Ah"), card("Kc")];
    let board = [card("As"), card("8s"), card("7s"), card("2d")];

    c.bench_function("turn_features", |b| {
        b.iter(|| turn_features(black_box(hand), black_box(board)));
    });
}

fn bench_river_features(c: &mut Criterion) {
    evaluator::initialize();
    let hand = [card("Ah"), card("Kc")];
    let board = [card("Ad"), card("8s"), card("5c"), card("Jh"), card("2d")];

    c.bench_function("river_features", |b| {
        b.iter(|| river_features(black_box(hand), black_box(board)));
    });
}

criterion_group!(benches, bench_turn_features, bench_river_features);
criterion_main!(benches);
