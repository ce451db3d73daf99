//! Performance benchmarks for rating calculations and match recording

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use padel_ladder::rating::{EloCalculator, EloConfig};
use padel_ladder::recording::{MatchRecorder, MatchSubmission, TeamSubmission};
use padel_ladder::registry::PlayerRegistry;
use padel_ladder::storage::InMemoryLadderStore;
use std::sync::Arc;

fn bench_rating_calculations(c: &mut Criterion) {
    let calculator = EloCalculator::new(EloConfig::default()).unwrap();

    c.bench_function("elo_match_outcome_4_players", |b| {
        b.iter(|| {
            calculator.match_outcome(
                black_box(1650.0),
                black_box(1550.0),
                black_box(1450.0),
                black_box(1350.0),
                black_box(true),
            )
        })
    });
}

fn bench_record_match(c: &mut Criterion) {
    let store = Arc::new(InMemoryLadderStore::new());
    let registry = PlayerRegistry::new(store.clone(), 1500);
    for name in ["A", "B", "C", "D"] {
        registry.add_player(name).unwrap();
    }

    let recorder = MatchRecorder::new(store, EloCalculator::new(EloConfig::default()).unwrap());
    let submission = MatchSubmission {
        team1: TeamSubmission::new("A", "B"),
        team2: TeamSubmission::new("C", "D"),
        winning_team: 1,
        match_date: NaiveDate::from_ymd_opt(2025, 12, 17).unwrap(),
    };

    c.bench_function("record_match_in_memory", |b| {
        b.iter(|| recorder.record(black_box(&submission)).unwrap())
    });
}

fn bench_rankings(c: &mut Criterion) {
    let store = Arc::new(InMemoryLadderStore::new());
    let registry = PlayerRegistry::new(store, 1500);
    for i in 0..200 {
        registry.add_player(&format!("player{}", i)).unwrap();
    }

    c.bench_function("list_ranked_200_players", |b| {
        b.iter(|| registry.list_ranked().unwrap())
    });
}

criterion_group!(
    benches,
    bench_rating_calculations,
    bench_record_match,
    bench_rankings
);
criterion_main!(benches);
