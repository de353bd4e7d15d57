//! Performance benchmarks for the rating pass

use adw_rating::config::RatingConfig;
use adw_rating::identity::{AliasTables, NameNormalizer};
use adw_rating::rating::{
    Participant, RatingEngine, RoundBatcher, SkillModel, WengLinModelConfig, WengLinSkillModel,
};
use adw_rating::types::{Placement, RunResult, SizeCategory, SkillRating, TeamId};
use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// `competitions` events of `rounds` rounds each, drawn from a pool of teams
fn synthetic_season(competitions: usize, rounds: usize, field: usize, pool: usize) -> Vec<RunResult> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let mut runs = Vec::with_capacity(competitions * rounds * field);

    for c in 0..competitions {
        for r in 0..rounds {
            for slot in 0..field {
                let team = (c * 7 + r * 13 + slot * 31) % pool;
                let placement = if slot % 5 == 4 {
                    Placement::Eliminated
                } else {
                    Placement::Ranked(slot as u32 + 1)
                };
                runs.push(RunResult {
                    competition_id: format!("comp_{:03}", c),
                    competition_name: format!("Competition {}", c),
                    competition_date: start + Duration::days(c as i64 * 14),
                    competition_tier: (c % 3) as u8 + 1,
                    round_key: format!("agility_{}", r + 1),
                    size: if team % 2 == 0 {
                        SizeCategory::Large
                    } else {
                        SizeCategory::Small
                    },
                    team_id: TeamId::new(format!("handler {}", team), "dog"),
                    handler: format!("Handler {}", team),
                    animal: "Dog".to_string(),
                    country: String::new(),
                    placement,
                });
            }
        }
    }
    runs
}

fn bench_skill_model(c: &mut Criterion) {
    let model = WengLinSkillModel::new(WengLinModelConfig::default()).unwrap();
    let mut group = c.benchmark_group("weng_lin_round");

    for field in [6usize, 20, 60] {
        let participants: Vec<Participant> = (0..field)
            .map(|i| Participant {
                rating: SkillRating {
                    mu: 20.0 + i as f64 * 0.3,
                    sigma: 4.0 + (i % 3) as f64,
                },
                rank: i as u32 + 1,
                weight: 1.0,
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(field), &participants, |b, p| {
            b.iter(|| black_box(model.rate(black_box(p)).unwrap()))
        });
    }
    group.finish();
}

fn bench_batching(c: &mut Criterion) {
    let runs = synthetic_season(40, 6, 30, 400);
    let batcher = RoundBatcher::new(6, true);

    c.bench_function("batch_season", |b| {
        b.iter(|| black_box(batcher.batch(black_box(&runs))))
    });
}

fn bench_full_pass(c: &mut Criterion) {
    let runs = synthetic_season(40, 6, 30, 400);
    let engine = RatingEngine::new(RatingConfig::default()).unwrap();
    let live = RatingEngine::new(RatingConfig::live()).unwrap();

    c.bench_function("rating_pass_baseline", |b| {
        b.iter(|| black_box(engine.run(black_box(&runs)).unwrap()))
    });
    c.bench_function("rating_pass_live", |b| {
        b.iter(|| black_box(live.run(black_box(&runs)).unwrap()))
    });
}

fn bench_name_normalization(c: &mut Criterion) {
    let normalizer = NameNormalizer::new(AliasTables::default()).unwrap();
    let names = [
        ("Svobodová, Jana", "Daylight Neverending Force (Day)"),
        ("Petr Novák", "Finrod Frances \"Cis\""),
        ("Anna-Lena  Müller", "Speedy"),
    ];

    c.bench_function("make_team_id", |b| {
        b.iter(|| {
            for (handler, dog) in &names {
                black_box(normalizer.make_team_id(black_box(handler), black_box(dog)));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_skill_model,
    bench_batching,
    bench_full_pass,
    bench_name_normalization
);
criterion_main!(benches);
