//! Integration tests for the rating pipeline
//!
//! These tests drive the whole system from result files on disk:
//! - Registry resolution and row loading
//! - Identity merges across spellings
//! - The chronological rating pass
//! - Leaderboards and export

mod fixtures;

use adw_rating::config::EliminatedPolicy;
use adw_rating::identity::{AliasTables, IdentityResolver, NameNormalizer};
use adw_rating::ingest::RowRejection;
use adw_rating::rating::{RatingEngine, RoundBatcher};
use adw_rating::types::{Placement, SizeCategory, SkillRating};
use adw_rating::RatingPipeline;
use std::fs;

use fixtures::{round, run, small_field_config, Competition, ResultRow, ResultsDir};

fn single_competition_dir() -> ResultsDir {
    let dir = ResultsDir::new();
    dir.write_registry(&[Competition {
        id: "spring_open",
        date: "2024-05-01",
        tier: 2,
        name: "Spring Open",
    }]);
    dir
}

#[test]
fn test_four_team_round_end_to_end() {
    let dir = single_competition_dir();
    dir.write_results(
        "spring_open",
        "large",
        &[
            ResultRow::ranked("agility_1", "L", 1, "Alice Able", "Ace"),
            ResultRow::ranked("agility_1", "L", 2, "Bob Baker", "Bolt"),
            ResultRow::eliminated("agility_1", "L", "Cleo Cole", "Cosmo"),
            ResultRow::eliminated("agility_1", "L", "Dan Drake", "Dash"),
        ],
    );

    let pipeline = RatingPipeline::new(dir.config(small_field_config(4))).unwrap();
    let report = pipeline.run().unwrap();
    assert_eq!(report.load.rows_loaded, 4);

    let normalizer = pipeline.normalizer();
    let id = |handler: &str, dog: &str| normalizer.make_team_id(handler, dog);
    let (a, b, c, d) = (
        id("Alice Able", "Ace"),
        id("Bob Baker", "Bolt"),
        id("Cleo Cole", "Cosmo"),
        id("Dan Drake", "Dash"),
    );

    // Batcher view of the same runs
    let runs = pipeline.load().unwrap().runs;
    let (rounds, _) = RoundBatcher::new(4, true).batch(&runs);
    assert_eq!(rounds.len(), 1);
    let mut ranking = rounds[0].ranking();
    ranking[2..].sort();
    let mut expected = vec![
        (a.clone(), 1u32),
        (b.clone(), 2),
        (c.clone(), 3),
        (d.clone(), 3),
    ];
    expected[2..].sort();
    assert_eq!(ranking, expected);

    let table = &report.snapshot.category(SizeCategory::Large).unwrap().table;
    let initial = SkillRating::default();
    let rating = |team| table.get(team).unwrap().rating;

    assert!(rating(&a).mu - initial.mu > rating(&b).mu - initial.mu);
    for eliminated in [&c, &d] {
        assert!(rating(eliminated).sigma < initial.sigma);
        assert!(rating(eliminated).mu <= rating(&a).mu);
        assert!(rating(eliminated).mu <= rating(&b).mu);
    }

    let leaderboard = report.leaderboard.category(SizeCategory::Large).unwrap();
    assert_eq!(leaderboard.entries.len(), 4);
    assert_eq!(leaderboard.entries[0].team_id, a);
    assert_eq!(leaderboard.entries[0].handler, "Alice Able");
    assert_eq!(leaderboard.entries[1].team_id, b);
}

#[test]
fn test_call_name_and_marked_registered_name_share_team() {
    let dir = ResultsDir::new();
    dir.write_registry(&[
        Competition {
            id: "winter_cup",
            date: "2024-01-20",
            tier: 3,
            name: "Winter Cup",
        },
        Competition {
            id: "summer_cup",
            date: "2024-07-14",
            tier: 3,
            name: "Summer Cup",
        },
    ]);
    dir.write_results(
        "winter_cup",
        "large",
        &[
            ResultRow::ranked("jumping_1", "Large", 1, "Jana Svobodová", "Day").with_country("CZE"),
            ResultRow::ranked("jumping_1", "Large", 2, "Eva Eastman", "Echo"),
            ResultRow::ranked("jumping_1", "Large", 3, "Finn Ford", "Fable"),
            ResultRow::ranked("jumping_1", "Large", 4, "Gus Grant", "Gizmo"),
        ],
    );
    dir.write_results(
        "summer_cup",
        "large",
        &[
            ResultRow::ranked("jumping_1", "Large", 2, "Eva Eastman", "Echo"),
            ResultRow::ranked(
                "jumping_1",
                "Large",
                1,
                "Svobodová, Jana",
                "Daylight Neverending Force (Day)",
            ),
            ResultRow::ranked("jumping_1", "Large", 3, "Finn Ford", "Fable"),
            ResultRow::eliminated("jumping_1", "Large", "Gus Grant", "Gizmo"),
        ],
    );

    let pipeline = RatingPipeline::new(dir.config(small_field_config(4))).unwrap();
    let report = pipeline.run().unwrap();

    let team = pipeline.normalizer().make_team_id("Jana Svobodová", "Day");
    assert_eq!(
        pipeline
            .normalizer()
            .make_team_id("Svobodová, Jana", "Daylight Neverending Force (Day)"),
        team
    );

    let table = &report.snapshot.category(SizeCategory::Large).unwrap().table;
    assert_eq!(table.len(), 4);
    let rating = table.get(&team).unwrap();
    assert_eq!(rating.num_runs, 2);
    assert_eq!(rating.top3_runs, 2);
    assert_eq!(rating.last_competition.as_ref().unwrap().name, "Summer Cup");

    let profile = &report.profiles[&team];
    assert_eq!(profile.handler_display, "Jana Svobodová");
    assert_eq!(profile.dog_display, "Daylight Neverending Force (Day)");
    assert_eq!(profile.country, "CZE");
}

#[test]
fn test_registered_only_spelling_merges_into_call_name() {
    let normalizer = NameNormalizer::new(AliasTables::empty()).unwrap();
    let mut runs: Vec<_> = [("a", 0, "Day"), ("b", 7, "Daylight Neverending Force")]
        .iter()
        .map(|&(competition, day, animal)| {
            let mut r = run(competition, day, "r1", "Jana Svobodová", animal, Placement::Ranked(1));
            r.team_id = normalizer.make_team_id("Jana Svobodová", animal);
            r
        })
        .collect();
    assert_ne!(runs[0].team_id, runs[1].team_id);

    let report = IdentityResolver::new(&normalizer).resolve(&mut runs);
    assert_eq!(report.merges.len(), 1);
    assert_eq!(report.runs_repointed, 1);

    let expected = normalizer.make_team_id("Jana Svobodová", "Day");
    assert!(runs.iter().all(|r| r.team_id == expected));
}

#[test]
fn test_competition_taken_from_directory() {
    let dir = single_competition_dir();
    let teams = [
        ("Alice Able", "Ace"),
        ("Bob Baker", "Bolt"),
        ("Cleo Cole", "Cosmo"),
        ("Dan Drake", "Dash"),
    ];
    let rows: Vec<ResultRow> = teams
        .iter()
        .enumerate()
        .map(|(idx, &(handler, dog))| {
            let mut row = ResultRow::ranked("agility_1", "L", idx as u32 + 1, handler, dog);
            row.competition = "Spring Open 2024".to_string();
            row
        })
        .collect();
    dir.write_results("spring_open", "large", &rows);

    let pipeline = RatingPipeline::new(dir.config(small_field_config(4))).unwrap();
    let report = pipeline.run().unwrap();

    assert_eq!(report.load.rows_loaded, 4);
    assert!(report.load.dropped.is_empty());
    let category = report.snapshot.category(SizeCategory::Large).unwrap();
    assert_eq!(category.table.len(), 4);
    assert!(report.snapshot.competitions.contains_key("spring_open"));
    assert_eq!(report.leaderboard.len(), 4);
}

#[test]
fn test_rows_are_dropped_and_counted() {
    let dir = single_competition_dir();
    let mut team_round = ResultRow::ranked("team_1", "L", 1, "Team Lead", "Tux");
    team_round.is_team_round = "True".to_string();
    team_round.discipline = "Team".to_string();
    let mut display_name = ResultRow::ranked("agility_1", "L", 4, "Other Person", "Odin");
    display_name.competition = "Unregistered Event".to_string();

    dir.write_results(
        "spring_open",
        "mixed",
        &[
            ResultRow::ranked("agility_1", "L", 1, "Alice Able", "Ace"),
            ResultRow::ranked("agility_1", "XL", 2, "Bob Baker", "Bolt"),
            ResultRow::ranked("agility_1", "L", 3, "", ""),
            team_round,
            display_name,
        ],
    );
    dir.write_results(
        "not_in_registry",
        "large",
        &[ResultRow::ranked("agility_1", "L", 1, "Alice Able", "Ace")],
    );

    let pipeline = RatingPipeline::new(dir.config(small_field_config(4))).unwrap();
    let report = pipeline.run().unwrap();

    // The competition column never decides where a row belongs
    assert_eq!(report.load.rows_loaded, 2);
    assert_eq!(report.load.dropped[&RowRejection::UnknownSize], 1);
    assert_eq!(report.load.dropped[&RowRejection::MissingIdentity], 1);
    assert_eq!(report.load.dropped[&RowRejection::TeamRound], 1);
    assert!(!report.load.dropped.contains_key(&RowRejection::UnknownCompetition));
    assert_eq!(report.load.skipped_directories, vec!["not_in_registry".to_string()]);

    // Two teams are below the field threshold
    let category = report.snapshot.category(SizeCategory::Large).unwrap();
    assert!(category.table.is_empty());
    assert_eq!(category.stats.skipped_field_too_small, 1);
}

#[test]
fn test_start_number_recovers_missing_identity() {
    let dir = single_competition_dir();
    let names = [
        ("Alice Able", "Ace"),
        ("Bob Baker", "Bolt"),
        ("Cleo Cole", "Cosmo"),
        ("Dan Drake", "Dash"),
    ];

    let mut rows = Vec::new();
    for (idx, &(handler, dog)) in names.iter().enumerate() {
        let idx = idx as u32;
        rows.push(ResultRow::ranked("agility_1", "L", idx + 1, handler, dog).with_start_no(idx + 10));
    }
    // Alice's second row lost its names but kept the start number
    for (idx, &(handler, dog)) in names.iter().enumerate() {
        let (handler, dog) = if idx == 0 { ("", "") } else { (handler, dog) };
        let idx = idx as u32;
        rows.push(ResultRow::ranked("jumping_1", "L", 4 - idx, handler, dog).with_start_no(idx + 10));
    }
    dir.write_results("spring_open", "large", &rows);

    let pipeline = RatingPipeline::new(dir.config(small_field_config(4))).unwrap();
    let report = pipeline.run().unwrap();

    assert_eq!(report.load.recovered_from_start_no, 1);
    let alice = pipeline.normalizer().make_team_id("Alice Able", "Ace");
    let table = &report.snapshot.category(SizeCategory::Large).unwrap().table;
    assert_eq!(table.get(&alice).unwrap().num_runs, 2);
}

#[test]
fn test_rerun_produces_identical_results() {
    let dir = single_competition_dir();
    let teams = [
        "Alice Able",
        "Bob Baker",
        "Cleo Cole",
        "Dan Drake",
        "Eva Eastman",
        "Finn Ford",
    ];
    let rows: Vec<ResultRow> = (1..=3)
        .flat_map(|r| {
            teams.iter().enumerate().map(move |(idx, handler)| {
                let rank = ((idx + r) % teams.len()) as u32 + 1;
                ResultRow::ranked(&format!("agility_{}", r), "M", rank, handler, "Dog")
            })
        })
        .collect();
    dir.write_results("spring_open", "medium", &rows);

    let pipeline = RatingPipeline::new(dir.config(small_field_config(6))).unwrap();
    let first = pipeline.run().unwrap();
    let second = pipeline.run().unwrap();

    assert_eq!(first.snapshot, second.snapshot);
    assert_eq!(first.leaderboard, second.leaderboard);
    assert_eq!(first.leaderboard.len(), teams.len());
}

#[test]
fn test_export_writes_leaderboards() {
    let dir = single_competition_dir();
    dir.write_results(
        "spring_open",
        "small",
        &[
            ResultRow::ranked("agility_1", "S", 1, "Alice Able", "Ace"),
            ResultRow::ranked("agility_1", "S", 2, "Bob Baker", "Bolt"),
            ResultRow::ranked("agility_1", "S", 3, "Cleo Cole", "Cosmo"),
            ResultRow::ranked("agility_1", "S", 4, "Dan Drake", "Dash"),
        ],
    );

    let config = dir.config(small_field_config(4));
    let csv_path = config.ratings_csv_path();
    let json_path = config.ratings_json_path();
    let pipeline = RatingPipeline::new(config).unwrap();
    let report = pipeline.run().unwrap();
    pipeline.export(&report).unwrap();

    let csv = fs::read_to_string(csv_path).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("rank,team_id,handler"));
    assert!(lines.next().unwrap().starts_with("1,"));
    assert_eq!(csv.lines().count(), 5);
    assert!(json_path.exists());

    let metrics = pipeline.metrics().gather_text().unwrap();
    assert!(metrics.contains("adw_rating_teams_ranked{size=\"Small\"} 4"));
}

#[test]
fn test_clean_only_policy_keeps_eliminated_teams_unrated() {
    let mut runs = round("open", 0, "r1", &["a", "b", "c", "d", "e"], 2);
    runs.extend(round("open", 0, "r2", &["a", "b", "c", "d", "e"], 0));

    let mut config = small_field_config(3);
    config.eliminated = EliminatedPolicy::Ignored;
    let snapshot = RatingEngine::new(config).unwrap().run(&runs).unwrap();

    let table = &snapshot.category(SizeCategory::Large).unwrap().table;
    let d = table.get(&adw_rating::TeamId::new("d", "dog")).unwrap();
    assert_eq!(d.num_runs, 1);
    assert_eq!(table.get(&adw_rating::TeamId::new("a", "dog")).unwrap().num_runs, 2);
}
