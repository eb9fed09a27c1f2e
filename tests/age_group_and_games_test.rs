mod common;

use common::{flatten, service, AthleteResults};
use selection_procedures::domain::model::{Apparatus, Gender, ScoreDetail, SkipReason};

#[test]
fn test_wagc_senior_division_requires_senior_elite_result() {
    let results = flatten(vec![
        AthleteResults::new("senior", "2007-08-01", Gender::Male, "senior_elite")
            .on(Apparatus::DoubleMini, "17-21")
            .event("2025_winter_classic", 51.0, Some(52.0))
            .event("2025_elite_challenge", 49.0, None)
            .build(),
        AthleteResults::new("junior", "2007-02-01", Gender::Male, "junior_elite")
            .on(Apparatus::DoubleMini, "17-21")
            .event("2025_winter_classic", 55.0, None)
            .event("2025_elite_challenge", 55.0, None)
            .build(),
        AthleteResults::new("too_old", "2003-01-01", Gender::Male, "senior_elite")
            .on(Apparatus::DoubleMini, "17-21")
            .event("2025_winter_classic", 55.0, None)
            .build(),
    ]);

    let outcome = service()
        .rank("2025_wagc", "double-mini", "17-21", &results)
        .unwrap();

    assert_eq!(outcome.ranked.len(), 1);
    let senior = outcome.find("senior").unwrap();
    assert_eq!(senior.rank, 1);
    // Qualification scores only; the final is ignored.
    assert!((senior.combined_score - 100.0).abs() < 1e-9);
    // Best single qualification 51.0 against 52.0 / 50.0.
    assert!(!senior.meets_preferential_threshold);
    assert!(senior.meets_minimum_threshold);

    assert_eq!(
        outcome.skip_reason("junior"),
        Some(&SkipReason::MissingRequiredLevel {
            level: "senior_elite".to_string()
        })
    );
    assert!(matches!(
        outcome.skip_reason("too_old"),
        Some(SkipReason::OutsideAgeRange { age: 22, .. })
    ));
}

#[test]
fn test_wagc_younger_division_needs_no_level() {
    let results = AthleteResults::new("kid", "2011-05-05", Gender::Female, "level_10")
        .on(Apparatus::Tumbling, "13-14")
        .event("2025_winter_classic", 44.0, None)
        .build();

    let outcome = service()
        .rank("2025_wagc", "tumbling", "13-14", &results)
        .unwrap();

    let kid = outcome.find("kid").unwrap();
    assert_eq!(kid.rank, 1);
    assert!(kid.meets_preferential_threshold);
    assert!(kid.meets_minimum_threshold);
}

#[test]
fn test_world_games_sums_highest_scores_of_any_kind() {
    let results = flatten(vec![
        AthleteResults::new("u", "1998-01-01", Gender::Female, "senior_elite")
            .event("2025_winter_classic", 55.0, Some(56.5))
            .event("2025_elite_challenge", 54.0, None)
            .build(),
        AthleteResults::new("v", "1999-01-01", Gender::Female, "senior_elite")
            .event("2025_winter_classic", 57.0, None)
            .event("2025_elite_challenge", 53.0, Some(56.0))
            .build(),
        AthleteResults::new("w", "1999-01-01", Gender::Female, "senior_elite")
            .event("2025_winter_classic", 60.0, Some(60.0))
            .build(),
    ]);

    let outcome = service()
        .rank("2025_world_games", "trampoline", "senior_elite", &results)
        .unwrap();

    let v = outcome.find("v").unwrap();
    let u = outcome.find("u").unwrap();
    assert_eq!((v.rank, u.rank), (1, 2));
    assert!((v.combined_score - 113.0).abs() < 1e-9);
    assert!((u.combined_score - 111.5).abs() < 1e-9);
    assert_eq!(
        u.contributing_scores["top_scores"],
        ScoreDetail::Scores(vec![56.5, 55.0])
    );
    assert!(!v.meets_preferential_threshold && !v.meets_minimum_threshold);
    assert!(matches!(
        outcome.skip_reason("w"),
        Some(SkipReason::InsufficientEvents { .. })
    ));
}
