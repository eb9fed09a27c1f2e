mod common;

use common::{flatten, shipped_config, AthleteResults};
use selection_procedures::config::ProcedureRules;
use selection_procedures::core::ranking::TieBreakPolicy;
use selection_procedures::domain::model::{Apparatus, AthleteId, Gender, ScoreDetail, SkipReason};
use selection_procedures::{CompetitionResult, RankingService};

const PAN_AM: &str = "2025_junior_pan_am";

fn junior(id: &str, dob: &str) -> AthleteResults {
    AthleteResults::new(id, dob, Gender::Female, "junior_elite").on(Apparatus::Trampoline, "female")
}

fn field() -> Vec<CompetitionResult> {
    flatten(vec![
        junior("p", "2008-05-01")
            .event("winter_classic", 50.0, Some(51.0))
            .event("elite_challenge", 49.0, None)
            .build(),
        junior("q", "2009-05-01")
            .event("winter_classic", 49.5, Some(51.5))
            .event("elite_challenge", 49.0, None)
            .build(),
        junior("world_games", "2006-05-01")
            .event("winter_classic", 56.0, Some(57.0))
            .event("elite_challenge", 55.0, None)
            .build(),
        junior("single", "2008-05-01")
            .event("usa_gymnastics_championships", 52.0, Some(52.0))
            .build(),
    ])
}

fn service_with(policy: TieBreakPolicy) -> RankingService {
    let mut config = shipped_config();
    let procedure = config.procedures.get_mut(PAN_AM).unwrap();
    let ProcedureRules::ContinentalGames(rules) = &mut procedure.rules else {
        panic!("expected continental games rules");
    };
    rules.excluded_athletes.push(AthleteId::from("world_games"));
    rules.tie_break = policy;
    RankingService::new(config)
}

#[test]
fn test_tie_break_narratives() {
    let outcome = service_with(TieBreakPolicy::SeparateRanks)
        .rank(PAN_AM, "trampoline", "female", &field())
        .unwrap();

    assert_eq!(outcome.ranked.len(), 2);
    let p = outcome.find("p").unwrap();
    let q = outcome.find("q").unwrap();
    assert_eq!((p.rank, q.rank), (1, 2));
    assert!((p.combined_score - 150.0).abs() < 1e-9);
    assert!((q.combined_score - 150.0).abs() < 1e-9);
    assert_eq!(
        p.tie_break_info.as_deref(),
        Some("Won tie-breaker with higher qualification score: 50.000 vs 49.500")
    );
    assert_eq!(
        q.tie_break_info.as_deref(),
        Some("Lost tie-breaker with lower qualification score: 49.500 vs 50.000")
    );
    assert_eq!(q.contributing_scores["highest_final"], ScoreDetail::Score(51.5));
    assert!(!p.meets_preferential_threshold && !p.meets_minimum_threshold);
}

#[test]
fn test_excluded_athlete_is_never_ranked() {
    let outcome = service_with(TieBreakPolicy::SeparateRanks)
        .rank(PAN_AM, "trampoline", "female", &field())
        .unwrap();

    assert!(outcome.find("world_games").is_none());
    assert_eq!(outcome.skip_reason("world_games"), Some(&SkipReason::Excluded));
    assert!(matches!(
        outcome.skip_reason("single"),
        Some(SkipReason::InsufficientEvents { .. })
    ));
}

#[test]
fn test_share_rank_policy_keeps_tied_athletes_together() {
    let outcome = service_with(TieBreakPolicy::ShareRank)
        .rank(PAN_AM, "trampoline", "female", &field())
        .unwrap();

    assert_eq!(outcome.find("p").unwrap().rank, 1);
    assert_eq!(outcome.find("q").unwrap().rank, 1);
    assert!(outcome
        .find("q")
        .unwrap()
        .tie_break_info
        .as_deref()
        .is_some_and(|info| info.starts_with("Lost tie-breaker")));
}

#[test]
fn test_without_exclusions_everyone_eligible_is_ranked() {
    let outcome = RankingService::new(shipped_config())
        .rank(PAN_AM, "trampoline", "female", &field())
        .unwrap();

    assert_eq!(outcome.find("world_games").unwrap().rank, 1);
}
