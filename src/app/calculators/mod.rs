pub mod age_group;
pub mod championship;
pub mod continental_games;
pub mod development_dual;
pub mod development_gate;
pub mod discipline_games;

pub use age_group::AgeGroupChampionshipCalculator;
pub use championship::ChampionshipCalculator;
pub use continental_games::ContinentalGamesCalculator;
pub use development_dual::DevelopmentDualCalculator;
pub use development_gate::DevelopmentGateCalculator;
pub use discipline_games::DisciplineGamesCalculator;

use crate::config::procedure_config::{CalculatorKind, DivisionConfig, ProcedureConfig};
use crate::core::ranking::{RankedEntry, TieBreak};
use crate::domain::model::{
    Apparatus, Athlete, AthleteId, CompetitionResult, RankedAthlete, ScoreDetail, SkipReason,
    SkippedAthlete,
};
use crate::domain::ports::ProcedureCalculator;
use crate::utils::error::{Result, SelectionError};
use std::collections::BTreeMap;

/// One instance of every calculator variant.
pub fn default_calculators() -> Vec<Box<dyn ProcedureCalculator>> {
    vec![
        Box::new(ChampionshipCalculator),
        Box::new(AgeGroupChampionshipCalculator),
        Box::new(DisciplineGamesCalculator),
        Box::new(DevelopmentGateCalculator),
        Box::new(DevelopmentDualCalculator),
        Box::new(ContinentalGamesCalculator),
    ]
}

/// Division settings and evaluation year for one ranking call.
pub(crate) struct RankingContext<'p> {
    pub division: &'p DivisionConfig,
    pub year: i32,
}

impl<'p> RankingContext<'p> {
    pub fn resolve(procedure: &'p ProcedureConfig, division: &str) -> Result<Self> {
        let year = procedure.year.ok_or_else(|| {
            SelectionError::misconfigured(&procedure.name, "no evaluation year configured")
        })?;
        let (_, division) =
            procedure
                .division(division)
                .ok_or_else(|| SelectionError::UnknownDivision {
                    procedure: procedure.name.clone(),
                    division: division.to_string(),
                })?;
        Ok(Self { division, year })
    }
}

pub(crate) fn wrong_rules(procedure: &ProcedureConfig, expected: CalculatorKind) -> SelectionError {
    SelectionError::misconfigured(
        &procedure.name,
        format!(
            "rules are for the '{}' calculator, not '{}'",
            procedure.calculator().as_str(),
            expected.as_str()
        ),
    )
}

/// Results for the requested apparatus and division, grouped per athlete in id order.
pub(crate) fn group_by_athlete<'r>(
    results: &'r [CompetitionResult],
    apparatus: Apparatus,
    division: &str,
) -> BTreeMap<&'r AthleteId, Vec<&'r CompetitionResult>> {
    let mut grouped: BTreeMap<&AthleteId, Vec<&CompetitionResult>> = BTreeMap::new();
    for result in results.iter().filter(|r| r.is_in(apparatus, division)) {
        grouped.entry(&result.athlete.id).or_default().push(result);
    }
    grouped
}

/// Per-athlete exclusions collected during one ranking call.
#[derive(Default)]
pub(crate) struct Diagnostics {
    skipped: Vec<SkippedAthlete>,
}

impl Diagnostics {
    pub fn skip(&mut self, athlete_id: &AthleteId, reason: SkipReason) {
        if reason.is_data_defect() {
            tracing::warn!(athlete = %athlete_id, "skipping athlete: {}", reason);
        } else {
            tracing::debug!(athlete = %athlete_id, "athlete not ranked: {}", reason);
        }
        self.skipped.push(SkippedAthlete {
            athlete_id: athlete_id.clone(),
            reason,
        });
    }

    pub fn into_skipped(self) -> Vec<SkippedAthlete> {
        self.skipped
    }
}

/// Fields every calculator fills the same way on a ranked athlete.
pub(crate) fn ranked_athlete<T>(
    entry: &RankedEntry<T>,
    athlete: &Athlete,
    combined_score: f64,
    contributing_scores: BTreeMap<String, ScoreDetail>,
) -> RankedAthlete {
    RankedAthlete {
        athlete: athlete.clone(),
        combined_score,
        rank: entry.rank,
        meets_preferential_threshold: false,
        meets_minimum_threshold: false,
        tie_break_info: None,
        needs_manual_review: entry.needs_manual_review,
        contributing_scores,
    }
}

/// Narrative for a tie decided, or left open, by the highest qualification score.
pub(crate) fn qualification_tie_narrative(tie_break: TieBreak) -> Option<String> {
    match tie_break {
        TieBreak::None => None,
        TieBreak::Won { own, other } => Some(format!(
            "Won tie-breaker with higher qualification score: {:.3} vs {:.3}",
            own, other
        )),
        TieBreak::Lost { own, other } => Some(format!(
            "Lost tie-breaker with lower qualification score: {:.3} vs {:.3}",
            own, other
        )),
        TieBreak::Unresolved => {
            Some("Tie persists after comparing qualification scores".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Gender;

    #[test]
    fn test_every_kind_has_a_default_calculator() {
        let kinds: Vec<CalculatorKind> = default_calculators().iter().map(|c| c.kind()).collect();
        for kind in [
            CalculatorKind::Championship,
            CalculatorKind::AgeGroupChampionship,
            CalculatorKind::DisciplineGames,
            CalculatorKind::DevelopmentGate,
            CalculatorKind::DevelopmentDual,
            CalculatorKind::ContinentalGames,
        ] {
            assert!(kinds.contains(&kind), "missing {:?}", kind);
        }
    }

    #[test]
    fn test_group_by_athlete_filters_slice() {
        let make = |id: &str, apparatus: Apparatus, division: &str| CompetitionResult {
            athlete: Athlete::new(id, "2000-01-01", Gender::Male, "senior_elite"),
            event: "winter_classic".to_string(),
            apparatus,
            division: division.to_string(),
            qualification_score: 50.0,
            final_score: None,
            level: "senior_elite".to_string(),
        };
        let results = vec![
            make("2", Apparatus::Trampoline, "senior_elite"),
            make("1", Apparatus::Trampoline, "Senior_Elite"),
            make("1", Apparatus::Tumbling, "senior_elite"),
            make("3", Apparatus::Trampoline, "junior"),
        ];

        let grouped = group_by_athlete(&results, Apparatus::Trampoline, "senior_elite");
        let ids: Vec<&str> = grouped.keys().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(grouped.values().map(Vec::len).sum::<usize>(), 2);
    }

    #[test]
    fn test_tie_narratives() {
        assert_eq!(qualification_tie_narrative(TieBreak::None), None);
        assert_eq!(
            qualification_tie_narrative(TieBreak::Won {
                own: 58.1,
                other: 57.9
            })
            .as_deref(),
            Some("Won tie-breaker with higher qualification score: 58.100 vs 57.900")
        );
        assert!(qualification_tie_narrative(TieBreak::Unresolved)
            .unwrap()
            .starts_with("Tie persists"));
    }
}
