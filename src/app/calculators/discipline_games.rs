use super::{group_by_athlete, ranked_athlete, wrong_rules, Diagnostics, RankingContext};
use crate::config::procedure_config::{
    CalculatorKind, DisciplineGamesRules, ProcedureConfig, ProcedureRules,
};
use crate::core::eligibility;
use crate::core::ranking::{assign_ranks, RankKeys};
use crate::core::scoring::{self, TopScores};
use crate::domain::model::{
    Apparatus, Athlete, CompetitionResult, RankingOutcome, ScoreDetail, SkipReason,
};
use crate::domain::ports::ProcedureCalculator;
use crate::utils::error::Result;
use std::collections::BTreeMap;

/// Multi-sport games selection: the highest scores of any kind, pooled across events.
/// No thresholds apply.
pub struct DisciplineGamesCalculator;

struct Calculation<'r> {
    athlete: &'r Athlete,
    scores: TopScores,
}

fn evaluate<'r>(
    rows: &[&'r CompetitionResult],
    rules: &DisciplineGamesRules,
    context: &RankingContext<'_>,
) -> std::result::Result<Calculation<'r>, SkipReason> {
    let athlete = &rows[0].athlete;

    scoring::check_scores(rows)?;
    eligibility::screen_athlete(athlete, rows, context.division, context.year)?;
    scoring::check_min_events(rows, rules.min_events_attended)?;

    Ok(Calculation {
        athlete,
        scores: scoring::highest_overall(rows, rules.score_count),
    })
}

impl ProcedureCalculator for DisciplineGamesCalculator {
    fn kind(&self) -> CalculatorKind {
        CalculatorKind::DisciplineGames
    }

    fn calculate_ranking(
        &self,
        apparatus: Apparatus,
        division: &str,
        results: &[CompetitionResult],
        procedure: &ProcedureConfig,
    ) -> Result<RankingOutcome> {
        let ProcedureRules::DisciplineGames(rules) = &procedure.rules else {
            return Err(wrong_rules(procedure, self.kind()));
        };
        let context = RankingContext::resolve(procedure, division)?;

        let mut diagnostics = Diagnostics::default();
        let mut calculations = Vec::new();

        for (athlete_id, rows) in group_by_athlete(results, apparatus, division) {
            match evaluate(&rows, rules, &context) {
                Ok(calculation) => calculations.push(calculation),
                Err(reason) => diagnostics.skip(athlete_id, reason),
            }
        }

        let keys = RankKeys::primary_only(
            |c: &Calculation<'_>| c.athlete.id.as_str(),
            |c| c.scores.total,
        );

        let ranked = assign_ranks(calculations, &keys)
            .into_iter()
            .map(|entry| {
                let calc = &entry.item;
                let contributing = BTreeMap::from([(
                    "top_scores".to_string(),
                    ScoreDetail::Scores(calc.scores.qualification.clone()),
                )]);
                ranked_athlete(&entry, calc.athlete, calc.scores.total, contributing)
            })
            .collect();

        Ok(RankingOutcome {
            ranked,
            skipped: diagnostics.into_skipped(),
        })
    }
}
