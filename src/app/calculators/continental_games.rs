use super::{
    group_by_athlete, qualification_tie_narrative, ranked_athlete, wrong_rules, Diagnostics,
    RankingContext,
};
use crate::config::procedure_config::{
    CalculatorKind, ContinentalGamesRules, ProcedureConfig, ProcedureRules,
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

/// Continental games selection for a small roster. Athletes on the procedure's exclusion
/// list are never ranked, and tie-breaks on the highest qualification score are
/// explained in the output.
pub struct ContinentalGamesCalculator;

struct Calculation<'r> {
    athlete: &'r Athlete,
    scores: TopScores,
    highest_qualification: f64,
}

fn evaluate<'r>(
    rows: &[&'r CompetitionResult],
    rules: &ContinentalGamesRules,
    context: &RankingContext<'_>,
) -> std::result::Result<Calculation<'r>, SkipReason> {
    let athlete = &rows[0].athlete;

    if rules.excluded_athletes.contains(&athlete.id) {
        return Err(SkipReason::Excluded);
    }

    scoring::check_scores(rows)?;
    eligibility::screen_athlete(athlete, rows, context.division, context.year)?;
    scoring::check_min_events(rows, rules.min_events_attended)?;

    let scores =
        scoring::top_qualification_and_final(rows, rules.qualification_count, rules.final_count);

    Ok(Calculation {
        athlete,
        highest_qualification: scores.qualification.first().copied().unwrap_or(0.0),
        scores,
    })
}

impl ProcedureCalculator for ContinentalGamesCalculator {
    fn kind(&self) -> CalculatorKind {
        CalculatorKind::ContinentalGames
    }

    fn calculate_ranking(
        &self,
        apparatus: Apparatus,
        division: &str,
        results: &[CompetitionResult],
        procedure: &ProcedureConfig,
    ) -> Result<RankingOutcome> {
        let ProcedureRules::ContinentalGames(rules) = &procedure.rules else {
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

        let keys = RankKeys::with_secondary(
            |c: &Calculation<'_>| c.athlete.id.as_str(),
            |c| c.scores.total,
            |c| c.highest_qualification,
        )
        .policy(rules.tie_break);

        let ranked = assign_ranks(calculations, &keys)
            .into_iter()
            .map(|entry| {
                let calc = &entry.item;
                let mut contributing = BTreeMap::from([
                    (
                        "qualification".to_string(),
                        ScoreDetail::Scores(calc.scores.qualification.clone()),
                    ),
                    (
                        "final".to_string(),
                        ScoreDetail::Scores(calc.scores.finals.clone()),
                    ),
                    (
                        "highest_qualification".to_string(),
                        ScoreDetail::Score(calc.highest_qualification),
                    ),
                ]);
                if let Some(highest_final) = calc.scores.finals.first() {
                    contributing.insert(
                        "highest_final".to_string(),
                        ScoreDetail::Score(*highest_final),
                    );
                }

                let mut ranked =
                    ranked_athlete(&entry, calc.athlete, calc.scores.total, contributing);
                ranked.tie_break_info = qualification_tie_narrative(entry.tie_break);
                ranked
            })
            .collect();

        Ok(RankingOutcome {
            ranked,
            skipped: diagnostics.into_skipped(),
        })
    }
}
