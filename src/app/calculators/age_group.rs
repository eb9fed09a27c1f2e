use super::{group_by_athlete, ranked_athlete, wrong_rules, Diagnostics, RankingContext};
use crate::config::procedure_config::{
    AgeGroupRules, CalculatorKind, ProcedureConfig, ProcedureRules,
};
use crate::core::eligibility;
use crate::core::ranking::{assign_ranks, RankKeys};
use crate::core::scoring::{self, TopScores};
use crate::core::thresholds::{self, ThresholdBars, ThresholdFlags, ThresholdMode, ThresholdPolicy};
use crate::domain::model::{
    Apparatus, Athlete, CompetitionResult, RankingOutcome, ScoreDetail, SkipReason,
};
use crate::domain::ports::ProcedureCalculator;
use crate::utils::error::Result;
use std::collections::BTreeMap;

const POLICY: ThresholdPolicy = ThresholdPolicy {
    preferential: ThresholdMode::AnySingleResult {
        include_finals: false,
    },
    minimum: ThresholdMode::AnySingleResult {
        include_finals: false,
    },
};

/// Age-group championship selection. Only qualification scores count, and a division
/// may require the athlete to have competed at a given level.
pub struct AgeGroupChampionshipCalculator;

struct Calculation<'r> {
    athlete: &'r Athlete,
    scores: TopScores,
    highest_qualification: f64,
    flags: ThresholdFlags,
}

fn evaluate<'r>(
    rows: &[&'r CompetitionResult],
    rules: &AgeGroupRules,
    context: &RankingContext<'_>,
    apparatus: Apparatus,
) -> std::result::Result<Calculation<'r>, SkipReason> {
    let athlete = &rows[0].athlete;

    scoring::check_scores(rows)?;
    eligibility::screen_athlete(athlete, rows, context.division, context.year)?;
    scoring::check_min_events(rows, rules.min_events_attended)?;

    let scores = scoring::top_qualification_and_final(rows, rules.qualification_count, 0);
    let bars = ThresholdBars::lookup(context.division, apparatus, athlete.gender);

    Ok(Calculation {
        athlete,
        highest_qualification: scoring::best_qualification(rows).unwrap_or(0.0),
        flags: thresholds::evaluate(bars, POLICY, scores.total, rows),
        scores,
    })
}

impl ProcedureCalculator for AgeGroupChampionshipCalculator {
    fn kind(&self) -> CalculatorKind {
        CalculatorKind::AgeGroupChampionship
    }

    fn calculate_ranking(
        &self,
        apparatus: Apparatus,
        division: &str,
        results: &[CompetitionResult],
        procedure: &ProcedureConfig,
    ) -> Result<RankingOutcome> {
        let ProcedureRules::AgeGroupChampionship(rules) = &procedure.rules else {
            return Err(wrong_rules(procedure, self.kind()));
        };
        let context = RankingContext::resolve(procedure, division)?;

        let mut diagnostics = Diagnostics::default();
        let mut calculations = Vec::new();

        for (athlete_id, rows) in group_by_athlete(results, apparatus, division) {
            match evaluate(&rows, rules, &context, apparatus) {
                Ok(calculation) => calculations.push(calculation),
                Err(reason) => diagnostics.skip(athlete_id, reason),
            }
        }

        let keys = RankKeys::with_secondary(
            |c: &Calculation<'_>| c.athlete.id.as_str(),
            |c| c.scores.total,
            |c| c.highest_qualification,
        );

        let ranked = assign_ranks(calculations, &keys)
            .into_iter()
            .map(|entry| {
                let calc = &entry.item;
                let contributing = BTreeMap::from([
                    (
                        "qualification".to_string(),
                        ScoreDetail::Scores(calc.scores.qualification.clone()),
                    ),
                    (
                        "highest_qualification".to_string(),
                        ScoreDetail::Score(calc.highest_qualification),
                    ),
                ]);

                let mut ranked =
                    ranked_athlete(&entry, calc.athlete, calc.scores.total, contributing);
                ranked.meets_preferential_threshold = calc.flags.preferential;
                ranked.meets_minimum_threshold = calc.flags.minimum;
                ranked.tie_break_info =
                    Some(format!("Highest Qual: {:.3}", calc.highest_qualification));
                ranked
            })
            .collect();

        Ok(RankingOutcome {
            ranked,
            skipped: diagnostics.into_skipped(),
        })
    }
}
