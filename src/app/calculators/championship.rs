use super::{group_by_athlete, ranked_athlete, wrong_rules, Diagnostics, RankingContext};
use crate::config::procedure_config::{
    CalculatorKind, ChampionshipRules, ProcedureConfig, ProcedureRules,
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

/// Preferential bar against the combined score, minimum bar against any single
/// qualification or final score.
const POLICY: ThresholdPolicy = ThresholdPolicy {
    preferential: ThresholdMode::CombinedScore,
    minimum: ThresholdMode::AnySingleResult {
        include_finals: true,
    },
};

/// Senior championship selection: best qualification scores plus best final scores,
/// ties broken by the highest single qualification score.
pub struct ChampionshipCalculator;

struct Calculation<'r> {
    athlete: &'r Athlete,
    scores: TopScores,
    highest_qualification: f64,
    flags: ThresholdFlags,
}

fn evaluate<'r>(
    rows: &[&'r CompetitionResult],
    rules: &ChampionshipRules,
    context: &RankingContext<'_>,
    apparatus: Apparatus,
) -> std::result::Result<Calculation<'r>, SkipReason> {
    let athlete = &rows[0].athlete;

    scoring::check_scores(rows)?;
    eligibility::screen_athlete(athlete, rows, context.division, context.year)?;
    scoring::check_min_events(rows, rules.min_events_attended)?;

    let scores =
        scoring::top_qualification_and_final(rows, rules.qualification_count, rules.final_count);
    let bars = ThresholdBars::lookup(context.division, apparatus, athlete.gender);
    let flags = thresholds::evaluate(bars, POLICY, scores.total, rows);

    Ok(Calculation {
        athlete,
        highest_qualification: scoring::best_qualification(rows).unwrap_or(0.0),
        scores,
        flags,
    })
}

impl ProcedureCalculator for ChampionshipCalculator {
    fn kind(&self) -> CalculatorKind {
        CalculatorKind::Championship
    }

    fn calculate_ranking(
        &self,
        apparatus: Apparatus,
        division: &str,
        results: &[CompetitionResult],
        procedure: &ProcedureConfig,
    ) -> Result<RankingOutcome> {
        let ProcedureRules::Championship(rules) = &procedure.rules else {
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
                let mut contributing = BTreeMap::new();
                contributing.insert(
                    "qualification".to_string(),
                    ScoreDetail::Scores(calc.scores.qualification.clone()),
                );
                contributing.insert(
                    "final".to_string(),
                    ScoreDetail::Scores(calc.scores.finals.clone()),
                );
                contributing.insert(
                    "highest_qualification".to_string(),
                    ScoreDetail::Score(calc.highest_qualification),
                );

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
