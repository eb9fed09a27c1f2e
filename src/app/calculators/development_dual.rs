use super::{group_by_athlete, ranked_athlete, wrong_rules, Diagnostics, RankingContext};
use crate::config::procedure_config::{
    CalculatorKind, DevelopmentDualRules, ProcedureConfig, ProcedureRules,
};
use crate::core::eligibility::{self, Category};
use crate::core::quota::{self, QuotaCandidate, QuotaPlan, Stage};
use crate::core::ranking::{assign_ranks, RankKeys};
use crate::core::scoring::{self, DualScores};
use crate::domain::model::{
    Apparatus, Athlete, AthleteId, CompetitionResult, RankingOutcome, ScoreDetail, SkipReason,
};
use crate::domain::ports::ProcedureCalculator;
use crate::utils::error::{Result, SelectionError};
use regex::Regex;
use std::collections::BTreeMap;

/// Development programme selection on two scores: the best competition qualification
/// score and the best score from testing events. The selection plan decides which of the
/// two ranks each quota step. There is no score gate.
pub struct DevelopmentDualCalculator;

struct Calculation<'r> {
    athlete: &'r Athlete,
    category: Category,
    scores: DualScores,
}

impl Calculation<'_> {
    fn qualification(&self) -> f64 {
        self.scores.qualification.unwrap_or(0.0)
    }

    fn testing(&self) -> f64 {
        self.scores.testing.unwrap_or(0.0)
    }
}

struct Selected<'r> {
    calc: Calculation<'r>,
    stage: Stage,
}

fn evaluate<'r>(
    rows: &[&'r CompetitionResult],
    rules: &DevelopmentDualRules,
    context: &RankingContext<'_>,
    testing_events: &Regex,
) -> std::result::Result<Calculation<'r>, SkipReason> {
    let athlete = &rows[0].athlete;

    scoring::check_scores(rows)?;
    let age = eligibility::screen_athlete(athlete, rows, context.division, context.year)?;
    let category = eligibility::classify(&athlete.level, age, &rules.eligible_levels)?;

    Ok(Calculation {
        athlete,
        category,
        scores: scoring::split_best(rows, testing_events),
    })
}

impl ProcedureCalculator for DevelopmentDualCalculator {
    fn kind(&self) -> CalculatorKind {
        CalculatorKind::DevelopmentDual
    }

    fn calculate_ranking(
        &self,
        apparatus: Apparatus,
        division: &str,
        results: &[CompetitionResult],
        procedure: &ProcedureConfig,
    ) -> Result<RankingOutcome> {
        let ProcedureRules::DevelopmentDual(rules) = &procedure.rules else {
            return Err(wrong_rules(procedure, self.kind()));
        };
        let context = RankingContext::resolve(procedure, division)?;
        let testing_events = Regex::new(&rules.testing_event_pattern).map_err(|e| {
            SelectionError::misconfigured(
                &procedure.name,
                format!("invalid testing_event_pattern: {}", e),
            )
        })?;

        let mut diagnostics = Diagnostics::default();
        let mut calculations = Vec::new();

        for (athlete_id, rows) in group_by_athlete(results, apparatus, division) {
            match evaluate(&rows, rules, &context, &testing_events) {
                Ok(calculation) => calculations.push(calculation),
                Err(reason) => diagnostics.skip(athlete_id, reason),
            }
        }

        let candidates: Vec<QuotaCandidate> = calculations
            .iter()
            .map(|calc| QuotaCandidate {
                id: calc.athlete.id.clone(),
                category: calc.category.key.clone(),
                level: calc.category.level.clone(),
                qualification: calc.qualification(),
                testing: calc.testing(),
                qualifies: true,
            })
            .collect();

        let steps = rules
            .selection_plan
            .get(apparatus)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let plan = QuotaPlan {
            priority: steps,
            max_roster: rules.team_size_for(apparatus),
            ..Default::default()
        };
        let stages: BTreeMap<AthleteId, Stage> = quota::allocate(&candidates, &plan)
            .into_iter()
            .map(|selection| (selection.candidate.id.clone(), selection.stage))
            .collect();

        let mut selected = Vec::with_capacity(stages.len());
        for calc in calculations {
            match stages.get(&calc.athlete.id) {
                Some(stage) => selected.push(Selected {
                    calc,
                    stage: *stage,
                }),
                None => diagnostics.skip(&calc.athlete.id, SkipReason::NotSelected),
            }
        }

        let keys = RankKeys::primary_only(
            |s: &Selected<'_>| s.calc.athlete.id.as_str(),
            |s| s.calc.qualification(),
        );

        let ranked = assign_ranks(selected, &keys)
            .into_iter()
            .map(|entry| {
                let Selected { calc, stage } = &entry.item;
                let contributing = BTreeMap::from([
                    (
                        "qualification_score".to_string(),
                        ScoreDetail::Score(calc.qualification()),
                    ),
                    (
                        "testing_score".to_string(),
                        ScoreDetail::Score(calc.testing()),
                    ),
                    (
                        "category".to_string(),
                        ScoreDetail::Label(calc.category.key.clone()),
                    ),
                    (
                        "selection_stage".to_string(),
                        ScoreDetail::Label(stage.as_str().to_string()),
                    ),
                ]);
                ranked_athlete(&entry, calc.athlete, calc.qualification(), contributing)
            })
            .collect();

        Ok(RankingOutcome {
            ranked,
            skipped: diagnostics.into_skipped(),
        })
    }
}
