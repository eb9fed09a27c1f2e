use super::{group_by_athlete, ranked_athlete, wrong_rules, Diagnostics, RankingContext};
use crate::config::procedure_config::{
    CalculatorKind, DevelopmentGateRules, ProcedureConfig, ProcedureRules,
};
use crate::core::eligibility::{self, Category};
use crate::core::quota::{self, QuotaCandidate, QuotaPlan, Stage};
use crate::core::ranking::{assign_ranks, RankKeys};
use crate::core::scoring;
use crate::core::thresholds;
use crate::domain::model::{
    Apparatus, Athlete, AthleteId, CompetitionResult, RankingOutcome, ScoreDetail, SkipReason,
};
use crate::domain::ports::ProcedureCalculator;
use crate::utils::error::Result;
use std::collections::BTreeMap;

/// Development programme selection with a minimum-score gate. Athletes are placed in
/// level and age-group categories, and the roster is filled by the quota waterfall with
/// priority categories served first.
pub struct DevelopmentGateCalculator;

struct Calculation<'r> {
    athlete: &'r Athlete,
    category: Category,
    best_qualification: f64,
    minimum_score: f64,
    meets_minimum: bool,
}

struct Selected<'r> {
    calc: Calculation<'r>,
    stage: Stage,
}

fn evaluate<'r>(
    rows: &[&'r CompetitionResult],
    rules: &DevelopmentGateRules,
    context: &RankingContext<'_>,
    apparatus: Apparatus,
) -> std::result::Result<Calculation<'r>, SkipReason> {
    let athlete = &rows[0].athlete;

    scoring::check_scores(rows)?;
    let age = eligibility::screen_athlete(athlete, rows, context.division, context.year)?;
    let category = eligibility::classify(&athlete.level, age, &rules.eligible_levels)?;

    let best_qualification = scoring::best_qualification(rows).unwrap_or(0.0);
    let minimum_score = rules.min_score_for(apparatus, athlete.gender);

    Ok(Calculation {
        athlete,
        category,
        best_qualification,
        minimum_score,
        meets_minimum: thresholds::meets(best_qualification, Some(minimum_score)),
    })
}

impl ProcedureCalculator for DevelopmentGateCalculator {
    fn kind(&self) -> CalculatorKind {
        CalculatorKind::DevelopmentGate
    }

    fn calculate_ranking(
        &self,
        apparatus: Apparatus,
        division: &str,
        results: &[CompetitionResult],
        procedure: &ProcedureConfig,
    ) -> Result<RankingOutcome> {
        let ProcedureRules::DevelopmentGate(rules) = &procedure.rules else {
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

        let candidates: Vec<QuotaCandidate> = calculations
            .iter()
            .map(|calc| QuotaCandidate {
                id: calc.athlete.id.clone(),
                category: calc.category.key.clone(),
                level: calc.category.level.clone(),
                qualification: calc.best_qualification,
                testing: 0.0,
                qualifies: calc.meets_minimum,
            })
            .collect();

        let plan = QuotaPlan {
            priority: &rules.priority,
            gate_priority: true,
            extra_selection: rules.extra_selection_for(apparatus),
            category_minimums: &rules.category_minimums,
            max_roster: rules.team_size_for(apparatus),
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
            |s| s.calc.best_qualification,
        );

        let ranked = assign_ranks(selected, &keys)
            .into_iter()
            .map(|entry| {
                let Selected { calc, stage } = &entry.item;
                let contributing = BTreeMap::from([
                    (
                        "qualification_score".to_string(),
                        ScoreDetail::Score(calc.best_qualification),
                    ),
                    (
                        "minimum_score".to_string(),
                        ScoreDetail::Score(calc.minimum_score),
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

                let mut ranked =
                    ranked_athlete(&entry, calc.athlete, calc.best_qualification, contributing);
                ranked.meets_minimum_threshold = calc.meets_minimum;
                ranked
            })
            .collect();

        Ok(RankingOutcome {
            ranked,
            skipped: diagnostics.into_skipped(),
        })
    }
}
