use crate::config::procedure_config::{CategoryMinimum, QuotaStep, ScoreField, StepTarget};
use crate::domain::model::AthleteId;
use serde::Serialize;
use std::collections::BTreeSet;

/// An eligible athlete as seen by the allocator.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaCandidate {
    pub id: AthleteId,
    pub category: String,
    pub level: String,
    pub qualification: f64,
    pub testing: f64,
    /// Met the procedure's score gate, if it has one.
    pub qualifies: bool,
}

impl QuotaCandidate {
    fn score(&self, field: ScoreField) -> f64 {
        match field {
            ScoreField::Qualification => self.qualification,
            ScoreField::Testing => self.testing,
        }
    }

    fn matches(&self, target: StepTarget<'_>) -> bool {
        match target {
            StepTarget::Category(category) => self.category.eq_ignore_ascii_case(category),
            StepTarget::Level(level) => self.level.eq_ignore_ascii_case(level),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Priority,
    ExtraSelection,
    CategoryMinimum,
    Backfill,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Priority => "priority",
            Stage::ExtraSelection => "extra_selection",
            Stage::CategoryMinimum => "category_minimum",
            Stage::Backfill => "backfill",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuotaPlan<'a> {
    pub priority: &'a [QuotaStep],
    /// Priority steps only consider athletes that met the score gate.
    pub gate_priority: bool,
    /// Further athletes taken from every remaining qualifying athlete.
    pub extra_selection: usize,
    pub category_minimums: &'a [CategoryMinimum],
    pub max_roster: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'c> {
    pub candidate: &'c QuotaCandidate,
    pub stage: Stage,
}

struct Roster<'c> {
    picked: Vec<Selection<'c>>,
    ids: BTreeSet<&'c AthleteId>,
    max: usize,
}

impl<'c> Roster<'c> {
    fn is_full(&self) -> bool {
        self.picked.len() >= self.max
    }

    fn room(&self) -> usize {
        self.max.saturating_sub(self.picked.len())
    }

    fn count_in(&self, category: &str) -> usize {
        self.picked
            .iter()
            .filter(|s| s.candidate.category.eq_ignore_ascii_case(category))
            .count()
    }

    /// Adds up to `count` of the best unselected candidates accepted by `filter`.
    fn take<F>(
        &mut self,
        pool: &'c [QuotaCandidate],
        filter: F,
        field: ScoreField,
        count: usize,
        stage: Stage,
    ) -> usize
    where
        F: Fn(&QuotaCandidate) -> bool,
    {
        let mut available: Vec<&'c QuotaCandidate> = pool
            .iter()
            .filter(|c| !self.ids.contains(&c.id) && filter(*c))
            .collect();
        available.sort_by(|a, b| {
            b.score(field)
                .total_cmp(&a.score(field))
                .then_with(|| a.id.cmp(&b.id))
        });

        let taken = count.min(self.room());
        for candidate in available.into_iter().take(taken) {
            self.ids.insert(&candidate.id);
            self.picked.push(Selection { candidate, stage });
        }
        self.picked.len()
    }
}

/// Fills a roster of at most `plan.max_roster` athletes in four stages: priority steps,
/// extra selection, category minimums, then backfill by qualification score. No athlete
/// is selected twice and no stage exceeds the roster size.
pub fn allocate<'c>(candidates: &'c [QuotaCandidate], plan: &QuotaPlan<'_>) -> Vec<Selection<'c>> {
    let mut roster = Roster {
        picked: Vec::new(),
        ids: BTreeSet::new(),
        max: plan.max_roster,
    };

    for step in plan.priority {
        if roster.is_full() {
            break;
        }
        let Some(target) = step.target() else {
            continue;
        };
        let before = roster.picked.len();
        let after = roster.take(
            candidates,
            |c| c.matches(target) && (!plan.gate_priority || c.qualifies),
            step.score,
            step.count,
            Stage::Priority,
        );
        tracing::debug!(
            step = ?target,
            requested = step.count,
            selected = after - before,
            "priority step"
        );
    }

    if plan.extra_selection > 0 {
        roster.take(
            candidates,
            |c| c.qualifies,
            ScoreField::Qualification,
            plan.extra_selection,
            Stage::ExtraSelection,
        );
    }

    for minimum in plan.category_minimums {
        let present = roster.count_in(&minimum.category);
        if present < minimum.count {
            roster.take(
                candidates,
                |c| c.category.eq_ignore_ascii_case(&minimum.category),
                ScoreField::Qualification,
                minimum.count - present,
                Stage::CategoryMinimum,
            );
        }
    }

    let remaining = roster.room();
    if remaining > 0 {
        roster.take(
            candidates,
            |_| true,
            ScoreField::Qualification,
            remaining,
            Stage::Backfill,
        );
    }

    tracing::debug!(
        selected = roster.picked.len(),
        pool = candidates.len(),
        max_roster = plan.max_roster,
        "quota allocation complete"
    );

    roster.picked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, category: &str, qualification: f64, qualifies: bool) -> QuotaCandidate {
        QuotaCandidate {
            id: AthleteId::from(id),
            category: category.to_string(),
            level: String::new(),
            qualification,
            testing: 0.0,
            qualifies,
        }
    }

    fn step(category: &str, count: usize) -> QuotaStep {
        QuotaStep {
            category: Some(category.to_string()),
            level: None,
            count,
            score: ScoreField::Qualification,
        }
    }

    fn ids(selection: &[Selection<'_>]) -> Vec<String> {
        selection
            .iter()
            .map(|s| s.candidate.id.to_string())
            .collect()
    }

    #[test]
    fn test_short_category_leaves_slots_for_backfill() {
        let pool = vec![
            candidate("a", "youth_elite_13_14", 85.0, true),
            candidate("b", "youth_elite_13_14", 84.0, true),
            candidate("c", "level_10_13_14", 90.0, true),
            candidate("d", "level_10_13_14", 70.0, false),
        ];
        let priority = vec![step("youth_elite_13_14", 4)];
        let plan = QuotaPlan {
            priority: &priority,
            gate_priority: true,
            max_roster: 4,
            ..Default::default()
        };

        let selection = allocate(&pool, &plan);
        assert_eq!(ids(&selection), vec!["a", "b", "c", "d"]);
        assert_eq!(selection[0].stage, Stage::Priority);
        assert_eq!(selection[1].stage, Stage::Priority);
        assert_eq!(selection[2].stage, Stage::Backfill);
    }

    #[test]
    fn test_gate_excludes_from_priority_but_not_minimums() {
        let pool = vec![
            candidate("a", "youth_elite_11_12", 70.0, false),
            candidate("b", "youth_elite_11_12", 69.0, false),
            candidate("c", "youth_elite_13_14", 90.0, true),
        ];
        let priority = vec![step("youth_elite_11_12", 4)];
        let minimums = vec![CategoryMinimum {
            category: "youth_elite_11_12".to_string(),
            count: 1,
        }];
        let plan = QuotaPlan {
            priority: &priority,
            gate_priority: true,
            extra_selection: 8,
            category_minimums: &minimums,
            max_roster: 2,
        };

        let selection = allocate(&pool, &plan);
        assert_eq!(ids(&selection), vec!["c", "a"]);
        assert_eq!(selection[0].stage, Stage::ExtraSelection);
        assert_eq!(selection[1].stage, Stage::CategoryMinimum);
    }

    #[test]
    fn test_roster_cap_beats_category_minimums() {
        let pool: Vec<QuotaCandidate> = (0..6)
            .map(|i| candidate(&format!("y{}", i), "youth_elite_13_14", 80.0 + i as f64, true))
            .chain((0..3).map(|i| candidate(&format!("l{}", i), "level_10_11_12", 60.0, true)))
            .collect();
        let priority = vec![step("youth_elite_13_14", 4)];
        let minimums = vec![CategoryMinimum {
            category: "level_10_11_12".to_string(),
            count: 2,
        }];
        let plan = QuotaPlan {
            priority: &priority,
            gate_priority: true,
            extra_selection: 8,
            category_minimums: &minimums,
            max_roster: 5,
        };

        let selection = allocate(&pool, &plan);
        assert_eq!(selection.len(), 5);
        let unique: BTreeSet<_> = selection.iter().map(|s| &s.candidate.id).collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_level_step_ranks_by_testing_score() {
        let mut a = candidate("a", "level_10_11_12", 80.0, true);
        a.level = "level_10".to_string();
        a.testing = 20.0;
        let mut b = candidate("b", "level_10_10u", 70.0, true);
        b.level = "level_10".to_string();
        b.testing = 30.0;

        let pool = vec![a, b];
        let priority = vec![QuotaStep {
            category: None,
            level: Some("level_10".to_string()),
            count: 1,
            score: ScoreField::Testing,
        }];
        let plan = QuotaPlan {
            priority: &priority,
            max_roster: 1,
            ..Default::default()
        };

        assert_eq!(ids(&allocate(&pool, &plan)), vec!["b"]);
    }

    #[test]
    fn test_empty_pool_selects_nobody() {
        let plan = QuotaPlan {
            max_roster: 16,
            ..Default::default()
        };
        assert!(allocate(&[], &plan).is_empty());
    }
}
