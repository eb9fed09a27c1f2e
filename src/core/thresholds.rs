use crate::config::procedure_config::DivisionConfig;
use crate::core::ranking::SCORE_EPSILON;
use crate::core::scoring;
use crate::domain::model::{Apparatus, CompetitionResult, Gender};

/// What a threshold tier is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMode {
    /// The aggregated score.
    CombinedScore,
    /// Any individual result of the athlete.
    AnySingleResult { include_finals: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdPolicy {
    pub preferential: ThresholdMode,
    pub minimum: ThresholdMode,
}

/// Bars for one division, apparatus and gender. `None` means the tier can never be met.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThresholdBars {
    pub preferential: Option<f64>,
    pub minimum: Option<f64>,
}

impl ThresholdBars {
    pub fn lookup(division: &DivisionConfig, apparatus: Apparatus, gender: Gender) -> Self {
        let Some(tiers) = division
            .thresholds
            .as_ref()
            .and_then(|table| table.get(apparatus))
        else {
            return Self::default();
        };

        Self {
            preferential: tiers.preferential.as_ref().and_then(|t| t.get(gender)),
            minimum: tiers.minimum.as_ref().and_then(|t| t.get(gender)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThresholdFlags {
    pub preferential: bool,
    pub minimum: bool,
}

pub fn meets(score: f64, bar: Option<f64>) -> bool {
    bar.is_some_and(|bar| score + SCORE_EPSILON >= bar)
}

fn tier_met(
    bar: Option<f64>,
    mode: ThresholdMode,
    combined_score: f64,
    results: &[&CompetitionResult],
) -> bool {
    match mode {
        ThresholdMode::CombinedScore => meets(combined_score, bar),
        ThresholdMode::AnySingleResult { include_finals } => scoring::best_single_result(
            results,
            include_finals,
        )
        .is_some_and(|best| meets(best, bar)),
    }
}

pub fn evaluate(
    bars: ThresholdBars,
    policy: ThresholdPolicy,
    combined_score: f64,
    results: &[&CompetitionResult],
) -> ThresholdFlags {
    ThresholdFlags {
        preferential: tier_met(bars.preferential, policy.preferential, combined_score, results),
        minimum: tier_met(bars.minimum, policy.minimum, combined_score, results),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::procedure_config::{GenderTable, PerApparatus, ThresholdTiers};
    use crate::domain::model::Athlete;

    fn division() -> DivisionConfig {
        DivisionConfig {
            thresholds: Some(PerApparatus {
                trampoline: Some(ThresholdTiers {
                    preferential: Some(GenderTable {
                        male: Some(57.5),
                        female: Some(52.5),
                    }),
                    minimum: Some(GenderTable {
                        male: Some(54.5),
                        female: None,
                    }),
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn result(qualification: f64, final_score: Option<f64>) -> CompetitionResult {
        CompetitionResult {
            athlete: Athlete::new("1", "2000-01-01", Gender::Male, "senior_elite"),
            event: "winter_classic".to_string(),
            apparatus: Apparatus::Trampoline,
            division: "senior_elite".to_string(),
            qualification_score: qualification,
            final_score,
            level: "senior_elite".to_string(),
        }
    }

    const CHAMPIONSHIP: ThresholdPolicy = ThresholdPolicy {
        preferential: ThresholdMode::CombinedScore,
        minimum: ThresholdMode::AnySingleResult {
            include_finals: true,
        },
    };

    #[test]
    fn test_lookup_falls_back_to_unreachable() {
        let bars = ThresholdBars::lookup(&division(), Apparatus::Trampoline, Gender::Female);
        assert_eq!(bars.preferential, Some(52.5));
        assert_eq!(bars.minimum, None);

        let none = ThresholdBars::lookup(&division(), Apparatus::Tumbling, Gender::Male);
        assert_eq!(none, ThresholdBars::default());
        assert!(!meets(1000.0, none.minimum));
    }

    #[test]
    fn test_minimum_met_by_final_score_alone() {
        let row = result(50.0, Some(54.5));
        let bars = ThresholdBars::lookup(&division(), Apparatus::Trampoline, Gender::Male);

        let flags = evaluate(bars, CHAMPIONSHIP, 104.5, &[&row]);
        assert!(flags.minimum);
        assert!(flags.preferential);

        let qualification_only = ThresholdPolicy {
            preferential: ThresholdMode::CombinedScore,
            minimum: ThresholdMode::AnySingleResult {
                include_finals: false,
            },
        };
        let flags = evaluate(bars, qualification_only, 50.0, &[&row]);
        assert!(!flags.minimum);
        assert!(!flags.preferential);
    }

    #[test]
    fn test_comparison_tolerates_float_noise() {
        assert!(meets(57.499_999_5, Some(57.5)));
        assert!(!meets(57.49, Some(57.5)));
    }
}
