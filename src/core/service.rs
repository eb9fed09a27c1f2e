use crate::app::calculators::default_calculators;
use crate::config::procedure_config::{CalculatorKind, ProcedureConfig, SelectionConfig};
use crate::domain::model::{Apparatus, CompetitionResult, RankingOutcome};
use crate::domain::ports::ProcedureCalculator;
use crate::utils::error::{Result, SelectionError};
use serde::Serialize;
use std::collections::BTreeMap;

/// Ranking of one apparatus and division of a procedure.
#[derive(Debug, Clone, Serialize)]
pub struct DivisionRanking {
    pub apparatus: Apparatus,
    pub division: String,
    pub outcome: RankingOutcome,
}

/// Resolves procedure keys to their configuration and calculator, validates requests and
/// dispatches them.
pub struct RankingService {
    config: SelectionConfig,
    calculators: BTreeMap<CalculatorKind, Box<dyn ProcedureCalculator>>,
}

impl RankingService {
    /// A service with every built-in calculator registered.
    pub fn new(config: SelectionConfig) -> Self {
        let mut service = Self::empty(config);
        for calculator in default_calculators() {
            service.register(calculator);
        }
        service
    }

    /// A service with no calculators; every ranking call fails until one is registered.
    pub fn empty(config: SelectionConfig) -> Self {
        Self {
            config,
            calculators: BTreeMap::new(),
        }
    }

    /// Registers a calculator, replacing any previous one of the same kind.
    pub fn register(&mut self, calculator: Box<dyn ProcedureCalculator>) {
        self.calculators.insert(calculator.kind(), calculator);
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn procedure(&self, procedure_key: &str) -> Result<&ProcedureConfig> {
        self.config
            .procedure(procedure_key)
            .ok_or_else(|| SelectionError::UnknownProcedure {
                key: procedure_key.to_string(),
            })
    }

    /// Ranks one apparatus and division of a procedure.
    ///
    /// The procedure key, the division and the apparatus are checked in that order before
    /// any calculator runs.
    pub fn rank(
        &self,
        procedure_key: &str,
        apparatus: &str,
        division: &str,
        results: &[CompetitionResult],
    ) -> Result<RankingOutcome> {
        let procedure = self.procedure(procedure_key)?;

        let (division_key, _) =
            procedure
                .division(division)
                .ok_or_else(|| SelectionError::UnknownDivision {
                    procedure: procedure_key.to_string(),
                    division: division.to_string(),
                })?;

        let apparatus: Apparatus =
            apparatus
                .parse()
                .map_err(|_| SelectionError::UnknownApparatus {
                    value: apparatus.to_string(),
                })?;

        self.dispatch(procedure_key, procedure, apparatus, division_key, results)
    }

    /// Ranks every apparatus and division of a procedure.
    pub fn rank_all(
        &self,
        procedure_key: &str,
        results: &[CompetitionResult],
    ) -> Result<Vec<DivisionRanking>> {
        let procedure = self.procedure(procedure_key)?;

        let mut rankings = Vec::new();
        for apparatus in Apparatus::ALL {
            for division in procedure.divisions.keys() {
                let outcome =
                    self.dispatch(procedure_key, procedure, apparatus, division, results)?;
                rankings.push(DivisionRanking {
                    apparatus,
                    division: division.clone(),
                    outcome,
                });
            }
        }
        Ok(rankings)
    }

    fn dispatch(
        &self,
        procedure_key: &str,
        procedure: &ProcedureConfig,
        apparatus: Apparatus,
        division: &str,
        results: &[CompetitionResult],
    ) -> Result<RankingOutcome> {
        let kind = procedure.calculator();
        let calculator = self.calculators.get(&kind).ok_or_else(|| {
            SelectionError::misconfigured(
                procedure_key,
                format!("no calculator registered for '{}'", kind.as_str()),
            )
        })?;

        let _span = tracing::info_span!(
            "rank",
            procedure = procedure_key,
            apparatus = apparatus.as_str(),
            division
        )
        .entered();

        let outcome = calculator.calculate_ranking(apparatus, division, results, procedure)?;

        tracing::info!(
            ranked = outcome.ranked.len(),
            skipped = outcome.skipped.len(),
            manual_review = outcome.ranked.iter().filter(|r| r.needs_manual_review).count(),
            "ranking complete"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Athlete, Gender};

    const CONFIG: &str = r#"
year = 2025

[procedures.2025_world_games]
name = "2025 World Games"

[procedures.2025_world_games.rules]
calculator = "discipline_games"
min_events_attended = 1
score_count = 2

[procedures.2025_world_games.divisions.senior_elite]
min_age = 17
"#;

    fn service() -> RankingService {
        RankingService::new(SelectionConfig::from_toml_str(CONFIG).unwrap())
    }

    fn results() -> Vec<CompetitionResult> {
        vec![CompetitionResult {
            athlete: Athlete::new("1", "2000-01-01", Gender::Female, "senior_elite"),
            event: "world_cup".to_string(),
            apparatus: Apparatus::Trampoline,
            division: "senior_elite".to_string(),
            qualification_score: 55.0,
            final_score: Some(56.0),
            level: "senior_elite".to_string(),
        }]
    }

    #[test]
    fn test_rank_validates_request_in_order() {
        let service = service();

        assert!(matches!(
            service.rank("2024_world_games", "rings", "nowhere", &results()),
            Err(SelectionError::UnknownProcedure { .. })
        ));
        assert!(matches!(
            service.rank("2025_world_games", "rings", "nowhere", &results()),
            Err(SelectionError::UnknownDivision { .. })
        ));
        assert!(matches!(
            service.rank("2025_world_games", "rings", "senior_elite", &results()),
            Err(SelectionError::UnknownApparatus { .. })
        ));
    }

    #[test]
    fn test_rank_accepts_any_apparatus_case() {
        let outcome = service()
            .rank("2025_world_games", "TRAMPOLINE", "senior_elite", &results())
            .unwrap();
        assert_eq!(outcome.ranked.len(), 1);
        assert_eq!(outcome.ranked[0].combined_score, 111.0);
    }

    #[test]
    fn test_missing_calculator_is_a_misconfiguration() {
        let service = RankingService::empty(SelectionConfig::from_toml_str(CONFIG).unwrap());
        let err = service
            .rank("2025_world_games", "trampoline", "senior_elite", &results())
            .unwrap_err();
        assert!(matches!(err, SelectionError::MisconfiguredProcedure { .. }));
        assert!(!err.is_invalid_request());
    }

    #[test]
    fn test_rank_all_covers_every_slice() {
        let rankings = service().rank_all("2025_world_games", &results()).unwrap();
        assert_eq!(rankings.len(), 3);
        let trampoline = rankings
            .iter()
            .find(|r| r.apparatus == Apparatus::Trampoline)
            .unwrap();
        assert_eq!(trampoline.outcome.ranked.len(), 1);
        assert!(rankings
            .iter()
            .filter(|r| r.apparatus != Apparatus::Trampoline)
            .all(|r| r.outcome.ranked.is_empty()));
    }
}
