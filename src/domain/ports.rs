use crate::config::procedure_config::{CalculatorKind, ProcedureConfig};
use crate::domain::model::{Apparatus, CompetitionResult, RankingOutcome};
use crate::utils::error::Result;

/// One procedure variant's ranking rules.
///
/// Implementations are stateless: everything a ranking depends on arrives through the
/// arguments, so one instance can serve any number of concurrent calls.
pub trait ProcedureCalculator: Send + Sync {
    fn kind(&self) -> CalculatorKind;

    fn calculate_ranking(
        &self,
        apparatus: Apparatus,
        division: &str,
        results: &[CompetitionResult],
        procedure: &ProcedureConfig,
    ) -> Result<RankingOutcome>;
}
