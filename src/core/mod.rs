pub mod eligibility;
pub mod quota;
pub mod ranking;
pub mod scoring;
pub mod service;
pub mod thresholds;

pub use crate::domain::model::{CompetitionResult, RankedAthlete, RankingOutcome};
pub use crate::domain::ports::ProcedureCalculator;
pub use crate::utils::error::Result;
pub use service::{DivisionRanking, RankingService};
