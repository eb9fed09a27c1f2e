pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{CliConfig, OutputFormat, OutputTarget};

pub use crate::config::SelectionConfig;
pub use crate::core::{DivisionRanking, RankingService};
pub use crate::domain::model::{CompetitionResult, RankedAthlete, RankingOutcome};
pub use crate::utils::error::{Result, SelectionError};
