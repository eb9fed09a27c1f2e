pub mod procedure_config;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, OutputFormat, OutputTarget};
pub use procedure_config::{CalculatorKind, ProcedureConfig, ProcedureRules, SelectionConfig};
