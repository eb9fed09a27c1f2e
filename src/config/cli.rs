use crate::config::procedure_config::{ProcedureRules, SelectionConfig};
use crate::domain::model::{Apparatus, AthleteId};
use crate::utils::error::{Result, SelectionError};
use crate::utils::validation::{self, Validate};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "selection-procedures")]
#[command(about = "Rank and select athletes under national team selection procedures")]
pub struct CliConfig {
    #[arg(long, default_value = "procedures.toml", help = "Procedures file")]
    pub config: PathBuf,

    #[arg(long, help = "Competition results CSV")]
    pub results: Option<PathBuf>,

    #[arg(long, help = "Procedure key, e.g. 2025_world_championships")]
    pub procedure: Option<String>,

    #[arg(long, help = "Rank only this apparatus")]
    pub apparatus: Option<String>,

    #[arg(long, help = "Rank only this division")]
    pub division: Option<String>,

    #[arg(long, help = "Override the evaluation year of every procedure")]
    pub year: Option<i32>,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Athlete ids committed to a conflicting competition"
    )]
    pub exclude: Vec<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    #[arg(long, help = "Write the rankings to this file instead of stdout")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "List the configured procedures and exit")]
    pub list: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    /// Loads the procedures file and applies the command-line overrides.
    pub fn load_selection_config(&self) -> Result<SelectionConfig> {
        let mut config = SelectionConfig::from_file(&self.config)?;

        if let Some(year) = self.year {
            config.override_year(year);
        }

        if !self.exclude.is_empty() {
            let key = validation::validate_required_field("procedure", &self.procedure)?;
            let procedure =
                config
                    .procedures
                    .get_mut(key)
                    .ok_or_else(|| SelectionError::UnknownProcedure {
                        key: key.to_string(),
                    })?;
            match &mut procedure.rules {
                ProcedureRules::ContinentalGames(rules) => {
                    for id in &self.exclude {
                        let id = AthleteId::from(id.trim());
                        if !rules.excluded_athletes.contains(&id) {
                            rules.excluded_athletes.push(id);
                        }
                    }
                }
                other => {
                    tracing::warn!(
                        calculator = other.kind().as_str(),
                        "--exclude ignored: procedure has no exclusion list"
                    );
                }
            }
        }

        config.validate_config()?;
        Ok(config)
    }

    /// Where the rendered rankings go.
    pub fn output_target(&self) -> OutputTarget {
        match &self.output {
            Some(path) => OutputTarget::File(path.clone()),
            None => OutputTarget::Stdout,
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.list {
            return Ok(());
        }

        let procedure = validation::validate_required_field("procedure", &self.procedure)?;
        validation::validate_non_empty_string("procedure", procedure)?;
        validation::validate_required_field("results", &self.results)?;

        if let Some(apparatus) = &self.apparatus {
            apparatus
                .parse::<Apparatus>()
                .map_err(|_| SelectionError::UnknownApparatus {
                    value: apparatus.clone(),
                })?;
        }

        if let Some(year) = self.year {
            validation::validate_range("year", year, 1900, 2200)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    pub fn write(&self, data: &[u8]) -> Result<()> {
        match self {
            OutputTarget::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(data)?;
                stdout.flush()?;
            }
            OutputTarget::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, data)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    const PROCEDURES: &str = r#"
year = 2025

[procedures.2025_junior_pan_am]
name = "2025 Junior Pan American Games"

[procedures.2025_junior_pan_am.rules]
calculator = "continental_games"
min_events_attended = 2
qualification_count = 2
final_count = 1
excluded_athletes = ["17"]

[procedures.2025_junior_pan_am.divisions.female]
min_age = 13
max_age = 21
"#;

    fn procedures_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(PROCEDURES.as_bytes()).unwrap();
        file
    }

    fn cli(args: &[&str]) -> CliConfig {
        let mut argv = vec!["selection-procedures"];
        argv.extend_from_slice(args);
        CliConfig::parse_from(argv)
    }

    #[test]
    fn test_list_needs_no_procedure() {
        assert!(cli(&["--list"]).validate().is_ok());
    }

    #[test]
    fn test_ranking_requires_procedure_and_results() {
        assert!(matches!(
            cli(&["--results", "results.csv"]).validate(),
            Err(SelectionError::MissingConfigError { .. })
        ));
        assert!(cli(&["--procedure", "2025_edp"]).validate().is_err());
        assert!(cli(&["--procedure", "2025_edp", "--results", "r.csv"])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_bad_apparatus_is_rejected() {
        let config = cli(&[
            "--procedure",
            "2025_edp",
            "--results",
            "r.csv",
            "--apparatus",
            "rings",
        ]);
        assert!(matches!(
            config.validate(),
            Err(SelectionError::UnknownApparatus { .. })
        ));
    }

    #[test]
    fn test_exclusions_and_year_override_are_applied() {
        let file = procedures_file();
        let config = cli(&[
            "--config",
            file.path().to_str().unwrap(),
            "--procedure",
            "2025_junior_pan_am",
            "--results",
            "r.csv",
            "--exclude",
            "17,42",
            "--year",
            "2026",
        ]);

        let selection = config.load_selection_config().unwrap();
        let procedure = &selection.procedures["2025_junior_pan_am"];
        assert_eq!(procedure.year, Some(2026));
        let ProcedureRules::ContinentalGames(rules) = &procedure.rules else {
            panic!("expected continental games rules");
        };
        assert_eq!(
            rules.excluded_athletes,
            vec![AthleteId::from("17"), AthleteId::from("42")]
        );
    }

    #[test]
    fn test_file_output_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports").join("rankings.csv");
        OutputTarget::File(path.clone()).write(b"rank\n1\n").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "rank\n1\n");
    }
}
