use anyhow::Context;
use clap::Parser;
use selection_procedures::adapters::{csv_results, report};
use selection_procedures::domain::model::Apparatus;
use selection_procedures::utils::error::ErrorSeverity;
use selection_procedures::utils::{logger, validation::Validate};
use selection_procedures::{
    CliConfig, DivisionRanking, OutputFormat, RankingService, SelectionError,
};

fn main() {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting selection-procedures");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        eprintln!("{}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(err) = run(&config) {
        match err.downcast_ref::<SelectionError>() {
            Some(e) => {
                tracing::error!(
                    "Ranking failed: {:#} (Category: {:?}, Severity: {:?})",
                    err,
                    e.category(),
                    e.severity()
                );
                tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());

                eprintln!("{}", e.user_friendly_message());
                eprintln!("Suggestion: {}", e.recovery_suggestion());

                let exit_code = match e.severity() {
                    ErrorSeverity::Low => 0,
                    ErrorSeverity::Medium => 2,
                    ErrorSeverity::High => 1,
                    ErrorSeverity::Critical => 3,
                };
                if exit_code > 0 {
                    std::process::exit(exit_code);
                }
            }
            None => {
                tracing::error!("Ranking failed: {:#}", err);
                eprintln!("{:#}", err);
                std::process::exit(1);
            }
        }
    }
}

fn run(config: &CliConfig) -> anyhow::Result<()> {
    let selection = config
        .load_selection_config()
        .with_context(|| format!("loading procedures from {}", config.config.display()))?;

    if config.list {
        print!("{}", report::render_procedures(&selection));
        return Ok(());
    }

    // Both are present once validation has passed.
    let (Some(procedure_key), Some(results_path)) = (&config.procedure, &config.results) else {
        return Ok(());
    };

    let results = csv_results::read_results(results_path)
        .with_context(|| format!("reading results from {}", results_path.display()))?;

    let service = RankingService::new(selection);
    let rankings = rank(&service, config, procedure_key, &results)?;

    let rendered = match config.format {
        OutputFormat::Table => report::render_table(&rankings).into_bytes(),
        OutputFormat::Json => report::render_json(&rankings)?.into_bytes(),
        OutputFormat::Csv => {
            let mut buffer = Vec::new();
            csv_results::write_rankings(&mut buffer, &rankings)?;
            buffer
        }
    };

    config
        .output_target()
        .write(&rendered)
        .context("writing rankings")?;

    let ranked: usize = rankings.iter().map(|r| r.outcome.ranked.len()).sum();
    let flagged: usize = rankings
        .iter()
        .flat_map(|r| &r.outcome.ranked)
        .filter(|r| r.needs_manual_review)
        .count();
    tracing::info!(
        procedure = procedure_key.as_str(),
        slices = rankings.len(),
        ranked,
        manual_review = flagged,
        "Selection run completed"
    );

    Ok(())
}

/// Ranks the slices the command line asks for: every apparatus and division of the
/// procedure unless narrowed by `--apparatus` or `--division`.
fn rank(
    service: &RankingService,
    config: &CliConfig,
    procedure_key: &str,
    results: &[selection_procedures::CompetitionResult],
) -> selection_procedures::Result<Vec<DivisionRanking>> {
    if config.apparatus.is_none() && config.division.is_none() {
        return service.rank_all(procedure_key, results);
    }

    let procedure = service.procedure(procedure_key)?;

    let apparatuses: Vec<String> = match &config.apparatus {
        Some(apparatus) => vec![apparatus.clone()],
        None => Apparatus::ALL.iter().map(|a| a.as_str().to_string()).collect(),
    };
    let divisions: Vec<String> = match &config.division {
        Some(division) => vec![procedure
            .division(division)
            .map(|(key, _)| key.to_string())
            .unwrap_or_else(|| division.clone())],
        None => procedure.divisions.keys().cloned().collect(),
    };

    let mut rankings = Vec::new();
    for apparatus in &apparatuses {
        for division in &divisions {
            let outcome = service.rank(procedure_key, apparatus, division, results)?;
            rankings.push(DivisionRanking {
                apparatus: apparatus
                    .parse()
                    .map_err(|_| SelectionError::UnknownApparatus {
                        value: apparatus.clone(),
                    })?,
                division: division.clone(),
                outcome,
            });
        }
    }

    Ok(rankings)
}
