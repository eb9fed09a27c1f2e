use crate::core::service::DivisionRanking;
use crate::domain::model::{Apparatus, Athlete, AthleteId, CompetitionResult, Gender};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// One line of a results CSV. Athlete reference data is repeated on every row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    pub athlete_id: String,
    pub date_of_birth: String,
    pub gender: Gender,
    pub athlete_level: String,
    pub event: String,
    pub apparatus: Apparatus,
    pub division: String,
    pub qualification_score: f64,
    pub final_score: Option<f64>,
    /// Level the athlete competed at in this result; the athlete's level when blank.
    pub level: Option<String>,
}

impl From<ResultRow> for CompetitionResult {
    fn from(row: ResultRow) -> Self {
        let level = row
            .level
            .filter(|level| !level.trim().is_empty())
            .unwrap_or_else(|| row.athlete_level.clone());

        CompetitionResult {
            athlete: Athlete {
                id: AthleteId(row.athlete_id.trim().to_string()),
                date_of_birth: row.date_of_birth,
                gender: row.gender,
                level: row.athlete_level,
            },
            event: row.event,
            apparatus: row.apparatus,
            division: row.division,
            qualification_score: row.qualification_score,
            final_score: row.final_score,
            level,
        }
    }
}

pub fn parse_results<R: Read>(reader: R) -> Result<Vec<CompetitionResult>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut results = Vec::new();
    for row in csv_reader.deserialize::<ResultRow>() {
        results.push(row?.into());
    }

    tracing::debug!(rows = results.len(), "parsed results");
    Ok(results)
}

pub fn read_results<P: AsRef<Path>>(path: P) -> Result<Vec<CompetitionResult>> {
    let file = File::open(path.as_ref())?;
    tracing::info!(path = %path.as_ref().display(), "reading results");
    parse_results(file)
}

#[derive(Debug, Serialize)]
struct RankingRow<'a> {
    apparatus: &'a str,
    division: &'a str,
    rank: usize,
    athlete_id: &'a str,
    gender: &'a str,
    combined_score: String,
    meets_preferential_threshold: bool,
    meets_minimum_threshold: bool,
    needs_manual_review: bool,
    tie_break_info: &'a str,
    contributing_scores: String,
}

/// Writes one CSV row per ranked athlete across all the given rankings.
pub fn write_rankings<W: Write>(writer: W, rankings: &[DivisionRanking]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for ranking in rankings {
        for ranked in &ranking.outcome.ranked {
            let contributing: Vec<String> = ranked
                .contributing_scores
                .iter()
                .map(|(name, detail)| format!("{}={}", name, detail))
                .collect();

            csv_writer.serialize(RankingRow {
                apparatus: ranking.apparatus.as_str(),
                division: &ranking.division,
                rank: ranked.rank,
                athlete_id: ranked.athlete.id.as_str(),
                gender: ranked.athlete.gender.as_str(),
                combined_score: format!("{:.3}", ranked.combined_score),
                meets_preferential_threshold: ranked.meets_preferential_threshold,
                meets_minimum_threshold: ranked.meets_minimum_threshold,
                needs_manual_review: ranked.needs_manual_review,
                tie_break_info: ranked.tie_break_info.as_deref().unwrap_or(""),
                contributing_scores: contributing.join("; "),
            })?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}
