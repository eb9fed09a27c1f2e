#![allow(dead_code)]

use selection_procedures::domain::model::{Apparatus, Athlete, Gender};
use selection_procedures::{CompetitionResult, RankingService, SelectionConfig};

pub fn shipped_config() -> SelectionConfig {
    SelectionConfig::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/procedures.toml"))
        .expect("procedures.toml should load")
}

pub fn service() -> RankingService {
    RankingService::new(shipped_config())
}

/// Builds results for one athlete in one apparatus and division.
pub struct AthleteResults {
    athlete: Athlete,
    apparatus: Apparatus,
    division: String,
    results: Vec<CompetitionResult>,
}

impl AthleteResults {
    pub fn new(id: &str, date_of_birth: &str, gender: Gender, level: &str) -> Self {
        Self {
            athlete: Athlete::new(id, date_of_birth, gender, level),
            apparatus: Apparatus::Trampoline,
            division: "senior_elite".to_string(),
            results: Vec::new(),
        }
    }

    pub fn on(mut self, apparatus: Apparatus, division: &str) -> Self {
        self.apparatus = apparatus;
        self.division = division.to_string();
        self
    }

    pub fn event(mut self, event: &str, qualification: f64, final_score: Option<f64>) -> Self {
        let level = self.athlete.level.clone();
        self.event_at(event, qualification, final_score, &level)
    }

    pub fn event_at(
        mut self,
        event: &str,
        qualification: f64,
        final_score: Option<f64>,
        level: &str,
    ) -> Self {
        self.results.push(CompetitionResult {
            athlete: self.athlete.clone(),
            event: event.to_string(),
            apparatus: self.apparatus,
            division: self.division.clone(),
            qualification_score: qualification,
            final_score,
            level: level.to_string(),
        });
        self
    }

    pub fn build(self) -> Vec<CompetitionResult> {
        self.results
    }
}

pub fn flatten(groups: Vec<Vec<CompetitionResult>>) -> Vec<CompetitionResult> {
    groups.into_iter().flatten().collect()
}
