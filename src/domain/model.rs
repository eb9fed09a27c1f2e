use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Stable identifier assigned by the roster system.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AthleteId(pub String);

impl AthleteId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AthleteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AthleteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u32> for AthleteId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "Male", alias = "MALE", alias = "m", alias = "M")]
    Male,
    #[serde(alias = "Female", alias = "FEMALE", alias = "f", alias = "F")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            other => Err(format!("unrecognised gender '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Apparatus {
    #[serde(rename = "trampoline", alias = "Trampoline", alias = "TRAMPOLINE")]
    Trampoline,
    #[serde(rename = "tumbling", alias = "Tumbling", alias = "TUMBLING")]
    Tumbling,
    #[serde(rename = "double-mini", alias = "Double-Mini", alias = "DOUBLE-MINI")]
    DoubleMini,
}

impl Apparatus {
    pub const ALL: [Apparatus; 3] = [
        Apparatus::Trampoline,
        Apparatus::Tumbling,
        Apparatus::DoubleMini,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Apparatus::Trampoline => "trampoline",
            Apparatus::Tumbling => "tumbling",
            Apparatus::DoubleMini => "double-mini",
        }
    }
}

impl fmt::Display for Apparatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Apparatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trampoline" => Ok(Apparatus::Trampoline),
            "tumbling" => Ok(Apparatus::Tumbling),
            "double-mini" => Ok(Apparatus::DoubleMini),
            other => Err(format!("unrecognised apparatus '{}'", other)),
        }
    }
}

/// Reference data for one athlete, owned by the roster system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    pub id: AthleteId,
    /// Raw `YYYY-MM-DD` value; parsed during eligibility so a bad value only drops
    /// this athlete.
    pub date_of_birth: String,
    pub gender: Gender,
    pub level: String,
}

impl Athlete {
    pub fn new(
        id: impl Into<AthleteId>,
        date_of_birth: &str,
        gender: Gender,
        level: &str,
    ) -> Self {
        Self {
            id: id.into(),
            date_of_birth: date_of_birth.to_string(),
            gender,
            level: level.to_string(),
        }
    }
}

/// One performance record supplied as input to a ranking call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionResult {
    pub athlete: Athlete,
    pub event: String,
    pub apparatus: Apparatus,
    pub division: String,
    pub qualification_score: f64,
    pub final_score: Option<f64>,
    pub level: String,
}

impl CompetitionResult {
    pub fn is_in(&self, apparatus: Apparatus, division: &str) -> bool {
        self.apparatus == apparatus && self.division.eq_ignore_ascii_case(division)
    }
}

/// Named value recorded for audit alongside a ranked athlete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreDetail {
    Score(f64),
    Scores(Vec<f64>),
    Label(String),
}

impl fmt::Display for ScoreDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreDetail::Score(score) => write!(f, "{:.3}", score),
            ScoreDetail::Scores(scores) => {
                let joined: Vec<String> = scores.iter().map(|s| format!("{:.3}", s)).collect();
                write!(f, "[{}]", joined.join(", "))
            }
            ScoreDetail::Label(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAthlete {
    pub athlete: Athlete,
    pub combined_score: f64,
    pub rank: usize,
    pub meets_preferential_threshold: bool,
    pub meets_minimum_threshold: bool,
    pub tie_break_info: Option<String>,
    pub needs_manual_review: bool,
    pub contributing_scores: BTreeMap<String, ScoreDetail>,
}

/// Why an athlete present in the input is absent from the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    InvalidDateOfBirth { value: String },
    InvalidScore { event: String, score: f64 },
    OutsideAgeRange {
        age: i32,
        min_age: Option<u32>,
        max_age: Option<u32>,
    },
    MissingRequiredLevel { level: String },
    InsufficientEvents { attended: usize, required: usize },
    NoMatchingCategory { level: String, age: i32 },
    Excluded,
    NotSelected,
}

impl SkipReason {
    /// Data defects are problems with the input rather than ordinary ineligibility.
    pub fn is_data_defect(&self) -> bool {
        matches!(
            self,
            SkipReason::InvalidDateOfBirth { .. } | SkipReason::InvalidScore { .. }
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidDateOfBirth { value } => {
                write!(f, "unparseable date of birth '{}'", value)
            }
            SkipReason::InvalidScore { event, score } => {
                write!(f, "invalid qualification score {} at {}", score, event)
            }
            SkipReason::OutsideAgeRange {
                age,
                min_age,
                max_age,
            } => {
                let min = min_age.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
                let max = max_age.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
                write!(f, "age {} outside {}..{}", age, min, max)
            }
            SkipReason::MissingRequiredLevel { level } => {
                write!(f, "no result at required level '{}'", level)
            }
            SkipReason::InsufficientEvents { attended, required } => {
                write!(f, "attended {} of {} required events", attended, required)
            }
            SkipReason::NoMatchingCategory { level, age } => {
                write!(f, "level '{}' at age {} matches no category", level, age)
            }
            SkipReason::Excluded => f.write_str("on the procedure's exclusion list"),
            SkipReason::NotSelected => f.write_str("not selected by the quota allocation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedAthlete {
    pub athlete_id: AthleteId,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Output of one (procedure, apparatus, division) ranking call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingOutcome {
    pub ranked: Vec<RankedAthlete>,
    pub skipped: Vec<SkippedAthlete>,
}

impl RankingOutcome {
    pub fn find(&self, athlete_id: &str) -> Option<&RankedAthlete> {
        self.ranked
            .iter()
            .find(|ranked| ranked.athlete.id.as_str() == athlete_id)
    }

    pub fn skip_reason(&self, athlete_id: &str) -> Option<&SkipReason> {
        self.skipped
            .iter()
            .find(|skipped| skipped.athlete_id.as_str() == athlete_id)
            .map(|skipped| &skipped.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apparatus_parses_case_insensitively() {
        assert_eq!("Double-Mini".parse::<Apparatus>(), Ok(Apparatus::DoubleMini));
        assert_eq!(" TRAMPOLINE ".parse::<Apparatus>(), Ok(Apparatus::Trampoline));
        assert!("floor".parse::<Apparatus>().is_err());
    }

    #[test]
    fn test_result_division_match_ignores_case() {
        let result = CompetitionResult {
            athlete: Athlete::new("1", "2000-01-01", Gender::Male, "senior_elite"),
            event: "winter_classic".to_string(),
            apparatus: Apparatus::Tumbling,
            division: "SENIOR_ELITE".to_string(),
            qualification_score: 50.0,
            final_score: None,
            level: "senior_elite".to_string(),
        };
        assert!(result.is_in(Apparatus::Tumbling, "senior_elite"));
        assert!(!result.is_in(Apparatus::Trampoline, "senior_elite"));
    }

    #[test]
    fn test_skip_reason_serializes_with_tag() {
        let skipped = SkippedAthlete {
            athlete_id: AthleteId::from("7"),
            reason: SkipReason::InsufficientEvents {
                attended: 1,
                required: 2,
            },
        };
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["athlete_id"], "7");
        assert_eq!(json["reason"], "insufficient_events");
        assert_eq!(json["required"], 2);
    }
}
