use crate::core::eligibility::AgeBand;
use crate::core::ranking::TieBreakPolicy;
use crate::domain::model::{Apparatus, AthleteId, Gender};
use crate::utils::error::{Result, SelectionError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Every selection procedure known to the engine, as loaded from a procedures file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Evaluation year inherited by procedures that do not set their own.
    pub year: Option<i32>,
    #[serde(default)]
    pub procedures: BTreeMap<String, ProcedureConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureConfig {
    pub name: String,
    pub year: Option<i32>,
    #[serde(default)]
    pub events: BTreeMap<String, EventConfig>,
    pub rules: ProcedureRules,
    #[serde(default)]
    pub divisions: BTreeMap<String, DivisionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DivisionConfig {
    pub name: Option<String>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    /// Competitive level an athlete must have competed at in this division.
    pub level: Option<String>,
    pub thresholds: Option<PerApparatus<ThresholdTiers>>,
}

/// Values keyed by apparatus, with an optional `default` used for apparatus not listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerApparatus<T> {
    pub trampoline: Option<T>,
    pub tumbling: Option<T>,
    #[serde(rename = "double-mini")]
    pub double_mini: Option<T>,
    pub default: Option<T>,
}

impl<T> Default for PerApparatus<T> {
    fn default() -> Self {
        Self {
            trampoline: None,
            tumbling: None,
            double_mini: None,
            default: None,
        }
    }
}

impl<T> PerApparatus<T> {
    pub fn get(&self, apparatus: Apparatus) -> Option<&T> {
        let specific = match apparatus {
            Apparatus::Trampoline => self.trampoline.as_ref(),
            Apparatus::Tumbling => self.tumbling.as_ref(),
            Apparatus::DoubleMini => self.double_mini.as_ref(),
        };
        specific.or(self.default.as_ref())
    }

    fn entries(&self) -> impl Iterator<Item = (&'static str, &T)> {
        [
            ("trampoline", self.trampoline.as_ref()),
            ("tumbling", self.tumbling.as_ref()),
            ("double-mini", self.double_mini.as_ref()),
            ("default", self.default.as_ref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenderTable {
    pub male: Option<f64>,
    pub female: Option<f64>,
}

impl GenderTable {
    pub fn get(&self, gender: Gender) -> Option<f64> {
        match gender {
            Gender::Male => self.male,
            Gender::Female => self.female,
        }
    }

    fn values(&self) -> impl Iterator<Item = f64> {
        self.male.into_iter().chain(self.female)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdTiers {
    pub preferential: Option<GenderTable>,
    pub minimum: Option<GenderTable>,
}

/// A score bar that is either shared by both genders or set per gender.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreBar {
    Flat(f64),
    ByGender(GenderTable),
}

impl ScoreBar {
    pub fn get(&self, gender: Gender) -> Option<f64> {
        match self {
            ScoreBar::Flat(score) => Some(*score),
            ScoreBar::ByGender(table) => table.get(gender),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculatorKind {
    Championship,
    AgeGroupChampionship,
    DisciplineGames,
    DevelopmentGate,
    DevelopmentDual,
    ContinentalGames,
}

impl CalculatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculatorKind::Championship => "championship",
            CalculatorKind::AgeGroupChampionship => "age_group_championship",
            CalculatorKind::DisciplineGames => "discipline_games",
            CalculatorKind::DevelopmentGate => "development_gate",
            CalculatorKind::DevelopmentDual => "development_dual",
            CalculatorKind::ContinentalGames => "continental_games",
        }
    }
}

/// Rule parameters, tagged by the calculator that interprets them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "calculator", rename_all = "snake_case")]
pub enum ProcedureRules {
    Championship(ChampionshipRules),
    AgeGroupChampionship(AgeGroupRules),
    DisciplineGames(DisciplineGamesRules),
    DevelopmentGate(DevelopmentGateRules),
    DevelopmentDual(DevelopmentDualRules),
    ContinentalGames(ContinentalGamesRules),
}

impl ProcedureRules {
    pub fn kind(&self) -> CalculatorKind {
        match self {
            ProcedureRules::Championship(_) => CalculatorKind::Championship,
            ProcedureRules::AgeGroupChampionship(_) => CalculatorKind::AgeGroupChampionship,
            ProcedureRules::DisciplineGames(_) => CalculatorKind::DisciplineGames,
            ProcedureRules::DevelopmentGate(_) => CalculatorKind::DevelopmentGate,
            ProcedureRules::DevelopmentDual(_) => CalculatorKind::DevelopmentDual,
            ProcedureRules::ContinentalGames(_) => CalculatorKind::ContinentalGames,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChampionshipRules {
    pub min_events_attended: Option<usize>,
    pub qualification_count: usize,
    #[serde(default)]
    pub final_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeGroupRules {
    pub min_events_attended: Option<usize>,
    pub qualification_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisciplineGamesRules {
    pub min_events_attended: Option<usize>,
    #[serde(default = "default_score_count", alias = "combined_score_count")]
    pub score_count: usize,
}

fn default_score_count() -> usize {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinentalGamesRules {
    pub min_events_attended: Option<usize>,
    pub qualification_count: usize,
    #[serde(default)]
    pub final_count: usize,
    /// Athletes committed to a conflicting competition.
    #[serde(default, alias = "ineligible_athletes")]
    pub excluded_athletes: Vec<AthleteId>,
    #[serde(default)]
    pub tie_break: TieBreakPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreField {
    #[default]
    Qualification,
    Testing,
}

/// One pass of a quota plan: take `count` athletes from a category, or from every
/// category of a level, ranked by `score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaStep {
    pub category: Option<String>,
    pub level: Option<String>,
    pub count: usize,
    #[serde(default)]
    pub score: ScoreField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTarget<'a> {
    Category(&'a str),
    Level(&'a str),
}

impl QuotaStep {
    pub fn target(&self) -> Option<StepTarget<'_>> {
        match (&self.category, &self.level) {
            (Some(category), None) => Some(StepTarget::Category(category)),
            (None, Some(level)) => Some(StepTarget::Level(level)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryMinimum {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentGateRules {
    #[serde(default)]
    pub team_size: PerApparatus<usize>,
    #[serde(default)]
    pub min_qualification_scores: PerApparatus<ScoreBar>,
    /// Level tag → age-group keys (`11-12`, `10u`, ...) that level may be selected from.
    pub eligible_levels: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub priority: Vec<QuotaStep>,
    #[serde(default)]
    pub extra_selection: PerApparatus<usize>,
    #[serde(default)]
    pub category_minimums: Vec<CategoryMinimum>,
}

impl DevelopmentGateRules {
    pub fn team_size_for(&self, apparatus: Apparatus) -> usize {
        team_size_or_default(&self.team_size, apparatus)
    }

    pub fn extra_selection_for(&self, apparatus: Apparatus) -> usize {
        self.extra_selection
            .get(apparatus)
            .copied()
            .unwrap_or(match apparatus {
                Apparatus::Trampoline => 8,
                Apparatus::Tumbling | Apparatus::DoubleMini => 4,
            })
    }

    pub fn min_score_for(&self, apparatus: Apparatus, gender: Gender) -> f64 {
        self.min_qualification_scores
            .get(apparatus)
            .and_then(|bar| bar.get(gender))
            .unwrap_or(match (apparatus, gender) {
                (Apparatus::Trampoline, _) => 81.5,
                (Apparatus::Tumbling, _) => 40.4,
                (Apparatus::DoubleMini, Gender::Male) => 45.4,
                (Apparatus::DoubleMini, Gender::Female) => 44.8,
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentDualRules {
    #[serde(default)]
    pub team_size: PerApparatus<usize>,
    pub eligible_levels: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub selection_plan: PerApparatus<Vec<QuotaStep>>,
    /// Events whose identifier matches this pattern carry testing scores.
    #[serde(default = "default_testing_event_pattern")]
    pub testing_event_pattern: String,
}

fn default_testing_event_pattern() -> String {
    "(?i)jumpstart".to_string()
}

impl DevelopmentDualRules {
    pub fn team_size_for(&self, apparatus: Apparatus) -> usize {
        team_size_or_default(&self.team_size, apparatus)
    }
}

fn team_size_or_default(table: &PerApparatus<usize>, apparatus: Apparatus) -> usize {
    table.get(apparatus).copied().unwrap_or(match apparatus {
        Apparatus::Trampoline => 16,
        Apparatus::Tumbling | Apparatus::DoubleMini => 12,
    })
}

impl SelectionConfig {
    /// Load procedures from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SelectionError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parse procedures from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: SelectionConfig =
            toml::from_str(&processed_content).map_err(|e| {
                SelectionError::ConfigValidationError {
                    field: "toml_parsing".to_string(),
                    message: format!("TOML parsing error: {}", e),
                }
            })?;

        if let Some(year) = config.year {
            for procedure in config.procedures.values_mut() {
                procedure.year.get_or_insert(year);
            }
        }

        Ok(config)
    }

    /// Replace `${VAR}` references with environment values
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SelectionError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn procedure(&self, key: &str) -> Option<&ProcedureConfig> {
        self.procedures.get(key)
    }

    /// Force one evaluation year onto every procedure.
    pub fn override_year(&mut self, year: i32) {
        self.year = Some(year);
        for procedure in self.procedures.values_mut() {
            procedure.year = Some(year);
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        if self.procedures.is_empty() {
            return Err(SelectionError::MissingConfigError {
                field: "procedures".to_string(),
            });
        }

        for (key, procedure) in &self.procedures {
            procedure.validate_as(key)?;
        }

        Ok(())
    }
}

impl Validate for SelectionConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

impl ProcedureConfig {
    pub fn calculator(&self) -> CalculatorKind {
        self.rules.kind()
    }

    /// Looks a division up by key, ignoring ASCII case.
    pub fn division(&self, key: &str) -> Option<(&str, &DivisionConfig)> {
        self.divisions
            .get_key_value(key)
            .or_else(|| {
                self.divisions
                    .iter()
                    .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key.trim()))
            })
            .map(|(key, division)| (key.as_str(), division))
    }

    fn validate_as(&self, key: &str) -> Result<()> {
        let field = |name: &str| format!("procedures.{}.{}", key, name);

        validation::validate_non_empty_string(&field("name"), &self.name)?;
        let year = validation::validate_required_field(&field("year"), &self.year)?;
        validation::validate_range(&field("year"), *year, 1900, 2200)?;

        if self.divisions.is_empty() {
            return Err(SelectionError::MissingConfigError {
                field: field("divisions"),
            });
        }

        for (division_key, division) in &self.divisions {
            let division_field = field(&format!("divisions.{}", division_key));
            validation::validate_age_range(&division_field, division.min_age, division.max_age)?;
            if let Some(thresholds) = &division.thresholds {
                for (apparatus, tiers) in thresholds.entries() {
                    for table in tiers.preferential.iter().chain(tiers.minimum.iter()) {
                        for score in table.values() {
                            validation::validate_score(
                                &format!("{}.thresholds.{}", division_field, apparatus),
                                score,
                            )?;
                        }
                    }
                }
            }
        }

        match &self.rules {
            ProcedureRules::Championship(rules) => {
                validation::validate_positive_number(
                    &field("rules.qualification_count"),
                    rules.qualification_count,
                    1,
                )?;
            }
            ProcedureRules::AgeGroupChampionship(rules) => {
                validation::validate_positive_number(
                    &field("rules.qualification_count"),
                    rules.qualification_count,
                    1,
                )?;
            }
            ProcedureRules::DisciplineGames(rules) => {
                validation::validate_positive_number(
                    &field("rules.score_count"),
                    rules.score_count,
                    1,
                )?;
            }
            ProcedureRules::ContinentalGames(rules) => {
                validation::validate_positive_number(
                    &field("rules.qualification_count"),
                    rules.qualification_count,
                    1,
                )?;
            }
            ProcedureRules::DevelopmentGate(rules) => {
                validate_eligible_levels(&field("rules.eligible_levels"), &rules.eligible_levels)?;
                for (apparatus, bar) in rules.min_qualification_scores.entries() {
                    let bar_field = field(&format!("rules.min_qualification_scores.{}", apparatus));
                    match bar {
                        ScoreBar::Flat(score) => validation::validate_score(&bar_field, *score)?,
                        ScoreBar::ByGender(table) => {
                            for score in table.values() {
                                validation::validate_score(&bar_field, score)?;
                            }
                        }
                    }
                }
                validate_steps(&field("rules.priority"), &rules.priority)?;
                for minimum in &rules.category_minimums {
                    validation::validate_non_empty_string(
                        &field("rules.category_minimums.category"),
                        &minimum.category,
                    )?;
                }
            }
            ProcedureRules::DevelopmentDual(rules) => {
                validate_eligible_levels(&field("rules.eligible_levels"), &rules.eligible_levels)?;
                for (apparatus, steps) in rules.selection_plan.entries() {
                    validate_steps(&field(&format!("rules.selection_plan.{}", apparatus)), steps)?;
                }
                Regex::new(&rules.testing_event_pattern).map_err(|e| {
                    SelectionError::InvalidConfigValueError {
                        field: field("rules.testing_event_pattern"),
                        value: rules.testing_event_pattern.clone(),
                        reason: e.to_string(),
                    }
                })?;
            }
        }

        Ok(())
    }
}

fn validate_eligible_levels(field: &str, levels: &BTreeMap<String, Vec<String>>) -> Result<()> {
    if levels.is_empty() {
        return Err(SelectionError::MissingConfigError {
            field: field.to_string(),
        });
    }

    for (level, groups) in levels {
        for group in groups {
            if AgeBand::parse(group).is_none() {
                return Err(SelectionError::InvalidConfigValueError {
                    field: format!("{}.{}", field, level),
                    value: group.clone(),
                    reason: "Age group must look like '11-12' or '10u'".to_string(),
                });
            }
        }
    }

    Ok(())
}

fn validate_steps(field: &str, steps: &[QuotaStep]) -> Result<()> {
    for (index, step) in steps.iter().enumerate() {
        let step_field = format!("{}[{}]", field, index);
        if step.target().is_none() {
            return Err(SelectionError::ConfigValidationError {
                field: step_field,
                message: "A quota step needs exactly one of 'category' or 'level'".to_string(),
            });
        }
        validation::validate_positive_number(&format!("{}.count", step_field), step.count, 1)?;
    }
    Ok(())
}
