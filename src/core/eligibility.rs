use crate::config::procedure_config::DivisionConfig;
use crate::domain::model::{Athlete, CompetitionResult, SkipReason};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Age reached during `evaluation_year`, regardless of the birthday's month and day.
pub fn age_in_year(date_of_birth: &str, evaluation_year: i32) -> Option<i32> {
    let trimmed = date_of_birth.trim();
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(trimmed.get(..10)?, "%Y-%m-%d").ok())?;
    Some(evaluation_year - date.year())
}

pub fn check_age(age: i32, min_age: Option<u32>, max_age: Option<u32>) -> Result<(), SkipReason> {
    let below = min_age.is_some_and(|min| age < min as i32);
    let above = max_age.is_some_and(|max| age > max as i32);
    if below || above {
        return Err(SkipReason::OutsideAgeRange {
            age,
            min_age,
            max_age,
        });
    }
    Ok(())
}

pub fn has_result_at_level(results: &[&CompetitionResult], level: &str) -> bool {
    results
        .iter()
        .any(|result| result.level.eq_ignore_ascii_case(level))
}

/// Division gate shared by every calculator: date of birth, age range and required level.
/// Returns the athlete's age in the evaluation year.
pub fn screen_athlete(
    athlete: &Athlete,
    results: &[&CompetitionResult],
    division: &DivisionConfig,
    evaluation_year: i32,
) -> Result<i32, SkipReason> {
    let age = age_in_year(&athlete.date_of_birth, evaluation_year).ok_or_else(|| {
        SkipReason::InvalidDateOfBirth {
            value: athlete.date_of_birth.clone(),
        }
    })?;

    check_age(age, division.min_age, division.max_age)?;

    if let Some(level) = &division.level {
        if !has_result_at_level(results, level) {
            return Err(SkipReason::MissingRequiredLevel {
                level: level.clone(),
            });
        }
    }

    Ok(age)
}

/// Age band parsed from an age-group key such as `11-12` or `10u`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBand {
    pub min_age: Option<u32>,
    pub max_age: u32,
}

fn band_patterns() -> &'static (Option<Regex>, Option<Regex>) {
    static PATTERNS: OnceLock<(Option<Regex>, Option<Regex>)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r"^(\d+)\s*[-_]\s*(\d+)$").ok(),
            Regex::new(r"^(\d+)\s*[uU]$").ok(),
        )
    })
}

impl AgeBand {
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        let (range, under) = band_patterns();

        if let Some(caps) = range.as_ref().and_then(|re| re.captures(key)) {
            let min = caps[1].parse().ok()?;
            let max = caps[2].parse().ok()?;
            return (min <= max).then_some(AgeBand {
                min_age: Some(min),
                max_age: max,
            });
        }

        let caps = under.as_ref().and_then(|re| re.captures(key))?;
        Some(AgeBand {
            min_age: None,
            max_age: caps[1].parse().ok()?,
        })
    }

    pub fn contains(&self, age: i32) -> bool {
        self.min_age.map_or(true, |min| age >= min as i32) && age <= self.max_age as i32
    }
}

pub fn category_key(level: &str, age_group: &str) -> String {
    format!(
        "{}_{}",
        level.to_ascii_lowercase(),
        age_group.trim().to_ascii_lowercase().replace('-', "_")
    )
}

/// Development-pipeline category for an athlete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub key: String,
    pub level: String,
}

/// Places an athlete into the first age group listed for their level that contains
/// their age.
pub fn classify(
    level: &str,
    age: i32,
    eligible_levels: &BTreeMap<String, Vec<String>>,
) -> Result<Category, SkipReason> {
    let no_match = || SkipReason::NoMatchingCategory {
        level: level.to_string(),
        age,
    };

    let (level_key, groups) = eligible_levels
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(level.trim()))
        .ok_or_else(no_match)?;

    groups
        .iter()
        .find(|group| AgeBand::parse(group).is_some_and(|band| band.contains(age)))
        .map(|group| Category {
            key: category_key(level_key, group),
            level: level_key.to_ascii_lowercase(),
        })
        .ok_or_else(no_match)
}
