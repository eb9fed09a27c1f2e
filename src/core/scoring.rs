use crate::domain::model::{CompetitionResult, SkipReason};
use regex::Regex;
use std::collections::BTreeMap;

/// An athlete's best marks at one event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBest {
    pub event: String,
    pub qualification: f64,
    pub final_score: Option<f64>,
}

/// Collapses repeated results from the same event into that event's maxima.
pub fn event_bests(results: &[&CompetitionResult]) -> Vec<EventBest> {
    let mut by_event: BTreeMap<&str, EventBest> = BTreeMap::new();

    for result in results {
        let entry = by_event
            .entry(result.event.as_str())
            .or_insert_with(|| EventBest {
                event: result.event.clone(),
                qualification: result.qualification_score,
                final_score: None,
            });
        entry.qualification = entry.qualification.max(result.qualification_score);
        if let Some(final_score) = result.final_score {
            entry.final_score = Some(entry.final_score.map_or(final_score, |f| f.max(final_score)));
        }
    }

    by_event.into_values().collect()
}

pub fn distinct_events(results: &[&CompetitionResult]) -> usize {
    results
        .iter()
        .map(|result| result.event.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .len()
}

pub fn check_min_events(
    results: &[&CompetitionResult],
    min_events: Option<usize>,
) -> Result<(), SkipReason> {
    let Some(required) = min_events else {
        return Ok(());
    };
    let attended = distinct_events(results);
    if attended < required {
        return Err(SkipReason::InsufficientEvents { attended, required });
    }
    Ok(())
}

/// Rejects negative or non-finite qualification scores.
pub fn check_scores(results: &[&CompetitionResult]) -> Result<(), SkipReason> {
    match results
        .iter()
        .find(|result| !result.qualification_score.is_finite() || result.qualification_score < 0.0)
    {
        Some(result) => Err(SkipReason::InvalidScore {
            event: result.event.clone(),
            score: result.qualification_score,
        }),
        None => Ok(()),
    }
}

/// The `count` largest values, highest first.
pub fn top_n(values: impl IntoIterator<Item = f64>, count: usize) -> Vec<f64> {
    let mut values: Vec<f64> = values.into_iter().collect();
    values.sort_by(|a, b| b.total_cmp(a));
    values.truncate(count);
    values
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopScores {
    pub qualification: Vec<f64>,
    pub finals: Vec<f64>,
    pub total: f64,
}

/// Sum of the best `qualification_count` event qualification scores and the best
/// `final_count` event final scores. Fewer available scores are summed as they are.
pub fn top_qualification_and_final(
    results: &[&CompetitionResult],
    qualification_count: usize,
    final_count: usize,
) -> TopScores {
    let bests = event_bests(results);
    let qualification = top_n(bests.iter().map(|best| best.qualification), qualification_count);
    let finals = top_n(bests.iter().filter_map(|best| best.final_score), final_count);
    let total = qualification.iter().chain(finals.iter()).sum();

    TopScores {
        qualification,
        finals,
        total,
    }
}

/// Pools every positive qualification and final score and sums the `count` highest.
pub fn highest_overall(results: &[&CompetitionResult], count: usize) -> TopScores {
    let pooled = results
        .iter()
        .flat_map(|result| [Some(result.qualification_score), result.final_score])
        .flatten()
        .filter(|score| *score > 0.0);
    let scores = top_n(pooled, count);
    let total = scores.iter().sum();

    TopScores {
        qualification: scores,
        finals: Vec::new(),
        total,
    }
}

pub fn best_qualification(results: &[&CompetitionResult]) -> Option<f64> {
    results
        .iter()
        .map(|result| result.qualification_score)
        .max_by(|a, b| a.total_cmp(b))
}

/// Highest individual mark, optionally counting final scores.
pub fn best_single_result(results: &[&CompetitionResult], include_finals: bool) -> Option<f64> {
    results
        .iter()
        .flat_map(|result| {
            let final_score = if include_finals { result.final_score } else { None };
            [Some(result.qualification_score), final_score]
        })
        .flatten()
        .max_by(|a, b| a.total_cmp(b))
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DualScores {
    pub qualification: Option<f64>,
    pub testing: Option<f64>,
}

/// Best qualification score from regular events and from testing events, told apart by
/// matching the event identifier against `testing_events`.
pub fn split_best(results: &[&CompetitionResult], testing_events: &Regex) -> DualScores {
    let (testing, regular): (Vec<&CompetitionResult>, Vec<&CompetitionResult>) = results
        .iter()
        .copied()
        .partition(|result| testing_events.is_match(&result.event));

    DualScores {
        qualification: best_qualification(&regular),
        testing: best_qualification(&testing),
    }
}
