use crate::config::procedure_config::SelectionConfig;
use crate::core::service::DivisionRanking;
use crate::utils::error::Result;
use std::fmt::Write;

/// Plain-text rankings, one block per apparatus and division.
pub fn render_table(rankings: &[DivisionRanking]) -> String {
    let mut out = String::new();

    for ranking in rankings {
        let outcome = &ranking.outcome;
        if outcome.ranked.is_empty() && outcome.skipped.is_empty() {
            continue;
        }

        let _ = writeln!(out, "== {} / {} ==", ranking.apparatus, ranking.division);
        let _ = writeln!(
            out,
            "{:>4}  {:<12} {:>9}  {:<4} {:<4} {:<6} {}",
            "rank", "athlete", "score", "pref", "min", "review", "tie-break"
        );
        for ranked in &outcome.ranked {
            let _ = writeln!(
                out,
                "{:>4}  {:<12} {:>9.3}  {:<4} {:<4} {:<6} {}",
                ranked.rank,
                ranked.athlete.id,
                ranked.combined_score,
                yes_no(ranked.meets_preferential_threshold),
                yes_no(ranked.meets_minimum_threshold),
                yes_no(ranked.needs_manual_review),
                ranked.tie_break_info.as_deref().unwrap_or("")
            );
        }

        if !outcome.skipped.is_empty() {
            let _ = writeln!(out, "not ranked:");
            for skipped in &outcome.skipped {
                let _ = writeln!(out, "  {:<12} {}", skipped.athlete_id, skipped.reason);
            }
        }
        out.push('\n');
    }

    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

pub fn render_json(rankings: &[DivisionRanking]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rankings)?)
}

/// Summary of every configured procedure, for `--list`.
pub fn render_procedures(config: &SelectionConfig) -> String {
    let mut out = String::new();

    for (key, procedure) in &config.procedures {
        let year = procedure
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "-".to_string());
        let divisions: Vec<&str> = procedure.divisions.keys().map(String::as_str).collect();

        let _ = writeln!(
            out,
            "{}  ({}, {}, {})",
            key,
            procedure.name,
            procedure.calculator().as_str(),
            year
        );
        let _ = writeln!(out, "    divisions: {}", divisions.join(", "));
        if !procedure.events.is_empty() {
            let events: Vec<&str> = procedure
                .events
                .values()
                .map(|event| event.name.as_str())
                .collect();
            let _ = writeln!(out, "    events: {}", events.join(", "));
        }
    }

    out
}
