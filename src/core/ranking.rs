use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Resolution of every score comparison.
pub const SCORE_EPSILON: f64 = 1e-5;

fn quantize(score: f64) -> i64 {
    (score / SCORE_EPSILON).round() as i64
}

/// Two scores are the same score when they round to the same `SCORE_EPSILON` step.
/// Ordering uses the same steps, so a tie seen here is always adjacent after sorting.
pub fn scores_equal(a: f64, b: f64) -> bool {
    quantize(a) == quantize(b)
}

/// Rank given to the loser of a secondary-key tie-break.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakPolicy {
    /// The loser takes its own position.
    #[default]
    SeparateRanks,
    /// The loser stays on the winner's rank; only the narrative records who won.
    ShareRank,
}

/// How a ranking orders entries of type `T`.
pub struct RankKeys<T> {
    pub id: fn(&T) -> &str,
    pub primary: fn(&T) -> f64,
    pub secondary: Option<fn(&T) -> f64>,
    pub policy: TieBreakPolicy,
}

impl<T> RankKeys<T> {
    pub fn primary_only(id: fn(&T) -> &str, primary: fn(&T) -> f64) -> Self {
        Self {
            id,
            primary,
            secondary: None,
            policy: TieBreakPolicy::SeparateRanks,
        }
    }

    pub fn with_secondary(
        id: fn(&T) -> &str,
        primary: fn(&T) -> f64,
        secondary: fn(&T) -> f64,
    ) -> Self {
        Self {
            id,
            primary,
            secondary: Some(secondary),
            policy: TieBreakPolicy::SeparateRanks,
        }
    }

    pub fn policy(mut self, policy: TieBreakPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn compare(&self, a: &T, b: &T) -> Ordering {
        let by_primary = quantize((self.primary)(b)).cmp(&quantize((self.primary)(a)));
        let by_secondary = match self.secondary {
            Some(secondary) => quantize(secondary(b)).cmp(&quantize(secondary(a))),
            None => Ordering::Equal,
        };
        by_primary
            .then(by_secondary)
            .then_with(|| (self.id)(a).cmp((self.id)(b)))
    }
}

/// Outcome of the secondary-key comparison for an entry whose primary score tied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum TieBreak {
    #[default]
    None,
    Won { own: f64, other: f64 },
    Lost { own: f64, other: f64 },
    Unresolved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry<T> {
    pub item: T,
    pub rank: usize,
    pub needs_manual_review: bool,
    pub tie_break: TieBreak,
}

/// Orders `items` best first and assigns competition ranks.
///
/// Entries tied on the primary score and on the secondary score (or with no secondary
/// key) share a rank and are flagged for manual review. Any other entry is ranked by its
/// 1-based position, so ranks skip past a tie block. A secondary key that separates two
/// entries leaves neither flagged.
pub fn assign_ranks<T>(mut items: Vec<T>, keys: &RankKeys<T>) -> Vec<RankedEntry<T>> {
    items.sort_by(|a, b| keys.compare(a, b));

    let mut ranked: Vec<RankedEntry<T>> = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let position = index + 1;
        let mut entry = RankedEntry {
            item,
            rank: position,
            needs_manual_review: false,
            tie_break: TieBreak::None,
        };

        if let Some(previous) = ranked.last_mut() {
            let primary_tie = scores_equal(
                (keys.primary)(&entry.item),
                (keys.primary)(&previous.item),
            );

            if primary_tie {
                let secondary = keys
                    .secondary
                    .map(|key| (key(&entry.item), key(&previous.item)));

                match secondary {
                    Some((own, other)) if !scores_equal(own, other) => {
                        entry.tie_break = TieBreak::Lost { own, other };
                        if previous.tie_break == TieBreak::None {
                            previous.tie_break = TieBreak::Won {
                                own: other,
                                other: own,
                            };
                        }
                        if keys.policy == TieBreakPolicy::ShareRank {
                            entry.rank = previous.rank;
                        }
                    }
                    _ => {
                        entry.rank = previous.rank;
                        entry.needs_manual_review = true;
                        previous.needs_manual_review = true;
                        entry.tie_break = TieBreak::Unresolved;
                        if previous.tie_break == TieBreak::None {
                            previous.tie_break = TieBreak::Unresolved;
                        }
                    }
                }
            }
        }

        ranked.push(entry);
    }

    ranked
}
