//! Fuzzy search over task titles.
//!
//! Two matching algorithms are available and they are deliberately kept apart:
//!
//! * [`Matcher::EditDistance`] lowercases both sides, computes the Levenshtein
//!   distance, keeps titles within `max_distance` and ranks closest first.
//! * [`Matcher::TokenJaccard`] splits both sides on whitespace (case-sensitive),
//!   computes the Jaccard similarity of the word sets, keeps titles at or above
//!   `min_similarity` and ranks most similar first.
//!
//! The server uses `EditDistance` unless configured otherwise. A threshold
//! override from a request is always interpreted in the units of the active
//! algorithm; scores of the two algorithms are never mixed.
//!
//! The matcher never filters by owner. Callers pass in tasks that are already
//! scoped to the requesting user.

use std::collections::HashSet;

use crate::error::AppError;
use crate::models::Task;

/// Default maximum edit distance for [`Matcher::EditDistance`].
pub const DEFAULT_MAX_DISTANCE: usize = 5;

/// Default minimum similarity for [`Matcher::TokenJaccard`].
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.3;

/// A title-matching algorithm together with its threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Matcher {
    /// Case-insensitive Levenshtein distance; lower is closer.
    EditDistance { max_distance: usize },
    /// Case-sensitive whitespace-token Jaccard similarity; higher is closer.
    TokenJaccard { min_similarity: f64 },
}

impl Default for Matcher {
    fn default() -> Self {
        Matcher::edit_distance()
    }
}

impl Matcher {
    pub fn edit_distance() -> Self {
        Matcher::EditDistance {
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }

    pub fn token_jaccard() -> Self {
        Matcher::TokenJaccard {
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }

    /// Returns the same algorithm with a different threshold.
    ///
    /// For `EditDistance` the threshold must be a non-negative whole number;
    /// for `TokenJaccard` it must be a finite number. Anything else is a
    /// `BadRequest`.
    pub fn with_threshold(self, threshold: f64) -> Result<Self, AppError> {
        if !threshold.is_finite() {
            return Err(AppError::BadRequest(format!(
                "Invalid search threshold: {}",
                threshold
            )));
        }
        match self {
            Matcher::EditDistance { .. } => {
                if threshold < 0.0 || threshold.fract() != 0.0 {
                    return Err(AppError::BadRequest(format!(
                        "Edit distance threshold must be a non-negative integer, got {}",
                        threshold
                    )));
                }
                Ok(Matcher::EditDistance {
                    max_distance: threshold as usize,
                })
            }
            Matcher::TokenJaccard { .. } => Ok(Matcher::TokenJaccard {
                min_similarity: threshold,
            }),
        }
    }

    /// Filters `tasks` against `query` and returns the matches best-first.
    ///
    /// Ties keep their input order.
    pub fn search(&self, tasks: Vec<Task>, query: &str) -> Vec<Task> {
        match *self {
            Matcher::EditDistance { max_distance } => {
                let query = query.to_lowercase();
                let mut scored: Vec<(Task, usize)> = tasks
                    .into_iter()
                    .filter_map(|task| {
                        let distance = levenshtein(&query, &task.title.to_lowercase());
                        (distance <= max_distance).then_some((task, distance))
                    })
                    .collect();
                // `sort_by_key` is stable.
                scored.sort_by_key(|(_, distance)| *distance);
                scored.into_iter().map(|(task, _)| task).collect()
            }
            Matcher::TokenJaccard { min_similarity } => {
                let mut scored: Vec<(Task, f64)> = tasks
                    .into_iter()
                    .filter_map(|task| {
                        let similarity = jaccard_similarity(query, &task.title);
                        (similarity >= min_similarity).then_some((task, similarity))
                    })
                    .collect();
                scored.sort_by(|(_, a), (_, b)| b.total_cmp(a));
                scored.into_iter().map(|(task, _)| task).collect()
            }
        }
    }
}

/// Levenshtein distance between `a` and `b`, counted in `char`s.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            let insertion = current[j] + 1;
            let deletion = previous[j + 1] + 1;
            current[j + 1] = substitution.min(insertion).min(deletion);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Jaccard similarity of the whitespace-separated word sets of `a` and `b`.
///
/// Two empty sets have similarity `0.0`.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let a: HashSet<&str> = a.split_whitespace().collect();
    let b: HashSet<&str> = b.split_whitespace().collect();

    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(&b).count();
    intersection as f64 / union as f64
}
