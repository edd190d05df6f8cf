//! Score validation and aggregation.
//!
//! Pure functions: the judge calls these after all criterion tasks have
//! joined, so results depend only on the three raw scores.

use std::collections::BTreeMap;

use draftloop_utils::error::ScoreError;

use crate::criterion::{Criterion, Grade};

/// Substituted for any criterion that cannot be reliably scored.
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Bottom of the passing band. Criteria below it get a suggestion.
pub const SUGGESTION_THRESHOLD: f64 = 7.0;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Returned instead of bullets when every criterion passes.
pub const MEETS_STANDARDS: &str = "Content meets quality standards!";

/// Parse a model reply as a score on the 0-10 scale.
///
/// The reply must be a bare floating-point literal (surrounding whitespace
/// is ignored). Accepted values are returned as-is, without rounding.
///
/// # Errors
///
/// - `ScoreError::Parse` if the trimmed reply is not a float literal
/// - `ScoreError::OutOfRange` if the value is outside `[0, 10]` or not finite
pub fn parse_score(raw: &str) -> Result<f64, ScoreError> {
    let value: f64 = raw.trim().parse().map_err(|_| ScoreError::Parse {
        raw: raw.trim().to_string(),
    })?;

    if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
        return Err(ScoreError::OutOfRange { value });
    }

    Ok(value)
}

/// Weighted composite on the 0-1 scale.
///
/// Missing criteria count as [`NEUTRAL_SCORE`].
#[must_use]
pub fn composite(scores: &BTreeMap<Criterion, f64>) -> f64 {
    let weighted: f64 = Criterion::ALL
        .iter()
        .map(|c| scores.get(c).copied().unwrap_or(NEUTRAL_SCORE) * c.weight())
        .sum();
    weighted / MAX_SCORE
}

#[must_use]
pub fn grades(scores: &BTreeMap<Criterion, f64>) -> BTreeMap<Criterion, Grade> {
    scores
        .iter()
        .map(|(criterion, score)| (*criterion, Grade::for_score(*score)))
        .collect()
}

/// Improvement bullets for every criterion below 7, in research, outline,
/// content order. Never empty: a passing report gets [`MEETS_STANDARDS`].
#[must_use]
pub fn suggestions(scores: &BTreeMap<Criterion, f64>) -> Vec<String> {
    let bullets: Vec<String> = Criterion::ALL
        .iter()
        .filter(|c| scores.get(c).copied().unwrap_or(NEUTRAL_SCORE) < SUGGESTION_THRESHOLD)
        .map(|c| c.suggestion().to_string())
        .collect();

    if bullets.is_empty() {
        vec![MEETS_STANDARDS.to_string()]
    } else {
        bullets
    }
}
