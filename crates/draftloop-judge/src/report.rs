//! The judge's output record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::criterion::{Criterion, Grade};
use crate::scoring::{self, NEUTRAL_SCORE};

/// Suggestion returned alone when the evaluation as a whole failed.
pub const EVALUATION_ERROR_SUGGESTION: &str = "Error during evaluation. Please try again.";

/// Scores, composite, grades and suggestions for one piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Raw 0-10 score per criterion.
    pub scores: BTreeMap<Criterion, f64>,
    /// Weighted composite on the 0-1 scale.
    pub composite: f64,
    pub grades: BTreeMap<Criterion, Grade>,
    /// Improvement bullets in research, outline, content order, or a single
    /// status message.
    pub suggestions: Vec<String>,
    /// Criteria that fell back to the neutral score.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaulted: Vec<Criterion>,
    /// True when this is the whole-evaluation fallback report.
    #[serde(default)]
    pub fallback: bool,
}

impl EvaluationReport {
    /// Aggregate three validated raw scores into a report.
    #[must_use]
    pub fn from_scores(scores: BTreeMap<Criterion, f64>, defaulted: Vec<Criterion>) -> Self {
        Self {
            composite: scoring::composite(&scores),
            grades: scoring::grades(&scores),
            suggestions: scoring::suggestions(&scores),
            scores,
            defaulted,
            fallback: false,
        }
    }

    /// Report returned when evaluation could not be completed.
    ///
    /// Every criterion carries the neutral score, so the composite is
    /// `NEUTRAL_SCORE / 10` (0.5) and agrees with the per-criterion
    /// default. Every grade is fixed at `C`.
    #[must_use]
    pub fn fallback() -> Self {
        let scores: BTreeMap<Criterion, f64> =
            Criterion::ALL.iter().map(|c| (*c, NEUTRAL_SCORE)).collect();
        Self {
            composite: scoring::composite(&scores),
            grades: Criterion::ALL.iter().map(|c| (*c, Grade::C)).collect(),
            suggestions: vec![EVALUATION_ERROR_SUGGESTION.to_string()],
            scores,
            defaulted: Criterion::ALL.to_vec(),
            fallback: true,
        }
    }

    #[must_use]
    pub fn score(&self, criterion: Criterion) -> Option<f64> {
        self.scores.get(&criterion).copied()
    }

    #[must_use]
    pub fn grade(&self, criterion: Criterion) -> Option<Grade> {
        self.grades.get(&criterion).copied()
    }

    /// Composite scaled to 0-100 for display.
    #[must_use]
    pub fn composite_percent(&self) -> f64 {
        self.composite * 100.0
    }

    /// Per-criterion `"8.0/10 (B)"` strings.
    #[must_use]
    pub fn detailed_scores(&self) -> BTreeMap<Criterion, String> {
        self.scores
            .iter()
            .map(|(criterion, score)| {
                let grade = self
                    .grades
                    .get(criterion)
                    .copied()
                    .unwrap_or_else(|| Grade::for_score(*score));
                (*criterion, format!("{score:.1}/10 ({grade})"))
            })
            .collect()
    }

    /// Suggestions joined one per line.
    #[must_use]
    pub fn suggestions_text(&self) -> String {
        self.suggestions.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_report_shape() {
        let report = EvaluationReport::fallback();
        assert!(report.fallback);
        assert!((report.composite - 0.5).abs() < 1e-12);
        assert!(report.grades.values().all(|g| *g == Grade::C));
        assert_eq!(report.suggestions, vec![EVALUATION_ERROR_SUGGESTION]);
        assert_eq!(
            report.detailed_scores()[&Criterion::Research],
            "5.0/10 (C)"
        );
    }

    #[test]
    fn test_detailed_scores_and_percent() {
        let report = EvaluationReport::from_scores(
            BTreeMap::from([
                (Criterion::Research, 8.0),
                (Criterion::Outline, 6.0),
                (Criterion::Content, 9.0),
            ]),
            Vec::new(),
        );
        let detailed = report.detailed_scores();
        assert_eq!(detailed[&Criterion::Research], "8.0/10 (B)");
        assert_eq!(detailed[&Criterion::Outline], "6.0/10 (D)");
        assert_eq!(detailed[&Criterion::Content], "9.0/10 (A)");
        assert!((report.composite_percent() - 78.0).abs() < 1e-9);
        assert_eq!(
            report.suggestions_text(),
            "• Improve outline structure and organization"
        );
    }

    #[test]
    fn test_json_shape() {
        let report = EvaluationReport::from_scores(
            BTreeMap::from([
                (Criterion::Research, 7.0),
                (Criterion::Outline, 7.0),
                (Criterion::Content, 7.0),
            ]),
            Vec::new(),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["scores"]["content"], 7.0);
        assert_eq!(json["grades"]["research"], "C");
        assert_eq!(json["fallback"], false);
        assert!(json.get("defaulted").is_none());
    }
}
