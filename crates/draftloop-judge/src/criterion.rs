//! Evaluation criteria and letter grades.

use std::fmt;

use draftloop_prompt_template::{CONTENT_RUBRIC, OUTLINE_RUBRIC, RESEARCH_RUBRIC, Rubric};
use serde::{Deserialize, Serialize};

/// One independently scored quality criterion.
///
/// Declaration order is the fixed aggregation and suggestion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Research,
    Outline,
    Content,
}

impl Criterion {
    pub const ALL: [Criterion; 3] = [Criterion::Research, Criterion::Outline, Criterion::Content];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Outline => "outline",
            Self::Content => "content",
        }
    }

    /// Weight on the raw 0-10 scale. The three weights sum to 1.0.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        match self {
            Self::Research => 0.3,
            Self::Outline => 0.3,
            Self::Content => 0.4,
        }
    }

    #[must_use]
    pub const fn rubric(&self) -> Rubric {
        match self {
            Self::Research => RESEARCH_RUBRIC,
            Self::Outline => OUTLINE_RUBRIC,
            Self::Content => CONTENT_RUBRIC,
        }
    }

    /// Improvement bullet added when this criterion scores below 7.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::Research => "• Add more depth to research with credible sources",
            Self::Outline => "• Improve outline structure and organization",
            Self::Content => "• Enhance writing quality and reader engagement",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Letter grade for a raw 0-10 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Grade a raw score. Each band includes its lower bound.
    #[must_use]
    pub fn for_score(score: f64) -> Self {
        if score >= 9.0 {
            Self::A
        } else if score >= 8.0 {
            Self::B
        } else if score >= 7.0 {
            Self::C
        } else if score >= 6.0 {
            Self::D
        } else {
            Self::F
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
