use serde::{Deserialize, Serialize};

/// Stage identifiers for the content workflow.
///
/// Stages run strictly in this order; each consumes the output of the one
/// before it:
///
/// ```text
/// Research → Outline → (approval) → Content → Judge
/// ```
///
/// ```rust
/// use draftloop_utils::types::StageId;
///
/// assert_eq!(StageId::Content.as_str(), "content");
/// assert_eq!(StageId::Content.error_label(), "Content Generation Error");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageId {
    /// Web search plus research summary for the topic.
    Research,
    /// Structured outline, revised until the user approves it.
    Outline,
    /// Full article generated from the approved outline.
    Content,
    /// Concurrent multi-criteria evaluation.
    Judge,
}

impl StageId {
    /// All stages in pipeline order.
    pub const ALL: [StageId; 4] = [
        StageId::Research,
        StageId::Outline,
        StageId::Content,
        StageId::Judge,
    ];

    /// Canonical lowercase name used in config keys and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Outline => "outline",
            Self::Content => "content",
            Self::Judge => "judge",
        }
    }

    /// Prefix for the human-readable error text embedded in a degraded
    /// stage's output field.
    #[must_use]
    pub const fn error_label(&self) -> &'static str {
        match self {
            Self::Research => "Research Error",
            Self::Outline => "Outline Error",
            Self::Content => "Content Generation Error",
            Self::Judge => "Evaluation Error",
        }
    }

    /// Parse a stage from its canonical name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == name)
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Cli,
    Config,
    Programmatic,
    Default,
}
