//! Prompt templates for draftloop
//!
//! One builder per pipeline stage plus a [`Rubric`] for each judge criterion.
//! Templates are plain functions of their inputs so the same state always
//! produces the same prompt.

use std::fmt::Write as _;

/// Header line of the search results block embedded in the research prompt.
pub const SEARCH_RESULTS_HEADER: &str = "Search Results:\n\n";

/// Render ranked search hits as a numbered block.
///
/// Each hit is `(title, snippet)`; absent fields render as `No title` and
/// `No snippet`. At most `max_results` hits are included. An empty input
/// renders the header alone.
pub fn format_search_results<'a, I>(hits: I, max_results: usize) -> String
where
    I: IntoIterator<Item = (Option<&'a str>, Option<&'a str>)>,
{
    let mut out = String::from(SEARCH_RESULTS_HEADER);
    for (idx, (title, snippet)) in hits.into_iter().take(max_results).enumerate() {
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "{}. {}\n   {}\n\n",
            idx + 1,
            title.unwrap_or("No title"),
            snippet.unwrap_or("No snippet")
        );
    }
    out
}

/// Research summary prompt over pre-formatted search results.
#[must_use]
pub fn research_prompt(topic: &str, search_results: &str) -> String {
    format!(
        "Based on these search results, provide a comprehensive research summary:\n\
         \n\
         Topic: {topic}\n\
         \n\
         {search_results}\n\
         Provide:\n\
         1. Key findings and main concepts\n\
         2. Important facts from reliable sources\n\
         3. Current trends and developments\n\
         4. Expert insights if available\n\
         \n\
         Format as clear, well-organized paragraphs."
    )
}

/// Outline prompt, with an optional revision instruction appended.
#[must_use]
pub fn outline_prompt(topic: &str, change_request: Option<&str>) -> String {
    let base = format!(
        "Create a detailed outline based on this research topic:\n\
         \n\
         Topic: {topic}\n\
         \n\
         Requirements:\n\
         1. Introduction section\n\
         2. 3-5 main sections with subsections\n\
         3. Conclusion section\n\
         \n\
         Format: Use proper outline formatting with numbers and letters\n\
         (1., A., i., etc.)"
    );

    match change_request.map(str::trim).filter(|c| !c.is_empty()) {
        Some(change) => format!(
            "{base}\n\nChange Request: {change}\n\nPlease revise the outline accordingly."
        ),
        None => base,
    }
}

/// Article prompt built from the approved outline.
#[must_use]
pub fn content_prompt(approved_outline: &str) -> String {
    format!(
        "Generate professional content following this outline:\n\
         \n\
         {approved_outline}\n\
         \n\
         Requirements:\n\
         1. Follow outline structure exactly\n\
         2. Professional and engaging tone\n\
         3. Include relevant examples\n\
         4. Clear transitions between sections\n\
         5. Proper formatting with headers\n\
         6. 800-1200 words total"
    )
}

/// Scoring rubric for one judge criterion.
///
/// Point allocations always total 10, matching the 0-10 score scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rubric {
    /// What is being rated, as shown in the prompt title.
    pub subject: &'static str,
    /// Label for the embedded text.
    pub text_label: &'static str,
    pub items: &'static [(&'static str, u8)],
}

pub const RESEARCH_RUBRIC: Rubric = Rubric {
    subject: "research quality",
    text_label: "Research",
    items: &[
        ("Depth of research", 3),
        ("Source credibility", 4),
        ("Information relevance", 3),
    ],
};

pub const OUTLINE_RUBRIC: Rubric = Rubric {
    subject: "outline structure",
    text_label: "Outline",
    items: &[
        ("Logical flow", 4),
        ("Section completeness", 3),
        ("Clarity", 3),
    ],
};

pub const CONTENT_RUBRIC: Rubric = Rubric {
    subject: "content quality",
    text_label: "Content",
    items: &[("Writing quality", 4), ("Coherence", 3), ("Engagement", 3)],
};

impl Rubric {
    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.items.iter().map(|(_, points)| u32::from(*points)).sum()
    }

    /// Render the scoring prompt for `text`.
    ///
    /// `feedback` is included verbatim when present. The model is asked for
    /// a bare number so the reply can be parsed as a float.
    #[must_use]
    pub fn render(&self, text: &str, feedback: Option<&str>) -> String {
        let mut prompt = format!(
            "Rate the {} (0-10):\n{}: {}\n",
            self.subject, self.text_label, text
        );
        if let Some(feedback) = feedback {
            let _ = writeln!(prompt, "Feedback: {feedback}");
        }
        prompt.push_str("Criteria:\n");
        for (name, points) in self.items {
            let _ = writeln!(prompt, "- {name} ({points} points)");
        }
        prompt.push_str("Return only the numerical score.");
        prompt
    }
}
