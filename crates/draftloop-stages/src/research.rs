use std::sync::Arc;

use async_trait::async_trait;
use draftloop_prompt_template::{SEARCH_RESULTS_HEADER, format_search_results, research_prompt};
use draftloop_search::SearchProvider;
use draftloop_stage_api::{ContextField, Stage, StageContext, StageError, StageId};
use draftloop_utils::redaction::redact_error_message;
use tracing::{debug, warn};

/// Default number of organic search results embedded in the prompt.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Searches the web for the topic and asks for a research summary.
///
/// Search failure never fails the stage: the prompt is built with an empty
/// result block instead.
pub struct ResearchStage {
    search: Option<Arc<dyn SearchProvider>>,
    max_results: usize,
}

impl ResearchStage {
    /// `search = None` runs research without web results.
    #[must_use]
    pub fn new(search: Option<Arc<dyn SearchProvider>>, max_results: usize) -> Self {
        Self {
            search,
            max_results,
        }
    }

    async fn search_block(&self, topic: &str) -> String {
        let Some(search) = &self.search else {
            debug!(topic, "Web search disabled, researching without results");
            return SEARCH_RESULTS_HEADER.to_string();
        };

        match search.search(topic).await {
            Ok(results) => format_search_results(
                results
                    .organic
                    .iter()
                    .map(|hit| (hit.title.as_deref(), hit.snippet.as_deref())),
                self.max_results,
            ),
            Err(e) => {
                warn!(
                    topic,
                    error = %redact_error_message(&e.to_string()),
                    "Web search failed, continuing without results"
                );
                SEARCH_RESULTS_HEADER.to_string()
            }
        }
    }
}

impl Default for ResearchStage {
    fn default() -> Self {
        Self::new(None, DEFAULT_MAX_RESULTS)
    }
}

#[async_trait]
impl Stage for ResearchStage {
    fn id(&self) -> StageId {
        StageId::Research
    }

    fn requires(&self) -> &'static [ContextField] {
        &[ContextField::Topic]
    }

    async fn prompt(&self, ctx: &StageContext) -> Result<String, StageError> {
        let results = self.search_block(&ctx.topic).await;
        Ok(research_prompt(&ctx.topic, &results))
    }
}
