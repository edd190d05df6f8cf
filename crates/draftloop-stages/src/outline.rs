use async_trait::async_trait;
use draftloop_prompt_template::outline_prompt;
use draftloop_stage_api::{ContextField, Stage, StageContext, StageError, StageId};

/// Drafts an outline for the topic.
///
/// When the snapshot carries a change request the prompt asks for a
/// revision. The orchestrator clears the request when it merges the update.
#[derive(Debug, Default)]
pub struct OutlineStage;

#[async_trait]
impl Stage for OutlineStage {
    fn id(&self) -> StageId {
        StageId::Outline
    }

    fn requires(&self) -> &'static [ContextField] {
        &[ContextField::Topic]
    }

    async fn prompt(&self, ctx: &StageContext) -> Result<String, StageError> {
        Ok(outline_prompt(&ctx.topic, ctx.change_request.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prompt_includes_change_request_when_present() {
        let mut ctx = StageContext::for_topic("Quantum Computing");
        let first = OutlineStage.prompt(&ctx).await.unwrap();
        assert!(!first.contains("Change Request"));

        ctx.change_request = Some("make it shorter".to_string());
        let revised = OutlineStage.prompt(&ctx).await.unwrap();
        assert!(revised.contains("Change Request: make it shorter"));
        assert!(revised.contains("Topic: Quantum Computing"));
    }
}
