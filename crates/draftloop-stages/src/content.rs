use async_trait::async_trait;
use draftloop_prompt_template::content_prompt;
use draftloop_stage_api::{ContextField, Stage, StageContext, StageError, StageId};

/// Writes the article from the approved outline.
///
/// Only `approved_outline` is read; a drafted but unapproved outline is
/// never used.
#[derive(Debug, Default)]
pub struct ContentStage;

#[async_trait]
impl Stage for ContentStage {
    fn id(&self) -> StageId {
        StageId::Content
    }

    fn requires(&self) -> &'static [ContextField] {
        &[ContextField::ApprovedOutline]
    }

    async fn prompt(&self, ctx: &StageContext) -> Result<String, StageError> {
        ctx.ensure_ready(self.id(), self.requires())?;
        let outline = ctx.approved_outline.as_deref().unwrap_or_default();
        Ok(content_prompt(outline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prompt_uses_approved_outline_only() {
        let mut ctx = StageContext::for_topic("Rust");
        ctx.outline = Some("1. Draft outline".to_string());
        ctx.approved_outline = Some("1. Approved outline".to_string());

        let prompt = ContentStage.prompt(&ctx).await.unwrap();
        assert!(prompt.contains("1. Approved outline"));
        assert!(!prompt.contains("Draft outline"));
    }

    #[tokio::test]
    async fn test_unapproved_outline_is_not_ready() {
        let mut ctx = StageContext::for_topic("Rust");
        ctx.outline = Some("1. Draft outline".to_string());

        let err = ContentStage.prompt(&ctx).await.unwrap_err();
        assert!(matches!(err, StageError::NotReady { .. }));
    }
}
