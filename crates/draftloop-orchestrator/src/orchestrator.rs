//! Stage execution on the shared worker pool.

use std::sync::Arc;
use std::time::{Duration, Instant};

use draftloop_config::Config;
use draftloop_judge::{ConcurrentJudge, EvaluationReport};
use draftloop_llm::{LlmBackend, LlmFallbackInfo, LlmInvocation, Message};
use draftloop_search::SearchProvider;
use draftloop_stage_api::{Stage, StageContext, StageError, StageId, StageUpdate};
use draftloop_stages::{ContentStage, OutlineStage, ResearchStage};
use draftloop_utils::error::DraftloopError;
use draftloop_utils::logging::{log_stage_complete, log_stage_error, log_stage_start, stage_span};
use draftloop_utils::redaction::redact_error_message;
use draftloop_utils::WorkerPool;
use tracing::{Instrument, warn};

use crate::state::{StageDelta, WorkflowState};

/// Slots in the long-lived stage pool.
pub const STAGE_POOL_CAPACITY: usize = 3;

/// Runs pipeline stages one at a time through a bounded pool.
///
/// Stages are strictly sequential; the pool decouples the caller from
/// generation latency and is shared by every stage of the session. Nothing
/// returned from [`run_stage`](Self::run_stage) is an error: failures come
/// back as degraded updates or the fallback evaluation report.
///
/// Call [`shutdown`](Self::shutdown) to wait for in-flight work and release
/// the pool.
pub struct Orchestrator {
    pool: WorkerPool,
    backend: Arc<dyn LlmBackend>,
    research: Arc<dyn Stage>,
    outline: Arc<dyn Stage>,
    content: Arc<dyn Stage>,
    judge: Arc<ConcurrentJudge>,
    config: Config,
}

impl Orchestrator {
    /// Build an orchestrator around an existing backend.
    ///
    /// `search = None` runs research without web results.
    #[must_use]
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        search: Option<Arc<dyn SearchProvider>>,
        config: &Config,
    ) -> Self {
        let judge = ConcurrentJudge::new(
            Arc::clone(&backend),
            config.model_for_stage(StageId::Judge),
            config.timeout_for_stage(StageId::Judge),
        );
        Self {
            pool: WorkerPool::new("stages", STAGE_POOL_CAPACITY),
            research: Arc::new(ResearchStage::new(search, config.search_max_results())),
            outline: Arc::new(OutlineStage),
            content: Arc::new(ContentStage),
            judge: Arc::new(judge),
            backend,
            config: config.clone(),
        }
    }

    /// Build the backend and search provider from configuration.
    ///
    /// A search provider that cannot be built (usually a missing API key)
    /// is logged and research continues without web results.
    ///
    /// # Errors
    ///
    /// Returns `DraftloopError::Llm` when no text generation backend can be
    /// constructed.
    pub fn from_config(config: &Config) -> Result<(Self, Option<LlmFallbackInfo>), DraftloopError> {
        let (backend, fallback) = draftloop_llm::from_config_with_fallback(config)?;
        let search: Option<Arc<dyn SearchProvider>> = match draftloop_search::from_config(config) {
            Ok(provider) => provider.map(Arc::from),
            Err(e) => {
                warn!(
                    error = %redact_error_message(&e.to_string()),
                    "Web search unavailable, research will run without results"
                );
                None
            }
        };
        Ok((Self::new(Arc::from(backend), search, config), fallback))
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Run one stage against a snapshot of `state` and return its delta.
    pub async fn run_stage(&self, stage: StageId, state: &WorkflowState) -> StageDelta {
        match stage {
            StageId::Research => StageDelta::Text(self.research(state).await),
            StageId::Outline => StageDelta::Text(self.outline(state).await),
            StageId::Content => StageDelta::Text(self.content(state).await),
            StageId::Judge => StageDelta::Evaluation(self.evaluate(state).await),
        }
    }

    pub async fn research(&self, state: &WorkflowState) -> StageUpdate {
        self.generate(&self.research, state).await
    }

    pub async fn outline(&self, state: &WorkflowState) -> StageUpdate {
        self.generate(&self.outline, state).await
    }

    pub async fn content(&self, state: &WorkflowState) -> StageUpdate {
        self.generate(&self.content, state).await
    }

    /// Score the current content. A pool failure yields the fallback report.
    pub async fn evaluate(&self, state: &WorkflowState) -> EvaluationReport {
        let input = state.judge_input();
        let topic = input.topic.clone();
        let judge = Arc::clone(&self.judge);
        let started = Instant::now();

        log_stage_start(&topic, StageId::Judge.as_str());
        let task = async move { judge.evaluate(&input).await }
            .instrument(stage_span(&topic, StageId::Judge.as_str()));

        match self.pool.run(task).await {
            Ok(report) => {
                log_stage_complete(&topic, StageId::Judge.as_str(), started.elapsed().as_millis());
                report
            }
            Err(e) => {
                log_stage_error(
                    &topic,
                    StageId::Judge.as_str(),
                    &e.to_string(),
                    started.elapsed().as_millis(),
                );
                EvaluationReport::fallback()
            }
        }
    }

    /// Wait for in-flight stages, then close the pool.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }

    async fn generate(&self, stage: &Arc<dyn Stage>, state: &WorkflowState) -> StageUpdate {
        let id = stage.id();
        let ctx = state.snapshot();
        let topic = ctx.topic.clone();
        let started = Instant::now();

        log_stage_start(&topic, id.as_str());
        let task = execute_stage(
            Arc::clone(stage),
            Arc::clone(&self.backend),
            ctx,
            self.config.model_for_stage(id).unwrap_or_default(),
            self.config.timeout_for_stage(id),
        )
        .instrument(stage_span(&topic, id.as_str()));

        let result = match self.pool.run(task).await {
            Ok(result) => result,
            Err(e) => Err(StageError::Pool(e)),
        };

        let elapsed = started.elapsed().as_millis();
        match result {
            Ok(update) => {
                if let Some(error) = update.error() {
                    log_stage_error(&topic, id.as_str(), &error.to_string(), elapsed);
                } else {
                    log_stage_complete(&topic, id.as_str(), elapsed);
                }
                update
            }
            Err(e) => {
                log_stage_error(&topic, id.as_str(), &e.to_string(), elapsed);
                StageUpdate::degraded(id, e)
            }
        }
    }
}

/// Prompt, generate and postprocess one stage under a single deadline.
async fn execute_stage(
    stage: Arc<dyn Stage>,
    backend: Arc<dyn LlmBackend>,
    ctx: StageContext,
    model: String,
    deadline: Duration,
) -> Result<StageUpdate, StageError> {
    let id = stage.id();
    ctx.ensure_ready(id, stage.requires())?;

    let generation = async {
        let prompt = stage.prompt(&ctx).await?;
        let invocation = LlmInvocation::new(
            ctx.topic.clone(),
            id.as_str(),
            model,
            deadline,
            vec![Message::user(prompt)],
        );
        Ok::<_, StageError>(backend.invoke(invocation).await?)
    };

    let response = tokio::time::timeout(deadline, generation)
        .await
        .map_err(|_| StageError::Timeout {
            stage: id.to_string(),
            timeout_seconds: deadline.as_secs(),
        })??;

    Ok(stage.postprocess(response.raw_response, &ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use draftloop_config::ConfigBuilder;
    use draftloop_judge::Criterion;
    use draftloop_llm::{LlmError, LlmResult};
    use draftloop_stage_api::StageOutcome;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replies keyed on the invocation's stage id.
    #[derive(Default)]
    struct StageBackend {
        fail_stage: Option<&'static str>,
        delay: Duration,
        calls: AtomicUsize,
        prompts: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl LlmBackend for StageBackend {
        async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts
                .lock()
                .unwrap()
                .push((inv.stage_id.clone(), inv.prompt().unwrap_or_default().to_string()));
            tokio::time::sleep(self.delay).await;

            if self.fail_stage == Some(inv.stage_id.as_str()) {
                return Err(LlmError::ProviderOutage("service unavailable".to_string()));
            }
            let reply = match inv.stage_id.as_str() {
                "research" => "Qubits exploit superposition.",
                "outline" => "1. Introduction\n2. Qubits\n3. Conclusion",
                "content" => "Quantum computers are...",
                "judge:research" => "8",
                "judge:outline" => "6",
                _ => "9",
            };
            Ok(LlmResult::new(reply, "stub", "stub-model"))
        }
    }

    fn orchestrator(backend: StageBackend) -> (Orchestrator, Arc<StageBackend>) {
        let backend = Arc::new(backend);
        let config = Config::minimal_for_testing();
        (Orchestrator::new(backend.clone(), None, &config), backend)
    }

    fn with_topic(topic: &str) -> WorkflowState {
        WorkflowState::new().with_topic(topic).unwrap()
    }

    #[tokio::test]
    async fn test_research_stage_completes() {
        let (orch, backend) = orchestrator(StageBackend::default());
        let update = orch.research(&with_topic("Quantum Computing")).await;

        assert!(!update.is_degraded());
        assert_eq!(update.stage, StageId::Research);
        assert_eq!(update.output, "Qubits exploit superposition.");

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts[0].0, "research");
        assert!(prompts[0].1.contains("Quantum Computing"));
    }

    #[tokio::test]
    async fn test_generation_failure_degrades_stage() {
        let (orch, _) = orchestrator(StageBackend {
            fail_stage: Some("outline"),
            ..StageBackend::default()
        });
        let update = orch.outline(&with_topic("Quantum Computing")).await;

        assert!(update.is_degraded());
        assert_eq!(
            update.output,
            "Outline Error: Provider outage: service unavailable"
        );
        assert!(matches!(
            update.outcome,
            StageOutcome::Degraded {
                error: StageError::Generation(LlmError::ProviderOutage(_))
            }
        ));
    }

    #[tokio::test]
    async fn test_content_without_approved_outline_is_not_generated() {
        let (orch, backend) = orchestrator(StageBackend::default());
        let update = orch.content(&with_topic("Quantum Computing")).await;

        assert!(matches!(update.error(), Some(StageError::NotReady { .. })));
        assert!(update.output.starts_with("Content Generation Error: "));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stage_deadline_degrades_to_timeout() {
        let backend = Arc::new(StageBackend {
            delay: Duration::from_secs(30),
            ..StageBackend::default()
        });
        let mut config = Config::minimal_for_testing();
        config.defaults.stage_timeout = Some(1);
        let orch = Orchestrator::new(backend, None, &config);

        let update = orch.research(&with_topic("Quantum Computing")).await;
        assert!(matches!(
            update.error(),
            Some(StageError::Timeout {
                timeout_seconds: 1,
                ..
            })
        ));
        assert!(update.output.starts_with("Research Error: "));
    }

    #[test]
    fn test_stage_settings_follow_config() {
        let config = ConfigBuilder::new()
            .model("gemini-2.5-pro")
            .stage_timeout(Duration::from_secs(120))
            .build()
            .unwrap();
        let orch = Orchestrator::new(Arc::new(StageBackend::default()), None, &config);
        assert_eq!(
            orch.config().model_for_stage(StageId::Content).as_deref(),
            Some("gemini-2.5-pro")
        );
        assert_eq!(
            orch.config().timeout_for_stage(StageId::Outline),
            Duration::from_secs(120)
        );
        assert_eq!(orch.pool().capacity(), STAGE_POOL_CAPACITY);
    }

    #[tokio::test]
    async fn test_run_stage_dispatches_judge() {
        let (orch, _) = orchestrator(StageBackend::default());
        let state = with_topic("Quantum Computing");

        match orch.run_stage(StageId::Judge, &state).await {
            StageDelta::Evaluation(report) => {
                assert_eq!(report.score(Criterion::Research), Some(8.0));
                assert_eq!(report.score(Criterion::Outline), Some(6.0));
                assert_eq!(report.score(Criterion::Content), Some(9.0));
            }
            other => panic!("Expected evaluation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_shutdown_closes_pool() {
        let (orch, _) = orchestrator(StageBackend::default());
        orch.shutdown().await;
        assert!(orch.pool().is_shut_down());

        let update = orch.research(&with_topic("Quantum Computing")).await;
        assert!(matches!(update.error(), Some(StageError::Pool(_))));

        let report = orch.evaluate(&with_topic("Quantum Computing")).await;
        assert!(report.fallback);
    }
}
