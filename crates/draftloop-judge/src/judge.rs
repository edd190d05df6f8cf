//! Concurrent evaluation of the three criteria.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use draftloop_llm::{LlmBackend, LlmError, LlmInvocation, Message};
use draftloop_utils::WorkerPool;
use draftloop_utils::error::{PoolError, ScoreError};
use draftloop_utils::redaction::redact_error_message;
use tracing::{error, info, warn};

use crate::criterion::Criterion;
use crate::report::EvaluationReport;
use crate::scoring::{NEUTRAL_SCORE, parse_score};

/// Slots in the per-evaluation pool, one per criterion.
pub const JUDGE_POOL_CAPACITY: usize = 3;

/// Text fields the judge reads. Absent fields are scored as empty text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JudgeInput {
    pub topic: String,
    pub research: Option<String>,
    pub outline: Option<String>,
    pub approved_outline: Option<String>,
    pub content: String,
    pub feedback: Option<String>,
}

impl JudgeInput {
    /// Text rated by `criterion`.
    ///
    /// Research rates the research summary and falls back to the article
    /// when no research exists. Outline prefers the approved outline.
    #[must_use]
    pub fn text_for(&self, criterion: Criterion) -> &str {
        match criterion {
            Criterion::Research => self.research.as_deref().unwrap_or(self.content.as_str()),
            Criterion::Outline => self
                .approved_outline
                .as_deref()
                .or(self.outline.as_deref())
                .unwrap_or_default(),
            Criterion::Content => &self.content,
        }
    }

    #[must_use]
    pub fn prompt_for(&self, criterion: Criterion) -> String {
        let feedback = match criterion {
            Criterion::Content => self.feedback.as_deref(),
            Criterion::Research | Criterion::Outline => None,
        };
        criterion.rubric().render(self.text_for(criterion), feedback)
    }
}

/// Why a criterion got the neutral score.
#[derive(Debug, Clone)]
pub enum CriterionFailure {
    Generation(LlmError),
    Score(ScoreError),
    /// The scoring task panicked or was aborted.
    TaskFailed(PoolError),
}

/// Per-criterion result before aggregation.
#[derive(Debug, Clone)]
pub enum CriterionOutcome {
    Scored(f64),
    Defaulted(CriterionFailure),
}

impl CriterionOutcome {
    #[must_use]
    pub fn score(&self) -> f64 {
        match self {
            Self::Scored(score) => *score,
            Self::Defaulted(_) => NEUTRAL_SCORE,
        }
    }
}

/// Scores content on research, outline and content quality in parallel.
///
/// Each [`evaluate`](Self::evaluate) call owns a fresh three-slot
/// [`WorkerPool`] that is shut down before the call returns. One criterion
/// failing never affects the other two.
pub struct ConcurrentJudge {
    backend: Arc<dyn LlmBackend>,
    /// Empty means the backend's default model.
    model: String,
    timeout: Duration,
}

impl ConcurrentJudge {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, model: Option<String>, timeout: Duration) -> Self {
        Self {
            backend,
            model: model.unwrap_or_default(),
            timeout,
        }
    }

    /// Evaluate `input`. Never fails: a criterion whose task fails gets the
    /// neutral score, and a pool that refuses submissions yields
    /// [`EvaluationReport::fallback`].
    pub async fn evaluate(&self, input: &JudgeInput) -> EvaluationReport {
        let started = Instant::now();
        let pool = WorkerPool::new("judge", JUDGE_POOL_CAPACITY);

        let result = self.score_all(&pool, input).await;
        pool.shutdown().await;

        match result {
            Ok(outcomes) => {
                let defaulted = outcomes
                    .iter()
                    .filter(|(_, outcome)| matches!(outcome, CriterionOutcome::Defaulted(_)))
                    .map(|(criterion, _)| *criterion)
                    .collect();
                let scores = outcomes
                    .iter()
                    .map(|(criterion, outcome)| (*criterion, outcome.score()))
                    .collect();
                let report = EvaluationReport::from_scores(scores, defaulted);
                info!(
                    topic = %input.topic,
                    composite = report.composite,
                    duration_ms = started.elapsed().as_millis(),
                    "Evaluation complete"
                );
                report
            }
            Err(e) => {
                error!(
                    topic = %input.topic,
                    error = %e,
                    "Evaluation error, returning fallback report"
                );
                EvaluationReport::fallback()
            }
        }
    }

    /// Submit all three criteria, then join every one of them.
    ///
    /// Only a failed submission is an error. A task that fails after it was
    /// submitted defaults its own criterion.
    async fn score_all(
        &self,
        pool: &WorkerPool,
        input: &JudgeInput,
    ) -> Result<BTreeMap<Criterion, CriterionOutcome>, PoolError> {
        let mut tasks = Vec::with_capacity(Criterion::ALL.len());
        let mut submit_error = None;

        for criterion in Criterion::ALL {
            let backend = Arc::clone(&self.backend);
            let invocation = self.invocation(input, criterion);
            let topic = input.topic.clone();
            match pool
                .submit(score_criterion(backend, invocation, criterion, topic))
                .await
            {
                Ok(task) => tasks.push((criterion, task)),
                Err(e) => {
                    submit_error = Some(e);
                    break;
                }
            }
        }

        // Join everything that was submitted, even after an error.
        let mut outcomes = BTreeMap::new();
        for (criterion, task) in tasks {
            let outcome = match task.join().await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        topic = %input.topic,
                        criterion = %criterion,
                        error = %e,
                        "Criterion task failed, using neutral score"
                    );
                    CriterionOutcome::Defaulted(CriterionFailure::TaskFailed(e))
                }
            };
            outcomes.insert(criterion, outcome);
        }

        match submit_error {
            Some(e) => Err(e),
            None => Ok(outcomes),
        }
    }

    fn invocation(&self, input: &JudgeInput, criterion: Criterion) -> LlmInvocation {
        LlmInvocation::new(
            input.topic.clone(),
            format!("judge:{criterion}"),
            self.model.clone(),
            self.timeout,
            vec![Message::user(input.prompt_for(criterion))],
        )
        .with_metadata("temperature", serde_json::json!(0.0))
    }
}

async fn score_criterion(
    backend: Arc<dyn LlmBackend>,
    invocation: LlmInvocation,
    criterion: Criterion,
    topic: String,
) -> CriterionOutcome {
    let deadline = invocation.timeout;
    let response = match tokio::time::timeout(deadline, backend.invoke(invocation)).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout { duration: deadline }),
    };

    let raw = match response {
        Ok(result) => result.raw_response,
        Err(e) => {
            error!(
                topic = %topic,
                criterion = %criterion,
                error = %redact_error_message(&e.to_string()),
                "Error evaluating criterion, using neutral score"
            );
            return CriterionOutcome::Defaulted(CriterionFailure::Generation(e));
        }
    };

    match parse_score(&raw) {
        Ok(score) => {
            info!(topic = %topic, criterion = %criterion, score, "Criterion scored");
            CriterionOutcome::Scored(score)
        }
        Err(e) => {
            warn!(
                topic = %topic,
                criterion = %criterion,
                error = %e,
                "Invalid criterion score, using neutral score"
            );
            CriterionOutcome::Defaulted(CriterionFailure::Score(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::Grade;
    use crate::report::EVALUATION_ERROR_SUGGESTION;
    use async_trait::async_trait;
    use draftloop_llm::LlmResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replies per criterion, keyed by the rubric subject in the prompt.
    struct RubricBackend {
        research: Result<&'static str, LlmError>,
        outline: Result<&'static str, LlmError>,
        content: Result<&'static str, LlmError>,
        delay: Duration,
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl RubricBackend {
        fn new(research: &'static str, outline: &'static str, content: &'static str) -> Self {
            Self {
                research: Ok(research),
                outline: Ok(outline),
                content: Ok(content),
                delay: Duration::ZERO,
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmBackend for RubricBackend {
        async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);

            let prompt = inv.prompt().unwrap_or_default();
            let reply = if prompt.starts_with("Rate the research quality") {
                &self.research
            } else if prompt.starts_with("Rate the outline structure") {
                &self.outline
            } else {
                &self.content
            };
            reply
                .clone()
                .map(|text| LlmResult::new(text, "stub", "stub-model"))
        }
    }

    /// Panics on prompts starting with `subject`, answers "9" otherwise.
    struct PanickingBackend {
        subject: &'static str,
    }

    #[async_trait]
    impl LlmBackend for PanickingBackend {
        async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            if inv.prompt().unwrap_or_default().starts_with(self.subject) {
                panic!("backend exploded");
            }
            Ok(LlmResult::new("9", "stub", "stub-model"))
        }
    }

    fn input() -> JudgeInput {
        JudgeInput {
            topic: "Quantum Computing".to_string(),
            research: Some("Qubits use superposition.".to_string()),
            outline: Some("1. Draft".to_string()),
            approved_outline: Some("1. Introduction\n2. Qubits\n3. Conclusion".to_string()),
            content: "Quantum computers...".to_string(),
            feedback: Some("Clear and engaging".to_string()),
        }
    }

    fn judge(backend: impl LlmBackend + 'static) -> ConcurrentJudge {
        ConcurrentJudge::new(Arc::new(backend), None, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_worked_example() {
        let report = judge(RubricBackend::new("8.0", "6.0", "9.0"))
            .evaluate(&input())
            .await;

        assert_eq!(report.score(Criterion::Research), Some(8.0));
        assert_eq!(report.score(Criterion::Outline), Some(6.0));
        assert_eq!(report.score(Criterion::Content), Some(9.0));
        assert!((report.composite - 0.78).abs() < 1e-9);
        assert_eq!(report.grade(Criterion::Research), Some(Grade::B));
        assert_eq!(report.grade(Criterion::Outline), Some(Grade::D));
        assert_eq!(report.grade(Criterion::Content), Some(Grade::A));
        assert_eq!(
            report.suggestions,
            vec!["• Improve outline structure and organization".to_string()]
        );
        assert!(report.defaulted.is_empty());
        assert!(!report.fallback);
    }

    #[tokio::test]
    async fn test_unparsable_and_out_of_range_default_to_neutral() {
        let report = judge(RubricBackend::new("eight", "11", "9"))
            .evaluate(&input())
            .await;

        assert_eq!(report.score(Criterion::Research), Some(NEUTRAL_SCORE));
        assert_eq!(report.score(Criterion::Outline), Some(NEUTRAL_SCORE));
        assert_eq!(report.score(Criterion::Content), Some(9.0));
        assert_eq!(
            report.defaulted,
            vec![Criterion::Research, Criterion::Outline]
        );
        assert!(!report.fallback);
    }

    #[tokio::test]
    async fn test_generation_error_isolated_to_its_criterion() {
        let mut backend = RubricBackend::new("9", "9", "9");
        backend.content = Err(LlmError::ProviderOutage("503".to_string()));
        let report = judge(backend).evaluate(&input()).await;

        assert_eq!(report.score(Criterion::Research), Some(9.0));
        assert_eq!(report.score(Criterion::Outline), Some(9.0));
        assert_eq!(report.score(Criterion::Content), Some(NEUTRAL_SCORE));
        assert_eq!(report.grade(Criterion::Content), Some(Grade::F));
        assert_eq!(
            report.suggestions,
            vec!["• Enhance writing quality and reader engagement".to_string()]
        );
    }

    #[tokio::test]
    async fn test_slow_criterion_times_out_to_neutral() {
        let mut backend = RubricBackend::new("9", "9", "9");
        backend.delay = Duration::from_millis(200);
        let judge = ConcurrentJudge::new(Arc::new(backend), None, Duration::from_millis(20));

        let report = judge.evaluate(&input()).await;
        assert_eq!(report.defaulted.len(), 3);
        assert!((report.composite - 0.5).abs() < 1e-12);
        assert!(!report.fallback);
    }

    #[tokio::test]
    async fn test_criteria_run_concurrently() {
        let mut backend = RubricBackend::new("7", "7", "7");
        backend.delay = Duration::from_millis(50);
        let backend = Arc::new(backend);
        let judge = ConcurrentJudge::new(backend.clone(), None, Duration::from_secs(5));

        let report = judge.evaluate(&input()).await;
        assert_eq!(report.suggestions, vec![crate::MEETS_STANDARDS.to_string()]);
        assert_eq!(backend.peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_task_panic_isolated_to_its_criterion() {
        let backend = PanickingBackend {
            subject: "Rate the outline structure",
        };
        let report = judge(backend).evaluate(&input()).await;

        assert!(!report.fallback);
        assert_eq!(report.score(Criterion::Research), Some(9.0));
        assert_eq!(report.score(Criterion::Outline), Some(NEUTRAL_SCORE));
        assert_eq!(report.score(Criterion::Content), Some(9.0));
        assert_eq!(report.defaulted, vec![Criterion::Outline]);
        assert!((report.composite - 0.78).abs() < 1e-9);
        assert_eq!(
            report.suggestions,
            vec!["• Improve outline structure and organization".to_string()]
        );
    }

    #[tokio::test]
    async fn test_every_task_panicking_scores_neutral() {
        let report = judge(PanickingBackend { subject: "" }).evaluate(&input()).await;
        assert!(!report.fallback);
        assert_eq!(report.defaulted.len(), 3);
        assert!((report.composite - 0.5).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_closed_pool_yields_fallback_report() {
        let judge = judge(RubricBackend::new("9", "9", "9"));
        let pool = WorkerPool::new("judge", JUDGE_POOL_CAPACITY);
        pool.shutdown().await;

        let err = judge.score_all(&pool, &input()).await.unwrap_err();
        assert!(matches!(err, PoolError::Closed { .. }));

        let report = EvaluationReport::fallback();
        assert!(report.fallback);
        assert!(report.grades.values().all(|g| *g == Grade::C));
        assert_eq!(report.suggestions, vec![EVALUATION_ERROR_SUGGESTION.to_string()]);
    }

    #[tokio::test]
    async fn test_evaluation_is_idempotent() {
        let judge = judge(RubricBackend::new("7.5", "eight", "6.25"));
        let first = judge.evaluate(&input()).await;
        let second = judge.evaluate(&input()).await;
        assert_eq!(first, second);
    }

    #[test]
    fn test_text_selection() {
        let mut input = input();
        assert_eq!(input.text_for(Criterion::Research), "Qubits use superposition.");
        assert!(input.text_for(Criterion::Outline).starts_with("1. Introduction"));

        input.research = None;
        input.approved_outline = None;
        assert_eq!(input.text_for(Criterion::Research), "Quantum computers...");
        assert_eq!(input.text_for(Criterion::Outline), "1. Draft");

        input.outline = None;
        assert_eq!(input.text_for(Criterion::Outline), "");
    }

    #[test]
    fn test_only_content_prompt_carries_feedback() {
        let input = input();
        assert!(input.prompt_for(Criterion::Content).contains("Feedback: Clear and engaging"));
        assert!(!input.prompt_for(Criterion::Research).contains("Feedback:"));
        assert!(!input.prompt_for(Criterion::Outline).contains("Feedback:"));
    }
}
