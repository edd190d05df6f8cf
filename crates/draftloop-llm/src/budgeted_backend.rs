//! Call-count budget for paid HTTP providers
//!
//! Wraps any `LlmBackend` and refuses invocations past a fixed limit. Used
//! for OpenRouter, where a runaway revision loop would otherwise keep billing.

use crate::LlmError;
use crate::types::{LlmBackend, LlmInvocation, LlmResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

/// Default budget limit for OpenRouter calls per process
pub(crate) const DEFAULT_BUDGET_LIMIT: u32 = 20;

/// Environment variable for overriding the budget limit
pub(crate) const BUDGET_ENV_VAR: &str = "DRAFTLOOP_OPENROUTER_BUDGET";

/// A wrapper around an `LlmBackend` that enforces a budget limit on invocations.
///
/// The budget counts attempted calls, so a failed request still consumes a
/// slot.
pub struct BudgetedBackend {
    inner: Box<dyn LlmBackend>,
    calls: AtomicU32,
    limit: u32,
}

impl BudgetedBackend {
    pub fn new(inner: Box<dyn LlmBackend>, limit: u32) -> Self {
        debug!(limit, "Creating BudgetedBackend");
        Self {
            inner,
            calls: AtomicU32::new(0),
            limit,
        }
    }

    /// Create a budgeted backend with the limit resolved from configuration
    ///
    /// Precedence (highest to lowest):
    /// 1. `DRAFTLOOP_OPENROUTER_BUDGET`
    /// 2. `[llm.openrouter] budget`
    /// 3. Default (20 calls per process)
    pub fn with_limit_from_config(inner: Box<dyn LlmBackend>, config_budget: Option<u32>) -> Self {
        let env_limit = std::env::var(BUDGET_ENV_VAR)
            .ok()
            .and_then(|s| s.parse::<u32>().ok());

        let limit = match (env_limit, config_budget) {
            (Some(limit), _) => {
                debug!(limit, "Using budget limit from {}", BUDGET_ENV_VAR);
                limit
            }
            (None, Some(limit)) => {
                debug!(limit, "Using budget limit from config file");
                limit
            }
            (None, None) => DEFAULT_BUDGET_LIMIT,
        };

        Self::new(inner, limit)
    }

    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[async_trait]
impl LlmBackend for BudgetedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        // Count before calling so failures cannot be retried past the limit.
        let current = self.calls.fetch_add(1, Ordering::SeqCst);

        if current >= self.limit {
            let attempted = current + 1;
            warn!(limit = self.limit, attempted, "Budget limit exceeded");
            return Err(LlmError::BudgetExceeded {
                limit: self.limit,
                attempted,
            });
        }

        debug!(
            call_count = current + 1,
            limit = self.limit,
            stage = %inv.stage_id,
            "Budget check passed"
        );

        self.inner.invoke(inv).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use crate::test_env::env_guard;
    use std::time::Duration;

    struct EchoBackend {
        fail: bool,
    }

    #[async_trait]
    impl LlmBackend for EchoBackend {
        async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            if self.fail {
                return Err(LlmError::Transport("connection reset".to_string()));
            }
            Ok(LlmResult::new(
                inv.prompt().unwrap_or_default(),
                "echo",
                "echo-1",
            ))
        }
    }

    fn invocation() -> LlmInvocation {
        LlmInvocation::new(
            "topic",
            "research",
            "",
            Duration::from_secs(5),
            vec![Message::user("ping")],
        )
    }

    #[tokio::test]
    async fn test_calls_within_budget_pass_through() {
        let backend = BudgetedBackend::new(Box::new(EchoBackend { fail: false }), 2);

        let first = backend.invoke(invocation()).await.unwrap();
        assert_eq!(first.raw_response, "ping");
        backend.invoke(invocation()).await.unwrap();
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_call_past_limit_is_rejected() {
        let backend = BudgetedBackend::new(Box::new(EchoBackend { fail: false }), 1);
        backend.invoke(invocation()).await.unwrap();

        match backend.invoke(invocation()).await {
            Err(LlmError::BudgetExceeded { limit, attempted }) => {
                assert_eq!(limit, 1);
                assert_eq!(attempted, 2);
            }
            other => panic!("Expected BudgetExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_calls_consume_budget() {
        let backend = BudgetedBackend::new(Box::new(EchoBackend { fail: true }), 1);

        assert!(matches!(
            backend.invoke(invocation()).await,
            Err(LlmError::Transport(_))
        ));
        assert!(matches!(
            backend.invoke(invocation()).await,
            Err(LlmError::BudgetExceeded { .. })
        ));
    }

    #[test]
    fn test_limit_precedence() {
        let _guard = env_guard();

        unsafe {
            std::env::remove_var(BUDGET_ENV_VAR);
        }
        let default = BudgetedBackend::with_limit_from_config(
            Box::new(EchoBackend { fail: false }),
            None,
        );
        assert_eq!(default.limit(), DEFAULT_BUDGET_LIMIT);

        let from_config = BudgetedBackend::with_limit_from_config(
            Box::new(EchoBackend { fail: false }),
            Some(50),
        );
        assert_eq!(from_config.limit(), 50);

        unsafe {
            std::env::set_var(BUDGET_ENV_VAR, "7");
        }
        let from_env = BudgetedBackend::with_limit_from_config(
            Box::new(EchoBackend { fail: false }),
            Some(50),
        );
        assert_eq!(from_env.limit(), 7);

        unsafe {
            std::env::set_var(BUDGET_ENV_VAR, "not-a-number");
        }
        let invalid_env = BudgetedBackend::with_limit_from_config(
            Box::new(EchoBackend { fail: false }),
            Some(50),
        );
        assert_eq!(invalid_env.limit(), 50);

        unsafe {
            std::env::remove_var(BUDGET_ENV_VAR);
        }
    }
}
