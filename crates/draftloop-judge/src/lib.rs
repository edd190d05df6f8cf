//! Concurrent Judge for draftloop
//!
//! Rates finished content on three independent criteria (research, outline,
//! content), each on a 0-10 scale, and aggregates them:
//!
//! - composite = `(research * 0.3 + outline * 0.3 + content * 0.4) / 10`
//! - grades: `>= 9` A, `>= 8` B, `>= 7` C, `>= 6` D, otherwise F
//! - one suggestion per criterion below 7, in fixed order
//!
//! A criterion whose reply is unparsable, out of range, failed or timed out
//! scores the neutral 5.0. If the evaluation as a whole cannot complete the
//! judge returns [`EvaluationReport::fallback`] instead of an error.

mod criterion;
mod judge;
mod report;
mod scoring;

pub use criterion::{Criterion, Grade};
pub use judge::{
    ConcurrentJudge, CriterionFailure, CriterionOutcome, JUDGE_POOL_CAPACITY, JudgeInput,
};
pub use report::{EVALUATION_ERROR_SUGGESTION, EvaluationReport};
pub use scoring::{
    MEETS_STANDARDS, NEUTRAL_SCORE, SUGGESTION_THRESHOLD, composite, grades, parse_score,
    suggestions,
};
