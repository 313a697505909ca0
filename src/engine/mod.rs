//! Adaptive testing engine.
//!
//! A session starts at ability 0 with standard error 1.0. After every answer the
//! estimator re-scores the whole history, the termination evaluator decides whether to
//! stop, and if not the selector picks the next question from a caller-supplied pool.
//!
//! Everything here is synchronous and session-local. Callers must apply responses to a
//! given session one at a time, in submission order.

pub mod ability;
pub mod curriculum;
pub mod estimator;
pub mod selector;
pub mod session;
pub mod termination;

pub use ability::{
    PerformanceLevel, ability_to_percentile, difficulty_to_theta, theta_to_performance_level,
};
pub use estimator::{QuestionLookup, calculate_standard_error, estimate_ability, process_response};
pub use selector::{SelectionResult, select_next_question};
pub use session::{
    EngineError, Response, Session, SessionStatus, close_session, create_session, finalize_session,
};
pub use termination::{
    TerminationCriteria, TerminationDecision, exceeded_time_limit, required_strand_coverage,
    should_terminate,
};
