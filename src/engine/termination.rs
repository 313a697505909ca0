// src/engine/termination.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::curriculum::required_strands;
use super::session::Session;
use crate::config::{
    MAX_QUESTIONS, MAX_SESSION_MINUTES, MIN_DISTINCT_STRANDS, MIN_QUESTIONS,
    MIN_STRAND_EXPOSURES, REQUIRED_STRAND_COVERAGE, TARGET_STANDARD_ERROR,
};

/// Fixed thresholds governing when a session ends.
///
/// Strand enforcement is on by default. A precision stop then needs
/// `required_strand_coverage` of the subject's required strands covered, on top of
/// `min_distinct_strands` distinct assessed strands. For the five math strands that means
/// four strands with two exposures each, so three covered strands alone do not end a math
/// session unless `enforce_strand_requirements` is turned off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationCriteria {
    pub max_questions: usize,
    pub min_questions: usize,
    pub target_standard_error: f64,
    /// Advisory wall-clock cap; checked by the caller via [`exceeded_time_limit`].
    pub max_minutes: i64,
    pub required_strand_coverage: f64,
    pub min_distinct_strands: usize,
    pub enforce_strand_requirements: bool,
}

impl Default for TerminationCriteria {
    fn default() -> Self {
        Self {
            max_questions: MAX_QUESTIONS,
            min_questions: MIN_QUESTIONS,
            target_standard_error: TARGET_STANDARD_ERROR,
            max_minutes: MAX_SESSION_MINUTES,
            required_strand_coverage: REQUIRED_STRAND_COVERAGE,
            min_distinct_strands: MIN_DISTINCT_STRANDS,
            enforce_strand_requirements: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminationDecision {
    pub stop: bool,
    pub reason: String,
}

impl TerminationDecision {
    fn stop(reason: impl Into<String>) -> Self {
        Self { stop: true, reason: reason.into() }
    }

    fn proceed(reason: impl Into<String>) -> Self {
        Self { stop: false, reason: reason.into() }
    }
}

/// Fraction of the subject's required strands with at least two exposures.
/// A subject without requirements counts as fully covered.
pub fn required_strand_coverage(session: &Session) -> f64 {
    let required = required_strands(&session.subject);
    if required.is_empty() {
        return 1.0;
    }
    let covered = required
        .iter()
        .filter(|strand| session.strand_exposure(strand) >= MIN_STRAND_EXPOSURES)
        .count();
    covered as f64 / required.len() as f64
}

/// Decides whether the session should stop after its latest response.
pub fn should_terminate(session: &Session, criteria: &TerminationCriteria) -> TerminationDecision {
    let count = session.question_count();

    let decision = if count >= criteria.max_questions {
        TerminationDecision::stop(format!(
            "Maximum reached: {} questions administered",
            count
        ))
    } else if count < criteria.min_questions {
        TerminationDecision::proceed(format!(
            "Minimum not reached: {} of {} questions",
            count, criteria.min_questions
        ))
    } else if session.standard_error <= criteria.target_standard_error {
        let coverage = required_strand_coverage(session);
        let distinct_strands = session.strand_counts.values().filter(|c| **c > 0).count();

        if criteria.enforce_strand_requirements && coverage < criteria.required_strand_coverage {
            TerminationDecision::proceed(format!(
                "Precision reached but required strand coverage incomplete ({:.0}%)",
                coverage * 100.0
            ))
        } else if distinct_strands < criteria.min_distinct_strands {
            TerminationDecision::proceed(format!(
                "Precision reached but only {} strands assessed",
                distinct_strands
            ))
        } else {
            TerminationDecision::stop(format!(
                "Target precision achieved with comprehensive coverage (SE {:.3})",
                session.standard_error
            ))
        }
    } else {
        TerminationDecision::proceed(format!(
            "Continuing assessment (SE {:.3} above target {:.2})",
            session.standard_error, criteria.target_standard_error
        ))
    };

    tracing::debug!(
        session_id = %session.id,
        questions = count,
        stop = decision.stop,
        reason = %decision.reason,
        "Termination check"
    );
    decision
}

/// True when the session has run longer than the wall-clock cap.
pub fn exceeded_time_limit(
    session: &Session,
    criteria: &TerminationCriteria,
    now: DateTime<Utc>,
) -> bool {
    now.signed_duration_since(session.started_at).num_minutes() >= criteria.max_minutes
}
