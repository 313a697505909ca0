// src/engine/estimator.rs

use std::collections::HashMap;

use chrono::Utc;

use super::ability::difficulty_to_theta;
use super::session::{EngineError, Response, Session};
use crate::models::question::Question;

pub const MIN_ABILITY: f64 = -3.0;
pub const MAX_ABILITY: f64 = 3.0;

/// Floor for the standard error, however many responses are recorded.
pub const MIN_STANDARD_ERROR: f64 = 0.2;

/// Read access to question metadata by id.
pub trait QuestionLookup {
    fn question(&self, id: &str) -> Option<&Question>;
}

impl QuestionLookup for HashMap<String, Question> {
    fn question(&self, id: &str) -> Option<&Question> {
        self.get(id)
    }
}

impl QuestionLookup for [Question] {
    fn question(&self, id: &str) -> Option<&Question> {
        self.iter().find(|q| q.id == id)
    }
}

/// Estimates ability from the full response history.
///
/// Responses whose question cannot be resolved are ignored. Returns 0 when nothing resolves.
pub fn estimate_ability<L>(responses: &[Response], lookup: &L) -> f64
where
    L: QuestionLookup + ?Sized,
{
    estimate_with(responses, |id| lookup.question(id).map(|q| q.difficulty))
}

fn estimate_with<F>(responses: &[Response], difficulty_of: F) -> f64
where
    F: Fn(&str) -> Option<u8>,
{
    let mut theta_sum = 0.0;
    let mut correct = 0usize;
    let mut resolved = 0usize;

    for response in responses {
        let Some(level) = difficulty_of(&response.question_id) else {
            continue;
        };
        theta_sum += difficulty_to_theta(level);
        resolved += 1;
        if response.is_correct {
            correct += 1;
        }
    }

    if resolved == 0 {
        return 0.0;
    }

    let average_theta = theta_sum / resolved as f64;
    let fraction_correct = correct as f64 / resolved as f64;

    (average_theta + (fraction_correct - 0.5) * 2.0).clamp(MIN_ABILITY, MAX_ABILITY)
}

/// `max(0.2, 1/sqrt(n + 1))` for `n` recorded responses.
pub fn calculate_standard_error(response_count: usize) -> f64 {
    (1.0 / ((response_count + 1) as f64).sqrt()).max(MIN_STANDARD_ERROR)
}

/// Records an answer to `question` and re-estimates the session.
///
/// `question` always resolves during re-estimation, even if `lookup` does not contain it.
/// Fails with `EngineError::SessionClosed` on a terminal session.
pub fn process_response<L>(
    session: &mut Session,
    question: &Question,
    answer: impl Into<String>,
    is_correct: bool,
    time_spent_seconds: f64,
    lookup: &L,
) -> Result<Response, EngineError>
where
    L: QuestionLookup + ?Sized,
{
    session.ensure_open()?;

    let now = Utc::now();
    let response = Response {
        question_id: question.id.clone(),
        answer: answer.into(),
        is_correct,
        time_spent_seconds: time_spent_seconds.max(0.0),
        answered_at: now,
    };
    session.responses.push(response.clone());

    *session.strand_counts.entry(question.strand.clone()).or_insert(0) += 1;
    *session.format_counts.entry(question.format.clone()).or_insert(0) += 1;
    *session.difficulty_counts.entry(question.difficulty).or_insert(0) += 1;

    for standard in &question.standards {
        if !session.covered_standards.contains(standard) {
            session.covered_standards.push(standard.clone());
        }
    }

    session.current_ability = estimate_with(&session.responses, |id| {
        if id == question.id {
            Some(question.difficulty)
        } else {
            lookup.question(id).map(|q| q.difficulty)
        }
    });
    session.standard_error = calculate_standard_error(session.responses.len());
    session.updated_at = now;

    tracing::debug!(
        session_id = %session.id,
        question_id = %question.id,
        is_correct,
        ability = session.current_ability,
        standard_error = session.standard_error,
        "Response processed"
    );

    Ok(response)
}
