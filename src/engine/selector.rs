// src/engine/selector.rs

use serde::Serialize;

use super::ability::difficulty_to_theta;
use super::curriculum::{grade_deviation, required_strands};
use super::session::Session;
use crate::config::{MAX_GRADE_DEVIATION, MIN_STRAND_EXPOSURES};
use crate::models::question::Question;

/// Bonus for a required strand with no exposures yet.
const REQUIRED_STRAND_BONUS: f64 = 1.0;
/// Deducted from the required-strand bonus per prior exposure.
const REQUIRED_STRAND_DECAY: f64 = 0.3;
/// Bonus for any other strand seen fewer than `MIN_STRAND_EXPOSURES` times.
const OPTIONAL_STRAND_BONUS: f64 = 0.5;

/// Outcome of a single selection call.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionResult {
    pub question: Question,
    pub information: f64,
    pub reason: String,
    pub alternatives_considered: usize,
    /// Currently identical to `information`.
    pub content_balance_score: f64,
}

/// Picks the most informative unanswered question for the session.
///
/// Returns `None` only when every candidate has already been answered.
/// Ties on information are broken by the smallest question id.
pub fn select_next_question(pool: &[Question], session: &Session) -> Option<SelectionResult> {
    let unanswered: Vec<&Question> = pool.iter().filter(|q| !session.has_answered(&q.id)).collect();
    if unanswered.is_empty() {
        tracing::debug!(session_id = %session.id, "No unanswered candidates left");
        return None;
    }

    let within_bounds: Vec<&Question> = unanswered
        .iter()
        .copied()
        .filter(|q| within_grade_bounds(q, &session.grade_level))
        .collect();

    let candidates = if within_bounds.is_empty() {
        tracing::warn!(
            session_id = %session.id,
            grade_level = %session.grade_level,
            "No candidates within grade bounds, using the full unanswered pool"
        );
        unanswered
    } else {
        within_bounds
    };

    let (min_theta, max_theta) = achievable_range(&candidates);
    let target_theta = session.current_ability.clamp(min_theta, max_theta);

    let underrepresented: Vec<&str> = required_strands(&session.subject)
        .iter()
        .copied()
        .filter(|strand| session.strand_exposure(strand) < MIN_STRAND_EXPOSURES)
        .collect();

    let mut best: Option<(&Question, f64)> = None;
    for &question in &candidates {
        let information = information_value(question, target_theta, session, &underrepresented);
        let better = match best {
            None => true,
            Some((current, current_info)) => {
                information > current_info
                    || (information == current_info && question.id < current.id)
            }
        };
        if better {
            best = Some((question, information));
        }
    }

    let (question, information) = best?;

    let reason = if underrepresented.contains(&question.strand.as_str()) {
        format!("Strand coverage priority: {}", question.strand)
    } else if session.current_ability < min_theta {
        format!(
            "Ability {:.2} below achievable range; easiest available difficulty {}",
            session.current_ability, question.difficulty
        )
    } else if session.current_ability > max_theta {
        format!(
            "Ability {:.2} above achievable range; hardest available difficulty {}",
            session.current_ability, question.difficulty
        )
    } else {
        format!(
            "Difficulty {} matches ability estimate {:.2}",
            question.difficulty, session.current_ability
        )
    };

    tracing::debug!(
        session_id = %session.id,
        question_id = %question.id,
        information,
        candidates = candidates.len(),
        %reason,
        "Selected next question"
    );

    Some(SelectionResult {
        question: question.clone(),
        information,
        reason,
        alternatives_considered: candidates.len(),
        content_balance_score: information,
    })
}

/// Unknown grade labels on either side always pass.
fn within_grade_bounds(question: &Question, session_grade: &str) -> bool {
    grade_deviation(&question.grade_level, session_grade)
        .is_none_or(|deviation| deviation <= MAX_GRADE_DEVIATION)
}

fn achievable_range(candidates: &[&Question]) -> (f64, f64) {
    let min_level = candidates.iter().map(|q| q.difficulty).min().unwrap_or(3);
    let max_level = candidates.iter().map(|q| q.difficulty).max().unwrap_or(3);
    (difficulty_to_theta(min_level), difficulty_to_theta(max_level))
}

fn information_value(
    question: &Question,
    target_theta: f64,
    session: &Session,
    underrepresented: &[&str],
) -> f64 {
    let distance = (difficulty_to_theta(question.difficulty) - target_theta).abs();
    let exposures = session.strand_exposure(&question.strand);

    let strand_bonus = if underrepresented.contains(&question.strand.as_str()) {
        (REQUIRED_STRAND_BONUS - REQUIRED_STRAND_DECAY * exposures as f64).max(0.0)
    } else if exposures < MIN_STRAND_EXPOSURES {
        OPTIONAL_STRAND_BONUS
    } else {
        0.0
    };

    1.0 / (1.0 + distance) + strand_bonus
}
