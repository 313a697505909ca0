// src/engine/session.rs

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ability estimate of a fresh session.
pub const INITIAL_ABILITY: f64 = 0.0;

/// Standard error of a fresh session (maximal uncertainty).
pub const INITIAL_STANDARD_ERROR: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
    TimedOut,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
            SessionStatus::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}

/// Lifecycle violations raised by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The session already reached a terminal status.
    SessionClosed { session_id: Uuid, status: SessionStatus },

    /// The requested status change is not a valid lifecycle transition.
    InvalidTransition { from: SessionStatus, to: SessionStatus },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::SessionClosed { session_id, status } => {
                write!(f, "Session {} is already {}", session_id, status)
            }
            EngineError::InvalidTransition { from, to } => {
                write!(f, "Invalid session transition from {} to {}", from, to)
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// One answer event. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub question_id: String,
    pub answer: String,
    pub is_correct: bool,
    pub time_spent_seconds: f64,
    pub answered_at: DateTime<Utc>,
}

/// One examinee's adaptive run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub examinee_id: String,
    pub subject: String,
    pub grade_level: String,

    pub current_ability: f64,
    pub standard_error: f64,

    /// Append-only, in submission order.
    pub responses: Vec<Response>,

    pub strand_counts: BTreeMap<String, u32>,
    pub format_counts: BTreeMap<String, u32>,
    pub difficulty_counts: BTreeMap<u8, u32>,

    /// Distinct content standards, in order of first appearance.
    pub covered_standards: Vec<String>,

    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: SessionStatus,

    pub final_ability: Option<f64>,
    pub final_standard_error: Option<f64>,
    pub total_questions: Option<usize>,
    pub total_correct: Option<usize>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn question_count(&self) -> usize {
        self.responses.len()
    }

    pub fn correct_count(&self) -> usize {
        self.responses.iter().filter(|r| r.is_correct).count()
    }

    pub fn has_answered(&self, question_id: &str) -> bool {
        self.responses.iter().any(|r| r.question_id == question_id)
    }

    pub fn strand_exposure(&self, strand: &str) -> u32 {
        self.strand_counts.get(strand).copied().unwrap_or(0)
    }

    pub(crate) fn ensure_open(&self) -> Result<(), EngineError> {
        if self.status.is_terminal() {
            return Err(EngineError::SessionClosed {
                session_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }
}

/// Starts a new in-progress session with neutral ability and maximal uncertainty.
pub fn create_session(
    examinee_id: impl Into<String>,
    subject: impl Into<String>,
    grade_level: impl Into<String>,
) -> Session {
    let now = Utc::now();
    Session {
        id: Uuid::new_v4(),
        examinee_id: examinee_id.into(),
        subject: subject.into(),
        grade_level: grade_level.into(),
        current_ability: INITIAL_ABILITY,
        standard_error: INITIAL_STANDARD_ERROR,
        responses: Vec::new(),
        strand_counts: BTreeMap::new(),
        format_counts: BTreeMap::new(),
        difficulty_counts: BTreeMap::new(),
        covered_standards: Vec::new(),
        started_at: now,
        updated_at: now,
        status: SessionStatus::InProgress,
        final_ability: None,
        final_standard_error: None,
        total_questions: None,
        total_correct: None,
        completed_at: None,
    }
}

/// Completes the session and freezes its final scores.
///
/// Returns `EngineError::SessionClosed` if the session is already terminal.
pub fn finalize_session(session: &mut Session) -> Result<(), EngineError> {
    session.ensure_open()?;

    let now = Utc::now();
    session.status = SessionStatus::Completed;
    session.final_ability = Some(session.current_ability);
    session.final_standard_error = Some(session.standard_error);
    session.total_questions = Some(session.question_count());
    session.total_correct = Some(session.correct_count());
    session.completed_at = Some(now);
    session.updated_at = now;

    tracing::info!(
        session_id = %session.id,
        ability = session.current_ability,
        standard_error = session.standard_error,
        questions = session.question_count(),
        "Session completed"
    );
    Ok(())
}

/// Ends an in-progress session without scoring it (abandoned or timed out).
pub fn close_session(session: &mut Session, status: SessionStatus) -> Result<(), EngineError> {
    session.ensure_open()?;

    if !matches!(status, SessionStatus::Abandoned | SessionStatus::TimedOut) {
        return Err(EngineError::InvalidTransition {
            from: session.status,
            to: status,
        });
    }

    session.status = status;
    session.updated_at = Utc::now();
    tracing::info!(session_id = %session.id, %status, "Session closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_session_defaults() {
        let session = create_session("s1", "Math", "5");
        assert_eq!(session.examinee_id, "s1");
        assert_eq!(session.current_ability, 0.0);
        assert_eq!(session.standard_error, 1.0);
        assert_eq!(session.status, SessionStatus::InProgress);
        assert!(session.responses.is_empty());
        assert!(session.strand_counts.is_empty());
        assert_eq!(session.started_at, session.updated_at);
        assert!(session.completed_at.is_none());
    }

    #[test]
    fn test_sessions_get_unique_ids() {
        let a = create_session("s1", "Math", "5");
        let b = create_session("s1", "Math", "5");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_finalize_copies_scores() {
        let mut session = create_session("s1", "Math", "5");
        session.current_ability = 0.75;
        session.standard_error = 0.4;

        finalize_session(&mut session).unwrap();

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.final_ability, Some(0.75));
        assert_eq!(session.final_standard_error, Some(0.4));
        assert_eq!(session.total_questions, Some(0));
        assert_eq!(session.total_correct, Some(0));
        assert!(session.completed_at.is_some());
    }

    #[test]
    fn test_finalize_twice_fails() {
        let mut session = create_session("s1", "Math", "5");
        finalize_session(&mut session).unwrap();

        let err = finalize_session(&mut session).unwrap_err();
        assert!(matches!(
            err,
            EngineError::SessionClosed {
                status: SessionStatus::Completed,
                ..
            }
        ));
    }

    #[test]
    fn test_close_session() {
        let mut session = create_session("s1", "Reading", "3");
        close_session(&mut session, SessionStatus::Abandoned).unwrap();
        assert_eq!(session.status, SessionStatus::Abandoned);
        assert!(session.final_ability.is_none());

        assert!(finalize_session(&mut session).is_err());
    }

    #[test]
    fn test_close_session_rejects_non_closing_status() {
        let mut session = create_session("s1", "Reading", "3");
        let err = close_session(&mut session, SessionStatus::Completed).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
        assert_eq!(session.status, SessionStatus::InProgress);
    }
}
