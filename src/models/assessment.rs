// src/models/assessment.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    engine::{PerformanceLevel, Session, SessionStatus, ability_to_percentile, theta_to_performance_level},
    models::question::PublicQuestion,
};

/// DTO for starting an adaptive session.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, max = 50))]
    pub subject: String,
    #[validate(length(min = 1, max = 30))]
    pub grade_level: String,
}

/// DTO for answering the pending question.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(min = 1, max = 100))]
    pub question_id: String,
    #[validate(length(max = 500))]
    pub answer: String,
    #[validate(range(min = 0.0, max = 86400.0))]
    #[serde(default)]
    pub time_spent_seconds: f64,
}

/// Session state as seen by the dashboard (no per-response answers).
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub examinee_id: String,
    pub subject: String,
    pub grade_level: String,
    pub status: SessionStatus,
    pub current_ability: f64,
    pub standard_error: f64,
    pub questions_answered: usize,
    pub correct_count: usize,
    pub strand_counts: BTreeMap<String, u32>,
    pub pending_question: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionSummary {
    pub fn new(session: &Session, pending_question: Option<String>) -> Self {
        Self {
            id: session.id,
            examinee_id: session.examinee_id.clone(),
            subject: session.subject.clone(),
            grade_level: session.grade_level.clone(),
            status: session.status,
            current_ability: session.current_ability,
            standard_error: session.standard_error,
            questions_answered: session.question_count(),
            correct_count: session.correct_count(),
            strand_counts: session.strand_counts.clone(),
            pending_question,
            started_at: session.started_at,
            updated_at: session.updated_at,
        }
    }
}

/// Reply to a "next question" request.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NextQuestionResponse {
    Question {
        question: PublicQuestion,
        reason: String,
        information: f64,
        alternatives_considered: usize,
        questions_answered: usize,
    },
    Finished {
        reason: String,
        result: SessionResult,
    },
}

/// Reply to an answer submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub is_correct: bool,
    pub current_ability: f64,
    pub standard_error: f64,
    pub questions_answered: usize,
    pub finished: bool,
    pub reason: String,
    pub result: Option<SessionResult>,
}

/// Score report for a finished session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    pub session_id: Uuid,
    pub examinee_id: String,
    pub subject: String,
    pub grade_level: String,
    pub status: SessionStatus,
    pub ability: f64,
    pub standard_error: f64,
    pub percentile: u8,
    pub performance_level: PerformanceLevel,
    pub total_questions: usize,
    pub total_correct: usize,
    /// Percentage of correct answers, 0 when nothing was answered.
    pub accuracy: f64,
    pub duration_seconds: i64,
    pub covered_standards: Vec<String>,
    pub strand_counts: BTreeMap<String, u32>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionResult {
    /// Uses the frozen final scores when present, the live estimate otherwise.
    pub fn from_session(session: &Session) -> Self {
        let ability = session.final_ability.unwrap_or(session.current_ability);
        let standard_error = session.final_standard_error.unwrap_or(session.standard_error);
        let total_questions = session.total_questions.unwrap_or_else(|| session.question_count());
        let total_correct = session.total_correct.unwrap_or_else(|| session.correct_count());
        let accuracy = if total_questions == 0 {
            0.0
        } else {
            total_correct as f64 / total_questions as f64 * 100.0
        };
        let ended_at = session.completed_at.unwrap_or(session.updated_at);

        Self {
            session_id: session.id,
            examinee_id: session.examinee_id.clone(),
            subject: session.subject.clone(),
            grade_level: session.grade_level.clone(),
            status: session.status,
            ability,
            standard_error,
            percentile: ability_to_percentile(ability),
            performance_level: theta_to_performance_level(ability),
            total_questions,
            total_correct,
            accuracy,
            duration_seconds: ended_at.signed_duration_since(session.started_at).num_seconds(),
            covered_standards: session.covered_standards.clone(),
            strand_counts: session.strand_counts.clone(),
            completed_at: session.completed_at,
        }
    }
}
