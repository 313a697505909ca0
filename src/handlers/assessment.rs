// src/handlers/assessment.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    bank::QuestionBank,
    config::Config,
    engine::{
        self, Session, SessionStatus, TerminationCriteria, close_session, exceeded_time_limit,
        finalize_session, process_response, select_next_question, should_terminate,
    },
    error::AppError,
    models::{
        assessment::{
            AnswerResponse, CreateSessionRequest, NextQuestionResponse, SessionResult,
            SessionSummary, SubmitAnswerRequest,
        },
        question::PublicQuestion,
    },
    store::{ActiveSession, SessionStore},
    utils::jwt::Claims,
};

/// Only the examinee may drive their own session.
fn ensure_owner(session: &Session, claims: &Claims) -> Result<(), AppError> {
    if session.examinee_id != claims.sub {
        return Err(AppError::Forbidden(
            "Session belongs to another examinee".to_string(),
        ));
    }
    Ok(())
}

/// Owners and reviewers (teachers, admins) may read a session.
fn ensure_viewer(session: &Session, claims: &Claims) -> Result<(), AppError> {
    if claims.is_reviewer() {
        return Ok(());
    }
    ensure_owner(session, claims)
}

/// Closes the session as timed out if it ran past the wall-clock cap.
/// Returns true when the session was closed by this call.
fn close_if_expired(active: &mut ActiveSession, criteria: &TerminationCriteria) -> Result<bool, AppError> {
    if active.session.status.is_terminal() || !exceeded_time_limit(&active.session, criteria, Utc::now()) {
        return Ok(false);
    }
    close_session(&mut active.session, SessionStatus::TimedOut)?;
    active.pending = None;
    tracing::info!(session_id = %active.session.id, "Session exceeded its time limit");
    Ok(true)
}

/// Starts an adaptive session for the authenticated examinee.
pub async fn create_session(
    State(store): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let session = engine::create_session(
        claims.sub.as_str(),
        payload.subject.trim(),
        payload.grade_level.trim(),
    );
    tracing::info!(
        session_id = %session.id,
        examinee_id = %session.examinee_id,
        subject = %session.subject,
        grade_level = %session.grade_level,
        "Adaptive session created"
    );

    let summary = SessionSummary::new(&session, None);
    store.insert(session).await;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// Returns the current state of a session.
pub async fn get_session(
    State(store): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = store.get(id).await?;
    let active = handle.lock().await;
    ensure_viewer(&active.session, &claims)?;

    Ok(Json(SessionSummary::new(
        &active.session,
        active.pending_question_id(),
    )))
}

/// Offers the next question, or finishes the session.
///
/// * A question that was offered but not yet answered is offered again.
/// * The session is timed out, completed by the termination rules, or completed because
///   the bank has nothing left to offer.
pub async fn next_question(
    State(store): State<SessionStore>,
    State(bank): State<Arc<dyn QuestionBank>>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = store.get(id).await?;
    let mut active = handle.lock().await;
    ensure_owner(&active.session, &claims)?;

    let criteria = config.termination_criteria();

    if close_if_expired(&mut active, &criteria)? {
        return Ok(Json(NextQuestionResponse::Finished {
            reason: "Time limit exceeded".to_string(),
            result: SessionResult::from_session(&active.session),
        }));
    }

    if active.session.status.is_terminal() {
        return Ok(Json(NextQuestionResponse::Finished {
            reason: format!("Session already {}", active.session.status),
            result: SessionResult::from_session(&active.session),
        }));
    }

    if let Some(pending) = &active.pending {
        return Ok(Json(NextQuestionResponse::Question {
            question: PublicQuestion::from(&pending.question),
            reason: pending.reason.clone(),
            information: pending.information,
            alternatives_considered: pending.alternatives_considered,
            questions_answered: active.session.question_count(),
        }));
    }

    let decision = should_terminate(&active.session, &criteria);
    if decision.stop {
        finalize_session(&mut active.session)?;
        return Ok(Json(NextQuestionResponse::Finished {
            reason: decision.reason,
            result: SessionResult::from_session(&active.session),
        }));
    }

    let pool = bank.available_questions(&active.session.subject).await?;
    let Some(selection) = select_next_question(&pool, &active.session) else {
        tracing::warn!(session_id = %active.session.id, "Question bank exhausted for session");
        finalize_session(&mut active.session)?;
        return Ok(Json(NextQuestionResponse::Finished {
            reason: "Question bank exhausted".to_string(),
            result: SessionResult::from_session(&active.session),
        }));
    };

    tracing::info!(
        session_id = %active.session.id,
        question_id = %selection.question.id,
        reason = %selection.reason,
        "Next question selected"
    );

    let body = NextQuestionResponse::Question {
        question: PublicQuestion::from(&selection.question),
        reason: selection.reason.clone(),
        information: selection.information,
        alternatives_considered: selection.alternatives_considered,
        questions_answered: active.session.question_count(),
    };
    active.pending = Some(selection);

    Ok(Json(body))
}

/// Grades an answer to the pending question and updates the session.
///
/// * The answer must be for the question last offered.
/// * The session is completed automatically when the termination rules say stop.
pub async fn submit_answer(
    State(store): State<SessionStore>,
    State(bank): State<Arc<dyn QuestionBank>>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let handle = store.get(id).await?;
    let mut active = handle.lock().await;
    ensure_owner(&active.session, &claims)?;

    let criteria = config.termination_criteria();
    if close_if_expired(&mut active, &criteria)? {
        return Err(AppError::Conflict("Session time limit exceeded".to_string()));
    }
    // Surfaces a closed session as 409 before the pending check.
    active.session.ensure_open()?;

    let question = match &active.pending {
        Some(pending) if pending.question.id == req.question_id => pending.question.clone(),
        _ => {
            return Err(AppError::BadRequest(format!(
                "Question '{}' is not the pending question for this session",
                req.question_id
            )));
        }
    };

    let answered_ids: Vec<String> = active
        .session
        .responses
        .iter()
        .map(|r| r.question_id.clone())
        .collect();
    let lookup = bank.lookup(&answered_ids).await?;

    let is_correct = question.is_correct(&req.answer);
    process_response(
        &mut active.session,
        &question,
        req.answer,
        is_correct,
        req.time_spent_seconds,
        &lookup,
    )?;
    active.pending = None;

    let decision = should_terminate(&active.session, &criteria);
    let result = if decision.stop {
        finalize_session(&mut active.session)?;
        Some(SessionResult::from_session(&active.session))
    } else {
        None
    };

    Ok(Json(AnswerResponse {
        is_correct,
        current_ability: active.session.current_ability,
        standard_error: active.session.standard_error,
        questions_answered: active.session.question_count(),
        finished: decision.stop,
        reason: decision.reason,
        result,
    }))
}

/// Completes the session early at the examinee's request.
pub async fn finalize(
    State(store): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = store.get(id).await?;
    let mut active = handle.lock().await;
    ensure_owner(&active.session, &claims)?;

    finalize_session(&mut active.session)?;
    active.pending = None;

    Ok(Json(SessionResult::from_session(&active.session)))
}

/// Marks the session as abandoned. No score is recorded.
pub async fn abandon(
    State(store): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = store.get(id).await?;
    let mut active = handle.lock().await;
    ensure_owner(&active.session, &claims)?;

    close_session(&mut active.session, SessionStatus::Abandoned)?;
    active.pending = None;

    Ok(Json(SessionSummary::new(&active.session, None)))
}

/// Score report for a session that is no longer in progress.
pub async fn get_result(
    State(store): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = store.get(id).await?;
    let active = handle.lock().await;
    ensure_viewer(&active.session, &claims)?;

    if !active.session.status.is_terminal() {
        return Err(AppError::Conflict("Session is still in progress".to_string()));
    }

    Ok(Json(SessionResult::from_session(&active.session)))
}
