// src/store.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    engine::{SelectionResult, Session},
    error::AppError,
};

/// A live session plus the question most recently offered to the examinee.
#[derive(Debug)]
pub struct ActiveSession {
    pub session: Session,
    pub pending: Option<SelectionResult>,
}

impl ActiveSession {
    pub fn pending_question_id(&self) -> Option<String> {
        self.pending.as_ref().map(|s| s.question.id.clone())
    }
}

/// Handle to one session. Holding its lock makes the caller the session's single writer.
pub type SessionHandle = Arc<Mutex<ActiveSession>>;

/// In-process registry of adaptive sessions.
///
/// The map lock is only held for lookups and inserts; updates to a session go through
/// its own mutex, so different sessions never wait on each other.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Session) -> SessionHandle {
        let id = session.id;
        let handle = Arc::new(Mutex::new(ActiveSession {
            session,
            pending: None,
        }));
        self.sessions.write().await.insert(id, handle.clone());
        handle
    }

    pub async fn get(&self, id: Uuid) -> Result<SessionHandle, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound("Session not found".to_string()))
    }

    pub async fn remove(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.write().await.remove(&id)
    }

    /// Drops finished sessions last updated before `now - retention`.
    ///
    /// Sessions whose lock is held are skipped and picked up by a later sweep.
    /// Returns how many sessions were removed.
    pub async fn evict_finished(&self, retention: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now - retention;
        let expired: Vec<Uuid> = {
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .filter(|(_, handle)| {
                    handle.try_lock().is_ok_and(|active| {
                        active.session.status.is_terminal() && active.session.updated_at <= cutoff
                    })
                })
                .map(|(id, _)| *id)
                .collect()
        };

        if expired.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        for id in &expired {
            sessions.remove(id);
        }
        expired.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
