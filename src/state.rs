use std::sync::Arc;

use axum::extract::FromRef;

use crate::{bank::QuestionBank, config::Config, store::SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub bank: Arc<dyn QuestionBank>,
    pub sessions: SessionStore,
    pub config: Config,
}

impl AppState {
    pub fn new(bank: Arc<dyn QuestionBank>, config: Config) -> Self {
        Self {
            bank,
            sessions: SessionStore::new(),
            config,
        }
    }
}

impl FromRef<AppState> for Arc<dyn QuestionBank> {
    fn from_ref(state: &AppState) -> Self {
        state.bank.clone()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
