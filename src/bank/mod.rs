// src/bank/mod.rs

//! Read-only access to the question bank.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{error::AppError, models::question::Question};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryQuestionBank;
pub use postgres::PgQuestionBank;

#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// All questions that may be offered for `subject`, at any grade.
    /// Grade bounds are applied by the selector.
    async fn available_questions(&self, subject: &str) -> Result<Vec<Question>, AppError>;

    /// Metadata for the given ids; unknown ids are omitted.
    async fn questions_by_ids(&self, ids: &[String]) -> Result<Vec<Question>, AppError>;

    async fn question(&self, id: &str) -> Result<Option<Question>, AppError> {
        let mut found = self.questions_by_ids(&[id.to_string()]).await?;
        Ok(found.pop())
    }

    /// Builds the id → question lookup the estimator needs.
    async fn lookup(&self, ids: &[String]) -> Result<HashMap<String, Question>, AppError> {
        Ok(self
            .questions_by_ids(ids)
            .await?
            .into_iter()
            .map(|q| (q.id.clone(), q))
            .collect())
    }
}
