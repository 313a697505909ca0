// src/bank/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::QuestionBank;
use crate::{
    engine::curriculum::subject_aliases,
    error::AppError,
    models::question::{Question, QuestionRow},
};

const SELECT_QUESTIONS: &str = r#"
    SELECT
        id, subject, strand, format, difficulty, grade_level,
        standards, content, options, answer
    FROM questions
"#;

/// Question bank backed by the `questions` table.
#[derive(Clone)]
pub struct PgQuestionBank {
    pool: PgPool,
}

impl PgQuestionBank {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionBank for PgQuestionBank {
    async fn available_questions(&self, subject: &str) -> Result<Vec<Question>, AppError> {
        let rows = sqlx::query_as::<_, QuestionRow>(&format!(
            "{} WHERE LOWER(subject) = ANY($1) AND is_active ORDER BY id",
            SELECT_QUESTIONS
        ))
        .bind(subject_aliases(subject))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch available questions: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn questions_by_ids(&self, ids: &[String]) -> Result<Vec<Question>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // Retired questions still resolve so past responses keep scoring.
        let mut query_builder = QueryBuilder::<Postgres>::new(SELECT_QUESTIONS);
        query_builder.push(" WHERE id IN (");
        let mut separated = query_builder.separated(",");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows: Vec<QuestionRow> = query_builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch questions by id: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        Ok(rows.into_iter().map(Question::from).collect())
    }
}
