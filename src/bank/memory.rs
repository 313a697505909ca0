// src/bank/memory.rs

use std::{collections::HashSet, path::Path};

use async_trait::async_trait;
use validator::Validate;

use super::QuestionBank;
use crate::{engine::curriculum::same_subject, error::AppError, models::question::Question};

/// Question bank held in memory, typically loaded from a JSON array on disk.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuestionBank {
    questions: Vec<Question>,
}

impl InMemoryQuestionBank {
    /// Validates every question and rejects duplicate ids.
    pub fn new(questions: Vec<Question>) -> Result<Self, AppError> {
        {
            let mut seen = HashSet::new();
            for question in &questions {
                question.validate().map_err(|e| {
                    AppError::BadRequest(format!("Invalid question '{}': {}", question.id, e))
                })?;
                if !seen.insert(question.id.as_str()) {
                    return Err(AppError::Conflict(format!(
                        "Duplicate question id '{}'",
                        question.id
                    )));
                }
            }
        }
        Ok(Self { questions })
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let questions: Vec<Question> = serde_json::from_str(json)?;
        Self::new(questions)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::InternalServerError(format!(
                "Failed to read question bank {}: {}",
                path.display(),
                e
            ))
        })?;
        let bank = Self::from_json(&raw)?;
        tracing::info!("Loaded {} questions from {}", bank.len(), path.display());
        Ok(bank)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[async_trait]
impl QuestionBank for InMemoryQuestionBank {
    async fn available_questions(&self, subject: &str) -> Result<Vec<Question>, AppError> {
        Ok(self
            .questions
            .iter()
            .filter(|q| same_subject(&q.subject, subject))
            .cloned()
            .collect())
    }

    async fn questions_by_ids(&self, ids: &[String]) -> Result<Vec<Question>, AppError> {
        Ok(self
            .questions
            .iter()
            .filter(|q| ids.contains(&q.id))
            .cloned()
            .collect())
    }
}
