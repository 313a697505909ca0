// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// A question as held by the question bank.
///
/// The engine reads only `id`, `strand`, `format`, `difficulty`, `grade_level` and `standards`;
/// the remaining fields are served to examinees (minus the answer key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Question {
    #[validate(length(min = 1, max = 100))]
    pub id: String,

    #[validate(length(min = 1, max = 50))]
    pub subject: String,

    /// Content-area subdivision (e.g., "Geometry").
    #[validate(length(min = 1, max = 100))]
    pub strand: String,

    /// Presentation format (e.g., "multiple_choice", "numeric").
    #[validate(length(min = 1, max = 50))]
    pub format: String,

    /// Ordinal difficulty, 1 (easiest) to 5 (hardest).
    #[validate(range(min = 1, max = 5))]
    pub difficulty: u8,

    /// Nominal grade label ("K", "1".."12", or a course name).
    #[validate(length(min = 1, max = 30))]
    pub grade_level: String,

    /// Content-standard identifiers covered by this question.
    #[serde(default)]
    pub standards: Vec<String>,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub options: Vec<String>,

    /// The correct answer key.
    pub answer: String,
}

impl Question {
    /// Strict answer comparison, ignoring surrounding whitespace.
    pub fn is_correct(&self, answer: &str) -> bool {
        answer.trim() == self.answer.trim()
    }
}

/// Row shape of the `questions` table.
#[derive(Debug, FromRow)]
pub struct QuestionRow {
    pub id: String,
    pub subject: String,
    pub strand: String,
    pub format: String,
    pub difficulty: i16,
    pub grade_level: String,
    pub standards: Json<Vec<String>>,
    pub content: String,
    pub options: Json<Vec<String>>,
    pub answer: String,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question {
            id: row.id,
            subject: row.subject,
            strand: row.strand,
            format: row.format,
            // The table constrains difficulty to 1..=5.
            difficulty: u8::try_from(row.difficulty).unwrap_or(3),
            grade_level: row.grade_level,
            standards: row.standards.0,
            content: row.content,
            options: row.options.0,
            answer: row.answer,
        }
    }
}

/// DTO for sending a question to the examinee (excludes the answer key).
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: String,
    pub subject: String,
    pub strand: String,
    pub format: String,
    pub difficulty: u8,
    pub grade_level: String,
    pub content: String,
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        PublicQuestion {
            id: q.id.clone(),
            subject: q.subject.clone(),
            strand: q.strand.clone(),
            format: q.format.clone(),
            difficulty: q.difficulty,
            grade_level: q.grade_level.clone(),
            content: q.content.clone(),
            options: q.options.clone(),
        }
    }
}
