use std::sync::Arc;

use quiz_core::model::QuizId;
use storage::repository::{QuizRecord, QuizStore};

use crate::error::{FetchError, QuizError};

/// Row of the quiz list page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSummary {
    pub id: QuizId,
    pub topic: String,
    pub subject: Option<String>,
    pub question_count: usize,
    /// Total as stored on the quiz; the loaded quiz recomputes it from questions.
    pub total_points: Option<u32>,
}

impl From<QuizRecord> for QuizSummary {
    fn from(record: QuizRecord) -> Self {
        Self {
            question_count: record.question_refs.len(),
            id: record.id,
            topic: record.topic,
            subject: record.subject,
            total_points: record.total_points,
        }
    }
}

/// Read-only access to the available quizzes.
#[derive(Clone)]
pub struct CatalogService {
    quizzes: Arc<dyn QuizStore>,
}

impl CatalogService {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizStore>) -> Self {
        Self { quizzes }
    }

    /// List quizzes ordered by id.
    ///
    /// Questions are not resolved here.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Fetch` if the store cannot be read.
    pub async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizSummary>, QuizError> {
        let records = self
            .quizzes
            .list_quizzes(limit)
            .await
            .map_err(FetchError::Storage)?;
        Ok(records.into_iter().map(QuizSummary::from).collect())
    }
}
