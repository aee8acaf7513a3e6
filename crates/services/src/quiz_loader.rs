use std::sync::Arc;

use futures::future::try_join_all;
use quiz_core::model::{Question, QuizDefinition, QuizId};
use storage::repository::QuizStore;
use tracing::{debug, warn};

use crate::error::{FetchError, QuizError};

/// Resolves a quiz id into a fully materialized `QuizDefinition`.
#[derive(Clone)]
pub struct QuizLoader {
    quizzes: Arc<dyn QuizStore>,
}

impl QuizLoader {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizStore>) -> Self {
        Self { quizzes }
    }

    /// Load a quiz and every question it references.
    ///
    /// All question lookups are issued together and joined; the result keeps
    /// the quiz's question order whatever order the lookups finish in. The
    /// first failed lookup fails the whole load, and the remaining lookups are
    /// dropped rather than awaited.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotFound` if no quiz exists for `quiz_id`.
    /// Returns `QuizError::Fetch` for storage failures, dangling question
    /// references, or stored content that fails validation.
    pub async fn load(&self, quiz_id: &QuizId) -> Result<QuizDefinition, QuizError> {
        let record = self
            .quizzes
            .get_quiz(quiz_id)
            .await
            .map_err(FetchError::Storage)?
            .ok_or_else(|| QuizError::NotFound(quiz_id.clone()))?;

        let lookups = record.question_refs.iter().map(|question_ref| async move {
            self.quizzes
                .get_question(question_ref)
                .await
                .map_err(|source| FetchError::Question {
                    question_ref: question_ref.clone(),
                    source,
                })
        });
        let resolved = try_join_all(lookups).await.inspect_err(|err| {
            warn!(quiz_id = %quiz_id, error = %err, "question resolution failed");
        })?;

        let questions = resolved
            .into_iter()
            .map(|q| q.into_question())
            .collect::<Result<Vec<Question>, _>>()
            .map_err(FetchError::Invalid)?;
        let quiz = QuizDefinition::new(record.id, record.topic, questions)
            .map_err(FetchError::Invalid)?;

        if let Some(declared) = record.total_points.filter(|d| *d != quiz.total_points()) {
            warn!(
                quiz_id = %quiz_id,
                declared,
                computed = quiz.total_points(),
                "stored total points disagree with question points; using computed total"
            );
        }

        debug!(quiz_id = %quiz_id, questions = quiz.len(), "loaded quiz");
        Ok(quiz)
    }
}
