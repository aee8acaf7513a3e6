//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuestionRef, QuizDefinitionError, QuizId, SessionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Why a quiz could not be materialized.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("question {question_ref} could not be resolved: {source}")]
    Question {
        question_ref: QuestionRef,
        #[source]
        source: StorageError,
    },
    #[error("invalid quiz content: {0}")]
    Invalid(#[from] QuizDefinitionError),
}

/// Errors emitted while loading, answering, or submitting a quiz.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz {0} not found")]
    NotFound(QuizId),
    #[error("failed to load quiz: {0}")]
    Fetch(#[from] FetchError),
    #[error("no user is signed in")]
    Unauthenticated,
    #[error("failed to submit quiz: {0}")]
    Submit(#[source] StorageError),
    #[error("a submission for this session is already in progress")]
    SubmissionInProgress,
    #[error("{} question(s) left unanswered", .0.len())]
    Incomplete(Vec<usize>),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl QuizError {
    /// Whether the session survives this error and the user may try again.
    ///
    /// Load failures end the session attempt; submit-side failures leave the
    /// session `Ready` with its answers intact.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QuizError::Unauthenticated
                | QuizError::Submit(_)
                | QuizError::SubmissionInProgress
                | QuizError::Incomplete(_)
        )
    }
}

/// Errors emitted by `ProfileService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
