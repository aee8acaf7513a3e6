use quiz_core::model::QuizId;
use tracing::info;

use crate::Clock;
use crate::error::QuizError;
use crate::quiz_loader::QuizLoader;
use crate::result_submitter::{ResultSubmitter, SubmissionOutcome};

use super::session::{QuizSession, SessionStatus};

/// Starts quiz sessions and drives them through submission.
#[derive(Clone)]
pub struct QuizSessionService {
    clock: Clock,
    loader: QuizLoader,
    submitter: ResultSubmitter,
    require_all_answered: bool,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(clock: Clock, loader: QuizLoader, submitter: ResultSubmitter) -> Self {
        Self {
            clock,
            loader,
            submitter,
            require_all_answered: false,
        }
    }

    /// Refuse to submit while any question is unanswered.
    #[must_use]
    pub fn with_require_all_answered(mut self, require_all_answered: bool) -> Self {
        self.require_all_answered = require_all_answered;
        self
    }

    /// Load a quiz and open a fresh session on its first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotFound` or `QuizError::Fetch` if the quiz cannot be
    /// loaded. Either is terminal for this attempt.
    pub async fn start(&self, quiz_id: &QuizId) -> Result<QuizSession, QuizError> {
        let quiz = self.loader.load(quiz_id).await?;
        let session = QuizSession::new(quiz, self.clock.now())?;
        info!(
            quiz_id = %quiz_id,
            submission_id = %session.submission_id(),
            questions = session.quiz().len(),
            "quiz session started"
        );
        Ok(session)
    }

    /// Score and persist the session's answers.
    ///
    /// A session that is already submitted returns its stored outcome without
    /// writing. On failure the session goes back to `Ready` with its answers
    /// intact so the caller can retry.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Incomplete` when answers are required for every
    /// question and some are missing, or any error from `ResultSubmitter::submit`.
    pub async fn submit(&self, session: &mut QuizSession) -> Result<SubmissionOutcome, QuizError> {
        if let SessionStatus::Submitted(outcome) = session.status() {
            return Ok(outcome.clone());
        }

        if self.require_all_answered {
            let missing = session.unanswered();
            if !missing.is_empty() {
                return Err(QuizError::Incomplete(missing));
            }
        }

        session.begin_submit();
        let result = self
            .submitter
            .submit(session.submission_id(), session.quiz(), session.answers())
            .await;

        match result {
            Ok(outcome) => {
                session.finish_submit(outcome.clone());
                Ok(outcome)
            }
            Err(err) => {
                session.abort_submit();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuestionRef, UserId};
    use quiz_core::time::fixed_now;
    use serde_json::json;
    use std::sync::Arc;
    use storage::repository::{InMemoryRepository, UserProfileStore};

    use crate::identity::StaticIdentity;

    fn seeded() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        repo.insert_quiz_document(
            QuizId::new("quiz-1"),
            json!({ "topic": "Sequences", "questions": ["q-1", "q-2", "q-3"] }),
        )
        .unwrap();
        for (id, correct, points) in [("q-1", "2", 2), ("q-2", "4", 3), ("q-3", "8", 5)] {
            repo.insert_question_document(
                QuestionRef::new(id),
                json!({
                    "question": format!("Next power of two ({id})"),
                    "options": ["2", "4", "8"],
                    "correctAnswer": correct,
                    "points": points
                }),
            )
            .unwrap();
        }
        repo
    }

    fn service(repo: &InMemoryRepository, auth: StaticIdentity) -> QuizSessionService {
        let clock = Clock::fixed(fixed_now());
        QuizSessionService::new(
            clock,
            QuizLoader::new(Arc::new(repo.clone())),
            ResultSubmitter::new(clock, Arc::new(auth), Arc::new(repo.clone())),
        )
    }

    #[tokio::test]
    async fn unanswered_middle_question_scores_zero() {
        let repo = seeded();
        let service = service(&repo, StaticIdentity::signed_in(UserId::new("u1")));
        let mut session = service.start(&QuizId::new("quiz-1")).await.unwrap();

        session.answer_current("2").unwrap();
        session.go_next().unwrap();
        session.go_next().unwrap();
        session.answer_current("8").unwrap();

        let outcome = service.submit(&mut session).await.unwrap();
        assert_eq!(outcome.score, 7);
        assert_eq!(outcome.total_points, 10);
        assert!(session.is_submitted());
    }

    #[tokio::test]
    async fn resubmitting_a_submitted_session_does_not_write() {
        let repo = seeded();
        let service = service(&repo, StaticIdentity::signed_in(UserId::new("u1")));
        let mut session = service.start(&QuizId::new("quiz-1")).await.unwrap();
        session.answer_current("2").unwrap();

        let first = service.submit(&mut session).await.unwrap();
        let again = service.submit(&mut session).await.unwrap();

        assert_eq!(first, again);
        assert_eq!(repo.result_count().unwrap(), 1);
        let profile = repo
            .get_profile(&UserId::new("u1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.points, 2);
    }

    #[tokio::test]
    async fn unauthenticated_submit_leaves_session_ready() {
        let repo = seeded();
        let service = service(&repo, StaticIdentity::anonymous());
        let mut session = service.start(&QuizId::new("quiz-1")).await.unwrap();
        session.answer_current("2").unwrap();

        let err = service.submit(&mut session).await.unwrap_err();
        assert!(matches!(err, QuizError::Unauthenticated));
        assert!(err.is_retryable());
        assert_eq!(session.status(), &SessionStatus::Ready);
        assert_eq!(session.selected_answer(), Some("2"));
        assert_eq!(repo.result_count().unwrap(), 0);
        assert!(
            repo.get_profile(&UserId::new("u1"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn require_all_answered_blocks_incomplete_submit() {
        let repo = seeded();
        let service = service(&repo, StaticIdentity::signed_in(UserId::new("u1")))
            .with_require_all_answered(true);
        let mut session = service.start(&QuizId::new("quiz-1")).await.unwrap();
        session.record_answer(1, "4").unwrap();

        let err = service.submit(&mut session).await.unwrap_err();
        match err {
            QuizError::Incomplete(missing) => assert_eq!(missing, vec![0, 2]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(session.status(), &SessionStatus::Ready);
        assert_eq!(repo.result_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn start_of_missing_quiz_is_not_found() {
        let repo = seeded();
        let service = service(&repo, StaticIdentity::anonymous());
        let err = service.start(&QuizId::new("missing")).await.unwrap_err();
        assert!(matches!(err, QuizError::NotFound(_)));
        assert!(!err.is_retryable());
    }
}
