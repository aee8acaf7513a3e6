use chrono::{DateTime, Utc};
use quiz_core::model::{
    AnswerMap, Direction, Question, QuizDefinition, SessionError, SessionState, SubmissionId,
};

use crate::result_submitter::SubmissionOutcome;

/// Where a session is in its submit lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Ready,
    Submitting,
    Submitted(SubmissionOutcome),
}

/// Position summary for rendering a progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// Zero-based index of the question on screen.
    pub index: usize,
    pub total: usize,
    pub answered: usize,
    pub is_first: bool,
    pub is_last: bool,
}

/// One attempt at a loaded quiz.
///
/// Owns its answers and navigation position; nothing is shared with other
/// sessions of the same quiz. The `SubmissionId` is minted here and reused by
/// every submit attempt so retries stay idempotent.
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: QuizDefinition,
    state: SessionState,
    submission_id: SubmissionId,
    status: SessionStatus,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    pub(crate) fn new(
        quiz: QuizDefinition,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let state = SessionState::new(quiz.len())?;
        Ok(Self {
            quiz,
            state,
            submission_id: SubmissionId::generate(),
            status: SessionStatus::Ready,
            started_at,
        })
    }

    #[must_use]
    pub fn quiz(&self) -> &QuizDefinition {
        &self.quiz
    }

    #[must_use]
    pub fn submission_id(&self) -> SubmissionId {
        self.submission_id
    }

    #[must_use]
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        self.state.answers()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.state.current_index()
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.state.direction()
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        matches!(self.status, SessionStatus::Submitted(_))
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.question(self.state.current_index())
    }

    /// Answer previously chosen for the question on screen, if any.
    #[must_use]
    pub fn selected_answer(&self) -> Option<&str> {
        self.state.answers().get(self.state.current_index())
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            index: self.state.current_index(),
            total: self.state.question_count(),
            answered: self.state.answers().len(),
            is_first: self.state.is_first(),
            is_last: self.state.is_last(),
        }
    }

    #[must_use]
    pub fn unanswered(&self) -> Vec<usize> {
        self.state.unanswered()
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_submitted() {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Closed` after submission and
    /// `SessionError::IndexOutOfRange` for an index outside the quiz.
    pub fn record_answer(
        &mut self,
        index: usize,
        value: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.state.record_answer(index, value)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Closed` after submission.
    pub fn answer_current(&mut self, value: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.state.answer_current(value);
        Ok(())
    }

    /// Move forward; `Ok(false)` when already on the last question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` after submission.
    pub fn go_next(&mut self) -> Result<bool, SessionError> {
        self.ensure_open()?;
        Ok(self.state.go_next())
    }

    /// Move back; `Ok(false)` when already on the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` after submission.
    pub fn go_prev(&mut self) -> Result<bool, SessionError> {
        self.ensure_open()?;
        Ok(self.state.go_prev())
    }

    pub(crate) fn begin_submit(&mut self) {
        self.status = SessionStatus::Submitting;
    }

    pub(crate) fn finish_submit(&mut self, outcome: SubmissionOutcome) {
        self.status = SessionStatus::Submitted(outcome);
    }

    pub(crate) fn abort_submit(&mut self) {
        self.status = SessionStatus::Ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuizId, ResultId};
    use quiz_core::time::fixed_now;

    fn session() -> QuizSession {
        let questions = ["A", "B", "C"]
            .into_iter()
            .map(|c| {
                Question::new(
                    format!("Question {c}"),
                    vec!["A".into(), "B".into(), "C".into()],
                    c,
                    None,
                )
                .unwrap()
            })
            .collect();
        let quiz = QuizDefinition::new(QuizId::new("quiz-1"), "Letters", questions).unwrap();
        QuizSession::new(quiz, fixed_now()).unwrap()
    }

    #[test]
    fn new_session_is_ready_at_first_question() {
        let session = session();
        assert_eq!(session.status(), &SessionStatus::Ready);
        assert_eq!(session.current_question().unwrap().prompt(), "Question A");
        assert_eq!(session.selected_answer(), None);
        assert_eq!(
            session.progress(),
            SessionProgress {
                index: 0,
                total: 3,
                answered: 0,
                is_first: true,
                is_last: false,
            }
        );
    }

    #[test]
    fn selected_answer_follows_navigation() {
        let mut session = session();
        session.answer_current("A").unwrap();
        session.go_next().unwrap();
        assert_eq!(session.selected_answer(), None);
        session.go_prev().unwrap();
        assert_eq!(session.selected_answer(), Some("A"));
        assert_eq!(session.direction(), Direction::Prev);
    }

    #[test]
    fn sessions_of_same_quiz_do_not_share_answers() {
        let mut first = session();
        let second = QuizSession::new(first.quiz().clone(), fixed_now()).unwrap();
        first.answer_current("A").unwrap();

        assert!(second.answers().is_empty());
        assert_ne!(first.submission_id(), second.submission_id());
    }

    #[test]
    fn submitted_session_rejects_mutation() {
        let mut session = session();
        session.begin_submit();
        session.finish_submit(SubmissionOutcome {
            result_id: ResultId::new(1),
            score: 0,
            total_points: 3,
        });

        assert_eq!(session.answer_current("A"), Err(SessionError::Closed));
        assert_eq!(session.record_answer(1, "B"), Err(SessionError::Closed));
        assert_eq!(session.go_next(), Err(SessionError::Closed));
        assert_eq!(session.go_prev(), Err(SessionError::Closed));
        assert!(session.answers().is_empty());
    }

    #[test]
    fn aborted_submit_returns_to_ready_with_answers() {
        let mut session = session();
        session.record_answer(2, "C").unwrap();
        session.begin_submit();
        session.abort_submit();

        assert_eq!(session.status(), &SessionStatus::Ready);
        assert_eq!(session.answers().get(2), Some("C"));
        assert_eq!(session.unanswered(), vec![0, 1]);
    }
}
