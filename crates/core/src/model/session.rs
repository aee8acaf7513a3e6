use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answers::AnswerMap;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("a session needs at least one question")]
    NoQuestions,

    #[error("question index {index} is out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("session is already submitted")]
    Closed,
}

/// Direction of the most recent navigation step.
///
/// Only used to pick a transition when rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Next,
    Prev,
}

/// Navigation position and answers for one quiz attempt.
///
/// Invariants: `current_index < question_count` and every answer key is below
/// `question_count`. Boundaries clamp; there is no wraparound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    question_count: usize,
    current_index: usize,
    direction: Direction,
    answers: AnswerMap,
}

impl SessionState {
    /// # Errors
    ///
    /// Returns `SessionError::NoQuestions` when `question_count` is zero.
    pub fn new(question_count: usize) -> Result<Self, SessionError> {
        if question_count == 0 {
            return Err(SessionError::NoQuestions);
        }
        Ok(Self {
            question_count,
            current_index: 0,
            direction: Direction::Next,
            answers: AnswerMap::new(),
        })
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.current_index == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current_index + 1 == self.question_count
    }

    /// Store `value` as the answer for `index`, replacing any earlier answer.
    ///
    /// The value is not checked against the question's options.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IndexOutOfRange` if `index` is not a question of this quiz.
    pub fn record_answer(
        &mut self,
        index: usize,
        value: impl Into<String>,
    ) -> Result<(), SessionError> {
        if index >= self.question_count {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.question_count,
            });
        }
        self.answers.insert(index, value.into());
        Ok(())
    }

    /// Answer the question currently on screen.
    pub fn answer_current(&mut self, value: impl Into<String>) {
        self.answers.insert(self.current_index, value.into());
    }

    /// Step forward. Returns `false` when already on the last question.
    pub fn go_next(&mut self) -> bool {
        self.direction = Direction::Next;
        if self.is_last() {
            return false;
        }
        self.current_index += 1;
        true
    }

    /// Step back. Returns `false` when already on the first question.
    pub fn go_prev(&mut self) -> bool {
        self.direction = Direction::Prev;
        if self.is_first() {
            return false;
        }
        self.current_index -= 1;
        true
    }

    /// Indices of questions without an answer, ascending.
    #[must_use]
    pub fn unanswered(&self) -> Vec<usize> {
        (0..self.question_count)
            .filter(|i| !self.answers.contains(*i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_quiz_cannot_start_a_session() {
        assert_eq!(SessionState::new(0).unwrap_err(), SessionError::NoQuestions);
    }

    #[test]
    fn go_prev_at_first_question_only_flips_direction() {
        let mut state = SessionState::new(3).unwrap();
        assert!(!state.go_prev());
        assert_eq!(state.current_index(), 0);
        assert_eq!(state.direction(), Direction::Prev);
        assert!(state.answers().is_empty());
    }

    #[test]
    fn go_next_at_last_question_is_clamped() {
        let mut state = SessionState::new(2).unwrap();
        assert!(state.go_next());
        assert!(state.is_last());
        state.go_prev();
        state.go_next();
        assert!(!state.go_next());
        assert_eq!(state.current_index(), 1);
        assert_eq!(state.direction(), Direction::Next);
    }

    #[test]
    fn direction_tracks_last_step() {
        let mut state = SessionState::new(3).unwrap();
        state.go_next();
        state.go_next();
        state.go_prev();
        assert_eq!(state.current_index(), 1);
        assert_eq!(state.direction(), Direction::Prev);
    }

    #[test]
    fn record_answer_overwrites_and_survives_navigation() {
        let mut state = SessionState::new(3).unwrap();
        state.record_answer(0, "A").unwrap();
        state.go_next();
        state.answer_current("B");
        state.go_prev();
        state.record_answer(0, "C").unwrap();

        assert_eq!(state.answers().get(0), Some("C"));
        assert_eq!(state.answers().get(1), Some("B"));
        assert_eq!(state.unanswered(), vec![2]);
    }

    #[test]
    fn record_answer_outside_range_is_rejected() {
        let mut state = SessionState::new(2).unwrap();
        let err = state.record_answer(2, "A").unwrap_err();
        assert_eq!(err, SessionError::IndexOutOfRange { index: 2, len: 2 });
        assert!(state.answers().is_empty());
    }

    #[test]
    fn single_question_session_is_first_and_last() {
        let mut state = SessionState::new(1).unwrap();
        assert!(state.is_first());
        assert!(state.is_last());
        assert!(!state.go_next());
        assert!(!state.go_prev());
    }
}
