use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuizId;

/// Points awarded for a correct answer when the question does not say otherwise.
pub const DEFAULT_QUESTION_POINTS: u32 = 1;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizDefinitionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("quiz has no questions")]
    NoQuestions,

    #[error("quiz total points overflow")]
    PointsOverflow,
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question, owned by the quiz that references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
    points: Option<u32>,
}

impl Question {
    /// Build a question.
    ///
    /// The correct answer is not required to be one of the options, and an
    /// empty option list is kept as-is; the calculator only compares strings.
    ///
    /// # Errors
    ///
    /// Returns `QuizDefinitionError::EmptyPrompt` for a blank prompt.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
        points: Option<u32>,
    ) -> Result<Self, QuizDefinitionError> {
        let prompt = prompt.into();
        let correct_answer = correct_answer.into();

        if prompt.trim().is_empty() {
            return Err(QuizDefinitionError::EmptyPrompt);
        }

        Ok(Self {
            prompt,
            options,
            correct_answer,
            points,
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Points for a correct answer. Missing or zero falls back to
    /// `DEFAULT_QUESTION_POINTS`.
    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
            .filter(|p| *p > 0)
            .unwrap_or(DEFAULT_QUESTION_POINTS)
    }

    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

//
// ─── QUIZ DEFINITION ──────────────────────────────────────────────────────────
//

/// A fully materialized quiz: every question reference already resolved.
///
/// Immutable once built. `total_points` is derived from the questions so that
/// a perfect answer sheet always scores exactly the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDefinition {
    id: QuizId,
    topic: String,
    questions: Vec<Question>,
    total_points: u32,
}

impl QuizDefinition {
    /// # Errors
    ///
    /// Returns `QuizDefinitionError::NoQuestions` for an empty question list and
    /// `QuizDefinitionError::PointsOverflow` if the point sum does not fit in `u32`.
    pub fn new(
        id: QuizId,
        topic: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, QuizDefinitionError> {
        if questions.is_empty() {
            return Err(QuizDefinitionError::NoQuestions);
        }

        let total_points = questions
            .iter()
            .try_fold(0_u32, |acc, q| acc.checked_add(q.points()))
            .ok_or(QuizDefinitionError::PointsOverflow)?;

        Ok(Self {
            id,
            topic: topic.into(),
            questions,
            total_points,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Number of questions; always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.total_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn question_points_default_to_one() {
        let q = Question::new("2 + 2?", opts(&["3", "4"]), "4", None).unwrap();
        assert_eq!(q.points(), DEFAULT_QUESTION_POINTS);
        assert!(q.is_correct("4"));
        assert!(!q.is_correct("3"));
    }

    #[test]
    fn question_rejects_blank_prompt() {
        assert_eq!(
            Question::new("  ", opts(&["a"]), "a", None).unwrap_err(),
            QuizDefinitionError::EmptyPrompt
        );
    }

    #[test]
    fn zero_points_count_as_default() {
        let q = Question::new("Q", opts(&["a"]), "a", Some(0)).unwrap();
        assert_eq!(q.points(), DEFAULT_QUESTION_POINTS);
    }

    #[test]
    fn sparse_question_content_is_accepted() {
        let no_options = Question::new("Q", Vec::new(), "a", None).unwrap();
        assert!(no_options.options().is_empty());
        assert!(no_options.is_correct("a"));

        let blank_answer = Question::new("Q", opts(&["a"]), "", None).unwrap();
        assert!(!blank_answer.is_correct("a"));
    }

    #[test]
    fn total_points_sums_question_points() {
        let questions = vec![
            Question::new("Q1", opts(&["A", "B"]), "A", Some(5)).unwrap(),
            Question::new("Q2", opts(&["A", "B"]), "B", None).unwrap(),
        ];
        let quiz = QuizDefinition::new(QuizId::new("q"), "Finance", questions).unwrap();
        assert_eq!(quiz.total_points(), 6);
        assert_eq!(quiz.len(), 2);
        assert_eq!(quiz.question(1).unwrap().correct_answer(), "B");
        assert!(quiz.question(2).is_none());
    }

    #[test]
    fn quiz_without_questions_is_rejected() {
        let err = QuizDefinition::new(QuizId::new("q"), "Empty", Vec::new()).unwrap_err();
        assert_eq!(err, QuizDefinitionError::NoQuestions);
    }

    #[test]
    fn total_points_overflow_is_reported() {
        let questions = vec![
            Question::new("Q1", opts(&["A"]), "A", Some(u32::MAX)).unwrap(),
            Question::new("Q2", opts(&["A"]), "A", Some(1)).unwrap(),
        ];
        let err = QuizDefinition::new(QuizId::new("q"), "Big", questions).unwrap_err();
        assert_eq!(err, QuizDefinitionError::PointsOverflow);
    }
}
