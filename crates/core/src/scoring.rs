//! Pure scoring of an answer sheet against a quiz.

use crate::model::{AnswerMap, QuizDefinition};

/// Sum the points of every question whose recorded answer equals its correct answer.
///
/// Missing answers and answers that match no option score zero. The result never
/// exceeds `quiz.total_points()`, so the sum cannot overflow.
#[must_use]
pub fn score(quiz: &QuizDefinition, answers: &AnswerMap) -> u32 {
    quiz.questions()
        .iter()
        .enumerate()
        .filter(|(index, question)| {
            answers
                .get(*index)
                .is_some_and(|answer| question.is_correct(answer))
        })
        .map(|(_, question)| question.points())
        .sum()
}
