//! Demo content for a fresh database.

use quiz_core::model::{QuestionRef, QuizId};
use serde_json::{Value, json};
use storage::document::Document;
use storage::repository::{QuestionRecord, QuizRecord, StorageError};
use storage::sqlite::SqliteRepository;
use tracing::info;

fn quiz_documents() -> Vec<(QuizId, Value)> {
    vec![
        (
            QuizId::new("quiz-finance-basics"),
            json!({
                "subject": "finance",
                "topic": "Finance Basics",
                "questions": ["finance-time-value-money", "finance-compound-interest"],
                "totalPoints": 10
            }),
        ),
        (
            QuizId::new("quiz-logic-puzzles"),
            json!({
                "subject": "analytical",
                "topic": "Logic Puzzles",
                "questions": ["analytical-sequence", "analytical-odd-one-out", "analytical-syllogism"],
                "totalPoints": 6
            }),
        ),
    ]
}

fn question_documents() -> Vec<(QuestionRef, Value)> {
    vec![
        (
            QuestionRef::new("finance-time-value-money"),
            json!({
                "question": "What is the time value of money?",
                "options": [
                    "Money available today is worth more than the same amount in the future",
                    "Money in the future is worth more than the same amount today",
                    "Money keeps the same value over time"
                ],
                "correctAnswer": "Money available today is worth more than the same amount in the future",
                "points": 5
            }),
        ),
        (
            QuestionRef::new("finance-compound-interest"),
            json!({
                "question": "100 at 10% interest compounded yearly is worth what after two years?",
                "options": ["120", "121", "110"],
                "correctAnswer": "121",
                "points": 5
            }),
        ),
        (
            QuestionRef::new("analytical-sequence"),
            json!({
                "question": "What is the next number in the sequence 2, 4, 8, 16?",
                "options": ["24", "32", "30"],
                "correctAnswer": "32",
                "points": 2
            }),
        ),
        (
            QuestionRef::new("analytical-odd-one-out"),
            json!({
                "question": "Which one does not belong: apple, banana, carrot, cherry?",
                "options": ["apple", "banana", "carrot", "cherry"],
                "correctAnswer": "carrot",
                "points": 2
            }),
        ),
        (
            QuestionRef::new("analytical-syllogism"),
            json!({
                "question": "All bloops are razzies and all razzies are lazzies. Are all bloops lazzies?",
                "options": ["Yes", "No", "Cannot tell"],
                "correctAnswer": "Yes",
                "points": 2
            }),
        ),
    ]
}

/// Parsed demo content, checked through the same document boundary as reads.
fn demo_records() -> Result<(Vec<QuizRecord>, Vec<QuestionRecord>), StorageError> {
    let quizzes = quiz_documents()
        .into_iter()
        .map(|(id, doc)| QuizRecord::from_document(id, &Document::from_value(doc)?))
        .collect::<Result<Vec<_>, _>>()?;
    let questions = question_documents()
        .into_iter()
        .map(|(id, doc)| QuestionRecord::from_document(id, &Document::from_value(doc)?))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((quizzes, questions))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub quizzes: usize,
    pub questions: usize,
}

/// Insert or refresh the demo quizzes. Safe to run repeatedly.
///
/// # Errors
///
/// Returns `StorageError` if the demo content is malformed or a write fails.
pub async fn seed_demo_content(repo: &SqliteRepository) -> Result<SeedSummary, StorageError> {
    let (quizzes, questions) = demo_records()?;

    for question in &questions {
        repo.upsert_question(question).await?;
    }
    for quiz in &quizzes {
        repo.upsert_quiz(quiz).await?;
    }

    let summary = SeedSummary {
        quizzes: quizzes.len(),
        questions: questions.len(),
    };
    info!(quizzes = summary.quizzes, questions = summary.questions, "seeded demo content");
    Ok(summary)
}
