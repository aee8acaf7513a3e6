use quiz_core::model::{
    AnswerMap, HistoryEntry, QuestionRef, QuizId, ResultId, ResultRecord, SubmissionId, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{QuestionRecord, QuizRecord, StorageError, StoredResult};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn optional_u32(field: &'static str, v: Option<i64>) -> Result<Option<u32>, StorageError> {
    v.map(|v| u32_from_i64(field, v)).transpose()
}

/// Maps a `quizzes` row; question references are loaded separately.
pub(crate) fn map_quiz_row(
    row: &SqliteRow,
    question_refs: Vec<QuestionRef>,
) -> Result<QuizRecord, StorageError> {
    Ok(QuizRecord {
        id: QuizId::new(row.try_get::<String, _>("id").map_err(ser)?),
        topic: row.try_get("topic").map_err(ser)?,
        subject: row.try_get("subject").map_err(ser)?,
        question_refs,
        total_points: optional_u32(
            "total_points",
            row.try_get::<Option<i64>, _>("total_points").map_err(ser)?,
        )?,
    })
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<QuestionRecord, StorageError> {
    let options_json: String = row.try_get("options").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options_json).map_err(ser)?;

    Ok(QuestionRecord {
        id: QuestionRef::new(row.try_get::<String, _>("id").map_err(ser)?),
        prompt: row.try_get("prompt").map_err(ser)?,
        options,
        correct_answer: row.try_get("correct_answer").map_err(ser)?,
        points: optional_u32(
            "points",
            row.try_get::<Option<i64>, _>("points").map_err(ser)?,
        )?,
    })
}

pub(crate) fn map_result_row(row: &SqliteRow) -> Result<StoredResult, StorageError> {
    let id = result_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let submission_raw: String = row.try_get("submission_id").map_err(ser)?;
    let submission_id: SubmissionId = submission_raw.parse().map_err(ser)?;
    let answers_json: String = row.try_get("answers").map_err(ser)?;
    let answers: AnswerMap = serde_json::from_str(&answers_json).map_err(ser)?;

    Ok(StoredResult {
        id,
        record: ResultRecord {
            submission_id,
            quiz_id: QuizId::new(row.try_get::<String, _>("quiz_id").map_err(ser)?),
            user_id: UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
            answers,
            score: u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
            submitted_at: row.try_get("submitted_at").map_err(ser)?,
        },
    })
}

pub(crate) fn map_history_row(row: &SqliteRow) -> Result<HistoryEntry, StorageError> {
    Ok(HistoryEntry {
        quiz_id: QuizId::new(row.try_get::<String, _>("quiz_id").map_err(ser)?),
        score: u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        submitted_at: row.try_get("submitted_at").map_err(ser)?,
    })
}

pub(crate) fn result_id_from_i64(v: i64) -> Result<ResultId, StorageError> {
    u64::try_from(v)
        .map(ResultId::new)
        .map_err(|_| StorageError::Serialization(format!("invalid result id: {v}")))
}
