use quiz_core::model::{QuestionRef, QuizId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_question_row, map_quiz_row, ser};
use crate::repository::{QuestionRecord, QuizRecord, QuizStore, StorageError};

impl SqliteRepository {
    async fn question_refs(&self, quiz_id: &str) -> Result<Vec<QuestionRef>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT question_id
                FROM quiz_questions
                WHERE quiz_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("question_id")
                    .map(QuestionRef::new)
                    .map_err(ser)
            })
            .collect()
    }

    /// Insert or replace a quiz and its ordered question references.
    ///
    /// Seeding helper; referenced questions do not have to exist yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the write fails.
    pub async fn upsert_quiz(&self, quiz: &QuizRecord) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO quizzes (id, topic, subject, total_points)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    topic = excluded.topic,
                    subject = excluded.subject,
                    total_points = excluded.total_points
            ",
        )
        .bind(quiz.id.as_str())
        .bind(quiz.topic.as_str())
        .bind(quiz.subject.as_deref())
        .bind(quiz.total_points.map(i64::from))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM quiz_questions WHERE quiz_id = ?1")
            .bind(quiz.id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, question_ref) in quiz.question_refs.iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                    INSERT INTO quiz_questions (quiz_id, position, question_id)
                    VALUES (?1, ?2, ?3)
                ",
            )
            .bind(quiz.id.as_str())
            .bind(position)
            .bind(question_ref.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    /// Insert or replace a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if options cannot be encoded or the write fails.
    pub async fn upsert_question(&self, question: &QuestionRecord) -> Result<(), StorageError> {
        let options = serde_json::to_string(&question.options).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO questions (id, prompt, options, correct_answer, points)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    prompt = excluded.prompt,
                    options = excluded.options,
                    correct_answer = excluded.correct_answer,
                    points = excluded.points
            ",
        )
        .bind(question.id.as_str())
        .bind(question.prompt.as_str())
        .bind(options)
        .bind(question.correct_answer.as_str())
        .bind(question.points.map(i64::from))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl QuizStore for SqliteRepository {
    async fn get_quiz(&self, id: &QuizId) -> Result<Option<QuizRecord>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, topic, subject, total_points
                FROM quizzes
                WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let refs = self.question_refs(id.as_str()).await?;
        map_quiz_row(&row, refs).map(Some)
    }

    async fn get_question(&self, id: &QuestionRef) -> Result<QuestionRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, prompt, options, correct_answer, points
                FROM questions
                WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_question_row(&row)
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, topic, subject, total_points
                FROM quizzes
                ORDER BY id ASC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id").map_err(ser)?;
            let refs = self.question_refs(&id).await?;
            out.push(map_quiz_row(&row, refs)?);
        }
        Ok(out)
    }
}
