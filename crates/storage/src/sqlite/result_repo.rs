use quiz_core::model::{ResultId, ResultRecord, SubmissionId, UserId, UserProfileDelta};
use sqlx::SqliteConnection;

use super::SqliteRepository;
use super::mapping::{conn, map_result_row, result_id_from_i64, ser};
use super::profile_repo::{append_history, increment_points};
use crate::repository::{ResultStore, StorageError, StoredResult, SubmissionPersistence};

async fn find_submission(
    db: &mut SqliteConnection,
    submission_id: SubmissionId,
) -> Result<Option<StoredResult>, StorageError> {
    let row = sqlx::query(
        r"
            SELECT id, submission_id, quiz_id, user_id, answers, score, submitted_at
            FROM quiz_results
            WHERE submission_id = ?1
        ",
    )
    .bind(submission_id.to_string())
    .fetch_optional(&mut *db)
    .await
    .map_err(conn)?;
    row.as_ref().map(map_result_row).transpose()
}

/// Insert unless the submission is already stored; `None` means it was.
async fn insert_result_if_new(
    db: &mut SqliteConnection,
    record: &ResultRecord,
) -> Result<Option<ResultId>, StorageError> {
    let answers = serde_json::to_string(&record.answers).map_err(ser)?;

    let res = sqlx::query(
        r"
            INSERT INTO quiz_results (
                submission_id, quiz_id, user_id, answers, score, submitted_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(submission_id) DO NOTHING
        ",
    )
    .bind(record.submission_id.to_string())
    .bind(record.quiz_id.as_str())
    .bind(record.user_id.as_str())
    .bind(answers)
    .bind(i64::from(record.score))
    .bind(record.submitted_at)
    .execute(&mut *db)
    .await
    .map_err(conn)?;

    if res.rows_affected() == 0 {
        return Ok(None);
    }
    result_id_from_i64(res.last_insert_rowid()).map(Some)
}

#[async_trait::async_trait]
impl ResultStore for SqliteRepository {
    async fn create_result(&self, record: &ResultRecord) -> Result<ResultId, StorageError> {
        let mut db = self.pool.acquire().await.map_err(conn)?;
        insert_result_if_new(&mut db, record)
            .await?
            .ok_or(StorageError::Conflict)
    }

    async fn results_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<StoredResult>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, submission_id, quiz_id, user_id, answers, score, submitted_at
                FROM quiz_results
                WHERE user_id = ?1
                ORDER BY submitted_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row(&row)?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl SubmissionPersistence for SqliteRepository {
    async fn commit_submission(
        &self,
        record: &ResultRecord,
        delta: &UserProfileDelta,
    ) -> Result<StoredResult, StorageError> {
        if delta.user_id != record.user_id {
            return Err(StorageError::Conflict);
        }

        let mut tx = self.pool.begin().await.map_err(conn)?;

        // Write first so the transaction holds the write lock before it reads:
        // a concurrent commit of the same submission waits here and then sees
        // the committed row instead of a stale snapshot.
        let Some(id) = insert_result_if_new(&mut tx, record).await? else {
            let existing = find_submission(&mut tx, record.submission_id)
                .await?
                .ok_or(StorageError::Conflict)?;
            tracing::debug!(
                submission_id = %record.submission_id,
                result_id = %existing.id,
                "submission already committed"
            );
            return Ok(existing);
        };

        increment_points(&mut tx, &delta.user_id, delta.points).await?;
        append_history(&mut tx, &delta.user_id, &delta.history).await?;

        tx.commit().await.map_err(conn)?;
        Ok(StoredResult {
            id,
            record: record.clone(),
        })
    }
}
