use quiz_core::model::{HistoryEntry, UserId, UserProfile};
use sqlx::{Row, SqliteConnection};

use super::SqliteRepository;
use super::mapping::{conn, map_history_row, ser};
use crate::repository::{StorageError, UserProfileStore};

// Increment in SQL rather than read-modify-write so concurrent sessions for
// the same user never lose points.
pub(super) async fn increment_points(
    db: &mut SqliteConnection,
    user_id: &UserId,
    delta: u32,
) -> Result<(), StorageError> {
    sqlx::query(
        r"
            INSERT INTO user_profiles (user_id, points)
            VALUES (?1, ?2)
            ON CONFLICT(user_id) DO UPDATE SET
                points = points + excluded.points
        ",
    )
    .bind(user_id.as_str())
    .bind(i64::from(delta))
    .execute(&mut *db)
    .await
    .map_err(conn)?;
    Ok(())
}

pub(super) async fn append_history(
    db: &mut SqliteConnection,
    user_id: &UserId,
    entry: &HistoryEntry,
) -> Result<(), StorageError> {
    sqlx::query(
        r"
            INSERT INTO user_profiles (user_id, points)
            VALUES (?1, 0)
            ON CONFLICT(user_id) DO NOTHING
        ",
    )
    .bind(user_id.as_str())
    .execute(&mut *db)
    .await
    .map_err(conn)?;

    sqlx::query(
        r"
            INSERT INTO quiz_history (user_id, quiz_id, score, submitted_at)
            VALUES (?1, ?2, ?3, ?4)
        ",
    )
    .bind(user_id.as_str())
    .bind(entry.quiz_id.as_str())
    .bind(i64::from(entry.score))
    .bind(entry.submitted_at)
    .execute(&mut *db)
    .await
    .map_err(conn)?;
    Ok(())
}

#[async_trait::async_trait]
impl UserProfileStore for SqliteRepository {
    async fn increment_points(&self, user_id: &UserId, delta: u32) -> Result<(), StorageError> {
        let mut db = self.pool.acquire().await.map_err(conn)?;
        increment_points(&mut db, user_id, delta).await
    }

    async fn append_history(
        &self,
        user_id: &UserId,
        entry: &HistoryEntry,
    ) -> Result<(), StorageError> {
        let mut db = self.pool.acquire().await.map_err(conn)?;
        append_history(&mut db, user_id, entry).await
    }

    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, StorageError> {
        let row = sqlx::query("SELECT points FROM user_profiles WHERE user_id = ?1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let points: i64 = row.try_get("points").map_err(ser)?;
        let points = u64::try_from(points)
            .map_err(|_| StorageError::Serialization(format!("invalid points: {points}")))?;

        let rows = sqlx::query(
            r"
                SELECT quiz_id, score, submitted_at
                FROM quiz_history
                WHERE user_id = ?1
                ORDER BY submitted_at ASC, id ASC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut history = Vec::with_capacity(rows.len());
        for row in rows {
            history.push(map_history_row(&row)?);
        }

        Ok(Some(UserProfile {
            user_id: user_id.clone(),
            points,
            history,
        }))
    }
}
