use sqlx::PgPool;

use crate::database::DatabaseManager;
use crate::error::{is_unique_violation, ApiError};

/// Engagement store: liking and unliking trips.
///
/// The trip's cached like_count moves in the same transaction as the
/// like row, so a partial application is never visible.
pub struct EngagementService {
    pool: PgPool,
}

impl EngagementService {
    pub async fn new() -> Result<Self, ApiError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Like a trip. Fails with Conflict when the like already exists.
    pub async fn add_like(&self, user_id: i64, trip_id: i64) -> Result<(), ApiError> {
        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM likes WHERE user_id = $1 AND trip_id = $2")
                .bind(user_id)
                .bind(trip_id)
                .fetch_optional(&self.pool)
                .await?;

        if existing.is_some() {
            return Err(ApiError::conflict(format!(
                "User has already liked trip {}",
                trip_id
            )));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO likes (user_id, trip_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(trip_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ApiError::conflict(format!("User has already liked trip {}", trip_id))
                } else {
                    ApiError::from(e)
                }
            })?;

        sqlx::query("UPDATE trips SET like_count = like_count + 1 WHERE id = $1")
            .bind(trip_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Remove a like. Fails with NotFound when no such like exists, so
    /// a double unlike can never drive like_count negative.
    pub async fn unlike(&self, user_id: i64, trip_id: i64) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND trip_id = $2")
            .bind(user_id)
            .bind(trip_id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(ApiError::not_found(format!(
                "Couldn't unlike trip {}: no like by user {}",
                trip_id, user_id
            )));
        }

        sqlx::query("UPDATE trips SET like_count = like_count - 1 WHERE id = $1")
            .bind(trip_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// All trip ids a user has liked, unordered.
    pub async fn get_liked_trips(&self, user_id: i64) -> Result<Vec<i64>, ApiError> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT trip_id FROM likes WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
