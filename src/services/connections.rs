use serde::Serialize;
use sqlx::PgPool;

use crate::database::models::{ConnectionTrip, PublicProfile, UserProfile};
use crate::database::DatabaseManager;
use crate::error::{is_unique_violation, ApiError};

/// A user's corner of the social graph: profile, liked trips and the
/// follow edges in both directions.
#[derive(Debug, Serialize)]
pub struct Connections {
    #[serde(flatten)]
    pub user: UserProfile,
    pub liked_trips: Vec<i64>,
    pub following: Vec<PublicProfile>,
    pub followers: Vec<PublicProfile>,
}

/// Social graph store: follow/unfollow and connection reads.
///
/// Every edge mutation updates the denormalized counters inside the same
/// transaction as the edge itself; the unique constraint on
/// (follower_id, followee_id) is what makes concurrent duplicate
/// requests safe, the application pre-check only shapes the message.
pub struct ConnectionService {
    pool: PgPool,
}

impl ConnectionService {
    pub async fn new() -> Result<Self, ApiError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Look up a user's public profile by username.
    pub async fn get_user_by_username(&self, username: &str) -> Result<PublicProfile, ApiError> {
        let profile = sqlx::query_as::<_, PublicProfile>(
            r#"
            SELECT id AS user_id, username, bio, avatar_pic_url, follow_count, follower_count
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        profile.ok_or_else(|| ApiError::not_found(format!("Unable to find user {}", username)))
    }

    /// Full connection view for a user: profile fields, liked trip ids,
    /// and the public profiles of everyone they follow and are followed
    /// by. List order is unspecified.
    pub async fn get_connections(&self, user_id: i64) -> Result<Connections, ApiError> {
        let user = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id AS user_id, username, bio, avatar_pic_url, member_status,
                   follow_count, follower_count
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No user found with id of {}", user_id)))?;

        let liked_trips: Vec<(i64,)> =
            sqlx::query_as("SELECT trip_id FROM likes WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        let following = sqlx::query_as::<_, PublicProfile>(
            r#"
            SELECT users.id AS user_id, username, bio, avatar_pic_url,
                   follow_count, follower_count
            FROM users
            JOIN follows ON users.id = follows.followee_id
            WHERE follows.follower_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let followers = sqlx::query_as::<_, PublicProfile>(
            r#"
            SELECT users.id AS user_id, username, bio, avatar_pic_url,
                   follow_count, follower_count
            FROM users
            JOIN follows ON users.id = follows.follower_id
            WHERE follows.followee_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Connections {
            user,
            liked_trips: liked_trips.into_iter().map(|(id,)| id).collect(),
            following,
            followers,
        })
    }

    /// Insert a follow edge and bump both counters as one transaction.
    pub async fn follow(&self, follower_id: i64, followee_id: i64) -> Result<(), ApiError> {
        if follower_id == followee_id {
            return Err(ApiError::bad_request("Users cannot follow themselves"));
        }

        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM follows WHERE follower_id = $1 AND followee_id = $2",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            return Err(ApiError::conflict(format!(
                "User {} is already following user {}",
                follower_id, followee_id
            )));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO follows (follower_id, followee_id) VALUES ($1, $2)")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    // Lost the race against an identical concurrent request
                    ApiError::conflict(format!(
                        "User {} is already following user {}",
                        follower_id, followee_id
                    ))
                } else {
                    ApiError::from(e)
                }
            })?;

        sqlx::query("UPDATE users SET follow_count = follow_count + 1 WHERE id = $1")
            .bind(follower_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET follower_count = follower_count + 1 WHERE id = $1")
            .bind(followee_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete a follow edge and decrement both counters as one
    /// transaction. The decrement is symmetric: the follower's
    /// follow_count and the followee's follower_count both shrink.
    pub async fn unfollow(&self, follower_id: i64, followee_id: i64) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2",
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(&mut *tx)
        .await?;

        if deleted.rows_affected() == 0 {
            return Err(ApiError::not_found(format!(
                "No connection between users {} and {}",
                follower_id, followee_id
            )));
        }

        sqlx::query("UPDATE users SET follow_count = follow_count - 1 WHERE id = $1")
            .bind(follower_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET follower_count = follower_count - 1 WHERE id = $1")
            .bind(followee_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Activity feed: trips belonging to everyone the user follows,
    /// annotated with the owner's public profile fields and like count.
    pub async fn get_connections_trips(
        &self,
        user_id: i64,
    ) -> Result<Vec<ConnectionTrip>, ApiError> {
        let trips = sqlx::query_as::<_, ConnectionTrip>(
            r#"
            SELECT users.id AS user_id, users.username, users.avatar_pic_url,
                   trips.id AS trip_id, trips.waypoint_names, trips.start_point,
                   trips.end_point, trips.photo, trips.like_count
            FROM users
            JOIN trips ON users.id = trips.user_id
            JOIN follows ON users.id = follows.followee_id
            WHERE follows.follower_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(trips)
    }
}
