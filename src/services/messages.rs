use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::models::message::{conversation_id, pair_key, Message};
use crate::database::DatabaseManager;
use crate::error::ApiError;

/// Messages older than this are permanently excluded from retrieval.
/// Soft expiry by query filter, not deletion.
const RETRIEVAL_WINDOW_DAYS: i64 = 10;

/// Oldest creation time still retrievable at `now`.
fn retrieval_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(RETRIEVAL_WINDOW_DAYS)
}

#[derive(Debug, Deserialize)]
pub struct NewMessage {
    pub msg_txt: String,
    pub to_user_id: i64,
    pub from_user_id: i64,
}

/// A message in a conversation view, annotated with the sender's avatar.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConversationMessage {
    pub id: i64,
    pub msg_txt: String,
    pub to_user_id: i64,
    pub from_user_id: i64,
    pub conversation_id: String,
    pub created_on: DateTime<Utc>,
    pub from_user_avatar: Option<String>,
}

/// Conversation service: threaded direct messages between user pairs.
pub struct MessageService {
    pool: PgPool,
}

impl MessageService {
    pub async fn new() -> Result<Self, ApiError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// All messages of the logical thread between two users, regardless
    /// of which direction each message was sent in, restricted to the
    /// retrieval window and ordered oldest first.
    pub async fn get(
        &self,
        to_user_id: i64,
        from_user_id: i64,
    ) -> Result<Vec<ConversationMessage>, ApiError> {
        let cutoff = retrieval_cutoff(Utc::now());

        let messages = sqlx::query_as::<_, ConversationMessage>(
            r#"
            SELECT messages.id, messages.msg_txt, messages.to_user_id,
                   messages.from_user_id, messages.conversation_id, messages.created_on,
                   users.avatar_pic_url AS from_user_avatar
            FROM messages
            JOIN users ON messages.from_user_id = users.id
            WHERE messages.pair_key = $1 AND messages.created_on >= $2
            ORDER BY messages.created_on ASC
            "#,
        )
        .bind(pair_key(to_user_id, from_user_id))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Create a message. The conversation id is bound to the argument
    /// order given here; the stored pair key keeps the thread
    /// addressable from either direction.
    pub async fn create_message(&self, data: NewMessage) -> Result<Message, ApiError> {
        if data.to_user_id == data.from_user_id {
            return Err(ApiError::bad_request("Cannot send a message to yourself"));
        }

        let created = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (msg_txt, to_user_id, from_user_id, conversation_id, pair_key)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, msg_txt, to_user_id, from_user_id, conversation_id, created_on
            "#,
        )
        .bind(&data.msg_txt)
        .bind(data.to_user_id)
        .bind(data.from_user_id)
        .bind(conversation_id(data.to_user_id, data.from_user_id))
        .bind(pair_key(data.to_user_id, data.from_user_id))
        .fetch_optional(&self.pool)
        .await?;

        // Defensive: an insert that returns no row is a storage anomaly
        created.ok_or_else(|| {
            ApiError::not_found(format!(
                "Was not able to create a message for user {}",
                data.to_user_id
            ))
        })
    }

    /// Replace the text of an existing message. Ownership is enforced
    /// upstream by the authorization gate.
    pub async fn edit(&self, msg_id: i64, new_msg_txt: &str) -> Result<Message, ApiError> {
        let edited = sqlx::query_as::<_, Message>(
            r#"
            UPDATE messages
            SET msg_txt = $1
            WHERE id = $2
            RETURNING id, msg_txt, to_user_id, from_user_id, conversation_id, created_on
            "#,
        )
        .bind(new_msg_txt)
        .bind(msg_id)
        .fetch_optional(&self.pool)
        .await?;

        edited.ok_or_else(|| {
            ApiError::not_found(format!("Was not able to find message {} to edit", msg_id))
        })
    }

    /// Delete a message. No cascading side effects.
    pub async fn delete(&self, msg_id: i64) -> Result<(), ApiError> {
        let deleted = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(msg_id)
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(ApiError::not_found(format!(
                "No message found with id {}",
                msg_id
            )));
        }
        Ok(())
    }
}
