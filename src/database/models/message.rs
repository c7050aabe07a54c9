use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A direct message between two users.
///
/// `conversation_id` is bound to the argument order the message was
/// created with ("<to>-<from>"), so the two directions of one thread
/// carry different conversation ids. Retrieval therefore goes through
/// the order-independent pair key instead.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub msg_txt: String,
    pub to_user_id: i64,
    pub from_user_id: i64,
    pub conversation_id: String,
    pub created_on: DateTime<Utc>,
}

/// Externally visible composite key, in the argument order given.
pub fn conversation_id(to_user_id: i64, from_user_id: i64) -> String {
    format!("{}-{}", to_user_id, from_user_id)
}

/// Order-independent key addressing the logical thread between two users.
pub fn pair_key(a: i64, b: i64) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{}-{}", lo, hi)
}
