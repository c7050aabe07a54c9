use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full profile of the requesting user, including denormalized counters.
/// `follow_count`/`follower_count` are caches over the follows relation
/// and are maintained inside the same transaction as every edge mutation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: i64,
    pub username: String,
    pub bio: String,
    pub avatar_pic_url: Option<String>,
    pub member_status: String,
    pub follow_count: i64,
    pub follower_count: i64,
}

/// Public profile fields exposed for adjacent users (following/followers
/// lists, trip owners, username lookup).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicProfile {
    pub user_id: i64,
    pub username: String,
    pub bio: String,
    pub avatar_pic_url: Option<String>,
    pub follow_count: i64,
    pub follower_count: i64,
}
