use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A trip row. Content fields are managed by the trip-management API;
/// this core only touches `like_count`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub trip_id: i64,
    pub user_id: i64,
    pub waypoint_names: String,
    pub start_point: String,
    pub end_point: String,
    pub photo: Option<String>,
    pub like_count: i64,
}

/// A followee's trip annotated with the owner's public profile fields,
/// as returned by the connections activity feed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConnectionTrip {
    pub user_id: i64,
    pub username: String,
    pub avatar_pic_url: Option<String>,
    pub trip_id: i64,
    pub waypoint_names: String,
    pub start_point: String,
    pub end_point: String,
    pub photo: Option<String>,
    pub like_count: i64,
}
