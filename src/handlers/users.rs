use axum::body::Bytes;
use axum::extract::{Path, Query};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::{ConnectionTrip, PublicProfile};
use crate::middleware::{
    ensure_logged_in, ensure_owner_or_admin, ApiResponse, ApiResult, Identity,
};
use crate::services::{AvatarService, ConnectionService, Connections, EngagementService};

/// GET /users/by-username/:username - look up a user's public profile
///
/// Authorization: logged in
pub async fn user_get(
    identity: Identity,
    Path(username): Path<String>,
) -> ApiResult<PublicProfile> {
    ensure_logged_in(&identity)?;

    let found_user = ConnectionService::new()
        .await?
        .get_user_by_username(&username)
        .await?;

    Ok(ApiResponse::success(found_user))
}

/// GET /users/:user_id/connections - a user's followers and following
///
/// Authorization: correct user or admin
pub async fn connections_get(identity: Identity, Path(user_id): Path<i64>) -> ApiResult<Connections> {
    ensure_owner_or_admin(&identity, Some(user_id))?;

    let user_data = ConnectionService::new()
        .await?
        .get_connections(user_id)
        .await?;

    Ok(ApiResponse::success(user_data))
}

/// GET /users/:user_id/connections/trips - activity feed of followees' trips
///
/// Authorization: correct user or admin
pub async fn connections_trips_get(
    identity: Identity,
    Path(user_id): Path<i64>,
) -> ApiResult<Vec<ConnectionTrip>> {
    ensure_owner_or_admin(&identity, Some(user_id))?;

    let following_trips = ConnectionService::new()
        .await?
        .get_connections_trips(user_id)
        .await?;

    Ok(ApiResponse::success(following_trips))
}

/// POST /users/:user_id/follow/:followee_id
///
/// Authorization: correct user or admin
pub async fn follow_post(
    identity: Identity,
    Path((user_id, followee_id)): Path<(i64, i64)>,
) -> ApiResult<Value> {
    ensure_owner_or_admin(&identity, Some(user_id))?;

    ConnectionService::new()
        .await?
        .follow(user_id, followee_id)
        .await?;

    Ok(ApiResponse::created(json!({
        "follower_id": user_id,
        "followee_id": followee_id
    })))
}

/// DELETE /users/:user_id/unfollow/:followee_id
///
/// Authorization: correct user or admin
pub async fn unfollow_delete(
    identity: Identity,
    Path((user_id, followee_id)): Path<(i64, i64)>,
) -> ApiResult<Value> {
    ensure_owner_or_admin(&identity, Some(user_id))?;

    ConnectionService::new()
        .await?
        .unfollow(user_id, followee_id)
        .await?;

    Ok(ApiResponse::success(json!({
        "unfollowed": format!("User {} unfollowed user {}", user_id, followee_id)
    })))
}

/// POST /users/:user_id/like/:trip_id
///
/// Authorization: correct user or admin
pub async fn like_post(
    identity: Identity,
    Path((user_id, trip_id)): Path<(i64, i64)>,
) -> ApiResult<Value> {
    ensure_owner_or_admin(&identity, Some(user_id))?;

    EngagementService::new()
        .await?
        .add_like(user_id, trip_id)
        .await?;

    Ok(ApiResponse::created(json!({
        "user_id": user_id,
        "trip_id": trip_id
    })))
}

/// DELETE /users/:user_id/unlike/:trip_id
///
/// Authorization: correct user or admin
pub async fn unlike_delete(
    identity: Identity,
    Path((user_id, trip_id)): Path<(i64, i64)>,
) -> ApiResult<Value> {
    ensure_owner_or_admin(&identity, Some(user_id))?;

    EngagementService::new().await?.unlike(user_id, trip_id).await?;

    Ok(ApiResponse::success(json!({
        "user_id": user_id,
        "trip_id": trip_id
    })))
}

#[derive(Debug, Deserialize)]
pub struct AvatarQuery {
    pub filename: String,
}

/// POST /users/:user_id/avatar?filename=... - upload a profile picture
///
/// The raw request body is the file content; multipart plumbing is left
/// to clients and proxies.
///
/// Authorization: correct user or admin
pub async fn avatar_post(
    identity: Identity,
    Path(user_id): Path<i64>,
    Query(query): Query<AvatarQuery>,
    body: Bytes,
) -> ApiResult<Value> {
    ensure_owner_or_admin(&identity, Some(user_id))?;

    let avatar_pic_url = AvatarService::new()
        .await?
        .store(user_id, &query.filename, &body)
        .await?;

    Ok(ApiResponse::created(json!({ "avatar_pic_url": avatar_pic_url })))
}
