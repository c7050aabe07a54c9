use std::collections::HashMap;

use axum::extract::Path;
use axum::Json;
use serde_json::{json, Value};

use crate::database::models::Message;
use crate::error::ApiError;
use crate::middleware::{
    ensure_logged_in, ensure_owner_or_admin, resolve_target_user, ApiResponse, ApiResult, Identity,
};
use crate::services::{ConversationMessage, MessageService, NewMessage};

const MAX_MESSAGE_LEN: usize = 350;

fn validate_msg_txt(text: &str) -> Result<(), ApiError> {
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(ApiError::bad_request(format!(
            "Message text must be {} characters or fewer",
            MAX_MESSAGE_LEN
        )));
    }
    Ok(())
}

/// GET /messages/:to_user_id/:from_user_id - one conversation, oldest first
///
/// Authorization: the from-party or an admin
pub async fn conversation_get(
    identity: Identity,
    Path((to_user_id, from_user_id)): Path<(i64, i64)>,
) -> ApiResult<Vec<ConversationMessage>> {
    ensure_owner_or_admin(&identity, Some(from_user_id))?;

    let messages = MessageService::new()
        .await?
        .get(to_user_id, from_user_id)
        .await?;

    Ok(ApiResponse::success(messages))
}

/// POST /messages/create - send a message to another user
///
/// Authorization: logged in
pub async fn message_post(identity: Identity, Json(body): Json<NewMessage>) -> ApiResult<Message> {
    ensure_logged_in(&identity)?;
    validate_msg_txt(&body.msg_txt)?;

    let created_msg = MessageService::new().await?.create_message(body).await?;

    Ok(ApiResponse::created(created_msg))
}

/// PATCH /messages/edit/:msg_id - edit a message's text
///
/// Body: {"user_id": <owning party>, "new_msg_txt": "..."}. The target
/// of the ownership check is resolved from the body.
///
/// Authorization: correct user or admin
pub async fn message_patch(
    identity: Identity,
    Path(msg_id): Path<i64>,
    Json(body): Json<Value>,
) -> ApiResult<Message> {
    let target = resolve_target_user(&HashMap::new(), Some(&body));
    ensure_owner_or_admin(&identity, target)?;

    let new_msg_txt = body
        .get("new_msg_txt")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::bad_request("new_msg_txt is required"))?;
    validate_msg_txt(new_msg_txt)?;

    let edited_msg = MessageService::new().await?.edit(msg_id, new_msg_txt).await?;

    Ok(ApiResponse::success(edited_msg))
}

/// DELETE /messages/delete/:msg_id
///
/// Body: {"user_id": <owning party>}, resolved like message_patch.
///
/// Authorization: correct user or admin
pub async fn message_delete(
    identity: Identity,
    Path(msg_id): Path<i64>,
    body: Option<Json<Value>>,
) -> ApiResult<Value> {
    let target = resolve_target_user(&HashMap::new(), body.as_deref());
    ensure_owner_or_admin(&identity, target)?;

    MessageService::new().await?.delete(msg_id).await?;

    Ok(ApiResponse::success(json!({
        "deleted": format!("Message {}", msg_id)
    })))
}
