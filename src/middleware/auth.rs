use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::auth::{self, Claims};
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub is_admin: bool,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            is_admin: claims.is_admin,
        }
    }
}

/// Identification middleware applied to every route.
///
/// Advisory only: a valid token attaches an identity to the request, an
/// absent or invalid one leaves the request anonymous. Rejection is the
/// job of the gate functions below, so public endpoints can run
/// unauthenticated.
pub async fn authenticate(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    if let Some(token) = extract_token_from_headers(&headers) {
        match auth::verify_token(&token) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthUser::from(claims));
            }
            Err(e) => {
                tracing::debug!("Ignoring invalid Authorization header: {}", e);
            }
        }
    }
    next.run(request).await
}

/// Extract the token from the Authorization header. Accepts both the
/// Bearer scheme and a raw token value.
fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Optional caller identity, handed to each handler as an explicit value.
#[derive(Clone, Debug, Default)]
pub struct Identity(pub Option<AuthUser>);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Identity(parts.extensions.get::<AuthUser>().cloned()))
    }
}

/// Fails with Unauthorized when no identity is attached.
pub fn ensure_logged_in(identity: &Identity) -> Result<&AuthUser, ApiError> {
    identity
        .0
        .as_ref()
        .ok_or_else(|| ApiError::unauthorized("Must be logged in"))
}

/// Fails with Unauthorized unless the caller is an admin.
pub fn ensure_admin(identity: &Identity) -> Result<&AuthUser, ApiError> {
    let user = ensure_logged_in(identity)?;
    if user.is_admin {
        Ok(user)
    } else {
        Err(ApiError::unauthorized("Must be an admin"))
    }
}

/// Fails with Unauthorized unless the caller is an admin or the caller's
/// id equals the target user id. The check is by id equality, never by
/// username. An unresolved target only lets admins through.
pub fn ensure_owner_or_admin(
    identity: &Identity,
    target_user_id: Option<i64>,
) -> Result<&AuthUser, ApiError> {
    let user = ensure_logged_in(identity)?;
    if user.is_admin {
        return Ok(user);
    }
    match target_user_id {
        Some(id) if id == user.user_id => Ok(user),
        _ => Err(ApiError::unauthorized("Must be the correct user or an admin")),
    }
}

/// Resolve the user a request addresses, for ownership checks.
///
/// Precedence: `user_id` path parameter, then `from_user_id` path
/// parameter, then the same fields in the request body.
pub fn resolve_target_user(
    path_params: &HashMap<String, String>,
    body: Option<&Value>,
) -> Option<i64> {
    if let Some(id) = path_params.get("user_id").and_then(|v| v.parse().ok()) {
        return Some(id);
    }
    if let Some(id) = path_params.get("from_user_id").and_then(|v| v.parse().ok()) {
        return Some(id);
    }
    let body = body?;
    if let Some(id) = body.get("from_user_id").and_then(Value::as_i64) {
        return Some(id);
    }
    body.get("user_id").and_then(Value::as_i64)
}
