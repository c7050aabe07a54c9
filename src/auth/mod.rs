use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

/// Signed identity assertion carried in the Authorization header.
///
/// Tokens are regenerated on each login and carry no expiry at this
/// layer; expiry policy is a deployment concern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: i64,
    pub is_admin: bool,
}

impl Claims {
    pub fn new(user_id: i64, is_admin: bool) -> Self {
        Self { user_id, is_admin }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Return a signed JWT for `{user_id, is_admin}`.
pub fn issue_token(user_id: i64, is_admin: bool) -> Result<String, TokenError> {
    let secret = &config::config().security.jwt_secret;
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::default(), &Claims::new(user_id, is_admin), &encoding_key)
        .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Verify a signed token and recover the identity it asserts.
/// Fails if the signature is invalid or the payload is malformed.
pub fn verify_token(token: &str) -> Result<Claims, TokenError> {
    let secret = &config::config().security.jwt_secret;
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    // No exp claim is issued, so exp validation must be disabled here.
    let mut validation = Validation::default();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            tracing::debug!("Token verification failed: {}", e);
            TokenError::InvalidToken
        })?;

    Ok(token_data.claims)
}
