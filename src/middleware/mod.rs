pub mod auth;
pub mod response;

pub use auth::{
    authenticate, ensure_admin, ensure_logged_in, ensure_owner_or_admin, resolve_target_user,
    AuthUser, Identity,
};
pub use response::{ApiResponse, ApiResult};
