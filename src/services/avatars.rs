use std::path::Path;

use sqlx::PgPool;
use tracing::info;

use crate::config;
use crate::database::DatabaseManager;
use crate::error::ApiError;

/// File-storage collaborator for avatar uploads: accepts bytes, writes
/// them under the configured directory keyed by user id, and records
/// the retrievable path on the user row.
pub struct AvatarService {
    pool: PgPool,
}

impl AvatarService {
    pub async fn new() -> Result<Self, ApiError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn store(
        &self,
        user_id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, ApiError> {
        let filename = sanitize_filename(filename)
            .ok_or_else(|| ApiError::bad_request("Invalid avatar filename"))?;

        let dir = &config::config().storage.avatar_dir;
        let relative_path = format!("{}/{}_{}", dir, user_id, filename);

        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            tracing::error!("Failed to create avatar directory {}: {}", dir, e);
            ApiError::internal_server_error("Failed to store avatar")
        })?;

        tokio::fs::write(&relative_path, bytes).await.map_err(|e| {
            tracing::error!("Failed to write avatar {}: {}", relative_path, e);
            ApiError::internal_server_error("Failed to store avatar")
        })?;

        let updated = sqlx::query("UPDATE users SET avatar_pic_url = $1 WHERE id = $2")
            .bind(&relative_path)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(ApiError::not_found(format!(
                "No user found with id of {}",
                user_id
            )));
        }

        info!("Stored avatar for user {} at {}", user_id, relative_path);
        Ok(relative_path)
    }
}

/// Reduce a client-supplied filename to its final path component and
/// reject anything that could escape the storage directory.
fn sanitize_filename(filename: &str) -> Option<String> {
    let name = Path::new(filename).file_name()?.to_str()?;
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    if name.chars().all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-')) {
        Some(name.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_plain_names() {
        assert_eq!(sanitize_filename("me.png"), Some("me.png".to_string()));
        assert_eq!(sanitize_filename("photo_1-a.jpg"), Some("photo_1-a.jpg".to_string()));
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("a/b/me.png"), Some("me.png".to_string()));
    }

    #[test]
    fn sanitize_rejects_traversal_and_garbage() {
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("a b.png"), None);
    }
}
