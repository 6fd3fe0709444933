//! Profile editing: the `PUT /profile` and `PATCH /users/avatar` exchanges
//! whose results replace the session's identity.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::api::ApiError;
use crate::auth::{SessionError, SessionStore};
use crate::models::Identity;
use crate::storage::KeyValueStore;
use crate::validation::{ProfileForm, Validate, ValidationErrors};

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Invalid profile: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Failed to read avatar file {path}: {source}")]
    AvatarFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ApiError> for ProfileError {
    fn from(e: ApiError) -> Self {
        ProfileError::Session(SessionError::Api(e))
    }
}

/// Validate the form, send it, and store the returned identity in the session
pub async fn update_profile<S: KeyValueStore>(
    store: &mut SessionStore<S>,
    form: &ProfileForm,
) -> Result<Identity, ProfileError> {
    store.require_identity()?;
    form.validate()?;

    let update = form.to_update();
    let identity = store.api().update_profile(&update).await?;
    let identity = store.update_identity(identity)?.clone();
    info!(user_id = %identity.id, password_changed = update.changes_password(), "Profile updated");
    Ok(identity)
}

/// Upload an image file as the new avatar and store the returned identity
pub async fn update_avatar<S: KeyValueStore>(
    store: &mut SessionStore<S>,
    path: &Path,
) -> Result<Identity, ProfileError> {
    store.require_identity()?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ProfileError::AvatarFile {
            path: path.to_path_buf(),
            source,
        })?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("avatar");
    let mime = mime_for(path);
    debug!(file_name, mime, size = bytes.len(), "Read avatar file");

    let identity = store.api().update_avatar(file_name, bytes, mime).await?;
    let identity = store.update_identity(identity)?.clone();
    info!(user_id = %identity.id, "Avatar updated");
    Ok(identity)
}

/// Content type from the file extension; the backend only stores the bytes
fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
