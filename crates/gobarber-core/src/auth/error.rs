use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The credential exchange failed; the backend's error is passed through as-is
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Identity is missing required field `{0}`")]
    InvalidIdentity(&'static str),

    #[error("No active session - sign in first")]
    NotAuthenticated,

    #[error("Failed to persist session: {0}")]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Short message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
