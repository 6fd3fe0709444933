use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::models::{Identity, SessionResponse};
use crate::storage::{KeyValueStore, StorageError};
use crate::utils::mask_token;

use super::SessionError;

/// Persistence key holding the raw bearer token
pub const TOKEN_KEY: &str = "@GoBarber:token";

/// Persistence key holding the serialized identity
pub const USER_KEY: &str = "@GoBarber:user";

/// Who is signed in. Token and identity only ever exist together.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated { token: String, identity: Identity },
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Unauthenticated => f.write_str("Unauthenticated"),
            SessionState::Authenticated { token, identity } => f
                .debug_struct("Authenticated")
                .field("token", &mask_token(token))
                .field("identity", identity)
                .finish(),
        }
    }
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated { token, .. } => Some(token),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated { identity, .. } => Some(identity),
            SessionState::Unauthenticated => None,
        }
    }
}

/// Owns the current session and its persisted mirror.
///
/// The only constructor is [`SessionStore::initialize`], so every store in
/// existence has already restored its state from storage. Consumers receive
/// the store by reference from whoever built it.
pub struct SessionStore<S> {
    storage: S,
    api: ApiClient,
    state: SessionState,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Restore the session from storage. Never touches the network.
    ///
    /// Both keys must be present and the identity must parse; anything else
    /// starts unauthenticated. On success the API client's default
    /// `Authorization` header is set.
    pub fn initialize(storage: S, api: ApiClient) -> Self {
        let state = Self::restore(&storage);
        if let SessionState::Authenticated { token, identity } = &state {
            api.set_token(token);
            debug!(user_id = %identity.id, "Session restored from storage");
        } else {
            debug!("No stored session");
        }
        Self { storage, api, state }
    }

    fn restore(storage: &S) -> SessionState {
        let token = Self::read_key(storage, TOKEN_KEY);
        let user = Self::read_key(storage, USER_KEY);

        let (Some(token), Some(user)) = (token, user) else {
            return SessionState::Unauthenticated;
        };

        match serde_json::from_str::<Identity>(&user) {
            Ok(identity) if identity.validate().is_ok() => {
                SessionState::Authenticated { token, identity }
            }
            Ok(identity) => {
                warn!(field = ?identity.validate().err(), "Stored identity is incomplete, ignoring session");
                SessionState::Unauthenticated
            }
            Err(e) => {
                warn!(error = %e, "Stored identity is not valid JSON, ignoring session");
                SessionState::Unauthenticated
            }
        }
    }

    fn read_key(storage: &S, key: &str) -> Option<String> {
        match storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read session key");
                None
            }
        }
    }

    /// Exchange credentials for a session.
    ///
    /// On success the token and identity are persisted, the default header is
    /// set and the in-memory state replaced, in that order. A failed exchange
    /// returns the API error untouched and mutates nothing. An identity that
    /// `initialize` would refuse to restore is rejected the same way.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<&Identity, SessionError> {
        let SessionResponse { token, user } = self.api.create_session(email, password).await?;
        user.validate().map_err(SessionError::InvalidIdentity)?;

        self.persist(&token, &user)?;
        self.api.set_token(&token);
        info!(user_id = %user.id, token = %mask_token(&token), "Signed in");

        self.state = SessionState::Authenticated {
            token,
            identity: user,
        };
        self.require_identity()
    }

    /// Write both keys. If the identity write fails the token key is put
    /// back to what it held before, so storage keeps matching memory.
    fn persist(&mut self, token: &str, identity: &Identity) -> Result<(), SessionError> {
        let serialized = serde_json::to_string(identity).map_err(StorageError::from)?;
        let previous = self.storage.get(TOKEN_KEY)?;
        self.storage.set(TOKEN_KEY, token)?;
        if let Err(e) = self.storage.set(USER_KEY, &serialized) {
            let rollback = match &previous {
                Some(old) => self.storage.set(TOKEN_KEY, old),
                None => self.storage.remove(TOKEN_KEY),
            };
            if let Err(rollback) = rollback {
                warn!(error = %rollback, "Failed to roll back token after identity write failed");
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// End the session. Always succeeds and is idempotent; storage failures
    /// are logged, the in-memory state is cleared regardless.
    pub fn sign_out(&mut self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to remove session key");
            }
        }
        self.api.clear_token();

        if let SessionState::Authenticated { identity, .. } = &self.state {
            info!(user_id = %identity.id, "Signed out");
        }
        self.state = SessionState::Unauthenticated;
    }

    /// Replace the signed-in identity, keeping the token.
    ///
    /// Used after a successful profile or avatar update. Only the identity
    /// key is rewritten.
    pub fn update_identity(&mut self, identity: Identity) -> Result<&Identity, SessionError> {
        identity.validate().map_err(SessionError::InvalidIdentity)?;

        let SessionState::Authenticated { identity: current, .. } = &mut self.state else {
            return Err(SessionError::NotAuthenticated);
        };

        let serialized = serde_json::to_string(&identity).map_err(StorageError::from)?;
        self.storage.set(USER_KEY, &serialized)?;
        debug!(user_id = %identity.id, "Identity updated");

        *current = identity;
        Ok(&*current)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.state.identity()
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token()
    }

    /// Identity for operations that need a session
    pub fn require_identity(&self) -> Result<&Identity, SessionError> {
        self.state.identity().ok_or(SessionError::NotAuthenticated)
    }

    /// The shared API client, carrying this session's default header
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Give the storage back, e.g. to simulate a restart
    pub fn into_storage(self) -> S {
        self.storage
    }
}
