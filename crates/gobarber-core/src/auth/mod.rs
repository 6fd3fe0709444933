//! Authentication module: the session store.
//!
//! `SessionStore` is the single authority for who is signed in. It mirrors
//! the token and identity into a `KeyValueStore` so a restart restores the
//! session, and keeps the API client's default `Authorization` header in
//! step with the in-memory state.

pub mod error;
pub mod session;

pub use error::SessionError;
pub use session::{SessionState, SessionStore, TOKEN_KEY, USER_KEY};
