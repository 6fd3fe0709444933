//! Core library for the GoBarber client.
//!
//! - [`api`]: HTTP client for the GoBarber backend with a shared default
//!   `Authorization` header
//! - [`auth`]: the session store (sign-in, sign-out, identity updates) and its
//!   persisted mirror
//! - [`storage`]: key-value persistence backends (file, OS keychain, memory)
//! - [`models`]: wire types exchanged with the backend
//! - [`validation`]: form rules for sign-in, sign-up, password recovery and
//!   profile editing
//! - [`profile`], [`dashboard`]: thin services built on the API client
//! - [`routes`]: route table and the private/public gate

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod profile;
pub mod routes;
pub mod storage;
pub mod utils;
pub mod validation;

pub use api::{ApiClient, ApiError};
pub use auth::{SessionError, SessionState, SessionStore};
pub use config::Config;
pub use models::Identity;
pub use storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore, StorageError};
