//! REST API client module for the GoBarber backend.
//!
//! This module provides the `ApiClient` used by the session store and the
//! profile and dashboard services. Authenticated endpoints expect a JWT
//! bearer token obtained from `POST /sessions`; the client keeps it as a
//! default header shared by every clone.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
