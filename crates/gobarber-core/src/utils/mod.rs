//! Utility functions for string formatting.

pub mod format;

pub use format::{mask_token, truncate_string};
