//! Shared types for the pay server
//!
//! Common types used across crates: the unified error system
//! ([`error`]) and its API response structure.

pub mod error;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
