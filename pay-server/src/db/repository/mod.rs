//! Repository Module
//!
//! Provides data access for SurrealDB tables. 每张表一个 repository，
//! handler 层不直接写 SurrealQL。

pub mod consumption_log;
pub mod inventory;
pub mod menu_item;
pub mod order;
pub mod user;

// Re-exports
pub use consumption_log::{ConsumptionLogRepository, OutflowEntry};
pub use inventory::{InventoryRepository, StockDelta};
pub use menu_item::MenuItemRepository;
pub use order::OrderRepository;
pub use user::UserRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for shared::error::AppError {
    fn from(err: RepoError) -> Self {
        use shared::error::AppError;
        match err {
            RepoError::NotFound(msg) => AppError::not_found(msg),
            RepoError::Duplicate(msg) => {
                AppError::with_message(shared::error::ErrorCode::AlreadyExists, msg)
            }
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Database(msg) => AppError::database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Shared database handle wrapper used by all repositories
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
