//! User Directory Repository

use super::{BaseRepository, RepoResult};
use crate::db::models::User;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const USER_TABLE: &str = "user";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find a directory entry by its record key
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let user: Option<User> = self.base.db().select((USER_TABLE, id)).await?;
        Ok(user)
    }

    /// Create a directory entry with an explicit key (seeding / tests)
    pub async fn create(&self, id: &str, user: User) -> RepoResult<User> {
        let created: Option<User> = self
            .base
            .db()
            .create((USER_TABLE, id))
            .content(user)
            .await?;
        created.ok_or_else(|| super::RepoError::Database("Failed to create user".to_string()))
    }
}
