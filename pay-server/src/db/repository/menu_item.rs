//! Menu Item Repository (只读参照数据)

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::MenuItem;
use std::collections::HashMap;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

const MENU_TABLE: &str = "menu_item";

#[derive(Clone)]
pub struct MenuItemRepository {
    base: BaseRepository,
}

impl MenuItemRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<MenuItem>> {
        let item: Option<MenuItem> = self.base.db().select((MENU_TABLE, id)).await?;
        Ok(item)
    }

    /// Batch-resolve menu items, keyed by record key
    ///
    /// 不存在的 id 直接缺席于结果 — 调用方决定跳过还是报错。
    pub async fn find_by_ids(&self, ids: &[String]) -> RepoResult<HashMap<String, MenuItem>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let record_ids: Vec<RecordId> = ids
            .iter()
            .map(|id| RecordId::from_table_key(MENU_TABLE, id))
            .collect();

        let items: Vec<MenuItem> = self
            .base
            .db()
            .query("SELECT * FROM menu_item WHERE id INSIDE $ids")
            .bind(("ids", record_ids))
            .await?
            .take(0)?;

        let mut by_key = HashMap::new();
        for item in items {
            if let Some(id) = &item.id {
                by_key.insert(id.key().to_string(), item);
            }
        }
        Ok(by_key)
    }

    /// Create a menu item with an explicit key (seeding / tests)
    pub async fn create(&self, id: &str, item: MenuItem) -> RepoResult<MenuItem> {
        let created: Option<MenuItem> = self
            .base
            .db()
            .create((MENU_TABLE, id))
            .content(item)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create menu item".to_string()))
    }
}
