//! Inventory Ledger Repository
//!
//! 库存数量只通过 `stock_quantity += Δ` 修改。一个订单的全部扣减
//! 打包进同一个事务，并发结算不会丢更新，也不需要全局锁。

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{InventoryItem, InventoryItemCreate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

const INVENTORY_TABLE: &str = "inventory";

/// One signed stock mutation (negative = consumption)
#[derive(Debug, Clone)]
pub struct StockDelta {
    pub item_id: String,
    pub delta: Decimal,
}

#[derive(Clone)]
pub struct InventoryRepository {
    base: BaseRepository,
}

impl InventoryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<InventoryItem>> {
        let item: Option<InventoryItem> = self.base.db().select((INVENTORY_TABLE, id)).await?;
        Ok(item)
    }

    /// Batch-fetch items keyed by record key
    pub async fn find_by_ids(&self, ids: &[String]) -> RepoResult<HashMap<String, InventoryItem>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let record_ids: Vec<RecordId> = ids
            .iter()
            .map(|id| RecordId::from_table_key(INVENTORY_TABLE, id))
            .collect();

        let items: Vec<InventoryItem> = self
            .base
            .db()
            .query("SELECT * FROM inventory WHERE id INSIDE $ids")
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

    /// Find items by display name (takeaway consumables are configured by name)
    pub async fn find_by_names(&self, names: &[String]) -> RepoResult<Vec<InventoryItem>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let names = names.to_vec();
        let items: Vec<InventoryItem> = self
            .base
            .db()
            .query("SELECT * FROM inventory WHERE name INSIDE $names")
            .bind(("names", names))
            .await?
            .take(0)?;
        Ok(items)
    }

    /// Apply all deltas of one order as a single transaction
    ///
    /// 每条语句都是 `+=` 相对增量，绝不读-改-写；负库存合法。
    pub async fn apply_deltas(&self, deltas: &[StockDelta]) -> RepoResult<()> {
        if deltas.is_empty() {
            return Ok(());
        }

        let mut sql = String::from("BEGIN TRANSACTION;\n");
        for i in 0..deltas.len() {
            sql.push_str(&format!(
                "UPDATE $id_{i} SET stock_quantity += $delta_{i};\n"
            ));
        }
        sql.push_str("COMMIT TRANSACTION;");

        let mut query = self.base.db().query(sql);
        for (i, d) in deltas.iter().enumerate() {
            let delta = match d.delta.to_f64() {
                Some(v) => v,
                None => {
                    return Err(RepoError::Validation(format!(
                        "Unrepresentable stock delta {} for {}",
                        d.delta, d.item_id
                    )));
                }
            };
            query = query
                .bind((
                    format!("id_{i}"),
                    RecordId::from_table_key(INVENTORY_TABLE, &d.item_id),
                ))
                .bind((format!("delta_{i}"), delta));
        }

        query.await?.check()?;
        Ok(())
    }

    /// Create an item with an explicit key (seeding / tests)
    pub async fn create(&self, id: &str, data: InventoryItemCreate) -> RepoResult<InventoryItem> {
        let created: Option<InventoryItem> = self
            .base
            .db()
            .create((INVENTORY_TABLE, id))
            .content(data)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create inventory item".to_string()))
    }
}
