//! Order Record Repository
//!
//! record key = 去重后的订单号，重复创建直接报冲突。

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{OrderRecord, OrderStatusUpdate};
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

const ORDER_TABLE: &str = "order";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Persist a new pending order record
    pub async fn create(&self, record: OrderRecord) -> RepoResult<OrderRecord> {
        let order_id = record.order_id.clone();
        let created: Option<OrderRecord> = self
            .base
            .db()
            .create((ORDER_TABLE, order_id.as_str()))
            .content(record)
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("already exists") {
                    RepoError::Duplicate(format!("Order {} already exists", order_id))
                } else {
                    RepoError::Database(msg)
                }
            })?;
        created.ok_or_else(|| RepoError::Database("Failed to create order record".to_string()))
    }

    /// Find an order record by its disambiguated order id
    pub async fn find_by_order_id(&self, order_id: &str) -> RepoResult<Option<OrderRecord>> {
        let record: Option<OrderRecord> = self.base.db().select((ORDER_TABLE, order_id)).await?;
        Ok(record)
    }

    /// Merge a status update into the record, returning the updated record
    pub async fn apply_status_update(
        &self,
        order_id: &str,
        update: OrderStatusUpdate,
    ) -> RepoResult<OrderRecord> {
        let rid = RecordId::from_table_key(ORDER_TABLE, order_id);
        let updated: Vec<OrderRecord> = self
            .base
            .db()
            .query("UPDATE $rid MERGE $update RETURN AFTER")
            .bind(("rid", rid))
            .bind(("update", update))
            .await?
            .take(0)?;

        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Atomically claim the settlement side effect for this order
    ///
    /// 条件更新只会成功一次；并发重复回调里只有赢家会扣库存。
    /// Returns `true` if this caller won the claim.
    pub async fn claim_settlement(&self, order_id: &str) -> RepoResult<bool> {
        let rid = RecordId::from_table_key(ORDER_TABLE, order_id);
        let claimed: Vec<OrderRecord> = self
            .base
            .db()
            .query(
                "UPDATE $rid SET settlement_applied = true \
                 WHERE settlement_applied = false RETURN AFTER",
            )
            .bind(("rid", rid))
            .await?
            .take(0)?;
        Ok(!claimed.is_empty())
    }

    /// Release a claim after a failed decrement so the gateway retry can redo it
    pub async fn release_settlement(&self, order_id: &str) -> RepoResult<()> {
        let rid = RecordId::from_table_key(ORDER_TABLE, order_id);
        self.base
            .db()
            .query("UPDATE $rid SET settlement_applied = false")
            .bind(("rid", rid))
            .await?
            .check()?;
        Ok(())
    }
}
