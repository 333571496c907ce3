//! Consumption Log Repository
//!
//! 按 (日期, 方向, 物料) 的 record key 做 UPSERT 累加，
//! `total_consumed` 在数据库侧累加，不经过客户端读-改-写。

use super::{BaseRepository, RepoResult};
use crate::db::models::{ConsumptionDirection, ConsumptionLogEntry};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const LOG_TABLE: &str = "consumption_log";

/// One outflow accumulation, metadata carried from the inventory ledger
#[derive(Debug, Clone)]
pub struct OutflowEntry {
    pub item_id: String,
    pub display_name: String,
    pub category: String,
    pub unit: String,
    pub quantity: Decimal,
}

#[derive(Clone)]
pub struct ConsumptionLogRepository {
    base: BaseRepository,
}

impl ConsumptionLogRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn entry_key(date: &str, direction: ConsumptionDirection, item_id: &str) -> String {
        format!("{}:{}:{}", date, direction.as_str(), item_id)
    }

    /// Accumulate today's outflow totals for the given entries
    pub async fn accumulate_outflow(&self, date: &str, entries: &[OutflowEntry]) -> RepoResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut sql = String::from("BEGIN TRANSACTION;\n");
        for i in 0..entries.len() {
            sql.push_str(&format!(
                "UPSERT type::thing('consumption_log', $key_{i}) SET \
                 date = $date, direction = 'outflow', item_id = $item_{i}, \
                 display_name = $name_{i}, category = $cat_{i}, unit = $unit_{i}, \
                 total_consumed = (total_consumed ?? 0) + $qty_{i};\n"
            ));
        }
        sql.push_str("COMMIT TRANSACTION;");

        let date_owned = date.to_string();
        let mut query = self.base.db().query(sql).bind(("date", date_owned));
        for (i, e) in entries.iter().enumerate() {
            let quantity = match e.quantity.to_f64() {
                Some(v) => v,
                None => {
                    return Err(super::RepoError::Validation(format!(
                        "Unrepresentable consumption quantity {} for {}",
                        e.quantity, e.item_id
                    )));
                }
            };
            query = query
                .bind((
                    format!("key_{i}"),
                    Self::entry_key(date, ConsumptionDirection::Outflow, &e.item_id),
                ))
                .bind((format!("item_{i}"), e.item_id.clone()))
                .bind((format!("name_{i}"), e.display_name.clone()))
                .bind((format!("cat_{i}"), e.category.clone()))
                .bind((format!("unit_{i}"), e.unit.clone()))
                .bind((format!("qty_{i}"), quantity));
        }

        query.await?.check()?;
        Ok(())
    }

    /// Fetch one accumulator entry (reporting / tests)
    pub async fn find(
        &self,
        date: &str,
        direction: ConsumptionDirection,
        item_id: &str,
    ) -> RepoResult<Option<ConsumptionLogEntry>> {
        let key = Self::entry_key(date, direction, item_id);
        let entry: Option<ConsumptionLogEntry> = self.base.db().select((LOG_TABLE, key)).await?;
        Ok(entry)
    }
}
