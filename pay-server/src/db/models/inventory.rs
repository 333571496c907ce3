//! Inventory Item Model (库存台账)
//!
//! `stock_quantity` 只允许通过原子相对增量修改 (`+=`)，
//! 禁止读-改-写，负库存合法 (超卖可见，不截断)。

use super::serde_helpers;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Inventory item entity (ingredient or disposable consumable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    pub name: String,
    pub category: String,
    /// 计量单位 (gram, pcs, ...)
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub stock_quantity: Decimal,
}

/// Creation payload (seeding / admin tooling)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItemCreate {
    pub name: String,
    pub category: String,
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub stock_quantity: Decimal,
}
