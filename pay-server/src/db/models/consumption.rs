//! Consumption Log Model (每日用量汇总)
//!
//! 按 (日期, 方向, 物料) 分键，`total_consumed` 只增不减；
//! 日期分键天然实现每日归零。

use super::serde_helpers;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// 流向: 出库 (消耗) 或入库 (进货)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionDirection {
    Outflow,
    Inflow,
}

impl ConsumptionDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outflow => "outflow",
            Self::Inflow => "inflow",
        }
    }
}

/// Consumption log entry entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionLogEntry {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// 营业日期 (YYYY-MM-DD)
    pub date: String,
    pub direction: ConsumptionDirection,
    /// inventory 表的 record key
    pub item_id: String,
    /// 展示元数据来自库存台账，不硬编码
    pub display_name: String,
    pub category: String,
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_consumed: Decimal,
}
