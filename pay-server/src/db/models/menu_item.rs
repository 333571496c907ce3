//! Menu Item Model (参照数据，本服务只读)

use super::serde_helpers;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// 单份菜品对一种食材的用量
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientRequirement {
    /// inventory 表的 record key
    pub ingredient_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity_per_unit: Decimal,
}

/// Menu item entity
///
/// `required_ingredients` 可以为空 — 不是所有菜品都做食材追踪。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub required_ingredients: Vec<IngredientRequirement>,
}
