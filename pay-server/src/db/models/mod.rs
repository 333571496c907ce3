//! Database Models
//!
//! SurrealDB 表实体:
//!
//! | 表 | 模型 | 说明 |
//! |----|------|------|
//! | order | [`OrderRecord`] | 支付会话/订单记录 |
//! | inventory | [`InventoryItem`] | 库存台账 |
//! | menu_item | [`MenuItem`] | 菜单参照数据 (只读) |
//! | consumption_log | [`ConsumptionLogEntry`] | 每日用量汇总 |
//! | user | [`User`] | 收银员/顾客目录 |

pub mod consumption;
pub mod inventory;
pub mod menu_item;
pub mod order;
pub mod serde_helpers;
pub mod user;

pub use consumption::{ConsumptionDirection, ConsumptionLogEntry};
pub use inventory::{InventoryItem, InventoryItemCreate};
pub use menu_item::{IngredientRequirement, MenuItem};
pub use order::{
    FulfillmentMode, OrderLine, OrderRecord, OrderStatusUpdate, PaymentStatus, VaNumber,
};
pub use user::User;
