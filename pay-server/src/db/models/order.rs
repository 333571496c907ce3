//! Order Record Model
//!
//! 每个支付会话一条记录，record key = 去重后的订单号。
//! 记录在会话创建时写入 (pending)，之后只由对账引擎修改。

use super::serde_helpers;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Payment status reported by the gateway
///
/// Unknown gateway states are preserved as [`PaymentStatus::Unknown`]
/// instead of failing the webhook: the record still captures the raw
/// transition and nothing is decremented.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Authorize,
    Capture,
    Settlement,
    Deny,
    Cancel,
    Expire,
    Failure,
    Refund,
    PartialRefund,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    /// Parse a raw gateway status string
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "authorize" => Self::Authorize,
            "capture" => Self::Capture,
            "settlement" => Self::Settlement,
            "deny" => Self::Deny,
            "cancel" => Self::Cancel,
            "expire" => Self::Expire,
            "failure" => Self::Failure,
            "refund" => Self::Refund,
            "partial_refund" => Self::PartialRefund,
            _ => Self::Unknown,
        }
    }

    /// 资金已确认到账 (settlement 或 capture)
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Settlement | Self::Capture)
    }

    /// Raw string form (matches the gateway wire format)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Authorize => "authorize",
            Self::Capture => "capture",
            Self::Settlement => "settlement",
            Self::Deny => "deny",
            Self::Cancel => "cancel",
            Self::Expire => "expire",
            Self::Failure => "failure",
            Self::Refund => "refund",
            Self::PartialRefund => "partial_refund",
            Self::Unknown => "unknown",
        }
    }
}

/// Fulfillment mode — 堂食或打包，决定是否消耗一次性耗材
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FulfillmentMode {
    #[default]
    #[serde(rename = "Dine In", alias = "DineIn", alias = "dine_in")]
    DineIn,
    #[serde(rename = "Take Away", alias = "TakeAway", alias = "take_away", alias = "takeaway")]
    TakeAway,
}

/// One order line, snapshotted at session creation
///
/// 扣减库存时只信任这里的快照，绝不使用回调里的 item_details。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// 菜单项 ID (menu_item 表的 record key)
    pub menu_item_id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: i64,
}

/// Virtual account number (bank-transfer payments)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaNumber {
    pub bank: String,
    pub va_number: String,
}

/// Order record entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// 去重后的订单号 (客户端 order id + 单调后缀)
    pub order_id: String,
    pub status: PaymentStatus,
    /// 首次回调之前未知
    pub payment_method: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_amount: Decimal,
    pub fulfillment: FulfillmentMode,
    pub items: Vec<OrderLine>,
    pub gateway_transaction_id: Option<String>,
    #[serde(default)]
    pub va_numbers: Vec<VaNumber>,
    pub cashier_name: String,
    /// 派生标志: 状态已结清，前端可跳转小票页
    #[serde(default)]
    pub redirect_to_receipt: bool,
    /// 幂等守卫: 结清副作用 (库存扣减) 是否已执行
    #[serde(default)]
    pub settlement_applied: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields written back by the reconciliation engine on a status event
#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusUpdate {
    pub gateway_transaction_id: String,
    pub status: PaymentStatus,
    pub payment_method: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_amount: Decimal,
    pub va_numbers: Vec<VaNumber>,
    pub redirect_to_receipt: bool,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(PaymentStatus::parse("settlement"), PaymentStatus::Settlement);
        assert_eq!(PaymentStatus::parse("pending"), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::parse("chargeback"), PaymentStatus::Unknown);
    }

    #[test]
    fn test_is_settled() {
        assert!(PaymentStatus::Settlement.is_settled());
        assert!(PaymentStatus::Capture.is_settled());
        assert!(!PaymentStatus::Pending.is_settled());
        assert!(!PaymentStatus::Unknown.is_settled());
    }

    #[test]
    fn test_fulfillment_aliases() {
        let m: FulfillmentMode = serde_json::from_str("\"Take Away\"").unwrap();
        assert_eq!(m, FulfillmentMode::TakeAway);
        let m: FulfillmentMode = serde_json::from_str("\"takeaway\"").unwrap();
        assert_eq!(m, FulfillmentMode::TakeAway);
        let m: FulfillmentMode = serde_json::from_str("\"Dine In\"").unwrap();
        assert_eq!(m, FulfillmentMode::DineIn);
    }
}
