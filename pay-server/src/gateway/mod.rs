//! Payment Gateway Module
//!
//! 对外支付网关是不透明协作方：这里只定义会话创建的出站契约
//! ([`PaymentGateway`]) 和 Midtrans Snap 的具体实现 ([`MidtransClient`])。
//! 网关客户端由进程入口构造后注入 `ServerState`，不存在全局可变句柄。

mod midtrans;

pub use midtrans::MidtransClient;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::AppResult;

/// Transaction amount block of a session-create request
#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetails {
    pub order_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_amount: Decimal,
}

/// Customer identity forwarded to the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub email: String,
    pub phone: String,
}

/// One line item forwarded to the gateway
#[derive(Debug, Clone, Serialize)]
pub struct ItemDetail {
    pub id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: i64,
    pub name: String,
}

/// Session-create request payload (Snap wire format)
#[derive(Debug, Clone, Serialize)]
pub struct SnapTransactionRequest {
    pub transaction_details: TransactionDetails,
    pub customer_details: CustomerDetails,
    pub item_details: Vec<ItemDetail>,
}

/// A successfully created payment session
#[derive(Debug, Clone, Deserialize)]
pub struct SnapSession {
    pub token: String,
    pub redirect_url: String,
}

/// Outbound contract for creating payment sessions
///
/// 测试里用 mock 实现替换，生产用 [`MidtransClient`]。
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment session; must fail if the gateway returns no token
    async fn create_transaction(&self, request: &SnapTransactionRequest) -> AppResult<SnapSession>;
}
