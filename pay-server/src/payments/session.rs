//! Payment session initiation
//!
//! 收到收银端请求后：校验行项目 → 解析顾客 → Decimal 计算总额 →
//! 生成去重订单号 → 调网关换取会话 token → 落一条 pending 订单记录。
//!
//! 网关成功但本地写入失败时，token 已经发出去了——记录错误并把
//! 失败透传给调用方，由对账流程兜底。

use crate::core::state::ServerState;
use crate::db::models::{FulfillmentMode, OrderLine, OrderRecord, PaymentStatus};
use crate::db::repository::{OrderRepository, UserRepository};
use crate::gateway::{
    CustomerDetails, ItemDetail, PaymentGateway, SnapTransactionRequest, TransactionDetails,
};
use crate::utils::time;
use chrono::Utc;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// 目录缺失联系方式时的占位值 (网关要求字段非空)
const FALLBACK_EMAIL: &str = "unknown@gmail.com";
const FALLBACK_PHONE: &str = "0000000000";

/// Monotonic order-id suffix source
///
/// 同一毫秒内的并发请求也能拿到互不相同、单调递增的后缀。
#[derive(Debug, Default)]
pub struct OrderIdGenerator {
    last: AtomicI64,
}

impl OrderIdGenerator {
    pub fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// Next suffix: wall-clock millis, bumped past the previous value
    pub fn next_suffix(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::SeqCst, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }

    /// Disambiguate a client-supplied base order id
    pub fn disambiguate(&self, base: &str) -> String {
        format!("{}-{}", base, self.next_suffix())
    }
}

/// One requested order line (client wire format)
#[derive(Debug, Clone, Deserialize)]
pub struct SessionItemInput {
    #[serde(alias = "menu_item_id", alias = "menuItemId")]
    pub id: String,
    pub name: String,
    /// 数字或字符串金额都接受
    #[serde(deserialize_with = "crate::utils::serde::decimal_from_number_or_string")]
    pub price: Decimal,
    pub quantity: i64,
}

/// Session initiation request
///
/// 兼容历史客户端的驼峰字段名。顾客信息二选一：整块
/// `customer_details`，或 `customer_id` 走目录查找。
#[derive(Debug, Clone, Deserialize)]
pub struct SnapTokenRequest {
    #[serde(alias = "orderId")]
    pub order_id: Option<String>,
    #[serde(default, alias = "customerId", alias = "uid")]
    pub customer_id: Option<String>,
    #[serde(default, alias = "customerDetails")]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub items: Vec<SessionItemInput>,
    #[serde(
        default,
        alias = "dineOption",
        alias = "dine_option",
        alias = "fulfillmentMode",
        alias = "fulfillment_mode"
    )]
    pub fulfillment: Option<FulfillmentMode>,
}

/// Session initiation response
#[derive(Debug, Clone, Serialize)]
pub struct SnapTokenResponse {
    pub token: String,
    #[serde(rename = "redirectUrl")]
    pub redirect_url: String,
    /// 实际持久化的去重订单号，后续回调以它为准
    #[serde(rename = "orderId")]
    pub order_id: String,
}

/// Session initiation service
pub struct SessionService {
    orders: OrderRepository,
    users: UserRepository,
    gateway: Arc<dyn PaymentGateway>,
    ids: Arc<OrderIdGenerator>,
    tz: Tz,
}

impl SessionService {
    pub fn new(state: &ServerState) -> Self {
        Self {
            orders: OrderRepository::new(state.db.clone()),
            users: UserRepository::new(state.db.clone()),
            gateway: state.gateway.clone(),
            ids: state.order_ids.clone(),
            tz: state.config.timezone(),
        }
    }

    /// Create a payment session and persist the pending order record
    pub async fn create(&self, request: SnapTokenRequest) -> AppResult<SnapTokenResponse> {
        let base_id = request
            .order_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::required_field("order_id"))?
            .to_string();

        if request.items.is_empty() {
            return Err(AppError::new(ErrorCode::OrderEmpty));
        }
        for item in &request.items {
            if item.quantity <= 0 {
                return Err(AppError::validation(format!(
                    "Item {} has non-positive quantity",
                    item.id
                ))
                .with_detail("menu_item_id", item.id.clone()));
            }
            if item.price < Decimal::ZERO {
                return Err(AppError::with_message(
                    ErrorCode::InvalidAmount,
                    format!("Item {} has negative price", item.id),
                )
                .with_detail("menu_item_id", item.id.clone()));
            }
        }

        let customer = self.resolve_customer(&request).await?;

        // 金额在 Decimal 域内累加，落库和发网关时才转数字
        let gross_amount: Decimal = request
            .items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum();

        let order_id = self.ids.disambiguate(&base_id);

        let snap_request = SnapTransactionRequest {
            transaction_details: TransactionDetails {
                order_id: order_id.clone(),
                gross_amount,
            },
            customer_details: customer.clone(),
            item_details: request
                .items
                .iter()
                .map(|item| ItemDetail {
                    id: item.id.clone(),
                    price: item.price,
                    quantity: item.quantity,
                    name: item.name.clone(),
                })
                .collect(),
        };

        let session = self.gateway.create_transaction(&snap_request).await?;

        let now = time::now_formatted(self.tz);
        let record = OrderRecord {
            id: None,
            order_id: order_id.clone(),
            status: PaymentStatus::Pending,
            payment_method: None,
            gross_amount,
            fulfillment: request.fulfillment.unwrap_or_default(),
            items: request
                .items
                .iter()
                .map(|item| OrderLine {
                    menu_item_id: item.id.clone(),
                    name: item.name.clone(),
                    unit_price: item.price,
                    quantity: item.quantity,
                })
                .collect(),
            gateway_transaction_id: None,
            va_numbers: Vec::new(),
            cashier_name: customer.first_name.clone(),
            redirect_to_receipt: false,
            settlement_applied: false,
            created_at: now.clone(),
            updated_at: now,
        };

        if let Err(e) = self.orders.create(record).await {
            tracing::error!(
                order_id = %order_id,
                error = %e,
                "Order record write failed after session token was issued"
            );
            return Err(AppError::from(e));
        }

        tracing::info!(order_id = %order_id, gross = %gross_amount, "Payment session created");

        Ok(SnapTokenResponse {
            token: session.token,
            redirect_url: session.redirect_url,
            order_id,
        })
    }

    /// Resolve the customer block: inline details win, otherwise directory lookup
    async fn resolve_customer(&self, request: &SnapTokenRequest) -> AppResult<CustomerDetails> {
        if let Some(details) = &request.customer_details {
            if details.first_name.trim().is_empty() {
                return Err(AppError::required_field("customer_details.first_name"));
            }
            return Ok(details.clone());
        }

        let customer_id = request
            .customer_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::required_field("customer_id"))?;

        let user = self
            .users
            .find_by_id(customer_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::customer_not_found(customer_id))?;

        Ok(CustomerDetails {
            first_name: user.name,
            email: user.email.unwrap_or_else(|| FALLBACK_EMAIL.to_string()),
            phone: user.phone.unwrap_or_else(|| FALLBACK_PHONE.to_string()),
        })
    }
}
