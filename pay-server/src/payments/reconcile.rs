//! Payment status reconciliation
//!
//! 网关回调的唯一处理路径：校验 → 查订单 → 状态归一 → 写回记录 →
//! (仅结清时) 抢幂等门闩 → 扣库存。门闩抢失败说明副作用已执行过，
//! 直接确认，不重复扣减。
//!
//! 回调失败时返回 5xx，让网关按自己的节奏重试；服务端不做内部重试。

use crate::core::state::ServerState;
use crate::db::models::{OrderStatusUpdate, PaymentStatus, VaNumber};
use crate::db::repository::OrderRepository;
use crate::payments::decrement::{DecrementOutcome, DecrementProtocol};
use crate::payments::status::SandboxAutoSettle;
use crate::utils::time;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::{AppError, AppResult};

/// Inbound status event (gateway wire format)
///
/// 所有字段都按可缺失解析，缺字段走 required-field 校验而不是 422。
/// 报文里的 item_details 即使出现也被忽略，扣减只信订单快照。
#[derive(Debug, Clone, Deserialize)]
pub struct StatusEvent {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub transaction_status: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::utils::serde::option_decimal_from_number_or_string"
    )]
    pub gross_amount: Option<Decimal>,
    #[serde(default)]
    pub va_numbers: Option<Vec<VaNumber>>,
}

/// What a reconciliation run did
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub order_id: String,
    /// Canonical status after policy normalization
    pub status: PaymentStatus,
    /// Present only when this run won the settlement claim
    pub decrement: Option<DecrementOutcome>,
}

/// Reconciliation engine — one instance per request is cheap
pub struct ReconcileEngine {
    orders: OrderRepository,
    decrement: DecrementProtocol,
    policy: SandboxAutoSettle,
    tz: Tz,
}

impl ReconcileEngine {
    pub fn new(state: &ServerState) -> Self {
        Self {
            orders: OrderRepository::new(state.db.clone()),
            decrement: DecrementProtocol::new(
                state.db.clone(),
                state.config.takeaway_consumables.clone(),
                state.config.consumable_basis,
                state.config.timezone(),
            ),
            policy: SandboxAutoSettle::new(state.config.sandbox_auto_settle),
            tz: state.config.timezone(),
        }
    }

    /// Process one status event
    pub async fn process(&self, event: StatusEvent) -> AppResult<ReconcileOutcome> {
        let order_id = required(event.order_id, "order_id")?;
        let raw_status = required(event.transaction_status, "transaction_status")?;
        let transaction_id = required(event.transaction_id, "transaction_id")?;
        let payment_type = required(event.payment_type, "payment_type")?;

        let record = self
            .orders
            .find_by_order_id(&order_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::order_not_found(&order_id))?;

        let raw = PaymentStatus::parse(&raw_status);
        let status = self.policy.normalize(raw, &payment_type);
        if status != raw {
            tracing::info!(
                order_id = %order_id,
                raw = raw.as_str(),
                normalized = status.as_str(),
                "Sandbox auto-settle normalized status"
            );
        }
        if raw == PaymentStatus::Unknown {
            tracing::warn!(
                order_id = %order_id,
                raw = %raw_status,
                "Unknown gateway status recorded as-is"
            );
        }

        let update = OrderStatusUpdate {
            gateway_transaction_id: transaction_id.clone(),
            status,
            payment_method: payment_type.clone(),
            gross_amount: event.gross_amount.unwrap_or(record.gross_amount),
            va_numbers: event.va_numbers.unwrap_or_default(),
            redirect_to_receipt: status.is_settled(),
            updated_at: time::now_formatted(self.tz),
        };
        self.orders
            .apply_status_update(&order_id, update)
            .await
            .map_err(AppError::from)?;

        let mut outcome = ReconcileOutcome {
            order_id: order_id.clone(),
            status,
            decrement: None,
        };

        if status.is_settled() {
            let won = self
                .orders
                .claim_settlement(&order_id)
                .await
                .map_err(AppError::from)?;

            if won {
                match self.decrement.run(&record.items, record.fulfillment).await {
                    Ok(result) => {
                        tracing::info!(
                            order_id = %order_id,
                            transaction_id = %transaction_id,
                            deltas = result.applied.len(),
                            "Settlement applied, inventory decremented"
                        );
                        outcome.decrement = Some(result);
                    }
                    Err(e) => {
                        // 释放门闩，网关重试时重新执行扣减
                        if let Err(release_err) = self.orders.release_settlement(&order_id).await {
                            tracing::error!(
                                order_id = %order_id,
                                error = %release_err,
                                "Failed to release settlement claim after decrement failure"
                            );
                        }
                        return Err(e);
                    }
                }
            } else {
                tracing::info!(
                    order_id = %order_id,
                    transaction_id = %transaction_id,
                    "Duplicate settlement event, side effect already applied"
                );
            }
        }

        Ok(outcome)
    }
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::required_field(field))
}
