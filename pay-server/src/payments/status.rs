//! Status normalization policy
//!
//! 网关沙箱对 bank_transfer 永远不会自然发出 settlement 事件，
//! 联调时需要把 pending 归一成 settlement 才能走完结清路径。
//! 这里把它建成显式、可关闭的策略，生产配置必须关闭。

use crate::db::models::PaymentStatus;

/// 支付方式: 银行转账 (虚拟账户)
const BANK_TRANSFER: &str = "bank_transfer";

/// Named sandbox policy: bank-transfer `pending` → `settlement`
#[derive(Debug, Clone, Copy)]
pub struct SandboxAutoSettle {
    enabled: bool,
}

impl SandboxAutoSettle {
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Decide the canonical status for an inbound event
    ///
    /// 除策略命中的组合外，其他状态一律原样通过。
    pub fn normalize(&self, raw: PaymentStatus, payment_method: &str) -> PaymentStatus {
        if self.enabled && payment_method == BANK_TRANSFER && raw == PaymentStatus::Pending {
            return PaymentStatus::Settlement;
        }
        raw
    }
}
