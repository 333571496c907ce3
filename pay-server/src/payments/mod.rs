//! Payments Module
//!
//! 支付域核心逻辑，按职责拆分：
//! - [`session`]: 会话发起 (订单号去重、顾客解析、网关调用、pending 落库)
//! - [`reconcile`]: 状态对账 (归一、写回、幂等门闩)
//! - [`decrement`]: 库存扣减协议 (食材聚合、打包耗材、消费日志)
//! - [`status`]: 沙箱状态归一策略

pub mod decrement;
pub mod reconcile;
pub mod session;
pub mod status;


pub use decrement::{DecrementOutcome, DecrementProtocol};
pub use reconcile::{ReconcileEngine, ReconcileOutcome, StatusEvent};
pub use session::{OrderIdGenerator, SessionService, SnapTokenRequest, SnapTokenResponse};
pub use status::SandboxAutoSettle;
