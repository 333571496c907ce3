//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`sessions`] - 支付会话发起 (POST /getSnapToken)
//! - [`notifications`] - 网关状态回调 (POST /midtrans-notification)

pub mod health;
pub mod notifications;
pub mod sessions;

use crate::core::ServerState;
use axum::Router;

/// Assemble the full application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(sessions::router())
        .merge(notifications::router())
        .with_state(state)
}
