//! 网关回调路由
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /midtrans-notification | POST | 支付状态回调入口 |
//!
//! 响应语义对网关重试机制至关重要：2xx = 事件已消化 (包括重复事件)，
//! 5xx = 请重试。处理失败绝不能吞掉返回 200。

use axum::{Json, Router, extract::State, routing::post};
use serde::Serialize;

use crate::core::ServerState;
use crate::payments::reconcile::{ReconcileEngine, StatusEvent};
use shared::error::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().route("/midtrans-notification", post(handle_notification))
}

/// 回调确认响应
#[derive(Serialize)]
pub struct NotificationAck {
    pub message: String,
    /// 归一后的状态 (原始字符串形式)
    pub status: String,
}

/// 处理一次状态回调
async fn handle_notification(
    State(state): State<ServerState>,
    Json(event): Json<StatusEvent>,
) -> AppResult<Json<NotificationAck>> {
    let engine = ReconcileEngine::new(&state);
    let outcome = engine.process(event).await?;

    Ok(Json(NotificationAck {
        message: "Transaction status updated".to_string(),
        status: outcome.status.as_str().to_string(),
    }))
}
