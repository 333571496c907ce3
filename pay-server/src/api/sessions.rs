//! 支付会话路由
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /getSnapToken | POST | 发起支付会话，返回网关 token |
//!
//! 路径沿用收银客户端的既有约定，不做 REST 化改名。

use axum::{Json, Router, extract::State, routing::post};

use crate::core::ServerState;
use crate::payments::session::{SessionService, SnapTokenRequest, SnapTokenResponse};
use shared::error::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().route("/getSnapToken", post(create_session))
}

/// 发起支付会话
///
/// 成功响应直接返回 `{token, redirectUrl, orderId}`，
/// 失败走统一的 [`shared::error::ApiResponse`] 错误包络。
async fn create_session(
    State(state): State<ServerState>,
    Json(request): Json<SnapTokenRequest>,
) -> AppResult<Json<SnapTokenResponse>> {
    let service = SessionService::new(&state);
    let response = service.create(request).await?;
    Ok(Json(response))
}
