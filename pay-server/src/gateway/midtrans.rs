//! Midtrans Snap API client
//!
//! 会话创建是唯一允许有界重试的出站调用；回调处理依赖网关自己的
//! 重试，服务端绝不内部重试。

use super::{PaymentGateway, SnapSession, SnapTransactionRequest};
use async_trait::async_trait;
use serde::Deserialize;
use shared::error::{AppError, AppResult, ErrorCode};
use std::time::Duration;

/// Raw Snap create-transaction response
#[derive(Debug, Deserialize)]
struct SnapCreateResponse {
    token: Option<String>,
    redirect_url: Option<String>,
}

/// Midtrans Snap client (Basic auth with the server key as username)
pub struct MidtransClient {
    client: reqwest::Client,
    api_url: String,
    server_key: String,
    max_retries: u32,
}

impl MidtransClient {
    /// Build the client with a per-request timeout
    pub fn new(
        api_url: impl Into<String>,
        server_key: impl Into<String>,
        timeout_ms: u64,
        max_retries: u32,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            server_key: server_key.into(),
            max_retries,
        })
    }
}

#[async_trait]
impl PaymentGateway for MidtransClient {
    async fn create_transaction(&self, request: &SnapTransactionRequest) -> AppResult<SnapSession> {
        let mut attempt = 0u32;
        let response = loop {
            let result = self
                .client
                .post(&self.api_url)
                .basic_auth(&self.server_key, None::<&str>)
                .json(request)
                .send()
                .await;

            match result {
                Ok(resp) => break resp,
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        error = %e,
                        "Gateway request failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                }
                Err(e) => {
                    return Err(AppError::with_message(
                        ErrorCode::GatewayError,
                        format!("Gateway request failed: {e}"),
                    ));
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            // 上游原始报文只进日志，不进给客户端的响应
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Gateway rejected transaction");
            return Err(
                AppError::new(ErrorCode::GatewayRejected).with_detail("status", status.as_u16())
            );
        }

        let parsed: SnapCreateResponse = response
            .json()
            .await
            .map_err(|e| AppError::gateway(format!("Malformed gateway response: {e}")))?;

        match (parsed.token, parsed.redirect_url) {
            (Some(token), Some(redirect_url)) if !token.is_empty() => Ok(SnapSession {
                token,
                redirect_url,
            }),
            _ => Err(AppError::new(ErrorCode::GatewayTokenMissing)),
        }
    }
}
