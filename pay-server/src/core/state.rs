//! 服务器状态 - 依赖注入的根
//!
//! 所有协作方 (配置、数据库、网关客户端、订单号生成器) 都挂在
//! [`ServerState`] 上，由进程入口构造后注入路由；不存在全局可变句柄。
//! 测试用 Mem 引擎和 mock 网关构造同样的状态。

use std::path::Path;
use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::Config;
use crate::db::DbService;
use crate::gateway::{MidtransClient, PaymentGateway};
use crate::payments::session::OrderIdGenerator;
use shared::error::{AppError, AppResult};

/// Shared server state, cheap to clone
#[derive(Clone)]
pub struct ServerState {
    /// 配置 (不可变)
    pub config: Config,
    /// 嵌入式数据库句柄
    pub db: Surreal<Db>,
    /// 支付网关客户端
    pub gateway: Arc<dyn PaymentGateway>,
    /// 订单号单调后缀生成器
    pub order_ids: Arc<OrderIdGenerator>,
}

impl ServerState {
    pub fn new(config: Config, db: Surreal<Db>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            config,
            db,
            gateway,
            order_ids: Arc::new(OrderIdGenerator::new()),
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：数据目录 → 数据库 → 网关客户端。
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        if config.midtrans_server_key.is_empty() {
            tracing::warn!("MIDTRANS_SERVER_KEY is empty; gateway will reject session creation");
        }

        if let Some(parent) = Path::new(&config.db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::internal(format!("Failed to create data directory: {e}"))
                })?;
            }
        }

        let db_service = DbService::new(&config.db_path).await?;

        let gateway = Arc::new(MidtransClient::new(
            config.midtrans_api_url.clone(),
            config.midtrans_server_key.clone(),
            config.gateway_timeout_ms,
            config.gateway_retries,
        )?);

        Ok(Self::new(config.clone(), db_service.db, gateway))
    }

    /// 数据库句柄 (浅拷贝)
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }
}
