//! Pay Server - 餐厅支付处理服务
//!
//! # 架构概述
//!
//! 本服务是收银客户端与对外支付网关之间的中介，提供两条核心路径：
//!
//! - **会话发起** (`payments::session`): 校验订单、解析顾客、
//!   向网关换取支付会话 token，并落一条 pending 订单记录
//! - **状态对账** (`payments::reconcile`): 消化网关回调，归一状态、
//!   写回订单记录，并在结清时幂等地执行库存扣减
//!
//! # 模块结构
//!
//! ```text
//! pay-server/src/
//! ├── core/        # 配置、状态、服务器启动
//! ├── api/         # HTTP 路由和处理器
//! ├── payments/    # 支付域逻辑 (会话、对账、扣减、策略)
//! ├── gateway/     # 支付网关出站客户端
//! ├── db/          # 数据库层 (模型 + 仓库)
//! └── utils/       # 日志、时间工具
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod gateway;
pub mod payments;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{Config, ConsumableBasis, Server, ServerState};
pub use gateway::{MidtransClient, PaymentGateway};
pub use payments::{ReconcileEngine, SessionService, StatusEvent};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境 (dotenv + 日志)
pub fn setup_environment() {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
}
