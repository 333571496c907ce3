//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] / [`AppResult`] - 应用错误类型 (from shared::error)
//! - [`logger`] - 日志初始化
//! - [`serde`] - 金额字段的宽松反序列化
//! - [`time`] - 营业时区时间工具

pub mod logger;
pub mod serde;
pub mod time;

// Re-export error types from shared
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
