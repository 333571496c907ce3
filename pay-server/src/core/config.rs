use chrono_tz::Tz;

/// 打包耗材扣减基数
///
/// 两种口径都有使用场景，做成显式配置：
/// - `PerItemTotal`: 每件餐品消耗一份耗材 (默认)
/// - `PerOrder`: 每单消耗一份耗材
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumableBasis {
    PerItemTotal,
    PerOrder,
}

impl ConsumableBasis {
    fn from_env_value(value: &str) -> Self {
        match value {
            "per_order" => Self::PerOrder,
            _ => Self::PerItemTotal,
        }
    }
}

/// 服务器配置 - 支付服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | DB_PATH | data/pay-server.db | 嵌入式数据库路径 |
/// | ENVIRONMENT | development | 运行环境 |
/// | MIDTRANS_API_URL | sandbox Snap URL | 网关会话创建端点 |
/// | MIDTRANS_SERVER_KEY | (空) | 网关凭证 (Basic auth 用户名) |
/// | GATEWAY_TIMEOUT_MS | 10000 | 出站网关调用超时 |
/// | GATEWAY_RETRIES | 2 | 会话创建传输错误重试次数 |
/// | REQUEST_TIMEOUT_MS | 30000 | 入站请求超时 |
/// | BUSINESS_TIMEZONE | Asia/Jakarta | 持久化时间戳时区 |
/// | SANDBOX_AUTO_SETTLE | 非生产为 true | bank_transfer pending→settlement 策略 |
/// | TAKEAWAY_CONSUMABLES | Sendok & Garpu,Kertas Bungkus | 打包耗材 (库存名，逗号分隔) |
/// | TAKEAWAY_CONSUMABLE_BASIS | per_item_total | 耗材扣减基数 |
/// | LOG_DIR | (无) | 日志文件目录，未设置则只输出到控制台 |
///
/// # 示例
///
/// ```ignore
/// MIDTRANS_SERVER_KEY=SB-Mid-server-xxx HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 嵌入式数据库路径
    pub db_path: String,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 网关会话创建端点
    pub midtrans_api_url: String,
    /// 网关服务端凭证
    pub midtrans_server_key: String,
    /// 出站网关调用超时 (毫秒)
    pub gateway_timeout_ms: u64,
    /// 会话创建传输错误的有界重试次数
    pub gateway_retries: u32,
    /// 入站请求超时 (毫秒)
    pub request_timeout_ms: u64,
    /// 营业时区 (IANA 名称)
    pub business_timezone: String,
    /// sandbox 沙箱策略: bank_transfer 的 pending 直接视为 settlement
    ///
    /// 网关沙箱环境对 bank_transfer 永远不会自然发出 settlement 事件，
    /// 生产配置必须关闭。
    pub sandbox_auto_settle: bool,
    /// 打包耗材 (库存台账里的名称)
    pub takeaway_consumables: Vec<String>,
    /// 打包耗材扣减基数
    pub consumable_basis: ConsumableBasis,
    /// 日志文件目录 (可选)
    pub log_dir: Option<String>,
}

const SANDBOX_SNAP_URL: &str = "https://app.sandbox.midtrans.com/snap/v1/transactions";

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let is_production = environment == "production";

        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "data/pay-server.db".into()),
            midtrans_api_url: std::env::var("MIDTRANS_API_URL")
                .unwrap_or_else(|_| SANDBOX_SNAP_URL.into()),
            midtrans_server_key: std::env::var("MIDTRANS_SERVER_KEY").unwrap_or_default(),
            gateway_timeout_ms: std::env::var("GATEWAY_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10_000),
            gateway_retries: std::env::var("GATEWAY_RETRIES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(2),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30_000),
            business_timezone: std::env::var("BUSINESS_TIMEZONE")
                .unwrap_or_else(|_| "Asia/Jakarta".into()),
            sandbox_auto_settle: std::env::var("SANDBOX_AUTO_SETTLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(!is_production),
            takeaway_consumables: std::env::var("TAKEAWAY_CONSUMABLES")
                .unwrap_or_else(|_| "Sendok & Garpu,Kertas Bungkus".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            consumable_basis: ConsumableBasis::from_env_value(
                &std::env::var("TAKEAWAY_CONSUMABLE_BASIS").unwrap_or_default(),
            ),
            log_dir: std::env::var("LOG_DIR").ok(),
            environment,
        }
    }

    /// 营业时区，解析失败回退 UTC
    pub fn timezone(&self) -> Tz {
        self.business_timezone.parse().unwrap_or(Tz::UTC)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumable_basis_parse() {
        assert_eq!(
            ConsumableBasis::from_env_value("per_order"),
            ConsumableBasis::PerOrder
        );
        assert_eq!(
            ConsumableBasis::from_env_value("per_item_total"),
            ConsumableBasis::PerItemTotal
        );
        assert_eq!(
            ConsumableBasis::from_env_value(""),
            ConsumableBasis::PerItemTotal
        );
    }
}
