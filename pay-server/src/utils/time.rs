//! 时间工具函数 — 营业时区转换
//!
//! 所有持久化的时间戳统一用营业时区 (默认 Asia/Jakarta) 格式化，
//! 网关回调和订单记录共用同一套格式。

use chrono::Utc;
use chrono_tz::Tz;

/// 持久化时间戳格式 (收银端约定的格式)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 日期格式 (消费日志按日分键)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 当前时间 → 营业时区格式化字符串
pub fn now_formatted(tz: Tz) -> String {
    Utc::now()
        .with_timezone(&tz)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// 今天的营业日期 (YYYY-MM-DD, 营业时区)
pub fn today(tz: Tz) -> String {
    Utc::now()
        .with_timezone(&tz)
        .format(DATE_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Jakarta;

    #[test]
    fn test_timestamp_shape() {
        let ts = now_formatted(Jakarta);
        // "2025-01-01 00:00:00"
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
    }

    #[test]
    fn test_today_shape() {
        let d = today(Jakarta);
        assert_eq!(d.len(), 10);
        assert_eq!(&d[7..8], "-");
    }
}
