//! Wire-format serde helpers
//!
//! 客户端和网关的金额字段既可能是 JSON 数字也可能是字符串
//! (如 "20000.00")，这里统一成 [`Decimal`] 再进入计算路径。

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Deserializer};
use serde::de::{self, Visitor};
use std::fmt;

struct FlexibleDecimal(Decimal);

impl<'de> Deserialize<'de> for FlexibleDecimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DecimalVisitor;

        impl Visitor<'_> for DecimalVisitor {
            type Value = FlexibleDecimal;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a decimal number or a numeric string")
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                Ok(FlexibleDecimal(Decimal::from(value)))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(FlexibleDecimal(Decimal::from(value)))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
                Decimal::from_f64(value)
                    .map(FlexibleDecimal)
                    .ok_or_else(|| de::Error::custom(format!("invalid decimal: {value}")))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                value
                    .parse::<Decimal>()
                    .map(FlexibleDecimal)
                    .map_err(|_| de::Error::custom(format!("invalid decimal: {value}")))
            }
        }

        deserializer.deserialize_any(DecimalVisitor)
    }
}

/// `#[serde(deserialize_with = ...)]` for required amount fields
pub fn decimal_from_number_or_string<'de, D>(d: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    FlexibleDecimal::deserialize(d).map(|f| f.0)
}

/// `#[serde(deserialize_with = ...)]` for optional amount fields
pub fn option_decimal_from_number_or_string<'de, D>(d: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<FlexibleDecimal>::deserialize(d).map(|opt| opt.map(|f| f.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Amount {
        #[serde(deserialize_with = "decimal_from_number_or_string")]
        value: Decimal,
    }

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn test_accepts_integer_float_and_string() {
        let a: Amount = serde_json::from_str(r#"{"value": 10000}"#).unwrap();
        assert_eq!(a.value, d("10000"));

        let a: Amount = serde_json::from_str(r#"{"value": 2500.5}"#).unwrap();
        assert_eq!(a.value, d("2500.5"));

        let a: Amount = serde_json::from_str(r#"{"value": "20000.00"}"#).unwrap();
        assert_eq!(a.value, d("20000"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<Amount>(r#"{"value": "abc"}"#).is_err());
        assert!(serde_json::from_str::<Amount>(r#"{"value": true}"#).is_err());
    }
}
