//! Record types returned by the remote listing endpoints
//!
//! Each type keeps the identifying fields typed and collects everything
//! else in a flattened `extra` map, so new remote fields never break
//! deserialization.

mod product;
mod warehouse;

pub use product::{Product, ProductCategory, ProductGroup, ProductPriorityGroup};
pub use warehouse::Warehouse;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept integers sent either as JSON numbers or numeric strings
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| serde::de::Error::custom(format!("invalid integer: {n}"))),
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid integer: {s}"))),
        Value::Null => Ok(0),
        other => Err(serde::de::Error::custom(format!(
            "expected integer, got {other}"
        ))),
    }
}

/// Accept decimals sent either as JSON numbers or numeric strings
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid number: {n}"))),
        Value::String(s) if s.trim().is_empty() => Ok(0.0),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid number: {s}"))),
        Value::Null => Ok(0.0),
        other => Err(serde::de::Error::custom(format!(
            "expected number, got {other}"
        ))),
    }
}
