//! Conversions between [`Value`] and `serde_json::Value`.
//!
//! Data blobs travel through JSON as
//! `data:application/octet-stream;base64,...` strings and dates as plain
//! seconds since the platform epoch, so a date comes back as a real.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Number};

use crate::error::BplistError;
use crate::Value;

/// Prefix of JSON strings that carry a data blob.
pub const DATA_URI_PREFIX: &str = "data:application/octet-stream;base64,";

fn real_to_json(float: f64) -> serde_json::Value {
    // JSON has no NaN or infinities.
    Number::from_f64(float)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::from(i),
            Value::Real(f) => real_to_json(f),
            Value::Date(d) => real_to_json(d.seconds()),
            Value::Data(bytes) => {
                serde_json::Value::String(format!("{DATA_URI_PREFIX}{}", STANDARD.encode(bytes)))
            }
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Dictionary(dict) => serde_json::Value::Object(
                dict.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = BplistError;

    fn try_from(v: serde_json::Value) -> Result<Self, Self::Error> {
        Ok(match v {
            serde_json::Value::Null => {
                return Err(BplistError::UnsupportedType("null".to_owned()));
            }
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if n.is_u64() {
                    return Err(BplistError::UnsupportedType(format!(
                        "integer {n} is out of the signed 64-bit range"
                    )));
                } else {
                    Value::Real(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => match s.strip_prefix(DATA_URI_PREFIX) {
                Some(b64) => match STANDARD.decode(b64) {
                    Ok(bytes) => Value::Data(bytes),
                    Err(_) => Value::String(s),
                },
                None => Value::String(s),
            },
            serde_json::Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(obj) => Value::Dictionary(
                obj.into_iter()
                    .map(|(k, v)| Value::try_from(v).map(|v| (k, v)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}
