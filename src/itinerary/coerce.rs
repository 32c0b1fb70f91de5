//! Scalar casting for client-supplied JSON.
//!
//! Clients send checkbox states as `"true"`/`"false"` strings and ratings as
//! either numbers or numeric strings, so every writable scalar goes through
//! one of these functions before it reaches a store.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

pub fn to_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if n.as_f64() == Some(1.0) => Ok(true),
        Value::Number(n) if n.as_f64() == Some(0.0) => Ok(false),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(format!("expected a boolean, got \"{}\"", s)),
        },
        other => Err(format!("expected a boolean, got {}", type_name(other))),
    }
}

pub fn to_text(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected text, got {}", type_name(other))),
    }
}

pub fn to_optional_text(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        other => to_text(other).map(Some),
    }
}

pub fn to_optional_number(value: &Value) -> Result<Option<f64>, String> {
    let number = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        other => return Err(format!("expected a number, got {}", type_name(other))),
    };

    match number {
        Some(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(format!("expected a finite number, got {}", value)),
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (its calendar date is kept).
pub fn to_optional_date(value: &Value) -> Result<Option<NaiveDate>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Ok(Some(date));
            }
            DateTime::parse_from_rfc3339(s)
                .map(|ts| Some(ts.date_naive()))
                .map_err(|_| format!("expected a date (YYYY-MM-DD), got \"{}\"", s))
        }
        other => Err(format!("expected a date, got {}", type_name(other))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// `deserialize_with` adapters over the casting functions above.
pub mod lenient {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let value = Value::deserialize(deserializer)?;
        super::to_bool(&value).map_err(D::Error::custom)
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let value = Value::deserialize(deserializer)?;
        super::to_text(&value).map_err(D::Error::custom)
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        super::to_optional_text(&value).map_err(D::Error::custom)
    }

    pub fn optional_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        super::to_optional_number(&value).map_err(D::Error::custom)
    }

    pub fn optional_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        super::to_optional_date(&value).map_err(D::Error::custom)
    }
}
