//! SQL value type used for statement arguments and result extraction
//!
//! Statement data (`Record`) maps column names to `SqlValue`s, and the driver
//! converters turn every fetched column into one before it becomes JSON.

use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Ordered column → value mapping used as statement data and WHERE clauses
pub type Record = IndexMap<String, SqlValue>;

/// Generic SQL value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Bool(bool),

    Int(i32),
    BigInt(i64),
    UnsignedBigInt(u64),

    Float(f32),
    Double(f64),
    Decimal(Decimal),

    String(String),
    Text(String),

    Bytes(Vec<u8>),

    Json(JsonValue),
    Date(String),     // ISO date: "2024-01-15"
    Time(String),     // ISO time: "14:30:00"
    DateTime(String), // ISO datetime: "2024-01-15T10:30:00"
    Timestamp(i64),   // seconds since epoch
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Integer literal for `%d` substitution
    ///
    /// Strings contribute their leading numeric prefix (`"12abc"` is 12, `"abc"`
    /// is 0), floats and decimals are truncated toward zero, null and false
    /// are 0. The full magnitude is kept, so `u64::MAX` renders unchanged.
    pub fn integer_literal(&self) -> String {
        match self {
            SqlValue::Null | SqlValue::Bool(false) => "0".to_string(),
            SqlValue::Bool(true) => "1".to_string(),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::BigInt(i) | SqlValue::Timestamp(i) => i.to_string(),
            SqlValue::UnsignedBigInt(i) => i.to_string(),
            SqlValue::Float(f) => truncate(f64::from(*f)),
            SqlValue::Double(f) => truncate(*f),
            SqlValue::Decimal(d) => {
                let whole = d.trunc();
                if whole.is_zero() {
                    "0".to_string()
                } else {
                    whole.normalize().to_string()
                }
            }
            SqlValue::String(s)
            | SqlValue::Text(s)
            | SqlValue::Date(s)
            | SqlValue::Time(s)
            | SqlValue::DateTime(s) => leading_integer(s),
            SqlValue::Json(j) => match j {
                JsonValue::Number(n) => match (n.as_i64(), n.as_u64()) {
                    (Some(i), _) => i.to_string(),
                    (None, Some(u)) => u.to_string(),
                    _ => n.as_f64().map(truncate).unwrap_or_else(|| "0".to_string()),
                },
                JsonValue::String(s) => leading_integer(s),
                JsonValue::Bool(b) => u8::from(*b).to_string(),
                _ => "0".to_string(),
            },
            SqlValue::Bytes(b) => leading_integer(&String::from_utf8_lossy(b)),
        }
    }

    /// Floating point value for `%f` substitution
    pub fn as_float(&self) -> f64 {
        match self {
            SqlValue::Null => 0.0,
            SqlValue::Bool(b) => f64::from(u8::from(*b)),
            SqlValue::Int(i) => f64::from(*i),
            SqlValue::BigInt(i) | SqlValue::Timestamp(i) => *i as f64,
            SqlValue::UnsignedBigInt(i) => *i as f64,
            SqlValue::Float(f) => f64::from(*f),
            SqlValue::Double(f) => *f,
            SqlValue::Decimal(d) => d.to_f64().unwrap_or(0.0),
            SqlValue::String(s)
            | SqlValue::Text(s)
            | SqlValue::Date(s)
            | SqlValue::Time(s)
            | SqlValue::DateTime(s) => leading_float(s),
            SqlValue::Json(j) => match j {
                JsonValue::Number(n) => n.as_f64().unwrap_or(0.0),
                JsonValue::String(s) => leading_float(s),
                JsonValue::Bool(b) => f64::from(u8::from(*b)),
                _ => 0.0,
            },
            SqlValue::Bytes(b) => leading_float(&String::from_utf8_lossy(b)),
        }
    }

    /// Text value for `%s` substitution, before escaping
    ///
    /// Null and false render as the empty string, true as `1`.
    pub fn as_text(&self) -> String {
        match self {
            SqlValue::Null => String::new(),
            SqlValue::Bool(true) => "1".to_string(),
            SqlValue::Bool(false) => String::new(),
            SqlValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            other => other.to_string(),
        }
    }

    /// Whether the value reads as a number (used by column validation)
    pub fn is_numeric(&self) -> bool {
        match self {
            SqlValue::Int(_)
            | SqlValue::BigInt(_)
            | SqlValue::UnsignedBigInt(_)
            | SqlValue::Float(_)
            | SqlValue::Double(_)
            | SqlValue::Decimal(_)
            | SqlValue::Timestamp(_) => true,
            SqlValue::String(s) | SqlValue::Text(s) => s.trim().parse::<f64>().is_ok(),
            SqlValue::Json(JsonValue::Number(_)) => true,
            _ => false,
        }
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlValue::Null => JsonValue::Null,
            SqlValue::Bool(b) => JsonValue::Bool(*b),
            SqlValue::Int(i) => JsonValue::Number((*i).into()),
            SqlValue::BigInt(i) | SqlValue::Timestamp(i) => JsonValue::Number((*i).into()),
            SqlValue::UnsignedBigInt(i) => JsonValue::Number((*i).into()),
            SqlValue::Float(f) => serde_json::Number::from_f64(f64::from(*f))
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            SqlValue::Double(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            SqlValue::Decimal(d) => JsonValue::String(d.to_string()),
            SqlValue::String(s)
            | SqlValue::Text(s)
            | SqlValue::Date(s)
            | SqlValue::Time(s)
            | SqlValue::DateTime(s) => JsonValue::String(s.clone()),
            SqlValue::Json(j) => j.clone(),
            SqlValue::Bytes(bytes) => JsonValue::String(base64_encode(bytes)),
        }
    }

    /// Convert a fetched JSON cell back into a value usable as statement data
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => SqlValue::Null,
            JsonValue::Bool(b) => SqlValue::Bool(*b),
            JsonValue::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => SqlValue::BigInt(i),
                (None, Some(u)) => SqlValue::UnsignedBigInt(u),
                _ => SqlValue::Double(n.as_f64().unwrap_or(0.0)),
            },
            JsonValue::String(s) => SqlValue::String(s.clone()),
            other => SqlValue::Json(other.clone()),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::BigInt(i) | SqlValue::Timestamp(i) => write!(f, "{}", i),
            SqlValue::UnsignedBigInt(i) => write!(f, "{}", i),
            SqlValue::Float(fl) => write!(f, "{}", fl),
            SqlValue::Double(d) => write!(f, "{}", d),
            SqlValue::Decimal(d) => write!(f, "{}", d),
            SqlValue::String(s)
            | SqlValue::Text(s)
            | SqlValue::Date(s)
            | SqlValue::Time(s)
            | SqlValue::DateTime(s) => write!(f, "{}", s),
            SqlValue::Json(j) => write!(f, "{}", j),
            SqlValue::Bytes(b) => write!(f, "<binary:{} bytes>", b.len()),
        }
    }
}

fn truncate(f: f64) -> String {
    let whole = f.trunc();
    if whole.is_finite() && whole != 0.0 {
        format!("{:.0}", whole)
    } else {
        "0".to_string()
    }
}

/// Length of the `[ws][sign]digits` prefix of `s`
fn integer_prefix(s: &str) -> (&str, usize) {
    let trimmed = s.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return (trimmed, 0);
    }
    (trimmed, end)
}

fn leading_integer(s: &str) -> String {
    let (trimmed, end) = integer_prefix(s);
    let prefix = &trimmed[..end];
    let (negative, digits) = match prefix.as_bytes().first() {
        Some(b'-') => (true, &prefix[1..]),
        Some(b'+') => (false, &prefix[1..]),
        _ => (false, prefix),
    };
    let digits = digits.trim_start_matches('0');
    match (negative, digits.is_empty()) {
        (_, true) => "0".to_string(),
        (true, false) => format!("-{}", digits),
        (false, false) => digits.to_string(),
    }
}

fn leading_float(s: &str) -> f64 {
    let trimmed = s.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let mut seen_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        seen_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            seen_digit = true;
        }
    }
    if !seen_digit {
        return 0.0;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    trimmed[..end].parse::<f64>().unwrap_or(0.0)
}

fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

// From trait implementations for common types
impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::BigInt(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::BigInt(i64::from(v))
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::UnsignedBigInt(v)
    }
}

impl From<usize> for SqlValue {
    fn from(v: usize) -> Self {
        SqlValue::UnsignedBigInt(v as u64)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Float(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Double(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(d: Decimal) -> Self {
        SqlValue::Decimal(d)
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::String(s)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::String(s.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(s: &String) -> Self {
        SqlValue::String(s.clone())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<JsonValue> for SqlValue {
    fn from(v: JsonValue) -> Self {
        SqlValue::Json(v)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => SqlValue::Null,
        }
    }
}

// Date/Time type conversions
impl From<chrono::DateTime<chrono::Utc>> for SqlValue {
    fn from(dt: chrono::DateTime<chrono::Utc>) -> Self {
        SqlValue::DateTime(dt.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

impl From<chrono::NaiveDate> for SqlValue {
    fn from(date: chrono::NaiveDate) -> Self {
        SqlValue::Date(date.to_string())
    }
}

impl From<chrono::NaiveTime> for SqlValue {
    fn from(time: chrono::NaiveTime) -> Self {
        SqlValue::Time(time.to_string())
    }
}

impl From<chrono::NaiveDateTime> for SqlValue {
    fn from(dt: chrono::NaiveDateTime) -> Self {
        SqlValue::DateTime(dt.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_conversion_reads_leading_digits() {
        assert_eq!(SqlValue::from("5").integer_literal(), "5");
        assert_eq!(SqlValue::from("  42 apples").integer_literal(), "42");
        assert_eq!(SqlValue::from("-7x").integer_literal(), "-7");
        assert_eq!(SqlValue::from("+007").integer_literal(), "7");
        assert_eq!(SqlValue::from("-0").integer_literal(), "0");
        assert_eq!(SqlValue::from("apples").integer_literal(), "0");
        assert_eq!(SqlValue::Double(3.99).integer_literal(), "3");
        assert_eq!(SqlValue::Double(-0.5).integer_literal(), "0");
        assert_eq!(SqlValue::Double(f64::NAN).integer_literal(), "0");
        assert_eq!(SqlValue::Bool(true).integer_literal(), "1");
        assert_eq!(SqlValue::Null.integer_literal(), "0");
    }

    #[test]
    fn integer_conversion_keeps_the_full_magnitude() {
        assert_eq!(
            SqlValue::UnsignedBigInt(u64::MAX).integer_literal(),
            "18446744073709551615"
        );
        assert_eq!(
            SqlValue::from("123456789012345678901234567890 rows").integer_literal(),
            "123456789012345678901234567890"
        );
        let big: Decimal = "12345678901234567890123.75".parse().unwrap();
        assert_eq!(
            SqlValue::Decimal(big).integer_literal(),
            "12345678901234567890123"
        );
        assert_eq!(
            SqlValue::Decimal(Decimal::new(-125, 1)).integer_literal(),
            "-12"
        );
    }

    #[test]
    fn float_conversion_reads_leading_number() {
        assert_eq!(SqlValue::from("1.5kg").as_float(), 1.5);
        assert_eq!(SqlValue::from("2e3").as_float(), 2000.0);
        assert_eq!(SqlValue::from(".25").as_float(), 0.25);
        assert_eq!(SqlValue::from("e5").as_float(), 0.0);
        assert_eq!(SqlValue::Int(4).as_float(), 4.0);
    }

    #[test]
    fn text_conversion_follows_loose_string_rules() {
        assert_eq!(SqlValue::Null.as_text(), "");
        assert_eq!(SqlValue::Bool(true).as_text(), "1");
        assert_eq!(SqlValue::Bool(false).as_text(), "");
        assert_eq!(SqlValue::Int(12).as_text(), "12");
        assert_eq!(SqlValue::from("a'b").as_text(), "a'b");
    }

    #[test]
    fn json_round_trip_of_cells() {
        assert_eq!(
            SqlValue::from_json(&serde_json::json!(10)),
            SqlValue::BigInt(10)
        );
        assert_eq!(
            SqlValue::from_json(&serde_json::json!("x")),
            SqlValue::String("x".into())
        );
        assert_eq!(SqlValue::Bytes(vec![1, 2]).to_json(), "AQI=");
        assert_eq!(SqlValue::from(None::<i32>), SqlValue::Null);
    }
}
