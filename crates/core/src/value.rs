#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

/// Declared column type. Drives both the coercion of untrusted input and the
/// decoding of stored values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Boolean,
    Date,
    Time,
    Timestamp,
    Json,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::Json => "json",
        }
    }

    /// Converts an untrusted JSON value into the value stored for this type.
    pub fn coerce(self, value: &Value, nullable: bool) -> Result<SqlValue, TypeError> {
        if value.is_null() {
            return if nullable {
                Ok(SqlValue::Null)
            } else {
                Err(TypeError::NullNotAllowed)
            };
        }

        match self {
            Self::Text => match value {
                Value::String(text) => Ok(SqlValue::Text(text.clone())),
                Value::Number(number) => Ok(SqlValue::Text(number.to_string())),
                other => Err(self.expected(other)),
            },
            Self::Integer => match value {
                Value::Number(number) => number_as_i64(number)
                    .map(SqlValue::Integer)
                    .ok_or_else(|| self.invalid(number.to_string())),
                Value::String(text) => text
                    .trim()
                    .parse::<i64>()
                    .map(SqlValue::Integer)
                    .map_err(|_| self.invalid(text)),
                other => Err(self.expected(other)),
            },
            Self::Real => match value {
                Value::Number(number) => number
                    .as_f64()
                    .filter(|f| f.is_finite())
                    .map(SqlValue::Real)
                    .ok_or_else(|| self.invalid(number.to_string())),
                Value::String(text) => text
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(SqlValue::Real)
                    .ok_or_else(|| self.invalid(text)),
                other => Err(self.expected(other)),
            },
            Self::Boolean => match value {
                Value::Bool(flag) => Ok(SqlValue::Integer(i64::from(*flag))),
                Value::Number(number) => match number.as_i64() {
                    Some(0) => Ok(SqlValue::Integer(0)),
                    Some(1) => Ok(SqlValue::Integer(1)),
                    _ => Err(self.invalid(number.to_string())),
                },
                Value::String(text) => parse_bool(text)
                    .map(|flag| SqlValue::Integer(i64::from(flag)))
                    .ok_or_else(|| self.invalid(text)),
                other => Err(self.expected(other)),
            },
            Self::Date | Self::Time | Self::Timestamp => match value {
                Value::String(text) => self
                    .canonical_temporal(text.trim())
                    .map(SqlValue::Text)
                    .ok_or_else(|| self.invalid(text)),
                other => Err(self.expected(other)),
            },
            Self::Json => Ok(SqlValue::Text(value.to_string())),
        }
    }

    /// Checks that an already-coerced value is representable by this type.
    pub fn check_bound(self, value: &SqlValue, nullable: bool) -> Result<(), TypeError> {
        let ok = match (self, value) {
            (_, SqlValue::Null) => {
                return if nullable {
                    Ok(())
                } else {
                    Err(TypeError::NullNotAllowed)
                };
            }
            (Self::Integer, SqlValue::Integer(_)) => true,
            (Self::Real, SqlValue::Integer(_) | SqlValue::Real(_)) => true,
            (Self::Boolean, SqlValue::Integer(n)) => matches!(n, 0 | 1),
            (Self::Text, SqlValue::Text(_)) => true,
            (Self::Date | Self::Time | Self::Timestamp, SqlValue::Text(text)) => {
                self.canonical_temporal(text).as_deref() == Some(text.as_str())
            }
            (Self::Json, SqlValue::Text(text)) => serde_json::from_str::<Value>(text).is_ok(),
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(TypeError::Invalid {
                expected: self,
                value: value.to_string(),
            })
        }
    }

    /// Decodes a stored value into its JSON presentation.
    pub fn decode(self, value: &SqlValue) -> Value {
        match (self, value) {
            (_, SqlValue::Null) => Value::Null,
            (Self::Boolean, SqlValue::Integer(n)) => Value::Bool(*n != 0),
            (Self::Real, SqlValue::Integer(n)) => Number::from_f64(*n as f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            (Self::Json, SqlValue::Text(text)) => {
                serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
            }
            (_, other) => other.to_json(),
        }
    }

    fn canonical_temporal(self, raw: &str) -> Option<String> {
        match self {
            Self::Date => {
                let format = format_description!("[year]-[month]-[day]");
                let date = Date::parse(raw, &format).ok()?;
                date.format(&format).ok()
            }
            Self::Time => {
                let full = format_description!("[hour]:[minute]:[second]");
                let short = format_description!("[hour]:[minute]");
                let time = Time::parse(raw, &full)
                    .or_else(|_| Time::parse(raw, &short))
                    .ok()?;
                time.format(&full).ok()
            }
            Self::Timestamp => {
                if let Ok(stamp) = OffsetDateTime::parse(raw, &Rfc3339) {
                    return stamp.format(&Rfc3339).ok();
                }
                let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
                let stamp = PrimitiveDateTime::parse(raw, &format).ok()?;
                stamp.format(&format).ok()
            }
            _ => None,
        }
    }

    fn expected(self, found: &Value) -> TypeError {
        TypeError::Expected {
            expected: self,
            found: json_kind(found),
        }
    }

    fn invalid(self, value: impl Into<String>) -> TypeError {
        TypeError::Invalid {
            expected: self,
            value: value.into(),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value bound as a statement parameter. Never interpolated into SQL text.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Integer(n) => Value::Number((*n).into()),
            Self::Real(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Text(text) => Value::String(text.clone()),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(text) => write!(f, "{text:?}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("null is not allowed for this column")]
    NullNotAllowed,
    #[error("expected {expected}, found {found}")]
    Expected {
        expected: ColumnType,
        found: &'static str,
    },
    #[error("{value} is not a valid {expected}")]
    Invalid { expected: ColumnType, value: String },
}

fn number_as_i64(number: &Number) -> Option<i64> {
    if let Some(n) = number.as_i64() {
        return Some(n);
    }
    // 2^53: beyond this an f64 no longer names a unique integer.
    let f = number.as_f64()?;
    if f.fract() == 0.0 && f.abs() <= 9_007_199_254_740_992.0 {
        return Some(f as i64);
    }
    None
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dates_are_validated_and_canonical() {
        assert_eq!(
            ColumnType::Date.coerce(&json!("2024-08-15"), false),
            Ok(SqlValue::Text("2024-08-15".to_string()))
        );
        assert!(matches!(
            ColumnType::Date.coerce(&json!("next tuesday"), false),
            Err(TypeError::Invalid { .. })
        ));
        assert!(ColumnType::Date.coerce(&json!("2024-02-30"), false).is_err());
        assert!(matches!(
            ColumnType::Date.coerce(&json!(20240815), false),
            Err(TypeError::Expected { found: "number", .. })
        ));
    }

    #[test]
    fn times_and_timestamps_normalize() {
        assert_eq!(
            ColumnType::Time.coerce(&json!("09:30"), false),
            Ok(SqlValue::Text("09:30:00".to_string()))
        );
        assert_eq!(
            ColumnType::Timestamp.coerce(&json!("2024-08-15T10:00:00Z"), false),
            Ok(SqlValue::Text("2024-08-15T10:00:00Z".to_string()))
        );
        assert_eq!(
            ColumnType::Timestamp.coerce(&json!("2024-08-15 10:00:00"), false),
            Ok(SqlValue::Text("2024-08-15 10:00:00".to_string()))
        );
    }

    #[test]
    fn numbers_and_booleans() {
        assert_eq!(
            ColumnType::Integer.coerce(&json!("42"), false),
            Ok(SqlValue::Integer(42))
        );
        assert_eq!(
            ColumnType::Integer.coerce(&json!(7.0), false),
            Ok(SqlValue::Integer(7))
        );
        assert!(ColumnType::Integer.coerce(&json!(7.5), false).is_err());
        assert_eq!(
            ColumnType::Real.coerce(&json!("2.5"), false),
            Ok(SqlValue::Real(2.5))
        );
        assert_eq!(
            ColumnType::Boolean.coerce(&json!("Yes"), false),
            Ok(SqlValue::Integer(1))
        );
        assert!(ColumnType::Boolean.coerce(&json!("maybe"), false).is_err());
        assert!(ColumnType::Text.coerce(&json!(true), false).is_err());
    }

    #[test]
    fn null_respects_nullability() {
        assert_eq!(
            ColumnType::Text.coerce(&Value::Null, true),
            Ok(SqlValue::Null)
        );
        assert_eq!(
            ColumnType::Text.coerce(&Value::Null, false),
            Err(TypeError::NullNotAllowed)
        );
    }

    #[test]
    fn decode_follows_declared_type() {
        assert_eq!(
            ColumnType::Boolean.decode(&SqlValue::Integer(1)),
            json!(true)
        );
        assert_eq!(
            ColumnType::Json.decode(&SqlValue::Text(r#"{"a":1}"#.to_string())),
            json!({"a": 1})
        );
        assert_eq!(ColumnType::Real.decode(&SqlValue::Integer(3)), json!(3.0));
        assert_eq!(
            ColumnType::Date.decode(&SqlValue::Text("2024-08-15".to_string())),
            json!("2024-08-15")
        );
    }

    #[test]
    fn check_bound_rejects_unrepresentable_values() {
        assert!(
            ColumnType::Date
                .check_bound(&SqlValue::Text("15/08/2024".to_string()), false)
                .is_err()
        );
        assert!(
            ColumnType::Boolean
                .check_bound(&SqlValue::Integer(2), false)
                .is_err()
        );
        assert!(
            ColumnType::Integer
                .check_bound(&SqlValue::Integer(2), false)
                .is_ok()
        );
    }
}
