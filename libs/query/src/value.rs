//! Typed filter operands and literal parsing

use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::schema::FieldKind;

/// A typed scalar, as stored in a row or parsed from a filter literal.
///
/// Ordering between values of the same variant is the natural one; values of
/// different variants never meet in a well-formed comparison.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Uuid(Uuid),
    Integer(i64),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Boolean(bool),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "string",
            Value::Uuid(_) => "uuid",
            Value::Integer(_) => "integer",
            Value::Date(_) => "date",
            Value::DateTime(_) => "date-time",
            Value::Boolean(_) => "boolean",
        }
    }

    /// Ordering defined only between values of the same variant
    pub fn compare(&self, other: &Value) -> Option<std::cmp::Ordering> {
        if std::mem::discriminant(self) == std::mem::discriminant(other) {
            Some(self.cmp(other))
        } else {
            None
        }
    }

    pub fn to_lowercase(&self) -> Value {
        match self {
            Value::Text(s) => Value::Text(s.to_lowercase()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Uuid(u) => write!(f, "{u}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

/// Strip one layer of surrounding single quotes and un-escape `\'`.
///
/// Whitespace is significant: `' '` is a one-space literal, not an empty bound.
pub fn unquote(raw: &str) -> String {
    let inner = raw
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .unwrap_or(raw);
    inner.replace("\\'", "'")
}

pub fn try_parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Bare date (UTC midnight), RFC 3339 instant, or offset date-time without seconds
pub fn try_parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Some(date) = try_parse_date(raw) {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|midnight| Utc.from_utc_datetime(&midnight));
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn try_parse_boolean(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse an unquoted literal according to a field's declared kind.
///
/// Text keeps its case; enum literals are normalized to their canonical value.
pub fn parse_literal(field: &str, kind: &FieldKind, raw: &str) -> Result<Value> {
    let invalid = || Error::invalid_value(field, kind.name(), raw);

    match kind {
        FieldKind::Text => Ok(Value::Text(raw.to_string())),
        FieldKind::Uuid => Uuid::parse_str(raw).map(Value::Uuid).map_err(|_| invalid()),
        FieldKind::Integer => raw.parse::<i64>().map(Value::Integer).map_err(|_| invalid()),
        FieldKind::Date => try_parse_date(raw).map(Value::Date).ok_or_else(invalid),
        FieldKind::DateTime => try_parse_datetime(raw).map(Value::DateTime).ok_or_else(invalid),
        FieldKind::Boolean => try_parse_boolean(raw).map(Value::Boolean).ok_or_else(invalid),
        FieldKind::Enum(values) => values
            .iter()
            .find(|v| v.eq_ignore_ascii_case(raw))
            .map(|v| Value::Text((*v).to_string()))
            .ok_or_else(invalid),
    }
}

/// Whitespace-separated search terms
pub fn search_terms(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquote_strips_one_layer() {
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("''abc''"), "'abc'");
        assert_eq!(unquote(r"O\'Brien"), "O'Brien");
        assert_eq!(unquote("'"), "'");
        assert_eq!(unquote("  plain "), "  plain ");
        assert_eq!(unquote("' '"), " ");
    }

    #[test]
    fn datetime_accepts_three_forms() {
        let midnight = try_parse_datetime("2024-05-01").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2024-05-01T00:00:00+00:00");

        let instant = try_parse_datetime("2024-05-01T10:15:30Z").unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-05-01T10:15:30+00:00");

        let offset = try_parse_datetime("2024-05-01T12:15:30+02:00").unwrap();
        assert_eq!(offset, instant);

        let short = try_parse_datetime("2024-05-01T12:15+02:00").unwrap();
        assert_eq!(short.to_rfc3339(), "2024-05-01T10:15:00+00:00");

        assert!(try_parse_datetime("yesterday").is_none());
    }

    #[test]
    fn boolean_spellings() {
        for raw in ["true", "TRUE", "1", "yes", "On"] {
            assert_eq!(try_parse_boolean(raw), Some(true), "{raw}");
        }
        for raw in ["false", "0", "no", "OFF"] {
            assert_eq!(try_parse_boolean(raw), Some(false), "{raw}");
        }
        assert_eq!(try_parse_boolean("maybe"), None);
    }

    #[test]
    fn literal_errors_name_the_field() {
        let err = parse_literal("athleteId", &FieldKind::Uuid, "not-a-uuid").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid uuid value for field 'athleteId': not-a-uuid"
        );
        assert!(parse_literal("year", &FieldKind::Integer, "20x4").is_err());
        assert!(parse_literal("dob", &FieldKind::Date, "2024-13-01").is_err());
    }

    #[test]
    fn enum_literals_are_canonical() {
        const STATUS: &[&str] = &["ACTIVE", "EXPIRED"];
        let value = parse_literal("status", &FieldKind::Enum(STATUS), "active").unwrap();
        assert_eq!(value, Value::text("ACTIVE"));
        assert!(parse_literal("status", &FieldKind::Enum(STATUS), "gone").is_err());
    }

    #[test]
    fn ordering_within_a_variant() {
        assert!(Value::Integer(2) < Value::Integer(10));
        assert_eq!(Value::Integer(1).compare(&Value::text("1")), None);
    }

    #[test]
    fn display_is_stable() {
        let dt = try_parse_datetime("2024-05-01T10:15:30Z").unwrap();
        assert_eq!(Value::DateTime(dt).to_string(), "2024-05-01T10:15:30Z");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Date(try_parse_date("2000-01-02").unwrap()).to_string(), "2000-01-02");
    }

    #[test]
    fn terms_split_on_whitespace() {
        assert_eq!(search_terms("  ana \t  maria "), vec!["ana", "maria"]);
        assert!(search_terms("   ").is_empty());
    }
}
