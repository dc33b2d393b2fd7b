//! SQL values used for column defaults, inserted data and query results.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A database-agnostic value.
///
/// Statements carry these as defaults and insert values; the data-type layer
/// renders them as dialect literals. Query results come back as the same type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SqlValue {
    /// SQL NULL.
    Null,

    /// Boolean value.
    Bool(bool),

    /// Integer value.
    Int(i64),

    /// Exact numeric kept as written (e.g. "12.50").
    Numeric(String),

    /// Floating point value.
    Float(f64),

    /// Character data.
    Text(String),

    /// Date without time component.
    Date(NaiveDate),

    /// Time without date component.
    Time(NaiveTime),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),

    /// A database function emitted verbatim (e.g. `CURRENT_TIMESTAMP`).
    Function(String),

    /// The current date/time as the target database spells it.
    CurrentDateTime,

    /// Next value of the named sequence.
    SequenceNext(String),
}

impl SqlValue {
    /// Check if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Text view of the value, as a driver would hand it back.
    pub fn as_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Bool(v) => Some(v.to_string()),
            SqlValue::Int(v) => Some(v.to_string()),
            SqlValue::Numeric(v) | SqlValue::Text(v) | SqlValue::Function(v) => Some(v.clone()),
            SqlValue::Float(v) => Some(v.to_string()),
            SqlValue::Date(v) => Some(v.format("%Y-%m-%d").to_string()),
            SqlValue::Time(v) => Some(v.format("%H:%M:%S").to_string()),
            SqlValue::DateTime(v) => Some(v.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            SqlValue::CurrentDateTime => None,
            SqlValue::SequenceNext(v) => Some(v.clone()),
        }
    }

    /// Interpret the value as an integer, accepting numeric text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::Bool(v) => Some(i64::from(*v)),
            SqlValue::Float(v) => Some(*v as i64),
            SqlValue::Numeric(v) | SqlValue::Text(v) => v.trim().parse().ok(),
            _ => None,
        }
    }

    /// Interpret the value as a boolean, accepting the spellings drivers use
    /// for boolean columns stored as numbers or characters.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(v) => Some(*v),
            SqlValue::Int(v) => Some(*v != 0),
            SqlValue::Numeric(v) | SqlValue::Text(v) => match v.trim().to_ascii_lowercase().as_str()
            {
                "1" | "t" | "true" | "y" | "yes" => Some(true),
                "0" | "f" | "false" | "n" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Interpret the value as a UTC timestamp, accepting the common textual forms.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            SqlValue::DateTime(v) => Some(v.and_utc()),
            SqlValue::Date(v) => v.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
            SqlValue::Text(v) => parse_timestamp(v),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None if matches!(self, SqlValue::CurrentDateTime) => f.write_str("CURRENT_TIMESTAMP"),
            None => f.write_str("NULL"),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.and_utc())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

/// One result row: column names (upper-cased) paired with values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Build a row from parallel column/value lists.
    pub fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Self {
        let columns = columns.into_iter().map(|c| c.to_uppercase()).collect();
        Self { columns, values }
    }

    /// Value for a column, matched case-insensitively.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        let column = column.to_uppercase();
        self.columns
            .iter()
            .position(|c| *c == column)
            .and_then(|i| self.values.get(i))
    }

    /// Value by position.
    pub fn get_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Non-null text value of a column.
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(SqlValue::as_text)
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a row with no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup_is_case_insensitive() {
        let row = Row::new(
            vec!["id".into(), "Locked".into()],
            vec![SqlValue::Int(1), SqlValue::Int(0)],
        );
        assert_eq!(row.get("ID"), Some(&SqlValue::Int(1)));
        assert_eq!(row.get("locked").and_then(SqlValue::as_bool), Some(false));
        assert!(row.get("missing").is_none());
        assert_eq!(row.columns(), &["ID".to_string(), "LOCKED".to_string()]);
    }

    #[test]
    fn test_as_bool_spellings() {
        assert_eq!(SqlValue::Text("t".into()).as_bool(), Some(true));
        assert_eq!(SqlValue::Text("FALSE".into()).as_bool(), Some(false));
        assert_eq!(SqlValue::Int(1).as_bool(), Some(true));
        assert_eq!(SqlValue::Text("maybe".into()).as_bool(), None);
        assert_eq!(SqlValue::Null.as_bool(), None);
    }

    #[test]
    fn test_as_i64_from_text() {
        assert_eq!(SqlValue::Text(" 42 ".into()).as_i64(), Some(42));
        assert_eq!(SqlValue::Numeric("7".into()).as_i64(), Some(7));
        assert_eq!(SqlValue::Text("x".into()).as_i64(), None);
    }

    #[test]
    fn test_as_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(10, 30, 0))
            .map(|dt| dt.and_utc());
        assert_eq!(SqlValue::Text("2024-03-01 10:30:00".into()).as_datetime(), expected);
        assert_eq!(SqlValue::Text("2024-03-01T10:30:00Z".into()).as_datetime(), expected);
        assert_eq!(SqlValue::Text("2024-03-01 10:30:00.000".into()).as_datetime(), expected);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(SqlValue::from(None::<String>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("x")), SqlValue::Text("x".into()));
    }
}
