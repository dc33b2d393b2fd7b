//! Data-changing and free-form statements.

use serde::{Deserialize, Serialize};

use crate::core::SqlValue;

/// A column/value pair for INSERT and UPDATE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnValue {
    pub name: String,
    pub value: SqlValue,
    /// Abstract type used to render the literal; inferred from the value when absent.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub type_name: Option<String>,
}

impl ColumnValue {
    pub fn new(name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            type_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    pub values: Vec<ColumnValue>,
}

impl InsertStatement {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            catalog_name: None,
            schema_name: None,
            table_name: table_name.into(),
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.values.push(ColumnValue::new(name, value));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    pub values: Vec<ColumnValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
}

/// SQL supplied verbatim by the change log author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSqlStatement {
    pub sql: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_delimiter: Option<String>,
}

impl RawSqlStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            end_delimiter: None,
        }
    }

    /// SQL with every whitespace run collapsed to one space.
    pub fn normalized_sql(&self) -> String {
        self.sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// A comment written to SQL output; executes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentStatement {
    pub text: String,
}

impl CommentStatement {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_sql_collapses_whitespace() {
        let a = RawSqlStatement::new("SELECT  1\n\tFROM   dual  ");
        let b = RawSqlStatement::new("SELECT 1 FROM dual");
        assert_eq!(a.normalized_sql(), b.normalized_sql());
    }

    #[test]
    fn test_insert_builder_keeps_column_order() {
        let insert = InsertStatement::new("person")
            .with_value("id", 1i64)
            .with_value("name", "Ann");
        let names: Vec<_> = insert.values.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }
}
