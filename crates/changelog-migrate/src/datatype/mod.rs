//! Abstract data types and their per-database spelling.
//!
//! A column's type is written once, abstractly (`varchar(255)`, `int`,
//! `timestamp with time zone`). The [`DataTypeRegistry`] parses the descriptor,
//! finds the mapping unit that claims its name, and the unit renders the
//! physical type for a [`Database`]:
//!
//! ```text
//! "varchar(9000)" ──parse──▶ VarChar unit ──mssql──▶ VARCHAR(MAX)
//!                                          ──oracle─▶ VARCHAR2(9000)
//! ```
//!
//! Units are registered with a priority, exactly like SQL generators, so a
//! caller can override a built-in unit by registering one that claims the same
//! alias at a higher priority.

mod literal;
mod mapping;
mod parse;
mod registry;
mod units;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::SqlValue;
use crate::database::Database;

pub use parse::TypeDescriptor;
pub use registry::DataTypeRegistry;
pub use units::{BaseType, StandardType};

/// Bulk-load category of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadType {
    Numeric,
    String,
    Boolean,
    Date,
    Clob,
    Blob,
    Uuid,
    Computed,
    Bit,
    Unknown,
}

/// A physical type as a particular database spells it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseDataType {
    pub name: String,
    pub parameters: Vec<String>,
    pub additional_info: Option<String>,
}

impl DatabaseDataType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            additional_info: None,
        }
    }

    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_additional_info(mut self, info: Option<String>) -> Self {
        self.additional_info = info.filter(|s| !s.trim().is_empty());
        self
    }
}

impl fmt::Display for DatabaseDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.parameters.is_empty() {
            write!(f, "({})", self.parameters.join(", "))?;
        }
        if let Some(info) = &self.additional_info {
            write!(f, " {}", info)?;
        }
        Ok(())
    }
}

/// One abstract type: the aliases it answers to, how many parameters it
/// takes, and how it is spelled on each database.
pub trait DataTypeUnit: Send + Sync + fmt::Debug {
    /// Canonical lower-case name.
    fn name(&self) -> &str;

    /// Lower-case names (including the canonical one) this unit accepts.
    fn aliases(&self) -> &[&'static str];

    fn min_parameters(&self, _database: &Database) -> usize {
        0
    }

    fn max_parameters(&self, _database: &Database) -> usize {
        0
    }

    /// Priority when several units claim the same alias.
    fn priority(&self) -> i32;

    fn load_type(&self) -> LoadType;

    /// Physical type for `database`.
    fn to_database_type(&self, instance: &DataTypeInstance, database: &Database) -> DatabaseDataType;

    /// Literal for `value` when stored in a column of this type.
    fn value_to_sql_literal(&self, value: &SqlValue, database: &Database) -> String {
        literal::render(value, self.load_type(), false, database)
    }
}

/// A parsed descriptor bound to the unit that claimed it.
#[derive(Debug, Clone)]
pub struct DataTypeInstance {
    pub unit: Arc<dyn DataTypeUnit>,
    pub parameters: Vec<String>,
    pub additional_info: Option<String>,
    pub auto_increment: bool,
    pub unsigned: bool,
    pub array: bool,
    /// The descriptor as written, used by the passthrough unit.
    pub raw_name: String,
}

impl DataTypeInstance {
    pub fn to_database_type(&self, database: &Database) -> DatabaseDataType {
        self.unit.to_database_type(self, database)
    }

    pub fn value_to_sql_literal(&self, value: &SqlValue, database: &Database) -> String {
        self.unit.value_to_sql_literal(value, database)
    }

    pub fn load_type(&self) -> LoadType {
        self.unit.load_type()
    }

    /// First parameter as a number, when there is one and it is numeric.
    pub fn numeric_parameter(&self, index: usize) -> Option<u64> {
        self.parameters.get(index).and_then(|p| p.trim().parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_data_type_display() {
        let t = DatabaseDataType::new("DECIMAL").with_parameters(["10", "2"]);
        assert_eq!(t.to_string(), "DECIMAL(10, 2)");
        let t = DatabaseDataType::new("TIMESTAMP")
            .with_additional_info(Some("WITH TIME ZONE".to_string()));
        assert_eq!(t.to_string(), "TIMESTAMP WITH TIME ZONE");
        let t = DatabaseDataType::new("INT").with_additional_info(Some("  ".to_string()));
        assert_eq!(t.to_string(), "INT");
    }
}
