//! SQL generation.
//!
//! Every [`Statement`] kind has one or more [`SqlGenerator`]s. For a given
//! statement and [`Database`] the [`GeneratorRegistry`] keeps the generators
//! whose [`SqlGenerator::supports`] accepts the pair, orders them by
//! descending priority and runs the first. A generator may hand off to the
//! next lower-priority candidate through the [`GeneratorChain`] it receives,
//! then add to or rewrite what comes back.
//!
//! ```text
//! CreateTable on postgres
//!   ├─ PostgresCreateTable   (PRIORITY_DATABASE) ── chain.generate_sql() ─┐
//!   └─ CreateTable           (PRIORITY_DEFAULT)  ◀────────────────────────┘
//! ```

mod family;
mod registry;
mod standard;

use std::fmt;

use crate::core::identifier::validate_identifier;
use crate::database::Database;
use crate::error::{MigrateError, Result};
use crate::statement::{Statement, StatementKind};

pub use registry::{GeneratorChain, GeneratorRegistry};

/// Best-effort generators used only when nothing else applies.
pub const PRIORITY_NONE: i32 = -1;
/// Standard generators.
pub const PRIORITY_DEFAULT: i32 = 1;
/// Family-specific overrides.
pub const PRIORITY_DATABASE: i32 = 5;

/// One generated SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sql {
    text: String,
    end_delimiter: String,
    affected: Vec<String>,
}

impl Sql {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            end_delimiter: ";".to_string(),
            affected: Vec::new(),
        }
    }

    /// Record the (escaped) name of an object this statement touches.
    pub fn affecting(mut self, object: impl Into<String>) -> Self {
        self.affected.push(object.into());
        self
    }

    pub fn with_end_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.end_delimiter = delimiter.into();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn end_delimiter(&self) -> &str {
        &self.end_delimiter
    }

    pub fn affected_objects(&self) -> &[String] {
        &self.affected
    }

    /// Script form: text, delimiter and a blank line. The standard `;`
    /// delimiter is replaced by `delimiter`.
    pub fn to_script(&self, delimiter: &str) -> String {
        let end = match self.end_delimiter.as_str() {
            ";" => delimiter,
            other => other,
        };
        format!("{}{}\n\n", self.text, end)
    }
}

impl fmt::Display for Sql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Validation outcome: errors stop generation, warnings are reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.errors.contains(&message) {
            self.errors.push(message);
        }
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Error when a required field is blank.
    pub fn check_required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add_error(format!("{} is required", field));
        }
    }

    /// Error when a required name is blank or cannot be used as an identifier.
    pub fn check_identifier(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.check_required(field, value);
        } else if let Err(e) = validate_identifier(value) {
            let reason = match e {
                MigrateError::Config(reason) => reason,
                other => other.to_string(),
            };
            self.add_error(format!("{}: {}", field, reason));
        }
    }

    pub fn check_required_opt(&mut self, field: &str, value: Option<&str>) {
        self.check_required(field, value.unwrap_or_default());
    }

    /// Error when a field is set that `database` cannot honour.
    pub fn check_disallowed(&mut self, field: &str, present: bool, database: &Database) {
        if present {
            self.add_error(format!("{} is not allowed on {}", field, database.short_name()));
        }
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        for error in other.errors {
            self.add_error(error);
        }
        self.warnings.extend(other.warnings);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// `Err(MigrateError::Validation)` when any error was recorded.
    pub fn into_result(self) -> Result<()> {
        if self.has_errors() {
            Err(MigrateError::Validation(self))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.errors.iter().map(|e| format!("  - {}", e)).collect();
        f.write_str(&lines.join("\n"))
    }
}

/// Turns one statement kind into SQL for the databases it supports.
pub trait SqlGenerator: Send + Sync {
    /// Name used in logs and tie warnings.
    fn name(&self) -> &'static str;

    fn statement_kind(&self) -> StatementKind;

    fn priority(&self) -> i32 {
        PRIORITY_DEFAULT
    }

    fn supports(&self, _statement: &Statement, _database: &Database) -> bool {
        true
    }

    /// Check the statement before any SQL is produced. Implementations may
    /// compose with lower-priority rules through `chain.validate`.
    fn validate(
        &self,
        _statement: &Statement,
        _database: &Database,
        _chain: &mut GeneratorChain<'_>,
    ) -> ValidationErrors {
        ValidationErrors::new()
    }

    /// Non-fatal observations, such as a clause the database ignores.
    fn warnings(
        &self,
        statement: &Statement,
        database: &Database,
        chain: &mut GeneratorChain<'_>,
    ) -> Vec<String> {
        chain.warnings(statement, database)
    }

    fn generate_sql(
        &self,
        statement: &Statement,
        database: &Database,
        chain: &mut GeneratorChain<'_>,
    ) -> Result<Vec<Sql>>;
}

/// Borrow the payload of the statement variant a generator handles.
macro_rules! payload {
    ($statement:expr, $variant:ident) => {
        match $statement {
            $crate::statement::Statement::$variant(inner) => Ok(inner),
            other => Err($crate::error::MigrateError::unsupported(
                other.kind().name(),
                concat!("generator for ", stringify!($variant)),
            )),
        }
    };
}
pub(crate) use payload;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseKind;

    #[test]
    fn test_validation_errors_collect_all_messages() {
        let db = Database::new(DatabaseKind::MySql);
        let mut errors = ValidationErrors::new();
        errors.check_required("tableName", "");
        errors.check_required_opt("columnType", None);
        errors.check_disallowed("addBeforeColumn", true, &db);
        errors.check_required("columnName", "id");
        assert_eq!(errors.errors().len(), 3);
        let rendered = errors.to_string();
        assert!(rendered.contains("tableName is required"));
        assert!(rendered.contains("addBeforeColumn is not allowed on mysql"));
        assert!(matches!(errors.into_result(), Err(MigrateError::Validation(_))));
    }

    #[test]
    fn test_check_identifier_rejects_unusable_names() {
        let mut errors = ValidationErrors::new();
        errors.check_identifier("tableName", "");
        errors.check_identifier("columnName", "a\0b");
        errors.check_identifier("tableName", &"t".repeat(129));
        errors.check_identifier("columnName", "Mixed Case");
        assert_eq!(errors.errors().len(), 3);
        assert_eq!(errors.errors()[0], "tableName is required");
        assert!(errors.errors()[1].starts_with("columnName: Identifier contains null byte"));
        assert!(errors.errors()[2].contains("maximum length of 128 bytes"));
    }

    #[test]
    fn test_sql_defaults_to_semicolon() {
        let sql = Sql::new("SELECT 1").affecting("t");
        assert_eq!(sql.end_delimiter(), ";");
        assert_eq!(sql.affected_objects(), ["t".to_string()]);
        assert_eq!(sql.to_string(), "SELECT 1");
    }
}
