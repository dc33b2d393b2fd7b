//! Database families and their SQL syntax profiles.
//!
//! A [`Database`] is a plain value: the family tag ([`DatabaseKind`]), a
//! [`Capabilities`] flag set and a few session facts (default schema, version,
//! quoting strategy). Generators branch on capability flags wherever one
//! exists and match on the family tag for the quirks that have no flag.
//!
//! Each family's static facts live in its own module under `family/`.

mod family;
mod reserved;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::identifier::{self, QuoteStyle};
use crate::error::{MigrateError, Result};

pub use family::Profile;

/// Supported database families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    Postgres,
    Mssql,
    MySql,
    MariaDb,
    Oracle,
    Informix,
    Derby,
    H2,
    Hsql,
    Db2,
    Sqlite,
    Sybase,
    SybaseAsa,
    Firebird,
}

impl DatabaseKind {
    pub const ALL: [DatabaseKind; 14] = [
        DatabaseKind::Postgres,
        DatabaseKind::Mssql,
        DatabaseKind::MySql,
        DatabaseKind::MariaDb,
        DatabaseKind::Oracle,
        DatabaseKind::Informix,
        DatabaseKind::Derby,
        DatabaseKind::H2,
        DatabaseKind::Hsql,
        DatabaseKind::Db2,
        DatabaseKind::Sqlite,
        DatabaseKind::Sybase,
        DatabaseKind::SybaseAsa,
        DatabaseKind::Firebird,
    ];

    /// Static profile of the family.
    pub fn profile(self) -> &'static Profile {
        family::profile(self)
    }

    /// Short name used in `dbms` filters and configuration.
    pub fn short_name(self) -> &'static str {
        self.profile().short_name
    }

    pub fn product_name(self) -> &'static str {
        self.profile().product_name
    }

    /// Parse a short name or common alias, case-insensitively.
    pub fn from_short_name(name: &str) -> Result<Self> {
        let kind = match name.trim().to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => DatabaseKind::Postgres,
            "mssql" | "sqlserver" | "sql-server" => DatabaseKind::Mssql,
            "mysql" => DatabaseKind::MySql,
            "mariadb" => DatabaseKind::MariaDb,
            "oracle" => DatabaseKind::Oracle,
            "informix" => DatabaseKind::Informix,
            "derby" => DatabaseKind::Derby,
            "h2" => DatabaseKind::H2,
            "hsqldb" | "hsql" => DatabaseKind::Hsql,
            "db2" => DatabaseKind::Db2,
            "sqlite" => DatabaseKind::Sqlite,
            "sybase" => DatabaseKind::Sybase,
            "asany" | "sybase-asa" | "sybaseasa" => DatabaseKind::SybaseAsa,
            "firebird" => DatabaseKind::Firebird,
            other => {
                return Err(MigrateError::Config(format!(
                    "Unknown database type '{}'. Supported: {}",
                    other,
                    DatabaseKind::ALL
                        .iter()
                        .map(|k| k.short_name())
                        .collect::<Vec<_>>()
                        .join(", ")
                )))
            }
        };
        Ok(kind)
    }

    /// Guess the family from a driver-reported product name.
    pub fn from_product_name(product: &str) -> Option<Self> {
        let product = product.to_lowercase();
        DatabaseKind::ALL.into_iter().find(|k| {
            let name = k.product_name().to_lowercase();
            product == name || product.starts_with(&name)
        })
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// How unquoted identifiers are folded by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFolding {
    Upper,
    Lower,
    Preserve,
}

/// When identifiers get quoted in generated SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotingStrategy {
    /// Quote only when the name would not survive unquoted.
    #[default]
    Legacy,
    /// Quote every object name.
    QuoteAll,
    /// Quote reserved words only.
    QuoteReserved,
}

/// The kind of object a name refers to; quoting rules differ per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Catalog,
    Schema,
    Table,
    Column,
    View,
    Index,
    Constraint,
    Sequence,
}

/// Capability flags of a database family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub supports_schemas: bool,
    pub supports_catalogs: bool,
    /// The catalog name occupies the schema position (Oracle, MySQL, Derby).
    pub catalog_is_schema: bool,
    pub supports_sequences: bool,
    pub supports_ddl_in_transaction: bool,
    pub supports_initially_deferrable_columns: bool,
    pub supports_tablespaces: bool,
    /// `USING INDEX TABLESPACE` is understood.
    pub supports_index_tablespaces: bool,
    pub supports_auto_increment: bool,
    pub supports_primary_key_names: bool,
    pub supports_boolean_type: bool,
    pub default_auto_commit: bool,
    pub case_folding: CaseFolding,
    /// Longest VARCHAR length accepted before a "max" type is required.
    pub max_varchar_length: Option<u32>,
}

/// A database session profile: family, capabilities and session facts.
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    kind: DatabaseKind,
    capabilities: Capabilities,
    default_catalog: Option<String>,
    default_schema: Option<String>,
    major_version: u32,
    quoting_strategy: QuotingStrategy,
}

impl Database {
    /// Profile for a family with its usual default schema.
    pub fn new(kind: DatabaseKind) -> Self {
        let profile = kind.profile();
        Self {
            kind,
            capabilities: profile.capabilities,
            default_catalog: None,
            default_schema: profile.default_schema.map(String::from),
            major_version: 0,
            quoting_strategy: QuotingStrategy::default(),
        }
    }

    /// Profile from a configuration short name.
    pub fn from_short_name(name: &str) -> Result<Self> {
        Ok(Self::new(DatabaseKind::from_short_name(name)?))
    }

    pub fn with_default_schema(mut self, schema: Option<String>) -> Self {
        if schema.is_some() {
            self.default_schema = schema;
        }
        self
    }

    pub fn with_default_catalog(mut self, catalog: Option<String>) -> Self {
        self.default_catalog = catalog;
        self
    }

    pub fn with_major_version(mut self, version: u32) -> Self {
        self.major_version = version;
        // MariaDB gained sequences in 10.3.
        if self.kind == DatabaseKind::MariaDb {
            self.capabilities.supports_sequences = version >= 10;
        }
        self
    }

    pub fn with_quoting_strategy(mut self, strategy: QuotingStrategy) -> Self {
        self.quoting_strategy = strategy;
        self
    }

    pub fn kind(&self) -> DatabaseKind {
        self.kind
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn short_name(&self) -> &'static str {
        self.kind.short_name()
    }

    pub fn product_name(&self) -> &'static str {
        self.kind.product_name()
    }

    pub fn default_schema_name(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    pub fn default_catalog_name(&self) -> Option<&str> {
        self.default_catalog.as_deref()
    }

    pub fn major_version(&self) -> u32 {
        self.major_version
    }

    pub fn quoting_strategy(&self) -> QuotingStrategy {
        self.quoting_strategy
    }

    pub fn quote_style(&self) -> QuoteStyle {
        self.kind.profile().quote_style
    }

    pub fn is_reserved_word(&self, word: &str) -> bool {
        let upper = word.to_uppercase();
        reserved::SQL_STANDARD.contains(&upper.as_str())
            || self.kind.profile().reserved_words.contains(&upper.as_str())
    }

    /// Fold an unquoted name the way the database stores it.
    pub fn correct_object_name(&self, name: &str) -> String {
        match self.capabilities.case_folding {
            CaseFolding::Upper => name.to_uppercase(),
            CaseFolding::Lower => name.to_lowercase(),
            CaseFolding::Preserve => name.to_string(),
        }
    }

    /// Whether `name` must be quoted to keep its meaning.
    fn needs_quoting(&self, name: &str, kind: ObjectKind) -> bool {
        if self.kind.profile().always_quote {
            return true;
        }
        match self.quoting_strategy {
            QuotingStrategy::QuoteAll => true,
            QuotingStrategy::QuoteReserved => self.is_reserved_word(name),
            QuotingStrategy::Legacy => {
                if !identifier::is_plain_identifier(name) || self.is_reserved_word(name) {
                    return true;
                }
                // Postgres folds to lower case; mixed-case tables and columns
                // keep their spelling only when quoted.
                self.kind == DatabaseKind::Postgres
                    && matches!(kind, ObjectKind::Table | ObjectKind::Column | ObjectKind::View)
                    && name.chars().any(|c| c.is_ascii_uppercase())
            }
        }
    }

    /// Escape a single object name.
    pub fn escape_object_name(&self, name: &str, kind: ObjectKind) -> String {
        let name = name.trim();
        if self.needs_quoting(name, kind) {
            identifier::quote(self.quote_style(), name)
        } else {
            name.to_string()
        }
    }

    /// Schema slot for a qualified name, or `None` when the name stays bare.
    fn schema_qualifier<'a>(
        &self,
        catalog: Option<&'a str>,
        schema: Option<&'a str>,
    ) -> Option<&'a str> {
        let caps = &self.capabilities;
        let chosen = if caps.catalog_is_schema {
            catalog.or(schema)
        } else if caps.supports_schemas {
            schema
        } else {
            None
        };
        chosen.map(str::trim).filter(|s| !s.is_empty())
    }

    /// Escape a possibly schema-qualified object name.
    pub fn escape_qualified_name(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        name: &str,
        kind: ObjectKind,
    ) -> String {
        let escaped = self.escape_object_name(name, kind);
        match self.schema_qualifier(catalog, schema) {
            Some(schema) => format!(
                "{}.{}",
                self.escape_object_name(schema, ObjectKind::Schema),
                escaped
            ),
            None => escaped,
        }
    }

    pub fn escape_table_name(&self, catalog: Option<&str>, schema: Option<&str>, table: &str) -> String {
        self.escape_qualified_name(catalog, schema, table, ObjectKind::Table)
    }

    pub fn escape_view_name(&self, catalog: Option<&str>, schema: Option<&str>, view: &str) -> String {
        self.escape_qualified_name(catalog, schema, view, ObjectKind::View)
    }

    pub fn escape_sequence_name(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        sequence: &str,
    ) -> String {
        self.escape_qualified_name(catalog, schema, sequence, ObjectKind::Sequence)
    }

    pub fn escape_index_name(&self, catalog: Option<&str>, schema: Option<&str>, index: &str) -> String {
        self.escape_qualified_name(catalog, schema, index, ObjectKind::Index)
    }

    pub fn escape_column_name(&self, column: &str) -> String {
        self.escape_object_name(column, ObjectKind::Column)
    }

    /// Escape every entry of a comma separated column list.
    ///
    /// Entries that are function calls or carry a sort order (`name DESC`)
    /// are passed through with only the bare name escaped.
    pub fn escape_column_name_list(&self, columns: &str) -> String {
        identifier::split_name_list(columns)
            .iter()
            .map(|col| self.escape_column_expression(col))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn escape_column_expression(&self, column: &str) -> String {
        if column.contains('(') {
            return column.to_string();
        }
        match column.rsplit_once(' ') {
            Some((name, order))
                if order.eq_ignore_ascii_case("asc") || order.eq_ignore_ascii_case("desc") =>
            {
                format!("{} {}", self.escape_column_name(name.trim()), order.to_uppercase())
            }
            _ => self.escape_column_name(column),
        }
    }

    pub fn escape_constraint_name(&self, name: &str) -> String {
        self.escape_object_name(name, ObjectKind::Constraint)
    }

    /// Escape a value for use inside a single-quoted string literal.
    pub fn escape_string(&self, value: &str) -> String {
        let escaped = value.replace('\'', "''");
        match self.kind {
            // MySQL treats backslash as an escape inside literals.
            DatabaseKind::MySql | DatabaseKind::MariaDb => escaped.replace('\\', "\\\\"),
            _ => escaped,
        }
    }

    /// Quoted string literal.
    pub fn string_literal(&self, value: &str) -> String {
        format!("'{}'", self.escape_string(value))
    }

    pub fn line_comment(&self) -> &'static str {
        "--"
    }

    pub fn current_datetime_function(&self) -> &'static str {
        self.kind.profile().current_datetime_function
    }

    pub fn boolean_literal(&self, value: bool) -> &'static str {
        let profile = self.kind.profile();
        if value {
            profile.true_literal
        } else {
            profile.false_literal
        }
    }

    pub fn date_literal(&self, date: NaiveDate) -> String {
        let text = date.format("%Y-%m-%d").to_string();
        match self.kind {
            DatabaseKind::Oracle => format!("TO_DATE('{}', 'YYYY-MM-DD')", text),
            _ => format!("'{}'", text),
        }
    }

    pub fn time_literal(&self, time: NaiveTime) -> String {
        let text = time.format("%H:%M:%S").to_string();
        match self.kind {
            DatabaseKind::Oracle => format!("TO_DATE('{}', 'HH24:MI:SS')", text),
            _ => format!("'{}'", text),
        }
    }

    pub fn datetime_literal(&self, datetime: NaiveDateTime) -> String {
        match self.kind {
            DatabaseKind::Oracle => format!(
                "TO_TIMESTAMP('{}', 'YYYY-MM-DD HH24:MI:SS.FF')",
                datetime.format("%Y-%m-%d %H:%M:%S%.f")
            ),
            DatabaseKind::Mssql | DatabaseKind::Sybase | DatabaseKind::SybaseAsa => {
                format!("'{}'", datetime.format("%Y-%m-%dT%H:%M:%S%.3f"))
            }
            DatabaseKind::Db2 => format!("'{}'", datetime.format("%Y-%m-%d-%H.%M.%S%.6f")),
            _ => format!("'{}'", datetime.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }

    /// Column clause making a column database-generated, or empty when the
    /// family expresses auto-increment through the data type instead.
    pub fn auto_increment_clause(&self, start_with: Option<i64>, increment_by: Option<i64>) -> String {
        if !self.capabilities.supports_auto_increment {
            return String::new();
        }
        let base = self.kind.profile().auto_increment_clause;
        if base.is_empty() {
            return base.to_string();
        }

        let start = start_with.filter(|v| *v != 1);
        let increment = increment_by.filter(|v| *v != 1);
        if start.is_none() && increment.is_none() {
            return base.to_string();
        }

        match self.kind {
            DatabaseKind::Mssql => format!(
                "{} ({}, {})",
                base,
                start_with.unwrap_or(1),
                increment_by.unwrap_or(1)
            ),
            // Start values go in a table option; the column clause stays bare.
            DatabaseKind::MySql | DatabaseKind::MariaDb => base.to_string(),
            DatabaseKind::Sqlite | DatabaseKind::Sybase | DatabaseKind::SybaseAsa => {
                base.to_string()
            }
            _ => {
                let separator = if self.kind == DatabaseKind::Postgres { " " } else { ", " };
                let mut options = Vec::new();
                if let Some(start) = start {
                    options.push(format!("START WITH {}", start));
                }
                if let Some(increment) = increment {
                    options.push(format!("INCREMENT BY {}", increment));
                }
                format!("{} ({})", base, options.join(separator))
            }
        }
    }

    /// `PK_<TABLE>`, truncated to what the family accepts.
    pub fn generate_primary_key_name(&self, table: &str) -> String {
        let name = format!("PK_{}", table.to_uppercase());
        match self.kind {
            DatabaseKind::Oracle | DatabaseKind::Firebird => name.chars().take(30).collect(),
            _ => name,
        }
    }

    /// Name of the constraint SQL Server attaches to a column default.
    pub fn generate_default_constraint_name(&self, table: &str, column: &str) -> String {
        format!("DF_{}_{}", table, column)
    }

    /// Expression yielding the next value of a sequence.
    pub fn sequence_next_value(&self, sequence: &str) -> String {
        let escaped = self.escape_object_name(sequence, ObjectKind::Sequence);
        match self.kind {
            DatabaseKind::Postgres => format!("nextval('{}')", self.escape_string(&escaped)),
            DatabaseKind::Oracle | DatabaseKind::Informix => format!("{}.nextval", escaped),
            _ => format!("NEXT VALUE FOR {}", escaped),
        }
    }

    /// String concatenation expression.
    pub fn concat(&self, parts: &[&str]) -> String {
        match self.kind {
            DatabaseKind::Mssql | DatabaseKind::Sybase | DatabaseKind::SybaseAsa => parts.join(" + "),
            DatabaseKind::MySql | DatabaseKind::MariaDb => format!("CONCAT({})", parts.join(", ")),
            _ => parts.join(" || "),
        }
    }

    /// Whether a name matches the family's short name filter entry.
    pub fn matches_short_name(&self, name: &str) -> bool {
        DatabaseKind::from_short_name(name).is_ok_and(|k| k == self.kind)
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_short_name_aliases() {
        assert_eq!(DatabaseKind::from_short_name("PostgreSQL").unwrap(), DatabaseKind::Postgres);
        assert_eq!(DatabaseKind::from_short_name("pg").unwrap(), DatabaseKind::Postgres);
        assert_eq!(DatabaseKind::from_short_name("sqlserver").unwrap(), DatabaseKind::Mssql);
        assert_eq!(DatabaseKind::from_short_name("asany").unwrap(), DatabaseKind::SybaseAsa);
        assert!(DatabaseKind::from_short_name("dbase").is_err());
    }

    #[test]
    fn test_short_names_round_trip() {
        for kind in DatabaseKind::ALL {
            assert_eq!(DatabaseKind::from_short_name(kind.short_name()).unwrap(), kind);
        }
    }

    #[test]
    fn test_from_product_name() {
        assert_eq!(
            DatabaseKind::from_product_name("PostgreSQL"),
            Some(DatabaseKind::Postgres)
        );
        assert_eq!(
            DatabaseKind::from_product_name("Microsoft SQL Server"),
            Some(DatabaseKind::Mssql)
        );
        assert_eq!(DatabaseKind::from_product_name("SQLite"), Some(DatabaseKind::Sqlite));
        assert_eq!(DatabaseKind::from_product_name("Ingres"), None);
    }

    #[test]
    fn test_postgres_quotes_mixed_case_tables_but_not_constraints() {
        let db = Database::new(DatabaseKind::Postgres);
        assert_eq!(db.escape_object_name("AddUQTest", ObjectKind::Table), "\"AddUQTest\"");
        assert_eq!(db.escape_object_name("person", ObjectKind::Table), "person");
        assert_eq!(db.escape_constraint_name("UQ_TEST"), "UQ_TEST");
        assert_eq!(db.escape_object_name("user", ObjectKind::Table), "\"user\"");
    }

    #[test]
    fn test_mssql_always_brackets() {
        let db = Database::new(DatabaseKind::Mssql);
        assert_eq!(db.escape_column_name("col"), "[col]");
        assert_eq!(db.escape_constraint_name("uq"), "[uq]");
        assert_eq!(db.escape_table_name(None, Some("liquibaseb"), "t"), "[liquibaseb].[t]");
        assert_eq!(db.escape_column_name("odd]name"), "[odd]]name]");
    }

    #[test]
    fn test_mysql_backticks_only_when_needed() {
        let db = Database::new(DatabaseKind::MySql);
        assert_eq!(db.escape_column_name("name"), "name");
        assert_eq!(db.escape_column_name("order"), "`order`");
        assert_eq!(db.escape_column_name("with space"), "`with space`");
    }

    #[test]
    fn test_qualified_names_follow_schema_capabilities() {
        let oracle = Database::new(DatabaseKind::Oracle);
        assert_eq!(
            oracle.escape_table_name(Some("liquibasec"), Some("liquibaseb"), "t"),
            "liquibasec.t"
        );
        let informix = Database::new(DatabaseKind::Informix);
        assert_eq!(
            informix.escape_table_name(Some("liquibasec"), Some("liquibaseb"), "t"),
            "liquibaseb.t"
        );
        let firebird = Database::new(DatabaseKind::Firebird);
        assert_eq!(firebird.escape_table_name(None, Some("liquibaseb"), "t"), "t");
        let sqlite = Database::new(DatabaseKind::Sqlite);
        assert_eq!(sqlite.escape_table_name(None, Some("main"), "t"), "t");
    }

    #[test]
    fn test_quote_all_strategy() {
        let db = Database::new(DatabaseKind::Oracle).with_quoting_strategy(QuotingStrategy::QuoteAll);
        assert_eq!(db.escape_column_name("id"), "\"id\"");
        let reserved =
            Database::new(DatabaseKind::Oracle).with_quoting_strategy(QuotingStrategy::QuoteReserved);
        assert_eq!(reserved.escape_column_name("my col"), "my col");
        assert_eq!(reserved.escape_column_name("select"), "\"select\"");
    }

    #[test]
    fn test_escaped_identifiers_round_trip() {
        let names = ["plain", "Mixed", "has\"quote", "has]bracket", "has`tick", "select"];
        for kind in DatabaseKind::ALL {
            let db = Database::new(kind).with_quoting_strategy(QuotingStrategy::QuoteAll);
            for name in names {
                let escaped = db.escape_column_name(name);
                assert_eq!(
                    identifier::unquote(db.quote_style(), &escaped).as_deref(),
                    Some(name),
                    "{kind} {name}"
                );
            }
        }
    }

    #[test]
    fn test_column_list_keeps_sort_order_and_functions() {
        let db = Database::new(DatabaseKind::Mssql);
        assert_eq!(db.escape_column_name_list("a, b desc"), "[a], [b] DESC");
        assert_eq!(db.escape_column_name_list("lower(name)"), "lower(name)");
    }

    #[test]
    fn test_auto_increment_clauses() {
        assert_eq!(
            Database::new(DatabaseKind::Postgres).auto_increment_clause(None, None),
            "GENERATED BY DEFAULT AS IDENTITY"
        );
        assert_eq!(
            Database::new(DatabaseKind::Postgres).auto_increment_clause(Some(5), Some(2)),
            "GENERATED BY DEFAULT AS IDENTITY (START WITH 5 INCREMENT BY 2)"
        );
        assert_eq!(
            Database::new(DatabaseKind::H2).auto_increment_clause(Some(5), Some(2)),
            "GENERATED BY DEFAULT AS IDENTITY (START WITH 5, INCREMENT BY 2)"
        );
        assert_eq!(
            Database::new(DatabaseKind::Mssql).auto_increment_clause(Some(100), None),
            "IDENTITY (100, 1)"
        );
        assert_eq!(
            Database::new(DatabaseKind::MySql).auto_increment_clause(Some(100), None),
            "AUTO_INCREMENT"
        );
        assert_eq!(
            Database::new(DatabaseKind::Sqlite).auto_increment_clause(None, None),
            "AUTOINCREMENT"
        );
        assert_eq!(
            Database::new(DatabaseKind::SybaseAsa).auto_increment_clause(None, None),
            "DEFAULT AUTOINCREMENT"
        );
        assert_eq!(
            Database::new(DatabaseKind::Firebird).auto_increment_clause(None, None),
            ""
        );
    }

    #[test]
    fn test_escape_string() {
        let pg = Database::new(DatabaseKind::Postgres);
        assert_eq!(pg.string_literal("O'Brien"), "'O''Brien'");
        let mysql = Database::new(DatabaseKind::MySql);
        assert_eq!(mysql.string_literal("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_boolean_literals() {
        assert_eq!(Database::new(DatabaseKind::Postgres).boolean_literal(true), "TRUE");
        assert_eq!(Database::new(DatabaseKind::Mssql).boolean_literal(true), "1");
        assert_eq!(Database::new(DatabaseKind::Informix).boolean_literal(false), "'f'");
    }

    #[test]
    fn test_correct_object_name_folds_case() {
        assert_eq!(Database::new(DatabaseKind::Oracle).correct_object_name("person"), "PERSON");
        assert_eq!(Database::new(DatabaseKind::Postgres).correct_object_name("PERSON"), "person");
        assert_eq!(Database::new(DatabaseKind::Mssql).correct_object_name("Person"), "Person");
    }

    #[test]
    fn test_default_schema_override() {
        let db = Database::new(DatabaseKind::Postgres);
        assert_eq!(db.default_schema_name(), Some("public"));
        let db = db.with_default_schema(Some("app".into()));
        assert_eq!(db.default_schema_name(), Some("app"));
    }

    #[test]
    fn test_primary_key_name_truncation() {
        let oracle = Database::new(DatabaseKind::Oracle);
        let name = oracle.generate_primary_key_name(&"x".repeat(40));
        assert_eq!(name.len(), 30);
        assert_eq!(Database::new(DatabaseKind::Postgres).generate_primary_key_name("person"), "PK_PERSON");
    }
}
