//! CREATE, DROP and RENAME TABLE.

use tracing::warn;

use super::column::writes_explicit_null;
use super::{check_type, column_type, default_literal, quoted, type_is_auto_increment};
use crate::database::{Database, DatabaseKind, ObjectKind};
use crate::datatype::DataTypeRegistry;
use crate::error::Result;
use crate::generator::{payload, GeneratorChain, Sql, SqlGenerator, ValidationErrors};
use crate::statement::{ColumnConfig, CreateTableStatement, Statement, StatementKind};

/// Where named table constraints put their name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TableLayout {
    /// `UNIQUE (c) CONSTRAINT n` instead of `CONSTRAINT n UNIQUE (c)`.
    pub constraint_name_trails: bool,
}

impl TableLayout {
    pub const STANDARD: Self = Self {
        constraint_name_trails: false,
    };
}

fn named(body: String, name: Option<String>, layout: TableLayout) -> String {
    match name {
        Some(name) if layout.constraint_name_trails => format!("{} CONSTRAINT {}", body, name),
        Some(name) => format!("CONSTRAINT {} {}", name, body),
        None => body,
    }
}

fn mssql_description(database: &Database, statement: &CreateTableStatement, remarks: &str, column: Option<&str>) -> Sql {
    let schema = statement
        .schema_name
        .as_deref()
        .or(database.default_schema_name())
        .unwrap_or("dbo");
    let mut sql = format!(
        "EXEC sp_addextendedproperty @name = N'MS_Description', @value = N{}, \
         @level0type = N'Schema', @level0name = N{}, @level1type = N'Table', @level1name = N{}",
        quoted(database, remarks),
        quoted(database, schema),
        quoted(database, &statement.table_name)
    );
    if let Some(column) = column {
        sql.push_str(&format!(", @level2type = N'Column', @level2name = N{}", quoted(database, column)));
    }
    Sql::new(sql)
}

/// Column definition inside CREATE TABLE, plus any statement it needs afterwards.
fn column_sql(
    statement: &CreateTableStatement,
    column: &ColumnConfig,
    database: &Database,
    types: &DataTypeRegistry,
    inline_primary_key: bool,
    extra: &mut Vec<Sql>,
    mysql_start_with: &mut Option<i64>,
) -> Result<String> {
    if column.computed {
        return Ok(column.name.clone());
    }

    let mut sql = format!(
        "{} {}",
        database.escape_column_name(&column.name),
        column_type(types, column, database)?
    );

    if inline_primary_key && column.is_primary_key() {
        let name = statement
            .primary_key_name()
            .map(String::from)
            .unwrap_or_else(|| database.generate_primary_key_name(&statement.table_name));
        sql.push_str(&format!(" CONSTRAINT {} PRIMARY KEY", database.escape_constraint_name(&name)));
    }

    if let Some(value) = &column.default_value {
        if !type_is_auto_increment(types, column, database) {
            if database.kind() == DatabaseKind::Mssql {
                sql.push_str(&format!(
                    " CONSTRAINT {}",
                    database.generate_default_constraint_name(&statement.table_name, &column.name)
                ));
            }
            sql.push_str(" DEFAULT ");
            sql.push_str(&default_literal(types, value, Some(&column.type_name), database));
        }
    }

    if let Some((start, increment)) = column.auto_increment_settings() {
        if database.capabilities().supports_auto_increment {
            let clause = database.auto_increment_clause(start, increment);
            if !clause.is_empty() {
                sql.push(' ');
                sql.push_str(&clause);
            }
            if matches!(database.kind(), DatabaseKind::MySql | DatabaseKind::MariaDb) && start.is_some() {
                *mysql_start_with = start;
            }
        } else {
            warn!(
                "{} does not support auto-increment columns as requested for {}.{}",
                database.short_name(),
                statement.table_name,
                column.name
            );
        }
    }

    if !column.is_nullable() {
        sql.push_str(" NOT NULL");
    } else if writes_explicit_null(database) {
        sql.push_str(" NULL");
    }

    if let Some(remarks) = &column.remarks {
        match database.kind() {
            DatabaseKind::MySql | DatabaseKind::MariaDb => {
                sql.push_str(&format!(" COMMENT {}", quoted(database, remarks)));
            }
            DatabaseKind::Mssql => extra.push(mssql_description(database, statement, remarks, Some(&column.name))),
            _ => {}
        }
    }

    Ok(sql)
}

/// CREATE TABLE and the statements that must follow it.
pub(crate) fn create_table_sql(
    statement: &CreateTableStatement,
    database: &Database,
    types: &DataTypeRegistry,
    layout: TableLayout,
) -> Result<Vec<Sql>> {
    let table = database.escape_table_name(
        statement.catalog_name.as_deref(),
        statement.schema_name.as_deref(),
        &statement.table_name,
    );

    let pk_columns = statement.primary_key_columns();
    // SQLite only honours AUTOINCREMENT on an inline INTEGER PRIMARY KEY.
    let inline_primary_key = database.kind() == DatabaseKind::Sqlite
        && pk_columns.len() == 1
        && pk_columns.iter().all(|c| c.is_auto_increment());

    let mut extra = Vec::new();
    let mut mysql_start_with = None;
    let mut parts = Vec::new();
    for column in &statement.columns {
        parts.push(column_sql(
            statement,
            column,
            database,
            types,
            inline_primary_key,
            &mut extra,
            &mut mysql_start_with,
        )?);
    }

    if !pk_columns.is_empty() && !inline_primary_key {
        let columns = pk_columns
            .iter()
            .map(|c| database.escape_column_name(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let name = database.capabilities().supports_primary_key_names.then(|| {
            let name = statement
                .primary_key_name()
                .map(String::from)
                .unwrap_or_else(|| database.generate_primary_key_name(&statement.table_name));
            database.escape_constraint_name(&name)
        });
        let mut body = format!("PRIMARY KEY ({})", columns);
        if database.kind() == DatabaseKind::Oracle {
            if let Some(tablespace) = pk_columns.iter().find_map(|c| c.primary_key_tablespace()) {
                body.push_str(&format!(" USING INDEX TABLESPACE {}", tablespace));
            }
        }
        parts.push(named(body, name, layout));
    }

    for column in &statement.columns {
        for fk in column.foreign_keys() {
            let mut body = format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                database.escape_column_name(&column.name),
                database.escape_table_name(None, fk.referenced_schema, fk.referenced_table),
                database.escape_column_name_list(fk.referenced_columns)
            );
            if fk.delete_cascade {
                body.push_str(" ON DELETE CASCADE");
            }
            let mut sql = named(body, Some(database.escape_constraint_name(fk.name)), layout);
            if database.capabilities().supports_initially_deferrable_columns {
                if fk.deferrable {
                    sql.push_str(" DEFERRABLE");
                }
                if fk.initially_deferred {
                    sql.push_str(" INITIALLY DEFERRED");
                }
            }
            parts.push(sql);
        }
    }

    for column in &statement.columns {
        if let Some(name) = column.unique_constraint() {
            let body = format!("UNIQUE ({})", database.escape_column_name(&column.name));
            parts.push(named(body, name.map(|n| database.escape_constraint_name(n)), layout));
        }
        for (name, condition) in column.checks() {
            let body = format!("CHECK ({})", condition);
            parts.push(named(body, name.map(|n| database.escape_constraint_name(n)), layout));
        }
    }

    let mut sql = format!("CREATE TABLE {} ({})", table, parts.join(", "));

    if let Some(start) = mysql_start_with {
        sql.push_str(&format!(" AUTO_INCREMENT={}", start));
    }

    if let Some(tablespace) = statement.tablespace.as_deref().filter(|t| !t.trim().is_empty()) {
        if database.capabilities().supports_tablespaces {
            let clause = match database.kind() {
                DatabaseKind::Mssql | DatabaseKind::SybaseAsa => "ON",
                DatabaseKind::Db2 | DatabaseKind::Informix => "IN",
                _ => "TABLESPACE",
            };
            sql.push_str(&format!(" {} {}", clause, tablespace));
        }
    }

    if let Some(remarks) = &statement.remarks {
        match database.kind() {
            DatabaseKind::MySql | DatabaseKind::MariaDb => {
                sql.push_str(&format!(" COMMENT={}", quoted(database, remarks)));
            }
            DatabaseKind::Mssql => extra.insert(0, mssql_description(database, statement, remarks, None)),
            _ => {}
        }
    }

    let mut out = vec![Sql::new(sql).affecting(&table)];
    out.extend(extra.into_iter().map(|s| s.affecting(&table)));
    Ok(out)
}

pub(crate) fn validate_create_table(
    statement: &CreateTableStatement,
    database: &Database,
    types: &DataTypeRegistry,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check_identifier("tableName", &statement.table_name);
    if statement.columns.is_empty() {
        errors.add_error("columns is required");
    }
    let mut seen = std::collections::HashSet::new();
    for column in &statement.columns {
        errors.check_identifier("columnName", &column.name);
        if !seen.insert(column.name.to_lowercase()) {
            errors.add_error(format!("Column {} is defined more than once", column.name));
        }
        if !column.computed {
            errors.check_required("columnType", &column.type_name);
            if !column.type_name.trim().is_empty() {
                check_type(&mut errors, types, &column.type_name, database);
            }
        }
    }
    errors
}

pub struct CreateTable;

impl SqlGenerator for CreateTable {
    fn name(&self) -> &'static str {
        "CreateTable"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::CreateTable
    }

    fn validate(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        match statement {
            Statement::CreateTable(s) => validate_create_table(s, database, chain.types()),
            _ => ValidationErrors::new(),
        }
    }

    fn warnings(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Vec<String> {
        let Statement::CreateTable(s) = statement else {
            return Vec::new();
        };
        let mut warnings = Vec::new();
        if !database.capabilities().supports_auto_increment && s.columns.iter().any(|c| c.is_auto_increment()) {
            warnings.push(format!("{} does not support auto-increment columns", database.short_name()));
        }
        if s.tablespace.is_some() && !database.capabilities().supports_tablespaces {
            warnings.push(format!("Tablespaces are ignored on {}", database.short_name()));
        }
        warnings
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, CreateTable)?;
        create_table_sql(s, database, chain.types(), TableLayout::STANDARD)
    }
}

pub struct DropTable;

impl SqlGenerator for DropTable {
    fn name(&self) -> &'static str {
        "DropTable"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::DropTable
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::DropTable(s) = statement {
            errors.check_identifier("tableName", &s.table_name);
        }
        errors
    }

    fn warnings(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Vec<String> {
        match statement {
            Statement::DropTable(s) if s.cascade_constraints && cascade_clause(database).is_none() => {
                vec![format!("{} does not support cascading drops", database.short_name())]
            }
            _ => Vec::new(),
        }
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, DropTable)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        let mut sql = format!("DROP TABLE {}", table);
        if s.cascade_constraints {
            if let Some(clause) = cascade_clause(database) {
                sql.push(' ');
                sql.push_str(clause);
            }
        }
        Ok(vec![Sql::new(sql).affecting(table)])
    }
}

fn cascade_clause(database: &Database) -> Option<&'static str> {
    match database.kind() {
        DatabaseKind::Oracle => Some("CASCADE CONSTRAINTS"),
        DatabaseKind::Postgres
        | DatabaseKind::H2
        | DatabaseKind::Hsql
        | DatabaseKind::MySql
        | DatabaseKind::MariaDb
        | DatabaseKind::Informix => Some("CASCADE"),
        _ => None,
    }
}

pub struct RenameTable;

impl SqlGenerator for RenameTable {
    fn name(&self) -> &'static str {
        "RenameTable"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::RenameTable
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.kind() != DatabaseKind::Firebird
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::RenameTable(s) = statement {
            errors.check_identifier("oldTableName", &s.old_table_name);
            errors.check_identifier("newTableName", &s.new_table_name);
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, RenameTable)?;
        let old = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.old_table_name);
        let new = database.escape_object_name(&s.new_table_name, ObjectKind::Table);
        let sql = match database.kind() {
            DatabaseKind::Mssql | DatabaseKind::Sybase => format!(
                "exec sp_rename '{}', '{}'",
                database.escape_string(&old),
                database.escape_string(&s.new_table_name)
            ),
            DatabaseKind::MySql | DatabaseKind::MariaDb | DatabaseKind::SybaseAsa => {
                format!("ALTER TABLE {} RENAME {}", old, new)
            }
            DatabaseKind::Derby | DatabaseKind::Informix | DatabaseKind::Db2 => {
                format!("RENAME TABLE {} TO {}", old, new)
            }
            _ => format!("ALTER TABLE {} RENAME TO {}", old, new),
        };
        Ok(vec![Sql::new(sql).affecting(old)])
    }
}
