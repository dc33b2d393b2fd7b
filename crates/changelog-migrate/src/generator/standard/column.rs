//! Column-level statements: add, drop, rename, defaults and nullability.

use super::{check_type, column_type, default_literal, descriptor_type, quoted, type_is_auto_increment};
use crate::database::{Database, DatabaseKind};
use crate::datatype::DataTypeRegistry;
use crate::error::Result;
use crate::generator::{payload, GeneratorChain, Sql, SqlGenerator, ValidationErrors};
use crate::statement::{
    AddColumnStatement, AddForeignKeyConstraintStatement, AddUniqueConstraintStatement,
    ColumnConfig, Statement, StatementKind,
};

fn is_mysql(database: &Database) -> bool {
    matches!(database.kind(), DatabaseKind::MySql | DatabaseKind::MariaDb)
}

/// Families that spell out `NULL` for nullable columns.
pub(crate) fn writes_explicit_null(database: &Database) -> bool {
    matches!(
        database.kind(),
        DatabaseKind::Sybase | DatabaseKind::SybaseAsa | DatabaseKind::MySql | DatabaseKind::MariaDb
    )
}

/// How the column clause of an `ALTER TABLE ... ADD` is spelled.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AddColumnSyntax {
    pub add_keyword: &'static str,
    /// Name the default constraint (`CONSTRAINT DF_t_c DEFAULT ...`).
    pub named_default: bool,
}

impl AddColumnSyntax {
    pub const STANDARD: Self = Self {
        add_keyword: "ADD",
        named_default: false,
    };
}

/// `ADD <column> <type> ...` for one column, without the `ALTER TABLE` prefix.
pub(crate) fn column_definition(
    statement: &AddColumnStatement,
    column: &ColumnConfig,
    database: &Database,
    types: &DataTypeRegistry,
    syntax: AddColumnSyntax,
) -> Result<String> {
    if column.computed {
        return Ok(format!("{} {}", syntax.add_keyword, column.name));
    }

    let mut sql = format!(
        "{} {} {}",
        syntax.add_keyword,
        database.escape_column_name(&column.name),
        column_type(types, column, database)?
    );

    if let Some((start, increment)) = column.auto_increment_settings() {
        let clause = database.auto_increment_clause(start, increment);
        if !clause.is_empty() {
            sql.push(' ');
            sql.push_str(&clause);
        }
    }

    if let Some(value) = &column.default_value {
        if !type_is_auto_increment(types, column, database) {
            if syntax.named_default {
                sql.push_str(&format!(
                    " CONSTRAINT {}",
                    database.generate_default_constraint_name(&statement.table_name, &column.name)
                ));
            }
            sql.push_str(" DEFAULT ");
            sql.push_str(&default_literal(types, value, Some(&column.type_name), database));
        }
    }

    if !column.is_nullable() {
        if let Some(name) = column.not_null_constraint_name() {
            sql.push_str(&format!(" CONSTRAINT {}", database.escape_constraint_name(name)));
        }
        sql.push_str(" NOT NULL");
    } else if writes_explicit_null(database) {
        sql.push_str(" NULL");
    }

    if column.is_primary_key() {
        sql.push_str(" PRIMARY KEY");
    }

    if let Some(remarks) = &column.remarks {
        if is_mysql(database) {
            sql.push_str(&format!(" COMMENT {}", quoted(database, remarks)));
        }
    }

    if let Some(before) = &column.before_column {
        sql.push_str(&format!(" BEFORE {}", database.escape_column_name(before)));
    }
    if let Some(after) = &column.after_column {
        sql.push_str(&format!(" AFTER {}", database.escape_column_name(after)));
    }

    Ok(sql)
}

/// Unique and foreign key statements implied by a column's constraints.
fn column_constraint_statements(statement: &AddColumnStatement, column: &ColumnConfig) -> Vec<Statement> {
    let mut extra = Vec::new();
    if let Some(name) = column.unique_constraint() {
        let mut unique = AddUniqueConstraintStatement::new(&statement.table_name, &column.name, name);
        unique.catalog_name = statement.catalog_name.clone();
        unique.schema_name = statement.schema_name.clone();
        extra.push(unique.into());
    }
    for fk in column.foreign_keys() {
        let mut add = AddForeignKeyConstraintStatement::new(
            fk.name,
            &statement.table_name,
            &column.name,
            fk.referenced_table,
            fk.referenced_columns,
        );
        add.base_table_catalog_name = statement.catalog_name.clone();
        add.base_table_schema_name = statement.schema_name.clone();
        add.referenced_table_schema_name = fk.referenced_schema.map(String::from);
        add.on_delete = fk.delete_cascade.then(|| "CASCADE".to_string());
        add.deferrable = fk.deferrable;
        add.initially_deferred = fk.initially_deferred;
        extra.push(add.into());
    }
    extra
}

/// Full AddColumn output: the ALTER statements followed by nested constraints.
pub(crate) fn add_column_sql(
    statement: &AddColumnStatement,
    database: &Database,
    chain: &GeneratorChain<'_>,
    syntax: AddColumnSyntax,
) -> Result<Vec<Sql>> {
    let types = chain.types();
    let table = database.escape_table_name(
        statement.catalog_name.as_deref(),
        statement.schema_name.as_deref(),
        &statement.table_name,
    );
    let alter = format!("ALTER TABLE {} ", table);

    let mut sql = Vec::new();
    if is_mysql(database) && statement.is_multiple() {
        let clauses = statement
            .columns
            .iter()
            .map(|c| column_definition(statement, c, database, types, syntax))
            .collect::<Result<Vec<_>>>()?;
        sql.push(Sql::new(format!("{}{}", alter, clauses.join(", "))).affecting(&table));
    } else {
        for column in &statement.columns {
            let clause = column_definition(statement, column, database, types, syntax)?;
            sql.push(Sql::new(format!("{}{}", alter, clause)).affecting(&table));
        }
    }

    for column in &statement.columns {
        for nested in column_constraint_statements(statement, column) {
            sql.extend(chain.registry().generate_sql(&nested, database)?);
        }
    }
    Ok(sql)
}

/// Rules shared by every AddColumn generator.
pub(crate) fn validate_add_column(
    statement: &AddColumnStatement,
    database: &Database,
    types: &DataTypeRegistry,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check_identifier("tableName", &statement.table_name);
    if statement.columns.is_empty() {
        errors.add_error("columns is required");
    }

    let kind = database.kind();
    for column in &statement.columns {
        errors.check_identifier("columnName", &column.name);
        if !column.computed {
            errors.check_required("columnType", &column.type_name);
            if !column.type_name.trim().is_empty() {
                check_type(&mut errors, types, &column.type_name, database);
            }
        }

        let old_h2 = kind == DatabaseKind::H2 && (1..2).contains(&database.major_version());
        if column.is_primary_key()
            && (matches!(kind, DatabaseKind::Db2 | DatabaseKind::Derby | DatabaseKind::Sqlite) || old_h2)
        {
            errors.add_error("Cannot add a primary key column");
        }

        if is_mysql(database) && column.is_auto_increment() && !column.is_primary_key() {
            errors.add_error("Cannot add a non-primary key identity column");
        }

        if !(is_mysql(database) || kind == DatabaseKind::H2) {
            errors.check_disallowed("addAfterColumn", column.after_column.is_some(), database);
        }
        if !matches!(kind, DatabaseKind::H2 | DatabaseKind::Hsql) {
            errors.check_disallowed("addBeforeColumn", column.before_column.is_some(), database);
        }
        errors.check_disallowed("position", column.position.is_some(), database);
    }
    errors
}

pub(crate) fn add_column_warnings(statement: &AddColumnStatement, database: &Database) -> Vec<String> {
    statement
        .columns
        .iter()
        .filter(|c| c.is_auto_increment() && !database.capabilities().supports_auto_increment)
        .map(|c| {
            format!(
                "{} does not support auto-increment columns; ignored for {}",
                database.short_name(),
                c.name
            )
        })
        .collect()
}

pub struct AddColumn;

impl SqlGenerator for AddColumn {
    fn name(&self) -> &'static str {
        "AddColumn"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::AddColumn
    }

    fn validate(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        match payload!(statement, AddColumn) {
            Ok(s) => validate_add_column(s, database, chain.types()),
            Err(e) => {
                let mut errors = ValidationErrors::new();
                errors.add_error(e.to_string());
                errors
            }
        }
    }

    fn warnings(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Vec<String> {
        match statement {
            Statement::AddColumn(s) => add_column_warnings(s, database),
            _ => Vec::new(),
        }
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, AddColumn)?;
        add_column_sql(s, database, chain, AddColumnSyntax::STANDARD)
    }
}

pub struct DropColumn;

impl SqlGenerator for DropColumn {
    fn name(&self) -> &'static str {
        "DropColumn"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::DropColumn
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::DropColumn(s) = statement {
            errors.check_identifier("tableName", &s.table_name);
            errors.check_identifier("columnName", &s.column_name);
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, DropColumn)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        let keyword = match database.kind() {
            DatabaseKind::SybaseAsa | DatabaseKind::Firebird | DatabaseKind::Informix => "DROP",
            _ => "DROP COLUMN",
        };
        Ok(vec![Sql::new(format!(
            "ALTER TABLE {} {} {}",
            table,
            keyword,
            database.escape_column_name(&s.column_name)
        ))
        .affecting(table)])
    }
}

pub struct RenameColumn;

impl SqlGenerator for RenameColumn {
    fn name(&self) -> &'static str {
        "RenameColumn"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::RenameColumn
    }

    fn validate(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::RenameColumn(s) = statement {
            errors.check_identifier("tableName", &s.table_name);
            errors.check_identifier("oldColumnName", &s.old_column_name);
            errors.check_identifier("newColumnName", &s.new_column_name);
            if is_mysql(database) {
                errors.check_required_opt("columnDataType", s.column_data_type.as_deref());
            }
            if let Some(descriptor) = &s.column_data_type {
                check_type(&mut errors, chain.types(), descriptor, database);
            }
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, RenameColumn)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        let old = database.escape_column_name(&s.old_column_name);
        let new = database.escape_column_name(&s.new_column_name);

        let sql = match database.kind() {
            DatabaseKind::Mssql => format!(
                "exec sp_rename '{}.{}', '{}', 'COLUMN'",
                database.escape_string(&table),
                database.escape_string(&old),
                database.escape_string(&s.new_column_name)
            ),
            DatabaseKind::Sybase => format!(
                "exec sp_rename '{}.{}', '{}'",
                database.escape_string(&table),
                database.escape_string(&old),
                database.escape_string(&s.new_column_name)
            ),
            DatabaseKind::MySql | DatabaseKind::MariaDb => {
                let data_type = descriptor_type(chain.types(), s.column_data_type.as_deref().unwrap_or_default(), database)?;
                let mut sql = format!("ALTER TABLE {} CHANGE {} {} {}", table, old, new, data_type);
                if let Some(remarks) = &s.remarks {
                    sql.push_str(&format!(" COMMENT {}", quoted(database, remarks)));
                }
                sql
            }
            DatabaseKind::H2 | DatabaseKind::Hsql => {
                format!("ALTER TABLE {} ALTER COLUMN {} RENAME TO {}", table, old, new)
            }
            DatabaseKind::Derby | DatabaseKind::Informix => {
                format!("RENAME COLUMN {}.{} TO {}", table, old, new)
            }
            DatabaseKind::SybaseAsa => format!("ALTER TABLE {} RENAME {} TO {}", table, old, new),
            DatabaseKind::Firebird => format!("ALTER TABLE {} ALTER COLUMN {} TO {}", table, old, new),
            _ => format!("ALTER TABLE {} RENAME COLUMN {} TO {}", table, old, new),
        };
        Ok(vec![Sql::new(sql).affecting(table)])
    }
}

/// Families that restate the column type when changing a default.
fn default_needs_type(database: &Database) -> bool {
    database.kind() == DatabaseKind::Informix
}

pub struct AddDefaultValue;

impl SqlGenerator for AddDefaultValue {
    fn name(&self) -> &'static str {
        "AddDefaultValue"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::AddDefaultValue
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.kind() != DatabaseKind::Sqlite
    }

    fn validate(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::AddDefaultValue(s) = statement {
            errors.check_identifier("tableName", &s.table_name);
            errors.check_identifier("columnName", &s.column_name);
            if default_needs_type(database) {
                errors.check_required_opt("columnDataType", s.column_data_type.as_deref());
            }
            if let Some(descriptor) = &s.column_data_type {
                check_type(&mut errors, chain.types(), descriptor, database);
            }
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, AddDefaultValue)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        let column = database.escape_column_name(&s.column_name);
        let value = default_literal(chain.types(), &s.default_value, s.column_data_type.as_deref(), database);

        let sql = match database.kind() {
            DatabaseKind::Mssql => format!(
                "ALTER TABLE {} ADD CONSTRAINT {} DEFAULT {} FOR {}",
                table,
                database.generate_default_constraint_name(&s.table_name, &s.column_name),
                value,
                column
            ),
            DatabaseKind::MySql | DatabaseKind::MariaDb => {
                format!("ALTER TABLE {} ALTER {} SET DEFAULT {}", table, column, value)
            }
            DatabaseKind::Oracle => format!("ALTER TABLE {} MODIFY {} DEFAULT {}", table, column, value),
            DatabaseKind::Sybase => format!("ALTER TABLE {} REPLACE {} DEFAULT {}", table, column, value),
            DatabaseKind::SybaseAsa => format!("ALTER TABLE {} ALTER {} DEFAULT {}", table, column, value),
            DatabaseKind::Derby => {
                format!("ALTER TABLE {} ALTER COLUMN {} WITH DEFAULT {}", table, column, value)
            }
            DatabaseKind::Informix => format!(
                "ALTER TABLE {} MODIFY ({} {} DEFAULT {})",
                table,
                column,
                descriptor_type(chain.types(), s.column_data_type.as_deref().unwrap_or_default(), database)?,
                value
            ),
            _ => format!("ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}", table, column, value),
        };
        Ok(vec![Sql::new(sql).affecting(table)])
    }
}

pub struct DropDefaultValue;

impl SqlGenerator for DropDefaultValue {
    fn name(&self) -> &'static str {
        "DropDefaultValue"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::DropDefaultValue
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.kind() != DatabaseKind::Sqlite
    }

    fn validate(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::DropDefaultValue(s) = statement {
            errors.check_identifier("tableName", &s.table_name);
            errors.check_identifier("columnName", &s.column_name);
            if default_needs_type(database) {
                errors.check_required_opt("columnDataType", s.column_data_type.as_deref());
            }
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, DropDefaultValue)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        let column = database.escape_column_name(&s.column_name);

        let sql = match database.kind() {
            // The constraint name is looked up because it may have been generated by the server.
            DatabaseKind::Mssql => format!(
                "DECLARE @sql [nvarchar](MAX)\n\
                 SELECT @sql = N'ALTER TABLE {table} DROP CONSTRAINT ' + QUOTENAME([df].[name]) \
                 FROM [sys].[columns] AS [c] INNER JOIN [sys].[default_constraints] AS [df] \
                 ON [c].[object_id] = [df].[parent_object_id] AND [c].[column_id] = [df].[parent_column_id] \
                 WHERE [c].[object_id] = OBJECT_ID(N'{object}') AND [c].[name] = N'{name}'\n\
                 EXEC sp_executesql @sql",
                table = database.escape_string(&table),
                object = database.escape_string(&table),
                name = database.escape_string(&s.column_name),
            ),
            DatabaseKind::MySql | DatabaseKind::MariaDb | DatabaseKind::SybaseAsa => {
                format!("ALTER TABLE {} ALTER {} DROP DEFAULT", table, column)
            }
            DatabaseKind::Oracle => format!("ALTER TABLE {} MODIFY {} DEFAULT NULL", table, column),
            DatabaseKind::Sybase => format!("ALTER TABLE {} REPLACE {} DEFAULT NULL", table, column),
            DatabaseKind::Derby => {
                format!("ALTER TABLE {} ALTER COLUMN {} WITH DEFAULT NULL", table, column)
            }
            DatabaseKind::Informix => format!(
                "ALTER TABLE {} MODIFY ({} {})",
                table,
                column,
                descriptor_type(chain.types(), s.column_data_type.as_deref().unwrap_or_default(), database)?
            ),
            _ => format!("ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT", table, column),
        };
        Ok(vec![Sql::new(sql).affecting(table)])
    }
}

/// Families whose nullability change restates the column type.
fn nullability_needs_type(database: &Database) -> bool {
    matches!(
        database.kind(),
        DatabaseKind::Mssql
            | DatabaseKind::MySql
            | DatabaseKind::MariaDb
            | DatabaseKind::Informix
            | DatabaseKind::SybaseAsa
    )
}

/// Column clause switching nullability.
fn nullability_sql(
    table: &str,
    column: &str,
    data_type: Option<String>,
    not_null: bool,
    constraint_name: Option<&str>,
    database: &Database,
) -> String {
    let data_type = data_type.unwrap_or_default();
    let null = if not_null { "NOT NULL" } else { "NULL" };
    match database.kind() {
        DatabaseKind::Mssql => format!("ALTER TABLE {} ALTER COLUMN {} {} {}", table, column, data_type, null),
        DatabaseKind::MySql | DatabaseKind::MariaDb | DatabaseKind::SybaseAsa => {
            format!("ALTER TABLE {} MODIFY {} {} {}", table, column, data_type, null)
        }
        DatabaseKind::Informix => format!("ALTER TABLE {} MODIFY ({} {} {})", table, column, data_type, null),
        DatabaseKind::Sybase => format!("ALTER TABLE {} MODIFY {} {}", table, column, null),
        DatabaseKind::Oracle => match constraint_name.filter(|_| not_null) {
            Some(name) => format!(
                "ALTER TABLE {} MODIFY {} CONSTRAINT {} NOT NULL",
                table,
                column,
                database.escape_constraint_name(name)
            ),
            None => format!("ALTER TABLE {} MODIFY {} {}", table, column, null),
        },
        _ => {
            let action = if not_null { "SET NOT NULL" } else { "DROP NOT NULL" };
            format!("ALTER TABLE {} ALTER COLUMN {} {}", table, column, action)
        }
    }
}

/// DB2 leaves the table in reorg-pending state after a nullability change.
fn reorg(table: &str, database: &Database) -> Option<Sql> {
    (database.kind() == DatabaseKind::Db2)
        .then(|| Sql::new(format!("CALL SYSPROC.ADMIN_CMD ('REORG TABLE {}')", table)).affecting(table))
}

pub struct AddNotNullConstraint;

impl SqlGenerator for AddNotNullConstraint {
    fn name(&self) -> &'static str {
        "AddNotNullConstraint"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::AddNotNullConstraint
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.kind() != DatabaseKind::Sqlite
    }

    fn validate(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::AddNotNullConstraint(s) = statement {
            errors.check_identifier("tableName", &s.table_name);
            errors.check_identifier("columnName", &s.column_name);
            if nullability_needs_type(database) {
                errors.check_required_opt("columnDataType", s.column_data_type.as_deref());
            }
            if let Some(descriptor) = &s.column_data_type {
                check_type(&mut errors, chain.types(), descriptor, database);
            }
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, AddNotNullConstraint)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        let column = database.escape_column_name(&s.column_name);

        let mut sql = Vec::new();
        if let Some(value) = &s.default_null_value {
            let literal = default_literal(chain.types(), value, s.column_data_type.as_deref(), database);
            sql.push(
                Sql::new(format!("UPDATE {} SET {} = {} WHERE {} IS NULL", table, column, literal, column))
                    .affecting(&table),
            );
        }

        let data_type = match &s.column_data_type {
            Some(descriptor) => Some(descriptor_type(chain.types(), descriptor, database)?),
            None => None,
        };
        sql.push(
            Sql::new(nullability_sql(&table, &column, data_type, true, s.constraint_name.as_deref(), database))
                .affecting(&table),
        );
        sql.extend(reorg(&table, database));
        Ok(sql)
    }
}

pub struct DropNotNullConstraint;

impl SqlGenerator for DropNotNullConstraint {
    fn name(&self) -> &'static str {
        "DropNotNullConstraint"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::DropNotNullConstraint
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.kind() != DatabaseKind::Sqlite
    }

    fn validate(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::DropNotNullConstraint(s) = statement {
            errors.check_identifier("tableName", &s.table_name);
            errors.check_identifier("columnName", &s.column_name);
            if nullability_needs_type(database) {
                errors.check_required_opt("columnDataType", s.column_data_type.as_deref());
            }
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, DropNotNullConstraint)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        let column = database.escape_column_name(&s.column_name);
        let data_type = match &s.column_data_type {
            Some(descriptor) => Some(descriptor_type(chain.types(), descriptor, database)?),
            None => None,
        };
        let mut sql = vec![Sql::new(nullability_sql(&table, &column, data_type, false, None, database)).affecting(&table)];
        sql.extend(reorg(&table, database));
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{errors_for, sql_for, sql_for_db};
    use crate::core::SqlValue;
    use crate::database::{Database, DatabaseKind};
    use crate::statement::{
        AddColumnStatement, AddDefaultValueStatement, AddNotNullConstraintStatement, ColumnConfig,
        DropColumnStatement, RenameColumnStatement,
    };

    fn add(column: ColumnConfig) -> AddColumnStatement {
        AddColumnStatement::new("person", column)
    }

    #[test]
    fn test_add_column_postgres() {
        let sql = sql_for(add(ColumnConfig::new("age", "int")), DatabaseKind::Postgres);
        assert_eq!(sql, "ALTER TABLE person ADD age INTEGER");
    }

    #[test]
    fn test_add_column_mysql_writes_null_and_comment() {
        let column = ColumnConfig::new("nick", "varchar(50)")
            .with_remarks("it's a nickname")
            .after("name");
        let sql = sql_for(add(column), DatabaseKind::MySql);
        assert_eq!(
            sql,
            "ALTER TABLE person ADD nick VARCHAR(50) NULL COMMENT 'it''s a nickname' AFTER name"
        );
    }

    #[test]
    fn test_add_column_not_null_with_default() {
        let column = ColumnConfig::new("active", "boolean")
            .with_default(SqlValue::Bool(true))
            .not_null();
        let sql = sql_for(add(column), DatabaseKind::Postgres);
        assert_eq!(sql, "ALTER TABLE person ADD active BOOLEAN DEFAULT TRUE NOT NULL");
    }

    #[test]
    fn test_add_multiple_columns_mysql_is_one_statement() {
        let statement = add(ColumnConfig::new("a", "int")).with_column(ColumnConfig::new("b", "int"));
        let sql = sql_for(statement.clone(), DatabaseKind::MySql);
        assert_eq!(sql, "ALTER TABLE person ADD a INT NULL, ADD b INT NULL");

        let sql = sql_for(statement, DatabaseKind::Postgres);
        assert_eq!(sql, "ALTER TABLE person ADD a INTEGER;\nALTER TABLE person ADD b INTEGER");
    }

    #[test]
    fn test_add_unique_column_emits_constraint() {
        let column = ColumnConfig::new("email", "varchar(100)").unique(Some("uq_email"));
        let sql = sql_for(add(column), DatabaseKind::H2);
        assert_eq!(
            sql,
            "ALTER TABLE person ADD email VARCHAR(100);\nALTER TABLE person ADD CONSTRAINT uq_email UNIQUE (email)"
        );
    }

    #[test]
    fn test_add_foreign_key_column_emits_constraint() {
        let column = ColumnConfig::new("team_id", "int").foreign_key("fk_team", "team", "id");
        let sql = sql_for(add(column), DatabaseKind::Oracle);
        assert_eq!(
            sql,
            "ALTER TABLE person ADD team_id INTEGER;\n\
             ALTER TABLE person ADD CONSTRAINT fk_team FOREIGN KEY (team_id) REFERENCES team (id)"
        );
    }

    #[test]
    fn test_primary_key_column_rejected_on_db2_and_sqlite() {
        for kind in [DatabaseKind::Db2, DatabaseKind::Derby, DatabaseKind::Sqlite] {
            let errors = errors_for(add(ColumnConfig::new("id", "int").primary_key()), kind);
            assert!(errors.contains(&"Cannot add a primary key column".to_string()), "{kind}");
        }
        assert!(errors_for(add(ColumnConfig::new("id", "int").primary_key()), DatabaseKind::Postgres).is_empty());
    }

    #[test]
    fn test_mysql_identity_must_be_primary_key() {
        let errors = errors_for(add(ColumnConfig::new("n", "int").auto_increment(None, None)), DatabaseKind::MySql);
        assert_eq!(errors, vec!["Cannot add a non-primary key identity column".to_string()]);
    }

    #[test]
    fn test_column_positioning_is_dialect_specific() {
        let after = add(ColumnConfig::new("a", "int").after("b"));
        assert!(errors_for(after.clone(), DatabaseKind::MySql).is_empty());
        assert!(errors_for(after.clone(), DatabaseKind::H2).is_empty());
        assert_eq!(
            errors_for(after, DatabaseKind::Postgres),
            vec!["addAfterColumn is not allowed on postgresql".to_string()]
        );

        let before = add(ColumnConfig::new("a", "int").before("b"));
        assert!(errors_for(before.clone(), DatabaseKind::Hsql).is_empty());
        assert!(!errors_for(before, DatabaseKind::MySql).is_empty());

        let mut positioned = ColumnConfig::new("a", "int");
        positioned.position = Some(2);
        assert!(!errors_for(add(positioned), DatabaseKind::H2).is_empty());
    }

    #[test]
    fn test_missing_type_is_reported() {
        let errors = errors_for(add(ColumnConfig::new("a", "")), DatabaseKind::Postgres);
        assert_eq!(errors, vec!["columnType is required".to_string()]);
    }

    #[test]
    fn test_drop_and_rename_column() {
        let drop = DropColumnStatement {
            catalog_name: None,
            schema_name: Some("app".into()),
            table_name: "person".into(),
            column_name: "age".into(),
        };
        assert_eq!(sql_for(drop, DatabaseKind::Postgres), "ALTER TABLE app.person DROP COLUMN age");

        let rename = RenameColumnStatement {
            catalog_name: None,
            schema_name: None,
            table_name: "person".into(),
            old_column_name: "nick".into(),
            new_column_name: "alias".into(),
            column_data_type: Some("varchar(20)".into()),
            remarks: None,
        };
        assert_eq!(
            sql_for(rename.clone(), DatabaseKind::MySql),
            "ALTER TABLE person CHANGE nick alias VARCHAR(20)"
        );
        assert_eq!(
            sql_for(rename.clone(), DatabaseKind::Mssql),
            "exec sp_rename '[person].[nick]', 'alias', 'COLUMN'"
        );
        assert_eq!(
            sql_for(rename, DatabaseKind::Sqlite),
            "ALTER TABLE person RENAME COLUMN nick TO alias"
        );
    }

    #[test]
    fn test_add_default_value_per_family() {
        let statement = AddDefaultValueStatement {
            catalog_name: None,
            schema_name: None,
            table_name: "person".into(),
            column_name: "status".into(),
            column_data_type: Some("varchar(10)".into()),
            default_value: SqlValue::Text("new".into()),
        };
        assert_eq!(
            sql_for(statement.clone(), DatabaseKind::Postgres),
            "ALTER TABLE person ALTER COLUMN status SET DEFAULT 'new'"
        );
        assert_eq!(
            sql_for(statement.clone(), DatabaseKind::Mssql),
            "ALTER TABLE [person] ADD CONSTRAINT DF_person_status DEFAULT 'new' FOR [status]"
        );
        assert_eq!(
            sql_for(statement, DatabaseKind::Oracle),
            "ALTER TABLE person MODIFY status DEFAULT 'new'"
        );
    }

    #[test]
    fn test_add_not_null_updates_existing_nulls_first() {
        let statement = AddNotNullConstraintStatement {
            catalog_name: None,
            schema_name: None,
            table_name: "person".into(),
            column_name: "name".into(),
            column_data_type: Some("varchar(50)".into()),
            default_null_value: Some(SqlValue::Text("unknown".into())),
            constraint_name: None,
        };
        let db = Database::new(DatabaseKind::MySql);
        assert_eq!(
            sql_for_db(statement.clone(), &db),
            "UPDATE person SET name = 'unknown' WHERE name IS NULL;\nALTER TABLE person MODIFY name VARCHAR(50) NOT NULL"
        );
        assert!(sql_for(statement, DatabaseKind::Db2).ends_with("CALL SYSPROC.ADMIN_CMD ('REORG TABLE person')"));
    }
}
