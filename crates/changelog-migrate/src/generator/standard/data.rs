//! Data changes and author-supplied SQL.

use crate::database::Database;
use crate::datatype::DataTypeRegistry;
use crate::error::Result;
use crate::generator::{payload, GeneratorChain, Sql, SqlGenerator, ValidationErrors};
use crate::statement::{ColumnValue, Statement, StatementKind};

fn value_literal(types: &DataTypeRegistry, value: &ColumnValue, database: &Database) -> String {
    types.literal(&value.value, value.type_name.as_deref(), database)
}

fn where_suffix(where_clause: Option<&str>) -> String {
    match where_clause.map(str::trim).filter(|w| !w.is_empty()) {
        Some(clause) => format!(" WHERE {}", clause),
        None => String::new(),
    }
}

pub struct Insert;

impl SqlGenerator for Insert {
    fn name(&self) -> &'static str {
        "Insert"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::Insert
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::Insert(s) = statement {
            errors.check_identifier("tableName", &s.table_name);
            if s.values.is_empty() {
                errors.add_error("columns is required");
            }
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, Insert)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        let columns: Vec<String> = s.values.iter().map(|v| database.escape_column_name(&v.name)).collect();
        let values: Vec<String> = s.values.iter().map(|v| value_literal(chain.types(), v, database)).collect();
        let sql = format!("INSERT INTO {} ({}) VALUES ({})", table, columns.join(", "), values.join(", "));
        Ok(vec![Sql::new(sql).affecting(table)])
    }
}

pub struct Update;

impl SqlGenerator for Update {
    fn name(&self) -> &'static str {
        "Update"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::Update
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::Update(s) = statement {
            errors.check_identifier("tableName", &s.table_name);
            if s.values.is_empty() {
                errors.add_error("columns is required");
            }
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, Update)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        let assignments = s
            .values
            .iter()
            .map(|v| format!("{} = {}", database.escape_column_name(&v.name), value_literal(chain.types(), v, database)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {} SET {}{}", table, assignments, where_suffix(s.where_clause.as_deref()));
        Ok(vec![Sql::new(sql).affecting(table)])
    }
}

pub struct Delete;

impl SqlGenerator for Delete {
    fn name(&self) -> &'static str {
        "Delete"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::Delete
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::Delete(s) = statement {
            errors.check_identifier("tableName", &s.table_name);
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, Delete)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        let sql = format!("DELETE FROM {}{}", table, where_suffix(s.where_clause.as_deref()));
        Ok(vec![Sql::new(sql).affecting(table)])
    }
}

pub struct RawSql;

impl SqlGenerator for RawSql {
    fn name(&self) -> &'static str {
        "RawSql"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::RawSql
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::RawSql(s) = statement {
            errors.check_required("sql", &s.sql);
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, RawSql)?;
        let mut text = s.sql.trim();
        let delimiter = s.end_delimiter.as_deref().unwrap_or(";");
        // A trailing delimiter is added back when the SQL is written out.
        if !delimiter.is_empty() {
            text = text.strip_suffix(delimiter).unwrap_or(text).trim_end();
        }
        Ok(vec![Sql::new(text).with_end_delimiter(delimiter)])
    }
}

/// Comments only appear in SQL output; nothing is sent to the database.
pub struct Comment;

impl SqlGenerator for Comment {
    fn name(&self) -> &'static str {
        "Comment"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::Comment
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, Comment)?;
        Ok(s.text
            .lines()
            .map(|line| Sql::new(format!("{} {}", database.line_comment(), line.trim_end())).with_end_delimiter(""))
            .collect())
    }
}
