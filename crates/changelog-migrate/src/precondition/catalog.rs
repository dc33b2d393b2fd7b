//! Object existence lookups used by the existence preconditions.
//!
//! Families with an `information_schema` (or Oracle's `ALL_*` views, or
//! SQLite's `sqlite_master`) are asked directly. Everything else is probed
//! with a query that returns no rows: success means the object exists.

use crate::core::Connection;
use crate::database::{Database, DatabaseKind, ObjectKind};
use crate::error::{MigrateError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CatalogObject {
    Table,
    View,
    Sequence,
}

impl CatalogObject {
    fn label(self) -> &'static str {
        match self {
            CatalogObject::Table => "table",
            CatalogObject::View => "view",
            CatalogObject::Sequence => "sequence",
        }
    }
}

fn uses_information_schema(kind: DatabaseKind) -> bool {
    matches!(
        kind,
        DatabaseKind::Postgres
            | DatabaseKind::Mssql
            | DatabaseKind::MySql
            | DatabaseKind::MariaDb
            | DatabaseKind::H2
            | DatabaseKind::Hsql
    )
}

fn eq_ignore_case(database: &Database, column: &str, value: &str) -> String {
    format!("UPPER({}) = UPPER({})", column, database.string_literal(value))
}

fn schema_filter(database: &Database, column: &str, schema: Option<&str>) -> String {
    match schema.or(database.default_schema_name()) {
        Some(schema) => format!(" AND {}", eq_ignore_case(database, column, schema)),
        None if matches!(database.kind(), DatabaseKind::MySql | DatabaseKind::MariaDb) => {
            format!(" AND {} = DATABASE()", column)
        }
        None => String::new(),
    }
}

async fn count(connection: &dyn Connection, sql: &str) -> Result<bool> {
    tracing::debug!(sql = %sql, "catalog lookup");
    Ok(connection
        .query_scalar(sql)
        .await?
        .and_then(|v| v.as_i64())
        .unwrap_or(0)
        > 0)
}

async fn probe(connection: &dyn Connection, sql: &str) -> bool {
    tracing::debug!(sql = %sql, "catalog probe");
    connection.query(sql).await.is_ok()
}

fn unsupported(object: CatalogObject, database: &Database) -> MigrateError {
    MigrateError::unsupported(format!("{} lookup", object.label()), database.short_name())
}

/// Whether a table, view or sequence exists.
pub(crate) async fn object_exists(
    connection: &dyn Connection,
    database: &Database,
    object: CatalogObject,
    schema: Option<&str>,
    name: &str,
) -> Result<bool> {
    let kind = database.kind();
    if object == CatalogObject::Sequence && !database.capabilities().supports_sequences {
        return Err(unsupported(object, database));
    }

    if kind == DatabaseKind::Sqlite {
        let sql = format!(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = '{}' AND {}",
            object.label(),
            eq_ignore_case(database, "name", name)
        );
        return count(connection, &sql).await;
    }

    if uses_information_schema(kind) {
        let (view, name_col, schema_col) = match object {
            CatalogObject::Table => ("information_schema.tables", "table_name", "table_schema"),
            CatalogObject::View => ("information_schema.views", "table_name", "table_schema"),
            CatalogObject::Sequence => ("information_schema.sequences", "sequence_name", "sequence_schema"),
        };
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {}{}",
            view,
            eq_ignore_case(database, name_col, name),
            schema_filter(database, schema_col, schema)
        );
        return count(connection, &sql).await;
    }

    if kind == DatabaseKind::Oracle {
        let (view, name_col, owner_col) = match object {
            CatalogObject::Table => ("ALL_TABLES", "TABLE_NAME", "OWNER"),
            CatalogObject::View => ("ALL_VIEWS", "VIEW_NAME", "OWNER"),
            CatalogObject::Sequence => ("ALL_SEQUENCES", "SEQUENCE_NAME", "SEQUENCE_OWNER"),
        };
        let owner = match schema {
            Some(schema) => format!(" AND {}", eq_ignore_case(database, owner_col, schema)),
            None => format!(" AND {} = USER", owner_col),
        };
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {}{}",
            view,
            eq_ignore_case(database, name_col, name),
            owner
        );
        return count(connection, &sql).await;
    }

    let escaped = match object {
        CatalogObject::Table => database.escape_table_name(None, schema, name),
        CatalogObject::View => database.escape_view_name(None, schema, name),
        CatalogObject::Sequence => return Err(unsupported(object, database)),
    };
    Ok(probe(connection, &format!("SELECT COUNT(*) FROM {} WHERE 1 = 0", escaped)).await)
}

/// Whether `table` has a column named `column`.
pub(crate) async fn column_exists(
    connection: &dyn Connection,
    database: &Database,
    schema: Option<&str>,
    table: &str,
    column: &str,
) -> Result<bool> {
    let kind = database.kind();
    if kind == DatabaseKind::Sqlite {
        let sql = format!(
            "SELECT COUNT(*) FROM pragma_table_info({}) WHERE {}",
            database.string_literal(table),
            eq_ignore_case(database, "name", column)
        );
        return count(connection, &sql).await;
    }

    if uses_information_schema(kind) {
        let sql = format!(
            "SELECT COUNT(*) FROM information_schema.columns WHERE {} AND {}{}",
            eq_ignore_case(database, "table_name", table),
            eq_ignore_case(database, "column_name", column),
            schema_filter(database, "table_schema", schema)
        );
        return count(connection, &sql).await;
    }

    if kind == DatabaseKind::Oracle {
        let owner = match schema {
            Some(schema) => format!(" AND {}", eq_ignore_case(database, "OWNER", schema)),
            None => " AND OWNER = USER".to_string(),
        };
        let sql = format!(
            "SELECT COUNT(*) FROM ALL_TAB_COLUMNS WHERE {} AND {}{}",
            eq_ignore_case(database, "TABLE_NAME", table),
            eq_ignore_case(database, "COLUMN_NAME", column),
            owner
        );
        return count(connection, &sql).await;
    }

    let sql = format!(
        "SELECT {} FROM {} WHERE 1 = 0",
        database.escape_object_name(column, ObjectKind::Column),
        database.escape_table_name(None, schema, table)
    );
    Ok(probe(connection, &sql).await)
}
