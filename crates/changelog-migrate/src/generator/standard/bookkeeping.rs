//! SQL for the history and lock tables.
//!
//! Most of these build an ordinary statement (CREATE TABLE, INSERT, UPDATE)
//! and hand it back to the registry, so the tracking tables get the same
//! quoting, type mapping and literal rules as user tables.

use crate::core::SqlValue;
use crate::database::Database;
use crate::error::Result;
use crate::generator::{payload, GeneratorChain, Sql, SqlGenerator, ValidationErrors};
use crate::statement::{
    ChangeSetKey, ColumnConfig, ColumnValue, CreateTableStatement, DeleteStatement, InsertStatement, Statement,
    StatementKind, TableRef, UpdateStatement,
};

/// History table columns in select order.
pub const HISTORY_COLUMNS: [&str; 14] = [
    "ID",
    "AUTHOR",
    "FILENAME",
    "DATEEXECUTED",
    "ORDEREXECUTED",
    "EXECTYPE",
    "MD5SUM",
    "DESCRIPTION",
    "COMMENTS",
    "TAG",
    "LIQUIBASE",
    "CONTEXTS",
    "LABELS",
    "DEPLOYMENT_ID",
];

/// Lock table columns in select order.
pub const LOCK_COLUMNS: [&str; 4] = ["ID", "LOCKED", "LOCKGRANTED", "LOCKEDBY"];

const TEXT_LIMIT: usize = 255;

fn column(database: &Database, name: &str) -> String {
    database.escape_column_name(&database.correct_object_name(name))
}

fn table_name(database: &Database, table: &TableRef) -> String {
    database.escape_table_name(
        table.catalog_name.as_deref(),
        table.schema_name.as_deref(),
        &database.correct_object_name(&table.table_name),
    )
}

/// A statement against `table` with its name folded for `database`.
fn corrected(database: &Database, table: &TableRef) -> TableRef {
    TableRef {
        catalog_name: table.catalog_name.clone(),
        schema_name: table.schema_name.clone(),
        table_name: database.correct_object_name(&table.table_name),
    }
}

fn value(database: &Database, name: &str, value: impl Into<SqlValue>, type_name: Option<&str>) -> ColumnValue {
    ColumnValue {
        name: database.correct_object_name(name),
        value: value.into(),
        type_name: type_name.map(String::from),
    }
}

fn optional_text(text: Option<&str>) -> SqlValue {
    match text {
        Some(text) => SqlValue::Text(text.to_string()),
        None => SqlValue::Null,
    }
}

fn truncated(text: &str) -> String {
    text.chars().take(TEXT_LIMIT).collect()
}

fn key_where(database: &Database, key: &ChangeSetKey) -> String {
    format!(
        "{} = {} AND {} = {} AND {} = {}",
        column(database, "ID"),
        database.string_literal(&key.id),
        column(database, "AUTHOR"),
        database.string_literal(&key.author),
        column(database, "FILENAME"),
        database.string_literal(&key.file_path)
    )
}

fn update(database: &Database, table: &TableRef, values: Vec<ColumnValue>, where_clause: Option<String>) -> Statement {
    let table = corrected(database, table);
    Statement::Update(UpdateStatement {
        catalog_name: table.catalog_name,
        schema_name: table.schema_name,
        table_name: table.table_name,
        values,
        where_clause,
    })
}

fn validate_table(statement: &Statement) -> ValidationErrors {
    let table = match statement {
        Statement::CreateDatabaseChangeLogTable(s) => &s.table,
        Statement::SelectFromDatabaseChangeLog(s) => &s.table,
        Statement::MarkChangeSetRan(s) => &s.table,
        Statement::RemoveChangeSetRanStatus(s) => &s.table,
        Statement::UpdateChangeSetChecksum(s) => &s.table,
        Statement::TagDatabase(s) => &s.table,
        Statement::CreateDatabaseChangeLogLockTable(s) => &s.table,
        Statement::InitializeDatabaseChangeLogLockTable(s) => &s.table,
        Statement::SelectFromDatabaseChangeLogLock(s) => &s.table,
        Statement::LockDatabaseChangeLog(s) => &s.table,
        Statement::UnlockDatabaseChangeLog(s) => &s.table,
        _ => return ValidationErrors::new(),
    };
    let mut errors = ValidationErrors::new();
    errors.check_identifier("tableName", &table.table_name);
    errors
}

macro_rules! bookkeeping_generator {
    ($name:ident) => {
        pub struct $name;

        impl $name {
            fn kind() -> StatementKind {
                StatementKind::$name
            }
        }
    };
}

bookkeeping_generator!(CreateDatabaseChangeLogTable);
bookkeeping_generator!(SelectFromDatabaseChangeLog);
bookkeeping_generator!(MarkChangeSetRan);
bookkeeping_generator!(RemoveChangeSetRanStatus);
bookkeeping_generator!(UpdateChangeSetChecksum);
bookkeeping_generator!(TagDatabase);
bookkeeping_generator!(CreateDatabaseChangeLogLockTable);
bookkeeping_generator!(InitializeDatabaseChangeLogLockTable);
bookkeeping_generator!(SelectFromDatabaseChangeLogLock);
bookkeeping_generator!(LockDatabaseChangeLog);
bookkeeping_generator!(UnlockDatabaseChangeLog);

impl SqlGenerator for CreateDatabaseChangeLogTable {
    fn name(&self) -> &'static str {
        "CreateDatabaseChangeLogTable"
    }

    fn statement_kind(&self) -> StatementKind {
        Self::kind()
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        validate_table(statement)
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, CreateDatabaseChangeLogTable)?;
        let table = corrected(database, &s.table);
        let col = |name: &str, type_name: &str| ColumnConfig::new(database.correct_object_name(name), type_name);

        let mut create = CreateTableStatement::new(table.table_name);
        create.catalog_name = table.catalog_name;
        create.schema_name = table.schema_name;
        create.columns = vec![
            col("ID", "varchar(255)").not_null(),
            col("AUTHOR", "varchar(255)").not_null(),
            col("FILENAME", "varchar(255)").not_null(),
            col("DATEEXECUTED", "datetime").not_null(),
            col("ORDEREXECUTED", "int").not_null(),
            col("EXECTYPE", "varchar(10)").not_null(),
            col("MD5SUM", "varchar(35)"),
            col("DESCRIPTION", "varchar(255)"),
            col("COMMENTS", "varchar(255)"),
            col("TAG", "varchar(255)"),
            col("LIQUIBASE", "varchar(20)"),
            col("CONTEXTS", "varchar(255)"),
            col("LABELS", "varchar(255)"),
            col("DEPLOYMENT_ID", "varchar(10)"),
        ];
        chain.registry().generate_sql(&create.into(), database)
    }
}

impl SqlGenerator for SelectFromDatabaseChangeLog {
    fn name(&self) -> &'static str {
        "SelectFromDatabaseChangeLog"
    }

    fn statement_kind(&self) -> StatementKind {
        Self::kind()
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        validate_table(statement)
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, SelectFromDatabaseChangeLog)?;
        let columns: Vec<String> = HISTORY_COLUMNS.iter().map(|c| column(database, c)).collect();
        Ok(vec![Sql::new(format!(
            "SELECT {} FROM {} ORDER BY {} ASC, {} ASC",
            columns.join(", "),
            table_name(database, &s.table),
            column(database, "DATEEXECUTED"),
            column(database, "ORDEREXECUTED")
        ))])
    }
}

impl SqlGenerator for MarkChangeSetRan {
    fn name(&self) -> &'static str {
        "MarkChangeSetRan"
    }

    fn statement_kind(&self) -> StatementKind {
        Self::kind()
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = validate_table(statement);
        if let Statement::MarkChangeSetRan(s) = statement {
            errors.check_required("id", &s.row.key.id);
            errors.check_required("author", &s.row.key.author);
            errors.check_required("filePath", &s.row.key.file_path);
            errors.check_required("execType", &s.row.exec_type);
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, MarkChangeSetRan)?;
        let row = &s.row;
        let mut values = vec![
            value(database, "DATEEXECUTED", SqlValue::CurrentDateTime, None),
            value(database, "ORDEREXECUTED", row.order_executed, None),
            value(database, "MD5SUM", optional_text(row.md5sum.as_deref()), None),
            value(database, "EXECTYPE", row.exec_type.as_str(), None),
            value(database, "DEPLOYMENT_ID", row.deployment_id.as_str(), None),
        ];

        let generated = if s.update_existing {
            update(database, &s.table, values, Some(key_where(database, &row.key)))
        } else {
            let table = corrected(database, &s.table);
            let mut identity = vec![
                value(database, "ID", row.key.id.as_str(), None),
                value(database, "AUTHOR", row.key.author.as_str(), None),
                value(database, "FILENAME", row.key.file_path.as_str(), None),
            ];
            identity.append(&mut values);
            identity.extend([
                value(database, "DESCRIPTION", truncated(&row.description), None),
                value(database, "COMMENTS", truncated(&row.comments), None),
                value(database, "TAG", optional_text(row.tag.as_deref()), None),
                value(database, "LIQUIBASE", row.liquibase_version.as_str(), None),
                value(database, "CONTEXTS", optional_text(row.contexts.as_deref()), None),
                value(database, "LABELS", optional_text(row.labels.as_deref()), None),
            ]);
            Statement::Insert(InsertStatement {
                catalog_name: table.catalog_name,
                schema_name: table.schema_name,
                table_name: table.table_name,
                values: identity,
            })
        };
        chain.registry().generate_sql(&generated, database)
    }
}

impl SqlGenerator for RemoveChangeSetRanStatus {
    fn name(&self) -> &'static str {
        "RemoveChangeSetRanStatus"
    }

    fn statement_kind(&self) -> StatementKind {
        Self::kind()
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        validate_table(statement)
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, RemoveChangeSetRanStatus)?;
        let table = corrected(database, &s.table);
        let delete = DeleteStatement {
            catalog_name: table.catalog_name,
            schema_name: table.schema_name,
            table_name: table.table_name,
            where_clause: Some(key_where(database, &s.key)),
        };
        chain.registry().generate_sql(&delete.into(), database)
    }
}

impl SqlGenerator for UpdateChangeSetChecksum {
    fn name(&self) -> &'static str {
        "UpdateChangeSetChecksum"
    }

    fn statement_kind(&self) -> StatementKind {
        Self::kind()
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        validate_table(statement)
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, UpdateChangeSetChecksum)?;
        let values = vec![value(database, "MD5SUM", optional_text(s.md5sum.as_deref()), None)];
        let where_clause = s.key.as_ref().map(|key| key_where(database, key));
        chain
            .registry()
            .generate_sql(&update(database, &s.table, values, where_clause), database)
    }
}

impl SqlGenerator for TagDatabase {
    fn name(&self) -> &'static str {
        "TagDatabase"
    }

    fn statement_kind(&self) -> StatementKind {
        Self::kind()
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = validate_table(statement);
        if let Statement::TagDatabase(s) = statement {
            errors.check_required("tag", &s.tag);
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, TagDatabase)?;
        let table = table_name(database, &s.table);
        let order = column(database, "ORDEREXECUTED");
        let latest = match database.kind() {
            // MySQL refuses a subquery on the table being updated unless it is materialized.
            crate::database::DatabaseKind::MySql | crate::database::DatabaseKind::MariaDb => format!(
                "(SELECT MAX({order}) FROM (SELECT {order} FROM {table}) AS X)",
                order = order,
                table = table
            ),
            _ => format!("(SELECT MAX({}) FROM {})", order, table),
        };
        let values = vec![value(database, "TAG", s.tag.as_str(), None)];
        let where_clause = format!("{} = {}", order, latest);
        chain
            .registry()
            .generate_sql(&update(database, &s.table, values, Some(where_clause)), database)
    }
}

impl SqlGenerator for CreateDatabaseChangeLogLockTable {
    fn name(&self) -> &'static str {
        "CreateDatabaseChangeLogLockTable"
    }

    fn statement_kind(&self) -> StatementKind {
        Self::kind()
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        validate_table(statement)
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, CreateDatabaseChangeLogLockTable)?;
        let table = corrected(database, &s.table);
        let col = |name: &str, type_name: &str| ColumnConfig::new(database.correct_object_name(name), type_name);

        let mut create = CreateTableStatement::new(table.table_name);
        create.catalog_name = table.catalog_name;
        create.schema_name = table.schema_name;
        create.columns = vec![
            col("ID", "int").primary_key(),
            col("LOCKED", "boolean").not_null(),
            col("LOCKGRANTED", "datetime"),
            col("LOCKEDBY", "varchar(255)"),
        ];
        chain.registry().generate_sql(&create.into(), database)
    }
}

impl SqlGenerator for InitializeDatabaseChangeLogLockTable {
    fn name(&self) -> &'static str {
        "InitializeDatabaseChangeLogLockTable"
    }

    fn statement_kind(&self) -> StatementKind {
        Self::kind()
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        validate_table(statement)
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, InitializeDatabaseChangeLogLockTable)?;
        let table = corrected(database, &s.table);
        let delete = DeleteStatement {
            catalog_name: table.catalog_name.clone(),
            schema_name: table.schema_name.clone(),
            table_name: table.table_name.clone(),
            where_clause: None,
        };
        let insert = InsertStatement {
            catalog_name: table.catalog_name,
            schema_name: table.schema_name,
            table_name: table.table_name,
            values: vec![
                value(database, "ID", 1i64, None),
                value(database, "LOCKED", false, Some("boolean")),
            ],
        };
        chain
            .registry()
            .generate_statements(&[delete.into(), insert.into()], database)
    }
}

impl SqlGenerator for SelectFromDatabaseChangeLogLock {
    fn name(&self) -> &'static str {
        "SelectFromDatabaseChangeLogLock"
    }

    fn statement_kind(&self) -> StatementKind {
        Self::kind()
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        validate_table(statement)
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, SelectFromDatabaseChangeLogLock)?;
        let columns: Vec<String> = LOCK_COLUMNS.iter().map(|c| column(database, c)).collect();
        Ok(vec![Sql::new(format!(
            "SELECT {} FROM {} WHERE {} = 1",
            columns.join(", "),
            table_name(database, &s.table),
            column(database, "ID")
        ))])
    }
}

impl SqlGenerator for LockDatabaseChangeLog {
    fn name(&self) -> &'static str {
        "LockDatabaseChangeLog"
    }

    fn statement_kind(&self) -> StatementKind {
        Self::kind()
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = validate_table(statement);
        if let Statement::LockDatabaseChangeLog(s) = statement {
            errors.check_required("lockedBy", &s.locked_by);
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, LockDatabaseChangeLog)?;
        let types = chain.types();
        let values = vec![
            value(database, "LOCKED", true, Some("boolean")),
            value(database, "LOCKEDBY", truncated(&s.locked_by), None),
            value(database, "LOCKGRANTED", SqlValue::DateTime(s.lock_granted), Some("datetime")),
        ];
        let where_clause = format!(
            "{} = 1 AND {} = {}",
            column(database, "ID"),
            column(database, "LOCKED"),
            types.literal(&SqlValue::Bool(false), Some("boolean"), database)
        );
        chain
            .registry()
            .generate_sql(&update(database, &s.table, values, Some(where_clause)), database)
    }
}

impl SqlGenerator for UnlockDatabaseChangeLog {
    fn name(&self) -> &'static str {
        "UnlockDatabaseChangeLog"
    }

    fn statement_kind(&self) -> StatementKind {
        Self::kind()
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        validate_table(statement)
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, UnlockDatabaseChangeLog)?;
        let values = vec![
            value(database, "LOCKED", false, Some("boolean")),
            value(database, "LOCKGRANTED", SqlValue::Null, None),
            value(database, "LOCKEDBY", SqlValue::Null, None),
        ];
        let where_clause = format!("{} = 1", column(database, "ID"));
        chain
            .registry()
            .generate_sql(&update(database, &s.table, values, Some(where_clause)), database)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::super::testing::sql_for;
    use crate::database::DatabaseKind;
    use crate::statement::{
        ChangeSetKey, CreateDatabaseChangeLogLockTableStatement, CreateDatabaseChangeLogTableStatement,
        HistoryRow, InitializeDatabaseChangeLogLockTableStatement, LockDatabaseChangeLogStatement,
        MarkChangeSetRanStatement, SelectFromDatabaseChangeLogLockStatement, TableRef, TagDatabaseStatement,
        UnlockDatabaseChangeLogStatement, UpdateChangeSetChecksumStatement,
    };

    fn history() -> TableRef {
        TableRef::new("DATABASECHANGELOG")
    }

    fn lock() -> TableRef {
        TableRef::new("DATABASECHANGELOGLOCK")
    }

    fn key() -> ChangeSetKey {
        ChangeSetKey {
            id: "1".into(),
            author: "ann".into(),
            file_path: "db/changelog.yaml".into(),
        }
    }

    fn row() -> HistoryRow {
        HistoryRow {
            key: key(),
            order_executed: 3,
            exec_type: "EXECUTED".into(),
            md5sum: Some("9:abc".into()),
            description: "createTable tableName=person".into(),
            comments: String::new(),
            tag: None,
            liquibase_version: "0.1.0".into(),
            contexts: Some("test".into()),
            labels: None,
            deployment_id: "1234567890".into(),
        }
    }

    #[test]
    fn test_history_table_folds_names_on_postgres() {
        let sql = sql_for(CreateDatabaseChangeLogTableStatement { table: history() }, DatabaseKind::Postgres);
        assert!(sql.starts_with("CREATE TABLE databasechangelog (id VARCHAR(255) NOT NULL, "));
        assert!(sql.contains("dateexecuted TIMESTAMP NOT NULL"));
        assert!(sql.ends_with("deployment_id VARCHAR(10))"));
    }

    #[test]
    fn test_lock_table_on_sqlite() {
        assert_eq!(
            sql_for(CreateDatabaseChangeLogLockTableStatement { table: lock() }, DatabaseKind::Sqlite),
            "CREATE TABLE DATABASECHANGELOGLOCK (ID INTEGER NOT NULL, LOCKED BOOLEAN NOT NULL, \
             LOCKGRANTED TEXT, LOCKEDBY VARCHAR(255), CONSTRAINT PK_DATABASECHANGELOGLOCK PRIMARY KEY (ID))"
        );
        assert_eq!(
            sql_for(InitializeDatabaseChangeLogLockTableStatement { table: lock() }, DatabaseKind::Sqlite),
            "DELETE FROM DATABASECHANGELOGLOCK;\nINSERT INTO DATABASECHANGELOGLOCK (ID, LOCKED) VALUES (1, 0)"
        );
    }

    #[test]
    fn test_lock_is_conditional() {
        let statement = LockDatabaseChangeLogStatement {
            table: lock(),
            locked_by: "build01 (10.0.0.5)".into(),
            lock_granted: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        };
        assert_eq!(
            sql_for(statement, DatabaseKind::Postgres),
            "UPDATE databasechangeloglock SET locked = TRUE, lockedby = 'build01 (10.0.0.5)', \
             lockgranted = '2024-05-01 12:00:00' WHERE id = 1 AND locked = FALSE"
        );
        assert_eq!(
            sql_for(UnlockDatabaseChangeLogStatement { table: lock() }, DatabaseKind::Postgres),
            "UPDATE databasechangeloglock SET locked = FALSE, lockgranted = NULL, lockedby = NULL WHERE id = 1"
        );
        assert_eq!(
            sql_for(SelectFromDatabaseChangeLogLockStatement { table: lock() }, DatabaseKind::Postgres),
            "SELECT id, locked, lockgranted, lockedby FROM databasechangeloglock WHERE id = 1"
        );
    }

    #[test]
    fn test_mark_ran_insert_and_rerun_update() {
        let insert = sql_for(
            MarkChangeSetRanStatement {
                table: history(),
                row: row(),
                update_existing: false,
            },
            DatabaseKind::H2,
        );
        assert!(insert.starts_with(
            "INSERT INTO DATABASECHANGELOG (ID, AUTHOR, FILENAME, DATEEXECUTED, ORDEREXECUTED, MD5SUM, EXECTYPE, "
        ));
        assert!(insert.contains("VALUES ('1', 'ann', 'db/changelog.yaml', NOW(), 3, '9:abc', 'EXECUTED', "));

        let mut rerun = row();
        rerun.exec_type = "RERAN".into();
        let update = sql_for(
            MarkChangeSetRanStatement {
                table: history(),
                row: rerun,
                update_existing: true,
            },
            DatabaseKind::H2,
        );
        assert_eq!(
            update,
            "UPDATE DATABASECHANGELOG SET DATEEXECUTED = NOW(), ORDEREXECUTED = 3, MD5SUM = '9:abc', \
             EXECTYPE = 'RERAN', DEPLOYMENT_ID = '1234567890' \
             WHERE ID = '1' AND AUTHOR = 'ann' AND FILENAME = 'db/changelog.yaml'"
        );
    }

    #[test]
    fn test_clear_all_checksums() {
        assert_eq!(
            sql_for(
                UpdateChangeSetChecksumStatement {
                    table: history(),
                    key: None,
                    md5sum: None,
                },
                DatabaseKind::Sqlite
            ),
            "UPDATE DATABASECHANGELOG SET MD5SUM = NULL"
        );
    }

    #[test]
    fn test_tag_targets_latest_row() {
        let tag = TagDatabaseStatement {
            table: history(),
            tag: "v1.0".into(),
        };
        assert_eq!(
            sql_for(tag.clone(), DatabaseKind::Sqlite),
            "UPDATE DATABASECHANGELOG SET TAG = 'v1.0' \
             WHERE ORDEREXECUTED = (SELECT MAX(ORDEREXECUTED) FROM DATABASECHANGELOG)"
        );
        assert!(sql_for(tag, DatabaseKind::MySql)
            .ends_with("(SELECT MAX(ORDEREXECUTED) FROM (SELECT ORDEREXECUTED FROM DATABASECHANGELOG) AS X)"));
    }
}
