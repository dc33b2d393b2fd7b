//! Standard generators, one or more per statement kind.
//!
//! Quirks without a capability flag are handled inline by matching on the
//! family; anything large enough to stand alone lives in `generator::family`.

mod bookkeeping;
mod column;
mod constraint;
mod data;
mod index;
mod sequence;
mod table;
mod view;

use std::sync::Arc;

use super::{SqlGenerator, ValidationErrors};
use crate::core::SqlValue;
use crate::database::Database;
use crate::datatype::DataTypeRegistry;
use crate::error::{MigrateError, Result};
use crate::statement::ColumnConfig;

pub(crate) use column::{add_column_sql, column_definition, AddColumnSyntax};
pub(crate) use table::{create_table_sql, TableLayout};

pub(super) fn builtins() -> Vec<Arc<dyn SqlGenerator>> {
    vec![
        Arc::new(column::AddColumn),
        Arc::new(column::DropColumn),
        Arc::new(column::RenameColumn),
        Arc::new(column::AddDefaultValue),
        Arc::new(column::DropDefaultValue),
        Arc::new(column::AddNotNullConstraint),
        Arc::new(column::DropNotNullConstraint),
        Arc::new(constraint::AddUniqueConstraint),
        Arc::new(constraint::DropUniqueConstraint),
        Arc::new(constraint::AddPrimaryKey),
        Arc::new(constraint::DropPrimaryKey),
        Arc::new(constraint::AddForeignKeyConstraint),
        Arc::new(constraint::DropForeignKeyConstraint),
        Arc::new(table::CreateTable),
        Arc::new(table::DropTable),
        Arc::new(table::RenameTable),
        Arc::new(index::CreateIndex),
        Arc::new(index::DropIndex),
        Arc::new(sequence::CreateSequence),
        Arc::new(sequence::DropSequence),
        Arc::new(view::CreateView),
        Arc::new(view::DropView),
        Arc::new(data::Insert),
        Arc::new(data::Update),
        Arc::new(data::Delete),
        Arc::new(data::RawSql),
        Arc::new(data::Comment),
        Arc::new(bookkeeping::CreateDatabaseChangeLogTable),
        Arc::new(bookkeeping::SelectFromDatabaseChangeLog),
        Arc::new(bookkeeping::MarkChangeSetRan),
        Arc::new(bookkeeping::RemoveChangeSetRanStatus),
        Arc::new(bookkeeping::UpdateChangeSetChecksum),
        Arc::new(bookkeeping::TagDatabase),
        Arc::new(bookkeeping::CreateDatabaseChangeLogLockTable),
        Arc::new(bookkeeping::InitializeDatabaseChangeLogLockTable),
        Arc::new(bookkeeping::SelectFromDatabaseChangeLogLock),
        Arc::new(bookkeeping::LockDatabaseChangeLog),
        Arc::new(bookkeeping::UnlockDatabaseChangeLog),
    ]
}

/// Wrap a single message as a validation failure.
pub(crate) fn invalid(message: impl Into<String>) -> MigrateError {
    let mut errors = ValidationErrors::new();
    errors.add_error(message);
    MigrateError::Validation(errors)
}

/// Record a type descriptor problem, if any.
pub(crate) fn check_type(errors: &mut ValidationErrors, types: &DataTypeRegistry, descriptor: &str, database: &Database) {
    if let Err(message) = types.resolve(descriptor, database) {
        errors.add_error(message);
    }
}

/// Physical SQL type of a column.
pub(crate) fn column_type(types: &DataTypeRegistry, column: &ColumnConfig, database: &Database) -> Result<String> {
    types
        .to_database_type(&column.type_name, column.is_auto_increment(), database)
        .map(|t| t.to_string())
        .map_err(invalid)
}

/// Physical SQL type of a bare descriptor.
pub(crate) fn descriptor_type(types: &DataTypeRegistry, descriptor: &str, database: &Database) -> Result<String> {
    types
        .to_database_type(descriptor, false, database)
        .map(|t| t.to_string())
        .map_err(invalid)
}

/// Whether a resolved type carries auto-increment itself (`SERIAL` and friends),
/// in which case no default may be attached.
pub(crate) fn type_is_auto_increment(types: &DataTypeRegistry, column: &ColumnConfig, database: &Database) -> bool {
    types
        .resolve(&column.type_name, database)
        .is_ok_and(|instance| instance.auto_increment)
}

/// Literal for a column default, typed by the column's descriptor.
pub(crate) fn default_literal(types: &DataTypeRegistry, value: &SqlValue, descriptor: Option<&str>, database: &Database) -> String {
    types.literal(value, descriptor, database)
}

/// `'<text>'` with quotes escaped for the database.
pub(crate) fn quoted(database: &Database, text: &str) -> String {
    database.string_literal(text)
}
