//! Dialect-free statement model.
//!
//! A [`Statement`] describes one database operation semantically: names,
//! abstract type descriptors and constraints, never SQL syntax. The generator
//! registry turns a statement into SQL for a particular [`Database`].
//!
//! [`Database`]: crate::database::Database

mod bookkeeping;
mod column;
mod data;
mod ddl;

pub use bookkeeping::*;
pub use column::{ColumnConfig, Constraint, ForeignKeyRef};
pub use data::*;
pub use ddl::*;

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! statements {
    ($($variant:ident($ty:ty) => $name:literal,)*) => {
        /// Every statement the engine can generate SQL for.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "statement", rename_all = "snake_case")]
        pub enum Statement {
            $($variant($ty),)*
        }

        /// Field-less tag of a [`Statement`], used to key generators.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum StatementKind {
            $($variant,)*
        }

        impl Statement {
            pub fn kind(&self) -> StatementKind {
                match self {
                    $(Statement::$variant(_) => StatementKind::$variant,)*
                }
            }
        }

        impl StatementKind {
            /// Change-log style name, e.g. `addColumn`.
            pub fn name(self) -> &'static str {
                match self {
                    $(StatementKind::$variant => $name,)*
                }
            }
        }

        $(
            impl From<$ty> for Statement {
                fn from(statement: $ty) -> Self {
                    Statement::$variant(statement)
                }
            }
        )*
    };
}

statements! {
    AddColumn(AddColumnStatement) => "addColumn",
    AddUniqueConstraint(AddUniqueConstraintStatement) => "addUniqueConstraint",
    DropUniqueConstraint(DropUniqueConstraintStatement) => "dropUniqueConstraint",
    AddPrimaryKey(AddPrimaryKeyStatement) => "addPrimaryKey",
    DropPrimaryKey(DropPrimaryKeyStatement) => "dropPrimaryKey",
    AddForeignKeyConstraint(AddForeignKeyConstraintStatement) => "addForeignKeyConstraint",
    DropForeignKeyConstraint(DropForeignKeyConstraintStatement) => "dropForeignKeyConstraint",
    AddNotNullConstraint(AddNotNullConstraintStatement) => "addNotNullConstraint",
    DropNotNullConstraint(DropNotNullConstraintStatement) => "dropNotNullConstraint",
    AddDefaultValue(AddDefaultValueStatement) => "addDefaultValue",
    DropDefaultValue(DropDefaultValueStatement) => "dropDefaultValue",
    CreateTable(CreateTableStatement) => "createTable",
    DropTable(DropTableStatement) => "dropTable",
    RenameTable(RenameTableStatement) => "renameTable",
    DropColumn(DropColumnStatement) => "dropColumn",
    RenameColumn(RenameColumnStatement) => "renameColumn",
    CreateIndex(CreateIndexStatement) => "createIndex",
    DropIndex(DropIndexStatement) => "dropIndex",
    CreateSequence(CreateSequenceStatement) => "createSequence",
    DropSequence(DropSequenceStatement) => "dropSequence",
    CreateView(CreateViewStatement) => "createView",
    DropView(DropViewStatement) => "dropView",
    Insert(InsertStatement) => "insert",
    Update(UpdateStatement) => "update",
    Delete(DeleteStatement) => "delete",
    RawSql(RawSqlStatement) => "sql",
    Comment(CommentStatement) => "comment",
    CreateDatabaseChangeLogTable(CreateDatabaseChangeLogTableStatement) => "createDatabaseChangeLogTable",
    SelectFromDatabaseChangeLog(SelectFromDatabaseChangeLogStatement) => "selectFromDatabaseChangeLog",
    MarkChangeSetRan(MarkChangeSetRanStatement) => "markChangeSetRan",
    RemoveChangeSetRanStatus(RemoveChangeSetRanStatusStatement) => "removeChangeSetRanStatus",
    UpdateChangeSetChecksum(UpdateChangeSetChecksumStatement) => "updateChangeSetChecksum",
    TagDatabase(TagDatabaseStatement) => "tagDatabase",
    CreateDatabaseChangeLogLockTable(CreateDatabaseChangeLogLockTableStatement) => "createDatabaseChangeLogLockTable",
    InitializeDatabaseChangeLogLockTable(InitializeDatabaseChangeLogLockTableStatement) => "initializeDatabaseChangeLogLockTable",
    SelectFromDatabaseChangeLogLock(SelectFromDatabaseChangeLogLockStatement) => "selectFromDatabaseChangeLogLock",
    LockDatabaseChangeLog(LockDatabaseChangeLogStatement) => "lockDatabaseChangeLog",
    UnlockDatabaseChangeLog(UnlockDatabaseChangeLogStatement) => "unlockDatabaseChangeLog",
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Statement {
    /// One-line description used for history rows and logs.
    pub fn summary(&self) -> String {
        let detail = match self {
            Statement::AddColumn(s) => format!(
                "tableName={}, columns={}",
                s.table_name,
                s.columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
            Statement::AddUniqueConstraint(s) => format!(
                "tableName={}, columnNames={}",
                s.table_name, s.column_names
            ),
            Statement::CreateTable(s) => format!("tableName={}", s.table_name),
            Statement::DropTable(s) => format!("tableName={}", s.table_name),
            Statement::RenameTable(s) => {
                format!("oldTableName={}, newTableName={}", s.old_table_name, s.new_table_name)
            }
            Statement::DropColumn(s) => {
                format!("tableName={}, columnName={}", s.table_name, s.column_name)
            }
            Statement::RenameColumn(s) => format!(
                "tableName={}, oldColumnName={}, newColumnName={}",
                s.table_name, s.old_column_name, s.new_column_name
            ),
            Statement::CreateIndex(s) => {
                format!("indexName={}, tableName={}", s.index_name, s.table_name)
            }
            Statement::AddForeignKeyConstraint(s) => format!(
                "baseTableName={}, constraintName={}, referencedTableName={}",
                s.base_table_name, s.constraint_name, s.referenced_table_name
            ),
            Statement::CreateSequence(s) => format!("sequenceName={}", s.sequence_name),
            Statement::CreateView(s) => format!("viewName={}", s.view_name),
            Statement::Insert(s) => format!("tableName={}", s.table_name),
            _ => String::new(),
        };
        if detail.is_empty() {
            self.kind().name().to_string()
        } else {
            format!("{} {}", self.kind().name(), detail)
        }
    }

    /// Statements that undo this one, when the inverse can be derived
    /// from the statement alone.
    pub fn inverse(&self) -> Option<Vec<Statement>> {
        let inverse = match self {
            Statement::AddColumn(s) => s
                .columns
                .iter()
                .rev()
                .map(|c| {
                    Statement::DropColumn(DropColumnStatement {
                        catalog_name: s.catalog_name.clone(),
                        schema_name: s.schema_name.clone(),
                        table_name: s.table_name.clone(),
                        column_name: c.name.clone(),
                    })
                })
                .collect(),
            Statement::AddUniqueConstraint(s) => {
                vec![Statement::DropUniqueConstraint(DropUniqueConstraintStatement {
                    catalog_name: s.catalog_name.clone(),
                    schema_name: s.schema_name.clone(),
                    table_name: s.table_name.clone(),
                    constraint_name: s.constraint_name.clone()?,
                })]
            }
            Statement::AddPrimaryKey(s) => {
                vec![Statement::DropPrimaryKey(DropPrimaryKeyStatement {
                    catalog_name: s.catalog_name.clone(),
                    schema_name: s.schema_name.clone(),
                    table_name: s.table_name.clone(),
                    constraint_name: s.constraint_name.clone(),
                })]
            }
            Statement::AddForeignKeyConstraint(s) => {
                vec![Statement::DropForeignKeyConstraint(
                    DropForeignKeyConstraintStatement {
                        base_table_catalog_name: s.base_table_catalog_name.clone(),
                        base_table_schema_name: s.base_table_schema_name.clone(),
                        base_table_name: s.base_table_name.clone(),
                        constraint_name: s.constraint_name.clone(),
                    },
                )]
            }
            Statement::AddNotNullConstraint(s) => {
                vec![Statement::DropNotNullConstraint(DropNotNullConstraintStatement {
                    catalog_name: s.catalog_name.clone(),
                    schema_name: s.schema_name.clone(),
                    table_name: s.table_name.clone(),
                    column_name: s.column_name.clone(),
                    column_data_type: s.column_data_type.clone(),
                })]
            }
            Statement::AddDefaultValue(s) => {
                vec![Statement::DropDefaultValue(DropDefaultValueStatement {
                    catalog_name: s.catalog_name.clone(),
                    schema_name: s.schema_name.clone(),
                    table_name: s.table_name.clone(),
                    column_name: s.column_name.clone(),
                    column_data_type: s.column_data_type.clone(),
                })]
            }
            Statement::CreateTable(s) => vec![Statement::DropTable(DropTableStatement {
                catalog_name: s.catalog_name.clone(),
                schema_name: s.schema_name.clone(),
                table_name: s.table_name.clone(),
                cascade_constraints: false,
            })],
            Statement::RenameTable(s) => vec![Statement::RenameTable(RenameTableStatement {
                catalog_name: s.catalog_name.clone(),
                schema_name: s.schema_name.clone(),
                old_table_name: s.new_table_name.clone(),
                new_table_name: s.old_table_name.clone(),
            })],
            Statement::RenameColumn(s) => vec![Statement::RenameColumn(RenameColumnStatement {
                catalog_name: s.catalog_name.clone(),
                schema_name: s.schema_name.clone(),
                table_name: s.table_name.clone(),
                old_column_name: s.new_column_name.clone(),
                new_column_name: s.old_column_name.clone(),
                column_data_type: s.column_data_type.clone(),
                remarks: s.remarks.clone(),
            })],
            Statement::CreateIndex(s) => vec![Statement::DropIndex(DropIndexStatement {
                index_name: s.index_name.clone(),
                catalog_name: s.catalog_name.clone(),
                schema_name: s.schema_name.clone(),
                table_name: s.table_name.clone(),
            })],
            Statement::CreateSequence(s) => {
                vec![Statement::DropSequence(DropSequenceStatement {
                    catalog_name: s.catalog_name.clone(),
                    schema_name: s.schema_name.clone(),
                    sequence_name: s.sequence_name.clone(),
                })]
            }
            Statement::CreateView(s) => vec![Statement::DropView(DropViewStatement {
                catalog_name: s.catalog_name.clone(),
                schema_name: s.schema_name.clone(),
                view_name: s.view_name.clone(),
            })],
            Statement::Comment(_) => Vec::new(),
            _ => return None,
        };
        Some(inverse)
    }
}
