//! Schema-changing statements.

use serde::{Deserialize, Serialize};

use super::column::ColumnConfig;
use crate::core::SqlValue;

/// Add one or more columns to an existing table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddColumnStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    pub columns: Vec<ColumnConfig>,
}

impl AddColumnStatement {
    pub fn new(table_name: impl Into<String>, column: ColumnConfig) -> Self {
        Self {
            catalog_name: None,
            schema_name: None,
            table_name: table_name.into(),
            columns: vec![column],
        }
    }

    pub fn with_column(mut self, column: ColumnConfig) -> Self {
        self.columns.push(column);
        self
    }

    pub fn is_multiple(&self) -> bool {
        self.columns.len() > 1
    }

    /// The same statement restricted to a single column.
    pub fn for_column(&self, column: &ColumnConfig) -> Self {
        Self {
            catalog_name: self.catalog_name.clone(),
            schema_name: self.schema_name.clone(),
            table_name: self.table_name.clone(),
            columns: vec![column.clone()],
        }
    }
}

/// Add a unique constraint over one or more existing columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddUniqueConstraintStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    /// Comma separated column list.
    pub column_names: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablespace: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deferrable: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub initially_deferred: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

impl AddUniqueConstraintStatement {
    pub fn new(
        table_name: impl Into<String>,
        column_names: impl Into<String>,
        constraint_name: Option<&str>,
    ) -> Self {
        Self {
            catalog_name: None,
            schema_name: None,
            table_name: table_name.into(),
            column_names: column_names.into(),
            constraint_name: constraint_name.map(String::from),
            tablespace: None,
            deferrable: false,
            initially_deferred: false,
            disabled: false,
        }
    }

    pub fn with_tablespace(mut self, tablespace: impl Into<String>) -> Self {
        self.tablespace = Some(tablespace.into());
        self
    }

    pub fn with_deferral(mut self, deferrable: bool, initially_deferred: bool, disabled: bool) -> Self {
        self.deferrable = deferrable;
        self.initially_deferred = initially_deferred;
        self.disabled = disabled;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropUniqueConstraintStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    pub constraint_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPrimaryKeyStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    pub column_names: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropPrimaryKeyStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddForeignKeyConstraintStatement {
    pub constraint_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_table_catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_table_schema_name: Option<String>,
    pub base_table_name: String,
    pub base_column_names: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_table_catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_table_schema_name: Option<String>,
    pub referenced_table_name: String,
    pub referenced_column_names: String,
    /// Referential action, e.g. `CASCADE` or `SET NULL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deferrable: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub initially_deferred: bool,
}

impl AddForeignKeyConstraintStatement {
    pub fn new(
        constraint_name: impl Into<String>,
        base_table_name: impl Into<String>,
        base_column_names: impl Into<String>,
        referenced_table_name: impl Into<String>,
        referenced_column_names: impl Into<String>,
    ) -> Self {
        Self {
            constraint_name: constraint_name.into(),
            base_table_catalog_name: None,
            base_table_schema_name: None,
            base_table_name: base_table_name.into(),
            base_column_names: base_column_names.into(),
            referenced_table_catalog_name: None,
            referenced_table_schema_name: None,
            referenced_table_name: referenced_table_name.into(),
            referenced_column_names: referenced_column_names.into(),
            on_delete: None,
            on_update: None,
            deferrable: false,
            initially_deferred: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropForeignKeyConstraintStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_table_catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_table_schema_name: Option<String>,
    pub base_table_name: String,
    pub constraint_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddNotNullConstraintStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    pub column_name: String,
    /// Required by dialects that restate the type (MySQL, MSSQL, Sybase).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_data_type: Option<String>,
    /// Existing NULLs are updated to this value first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_null_value: Option<SqlValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropNotNullConstraintStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    pub column_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_data_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddDefaultValueStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    pub column_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_data_type: Option<String>,
    pub default_value: SqlValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropDefaultValueStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    pub column_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_data_type: Option<String>,
}

/// Create a table. Column-level constraints become table constraints; every
/// column flagged primary key joins one composite key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTableStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    pub columns: Vec<ColumnConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl CreateTableStatement {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            catalog_name: None,
            schema_name: None,
            table_name: table_name.into(),
            columns: Vec::new(),
            tablespace: None,
            remarks: None,
        }
    }

    pub fn with_column(mut self, column: ColumnConfig) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key_columns(&self) -> Vec<&ColumnConfig> {
        self.columns.iter().filter(|c| c.is_primary_key()).collect()
    }

    /// First explicitly named primary key constraint.
    pub fn primary_key_name(&self) -> Option<&str> {
        self.columns.iter().find_map(|c| {
            c.constraints.iter().find_map(|k| match k {
                super::Constraint::PrimaryKey { name, .. } => name.as_deref(),
                _ => None,
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTableStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cascade_constraints: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameTableStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub old_table_name: String,
    pub new_table_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropColumnStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    pub column_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameColumnStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    pub old_column_name: String,
    pub new_column_name: String,
    /// MySQL restates the full column definition on rename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndexStatement {
    pub index_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropIndexStatement {
    pub index_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSequenceStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub sequence_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment_by: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<bool>,
}

impl CreateSequenceStatement {
    pub fn new(sequence_name: impl Into<String>) -> Self {
        Self {
            catalog_name: None,
            schema_name: None,
            sequence_name: sequence_name.into(),
            start_value: None,
            increment_by: None,
            min_value: None,
            max_value: None,
            cycle: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSequenceStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub sequence_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateViewStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub view_name: String,
    pub select_query: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub replace_if_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropViewStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub view_name: String,
}
