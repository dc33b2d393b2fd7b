//! Column definitions and the constraints embedded in them.

use serde::{Deserialize, Serialize};

use crate::core::SqlValue;

/// A constraint attached to a column or table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    /// Column rejects NULL.
    NotNull {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Column is (part of) the primary key.
    PrimaryKey {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tablespace: Option<String>,
    },

    /// Column values are unique.
    Unique {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Column references another table.
    ForeignKey {
        name: String,
        referenced_table: String,
        referenced_columns: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        referenced_schema: Option<String>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        delete_cascade: bool,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        deferrable: bool,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        initially_deferred: bool,
    },

    /// Column is generated by the database.
    AutoIncrement {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_with: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        increment_by: Option<i64>,
    },

    /// Column-level check condition.
    Check {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        condition: String,
    },
}

/// Foreign key view over a [`Constraint::ForeignKey`].
#[derive(Debug, Clone, Copy)]
pub struct ForeignKeyRef<'a> {
    pub name: &'a str,
    pub referenced_table: &'a str,
    pub referenced_columns: &'a str,
    pub referenced_schema: Option<&'a str>,
    pub delete_cascade: bool,
    pub deferrable: bool,
    pub initially_deferred: bool,
}

/// A column as it appears in AddColumn and CreateTable statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,

    /// Abstract type descriptor, e.g. `varchar(255)` or `int`.
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<SqlValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,

    /// Computed columns carry an expression in `name` and no type.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub computed: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl ColumnConfig {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            default_value: None,
            remarks: None,
            computed: false,
            constraints: Vec::new(),
            after_column: None,
            before_column: None,
            position: None,
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn not_null(self) -> Self {
        self.with_constraint(Constraint::NotNull { name: None })
    }

    pub fn primary_key(self) -> Self {
        self.with_constraint(Constraint::PrimaryKey {
            name: None,
            tablespace: None,
        })
    }

    pub fn unique(self, name: Option<&str>) -> Self {
        self.with_constraint(Constraint::Unique {
            name: name.map(String::from),
        })
    }

    pub fn auto_increment(self, start_with: Option<i64>, increment_by: Option<i64>) -> Self {
        self.with_constraint(Constraint::AutoIncrement {
            start_with,
            increment_by,
        })
    }

    pub fn foreign_key(
        self,
        name: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_columns: impl Into<String>,
    ) -> Self {
        self.with_constraint(Constraint::ForeignKey {
            name: name.into(),
            referenced_table: referenced_table.into(),
            referenced_columns: referenced_columns.into(),
            referenced_schema: None,
            delete_cascade: false,
            deferrable: false,
            initially_deferred: false,
        })
    }

    pub fn with_default(mut self, value: impl Into<SqlValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    pub fn after(mut self, column: impl Into<String>) -> Self {
        self.after_column = Some(column.into());
        self
    }

    pub fn before(mut self, column: impl Into<String>) -> Self {
        self.before_column = Some(column.into());
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| matches!(c, Constraint::PrimaryKey { .. }))
    }

    /// Primary key columns are implicitly NOT NULL.
    pub fn is_nullable(&self) -> bool {
        !self.is_primary_key()
            && !self
                .constraints
                .iter()
                .any(|c| matches!(c, Constraint::NotNull { .. }))
    }

    /// Name of an explicit NOT NULL constraint, if one was given.
    pub fn not_null_constraint_name(&self) -> Option<&str> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::NotNull { name } => name.as_deref(),
            _ => None,
        })
    }

    pub fn primary_key_tablespace(&self) -> Option<&str> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::PrimaryKey { tablespace, .. } => tablespace.as_deref(),
            _ => None,
        })
    }

    /// `Some(constraint name)` when the column is unique.
    pub fn unique_constraint(&self) -> Option<Option<&str>> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::Unique { name } => Some(name.as_deref()),
            _ => None,
        })
    }

    /// `(start_with, increment_by)` when the column auto-increments.
    pub fn auto_increment_settings(&self) -> Option<(Option<i64>, Option<i64>)> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::AutoIncrement {
                start_with,
                increment_by,
            } => Some((*start_with, *increment_by)),
            _ => None,
        })
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment_settings().is_some()
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = ForeignKeyRef<'_>> {
        self.constraints.iter().filter_map(|c| match c {
            Constraint::ForeignKey {
                name,
                referenced_table,
                referenced_columns,
                referenced_schema,
                delete_cascade,
                deferrable,
                initially_deferred,
            } => Some(ForeignKeyRef {
                name,
                referenced_table,
                referenced_columns,
                referenced_schema: referenced_schema.as_deref(),
                delete_cascade: *delete_cascade,
                deferrable: *deferrable,
                initially_deferred: *initially_deferred,
            }),
            _ => None,
        })
    }

    pub fn checks(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.constraints.iter().filter_map(|c| match c {
            Constraint::Check { name, condition } => Some((name.as_deref(), condition.as_str())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key_implies_not_null() {
        let col = ColumnConfig::new("id", "int").primary_key();
        assert!(col.is_primary_key());
        assert!(!col.is_nullable());
    }

    #[test]
    fn test_column_constraint_accessors() {
        let col = ColumnConfig::new("owner_id", "bigint")
            .not_null()
            .unique(Some("uq_owner"))
            .foreign_key("fk_owner", "person", "id")
            .auto_increment(Some(10), None);

        assert!(!col.is_nullable());
        assert_eq!(col.unique_constraint(), Some(Some("uq_owner")));
        assert_eq!(col.auto_increment_settings(), Some((Some(10), None)));
        let fks: Vec<_> = col.foreign_keys().collect();
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].referenced_table, "person");
    }

    #[test]
    fn test_constraint_yaml_shape() {
        let yaml = "name: id\ntype: int\nconstraints:\n  - kind: primary_key\n  - kind: auto_increment\n    start_with: 5\n";
        let col: ColumnConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(col.is_primary_key());
        assert_eq!(col.auto_increment_settings(), Some((Some(5), None)));
    }
}
