use crate::database::{Database, DatabaseKind};
use crate::error::Result;
use crate::generator::standard::{column_definition, AddColumnSyntax};
use crate::generator::{payload, GeneratorChain, Sql, SqlGenerator, ValidationErrors, PRIORITY_DATABASE};
use crate::statement::{AddUniqueConstraintStatement, Statement, StatementKind};

const ADD_COLUMN: AddColumnSyntax = AddColumnSyntax {
    add_keyword: "ADD COLUMN",
    named_default: false,
};

/// SQLite adds one column per ALTER TABLE and cannot add table constraints
/// afterwards, so foreign keys are written inline and unique columns get an index.
pub struct SqliteAddColumn;

impl SqlGenerator for SqliteAddColumn {
    fn name(&self) -> &'static str {
        "SqliteAddColumn"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::AddColumn
    }

    fn priority(&self) -> i32 {
        PRIORITY_DATABASE
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.kind() == DatabaseKind::Sqlite
    }

    fn validate(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = chain.validate(statement, database);
        if let Statement::AddColumn(s) = statement {
            for column in &s.columns {
                if !column.is_nullable() && !column.is_primary_key() && column.default_value.is_none() {
                    errors.add_error(format!(
                        "Cannot add a NOT NULL column without a default value ({})",
                        column.name
                    ));
                }
                if column.is_auto_increment() {
                    errors.add_error(format!("Cannot add an auto-increment column ({})", column.name));
                }
                if column.foreign_keys().count() > 1 {
                    errors.add_error(format!("Only one foreign key per added column ({})", column.name));
                }
            }
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, AddColumn)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);

        let mut sql = Vec::new();
        for column in &s.columns {
            let mut clause = column_definition(s, column, database, chain.types(), ADD_COLUMN)?;
            if let Some(fk) = column.foreign_keys().next() {
                clause.push_str(&format!(
                    " CONSTRAINT {} REFERENCES {}({})",
                    database.escape_constraint_name(fk.name),
                    database.escape_table_name(None, None, fk.referenced_table),
                    database.escape_column_name_list(fk.referenced_columns)
                ));
                if fk.delete_cascade {
                    clause.push_str(" ON DELETE CASCADE");
                }
            }
            sql.push(Sql::new(format!("ALTER TABLE {} {}", table, clause)).affecting(&table));
        }

        for column in &s.columns {
            if let Some(name) = column.unique_constraint() {
                let mut unique = AddUniqueConstraintStatement::new(&s.table_name, &column.name, name);
                unique.schema_name = s.schema_name.clone();
                sql.extend(chain.registry().generate_sql(&unique.into(), database)?);
            }
        }
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::SqlValue;
    use crate::database::DatabaseKind;
    use crate::generator::standard::testing::{errors_for, sql_for};
    use crate::statement::{AddColumnStatement, ColumnConfig};

    #[test]
    fn test_one_statement_per_column() {
        let statement = AddColumnStatement::new("person", ColumnConfig::new("age", "int"))
            .with_column(ColumnConfig::new("nick", "varchar(20)").with_default(SqlValue::Text("none".into())));
        assert_eq!(
            sql_for(statement, DatabaseKind::Sqlite),
            "ALTER TABLE person ADD COLUMN age INTEGER;\n\
             ALTER TABLE person ADD COLUMN nick VARCHAR(20) DEFAULT 'none'"
        );
    }

    #[test]
    fn test_inline_reference_and_unique_index() {
        let column = ColumnConfig::new("team_id", "int")
            .foreign_key("fk_team", "team", "id")
            .unique(Some("uq_team"));
        assert_eq!(
            sql_for(AddColumnStatement::new("person", column), DatabaseKind::Sqlite),
            "ALTER TABLE person ADD COLUMN team_id INTEGER CONSTRAINT fk_team REFERENCES team(id);\n\
             CREATE UNIQUE INDEX uq_team ON person (team_id)"
        );
    }

    #[test]
    fn test_not_null_requires_default() {
        let statement = AddColumnStatement::new("person", ColumnConfig::new("age", "int").not_null());
        assert_eq!(
            errors_for(statement, DatabaseKind::Sqlite),
            vec!["Cannot add a NOT NULL column without a default value (age)".to_string()]
        );

        let with_default =
            AddColumnStatement::new("person", ColumnConfig::new("age", "int").not_null().with_default(0i64));
        assert!(errors_for(with_default, DatabaseKind::Sqlite).is_empty());
    }
}
