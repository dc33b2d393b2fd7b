use crate::database::{Database, DatabaseKind};
use crate::error::Result;
use crate::generator::{payload, GeneratorChain, Sql, SqlGenerator, ValidationErrors};
use crate::statement::{Statement, StatementKind};

/// Families that accept a schema-qualified index name.
fn qualifies_index_name(database: &Database) -> bool {
    matches!(
        database.kind(),
        DatabaseKind::Oracle | DatabaseKind::Db2 | DatabaseKind::Derby | DatabaseKind::H2 | DatabaseKind::Hsql
    )
}

pub struct CreateIndex;

impl SqlGenerator for CreateIndex {
    fn name(&self) -> &'static str {
        "CreateIndex"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::CreateIndex
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::CreateIndex(s) = statement {
            errors.check_required("indexName", &s.index_name);
            errors.check_identifier("tableName", &s.table_name);
            if s.columns.iter().all(|c| c.trim().is_empty()) {
                errors.add_error("columns is required");
            }
        }
        errors
    }

    fn warnings(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Vec<String> {
        match statement {
            Statement::CreateIndex(s) if s.tablespace.is_some() && !database.capabilities().supports_tablespaces => {
                vec![format!("Index tablespaces are ignored on {}", database.short_name())]
            }
            _ => Vec::new(),
        }
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, CreateIndex)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        let index = if qualifies_index_name(database) {
            database.escape_index_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.index_name)
        } else {
            database.escape_index_name(None, None, &s.index_name)
        };
        let columns = s
            .columns
            .iter()
            .filter(|c| !c.trim().is_empty())
            .map(|c| database.escape_column_name_list(c))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "CREATE {}INDEX {} ON {}({})",
            if s.unique { "UNIQUE " } else { "" },
            index,
            table,
            columns
        );

        if let Some(tablespace) = s.tablespace.as_deref().filter(|t| !t.trim().is_empty()) {
            if database.capabilities().supports_tablespaces {
                match database.kind() {
                    DatabaseKind::Mssql | DatabaseKind::Sybase => sql.push_str(&format!(" ON {}", tablespace)),
                    DatabaseKind::Db2 | DatabaseKind::Informix => sql.push_str(&format!(" IN {}", tablespace)),
                    _ => sql.push_str(&format!(" TABLESPACE {}", tablespace)),
                }
            }
        }

        Ok(vec![Sql::new(sql).affecting(index)])
    }
}

pub struct DropIndex;

impl SqlGenerator for DropIndex {
    fn name(&self) -> &'static str {
        "DropIndex"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::DropIndex
    }

    fn validate(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::DropIndex(s) = statement {
            errors.check_required("indexName", &s.index_name);
            if matches!(
                database.kind(),
                DatabaseKind::MySql | DatabaseKind::MariaDb | DatabaseKind::Mssql | DatabaseKind::Sybase
            ) {
                errors.check_identifier("tableName", &s.table_name);
            }
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, DropIndex)?;
        let catalog = s.catalog_name.as_deref();
        let schema = s.schema_name.as_deref();
        let sql = match database.kind() {
            DatabaseKind::MySql | DatabaseKind::MariaDb => format!(
                "DROP INDEX {} ON {}",
                database.escape_index_name(None, None, &s.index_name),
                database.escape_table_name(catalog, schema, &s.table_name)
            ),
            DatabaseKind::Mssql | DatabaseKind::Sybase => format!(
                "DROP INDEX {}.{}",
                database.escape_table_name(catalog, schema, &s.table_name),
                database.escape_index_name(None, None, &s.index_name)
            ),
            DatabaseKind::Postgres => format!("DROP INDEX {}", database.escape_index_name(catalog, schema, &s.index_name)),
            _ if qualifies_index_name(database) => {
                format!("DROP INDEX {}", database.escape_index_name(catalog, schema, &s.index_name))
            }
            _ => format!("DROP INDEX {}", database.escape_index_name(None, None, &s.index_name)),
        };
        Ok(vec![Sql::new(sql)])
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{errors_for, sql_for};
    use crate::database::DatabaseKind;
    use crate::statement::{CreateIndexStatement, DropIndexStatement};

    fn index() -> CreateIndexStatement {
        CreateIndexStatement {
            index_name: "idx_person_name".into(),
            catalog_name: None,
            schema_name: None,
            table_name: "person".into(),
            columns: vec!["last_name".into(), "first_name desc".into()],
            unique: true,
            tablespace: None,
        }
    }

    #[test]
    fn test_create_index() {
        assert_eq!(
            sql_for(index(), DatabaseKind::Postgres),
            "CREATE UNIQUE INDEX idx_person_name ON person(last_name, first_name DESC)"
        );
        assert_eq!(
            sql_for(index(), DatabaseKind::Mssql),
            "CREATE UNIQUE INDEX [idx_person_name] ON [person]([last_name], [first_name] DESC)"
        );
    }

    #[test]
    fn test_create_index_tablespace() {
        let mut statement = index();
        statement.unique = false;
        statement.tablespace = Some("idx_space".into());
        assert!(sql_for(statement.clone(), DatabaseKind::Oracle).ends_with(" TABLESPACE idx_space"));
        assert!(sql_for(statement.clone(), DatabaseKind::Mssql).ends_with(" ON idx_space"));
        assert!(sql_for(statement, DatabaseKind::Sqlite).ends_with("first_name DESC)"));
    }

    #[test]
    fn test_create_index_requires_columns() {
        let mut statement = index();
        statement.columns.clear();
        assert_eq!(errors_for(statement, DatabaseKind::H2), vec!["columns is required".to_string()]);
    }

    #[test]
    fn test_drop_index_per_family() {
        let statement = DropIndexStatement {
            index_name: "idx_person_name".into(),
            catalog_name: None,
            schema_name: None,
            table_name: "person".into(),
        };
        assert_eq!(sql_for(statement.clone(), DatabaseKind::MySql), "DROP INDEX idx_person_name ON person");
        assert_eq!(sql_for(statement.clone(), DatabaseKind::Mssql), "DROP INDEX [person].[idx_person_name]");
        assert_eq!(sql_for(statement.clone(), DatabaseKind::Sqlite), "DROP INDEX idx_person_name");

        let mut missing_table = statement;
        missing_table.table_name.clear();
        assert_eq!(
            errors_for(missing_table, DatabaseKind::MySql),
            vec!["tableName is required".to_string()]
        );
    }
}
