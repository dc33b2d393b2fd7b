use crate::database::{Database, DatabaseKind};
use crate::error::Result;
use crate::generator::{payload, GeneratorChain, Sql, SqlGenerator, ValidationErrors, PRIORITY_DATABASE};
use crate::statement::{Statement, StatementKind};

/// CREATE TABLE followed by `COMMENT ON` for table and column remarks.
pub struct PostgresCreateTable;

impl SqlGenerator for PostgresCreateTable {
    fn name(&self) -> &'static str {
        "PostgresCreateTable"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::CreateTable
    }

    fn priority(&self) -> i32 {
        PRIORITY_DATABASE
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.kind() == DatabaseKind::Postgres
    }

    fn validate(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        chain.validate(statement, database)
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, CreateTable)?;
        let mut sql = chain.generate_sql(statement, database)?;

        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        if let Some(remarks) = &s.remarks {
            sql.push(
                Sql::new(format!("COMMENT ON TABLE {} IS {}", table, database.string_literal(remarks)))
                    .affecting(&table),
            );
        }
        for column in s.columns.iter().filter(|c| !c.computed) {
            if let Some(remarks) = &column.remarks {
                sql.push(
                    Sql::new(format!(
                        "COMMENT ON COLUMN {}.{} IS {}",
                        table,
                        database.escape_column_name(&column.name),
                        database.string_literal(remarks)
                    ))
                    .affecting(&table),
                );
            }
        }
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use crate::database::DatabaseKind;
    use crate::generator::standard::testing::sql_for;
    use crate::statement::{ColumnConfig, CreateTableStatement};

    #[test]
    fn test_remarks_become_comments() {
        let mut statement = CreateTableStatement::new("person")
            .with_column(ColumnConfig::new("name", "varchar(50)").with_remarks("Display name"));
        statement.remarks = Some("People we know".into());
        assert_eq!(
            sql_for(statement, DatabaseKind::Postgres),
            "CREATE TABLE person (name VARCHAR(50));\n\
             COMMENT ON TABLE person IS 'People we know';\n\
             COMMENT ON COLUMN person.name IS 'Display name'"
        );
    }

    #[test]
    fn test_no_remarks_no_comments() {
        let statement = CreateTableStatement::new("person").with_column(ColumnConfig::new("id", "int"));
        assert_eq!(sql_for(statement, DatabaseKind::Postgres), "CREATE TABLE person (id INTEGER)");
    }
}
