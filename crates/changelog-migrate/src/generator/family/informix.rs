//! Informix writes constraint names after the constraint body.

use crate::database::{Database, DatabaseKind};
use crate::error::Result;
use crate::generator::standard::{create_table_sql, TableLayout};
use crate::generator::{payload, GeneratorChain, Sql, SqlGenerator, ValidationErrors, PRIORITY_DATABASE};
use crate::statement::{Statement, StatementKind};

const TRAILING: TableLayout = TableLayout {
    constraint_name_trails: true,
};

pub struct InformixCreateTable;

impl SqlGenerator for InformixCreateTable {
    fn name(&self) -> &'static str {
        "InformixCreateTable"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::CreateTable
    }

    fn priority(&self) -> i32 {
        PRIORITY_DATABASE
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.kind() == DatabaseKind::Informix
    }

    fn validate(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        chain.validate(statement, database)
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, CreateTable)?;
        create_table_sql(s, database, chain.types(), TRAILING)
    }
}

pub struct InformixAddUniqueConstraint;

impl SqlGenerator for InformixAddUniqueConstraint {
    fn name(&self) -> &'static str {
        "InformixAddUniqueConstraint"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::AddUniqueConstraint
    }

    fn priority(&self) -> i32 {
        PRIORITY_DATABASE
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.kind() == DatabaseKind::Informix
    }

    fn validate(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        chain.validate(statement, database)
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, AddUniqueConstraint)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT UNIQUE ({})",
            table,
            database.escape_column_name_list(&s.column_names)
        );
        if let Some(name) = &s.constraint_name {
            sql.push_str(&format!(" CONSTRAINT {}", database.escape_constraint_name(name)));
        }
        Ok(vec![Sql::new(sql).affecting(table)])
    }
}

#[cfg(test)]
mod tests {
    use crate::database::{Database, DatabaseKind};
    use crate::generator::standard::testing::{errors_for, sql_for};
    use crate::generator::GeneratorRegistry;
    use crate::statement::{AddUniqueConstraintStatement, ColumnConfig, CreateTableStatement, Statement};

    #[test]
    fn test_unique_constraint_name_trails() {
        let statement = AddUniqueConstraintStatement::new("AddUQTest", "colToMakeUQ", Some("UQ_TEST"));
        assert_eq!(
            sql_for(statement, DatabaseKind::Informix).to_lowercase(),
            "alter table adduqtest add constraint unique (coltomakeuq) constraint uq_test"
        );
    }

    #[test]
    fn test_override_is_selected_only_for_informix() {
        let registry = GeneratorRegistry::with_builtins();
        let statement = Statement::from(AddUniqueConstraintStatement::new("t", "c", Some("n")));
        assert_eq!(
            registry.resolve(&statement, &Database::new(DatabaseKind::Informix)),
            Some("InformixAddUniqueConstraint")
        );
        assert_eq!(
            registry.resolve(&statement, &Database::new(DatabaseKind::Postgres)),
            Some("AddUniqueConstraint")
        );
    }

    #[test]
    fn test_create_table_constraint_names_trail() {
        let statement = CreateTableStatement::new("pet")
            .with_column(ColumnConfig::new("id", "int").primary_key().auto_increment(None, None))
            .with_column(ColumnConfig::new("owner_id", "int").foreign_key("fk_owner", "person", "id"));
        assert_eq!(
            sql_for(statement, DatabaseKind::Informix),
            "CREATE TABLE pet (id SERIAL NOT NULL, owner_id INTEGER, \
             PRIMARY KEY (id) CONSTRAINT PK_PET, \
             FOREIGN KEY (owner_id) REFERENCES person (id) CONSTRAINT fk_owner)"
        );
    }

    #[test]
    fn test_create_table_validation_comes_from_chain() {
        assert_eq!(
            errors_for(CreateTableStatement::new("pet"), DatabaseKind::Informix),
            vec!["columns is required".to_string()]
        );
    }
}
