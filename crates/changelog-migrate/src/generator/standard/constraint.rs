//! Table constraints: unique, primary key and foreign key.

use crate::database::{Database, DatabaseKind};
use crate::error::Result;
use crate::generator::{payload, GeneratorChain, Sql, SqlGenerator, ValidationErrors};
use crate::statement::{AddUniqueConstraintStatement, Statement, StatementKind};

/// Index tablespace clause for a constraint, or empty when not expressible.
pub(crate) fn index_tablespace_clause(tablespace: Option<&str>, database: &Database) -> String {
    let Some(tablespace) = tablespace.map(str::trim).filter(|t| !t.is_empty()) else {
        return String::new();
    };
    if !database.capabilities().supports_tablespaces {
        return String::new();
    }
    match database.kind() {
        DatabaseKind::Mssql => format!(" ON {}", tablespace),
        DatabaseKind::Db2 | DatabaseKind::SybaseAsa | DatabaseKind::Informix => String::new(),
        _ if database.capabilities().supports_index_tablespaces => {
            format!(" USING INDEX TABLESPACE {}", tablespace)
        }
        _ => String::new(),
    }
}

fn tablespace_warning(tablespace: Option<&str>, database: &Database) -> Option<String> {
    let tablespace = tablespace.filter(|t| !t.trim().is_empty())?;
    index_tablespace_clause(Some(tablespace), database).is_empty().then(|| {
        format!("Tablespace {} is ignored on {}", tablespace, database.short_name())
    })
}

/// Name SQLite gives a unique index when none was supplied.
fn sqlite_unique_index_name(statement: &AddUniqueConstraintStatement) -> String {
    let columns: Vec<String> = crate::core::identifier::split_name_list(&statement.column_names);
    format!("{}_{}_key", statement.table_name, columns.join("_"))
}

pub struct AddUniqueConstraint;

impl SqlGenerator for AddUniqueConstraint {
    fn name(&self) -> &'static str {
        "AddUniqueConstraint"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::AddUniqueConstraint
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::AddUniqueConstraint(s) = statement {
            errors.check_identifier("tableName", &s.table_name);
            errors.check_required("columnNames", &s.column_names);
        }
        errors
    }

    fn warnings(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Vec<String> {
        let Statement::AddUniqueConstraint(s) = statement else {
            return Vec::new();
        };
        let mut warnings: Vec<String> = tablespace_warning(s.tablespace.as_deref(), database).into_iter().collect();
        if (s.deferrable || s.initially_deferred || s.disabled) && database.kind() != DatabaseKind::Oracle {
            warnings.push(format!(
                "Deferrable and disabled unique constraints are ignored on {}",
                database.short_name()
            ));
        }
        warnings
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, AddUniqueConstraint)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        let columns = database.escape_column_name_list(&s.column_names);

        if database.kind() == DatabaseKind::Sqlite {
            let name = s.constraint_name.clone().unwrap_or_else(|| sqlite_unique_index_name(s));
            return Ok(vec![Sql::new(format!(
                "CREATE UNIQUE INDEX {} ON {} ({})",
                database.escape_index_name(None, None, &name),
                table,
                columns
            ))
            .affecting(table)]);
        }

        let mut sql = match &s.constraint_name {
            Some(name) => format!(
                "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
                table,
                database.escape_constraint_name(name),
                columns
            ),
            None => format!("ALTER TABLE {} ADD UNIQUE ({})", table, columns),
        };

        if database.kind() == DatabaseKind::Oracle {
            if s.deferrable {
                sql.push_str(" DEFERRABLE");
            }
            if s.initially_deferred {
                sql.push_str(" INITIALLY DEFERRED");
            }
            if s.disabled {
                sql.push_str(" DISABLE");
            }
        }

        sql.push_str(&index_tablespace_clause(s.tablespace.as_deref(), database));
        Ok(vec![Sql::new(sql).affecting(table)])
    }
}

pub struct DropUniqueConstraint;

impl SqlGenerator for DropUniqueConstraint {
    fn name(&self) -> &'static str {
        "DropUniqueConstraint"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::DropUniqueConstraint
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::DropUniqueConstraint(s) = statement {
            errors.check_identifier("tableName", &s.table_name);
            errors.check_required("constraintName", &s.constraint_name);
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, DropUniqueConstraint)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        let sql = match database.kind() {
            DatabaseKind::MySql | DatabaseKind::MariaDb => format!(
                "ALTER TABLE {} DROP KEY {}",
                table,
                database.escape_constraint_name(&s.constraint_name)
            ),
            DatabaseKind::Sqlite => format!(
                "DROP INDEX {}",
                database.escape_index_name(None, None, &s.constraint_name)
            ),
            _ => format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                table,
                database.escape_constraint_name(&s.constraint_name)
            ),
        };
        Ok(vec![Sql::new(sql).affecting(table)])
    }
}

pub struct AddPrimaryKey;

impl SqlGenerator for AddPrimaryKey {
    fn name(&self) -> &'static str {
        "AddPrimaryKey"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::AddPrimaryKey
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.kind() != DatabaseKind::Sqlite
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::AddPrimaryKey(s) = statement {
            errors.check_identifier("tableName", &s.table_name);
            errors.check_required("columnNames", &s.column_names);
        }
        errors
    }

    fn warnings(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Vec<String> {
        match statement {
            Statement::AddPrimaryKey(s) => tablespace_warning(s.tablespace.as_deref(), database).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, AddPrimaryKey)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);
        let columns = database.escape_column_name_list(&s.column_names);
        let name = s
            .constraint_name
            .as_deref()
            .filter(|_| database.capabilities().supports_primary_key_names)
            .map(|n| database.escape_constraint_name(n));

        let mut sql = match (name, database.kind()) {
            (Some(name), DatabaseKind::Informix) => format!(
                "ALTER TABLE {} ADD CONSTRAINT PRIMARY KEY ({}) CONSTRAINT {}",
                table, columns, name
            ),
            (Some(name), _) => format!(
                "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
                table, name, columns
            ),
            (None, _) => format!("ALTER TABLE {} ADD PRIMARY KEY ({})", table, columns),
        };
        sql.push_str(&index_tablespace_clause(s.tablespace.as_deref(), database));

        let mut out = vec![Sql::new(sql).affecting(&table)];
        if database.kind() == DatabaseKind::Db2 {
            out.push(Sql::new(format!("CALL SYSPROC.ADMIN_CMD ('REORG TABLE {}')", table)).affecting(&table));
        }
        Ok(out)
    }
}

pub struct DropPrimaryKey;

impl SqlGenerator for DropPrimaryKey {
    fn name(&self) -> &'static str {
        "DropPrimaryKey"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::DropPrimaryKey
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.kind() != DatabaseKind::Sqlite
    }

    fn validate(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::DropPrimaryKey(s) = statement {
            errors.check_identifier("tableName", &s.table_name);
            let name_optional = matches!(
                database.kind(),
                DatabaseKind::MySql | DatabaseKind::MariaDb | DatabaseKind::Oracle | DatabaseKind::Postgres
            );
            if !name_optional {
                errors.check_required_opt("constraintName", s.constraint_name.as_deref());
            }
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, DropPrimaryKey)?;
        let table = database.escape_table_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.table_name);

        let sql = match (database.kind(), s.constraint_name.as_deref()) {
            (DatabaseKind::MySql | DatabaseKind::MariaDb, _) => format!("ALTER TABLE {} DROP PRIMARY KEY", table),
            (DatabaseKind::Oracle, _) => format!("ALTER TABLE {} DROP PRIMARY KEY DROP INDEX", table),
            (DatabaseKind::Postgres, None) => {
                let schema = s
                    .schema_name
                    .as_deref()
                    .or(database.default_schema_name())
                    .unwrap_or("public");
                format!(
                    "DO $$ DECLARE constraint_name varchar; BEGIN \
                     SELECT tc.CONSTRAINT_NAME INTO STRICT constraint_name \
                     FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
                     WHERE CONSTRAINT_TYPE = 'PRIMARY KEY' AND TABLE_NAME = {} AND TABLE_SCHEMA = {}; \
                     EXECUTE 'ALTER TABLE {} DROP CONSTRAINT ' || quote_ident(constraint_name); \
                     END $$",
                    database.string_literal(&database.correct_object_name(&s.table_name)),
                    database.string_literal(schema),
                    database.escape_string(&table)
                )
            }
            (_, name) => format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                table,
                database.escape_constraint_name(name.unwrap_or_default())
            ),
        };
        Ok(vec![Sql::new(sql).affecting(table)])
    }
}

pub struct AddForeignKeyConstraint;

impl SqlGenerator for AddForeignKeyConstraint {
    fn name(&self) -> &'static str {
        "AddForeignKeyConstraint"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::AddForeignKeyConstraint
    }

    /// SQLite cannot add a foreign key to an existing table.
    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.kind() != DatabaseKind::Sqlite
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::AddForeignKeyConstraint(s) = statement {
            errors.check_required("constraintName", &s.constraint_name);
            errors.check_required("baseTableName", &s.base_table_name);
            errors.check_required("baseColumnNames", &s.base_column_names);
            errors.check_required("referencedTableName", &s.referenced_table_name);
            errors.check_required("referencedColumnNames", &s.referenced_column_names);
        }
        errors
    }

    fn warnings(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Vec<String> {
        let Statement::AddForeignKeyConstraint(s) = statement else {
            return Vec::new();
        };
        let mut warnings = Vec::new();
        if s.on_update.is_some() && database.kind() == DatabaseKind::Oracle {
            warnings.push("Oracle does not support ON UPDATE; clause ignored".to_string());
        }
        if (s.deferrable || s.initially_deferred) && !database.capabilities().supports_initially_deferrable_columns {
            warnings.push(format!("{} does not support deferrable constraints", database.short_name()));
        }
        warnings
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, AddForeignKeyConstraint)?;
        let base = database.escape_table_name(
            s.base_table_catalog_name.as_deref(),
            s.base_table_schema_name.as_deref(),
            &s.base_table_name,
        );
        let referenced = database.escape_table_name(
            s.referenced_table_catalog_name.as_deref(),
            s.referenced_table_schema_name.as_deref(),
            &s.referenced_table_name,
        );
        let name = database.escape_constraint_name(&s.constraint_name);
        let base_columns = database.escape_column_name_list(&s.base_column_names);
        let referenced_columns = database.escape_column_name_list(&s.referenced_column_names);

        let mut sql = if database.kind() == DatabaseKind::Informix {
            format!(
                "ALTER TABLE {} ADD CONSTRAINT FOREIGN KEY ({}) REFERENCES {} ({})",
                base, base_columns, referenced, referenced_columns
            )
        } else {
            format!(
                "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                base, name, base_columns, referenced, referenced_columns
            )
        };

        if let Some(action) = &s.on_update {
            if database.kind() != DatabaseKind::Oracle {
                sql.push_str(&format!(" ON UPDATE {}", action.to_uppercase()));
            }
        }
        if let Some(action) = &s.on_delete {
            sql.push_str(&format!(" ON DELETE {}", action.to_uppercase()));
        }
        if database.kind() == DatabaseKind::Informix {
            sql.push_str(&format!(" CONSTRAINT {}", name));
        }
        if database.capabilities().supports_initially_deferrable_columns {
            if s.deferrable {
                sql.push_str(" DEFERRABLE");
            }
            if s.initially_deferred {
                sql.push_str(" INITIALLY DEFERRED");
            }
        }
        Ok(vec![Sql::new(sql).affecting(base)])
    }
}

pub struct DropForeignKeyConstraint;

impl SqlGenerator for DropForeignKeyConstraint {
    fn name(&self) -> &'static str {
        "DropForeignKeyConstraint"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::DropForeignKeyConstraint
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.kind() != DatabaseKind::Sqlite
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::DropForeignKeyConstraint(s) = statement {
            errors.check_required("baseTableName", &s.base_table_name);
            errors.check_required("constraintName", &s.constraint_name);
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, DropForeignKeyConstraint)?;
        let table = database.escape_table_name(
            s.base_table_catalog_name.as_deref(),
            s.base_table_schema_name.as_deref(),
            &s.base_table_name,
        );
        let keyword = match database.kind() {
            DatabaseKind::MySql | DatabaseKind::MariaDb => "FOREIGN KEY",
            _ => "CONSTRAINT",
        };
        Ok(vec![Sql::new(format!(
            "ALTER TABLE {} DROP {} {}",
            table,
            keyword,
            database.escape_constraint_name(&s.constraint_name)
        ))
        .affecting(table)])
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{errors_for, sql_for, sql_for_db};
    use crate::database::{Database, DatabaseKind};
    use crate::generator::GeneratorRegistry;
    use crate::statement::{
        AddForeignKeyConstraintStatement, AddPrimaryKeyStatement, AddUniqueConstraintStatement,
        DropForeignKeyConstraintStatement, DropPrimaryKeyStatement, DropUniqueConstraintStatement,
        Statement,
    };

    fn uq_test() -> AddUniqueConstraintStatement {
        AddUniqueConstraintStatement::new("AddUQTest", "colToMakeUQ", Some("UQ_TEST"))
    }

    #[test]
    fn test_add_unique_constraint_postgres() {
        let sql = sql_for(uq_test(), DatabaseKind::Postgres);
        assert_eq!(
            sql.to_lowercase(),
            r#"alter table "adduqtest" add constraint uq_test unique ("coltomakeuq")"#
        );
    }

    #[test]
    fn test_add_unique_constraint_mssql_with_schema() {
        let mut statement = uq_test();
        statement.schema_name = Some("liquibaseb".into());
        let sql = sql_for(statement, DatabaseKind::Mssql);
        assert_eq!(
            sql.to_lowercase(),
            "alter table [liquibaseb].[adduqtest] add constraint [uq_test] unique ([coltomakeuq])"
        );
    }

    #[test]
    fn test_unnamed_unique_constraint_omits_clause() {
        let statement = AddUniqueConstraintStatement::new("person", "email", None);
        assert_eq!(
            sql_for(statement, DatabaseKind::H2),
            "ALTER TABLE person ADD UNIQUE (email)"
        );
    }

    #[test]
    fn test_unique_constraint_tablespace() {
        let statement = AddUniqueConstraintStatement::new("person", "email", Some("uq_email")).with_tablespace("idx_space");
        assert_eq!(
            sql_for(statement.clone(), DatabaseKind::Postgres),
            "ALTER TABLE person ADD CONSTRAINT uq_email UNIQUE (email) USING INDEX TABLESPACE idx_space"
        );
        assert_eq!(
            sql_for(statement.clone(), DatabaseKind::Mssql),
            "ALTER TABLE [person] ADD CONSTRAINT [uq_email] UNIQUE ([email]) ON idx_space"
        );

        let registry = GeneratorRegistry::with_builtins();
        let warnings = registry.warnings(&Statement::from(statement), &Database::new(DatabaseKind::MySql));
        assert_eq!(warnings, vec!["Tablespace idx_space is ignored on mysql".to_string()]);
    }

    #[test]
    fn test_oracle_deferrable_unique_constraint() {
        let statement = AddUniqueConstraintStatement::new("person", "email", Some("uq_email")).with_deferral(true, true, true);
        assert_eq!(
            sql_for(statement.clone(), DatabaseKind::Oracle),
            "ALTER TABLE person ADD CONSTRAINT uq_email UNIQUE (email) DEFERRABLE INITIALLY DEFERRED DISABLE"
        );
        assert_eq!(
            sql_for(statement, DatabaseKind::Postgres),
            "ALTER TABLE person ADD CONSTRAINT uq_email UNIQUE (email)"
        );
    }

    #[test]
    fn test_sqlite_unique_constraint_is_an_index() {
        let statement = AddUniqueConstraintStatement::new("person", "first, last", None);
        assert_eq!(
            sql_for(statement, DatabaseKind::Sqlite),
            "CREATE UNIQUE INDEX person_first_last_key ON person (first, last)"
        );
        let drop = DropUniqueConstraintStatement {
            catalog_name: None,
            schema_name: None,
            table_name: "person".into(),
            constraint_name: "person_first_last_key".into(),
        };
        assert_eq!(sql_for(drop.clone(), DatabaseKind::Sqlite), "DROP INDEX person_first_last_key");
        assert_eq!(
            sql_for(drop, DatabaseKind::MySql),
            "ALTER TABLE person DROP KEY person_first_last_key"
        );
    }

    #[test]
    fn test_add_primary_key() {
        let statement = AddPrimaryKeyStatement {
            catalog_name: None,
            schema_name: None,
            table_name: "person".into(),
            column_names: "id".into(),
            constraint_name: Some("pk_person".into()),
            tablespace: None,
        };
        assert_eq!(
            sql_for(statement.clone(), DatabaseKind::Postgres),
            "ALTER TABLE person ADD CONSTRAINT pk_person PRIMARY KEY (id)"
        );
        assert_eq!(
            sql_for(statement.clone(), DatabaseKind::Informix),
            "ALTER TABLE person ADD CONSTRAINT PRIMARY KEY (id) CONSTRAINT pk_person"
        );
        assert!(sql_for(statement, DatabaseKind::Db2).ends_with("CALL SYSPROC.ADMIN_CMD ('REORG TABLE person')"));
    }

    #[test]
    fn test_drop_primary_key_name_rules() {
        let unnamed = DropPrimaryKeyStatement {
            catalog_name: None,
            schema_name: None,
            table_name: "person".into(),
            constraint_name: None,
        };
        assert_eq!(sql_for(unnamed.clone(), DatabaseKind::MySql), "ALTER TABLE person DROP PRIMARY KEY");
        assert!(sql_for(unnamed.clone(), DatabaseKind::Postgres).starts_with("DO $$"));
        assert_eq!(
            errors_for(unnamed, DatabaseKind::Derby),
            vec!["constraintName is required".to_string()]
        );
    }

    #[test]
    fn test_add_foreign_key() {
        let mut statement = AddForeignKeyConstraintStatement::new("fk_owner", "pet", "owner_id", "person", "id");
        statement.on_delete = Some("cascade".into());
        statement.deferrable = true;
        statement.initially_deferred = true;
        assert_eq!(
            sql_for(statement.clone(), DatabaseKind::Postgres),
            "ALTER TABLE pet ADD CONSTRAINT fk_owner FOREIGN KEY (owner_id) REFERENCES person (id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED"
        );
        assert_eq!(
            sql_for(statement.clone(), DatabaseKind::MySql),
            "ALTER TABLE pet ADD CONSTRAINT fk_owner FOREIGN KEY (owner_id) REFERENCES person (id) ON DELETE CASCADE"
        );
        assert_eq!(
            sql_for(statement, DatabaseKind::Informix),
            "ALTER TABLE pet ADD CONSTRAINT FOREIGN KEY (owner_id) REFERENCES person (id) ON DELETE CASCADE CONSTRAINT fk_owner"
        );
    }

    #[test]
    fn test_drop_foreign_key() {
        let statement = DropForeignKeyConstraintStatement {
            base_table_catalog_name: None,
            base_table_schema_name: None,
            base_table_name: "pet".into(),
            constraint_name: "fk_owner".into(),
        };
        let db = Database::new(DatabaseKind::MySql);
        assert_eq!(sql_for_db(statement.clone(), &db), "ALTER TABLE pet DROP FOREIGN KEY fk_owner");
        assert_eq!(sql_for(statement, DatabaseKind::Oracle), "ALTER TABLE pet DROP CONSTRAINT fk_owner");
    }
}
