use crate::database::{Database, DatabaseKind};
use crate::error::Result;
use crate::generator::{payload, GeneratorChain, Sql, SqlGenerator, ValidationErrors};
use crate::statement::{Statement, StatementKind};

/// How a family spells "create, or replace if present".
fn replace_prefix(database: &Database) -> Option<&'static str> {
    match database.kind() {
        DatabaseKind::Postgres
        | DatabaseKind::Oracle
        | DatabaseKind::MySql
        | DatabaseKind::MariaDb
        | DatabaseKind::H2
        | DatabaseKind::Db2 => Some("CREATE OR REPLACE VIEW"),
        DatabaseKind::Mssql | DatabaseKind::Firebird => Some("CREATE OR ALTER VIEW"),
        _ => None,
    }
}

pub struct CreateView;

impl SqlGenerator for CreateView {
    fn name(&self) -> &'static str {
        "CreateView"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::CreateView
    }

    fn validate(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::CreateView(s) = statement {
            errors.check_identifier("viewName", &s.view_name);
            errors.check_required("selectQuery", &s.select_query);
            // SQLite drops and recreates instead.
            if database.kind() != DatabaseKind::Sqlite {
                errors.check_disallowed(
                    "replaceIfExists",
                    s.replace_if_exists && replace_prefix(database).is_none(),
                    database,
                );
            }
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, CreateView)?;
        let view = database.escape_view_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.view_name);
        let query = s.select_query.trim();

        let mut out = Vec::new();
        let prefix = if s.replace_if_exists {
            match replace_prefix(database) {
                Some(prefix) => prefix,
                None => {
                    out.push(Sql::new(format!("DROP VIEW IF EXISTS {}", view)).affecting(view.clone()));
                    "CREATE VIEW"
                }
            }
        } else {
            "CREATE VIEW"
        };
        out.push(Sql::new(format!("{} {} AS {}", prefix, view, query)).affecting(view));
        Ok(out)
    }
}

pub struct DropView;

impl SqlGenerator for DropView {
    fn name(&self) -> &'static str {
        "DropView"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::DropView
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::DropView(s) = statement {
            errors.check_identifier("viewName", &s.view_name);
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, DropView)?;
        let view = database.escape_view_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.view_name);
        Ok(vec![Sql::new(format!("DROP VIEW {}", view)).affecting(view)])
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{errors_for, sql_for};
    use crate::database::DatabaseKind;
    use crate::statement::{CreateViewStatement, DropViewStatement};

    fn view(replace: bool) -> CreateViewStatement {
        CreateViewStatement {
            catalog_name: None,
            schema_name: None,
            view_name: "active_person".into(),
            select_query: "SELECT id FROM person WHERE active = 1\n".into(),
            replace_if_exists: replace,
        }
    }

    #[test]
    fn test_create_view() {
        assert_eq!(
            sql_for(view(false), DatabaseKind::H2),
            "CREATE VIEW active_person AS SELECT id FROM person WHERE active = 1"
        );
        assert_eq!(
            sql_for(view(true), DatabaseKind::Postgres),
            "CREATE OR REPLACE VIEW active_person AS SELECT id FROM person WHERE active = 1"
        );
        assert_eq!(
            sql_for(view(true), DatabaseKind::Mssql),
            "CREATE OR ALTER VIEW [active_person] AS SELECT id FROM person WHERE active = 1"
        );
    }

    #[test]
    fn test_sqlite_replace_drops_first() {
        assert_eq!(
            sql_for(view(true), DatabaseKind::Sqlite),
            "DROP VIEW IF EXISTS active_person;\nCREATE VIEW active_person AS SELECT id FROM person WHERE active = 1"
        );
    }

    #[test]
    fn test_replace_rejected_without_syntax() {
        assert_eq!(
            errors_for(view(true), DatabaseKind::Derby),
            vec!["replaceIfExists is not allowed on derby".to_string()]
        );
    }

    #[test]
    fn test_drop_view() {
        let statement = DropViewStatement {
            catalog_name: None,
            schema_name: None,
            view_name: "active_person".into(),
        };
        assert_eq!(sql_for(statement, DatabaseKind::Oracle), "DROP VIEW active_person");
    }
}
