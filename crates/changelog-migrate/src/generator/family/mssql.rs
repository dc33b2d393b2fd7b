use crate::database::{Database, DatabaseKind};
use crate::error::Result;
use crate::generator::standard::{add_column_sql, AddColumnSyntax};
use crate::generator::{payload, GeneratorChain, Sql, SqlGenerator, ValidationErrors, PRIORITY_DATABASE};
use crate::statement::{Statement, StatementKind};

/// Names column defaults `DF_<table>_<column>` so they can be dropped later.
pub struct MssqlAddColumn;

const NAMED_DEFAULT: AddColumnSyntax = AddColumnSyntax {
    add_keyword: "ADD",
    named_default: true,
};

impl SqlGenerator for MssqlAddColumn {
    fn name(&self) -> &'static str {
        "MssqlAddColumn"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::AddColumn
    }

    fn priority(&self) -> i32 {
        PRIORITY_DATABASE
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.kind() == DatabaseKind::Mssql
    }

    fn validate(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        chain.validate(statement, database)
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, AddColumn)?;
        add_column_sql(s, database, chain, NAMED_DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::SqlValue;
    use crate::database::DatabaseKind;
    use crate::generator::standard::testing::sql_for;
    use crate::statement::{AddColumnStatement, ColumnConfig};

    #[test]
    fn test_default_constraint_is_named() {
        let column = ColumnConfig::new("status", "varchar(10)")
            .with_default(SqlValue::Text("new".into()))
            .not_null();
        assert_eq!(
            sql_for(AddColumnStatement::new("orders", column), DatabaseKind::Mssql),
            "ALTER TABLE [orders] ADD [status] VARCHAR(10) CONSTRAINT DF_orders_status DEFAULT 'new' NOT NULL"
        );
    }
}
