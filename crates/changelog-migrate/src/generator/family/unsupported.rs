use crate::database::Database;
use crate::error::{MigrateError, Result};
use crate::generator::{GeneratorChain, Sql, SqlGenerator, ValidationErrors, PRIORITY_NONE};
use crate::statement::{Statement, StatementKind};

/// Last-resort generator for sequence statements on databases without
/// sequences; turns "no generator" into a readable validation message.
pub struct SequenceUnsupported {
    kind: StatementKind,
}

impl SequenceUnsupported {
    pub fn create() -> Self {
        Self {
            kind: StatementKind::CreateSequence,
        }
    }

    pub fn drop() -> Self {
        Self {
            kind: StatementKind::DropSequence,
        }
    }
}

impl SqlGenerator for SequenceUnsupported {
    fn name(&self) -> &'static str {
        match self.kind {
            StatementKind::CreateSequence => "CreateSequenceUnsupported",
            _ => "DropSequenceUnsupported",
        }
    }

    fn statement_kind(&self) -> StatementKind {
        self.kind
    }

    fn priority(&self) -> i32 {
        PRIORITY_NONE
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        !database.capabilities().supports_sequences
    }

    fn validate(&self, _statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.add_error(format!("{} does not support sequences", database.short_name()));
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        Err(MigrateError::unsupported(statement.kind().name(), database.short_name()))
    }
}

#[cfg(test)]
mod tests {
    use crate::database::{Database, DatabaseKind};
    use crate::error::MigrateError;
    use crate::generator::GeneratorRegistry;
    use crate::statement::{CreateSequenceStatement, Statement};

    #[test]
    fn test_sequence_on_mysql_fails_validation() {
        let registry = GeneratorRegistry::with_builtins();
        let statement = Statement::from(CreateSequenceStatement::new("seq_order"));
        let mysql = Database::new(DatabaseKind::MySql);

        assert!(registry.supports(&statement, &mysql));
        assert_eq!(registry.resolve(&statement, &mysql), Some("CreateSequenceUnsupported"));
        match registry.generate_sql(&statement, &mysql) {
            Err(MigrateError::Validation(errors)) => {
                assert_eq!(errors.errors(), ["mysql does not support sequences".to_string()]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_real_generator_wins_where_sequences_exist() {
        let registry = GeneratorRegistry::with_builtins();
        let statement = Statement::from(CreateSequenceStatement::new("seq_order"));
        assert_eq!(
            registry.resolve(&statement, &Database::new(DatabaseKind::Postgres)),
            Some("CreateSequence")
        );
    }
}
