use crate::database::{Database, DatabaseKind};
use crate::error::Result;
use crate::generator::{payload, GeneratorChain, Sql, SqlGenerator, ValidationErrors};
use crate::statement::{Statement, StatementKind};

pub struct CreateSequence;

impl SqlGenerator for CreateSequence {
    fn name(&self) -> &'static str {
        "CreateSequence"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::CreateSequence
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.capabilities().supports_sequences
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::CreateSequence(s) = statement {
            errors.check_identifier("sequenceName", &s.sequence_name);
            if s.increment_by == Some(0) {
                errors.add_error("incrementBy must not be 0");
            }
            if let (Some(min), Some(max)) = (s.min_value, s.max_value) {
                if min > max {
                    errors.add_error(format!("minValue {} is greater than maxValue {}", min, max));
                }
            }
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, CreateSequence)?;
        let name = database.escape_sequence_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.sequence_name);
        let mut sql = format!("CREATE SEQUENCE {}", name);

        if let Some(start) = s.start_value {
            sql.push_str(&format!(" START WITH {}", start));
        }
        if let Some(increment) = s.increment_by {
            sql.push_str(&format!(" INCREMENT BY {}", increment));
        }
        if let Some(min) = s.min_value {
            sql.push_str(&format!(" MINVALUE {}", min));
        }
        if let Some(max) = s.max_value {
            sql.push_str(&format!(" MAXVALUE {}", max));
        }
        match (s.cycle, database.kind()) {
            (Some(true), _) => sql.push_str(" CYCLE"),
            (Some(false), DatabaseKind::Oracle) => sql.push_str(" NOCYCLE"),
            (Some(false), DatabaseKind::Postgres | DatabaseKind::H2 | DatabaseKind::Hsql | DatabaseKind::Db2) => {
                sql.push_str(" NO CYCLE")
            }
            _ => {}
        }

        Ok(vec![Sql::new(sql).affecting(name)])
    }
}

pub struct DropSequence;

impl SqlGenerator for DropSequence {
    fn name(&self) -> &'static str {
        "DropSequence"
    }

    fn statement_kind(&self) -> StatementKind {
        StatementKind::DropSequence
    }

    fn supports(&self, _statement: &Statement, database: &Database) -> bool {
        database.capabilities().supports_sequences
    }

    fn validate(&self, statement: &Statement, _database: &Database, _chain: &mut GeneratorChain<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::DropSequence(s) = statement {
            errors.check_identifier("sequenceName", &s.sequence_name);
        }
        errors
    }

    fn generate_sql(&self, statement: &Statement, database: &Database, _chain: &mut GeneratorChain<'_>) -> Result<Vec<Sql>> {
        let s = payload!(statement, DropSequence)?;
        let name = database.escape_sequence_name(s.catalog_name.as_deref(), s.schema_name.as_deref(), &s.sequence_name);
        let sql = match database.kind() {
            DatabaseKind::Derby | DatabaseKind::Db2 => format!("DROP SEQUENCE {} RESTRICT", name),
            _ => format!("DROP SEQUENCE {}", name),
        };
        Ok(vec![Sql::new(sql).affecting(name)])
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{errors_for, sql_for};
    use crate::database::DatabaseKind;
    use crate::statement::{CreateSequenceStatement, DropSequenceStatement};

    #[test]
    fn test_create_sequence_options() {
        let mut statement = CreateSequenceStatement::new("seq_order");
        statement.start_value = Some(100);
        statement.increment_by = Some(10);
        statement.cycle = Some(false);
        assert_eq!(
            sql_for(statement.clone(), DatabaseKind::Postgres),
            "CREATE SEQUENCE seq_order START WITH 100 INCREMENT BY 10 NO CYCLE"
        );
        assert_eq!(
            sql_for(statement, DatabaseKind::Oracle),
            "CREATE SEQUENCE seq_order START WITH 100 INCREMENT BY 10 NOCYCLE"
        );
    }

    #[test]
    fn test_create_sequence_validation() {
        let mut statement = CreateSequenceStatement::new("seq_order");
        statement.increment_by = Some(0);
        statement.min_value = Some(10);
        statement.max_value = Some(1);
        assert_eq!(
            errors_for(statement, DatabaseKind::Postgres),
            vec![
                "incrementBy must not be 0".to_string(),
                "minValue 10 is greater than maxValue 1".to_string()
            ]
        );
    }

    #[test]
    fn test_drop_sequence() {
        let statement = DropSequenceStatement {
            catalog_name: None,
            schema_name: Some("app".into()),
            sequence_name: "seq_order".into(),
        };
        assert_eq!(sql_for(statement.clone(), DatabaseKind::Postgres), "DROP SEQUENCE app.seq_order");
        assert_eq!(sql_for(statement, DatabaseKind::Derby), "DROP SEQUENCE app.seq_order RESTRICT");
    }
}
