//! Offline SQL rendering and change log documentation.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::info;

use super::Migrator;
use crate::changelog::{ChangeLog, ChangeSetStatus, RanChangeSet};
use crate::database::{Database, DatabaseKind};
use crate::error::Result;
use crate::generator::GeneratorRegistry;

/// The SQL every change set would run on `database`, without a connection.
pub fn render_change_log_sql(
    change_log: &ChangeLog,
    database: &Database,
    registry: &GeneratorRegistry,
    delimiter: &str,
) -> Result<String> {
    let comment = database.line_comment();
    let mut script = String::new();
    for change_set in &change_log.change_sets {
        if !change_set.dbms.matches(database) {
            continue;
        }
        let _ = writeln!(script, "{} Changeset {}", comment, change_set);
        for statement in change_set.statements_for(database) {
            for sql in registry.generate_sql(statement, database)? {
                script.push_str(&sql.to_script(delimiter));
            }
        }
    }
    Ok(script)
}

/// Databases every statement of the change log can be generated for.
fn portable_targets(change_log: &ChangeLog, registry: &GeneratorRegistry) -> Vec<Database> {
    DatabaseKind::ALL
        .iter()
        .map(|kind| Database::new(*kind))
        .filter(|database| {
            change_log
                .change_sets
                .iter()
                .flat_map(|cs| cs.statements_for(database))
                .all(|statement| registry.supports(statement, database))
        })
        .collect()
}

fn render_index(migrator: &Migrator, statuses: &[ChangeSetStatus], history: &[RanChangeSet]) -> Result<String> {
    let change_log = migrator.change_log();
    let mut doc = String::new();
    let _ = writeln!(doc, "# {}\n", change_log.file_path);
    let _ = writeln!(
        doc,
        "{} change sets, {} recorded in the history of {}.\n",
        change_log.change_sets.len(),
        history.len(),
        migrator.database()
    );

    doc.push_str("## Change sets\n\n");
    doc.push_str("| change set | status | checksum |\n|---|---|---|\n");
    for status in statuses {
        let state = match (status.will_run, status.previously_ran) {
            (true, true) => "will re-run",
            (true, false) => "pending",
            (false, true) => "ran",
            (false, false) => "not selected",
        };
        let _ = writeln!(
            doc,
            "| {} | {} | `{}` |",
            status.change_set, state, status.current_checksum
        );
    }

    let targets = portable_targets(change_log, migrator.registry());
    doc.push_str("\n## SQL\n");
    for database in &targets {
        let _ = writeln!(doc, "\n### {}\n\n```sql", database.short_name());
        doc.push_str(&render_change_log_sql(
            change_log,
            database,
            migrator.registry(),
            &migrator.config().run.output_delimiter,
        )?);
        doc.push_str("```\n");
    }
    Ok(doc)
}

pub(super) fn write_documentation(
    migrator: &Migrator,
    statuses: &[ChangeSetStatus],
    history: &[RanChangeSet],
    output_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(output_dir)?;
    fs::write(output_dir.join("index.md"), render_index(migrator, statuses, history)?)?;
    fs::write(output_dir.join("history.json"), serde_json::to_string_pretty(history)?)?;
    info!("Wrote change log documentation to {}", output_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changelog::ChangeSet;
    use crate::statement::{ColumnConfig, CreateTableStatement, RawSqlStatement};

    fn change_log() -> ChangeLog {
        ChangeLog::new("db.yaml").with_change_set(
            ChangeSet::new("1", "bob", "db.yaml").with_statement(
                CreateTableStatement::new("person").with_column(ColumnConfig::new("id", "int").primary_key()),
            ),
        )
    }

    #[test]
    fn test_render_uses_delimiter_and_comment() {
        let registry = GeneratorRegistry::with_builtins();
        let database = Database::new(DatabaseKind::Mssql);
        let script = render_change_log_sql(&change_log(), &database, &registry, "\nGO").unwrap();
        assert!(script.starts_with("-- Changeset db.yaml::1::bob\n"));
        assert!(script.contains("CREATE TABLE"));
        assert!(script.contains("\nGO\n\n"));
    }

    #[test]
    fn test_render_skips_other_databases() {
        let registry = GeneratorRegistry::with_builtins();
        let mut change_set = ChangeSet::new("1", "bob", "db.yaml").with_statement(RawSqlStatement::new("SELECT 1"));
        change_set.dbms = crate::changelog::DbmsSet::parse("oracle").unwrap();
        let log = ChangeLog::new("db.yaml").with_change_set(change_set);
        let script =
            render_change_log_sql(&log, &Database::new(DatabaseKind::Postgres), &registry, ";").unwrap();
        assert!(script.is_empty());
    }

    #[test]
    fn test_portable_targets_include_common_families() {
        let registry = GeneratorRegistry::with_builtins();
        let kinds: Vec<_> = portable_targets(&change_log(), &registry).iter().map(|d| d.kind()).collect();
        assert!(kinds.contains(&DatabaseKind::Postgres));
        assert!(kinds.contains(&DatabaseKind::Sqlite));
    }
}
