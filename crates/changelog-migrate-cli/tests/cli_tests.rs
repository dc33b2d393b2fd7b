//! CLI integration tests for changelog-migrate.
//!
//! These tests verify command-line argument parsing, help output,
//! exit codes, and end-to-end runs against SQLite files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CHANGELOG: &str = r#"
change_sets:
  - id: "1"
    author: bob
    changes:
      - statements:
          - statement: create_table
            table_name: person
            columns:
              - name: id
                type: int
              - name: name
                type: varchar(50)
  - id: "2"
    author: bob
    contexts: test
    changes:
      - statements:
          - statement: create_table
            table_name: address
            columns:
              - name: id
                type: int
"#;

/// Get a command for the changelog-migrate binary.
fn cmd() -> Command {
    Command::cargo_bin("changelog-migrate").unwrap()
}

/// A temp dir holding a change log and a config pointing at a SQLite file.
fn workspace() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let changelog = dir.path().join("changelog.yaml");
    std::fs::write(&changelog, CHANGELOG).unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(
        &config,
        format!("database:\n  url: sqlite://{}\n", dir.path().join("app.db").display()),
    )
    .unwrap();
    (dir, config, changelog)
}

fn run_in(config: &Path, changelog: &Path) -> Command {
    let mut command = cmd();
    command.args([
        "--config",
        config.to_str().unwrap(),
        "--changelog",
        changelog.to_str().unwrap(),
        "--verbosity",
        "error",
    ]);
    command
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("rollback"))
        .stdout(predicate::str::contains("changelog-sync"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("release-locks"))
        .stdout(predicate::str::contains("generate-sql"));
}

#[test]
fn test_rollback_requires_a_target() {
    cmd().args(["rollback"]).assert().failure().code(2);
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("changelog-migrate"));
}

#[test]
fn test_log_format_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"));
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_1() {
    // Missing file is an IO error, not a config error
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "status"])
        .assert()
        .code(1);
}

#[test]
fn test_invalid_yaml_exits_with_code_2() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "invalid: yaml: content: [").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "status"])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_database_type_exits_with_code_2() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "database:").unwrap();
    writeln!(file, "  type: access").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "status"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("database.type"));
}

// =============================================================================
// Offline SQL Generation
// =============================================================================

#[test]
fn test_generate_sql_without_database() {
    let (_dir, _config, changelog) = workspace();
    cmd()
        .args([
            "--changelog",
            changelog.to_str().unwrap(),
            "generate-sql",
            "--dbms",
            "mssql",
            "--delimiter",
            "\nGO",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("-- Changeset"))
        .stdout(predicate::str::contains("CREATE TABLE"))
        .stdout(predicate::str::contains("\nGO"));
}

#[test]
fn test_generate_sql_unknown_dbms() {
    let (_dir, _config, changelog) = workspace();
    cmd()
        .args(["--changelog", changelog.to_str().unwrap(), "generate-sql", "--dbms", "nosuchdb"])
        .assert()
        .code(2);
}

// =============================================================================
// End-to-end against SQLite
// =============================================================================

#[test]
fn test_update_then_status() {
    let (_dir, config, changelog) = workspace();

    run_in(&config, &changelog)
        .args(["--contexts", "test", "update"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 executed"));

    run_in(&config, &changelog)
        .args(["--contexts", "test", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 change sets have not been applied"));

    run_in(&config, &changelog)
        .args(["--output-json", "history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"author\": \"bob\""));
}

#[test]
fn test_contexts_select_change_sets() {
    let (_dir, config, changelog) = workspace();

    run_in(&config, &changelog)
        .args(["--contexts", "prod", "update"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 executed"));

    run_in(&config, &changelog)
        .args(["--contexts", "test", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 change sets have not been applied"))
        .stdout(predicate::str::contains("changelog.yaml::2::bob"));
}

#[test]
fn test_update_sql_leaves_database_untouched() {
    let (_dir, config, changelog) = workspace();

    run_in(&config, &changelog)
        .arg("update-sql")
        .assert()
        .success()
        .stdout(predicate::str::contains("-- Lock Database"))
        .stdout(predicate::str::contains("CREATE TABLE"));

    run_in(&config, &changelog)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 change sets have not been applied"));
}

#[test]
fn test_tag_and_rollback() {
    let (_dir, config, changelog) = workspace();

    run_in(&config, &changelog).args(["update", "--count", "1"]).assert().success();
    run_in(&config, &changelog).args(["tag", "v1"]).assert().success();
    run_in(&config, &changelog).arg("update").assert().success();

    run_in(&config, &changelog)
        .args(["tag-exists", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    run_in(&config, &changelog)
        .args(["rollback", "--tag", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 rolled back"));
}

#[test]
fn test_list_and_release_locks() {
    let (_dir, config, changelog) = workspace();

    run_in(&config, &changelog).arg("update").assert().success();
    run_in(&config, &changelog)
        .arg("list-locks")
        .assert()
        .success()
        .stdout(predicate::str::contains("No locks held"));
    run_in(&config, &changelog).arg("release-locks").assert().success();
}

#[test]
fn test_url_flag_without_config_file() {
    let (dir, _config, changelog) = workspace();
    let url = format!("sqlite://{}", dir.path().join("other.db").display());

    cmd()
        .args([
            "--config",
            dir.path().join("missing.yaml").to_str().unwrap(),
            "--url",
            &url,
            "--changelog",
            changelog.to_str().unwrap(),
            "validate",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No validation errors found"));
}
