//! changelog-migrate CLI - change-log driven database migrations.

use changelog_migrate::{
    render_change_log_sql, ChangeLog, Config, Database, DatabaseKind, GeneratorRegistry, MigrateError, Migrator,
    RollbackTarget, RunSummary,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
#[cfg(unix)]
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "changelog-migrate")]
#[command(about = "Change-log driven database migrations")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml", env = "CHANGELOG_MIGRATE_CONFIG")]
    config: PathBuf,

    /// Connection URL, overriding database.url
    #[arg(long, env = "CHANGELOG_MIGRATE_URL")]
    url: Option<String>,

    /// Path to the change log
    #[arg(short = 'f', long, default_value = "changelog.yaml")]
    changelog: PathBuf,

    /// Contexts to run with, overriding run.contexts
    #[arg(long)]
    contexts: Option<String>,

    /// Label expression to run with, overriding run.labels
    #[arg(long)]
    labels: Option<String>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: trace, debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).args(["count", "tag", "date"])))]
struct RollbackArgs {
    /// Roll back the last N change sets
    #[arg(long)]
    count: Option<usize>,

    /// Roll back everything executed after this tag
    #[arg(long)]
    tag: Option<String>,

    /// Roll back everything executed after this date (RFC 3339 or YYYY-MM-DD[ HH:MM:SS])
    #[arg(long, value_parser = parse_date)]
    date: Option<DateTime<Utc>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending change sets
    Update {
        /// Apply at most N change sets
        #[arg(long, conflicts_with = "to_tag")]
        count: Option<usize>,

        /// Apply change sets up to the one creating this tag
        #[arg(long)]
        to_tag: Option<String>,
    },

    /// Write the SQL an update would run
    UpdateSql {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Undo executed change sets
    Rollback {
        #[command(flatten)]
        target: RollbackArgs,
    },

    /// Write the SQL a rollback would run
    RollbackSql {
        #[command(flatten)]
        target: RollbackArgs,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Mark every pending change set as executed without running it
    ChangelogSync,

    /// Write the SQL a change log sync would run
    ChangelogSyncSql {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Tag the most recently executed change set
    Tag {
        tag: String,
    },

    /// Check whether a tag exists in the history
    TagExists {
        tag: String,
    },

    /// Show which change sets have run and which are pending
    Status,

    /// Show the recorded history
    History,

    /// Check the change log and stored checksums
    Validate,

    /// Show who holds the change log lock
    ListLocks,

    /// Release the change log lock whoever holds it
    ReleaseLocks,

    /// Clear stored checksums so they are recomputed on the next run
    ClearChecksums,

    /// Write change log documentation to a directory
    DbDoc {
        /// Output directory
        output_dir: PathBuf,
    },

    /// Print the SQL of every change set for a database type, offline
    GenerateSql {
        /// Database type, e.g. postgresql, mssql, oracle
        #[arg(long)]
        dbms: String,

        /// Statement delimiter
        #[arg(long, default_value = ";")]
        delimiter: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    // Offline: needs only the change log.
    if let Commands::GenerateSql { dbms, delimiter } = &cli.command {
        let database = Database::new(DatabaseKind::from_short_name(dbms)?);
        let change_log = ChangeLog::load(&cli.changelog)?;
        let registry = GeneratorRegistry::with_builtins();
        print!("{}", render_change_log_sql(&change_log, &database, &registry, delimiter)?);
        return Ok(());
    }

    let config = load_config(&cli.config, cli.url.as_deref())?;
    let contexts = config.contexts(cli.contexts.as_deref());
    let labels = config.labels(cli.labels.as_deref())?;

    let change_log = if needs_change_log(&cli.command) {
        let change_log = ChangeLog::load(&cli.changelog)?;
        info!(
            "Loaded {} change sets from {:?}",
            change_log.change_sets.len(),
            cli.changelog
        );
        change_log
    } else {
        ChangeLog::default()
    };

    let cancel = setup_signal_handler();
    let migrator = Migrator::connect(config)
        .await?
        .with_change_log(change_log)
        .with_cancel(cancel);

    match cli.command {
        Commands::GenerateSql { .. } => unreachable!(), // Handled above
        Commands::Update { count, to_tag } => {
            let summary = match (count, to_tag) {
                (Some(count), _) => migrator.update_count(count, &contexts, &labels).await?,
                (None, Some(tag)) => migrator.update_to_tag(&tag, &contexts, &labels).await?,
                (None, None) => migrator.update(&contexts, &labels).await?,
            };
            report(&summary, cli.output_json, "Update")?;
        }

        Commands::UpdateSql { output } => {
            let mut out = open_output(output.as_deref())?;
            migrator.update_sql(&contexts, &labels, &mut out).await?;
        }

        Commands::Rollback { target } => {
            let summary = migrator.rollback(target.into_target(), &contexts, &labels).await?;
            report(&summary, cli.output_json, "Rollback")?;
        }

        Commands::RollbackSql { target, output } => {
            let mut out = open_output(output.as_deref())?;
            migrator
                .rollback_sql(target.into_target(), &contexts, &labels, &mut out)
                .await?;
        }

        Commands::ChangelogSync => {
            let summary = migrator.changelog_sync(&contexts, &labels).await?;
            report(&summary, cli.output_json, "Change log sync")?;
        }

        Commands::ChangelogSyncSql { output } => {
            let mut out = open_output(output.as_deref())?;
            migrator.changelog_sync_sql(&contexts, &labels, &mut out).await?;
        }

        Commands::Tag { tag } => {
            migrator.tag(&tag).await?;
            println!("Successfully tagged '{}'", tag);
        }

        Commands::TagExists { tag } => {
            let exists = migrator.tag_exists(&tag).await?;
            if cli.output_json {
                println!("{}", serde_json::json!({ "tag": tag, "exists": exists }));
            } else if exists {
                println!("The tag '{}' already exists in {}", tag, migrator.database());
            } else {
                println!("The tag '{}' does not exist in {}", tag, migrator.database());
            }
        }

        Commands::Status => {
            let statuses = migrator.status(&contexts, &labels).await?;
            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&statuses)?);
            } else {
                let pending: Vec<_> = statuses.iter().filter(|s| s.will_run).collect();
                println!(
                    "{} change sets have not been applied to {}",
                    pending.len(),
                    migrator.database()
                );
                for status in pending {
                    println!("  {}", status.change_set);
                }
                for status in statuses.iter().filter(|s| !s.checksum_valid) {
                    println!("  {} has changed since it ran", status.change_set);
                }
            }
        }

        Commands::History => {
            let history = migrator.history().await?;
            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                println!("History of {}:", migrator.database());
                for ran in &history {
                    let executed = ran
                        .date_executed
                        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_default();
                    let tag = ran.tag.as_deref().map(|t| format!(" [{}]", t)).unwrap_or_default();
                    println!(
                        "  {:>4}  {}  {}::{}::{}  {}{}",
                        ran.order_executed,
                        executed,
                        ran.key.file_path,
                        ran.key.id,
                        ran.key.author,
                        ran.exec_type,
                        tag
                    );
                }
            }
        }

        Commands::Validate => {
            migrator.validate().await?;
            println!("No validation errors found");
        }

        Commands::ListLocks => {
            let locks = migrator.list_locks().await?;
            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&locks)?);
            } else if locks.is_empty() {
                println!("No locks held on {}", migrator.database());
            } else {
                for lock in &locks {
                    println!("  {}", lock);
                }
            }
        }

        Commands::ReleaseLocks => {
            migrator.force_release_locks().await?;
            println!("Successfully released all database change log locks");
        }

        Commands::ClearChecksums => {
            migrator.clear_checksums().await?;
            println!("Cleared stored checksums");
        }

        Commands::DbDoc { output_dir } => {
            migrator.generate_documentation(&output_dir).await?;
            println!("Documentation written to {:?}", output_dir);
        }
    }

    Ok(())
}

impl RollbackArgs {
    fn into_target(self) -> RollbackTarget {
        match (self.count, self.tag, self.date) {
            (Some(count), _, _) => RollbackTarget::Count(count),
            (None, Some(tag), _) => RollbackTarget::Tag(tag),
            (None, None, Some(date)) => RollbackTarget::Date(date),
            // clap requires one of the three
            (None, None, None) => RollbackTarget::Count(0),
        }
    }
}

fn needs_change_log(command: &Commands) -> bool {
    !matches!(
        command,
        Commands::Tag { .. }
            | Commands::TagExists { .. }
            | Commands::History
            | Commands::ListLocks
            | Commands::ReleaseLocks
            | Commands::ClearChecksums
    )
}

/// The config file, or a bare configuration when only `--url` is given.
fn load_config(path: &Path, url: Option<&str>) -> Result<Config, MigrateError> {
    match url {
        Some(url) if !path.exists() => Config::for_url(url),
        Some(url) => {
            let mut config = Config::load(path)?;
            config.database.url = Some(url.to_string());
            config.validate()?;
            Ok(config)
        }
        None => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            Ok(config)
        }
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, MigrateError> {
    Ok(match path {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(std::io::stdout()),
    })
}

fn report(summary: &RunSummary, json: bool, operation: &str) -> Result<(), MigrateError> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    println!("{} completed: {}", operation, summary);
    for name in summary.executed.iter().chain(&summary.rolled_back).chain(&summary.marked_ran) {
        println!("  {}", name);
    }
    Ok(())
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(date.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .ok_or_else(|| format!("'{}' is not a date", value))
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Flip the returned receiver to true on SIGINT or SIGTERM. The migrator
/// stops before the next change set and releases its lock.
#[cfg(unix)]
fn setup_signal_handler() -> watch::Receiver<bool> {
    let (sender, receiver) = watch::channel(false);
    let sender = Arc::new(sender);
    let sender_term = Arc::clone(&sender);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived SIGINT. Stopping after the current change set...");
            let _ = sender.send(true);
        }
    });

    tokio::spawn(async move {
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            sigterm.recv().await;
            eprintln!("\nReceived SIGTERM. Stopping after the current change set...");
            let _ = sender_term.send(true);
        }
    });

    receiver
}

#[cfg(not(unix))]
fn setup_signal_handler() -> watch::Receiver<bool> {
    let (sender, receiver) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Stopping after the current change set...");
            let _ = sender.send(true);
        }
    });

    receiver
}
