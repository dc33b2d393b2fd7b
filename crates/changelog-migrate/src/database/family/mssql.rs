//! Microsoft SQL Server.

use super::Profile;
use crate::core::QuoteStyle;
use crate::database::{Capabilities, CaseFolding};

pub(super) const PROFILE: Profile = Profile {
    product_name: "Microsoft SQL Server",
    short_name: "mssql",
    capabilities: Capabilities {
        supports_schemas: true,
        supports_catalogs: true,
        catalog_is_schema: false,
        supports_sequences: true,
        supports_ddl_in_transaction: true,
        supports_initially_deferrable_columns: false,
        supports_tablespaces: true,
        supports_index_tablespaces: false,
        supports_auto_increment: true,
        supports_primary_key_names: true,
        supports_boolean_type: false,
        default_auto_commit: true,
        case_folding: CaseFolding::Preserve,
        max_varchar_length: Some(8000),
    },
    quote_style: QuoteStyle::Bracket,
    always_quote: true,
    reserved_words: &[
        "BACKUP", "BREAK", "BROWSE", "BULK", "CHECKPOINT", "CLUSTERED", "COMPUTE", "CONTAINS",
        "CONTAINSTABLE", "DATABASE", "DBCC", "DENY", "DISK", "DISTRIBUTED", "DUMP", "ERRLVL",
        "FILE", "FILLFACTOR", "FREETEXT", "FREETEXTTABLE", "GOTO", "HOLDLOCK", "IDENTITY_INSERT",
        "IDENTITYCOL", "INDEX", "KEY", "KILL", "LINENO", "LOAD", "NOCHECK", "NONCLUSTERED",
        "OFFSETS", "OPENDATASOURCE", "OPENQUERY", "OPENROWSET", "OPENXML", "PERCENT", "PIVOT",
        "PLAN", "PRINT", "PROC", "PUBLIC", "RAISERROR", "READTEXT", "RECONFIGURE", "REPLICATION",
        "RESTORE", "RESTRICT", "REVERT", "ROWCOUNT", "ROWGUIDCOL", "RULE", "SAVE", "SCHEMA",
        "SETUSER", "SHUTDOWN", "STATISTICS", "TABLESAMPLE", "TEXTSIZE", "TOP", "TRAN",
        "TRANSACTION", "TRUNCATE", "TSEQUAL", "UNPIVOT", "UPDATETEXT", "USE", "VIEW", "WAITFOR",
        "WRITETEXT",
    ],
    default_schema: Some("dbo"),
    current_datetime_function: "GETDATE()",
    auto_increment_clause: "IDENTITY",
    true_literal: "1",
    false_literal: "0",
};
