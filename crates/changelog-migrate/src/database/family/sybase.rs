//! Sybase Adaptive Server Enterprise and SQL Anywhere.
//!
//! Both bracket every identifier and neither runs DDL inside a transaction.

use super::Profile;
use crate::core::QuoteStyle;
use crate::database::{Capabilities, CaseFolding};

const RESERVED: &[&str] = &[
    "BREAK", "BROWSE", "CHECKPOINT", "CLUSTERED", "COMPUTE", "CONVERT", "DATABASE", "DBCC",
    "DISK", "DUMMY", "DUMP", "ENDTRAN", "ERRLVL", "ERRORDATA", "ERROREXIT", "EXIT", "FILLFACTOR",
    "HOLDLOCK", "IDENTITY_INSERT", "INDEX", "KEY", "KILL", "LINENO", "LOAD", "MIRROR",
    "MIRROREXIT", "NONCLUSTERED", "NUMERIC_TRUNCATION", "OFFSETS", "ONCE", "PERM", "PERMANENT",
    "PLAN", "PRINT", "PROC", "PROCESSEXIT", "PUBLIC", "RAISERROR", "READTEXT", "RECONFIGURE",
    "REPLACE", "ROWCOUNT", "RULE", "SAVE", "SCHEMA", "SETUSER", "SHARED", "SHUTDOWN", "STRIPE",
    "TEMP", "TEXTSIZE", "TOP", "TRAN", "TRANSACTION", "TRUNCATE", "TSEQUAL", "UNPARTITION", "USE",
    "VIEW", "WAITFOR", "WRITETEXT",
];

pub(super) const SYBASE: Profile = Profile {
    product_name: "Sybase SQL Server",
    short_name: "sybase",
    capabilities: Capabilities {
        supports_schemas: true,
        supports_catalogs: true,
        catalog_is_schema: false,
        supports_sequences: false,
        supports_ddl_in_transaction: false,
        supports_initially_deferrable_columns: false,
        supports_tablespaces: true,
        supports_index_tablespaces: false,
        supports_auto_increment: true,
        supports_primary_key_names: true,
        supports_boolean_type: false,
        default_auto_commit: true,
        case_folding: CaseFolding::Preserve,
        max_varchar_length: Some(16_384),
    },
    quote_style: QuoteStyle::Bracket,
    always_quote: true,
    reserved_words: RESERVED,
    default_schema: Some("dbo"),
    current_datetime_function: "GETDATE()",
    auto_increment_clause: "IDENTITY",
    true_literal: "1",
    false_literal: "0",
};

pub(super) const SYBASE_ASA: Profile = Profile {
    product_name: "Sybase SQL Anywhere",
    short_name: "asany",
    capabilities: Capabilities {
        supports_schemas: true,
        supports_catalogs: true,
        catalog_is_schema: false,
        supports_sequences: false,
        supports_ddl_in_transaction: false,
        supports_initially_deferrable_columns: false,
        supports_tablespaces: true,
        supports_index_tablespaces: true,
        supports_auto_increment: true,
        supports_primary_key_names: true,
        supports_boolean_type: false,
        default_auto_commit: true,
        case_folding: CaseFolding::Preserve,
        max_varchar_length: Some(32_767),
    },
    quote_style: QuoteStyle::Bracket,
    always_quote: true,
    reserved_words: RESERVED,
    default_schema: Some("dba"),
    current_datetime_function: "now()",
    auto_increment_clause: "DEFAULT AUTOINCREMENT",
    true_literal: "1",
    false_literal: "0",
};
