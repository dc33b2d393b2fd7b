//! SQLite. No schemas, no sequences; DDL is transactional.

use super::Profile;
use crate::core::QuoteStyle;
use crate::database::{Capabilities, CaseFolding};

pub(super) const PROFILE: Profile = Profile {
    product_name: "SQLite",
    short_name: "sqlite",
    capabilities: Capabilities {
        supports_schemas: false,
        supports_catalogs: false,
        catalog_is_schema: false,
        supports_sequences: false,
        supports_ddl_in_transaction: true,
        supports_initially_deferrable_columns: true,
        supports_tablespaces: false,
        supports_index_tablespaces: false,
        supports_auto_increment: true,
        supports_primary_key_names: true,
        supports_boolean_type: false,
        default_auto_commit: true,
        case_folding: CaseFolding::Preserve,
        max_varchar_length: None,
    },
    quote_style: QuoteStyle::DoubleQuote,
    always_quote: false,
    reserved_words: &[
        "ABORT", "ANALYZE", "ASC", "ATTACH", "AUTOINCREMENT", "CONFLICT", "DATABASE", "DEFERRED",
        "DESC", "DETACH", "EXCLUSIVE", "EXPLAIN", "FAIL", "GLOB", "IGNORE", "INDEX", "INDEXED",
        "INSTEAD", "ISNULL", "KEY", "LIMIT", "NOTNULL", "OFFSET", "PLAN", "PRAGMA", "QUERY",
        "RAISE", "REGEXP", "REINDEX", "RENAME", "REPLACE", "RESTRICT", "VACUUM", "VIEW",
        "VIRTUAL",
    ],
    default_schema: None,
    current_datetime_function: "CURRENT_TIMESTAMP",
    auto_increment_clause: "AUTOINCREMENT",
    true_literal: "1",
    false_literal: "0",
};
