//! Firebird. No schemas; identity columns are not generated.

use super::Profile;
use crate::core::QuoteStyle;
use crate::database::{Capabilities, CaseFolding};

pub(super) const PROFILE: Profile = Profile {
    product_name: "Firebird",
    short_name: "firebird",
    capabilities: Capabilities {
        supports_schemas: false,
        supports_catalogs: false,
        catalog_is_schema: false,
        supports_sequences: true,
        supports_ddl_in_transaction: false,
        supports_initially_deferrable_columns: false,
        supports_tablespaces: false,
        supports_index_tablespaces: false,
        supports_auto_increment: false,
        supports_primary_key_names: true,
        supports_boolean_type: false,
        default_auto_commit: true,
        case_folding: CaseFolding::Upper,
        max_varchar_length: Some(32_765),
    },
    quote_style: QuoteStyle::DoubleQuote,
    always_quote: false,
    reserved_words: &[
        "ACTIVE", "ADMIN", "AFTER", "ASC", "BEFORE", "COMPUTED", "CONTAINING", "DESC", "ENTRY_POINT",
        "GDSCODE", "GENERATOR", "INACTIVE", "KEY", "POSITION", "RDB$DB_KEY", "RECREATE", "SHADOW",
        "STARTING", "VARIABLE",
    ],
    default_schema: None,
    current_datetime_function: "CURRENT_TIMESTAMP",
    auto_increment_clause: "",
    true_literal: "1",
    false_literal: "0",
};
