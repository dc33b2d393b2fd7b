//! PostgreSQL.

use super::Profile;
use crate::core::QuoteStyle;
use crate::database::{Capabilities, CaseFolding};

pub(super) const PROFILE: Profile = Profile {
    product_name: "PostgreSQL",
    short_name: "postgresql",
    capabilities: Capabilities {
        supports_schemas: true,
        supports_catalogs: false,
        catalog_is_schema: false,
        supports_sequences: true,
        supports_ddl_in_transaction: true,
        supports_initially_deferrable_columns: true,
        supports_tablespaces: true,
        supports_index_tablespaces: true,
        supports_auto_increment: true,
        supports_primary_key_names: true,
        supports_boolean_type: true,
        default_auto_commit: true,
        case_folding: CaseFolding::Lower,
        max_varchar_length: Some(10_485_760),
    },
    quote_style: QuoteStyle::DoubleQuote,
    always_quote: false,
    reserved_words: &[
        "ANALYSE", "ANALYZE", "CONCURRENTLY", "FREEZE", "ILIKE", "ISNULL", "LIMIT", "NOTNULL",
        "OFFSET", "PLACING", "RETURNING", "VARIADIC", "VERBOSE",
    ],
    default_schema: Some("public"),
    current_datetime_function: "NOW()",
    auto_increment_clause: "GENERATED BY DEFAULT AS IDENTITY",
    true_literal: "TRUE",
    false_literal: "FALSE",
};
