//! H2.

use super::Profile;
use crate::core::QuoteStyle;
use crate::database::{Capabilities, CaseFolding};

pub(super) const PROFILE: Profile = Profile {
    product_name: "H2",
    short_name: "h2",
    capabilities: Capabilities {
        supports_schemas: true,
        supports_catalogs: false,
        catalog_is_schema: false,
        supports_sequences: true,
        supports_ddl_in_transaction: false,
        supports_initially_deferrable_columns: false,
        supports_tablespaces: false,
        supports_index_tablespaces: false,
        supports_auto_increment: true,
        supports_primary_key_names: true,
        supports_boolean_type: true,
        default_auto_commit: true,
        case_folding: CaseFolding::Upper,
        max_varchar_length: None,
    },
    quote_style: QuoteStyle::DoubleQuote,
    always_quote: false,
    reserved_words: &["LIMIT", "MINUS", "OFFSET", "QUALIFY", "REGEXP", "ROWNUM", "TOP", "_ROWID_"],
    default_schema: Some("PUBLIC"),
    current_datetime_function: "NOW()",
    auto_increment_clause: "GENERATED BY DEFAULT AS IDENTITY",
    true_literal: "TRUE",
    false_literal: "FALSE",
};
