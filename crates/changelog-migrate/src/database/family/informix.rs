//! IBM Informix. Generated keys come from the SERIAL types, so the column
//! clause is empty.

use super::Profile;
use crate::core::QuoteStyle;
use crate::database::{Capabilities, CaseFolding};

pub(super) const PROFILE: Profile = Profile {
    product_name: "Informix Dynamic Server",
    short_name: "informix",
    capabilities: Capabilities {
        supports_schemas: true,
        supports_catalogs: false,
        catalog_is_schema: false,
        supports_sequences: true,
        supports_ddl_in_transaction: true,
        supports_initially_deferrable_columns: false,
        supports_tablespaces: false,
        supports_index_tablespaces: false,
        supports_auto_increment: true,
        supports_primary_key_names: true,
        supports_boolean_type: true,
        default_auto_commit: true,
        case_folding: CaseFolding::Lower,
        max_varchar_length: Some(255),
    },
    quote_style: QuoteStyle::DoubleQuote,
    always_quote: false,
    reserved_words: &["DATABASE", "EXTENT", "INDEX", "LVARCHAR", "SERIAL", "SERIAL8", "SYNONYM"],
    default_schema: None,
    current_datetime_function: "CURRENT YEAR TO FRACTION(5)",
    auto_increment_clause: "",
    true_literal: "'t'",
    false_literal: "'f'",
};
