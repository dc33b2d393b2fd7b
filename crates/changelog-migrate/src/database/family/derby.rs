//! Apache Derby.

use super::Profile;
use crate::core::QuoteStyle;
use crate::database::{Capabilities, CaseFolding};

pub(super) const PROFILE: Profile = Profile {
    product_name: "Apache Derby",
    short_name: "derby",
    capabilities: Capabilities {
        supports_schemas: true,
        supports_catalogs: false,
        catalog_is_schema: true,
        supports_sequences: true,
        supports_ddl_in_transaction: true,
        supports_initially_deferrable_columns: false,
        supports_tablespaces: false,
        supports_index_tablespaces: false,
        supports_auto_increment: true,
        supports_primary_key_names: true,
        supports_boolean_type: true,
        default_auto_commit: true,
        case_folding: CaseFolding::Upper,
        max_varchar_length: Some(32_672),
    },
    quote_style: QuoteStyle::DoubleQuote,
    always_quote: false,
    reserved_words: &[
        "ASC", "DESC", "EXPLAIN", "GETCURRENTCONNECTION", "KEY", "LOWER", "LTRIM", "MAX", "MIN",
        "RTRIM", "SUBSTR", "SUBSTRING", "SUM", "UPPER", "XML", "XMLEXISTS", "XMLPARSE",
        "XMLQUERY", "XMLSERIALIZE",
    ],
    default_schema: Some("APP"),
    current_datetime_function: "CURRENT_TIMESTAMP",
    auto_increment_clause: "GENERATED BY DEFAULT AS IDENTITY",
    true_literal: "TRUE",
    false_literal: "FALSE",
};
