//! IBM DB2 for Linux, Unix and Windows.

use super::Profile;
use crate::core::QuoteStyle;
use crate::database::{Capabilities, CaseFolding};

pub(super) const PROFILE: Profile = Profile {
    product_name: "DB2",
    short_name: "db2",
    capabilities: Capabilities {
        supports_schemas: true,
        supports_catalogs: false,
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
        case_folding: CaseFolding::Upper,
        max_varchar_length: Some(32_672),
    },
    quote_style: QuoteStyle::DoubleQuote,
    always_quote: false,
    reserved_words: &[
        "ACTIVATE", "ALIAS", "ASC", "DESC", "DBINFO", "EDITPROC", "ERASE", "EXCLUSIVE",
        "FIELDPROC", "IMMEDIATE", "INHERIT", "KEY", "LOCKSIZE", "MAXVALUE", "MINVALUE",
        "NULLS", "NUMPARTS", "OBID", "PACKAGE", "PIECESIZE", "PROGRAM", "PSID", "QUERYNO",
        "RRN", "RUN", "SCRATCHPAD", "STOGROUP", "VALIDPROC", "VOLUMES",
    ],
    default_schema: None,
    current_datetime_function: "CURRENT TIMESTAMP",
    auto_increment_clause: "GENERATED BY DEFAULT AS IDENTITY",
    true_literal: "1",
    false_literal: "0",
};
