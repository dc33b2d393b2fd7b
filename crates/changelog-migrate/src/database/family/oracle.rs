//! Oracle Database.

use super::Profile;
use crate::core::QuoteStyle;
use crate::database::{Capabilities, CaseFolding};

pub(super) const PROFILE: Profile = Profile {
    product_name: "Oracle",
    short_name: "oracle",
    capabilities: Capabilities {
        supports_schemas: true,
        supports_catalogs: false,
        catalog_is_schema: true,
        supports_sequences: true,
        supports_ddl_in_transaction: false,
        supports_initially_deferrable_columns: true,
        supports_tablespaces: true,
        supports_index_tablespaces: true,
        supports_auto_increment: true,
        supports_primary_key_names: true,
        supports_boolean_type: false,
        default_auto_commit: true,
        case_folding: CaseFolding::Upper,
        max_varchar_length: Some(4000),
    },
    quote_style: QuoteStyle::DoubleQuote,
    always_quote: false,
    reserved_words: &[
        "ACCESS", "AUDIT", "CLUSTER", "COMMENT", "COMPRESS", "EXCLUSIVE", "FILE", "IDENTIFIED",
        "INCREMENT", "INDEX", "INITIAL", "LEVEL", "LOCK", "LONG", "MAXEXTENTS", "MINUS", "MLSLABEL",
        "MODE", "MODIFY", "NOAUDIT", "NOCOMPRESS", "NOWAIT", "NUMBER", "OFFLINE", "ONLINE", "OPTION",
        "PCTFREE", "PRIOR", "PRIVILEGES", "PUBLIC", "RAW", "RENAME", "RESOURCE", "ROWID", "ROWNUM",
        "SESSION", "SHARE", "SIZE", "SUCCESSFUL", "SYNONYM", "SYSDATE", "UID", "VALIDATE",
        "VARCHAR2", "VIEW",
    ],
    default_schema: None,
    current_datetime_function: "SYSTIMESTAMP",
    auto_increment_clause: "GENERATED BY DEFAULT AS IDENTITY",
    true_literal: "1",
    false_literal: "0",
};
