//! MySQL and MariaDB. Schemas are catalogs; names are backtick-quoted.

use super::Profile;
use crate::core::QuoteStyle;
use crate::database::{Capabilities, CaseFolding};

const CAPABILITIES: Capabilities = Capabilities {
    supports_schemas: false,
    supports_catalogs: true,
    catalog_is_schema: true,
    supports_sequences: false,
    supports_ddl_in_transaction: false,
    supports_initially_deferrable_columns: false,
    supports_tablespaces: false,
    supports_index_tablespaces: false,
    supports_auto_increment: true,
    supports_primary_key_names: false,
    supports_boolean_type: false,
    default_auto_commit: true,
    case_folding: CaseFolding::Preserve,
    max_varchar_length: Some(65_535),
};

const RESERVED: &[&str] = &[
    "ACCESSIBLE", "ANALYZE", "ASC", "BEFORE", "CHANGE", "DATABASE", "DATABASES", "DAY_HOUR",
    "DAY_MICROSECOND", "DAY_MINUTE", "DAY_SECOND", "DELAYED", "DESC", "DISTINCTROW", "DIV",
    "DUAL", "ELSEIF", "ENCLOSED", "ESCAPED", "EXPLAIN", "FLOAT4", "FLOAT8", "FORCE", "FULLTEXT",
    "HIGH_PRIORITY", "HOUR_MICROSECOND", "HOUR_MINUTE", "HOUR_SECOND", "IGNORE", "INDEX",
    "INFILE", "INT1", "INT2", "INT3", "INT4", "INT8", "KEY", "KEYS", "KILL", "LIMIT", "LINEAR",
    "LINES", "LOAD", "LOCK", "LONG", "LONGBLOB", "LONGTEXT", "LOW_PRIORITY", "MEDIUMBLOB",
    "MEDIUMINT", "MEDIUMTEXT", "MIDDLEINT", "MOD", "OPTIMIZE", "OPTION", "OPTIONALLY",
    "OUTFILE", "PURGE", "READ", "REGEXP", "RENAME", "REPLACE", "REQUIRE", "RESTRICT", "RLIKE",
    "SCHEMA", "SCHEMAS", "SEPARATOR", "SHOW", "SPATIAL", "SQL_BIG_RESULT",
    "SQL_CALC_FOUND_ROWS", "SQL_SMALL_RESULT", "SSL", "STARTING", "STRAIGHT_JOIN",
    "TERMINATED", "TINYBLOB", "TINYINT", "TINYTEXT", "UNLOCK", "UNSIGNED", "USAGE", "UTC_DATE",
    "UTC_TIME", "UTC_TIMESTAMP", "VARBINARY", "VARCHARACTER", "WRITE", "XOR", "YEAR_MONTH",
    "ZEROFILL",
];

pub(super) const MYSQL: Profile = Profile {
    product_name: "MySQL",
    short_name: "mysql",
    capabilities: CAPABILITIES,
    quote_style: QuoteStyle::Backtick,
    always_quote: false,
    reserved_words: RESERVED,
    default_schema: None,
    current_datetime_function: "NOW()",
    auto_increment_clause: "AUTO_INCREMENT",
    true_literal: "1",
    false_literal: "0",
};

pub(super) const MARIADB: Profile = Profile {
    product_name: "MariaDB",
    short_name: "mariadb",
    capabilities: CAPABILITIES,
    quote_style: QuoteStyle::Backtick,
    always_quote: false,
    reserved_words: RESERVED,
    default_schema: None,
    current_datetime_function: "NOW()",
    auto_increment_clause: "AUTO_INCREMENT",
    true_literal: "1",
    false_literal: "0",
};
