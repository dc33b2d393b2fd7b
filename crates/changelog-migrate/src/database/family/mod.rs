//! Static per-family facts.

mod db2;
mod derby;
mod firebird;
mod h2;
mod hsql;
mod informix;
mod mssql;
mod mysql;
mod oracle;
mod postgres;
mod sqlite;
mod sybase;

use super::{Capabilities, DatabaseKind};
use crate::core::QuoteStyle;

/// Everything about a family that does not depend on the session.
#[derive(Debug)]
pub struct Profile {
    pub product_name: &'static str,
    pub short_name: &'static str,
    pub capabilities: Capabilities,
    pub quote_style: QuoteStyle,
    /// Quote every identifier regardless of strategy (bracket families).
    pub always_quote: bool,
    /// Reserved words beyond the SQL:2003 list, upper case.
    pub reserved_words: &'static [&'static str],
    pub default_schema: Option<&'static str>,
    pub current_datetime_function: &'static str,
    /// Column clause for generated keys; empty when the type carries it.
    pub auto_increment_clause: &'static str,
    pub true_literal: &'static str,
    pub false_literal: &'static str,
}

pub(super) fn profile(kind: DatabaseKind) -> &'static Profile {
    match kind {
        DatabaseKind::Postgres => &postgres::PROFILE,
        DatabaseKind::Mssql => &mssql::PROFILE,
        DatabaseKind::MySql => &mysql::MYSQL,
        DatabaseKind::MariaDb => &mysql::MARIADB,
        DatabaseKind::Oracle => &oracle::PROFILE,
        DatabaseKind::Informix => &informix::PROFILE,
        DatabaseKind::Derby => &derby::PROFILE,
        DatabaseKind::H2 => &h2::PROFILE,
        DatabaseKind::Hsql => &hsql::PROFILE,
        DatabaseKind::Db2 => &db2::PROFILE,
        DatabaseKind::Sqlite => &sqlite::PROFILE,
        DatabaseKind::Sybase => &sybase::SYBASE,
        DatabaseKind::SybaseAsa => &sybase::SYBASE_ASA,
        DatabaseKind::Firebird => &firebird::PROFILE,
    }
}
