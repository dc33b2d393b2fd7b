//! Generators that only apply to one database family.
//!
//! Each outranks the standard generator for its statement kind and usually
//! reaches it through the chain to reuse the common output.

mod informix;
mod mssql;
mod postgres;
mod sqlite;
mod unsupported;

use std::sync::Arc;

use super::SqlGenerator;

pub(super) fn builtins() -> Vec<Arc<dyn SqlGenerator>> {
    vec![
        Arc::new(informix::InformixCreateTable),
        Arc::new(informix::InformixAddUniqueConstraint),
        Arc::new(postgres::PostgresCreateTable),
        Arc::new(sqlite::SqliteAddColumn),
        Arc::new(mssql::MssqlAddColumn),
        Arc::new(unsupported::SequenceUnsupported::create()),
        Arc::new(unsupported::SequenceUnsupported::drop()),
    ]
}
