//! Core abstractions shared by every component.
//!
//! - [`identifier`]: identifier validation and quoting styles
//! - [`value`]: SQL values and result rows
//! - [`traits`]: the [`Connection`] capability supplied by callers

pub mod identifier;
pub mod traits;
pub mod value;

pub use identifier::QuoteStyle;
pub use traits::Connection;
pub use value::{Row, SqlValue};
