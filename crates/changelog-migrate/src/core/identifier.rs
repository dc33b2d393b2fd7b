//! Identifier validation and quoting shared by every database family.
//!
//! SQL identifiers cannot be bound as statement parameters, so every name that
//! reaches generated SQL goes through one of the quoting styles below. Quoting
//! doubles the closing delimiter, which makes [`unquote`] an exact inverse of
//! [`quote`] for any identifier.

use crate::error::{MigrateError, Result};

/// Longest name accepted for any family. Families with shorter limits
/// (PostgreSQL truncates at 63 bytes) report their own errors at run time.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Delimiter pair a database uses for quoted identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteStyle {
    /// `"name"`, the ANSI form.
    DoubleQuote,
    /// `` `name` `` (MySQL, MariaDB).
    Backtick,
    /// `[name]` (SQL Server, Sybase).
    Bracket,
}

impl QuoteStyle {
    /// Opening and closing delimiter characters.
    pub fn delimiters(self) -> (char, char) {
        match self {
            QuoteStyle::DoubleQuote => ('"', '"'),
            QuoteStyle::Backtick => ('`', '`'),
            QuoteStyle::Bracket => ('[', ']'),
        }
    }
}

/// Reject table and column names no database can hold.
///
/// Generators report failures through `ValidationErrors::check_identifier`.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(MigrateError::Config(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote an identifier, doubling any embedded closing delimiter.
///
/// ```ignore
/// assert_eq!(quote(QuoteStyle::DoubleQuote, "table\"name"), "\"table\"\"name\"");
/// assert_eq!(quote(QuoteStyle::Bracket, "a]b"), "[a]]b]");
/// ```
pub fn quote(style: QuoteStyle, name: &str) -> String {
    let (open, close) = style.delimiters();
    let escaped = name.replace(close, &format!("{close}{close}"));
    format!("{open}{escaped}{close}")
}

/// Reverse [`quote`]: strip the delimiters and collapse doubled closers.
///
/// Returns `None` if `text` is not a well-formed quoted identifier in `style`.
pub fn unquote(style: QuoteStyle, text: &str) -> Option<String> {
    let (open, close) = style.delimiters();
    let inner = text.strip_prefix(open)?.strip_suffix(close)?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == close {
            // A lone closer inside the body would have ended the identifier.
            if chars.next() != Some(close) {
                return None;
            }
        }
        out.push(c);
    }
    Some(out)
}

/// True when `name` can appear unquoted: letters, digits, `_` and `$`,
/// not starting with a digit.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Split a comma separated column list, trimming whitespace and dropping blanks.
pub fn split_name_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_valid() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("User Table").is_ok());
        assert!(validate_identifier("a").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_bad_input() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("a\0b").is_err());
        assert!(validate_identifier(&"x".repeat(129)).is_err());
        assert!(validate_identifier(&"x".repeat(128)).is_ok());
    }

    #[test]
    fn test_quote_styles() {
        assert_eq!(quote(QuoteStyle::DoubleQuote, "users"), "\"users\"");
        assert_eq!(quote(QuoteStyle::Backtick, "users"), "`users`");
        assert_eq!(quote(QuoteStyle::Bracket, "users"), "[users]");
    }

    #[test]
    fn test_quote_escapes_closing_delimiter() {
        assert_eq!(quote(QuoteStyle::DoubleQuote, "a\"b"), "\"a\"\"b\"");
        assert_eq!(quote(QuoteStyle::Backtick, "a`b"), "`a``b`");
        assert_eq!(quote(QuoteStyle::Bracket, "a]b"), "[a]]b]");
        // The opening bracket needs no escaping.
        assert_eq!(quote(QuoteStyle::Bracket, "a[b"), "[a[b]");
    }

    #[test]
    fn test_unquote_round_trip() {
        let names = [
            "plain",
            "Mixed Case",
            "with\"quote",
            "with`tick",
            "with]bracket",
            "[[odd]]",
            "semi;colon",
            "émigré",
            "\"\"",
        ];
        for style in [QuoteStyle::DoubleQuote, QuoteStyle::Backtick, QuoteStyle::Bracket] {
            for name in names {
                let quoted = quote(style, name);
                assert_eq!(unquote(style, &quoted).as_deref(), Some(name), "{style:?} {name}");
            }
        }
    }

    #[test]
    fn test_unquote_rejects_malformed() {
        assert_eq!(unquote(QuoteStyle::DoubleQuote, "users"), None);
        assert_eq!(unquote(QuoteStyle::DoubleQuote, "\"a\"b\""), None);
        assert_eq!(unquote(QuoteStyle::Bracket, "[a]b]"), None);
    }

    #[test]
    fn test_is_plain_identifier() {
        assert!(is_plain_identifier("users"));
        assert!(is_plain_identifier("_tmp$1"));
        assert!(!is_plain_identifier("1abc"));
        assert!(!is_plain_identifier("has space"));
        assert!(!is_plain_identifier("dash-ed"));
        assert!(!is_plain_identifier(""));
    }

    #[test]
    fn test_split_name_list() {
        assert_eq!(split_name_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_name_list("").is_empty());
    }
}
