//! Value literals.

use super::LoadType;
use crate::core::SqlValue;
use crate::database::{Database, DatabaseKind};

/// Render `value` for a column of the given load type.
///
/// `national` forces the `N'...'` prefix on SQL Server; non-ASCII text gets it
/// regardless of the column type.
pub(super) fn render(value: &SqlValue, load_type: LoadType, national: bool, database: &Database) -> String {
    let textual = matches!(load_type, LoadType::String | LoadType::Clob | LoadType::Uuid);
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Function(function) => function.clone(),
        SqlValue::CurrentDateTime => database.current_datetime_function().to_string(),
        SqlValue::SequenceNext(sequence) => database.sequence_next_value(sequence),
        SqlValue::Bool(b) => match load_type {
            _ if textual => string_literal(&b.to_string(), national, database),
            LoadType::Numeric => if *b { "1" } else { "0" }.to_string(),
            _ => boolean(*b, load_type, database),
        },
        SqlValue::Int(_) | SqlValue::Float(_) | SqlValue::Numeric(_) => {
            let text = value.as_text().unwrap_or_default();
            match load_type {
                _ if textual => string_literal(&text, national, database),
                LoadType::Boolean | LoadType::Bit => match value.as_bool() {
                    Some(b) => boolean(b, load_type, database),
                    None => text,
                },
                _ => text,
            }
        }
        SqlValue::Text(text) => match load_type {
            LoadType::Numeric if looks_numeric(text) => text.trim().to_string(),
            LoadType::Boolean | LoadType::Bit => match value.as_bool() {
                Some(b) => boolean(b, load_type, database),
                None => string_literal(text, national, database),
            },
            _ => string_literal(text, national, database),
        },
        SqlValue::Date(date) if !textual => database.date_literal(*date),
        SqlValue::Time(time) if !textual => database.time_literal(*time),
        SqlValue::DateTime(datetime) if !textual => database.datetime_literal(*datetime),
        SqlValue::Date(_) | SqlValue::Time(_) | SqlValue::DateTime(_) => {
            string_literal(&value.as_text().unwrap_or_default(), national, database)
        }
    }
}

fn boolean(value: bool, load_type: LoadType, database: &Database) -> String {
    if load_type == LoadType::Bit && database.kind() == DatabaseKind::Postgres {
        return if value { "B'1'" } else { "B'0'" }.to_string();
    }
    database.boolean_literal(value).to_string()
}

fn string_literal(text: &str, national: bool, database: &Database) -> String {
    let literal = database.string_literal(text);
    if database.kind() == DatabaseKind::Mssql && (national || !text.is_ascii()) {
        format!("N{}", literal)
    } else {
        literal
    }
}

fn looks_numeric(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text.parse::<f64>().is_ok()
}
