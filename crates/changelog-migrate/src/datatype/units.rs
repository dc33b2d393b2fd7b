//! The built-in mapping units.

use std::sync::Arc;

use super::{literal, mapping, DataTypeInstance, DataTypeUnit, DatabaseDataType, LoadType};
use crate::core::SqlValue;
use crate::database::Database;
use crate::generator::{PRIORITY_DEFAULT, PRIORITY_NONE};

/// Abstract types known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Int,
    BigInt,
    SmallInt,
    TinyInt,
    Decimal,
    Number,
    Double,
    Float,
    Currency,
    Boolean,
    Bit,
    Char,
    VarChar,
    NChar,
    NVarChar,
    Clob,
    Blob,
    Date,
    Time,
    DateTime,
    Timestamp,
    Uuid,
    Xml,
    /// Anything no other unit claims; passed through as written.
    Unknown,
}

/// A built-in unit: a [`BaseType`] plus its aliases and parameter bounds.
#[derive(Debug, Clone)]
pub struct StandardType {
    base: BaseType,
    aliases: &'static [&'static str],
    max_parameters: usize,
    load_type: LoadType,
}

impl StandardType {
    const fn new(
        base: BaseType,
        aliases: &'static [&'static str],
        max_parameters: usize,
        load_type: LoadType,
    ) -> Self {
        Self {
            base,
            aliases,
            max_parameters,
            load_type,
        }
    }

    pub fn base(&self) -> BaseType {
        self.base
    }

    /// Every built-in unit, in registration order.
    pub fn builtins() -> Vec<Arc<dyn DataTypeUnit>> {
        BUILTINS
            .iter()
            .cloned()
            .map(|unit| Arc::new(unit) as Arc<dyn DataTypeUnit>)
            .collect()
    }

    /// Whether the descriptor name itself implies a generated value.
    pub fn implies_auto_increment(alias: &str) -> bool {
        matches!(
            alias,
            "serial" | "serial4" | "bigserial" | "serial8" | "smallserial" | "serial2"
        )
    }
}

const BUILTINS: &[StandardType] = &[
    StandardType::new(
        BaseType::Int,
        &["int", "integer", "int4", "serial", "serial4", "mediumint"],
        1,
        LoadType::Numeric,
    ),
    StandardType::new(
        BaseType::BigInt,
        &["bigint", "int8", "bigserial", "serial8"],
        1,
        LoadType::Numeric,
    ),
    StandardType::new(
        BaseType::SmallInt,
        &["smallint", "int2", "smallserial", "serial2"],
        1,
        LoadType::Numeric,
    ),
    StandardType::new(BaseType::TinyInt, &["tinyint"], 1, LoadType::Numeric),
    StandardType::new(BaseType::Decimal, &["decimal", "dec"], 2, LoadType::Numeric),
    StandardType::new(BaseType::Number, &["number", "numeric"], 2, LoadType::Numeric),
    StandardType::new(
        BaseType::Double,
        &["double", "double precision", "float8"],
        2,
        LoadType::Numeric,
    ),
    StandardType::new(BaseType::Float, &["float", "float4", "real"], 2, LoadType::Numeric),
    StandardType::new(
        BaseType::Currency,
        &["currency", "money", "smallmoney"],
        0,
        LoadType::Numeric,
    ),
    StandardType::new(BaseType::Boolean, &["boolean", "bool"], 0, LoadType::Boolean),
    StandardType::new(BaseType::Bit, &["bit"], 1, LoadType::Bit),
    StandardType::new(BaseType::Char, &["char", "character"], 1, LoadType::String),
    StandardType::new(
        BaseType::VarChar,
        &["varchar", "character varying", "varchar2"],
        1,
        LoadType::String,
    ),
    StandardType::new(
        BaseType::NChar,
        &["nchar", "national char", "national character"],
        1,
        LoadType::String,
    ),
    StandardType::new(
        BaseType::NVarChar,
        &["nvarchar", "nvarchar2", "national varchar", "national character varying"],
        1,
        LoadType::String,
    ),
    StandardType::new(
        BaseType::Clob,
        &[
            "clob", "text", "longtext", "mediumtext", "tinytext", "ntext", "nclob",
            "long varchar",
        ],
        1,
        LoadType::Clob,
    ),
    StandardType::new(
        BaseType::Blob,
        &[
            "blob", "bytea", "longblob", "mediumblob", "tinyblob", "image", "varbinary",
            "binary", "long binary", "longvarbinary",
        ],
        1,
        LoadType::Blob,
    ),
    StandardType::new(BaseType::Date, &["date"], 0, LoadType::Date),
    StandardType::new(BaseType::Time, &["time"], 1, LoadType::Date),
    StandardType::new(BaseType::DateTime, &["datetime", "datetime2", "smalldatetime"], 1, LoadType::Date),
    StandardType::new(
        BaseType::Timestamp,
        &["timestamp", "timestamptz"],
        1,
        LoadType::Date,
    ),
    StandardType::new(
        BaseType::Uuid,
        &["uuid", "uniqueidentifier", "guid"],
        0,
        LoadType::Uuid,
    ),
    StandardType::new(BaseType::Xml, &["xml", "xmltype"], 0, LoadType::Clob),
    StandardType::new(BaseType::Unknown, &[], usize::MAX, LoadType::Unknown),
];

impl DataTypeUnit for StandardType {
    fn name(&self) -> &str {
        self.aliases.first().copied().unwrap_or("unknown")
    }

    fn aliases(&self) -> &[&'static str] {
        self.aliases
    }

    fn max_parameters(&self, _database: &Database) -> usize {
        self.max_parameters
    }

    fn priority(&self) -> i32 {
        if self.base == BaseType::Unknown {
            PRIORITY_NONE
        } else {
            PRIORITY_DEFAULT
        }
    }

    fn load_type(&self) -> LoadType {
        self.load_type
    }

    fn to_database_type(&self, instance: &DataTypeInstance, database: &Database) -> DatabaseDataType {
        mapping::physical_type(self.base, instance, database)
    }

    fn value_to_sql_literal(&self, value: &SqlValue, database: &Database) -> String {
        let national = matches!(self.base, BaseType::NChar | BaseType::NVarChar);
        literal::render(value, self.load_type, national, database)
    }
}
