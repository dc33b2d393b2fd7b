//! Physical type names per database family.
//!
//! One match per abstract type, one arm per family that differs from the
//! common spelling.

use super::{BaseType, DataTypeInstance, DatabaseDataType};
use crate::database::{Database, DatabaseKind as K};

const DEFAULT_VARCHAR_LENGTH: &str = "255";

pub(super) fn physical_type(
    base: BaseType,
    instance: &DataTypeInstance,
    database: &Database,
) -> DatabaseDataType {
    let kind = database.kind();
    let params = instance.parameters.clone();

    let mut physical = match base {
        BaseType::Int => match kind {
            K::Informix if instance.auto_increment => DatabaseDataType::new("SERIAL"),
            K::Mssql | K::MySql | K::MariaDb | K::Sybase => DatabaseDataType::new("INT"),
            _ => DatabaseDataType::new("INTEGER"),
        },
        BaseType::BigInt => match kind {
            K::Informix if instance.auto_increment => DatabaseDataType::new("SERIAL8"),
            // Only INTEGER PRIMARY KEY columns can autoincrement.
            K::Sqlite if instance.auto_increment => DatabaseDataType::new("INTEGER"),
            K::Oracle => DatabaseDataType::new("NUMBER").with_parameters(["38", "0"]),
            _ => DatabaseDataType::new("BIGINT"),
        },
        BaseType::SmallInt => match kind {
            K::Informix if instance.auto_increment => DatabaseDataType::new("SERIAL"),
            K::Oracle => DatabaseDataType::new("NUMBER").with_parameters(["5"]),
            _ => DatabaseDataType::new("SMALLINT"),
        },
        BaseType::TinyInt => match kind {
            K::Mssql | K::MySql | K::MariaDb | K::Sybase | K::SybaseAsa => {
                DatabaseDataType::new("TINYINT")
            }
            K::Oracle => DatabaseDataType::new("NUMBER").with_parameters(["3"]),
            _ => DatabaseDataType::new("SMALLINT"),
        },
        BaseType::Decimal => DatabaseDataType::new("DECIMAL").with_parameters(params),
        BaseType::Number => match kind {
            K::Oracle => DatabaseDataType::new("NUMBER").with_parameters(params),
            _ => DatabaseDataType::new("NUMERIC").with_parameters(params),
        },
        BaseType::Double => match kind {
            K::Mssql => DatabaseDataType::new("FLOAT").with_parameters(["53"]),
            K::Oracle => DatabaseDataType::new("FLOAT").with_parameters(["24"]),
            K::MySql | K::MariaDb => DatabaseDataType::new("DOUBLE").with_parameters(params),
            K::Derby | K::Db2 | K::H2 | K::Hsql | K::Sqlite => DatabaseDataType::new("DOUBLE"),
            _ => DatabaseDataType::new("DOUBLE PRECISION"),
        },
        BaseType::Float => match kind {
            K::MySql | K::MariaDb => DatabaseDataType::new("FLOAT").with_parameters(params),
            _ => DatabaseDataType::new("FLOAT").with_parameters(params.into_iter().take(1)),
        },
        BaseType::Currency => match kind {
            K::Mssql | K::Sybase | K::SybaseAsa | K::Postgres | K::Informix => {
                DatabaseDataType::new("MONEY")
            }
            K::Oracle => DatabaseDataType::new("NUMBER").with_parameters(["15", "2"]),
            K::MySql | K::MariaDb => DatabaseDataType::new("DECIMAL").with_parameters(["19", "4"]),
            _ => DatabaseDataType::new("DECIMAL").with_parameters(["18", "4"]),
        },
        BaseType::Boolean => boolean(database),
        BaseType::Bit => match kind {
            K::Postgres | K::MySql | K::MariaDb => DatabaseDataType::new("BIT").with_parameters(params),
            K::Mssql | K::Sybase | K::SybaseAsa => DatabaseDataType::new("BIT"),
            _ => boolean(database),
        },
        BaseType::Char => DatabaseDataType::new("CHAR").with_parameters(params),
        BaseType::VarChar => varchar(instance, database),
        BaseType::NChar => match kind {
            K::Postgres | K::Derby | K::Db2 | K::Sqlite | K::Firebird => {
                DatabaseDataType::new("CHAR").with_parameters(params)
            }
            _ => DatabaseDataType::new("NCHAR").with_parameters(params),
        },
        BaseType::NVarChar => match kind {
            K::Mssql => match instance.numeric_parameter(0) {
                Some(n) if n <= 4000 => DatabaseDataType::new("NVARCHAR").with_parameters(params),
                _ => DatabaseDataType::new("NVARCHAR").with_parameters(["MAX"]),
            },
            K::Oracle => DatabaseDataType::new("NVARCHAR2").with_parameters(with_default_length(params)),
            K::Postgres | K::Derby | K::Db2 | K::Sqlite | K::Firebird => {
                DatabaseDataType::new("VARCHAR").with_parameters(params)
            }
            _ => DatabaseDataType::new("NVARCHAR").with_parameters(params),
        },
        BaseType::Clob => match kind {
            K::Mssql => DatabaseDataType::new("VARCHAR").with_parameters(["MAX"]),
            K::Postgres | K::Sqlite | K::Sybase => DatabaseDataType::new("TEXT"),
            K::MySql | K::MariaDb => DatabaseDataType::new("LONGTEXT"),
            K::SybaseAsa => DatabaseDataType::new("LONG VARCHAR"),
            K::Firebird => DatabaseDataType::new("BLOB SUB_TYPE TEXT"),
            _ => DatabaseDataType::new("CLOB"),
        },
        BaseType::Blob => match kind {
            K::Postgres => DatabaseDataType::new("BYTEA"),
            K::Mssql if params.is_empty() => DatabaseDataType::new("VARBINARY").with_parameters(["MAX"]),
            K::Mssql => DatabaseDataType::new("VARBINARY").with_parameters(params),
            K::MySql | K::MariaDb if params.is_empty() => DatabaseDataType::new("LONGBLOB"),
            K::MySql | K::MariaDb => DatabaseDataType::new("VARBINARY").with_parameters(params),
            K::Sybase => DatabaseDataType::new("IMAGE"),
            K::SybaseAsa => DatabaseDataType::new("LONG BINARY"),
            _ => DatabaseDataType::new("BLOB"),
        },
        BaseType::Date => match kind {
            // DATE arrived in SQL Server 2008.
            K::Mssql if database.major_version() > 0 && database.major_version() < 10 => {
                DatabaseDataType::new("DATETIME")
            }
            _ => DatabaseDataType::new("DATE"),
        },
        BaseType::Time => match kind {
            K::Oracle => DatabaseDataType::new("DATE"),
            K::Informix => DatabaseDataType::new("DATETIME HOUR TO FRACTION(5)"),
            K::Mssql | K::MySql | K::MariaDb | K::Postgres => {
                DatabaseDataType::new("TIME").with_parameters(params)
            }
            _ => DatabaseDataType::new("TIME"),
        },
        BaseType::DateTime => match kind {
            K::Mssql if !params.is_empty() => DatabaseDataType::new("DATETIME2").with_parameters(params),
            K::Mssql | K::Sybase | K::SybaseAsa => DatabaseDataType::new("DATETIME"),
            K::MySql | K::MariaDb => DatabaseDataType::new("DATETIME").with_parameters(params),
            K::Informix => DatabaseDataType::new("DATETIME YEAR TO FRACTION(5)"),
            K::Sqlite => DatabaseDataType::new("TEXT"),
            _ => DatabaseDataType::new("TIMESTAMP"),
        },
        BaseType::Timestamp => timestamp(instance, database),
        BaseType::Uuid => match kind {
            K::Postgres | K::H2 => DatabaseDataType::new("UUID"),
            K::Mssql | K::Sybase | K::SybaseAsa => DatabaseDataType::new("UNIQUEIDENTIFIER"),
            K::Oracle => DatabaseDataType::new("RAW").with_parameters(["16"]),
            _ => DatabaseDataType::new("CHAR").with_parameters(["36"]),
        },
        BaseType::Xml => match kind {
            K::Postgres | K::Mssql | K::Db2 => DatabaseDataType::new("XML"),
            K::Oracle => DatabaseDataType::new("XMLTYPE"),
            K::MySql | K::MariaDb => DatabaseDataType::new("LONGTEXT"),
            K::Sqlite | K::Sybase => DatabaseDataType::new("TEXT"),
            _ => DatabaseDataType::new("CLOB"),
        },
        BaseType::Unknown => DatabaseDataType::new(instance.raw_name.clone()).with_parameters(params),
    };

    let keeps_info = !matches!(
        base,
        BaseType::Timestamp | BaseType::Time | BaseType::DateTime | BaseType::Date
    );
    if keeps_info && physical.additional_info.is_none() {
        physical.additional_info = instance.additional_info.clone();
    }
    if instance.unsigned && matches!(kind, K::MySql | K::MariaDb) {
        physical.additional_info = Some(match physical.additional_info.take() {
            Some(info) => format!("UNSIGNED {}", info),
            None => "UNSIGNED".to_string(),
        });
    }
    if instance.array && kind == K::Postgres {
        physical = fold_array(physical);
    }
    physical
}

fn boolean(database: &Database) -> DatabaseDataType {
    match database.kind() {
        K::Mssql | K::Sybase | K::SybaseAsa => DatabaseDataType::new("BIT"),
        K::MySql | K::MariaDb => DatabaseDataType::new("BIT").with_parameters(["1"]),
        K::Oracle => DatabaseDataType::new("NUMBER").with_parameters(["1"]),
        K::Sqlite => DatabaseDataType::new("BOOLEAN"),
        _ if database.capabilities().supports_boolean_type => DatabaseDataType::new("BOOLEAN"),
        _ => DatabaseDataType::new("SMALLINT"),
    }
}

fn varchar(instance: &DataTypeInstance, database: &Database) -> DatabaseDataType {
    let params = instance.parameters.clone();
    let length = instance.numeric_parameter(0);
    let max = database.capabilities().max_varchar_length;
    match database.kind() {
        K::Mssql => match (params.first(), length) {
            (None, _) => DatabaseDataType::new("VARCHAR"),
            (Some(_), Some(n)) if max.map_or(true, |m| n <= u64::from(m)) => {
                DatabaseDataType::new("VARCHAR").with_parameters(params)
            }
            _ => DatabaseDataType::new("VARCHAR").with_parameters(["MAX"]),
        },
        K::Oracle => DatabaseDataType::new("VARCHAR2").with_parameters(with_default_length(params)),
        K::Informix if length.is_some_and(|n| max.is_some_and(|m| n > u64::from(m))) => {
            DatabaseDataType::new("LVARCHAR").with_parameters(params)
        }
        K::MySql | K::MariaDb => {
            DatabaseDataType::new("VARCHAR").with_parameters(with_default_length(params))
        }
        _ => DatabaseDataType::new("VARCHAR").with_parameters(params),
    }
}

fn timestamp(instance: &DataTypeInstance, database: &Database) -> DatabaseDataType {
    let params = instance.parameters.clone();
    let info = instance.additional_info.as_deref().map(str::to_uppercase);
    let with_zone = instance.raw_name.eq_ignore_ascii_case("timestamptz")
        || info
            .as_deref()
            .is_some_and(|i| i.contains("TIME ZONE") && !i.contains("WITHOUT"));

    match database.kind() {
        K::Mssql if with_zone => DatabaseDataType::new("DATETIMEOFFSET").with_parameters(params),
        K::Mssql => DatabaseDataType::new("DATETIME2").with_parameters(params),
        K::Postgres | K::Oracle | K::H2 | K::Hsql if with_zone => DatabaseDataType::new("TIMESTAMP")
            .with_parameters(params)
            .with_additional_info(Some("WITH TIME ZONE".to_string())),
        K::Postgres => DatabaseDataType::new("TIMESTAMP")
            .with_parameters(params)
            .with_additional_info(info),
        K::Sybase | K::SybaseAsa => DatabaseDataType::new("DATETIME"),
        K::Informix => DatabaseDataType::new("DATETIME YEAR TO FRACTION(5)"),
        K::Sqlite => DatabaseDataType::new("TEXT"),
        _ => DatabaseDataType::new("TIMESTAMP").with_parameters(params),
    }
}

fn with_default_length(params: Vec<String>) -> Vec<String> {
    if params.is_empty() {
        vec![DEFAULT_VARCHAR_LENGTH.to_string()]
    } else {
        params
    }
}

/// `VARCHAR(10)` as a Postgres array: `VARCHAR(10)[]`.
fn fold_array(physical: DatabaseDataType) -> DatabaseDataType {
    let name = if physical.parameters.is_empty() {
        format!("{}[]", physical.name)
    } else {
        format!("{}({})[]", physical.name, physical.parameters.join(", "))
    };
    DatabaseDataType::new(name).with_additional_info(physical.additional_info)
}
