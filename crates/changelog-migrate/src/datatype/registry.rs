//! Alias lookup over registered units.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::{DataTypeInstance, DataTypeUnit, DatabaseDataType, StandardType, TypeDescriptor};
use crate::core::SqlValue;
use crate::database::Database;

/// Registry of data type units.
///
/// Built once at startup and shared read-only. Tests build their own with
/// [`DataTypeRegistry::new`] instead of touching a global.
#[derive(Default, Clone)]
pub struct DataTypeRegistry {
    units: Vec<Arc<dyn DataTypeUnit>>,
    /// Unit indexes per lower-case alias, in registration order.
    by_alias: HashMap<String, Vec<usize>>,
    /// Unit that claims names nobody else does.
    fallback: Option<usize>,
}

impl DataTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in unit.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for unit in StandardType::builtins() {
            registry.register(unit);
        }
        registry
    }

    /// Register a unit. A unit without aliases becomes the fallback for
    /// unknown names when its priority beats the current fallback.
    pub fn register(&mut self, unit: Arc<dyn DataTypeUnit>) {
        let index = self.units.len();
        if unit.aliases().is_empty() {
            let replace = self
                .fallback
                .map_or(true, |current| unit.priority() > self.units[current].priority());
            if replace {
                self.fallback = Some(index);
            }
        }
        for alias in unit.aliases() {
            self.by_alias
                .entry(alias.to_lowercase())
                .or_default()
                .push(index);
        }
        self.units.push(unit);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Highest-priority unit claiming `alias`; the first registered wins ties.
    pub fn lookup(&self, alias: &str) -> Option<Arc<dyn DataTypeUnit>> {
        let candidates = self.by_alias.get(&alias.to_lowercase())?;
        let mut best: Option<usize> = None;
        for &index in candidates {
            match best {
                Some(current) if self.units[index].priority() == self.units[current].priority() => {
                    warn!(
                        "Type alias '{}' is claimed by '{}' and '{}' at the same priority; using '{}'",
                        alias,
                        self.units[current].name(),
                        self.units[index].name(),
                        self.units[current].name()
                    );
                }
                Some(current) if self.units[index].priority() <= self.units[current].priority() => {}
                _ => best = Some(index),
            }
        }
        best.map(|i| Arc::clone(&self.units[i]))
    }

    /// Parse `descriptor` and bind it to a unit, checking the parameter count
    /// the unit accepts on `database`.
    pub fn resolve(&self, descriptor: &str, database: &Database) -> Result<DataTypeInstance, String> {
        let parsed = TypeDescriptor::parse(descriptor)?;

        let matched = parsed
            .name_candidates()
            .into_iter()
            .find_map(|(name, moved)| self.lookup(&name).map(|unit| (unit, name, moved)));

        let (unit, raw_name, additional_info) = match matched {
            Some((unit, name, moved)) => {
                let info = match (moved, parsed.additional_info.clone()) {
                    (Some(m), Some(i)) => Some(format!("{} {}", m, i)),
                    (m, i) => m.or(i),
                };
                (unit, name, info)
            }
            None => {
                let index = self
                    .fallback
                    .ok_or_else(|| format!("Unknown data type '{}'", parsed.raw))?;
                (
                    Arc::clone(&self.units[index]),
                    parsed.written_name.clone(),
                    parsed.additional_info.clone(),
                )
            }
        };

        let count = parsed.parameters.len();
        let min = unit.min_parameters(database);
        let max = unit.max_parameters(database);
        if count < min || count > max {
            return Err(format!(
                "Type '{}' accepts {} to {} parameters on {}, got {}",
                parsed.raw, min, max, database, count
            ));
        }

        Ok(DataTypeInstance {
            auto_increment: StandardType::implies_auto_increment(&raw_name),
            unit,
            parameters: parsed.parameters,
            additional_info,
            unsigned: parsed.unsigned,
            array: parsed.array,
            raw_name,
        })
    }

    /// Physical type for a descriptor.
    pub fn to_database_type(
        &self,
        descriptor: &str,
        auto_increment: bool,
        database: &Database,
    ) -> Result<DatabaseDataType, String> {
        let mut instance = self.resolve(descriptor, database)?;
        instance.auto_increment |= auto_increment;
        Ok(instance.to_database_type(database))
    }

    /// Literal for `value`, typed by `descriptor` when one is given.
    pub fn literal(&self, value: &SqlValue, descriptor: Option<&str>, database: &Database) -> String {
        match descriptor.and_then(|d| self.resolve(d, database).ok()) {
            Some(instance) => instance.value_to_sql_literal(value, database),
            None => super::literal::render(value, super::LoadType::Unknown, false, database),
        }
    }
}

impl std::fmt::Debug for DataTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataTypeRegistry")
            .field("units", &self.units.iter().map(|u| u.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseKind;
    use crate::datatype::LoadType;
    use crate::generator::PRIORITY_DATABASE;

    fn render(descriptor: &str, kind: DatabaseKind) -> String {
        DataTypeRegistry::with_builtins()
            .to_database_type(descriptor, false, &Database::new(kind))
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_aliases_resolve_case_insensitively() {
        let registry = DataTypeRegistry::with_builtins();
        for alias in ["INTEGER", "int4", "Int"] {
            assert_eq!(registry.lookup(alias).unwrap().name(), "int");
        }
    }

    #[test]
    fn test_serial_implies_auto_increment() {
        let registry = DataTypeRegistry::with_builtins();
        let db = Database::new(DatabaseKind::Informix);
        let instance = registry.resolve("serial", &db).unwrap();
        assert!(instance.auto_increment);
        assert_eq!(instance.to_database_type(&db).to_string(), "SERIAL");
    }

    #[test]
    fn test_varchar_over_limit_becomes_max_on_mssql() {
        assert_eq!(render("varchar(9000)", DatabaseKind::Mssql), "VARCHAR(MAX)");
        assert_eq!(render("varchar(max)", DatabaseKind::Mssql), "VARCHAR(MAX)");
        assert_eq!(render("varchar(255)", DatabaseKind::Mssql), "VARCHAR(255)");
        assert_eq!(render("nvarchar(5000)", DatabaseKind::Mssql), "NVARCHAR(MAX)");
    }

    #[test]
    fn test_family_spellings() {
        assert_eq!(render("varchar(20)", DatabaseKind::Oracle), "VARCHAR2(20)");
        assert_eq!(render("varchar(300)", DatabaseKind::Informix), "LVARCHAR(300)");
        assert_eq!(render("boolean", DatabaseKind::Mssql), "BIT");
        assert_eq!(render("boolean", DatabaseKind::Postgres), "BOOLEAN");
        assert_eq!(render("uuid", DatabaseKind::Mssql), "UNIQUEIDENTIFIER");
        assert_eq!(render("clob", DatabaseKind::MySql), "LONGTEXT");
        assert_eq!(render("blob", DatabaseKind::Postgres), "BYTEA");
        assert_eq!(render("bigint", DatabaseKind::Oracle), "NUMBER(38, 0)");
        assert_eq!(render("double", DatabaseKind::Postgres), "DOUBLE PRECISION");
    }

    #[test]
    fn test_timestamp_with_time_zone() {
        assert_eq!(
            render("timestamp with time zone", DatabaseKind::Postgres),
            "TIMESTAMP WITH TIME ZONE"
        );
        assert_eq!(render("timestamptz", DatabaseKind::Mssql), "DATETIMEOFFSET");
        assert_eq!(render("timestamp", DatabaseKind::Mssql), "DATETIME2");
    }

    #[test]
    fn test_unsigned_and_arrays() {
        assert_eq!(render("int UNSIGNED", DatabaseKind::MySql), "INT UNSIGNED");
        assert_eq!(render("int UNSIGNED", DatabaseKind::Postgres), "INTEGER");
        assert_eq!(render("varchar(10)[]", DatabaseKind::Postgres), "VARCHAR(10)[]");
    }

    #[test]
    fn test_unknown_type_passes_through() {
        assert_eq!(render("geometry", DatabaseKind::Postgres), "geometry");
        assert_eq!(render("MyType(1, 2)", DatabaseKind::Oracle), "MyType(1, 2)");
    }

    #[test]
    fn test_parameter_count_is_validated() {
        let registry = DataTypeRegistry::with_builtins();
        let db = Database::new(DatabaseKind::Postgres);
        let err = registry.resolve("varchar(1, 2)", &db).unwrap_err();
        assert!(err.contains("varchar(1, 2)"));
        assert!(registry.resolve("boolean(1)", &db).is_err());
    }

    #[derive(Debug)]
    struct ShoutingVarchar;

    impl DataTypeUnit for ShoutingVarchar {
        fn name(&self) -> &str {
            "shouting"
        }
        fn aliases(&self) -> &[&'static str] {
            &["varchar"]
        }
        fn max_parameters(&self, _database: &Database) -> usize {
            1
        }
        fn priority(&self) -> i32 {
            PRIORITY_DATABASE
        }
        fn load_type(&self) -> LoadType {
            LoadType::String
        }
        fn to_database_type(&self, _instance: &DataTypeInstance, _database: &Database) -> DatabaseDataType {
            DatabaseDataType::new("SHOUT")
        }
    }

    #[test]
    fn test_higher_priority_unit_wins_alias() {
        let mut registry = DataTypeRegistry::with_builtins();
        registry.register(Arc::new(ShoutingVarchar));
        let db = Database::new(DatabaseKind::Postgres);
        assert_eq!(
            registry.to_database_type("varchar(5)", false, &db).unwrap().to_string(),
            "SHOUT"
        );
    }

    #[test]
    fn test_literals() {
        let registry = DataTypeRegistry::with_builtins();
        let mssql = Database::new(DatabaseKind::Mssql);
        let pg = Database::new(DatabaseKind::Postgres);
        assert_eq!(registry.literal(&SqlValue::Null, Some("int"), &pg), "NULL");
        assert_eq!(registry.literal(&SqlValue::Bool(true), Some("boolean"), &pg), "TRUE");
        assert_eq!(registry.literal(&SqlValue::Bool(true), Some("boolean"), &mssql), "1");
        assert_eq!(registry.literal(&"42".into(), Some("int"), &pg), "42");
        assert_eq!(registry.literal(&SqlValue::Int(7), Some("varchar(5)"), &pg), "'7'");
        assert_eq!(registry.literal(&"café".into(), Some("varchar(10)"), &mssql), "N'café'");
        assert_eq!(registry.literal(&"x".into(), Some("nvarchar(10)"), &mssql), "N'x'");
        assert_eq!(registry.literal(&SqlValue::CurrentDateTime, None, &mssql), "GETDATE()");
        assert_eq!(
            registry.literal(&SqlValue::Function("uuid_generate_v4()".into()), Some("uuid"), &pg),
            "uuid_generate_v4()"
        );
    }
}
