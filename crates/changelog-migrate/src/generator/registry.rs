//! Generator registry and the delegation chain.
//!
//! The [`GeneratorRegistry`] is built once at startup and handed to every
//! consumer by reference. Tests build a fresh one with [`GeneratorRegistry::new`]
//! and register mocks instead of resetting shared state.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::{standard, family, Sql, SqlGenerator, ValidationErrors};
use crate::database::Database;
use crate::datatype::DataTypeRegistry;
use crate::error::{MigrateError, Result};
use crate::statement::{Statement, StatementKind};

/// Registry of SQL generators keyed by statement kind.
///
/// Candidates for one statement are ordered by descending priority; equal
/// priorities keep registration order, so the generator registered first
/// wins a tie.
pub struct GeneratorRegistry {
    generators: HashMap<StatementKind, Vec<Arc<dyn SqlGenerator>>>,
    types: DataTypeRegistry,
}

impl GeneratorRegistry {
    /// Registry with no generators and the built-in data types.
    pub fn new() -> Self {
        Self {
            generators: HashMap::new(),
            types: DataTypeRegistry::with_builtins(),
        }
    }

    /// Registry with every built-in generator and data type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for generator in standard::builtins() {
            registry.register_arc(generator);
        }
        for generator in family::builtins() {
            registry.register_arc(generator);
        }
        registry
    }

    pub fn register(&mut self, generator: impl SqlGenerator + 'static) {
        self.register_arc(Arc::new(generator));
    }

    pub fn register_arc(&mut self, generator: Arc<dyn SqlGenerator>) {
        self.generators
            .entry(generator.statement_kind())
            .or_default()
            .push(generator);
    }

    /// Replace the data-type registry.
    pub fn with_types(mut self, types: DataTypeRegistry) -> Self {
        self.types = types;
        self
    }

    pub fn types(&self) -> &DataTypeRegistry {
        &self.types
    }

    /// Supporting generators for the pair, best first.
    fn candidates(&self, statement: &Statement, database: &Database) -> Vec<Arc<dyn SqlGenerator>> {
        let mut candidates: Vec<Arc<dyn SqlGenerator>> = self
            .generators
            .get(&statement.kind())
            .map(|list| {
                list.iter()
                    .filter(|g| g.supports(statement, database))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // sort_by is stable: registration order breaks ties
        candidates.sort_by(|a, b| b.priority().cmp(&a.priority()));

        if let [first, second, ..] = candidates.as_slice() {
            if first.priority() == second.priority() {
                warn!(
                    "Generators {} and {} share priority {} for {} on {}; using {}",
                    first.name(),
                    second.name(),
                    first.priority(),
                    statement.kind(),
                    database,
                    first.name()
                );
            }
        }
        candidates
    }

    /// Name of the generator that would run for the pair.
    pub fn resolve(&self, statement: &Statement, database: &Database) -> Option<&'static str> {
        self.candidates(statement, database).first().map(|g| g.name())
    }

    /// Chain over the supporting generators, or `None` when there are none.
    fn chain(&self, statement: &Statement, database: &Database) -> Option<GeneratorChain<'_>> {
        let candidates = self.candidates(statement, database);
        if candidates.is_empty() {
            None
        } else {
            Some(GeneratorChain::new(candidates, self))
        }
    }

    pub fn supports(&self, statement: &Statement, database: &Database) -> bool {
        self.generators
            .get(&statement.kind())
            .is_some_and(|list| list.iter().any(|g| g.supports(statement, database)))
    }

    /// Validation errors of the selected generator. An unsupported pair is
    /// reported as an error rather than silently passing.
    pub fn validate(&self, statement: &Statement, database: &Database) -> ValidationErrors {
        match self.chain(statement, database) {
            Some(mut chain) => chain.validate(statement, database),
            None => {
                let mut errors = ValidationErrors::new();
                errors.add_error(format!(
                    "{} is not supported on {}",
                    statement.kind(),
                    database.short_name()
                ));
                errors
            }
        }
    }

    pub fn warnings(&self, statement: &Statement, database: &Database) -> Vec<String> {
        self.chain(statement, database)
            .map(|mut chain| chain.warnings(statement, database))
            .unwrap_or_default()
    }

    /// Validate, then generate SQL for one statement.
    pub fn generate_sql(&self, statement: &Statement, database: &Database) -> Result<Vec<Sql>> {
        let chain = self
            .chain(statement, database)
            .ok_or_else(|| MigrateError::unsupported(statement.kind().name(), database.short_name()))?;

        chain.clone().validate(statement, database).into_result()?;
        chain.clone().generate_sql(statement, database)
    }

    /// SQL for a sequence of statements, in order.
    pub fn generate_statements(&self, statements: &[Statement], database: &Database) -> Result<Vec<Sql>> {
        let mut sql = Vec::new();
        for statement in statements {
            sql.extend(self.generate_sql(statement, database)?);
        }
        Ok(sql)
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.generators.keys().copied().collect();
        kinds.sort();
        f.debug_struct("GeneratorRegistry")
            .field("statement_kinds", &kinds.iter().map(|k| k.name()).collect::<Vec<_>>())
            .field("types", &self.types)
            .finish()
    }
}

/// Cursor over the lower-priority candidates for one statement.
///
/// Each call to [`GeneratorChain::generate_sql`] or [`GeneratorChain::validate`]
/// advances to the next candidate and runs it with the rest of the chain.
#[derive(Clone)]
pub struct GeneratorChain<'a> {
    generators: Vec<Arc<dyn SqlGenerator>>,
    position: usize,
    registry: &'a GeneratorRegistry,
}

impl<'a> GeneratorChain<'a> {
    fn new(generators: Vec<Arc<dyn SqlGenerator>>, registry: &'a GeneratorRegistry) -> Self {
        Self {
            generators,
            position: 0,
            registry,
        }
    }

    fn next(&mut self) -> Option<Arc<dyn SqlGenerator>> {
        let generator = self.generators.get(self.position).cloned();
        if generator.is_some() {
            self.position += 1;
        }
        generator
    }

    /// SQL from the next candidate, or nothing when the chain is exhausted.
    pub fn generate_sql(&mut self, statement: &Statement, database: &Database) -> Result<Vec<Sql>> {
        match self.next() {
            Some(generator) => generator.generate_sql(statement, database, self),
            None => Ok(Vec::new()),
        }
    }

    pub fn validate(&mut self, statement: &Statement, database: &Database) -> ValidationErrors {
        match self.next() {
            Some(generator) => generator.validate(statement, database, self),
            None => ValidationErrors::new(),
        }
    }

    pub fn warnings(&mut self, statement: &Statement, database: &Database) -> Vec<String> {
        match self.next() {
            Some(generator) => generator.warnings(statement, database, self),
            None => Vec::new(),
        }
    }

    pub fn types(&self) -> &'a DataTypeRegistry {
        &self.registry.types
    }

    /// The owning registry, for generators that emit nested statements.
    pub fn registry(&self) -> &'a GeneratorRegistry {
        self.registry
    }
}
