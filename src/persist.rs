// used for the per-type statement lookup
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::Arc;
// used for timing calls
use std::time::Instant;

use seahash::SeaHasher;
use tracing::{Level, debug, trace, warn};

use crate::column::Column;
use crate::connection::{Connection, ResultRow, Statement, Value};
use crate::dao::Dao;
use crate::entity::Entity;
use crate::error::{DaoError, Result};
use crate::query::QueryGenerator;

pub type StatementHasher = BuildHasherDefault<SeaHasher>;

/// Entity specific parts of a [`SqlDao`]: a sample instance to read metadata
/// from, parameter binders for inserts and updates, and the row mapper.
pub trait SqlMapper<T: Entity> {
    /// Only inspected for its metadata, never persisted.
    fn sample(&self) -> T;
    /// Binds the non identifying columns, in declaration order, from index 1.
    fn fill_insert_statement(&self, statement: &mut dyn Statement, entity: &T) -> Result<()>;
    /// Binds the non identifying columns in declaration order followed by the
    /// identifying value.
    fn fill_update_statement(&self, statement: &mut dyn Statement, entity: &T) -> Result<()>;
    fn create_entity_from_result(&self, row: &ResultRow) -> Result<T>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatementKey {
    Create,
    Find,
    Update,
    Delete,
    SelectAll,
    Search(Column),
}

// ------------- SqlDao -------------
/// A [`Dao`] that prepares every statement it will ever need when it is
/// constructed and reuses them until it is closed.
///
/// Statements are bound and executed without any locking, a `SqlDao` must
/// only be driven by one caller at a time.
pub struct SqlDao<T: Entity, M, C: Connection> {
    mapper: M,
    sample: T,
    generator: QueryGenerator,
    id_column: Arc<Column>,
    statements: HashMap<StatementKey, C::Statement, StatementHasher>,
    closed: bool,
}

impl<T, M, C> SqlDao<T, M, C>
where
    T: Entity,
    M: SqlMapper<T>,
    C: Connection,
{
    pub fn new(connection: &C, mapper: M) -> Result<Self> {
        Self::with_generator(connection, mapper, QueryGenerator::shared().clone())
    }
    /// Prepares all statements up front, any failure here is returned and
    /// whatever was already prepared gets released.
    pub fn with_generator(connection: &C, mapper: M, generator: QueryGenerator) -> Result<Self> {
        let sample = mapper.sample();
        let id_column = generator.id_column(&sample)?;
        let mut statements = HashMap::default();
        if let Err(e) = prepare_statements(connection, &generator, &sample, &mut statements) {
            let released: Vec<Result<()>> = statements.values_mut().map(|s: &mut C::Statement| s.close()).collect();
            if let Err(close_error) = DaoError::aggregate(released) {
                warn!(entity = sample.entity_name(), error = %close_error, "could not release statements after failed preparation");
            }
            return Err(e);
        }
        debug!(entity = sample.entity_name(), statements = statements.len(), "dao prepared");
        Ok(Self {
            mapper,
            sample,
            generator,
            id_column,
            statements,
            closed: false,
        })
    }
    pub fn id_column(&self) -> &Column {
        &self.id_column
    }
    pub fn prepared_statements(&self) -> usize {
        self.statements.len()
    }
    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    /// Runs `work` on the cached statement for `key`, clears its parameters
    /// afterwards and maps any failure onto `failed`.
    fn run<R>(
        &mut self,
        operation: &'static str,
        key: &StatementKey,
        failed: R,
        work: impl FnOnce(&M, &mut dyn Statement) -> Result<R>,
    ) -> R {
        let started = Instant::now();
        let entity = self.sample.entity_name();
        let Some(statement) = self.statements.get_mut(key) else {
            if self.closed {
                warn!(operation, entity, "dao used after close");
            } else {
                warn!(operation, entity, statement = ?key, "no prepared statement");
            }
            return failed;
        };
        let outcome = work(&self.mapper, statement);
        trace!(operation, entity, sql = statement.sql(), parameters = ?statement.parameters(), "bound");
        statement.clear_parameters();
        let micros = started.elapsed().as_micros() as u64;
        match outcome {
            Ok(value) => {
                debug!(operation, entity, micros, "call complete");
                value
            }
            Err(e) => {
                warn!(operation, entity, micros, error = %e, "call failed");
                failed
            }
        }
    }
}

fn prepare_statements<T: Entity, C: Connection>(
    connection: &C,
    generator: &QueryGenerator,
    sample: &T,
    statements: &mut HashMap<StatementKey, C::Statement, StatementHasher>,
) -> Result<()> {
    let mut queries = vec![
        (StatementKey::Create, generator.insert_prepared(sample)?),
        (StatementKey::Find, generator.find_prepared(sample)?),
        (StatementKey::Update, generator.update_prepared(sample)?),
        (StatementKey::Delete, generator.delete(sample, true)?),
        (StatementKey::SelectAll, generator.search_all(sample)),
    ];
    for column in sample.entity_columns().columns() {
        queries.push((
            StatementKey::Search(column.clone()),
            generator.search_prepared(sample, column),
        ));
    }
    for (key, sql) in queries {
        let statement = connection.prepare(&sql)?;
        statements.insert(key, statement);
    }
    Ok(())
}

fn map_row<T: Entity, M: SqlMapper<T>>(mapper: &M, row: &ResultRow) -> Result<T> {
    mapper
        .create_entity_from_result(row)
        .map_err(|e| DaoError::Mapping {
            entity: mapper.sample().entity_name().to_string(),
            reason: e.to_string(),
        })
}

fn map_rows<T: Entity, M: SqlMapper<T>>(mapper: &M, rows: &[ResultRow]) -> Result<Vec<T>> {
    rows.iter().map(|row| map_row(mapper, row)).collect()
}

impl<T, M, C> Dao<T> for SqlDao<T, M, C>
where
    T: Entity,
    M: SqlMapper<T>,
    C: Connection,
{
    fn entity_name(&self) -> &str {
        self.sample.entity_name()
    }

    fn create(&mut self, obj: Option<&T>) -> Option<T> {
        let obj = obj?;
        trace!(entity = obj.entity_name(), "create");
        let generated = self.run("create", &StatementKey::Create, None, |mapper, statement| {
            mapper.fill_insert_statement(statement, obj)?;
            statement.execute_update()?;
            Ok(Some(statement.generated_key()))
        })?;
        // drivers that do not report keys leave us with the id the caller set
        let id = generated.or_else(|| obj.id().trim().parse::<i64>().ok());
        match id {
            Some(id) => self.find(id),
            None => {
                warn!(entity = obj.entity_name(), "created row has no identifying value to read back");
                None
            }
        }
    }

    fn find(&mut self, id: i64) -> Option<T> {
        trace!(entity = self.sample.entity_name(), id, "find");
        self.run("find", &StatementKey::Find, None, |mapper, statement| {
            statement.set_parameter(1, Value::Integer(id))?;
            let rows = statement.execute_query()?;
            rows.first().map(|row| map_row(mapper, row)).transpose()
        })
    }

    fn update(&mut self, obj: Option<&T>) -> bool {
        let Some(obj) = obj else {
            return false;
        };
        trace!(entity = obj.entity_name(), id = %obj.id(), "update");
        self.run("update", &StatementKey::Update, false, |mapper, statement| {
            mapper.fill_update_statement(statement, obj)?;
            statement.execute_update()?;
            Ok(true)
        })
    }

    fn delete(&mut self, obj: Option<&T>) -> bool {
        let Some(obj) = obj else {
            return true;
        };
        if tracing::enabled!(Level::TRACE) {
            if let Ok(sql) = self.generator.delete(obj, false) {
                trace!(entity = obj.entity_name(), %sql, "delete");
            }
        }
        let id = self.id_column.column_type().parse_value(&obj.id());
        self.run("delete", &StatementKey::Delete, false, |_, statement| {
            statement.set_parameter(1, id)?;
            statement.execute_update()?;
            Ok(true)
        })
    }

    fn retrieve_all(&mut self) -> Vec<T> {
        trace!(entity = self.sample.entity_name(), "retrieve all");
        self.run("retrieve_all", &StatementKey::SelectAll, Vec::new(), |mapper, statement| {
            let rows = statement.execute_query()?;
            map_rows(mapper, &rows)
        })
    }

    fn search(&mut self, column: Option<&Column>, value: Option<&str>) -> Vec<T> {
        let (Some(column), Some(value)) = (column, value) else {
            return self.retrieve_all();
        };
        let textual = column.column_type().is_textual();
        trace!(
            entity = self.sample.entity_name(),
            clause = %QueryGenerator::where_clause(column, Some(value), textual),
            "search"
        );
        let bound = if textual {
            Value::Text(format!("{}%", value))
        } else {
            column.column_type().parse_value(value)
        };
        let key = StatementKey::Search(column.clone());
        self.run("search", &key, Vec::new(), |mapper, statement| {
            statement.set_parameter(1, bound)?;
            let rows = statement.execute_query()?;
            map_rows(mapper, &rows)
        })
    }

    /// Closes every cached statement, carrying on past failures, and reports
    /// the first one.
    fn close(&mut self) -> Result<()> {
        let count = self.statements.len();
        let released: Vec<Result<()>> = self
            .statements
            .drain()
            .map(|(_, mut statement)| statement.close())
            .collect();
        self.closed = true;
        let outcome = DaoError::aggregate(released);
        match &outcome {
            Ok(()) => debug!(entity = self.sample.entity_name(), statements = count, "dao closed"),
            Err(e) => warn!(entity = self.sample.entity_name(), error = %e, "dao closed with failures"),
        }
        outcome
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
