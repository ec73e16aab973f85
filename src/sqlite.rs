//! SQLite implementation of the connection seam, built on rusqlite.
//!
//! Statements are compiled through the per-connection statement cache of
//! rusqlite when they are prepared, so every later execution reuses the
//! compiled form. Closing a [`SqliteStatement`] evicts and finalizes it.

// used to count the statements that are alive on one connection
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rusqlite::params_from_iter;
use tracing::{debug, info, warn};

use crate::config::DataSourceConfiguration;
use crate::connection::{Connection, ResultRow, Statement, Value};
use crate::error::{DaoError, Result};

/// Initial size of the statement cache, it grows with the number of open
/// statements so that none of them is ever evicted.
pub const STATEMENT_CACHE_CAPACITY: usize = 256;

// ------------- Location -------------
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Memory,
    File(PathBuf),
}

impl Location {
    fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        let rest = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        if rest == ":memory:" {
            return Ok(Location::Memory);
        }
        if rest.is_empty() || rest.contains("://") {
            return Err(DaoError::Configuration(format!(
                "unsupported data source url '{}'",
                url
            )));
        }
        Ok(Location::File(PathBuf::from(rest)))
    }
    fn is_fresh(&self) -> bool {
        match self {
            Location::Memory => true,
            Location::File(path) => !path.exists(),
        }
    }
}

// ------------- SqliteConnection -------------
#[derive(Debug)]
struct Shared {
    connection: rusqlite::Connection,
    open_statements: Cell<usize>,
    capacity: Cell<usize>,
}

impl Shared {
    fn statement_opened(&self) {
        let open = self.open_statements.get() + 1;
        self.open_statements.set(open);
        if open > self.capacity.get() {
            let capacity = open * 2;
            self.connection.set_prepared_statement_cache_capacity(capacity);
            self.capacity.set(capacity);
            debug!(open, capacity, "statement cache grown");
        }
    }
    fn statement_closed(&self) {
        self.open_statements.set(self.open_statements.get().saturating_sub(1));
    }
}

/// Single threaded handle to one SQLite connection, cloning shares it.
#[derive(Debug, Clone)]
pub struct SqliteConnection {
    inner: Rc<Shared>,
}

impl SqliteConnection {
    /// Opens the database the configuration points at, running its creation
    /// file when the database is fresh. A fresh file whose creation script
    /// fails is removed again, so the next attempt starts from scratch.
    pub fn open(configuration: &DataSourceConfiguration) -> Result<Self> {
        let location = Location::parse(configuration.url())?;
        let fresh = location.is_fresh();
        let script = match configuration.creation_file() {
            Some(path) => Some(read_creation_file(path)?),
            None => match &location {
                // a new file database would otherwise be left without a schema
                Location::File(path) if fresh => {
                    return Err(DaoError::MissingCreationFile(path.clone()));
                }
                _ => None,
            },
        };
        let connection = match &location {
            Location::Memory => rusqlite::Connection::open_in_memory()?,
            Location::File(path) => rusqlite::Connection::open(path)?,
        };
        if fresh {
            if let Some(script) = script {
                if let Err(e) = connection.execute_batch(&script) {
                    drop(connection);
                    if let Location::File(path) = &location {
                        if let Err(remove_error) = fs::remove_file(path) {
                            warn!(path = %path.display(), error = %remove_error, "could not remove half created database");
                        }
                    }
                    warn!(source = %configuration, error = %e, "creation script failed");
                    return Err(DaoError::Configuration(format!(
                        "creation script failed: {}",
                        e
                    )));
                }
            }
        }
        info!(source = %configuration, fresh, "data source opened");
        Ok(Self::from_connection(connection))
    }
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(rusqlite::Connection::open_in_memory()?))
    }
    pub fn from_connection(connection: rusqlite::Connection) -> Self {
        connection.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);
        Self {
            inner: Rc::new(Shared {
                connection,
                open_statements: Cell::new(0),
                capacity: Cell::new(STATEMENT_CACHE_CAPACITY),
            }),
        }
    }
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        Ok(self.inner.connection.execute_batch(sql)?)
    }
    pub fn raw(&self) -> &rusqlite::Connection {
        &self.inner.connection
    }
    /// Statements prepared through this connection and not closed yet.
    pub fn open_statements(&self) -> usize {
        self.inner.open_statements.get()
    }
    pub fn cache_capacity(&self) -> usize {
        self.inner.capacity.get()
    }
}

fn read_creation_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(DaoError::MissingCreationFile(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|e| {
        DaoError::Configuration(format!(
            "could not read creation file {}: {}",
            path.display(),
            e
        ))
    })
}

impl Connection for SqliteConnection {
    type Statement = SqliteStatement;

    fn prepare(&self, sql: &str) -> Result<SqliteStatement> {
        // grow the cache first so that caching this one evicts nothing
        self.inner.statement_opened();
        // compiling now surfaces syntax and schema errors right away
        if let Err(e) = self.inner.connection.prepare_cached(sql) {
            self.inner.statement_closed();
            return Err(e.into());
        }
        debug!(sql, "statement prepared");
        Ok(SqliteStatement {
            connection: Rc::clone(&self.inner),
            inserts: sql.trim_start().to_ascii_uppercase().starts_with("INSERT"),
            sql: sql.to_string(),
            parameters: Vec::new(),
            generated_key: None,
            closed: false,
        })
    }
}

// ------------- SqliteStatement -------------
#[derive(Debug)]
pub struct SqliteStatement {
    connection: Rc<Shared>,
    sql: String,
    inserts: bool,
    parameters: Vec<Value>,
    generated_key: Option<i64>,
    closed: bool,
}

impl SqliteStatement {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(DaoError::StatementClosed(self.sql.clone()));
        }
        Ok(())
    }
}

impl Statement for SqliteStatement {
    fn sql(&self) -> &str {
        &self.sql
    }
    fn set_parameter(&mut self, index: usize, value: Value) -> Result<()> {
        self.ensure_open()?;
        if index == 0 {
            return Err(DaoError::UnknownParameter { index });
        }
        if self.parameters.len() < index {
            self.parameters.resize(index, Value::Null);
        }
        self.parameters[index - 1] = value;
        Ok(())
    }
    fn clear_parameters(&mut self) {
        self.parameters.clear();
    }
    fn parameters(&self) -> &[Value] {
        &self.parameters
    }
    fn execute_update(&mut self) -> Result<usize> {
        self.ensure_open()?;
        let changed = {
            let mut statement = self.connection.connection.prepare_cached(&self.sql)?;
            statement.execute(params_from_iter(self.parameters.iter()))?
        };
        if self.inserts {
            self.generated_key = Some(self.connection.connection.last_insert_rowid());
        }
        Ok(changed)
    }
    fn execute_query(&mut self) -> Result<Vec<ResultRow>> {
        self.ensure_open()?;
        let mut statement = self.connection.connection.prepare_cached(&self.sql)?;
        let labels: Rc<[String]> = statement
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let mut result = Vec::new();
        let mut rows = statement.query(params_from_iter(self.parameters.iter()))?;
        while let Some(row) = rows.next()? {
            let values = (0..labels.len())
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            result.push(ResultRow::new(Rc::clone(&labels), values));
        }
        Ok(result)
    }
    fn generated_key(&self) -> Option<i64> {
        self.generated_key
    }
    fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.closed = true;
        self.parameters.clear();
        self.connection.statement_closed();
        self.connection.connection.prepare_cached(&self.sql)?.discard();
        debug!(sql = %self.sql, "statement closed");
        Ok(())
    }
    fn is_closed(&self) -> bool {
        self.closed
    }
}
