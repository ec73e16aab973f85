//! sqldao – a small object-relational mapping layer over prepared SQL statements.
//!
//! Plain record types describe their own persisted shape and get generic
//! create/read/update/delete/search operations in return:
//! * An [`entity::Entity`] reports its table name, its columns in declaration
//!   order and the text form of its identifying value.
//! * A [`column::Column`] is the immutable descriptor of one persisted
//!   attribute: name, [`column::ColumnType`] and whether it identifies rows.
//! * The [`query::QueryGenerator`] renders SQL text for entities and memoizes
//!   the identifying column of every entity type it has seen.
//! * A [`dao::Dao`] is the CRUD contract for one entity type, implemented by
//!   [`persist::SqlDao`] on top of cached prepared statements.
//! * A [`factory::DaoFactory`] owns one DAO per entity type and is built by
//!   name through a [`factory::FactoryRegistry`].
//!
//! ## Modules
//! * [`column`] – column descriptors, column keys and ordered column maps.
//! * [`entity`] – the [`entity::Entity`] capability.
//! * [`query`] – SQL text generation, prepared (`?`) and literal flavours.
//! * [`connection`] – the [`connection::Connection`] / [`connection::Statement`]
//!   seam DAOs are written against.
//! * [`sqlite`] – SQLite implementation of that seam, built on rusqlite.
//! * [`config`] – [`config::DataSourceConfiguration`] and its loading.
//! * [`dao`] – the generic CRUD contract.
//! * [`persist`] – [`persist::SqlDao`] and its [`persist::SqlMapper`] hooks.
//! * [`factory`] – DAO ownership, life cycle and name based construction.
//! * [`error`] – the [`error::DaoError`] taxonomy.
//!
//! ## Failure model
//! Misconfiguration (an entity without identifying column, an unknown factory
//! name, a missing creation file, an entity too small to insert) fails fast
//! while DAOs and factories are set up. Once a DAO is running, failed calls are
//! logged through `tracing` and answered with `None`, `false` or an empty
//! result, so a single bad row does not tear down a long running consumer.
//!
//! ## Threading
//! A DAO binds and executes its statements without locking and must be driven
//! by one caller at a time; use one DAO and connection per worker. The
//! identifying column cache is the only shared state and is guarded by a lock.
//!
//! ## Quick Start
//! ```
//! use sqldao::column::{Column, ColumnMap, ColumnType, EntityColumn};
//! use sqldao::connection::{ResultRow, Statement, Value};
//! use sqldao::dao::Dao;
//! use sqldao::entity::Entity;
//! use sqldao::error::Result;
//! use sqldao::persist::{SqlDao, SqlMapper};
//! use sqldao::sqlite::SqliteConnection;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum NoteColumn { Id, Text }
//! impl EntityColumn for NoteColumn {
//!     fn column(&self) -> Column {
//!         match self {
//!             NoteColumn::Id => Column::id("id", ColumnType::Integer),
//!             NoteColumn::Text => Column::new("text", ColumnType::Text, false),
//!         }
//!     }
//!     fn all() -> &'static [Self] { &[NoteColumn::Id, NoteColumn::Text] }
//! }
//!
//! #[derive(Debug, Clone, Default)]
//! struct Note { id: Option<i64>, text: String }
//! impl Entity for Note {
//!     type Key = NoteColumn;
//!     fn entity_name(&self) -> &str { "Note" }
//!     fn entity_columns(&self) -> ColumnMap<NoteColumn> { ColumnMap::from_keys() }
//!     fn id(&self) -> String { self.id.map(|id| id.to_string()).unwrap_or_default() }
//! }
//!
//! struct NoteMapper;
//! impl SqlMapper<Note> for NoteMapper {
//!     fn sample(&self) -> Note { Note::default() }
//!     fn fill_insert_statement(&self, s: &mut dyn Statement, note: &Note) -> Result<()> {
//!         s.set_parameter(1, Value::Text(note.text.clone()))
//!     }
//!     fn fill_update_statement(&self, s: &mut dyn Statement, note: &Note) -> Result<()> {
//!         s.set_parameter(1, Value::Text(note.text.clone()))?;
//!         s.set_parameter(2, note.id.map(Value::Integer).unwrap_or(Value::Null))
//!     }
//!     fn create_entity_from_result(&self, row: &ResultRow) -> Result<Note> {
//!         Ok(Note { id: Some(row.get("id")?), text: row.get("text")? })
//!     }
//! }
//!
//! let connection = SqliteConnection::open_in_memory().unwrap();
//! connection.execute_batch("create table Note (id integer primary key, text text not null);").unwrap();
//! let mut notes = SqlDao::new(&connection, NoteMapper).unwrap();
//! let created = notes.create(Some(&Note { id: None, text: "hello".into() })).unwrap();
//! assert_eq!(created.id, Some(1));
//! assert_eq!(notes.retrieve_all().len(), 1);
//! notes.close().unwrap();
//! ```

pub mod column;
pub mod config;
pub mod connection;
pub mod dao;
pub mod entity;
pub mod error;
pub mod factory;
pub mod persist;
pub mod query;
pub mod sqlite;

pub use column::{Column, ColumnMap, ColumnType, EntityColumn};
pub use config::DataSourceConfiguration;
pub use dao::Dao;
pub use entity::Entity;
pub use error::{DaoError, Result};
pub use factory::{DaoFactory, DaoSet, FactoryBase, FactoryRegistry};
pub use persist::{SqlDao, SqlMapper};
pub use query::QueryGenerator;
