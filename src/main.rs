//! Demonstrates the DAO layer on a small journal.
//!
//! Usage: `sqldao [configuration file]`. Without a file an in-memory SQLite
//! database is used. Log verbosity follows `RUST_LOG` (default `info`).

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sqldao::column::{Column, ColumnMap, ColumnType, EntityColumn};
use sqldao::connection::{ResultRow, Statement, Value};
use sqldao::dao::Dao;
use sqldao::entity::Entity;
use sqldao::error::Result;
use sqldao::factory::{DaoFactory, FactoryBase, FactoryRegistry};
use sqldao::persist::{SqlDao, SqlMapper};
use sqldao::sqlite::SqliteConnection;
use sqldao::DataSourceConfiguration;

const JOURNAL_SCHEMA: &str = "
    create table if not exists Entry (
        id integer not null primary key autoincrement,
        title text not null,
        written text not null
    );
";

// ------------- Entry -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EntryColumn {
    Id,
    Title,
    Written,
}

impl EntryColumn {
    const ID: Column = Column::id("id", ColumnType::Integer);
    const TITLE: Column = Column::new("title", ColumnType::Text, false);
    const WRITTEN: Column = Column::new("written", ColumnType::Date, false);
}

impl EntityColumn for EntryColumn {
    fn column(&self) -> Column {
        match self {
            EntryColumn::Id => Self::ID,
            EntryColumn::Title => Self::TITLE,
            EntryColumn::Written => Self::WRITTEN,
        }
    }
    fn all() -> &'static [Self] {
        &[EntryColumn::Id, EntryColumn::Title, EntryColumn::Written]
    }
}

#[derive(Debug, Clone)]
struct Entry {
    id: Option<i64>,
    title: String,
    written: NaiveDate,
}

impl Entry {
    fn new(title: &str, written: NaiveDate) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            written,
        }
    }
}

impl Entity for Entry {
    type Key = EntryColumn;

    fn entity_name(&self) -> &str {
        "Entry"
    }
    fn entity_columns(&self) -> ColumnMap<EntryColumn> {
        ColumnMap::from_keys()
    }
    fn id(&self) -> String {
        self.id.map(|id| id.to_string()).unwrap_or_default()
    }
}

struct EntryMapper;

impl SqlMapper<Entry> for EntryMapper {
    fn sample(&self) -> Entry {
        Entry::new("", NaiveDate::MIN)
    }
    fn fill_insert_statement(&self, statement: &mut dyn Statement, entry: &Entry) -> Result<()> {
        statement.set_parameter(1, Value::Text(entry.title.clone()))?;
        statement.set_parameter(2, Value::Text(entry.written.to_string()))
    }
    fn fill_update_statement(&self, statement: &mut dyn Statement, entry: &Entry) -> Result<()> {
        self.fill_insert_statement(statement, entry)?;
        statement.set_parameter(3, entry.id.map(Value::Integer).unwrap_or(Value::Null))
    }
    fn create_entity_from_result(&self, row: &ResultRow) -> Result<Entry> {
        Ok(Entry {
            id: Some(row.get("id")?),
            title: row.get("title")?,
            written: row.get("written")?,
        })
    }
}

// ------------- JournalFactory -------------
#[derive(Default)]
struct JournalFactory {
    base: FactoryBase,
}

impl DaoFactory for JournalFactory {
    fn base(&self) -> &FactoryBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut FactoryBase {
        &mut self.base
    }
    fn init(&mut self) -> Result<()> {
        let connection = SqliteConnection::open(self.base.configuration()?)?;
        connection.execute_batch(JOURNAL_SCHEMA)?;
        let entries = SqlDao::new(&connection, EntryMapper)?;
        self.base.daos_mut().register::<Entry, _>(entries)
    }
}

fn write_journal(entries: &mut dyn Dao<Entry>, today: NaiveDate) {
    for title in ["Arrival", "Alpine walk", "Lake day", "Departure"] {
        match entries.create(Some(&Entry::new(title, today))) {
            Some(entry) => info!(id = ?entry.id, title = %entry.title, "entry created"),
            None => warn!(title, "entry was not created"),
        }
    }
    let found = entries.search(Some(&EntryColumn::TITLE), Some("A"));
    info!(matches = found.len(), "entries starting with 'A'");
    if let Some(mut first) = found.into_iter().next() {
        first.title.push_str(" (revisited)");
        let updated = entries.update(Some(&first));
        let deleted = entries.delete(Some(&first));
        info!(updated, deleted, "first match renamed and removed");
    }
    for entry in entries.retrieve_all() {
        info!(id = ?entry.id, title = %entry.title, written = %entry.written, "remaining entry");
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let configuration = match std::env::args().nth(1) {
        Some(path) => DataSourceConfiguration::load(path)?,
        None => DataSourceConfiguration::new("sqlite::memory:", "", ""),
    };

    let mut registry = FactoryRegistry::new();
    registry.register_type::<JournalFactory>();
    let name = std::any::type_name::<JournalFactory>();
    let mut factory = registry.build_factory(name, configuration)?;

    match factory.get_dao::<Entry>() {
        Some(entries) => write_journal(entries, Utc::now().date_naive()),
        None => warn!("journal factory did not register an entry dao"),
    }
    factory.close()?;
    Ok(())
}
