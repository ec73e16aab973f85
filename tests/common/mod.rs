#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use sqldao::column::{Column, ColumnMap, ColumnType, EntityColumn};
use sqldao::connection::{Connection, ResultRow, Statement, Value};
use sqldao::entity::Entity;
use sqldao::error::{DaoError, Result};
use sqldao::persist::{SqlDao, SqlMapper};
use sqldao::sqlite::SqliteConnection;

pub const SCHEMA: &str = include_str!("../resources/dummy.sql");

pub fn resource(name: &str) -> String {
    format!("{}/tests/resources/{}", env!("CARGO_MANIFEST_DIR"), name)
}

// ------------- Dummy -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DummyColumn {
    Id,
    Name,
}

impl DummyColumn {
    pub const ID: Column = Column::id("id", ColumnType::Integer);
    pub const NAME: Column = Column::new("name", ColumnType::Text, false);
}

impl EntityColumn for DummyColumn {
    fn column(&self) -> Column {
        match self {
            DummyColumn::Id => Self::ID,
            DummyColumn::Name => Self::NAME,
        }
    }
    fn all() -> &'static [Self] {
        &[DummyColumn::Id, DummyColumn::Name]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dummy {
    pub id: Option<i64>,
    pub name: String,
}

impl Dummy {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }
}

impl Entity for Dummy {
    type Key = DummyColumn;

    fn entity_name(&self) -> &str {
        "Dummy"
    }
    fn entity_columns(&self) -> ColumnMap<DummyColumn> {
        ColumnMap::from_keys()
    }
    fn id(&self) -> String {
        self.id.map(|id| id.to_string()).unwrap_or_default()
    }
}

pub struct DummyMapper;

impl SqlMapper<Dummy> for DummyMapper {
    fn sample(&self) -> Dummy {
        Dummy::default()
    }
    fn fill_insert_statement(&self, statement: &mut dyn Statement, dummy: &Dummy) -> Result<()> {
        statement.set_parameter(1, Value::Text(dummy.name.clone()))
    }
    fn fill_update_statement(&self, statement: &mut dyn Statement, dummy: &Dummy) -> Result<()> {
        statement.set_parameter(1, Value::Text(dummy.name.clone()))?;
        statement.set_parameter(2, dummy.id.map(Value::Integer).unwrap_or(Value::Null))
    }
    fn create_entity_from_result(&self, row: &ResultRow) -> Result<Dummy> {
        Ok(Dummy {
            id: Some(row.get("id")?),
            name: row.get("name")?,
        })
    }
}

// ------------- Tag -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagColumn {
    Id,
    Label,
    Weight,
}

impl TagColumn {
    pub const LABEL: Column = Column::new("label", ColumnType::Text, false);
    pub const WEIGHT: Column = Column::new("weight", ColumnType::Real, false);
}

impl EntityColumn for TagColumn {
    fn column(&self) -> Column {
        match self {
            TagColumn::Id => Column::id("id", ColumnType::Integer),
            TagColumn::Label => Self::LABEL,
            TagColumn::Weight => Self::WEIGHT,
        }
    }
    fn all() -> &'static [Self] {
        &[TagColumn::Id, TagColumn::Label, TagColumn::Weight]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tag {
    pub id: Option<i64>,
    pub label: String,
    pub weight: f64,
}

impl Tag {
    pub fn new(label: &str, weight: f64) -> Self {
        Self {
            id: None,
            label: label.to_string(),
            weight,
        }
    }
}

impl Entity for Tag {
    type Key = TagColumn;

    fn entity_name(&self) -> &str {
        "Tag"
    }
    fn entity_columns(&self) -> ColumnMap<TagColumn> {
        ColumnMap::from_keys()
    }
    fn id(&self) -> String {
        self.id.map(|id| id.to_string()).unwrap_or_default()
    }
}

pub struct TagMapper;

impl SqlMapper<Tag> for TagMapper {
    fn sample(&self) -> Tag {
        Tag::default()
    }
    fn fill_insert_statement(&self, statement: &mut dyn Statement, tag: &Tag) -> Result<()> {
        statement.set_parameter(1, Value::Text(tag.label.clone()))?;
        statement.set_parameter(2, Value::Real(tag.weight))
    }
    fn fill_update_statement(&self, statement: &mut dyn Statement, tag: &Tag) -> Result<()> {
        self.fill_insert_statement(statement, tag)?;
        statement.set_parameter(3, tag.id.map(Value::Integer).unwrap_or(Value::Null))
    }
    fn create_entity_from_result(&self, row: &ResultRow) -> Result<Tag> {
        Ok(Tag {
            id: Some(row.get("id")?),
            label: row.get("label")?,
            weight: row.get("weight")?,
        })
    }
}

// ------------- Visit -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitColumn {
    Id,
    At,
}

impl VisitColumn {
    pub const AT: Column = Column::new("at", ColumnType::Timestamp, false);
}

impl EntityColumn for VisitColumn {
    fn column(&self) -> Column {
        match self {
            VisitColumn::Id => Column::id("id", ColumnType::Integer),
            VisitColumn::At => Self::AT,
        }
    }
    fn all() -> &'static [Self] {
        &[VisitColumn::Id, VisitColumn::At]
    }
}

/// Timestamps kept in their text form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Visit {
    pub id: Option<i64>,
    pub at: String,
}

impl Visit {
    pub fn new(at: &str) -> Self {
        Self {
            id: None,
            at: at.to_string(),
        }
    }
}

impl Entity for Visit {
    type Key = VisitColumn;

    fn entity_name(&self) -> &str {
        "Visit"
    }
    fn entity_columns(&self) -> ColumnMap<VisitColumn> {
        ColumnMap::from_keys()
    }
    fn id(&self) -> String {
        self.id.map(|id| id.to_string()).unwrap_or_default()
    }
}

pub struct VisitMapper;

impl SqlMapper<Visit> for VisitMapper {
    fn sample(&self) -> Visit {
        Visit::default()
    }
    fn fill_insert_statement(&self, statement: &mut dyn Statement, visit: &Visit) -> Result<()> {
        statement.set_parameter(1, Value::Text(visit.at.clone()))
    }
    fn fill_update_statement(&self, statement: &mut dyn Statement, visit: &Visit) -> Result<()> {
        statement.set_parameter(1, Value::Text(visit.at.clone()))?;
        statement.set_parameter(2, visit.id.map(Value::Integer).unwrap_or(Value::Null))
    }
    fn create_entity_from_result(&self, row: &ResultRow) -> Result<Visit> {
        Ok(Visit {
            id: Some(row.get("id")?),
            at: row.get("at")?,
        })
    }
}

// ------------- Misconfigured entities -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrphanColumn {
    Label,
    Size,
}

impl EntityColumn for OrphanColumn {
    fn column(&self) -> Column {
        match self {
            OrphanColumn::Label => Column::new("label", ColumnType::Text, false),
            OrphanColumn::Size => Column::new("size", ColumnType::Integer, false),
        }
    }
    fn all() -> &'static [Self] {
        &[OrphanColumn::Label, OrphanColumn::Size]
    }
}

/// Declares no identifying column.
#[derive(Debug, Clone, Default)]
pub struct Orphan;

impl Entity for Orphan {
    type Key = OrphanColumn;

    fn entity_name(&self) -> &str {
        "Orphan"
    }
    fn entity_columns(&self) -> ColumnMap<OrphanColumn> {
        ColumnMap::from_keys()
    }
    fn id(&self) -> String {
        String::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LonelyColumn {
    Id,
}

impl EntityColumn for LonelyColumn {
    fn column(&self) -> Column {
        Column::id("id", ColumnType::Integer)
    }
    fn all() -> &'static [Self] {
        &[LonelyColumn::Id]
    }
}

/// Only an identifying column, nothing to insert.
#[derive(Debug, Clone, Default)]
pub struct Lonely;

impl Entity for Lonely {
    type Key = LonelyColumn;

    fn entity_name(&self) -> &str {
        "Lonely"
    }
    fn entity_columns(&self) -> ColumnMap<LonelyColumn> {
        ColumnMap::from_keys()
    }
    fn id(&self) -> String {
        "1".to_string()
    }
}

// ------------- SQLite helpers -------------
pub fn memory_connection() -> SqliteConnection {
    let connection = SqliteConnection::open_in_memory().expect("in-memory database");
    connection.execute_batch(SCHEMA).expect("schema");
    connection
}

pub fn dummy_dao(connection: &SqliteConnection) -> SqlDao<Dummy, DummyMapper, SqliteConnection> {
    SqlDao::new(connection, DummyMapper).expect("dummy dao")
}

pub fn seed(dao: &mut SqlDao<Dummy, DummyMapper, SqliteConnection>, names: &[&str]) {
    use sqldao::dao::Dao;
    for name in names {
        dao.create(Some(&Dummy::new(name))).expect("seeded row");
    }
}

// ------------- Mock connection -------------
/// Shared record of what happened to the statements of a [`MockConnection`].
#[derive(Debug, Default)]
pub struct Ledger {
    pub prepared: Vec<String>,
    pub closes: HashMap<String, usize>,
    pub executions: usize,
    /// Parameters bound at each execution, in order.
    pub executed: Vec<Vec<Value>>,
    pub bindings: usize,
    pub fail_prepare_containing: Option<String>,
    pub fail_close_containing: Option<String>,
}

impl Ledger {
    pub fn close_count(&self, sql: &str) -> usize {
        self.closes.get(sql).copied().unwrap_or(0)
    }
    pub fn total_closes(&self) -> usize {
        self.closes.values().sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockConnection {
    pub ledger: Rc<RefCell<Ledger>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn failing_prepare(fragment: &str) -> Self {
        let connection = Self::new();
        connection.ledger.borrow_mut().fail_prepare_containing = Some(fragment.to_string());
        connection
    }
    pub fn failing_close(fragment: &str) -> Self {
        let connection = Self::new();
        connection.ledger.borrow_mut().fail_close_containing = Some(fragment.to_string());
        connection
    }
}

impl Connection for MockConnection {
    type Statement = MockStatement;

    fn prepare(&self, sql: &str) -> Result<MockStatement> {
        let mut ledger = self.ledger.borrow_mut();
        if let Some(fragment) = &ledger.fail_prepare_containing {
            if sql.contains(fragment.as_str()) {
                return Err(DaoError::Persistence(format!("cannot prepare {}", sql)));
            }
        }
        ledger.prepared.push(sql.to_string());
        Ok(MockStatement {
            sql: sql.to_string(),
            ledger: Rc::clone(&self.ledger),
            parameters: Vec::new(),
            closed: false,
        })
    }
}

#[derive(Debug)]
pub struct MockStatement {
    sql: String,
    ledger: Rc<RefCell<Ledger>>,
    parameters: Vec<Value>,
    closed: bool,
}

impl Statement for MockStatement {
    fn sql(&self) -> &str {
        &self.sql
    }
    fn set_parameter(&mut self, index: usize, value: Value) -> Result<()> {
        self.ledger.borrow_mut().bindings += 1;
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
        let mut ledger = self.ledger.borrow_mut();
        ledger.executions += 1;
        ledger.executed.push(self.parameters.clone());
        Ok(1)
    }
    fn execute_query(&mut self) -> Result<Vec<ResultRow>> {
        let mut ledger = self.ledger.borrow_mut();
        ledger.executions += 1;
        ledger.executed.push(self.parameters.clone());
        Ok(Vec::new())
    }
    fn generated_key(&self) -> Option<i64> {
        None
    }
    fn close(&mut self) -> Result<()> {
        let mut ledger = self.ledger.borrow_mut();
        *ledger.closes.entry(self.sql.clone()).or_insert(0) += 1;
        self.closed = true;
        match &ledger.fail_close_containing {
            Some(fragment) if self.sql.contains(fragment.as_str()) => {
                Err(DaoError::Persistence(format!("cannot close {}", self.sql)))
            }
            _ => Ok(()),
        }
    }
    fn is_closed(&self) -> bool {
        self.closed
    }
}
