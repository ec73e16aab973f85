// used for column names that are usually compile time constants
use std::borrow::Cow;
// used to print out readable forms of a column
use std::fmt;
// used to indicate that column keys need to be hashable
use std::hash::Hash;

// values are exchanged with the driver in their owned form
use rusqlite::types::Value;

use crate::error::{DaoError, Result};

// ------------- ColumnType -------------
/// Identifies the kind of value a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Boolean,
    Date,
    Timestamp,
    Blob,
}

impl ColumnType {
    /// Only plain text columns are matched by prefix with `LIKE`, dates and
    /// timestamps are compared exactly like every other type.
    pub fn is_textual(&self) -> bool {
        matches!(self, ColumnType::Text)
    }
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Real | ColumnType::Boolean)
    }
    /// Converts the text form of a value into something bindable for this type.
    /// Numbers that fail to parse are passed on as text and left to the database.
    pub fn parse_value(&self, text: &str) -> Value {
        match self {
            ColumnType::Integer => text
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(text.to_string())),
            ColumnType::Real => text
                .trim()
                .parse::<f64>()
                .map(Value::Real)
                .unwrap_or_else(|_| Value::Text(text.to_string())),
            ColumnType::Boolean => match text.trim() {
                "true" | "1" => Value::Integer(1),
                "false" | "0" => Value::Integer(0),
                _ => Value::Text(text.to_string()),
            },
            ColumnType::Blob => Value::Blob(text.as_bytes().to_vec()),
            ColumnType::Text | ColumnType::Date | ColumnType::Timestamp => {
                Value::Text(text.to_string())
            }
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::Real => "real",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Blob => "blob",
        };
        write!(f, "{}", name)
    }
}

// ------------- Column -------------
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    column_type: ColumnType,
    name: Cow<'static, str>,
    is_id: bool,
}

impl Column {
    pub const fn new(name: &'static str, column_type: ColumnType, is_id: bool) -> Self {
        assert!(!name.is_empty(), "column names cannot be empty");
        Self {
            column_type,
            name: Cow::Borrowed(name),
            is_id,
        }
    }
    pub const fn id(name: &'static str, column_type: ColumnType) -> Self {
        Self::new(name, column_type, true)
    }
    /// Column named at runtime, empty names are a configuration error.
    pub fn owned(name: String, column_type: ColumnType, is_id: bool) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(DaoError::Configuration(
                "column names cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            column_type,
            name: Cow::Owned(name),
            is_id,
        })
    }
    // Only getters are exposed, which keeps columns immutable after creation.
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn is_id(&self) -> bool {
        self.is_id
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.column_type)?;
        if self.is_id {
            write!(f, " (id)")?;
        }
        Ok(())
    }
}

// ------------- EntityColumn -------------
/// A domain specific key naming one persisted attribute of an entity,
/// typically a fieldless enum with one variant per column.
pub trait EntityColumn: Copy + Eq + Hash + fmt::Debug + 'static {
    fn column(&self) -> Column;
    /// Every key in declaration order.
    fn all() -> &'static [Self];
}

// ------------- ColumnMap -------------
/// Ordered mapping from column keys to their descriptors. Declaration order is
/// preserved and drives positional SQL generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap<K> {
    entries: Vec<(K, Column)>,
}

impl<K: EntityColumn> ColumnMap<K> {
    pub fn from_keys() -> Self {
        Self {
            entries: K::all().iter().map(|key| (*key, key.column())).collect(),
        }
    }
}

impl<K: PartialEq> ColumnMap<K> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }
    /// Adds a column, replacing the descriptor in place if the key is known.
    pub fn insert(&mut self, key: K, column: Column) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = column,
            None => self.entries.push((key, column)),
        }
    }
    pub fn get(&self, key: &K) -> Option<&Column> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Column)> {
        self.entries.iter().map(|(k, c)| (k, c))
    }
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.entries.iter().map(|(_, c)| c)
    }
    pub fn id_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns().filter(|c| c.is_id())
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: PartialEq> Default for ColumnMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq> FromIterator<(K, Column)> for ColumnMap<K> {
    fn from_iter<I: IntoIterator<Item = (K, Column)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, column) in iter {
            map.insert(key, column);
        }
        map
    }
}
