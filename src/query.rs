//! SQL text generation for entities.
//!
//! Two flavours of every statement exist: *prepared* ones use `?` placeholders
//! and are compiled once per DAO, *literal* ones inline escaped values and are
//! meant for one-off diagnostic queries. Identifiers in column lists of
//! `INSERT` statements are backtick quoted, string literals are single quoted.

// used to key the identifying column cache by entity type
use std::any::TypeId;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use regex::Regex;
use seahash::SeaHasher;

use crate::column::Column;
use crate::entity::Entity;
use crate::error::{DaoError, Result};

pub type TypeHasher = BuildHasherDefault<SeaHasher>;

lazy_static! {
    // literal ids matching this are inlined without quotes
    static ref NUMERIC: Regex = Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").unwrap();
    static ref SHARED: QueryGenerator = QueryGenerator::new();
}

// ------------- IdColumnCache -------------
/// Memo of the identifying column per entity type. Entries are filled on first
/// lookup and never invalidated, since entity schemas are static.
#[derive(Debug, Default)]
pub struct IdColumnCache {
    resolved: RwLock<HashMap<TypeId, Arc<Column>, TypeHasher>>,
}

impl IdColumnCache {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn resolve<E: Entity>(&self, entity: &E) -> Result<Arc<Column>> {
        let key = TypeId::of::<E>();
        {
            let resolved = self
                .resolved
                .read()
                .map_err(|e| DaoError::Lock(e.to_string()))?;
            if let Some(column) = resolved.get(&key) {
                return Ok(Arc::clone(column));
            }
        }
        let columns = entity.entity_columns();
        let mut id_columns = columns.id_columns();
        let column = match (id_columns.next(), id_columns.next()) {
            (Some(column), None) => column.clone(),
            (None, _) => {
                return Err(DaoError::NoId {
                    entity: entity.entity_name().to_string(),
                });
            }
            (Some(_), Some(_)) => {
                return Err(DaoError::Configuration(format!(
                    "{} declares more than one identifying column",
                    entity.entity_name()
                )));
            }
        };
        let mut resolved = self
            .resolved
            .write()
            .map_err(|e| DaoError::Lock(e.to_string()))?;
        // another thread may have won the race, in which case its column is kept
        Ok(Arc::clone(
            resolved.entry(key).or_insert_with(|| Arc::new(column)),
        ))
    }
    pub fn len(&self) -> usize {
        self.resolved.read().map(|r| r.len()).unwrap_or(0)
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ------------- QueryGenerator -------------
#[derive(Debug, Clone, Default)]
pub struct QueryGenerator {
    id_columns: Arc<IdColumnCache>,
}

impl QueryGenerator {
    /// A generator with its own, empty, identifying column cache.
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_cache(id_columns: Arc<IdColumnCache>) -> Self {
        Self { id_columns }
    }
    /// The process wide generator.
    pub fn shared() -> &'static QueryGenerator {
        &SHARED
    }
    pub fn cache(&self) -> &Arc<IdColumnCache> {
        &self.id_columns
    }

    pub fn id_column<E: Entity>(&self, entity: &E) -> Result<Arc<Column>> {
        self.id_columns.resolve(entity)
    }

    /// Escapes `'` as `''` and `"` as `\"`. Only the first rule is idempotent,
    /// escaping twice doubles the backslashes in front of double quotes.
    pub fn escape(text: &str) -> String {
        let mut escaped = String::with_capacity(text.len() + 8);
        for c in text.chars() {
            match c {
                '\'' => escaped.push_str("''"),
                '"' => escaped.push_str("\\\""),
                _ => escaped.push(c),
            }
        }
        escaped
    }

    /// `INSERT INTO <table>(<columns>) VALUES ` without the values themselves.
    pub fn insert<E: Entity>(&self, entity: &E, include_id: bool) -> String {
        let names: Vec<String> = entity
            .entity_columns()
            .columns()
            .filter(|c| include_id || !c.is_id())
            .map(|c| format!("`{}`", c.name()))
            .collect();
        format!(
            "INSERT INTO {}({}) VALUES ",
            entity.entity_name(),
            names.join(",")
        )
    }

    pub fn insert_prepared<E: Entity>(&self, entity: &E) -> Result<String> {
        let columns = entity.entity_columns();
        if columns.len() < 2 {
            return Err(DaoError::Configuration(format!(
                "{} needs at least two columns to be inserted, it declares {}",
                entity.entity_name(),
                columns.len()
            )));
        }
        let placeholders = vec!["?"; columns.columns().filter(|c| !c.is_id()).count()];
        Ok(format!(
            "{}({})",
            self.insert(entity, false),
            placeholders.join(", ")
        ))
    }

    /// `DELETE FROM <table> WHERE <id> = ...`, keyed on a placeholder when
    /// prepared or on the current id of the entity otherwise.
    pub fn delete<E: Entity>(&self, entity: &E, prepared: bool) -> Result<String> {
        let id = self.id_column(entity)?;
        let value = if prepared {
            "?".to_string()
        } else {
            let current = entity.id();
            if NUMERIC.is_match(&current) {
                current
            } else {
                format!("'{}'", Self::escape(&current))
            }
        };
        Ok(format!(
            "DELETE FROM {} WHERE {} = {}",
            entity.entity_name(),
            id.name(),
            value
        ))
    }

    /// `UPDATE <table> SET ` without any assignments.
    pub fn update<E: Entity>(&self, entity: &E) -> String {
        format!("UPDATE {} SET ", entity.entity_name())
    }

    pub fn update_prepared<E: Entity>(&self, entity: &E) -> Result<String> {
        let id = self.id_column(entity)?;
        let assignments: Vec<String> = entity
            .entity_columns()
            .columns()
            .filter(|c| !c.is_id())
            .map(|c| format!("{} = ?", c.name()))
            .collect();
        Ok(format!(
            "{}{}{}",
            self.update(entity),
            assignments.join(", "),
            Self::where_clause(&id, None, false)
        ))
    }

    /// ` WHERE <column> <op> <value>`: the operator is `LIKE` or `=`, the value
    /// a placeholder when absent or an escaped, quoted literal.
    pub fn where_clause(column: &Column, value: Option<&str>, like: bool) -> String {
        let operator = if like { "LIKE" } else { "=" };
        match value {
            None => format!(" WHERE {} {} ?", column.name(), operator),
            Some(v) => format!(" WHERE {} {} '{}'", column.name(), operator, Self::escape(v)),
        }
    }

    pub fn where_id<E: Entity>(&self, entity: &E, value: Option<&str>) -> Result<String> {
        let id = self.id_column(entity)?;
        Ok(Self::where_clause(&id, value, false))
    }

    pub fn where_like(column: &Column, value: Option<&str>) -> String {
        Self::where_clause(column, value, true)
    }

    pub fn search_all<E: Entity>(&self, entity: &E) -> String {
        format!("SELECT * FROM {}", entity.entity_name())
    }

    pub fn find_prepared<E: Entity>(&self, entity: &E) -> Result<String> {
        Ok(format!(
            "{}{}",
            self.search_all(entity),
            self.where_id(entity, None)?
        ))
    }

    /// Lookup by one column, `LIKE` for textual columns and `=` otherwise.
    pub fn search_prepared<E: Entity>(&self, entity: &E, column: &Column) -> String {
        format!(
            "{}{}",
            self.search_all(entity),
            Self::where_clause(column, None, column.column_type().is_textual())
        )
    }
}
