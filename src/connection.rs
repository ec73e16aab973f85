//! The seam between DAOs and an actual database.
//!
//! A [`Connection`] prepares [`Statement`]s, which are bound positionally,
//! executed any number of times and released exactly once through
//! [`Statement::close`]. Query results are handed back as owned
//! [`ResultRow`]s that can be read by column label.

// used to share the column labels between all rows of one result
use std::rc::Rc;

use rusqlite::types::{FromSql, ValueRef};
pub use rusqlite::types::Value;

use crate::error::{DaoError, Result};

pub trait Connection {
    type Statement: Statement;

    fn prepare(&self, sql: &str) -> Result<Self::Statement>;
}

pub trait Statement {
    fn sql(&self) -> &str;
    /// Binds `value` to the placeholder at `index`, counting from 1.
    fn set_parameter(&mut self, index: usize, value: Value) -> Result<()>;
    fn clear_parameters(&mut self);
    /// Values currently bound, by position.
    fn parameters(&self) -> &[Value];
    /// Executes a data changing statement, returning the number of affected rows.
    fn execute_update(&mut self) -> Result<usize>;
    fn execute_query(&mut self) -> Result<Vec<ResultRow>>;
    /// Row id generated by the last insert executed through this statement.
    fn generated_key(&self) -> Option<i64>;
    fn close(&mut self) -> Result<()>;
    fn is_closed(&self) -> bool;
}

// ------------- ResultRow -------------
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    labels: Rc<[String]>,
    values: Vec<Value>,
}

impl ResultRow {
    pub fn new(labels: Rc<[String]>, values: Vec<Value>) -> Self {
        Self { labels, values }
    }
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn value(&self, label: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|l| l.eq_ignore_ascii_case(label))
            .and_then(|i| self.values.get(i))
    }
    /// Reads the value labelled `label`, converted into `T`.
    pub fn get<T: FromSql>(&self, label: &str) -> Result<T> {
        let value = self.value(label).ok_or_else(|| {
            DaoError::Persistence(format!("no column labelled '{}' in result", label))
        })?;
        convert(value, label)
    }
    pub fn get_index<T: FromSql>(&self, index: usize) -> Result<T> {
        let value = self.values.get(index).ok_or_else(|| {
            DaoError::Persistence(format!("no column at index {} in result", index))
        })?;
        convert(value, &index.to_string())
    }
}

fn convert<T: FromSql>(value: &Value, label: &str) -> Result<T> {
    T::column_result(ValueRef::from(value))
        .map_err(|e| DaoError::Persistence(format!("column '{}': {}", label, e)))
}
