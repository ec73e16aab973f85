use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaoError {
    #[error("Entity {entity} declares no identifying column")]
    NoId { entity: String },
    #[error("Could not instantiate DAO factory '{type_name}': {reason}")]
    DaoInstantiation { type_name: String, reason: String },
    #[error("Config error: {0}")]
    Configuration(String),
    #[error("Creation file missing: {}", .0.display())]
    MissingCreationFile(PathBuf),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Could not map a row to {entity}: {reason}")]
    Mapping { entity: String, reason: String },
    #[error("Statement already closed: {0}")]
    StatementClosed(String),
    #[error("Parameter index {index} is out of range (indexes start at 1)")]
    UnknownParameter { index: usize },
    #[error("{failures} release failure(s), first: {source}")]
    Close {
        failures: usize,
        #[source]
        source: Box<DaoError>,
    },
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, DaoError>;

impl DaoError {
    /// Folds the outcome of releasing several resources into one result,
    /// keeping the first failure and counting the rest.
    pub fn aggregate<I>(outcomes: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<()>>,
    {
        let mut failures = 0;
        let mut first = None;
        for outcome in outcomes {
            if let Err(e) = outcome {
                failures += 1;
                first.get_or_insert(e);
            }
        }
        match first {
            None => Ok(()),
            Some(source) => Err(DaoError::Close {
                failures,
                source: Box::new(source),
            }),
        }
    }
}

// Helper conversions
impl From<rusqlite::Error> for DaoError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}
impl From<::config::ConfigError> for DaoError {
    fn from(e: ::config::ConfigError) -> Self { Self::Configuration(e.to_string()) }
}
