// used to print out readable forms of a configuration
use std::fmt;
use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

/// Where and how to reach a data source. Equality covers every field, the
/// rendered form never includes the password.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct DataSourceConfiguration {
    url: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    creation_file: Option<PathBuf>,
}

impl DataSourceConfiguration {
    pub fn new(url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            creation_file: None,
        }
    }
    pub fn with_creation_file(mut self, creation_file: impl Into<PathBuf>) -> Self {
        self.creation_file = Some(creation_file.into());
        self
    }
    /// Reads a configuration file, with `DATASOURCE_*` environment variables
    /// taking precedence over its entries.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("DATASOURCE"))
            .build()?;
        Ok(settings.try_deserialize::<Self>()?)
    }
    pub fn url(&self) -> &str {
        &self.url
    }
    pub fn username(&self) -> &str {
        &self.username
    }
    pub fn password(&self) -> &str {
        &self.password
    }
    pub fn creation_file(&self) -> Option<&Path> {
        self.creation_file.as_deref()
    }
}

impl fmt::Display for DataSourceConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.username.is_empty() {
            write!(f, "{}", self.url)?;
        } else {
            write!(f, "{}@{}", self.username, self.url)?;
        }
        if let Some(creation_file) = &self.creation_file {
            write!(f, " (created by {})", creation_file.display())?;
        }
        Ok(())
    }
}
