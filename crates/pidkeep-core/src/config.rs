use crate::error::{PidfileError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// What the host asked for: a pidfile path, or nothing.
///
/// An empty request is not an error, it just means pidfile management is off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PidfileRequest {
    path: Option<PathBuf>,
}

impl PidfileRequest {
    /// Request a pidfile at `path`; an empty path yields an empty request
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Self::none();
        }
        Self { path: Some(path) }
    }

    #[must_use]
    pub fn none() -> Self {
        Self { path: None }
    }

    /// Build a request from an untyped configuration value.
    ///
    /// Only a non-empty string counts as a path. Integers, booleans, tables
    /// and a missing value all turn pidfile management off.
    #[must_use]
    pub fn from_value(value: Option<&toml::Value>) -> Self {
        match value {
            Some(toml::Value::String(path)) => Self::new(path),
            _ => Self::none(),
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// `[pidfile]` section of the configuration file
#[derive(Debug, Default, Deserialize)]
pub struct PidfileSection {
    /// Kept untyped so a wrong type disables the pidfile instead of failing the load
    pub path: Option<toml::Value>,
}

/// On-disk configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pidfile: PidfileSection,
}

impl Config {
    /// Parse configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| PidfileError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| PidfileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    #[must_use]
    pub fn pidfile_request(&self) -> PidfileRequest {
        PidfileRequest::from_value(self.pidfile.path.as_ref())
    }
}
