//! Document access configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! read_only: false
//! strict: true
//! warning_level: info
//! ```
//!
//! Every field is optional; missing fields take their default.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::warning::WarningLevel;

/// Settings a [`Document`](crate::Document) hands to its accessors.
///
/// # Examples
///
/// ```
/// use metatree_access::{AccessConfig, WarningLevel};
///
/// let config: AccessConfig = serde_yaml::from_str("read_only: true").unwrap();
/// assert!(config.read_only);
/// assert!(!config.strict);
/// assert_eq!(config.warning_level, WarningLevel::default());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Rejects every mutation with `Unsupported`, and path creation with `NotFound`.
    pub read_only: bool,
    /// Makes view reads propagate decode errors instead of warning.
    pub strict: bool,
    pub warning_level: WarningLevel,
}

impl AccessConfig {
    /// Configuration for a read-only document.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_warning_level(mut self, level: WarningLevel) -> Self {
        self.warning_level = level;
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::AccessError::Io) if the file cannot be read, or
    /// [`Yaml`](crate::AccessError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::AccessError::Io) if the file cannot be written,
    /// or [`Yaml`](crate::AccessError::Yaml) if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
