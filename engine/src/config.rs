//! Engine configuration.
//!
//! Controls the dispatch worker pool and how strictly declarations are
//! checked at registration. `worker_threads` sizes the resident workers
//! only; the pool starts extra threads whenever all of them are busy.
//!
//! # Example YAML
//!
//! ```yaml
//! worker_threads: 4
//! thread_name: command-worker
//! strict_declarations: true
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings for a [`Registry`](crate::Registry).
///
/// # Examples
///
/// ```
/// use command_tree_engine::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.worker_threads, 0);
/// assert_eq!(config.thread_name, "command-worker");
/// assert!(!config.strict_declarations);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Resident handler threads, a floor rather than a cap; `0` lets rayon pick.
    pub worker_threads: usize,
    /// Prefix for worker thread names.
    pub thread_name: String,
    /// Reject declarations that fail validation instead of logging them.
    pub strict_declarations: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            thread_name: "command-worker".to_string(),
            strict_declarations: false,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::EngineError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::EngineError::YamlError) if parsing
    /// fails.
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
    /// Returns [`IoError`](crate::EngineError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::EngineError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict_declarations = true;
        self
    }
}
