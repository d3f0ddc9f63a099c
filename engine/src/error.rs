//! Error types for registration and dispatch.

use command_tree_core::{DeclarationError, ParseError, ValidationError};
use thiserror::Error;

/// Why a command line was not dispatched.
///
/// Guard rejections are reported as [`UnknownCommand`](Self::UnknownCommand)
/// so that callers cannot probe for commands they are not allowed to see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No visible command matched the input.
    #[error("Unknown or incomplete command: {0}")]
    UnknownCommand(String),

    /// A visible command matched partially but an argument was malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors raised while configuring an engine or registering commands.
#[derive(Debug, Error)]
pub enum EngineError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The handler thread pool could not be created.
    #[error("failed to create worker pool: {0}")]
    WorkerPool(String),

    /// A manifest could not be turned into declarations.
    #[error("invalid declaration: {0}")]
    Declaration(#[from] DeclarationError),

    /// Strict mode rejected a declaration.
    #[error("command {command} failed validation with {} error(s)", .errors.len())]
    InvalidDeclaration {
        command: String,
        errors: Vec<ValidationError>,
    },
}

/// Convenience alias for results with [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;
