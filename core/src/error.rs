//! Error types for command declaration and argument parsing.

use thiserror::Error;

use crate::reader::StringReader;

/// Number of characters of input shown before the cursor in error context.
const CONTEXT_AMOUNT: usize = 10;

/// A failure to parse user input against an argument token.
///
/// Carries the raw message, the cursor offset where parsing stopped, and
/// the input so that [`context`](ParseError::context) can render the
/// surrounding text for the user.
///
/// # Examples
///
/// ```
/// use command_tree_core::{ParseError, StringReader};
///
/// let reader = StringReader::at("teleport 10 abc", 12);
/// let err = ParseError::new("Expected integer", &reader);
/// assert_eq!(err.cursor(), 12);
/// assert_eq!(err.context(), "...leport 10 <--[HERE]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {cursor}: {}", self.context())]
pub struct ParseError {
    message: String,
    cursor: usize,
    input: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, reader: &StringReader<'_>) -> Self {
        Self {
            message: message.into(),
            cursor: reader.cursor(),
            input: reader.input().to_string(),
        }
    }

    /// The raw message, without position information.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Renders up to ten characters of input before the cursor.
    pub fn context(&self) -> String {
        let cursor = self.cursor.min(self.input.len());
        let before: Vec<char> = self.input[..cursor].chars().collect();
        let mut context = String::new();
        if before.len() > CONTEXT_AMOUNT {
            context.push_str("...");
        }
        let start = before.len().saturating_sub(CONTEXT_AMOUNT);
        context.extend(&before[start..]);
        context.push_str("<--[HERE]");
        context
    }
}

/// Errors raised while declaring commands.
///
/// These fail fast, before any tree is built.
#[derive(Debug, Error)]
pub enum DeclarationError {
    /// Command name is empty or whitespace-only.
    #[error("command name cannot be empty")]
    EmptyCommandName,

    /// A syntax referenced an argument that was never declared.
    #[error("argument {0} not found")]
    UnknownArgument(String),

    /// A manifest referenced a handler id missing from the handler table.
    #[error("handler {0} not found")]
    UnknownHandler(String),

    /// A manifest token could not be interpreted.
    #[error("invalid token `{0}`")]
    InvalidToken(String),

    /// A manifest argument definition is inconsistent (e.g. empty choices).
    #[error("invalid argument definition `{name}`: {reason}")]
    InvalidArgument { name: String, reason: String },

    /// File I/O failure while loading a manifest.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`DeclarationError`].
pub type Result<T> = std::result::Result<T, DeclarationError>;
