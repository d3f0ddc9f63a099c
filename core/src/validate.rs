//! Declaration validation.
//!
//! The tree builder accepts any declaration and resolves conflicts
//! deterministically (first syntax wins a path, sub-commands replace
//! literals). Validation reports those conflicts, plus malformed names, so
//! that hosts can reject suspicious declarations before registering them.
//!
//! # Examples
//!
//! ```
//! use command_tree_core::*;
//!
//! let noop = |_: &CommandContext| {};
//! let ok = CommandDeclaration::builder("warp")
//!     .syntax(Syntax::new(noop, vec![Token::literal("list")]))
//!     .build()
//!     .unwrap();
//! assert!(validate_declaration(&ok).is_empty());
//!
//! // Same full path declared twice
//! let dup = CommandDeclaration::builder("warp")
//!     .syntax(Syntax::new(noop, vec![Token::literal("list")]))
//!     .syntax(Syntax::new(noop, vec![Token::literal("list")]))
//!     .build()
//!     .unwrap();
//! let errors = validate_declaration(&dup);
//! assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateSyntax(_))));
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::declaration::CommandDeclaration;
use crate::token::Token;

/// Declaration validation errors.
///
/// Each variant carries the dotted command path (and token path where
/// relevant) of the problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Command name is empty or whitespace-only.
    #[error("command name cannot be empty: {0}")]
    EmptyCommandName(String),
    /// A command name or literal contains whitespace.
    #[error("literal must be a single word: {0}")]
    InvalidLiteral(String),
    /// An argument name is empty or contains whitespace.
    #[error("invalid argument name: {0}")]
    InvalidArgumentName(String),
    /// Two syntaxes declare the same full token path.
    #[error("duplicate syntax path: {0}")]
    DuplicateSyntax(String),
    /// One syntax uses the same argument name twice.
    #[error("duplicate argument name in syntax: {0}")]
    DuplicateArgument(String),
    /// Two sub-commands share a name.
    #[error("duplicate sub-command: {0}")]
    DuplicateSubcommand(String),
    /// A sub-command replaces a literal introduced by a syntax.
    #[error("sub-command shadows syntax literal: {0}")]
    SubcommandShadowsSyntax(String),
}

impl ValidationError {
    /// Whether the problem only flags a supported pattern.
    ///
    /// A sub-command overriding a syntax literal is legal and resolves to
    /// the sub-command, so it is reported but never rejected.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::SubcommandShadowsSyntax(_))
    }
}

/// Validates a declaration and all of its sub-commands.
///
/// Unlike schema loading, validation collects every problem it finds
/// rather than stopping at the first one.
pub fn validate_declaration(command: &CommandDeclaration) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    validate_command(command, "", &mut errors);
    errors
}

fn validate_command(command: &CommandDeclaration, parent: &str, errors: &mut Vec<ValidationError>) {
    let path = if parent.is_empty() {
        command.name().to_string()
    } else {
        format!("{parent}.{}", command.name())
    };

    if command.name().trim().is_empty() {
        errors.push(ValidationError::EmptyCommandName(path.clone()));
    } else if command.name().contains(char::is_whitespace) {
        errors.push(ValidationError::InvalidLiteral(path.clone()));
    }

    let mut seen_paths: HashSet<Vec<Token>> = HashSet::new();
    let mut first_literals: HashSet<&str> = HashSet::new();
    for syntax in command.syntaxes() {
        let rendered = render(&path, syntax.tokens());

        if !seen_paths.insert(syntax.tokens().to_vec()) {
            errors.push(ValidationError::DuplicateSyntax(rendered.clone()));
        }

        let mut argument_names: HashSet<&str> = HashSet::new();
        for token in syntax.tokens() {
            let name = token.name();
            if token.is_literal() {
                if name.is_empty() || name.contains(char::is_whitespace) {
                    errors.push(ValidationError::InvalidLiteral(format!("{path}: {name:?}")));
                }
            } else {
                if name.trim().is_empty() || name.contains(char::is_whitespace) {
                    errors.push(ValidationError::InvalidArgumentName(format!("{path}: {name:?}")));
                }
                if !argument_names.insert(name) {
                    errors.push(ValidationError::DuplicateArgument(format!("{rendered} ({name})")));
                }
            }
        }

        if let Some(first) = syntax.tokens().first().filter(|t| t.is_literal()) {
            first_literals.insert(first.name());
        }
    }

    let mut seen_sub_commands: HashSet<&str> = HashSet::new();
    for sub_command in command.sub_commands() {
        let name = sub_command.name();
        if !seen_sub_commands.insert(name) {
            errors.push(ValidationError::DuplicateSubcommand(format!("{path}.{name}")));
        }
        if first_literals.contains(name) {
            errors.push(ValidationError::SubcommandShadowsSyntax(format!("{path}.{name}")));
        }
        validate_command(sub_command, &path, errors);
    }
}

fn render(path: &str, tokens: &[Token]) -> String {
    let mut rendered = path.replace('.', " ");
    for token in tokens {
        rendered.push(' ');
        rendered.push_str(&token.usage());
    }
    rendered
}
