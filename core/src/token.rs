//! The two kinds of step a command path is made of.
//!
//! A [`Token`] is either a fixed keyword ([`Token::Literal`]) or a typed
//! argument ([`Token::Argument`]). Tokens are identified by kind and name
//! alone: two syntaxes that both start with `Token::literal("list")` share
//! the same first step, whatever else they declare.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::context::{ArgValue, CommandContext};
use crate::error::ParseError;
use crate::reader::StringReader;

/// Parses raw input into a typed value.
///
/// Implementations consume exactly the characters that make up the value
/// and leave the reader positioned after them.
pub trait ArgumentParser: Send + Sync {
    fn parse(&self, reader: &mut StringReader<'_>) -> Result<ArgValue, ParseError>;

    /// Candidate values offered for completion when the argument has no
    /// custom suggester.
    fn suggestions(&self) -> Vec<String> {
        Vec::new()
    }

    /// Short type name used when rendering trees.
    fn type_name(&self) -> String;
}

/// Produces completion candidates for a partially typed argument.
pub trait Suggester: Send + Sync {
    fn suggest(&self, partial: &str, context: &CommandContext) -> Vec<String>;
}

impl<F> Suggester for F
where
    F: Fn(&str, &CommandContext) -> Vec<String> + Send + Sync,
{
    fn suggest(&self, partial: &str, context: &CommandContext) -> Vec<String> {
        self(partial, context)
    }
}

/// Kind discriminant of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Literal,
    Argument,
}

/// A typed argument step: name, parser and optional suggester.
#[derive(Clone)]
pub struct ArgumentToken {
    name: String,
    parser: Arc<dyn ArgumentParser>,
    suggester: Option<Arc<dyn Suggester>>,
}

impl ArgumentToken {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parser(&self) -> &dyn ArgumentParser {
        self.parser.as_ref()
    }

    pub fn has_suggester(&self) -> bool {
        self.suggester.is_some()
    }

    pub fn parse(&self, reader: &mut StringReader<'_>) -> Result<ArgValue, ParseError> {
        self.parser.parse(reader)
    }

    /// Completion candidates for `partial`.
    ///
    /// A custom suggester sees the raw partial text and decides filtering
    /// itself; parser defaults are filtered by prefix.
    pub fn suggest(&self, partial: &str, context: &CommandContext) -> Vec<String> {
        match &self.suggester {
            Some(suggester) => suggester.suggest(partial, context),
            None => {
                let lower = partial.to_lowercase();
                self.parser
                    .suggestions()
                    .into_iter()
                    .filter(|s| s.to_lowercase().starts_with(&lower))
                    .collect()
            }
        }
    }
}

/// A single matchable step in a command path.
///
/// # Examples
///
/// ```
/// use command_tree_core::{Token, arguments};
///
/// let a = Token::literal("list");
/// let b = Token::literal("list");
/// assert_eq!(a, b);
///
/// // Same name, different kind: different steps.
/// let arg = Token::argument("list", arguments::word());
/// assert_ne!(a, arg);
///
/// // Arguments compare by name only; the parser is not part of identity.
/// assert_eq!(
///     Token::argument("amount", arguments::integer()),
///     Token::argument("amount", arguments::float()),
/// );
/// ```
#[derive(Clone)]
pub enum Token {
    Literal(String),
    Argument(ArgumentToken),
}

impl Token {
    pub fn literal(name: impl Into<String>) -> Self {
        Self::Literal(name.into())
    }

    pub fn argument(name: impl Into<String>, parser: impl ArgumentParser + 'static) -> Self {
        Self::Argument(ArgumentToken {
            name: name.into(),
            parser: Arc::new(parser),
            suggester: None,
        })
    }

    /// An argument with a custom completion source.
    pub fn argument_with_suggester(
        name: impl Into<String>,
        parser: impl ArgumentParser + 'static,
        suggester: impl Suggester + 'static,
    ) -> Self {
        Self::Argument(ArgumentToken {
            name: name.into(),
            parser: Arc::new(parser),
            suggester: Some(Arc::new(suggester)),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Literal(name) => name,
            Self::Argument(arg) => &arg.name,
        }
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Self::Literal(_) => TokenKind::Literal,
            Self::Argument(_) => TokenKind::Argument,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    pub fn as_argument(&self) -> Option<&ArgumentToken> {
        match self {
            Self::Argument(arg) => Some(arg),
            Self::Literal(_) => None,
        }
    }

    /// Usage form: `name` for literals, `<name>` for arguments.
    pub fn usage(&self) -> String {
        match self {
            Self::Literal(name) => name.clone(),
            Self::Argument(arg) => format!("<{}>", arg.name),
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.name() == other.name()
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.name().hash(state);
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(name) => write!(f, "Literal({name})"),
            Self::Argument(arg) => write!(f, "Argument({}: {})", arg.name, arg.parser.type_name()),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.usage())
    }
}
