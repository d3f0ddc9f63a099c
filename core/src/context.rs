//! Parsed argument values and the context handed to handlers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::caller::CallerIdentity;

/// A typed value produced by an argument parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as a float; integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Everything a handler knows about one invocation.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use command_tree_core::{ArgValue, CallerIdentity, CommandContext, StaticCaller};
///
/// let mut ctx = CommandContext::new(Arc::new(StaticCaller::player("Steve")), "gift sword");
/// ctx.set_argument("item", ArgValue::String("sword".into()));
///
/// assert_eq!(ctx.label(), "gift");
/// assert_eq!(ctx.get_str("item"), Some("sword"));
/// assert_eq!(ctx.caller().display_name(), Some("Steve"));
/// ```
#[derive(Clone)]
pub struct CommandContext {
    caller: Arc<dyn CallerIdentity>,
    input: String,
    arguments: HashMap<String, ArgValue>,
}

impl CommandContext {
    pub fn new(caller: Arc<dyn CallerIdentity>, input: impl Into<String>) -> Self {
        Self {
            caller,
            input: input.into(),
            arguments: HashMap::new(),
        }
    }

    pub fn caller(&self) -> &dyn CallerIdentity {
        self.caller.as_ref()
    }

    /// Shared handle to the caller, for handlers that hand it off.
    pub fn caller_arc(&self) -> Arc<dyn CallerIdentity> {
        Arc::clone(&self.caller)
    }

    /// The full raw input that was matched.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The first word of the input: the command name or alias used.
    pub fn label(&self) -> &str {
        self.input.split(' ').next().unwrap_or_default()
    }

    pub fn set_argument(&mut self, name: impl Into<String>, value: ArgValue) {
        self.arguments.insert(name.into(), value);
    }

    pub fn argument(&self, name: &str) -> Option<&ArgValue> {
        self.arguments.get(name)
    }

    pub fn arguments(&self) -> &HashMap<String, ArgValue> {
        &self.arguments
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.argument(name).and_then(ArgValue::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.argument(name).and_then(ArgValue::as_int)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.argument(name).and_then(ArgValue::as_float)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.argument(name).and_then(ArgValue::as_bool)
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("caller", &self.caller.display_name())
            .field("input", &self.input)
            .field("arguments", &self.arguments)
            .finish()
    }
}
