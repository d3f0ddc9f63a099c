//! Guard predicates and command handlers.

use std::fmt;
use std::sync::Arc;

use crate::caller::CallerIdentity;
use crate::context::CommandContext;

type Predicate = Arc<dyn Fn(&dyn CallerIdentity) -> bool + Send + Sync>;

/// A guard over caller identities.
///
/// A condition is a conjunction of predicate parts; the empty condition
/// always passes. Combining two conditions concatenates their parts, so a
/// guard built from the same declaration twice compares equal: equality is
/// pointer identity of every part.
///
/// # Examples
///
/// ```
/// use command_tree_core::{CallerIdentity, Condition, StaticCaller};
///
/// let named = Condition::new(|c: &dyn CallerIdentity| c.display_name().is_some());
/// let op = Condition::new(|c: &dyn CallerIdentity| c.is_privileged());
/// let both = named.and(&op);
///
/// assert!(both.test(&StaticCaller::player("Steve").operator()));
/// assert!(!both.test(&StaticCaller::player("Steve")));
/// assert!(Condition::always().test(&StaticCaller::console()));
/// ```
#[derive(Clone, Default)]
pub struct Condition {
    parts: Vec<Predicate>,
}

impl Condition {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&dyn CallerIdentity) -> bool + Send + Sync + 'static,
    {
        Self {
            parts: vec![Arc::new(predicate)],
        }
    }

    /// The always-true condition.
    pub fn always() -> Self {
        Self::default()
    }

    /// Returns `self AND other`.
    pub fn and(&self, other: &Condition) -> Condition {
        let mut parts = self.parts.clone();
        parts.extend(other.parts.iter().cloned());
        Condition { parts }
    }

    /// ANDs two optional conditions; a missing side counts as always-true.
    pub fn combine(first: Option<&Condition>, second: Option<&Condition>) -> Condition {
        match (first, second) {
            (Some(a), Some(b)) => a.and(b),
            (Some(a), None) => a.clone(),
            (None, Some(b)) => b.clone(),
            (None, None) => Condition::always(),
        }
    }

    pub fn test(&self, caller: &dyn CallerIdentity) -> bool {
        self.parts.iter().all(|part| part(caller))
    }

    pub fn is_always(&self) -> bool {
        self.parts.is_empty()
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.parts.len() == other.parts.len()
            && self
                .parts
                .iter()
                .zip(&other.parts)
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("parts", &self.parts.len())
            .finish()
    }
}

/// A command handler.
///
/// Handlers receive the parsed [`CommandContext`] and report their own
/// failures to the caller; nothing is returned to the dispatcher.
#[derive(Clone)]
pub struct Handler(Arc<dyn Fn(&CommandContext) + Send + Sync>);

impl Handler {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&CommandContext) + Send + Sync + 'static,
    {
        Self(Arc::new(handler))
    }

    pub fn invoke(&self, context: &CommandContext) {
        (self.0)(context)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Arc::as_ptr(&self.0))
    }
}

impl<F> From<F> for Handler
where
    F: Fn(&CommandContext) + Send + Sync + 'static,
{
    fn from(handler: F) -> Self {
        Self::new(handler)
    }
}
