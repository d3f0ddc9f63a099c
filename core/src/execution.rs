//! Per-node execution resolution.
//!
//! Every node of a dispatch tree that can terminate a command carries an
//! [`Execution`]: the guard a caller must pass and the handler that runs
//! when input ends at that node. Resolution happens once, at build time.

use crate::condition::{Condition, Handler};
use crate::declaration::CommandDeclaration;

/// Resolved guard and handler for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    condition: Condition,
    handler: Handler,
    default_handler: Option<Handler>,
}

impl Execution {
    /// The combined guard for this node.
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// The handler that runs when input ends at this node.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// The enclosing command's default handler, if it has one.
    pub fn default_handler(&self) -> Option<&Handler> {
        self.default_handler.as_ref()
    }

    pub fn test(&self, caller: &dyn crate::CallerIdentity) -> bool {
        self.condition.test(caller)
    }
}

/// Combines guards and picks the winning handler.
///
/// The guard is `command_guard AND syntax_guard`, where a missing guard is
/// always-true. The syntax handler wins over the command's default
/// handler; with neither there is nothing to run and no execution.
///
/// # Examples
///
/// ```
/// use command_tree_core::{CommandContext, Handler, resolve};
///
/// let default = Handler::new(|_: &CommandContext| {});
/// let specific = Handler::new(|_: &CommandContext| {});
///
/// let exec = resolve(None, Some(&default), None, Some(&specific)).unwrap();
/// assert_eq!(exec.handler(), &specific);
/// assert_eq!(exec.default_handler(), Some(&default));
///
/// let exec = resolve(None, Some(&default), None, None).unwrap();
/// assert_eq!(exec.handler(), &default);
///
/// assert!(resolve(None, None, None, None).is_none());
/// ```
pub fn resolve(
    command_guard: Option<&Condition>,
    command_default: Option<&Handler>,
    syntax_guard: Option<&Condition>,
    syntax_handler: Option<&Handler>,
) -> Option<Execution> {
    let handler = syntax_handler.or(command_default)?.clone();
    Some(Execution {
        condition: Condition::combine(command_guard, syntax_guard),
        handler,
        default_handler: command_default.cloned(),
    })
}

/// Resolves the execution of a command's own root node.
///
/// The first zero-token syntax acts as the default syntax: its guard and
/// handler take priority over the declaration's default handler.
pub fn resolve_root(
    command: &CommandDeclaration,
    command_guard: Option<&Condition>,
) -> Option<Execution> {
    let root_syntax = command.root_syntax();
    resolve(
        command_guard,
        command.default_handler(),
        root_syntax.and_then(|s| s.condition()),
        root_syntax.map(|s| s.handler()),
    )
}
