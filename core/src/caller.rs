//! Caller identity, permissions and execution scope.
//!
//! Each host runtime implements [`CallerIdentity`] for its own user/session
//! type. Everything else in the crate only ever sees this trait, so guards
//! written against it work on every host.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::condition::Condition;

/// The capability set of whoever is issuing a command.
///
/// A missing display name means the caller is a console-like,
/// non-interactive identity.
pub trait CallerIdentity: Send + Sync {
    /// Display name; `None` for consoles and other non-interactive callers.
    fn display_name(&self) -> Option<&str>;

    /// Stable unique id, if the host has one for this caller.
    fn unique_id(&self) -> Option<Uuid>;

    /// Explicit grant (`Some(true)`) or denial (`Some(false)`) recorded for
    /// a permission node, or `None` when nothing is recorded.
    fn permission_grant(&self, node: &str) -> Option<bool>;

    /// Whether the caller is an operator or similarly privileged.
    fn is_privileged(&self) -> bool;

    fn is_interactive(&self) -> bool {
        self.display_name().is_some()
    }

    /// Checks a permission: an explicit grant or denial wins, otherwise the
    /// permission's default policy applies.
    fn check_permission(&self, permission: &Permission) -> bool {
        match self.permission_grant(&permission.node) {
            Some(granted) => granted,
            None => permission
                .default
                .check(self.is_privileged() || !self.is_interactive()),
        }
    }
}

impl fmt::Debug for dyn CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerIdentity")
            .field("display_name", &self.display_name())
            .field("unique_id", &self.unique_id())
            .finish()
    }
}

/// Policy applied when a caller has no explicit grant for a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PermissionDefault {
    /// Allowed for operators and console-like callers.
    IfOp,
    /// Allowed for everyone.
    True,
    /// Denied unless explicitly granted (the default).
    #[default]
    False,
}

impl PermissionDefault {
    pub fn check(self, op: bool) -> bool {
        match self {
            Self::IfOp => op,
            Self::True => true,
            Self::False => false,
        }
    }
}

/// A named permission node plus its default policy.
///
/// # Examples
///
/// ```
/// use command_tree_core::{Permission, PermissionDefault};
///
/// let perm = Permission::default_if_op("admin.ban");
/// assert_eq!(perm.node, "admin.ban");
/// assert_eq!(perm.default, PermissionDefault::IfOp);
///
/// // Plain permissions deny by default.
/// assert_eq!(Permission::new("chat.color").default, PermissionDefault::False);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Permission node, e.g. `"admin.ban"`.
    pub node: String,
    /// Policy when the caller has no explicit grant.
    #[serde(default)]
    pub default: PermissionDefault,
}

impl Permission {
    pub fn new(node: impl Into<String>) -> Self {
        Self::with_default(node, PermissionDefault::False)
    }

    pub fn with_default(node: impl Into<String>, default: PermissionDefault) -> Self {
        Self {
            node: node.into(),
            default,
        }
    }

    pub fn default_if_op(node: impl Into<String>) -> Self {
        Self::with_default(node, PermissionDefault::IfOp)
    }

    pub fn default_true(node: impl Into<String>) -> Self {
        Self::with_default(node, PermissionDefault::True)
    }

    pub fn default_false(node: impl Into<String>) -> Self {
        Self::with_default(node, PermissionDefault::False)
    }

    /// Turns the permission into a guard over caller identities.
    pub fn to_condition(&self) -> Condition {
        let permission = self.clone();
        Condition::new(move |caller: &dyn CallerIdentity| caller.check_permission(&permission))
    }
}

/// Restricts which kind of caller may run a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionScope {
    /// Interactive callers (players, users) only.
    Interactive,
    /// Console-like callers only.
    NonInteractive,
    /// No restriction (the default).
    #[default]
    All,
}

impl ExecutionScope {
    /// Returns the guard for this scope, or `None` when unrestricted.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_tree_core::ExecutionScope;
    ///
    /// assert!(ExecutionScope::All.to_condition().is_none());
    /// assert!(ExecutionScope::Interactive.to_condition().is_some());
    /// ```
    pub fn to_condition(self) -> Option<Condition> {
        match self {
            Self::Interactive => Some(Condition::new(|caller: &dyn CallerIdentity| {
                caller.is_interactive()
            })),
            Self::NonInteractive => Some(Condition::new(|caller: &dyn CallerIdentity| {
                !caller.is_interactive()
            })),
            Self::All => None,
        }
    }
}

/// A caller identity backed by plain data.
///
/// Useful for tests, tools and hosts that resolve everything up front.
///
/// # Examples
///
/// ```
/// use command_tree_core::{CallerIdentity, Permission, StaticCaller};
///
/// let console = StaticCaller::console();
/// assert!(!console.is_interactive());
/// assert!(console.check_permission(&Permission::default_if_op("admin.ban")));
///
/// let player = StaticCaller::player("Steve").with_grant("admin.ban", true);
/// assert!(player.check_permission(&Permission::new("admin.ban")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCaller {
    pub name: Option<String>,
    pub id: Option<Uuid>,
    pub privileged: bool,
    pub grants: Vec<(String, bool)>,
}

impl StaticCaller {
    /// A console-like caller: no name, no id.
    pub fn console() -> Self {
        Self::default()
    }

    /// An interactive, unprivileged caller.
    pub fn player(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn operator(mut self) -> Self {
        self.privileged = true;
        self
    }

    pub fn with_grant(mut self, node: &str, granted: bool) -> Self {
        self.grants.push((node.to_string(), granted));
        self
    }
}

impl CallerIdentity for StaticCaller {
    fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn unique_id(&self) -> Option<Uuid> {
        self.id
    }

    fn permission_grant(&self, node: &str) -> Option<bool> {
        self.grants
            .iter()
            .rev()
            .find(|(n, _)| n == node)
            .map(|(_, granted)| *granted)
    }

    fn is_privileged(&self) -> bool {
        self.privileged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_if_op_permission() {
        let perm = Permission::default_if_op("admin.ban");
        assert!(!StaticCaller::player("alex").check_permission(&perm));
        assert!(StaticCaller::player("alex").operator().check_permission(&perm));
        assert!(StaticCaller::console().check_permission(&perm));
    }

    #[test]
    fn test_explicit_denial_beats_operator() {
        let perm = Permission::default_if_op("admin.ban");
        let caller = StaticCaller::player("alex")
            .operator()
            .with_grant("admin.ban", false);
        assert!(!caller.check_permission(&perm));
    }

    #[test]
    fn test_default_true_and_false() {
        let caller = StaticCaller::player("alex");
        assert!(caller.check_permission(&Permission::default_true("chat")));
        assert!(!caller.check_permission(&Permission::default_false("chat")));
        assert!(!StaticCaller::console().check_permission(&Permission::new("chat")));
    }

    #[test]
    fn test_scope_conditions() {
        let player = StaticCaller::player("alex");
        let console = StaticCaller::console();

        let interactive = ExecutionScope::Interactive.to_condition().unwrap();
        assert!(interactive.test(&player));
        assert!(!interactive.test(&console));

        let non_interactive = ExecutionScope::NonInteractive.to_condition().unwrap();
        assert!(!non_interactive.test(&player));
        assert!(non_interactive.test(&console));
    }

    #[test]
    fn test_permission_deserializes_with_default_policy() {
        let perm: Permission = serde_yaml::from_str("node: gift.use").unwrap();
        assert_eq!(perm, Permission::new("gift.use"));

        let perm: Permission = serde_yaml::from_str("node: gift.use\ndefault: if_op").unwrap();
        assert_eq!(perm.default, PermissionDefault::IfOp);
    }
}
