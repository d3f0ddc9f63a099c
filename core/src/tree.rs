//! Merging declarations into one dispatch tree.
//!
//! [`build`] folds every syntax of a command into a tree keyed by token
//! equality, so syntaxes that share a prefix share the nodes for it. The
//! algorithm works on mutable [`ConversionNode`]s and then freezes them
//! into immutable [`Node`]s:
//!
//! 1. The root is the command's own literal, with the execution of its
//!    zero-token syntax or default handler.
//! 2. Each syntax walks its tokens from the root, reusing existing children
//!    and creating missing ones in first-insertion order. The node where a
//!    syntax ends receives that syntax's execution, unless an earlier
//!    syntax already ended there.
//! 3. Each sub-command is built recursively and inserted under its name,
//!    replacing any syntax-derived node with the same literal in place.
//!
//! # Example
//!
//! ```
//! use command_tree_core::{CommandContext, CommandDeclaration, Syntax, Token, arguments};
//!
//! let noop = |_: &CommandContext| {};
//! let home = CommandDeclaration::builder("home")
//!     .syntax(Syntax::new(noop, vec![Token::literal("set"), Token::argument("name", arguments::word())]))
//!     .syntax(Syntax::new(noop, vec![Token::literal("set")]))
//!     .syntax(Syntax::new(noop, vec![Token::literal("delete"), Token::argument("name", arguments::word())]))
//!     .build()
//!     .unwrap();
//!
//! let root = home.build();
//! let names: Vec<_> = root.children().iter().map(|n| n.token().name()).collect();
//! assert_eq!(names, ["set", "delete"]);
//! assert_eq!(root.terminal_paths(), vec!["home set", "home set <name>", "home delete <name>"]);
//! ```

use tracing::{debug, warn};

use crate::caller::CallerIdentity;
use crate::condition::Condition;
use crate::declaration::CommandDeclaration;
use crate::execution::{self, Execution};
use crate::token::Token;

/// Build-time node: mutable, children kept in first-insertion order.
#[derive(Debug)]
pub struct ConversionNode {
    token: Token,
    execution: Option<Execution>,
    next: Vec<ConversionNode>,
}

impl ConversionNode {
    fn new(token: Token, execution: Option<Execution>) -> Self {
        Self {
            token,
            execution,
            next: Vec::new(),
        }
    }

    /// Builds the conversion graph of `command`.
    ///
    /// `inherited` is the combined guard of every enclosing command; it is
    /// ANDed into this command's own guard so each execution in the subtree
    /// carries the full chain of restrictions.
    pub fn from_command(command: &CommandDeclaration, inherited: Option<&Condition>) -> Self {
        let guard = match (inherited, command.condition()) {
            (None, None) => None,
            (a, b) => Some(Condition::combine(a, b)),
        };

        let mut root = Self::new(
            command.token(),
            execution::resolve_root(command, guard.as_ref()),
        );

        for syntax in command.syntaxes() {
            if syntax.is_empty() {
                continue;
            }

            let mut node = &mut root;
            for token in syntax.tokens() {
                let index = node.child_index_or_insert(token);
                node = &mut node.next[index];
            }

            if node.execution.is_none() {
                node.execution = execution::resolve(
                    guard.as_ref(),
                    command.default_handler(),
                    syntax.condition(),
                    Some(syntax.handler()),
                );
            } else {
                warn!(
                    command = command.name(),
                    path = %render_path(syntax.tokens()),
                    "Duplicate syntax path ignored; the first declaration wins"
                );
            }
        }

        for sub_command in command.sub_commands() {
            let child = Self::from_command(sub_command, guard.as_ref());
            match root.next.iter().position(|n| n.token == child.token) {
                Some(index) => {
                    debug!(
                        command = command.name(),
                        sub_command = sub_command.name(),
                        "Sub-command replaces syntax-derived node"
                    );
                    root.next[index] = child;
                }
                None => root.next.push(child),
            }
        }

        root
    }

    fn child_index_or_insert(&mut self, token: &Token) -> usize {
        match self.next.iter().position(|n| &n.token == token) {
            Some(index) => index,
            None => {
                self.next.push(Self::new(token.clone(), None));
                self.next.len() - 1
            }
        }
    }

    /// Freezes the graph into immutable nodes, preserving child order.
    pub fn into_node(self) -> Node {
        Node {
            token: self.token,
            execution: self.execution,
            children: self.next.into_iter().map(Self::into_node).collect(),
        }
    }
}

/// Immutable dispatch tree node.
///
/// This is what a grammar engine walks: the token to match, the execution
/// to run if input ends here, and the children to try otherwise, in
/// tie-break order.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    token: Token,
    execution: Option<Execution>,
    children: Vec<Node>,
}

impl Node {
    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn execution(&self) -> Option<&Execution> {
        self.execution.as_ref()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Finds a direct child by token name and kind.
    pub fn child(&self, token: &Token) -> Option<&Node> {
        self.children.iter().find(|c| &c.token == token)
    }

    /// Finds a direct literal child by name.
    pub fn literal_child(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|c| c.token.is_literal() && c.token.name() == name)
    }

    /// Whether input ending at this node may run a handler for `caller`.
    pub fn is_invocable(&self, caller: &dyn CallerIdentity) -> bool {
        self.execution.as_ref().is_some_and(|e| e.test(caller))
    }

    /// Whether `caller` can see this node at all.
    ///
    /// A node is visible when the caller may invoke it or may reach some
    /// invocable node below it. Invisible nodes must be treated as absent.
    pub fn is_visible(&self, caller: &dyn CallerIdentity) -> bool {
        self.is_invocable(caller) || self.children.iter().any(|c| c.is_visible(caller))
    }

    /// Total number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Node::node_count).sum::<usize>()
    }

    /// Usage strings of every node carrying an execution, depth first in
    /// child order, ignoring guards.
    pub fn terminal_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_paths(&mut Vec::new(), &mut paths);
        paths
    }

    fn collect_paths(&self, prefix: &mut Vec<String>, out: &mut Vec<String>) {
        prefix.push(self.token.usage());
        if self.execution.is_some() {
            out.push(prefix.join(" "));
        }
        for child in &self.children {
            child.collect_paths(prefix, out);
        }
        prefix.pop();
    }
}

/// Builds the immutable dispatch tree for `command`.
pub fn build(command: &CommandDeclaration) -> Node {
    let node = ConversionNode::from_command(command, None).into_node();
    debug!(
        command = command.name(),
        nodes = node.node_count(),
        "Built command tree"
    );
    node
}

fn render_path(tokens: &[Token]) -> String {
    tokens.iter().map(Token::usage).collect::<Vec<_>>().join(" ")
}
