//! Command declarations and the dispatch trees built from them.
//!
//! This crate models commands the way a host declares them and folds those
//! declarations into trees a grammar engine can walk:
//!
//! - [`Token`]: one step of a command path, a literal keyword or a typed
//!   argument (see [`arguments`] for the built-in parsers).
//! - [`Syntax`]: a token sequence with an optional guard and a handler.
//! - [`CommandDeclaration`]: name, aliases, permissions, scope, default
//!   handler, syntaxes and nested sub-commands, built with
//!   [`CommandBuilder`] or unpacked from a [`ManifestFile`].
//! - [`Node`]: the merged, immutable dispatch tree. Syntaxes sharing a
//!   prefix share nodes, and every terminal node carries an
//!   [`Execution`] (combined guard plus handler).
//!
//! Guards are evaluated against a [`CallerIdentity`], which each host
//! implements for its own users. [`StaticCaller`] is a data-backed
//! implementation for tools and tests.
//!
//! Validation ([`validate_declaration`]) reports conflicts the tree builder
//! would otherwise resolve silently, such as duplicate paths and
//! sub-commands shadowing syntax literals.
//!
//! # Example
//!
//! ```
//! use command_tree_core::*;
//!
//! let gift = CommandDeclaration::builder("gift")
//!     .permission(Permission::default_true("gift.use"))
//!     .argument(Token::argument("item", arguments::word()))
//!     .argument(Token::argument("amount", arguments::integer_between(1, 64)))
//!     .execute(|_: &CommandContext| {}, &["item"])
//!     .execute(|_: &CommandContext| {}, &["item", "amount"])
//!     .build()
//!     .unwrap();
//!
//! assert!(validate_declaration(&gift).is_empty());
//!
//! let root = gift.build();
//! assert_eq!(root.terminal_paths(), vec!["gift <item>", "gift <item> <amount>"]);
//! assert!(root.is_visible(&StaticCaller::player("Steve")));
//! ```

pub mod arguments;
mod caller;
mod condition;
mod context;
mod declaration;
mod error;
mod execution;
mod manifest;
mod reader;
mod token;
mod tree;
mod validate;

pub use caller::{CallerIdentity, ExecutionScope, Permission, PermissionDefault, StaticCaller};
pub use condition::{Condition, Handler};
pub use context::{ArgValue, CommandContext};
pub use declaration::{CommandBuilder, CommandDeclaration, Syntax};
pub use error::{DeclarationError, ParseError, Result};
pub use execution::{Execution, resolve, resolve_root};
pub use manifest::{
    ArgumentManifest, ArgumentType, CommandManifest, HandlerTable, ManifestFile, SyntaxManifest,
};
pub use reader::{ARGUMENT_SEPARATOR, StringReader};
pub use token::{ArgumentParser, ArgumentToken, Suggester, Token, TokenKind};
pub use tree::{ConversionNode, Node, build};
pub use validate::{ValidationError, validate_declaration};
