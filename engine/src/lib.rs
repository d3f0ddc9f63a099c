//! Registration, matching and dispatch for command trees.
//!
//! This crate turns the declarations of `command-tree-core` into a working
//! command system:
//!
//! - [`Registry`]: stores built command trees by name and alias, matches
//!   command lines for a caller and dispatches the winning handler.
//! - [`grammar`]: the reference grammar engine (matching, completion and
//!   usage listing over a single [`Node`](command_tree_core::Node)).
//! - [`WorkerPool`] / [`Invocable`]: fire-and-forget handler execution on a
//!   rayon pool; dispatch always returns [`DispatchStatus::Accepted`].
//! - [`EngineConfig`]: pool size, thread names and strict validation,
//!   loadable from YAML.
//!
//! # Quick start
//!
//! ```
//! use std::sync::Arc;
//!
//! use command_tree_core::*;
//! use command_tree_engine::{EngineConfig, Registry};
//!
//! let mut registry = Registry::new(EngineConfig::default(), |_: &()| {
//!     Arc::new(StaticCaller::console()) as Arc<dyn CallerIdentity>
//! })
//! .unwrap();
//!
//! let manifest = ManifestFile::from_yaml_str(r#"
//! commands:
//!   - name: gift
//!     arguments:
//!       - name: item
//!         type: word
//!     syntaxes:
//!       - tokens: ["<item>"]
//!         handler: give
//!     subcommands:
//!       - name: list
//!         default: list
//! "#).unwrap();
//! let handlers = HandlerTable::new()
//!     .with("give", |_: &CommandContext| {})
//!     .with("list", |_: &CommandContext| {});
//!
//! registry.register_manifest(&manifest, &handlers).unwrap();
//! assert_eq!(registry.usage("gift", &()), vec!["gift <item>", "gift list"]);
//! assert_eq!(registry.suggest("gift l", &()), vec!["list"]);
//! ```

mod config;
mod error;
pub mod grammar;
mod registry;
mod worker;

pub use config::EngineConfig;
pub use error::{DispatchError, EngineError, Result};
pub use grammar::{MatchOutcome, ParsedCommand};
pub use registry::{IdentityProvider, RegisteredCommand, Registry};
pub use worker::{DispatchStatus, Invocable, WorkerPool};
