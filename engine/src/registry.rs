//! The command registry: builds, stores, resolves and dispatches commands.
//!
//! A [`Registry`] is constructed explicitly and owned by the host; there is
//! no process-wide instance. Host-specific command sources (a player, a
//! console, an RPC session) are mapped to caller identities through an
//! [`IdentityProvider`].

use std::collections::HashMap;
use std::sync::Arc;

use command_tree_core::{
    ARGUMENT_SEPARATOR, CallerIdentity, CommandDeclaration, Handler, HandlerTable, ManifestFile,
    Node, ValidationError, validate_declaration,
};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{DispatchError, EngineError, Result};
use crate::grammar::{self, MatchOutcome};
use crate::worker::{DispatchStatus, Invocable, WorkerPool};

/// Maps a host command source to a caller identity.
pub trait IdentityProvider<S>: Send + Sync {
    fn identify(&self, source: &S) -> Arc<dyn CallerIdentity>;
}

impl<S, F> IdentityProvider<S> for F
where
    F: Fn(&S) -> Arc<dyn CallerIdentity> + Send + Sync,
{
    fn identify(&self, source: &S) -> Arc<dyn CallerIdentity> {
        self(source)
    }
}

/// A registered command and its built tree.
#[derive(Debug, Clone)]
pub struct RegisteredCommand {
    name: String,
    aliases: Vec<String>,
    description: String,
    root: Node,
}

impl RegisteredCommand {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn root(&self) -> &Node {
        &self.root
    }
}

/// Registered commands plus the worker pool that runs their handlers.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, mpsc};
///
/// use command_tree_core::*;
/// use command_tree_engine::{DispatchError, DispatchStatus, EngineConfig, Registry};
///
/// let (tx, rx) = mpsc::channel();
/// let gift = CommandDeclaration::builder("gift")
///     .aliases(["present"])
///     .argument(Token::argument("item", arguments::word()))
///     .execute(move |ctx: &CommandContext| {
///         tx.send(ctx.get_str("item").unwrap_or_default().to_string()).unwrap();
///     }, &["item"])
///     .build()
///     .unwrap();
///
/// let mut registry = Registry::new(EngineConfig::default(), |name: &String| {
///     Arc::new(StaticCaller::player(name)) as Arc<dyn CallerIdentity>
/// })
/// .unwrap();
/// registry.register(&gift).unwrap();
///
/// let steve = "Steve".to_string();
/// assert_eq!(registry.execute("/present sword", &steve), Ok(DispatchStatus::Accepted));
/// assert_eq!(rx.recv().unwrap(), "sword");
///
/// assert!(matches!(
///     registry.execute("/nothing", &steve),
///     Err(DispatchError::UnknownCommand(_))
/// ));
/// ```
pub struct Registry<S> {
    config: EngineConfig,
    identities: Box<dyn IdentityProvider<S>>,
    pool: Arc<WorkerPool>,
    commands: Vec<RegisteredCommand>,
    labels: HashMap<String, usize>,
}

impl<S> Registry<S> {
    /// Creates an empty registry and starts its worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WorkerPool`] if the pool cannot be created.
    pub fn new(config: EngineConfig, identities: impl IdentityProvider<S> + 'static) -> Result<Self> {
        let pool = Arc::new(WorkerPool::new(&config)?);
        Ok(Self {
            config,
            identities: Box::new(identities),
            pool,
            commands: Vec::new(),
            labels: HashMap::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds and stores a command.
    ///
    /// Validation problems are logged, or rejected in strict mode. Warnings
    /// such as a sub-command overriding a syntax literal are only logged. A
    /// command whose name is already taken is skipped; an alias that is
    /// already taken is dropped. The first registration always keeps its
    /// labels.
    ///
    /// Returns `false` when the command was skipped because its name is
    /// taken.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDeclaration`] in strict mode when
    /// validation fails.
    pub fn register(&mut self, command: &CommandDeclaration) -> Result<bool> {
        let (warnings, errors): (Vec<_>, Vec<_>) =
            validate_declaration(command).into_iter().partition(ValidationError::is_warning);
        for warning in &warnings {
            warn!(command = command.name(), %warning, "Declaration warning");
        }
        if !errors.is_empty() {
            if self.config.strict_declarations {
                return Err(EngineError::InvalidDeclaration {
                    command: command.name().to_string(),
                    errors,
                });
            }
            for error in &errors {
                warn!(command = command.name(), %error, "Declaration problem");
            }
        }

        let name = command.name().to_lowercase();
        if self.labels.contains_key(&name) {
            warn!(command = command.name(), "Command name already registered; skipping");
            return Ok(false);
        }

        let index = self.commands.len();
        self.labels.insert(name, index);
        let mut aliases = Vec::new();
        for alias in command.aliases() {
            let label = alias.to_lowercase();
            if self.labels.contains_key(&label) {
                warn!(command = command.name(), alias = %alias, "Alias already registered; dropping");
                continue;
            }
            self.labels.insert(label, index);
            aliases.push(alias.clone());
        }

        let root = command.build();
        info!(command = command.name(), nodes = root.node_count(), "Registered command");
        self.commands.push(RegisteredCommand {
            name: command.name().to_string(),
            aliases,
            description: command.description().to_string(),
            root,
        });
        Ok(true)
    }

    /// Unpacks and registers every command of a manifest.
    ///
    /// Returns the number of commands registered, leaving out those skipped
    /// because their name was taken.
    ///
    /// # Errors
    ///
    /// Fails on the first declaration or validation error; commands before
    /// it stay registered.
    pub fn register_manifest(&mut self, manifest: &ManifestFile, handlers: &HandlerTable) -> Result<usize> {
        let declarations = manifest.into_declarations(handlers)?;
        let mut registered = 0;
        for declaration in &declarations {
            if self.register(declaration)? {
                registered += 1;
            }
        }
        Ok(registered)
    }

    /// Every registered command, in registration order.
    pub fn commands(&self) -> &[RegisteredCommand] {
        &self.commands
    }

    /// Looks up a command by name or alias, case-insensitively.
    pub fn command(&self, label: &str) -> Option<&RegisteredCommand> {
        let label = label.strip_prefix('/').unwrap_or(label);
        self.labels
            .get(&label.to_lowercase())
            .map(|&index| &self.commands[index])
    }

    /// The built tree of a command, by name or alias.
    pub fn root(&self, label: &str) -> Option<&Node> {
        self.command(label).map(RegisteredCommand::root)
    }

    /// Wraps a handler into the registry's worker pool.
    pub fn wrap(&self, handler: Handler) -> Invocable {
        Invocable::wrap(&self.pool, handler)
    }

    /// Parses a command line and dispatches the matched handler.
    ///
    /// A leading `/` is ignored. The handler runs on the worker pool; this
    /// returns as soon as it is submitted.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownCommand`] if no command matches or the
    /// caller may not run it, [`DispatchError::Parse`] for malformed
    /// arguments of a visible command.
    pub fn execute(&self, input: &str, source: &S) -> std::result::Result<DispatchStatus, DispatchError> {
        let input = strip_slash(input);
        let label = first_word(input);
        let Some(command) = self.command(label) else {
            debug!(label, "Unknown command label");
            return Err(DispatchError::UnknownCommand(label.to_string()));
        };

        let caller = self.identities.identify(source);
        match grammar::parse(command.root(), input, caller) {
            MatchOutcome::Matched(parsed) => {
                debug!(command = command.name(), path = %parsed.usage(), "Dispatching command");
                let (execution, context) = parsed.into_parts();
                Ok(self.wrap(execution.handler().clone()).invoke(context))
            }
            MatchOutcome::NoMatch => Err(DispatchError::UnknownCommand(label.to_string())),
            MatchOutcome::ParseError(err) => {
                debug!(command = command.name(), error = %err, "Command failed to parse");
                Err(DispatchError::Parse(err))
            }
        }
    }

    /// Completion candidates for a partially typed command line.
    ///
    /// Without a separator the command label itself is completed from the
    /// names and aliases of commands the caller can see.
    pub fn suggest(&self, input: &str, source: &S) -> Vec<String> {
        let input = strip_slash(input);
        let caller = self.identities.identify(source);

        if !input.contains(ARGUMENT_SEPARATOR) {
            let partial = input.to_lowercase();
            let mut labels = Vec::new();
            for command in &self.commands {
                if !command.root.is_visible(caller.as_ref()) {
                    continue;
                }
                let candidates = std::iter::once(&command.name).chain(command.aliases.iter());
                for label in candidates {
                    if label.to_lowercase().starts_with(&partial) && !labels.contains(label) {
                        labels.push(label.clone());
                    }
                }
            }
            return labels;
        }

        match self.command(first_word(input)) {
            Some(command) => grammar::suggest(command.root(), input, caller),
            None => Vec::new(),
        }
    }

    /// Usage lines of a command the caller may see.
    pub fn usage(&self, label: &str, source: &S) -> Vec<String> {
        match self.command(label) {
            Some(command) => {
                let caller = self.identities.identify(source);
                grammar::all_usage(command.root(), caller.as_ref())
            }
            None => Vec::new(),
        }
    }
}

impl<S> std::fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("commands", &self.commands.len())
            .field("threads", &self.pool.threads())
            .finish()
    }
}

fn strip_slash(input: &str) -> &str {
    input.strip_prefix('/').unwrap_or(input)
}

fn first_word(input: &str) -> &str {
    input.split(ARGUMENT_SEPARATOR).next().unwrap_or(input)
}

#[cfg(test)]
mod tests {
    use command_tree_core::{
        CommandContext, ExecutionScope, Permission, StaticCaller, Syntax, Token, arguments,
    };

    use super::*;

    fn noop() -> Handler {
        Handler::new(|_: &CommandContext| {})
    }

    fn registry() -> Registry<StaticCaller> {
        Registry::new(EngineConfig::default().with_worker_threads(1), |caller: &StaticCaller| {
            Arc::new(caller.clone()) as Arc<dyn CallerIdentity>
        })
        .unwrap()
    }

    fn command(name: &str, aliases: &[&str]) -> CommandDeclaration {
        CommandDeclaration::builder(name)
            .aliases(aliases.iter().copied())
            .default_handler(noop())
            .build()
            .unwrap()
    }

    #[test]
    fn test_first_registration_keeps_labels() {
        let mut registry = registry();
        assert!(registry.register(&command("home", &["h"])).unwrap());
        assert!(registry.register(&command("help", &["h", "?"])).unwrap());
        assert!(!registry.register(&command("HOME", &[])).unwrap());

        assert_eq!(registry.commands().len(), 2);
        assert_eq!(registry.command("h").unwrap().name(), "home");
        assert_eq!(registry.command("?").unwrap().name(), "help");
        assert_eq!(registry.command("help").unwrap().aliases(), ["?"]);
        assert_eq!(registry.command("/Home").unwrap().name(), "home");
    }

    #[test]
    fn test_strict_mode_rejects_duplicate_paths() {
        let mut registry = Registry::new(EngineConfig::default().strict(), |c: &StaticCaller| {
            Arc::new(c.clone()) as Arc<dyn CallerIdentity>
        })
        .unwrap();
        let dup = CommandDeclaration::builder("warp")
            .syntax(Syntax::new(noop(), vec![Token::literal("list")]))
            .syntax(Syntax::new(noop(), vec![Token::literal("list")]))
            .build()
            .unwrap();

        let err = registry.register(&dup).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDeclaration { ref command, .. } if command == "warp"));
        assert!(registry.commands().is_empty());

        // Lenient mode keeps the first syntax.
        let mut lenient = self::registry();
        lenient.register(&dup).unwrap();
        assert_eq!(lenient.root("warp").unwrap().children().len(), 1);
    }

    #[test]
    fn test_manifest_count_leaves_out_taken_names() {
        let manifest = ManifestFile::from_yaml_str(
            r#"
commands:
  - name: spawn
    default: go
  - name: Spawn
    default: go
  - name: home
    default: go
"#,
        )
        .unwrap();
        let handlers = HandlerTable::new().with("go", noop());

        let mut registry = registry();
        assert_eq!(registry.register_manifest(&manifest, &handlers).unwrap(), 2);
        assert_eq!(registry.commands().len(), 2);
    }

    #[test]
    fn test_strict_mode_allows_sub_command_override() {
        let mut registry = Registry::new(EngineConfig::default().strict(), |c: &StaticCaller| {
            Arc::new(c.clone()) as Arc<dyn CallerIdentity>
        })
        .unwrap();
        let gift = CommandDeclaration::builder("gift")
            .syntax(Syntax::new(noop(), vec![Token::literal("list")]))
            .sub_command(command("list", &[]))
            .build()
            .unwrap();

        assert!(registry.register(&gift).unwrap());
        assert_eq!(
            registry.execute("gift list", &StaticCaller::console()),
            Ok(DispatchStatus::Accepted)
        );
    }

    #[test]
    fn test_guard_rejection_looks_like_unknown_command() {
        let mut registry = registry();
        registry
            .register(
                &CommandDeclaration::builder("ban")
                    .permission(Permission::default_if_op("admin.ban"))
                    .argument(Token::argument("target", arguments::word()))
                    .execute(noop(), &["target"])
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let player = StaticCaller::player("Steve");
        assert_eq!(
            registry.execute("/ban Alex", &player),
            Err(DispatchError::UnknownCommand("ban".into()))
        );
        assert_eq!(
            registry.execute("/ban Alex", &StaticCaller::console()),
            Ok(DispatchStatus::Accepted)
        );
    }

    #[test]
    fn test_parse_errors_are_reported() {
        let mut registry = registry();
        registry
            .register(
                &CommandDeclaration::builder("give")
                    .argument(Token::argument("amount", arguments::integer_between(1, 64)))
                    .execute(noop(), &["amount"])
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let err = registry.execute("give 100", &StaticCaller::console()).unwrap_err();
        match err {
            DispatchError::Parse(err) => assert_eq!(err.message(), "Integer must not be more than 64, found 100"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_suggest_labels_respects_visibility() {
        let mut registry = registry();
        registry.register(&command("spawn", &["sp"])).unwrap();
        registry
            .register(
                &CommandDeclaration::builder("stop")
                    .scope(ExecutionScope::NonInteractive)
                    .default_handler(noop())
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let player = StaticCaller::player("Steve");
        assert_eq!(registry.suggest("/s", &player), vec!["spawn", "sp"]);
        assert_eq!(registry.suggest("s", &StaticCaller::console()), vec!["spawn", "sp", "stop"]);
        assert!(registry.suggest("x", &player).is_empty());
    }

    #[test]
    fn test_usage_for_unknown_command_is_empty() {
        let registry = registry();
        assert!(registry.usage("missing", &StaticCaller::console()).is_empty());
    }
}
