//! Command declarations: syntaxes, guards, handlers and sub-commands.
//!
//! A [`CommandDeclaration`] is assembled once, either with
//! [`CommandBuilder`] or by unpacking a
//! [`CommandManifest`](crate::CommandManifest), and is immutable afterwards.
//! [`CommandDeclaration::build`] derives the dispatch tree from it.

use std::collections::HashMap;

use crate::caller::{ExecutionScope, Permission};
use crate::condition::{Condition, Handler};
use crate::error::{DeclarationError, Result};
use crate::token::Token;
use crate::tree::{self, Node};

/// One independently declared token sequence with its guard and handler.
#[derive(Debug, Clone)]
pub struct Syntax {
    condition: Option<Condition>,
    handler: Handler,
    tokens: Vec<Token>,
}

impl Syntax {
    pub fn new(handler: impl Into<Handler>, tokens: Vec<Token>) -> Self {
        Self {
            condition: None,
            handler: handler.into(),
            tokens,
        }
    }

    pub fn conditional(
        condition: Condition,
        handler: impl Into<Handler>,
        tokens: Vec<Token>,
    ) -> Self {
        Self {
            condition: Some(condition),
            handler: handler.into(),
            tokens,
        }
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Whether this is a zero-token syntax (runs on the bare command).
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A command: metadata, guard, default handler, syntaxes and sub-commands.
///
/// # Examples
///
/// ```
/// use command_tree_core::{CommandDeclaration, Token, arguments};
///
/// let gift = CommandDeclaration::builder("gift")
///     .description("Give an item to yourself")
///     .aliases(["present"])
///     .argument(Token::argument("item", arguments::word()))
///     .execute(|ctx: &command_tree_core::CommandContext| {
///         println!("gifting {:?}", ctx.get_str("item"));
///     }, &["item"])
///     .sub_command(CommandDeclaration::builder("list")
///         .default_handler(|_: &command_tree_core::CommandContext| {})
///         .build()
///         .unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(gift.name(), "gift");
/// assert_eq!(gift.aliases(), ["present"]);
/// assert_eq!(gift.syntaxes().len(), 1);
/// assert_eq!(gift.sub_commands().len(), 1);
///
/// let root = gift.build();
/// assert_eq!(root.children().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CommandDeclaration {
    name: String,
    aliases: Vec<String>,
    description: String,
    permissions: Vec<Permission>,
    scope: ExecutionScope,
    condition: Option<Condition>,
    default_handler: Option<Handler>,
    syntaxes: Vec<Syntax>,
    sub_commands: Vec<CommandDeclaration>,
}

impl CommandDeclaration {
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn scope(&self) -> ExecutionScope {
        self.scope
    }

    /// The top-level guard: permissions, scope and custom conditions
    /// combined. `None` means unrestricted.
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn default_handler(&self) -> Option<&Handler> {
        self.default_handler.as_ref()
    }

    pub fn syntaxes(&self) -> &[Syntax] {
        &self.syntaxes
    }

    pub fn sub_commands(&self) -> &[CommandDeclaration] {
        &self.sub_commands
    }

    /// The literal token standing for this command in a parent tree.
    pub fn token(&self) -> Token {
        Token::literal(self.name.clone())
    }

    /// The first zero-token syntax, which overrides the default handler.
    pub fn root_syntax(&self) -> Option<&Syntax> {
        self.syntaxes.iter().find(|s| s.is_empty())
    }

    /// Merges every syntax and sub-command into one dispatch tree.
    pub fn build(&self) -> Node {
        tree::build(self)
    }
}

/// Builder for [`CommandDeclaration`].
///
/// Arguments registered with [`argument`](CommandBuilder::argument) can be
/// referenced by name from [`execute`](CommandBuilder::execute). Referencing
/// an unknown argument is recorded and reported by
/// [`build`](CommandBuilder::build), so a declaration never exists with a
/// dangling token.
#[derive(Debug)]
pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    description: String,
    permissions: Vec<Permission>,
    scope: ExecutionScope,
    condition: Option<Condition>,
    default_handler: Option<Handler>,
    arguments: HashMap<String, Token>,
    syntaxes: Vec<Syntax>,
    sub_commands: Vec<CommandDeclaration>,
    error: Option<DeclarationError>,
}

impl CommandBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: String::new(),
            permissions: Vec::new(),
            scope: ExecutionScope::All,
            condition: None,
            default_handler: None,
            arguments: HashMap::new(),
            syntaxes: Vec::new(),
            sub_commands: Vec::new(),
            error: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn permission(self, permission: Permission) -> Self {
        self.permissions([permission])
    }

    pub fn permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    pub fn scope(mut self, scope: ExecutionScope) -> Self {
        self.scope = scope;
        self
    }

    /// Replaces the custom condition.
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// ANDs `condition` onto the custom condition.
    pub fn add_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(Condition::combine(self.condition.as_ref(), Some(&condition)));
        self
    }

    pub fn default_handler(mut self, handler: impl Into<Handler>) -> Self {
        self.default_handler = Some(handler.into());
        self
    }

    /// Registers an argument token for later reference by name.
    pub fn argument(mut self, token: Token) -> Self {
        self.arguments.insert(token.name().to_string(), token);
        self
    }

    /// Adds a fully formed syntax.
    pub fn syntax(mut self, syntax: Syntax) -> Self {
        self.syntaxes.push(syntax);
        self
    }

    /// Adds a syntax made of previously registered arguments.
    pub fn execute(self, handler: impl Into<Handler>, arguments: &[&str]) -> Self {
        self.resolve_syntax(None, handler.into(), arguments)
    }

    /// Like [`execute`](Self::execute), gated by an extra condition.
    pub fn execute_conditional(
        self,
        condition: Condition,
        handler: impl Into<Handler>,
        arguments: &[&str],
    ) -> Self {
        self.resolve_syntax(Some(condition), handler.into(), arguments)
    }

    pub fn sub_command(mut self, command: CommandDeclaration) -> Self {
        self.sub_commands.push(command);
        self
    }

    fn resolve_syntax(
        mut self,
        condition: Option<Condition>,
        handler: Handler,
        arguments: &[&str],
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        let mut tokens = Vec::with_capacity(arguments.len());
        for name in arguments {
            match self.arguments.get(*name) {
                Some(token) => tokens.push(token.clone()),
                None => {
                    self.error = Some(DeclarationError::UnknownArgument(name.to_string()));
                    return self;
                }
            }
        }
        self.syntaxes.push(Syntax {
            condition,
            handler,
            tokens,
        });
        self
    }

    /// Finishes the declaration.
    ///
    /// # Errors
    ///
    /// Returns [`DeclarationError::EmptyCommandName`] for a blank name, or
    /// the first [`DeclarationError::UnknownArgument`] recorded by
    /// [`execute`](Self::execute).
    pub fn build(self) -> Result<CommandDeclaration> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.name.trim().is_empty() {
            return Err(DeclarationError::EmptyCommandName);
        }

        let mut guard: Option<Condition> = None;
        for permission in &self.permissions {
            guard = Some(Condition::combine(guard.as_ref(), Some(&permission.to_condition())));
        }
        if let Some(scope) = self.scope.to_condition() {
            guard = Some(Condition::combine(guard.as_ref(), Some(&scope)));
        }
        if let Some(custom) = &self.condition {
            guard = Some(Condition::combine(guard.as_ref(), Some(custom)));
        }

        Ok(CommandDeclaration {
            name: self.name,
            aliases: self.aliases,
            description: self.description,
            permissions: self.permissions,
            scope: self.scope,
            condition: guard,
            default_handler: self.default_handler,
            syntaxes: self.syntaxes,
            sub_commands: self.sub_commands,
        })
    }
}
