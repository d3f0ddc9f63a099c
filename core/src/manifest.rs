//! Declarative command manifests.
//!
//! A manifest describes commands as plain data (YAML or JSON) instead of
//! code. Handlers are referenced by id and supplied at unpack time through
//! a [`HandlerTable`], so the same manifest can be bound to different
//! hosts.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! commands:
//!   - name: gift
//!     aliases: [present]
//!     description: Give yourself an item
//!     permissions:
//!       - node: gift.use
//!         default: "true"
//!     arguments:
//!       - name: item
//!         type: word
//!         suggestions: [sword, shield]
//!     syntaxes:
//!       - tokens: ["<item>"]
//!         handler: gift
//!     subcommands:
//!       - name: list
//!         default: gift_list
//! ```
//!
//! In `tokens`, `<name>` refers to a declared argument (of this command or
//! any enclosing one) and a bare word is a literal.

use std::collections::HashMap;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::arguments;
use crate::caller::{ExecutionScope, Permission};
use crate::condition::{Condition, Handler};
use crate::context::CommandContext;
use crate::declaration::{CommandDeclaration, Syntax};
use crate::error::{DeclarationError, Result};
use crate::token::Token;

/// Named handlers that manifest entries refer to.
///
/// # Examples
///
/// ```
/// use command_tree_core::{CommandContext, HandlerTable};
///
/// let handlers = HandlerTable::new()
///     .with("greet", |ctx: &CommandContext| println!("hello {}", ctx.label()));
/// assert!(handlers.get("greet").is_some());
/// assert!(handlers.get("missing").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Handler>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, handler: impl Into<Handler>) -> Self {
        self.insert(id, handler);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, handler: impl Into<Handler>) {
        self.handlers.insert(id.into(), handler.into());
    }

    pub fn get(&self, id: &str) -> Option<&Handler> {
        self.handlers.get(id)
    }

    fn require(&self, id: &str) -> Result<Handler> {
        self.get(id)
            .cloned()
            .ok_or_else(|| DeclarationError::UnknownHandler(id.to_string()))
    }
}

/// A manifest document: a list of top-level commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Manifest format version (informational).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub commands: Vec<CommandManifest>,
}

impl ManifestFile {
    /// Loads a manifest; `.json` files are read as JSON, anything else as
    /// YAML.
    ///
    /// # Errors
    ///
    /// Returns [`DeclarationError::IoError`] if the file cannot be read, or
    /// a JSON/YAML error if it does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let manifest = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        Ok(manifest)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Every handler id referenced anywhere in the manifest, in order of
    /// first appearance.
    pub fn handler_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for command in &self.commands {
            command.collect_handler_ids(&mut ids);
        }
        ids
    }

    /// Unpacks every command into a declaration.
    ///
    /// # Errors
    ///
    /// Fails on the first unknown handler id, unknown argument reference,
    /// malformed token or invalid argument definition.
    pub fn into_declarations(&self, handlers: &HandlerTable) -> Result<Vec<CommandDeclaration>> {
        self.commands
            .iter()
            .map(|command| command.to_declaration(handlers))
            .collect()
    }
}

/// Declarative form of one command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandManifest {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub scope: ExecutionScope,
    #[serde(default)]
    pub arguments: Vec<ArgumentManifest>,
    /// Handler id run when the command is invoked with no further tokens.
    #[serde(default, rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_handler: Option<String>,
    #[serde(default)]
    pub syntaxes: Vec<SyntaxManifest>,
    #[serde(default)]
    pub subcommands: Vec<CommandManifest>,
}

/// Declarative form of one syntax.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyntaxManifest {
    /// `<name>` for argument references, bare words for literals.
    pub tokens: Vec<String>,
    pub handler: String,
    /// Extra permissions required for this syntax only.
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub scope: ExecutionScope,
}

/// Built-in argument types available to manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentType {
    Word,
    String,
    Greedy,
    Integer,
    Float,
    Boolean,
    Choice,
}

/// Declarative form of one argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentManifest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ArgumentType,
    /// Lower bound for numeric types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound for numeric types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Allowed values for `choice`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    /// Static completion candidates, filtered by prefix.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ArgumentManifest {
    /// Builds the argument token.
    ///
    /// # Errors
    ///
    /// Returns [`DeclarationError::InvalidArgument`] for a `choice` without
    /// values or fractional integer bounds.
    pub fn to_token(&self) -> Result<Token> {
        let name = self.name.clone();
        let token = match self.kind {
            ArgumentType::Word => self.finish(name, arguments::word()),
            ArgumentType::String => self.finish(name, arguments::string()),
            ArgumentType::Greedy => self.finish(name, arguments::greedy_string()),
            ArgumentType::Boolean => self.finish(name, arguments::boolean()),
            ArgumentType::Integer => {
                let min = self.integer_bound(self.min, i64::MIN)?;
                let max = self.integer_bound(self.max, i64::MAX)?;
                self.finish(name, arguments::integer_between(min, max))
            }
            ArgumentType::Float => {
                let parser = arguments::float_between(
                    self.min.unwrap_or(f64::MIN),
                    self.max.unwrap_or(f64::MAX),
                );
                self.finish(name, parser)
            }
            ArgumentType::Choice => {
                if self.values.is_empty() {
                    return Err(self.invalid("choice needs at least one value"));
                }
                self.finish(name, arguments::choice(self.values.iter().cloned()))
            }
        };
        Ok(token)
    }

    fn finish(&self, name: String, parser: impl crate::ArgumentParser + 'static) -> Token {
        if self.suggestions.is_empty() {
            return Token::argument(name, parser);
        }
        let candidates = self.suggestions.clone();
        Token::argument_with_suggester(name, parser, move |partial: &str, _: &CommandContext| {
            let lower = partial.to_lowercase();
            candidates
                .iter()
                .filter(|c| c.to_lowercase().starts_with(&lower))
                .cloned()
                .collect::<Vec<_>>()
        })
    }

    fn integer_bound(&self, bound: Option<f64>, fallback: i64) -> Result<i64> {
        match bound {
            None => Ok(fallback),
            Some(value) if value.fract() == 0.0 => Ok(value as i64),
            Some(value) => Err(self.invalid(&format!("integer bound {value} is not whole"))),
        }
    }

    fn invalid(&self, reason: &str) -> DeclarationError {
        DeclarationError::InvalidArgument {
            name: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

impl CommandManifest {
    /// Unpacks this command (and its sub-commands) into a declaration.
    pub fn to_declaration(&self, handlers: &HandlerTable) -> Result<CommandDeclaration> {
        self.to_declaration_in(handlers, &HashMap::new())
    }

    fn to_declaration_in(
        &self,
        handlers: &HandlerTable,
        inherited: &HashMap<String, Token>,
    ) -> Result<CommandDeclaration> {
        let mut scope_arguments = inherited.clone();
        for argument in &self.arguments {
            scope_arguments.insert(argument.name.clone(), argument.to_token()?);
        }

        let mut builder = CommandDeclaration::builder(self.name.clone())
            .description(self.description.clone())
            .aliases(self.aliases.iter().cloned())
            .permissions(self.permissions.iter().cloned())
            .scope(self.scope);

        if let Some(id) = &self.default_handler {
            builder = builder.default_handler(handlers.require(id)?);
        }

        for syntax in &self.syntaxes {
            let tokens = syntax
                .tokens
                .iter()
                .map(|raw| parse_token(raw, &scope_arguments))
                .collect::<Result<Vec<_>>>()?;
            let handler = handlers.require(&syntax.handler)?;
            builder = builder.syntax(match syntax.condition() {
                Some(condition) => Syntax::conditional(condition, handler, tokens),
                None => Syntax::new(handler, tokens),
            });
        }

        for sub_command in &self.subcommands {
            builder = builder.sub_command(sub_command.to_declaration_in(handlers, &scope_arguments)?);
        }

        builder.build()
    }

    fn collect_handler_ids(&self, ids: &mut Vec<String>) {
        let referenced = self
            .default_handler
            .iter()
            .chain(self.syntaxes.iter().map(|s| &s.handler));
        for id in referenced {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        for sub_command in &self.subcommands {
            sub_command.collect_handler_ids(ids);
        }
    }
}

impl SyntaxManifest {
    fn condition(&self) -> Option<Condition> {
        let mut condition: Option<Condition> = None;
        for permission in &self.permissions {
            condition = Some(Condition::combine(
                condition.as_ref(),
                Some(&permission.to_condition()),
            ));
        }
        if let Some(scope) = self.scope.to_condition() {
            condition = Some(Condition::combine(condition.as_ref(), Some(&scope)));
        }
        condition
    }
}

fn parse_token(raw: &str, arguments: &HashMap<String, Token>) -> Result<Token> {
    if raw.is_empty() || raw.contains(char::is_whitespace) {
        return Err(DeclarationError::InvalidToken(raw.to_string()));
    }
    match raw.strip_prefix('<').map(|rest| rest.strip_suffix('>')) {
        Some(Some(name)) if !name.is_empty() => arguments
            .get(name)
            .cloned()
            .ok_or_else(|| DeclarationError::UnknownArgument(name.to_string())),
        Some(_) => Err(DeclarationError::InvalidToken(raw.to_string())),
        None if raw.contains(['<', '>']) => Err(DeclarationError::InvalidToken(raw.to_string())),
        None => Ok(Token::literal(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caller::{PermissionDefault, StaticCaller};

    const GIFT: &str = r#"
version: "1.0"
commands:
  - name: gift
    aliases: [present]
    permissions:
      - node: gift.use
        default: "true"
    arguments:
      - name: item
        type: word
        suggestions: [sword, shield, bow]
      - name: amount
        type: integer
        min: 1
        max: 64
    syntaxes:
      - tokens: ["<item>"]
        handler: gift
      - tokens: ["<item>", "<amount>"]
        handler: gift
        permissions:
          - node: gift.bulk
            default: if_op
    subcommands:
      - name: list
        default: gift_list
      - name: to
        syntaxes:
          - tokens: ["<item>"]
            handler: gift
"#;

    fn handlers() -> HandlerTable {
        HandlerTable::new()
            .with("gift", |_: &CommandContext| {})
            .with("gift_list", |_: &CommandContext| {})
    }

    #[test]
    fn test_yaml_manifest_unpacks() {
        let manifest = ManifestFile::from_yaml_str(GIFT).unwrap();
        assert_eq!(manifest.handler_ids(), vec!["gift", "gift_list"]);

        let decls = manifest.into_declarations(&handlers()).unwrap();
        assert_eq!(decls.len(), 1);

        let gift = &decls[0];
        assert_eq!(gift.aliases(), ["present"]);
        assert_eq!(gift.permissions()[0].default, PermissionDefault::True);
        assert_eq!(gift.syntaxes().len(), 2);
        assert_eq!(gift.sub_commands().len(), 2);

        // Sub-commands see the parent's arguments.
        let to = &gift.sub_commands()[1];
        assert_eq!(to.syntaxes()[0].tokens()[0].name(), "item");
    }

    #[test]
    fn test_syntax_permissions_become_conditions() {
        let decls = ManifestFile::from_yaml_str(GIFT)
            .unwrap()
            .into_declarations(&handlers())
            .unwrap();
        let bulk = &decls[0].syntaxes()[1];
        let condition = bulk.condition().unwrap();
        assert!(!condition.test(&StaticCaller::player("Steve")));
        assert!(condition.test(&StaticCaller::player("Steve").operator()));
    }

    #[test]
    fn test_unknown_handler_fails() {
        let manifest = ManifestFile::from_yaml_str(GIFT).unwrap();
        let only_gift = HandlerTable::new().with("gift", |_: &CommandContext| {});
        let err = manifest.into_declarations(&only_gift).unwrap_err();
        assert!(matches!(err, DeclarationError::UnknownHandler(ref id) if id == "gift_list"));
    }

    #[test]
    fn test_token_parsing() {
        let mut args = HashMap::new();
        args.insert("item".to_string(), Token::argument("item", arguments::word()));

        assert!(parse_token("list", &args).unwrap().is_literal());
        assert!(!parse_token("<item>", &args).unwrap().is_literal());
        assert!(matches!(
            parse_token("<missing>", &args),
            Err(DeclarationError::UnknownArgument(_))
        ));
        for bad in ["", "<>", "<item", "it>em", "two words"] {
            assert!(
                matches!(parse_token(bad, &args), Err(DeclarationError::InvalidToken(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_argument_definitions() {
        let choice = ArgumentManifest {
            name: "flavor".into(),
            kind: ArgumentType::Choice,
            min: None,
            max: None,
            values: vec![],
            suggestions: vec![],
        };
        assert!(matches!(choice.to_token(), Err(DeclarationError::InvalidArgument { .. })));

        let integer = ArgumentManifest {
            kind: ArgumentType::Integer,
            min: Some(1.5),
            ..choice
        };
        assert!(integer.to_token().is_err());
    }

    #[test]
    fn test_json_manifest() {
        let json = r#"{"commands":[{"name":"ping","default":"pong"}]}"#;
        let manifest = ManifestFile::from_json_str(json).unwrap();
        let decls = manifest
            .into_declarations(&HandlerTable::new().with("pong", |_: &CommandContext| {}))
            .unwrap();
        assert!(decls[0].default_handler().is_some());
    }
}
