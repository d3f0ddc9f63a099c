//! Reference grammar engine over built command trees.
//!
//! Works on one command root at a time, always on behalf of a caller:
//! nodes the caller cannot see are treated as if they did not exist.
//!
//! Matching rules:
//!
//! - Tokens are separated by exactly one space.
//! - If the next word equals a visible literal child, only that literal is
//!   tried. Otherwise visible argument children are tried in child order.
//! - The first branch consuming the whole input wins.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use command_tree_core::*;
//! use command_tree_engine::grammar::{self, MatchOutcome};
//!
//! let gift = CommandDeclaration::builder("gift")
//!     .argument(Token::argument("item", arguments::word()))
//!     .execute(|_: &CommandContext| {}, &["item"])
//!     .build()
//!     .unwrap()
//!     .build();
//!
//! let caller: Arc<dyn CallerIdentity> = Arc::new(StaticCaller::player("Steve"));
//! match grammar::parse(&gift, "gift sword", Arc::clone(&caller)) {
//!     MatchOutcome::Matched(parsed) => assert_eq!(parsed.context().get_str("item"), Some("sword")),
//!     other => panic!("unexpected {other:?}"),
//! }
//! assert!(matches!(grammar::parse(&gift, "gift", caller), MatchOutcome::NoMatch));
//! ```

use std::sync::Arc;

use command_tree_core::{
    ARGUMENT_SEPARATOR, ArgValue, CallerIdentity, CommandContext, Execution, Node, ParseError,
    StringReader, Token,
};
use tracing::trace;

const INCORRECT_ARGUMENT: &str = "Incorrect argument for command";
const TRAILING_DATA: &str = "Expected whitespace to end one argument, but found trailing data";

/// Result of matching a command line against one root.
#[derive(Debug)]
pub enum MatchOutcome {
    /// Input matched an invocable node.
    Matched(ParsedCommand),
    /// Nothing the caller may run matches the input.
    NoMatch,
    /// A visible path matched partially; the furthest error is reported.
    ParseError(ParseError),
}

impl MatchOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

/// A successful match: what to run and with which arguments.
#[derive(Debug, Clone)]
pub struct ParsedCommand {
    execution: Execution,
    context: CommandContext,
    path: Vec<String>,
}

impl ParsedCommand {
    pub fn execution(&self) -> &Execution {
        &self.execution
    }

    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    /// Usage form of the matched path, e.g. `gift <item>`.
    pub fn usage(&self) -> String {
        self.path.join(" ")
    }

    pub fn into_parts(self) -> (Execution, CommandContext) {
        (self.execution, self.context)
    }
}

/// Matches `input` against `root`.
///
/// The first word of `input` is taken as the command label and is not
/// compared against the root token, so aliases resolve to the same tree.
pub fn parse(root: &Node, input: &str, caller: Arc<dyn CallerIdentity>) -> MatchOutcome {
    if !root.is_visible(caller.as_ref()) {
        return MatchOutcome::NoMatch;
    }

    let mut reader = StringReader::new(input);
    reader.read_until_separator();

    let mut walker = Walker::new(input, caller.as_ref());
    walker.path.push(root.token().usage());

    let Some(node) = walker.descend(root, reader.cursor()) else {
        return walker
            .into_error()
            .map_or(MatchOutcome::NoMatch, MatchOutcome::ParseError);
    };

    let Some(execution) = node.execution().filter(|e| e.test(caller.as_ref())) else {
        trace!(input, "Input ends at a node without an invocable execution");
        return MatchOutcome::NoMatch;
    };

    let mut context = CommandContext::new(Arc::clone(&caller), input);
    for (name, value) in walker.arguments {
        context.set_argument(name, value);
    }
    MatchOutcome::Matched(ParsedCommand {
        execution: execution.clone(),
        context,
        path: walker.path,
    })
}

/// Completion candidates for the last (possibly empty) word of `input`.
///
/// Returns nothing when `input` has no separator yet; completing the
/// command label itself is the registry's job.
pub fn suggest(root: &Node, input: &str, caller: Arc<dyn CallerIdentity>) -> Vec<String> {
    let Some(end) = input.rfind(ARGUMENT_SEPARATOR) else {
        return Vec::new();
    };
    if !root.is_visible(caller.as_ref()) {
        return Vec::new();
    }

    let partial = &input[end + 1..];
    let lower = partial.to_lowercase();

    let mut reader = StringReader::new(input);
    reader.read_until_separator();
    let mut reached = Vec::new();
    reach(
        root,
        input,
        reader.cursor(),
        end,
        caller.as_ref(),
        &mut Vec::new(),
        &mut reached,
    );

    let mut suggestions: Vec<String> = Vec::new();
    for (node, arguments) in reached {
        let mut context = CommandContext::new(Arc::clone(&caller), input);
        for (name, value) in arguments {
            context.set_argument(name, value);
        }

        for child in node.children().iter().filter(|c| c.is_visible(caller.as_ref())) {
            let candidates = match child.token() {
                Token::Literal(name) if name.to_lowercase().starts_with(&lower) => vec![name.clone()],
                Token::Literal(_) => Vec::new(),
                Token::Argument(argument) => argument.suggest(partial, &context),
            };
            for candidate in candidates {
                if !suggestions.contains(&candidate) {
                    suggestions.push(candidate);
                }
            }
        }
    }
    suggestions
}

/// Every path `caller` may invoke, rendered as `literal <argument>`.
pub fn all_usage(root: &Node, caller: &dyn CallerIdentity) -> Vec<String> {
    let mut usage = Vec::new();
    if root.is_visible(caller) {
        collect_usage(root, caller, &mut Vec::new(), &mut usage);
    }
    usage
}

fn collect_usage(
    node: &Node,
    caller: &dyn CallerIdentity,
    prefix: &mut Vec<String>,
    out: &mut Vec<String>,
) {
    prefix.push(node.token().usage());
    if node.is_invocable(caller) {
        out.push(prefix.join(" "));
    }
    for child in node.children().iter().filter(|c| c.is_visible(caller)) {
        collect_usage(child, caller, prefix, out);
    }
    prefix.pop();
}

struct Walker<'a> {
    input: &'a str,
    caller: &'a dyn CallerIdentity,
    arguments: Vec<(String, ArgValue)>,
    path: Vec<String>,
    error: Option<ParseError>,
    unmatched: Option<usize>,
}

impl<'a> Walker<'a> {
    fn new(input: &'a str, caller: &'a dyn CallerIdentity) -> Self {
        Self {
            input,
            caller,
            arguments: Vec::new(),
            path: Vec::new(),
            error: None,
            unmatched: None,
        }
    }

    /// Continues matching below `node`, whose token ended at `cursor`.
    fn descend<'n>(&mut self, node: &'n Node, cursor: usize) -> Option<&'n Node> {
        if cursor == self.input.len() {
            return Some(node);
        }

        let mut reader = StringReader::at(self.input, cursor);
        if reader.peek() != Some(ARGUMENT_SEPARATOR) {
            self.record(ParseError::new(TRAILING_DATA, &reader));
            return None;
        }
        reader.skip();
        let start = reader.cursor();
        let word = reader.read_until_separator();

        let literal = node.children().iter().find(|child| {
            child.token().is_literal() && child.token().name() == word && child.is_visible(self.caller)
        });
        if let Some(child) = literal {
            self.path.push(child.token().usage());
            let found = self.descend(child, start + word.len());
            if found.is_none() {
                self.path.pop();
            }
            return found;
        }

        for child in node.children() {
            let Some(argument) = child.token().as_argument() else {
                continue;
            };
            if !child.is_visible(self.caller) {
                continue;
            }

            let mut reader = StringReader::at(self.input, start);
            match argument.parse(&mut reader) {
                Ok(value) => {
                    self.arguments.push((argument.name().to_string(), value));
                    self.path.push(child.token().usage());
                    if let Some(found) = self.descend(child, reader.cursor()) {
                        return Some(found);
                    }
                    self.arguments.pop();
                    self.path.pop();
                }
                Err(err) => self.record(err),
            }
        }

        self.unmatched = Some(self.unmatched.map_or(start, |at| at.max(start)));
        None
    }

    fn record(&mut self, err: ParseError) {
        match &self.error {
            Some(existing) if existing.cursor() >= err.cursor() => {}
            _ => self.error = Some(err),
        }
    }

    fn into_error(self) -> Option<ParseError> {
        let incorrect = |at: usize| ParseError::new(INCORRECT_ARGUMENT, &StringReader::at(self.input, at));
        match (self.error, self.unmatched) {
            (Some(err), Some(at)) if at > err.cursor() => Some(incorrect(at)),
            (Some(err), _) => Some(err),
            (None, Some(at)) => Some(incorrect(at)),
            (None, None) => None,
        }
    }
}

/// Collects every node reachable by consuming tokens exactly up to `end`.
fn reach<'n>(
    node: &'n Node,
    input: &str,
    cursor: usize,
    end: usize,
    caller: &dyn CallerIdentity,
    arguments: &mut Vec<(String, ArgValue)>,
    reached: &mut Vec<(&'n Node, Vec<(String, ArgValue)>)>,
) {
    if cursor == end {
        reached.push((node, arguments.clone()));
        return;
    }

    let mut reader = StringReader::at(input, cursor);
    if cursor > end || reader.peek() != Some(ARGUMENT_SEPARATOR) {
        return;
    }
    reader.skip();
    let start = reader.cursor();
    let word = reader.read_until_separator();

    let literal = node.children().iter().find(|child| {
        child.token().is_literal() && child.token().name() == word && child.is_visible(caller)
    });
    if let Some(child) = literal {
        reach(child, input, start + word.len(), end, caller, arguments, reached);
        return;
    }

    for child in node.children().iter().filter(|c| c.is_visible(caller)) {
        let Some(argument) = child.token().as_argument() else {
            continue;
        };
        let mut reader = StringReader::at(input, start);
        if let Ok(value) = argument.parse(&mut reader) {
            if reader.cursor() > end {
                continue;
            }
            arguments.push((argument.name().to_string(), value));
            reach(child, input, reader.cursor(), end, caller, arguments, reached);
            arguments.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use command_tree_core::{
        CommandDeclaration, Condition, Handler, Permission, StaticCaller, Syntax, arguments,
    };

    use super::*;

    fn noop() -> Handler {
        Handler::new(|_: &CommandContext| {})
    }

    fn console() -> Arc<dyn CallerIdentity> {
        Arc::new(StaticCaller::console())
    }

    fn player() -> Arc<dyn CallerIdentity> {
        Arc::new(StaticCaller::player("Steve"))
    }

    fn warp() -> Node {
        CommandDeclaration::builder("warp")
            .syntax(Syntax::new(noop(), vec![Token::literal("list")]))
            .syntax(Syntax::new(
                noop(),
                vec![Token::literal("set"), Token::argument("name", arguments::word())],
            ))
            .syntax(Syntax::new(
                noop(),
                vec![
                    Token::literal("set"),
                    Token::argument("name", arguments::word()),
                    Token::argument("x", arguments::integer()),
                    Token::argument("z", arguments::integer()),
                ],
            ))
            .syntax(Syntax::conditional(
                Condition::new(|c: &dyn CallerIdentity| c.is_privileged()),
                noop(),
                vec![Token::literal("purge")],
            ))
            .build()
            .unwrap()
            .build()
    }

    fn matched(outcome: MatchOutcome) -> ParsedCommand {
        match outcome {
            MatchOutcome::Matched(parsed) => parsed,
            other => panic!("expected a match, got {other:?}"),
        }
    }

    fn parse_error(outcome: MatchOutcome) -> ParseError {
        match outcome {
            MatchOutcome::ParseError(err) => err,
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_matches_arguments_and_literals() {
        let root = warp();
        let parsed = matched(parse(&root, "warp set home 10 -20", console()));
        assert_eq!(parsed.usage(), "warp set <name> <x> <z>");
        assert_eq!(parsed.context().get_str("name"), Some("home"));
        assert_eq!(parsed.context().get_int("x"), Some(10));
        assert_eq!(parsed.context().get_int("z"), Some(-20));

        assert_eq!(matched(parse(&root, "warp list", console())).usage(), "warp list");
    }

    #[test]
    fn test_incomplete_input_is_no_match() {
        let root = warp();
        assert!(matches!(parse(&root, "warp", console()), MatchOutcome::NoMatch));
        assert!(matches!(parse(&root, "warp set", console()), MatchOutcome::NoMatch));
    }

    #[test]
    fn test_furthest_argument_error_wins() {
        let root = warp();
        let err = parse_error(parse(&root, "warp set home ten 5", console()));
        assert_eq!(err.message(), "Expected integer");
        assert_eq!(err.cursor(), 14);
    }

    #[test]
    fn test_unmatched_trailing_input() {
        let root = warp();
        let err = parse_error(parse(&root, "warp list extra", console()));
        assert_eq!(err.message(), "Incorrect argument for command");
        assert_eq!(err.cursor(), 10);
    }

    #[test]
    fn test_hidden_literal_is_absent() {
        let root = warp();
        let err = parse_error(parse(&root, "warp purge", player()));
        assert_eq!(err.message(), "Incorrect argument for command");

        let op: Arc<dyn CallerIdentity> = Arc::new(StaticCaller::player("Steve").operator());
        assert_eq!(matched(parse(&root, "warp purge", op)).usage(), "warp purge");
    }

    #[test]
    fn test_invisible_root_is_no_match() {
        let root = CommandDeclaration::builder("ban")
            .permission(Permission::default_if_op("admin.ban"))
            .default_handler(noop())
            .build()
            .unwrap()
            .build();
        assert!(matches!(parse(&root, "ban", player()), MatchOutcome::NoMatch));
        assert!(parse(&root, "ban", console()).is_matched());
    }

    #[test]
    fn test_suggest_literals_and_arguments() {
        let root = warp();
        assert_eq!(suggest(&root, "warp ", player()), vec!["list", "set"]);
        assert_eq!(suggest(&root, "warp ", console()), vec!["list", "set"]);
        assert_eq!(
            suggest(&root, "warp ", Arc::new(StaticCaller::player("A").operator())),
            vec!["list", "set", "purge"]
        );
        assert_eq!(suggest(&root, "warp S", player()), vec!["set"]);
        assert!(suggest(&root, "warp", player()).is_empty());
    }

    #[test]
    fn test_suggest_uses_parsed_arguments() {
        let root = CommandDeclaration::builder("tp")
            .syntax(Syntax::new(
                noop(),
                vec![
                    Token::argument("from", arguments::word()),
                    Token::argument_with_suggester(
                        "to",
                        arguments::word(),
                        |partial: &str, ctx: &CommandContext| {
                            vec![format!("{}->{partial}", ctx.get_str("from").unwrap_or("?"))]
                        },
                    ),
                ],
            ))
            .build()
            .unwrap()
            .build();

        assert_eq!(suggest(&root, "tp alex st", console()), vec!["alex->st"]);
    }

    #[test]
    fn test_all_usage_respects_visibility() {
        let root = warp();
        assert_eq!(
            all_usage(&root, &StaticCaller::player("Steve")),
            vec!["warp list", "warp set <name>", "warp set <name> <x> <z>"]
        );
        assert_eq!(all_usage(&root, &StaticCaller::console().operator()).len(), 4);
    }
}
