use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use command_tree_core::{
    CallerIdentity, CommandContext, HandlerTable, ManifestFile, Node, StaticCaller, Token,
    validate_declaration,
};
use command_tree_engine::{DispatchError, EngineConfig, Registry};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// CLI output format.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "command-tree")]
#[command(about = "Inspect, validate and exercise command manifests")]
struct Cli {
    /// Engine configuration (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the merged dispatch tree of every command in a manifest.
    Tree(TreeArgs),
    /// List the usage lines a caller may run.
    Usage(UsageArgs),
    /// Parse and dispatch one command line.
    Run(RunArgs),
    /// Print completion candidates for a partial command line.
    Complete(CompleteArgs),
    /// Validate one or more manifests.
    Validate(ValidateArgs),
}

/// Who is issuing the command. Without `--name` the caller is a console.
#[derive(Debug, Clone, Args)]
struct CallerArgs {
    /// Interactive caller name.
    #[arg(long)]
    name: Option<String>,
    /// Caller unique id.
    #[arg(long)]
    id: Option<Uuid>,
    /// Treat the caller as an operator.
    #[arg(long)]
    op: bool,
    /// Explicitly grant a permission node (repeatable).
    #[arg(long = "grant", value_name = "NODE")]
    grants: Vec<String>,
    /// Explicitly deny a permission node (repeatable).
    #[arg(long = "deny", value_name = "NODE")]
    denials: Vec<String>,
}

impl CallerArgs {
    fn to_caller(&self) -> StaticCaller {
        let mut caller = match &self.name {
            Some(name) => StaticCaller::player(name),
            None => StaticCaller::console(),
        };
        if let Some(id) = self.id {
            caller = caller.with_id(id);
        }
        if self.op {
            caller = caller.operator();
        }
        for node in &self.grants {
            caller = caller.with_grant(node, true);
        }
        for node in &self.denials {
            caller = caller.with_grant(node, false);
        }
        caller
    }
}

#[derive(Debug, Args)]
struct TreeArgs {
    /// Manifest file (YAML, or JSON with a .json extension).
    manifest: PathBuf,
    /// Output format.
    #[arg(long, default_value = "text")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct UsageArgs {
    manifest: PathBuf,
    /// Only list this command (name or alias).
    #[arg(long)]
    command: Option<String>,
    #[command(flatten)]
    caller: CallerArgs,
}

#[derive(Debug, Args)]
struct RunArgs {
    manifest: PathBuf,
    /// Command line to run, e.g. `/gift sword`.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    input: Vec<String>,
    /// How long to wait for the handler to report back.
    #[arg(long, default_value_t = 5000)]
    wait_ms: u64,
    #[command(flatten)]
    caller: CallerArgs,
}

#[derive(Debug, Args)]
struct CompleteArgs {
    manifest: PathBuf,
    /// Partial command line; a trailing space completes the next token.
    input: String,
    #[command(flatten)]
    caller: CallerArgs,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Manifest files.
    #[arg(required = true)]
    manifests: Vec<PathBuf>,
}

/// What a manifest handler reports when it runs.
#[derive(Debug, Serialize)]
struct Invocation {
    handler: String,
    input: String,
    caller: Option<String>,
    arguments: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct TreeView {
    token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    r#type: Option<String>,
    executable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<TreeView>,
}

impl TreeView {
    fn from_node(node: &Node) -> Self {
        Self {
            token: node.token().usage(),
            r#type: node.token().as_argument().map(|a| a.parser().type_name()),
            executable: node.execution().is_some(),
            children: node.children().iter().map(Self::from_node).collect(),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Command::Tree(args) => run_tree(args),
        Command::Usage(args) => run_usage(config, args),
        Command::Run(args) => run_run(config, args),
        Command::Complete(args) => run_complete(config, args),
        Command::Validate(args) => run_validate(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_tree(args: TreeArgs) -> Result<(), String> {
    let manifest = load_manifest(&args.manifest)?;
    let (handlers, _) = reporting_handlers(&manifest);
    let declarations = manifest
        .into_declarations(&handlers)
        .map_err(|e| format!("Invalid manifest '{}': {e}", args.manifest.display()))?;

    match args.format {
        CliOutputFormat::Text => {
            for declaration in &declarations {
                print_node(&declaration.build(), 0);
            }
        }
        CliOutputFormat::Json => {
            let views: Vec<TreeView> = declarations
                .iter()
                .map(|d| TreeView::from_node(&d.build()))
                .collect();
            let raw = serde_json::to_string_pretty(&views)
                .map_err(|e| format!("Failed to serialize tree: {e}"))?;
            println!("{raw}");
        }
    }
    Ok(())
}

fn run_usage(config: Option<&Path>, args: UsageArgs) -> Result<(), String> {
    let (registry, _) = build_registry(config, &args.manifest)?;
    let caller = args.caller.to_caller();

    let labels: Vec<String> = match &args.command {
        Some(label) => {
            let command = registry
                .command(label)
                .ok_or_else(|| format!("Unknown command '{label}'"))?;
            vec![command.name().to_string()]
        }
        None => registry.commands().iter().map(|c| c.name().to_string()).collect(),
    };

    for label in labels {
        for line in registry.usage(&label, &caller) {
            println!("/{line}");
        }
    }
    Ok(())
}

fn run_run(config: Option<&Path>, args: RunArgs) -> Result<(), String> {
    let (registry, invocations) = build_registry(config, &args.manifest)?;
    let input = args.input.join(" ");
    let caller = args.caller.to_caller();

    match registry.execute(&input, &caller) {
        Ok(status) => debug!(code = status.code(), "Command accepted"),
        Err(DispatchError::Parse(err)) => {
            return Err(format!("{}\n{}", err.message(), err.context()));
        }
        Err(err) => return Err(err.to_string()),
    }

    let invocation = invocations
        .recv_timeout(Duration::from_millis(args.wait_ms))
        .map_err(|_| format!("Handler did not report back within {}ms", args.wait_ms))?;
    let raw = serde_json::to_string(&invocation)
        .map_err(|e| format!("Failed to serialize invocation: {e}"))?;
    println!("{raw}");
    Ok(())
}

fn run_complete(config: Option<&Path>, args: CompleteArgs) -> Result<(), String> {
    let (registry, _) = build_registry(config, &args.manifest)?;
    for suggestion in registry.suggest(&args.input, &args.caller.to_caller()) {
        println!("{suggestion}");
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let mut problems = 0;
    let mut commands = 0;

    for path in &args.manifests {
        let manifest = load_manifest(path)?;
        let (handlers, _) = reporting_handlers(&manifest);
        let declarations = manifest
            .into_declarations(&handlers)
            .map_err(|e| format!("Invalid manifest '{}': {e}", path.display()))?;

        for declaration in &declarations {
            commands += 1;
            for error in validate_declaration(declaration) {
                if error.is_warning() {
                    eprintln!("{}: warning: {error}", path.display());
                } else {
                    problems += 1;
                    eprintln!("{}: {error}", path.display());
                }
            }
        }
    }

    if problems > 0 {
        return Err(format!("{problems} problem(s) found"));
    }
    println!(
        "Validated {} manifest(s) with {commands} command(s).",
        args.manifests.len()
    );
    Ok(())
}

fn load_manifest(path: &Path) -> Result<ManifestFile, String> {
    ManifestFile::load(path).map_err(|e| format!("Failed to load '{}': {e}", path.display()))
}

/// One handler per manifest handler id, each reporting its invocation on
/// the returned channel.
fn reporting_handlers(manifest: &ManifestFile) -> (HandlerTable, Receiver<Invocation>) {
    let (tx, rx) = mpsc::channel();
    let mut handlers = HandlerTable::new();
    for id in manifest.handler_ids() {
        let tx = Mutex::new(tx.clone());
        let handler_id = id.clone();
        handlers.insert(id, move |ctx: &CommandContext| {
            let arguments = ctx
                .arguments()
                .iter()
                .map(|(name, value)| {
                    let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                    (name.clone(), value)
                })
                .collect();
            let invocation = Invocation {
                handler: handler_id.clone(),
                input: ctx.input().to_string(),
                caller: ctx.caller().display_name().map(str::to_string),
                arguments,
            };
            if let Ok(tx) = tx.lock() {
                let _ = tx.send(invocation);
            }
        });
    }
    (handlers, rx)
}

fn build_registry(
    config: Option<&Path>,
    manifest_path: &Path,
) -> Result<(Registry<StaticCaller>, Receiver<Invocation>), String> {
    let config = match config {
        Some(path) => EngineConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => EngineConfig::default(),
    };

    let manifest = load_manifest(manifest_path)?;
    let (handlers, invocations) = reporting_handlers(&manifest);

    let mut registry = Registry::new(config, |caller: &StaticCaller| {
        Arc::new(caller.clone()) as Arc<dyn CallerIdentity>
    })
    .map_err(|e| e.to_string())?;
    registry
        .register_manifest(&manifest, &handlers)
        .map_err(|e| format!("Invalid manifest '{}': {e}", manifest_path.display()))?;

    Ok((registry, invocations))
}

fn print_node(node: &Node, depth: usize) {
    let mut line = format!("{}{}", "  ".repeat(depth), node.token().usage());
    if let Token::Argument(argument) = node.token() {
        line.push_str(&format!(" ({})", argument.parser().type_name()));
    }
    if node.execution().is_some() {
        line.push_str(" *");
    }
    println!("{line}");
    for child in node.children() {
        print_node(child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_args_build_static_caller() {
        let args = CallerArgs {
            name: Some("Steve".into()),
            id: None,
            op: true,
            grants: vec!["gift.use".into()],
            denials: vec!["gift.bulk".into()],
        };
        let caller = args.to_caller();
        assert_eq!(caller.display_name(), Some("Steve"));
        assert!(caller.is_privileged());
        assert_eq!(caller.permission_grant("gift.use"), Some(true));
        assert_eq!(caller.permission_grant("gift.bulk"), Some(false));
    }

    #[test]
    fn test_console_is_default_caller() {
        let args = CallerArgs {
            name: None,
            id: None,
            op: false,
            grants: vec![],
            denials: vec![],
        };
        assert!(!args.to_caller().is_interactive());
    }

    #[test]
    fn test_cli_parses_run_with_trailing_input() {
        let cli = Cli::parse_from(["command-tree", "run", "m.yaml", "--name", "Steve", "/gift", "sword"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.input, ["/gift", "sword"]);
        assert_eq!(args.caller.name.as_deref(), Some("Steve"));
    }
}
