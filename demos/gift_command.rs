//! Builder API walkthrough.
//!
//! Declares a `/gift` command with an argument syntax, an operator-only
//! bulk syntax and a `list` sub-command, registers it, and dispatches a few
//! command lines as different callers.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run -p command-tree-demos --example gift_command
//! ```

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use command_tree_core::{
    CallerIdentity, CommandContext, CommandDeclaration, Condition, Permission, StaticCaller, Token,
    arguments,
};
use command_tree_engine::{EngineConfig, Registry};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let (tx, rx) = mpsc::channel::<String>();
    let report = |label: &'static str| {
        let tx = Mutex::new(tx.clone());
        move |ctx: &CommandContext| {
            let caller = ctx.caller().display_name().unwrap_or("console").to_string();
            let line = format!("[{label}] {caller}: {:?}", ctx.arguments());
            if let Ok(tx) = tx.lock() {
                let _ = tx.send(line);
            }
        }
    };

    let operator_only = Condition::new(|c: &dyn CallerIdentity| c.is_privileged());
    let gift = CommandDeclaration::builder("gift")
        .description("Give yourself an item")
        .aliases(["present"])
        .permission(Permission::default_true("gift.use"))
        .argument(Token::argument_with_suggester(
            "item",
            arguments::word(),
            |partial: &str, _: &CommandContext| {
                ["sword", "shield", "bow"]
                    .into_iter()
                    .filter(|item| item.starts_with(partial))
                    .map(String::from)
                    .collect::<Vec<_>>()
            },
        ))
        .argument(Token::argument("amount", arguments::integer_between(1, 64)))
        .execute(report("gift"), &["item"])
        .execute_conditional(operator_only, report("gift many"), &["item", "amount"])
        .sub_command(
            CommandDeclaration::builder("list")
                .default_handler(report("list"))
                .build()
                .expect("list declaration"),
        )
        .build()
        .expect("gift declaration");

    println!("Tree paths:");
    for path in gift.build().terminal_paths() {
        println!("  /{path}");
    }

    let mut registry = Registry::new(EngineConfig::default(), |caller: &StaticCaller| {
        Arc::new(caller.clone()) as Arc<dyn CallerIdentity>
    })
    .expect("worker pool");
    registry.register(&gift).expect("register gift");

    let steve = StaticCaller::player("Steve").with_id(Uuid::new_v4());
    let admin = StaticCaller::player("Alex").operator();
    let console = StaticCaller::console();

    let attempts: [(&str, &StaticCaller); 5] = [
        ("/gift sword", &steve),
        ("/present list", &steve),
        ("/gift sword 5", &steve),
        ("/gift sword 5", &admin),
        ("/gift", &console),
    ];

    println!("\nDispatch:");
    for (input, caller) in attempts {
        match registry.execute(input, caller) {
            Ok(status) => {
                let report = rx
                    .recv_timeout(Duration::from_secs(2))
                    .unwrap_or_else(|_| "<no report>".to_string());
                println!("  {input:<16} -> {status:?}: {report}");
            }
            Err(err) => println!("  {input:<16} -> {err}"),
        }
    }

    println!("\nCompletion for Steve:");
    for input in ["/g", "/gift ", "/gift s"] {
        println!("  {input:<10} -> {:?}", registry.suggest(input, &steve));
    }

    println!("\nUsage for Alex:");
    for line in registry.usage("gift", &admin) {
        println!("  /{line}");
    }
}
