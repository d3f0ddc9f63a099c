//! Manifest-driven registration.
//!
//! Loads commands from a YAML manifest, binds handler ids to closures,
//! and shows validation, strict registration and completion.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p command-tree-demos --example manifest_registry
//! ```

use std::sync::Arc;

use command_tree_core::{
    CallerIdentity, CommandContext, HandlerTable, ManifestFile, StaticCaller, validate_declaration,
};
use command_tree_engine::{EngineConfig, Registry};

const MANIFEST: &str = r#"
version: "1.0"
commands:
  - name: warp
    aliases: [w]
    description: Named teleport points
    permissions:
      - node: warp.use
        default: "true"
    arguments:
      - name: name
        type: word
        suggestions: [spawn, shop, arena]
      - name: x
        type: integer
      - name: z
        type: integer
    syntaxes:
      - tokens: ["<name>"]
        handler: warp
      - tokens: [set, "<name>", "<x>", "<z>"]
        handler: warp_set
        permissions:
          - node: warp.admin
            default: if_op
    subcommands:
      - name: list
        default: warp_list
  - name: stop
    scope: non_interactive
    default: stop
"#;

fn main() {
    let manifest = ManifestFile::from_yaml_str(MANIFEST).expect("manifest parses");

    let mut handlers = HandlerTable::new();
    for id in manifest.handler_ids() {
        let name = id.clone();
        handlers.insert(id, move |ctx: &CommandContext| {
            println!("    handler {name} ran with {:?}", ctx.arguments());
        });
    }

    let declarations = manifest.into_declarations(&handlers).expect("manifest unpacks");
    for declaration in &declarations {
        let problems = validate_declaration(declaration);
        println!("{}: {} validation problem(s)", declaration.name(), problems.len());
    }

    let mut registry = Registry::new(EngineConfig::default().strict(), |caller: &StaticCaller| {
        Arc::new(caller.clone()) as Arc<dyn CallerIdentity>
    })
    .expect("worker pool");
    let count = registry
        .register_manifest(&manifest, &handlers)
        .expect("strict registration");
    println!("registered {count} command(s)\n");

    let player = StaticCaller::player("Steve");
    let console = StaticCaller::console();

    for (who, caller) in [("Steve", &player), ("console", &console)] {
        println!("{who}:");
        println!("  labels      {:?}", registry.suggest("", caller));
        println!("  /w <tab>    {:?}", registry.suggest("/w ", caller));
        for input in ["/w spawn", "/warp set home 10 20", "/stop"] {
            match registry.execute(input, caller) {
                Ok(status) => println!("  {input:<22} {status:?}"),
                Err(err) => println!("  {input:<22} {err}"),
            }
        }
        // Give handlers a moment to print before the next caller.
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
}
