use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_command-tree");

const GIFT_MANIFEST: &str = r#"
version: "1.0"
commands:
  - name: gift
    aliases: [present]
    description: Give yourself an item
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
        handler: gift_many
        permissions:
          - node: gift.bulk
            default: if_op
    subcommands:
      - name: list
        default: gift_list
"#;

/// Writes `contents` as `name` inside `dir`.
fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("failed to write test file");
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(BIN).args(args).output().expect("failed to run binary")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp path is not UTF-8")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ---------------------------------------------------------------------------
// tree
// ---------------------------------------------------------------------------

#[test]
fn tree_prints_merged_nodes() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(&dir, "gift.yaml", GIFT_MANIFEST);

    let output = run(&["tree", path_str(&manifest)]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        [
            "gift",
            "  <item> (word) *",
            "    <amount> (integer) *",
            "  list *",
        ]
    );
}

#[test]
fn tree_json_output() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(&dir, "gift.yaml", GIFT_MANIFEST);

    let output = run(&["tree", path_str(&manifest), "--format", "json"]);
    assert!(output.status.success());

    let views: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(views[0]["token"], "gift");
    assert_eq!(views[0]["executable"], false);
    assert_eq!(views[0]["children"][0]["type"], "word");
    assert_eq!(views[0]["children"][1]["token"], "list");
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_dispatches_argument_path() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(&dir, "gift.yaml", GIFT_MANIFEST);

    let output = run(&["run", path_str(&manifest), "--name", "Steve", "/gift", "sword"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let invocation: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(invocation["handler"], "gift");
    assert_eq!(invocation["caller"], "Steve");
    assert_eq!(invocation["arguments"]["item"], "sword");
}

#[test]
fn run_prefers_sub_command_over_argument() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(&dir, "gift.yaml", GIFT_MANIFEST);

    let output = run(&["run", path_str(&manifest), "present", "list"]);
    assert!(output.status.success());

    let invocation: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(invocation["handler"], "gift_list");
    assert!(invocation["arguments"].as_object().unwrap().is_empty());
}

#[test]
fn run_bulk_syntax_requires_operator() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(&dir, "gift.yaml", GIFT_MANIFEST);
    let path = path_str(&manifest);

    let denied = run(&["run", path, "--name", "Steve", "gift", "sword", "5"]);
    assert!(!denied.status.success());
    assert!(String::from_utf8_lossy(&denied.stderr).contains("Incorrect argument for command"));

    let allowed = run(&["run", path, "--name", "Steve", "--op", "gift", "sword", "5"]);
    assert!(allowed.status.success());
    let invocation: serde_json::Value = serde_json::from_str(stdout(&allowed).trim()).unwrap();
    assert_eq!(invocation["handler"], "gift_many");
    assert_eq!(invocation["arguments"]["amount"], 5);
}

#[test]
fn run_reports_unknown_command() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(&dir, "gift.yaml", GIFT_MANIFEST);

    let output = run(&["run", path_str(&manifest), "/teleport"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown or incomplete command"));
}

#[test]
fn run_reports_parse_error_with_context() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(&dir, "gift.yaml", GIFT_MANIFEST);

    let output = run(&["run", path_str(&manifest), "--op", "gift", "sword", "100"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Integer must not be more than 64, found 100"), "stderr: {stderr}");
    assert!(stderr.contains("<--[HERE]"));
}

// ---------------------------------------------------------------------------
// complete / usage
// ---------------------------------------------------------------------------

#[test]
fn complete_suggests_children_and_labels() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(&dir, "gift.yaml", GIFT_MANIFEST);
    let path = path_str(&manifest);

    let output = run(&["complete", path, "/gift s", "--name", "Steve"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).lines().collect::<Vec<_>>(), ["sword", "shield"]);

    let output = run(&["complete", path, "p"]);
    assert_eq!(stdout(&output).lines().collect::<Vec<_>>(), ["present"]);
}

#[test]
fn usage_depends_on_caller() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(&dir, "gift.yaml", GIFT_MANIFEST);
    let path = path_str(&manifest);

    let player = run(&["usage", path, "--name", "Steve"]);
    assert_eq!(
        stdout(&player).lines().collect::<Vec<_>>(),
        ["/gift <item>", "/gift list"]
    );

    let denied = run(&["usage", path, "--name", "Steve", "--deny", "gift.use"]);
    assert!(denied.status.success());
    assert!(stdout(&denied).is_empty());

    let console = run(&["usage", path, "--command", "present"]);
    assert_eq!(
        stdout(&console).lines().collect::<Vec<_>>(),
        ["/gift <item>", "/gift <item> <amount>", "/gift list"]
    );
}

// ---------------------------------------------------------------------------
// validate / config
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_clean_manifest() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(&dir, "gift.yaml", GIFT_MANIFEST);

    let output = run(&["validate", path_str(&manifest)]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("1 command(s)"));
}

#[test]
fn validate_reports_duplicate_paths() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(
        &dir,
        "dup.yaml",
        r#"
commands:
  - name: warp
    syntaxes:
      - tokens: [list]
        handler: a
      - tokens: [list]
        handler: b
"#,
    );

    let output = run(&["validate", path_str(&manifest)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("duplicate syntax path: warp list"), "stderr: {stderr}");
}

#[test]
fn validate_only_warns_about_sub_command_override() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(
        &dir,
        "override.yaml",
        r#"
commands:
  - name: gift
    syntaxes:
      - tokens: [list]
        handler: a
    subcommands:
      - name: list
        default: b
"#,
    );

    let output = run(&["validate", path_str(&manifest)]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning: sub-command shadows syntax literal: gift.list"), "stderr: {stderr}");
}

#[test]
fn strict_config_rejects_invalid_manifest() {
    let dir = TempDir::new().unwrap();
    let config = write_file(&dir, "engine.yaml", "strict_declarations: true\nworker_threads: 1\n");
    let manifest = write_file(
        &dir,
        "dup.yaml",
        r#"
commands:
  - name: warp
    syntaxes:
      - tokens: [list]
        handler: a
      - tokens: [list]
        handler: b
"#,
    );

    let lenient = run(&["run", path_str(&manifest), "warp", "list"]);
    assert!(lenient.status.success());
    let invocation: serde_json::Value = serde_json::from_str(stdout(&lenient).trim()).unwrap();
    assert_eq!(invocation["handler"], "a");

    let strict = run(&["--config", path_str(&config), "run", path_str(&manifest), "warp", "list"]);
    assert!(!strict.status.success());
    assert!(String::from_utf8_lossy(&strict.stderr).contains("failed validation"));
}

#[test]
fn missing_manifest_fails_cleanly() {
    let output = run(&["tree", "/definitely/missing.yaml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load"));
}
