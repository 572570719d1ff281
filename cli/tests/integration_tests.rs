use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const STANDARD: &str = r#"
name: raster
types:
  Grid:
    description: Gridded coverage
    properties:
      - key: name
        type: string
        obligation: mandatory
      - key: fillValues
        type: double
        collection: true
      - key: bands
        type: Band
        collection: true
  Band:
    identifier: SampleDimension
    properties:
      - key: name
        type: string
      - key: minimum
        type: double
"#;

fn metatree(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_metatree"))
        .args(args)
        .output()
        .expect("failed to run metatree")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// Writes the standard and derives `schema.json` from it.
fn derive_schema(dir: &TempDir) -> PathBuf {
    let standard = dir.path().join("raster.yaml");
    fs::write(&standard, STANDARD).unwrap();
    let schema = dir.path().join("schema.json");

    let output = metatree(&[
        "derive",
        "--standard",
        arg(&standard),
        "--root-type",
        "Grid",
        "--output",
        arg(&schema),
    ]);
    assert!(output.status.success(), "derive failed: {output:?}");
    schema
}

// ---------------------------------------------------------------------------
// Schema commands
// ---------------------------------------------------------------------------

#[test]
fn derive_writes_schema_json() {
    let dir = TempDir::new().unwrap();
    let schema = derive_schema(&dir);

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&schema).unwrap()).unwrap();
    assert_eq!(json["name"], "raster");
    assert_eq!(json["root"], "Root");
    assert!(json["elements"]["SampleDimension"].is_object());
}

#[test]
fn derive_prints_to_stdout_without_output() {
    let dir = TempDir::new().unwrap();
    let standard = dir.path().join("raster.yaml");
    fs::write(&standard, STANDARD).unwrap();

    let output = metatree(&["derive", "--standard", arg(&standard), "--root-type", "Grid"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(json["elements"]["bands"].is_object());
}

#[test]
fn derive_rejects_unknown_root_type() {
    let dir = TempDir::new().unwrap();
    let standard = dir.path().join("raster.yaml");
    fs::write(&standard, STANDARD).unwrap();

    let output = metatree(&["derive", "--standard", arg(&standard), "--root-type", "Nothing"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Nothing"));
}

#[test]
fn validate_accepts_derived_schema() {
    let dir = TempDir::new().unwrap();
    let schema = derive_schema(&dir);

    let output = metatree(&["validate", arg(&schema)]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Validated 1 schema file(s)."));
}

#[test]
fn validate_rejects_dangling_child() {
    let dir = TempDir::new().unwrap();
    let schema = derive_schema(&dir);

    let mut json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&schema).unwrap()).unwrap();
    json["elements"].as_object_mut().unwrap().remove("SampleDimension");
    let broken = dir.path().join("broken.json");
    fs::write(&broken, serde_json::to_string(&json).unwrap()).unwrap();

    let output = metatree(&["validate", arg(&schema), arg(&broken)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("1 of 2 schema file(s) failed validation"));
}

#[test]
fn tree_renders_elements_and_attributes() {
    let dir = TempDir::new().unwrap();
    let schema = derive_schema(&dir);

    let output = metatree(&["tree", "--schema", arg(&schema)]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("Root ("));
    assert!(text.contains("  Grid ("));
    assert!(text.contains("@fillValues: list"));
    assert!(text.contains("SampleDimension ("));
}

// ---------------------------------------------------------------------------
// Document commands
// ---------------------------------------------------------------------------

#[test]
fn set_creates_document_and_get_reads_it_back() {
    let dir = TempDir::new().unwrap();
    let schema = derive_schema(&dir);
    let document = dir.path().join("grid.json");

    let output = metatree(&[
        "set",
        "--schema",
        arg(&schema),
        "--document",
        arg(&document),
        "--path",
        "Grid",
        "--attribute",
        "fillValues",
        "--value",
        "0 -9999",
    ]);
    assert!(output.status.success(), "set failed: {output:?}");
    assert!(document.exists());

    let output = metatree(&[
        "get",
        "--schema",
        arg(&schema),
        "--document",
        arg(&document),
        "--path",
        "Grid",
        "--attribute",
        "fillValues",
    ]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "0 -9999");
}

#[test]
fn set_appends_repeated_children() {
    let dir = TempDir::new().unwrap();
    let schema = derive_schema(&dir);
    let document = dir.path().join("grid.json");

    for name in ["red", "green"] {
        let output = metatree(&[
            "set",
            "--schema",
            arg(&schema),
            "--document",
            arg(&document),
            "--path",
            "Grid/bands",
            "--slot",
            "#auto",
            "--append",
            "--attribute",
            "name",
            "--value",
            name,
        ]);
        assert!(output.status.success(), "set failed: {output:?}");
    }

    let output = metatree(&[
        "get",
        "--schema",
        arg(&schema),
        "--document",
        arg(&document),
        "--path",
        "Grid/bands",
        "--slot",
        "#auto",
        "--index",
        "1",
        "--attribute",
        "name",
    ]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "green");
}

#[test]
fn get_missing_path_fails_without_creating() {
    let dir = TempDir::new().unwrap();
    let schema = derive_schema(&dir);
    let document = dir.path().join("grid.json");
    fs::write(&document, r#"{"name": "Root"}"#).unwrap();

    let output = metatree(&[
        "get",
        "--schema",
        arg(&schema),
        "--document",
        arg(&document),
        "--path",
        "Grid",
        "--attribute",
        "name",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
    assert_eq!(fs::read_to_string(&document).unwrap(), r#"{"name": "Root"}"#);
}

#[test]
fn get_requires_existing_document() {
    let dir = TempDir::new().unwrap();
    let schema = derive_schema(&dir);

    let output = metatree(&[
        "get",
        "--schema",
        arg(&schema),
        "--document",
        arg(&dir.path().join("missing.json")),
        "--attribute",
        "name",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn set_respects_slot_index_bounds() {
    let dir = TempDir::new().unwrap();
    let schema = derive_schema(&dir);
    let document = dir.path().join("grid.json");

    let output = metatree(&[
        "set",
        "--schema",
        arg(&schema),
        "--document",
        arg(&document),
        "--path",
        "Grid/bands",
        "--slot",
        "#auto",
        "--index",
        "0",
        "--attribute",
        "name",
        "--value",
        "red",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("out of bounds"));
    assert!(!document.exists());
}
