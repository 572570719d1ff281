use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use metatree_access::{AccessConfig, Accessor, ChildSlot, Document, SharedDocument};
use metatree_builder::{SchemaBuilder, StaticStandard};
use metatree_core::{Schema, validate_schema};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `METATREE_LOG=debug`.
const LOG_ENV: &str = "METATREE_LOG";

#[derive(Debug, Parser)]
#[command(name = "metatree")]
#[command(about = "Derive metadata tree schemas and read or edit tree documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Derive a schema from a metadata standard description.
    Derive(DeriveArgs),
    /// Check one or more schema JSON files for structural errors.
    Validate(ValidateArgs),
    /// Print the element tree of a schema.
    Tree(TreeArgs),
    /// Print one attribute of a document node.
    Get(GetArgs),
    /// Write one attribute of a document node and save the document.
    Set(SetArgs),
}

#[derive(Debug, Args)]
struct DeriveArgs {
    /// Standard description file (.yaml, .yml or .json).
    #[arg(long)]
    standard: PathBuf,
    /// Structured type to derive from.
    #[arg(long)]
    root_type: String,
    /// Element name for the root type (default: the type name).
    #[arg(long)]
    root_name: Option<String>,
    /// Name of the schema's root element.
    #[arg(long, default_value = "Root")]
    root: String,
    /// Type to leave out of the schema; may be repeated.
    #[arg(long)]
    exclude: Vec<String>,
    /// Mark the derived element optional under the root.
    #[arg(long)]
    optional: bool,
    /// Output schema JSON path (default: stdout).
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Schema JSON files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct TreeArgs {
    /// Schema JSON file.
    #[arg(long)]
    schema: PathBuf,
}

#[derive(Debug, Args)]
struct NodeArgs {
    /// Schema JSON file.
    #[arg(long)]
    schema: PathBuf,
    /// Document JSON file.
    #[arg(long)]
    document: PathBuf,
    /// Access configuration YAML file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Slash-separated path from the document root.
    #[arg(long, default_value = "")]
    path: String,
    /// Child slot to enumerate at the path; `#auto` for the repeated component.
    #[arg(long)]
    slot: Option<String>,
    /// Index of the child to focus; the node at the path itself if omitted.
    #[arg(long, requires = "slot")]
    index: Option<usize>,
    /// Attribute name.
    #[arg(long)]
    attribute: String,
}

#[derive(Debug, Args)]
struct GetArgs {
    #[command(flatten)]
    node: NodeArgs,
}

#[derive(Debug, Args)]
struct SetArgs {
    #[command(flatten)]
    node: NodeArgs,
    /// New attribute text; empty removes the attribute.
    #[arg(long, allow_hyphen_values = true)]
    value: String,
    /// Append a child to the slot and write to it.
    #[arg(long, requires = "slot", conflicts_with = "index")]
    append: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Derive(args) => run_derive(args),
        Command::Validate(args) => run_validate(args),
        Command::Tree(args) => run_tree(args),
        Command::Get(args) => run_get(args),
        Command::Set(args) => run_set(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_derive(args: DeriveArgs) -> Result<(), String> {
    let standard = StaticStandard::load(&args.standard).map_err(|err| {
        format!("Failed to load standard '{}': {err}", args.standard.display())
    })?;
    let root_name = args.root_name.as_deref().unwrap_or(&args.root_type);

    let schema_name = standard.name.clone();
    let mut builder = args
        .exclude
        .iter()
        .fold(SchemaBuilder::new(Schema::new(schema_name, args.root.as_str())), |builder, excluded| {
            builder.exclude_type(excluded)
        });
    builder
        .build(&standard, &args.root_type, root_name, None, !args.optional)
        .map_err(|err| format!("Failed to derive '{}': {err}", args.root_type))?;
    let schema = builder.finish();

    let raw = schema
        .to_json()
        .map_err(|err| format!("Failed to serialize schema: {err}"))?;
    match &args.output {
        Some(path) => {
            fs::write(path, raw)
                .map_err(|err| format!("Failed to write '{}': {err}", path.display()))?;
            println!(
                "Derived {} element(s) into '{}'.",
                schema.len(),
                path.display()
            );
        }
        None => println!("{raw}"),
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let mut failures = 0usize;
    for path in &args.inputs {
        let schema = load_schema(path)?;
        let errors = validate_schema(&schema);
        for error in &errors {
            eprintln!("{}: {error}", path.display());
        }
        if !errors.is_empty() {
            failures += 1;
        }
    }
    if failures > 0 {
        return Err(format!(
            "{failures} of {} schema file(s) failed validation",
            args.inputs.len()
        ));
    }
    println!("Validated {} schema file(s).", args.inputs.len());
    Ok(())
}

fn run_tree(args: TreeArgs) -> Result<(), String> {
    let schema = load_schema(&args.schema)?;
    print!("{}", schema.render_tree());
    Ok(())
}

fn run_get(args: GetArgs) -> Result<(), String> {
    let mut config = load_config(args.node.config.as_deref())?;
    config.read_only = true;
    let document = load_document(&args.node, config)?;
    let accessor = focus(&document, &args.node)?;
    if let Some(text) = accessor.get_text(&args.node.attribute) {
        println!("{text}");
    }
    Ok(())
}

fn run_set(args: SetArgs) -> Result<(), String> {
    let mut config = load_config(args.node.config.as_deref())?;
    config.read_only = false;
    let document = load_document(&args.node, config)?;

    let mut accessor = focus(&document, &args.node)?;
    if args.append {
        let index = accessor.append_child().map_err(|err| err.to_string())?;
        accessor.select_child(index).map_err(|err| err.to_string())?;
    }
    accessor
        .set_text(&args.node.attribute, &args.value)
        .map_err(|err| err.to_string())?;

    document
        .borrow()
        .save_json(&args.node.document)
        .map_err(|err| format!("Failed to write '{}': {err}", args.node.document.display()))?;
    info!(path = %accessor.path(), attribute = %args.node.attribute, "Attribute written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_schema(path: &Path) -> Result<Schema, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    Schema::from_json(&raw).map_err(|err| format!("Invalid schema '{}': {err}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<AccessConfig, String> {
    match path {
        Some(path) => AccessConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display())),
        None => Ok(AccessConfig::default()),
    }
}

/// Loads the document, or starts an empty one if a writable file is missing.
fn load_document(args: &NodeArgs, config: AccessConfig) -> Result<SharedDocument, String> {
    let schema = Arc::new(load_schema(&args.schema)?);
    let document = if args.document.exists() {
        Document::load_json(schema, &args.document, config)
            .map_err(|err| format!("Failed to load document '{}': {err}", args.document.display()))?
    } else if !config.read_only {
        Document::new(schema, config)
    } else {
        return Err(format!(
            "Document '{}' does not exist",
            args.document.display()
        ));
    };
    Ok(document.into_shared())
}

fn focus(document: &SharedDocument, args: &NodeArgs) -> Result<Accessor, String> {
    let slot = args.slot.as_deref().map(ChildSlot::parse).unwrap_or_default();
    let mut accessor =
        Accessor::new(document, &args.path, slot).map_err(|err| err.to_string())?;
    match args.index {
        Some(index) => accessor.select_child(index).map_err(|err| err.to_string())?,
        None => accessor.select_parent(),
    }
    Ok(accessor)
}
