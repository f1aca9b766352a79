//! reqbind CLI - bind JSON parameters against YAML schemas
//!
//! Loads schema definitions from a directory and either checks them or binds
//! JSON documents (a single object, or NDJSON) into bound objects.

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process;

use reqbind::naming::to_snake_case;
use reqbind::serialization::{write_pretty, JsonArrayWriter, NdjsonWriter, WriteError};
use reqbind::{Binder, BoundObject, FieldDescriptor, FieldType, Schema, SchemaRegistry};

/// Environment variable naming the default schema directory
const SCHEMA_DIR_ENV: &str = "REQBIND_SCHEMA_DIR";
const DEFAULT_SCHEMA_DIR: &str = "config/schemas";

#[derive(Parser)]
#[command(name = "reqbind")]
#[command(version, about = "Bind JSON request parameters against annotated YAML schemas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate schemas, then print their resolved fields
    Check {
        /// Schema directory (default: $REQBIND_SCHEMA_DIR or config/schemas)
        #[arg(short, long)]
        schemas: Option<PathBuf>,
    },

    /// Bind a JSON document against a schema and print the result
    Bind {
        /// Schema directory (default: $REQBIND_SCHEMA_DIR or config/schemas)
        #[arg(short, long)]
        schemas: Option<PathBuf>,

        /// Name of the schema to bind into
        #[arg(long)]
        schema: String,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Treat input as newline-delimited JSON, one parameter map per line
        #[arg(long, default_value_t = false)]
        ndjson: bool,

        /// With --ndjson, write all bound objects as a single JSON array
        #[arg(long, default_value_t = false, requires = "ndjson")]
        array: bool,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { schemas } => check_schemas(schema_dir(schemas)),
        Commands::Bind { schemas, schema, input, ndjson, array, output } => {
            let mode = match (ndjson, array) {
                (false, _) => InputMode::Single,
                (true, false) => InputMode::Lines,
                (true, true) => InputMode::LinesToArray,
            };
            bind_input(schema_dir(schemas), &schema, input, mode, output)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Schema directory precedence: CLI > ENV > default
fn schema_dir(cli_override: Option<PathBuf>) -> PathBuf {
    cli_override
        .or_else(|| std::env::var(SCHEMA_DIR_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SCHEMA_DIR))
}

fn load_registry(dir: &PathBuf) -> Result<SchemaRegistry, String> {
    let mut registry = SchemaRegistry::new();
    let count = registry
        .load_dir(dir)
        .map_err(|e| format!("Failed to load schemas: {}", e))?;
    tracing::info!(count, dir = %dir.display(), "Schemas loaded");
    Ok(registry)
}

fn check_schemas(dir: PathBuf) -> Result<(), String> {
    let registry = load_registry(&dir)?;

    for schema in registry.schemas() {
        println!("{}", schema.name());
        for field in schema.fields() {
            println!(
                "  {}: {} [{}]",
                field.name,
                field.declared_type,
                field_notes(schema, field).join(", ")
            );
        }
    }

    println!("✓ {} schemas valid", registry.len());
    Ok(())
}

/// Constraints and callbacks of one field, as shown by `check`.
fn field_notes(schema: &Schema, field: &FieldDescriptor) -> Vec<String> {
    let annotations = &field.annotations;
    let key = annotations
        .request_var
        .clone()
        .unwrap_or_else(|| to_snake_case(&field.name));

    let mut notes = Vec::new();
    if annotations.required || schema.is_always_required(&field.name, &key) {
        notes.push("required".to_string());
    }
    if annotations.not_empty || schema.is_always_not_empty(&field.name, &key) {
        notes.push("not empty".to_string());
    }
    if let Some(request_var) = &annotations.request_var {
        notes.push(format!("key={}", request_var));
    }
    if field.declared_type == FieldType::Array {
        notes.push(format!("items={}", annotations.item_type));
    }
    for (stage, callback) in [
        ("before", &annotations.before_init_callback),
        ("after", &annotations.after_init_callback),
        ("after_obj", &annotations.after_obj_init_callback),
    ] {
        if let Some(callback) = callback {
            notes.push(format!("{}={}", stage, callback));
        }
    }
    notes
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum InputMode {
    /// One JSON object, pretty-printed result
    Single,
    /// NDJSON in, NDJSON out
    Lines,
    /// NDJSON in, one JSON array out
    LinesToArray,
}

enum LineSink<W: io::Write> {
    Lines(NdjsonWriter<W>),
    Array(JsonArrayWriter<W>),
}

impl<W: io::Write> LineSink<W> {
    fn write(&mut self, object: &BoundObject) -> Result<(), WriteError> {
        match self {
            LineSink::Lines(writer) => writer.write(object),
            LineSink::Array(writer) => writer.write(object),
        }
    }

    fn finish(self) -> Result<(), WriteError> {
        match self {
            LineSink::Lines(mut writer) => writer.flush(),
            LineSink::Array(writer) => writer.finish().map(|_| ()),
        }
    }
}

fn bind_input(
    dir: PathBuf,
    schema: &str,
    input: Option<PathBuf>,
    mode: InputMode,
    output: Option<PathBuf>,
) -> Result<(), String> {
    let registry = load_registry(&dir)?;
    if !registry.contains(schema) {
        return Err(format!("Unknown schema: {}", schema));
    }
    let binder = Binder::new(&registry);

    let reader: Box<dyn Read> = match &input {
        Some(path) => Box::new(
            fs::File::open(path)
                .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?,
        ),
        None => Box::new(io::stdin()),
    };
    let writer: Box<dyn io::Write> = match &output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
            }
            Box::new(
                fs::File::create(path)
                    .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?,
            )
        }
        None => Box::new(io::stdout()),
    };

    let mut sink = match mode {
        InputMode::Single => {
            let document: serde_json::Value = serde_json::from_reader(reader)
                .map_err(|e| format!("Failed to parse JSON input: {}", e))?;
            let object = binder.bind_json(&document, schema).map_err(|e| e.to_string())?;
            return write_pretty(writer, &object).map_err(|e| e.to_string());
        }
        InputMode::Lines => LineSink::Lines(NdjsonWriter::new(writer)),
        InputMode::LinesToArray => {
            LineSink::Array(JsonArrayWriter::new(writer).map_err(|e| e.to_string())?)
        }
    };

    let mut failures = 0usize;
    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| format!("Failed to read input: {}", e))?;
        if line.trim().is_empty() {
            continue;
        }
        let bound = serde_json::from_str::<serde_json::Value>(&line)
            .map_err(|e| format!("invalid JSON: {}", e))
            .and_then(|document| binder.bind_json(&document, schema).map_err(|e| e.to_string()));
        match bound {
            Ok(object) => sink.write(&object).map_err(|e| e.to_string())?,
            Err(e) => {
                failures += 1;
                tracing::warn!(line = line_no, error = %e, "Line failed to bind");
                eprintln!("line {}: {}", line_no, e);
            }
        }
    }
    sink.finish().map_err(|e| e.to_string())?;

    if failures > 0 {
        return Err(format!("{} line(s) failed to bind", failures));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    const USER_SCHEMA: &str = r#"
schema:
  name: User
  required: [user_id]
  fields:
    - name: userId
      type: int
    - name: nickname
      type: string
      doc: "/** @notEmpty @requestVar nick */"
"#;

    fn workspace() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let schemas = dir.path().join("schemas");
        fs::create_dir_all(&schemas).unwrap();
        fs::write(schemas.join("user.yaml"), USER_SCHEMA).unwrap();
        (dir, schemas)
    }

    fn write_input(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_field_notes_match_wire_keys() {
        let (_dir, schemas) = workspace();
        let registry = load_registry(&schemas).unwrap();
        let schema = registry.get("User").unwrap();
        let fields = schema.fields();

        assert_eq!(field_notes(schema, &fields[0]), vec!["required"]);
        assert_eq!(field_notes(schema, &fields[1]), vec!["not empty", "key=nick"]);
    }

    #[test]
    fn test_bind_single_document() {
        let (dir, schemas) = workspace();
        let input = write_input(dir.path(), "in.json", r#"{"user_id": "7", "nick": "al"}"#);
        let output = dir.path().join("out/user.json");

        bind_input(schemas, "User", Some(input), InputMode::Single, Some(output.clone())).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!({"userId": 7, "nickname": "al"}));
    }

    #[test]
    fn test_bind_lines_to_array_reports_failures() {
        let (dir, schemas) = workspace();
        let input = write_input(
            dir.path(),
            "in.ndjson",
            "{\"user_id\": 1, \"nick\": \"a\"}\n\n{\"nick\": \"b\"}\n{\"userId\": 3, \"nick\": \"c\"}\n",
        );
        let output = dir.path().join("out.json");

        let err = bind_input(
            schemas,
            "User",
            Some(input),
            InputMode::LinesToArray,
            Some(output.clone()),
        )
        .unwrap_err();
        assert_eq!(err, "1 line(s) failed to bind");

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(
            written,
            serde_json::json!([
                {"userId": 1, "nickname": "a"},
                {"userId": 3, "nickname": "c"}
            ])
        );
    }

    #[test]
    fn test_bind_lines() {
        let (dir, schemas) = workspace();
        let input = write_input(dir.path(), "in.ndjson", "{\"user_id\": 1, \"nick\": \"a\"}\n");
        let output = dir.path().join("out.ndjson");

        bind_input(schemas, "User", Some(input), InputMode::Lines, Some(output.clone())).unwrap();

        assert_eq!(
            fs::read_to_string(output).unwrap(),
            "{\"userId\":1,\"nickname\":\"a\"}\n"
        );
    }

    #[test]
    fn test_bind_unknown_schema() {
        let (_dir, schemas) = workspace();
        let err = bind_input(schemas, "Nope", None, InputMode::Single, None).unwrap_err();
        assert_eq!(err, "Unknown schema: Nope");
    }
}
