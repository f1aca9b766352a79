//! YAML schema loader.
//!
//! Each file holds one schema under a `schema:` key:
//!
//! ```yaml
//! schema:
//!   name: CreateOrder
//!   required: [userId]
//!   fields:
//!     - name: userId
//!       type: int
//!     - name: tags
//!       type: array
//!       doc: |
//!         @itemType Tag
//!         @notEmpty
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::naming::to_snake_case;
use crate::schema::types::{SchemaDef, SchemaSpec};

/// Load all schema definitions from a directory
///
/// Only `.yaml` and `.yml` files are read. Files are loaded in name order so
/// that error reports are stable.
///
/// # Example
///
/// ```ignore
/// use reqbind::schema::load_schemas;
///
/// let schemas = load_schemas("config/schemas").unwrap();
/// ```
pub fn load_schemas<P: AsRef<Path>>(dir: P) -> Result<Vec<SchemaDef>, String> {
    let dir_path = dir.as_ref();

    if !dir_path.exists() {
        return Err(format!("Directory does not exist: {}", dir_path.display()));
    }

    if !dir_path.is_dir() {
        return Err(format!("Path is not a directory: {}", dir_path.display()));
    }

    let read_dir = fs::read_dir(dir_path)
        .map_err(|e| format!("Failed to read directory {}: {}", dir_path.display(), e))?;

    let mut paths = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| format!("Failed to read directory entry: {}", e))?;
        let path = entry.path();
        if let Some(ext) = path.extension() {
            if ext == "yaml" || ext == "yml" {
                paths.push(path);
            }
        }
    }
    paths.sort();

    let mut schemas = Vec::with_capacity(paths.len());
    let mut names = HashSet::new();
    for path in paths {
        let schema =
            load_schema(&path).map_err(|e| format!("Failed to load {}: {}", path.display(), e))?;
        if !names.insert(schema.name.clone()) {
            return Err(format!(
                "Duplicate schema '{}' in {}",
                schema.name,
                path.display()
            ));
        }
        schemas.push(schema);
    }

    tracing::debug!(count = schemas.len(), dir = %dir_path.display(), "Loaded schema definitions");
    Ok(schemas)
}

/// Load a single schema definition from a YAML file
pub fn load_schema<P: AsRef<Path>>(path: P) -> Result<SchemaDef, String> {
    let path = path.as_ref();

    let yaml_content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;

    parse_schema(&yaml_content)
}

/// Parse and validate a schema from YAML text.
pub fn parse_schema(yaml_content: &str) -> Result<SchemaDef, String> {
    let spec: SchemaSpec =
        serde_yaml::from_str(yaml_content).map_err(|e| format!("Failed to parse YAML: {}", e))?;

    validate_schema(&spec.schema)?;
    Ok(spec.schema)
}

/// Check a schema on its own, without looking at the schemas it refers to.
///
/// - the schema and every field have a name
/// - field names are unique
/// - `required` and `not_empty` only list declared fields, by field name,
///   snake_case name or explicit `request_var`
pub fn validate_schema(schema: &SchemaDef) -> Result<(), String> {
    if schema.name.trim().is_empty() {
        return Err("Schema name cannot be empty".to_string());
    }

    let mut seen = HashSet::new();
    for field in &schema.fields {
        if field.name.trim().is_empty() {
            return Err(format!("Schema '{}' has a field with an empty name", schema.name));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(format!(
                "Schema '{}' declares field '{}' more than once",
                schema.name, field.name
            ));
        }
    }

    let mut known: HashSet<String> = HashSet::new();
    for field in &schema.fields {
        known.insert(field.name.clone());
        known.insert(to_snake_case(&field.name));
        if let Some(key) = &field.request_var {
            known.insert(key.clone());
        }
    }

    for (list, names) in [("required", &schema.required), ("not_empty", &schema.not_empty)] {
        for name in names {
            if !known.contains(name) {
                return Err(format!(
                    "Schema '{}' lists unknown field '{}' in '{}'",
                    schema.name, name, list
                ));
            }
        }
    }

    Ok(())
}
