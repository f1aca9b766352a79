//! Schema declarations, annotation parsing and the schema registry.

pub mod annotations;
pub mod introspect;
pub mod loader;
pub mod registry;
pub mod types;

pub use annotations::Annotations;
pub use introspect::{introspect, FieldDescriptor};
pub use loader::{load_schema, load_schemas, parse_schema, validate_schema};
pub use registry::{Schema, SchemaRegistry};
pub use types::{FieldDef, FieldType, ItemType, ScalarKind, SchemaDef, SchemaSpec};
