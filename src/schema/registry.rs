//! Registered schemas and their callbacks.

use indexmap::map::Entry;
use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use crate::callback_registry::{CallbackError, CallbackRegistry, InitHook};
use crate::schema::introspect::{introspect, FieldDescriptor};
use crate::schema::loader::{load_schema, load_schemas, validate_schema};
use crate::schema::types::{FieldType, ItemType, SchemaDef};
use crate::value::{BoundObject, FieldValue};

/// A registered schema: its declaration, cached field descriptors,
/// callbacks and post-construction hook.
pub struct Schema {
    def: SchemaDef,
    descriptors: OnceLock<Vec<FieldDescriptor>>,
    callbacks: CallbackRegistry,
    init_hook: Option<Box<dyn InitHook>>,
}

impl Schema {
    pub fn new(def: SchemaDef) -> Self {
        Self {
            def,
            descriptors: OnceLock::new(),
            callbacks: CallbackRegistry::new(),
            init_hook: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn def(&self) -> &SchemaDef {
        &self.def
    }

    /// Field descriptors in declaration order, computed on first use.
    pub fn fields(&self) -> &[FieldDescriptor] {
        self.descriptors.get_or_init(|| {
            tracing::trace!(schema = %self.def.name, "Introspecting schema fields");
            introspect(&self.def)
        })
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    /// Register a callback that field annotations can refer to by name.
    pub fn register_callback<F>(&mut self, name: impl Into<String>, callback: F) -> &mut Self
    where
        F: Fn(&BoundObject) -> Result<FieldValue, CallbackError> + Send + Sync + 'static,
    {
        self.callbacks.register(name, callback);
        self
    }

    /// Set the hook run once after a successful bind.
    pub fn set_init_hook<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut BoundObject) + Send + Sync + 'static,
    {
        self.init_hook = Some(Box::new(hook));
        self
    }

    pub fn init_hook(&self) -> Option<&dyn InitHook> {
        self.init_hook.as_deref()
    }

    /// Whether the schema-wide `required` list names this field, either by
    /// field name or by the key it resolved to.
    pub fn is_always_required(&self, field: &str, key: &str) -> bool {
        self.def.required.iter().any(|n| n == field || n == key)
    }

    /// Same as [`Schema::is_always_required`], for the `not_empty` list.
    pub fn is_always_not_empty(&self, field: &str, key: &str) -> bool {
        self.def.not_empty.iter().any(|n| n == field || n == key)
    }

    /// A fresh instance holding only declared defaults.
    pub fn default_object(&self) -> BoundObject {
        let mut object = BoundObject::new(self.name());
        for field in self.fields() {
            if let Some(default) = &field.default {
                object.set(field.name.clone(), default.clone());
            }
        }
        object
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("def", &self.def)
            .field("callbacks", &self.callbacks)
            .field("init_hook", &self.init_hook.is_some())
            .finish()
    }
}

/// All schemas a binder can resolve, by name.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, Schema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            schemas: IndexMap::new(),
        }
    }

    /// Register a schema, replacing any schema with the same name.
    ///
    /// Returns the registered schema so callbacks can be attached:
    ///
    /// ```
    /// use reqbind::{FieldDef, FieldValue, ScalarKind, SchemaDef, SchemaRegistry};
    ///
    /// let mut registry = SchemaRegistry::new();
    /// registry
    ///     .register(
    ///         SchemaDef::new("Login")
    ///             .field(FieldDef::scalar("email", ScalarKind::String).with_after_init("lower")),
    ///     )
    ///     .register_callback("lower", |object| {
    ///         Ok(FieldValue::from(object.get_str("email").unwrap_or_default().to_lowercase()))
    ///     });
    /// assert!(registry.contains("Login"));
    /// ```
    pub fn register(&mut self, def: SchemaDef) -> &mut Schema {
        let schema = Schema::new(def);
        match self.schemas.entry(schema.name().to_string()) {
            Entry::Occupied(mut entry) => {
                tracing::debug!(schema = %entry.key(), "Replacing registered schema");
                entry.insert(schema);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(schema),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Schema> {
        self.schemas.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Schema names in registration order
    pub fn schema_names(&self) -> Vec<&str> {
        self.schemas.keys().map(|k| k.as_str()).collect()
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Load one YAML schema file and register it.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Schema, String> {
        let def = load_schema(path)?;
        Ok(self.register(def))
    }

    /// Load every schema in a directory, register them, then check that all
    /// schema references resolve.
    pub fn load_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize, String> {
        let defs = load_schemas(dir)?;
        let count = defs.len();
        for def in defs {
            self.register(def);
        }
        self.validate()?;
        Ok(count)
    }

    /// Validate every registered schema, including cross-schema references
    /// from field types and item types (doc markers included).
    pub fn validate(&self) -> Result<(), String> {
        for schema in self.schemas.values() {
            validate_schema(schema.def())?;

            for field in schema.fields() {
                let referenced = match (&field.declared_type, &field.annotations.item_type) {
                    (FieldType::Schema(name), _) => Some(name),
                    (FieldType::Array, ItemType::Schema(name)) => Some(name),
                    _ => None,
                };
                if let Some(name) = referenced {
                    if !self.contains(name) {
                        return Err(format!(
                            "Schema '{}' field '{}' refers to unknown schema '{}'",
                            schema.name(),
                            field.name,
                            name
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}
