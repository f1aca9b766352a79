//! Declaration types for schemas.
//!
//! These types mirror the YAML schema files and can also be built in code.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wrapper for schema YAML structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchemaSpec {
    pub schema: SchemaDef,
}

/// Scalar kinds a field or array item can be coerced to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    String,
    Float,
    Bool,
}

impl ScalarKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "int" => Some(ScalarKind::Int),
            "string" => Some(ScalarKind::String),
            "float" => Some(ScalarKind::Float),
            "bool" => Some(ScalarKind::Bool),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Int => "int",
            ScalarKind::String => "string",
            ScalarKind::Float => "float",
            ScalarKind::Bool => "bool",
        }
    }
}

/// Declared type of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Scalar(ScalarKind),
    Array,
    /// Reference to another registered schema
    Schema(String),
}

impl FieldType {
    /// Parse a type name. Anything that is not a scalar kind or `array` is a
    /// schema reference.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if let Some(kind) = ScalarKind::parse(name) {
            FieldType::Scalar(kind)
        } else if name == "array" {
            FieldType::Array
        } else {
            FieldType::Schema(name.to_string())
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, FieldType::Scalar(_))
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        FieldType::parse(&name)
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(kind) => write!(f, "{}", kind.as_str()),
            FieldType::Array => write!(f, "array"),
            FieldType::Schema(name) => write!(f, "{}", name),
        }
    }
}

/// Element type of an `array` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemType {
    Scalar(ScalarKind),
    Schema(String),
}

impl ItemType {
    pub fn parse(name: &str) -> Self {
        match ScalarKind::parse(name) {
            Some(kind) => ItemType::Scalar(kind),
            None => ItemType::Schema(name.trim().to_string()),
        }
    }
}

impl Default for ItemType {
    fn default() -> Self {
        ItemType::Scalar(ScalarKind::String)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Scalar(kind) => write!(f, "{}", kind.as_str()),
            ItemType::Schema(name) => write!(f, "{}", name),
        }
    }
}

/// One field declaration.
///
/// Annotations can be given as `@marker` lines in `doc`, as structured keys,
/// or both. Structured keys win over doc markers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub not_empty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_var: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_init: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_init: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_obj_init: Option<String>,
    /// Initial value, coerced to the declared type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            doc: None,
            required: false,
            not_empty: false,
            request_var: None,
            item_type: None,
            before_init: None,
            after_init: None,
            after_obj_init: None,
            default: None,
        }
    }

    pub fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(name, FieldType::Scalar(kind))
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Array)
    }

    pub fn object(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self::new(name, FieldType::Schema(schema.into()))
    }

    /// Attach a documentation block carrying `@marker` annotations.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn mark_required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn mark_not_empty(mut self) -> Self {
        self.not_empty = true;
        self
    }

    pub fn with_request_var(mut self, key: impl Into<String>) -> Self {
        self.request_var = Some(key.into());
        self
    }

    pub fn with_item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    pub fn with_before_init(mut self, callback: impl Into<String>) -> Self {
        self.before_init = Some(callback.into());
        self
    }

    pub fn with_after_init(mut self, callback: impl Into<String>) -> Self {
        self.after_init = Some(callback.into());
        self
    }

    pub fn with_after_obj_init(mut self, callback: impl Into<String>) -> Self {
        self.after_obj_init = Some(callback.into());
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// A schema: ordered fields plus the schema-wide constraint lists.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Fields that are always required, whatever their annotations say
    #[serde(default)]
    pub required: Vec<String>,
    /// Fields that are always checked for emptiness
    #[serde(default)]
    pub not_empty: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl SchemaDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            required: Vec::new(),
            not_empty: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn always_required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    pub fn always_not_empty(mut self, name: impl Into<String>) -> Self {
        self.not_empty.push(name.into());
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of schemas this schema refers to, via field types or item types.
    ///
    /// Item types set only through a doc marker are not included; those are
    /// checked when the descriptors are built.
    pub fn referenced_schemas(&self) -> Vec<String> {
        let mut names = IndexSet::new();
        for field in &self.fields {
            if let FieldType::Schema(name) = &field.field_type {
                names.insert(name.clone());
            }
            if let Some(item_type) = &field.item_type {
                if let ItemType::Schema(name) = ItemType::parse(item_type) {
                    names.insert(name);
                }
            }
        }
        names.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_parse() {
        assert_eq!(FieldType::parse("int"), FieldType::Scalar(ScalarKind::Int));
        assert_eq!(FieldType::parse(" bool "), FieldType::Scalar(ScalarKind::Bool));
        assert_eq!(FieldType::parse("array"), FieldType::Array);
        assert_eq!(FieldType::parse("Address"), FieldType::Schema("Address".to_string()));
    }

    #[test]
    fn test_item_type_default_is_string() {
        assert_eq!(ItemType::default(), ItemType::Scalar(ScalarKind::String));
        assert_eq!(ItemType::parse("Tag"), ItemType::Schema("Tag".to_string()));
    }

    #[test]
    fn test_schema_yaml() {
        let yaml = r#"
schema:
  name: CreateOrder
  required: [userId]
  fields:
    - name: userId
      type: int
    - name: tags
      type: array
      item_type: Tag
      doc: "@notEmpty"
    - name: address
      type: Address
"#;
        let spec: SchemaSpec = serde_yaml::from_str(yaml).unwrap();
        let schema = spec.schema;

        assert_eq!(schema.name, "CreateOrder");
        assert_eq!(schema.required, vec!["userId"]);
        assert_eq!(schema.fields.len(), 3);
        assert_eq!(schema.fields[0].field_type, FieldType::Scalar(ScalarKind::Int));
        assert_eq!(schema.fields[1].doc.as_deref(), Some("@notEmpty"));
        assert_eq!(schema.referenced_schemas(), vec!["Tag", "Address"]);
    }

    #[test]
    fn test_referenced_schemas_listed_once() {
        let schema = SchemaDef::new("Order")
            .field(FieldDef::array("tags").with_item_type("Tag"))
            .field(FieldDef::object("billing", "Addr"))
            .field(FieldDef::object("primaryTag", "Tag"))
            .field(FieldDef::object("shipping", "Addr"));

        assert_eq!(schema.referenced_schemas(), vec!["Tag", "Addr"]);
    }

    #[test]
    fn test_unknown_field_key_rejected() {
        let yaml = r#"
schema:
  name: Bad
  fields:
    - name: a
      type: int
      requird: true
"#;
        assert!(serde_yaml::from_str::<SchemaSpec>(yaml).is_err());
    }
}
