//! Field descriptors derived from schema declarations.

use serde_json::Value as JsonValue;

use crate::coerce::{coerce_scalar, is_scalar};
use crate::schema::annotations::Annotations;
use crate::schema::types::{FieldDef, FieldType, ItemType, SchemaDef};
use crate::value::FieldValue;

/// Static description of one field, as the binder consumes it
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub declared_type: FieldType,
    pub annotations: Annotations,
    /// Declared default, already coerced to the field type
    pub default: Option<FieldValue>,
}

impl FieldDescriptor {
    pub fn from_field(field: &FieldDef) -> Self {
        let annotations = Annotations::from_field(field);
        let default = field
            .default
            .as_ref()
            .and_then(|value| coerce_default(field, &annotations, value));

        Self {
            name: field.name.clone(),
            declared_type: field.field_type.clone(),
            annotations,
            default,
        }
    }
}

/// Build descriptors for every field of a schema, in declaration order.
pub fn introspect(schema: &SchemaDef) -> Vec<FieldDescriptor> {
    schema.fields.iter().map(FieldDescriptor::from_field).collect()
}

/// Defaults are only supported for scalars and arrays of scalars.
fn coerce_default(
    field: &FieldDef,
    annotations: &Annotations,
    value: &JsonValue,
) -> Option<FieldValue> {
    let coerced = match (&field.field_type, value) {
        (FieldType::Scalar(kind), value) if is_scalar(value) => Some(coerce_scalar(value, *kind)),
        (FieldType::Array, JsonValue::Array(items)) => match &annotations.item_type {
            ItemType::Scalar(kind) if items.iter().all(is_scalar) => Some(FieldValue::List(
                items.iter().map(|item| coerce_scalar(item, *kind)).collect(),
            )),
            _ => None,
        },
        _ => None,
    };

    if coerced.is_none() {
        tracing::warn!(
            field = %field.name,
            field_type = %field.field_type,
            "Ignoring default that does not fit the declared type"
        );
    }
    coerced
}
