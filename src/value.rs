//! Bound values and the objects they populate.
//!
//! A bind produces a [`BoundObject`]: an ordered set of named [`FieldValue`]s
//! tagged with the schema it was built from. Nested schemas become nested
//! `BoundObject`s owned by their parent field.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

/// Decoded request parameters handed to a bind.
pub type ParameterMap = serde_json::Map<String, JsonValue>;

/// A single value held by a bound field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<FieldValue>),
    Object(BoundObject),
    Null,
}

impl FieldValue {
    /// Convert an untyped JSON value without applying any schema.
    ///
    /// Unsigned integers beyond `i64::MAX` become floats. Objects become
    /// anonymous `BoundObject`s (empty schema name).
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::String(s) => FieldValue::String(s),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    FieldValue::Float(f)
                } else {
                    FieldValue::Null
                }
            }
            JsonValue::Bool(b) => FieldValue::Bool(b),
            JsonValue::Array(arr) => {
                FieldValue::List(arr.into_iter().map(FieldValue::from_json).collect())
            }
            JsonValue::Object(map) => {
                let mut object = BoundObject::new("");
                for (key, value) in map {
                    object.set(key, FieldValue::from_json(value));
                }
                FieldValue::Object(object)
            }
            JsonValue::Null => FieldValue::Null,
        }
    }

    /// Convert back into a JSON value.
    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::String(s) => JsonValue::String(s.clone()),
            FieldValue::Int(i) => JsonValue::from(*i),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            FieldValue::Bool(b) => JsonValue::Bool(*b),
            FieldValue::List(items) => JsonValue::Array(items.iter().map(|v| v.to_json()).collect()),
            FieldValue::Object(object) => object.to_json(),
            FieldValue::Null => JsonValue::Null,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BoundObject> {
        match self {
            FieldValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::List(l) => write!(f, "{:?}", l),
            FieldValue::Object(o) => write!(f, "{}", o.to_json()),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::String(s) => serializer.serialize_str(s),
            FieldValue::Int(i) => serializer.serialize_i64(*i),
            FieldValue::Float(f) => serializer.serialize_f64(*f),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::List(items) => items.serialize(serializer),
            FieldValue::Object(object) => object.serialize(serializer),
            FieldValue::Null => serializer.serialize_unit(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::List(value)
    }
}

impl From<BoundObject> for FieldValue {
    fn from(value: BoundObject) -> Self {
        FieldValue::Object(value)
    }
}

/// An instance of a schema, populated field by field during a bind.
///
/// Fields that were never assigned are absent rather than null. Field order
/// follows first assignment, which for a normal bind is declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundObject {
    schema: String,
    fields: IndexMap<String, FieldValue>,
}

impl BoundObject {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            fields: IndexMap::new(),
        }
    }

    /// Name of the schema this object was bound from
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(field)
    }

    /// Assign a field, replacing any previous value in place.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.shift_remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Shorthand for string fields, `None` when absent or not a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(FieldValue::as_i64)
    }

    /// Convert into a JSON object in field order.
    pub fn to_json(&self) -> JsonValue {
        let map = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        JsonValue::Object(map)
    }

    /// Append a value to a list field, turning an absent or non-list field
    /// into a fresh list first.
    pub(crate) fn push_to_list(&mut self, field: &str, value: FieldValue) {
        match self.fields.get_mut(field) {
            Some(FieldValue::List(items)) => items.push(value),
            _ => {
                self.fields.insert(field.to_string(), FieldValue::List(vec![value]));
            }
        }
    }
}

impl Serialize for BoundObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_nested() {
        let value = FieldValue::from_json(json!({"name": "Alice", "tags": ["a", 1], "score": 1.5}));

        let object = value.as_object().unwrap();
        assert_eq!(object.get_str("name"), Some("Alice"));
        assert_eq!(
            object.get("tags"),
            Some(&FieldValue::List(vec![FieldValue::from("a"), FieldValue::Int(1)]))
        );
        assert_eq!(object.get("score"), Some(&FieldValue::Float(1.5)));
    }

    #[test]
    fn test_bound_object_serializes_in_field_order() {
        let mut object = BoundObject::new("User");
        object.set("zeta", 1i64);
        object.set("alpha", "a");
        object.set("zeta", 2i64);

        let json = serde_json::to_string(&object).unwrap();
        assert_eq!(json, r#"{"zeta":2,"alpha":"a"}"#);
    }

    #[test]
    fn test_push_to_list_replaces_non_list() {
        let mut object = BoundObject::new("Order");
        object.set("ids", FieldValue::Null);
        object.push_to_list("ids", FieldValue::Int(1));
        object.push_to_list("ids", FieldValue::Int(2));

        assert_eq!(
            object.get("ids"),
            Some(&FieldValue::List(vec![FieldValue::Int(1), FieldValue::Int(2)]))
        );
    }

    #[test]
    fn test_non_finite_float_to_json_is_null() {
        assert_eq!(FieldValue::Float(f64::NAN).to_json(), JsonValue::Null);
    }
}
