//! The binding engine.
//!
//! For each field, in declaration order, the binder:
//!
//! 1. runs the `beforeInitCallBack` callback and assigns its result
//! 2. resolves the effective key (see [`crate::naming::resolve_key`])
//! 3. fails if the key is absent and the field is required or not-empty,
//!    otherwise skips the field
//! 4. fails if a not-empty field holds an empty value
//! 5. coerces the value: scalars directly, arrays element by element, nested
//!    schemas by a recursive bind
//! 6. runs the `afterInitCallBack` callback and assigns its result
//! 7. queues the `afterObjInitCallback` callback
//!
//! Once every field is processed, queued callbacks run in declaration order
//! and the schema's init hook gets the finished object.
//!
//! The first failure aborts the bind. The partially built object is dropped.

use serde_json::Value as JsonValue;

use crate::callback_registry::Callback;
use crate::coerce::{coerce_scalar, is_empty_value, is_scalar};
use crate::error::BindError;
use crate::naming::resolve_key;
use crate::request::Request;
use crate::schema::{FieldDescriptor, FieldType, ItemType, Schema, SchemaRegistry};
use crate::value::{BoundObject, FieldValue, ParameterMap};

/// Key reported when a whole document is not an object
const ROOT_KEY: &str = "<root>";

/// Binds parameter maps against the schemas of a registry.
///
/// A binder holds no state between calls; one registry can serve any number
/// of binders, on any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct Binder<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> Binder<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    /// Bind `params` into a new instance of the named schema.
    ///
    /// An empty parameter map yields the schema's default object without
    /// running any checks or callbacks.
    pub fn bind(&self, params: &ParameterMap, schema_name: &str) -> Result<BoundObject, BindError> {
        let schema = self
            .registry
            .get(schema_name)
            .ok_or_else(|| BindError::UnknownSchema(schema_name.to_string()))?;
        self.bind_schema(params, schema)
    }

    /// Bind a decoded JSON document, which must be an object.
    pub fn bind_json(&self, document: &JsonValue, schema_name: &str) -> Result<BoundObject, BindError> {
        let params = document.as_object().ok_or_else(|| BindError::TypeMismatch {
            key: ROOT_KEY.to_string(),
            expected: "object",
        })?;
        self.bind(params, schema_name)
    }

    /// Bind into a typed request.
    pub fn bind_as<T: Request>(&self, params: &ParameterMap) -> Result<T, BindError> {
        let object = self.bind(params, T::SCHEMA)?;
        serde_json::from_value(object.to_json()).map_err(|e| BindError::Deserialize(e.to_string()))
    }

    fn bind_schema(&self, params: &ParameterMap, schema: &Schema) -> Result<BoundObject, BindError> {
        let mut object = schema.default_object();
        if params.is_empty() {
            tracing::debug!(schema = %schema.name(), "Empty parameters, returning default object");
            return Ok(object);
        }

        let mut deferred: Vec<(&FieldDescriptor, &str, &dyn Callback)> = Vec::new();

        for field in schema.fields() {
            if !self.bind_field(params, schema, field, &mut object)? {
                continue;
            }

            if let Some((name, callback)) =
                lookup_callback(schema, field, &field.annotations.after_obj_init_callback)
            {
                deferred.push((field, name, callback));
            }
        }

        for (field, name, callback) in deferred {
            tracing::trace!(schema = %schema.name(), field = %field.name, callback = name, "Running deferred callback");
            let value = callback.call(&object).map_err(|e| BindError::CallbackFailed {
                callback: name.to_string(),
                message: e.0,
            })?;
            object.set(field.name.clone(), value);
        }

        if let Some(hook) = schema.init_hook() {
            hook.init(&mut object);
        }

        Ok(object)
    }

    /// Bind one field. Returns `false` when the field was skipped because its
    /// key is absent.
    fn bind_field(
        &self,
        params: &ParameterMap,
        schema: &Schema,
        field: &FieldDescriptor,
        object: &mut BoundObject,
    ) -> Result<bool, BindError> {
        let annotations = &field.annotations;

        if let Some((_, callback)) =
            lookup_callback(schema, field, &annotations.before_init_callback)
        {
            let value = callback
                .call(object)
                .map_err(|e| BindError::BusinessCheckFailed(e.0))?;
            object.set(field.name.clone(), value);
        }

        let key = resolve_key(&field.name, annotations, params);
        let required = annotations.required || schema.is_always_required(&field.name, &key);
        let not_empty = annotations.not_empty || schema.is_always_not_empty(&field.name, &key);

        let Some(raw) = params.get(&key) else {
            if required || not_empty {
                return Err(BindError::MissingParameter { key });
            }
            tracing::trace!(schema = %schema.name(), field = %field.name, key = %key, "Key absent, skipping field");
            return Ok(false);
        };

        if not_empty && is_empty_value(raw) {
            return Err(BindError::EmptyValue { key });
        }

        match &field.declared_type {
            FieldType::Scalar(kind) => {
                if !is_scalar(raw) {
                    return Err(BindError::NotScalar { key });
                }
                object.set(field.name.clone(), coerce_scalar(raw, *kind));
            }
            FieldType::Array => self.bind_array(&key, raw, field, object)?,
            FieldType::Schema(name) => {
                let nested = self.nested_schema(&key, name)?;
                let map = raw.as_object().ok_or_else(|| BindError::TypeMismatch {
                    key: key.clone(),
                    expected: "object",
                })?;
                let value = self.bind_schema(map, nested)?;
                object.set(field.name.clone(), FieldValue::Object(value));
            }
        }

        if let Some((name, callback)) =
            lookup_callback(schema, field, &annotations.after_init_callback)
        {
            let value = callback.call(object).map_err(|e| BindError::CallbackFailed {
                callback: name.to_string(),
                message: e.0,
            })?;
            object.set(field.name.clone(), value);
        }

        Ok(true)
    }

    /// Append every element of `raw` to the field's list, creating the list
    /// when the field does not hold one yet.
    fn bind_array(
        &self,
        key: &str,
        raw: &JsonValue,
        field: &FieldDescriptor,
        object: &mut BoundObject,
    ) -> Result<(), BindError> {
        let items = raw.as_array().ok_or_else(|| BindError::TypeMismatch {
            key: key.to_string(),
            expected: "array",
        })?;

        if !matches!(object.get(&field.name), Some(FieldValue::List(_))) {
            object.set(field.name.clone(), FieldValue::List(Vec::new()));
        }

        match &field.annotations.item_type {
            ItemType::Scalar(kind) => {
                for item in items {
                    if !is_scalar(item) {
                        return Err(BindError::TypeMismatch {
                            key: key.to_string(),
                            expected: "array of scalars",
                        });
                    }
                    object.push_to_list(&field.name, coerce_scalar(item, *kind));
                }
            }
            ItemType::Schema(name) => {
                let item_schema = self.nested_schema(key, name)?;
                for item in items {
                    let map = item.as_object().ok_or_else(|| BindError::TypeMismatch {
                        key: key.to_string(),
                        expected: "array of objects",
                    })?;
                    let value = self.bind_schema(map, item_schema)?;
                    object.push_to_list(&field.name, FieldValue::Object(value));
                }
            }
        }

        Ok(())
    }

    fn nested_schema(&self, key: &str, name: &str) -> Result<&'r Schema, BindError> {
        self.registry.get(name).ok_or_else(|| {
            tracing::debug!(key = %key, schema = %name, "Field refers to an unregistered schema");
            BindError::TypeMismatch {
                key: key.to_string(),
                expected: "registered schema",
            }
        })
    }
}

/// Find the callback a field annotation names. Names without a registered
/// callback are skipped.
fn lookup_callback<'s>(
    schema: &'s Schema,
    field: &FieldDescriptor,
    name: &'s Option<String>,
) -> Option<(&'s str, &'s dyn Callback)> {
    let name = name.as_deref()?;
    match schema.callbacks().get(name) {
        Some(callback) => Some((name, callback)),
        None => {
            tracing::debug!(
                schema = %schema.name(),
                field = %field.name,
                callback = name,
                "Callback is not registered, skipping"
            );
            None
        }
    }
}
