//! Typed requests.
//!
//! A [`Request`] ties a Rust type to the schema it is bound from. The binder
//! fills a [`BoundObject`](crate::BoundObject) as usual and then deserializes
//! it into the type with serde.

use serde::de::DeserializeOwned;

use crate::schema::{Schema, SchemaDef, SchemaRegistry};

/// Core trait for request types bound by reqbind.
///
/// # Example
///
/// ```
/// use reqbind::{Binder, FieldDef, Request, ScalarKind, SchemaDef, SchemaRegistry};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct ShowUser {
///     user_id: i64,
/// }
///
/// impl Request for ShowUser {
///     const SCHEMA: &'static str = "ShowUser";
///
///     fn schema() -> SchemaDef {
///         SchemaDef::new(Self::SCHEMA)
///             .field(FieldDef::scalar("userId", ScalarKind::Int).mark_required())
///     }
/// }
///
/// let mut registry = SchemaRegistry::new();
/// registry.register_request::<ShowUser>();
///
/// let params = serde_json::json!({"user_id": "7"});
/// let request: ShowUser = Binder::new(&registry)
///     .bind_as(params.as_object().unwrap())
///     .unwrap();
/// assert_eq!(request.user_id, 7);
/// ```
pub trait Request: DeserializeOwned {
    /// Name of the schema this type is bound from
    const SCHEMA: &'static str;

    /// The schema declaration
    fn schema() -> SchemaDef;

    /// Attach callbacks and the init hook to the registered schema
    fn register_callbacks(_schema: &mut Schema) {}
}

impl SchemaRegistry {
    /// Register the schema of a typed request along with its callbacks.
    pub fn register_request<T: Request>(&mut self) -> &mut Schema {
        let schema = self.register(T::schema());
        T::register_callbacks(schema);
        schema
    }
}
