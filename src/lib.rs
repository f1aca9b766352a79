//! # reqbind: declarative request binding
//!
//! reqbind turns an untyped parameter map (a decoded request body or query)
//! into a populated, validated object described by an annotated schema.
//!
//! ## Features
//!
//! - **Name resolution**: fields read from their own name, then the
//!   snake_case form, unless `@requestVar` names the key explicitly
//! - **Constraints**: `@required` and `@notEmpty`, per field or schema-wide
//! - **Coercion**: explicit rules for `int`, `string`, `float` and `bool`
//! - **Nesting**: object fields and `@itemType` arrays bind recursively
//! - **Callbacks**: `@beforeInitCallBack`, `@afterInitCallBack` and
//!   `@afterObjInitCallback`, plus a post-construction hook
//!
//! ## Example: YAML schema
//!
//! ```yaml
//! schema:
//!   name: CreatePost
//!   required: [title]
//!   fields:
//!     - name: title
//!       type: string
//!     - name: authorId
//!       type: int
//!       doc: "@notEmpty"
//!     - name: tags
//!       type: array
//!       doc: |
//!         @itemType Tag
//!         @afterObjInitCallback dedupeTags
//! ```
//!
//! ## Example: binding
//!
//! ```
//! use reqbind::{Binder, FieldDef, ScalarKind, SchemaDef, SchemaRegistry};
//! use serde_json::json;
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register(
//!     SchemaDef::new("ShowUser")
//!         .field(FieldDef::scalar("userId", ScalarKind::Int).with_doc("@required")),
//! );
//!
//! let params = json!({"user_id": "42"});
//! let user = Binder::new(&registry)
//!     .bind(params.as_object().unwrap(), "ShowUser")
//!     .unwrap();
//! assert_eq!(user.get_i64("userId"), Some(42));
//! ```

// Core modules
pub mod binder;
pub mod callback_registry;
pub mod coerce;
pub mod error;
pub mod naming;
pub mod request;
pub mod schema;
pub mod serialization;
pub mod value;

// Re-export key types
pub use binder::Binder;
pub use callback_registry::{Callback, CallbackError, CallbackRegistry, InitHook};
pub use error::{BindError, ErrorKind};
pub use request::Request;
pub use schema::{
    Annotations, FieldDef, FieldDescriptor, FieldType, ItemType, ScalarKind, Schema, SchemaDef,
    SchemaRegistry,
};
pub use value::{BoundObject, FieldValue, ParameterMap};
