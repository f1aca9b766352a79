//! Named lifecycle callbacks attached to a schema.
//!
//! Field annotations refer to callbacks by name (`@afterInitCallBack trim`).
//! A schema owns a [`CallbackRegistry`] that maps those names to functions.
//! Names with no registered function are skipped by the binder.

use std::collections::HashMap;
use std::fmt;

use crate::value::{BoundObject, FieldValue};

/// Error returned by a callback
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackError(pub String);

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CallbackError {}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for CallbackError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// A field callback.
///
/// Receives the object as bound so far; the returned value is assigned to the
/// field that declared the callback.
pub trait Callback: Send + Sync {
    fn call(&self, object: &BoundObject) -> Result<FieldValue, CallbackError>;
}

impl<F> Callback for F
where
    F: Fn(&BoundObject) -> Result<FieldValue, CallbackError> + Send + Sync,
{
    fn call(&self, object: &BoundObject) -> Result<FieldValue, CallbackError> {
        self(object)
    }
}

/// Post-construction hook, run once after every field and deferred callback.
pub trait InitHook: Send + Sync {
    fn init(&self, object: &mut BoundObject);
}

impl<F> InitHook for F
where
    F: Fn(&mut BoundObject) + Send + Sync,
{
    fn init(&self, object: &mut BoundObject) {
        self(object)
    }
}

/// Registry of callbacks available to one schema
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: HashMap<String, Box<dyn Callback>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            callbacks: HashMap::new(),
        }
    }

    /// Register a callback under `name`, replacing any previous one.
    ///
    /// # Example
    ///
    /// ```
    /// use reqbind::{CallbackRegistry, FieldValue};
    ///
    /// let mut registry = CallbackRegistry::new();
    /// registry.register("upper_name", |object| {
    ///     let name = object.get_str("name").unwrap_or_default();
    ///     Ok(FieldValue::String(name.to_uppercase()))
    /// });
    /// assert!(registry.has_callback("upper_name"));
    /// ```
    pub fn register<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: Fn(&BoundObject) -> Result<FieldValue, CallbackError> + Send + Sync + 'static,
    {
        self.callbacks.insert(name.into(), Box::new(callback));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Callback> {
        self.callbacks.get(name).map(|cb| cb.as_ref())
    }

    pub fn has_callback(&self, name: &str) -> bool {
        self.callbacks.contains_key(name)
    }

    /// Names of all registered callbacks, sorted
    pub fn list_callbacks(&self) -> Vec<String> {
        let mut names: Vec<String> = self.callbacks.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callbacks", &self.list_callbacks())
            .finish()
    }
}
