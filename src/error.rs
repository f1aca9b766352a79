//! Error type for bind operations.

use std::fmt;

/// Broad failure categories a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingParameter,
    EmptyValueRejected,
    TypeMismatch,
    CallbackFailure,
}

/// Error raised when binding parameters into a schema.
///
/// A bind stops at the first violation in field declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum BindError {
    /// A required or not-empty field has no value under its effective key
    MissingParameter {
        key: String,
    },
    /// A scalar field received an array or object
    NotScalar {
        key: String,
    },
    /// A not-empty field resolved to an empty value
    EmptyValue {
        key: String,
    },
    /// The value's shape does not match the declared type
    TypeMismatch {
        key: String,
        expected: &'static str,
    },
    /// A schema name that is not registered
    UnknownSchema(String),
    /// A before-init callback failed
    BusinessCheckFailed(String),
    /// An after-init or after-object callback failed
    CallbackFailed {
        callback: String,
        message: String,
    },
    /// The bound object could not be converted into a typed request
    Deserialize(String),
}

impl BindError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BindError::MissingParameter { .. } | BindError::NotScalar { .. } => {
                ErrorKind::MissingParameter
            }
            BindError::EmptyValue { .. } => ErrorKind::EmptyValueRejected,
            BindError::TypeMismatch { .. }
            | BindError::UnknownSchema(_)
            | BindError::Deserialize(_) => ErrorKind::TypeMismatch,
            BindError::BusinessCheckFailed(_) | BindError::CallbackFailed { .. } => {
                ErrorKind::CallbackFailure
            }
        }
    }

    /// The parameter key the error refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            BindError::MissingParameter { key }
            | BindError::NotScalar { key }
            | BindError::EmptyValue { key }
            | BindError::TypeMismatch { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::MissingParameter { key } => write!(f, "missing {}", key),
            BindError::NotScalar { key } => write!(f, "{} type error", key),
            BindError::EmptyValue { key } => write!(f, "{} can not be empty", key),
            BindError::TypeMismatch { key, expected } => {
                write!(f, "{} type error: expected {}", key, expected)
            }
            BindError::UnknownSchema(name) => write!(f, "Unknown schema: {}", name),
            BindError::BusinessCheckFailed(msg) => write!(f, "{}", msg),
            BindError::CallbackFailed { callback, message } => {
                write!(f, "Callback '{}' failed: {}", callback, message)
            }
            BindError::Deserialize(msg) => write!(f, "Deserialization error: {}", msg),
        }
    }
}

impl std::error::Error for BindError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let missing = BindError::MissingParameter { key: "user_id".to_string() };
        assert_eq!(missing.to_string(), "missing user_id");

        let empty = BindError::EmptyValue { key: "name".to_string() };
        assert_eq!(empty.to_string(), "name can not be empty");

        let business = BindError::BusinessCheckFailed("quota exceeded".to_string());
        assert_eq!(business.to_string(), "quota exceeded");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            BindError::NotScalar { key: "a".to_string() }.kind(),
            ErrorKind::MissingParameter
        );
        assert_eq!(BindError::UnknownSchema("X".to_string()).kind(), ErrorKind::TypeMismatch);
        assert_eq!(
            BindError::CallbackFailed {
                callback: "cb".to_string(),
                message: "boom".to_string()
            }
            .kind(),
            ErrorKind::CallbackFailure
        );
        assert_eq!(BindError::BusinessCheckFailed(String::new()).key(), None);
    }
}
