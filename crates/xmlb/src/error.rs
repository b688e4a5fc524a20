//! Error types for binding construction, serialization and deserialization.
//!
//! Every failure surfaces as one [`XmlbError`]; a call either completes or
//! returns an error, there is no partial-success result.
//!
//! | Kind | Raised when |
//! |------|-------------|
//! | `Config` | a slot's annotations cannot be bound (checked when the binding is built) |
//! | `Conversion` | a numeric scalar cannot be parsed; dates never fail |
//! | `Access` | a property getter or setter reported an error |
//! | `TypeMismatch` | a value does not fit the slot it is stored into |
//! | `UnknownType` | a strict polymorphic read met an element no candidate type claims |

use thiserror::Error;
use xmlb_dom::DomError;

/// Boxed error returned by property setters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The serialization error.
#[derive(Error, Debug)]
pub enum XmlbError {
    /// Programmer mistake in a bean declaration.
    #[error("invalid binding for {type_name}: {message}")]
    Config { type_name: String, message: String },

    /// A scalar value could not be parsed.
    #[error("cannot convert '{value}' to {target}: {message}")]
    Conversion {
        value: String,
        target: &'static str,
        message: String,
    },

    /// An accessor failed while reading or writing a slot.
    #[error("cannot access slot '{slot}': {source}")]
    Access {
        slot: String,
        #[source]
        source: BoxError,
    },

    /// A dynamically typed value did not fit its destination.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// No candidate type matches a polymorphic element.
    #[error("no bindable type for element <{tag}>")]
    UnknownType { tag: String },

    /// Markup reading or writing failed.
    #[error(transparent)]
    Dom(#[from] DomError),

    /// JSON reading or writing failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl XmlbError {
    pub(crate) fn config(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        XmlbError::Config {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        XmlbError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Result type alias for binding operations.
pub type Result<T> = std::result::Result<T, XmlbError>;
