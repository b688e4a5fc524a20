//! Error types for markup reading, writing and include resolution.

use thiserror::Error;

/// Errors raised by the markup layer.
#[derive(Error, Debug)]
pub enum DomError {
    /// The underlying XML reader or writer failed.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// IO error while reading or writing a document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is well-formed XML but cannot be turned into a tree.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The document contains no root element.
    #[error("document has no root element")]
    NoRootElement,

    /// An include directive could not be resolved and had no fallback.
    #[error("cannot resolve include '{href}' (base: {base}): {message}")]
    Include {
        href: String,
        base: String,
        message: String,
    },

    /// An include directive points back at a document already being included.
    #[error("circular include of '{0}'")]
    CircularInclude(String),
}

/// Result type alias for markup operations.
pub type Result<T> = std::result::Result<T, DomError>;
