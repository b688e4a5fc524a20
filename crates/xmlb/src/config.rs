//! Serializer configuration.
//!
//! | Field | Default | Effect |
//! |-------|---------|--------|
//! | `legacy_option_names` | true | `<option>` lookup also accepts `"my" + Capitalized` names |
//! | `sort_unordered_collections` | true | hash sets and hash maps are written in natural order |
//! | `indent` | 2 | indentation used by the string helpers |
//!
//! ```
//! use xmlb::SerializerConfig;
//!
//! let config = SerializerConfig {
//!     indent: 4,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

/// Options carried by an [`crate::XmlSerializer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Accept `myName` in addition to `name` on option tags.
    pub legacy_option_names: bool,

    /// Sort hash-ordered sets and maps before writing so output is diff-stable.
    pub sort_unordered_collections: bool,

    /// Indentation for [`crate::to_xml_string`]; `0` writes a single line.
    pub indent: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            legacy_option_names: true,
            sort_unordered_collections: true,
            indent: 2,
        }
    }
}

impl SerializerConfig {
    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.indent > 16 {
            errors.push("Indent cannot exceed 16".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
