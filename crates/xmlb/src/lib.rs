//! # xmlb
//!
//! Bidirectional binding between Rust values and XML, with a JSON
//! projection of the same mapping.
//!
//! ## Model
//!
//! - A **bean** is a struct whose slots are declared once in a
//!   [`BeanInfo`] table. Each slot carries [`Slot`] annotations that pick its
//!   layout: attribute, text, option tag, tag, flattened, collection, map,
//!   compact list or opaque subtree.
//! - The [`XmlSerializer`] builds one binding per type on first use and
//!   caches it. Bindings are immutable once built; a type whose declaration
//!   is inconsistent fails with [`XmlbError::Config`] at that point.
//! - Reading always fills a target instance in place. Slots absent from the
//!   markup keep their current values.
//! - [`SerializationFilter`]s decide which slots are written.
//!   [`SkipDefaultsFilter`] and [`SkipEmptyFilter`] cover the usual cases;
//!   [`SmartSerializer`] also keeps the slot set and order of the last read
//!   document.
//!
//! ## Default layout
//!
//! | Value | Markup |
//! |-------|--------|
//! | scalar slot | `<option name="slot" value="..."/>` |
//! | bean slot | `<option name="slot"><Bean .../></option>` |
//! | list slot | `<option name="slot"><list><option value="..."/></list></option>` |
//! | map slot | `<option name="slot"><map><entry key=".." value=".."/></map></option>` |
//!
//! Legacy `myName` option names are accepted on read unless disabled in
//! [`SerializerConfig`].
//!
//! ## Example
//!
//! ```
//! use once_cell::sync::Lazy;
//! use xmlb::{Bean, BeanInfo, Slot};
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Editor {
//!     font: String,
//!     size: i32,
//!     recent: Vec<String>,
//! }
//!
//! impl Bean for Editor {
//!     fn bean_info() -> &'static BeanInfo {
//!         static INFO: Lazy<BeanInfo> = Lazy::new(|| {
//!             BeanInfo::builder::<Editor>()
//!                 .tag("editor")
//!                 .field_with("font", |e| &e.font, |e| &mut e.font, Slot::new().attribute(""))
//!                 .field("size", |e| &e.size, |e| &mut e.size)
//!                 .field_with("recent", |e| &e.recent, |e| &mut e.recent, Slot::new().compact_list("recent"))
//!                 .build()
//!         });
//!         &INFO
//!     }
//! }
//! xmlb::impl_reflect_bean!(Editor);
//!
//! let editor = Editor { font: "Mono".into(), size: 12, recent: vec!["a.rs".into()] };
//! let element = xmlb::XmlSerializer::global().serialize(&editor, None)?;
//! assert_eq!(
//!     element.to_string(),
//!     r#"<editor font="Mono"><option name="size" value="12"/><recent><item value="a.rs"/></recent></editor>"#
//! );
//! assert_eq!(xmlb::XmlSerializer::global().deserialize::<Editor, _>(&element)?, editor);
//! # Ok::<(), xmlb::XmlbError>(())
//! ```

pub mod accessor;
pub mod bean;
mod binding;
pub mod config;
pub mod converter;
pub mod error;
pub mod filter;
pub mod geometry;
mod json;
pub mod reflect;
pub mod scalar;
pub mod serializer;
pub mod slot;
pub mod smart;

pub use accessor::{Accessor, FieldAccessor, PropertyAccessor, ValueRef};
pub use bean::{Bean, BeanInfo, BeanInfoBuilder, PropertyCollector};
pub use config::SerializerConfig;
pub use converter::{CommaSeparatedConverter, Converter, DurationConverter};
pub use error::{BoxError, Result, XmlbError};
pub use filter::{SerializationFilter, SkipDefaultsFilter, SkipEmptyFilter};
pub use geometry::Rectangle;
pub use reflect::{Reflect, Typed};
pub use serializer::XmlSerializer;
pub use slot::{CollectionOptions, CollectionStyle, MapOptions, Slot};
pub use smart::SmartSerializer;

pub use xmlb_dom;
pub use xmlb_dom::{Element, Node, XmlElement};

use serde_json::Value;

/// Serializes with the global serializer and writes the element as text,
/// indented per its configuration.
pub fn to_xml_string(value: &dyn Reflect) -> Result<String> {
    let serializer = XmlSerializer::global();
    let element = serializer.serialize(value, None)?;
    Ok(xmlb_dom::to_string_with_indent(&element, serializer.config().indent)?)
}

pub fn from_xml_str<T: Typed>(xml: &str) -> Result<T> {
    let root = xmlb_dom::parse_str(xml)?;
    XmlSerializer::global().deserialize(&root)
}

pub fn to_json_value(value: &dyn Reflect) -> Result<Value> {
    XmlSerializer::global().to_json(value)
}

pub fn from_json_value<T: Typed>(json: &Value) -> Result<T> {
    XmlSerializer::global().from_json(json)
}

/// Fills an existing value from JSON; keys missing from `json` leave their
/// slots untouched.
pub fn deserialize_json_into(target: &mut dyn Reflect, json: &Value) -> Result<()> {
    XmlSerializer::global().deserialize_json_into(target, json)
}
