//! Per-slot annotations.
//!
//! A [`Slot`] tells the binding layer how one field or property is laid out
//! in markup. An unannotated slot is written as an option tag:
//! `<option name="slot" value="..."/>`.
//!
//! | Builder | Layout |
//! |---------|--------|
//! | `attribute(name)` | attribute on the owner element |
//! | `text()` | text content of the owner element |
//! | `tag(name)` | `<name>value</name>` |
//! | `option_tag(tag, name_attr, value_attr)` | customized option tag |
//! | `compact_list(tag)` | `<tag><item value="a"/></tag>` for `Vec<String>` |
//! | `flat()` | nested bean or collection spliced into the owner |
//! | `flat_attributes()` | scalar slots of a nested bean as owner attributes |
//! | `collection(..)` / `map(..)` | container layout options |
//!
//! Empty names mean "use the slot name".

use std::fmt;
use std::sync::Arc;

use crate::converter::{self, Converter, ErasedConverter};
use crate::filter::SerializationFilter;
use crate::reflect::{TypeInfo, Typed};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum Storage {
    #[default]
    Default,
    Attribute(String),
    Text,
    Tag(String),
    OptionTag {
        tag: String,
        name_attribute: String,
        value_attribute: String,
    },
    CompactList(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlatStyle {
    Nested,
    Attributes,
}

/// How collection items are nested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionStyle {
    /// Inside the slot's option tag.
    #[default]
    V1,
    /// Directly under an element named after the slot.
    V2,
}

/// Layout options for ordered collections.
#[derive(Debug, Clone)]
pub struct CollectionOptions {
    /// Tag wrapping each scalar item.
    pub element_name: String,
    /// Attribute holding a scalar item; empty stores the item as text.
    pub value_attribute: String,
    /// Wrap items in `<list>`, `<set>`, `<collection>` or `<array>`.
    pub surround_with_tag: bool,
    pub style: CollectionStyle,
    /// Element containing the items; empty means none.
    pub property_element_name: String,
    /// Candidate concrete item types, tried in order by element tag.
    pub element_types: Vec<TypeInfo>,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            element_name: "option".to_string(),
            value_attribute: "value".to_string(),
            surround_with_tag: true,
            style: CollectionStyle::V1,
            property_element_name: String::new(),
            element_types: Vec::new(),
        }
    }
}

impl CollectionOptions {
    pub fn element_type<T: Typed>(mut self) -> Self {
        self.element_types.push(T::type_info());
        self
    }
}

/// Layout options for maps.
#[derive(Debug, Clone)]
pub struct MapOptions {
    pub entry_tag: String,
    pub key_attribute: String,
    pub value_attribute: String,
    /// Wrap entries in `<map>`.
    pub surround_with_tag: bool,
    /// Nest a structural key under `<key>`.
    pub surround_key_with_tag: bool,
    /// Nest a structural value under `<value>`.
    pub surround_value_with_tag: bool,
    /// Element containing the entries; empty means none.
    pub property_element_name: String,
    /// Sort hash-ordered maps by key before writing.
    pub sort_before_save: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            entry_tag: "entry".to_string(),
            key_attribute: "key".to_string(),
            value_attribute: "value".to_string(),
            surround_with_tag: true,
            surround_key_with_tag: true,
            surround_value_with_tag: true,
            property_element_name: String::new(),
            sort_before_save: true,
        }
    }
}

/// Annotations of one slot.
#[derive(Clone, Default)]
pub struct Slot {
    pub(crate) storage: Storage,
    pub(crate) converter: Option<Arc<dyn ErasedConverter>>,
    pub(crate) flat: Option<FlatStyle>,
    pub(crate) collection: Option<CollectionOptions>,
    pub(crate) map: Option<MapOptions>,
    pub(crate) transient: bool,
    pub(crate) always_write: bool,
    pub(crate) filter: Option<Arc<dyn SerializationFilter>>,
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("storage", &self.storage)
            .field("converter", &self.converter.as_ref().map(|c| c.target().type_name))
            .field("flat", &self.flat)
            .field("collection", &self.collection)
            .field("map", &self.map)
            .field("transient", &self.transient)
            .field("always_write", &self.always_write)
            .finish()
    }
}

impl Slot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.storage = Storage::Attribute(name.to_string());
        self
    }

    pub fn text(mut self) -> Self {
        self.storage = Storage::Text;
        self
    }

    pub fn tag(mut self, name: &str) -> Self {
        self.storage = Storage::Tag(name.to_string());
        self
    }

    /// An empty `name_attribute` writes the tag without a name.
    pub fn option_tag(mut self, tag: &str, name_attribute: &str, value_attribute: &str) -> Self {
        self.storage = Storage::OptionTag {
            tag: tag.to_string(),
            name_attribute: name_attribute.to_string(),
            value_attribute: value_attribute.to_string(),
        };
        self
    }

    pub fn compact_list(mut self, tag: &str) -> Self {
        self.storage = Storage::CompactList(tag.to_string());
        self
    }

    pub fn converter<T: Typed, C: Converter<T>>(mut self, converter: C) -> Self {
        self.converter = Some(converter::erase(converter));
        self
    }

    pub fn flat(mut self) -> Self {
        self.flat = Some(FlatStyle::Nested);
        self
    }

    pub fn flat_attributes(mut self) -> Self {
        self.flat = Some(FlatStyle::Attributes);
        self
    }

    pub fn collection(mut self, options: CollectionOptions) -> Self {
        self.collection = Some(options);
        self
    }

    pub fn map(mut self, options: MapOptions) -> Self {
        self.map = Some(options);
        self
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// Write the slot even when the active filter would drop it.
    pub fn always_write(mut self) -> Self {
        self.always_write = true;
        self
    }

    /// Filter consulted for this slot instead of the active one.
    pub fn filter(mut self, filter: Arc<dyn SerializationFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// True when any storage annotation is present; explicit-only beans
    /// bind nothing else.
    pub fn is_annotated(&self) -> bool {
        self.storage != Storage::Default
            || self.flat.is_some()
            || self.collection.is_some()
            || self.map.is_some()
    }
}
