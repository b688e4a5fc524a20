//! One binding per bean slot.
//!
//! The layout is picked once from the slot's annotations and declared type,
//! first applicable rule wins:
//!
//! 1. attribute
//! 2. text content
//! 3. option tag or tag written through a converter
//! 4. opaque element subtree
//! 5. tag
//! 6. compact string list
//! 7. flat nested bean, collection or attribute set
//! 8. collection under a property element (or the slot name, in `V2` style)
//! 9. map under a property element
//! 10. option tag, customized or `<option name=".." value=".."/>`

use std::sync::Arc;

use serde_json::Value;
use tracing::trace;
use xmlb_dom::{Element, Node};

use super::{
    Codec, CollectionBinding, Ctx, Payload, clear_option, compact, deserialize_in_place, present,
    replace_element, serialize_value, store_entries, store_items,
};
use crate::accessor::Accessor;
use crate::error::{Result, XmlbError};
use crate::json;
use crate::reflect::{CollectionKind, Reflect, ReflectMut, ReflectRef, ScalarKind, TypeKind};
use crate::slot::{CollectionStyle, FlatStyle, Storage};

const OPTION_TAG: &str = "option";
const NAME_ATTRIBUTE: &str = "name";
const VALUE_ATTRIBUTE: &str = "value";

/// Element a wrapped slot is written under.
enum Wrapper {
    /// `<tag name_attribute="name" value_attribute="...">`.
    Option {
        tag: String,
        name_attribute: Option<String>,
        value_attribute: String,
        name: String,
        legacy_name: String,
    },
    Tag(String),
}

impl Wrapper {
    fn option(tag: &str, name_attribute: &str, value_attribute: &str, name: &str) -> Self {
        Wrapper::Option {
            tag: non_empty(tag, OPTION_TAG).to_string(),
            name_attribute: (!name_attribute.is_empty()).then(|| name_attribute.to_string()),
            value_attribute: value_attribute.to_string(),
            name: name.to_string(),
            legacy_name: legacy_name(name),
        }
    }

    fn element(&self) -> Element {
        match self {
            Wrapper::Option {
                tag,
                name_attribute,
                name,
                ..
            } => {
                let mut element = Element::new(tag.as_str());
                if let Some(attribute) = name_attribute {
                    element.set_attribute(attribute.as_str(), name.as_str());
                }
                element
            }
            Wrapper::Tag(tag) => Element::new(tag.as_str()),
        }
    }

    fn matches<N: Node>(&self, node: &N, legacy: bool) -> bool {
        match self {
            Wrapper::Option {
                tag,
                name_attribute,
                name,
                legacy_name,
                ..
            } => {
                if node.name() != tag {
                    return false;
                }
                let Some(attribute) = name_attribute else {
                    return true;
                };
                match node.attribute(attribute) {
                    Some(found) => found == name || (legacy && found == legacy_name),
                    None => false,
                }
            }
            Wrapper::Tag(tag) => node.name() == tag,
        }
    }
}

enum SlotKind {
    Attribute { name: String, codec: Codec },
    Text { codec: Codec },
    Wrapped { wrapper: Wrapper, payload: Payload },
    Opaque { tag: String },
    CompactList { tag: String },
    FlatBean,
    FlatAttributes,
    FlatCollection(CollectionBinding),
}

impl SlotKind {
    fn label(&self) -> &'static str {
        match self {
            SlotKind::Attribute { .. } => "attribute",
            SlotKind::Text { .. } => "text",
            SlotKind::Wrapped {
                wrapper: Wrapper::Option { .. },
                ..
            } => "option",
            SlotKind::Wrapped {
                wrapper: Wrapper::Tag(_),
                ..
            } => "tag",
            SlotKind::Opaque { .. } => "opaque",
            SlotKind::CompactList { .. } => "compact-list",
            SlotKind::FlatBean => "flat",
            SlotKind::FlatAttributes => "flat-attributes",
            SlotKind::FlatCollection(_) => "flat-collection",
        }
    }
}

pub(crate) struct SlotBinding {
    pub(crate) accessor: Arc<dyn Accessor>,
    kind: SlotKind,
}

impl SlotBinding {
    pub(crate) fn build(accessor: Arc<dyn Accessor>, owner: &str) -> Result<SlotBinding> {
        let kind = select(&*accessor, owner)?;
        trace!(bean = owner, slot = accessor.name(), variant = kind.label(), "Selected slot binding");
        Ok(SlotBinding { accessor, kind })
    }

    pub(crate) fn name(&self) -> &str {
        self.accessor.name()
    }

    /// Attribute written on the owner, if the slot is stored as one.
    pub(crate) fn attribute_name(&self) -> Option<&str> {
        match &self.kind {
            SlotKind::Attribute { name, .. } => Some(name),
            _ => None,
        }
    }

    pub(crate) fn is_text(&self) -> bool {
        matches!(self.kind, SlotKind::Text { .. })
    }

    /// Spread over several sibling nodes, read as one batch.
    pub(crate) fn is_multi(&self) -> bool {
        matches!(self.kind, SlotKind::FlatCollection(_))
    }

    /// Read from the owner element as a whole, after the child pass.
    pub(crate) fn is_flat(&self) -> bool {
        matches!(self.kind, SlotKind::FlatBean | SlotKind::FlatAttributes)
    }

    /// Scalar slots can be spliced into another element as attributes.
    fn scalar_codec(&self) -> Option<&Codec> {
        match &self.kind {
            SlotKind::Attribute { codec, .. } | SlotKind::Text { codec } => Some(codec),
            SlotKind::Wrapped {
                payload: Payload::Scalar(codec),
                ..
            } => Some(codec),
            _ => None,
        }
    }

    /// Whether a child node belongs to this slot.
    pub(crate) fn matches<N: Node>(&self, node: &N, ctx: &Ctx<'_>) -> bool {
        match &self.kind {
            SlotKind::Wrapped { wrapper, .. } => wrapper.matches(node, ctx.config().legacy_option_names),
            SlotKind::Opaque { tag } | SlotKind::CompactList { tag } => node.name() == tag,
            SlotKind::FlatCollection(collection) => collection.claims(node),
            SlotKind::Attribute { .. } | SlotKind::Text { .. } | SlotKind::FlatBean | SlotKind::FlatAttributes => {
                false
            }
        }
    }

    /// Writes the slot's current `value` into `parent`.
    pub(crate) fn serialize(&self, value: &dyn Reflect, parent: &mut Element, ctx: &Ctx<'_>) -> Result<()> {
        match &self.kind {
            SlotKind::Attribute { name, codec } => {
                if let Some(text) = codec.to_text(value)? {
                    parent.set_attribute(name.as_str(), text);
                }
            }
            SlotKind::Text { codec } => {
                if let Some(text) = codec.to_text(value)? {
                    parent.add_text(text);
                }
            }
            SlotKind::Wrapped { wrapper, payload } => {
                if let Some(element) = self.serialize_wrapped(wrapper, payload, value, ctx)? {
                    parent.add_child(element);
                }
            }
            SlotKind::Opaque { tag } => {
                if let Some(ReflectRef::Element(element)) = present(value).map(|v| v.reflect_ref()) {
                    let mut element = element.clone();
                    element.set_name(tag.as_str());
                    parent.add_child(element);
                }
            }
            SlotKind::CompactList { tag } => {
                if let Some(element) = compact::serialize(tag, value)? {
                    parent.add_child(element);
                }
            }
            SlotKind::FlatBean => {
                if let Some(value) = present(value) {
                    ctx.with_bean(&value.reflect_info(), |bean| bean.serialize_into(value, parent, ctx))?;
                }
            }
            SlotKind::FlatAttributes => {
                if let Some(value) = present(value) {
                    ctx.with_bean(&value.reflect_info(), |bean| bean.serialize_attributes(value, parent))?;
                }
            }
            SlotKind::FlatCollection(collection) => {
                for item in collection.serialize_items(value, ctx)? {
                    parent.add_child(item);
                }
            }
        }
        Ok(())
    }

    fn serialize_wrapped(
        &self,
        wrapper: &Wrapper,
        payload: &Payload,
        value: &dyn Reflect,
        ctx: &Ctx<'_>,
    ) -> Result<Option<Element>> {
        if let Payload::Scalar(codec) = payload {
            let Some(text) = codec.to_text(value)? else {
                return Ok(None);
            };
            let mut element = wrapper.element();
            match wrapper {
                Wrapper::Option { value_attribute, .. } if !value_attribute.is_empty() => {
                    element.set_attribute(value_attribute.as_str(), text);
                }
                _ => {
                    element.add_text(text);
                }
            }
            return Ok(Some(element));
        }

        let Some(value) = present(value) else {
            return Ok(None);
        };
        let mut element = wrapper.element();
        match payload {
            Payload::Scalar(_) => {}
            Payload::Bean => {
                let Some(bean) = serialize_value(value, ctx)? else {
                    return Ok(None);
                };
                match wrapper {
                    Wrapper::Option { .. } => {
                        element.add_child(bean);
                    }
                    Wrapper::Tag(tag) => {
                        let mut bean = bean;
                        bean.set_name(tag.as_str());
                        return Ok(Some(bean));
                    }
                }
            }
            Payload::Collection(collection) => collection.serialize_into(value, &mut element, ctx)?,
            Payload::Map(map) => map.serialize_into(value, &mut element, ctx)?,
        }
        Ok(Some(element))
    }

    /// Reads the slot's attribute from the owner element.
    pub(crate) fn deserialize_attribute(&self, owner: &mut dyn Reflect, text: &str) -> Result<()> {
        match &self.kind {
            SlotKind::Attribute { codec, .. } if self.accessor.accepts_input() => {
                codec.apply(&*self.accessor, owner, text)
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn deserialize_text(&self, owner: &mut dyn Reflect, text: &str) -> Result<()> {
        match &self.kind {
            SlotKind::Text { codec } if self.accessor.accepts_input() => codec.apply(&*self.accessor, owner, text),
            _ => Ok(()),
        }
    }

    /// Reads one matched child node.
    pub(crate) fn deserialize<N: Node>(&self, owner: &mut dyn Reflect, node: &N, ctx: &Ctx<'_>) -> Result<()> {
        if !self.accessor.accepts_input() {
            trace!(slot = self.name(), "Slot is read-only, skipping");
            return Ok(());
        }
        match &self.kind {
            SlotKind::Wrapped { wrapper, payload } => self.deserialize_wrapped(wrapper, payload, owner, node, ctx),
            SlotKind::Opaque { .. } => self.accessor.modify(owner, &mut |slot| replace_element(slot, node)),
            SlotKind::CompactList { .. } => self.store_items(owner, compact::deserialize(node)),
            SlotKind::FlatCollection(_) => self.deserialize_batch(owner, &[node], ctx),
            SlotKind::Attribute { .. } | SlotKind::Text { .. } | SlotKind::FlatBean | SlotKind::FlatAttributes => {
                Ok(())
            }
        }
    }

    fn deserialize_wrapped<N: Node>(
        &self,
        wrapper: &Wrapper,
        payload: &Payload,
        owner: &mut dyn Reflect,
        node: &N,
        ctx: &Ctx<'_>,
    ) -> Result<()> {
        match payload {
            Payload::Scalar(codec) => {
                let text = match wrapper {
                    Wrapper::Option { value_attribute, .. } if !value_attribute.is_empty() => {
                        match node.attribute(value_attribute) {
                            Some(text) => text.to_string(),
                            None => return Ok(()),
                        }
                    }
                    _ => node.text_content(),
                };
                codec.apply(&*self.accessor, owner, &text)
            }
            Payload::Bean => {
                let source = match wrapper {
                    Wrapper::Option { .. } => match node.child_elements().next() {
                        Some(child) => child,
                        None => return Ok(()),
                    },
                    Wrapper::Tag(_) => node,
                };
                self.accessor
                    .modify(owner, &mut |slot| deserialize_in_place(slot, source, ctx))
            }
            Payload::Collection(collection) => {
                let items = collection.deserialize_items(&collection.item_nodes(node), ctx)?;
                self.store_items(owner, items)
            }
            Payload::Map(map) => {
                let entries = map.deserialize_entries(&map.entry_nodes(node), ctx)?;
                let mut entries = Some(entries);
                self.accessor
                    .modify(owner, &mut |slot| store_entries(slot, entries.take().unwrap_or_default()))
            }
        }
    }

    /// Reads every sibling claimed by a multi-node slot at once.
    pub(crate) fn deserialize_batch<N: Node>(&self, owner: &mut dyn Reflect, nodes: &[&N], ctx: &Ctx<'_>) -> Result<()> {
        let SlotKind::FlatCollection(collection) = &self.kind else {
            return Ok(());
        };
        if !self.accessor.accepts_input() {
            return Ok(());
        }
        let items = collection.deserialize_items(nodes, ctx)?;
        self.store_items(owner, items)
    }

    /// Reads a flat slot from the whole owner element.
    pub(crate) fn deserialize_flat<N: Node>(&self, owner: &mut dyn Reflect, node: &N, ctx: &Ctx<'_>) -> Result<()> {
        if !self.accessor.accepts_input() {
            return Ok(());
        }
        match &self.kind {
            SlotKind::FlatBean => self
                .accessor
                .modify(owner, &mut |slot| deserialize_flat_bean(slot, node, ctx)),
            SlotKind::FlatAttributes => self.accessor.modify(owner, &mut |slot| {
                let info = slot.reflect_info().unwrap_option();
                ctx.with_bean(&info, |bean| bean.deserialize_attributes(slot, node))
            }),
            _ => Ok(()),
        }
    }

    fn store_items(&self, owner: &mut dyn Reflect, items: Vec<Box<dyn Reflect>>) -> Result<()> {
        let mut items = Some(items);
        self.accessor
            .modify(owner, &mut |slot| store_items(slot, items.take().unwrap_or_default()))
    }

    /// Writes a scalar slot of `owner` as an attribute of `parent`, named
    /// after the slot unless it already is an attribute.
    pub(crate) fn serialize_as_attribute(&self, owner: &dyn Reflect, parent: &mut Element) -> Result<()> {
        let Some(codec) = self.scalar_codec() else {
            return Ok(());
        };
        let value = self.accessor.read(owner)?;
        if let Some(text) = codec.to_text(&*value)? {
            parent.set_attribute(self.attribute_name().unwrap_or(self.name()), text);
        }
        Ok(())
    }

    pub(crate) fn deserialize_as_attribute<N: Node>(&self, owner: &mut dyn Reflect, node: &N) -> Result<()> {
        let Some(codec) = self.scalar_codec() else {
            return Ok(());
        };
        if !self.accessor.accepts_input() {
            return Ok(());
        }
        match node.attribute(self.attribute_name().unwrap_or(self.name())) {
            Some(text) => codec.apply(&*self.accessor, owner, text),
            None => Ok(()),
        }
    }

    pub(crate) fn to_json(&self, owner: &dyn Reflect, ctx: &Ctx<'_>) -> Result<Value> {
        let value = self.accessor.read(owner)?;
        match self.scalar_codec() {
            Some(codec) if codec.is_converter() => Ok(codec
                .to_text(&*value)?
                .map(Value::String)
                .unwrap_or(Value::Null)),
            _ => json::value_to_json(&*value, ctx),
        }
    }

    pub(crate) fn set_from_json(&self, owner: &mut dyn Reflect, value: &Value, ctx: &Ctx<'_>) -> Result<()> {
        if !self.accessor.accepts_input() {
            return Ok(());
        }
        match self.scalar_codec() {
            Some(codec) if codec.is_converter() => match value {
                Value::Null => self.accessor.modify(owner, &mut clear_option),
                Value::String(text) => codec.apply(&*self.accessor, owner, text),
                other => codec.apply(&*self.accessor, owner, &other.to_string()),
            },
            _ => self
                .accessor
                .modify(owner, &mut |slot| json::value_from_json(slot, value, ctx)),
        }
    }
}

fn non_empty<'a>(name: &'a str, fallback: &'a str) -> &'a str {
    if name.is_empty() { fallback } else { name }
}

/// `myFooBar` for slot `fooBar`, accepted on read for old documents.
fn legacy_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("my{}{}", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

fn select(accessor: &dyn Accessor, owner: &str) -> Result<SlotKind> {
    let slot = accessor.slot();
    let name = accessor.name();
    let info = accessor.type_info().unwrap_option();

    let require_codec = |layout: &str| -> Result<Codec> {
        Codec::for_slot(accessor, owner)?.ok_or_else(|| {
            XmlbError::config(
                owner,
                format!("{layout} slot '{name}' is {}, which has no text form", info.type_name),
            )
        })
    };

    match &slot.storage {
        Storage::Attribute(attribute) => {
            return Ok(SlotKind::Attribute {
                name: non_empty(attribute, name).to_string(),
                codec: require_codec("attribute")?,
            });
        }
        Storage::Text => {
            return Ok(SlotKind::Text {
                codec: require_codec("text")?,
            });
        }
        _ => {}
    }

    if slot.converter.is_some() {
        let codec = require_codec("converter")?;
        let wrapper = match &slot.storage {
            Storage::Tag(tag) => Wrapper::Tag(non_empty(tag, name).to_string()),
            Storage::OptionTag {
                tag,
                name_attribute,
                value_attribute,
            } => Wrapper::option(tag, name_attribute, value_attribute, name),
            _ => Wrapper::option(OPTION_TAG, NAME_ATTRIBUTE, VALUE_ATTRIBUTE, name),
        };
        return Ok(SlotKind::Wrapped {
            wrapper,
            payload: Payload::Scalar(codec),
        });
    }

    if matches!(info.kind, TypeKind::Element) {
        let tag = match &slot.storage {
            Storage::Tag(tag) => non_empty(tag, name),
            _ => name,
        };
        return Ok(SlotKind::Opaque { tag: tag.to_string() });
    }

    match &slot.storage {
        Storage::Tag(tag) => {
            return Ok(SlotKind::Wrapped {
                wrapper: Wrapper::Tag(non_empty(tag, name).to_string()),
                payload: Payload::for_slot(accessor, owner)?,
            });
        }
        Storage::CompactList(tag) => {
            let string_list = matches!(
                info.kind,
                TypeKind::List { kind: CollectionKind::List, item } if matches!(item().scalar_kind(), Some(ScalarKind::String))
            );
            if !string_list {
                return Err(XmlbError::config(
                    owner,
                    format!("compact list slot '{name}' must be a Vec<String>, found {}", info.type_name),
                ));
            }
            return Ok(SlotKind::CompactList {
                tag: non_empty(tag, name).to_string(),
            });
        }
        _ => {}
    }

    match (slot.flat, info.kind) {
        (Some(FlatStyle::Nested), TypeKind::Bean(_)) => return Ok(SlotKind::FlatBean),
        (Some(FlatStyle::Nested), TypeKind::List { kind, item }) => {
            return Ok(SlotKind::FlatCollection(CollectionBinding::new(
                kind,
                item(),
                slot.collection.clone().unwrap_or_default(),
            )));
        }
        (Some(FlatStyle::Attributes), TypeKind::Bean(_)) => return Ok(SlotKind::FlatAttributes),
        (Some(_), _) => {
            return Err(XmlbError::config(
                owner,
                format!("slot '{name}' of type {} cannot be flattened", info.type_name),
            ));
        }
        (None, _) => {}
    }

    if let (Some(options), TypeKind::List { .. }) = (&slot.collection, info.kind) {
        if !options.property_element_name.is_empty() || options.style == CollectionStyle::V2 {
            return Ok(SlotKind::Wrapped {
                wrapper: Wrapper::Tag(non_empty(&options.property_element_name, name).to_string()),
                payload: Payload::for_slot(accessor, owner)?,
            });
        }
    }

    if let (Some(options), TypeKind::Map { .. }) = (&slot.map, info.kind) {
        if !options.property_element_name.is_empty() {
            return Ok(SlotKind::Wrapped {
                wrapper: Wrapper::Tag(options.property_element_name.clone()),
                payload: Payload::for_slot(accessor, owner)?,
            });
        }
    }

    let wrapper = match &slot.storage {
        Storage::OptionTag {
            tag,
            name_attribute,
            value_attribute,
        } => Wrapper::option(tag, name_attribute, value_attribute, name),
        _ => Wrapper::option(OPTION_TAG, NAME_ATTRIBUTE, VALUE_ATTRIBUTE, name),
    };
    Ok(SlotKind::Wrapped {
        wrapper,
        payload: Payload::for_slot(accessor, owner)?,
    })
}

/// An absent optional flat bean is only created when `node` holds at least
/// one of its slots.
fn deserialize_flat_bean<N: Node>(slot: &mut dyn Reflect, node: &N, ctx: &Ctx<'_>) -> Result<()> {
    let info = slot.reflect_info();
    if !matches!(info.kind, TypeKind::Option(_)) {
        return deserialize_in_place(slot, node, ctx);
    }
    let ReflectMut::Option(option) = slot.reflect_mut() else {
        return Err(XmlbError::mismatch("option", info.type_name));
    };
    if let Some(current) = option.get_mut() {
        return deserialize_in_place(current, node, ctx);
    }

    let inner = info.unwrap_option();
    let mut value = inner.new_instance()?;
    let mut found = Vec::new();
    ctx.with_bean(&inner, |bean| bean.deserialize_into(&mut *value, node, ctx, Some(&mut found)))?;
    if found.is_empty() {
        trace!(bean = inner.type_name, node = node.name(), "No slots of the flat bean, leaving it absent");
        return Ok(());
    }
    option.set_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_name() {
        assert_eq!(legacy_name("fooBar"), "myFooBar");
        assert_eq!(legacy_name("x"), "myX");
        assert_eq!(legacy_name(""), "");
    }

    #[test]
    fn test_option_wrapper_matching() -> Result<()> {
        let wrapper = Wrapper::option(OPTION_TAG, NAME_ATTRIBUTE, VALUE_ATTRIBUTE, "count");
        let current = xmlb_dom::parse_str(r#"<option name="count" value="1"/>"#)?;
        let legacy = xmlb_dom::parse_str(r#"<option name="myCount" value="1"/>"#)?;
        let other = xmlb_dom::parse_str(r#"<option name="size" value="1"/>"#)?;
        assert!(wrapper.matches(&current, false));
        assert!(wrapper.matches(&legacy, true));
        assert!(!wrapper.matches(&legacy, false));
        assert!(!wrapper.matches(&other, true));
        Ok(())
    }

    #[test]
    fn test_nameless_option_wrapper() -> Result<()> {
        let wrapper = Wrapper::option("setting", "", "v", "count");
        let element = wrapper.element();
        assert_eq!(element.name(), "setting");
        assert!(element.attributes().is_empty());
        assert!(wrapper.matches(&element, false));
        Ok(())
    }
}
