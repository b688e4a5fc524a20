//! Bindings between reflected values and markup.
//!
//! A [`TypeBinding`] exists per bindable type and is cached by the
//! serializer. Beans own one [`SlotBinding`] per collected slot; the variant
//! of each slot binding is chosen once, when the bean binding is built.
//! Nested structural values are not bound eagerly: their bindings are looked
//! up through the [`Ctx`] when a value is met, which keeps recursive types
//! finite.

mod bean;
mod collection;
mod compact;
mod map;
mod slot;

use std::sync::Arc;

use tracing::trace;
use xmlb_dom::{Element, Node};

use crate::accessor::Accessor;
use crate::config::SerializerConfig;
use crate::converter::ErasedConverter;
use crate::error::{Result, XmlbError};
use crate::filter::SerializationFilter;
use crate::reflect::{
    COLLECTION_TAGS, Reflect, ReflectMut, ReflectRef, TypeInfo, TypeKind,
};
use crate::scalar;
use crate::serializer::XmlSerializer;
use crate::slot::{CollectionOptions, MapOptions};

pub(crate) use bean::BeanBinding;
pub(crate) use collection::CollectionBinding;
pub(crate) use map::MapBinding;
pub(crate) use slot::SlotBinding;

/// State threaded through one serialize or deserialize call.
pub(crate) struct Ctx<'a> {
    pub(crate) serializer: &'a XmlSerializer,
    pub(crate) filter: Option<&'a dyn SerializationFilter>,
}

impl<'a> Ctx<'a> {
    pub(crate) fn new(serializer: &'a XmlSerializer, filter: Option<&'a dyn SerializationFilter>) -> Self {
        Self { serializer, filter }
    }

    pub(crate) fn config(&self) -> &SerializerConfig {
        self.serializer.config()
    }

    pub(crate) fn binding(&self, info: &TypeInfo) -> Result<Arc<TypeBinding>> {
        self.serializer.binding(info)
    }

    /// Runs `f` with the bean binding of `info`.
    pub(crate) fn with_bean<R>(&self, info: &TypeInfo, f: impl FnOnce(&BeanBinding) -> Result<R>) -> Result<R> {
        let binding = self.binding(info)?;
        match &*binding {
            TypeBinding::Bean(bean) => f(bean),
            _ => Err(XmlbError::mismatch("bean", info.type_name)),
        }
    }
}

/// Binding of a whole type.
pub(crate) enum TypeBinding {
    Bean(BeanBinding),
    Collection(CollectionBinding),
    Map(MapBinding),
    Element,
}

impl TypeBinding {
    pub(crate) fn build(info: &TypeInfo) -> Result<TypeBinding> {
        let binding = match info.kind {
            TypeKind::Bean(bean_info) => TypeBinding::Bean(BeanBinding::build(bean_info())?),
            TypeKind::List { kind, item } => TypeBinding::Collection(CollectionBinding::new(
                kind,
                item(),
                CollectionOptions::default(),
            )),
            TypeKind::Map { kind, key, value } => TypeBinding::Map(MapBinding::new(
                kind,
                key(),
                value(),
                MapOptions::default(),
            )),
            TypeKind::Element => TypeBinding::Element,
            TypeKind::Scalar(_) | TypeKind::Option(_) | TypeKind::Dynamic => {
                return Err(XmlbError::config(
                    info.type_name,
                    "only beans, collections, maps and elements can be bound as a whole",
                ));
            }
        };
        Ok(binding)
    }

    /// The value as one element: a bean under its tag, a collection or map
    /// under its wrapper tag.
    pub(crate) fn serialize(&self, value: &dyn Reflect, ctx: &Ctx<'_>) -> Result<Element> {
        match self {
            TypeBinding::Bean(bean) => bean.serialize(value, ctx),
            TypeBinding::Collection(collection) => collection.serialize_wrapped(value, ctx),
            TypeBinding::Map(map) => map.serialize_wrapped(value, ctx),
            TypeBinding::Element => match value.reflect_ref() {
                ReflectRef::Element(element) => Ok(element.clone()),
                _ => Err(XmlbError::mismatch("Element", value.type_name())),
            },
        }
    }

    pub(crate) fn deserialize_into<N: Node>(
        &self,
        target: &mut dyn Reflect,
        node: &N,
        ctx: &Ctx<'_>,
    ) -> Result<()> {
        match self {
            TypeBinding::Bean(bean) => bean.deserialize_into(target, node, ctx, None),
            TypeBinding::Collection(collection) => {
                let items = collection.deserialize_items(&node.child_elements().collect::<Vec<_>>(), ctx)?;
                store_items(target, items)
            }
            TypeBinding::Map(map) => {
                let entries = map.deserialize_entries(&map.entry_nodes_of_wrapper(node), ctx)?;
                store_entries(target, entries)
            }
            TypeBinding::Element => replace_element(target, node),
        }
    }
}

/// How a slot's text is produced and parsed.
#[derive(Clone)]
pub(crate) enum Codec {
    Scalar,
    Converter(Arc<dyn ErasedConverter>),
}

impl Codec {
    /// The codec of a slot: its converter, else the scalar codec when the
    /// slot is a scalar. Converters must target the slot's type.
    pub(crate) fn for_slot(accessor: &dyn Accessor, owner: &str) -> Result<Option<Codec>> {
        let info = accessor.type_info();
        if let Some(converter) = &accessor.slot().converter {
            let target = converter.target().type_id;
            if target != info.type_id && target != info.unwrap_option().type_id {
                return Err(XmlbError::config(
                    owner,
                    format!(
                        "converter of slot '{}' produces {}, slot is {}",
                        accessor.name(),
                        converter.target().type_name,
                        info.type_name
                    ),
                ));
            }
            return Ok(Some(Codec::Converter(converter.clone())));
        }
        Ok(info.scalar_kind().map(|_| Codec::Scalar))
    }

    pub(crate) fn is_converter(&self) -> bool {
        matches!(self, Codec::Converter(_))
    }

    pub(crate) fn to_text(&self, value: &dyn Reflect) -> Result<Option<String>> {
        match self {
            Codec::Scalar => Ok(scalar::to_text(value)),
            Codec::Converter(converter) => converter.to_text(value),
        }
    }

    /// Parses `text` into the slot behind `accessor`.
    pub(crate) fn apply(&self, accessor: &dyn Accessor, owner: &mut dyn Reflect, text: &str) -> Result<()> {
        match self {
            Codec::Scalar => accessor.modify(owner, &mut |slot| scalar::set_from_text(slot, text)),
            Codec::Converter(converter) => match converter.from_text(text) {
                Some(value) => accessor.write(owner, value),
                None => accessor.modify(owner, &mut clear_option),
            },
        }
    }

    /// Parses a fresh value of type `info`.
    pub(crate) fn parse(&self, info: TypeInfo, text: &str) -> Result<Option<Box<dyn Reflect>>> {
        match self {
            Codec::Scalar => scalar::from_text(info, text),
            Codec::Converter(converter) => Ok(converter.from_text(text)),
        }
    }
}

/// What a wrapper element (option tag or tag) holds.
pub(crate) enum Payload {
    Scalar(Codec),
    Bean,
    Collection(CollectionBinding),
    Map(MapBinding),
}

impl Payload {
    pub(crate) fn for_slot(accessor: &dyn Accessor, owner: &str) -> Result<Payload> {
        if let Some(codec) = Codec::for_slot(accessor, owner)? {
            return Ok(Payload::Scalar(codec));
        }
        let slot = accessor.slot();
        let info = accessor.type_info().unwrap_option();
        let payload = match info.kind {
            TypeKind::Bean(_) | TypeKind::Dynamic => Payload::Bean,
            TypeKind::List { kind, item } => Payload::Collection(CollectionBinding::new(
                kind,
                item(),
                slot.collection.clone().unwrap_or_default(),
            )),
            TypeKind::Map { kind, key, value } => Payload::Map(MapBinding::new(
                kind,
                key(),
                value(),
                slot.map.clone().unwrap_or_default(),
            )),
            TypeKind::Scalar(_) | TypeKind::Option(_) | TypeKind::Element => {
                return Err(XmlbError::config(
                    owner,
                    format!("slot '{}' has no wrapped layout", accessor.name()),
                ));
            }
        };
        Ok(payload)
    }
}

/// Looks through `Option` layers; `None` when a layer is empty.
pub(crate) fn present(value: &dyn Reflect) -> Option<&dyn Reflect> {
    match value.reflect_ref() {
        ReflectRef::Option(None) => None,
        ReflectRef::Option(Some(inner)) => present(inner),
        _ => Some(value),
    }
}

/// Writes a structural value as one element; `None` for scalars and empty
/// options.
pub(crate) fn serialize_value(value: &dyn Reflect, ctx: &Ctx<'_>) -> Result<Option<Element>> {
    let Some(value) = present(value) else {
        return Ok(None);
    };
    match value.reflect_ref() {
        ReflectRef::Scalar(_) | ReflectRef::Option(_) => Ok(None),
        ReflectRef::Element(element) => Ok(Some(element.clone())),
        ReflectRef::Bean(_) | ReflectRef::List(_) | ReflectRef::Map(_) => {
            let binding = ctx.binding(&value.reflect_info())?;
            binding.serialize(value, ctx).map(Some)
        }
    }
}

/// Fills `target` from `node` in place, constructing empty options first.
pub(crate) fn deserialize_in_place<N: Node>(target: &mut dyn Reflect, node: &N, ctx: &Ctx<'_>) -> Result<()> {
    let info = target.reflect_info();
    match info.kind {
        TypeKind::Option(_) => match target.reflect_mut() {
            ReflectMut::Option(option) => deserialize_in_place(option.get_or_construct()?, node, ctx),
            _ => Err(XmlbError::mismatch("option", info.type_name)),
        },
        TypeKind::Scalar(_) => {
            trace!(target_type = info.type_name, node = node.name(), "Reading scalar from element text");
            scalar::set_from_text(target, &node.text_content())
        }
        TypeKind::Element => replace_element(target, node),
        TypeKind::Bean(_) | TypeKind::List { .. } | TypeKind::Map { .. } => {
            ctx.binding(&info)?.deserialize_into(target, node, ctx)
        }
        TypeKind::Dynamic => Err(XmlbError::UnknownType {
            tag: node.name().to_string(),
        }),
    }
}

/// Builds a fresh value of type `info` from `node`.
pub(crate) fn deserialize_fresh<N: Node>(info: TypeInfo, node: &N, ctx: &Ctx<'_>) -> Result<Box<dyn Reflect>> {
    let mut value = info.new_instance()?;
    deserialize_in_place(&mut *value, node, ctx)?;
    Ok(value)
}

/// Element tag a structural type is written under.
pub(crate) fn tag_of(info: &TypeInfo) -> Option<&'static str> {
    match info.unwrap_option().kind {
        TypeKind::Bean(bean_info) => Some(bean_info().tag()),
        TypeKind::List { kind, .. } => Some(kind.tag()),
        TypeKind::Map { .. } => Some("map"),
        _ => None,
    }
}

/// Picks the concrete type for an element: the first candidate whose tag
/// matches, else the declared type when it claims the tag.
pub(crate) fn resolve_type(declared: TypeInfo, candidates: &[TypeInfo], tag: &str) -> Option<TypeInfo> {
    if let Some(candidate) = candidates.iter().find(|c| tag_of(c) == Some(tag)) {
        return Some(*candidate);
    }
    match declared.unwrap_option().kind {
        TypeKind::Bean(bean_info) if bean_info().tag() == tag => Some(declared),
        TypeKind::List { .. } if COLLECTION_TAGS.contains(&tag) => Some(declared),
        TypeKind::Map { .. } if tag == "map" => Some(declared),
        TypeKind::Element => Some(declared),
        _ => None,
    }
}

pub(crate) fn store_items(target: &mut dyn Reflect, items: Vec<Box<dyn Reflect>>) -> Result<()> {
    let type_name = target.type_name();
    match target.reflect_mut() {
        ReflectMut::List(list) => list.replace_items(items),
        ReflectMut::Option(option) => store_items(option.get_or_construct()?, items),
        _ => Err(XmlbError::mismatch("collection", type_name)),
    }
}

pub(crate) fn store_entries(
    target: &mut dyn Reflect,
    entries: Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>,
) -> Result<()> {
    let type_name = target.type_name();
    match target.reflect_mut() {
        ReflectMut::Map(map) => map.replace_entries(entries),
        ReflectMut::Option(option) => store_entries(option.get_or_construct()?, entries),
        _ => Err(XmlbError::mismatch("map", type_name)),
    }
}

pub(crate) fn replace_element<N: Node>(target: &mut dyn Reflect, node: &N) -> Result<()> {
    let type_name = target.type_name();
    match target.reflect_mut() {
        ReflectMut::Element(element) => {
            *element = node.to_element();
            Ok(())
        }
        ReflectMut::Option(option) => option.set_some(Box::new(node.to_element())),
        _ => Err(XmlbError::mismatch("Element", type_name)),
    }
}

pub(crate) fn clear_option(slot: &mut dyn Reflect) -> Result<()> {
    if let ReflectMut::Option(option) = slot.reflect_mut() {
        option.set_none();
    }
    Ok(())
}
