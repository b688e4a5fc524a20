//! Maps, one `<entry>` per key.
//!
//! Scalar keys and values are attributes of the entry. Structural ones are
//! nested, under `<key>`/`<value>` unless the layout drops those wrappers:
//!
//! ```text
//! <map>
//!   <entry key="a" value="1"/>
//!   <entry key="b">
//!     <value><Point x="1" y="2"/></value>
//!   </entry>
//! </map>
//! ```

use tracing::trace;
use xmlb_dom::{Element, Node};

use super::{Ctx, deserialize_fresh, present, resolve_type, serialize_value};
use crate::error::{Result, XmlbError};
use crate::reflect::{MapKind, Reflect, ReflectRef, TypeInfo, TypeKind, compare_natural};
use crate::scalar;
use crate::slot::MapOptions;

const MAP_TAG: &str = "map";
const KEY_TAG: &str = "key";
const VALUE_TAG: &str = "value";

pub(crate) struct MapBinding {
    kind: MapKind,
    key: TypeInfo,
    value: TypeInfo,
    options: MapOptions,
}

/// One side of an entry.
struct Part<'b> {
    attribute: &'b str,
    wrapper: &'static str,
    surround: bool,
    info: TypeInfo,
}

impl MapBinding {
    pub(crate) fn new(kind: MapKind, key: TypeInfo, value: TypeInfo, options: MapOptions) -> Self {
        Self {
            kind,
            key,
            value,
            options,
        }
    }

    fn key_part(&self) -> Part<'_> {
        Part {
            attribute: &self.options.key_attribute,
            wrapper: KEY_TAG,
            surround: self.options.surround_key_with_tag,
            info: self.key,
        }
    }

    fn value_part(&self) -> Part<'_> {
        Part {
            attribute: &self.options.value_attribute,
            wrapper: VALUE_TAG,
            surround: self.options.surround_value_with_tag,
            info: self.value,
        }
    }

    pub(crate) fn serialize_entries(&self, value: &dyn Reflect, ctx: &Ctx<'_>) -> Result<Vec<Element>> {
        let Some(value) = present(value) else {
            return Ok(Vec::new());
        };
        let ReflectRef::Map(map) = value.reflect_ref() else {
            return Err(XmlbError::mismatch("map", value.type_name()));
        };

        let mut entries: Vec<(&dyn Reflect, &dyn Reflect)> = map.entries().collect();
        let sort = ctx.config().sort_unordered_collections && self.options.sort_before_save;
        if sort && matches!(self.kind, MapKind::Hash) && entries.len() > 1 {
            entries.sort_by(|(a, _), (b, _)| compare_natural(*a, *b));
        }

        let mut out = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let mut entry = Element::new(self.options.entry_tag.as_str());
            self.write_part(&mut entry, &self.key_part(), key, ctx)?;
            self.write_part(&mut entry, &self.value_part(), value, ctx)?;
            out.push(entry);
        }
        Ok(out)
    }

    fn write_part(&self, entry: &mut Element, part: &Part<'_>, value: &dyn Reflect, ctx: &Ctx<'_>) -> Result<()> {
        if let Some(text) = scalar::to_text(value) {
            entry.set_attribute(part.attribute, text);
            return Ok(());
        }
        let Some(element) = serialize_value(value, ctx)? else {
            return Ok(());
        };
        if part.surround {
            entry.add_child(Element::new(part.wrapper).with_child(element));
        } else {
            entry.add_child(element);
        }
        Ok(())
    }

    pub(crate) fn serialize_wrapped(&self, value: &dyn Reflect, ctx: &Ctx<'_>) -> Result<Element> {
        let mut wrapper = Element::new(MAP_TAG);
        for entry in self.serialize_entries(value, ctx)? {
            wrapper.add_child(entry);
        }
        Ok(wrapper)
    }

    pub(crate) fn serialize_into(&self, value: &dyn Reflect, parent: &mut Element, ctx: &Ctx<'_>) -> Result<()> {
        if self.options.surround_with_tag {
            parent.add_child(self.serialize_wrapped(value, ctx)?);
        } else {
            for entry in self.serialize_entries(value, ctx)? {
                parent.add_child(entry);
            }
        }
        Ok(())
    }

    /// Entry nodes directly below a `<map>` element.
    pub(crate) fn entry_nodes_of_wrapper<'n, N: Node>(&self, wrapper: &'n N) -> Vec<&'n N> {
        wrapper
            .child_elements()
            .filter(|child| child.name() == self.options.entry_tag)
            .collect()
    }

    /// Entry nodes below a slot element, with or without a `<map>` wrapper.
    pub(crate) fn entry_nodes<'n, N: Node>(&self, container: &'n N) -> Vec<&'n N> {
        match container.first_child(MAP_TAG) {
            Some(wrapper) => self.entry_nodes_of_wrapper(wrapper),
            None => self.entry_nodes_of_wrapper(container),
        }
    }

    pub(crate) fn deserialize_entries<N: Node>(
        &self,
        nodes: &[&N],
        ctx: &Ctx<'_>,
    ) -> Result<Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>> {
        let mut entries = Vec::with_capacity(nodes.len());
        for node in nodes {
            let Some((key, consumed)) = self.read_part(*node, &self.key_part(), 0, ctx)? else {
                trace!(entry = node.name(), "Skipping entry without a key");
                continue;
            };
            let value = match self.read_part(*node, &self.value_part(), consumed, ctx)? {
                Some((value, _)) => value,
                None => self.value.new_instance()?,
            };
            entries.push((key, value));
        }
        Ok(entries)
    }

    /// Reads one side of an entry. Unwrapped structural parts share the
    /// entry's children, so the lookup starts after the first `skip` of
    /// them; the second item is how many children this part consumed.
    fn read_part<N: Node>(
        &self,
        entry: &N,
        part: &Part<'_>,
        skip: usize,
        ctx: &Ctx<'_>,
    ) -> Result<Option<(Box<dyn Reflect>, usize)>> {
        if part.info.scalar_kind().is_some() {
            return match entry.attribute(part.attribute) {
                Some(text) => Ok(scalar::from_text(part.info, text)?.map(|value| (value, 0))),
                None => Ok(None),
            };
        }

        let (holder, skip) = if part.surround {
            match entry.first_child(part.wrapper) {
                Some(holder) => (holder, 0),
                None => return Ok(None),
            }
        } else {
            (entry, skip)
        };
        let node = holder.child_elements().enumerate().skip(skip).find(|(_, child)| {
            child.name() != KEY_TAG
                && child.name() != VALUE_TAG
                && resolve_type(part.info, &[], child.name()).is_some()
        });
        match node {
            Some((index, node)) => {
                let info = resolve_type(part.info, &[], node.name()).unwrap_or(part.info);
                let consumed = if part.surround { 0 } else { index + 1 };
                Ok(Some((deserialize_fresh(info, node, ctx)?, consumed)))
            }
            None if matches!(part.info.unwrap_option().kind, TypeKind::Dynamic) => Err(XmlbError::UnknownType {
                tag: holder.name().to_string(),
            }),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::Typed;
    use crate::serializer::XmlSerializer;
    use indexmap::IndexMap;
    use std::collections::{BTreeMap, HashMap};

    fn binding<K: Typed, V: Typed>(kind: MapKind) -> MapBinding {
        MapBinding::new(kind, K::type_info(), V::type_info(), MapOptions::default())
    }

    #[test]
    fn test_hash_map_entries_are_sorted() -> Result<()> {
        let serializer = XmlSerializer::new();
        let ctx = Ctx::new(&serializer, None);
        let map: HashMap<String, i32> = [("b", 2), ("a", 1), ("c", 3)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let entries = binding::<String, i32>(MapKind::Hash).serialize_entries(&map, &ctx)?;
        let keys: Vec<&str> = entries.iter().filter_map(|e| e.attribute("key")).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(entries[0].attribute("value"), Some("1"));
        Ok(())
    }

    #[test]
    fn test_nested_values() -> Result<()> {
        let serializer = XmlSerializer::new();
        let ctx = Ctx::new(&serializer, None);
        let binding = binding::<String, Vec<String>>(MapKind::Sorted);

        let mut map = BTreeMap::new();
        map.insert("k".to_string(), vec!["x".to_string()]);
        let wrapped = binding.serialize_wrapped(&map, &ctx)?;
        let entry = wrapped.child("entry").ok_or_else(|| XmlbError::mismatch("entry", "none"))?;
        assert!(entry.child("value").and_then(|v| v.child("list")).is_some());

        let entries = binding.deserialize_entries(&binding.entry_nodes_of_wrapper(&wrapped), &ctx)?;
        let mut back = BTreeMap::<String, Vec<String>>::new();
        super::super::store_entries(&mut back, entries)?;
        assert_eq!(back, map);
        Ok(())
    }

    #[test]
    fn test_entry_nodes_without_wrapper() -> Result<()> {
        let binding = binding::<String, String>(MapKind::Linked);
        let node = xmlb_dom::parse_str(r#"<option name="m"><entry key="a" value="b"/></option>"#)?;
        assert_eq!(binding.entry_nodes(&node).len(), 1);
        Ok(())
    }

    #[test]
    fn test_unwrapped_key_and_value_of_the_same_type() -> Result<()> {
        let serializer = XmlSerializer::new();
        let ctx = Ctx::new(&serializer, None);
        let options = MapOptions {
            surround_key_with_tag: false,
            surround_value_with_tag: false,
            ..MapOptions::default()
        };
        let binding = MapBinding::new(
            MapKind::Linked,
            Vec::<String>::type_info(),
            Vec::<String>::type_info(),
            options,
        );

        let mut map = IndexMap::new();
        map.insert(vec!["k".to_string()], vec!["v".to_string()]);
        map.insert(vec!["j".to_string()], Vec::new());
        let wrapped = binding.serialize_wrapped(&map, &ctx)?;
        let entry = wrapped.child("entry").ok_or_else(|| XmlbError::mismatch("entry", "none"))?;
        assert_eq!(entry.child_elements().filter(|child| child.name() == "list").count(), 2);

        let entries = binding.deserialize_entries(&binding.entry_nodes_of_wrapper(&wrapped), &ctx)?;
        let mut back = IndexMap::<Vec<String>, Vec<String>>::new();
        super::super::store_entries(&mut back, entries)?;
        assert_eq!(back, map);
        Ok(())
    }
}
