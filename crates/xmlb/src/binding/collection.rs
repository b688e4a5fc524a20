//! Ordered collections, sets and arrays.
//!
//! ```text
//! <list>
//!   <option value="a"/>          scalar item
//!   <Point x="1" y="2"/>         bean item, under the bean's tag
//!   <list>...</list>             nested collection
//! </list>
//! ```

use tracing::trace;
use xmlb_dom::{Element, Node};

use super::{Ctx, deserialize_fresh, present, resolve_type, serialize_value};
use crate::error::{Result, XmlbError};
use crate::reflect::{
    COLLECTION_TAGS, CollectionKind, Reflect, ReflectRef, TypeInfo, TypeKind, compare_natural,
};
use crate::scalar;
use crate::slot::{CollectionOptions, CollectionStyle};

pub(crate) struct CollectionBinding {
    kind: CollectionKind,
    item: TypeInfo,
    options: CollectionOptions,
}

impl CollectionBinding {
    pub(crate) fn new(kind: CollectionKind, item: TypeInfo, options: CollectionOptions) -> Self {
        Self { kind, item, options }
    }

    /// Whether items are wrapped in `<list>`, `<set>`, ... under a slot.
    pub(crate) fn surrounds(&self) -> bool {
        self.options.surround_with_tag && self.options.style == CollectionStyle::V1
    }

    fn scalar_items(&self) -> bool {
        matches!(self.item.unwrap_option().kind, TypeKind::Scalar(_))
    }

    /// One element per item, in write order.
    pub(crate) fn serialize_items(&self, value: &dyn Reflect, ctx: &Ctx<'_>) -> Result<Vec<Element>> {
        let Some(value) = present(value) else {
            return Ok(Vec::new());
        };
        let ReflectRef::List(list) = value.reflect_ref() else {
            return Err(XmlbError::mismatch("collection", value.type_name()));
        };

        let mut items: Vec<&dyn Reflect> = list.items().collect();
        if self.kind.is_unordered() && ctx.config().sort_unordered_collections && items.len() > 1 {
            items.sort_by(|a, b| compare_natural(*a, *b));
        }

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if let Some(element) = self.serialize_item(item, ctx)? {
                out.push(element);
            }
        }
        Ok(out)
    }

    fn serialize_item(&self, item: &dyn Reflect, ctx: &Ctx<'_>) -> Result<Option<Element>> {
        if let Some(text) = scalar::to_text(item) {
            let mut element = Element::new(self.options.element_name.as_str());
            if self.options.value_attribute.is_empty() {
                element.add_text(text);
            } else {
                element.set_attribute(self.options.value_attribute.as_str(), text);
            }
            return Ok(Some(element));
        }
        serialize_value(item, ctx)
    }

    /// Items under the collection's own wrapper tag.
    pub(crate) fn serialize_wrapped(&self, value: &dyn Reflect, ctx: &Ctx<'_>) -> Result<Element> {
        let mut wrapper = Element::new(self.kind.tag());
        for item in self.serialize_items(value, ctx)? {
            wrapper.add_child(item);
        }
        Ok(wrapper)
    }

    /// Appends the items to `parent`, wrapped when the layout asks for it.
    pub(crate) fn serialize_into(&self, value: &dyn Reflect, parent: &mut Element, ctx: &Ctx<'_>) -> Result<()> {
        if self.surrounds() {
            parent.add_child(self.serialize_wrapped(value, ctx)?);
        } else {
            for item in self.serialize_items(value, ctx)? {
                parent.add_child(item);
            }
        }
        Ok(())
    }

    /// Item nodes below a slot element. A wrapper child is descended into
    /// whether or not the layout expects one.
    pub(crate) fn item_nodes<'n, N: Node>(&self, container: &'n N) -> Vec<&'n N> {
        let nested_collections = matches!(self.item.unwrap_option().kind, TypeKind::List { .. });
        let wrapper = container
            .child_elements()
            .find(|child| COLLECTION_TAGS.contains(&child.name()));
        match wrapper {
            Some(wrapper) if self.surrounds() || !nested_collections => wrapper.child_elements().collect(),
            _ => container.child_elements().collect(),
        }
    }

    /// Whether `node` can be read as an item.
    pub(crate) fn claims<N: Node>(&self, node: &N) -> bool {
        if self.scalar_items() {
            node.name() == self.options.element_name
        } else {
            resolve_type(self.item, &self.options.element_types, node.name()).is_some()
        }
    }

    pub(crate) fn deserialize_items<N: Node>(&self, nodes: &[&N], ctx: &Ctx<'_>) -> Result<Vec<Box<dyn Reflect>>> {
        let mut items = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let Some(item) = self.deserialize_item(*node, ctx)? {
                items.push(item);
            }
        }
        Ok(items)
    }

    fn deserialize_item<N: Node>(&self, node: &N, ctx: &Ctx<'_>) -> Result<Option<Box<dyn Reflect>>> {
        if self.scalar_items() {
            if node.name() != self.options.element_name {
                trace!(tag = node.name(), "Skipping non-item element");
                return Ok(None);
            }
            let text = if self.options.value_attribute.is_empty() {
                node.text_content()
            } else {
                match node.attribute(&self.options.value_attribute) {
                    Some(text) => text.to_string(),
                    None => return Ok(None),
                }
            };
            return scalar::from_text(self.item, &text);
        }

        match resolve_type(self.item, &self.options.element_types, node.name()) {
            Some(info) => deserialize_fresh(info, node, ctx).map(Some),
            None => {
                trace!(tag = node.name(), item = self.item.type_name, "No item type for element");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::Typed;
    use crate::serializer::XmlSerializer;
    use std::collections::{BTreeSet, HashSet};

    fn names(elements: &[Element]) -> Vec<String> {
        elements
            .iter()
            .filter_map(|e| e.attribute("value").map(String::from))
            .collect()
    }

    #[test]
    fn test_hash_set_items_are_sorted() -> Result<()> {
        let serializer = XmlSerializer::new();
        let ctx = Ctx::new(&serializer, None);
        let binding = CollectionBinding::new(
            CollectionKind::HashSet,
            i32::type_info(),
            CollectionOptions::default(),
        );
        let set: HashSet<i32> = [3, 1, 2, 10].into_iter().collect();
        let items = binding.serialize_items(&set, &ctx)?;
        assert_eq!(names(&items), vec!["1", "2", "3", "10"]);
        Ok(())
    }

    #[test]
    fn test_item_nodes_descend_into_wrapper() -> Result<()> {
        let binding = CollectionBinding::new(
            CollectionKind::SortedSet,
            String::type_info(),
            CollectionOptions::default(),
        );
        let with_wrapper = xmlb_dom::parse_str(r#"<option name="s"><set><option value="a"/></set></option>"#)?;
        let without = xmlb_dom::parse_str(r#"<option name="s"><option value="a"/></option>"#)?;
        assert_eq!(binding.item_nodes(&with_wrapper).len(), 1);
        assert_eq!(binding.item_nodes(&without).len(), 1);

        let serializer = XmlSerializer::new();
        let ctx = Ctx::new(&serializer, None);
        let items = binding.deserialize_items(&binding.item_nodes(&with_wrapper), &ctx)?;
        let mut set = BTreeSet::<String>::new();
        super::super::store_items(&mut set, items)?;
        assert!(set.contains("a"));
        Ok(())
    }

    #[test]
    fn test_text_items() -> Result<()> {
        let options = CollectionOptions {
            element_name: "path".to_string(),
            value_attribute: String::new(),
            ..Default::default()
        };
        let binding = CollectionBinding::new(CollectionKind::List, String::type_info(), options);
        let serializer = XmlSerializer::new();
        let ctx = Ctx::new(&serializer, None);

        let list = vec!["/a".to_string()];
        let items = binding.serialize_items(&list, &ctx)?;
        assert_eq!(items[0].text(), "/a");
        assert!(binding.claims(&items[0]));
        Ok(())
    }
}
