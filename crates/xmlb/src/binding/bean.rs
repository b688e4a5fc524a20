//! Whole-bean binding: one element per instance, one slot binding per
//! collected slot.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, trace, warn};
use xmlb_dom::{Element, Node};

use super::{Ctx, SlotBinding};
use crate::bean::{BeanInfo, PropertyCollector};
use crate::error::{Result, XmlbError};
use crate::json::json_kind;
use crate::reflect::{Reflect, ReflectMut, TypeKind};

pub(crate) struct BeanBinding {
    info: &'static BeanInfo,
    slots: Vec<SlotBinding>,
}

impl BeanBinding {
    pub(crate) fn build(info: &'static BeanInfo) -> Result<BeanBinding> {
        let accessors = PropertyCollector::global().collect(info);
        let slots = accessors
            .iter()
            .map(|accessor| SlotBinding::build(accessor.clone(), info.type_name()))
            .collect::<Result<Vec<_>>>()?;

        let mut names = HashSet::new();
        let mut attributes = HashSet::new();
        for slot in &slots {
            if !names.insert(slot.name()) {
                return Err(XmlbError::config(
                    info.type_name(),
                    format!("slot '{}' is declared twice", slot.name()),
                ));
            }
            if let Some(attribute) = slot.attribute_name() {
                if !attributes.insert(attribute) {
                    return Err(XmlbError::config(
                        info.type_name(),
                        format!("attribute '{attribute}' is bound by two slots"),
                    ));
                }
            }
        }
        if slots.iter().filter(|slot| slot.is_text()).count() > 1 {
            return Err(XmlbError::config(info.type_name(), "more than one slot is bound to text content"));
        }

        debug!(bean = info.type_name(), tag = info.tag(), slots = slots.len(), "Built bean binding");
        Ok(BeanBinding { info, slots })
    }

    pub(crate) fn tag(&self) -> &str {
        self.info.tag()
    }

    /// Filter precedence: `always_write`, then the slot's own filter, then
    /// the one passed to the call.
    fn accepts(&self, slot: &SlotBinding, owner: &dyn Reflect, value: &dyn Reflect, ctx: &Ctx<'_>) -> bool {
        let annotations = slot.accessor.slot();
        if annotations.always_write {
            return true;
        }
        if let Some(filter) = &annotations.filter {
            return filter.accepts(&*slot.accessor, owner, value);
        }
        ctx.filter
            .is_none_or(|filter| filter.accepts(&*slot.accessor, owner, value))
    }

    pub(crate) fn serialize(&self, value: &dyn Reflect, ctx: &Ctx<'_>) -> Result<Element> {
        let mut element = Element::new(self.tag());
        self.serialize_into(value, &mut element, ctx)?;
        Ok(element)
    }

    /// Writes every accepted slot into `parent`, in declaration order.
    pub(crate) fn serialize_into(&self, value: &dyn Reflect, parent: &mut Element, ctx: &Ctx<'_>) -> Result<()> {
        self.serialize_ordered(value, parent, ctx, None)
    }

    /// Like [`serialize_into`](Self::serialize_into), with slots named in
    /// `order` moved to those positions. Slots missing from `order` follow
    /// the closest earlier slot that is listed.
    pub(crate) fn serialize_ordered(
        &self,
        value: &dyn Reflect,
        parent: &mut Element,
        ctx: &Ctx<'_>,
        order: Option<&[String]>,
    ) -> Result<()> {
        let mut slots: Vec<&SlotBinding> = self.slots.iter().collect();
        if let Some(order) = order {
            let mut last = None;
            let mut keyed: Vec<_> = slots
                .into_iter()
                .enumerate()
                .map(|(seq, slot)| {
                    let position = order.iter().position(|name| name == slot.name());
                    if position.is_some() {
                        last = position;
                    }
                    ((position.or(last), position.is_none(), seq), slot)
                })
                .collect();
            keyed.sort_by_key(|(key, _)| *key);
            slots = keyed.into_iter().map(|(_, slot)| slot).collect();
        }

        for slot in slots {
            let current = slot.accessor.read(value)?;
            if !self.accepts(slot, value, &*current, ctx) {
                trace!(bean = self.info.type_name(), slot = slot.name(), "Filtered out");
                continue;
            }
            slot.serialize(&*current, parent, ctx)?;
        }
        Ok(())
    }

    /// Scalar slots as attributes of `parent`.
    pub(crate) fn serialize_attributes(&self, value: &dyn Reflect, parent: &mut Element) -> Result<()> {
        for slot in &self.slots {
            slot.serialize_as_attribute(value, parent)?;
        }
        Ok(())
    }

    pub(crate) fn deserialize_attributes<N: Node>(&self, target: &mut dyn Reflect, node: &N) -> Result<()> {
        let target = bean_target(target)?;
        for slot in &self.slots {
            slot.deserialize_as_attribute(target, node)?;
        }
        Ok(())
    }

    /// Fills `target` from `node`: attributes, then text, then children,
    /// then flat slots against the whole element. With a `tracker`, the
    /// names of the slots found in `node` are appended in document order.
    pub(crate) fn deserialize_into<N: Node>(
        &self,
        target: &mut dyn Reflect,
        node: &N,
        ctx: &Ctx<'_>,
        mut tracker: Option<&mut Vec<String>>,
    ) -> Result<()> {
        let target = bean_target(target)?;

        for (name, text) in node.attributes() {
            match self.slots.iter().find(|slot| slot.attribute_name() == Some(name)) {
                Some(slot) => {
                    slot.deserialize_attribute(target, text)?;
                    record(&mut tracker, slot.name());
                }
                None => trace!(bean = self.info.type_name(), attribute = name, "Unbound attribute"),
            }
        }

        if let Some(slot) = self.slots.iter().find(|slot| slot.is_text()) {
            let text = node.text_content();
            if !text.is_empty() {
                slot.deserialize_text(target, &text)?;
                record(&mut tracker, slot.name());
            }
        }

        let mut batches: Vec<Vec<&N>> = vec![Vec::new(); self.slots.len()];
        let mut seen = vec![false; self.slots.len()];
        for child in node.child_elements() {
            let Some(index) = self.slots.iter().position(|slot| slot.matches(child, ctx)) else {
                trace!(bean = self.info.type_name(), tag = child.name(), "Unbound element");
                continue;
            };
            let slot = &self.slots[index];
            if slot.is_multi() {
                batches[index].push(child);
                continue;
            }
            if seen[index] {
                warn!(
                    bean = self.info.type_name(),
                    slot = slot.name(),
                    tag = child.name(),
                    "Slot matched by more than one element, the last one wins"
                );
            } else {
                record(&mut tracker, slot.name());
            }
            seen[index] = true;
            slot.deserialize(target, child, ctx)?;
        }

        for (slot, nodes) in self.slots.iter().zip(&batches) {
            if !nodes.is_empty() {
                slot.deserialize_batch(target, nodes, ctx)?;
                record(&mut tracker, slot.name());
            }
        }

        for slot in self.slots.iter().filter(|slot| slot.is_flat()) {
            slot.deserialize_flat(target, node, ctx)?;
        }
        Ok(())
    }

    pub(crate) fn to_json(&self, value: &dyn Reflect, ctx: &Ctx<'_>) -> Result<Value> {
        let mut object = Map::new();
        for slot in &self.slots {
            object.insert(slot.name().to_string(), slot.to_json(value, ctx)?);
        }
        Ok(Value::Object(object))
    }

    /// Slots missing from `json` keep their value.
    pub(crate) fn set_from_json(&self, target: &mut dyn Reflect, json: &Value, ctx: &Ctx<'_>) -> Result<()> {
        let Value::Object(object) = json else {
            return Err(XmlbError::mismatch("JSON object", json_kind(json)));
        };
        let target = bean_target(target)?;
        for slot in &self.slots {
            if let Some(value) = object.get(slot.name()) {
                slot.set_from_json(target, value, ctx)?;
            }
        }
        Ok(())
    }
}

fn record(tracker: &mut Option<&mut Vec<String>>, name: &str) {
    if let Some(names) = tracker.as_deref_mut() {
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
}

/// The bean behind `target`, constructing through empty options.
fn bean_target(target: &mut dyn Reflect) -> Result<&mut dyn Reflect> {
    let info = target.reflect_info();
    match info.kind {
        TypeKind::Option(_) => match target.reflect_mut() {
            ReflectMut::Option(option) => bean_target(option.get_or_construct()?),
            _ => Err(XmlbError::mismatch("option", info.type_name)),
        },
        _ => Ok(target),
    }
}
