//! Diff-stable round trips of settings beans.
//!
//! [`SmartSerializer`] remembers which slots the last document it read
//! contained, and in which order. Writing then keeps those slots even when
//! they hold default values, drops every other default, and emits slots in
//! the remembered order. Repeated load/modify/save cycles only touch the
//! lines that actually changed.

use parking_lot::Mutex;
use tracing::debug;
use xmlb_dom::{Element, Node};

use crate::accessor::Accessor;
use crate::binding::{Ctx, present};
use crate::error::{Result, XmlbError};
use crate::filter::{SerializationFilter, SkipDefaultsFilter};
use crate::reflect::Reflect;
use crate::serializer::XmlSerializer;

pub struct SmartSerializer<'s> {
    serializer: &'s XmlSerializer,
    track_names: bool,
    names: Mutex<Option<Vec<String>>>,
    defaults: SkipDefaultsFilter,
}

impl Default for SmartSerializer<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl SmartSerializer<'static> {
    /// Routes through [`XmlSerializer::global`].
    pub fn new() -> Self {
        Self::with_serializer(XmlSerializer::global())
    }

    /// Only drops defaults; slot order and presence are not remembered.
    pub fn without_tracking() -> Self {
        Self {
            track_names: false,
            ..Self::new()
        }
    }
}

impl<'s> SmartSerializer<'s> {
    /// Uses the configuration and binding cache of `serializer`.
    pub fn with_serializer(serializer: &'s XmlSerializer) -> Self {
        Self {
            serializer,
            track_names: true,
            names: Mutex::new(None),
            defaults: SkipDefaultsFilter::new(),
        }
    }

    /// Slot names seen by the last read, in document order.
    pub fn serialized_names(&self) -> Option<Vec<String>> {
        self.names.lock().clone()
    }

    pub fn read_external<N: Node>(&self, target: &mut dyn Reflect, node: &N) -> Result<()> {
        let ctx = Ctx::new(self.serializer, None);
        let info = target.reflect_info().unwrap_option();
        if !self.track_names {
            return ctx.with_bean(&info, |bean| bean.deserialize_into(target, node, &ctx, None));
        }

        let mut names = Vec::new();
        ctx.with_bean(&info, |bean| bean.deserialize_into(target, node, &ctx, Some(&mut names)))?;
        debug!(bean = info.type_name, slots = names.len(), "Tracked serialized slots");
        *self.names.lock() = Some(names);
        Ok(())
    }

    /// Writes the bean's slots into `parent`.
    pub fn write_external(&self, value: &dyn Reflect, parent: &mut Element) -> Result<()> {
        let value = present(value).ok_or_else(|| XmlbError::mismatch("bean", "None"))?;
        let names = self.names.lock().clone();

        let keep = |accessor: &dyn Accessor, bean: &dyn Reflect, current: &dyn Reflect| {
            let seen = names
                .as_ref()
                .is_some_and(|names| names.iter().any(|name| name == accessor.name()));
            seen || self.defaults.is_modified(accessor, bean, current)
        };
        let filter: &dyn SerializationFilter = &keep;
        let ctx = Ctx::new(self.serializer, Some(filter));
        ctx.with_bean(&value.reflect_info(), |bean| {
            bean.serialize_ordered(value, parent, &ctx, names.as_deref())
        })
    }
}
