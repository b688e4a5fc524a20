//! Root entry points and the binding cache.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, trace};
use xmlb_dom::{Element, Node};

use crate::binding::{Ctx, TypeBinding, deserialize_in_place, present};
use crate::config::SerializerConfig;
use crate::error::{Result, XmlbError};
use crate::filter::SerializationFilter;
use crate::json;
use crate::reflect::{Reflect, TypeInfo, Typed};

/// Bindings per type, built at most once.
///
/// Readers take the map's read lock only long enough to clone an entry.
/// Construction is guarded per entry, so two types can be bound
/// concurrently. A failed build leaves nothing behind.
#[derive(Default)]
struct BindingCache {
    entries: RwLock<HashMap<TypeId, Arc<OnceCell<Arc<TypeBinding>>>>>,
}

impl BindingCache {
    fn get_or_build(&self, info: &TypeInfo) -> Result<Arc<TypeBinding>> {
        let existing = self.entries.read().get(&info.type_id).cloned();
        let cell = match existing {
            Some(cell) => {
                if let Some(binding) = cell.get() {
                    trace!(type_name = info.type_name, "Binding cache hit");
                    return Ok(binding.clone());
                }
                cell
            }
            None => self.entries.write().entry(info.type_id).or_default().clone(),
        };

        match cell.get_or_try_init(|| TypeBinding::build(info).map(Arc::new)) {
            Ok(binding) => Ok(binding.clone()),
            Err(err) => {
                let mut entries = self.entries.write();
                if entries
                    .get(&info.type_id)
                    .is_some_and(|current| Arc::ptr_eq(current, &cell))
                {
                    entries.remove(&info.type_id);
                }
                Err(err)
            }
        }
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    fn clear(&self) {
        self.entries.write().clear();
    }
}

/// Serializes reflected values to markup and back.
///
/// Each serializer owns its binding cache. [`XmlSerializer::global`] is a
/// shared instance with the default configuration.
#[derive(Default)]
pub struct XmlSerializer {
    config: SerializerConfig,
    cache: BindingCache,
}

impl XmlSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SerializerConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|errors| XmlbError::config("SerializerConfig", errors.join("; ")))?;
        Ok(Self {
            config,
            cache: BindingCache::default(),
        })
    }

    pub fn global() -> &'static XmlSerializer {
        static GLOBAL: Lazy<XmlSerializer> = Lazy::new(XmlSerializer::new);
        &GLOBAL
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Writes a bean, collection, map or element as one element.
    pub fn serialize(&self, value: &dyn Reflect, filter: Option<&dyn SerializationFilter>) -> Result<Element> {
        let value = present(value).ok_or_else(|| XmlbError::mismatch("value", "None"))?;
        let ctx = Ctx::new(self, filter);
        self.binding(&value.reflect_info())?.serialize(value, &ctx)
    }

    /// Like [`serialize`](Self::serialize), but a bean's slots are written
    /// straight into `parent` instead of a new element.
    pub fn serialize_into(
        &self,
        value: &dyn Reflect,
        parent: &mut Element,
        filter: Option<&dyn SerializationFilter>,
    ) -> Result<()> {
        let Some(value) = present(value) else {
            return Ok(());
        };
        let ctx = Ctx::new(self, filter);
        match &*self.binding(&value.reflect_info())? {
            TypeBinding::Bean(bean) => bean.serialize_into(value, parent, &ctx),
            other => {
                parent.add_child(other.serialize(value, &ctx)?);
                Ok(())
            }
        }
    }

    /// Builds a fresh `T` from `node`.
    pub fn deserialize<T: Typed, N: Node>(&self, node: &N) -> Result<T> {
        let mut value = T::type_info().new_instance()?;
        self.deserialize_into(&mut *value, node)?;
        T::take_from(value)
    }

    /// Fills an existing value from `node`. Slots absent from the markup
    /// keep their current values.
    pub fn deserialize_into<N: Node>(&self, target: &mut dyn Reflect, node: &N) -> Result<()> {
        let ctx = Ctx::new(self, None);
        deserialize_in_place(target, node, &ctx)
    }

    pub fn to_json(&self, value: &dyn Reflect) -> Result<Value> {
        let ctx = Ctx::new(self, None);
        json::value_to_json(value, &ctx)
    }

    pub fn from_json<T: Typed>(&self, json: &Value) -> Result<T> {
        let mut value = T::type_info().new_instance()?;
        self.deserialize_json_into(&mut *value, json)?;
        T::take_from(value)
    }

    pub fn deserialize_json_into(&self, target: &mut dyn Reflect, json: &Value) -> Result<()> {
        let ctx = Ctx::new(self, None);
        json::value_from_json(target, json, &ctx)
    }

    /// Number of bindings built so far.
    pub fn cached_bindings(&self) -> usize {
        self.cache.len()
    }

    /// Drops every cached binding; they are rebuilt on demand.
    pub fn clear_cache(&self) {
        debug!(bindings = self.cache.len(), "Clearing binding cache");
        self.cache.clear();
    }

    pub(crate) fn binding(&self, info: &TypeInfo) -> Result<Arc<TypeBinding>> {
        self.cache.get_or_build(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SerializerConfig;

    #[test]
    fn test_scalar_root_is_rejected_and_not_cached() {
        let serializer = XmlSerializer::new();
        let result = serializer.serialize(&5i32, None);
        assert!(matches!(result, Err(XmlbError::Config { .. })));
        assert_eq!(serializer.cached_bindings(), 0);
        assert!(serializer.cache.entries.read().is_empty());
    }

    #[test]
    fn test_collection_binding_is_cached() -> Result<()> {
        let serializer = XmlSerializer::new();
        let list = vec![1, 2];
        let first = serializer.serialize(&list, None)?;
        let second = serializer.serialize(&list, None)?;
        assert_eq!(first, second);
        assert_eq!(serializer.cached_bindings(), 1);

        serializer.clear_cache();
        assert_eq!(serializer.cached_bindings(), 0);
        Ok(())
    }

    #[test]
    fn test_with_config_validates() {
        let config = SerializerConfig {
            indent: 64,
            ..Default::default()
        };
        assert!(XmlSerializer::with_config(config).is_err());
    }
}
