//! Policies deciding whether a slot is written.
//!
//! A filter sees the slot, the bean that owns it and the slot's current
//! value. Filters only affect serialization; reading never consults them.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::accessor::Accessor;
use crate::reflect::{Reflect, ReflectRef, ScalarValue, reflect_eq};

pub trait SerializationFilter: Send + Sync {
    fn accepts(&self, accessor: &dyn Accessor, bean: &dyn Reflect, value: &dyn Reflect) -> bool;
}

impl<F> SerializationFilter for F
where
    F: Fn(&dyn Accessor, &dyn Reflect, &dyn Reflect) -> bool + Send + Sync,
{
    fn accepts(&self, accessor: &dyn Accessor, bean: &dyn Reflect, value: &dyn Reflect) -> bool {
        self(accessor, bean, value)
    }
}

/// Drops slots whose value equals the one of a default-constructed bean.
///
/// One default instance is kept per bean type.
#[derive(Default)]
pub struct SkipDefaultsFilter {
    defaults: RwLock<HashMap<TypeId, Arc<dyn Reflect>>>,
}

impl SkipDefaultsFilter {
    pub fn new() -> Self {
        Self::default()
    }

    fn default_of(&self, bean: &dyn Reflect) -> Option<Arc<dyn Reflect>> {
        let info = bean.reflect_info();
        if let Some(hit) = self.defaults.read().get(&info.type_id) {
            return Some(hit.clone());
        }

        let instance: Arc<dyn Reflect> = match info.new_instance() {
            Ok(instance) => Arc::from(instance),
            Err(err) => {
                trace!(bean = info.type_name, error = %err, "No default instance, keeping every slot");
                return None;
            }
        };
        Some(
            self.defaults
                .write()
                .entry(info.type_id)
                .or_insert(instance)
                .clone(),
        )
    }

    /// Whether `value` differs from the slot's default.
    pub fn is_modified(&self, accessor: &dyn Accessor, bean: &dyn Reflect, value: &dyn Reflect) -> bool {
        let Some(default) = self.default_of(bean) else {
            return true;
        };
        match accessor.read(&*default) {
            Ok(default_value) => !reflect_eq(value, &*default_value),
            Err(_) => true,
        }
    }
}

impl SerializationFilter for SkipDefaultsFilter {
    fn accepts(&self, accessor: &dyn Accessor, bean: &dyn Reflect, value: &dyn Reflect) -> bool {
        self.is_modified(accessor, bean, value)
    }
}

/// Drops `None`, `false`, empty strings and empty collections or maps.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkipEmptyFilter;

impl SkipEmptyFilter {
    pub fn is_empty(value: &dyn Reflect) -> bool {
        match value.reflect_ref() {
            ReflectRef::Option(None) => true,
            ReflectRef::Option(Some(inner)) => Self::is_empty(inner),
            ReflectRef::Scalar(ScalarValue::Bool(flag)) => !flag,
            ReflectRef::Scalar(ScalarValue::Str(text)) => text.is_empty(),
            ReflectRef::List(list) => list.is_empty(),
            ReflectRef::Map(map) => map.is_empty(),
            _ => false,
        }
    }
}

impl SerializationFilter for SkipEmptyFilter {
    fn accepts(&self, _accessor: &dyn Accessor, _bean: &dyn Reflect, value: &dyn Reflect) -> bool {
        !Self::is_empty(value)
    }
}
