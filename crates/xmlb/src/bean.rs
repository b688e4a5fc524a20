//! Bean descriptors.
//!
//! A bean is a struct whose slots are listed once, in order, by a
//! [`BeanInfo`]. The descriptor is built with [`BeanInfo::builder`] and kept
//! in a static; [`impl_reflect_bean!`](crate::impl_reflect_bean) then
//! derives the reflection glue from the [`Bean`] impl.
//!
//! ```
//! use once_cell::sync::Lazy;
//! use xmlb::{Bean, BeanInfo, Slot};
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Window {
//!     title: String,
//!     width: u32,
//!     pinned: bool,
//! }
//!
//! impl Bean for Window {
//!     fn bean_info() -> &'static BeanInfo {
//!         static INFO: Lazy<BeanInfo> = Lazy::new(|| {
//!             BeanInfo::builder::<Window>()
//!                 .tag("window")
//!                 .field_with("title", |w| &w.title, |w| &mut w.title, Slot::new().attribute(""))
//!                 .field("width", |w| &w.width, |w| &mut w.width)
//!                 .field("pinned", |w| &w.pinned, |w| &mut w.pinned)
//!                 .build()
//!         });
//!         &INFO
//!     }
//! }
//! xmlb::impl_reflect_bean!(Window);
//!
//! let window = Window { title: "Main".into(), width: 800, pinned: false };
//! let xml = xmlb::to_xml_string(&window)?;
//! assert!(xml.starts_with(r#"<window title="Main">"#));
//! assert_eq!(xmlb::from_xml_str::<Window>(&xml)?, window);
//! # Ok::<(), xmlb::XmlbError>(())
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::trace;

use crate::accessor::{Accessor, EmbeddedAccessor, FieldAccessor, PropertyAccessor};
use crate::error::BoxError;
use crate::reflect::{simple_name, Reflect, Typed};
use crate::slot::Slot;

/// A struct bound slot by slot.
pub trait Bean: Typed + Default {
    fn bean_info() -> &'static BeanInfo;
}

/// Equality used when comparing against defaults.
pub type EqFn = fn(&dyn Reflect, &dyn Reflect) -> bool;

/// Ordered slot list and element tag of a bean type.
pub struct BeanInfo {
    type_id: TypeId,
    type_name: &'static str,
    tag: String,
    slots: Vec<Arc<dyn Accessor>>,
    explicit_only: bool,
    eq: Option<EqFn>,
}

impl fmt::Debug for BeanInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanInfo")
            .field("type_name", &self.type_name)
            .field("tag", &self.tag)
            .field("slots", &self.slots.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl BeanInfo {
    pub fn builder<B: Reflect + Default>() -> BeanInfoBuilder<B> {
        BeanInfoBuilder {
            tag: None,
            slots: Vec::new(),
            explicit_only: false,
            eq: None,
            _bean: PhantomData,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Element tag: the declared one, else the unqualified type name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Every declared slot, transient ones included.
    pub fn slots(&self) -> &[Arc<dyn Accessor>] {
        &self.slots
    }

    pub fn is_explicit_only(&self) -> bool {
        self.explicit_only
    }

    pub fn eq_fn(&self) -> Option<EqFn> {
        self.eq
    }
}

pub struct BeanInfoBuilder<B> {
    tag: Option<String>,
    slots: Vec<Arc<dyn Accessor>>,
    explicit_only: bool,
    eq: Option<EqFn>,
    _bean: PhantomData<fn() -> B>,
}

impl<B: Reflect + Default> BeanInfoBuilder<B> {
    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    /// Unannotated field.
    pub fn field<T: Typed>(self, name: &str, get: fn(&B) -> &T, get_mut: fn(&mut B) -> &mut T) -> Self {
        self.field_with(name, get, get_mut, Slot::new())
    }

    pub fn field_with<T: Typed>(
        mut self,
        name: &str,
        get: fn(&B) -> &T,
        get_mut: fn(&mut B) -> &mut T,
        slot: Slot,
    ) -> Self {
        self.slots
            .push(Arc::new(FieldAccessor::new(name, slot, true, get, get_mut)));
        self
    }

    /// Field never replaced on read; structural values are filled in place.
    pub fn read_only<T: Typed>(
        mut self,
        name: &str,
        get: fn(&B) -> &T,
        get_mut: fn(&mut B) -> &mut T,
        slot: Slot,
    ) -> Self {
        self.slots
            .push(Arc::new(FieldAccessor::new(name, slot, false, get, get_mut)));
        self
    }

    /// Getter/setter property; the setter may refuse a value.
    pub fn property<T, G, S>(mut self, name: &str, getter: G, setter: S, slot: Slot) -> Self
    where
        T: Typed,
        G: Fn(&B) -> T + Send + Sync + 'static,
        S: Fn(&mut B, T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.slots.push(Arc::new(PropertyAccessor::new(
            name,
            slot,
            Box::new(getter),
            Some(Box::new(setter)),
        )));
        self
    }

    /// Property without a setter: written, never read back.
    pub fn getter<T, G>(mut self, name: &str, getter: G, slot: Slot) -> Self
    where
        T: Typed,
        G: Fn(&B) -> T + Send + Sync + 'static,
    {
        self.slots
            .push(Arc::new(PropertyAccessor::new(name, slot, Box::new(getter), None)));
        self
    }

    /// Takes over the slots of an embedded parent bean, ahead of the slots
    /// declared so far, and its tag unless one is set.
    pub fn extends<P: Bean>(mut self, get: fn(&B) -> &P, get_mut: fn(&mut B) -> &mut P) -> Self {
        let parent = P::bean_info();
        let mut slots: Vec<Arc<dyn Accessor>> = parent
            .slots()
            .iter()
            .map(|inner| Arc::new(EmbeddedAccessor::new(inner.clone(), get, get_mut)) as Arc<dyn Accessor>)
            .collect();
        slots.append(&mut self.slots);
        self.slots = slots;
        if self.tag.is_none() && parent.tag != simple_name(parent.type_name) {
            self.tag = Some(parent.tag.clone());
        }
        self
    }

    /// Bind only annotated slots.
    pub fn explicit_only(mut self) -> Self {
        self.explicit_only = true;
        self
    }

    /// Compare against defaults with `PartialEq` instead of slot by slot.
    pub fn with_eq(mut self) -> Self
    where
        B: PartialEq,
    {
        self.eq = Some(|a, b| match (a.downcast_ref::<B>(), b.downcast_ref::<B>()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        });
        self
    }

    pub fn build(self) -> BeanInfo {
        let type_name = std::any::type_name::<B>();
        BeanInfo {
            type_id: TypeId::of::<B>(),
            type_name,
            tag: self.tag.unwrap_or_else(|| simple_name(type_name).to_string()),
            slots: self.slots,
            explicit_only: self.explicit_only,
            eq: self.eq,
        }
    }
}

/// Ordered list of bindable slots per bean type.
///
/// Transient slots are dropped, and so are unannotated slots of
/// explicit-only beans. Results are memoized per type; racing threads may
/// compute the same list twice, the last insert wins.
#[derive(Default)]
pub struct PropertyCollector {
    cache: RwLock<HashMap<TypeId, Arc<[Arc<dyn Accessor>]>>>,
}

impl PropertyCollector {
    pub fn global() -> &'static PropertyCollector {
        static COLLECTOR: Lazy<PropertyCollector> = Lazy::new(PropertyCollector::default);
        &COLLECTOR
    }

    pub fn collect(&self, info: &BeanInfo) -> Arc<[Arc<dyn Accessor>]> {
        if let Some(hit) = self.cache.read().get(&info.type_id) {
            return hit.clone();
        }

        let accessors: Arc<[Arc<dyn Accessor>]> = info
            .slots()
            .iter()
            .filter(|accessor| !accessor.slot().is_transient())
            .filter(|accessor| !info.explicit_only || accessor.slot().is_annotated())
            .cloned()
            .collect();
        trace!(bean = info.type_name, slots = accessors.len(), "Collected properties");

        self.cache.write().insert(info.type_id, accessors.clone());
        accessors
    }
}

/// Implements [`Reflect`](crate::Reflect) and [`Typed`](crate::Typed) for a
/// type that implements [`Bean`](crate::Bean).
#[macro_export]
macro_rules! impl_reflect_bean {
    ($ty:ty) => {
        impl $crate::reflect::Reflect for $ty {
            fn reflect_info(&self) -> $crate::reflect::TypeInfo {
                <$ty as $crate::reflect::Typed>::type_info()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any> {
                self
            }

            fn reflect_ref(&self) -> $crate::reflect::ReflectRef<'_> {
                $crate::reflect::ReflectRef::Bean(<$ty as $crate::Bean>::bean_info())
            }

            fn reflect_mut(&mut self) -> $crate::reflect::ReflectMut<'_> {
                $crate::reflect::ReflectMut::Bean(<$ty as $crate::Bean>::bean_info())
            }

            fn set(&mut self, value: Box<dyn $crate::reflect::Reflect>) -> $crate::Result<()> {
                *self = <$ty as $crate::reflect::Typed>::take_from(value)?;
                Ok(())
            }
        }

        impl $crate::reflect::Typed for $ty {
            fn type_info() -> $crate::reflect::TypeInfo {
                $crate::reflect::TypeInfo {
                    type_id: ::std::any::TypeId::of::<$ty>(),
                    type_name: ::std::any::type_name::<$ty>(),
                    kind: $crate::reflect::TypeKind::Bean(<$ty as $crate::Bean>::bean_info),
                    construct: Some(|| Box::new(<$ty as ::std::default::Default>::default())),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Base {
        id: String,
    }

    impl Bean for Base {
        fn bean_info() -> &'static BeanInfo {
            static INFO: Lazy<BeanInfo> = Lazy::new(|| {
                BeanInfo::builder::<Base>()
                    .tag("base")
                    .field("id", |b| &b.id, |b| &mut b.id)
                    .build()
            });
            &INFO
        }
    }
    crate::impl_reflect_bean!(Base);

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Derived {
        base: Base,
        extra: i32,
        cache: Vec<String>,
        note: String,
    }

    impl Bean for Derived {
        fn bean_info() -> &'static BeanInfo {
            static INFO: Lazy<BeanInfo> = Lazy::new(|| {
                BeanInfo::builder::<Derived>()
                    .field_with("extra", |d| &d.extra, |d| &mut d.extra, Slot::new().attribute(""))
                    .field_with("cache", |d| &d.cache, |d| &mut d.cache, Slot::new().transient())
                    .field("note", |d| &d.note, |d| &mut d.note)
                    .extends(|d| &d.base, |d| &mut d.base)
                    .explicit_only()
                    .build()
            });
            &INFO
        }
    }
    crate::impl_reflect_bean!(Derived);

    #[test]
    fn test_default_tag_is_simple_name() {
        let info = BeanInfo::builder::<Base>().build();
        assert_eq!(info.tag(), "Base");
        assert_eq!(Base::bean_info().tag(), "base");
    }

    #[test]
    fn test_extends_puts_parent_slots_first_and_inherits_tag() {
        let info = Derived::bean_info();
        let names: Vec<&str> = info.slots().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["id", "extra", "cache", "note"]);
        assert_eq!(info.tag(), "base");
    }

    #[test]
    fn test_collector_drops_transient_and_unannotated() {
        let collector = PropertyCollector::default();
        let names: Vec<String> = collector
            .collect(Derived::bean_info())
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["extra"]);
    }

    #[test]
    fn test_embedded_accessor_reaches_parent_field() -> crate::Result<()> {
        let mut derived = Derived::default();
        let id = &Derived::bean_info().slots()[0];
        id.write(&mut derived, Box::new("x".to_string()))?;
        assert_eq!(derived.base.id, "x");
        Ok(())
    }
}
