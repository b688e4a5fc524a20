//! Reflection for options, collections, maps, opaque subtrees and boxed values.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use xmlb_dom::Element;

use super::{
    CollectionKind, ListReflect, MapKind, MapReflect, OptionReflect, Reflect, ReflectMut,
    ReflectRef, TypeInfo, TypeKind, Typed,
};
use crate::error::Result;

macro_rules! reflect_any_glue {
    () => {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn into_any(self: Box<Self>) -> Box<dyn Any> {
            self
        }
    };
}

// Option

impl<T: Typed> OptionReflect for Option<T> {
    fn inner_info(&self) -> TypeInfo {
        T::type_info()
    }

    fn get(&self) -> Option<&dyn Reflect> {
        self.as_ref().map(|v| v as &dyn Reflect)
    }

    fn get_mut(&mut self) -> Option<&mut dyn Reflect> {
        self.as_mut().map(|v| v as &mut dyn Reflect)
    }

    fn set_none(&mut self) {
        *self = None;
    }

    fn set_some(&mut self, value: Box<dyn Reflect>) -> Result<()> {
        *self = Some(T::take_from(value)?);
        Ok(())
    }

    fn get_or_construct(&mut self) -> Result<&mut dyn Reflect> {
        let value = match self.take() {
            Some(value) => value,
            None => T::take_from(T::type_info().new_instance()?)?,
        };
        Ok(self.insert(value))
    }
}

impl<T: Typed> Reflect for Option<T> {
    fn reflect_info(&self) -> TypeInfo {
        <Self as Typed>::type_info()
    }

    reflect_any_glue!();

    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Option(self.get())
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Option(self)
    }

    fn set(&mut self, value: Box<dyn Reflect>) -> Result<()> {
        if value.is::<Self>() {
            *self = <Self as Typed>::take_from(value)?;
        } else {
            *self = Some(T::take_from(value)?);
        }
        Ok(())
    }
}

impl<T: Typed> Typed for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo {
            type_id: TypeId::of::<Self>(),
            type_name: std::any::type_name::<Self>(),
            kind: TypeKind::Option(T::type_info),
            construct: Some(|| Box::new(None::<T>)),
        }
    }
}

// Sequences and sets

macro_rules! reflect_list {
    ($ty:ident, $kind:expr, [$($bound:tt)*], |$items:ident| $collect:expr) => {
        impl<T: Typed $($bound)*> ListReflect for $ty<T> {
            fn collection_kind(&self) -> CollectionKind {
                $kind
            }

            fn item_info(&self) -> TypeInfo {
                T::type_info()
            }

            fn len(&self) -> usize {
                <$ty<T>>::len(self)
            }

            fn items(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
                Box::new(self.iter().map(|item| item as &dyn Reflect))
            }

            fn replace_items(&mut self, items: Vec<Box<dyn Reflect>>) -> Result<()> {
                let $items = items
                    .into_iter()
                    .map(T::take_from)
                    .collect::<Result<Vec<T>>>()?;
                *self = $collect;
                Ok(())
            }
        }

        impl<T: Typed $($bound)*> Reflect for $ty<T> {
            fn reflect_info(&self) -> TypeInfo {
                <Self as Typed>::type_info()
            }

            reflect_any_glue!();

            fn reflect_ref(&self) -> ReflectRef<'_> {
                ReflectRef::List(self)
            }

            fn reflect_mut(&mut self) -> ReflectMut<'_> {
                ReflectMut::List(self)
            }

            fn set(&mut self, value: Box<dyn Reflect>) -> Result<()> {
                *self = <Self as Typed>::take_from(value)?;
                Ok(())
            }
        }

        impl<T: Typed $($bound)*> Typed for $ty<T> {
            fn type_info() -> TypeInfo {
                TypeInfo {
                    type_id: TypeId::of::<Self>(),
                    type_name: std::any::type_name::<Self>(),
                    kind: TypeKind::List {
                        kind: $kind,
                        item: T::type_info,
                    },
                    construct: Some(|| Box::new(<$ty<T>>::new())),
                }
            }
        }
    };
}

reflect_list!(Vec, CollectionKind::List, [], |items| items);
reflect_list!(VecDeque, CollectionKind::Deque, [], |items| items.into());
reflect_list!(HashSet, CollectionKind::HashSet, [+ Eq + Hash], |items| items
    .into_iter()
    .collect());
reflect_list!(BTreeSet, CollectionKind::SortedSet, [+ Ord], |items| items
    .into_iter()
    .collect());
reflect_list!(IndexSet, CollectionKind::LinkedSet, [+ Eq + Hash], |items| items
    .into_iter()
    .collect());

impl<T: Typed> ListReflect for Box<[T]> {
    fn collection_kind(&self) -> CollectionKind {
        CollectionKind::Array
    }

    fn item_info(&self) -> TypeInfo {
        T::type_info()
    }

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn items(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.iter().map(|item| item as &dyn Reflect))
    }

    fn replace_items(&mut self, items: Vec<Box<dyn Reflect>>) -> Result<()> {
        let items = items
            .into_iter()
            .map(T::take_from)
            .collect::<Result<Vec<T>>>()?;
        *self = items.into_boxed_slice();
        Ok(())
    }
}

impl<T: Typed> Reflect for Box<[T]> {
    fn reflect_info(&self) -> TypeInfo {
        <Self as Typed>::type_info()
    }

    reflect_any_glue!();

    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::List(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::List(self)
    }

    fn set(&mut self, value: Box<dyn Reflect>) -> Result<()> {
        *self = <Self as Typed>::take_from(value)?;
        Ok(())
    }
}

impl<T: Typed> Typed for Box<[T]> {
    fn type_info() -> TypeInfo {
        TypeInfo {
            type_id: TypeId::of::<Self>(),
            type_name: std::any::type_name::<Self>(),
            kind: TypeKind::List {
                kind: CollectionKind::Array,
                item: T::type_info,
            },
            construct: Some(|| Box::new(Vec::<T>::new().into_boxed_slice())),
        }
    }
}

// Maps

macro_rules! reflect_map {
    ($ty:ident, $kind:expr, [$($bound:tt)*]) => {
        impl<K: Typed $($bound)*, V: Typed> MapReflect for $ty<K, V> {
            fn map_kind(&self) -> MapKind {
                $kind
            }

            fn key_info(&self) -> TypeInfo {
                K::type_info()
            }

            fn value_info(&self) -> TypeInfo {
                V::type_info()
            }

            fn len(&self) -> usize {
                <$ty<K, V>>::len(self)
            }

            fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
                Box::new(
                    self.iter()
                        .map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect)),
                )
            }

            fn replace_entries(
                &mut self,
                entries: Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>,
            ) -> Result<()> {
                let mut fresh = <$ty<K, V>>::default();
                for (k, v) in entries {
                    fresh.insert(K::take_from(k)?, V::take_from(v)?);
                }
                *self = fresh;
                Ok(())
            }
        }

        impl<K: Typed $($bound)*, V: Typed> Reflect for $ty<K, V> {
            fn reflect_info(&self) -> TypeInfo {
                <Self as Typed>::type_info()
            }

            reflect_any_glue!();

            fn reflect_ref(&self) -> ReflectRef<'_> {
                ReflectRef::Map(self)
            }

            fn reflect_mut(&mut self) -> ReflectMut<'_> {
                ReflectMut::Map(self)
            }

            fn set(&mut self, value: Box<dyn Reflect>) -> Result<()> {
                *self = <Self as Typed>::take_from(value)?;
                Ok(())
            }
        }

        impl<K: Typed $($bound)*, V: Typed> Typed for $ty<K, V> {
            fn type_info() -> TypeInfo {
                TypeInfo {
                    type_id: TypeId::of::<Self>(),
                    type_name: std::any::type_name::<Self>(),
                    kind: TypeKind::Map {
                        kind: $kind,
                        key: K::type_info,
                        value: V::type_info,
                    },
                    construct: Some(|| Box::new(<$ty<K, V>>::default())),
                }
            }
        }
    };
}

reflect_map!(HashMap, MapKind::Hash, [+ Eq + Hash]);
reflect_map!(BTreeMap, MapKind::Sorted, [+ Ord]);
reflect_map!(IndexMap, MapKind::Linked, [+ Eq + Hash]);

// Opaque subtree

impl Reflect for Element {
    fn reflect_info(&self) -> TypeInfo {
        <Self as Typed>::type_info()
    }

    reflect_any_glue!();

    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Element(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Element(self)
    }

    fn set(&mut self, value: Box<dyn Reflect>) -> Result<()> {
        *self = <Self as Typed>::take_from(value)?;
        Ok(())
    }
}

impl Typed for Element {
    fn type_info() -> TypeInfo {
        TypeInfo {
            type_id: TypeId::of::<Element>(),
            type_name: "Element",
            kind: TypeKind::Element,
            construct: Some(|| Box::new(Element::new(""))),
        }
    }
}

// Dynamically typed values

impl Reflect for Box<dyn Reflect> {
    fn reflect_info(&self) -> TypeInfo {
        (**self).reflect_info()
    }

    fn as_any(&self) -> &dyn Any {
        (**self).as_any()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        (**self).as_any_mut()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        (*self).into_any()
    }

    fn reflect_ref(&self) -> ReflectRef<'_> {
        (**self).reflect_ref()
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        (**self).reflect_mut()
    }

    /// Boxed slots take any runtime type.
    fn set(&mut self, value: Box<dyn Reflect>) -> Result<()> {
        *self = value;
        Ok(())
    }
}

impl Typed for Box<dyn Reflect> {
    fn type_info() -> TypeInfo {
        TypeInfo {
            type_id: TypeId::of::<Box<dyn Reflect>>(),
            type_name: "dyn Reflect",
            kind: TypeKind::Dynamic,
            construct: None,
        }
    }

    fn take_from(value: Box<dyn Reflect>) -> Result<Self> {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::boxed;

    #[test]
    fn test_vec_replace_items() -> Result<()> {
        let mut list: Vec<i32> = vec![9];
        list.replace_items(vec![boxed(1i32), boxed(2i32)])?;
        assert_eq!(list, vec![1, 2]);
        Ok(())
    }

    #[test]
    fn test_vec_replace_items_type_mismatch() {
        let mut list: Vec<i32> = Vec::new();
        assert!(list.replace_items(vec![boxed(String::new())]).is_err());
    }

    #[test]
    fn test_index_set_keeps_insertion_order() -> Result<()> {
        let mut set: IndexSet<String> = IndexSet::new();
        set.replace_items(vec![boxed("b".to_string()), boxed("a".to_string())])?;
        let order: Vec<&str> = set.iter().map(String::as_str).collect();
        assert_eq!(order, vec!["b", "a"]);
        Ok(())
    }

    #[test]
    fn test_option_get_or_construct() -> Result<()> {
        let mut value: Option<String> = None;
        value.get_or_construct()?;
        assert_eq!(value.as_deref(), Some(""));
        Ok(())
    }

    #[test]
    fn test_boxed_dyn_is_transparent() {
        let value: Box<dyn Reflect> = boxed(7u16);
        assert_eq!(value.reflect_info().type_id, TypeId::of::<u16>());
        let again = <Box<dyn Reflect> as Typed>::take_from(value);
        assert!(again.is_ok());
    }

    #[test]
    fn test_map_replace_entries() -> Result<()> {
        let mut map: BTreeMap<String, i64> = BTreeMap::new();
        map.replace_entries(vec![(boxed("k".to_string()), boxed(3i64))])?;
        assert_eq!(map.get("k"), Some(&3));
        Ok(())
    }
}
