//! The reflection surface bindings work against.
//!
//! Rust has no runtime annotation scanning, so every bindable type describes
//! itself up front:
//!
//! - [`Typed::type_info`] returns a static [`TypeInfo`] (shape, name, constructor),
//!   consulted once when a binding is built.
//! - [`Reflect`] is the object-safe runtime side: it exposes a value as one of a
//!   closed set of shapes through [`ReflectRef`] / [`ReflectMut`].
//!
//! Scalars, options, sequences, sets, maps and opaque [`Element`] subtrees are
//! covered by the impls in this module. Beans declare their slots with
//! [`crate::BeanInfo::builder`] and derive the glue with
//! [`crate::impl_reflect_bean!`]; C-like enums use [`crate::reflect_enum!`].

mod compare;
mod containers;
mod scalars;

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use xmlb_dom::Element;

use crate::bean::BeanInfo;
use crate::error::{Result, XmlbError};

pub use compare::{compare_natural, reflect_eq};

/// Scalar shapes understood by the scalar codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    String,
    /// Milliseconds since the Unix epoch on the wire.
    Date,
    /// C-like enum; the slice lists the textual names of its variants.
    Enum(&'static [&'static str]),
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Char => "char",
            ScalarKind::String => "string",
            ScalarKind::Date => "date",
            ScalarKind::Enum(_) => "enum",
        }
    }
}

/// A scalar value, borrowed from its slot where possible.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue<'a> {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    Str(Cow<'a, str>),
    Date(DateTime<Utc>),
    Enum(&'static str),
}

impl ScalarValue<'_> {
    pub fn into_owned(self) -> ScalarValue<'static> {
        match self {
            ScalarValue::Bool(b) => ScalarValue::Bool(b),
            ScalarValue::Int(i) => ScalarValue::Int(i),
            ScalarValue::UInt(u) => ScalarValue::UInt(u),
            ScalarValue::Float(f) => ScalarValue::Float(f),
            ScalarValue::Char(c) => ScalarValue::Char(c),
            ScalarValue::Str(s) => ScalarValue::Str(Cow::Owned(s.into_owned())),
            ScalarValue::Date(d) => ScalarValue::Date(d),
            ScalarValue::Enum(e) => ScalarValue::Enum(e),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ScalarValue::Bool(_) => "bool",
            ScalarValue::Int(_) => "signed integer",
            ScalarValue::UInt(_) => "unsigned integer",
            ScalarValue::Float(_) => "float",
            ScalarValue::Char(_) => "char",
            ScalarValue::Str(_) => "string",
            ScalarValue::Date(_) => "date",
            ScalarValue::Enum(_) => "enum",
        }
    }
}

/// Ordered-sequence flavours; decides the wrapper tag and the write order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// `Vec`: written as `<list>`.
    List,
    /// `VecDeque`: written as `<collection>`.
    Deque,
    /// `Box<[T]>`: written as `<array>`.
    Array,
    /// `HashSet`: written as `<set>`, sorted on write.
    HashSet,
    /// `BTreeSet`: written as `<set>`, already ordered.
    SortedSet,
    /// `IndexSet`: written as `<set>`, insertion order kept.
    LinkedSet,
}

impl CollectionKind {
    pub fn tag(&self) -> &'static str {
        match self {
            CollectionKind::List => "list",
            CollectionKind::Deque => "collection",
            CollectionKind::Array => "array",
            CollectionKind::HashSet | CollectionKind::SortedSet | CollectionKind::LinkedSet => {
                "set"
            }
        }
    }

    /// Whether items need sorting to make the written order deterministic.
    pub fn is_unordered(&self) -> bool {
        matches!(self, CollectionKind::HashSet)
    }
}

/// Every tag a collection wrapper may carry.
pub const COLLECTION_TAGS: [&str; 4] = ["list", "set", "collection", "array"];

/// Associative-container flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKind {
    /// `HashMap`: entries sorted by key on write.
    Hash,
    /// `BTreeMap`: already ordered.
    Sorted,
    /// `IndexMap`: insertion order kept.
    Linked,
}

/// Shape of a type, as far as bindings care.
#[derive(Clone, Copy)]
pub enum TypeKind {
    Scalar(ScalarKind),
    Option(fn() -> TypeInfo),
    Bean(fn() -> &'static BeanInfo),
    List {
        kind: CollectionKind,
        item: fn() -> TypeInfo,
    },
    Map {
        kind: MapKind,
        key: fn() -> TypeInfo,
        value: fn() -> TypeInfo,
    },
    /// Opaque markup subtree.
    Element,
    /// `Box<dyn Reflect>`: the concrete type is only known per value.
    Dynamic,
}

impl fmt::Debug for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Scalar(kind) => write!(f, "Scalar({:?})", kind),
            TypeKind::Option(inner) => write!(f, "Option({})", inner().type_name),
            TypeKind::Bean(info) => write!(f, "Bean({})", info().type_name()),
            TypeKind::List { kind, item } => write!(f, "List({:?}, {})", kind, item().type_name),
            TypeKind::Map { kind, key, value } => write!(
                f,
                "Map({:?}, {}, {})",
                kind,
                key().type_name,
                value().type_name
            ),
            TypeKind::Element => f.write_str("Element"),
            TypeKind::Dynamic => f.write_str("Dynamic"),
        }
    }
}

/// Static description of a bindable type.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub kind: TypeKind,
    /// Builds a fresh default instance; `None` for types without one.
    pub construct: Option<fn() -> Box<dyn Reflect>>,
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl TypeInfo {
    pub fn of<T: Typed>() -> TypeInfo {
        T::type_info()
    }

    /// Strips any number of `Option` layers.
    pub fn unwrap_option(self) -> TypeInfo {
        let mut info = self;
        while let TypeKind::Option(inner) = info.kind {
            info = inner();
        }
        info
    }

    pub fn is_option(&self) -> bool {
        matches!(self.kind, TypeKind::Option(_))
    }

    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.unwrap_option().kind {
            TypeKind::Scalar(kind) => Some(kind),
            _ => None,
        }
    }

    /// True when a value of this type spans a subtree rather than one string.
    pub fn is_structural(&self) -> bool {
        !matches!(self.unwrap_option().kind, TypeKind::Scalar(_))
    }

    pub fn new_instance(&self) -> Result<Box<dyn Reflect>> {
        match self.construct {
            Some(construct) => Ok(construct()),
            None => Err(XmlbError::config(
                self.type_name,
                "type has no default constructor",
            )),
        }
    }

    /// Unqualified type name without generic arguments.
    pub fn simple_name(&self) -> &'static str {
        simple_name(self.type_name)
    }
}

/// `a::b::Outer<c::D>` → `Outer`.
pub(crate) fn simple_name(type_name: &'static str) -> &'static str {
    let without_generics = type_name.split('<').next().unwrap_or(type_name);
    without_generics.rsplit("::").next().unwrap_or(without_generics)
}

/// Read view of a value.
pub enum ReflectRef<'a> {
    Scalar(ScalarValue<'a>),
    Option(Option<&'a dyn Reflect>),
    Bean(&'static BeanInfo),
    List(&'a dyn ListReflect),
    Map(&'a dyn MapReflect),
    Element(&'a Element),
}

/// Write view of a value.
pub enum ReflectMut<'a> {
    Scalar(&'a mut dyn ScalarReflect),
    Option(&'a mut dyn OptionReflect),
    Bean(&'static BeanInfo),
    List(&'a mut dyn ListReflect),
    Map(&'a mut dyn MapReflect),
    Element(&'a mut Element),
}

/// Runtime reflection over a value.
pub trait Reflect: Any + Send + Sync {
    /// Descriptor of the concrete runtime type.
    fn reflect_info(&self) -> TypeInfo;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn reflect_ref(&self) -> ReflectRef<'_>;

    fn reflect_mut(&mut self) -> ReflectMut<'_>;

    /// Replaces the value with `value`, which must be of the same runtime
    /// type (an `Option<T>` also accepts a bare `T`).
    fn set(&mut self, value: Box<dyn Reflect>) -> Result<()>;
}

impl dyn Reflect {
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.reflect_info().type_name
    }
}

impl fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reflect({})", self.type_name())
    }
}

/// Static side of reflection.
pub trait Typed: Reflect + Sized {
    fn type_info() -> TypeInfo;

    /// Moves a dynamically typed value into `Self`.
    fn take_from(value: Box<dyn Reflect>) -> Result<Self> {
        let found = value.type_name();
        value
            .into_any()
            .downcast::<Self>()
            .map(|boxed| *boxed)
            .map_err(|_| XmlbError::mismatch(std::any::type_name::<Self>(), found))
    }
}

/// Scalar slot.
pub trait ScalarReflect {
    fn scalar_kind(&self) -> ScalarKind;

    fn get_scalar(&self) -> ScalarValue<'_>;

    fn set_scalar(&mut self, value: ScalarValue<'_>) -> Result<()>;
}

/// `Option<T>` slot.
pub trait OptionReflect {
    fn inner_info(&self) -> TypeInfo;

    fn get(&self) -> Option<&dyn Reflect>;

    fn get_mut(&mut self) -> Option<&mut dyn Reflect>;

    fn set_none(&mut self);

    fn set_some(&mut self, value: Box<dyn Reflect>) -> Result<()>;

    /// Returns the present value, constructing a default instance first if needed.
    fn get_or_construct(&mut self) -> Result<&mut dyn Reflect>;
}

/// Ordered sequence or set.
pub trait ListReflect {
    fn collection_kind(&self) -> CollectionKind;

    fn item_info(&self) -> TypeInfo;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn items(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_>;

    /// Clears the container and refills it with `items`.
    fn replace_items(&mut self, items: Vec<Box<dyn Reflect>>) -> Result<()>;
}

/// Associative container.
pub trait MapReflect {
    fn map_kind(&self) -> MapKind;

    fn key_info(&self) -> TypeInfo;

    fn value_info(&self) -> TypeInfo;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_>;

    /// Clears the container and refills it with `entries`.
    fn replace_entries(&mut self, entries: Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>)
    -> Result<()>;
}

/// Boxes a typed value as a reflect object.
pub fn boxed<T: Reflect>(value: T) -> Box<dyn Reflect> {
    Box::new(value)
}

/// Implements [`Reflect`] and [`Typed`] for a C-like enum.
///
/// The textual form of each variant is its identifier; the first variant is
/// the default instance.
///
/// ```
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Mode { Fast, Careful }
/// xmlb::reflect_enum!(Mode { Fast, Careful });
///
/// use xmlb::{Typed, reflect::TypeKind};
/// assert!(matches!(Mode::type_info().kind, TypeKind::Scalar(_)));
/// ```
#[macro_export]
macro_rules! reflect_enum {
    ($ty:ident { $first:ident $(, $rest:ident)* $(,)? }) => {
        impl $crate::reflect::ScalarReflect for $ty {
            fn scalar_kind(&self) -> $crate::reflect::ScalarKind {
                $crate::reflect::ScalarKind::Enum(&[stringify!($first) $(, stringify!($rest))*])
            }

            fn get_scalar(&self) -> $crate::reflect::ScalarValue<'_> {
                match self {
                    $ty::$first => $crate::reflect::ScalarValue::Enum(stringify!($first)),
                    $($ty::$rest => $crate::reflect::ScalarValue::Enum(stringify!($rest)),)*
                }
            }

            fn set_scalar(&mut self, value: $crate::reflect::ScalarValue<'_>) -> $crate::Result<()> {
                let name: &str = match &value {
                    $crate::reflect::ScalarValue::Enum(name) => name,
                    $crate::reflect::ScalarValue::Str(name) => name,
                    other => {
                        return Err($crate::XmlbError::TypeMismatch {
                            expected: stringify!($ty).to_string(),
                            found: format!("{:?}", other),
                        })
                    }
                };
                *self = match name {
                    stringify!($first) => $ty::$first,
                    $(stringify!($rest) => $ty::$rest,)*
                    _ => {
                        return Err($crate::XmlbError::TypeMismatch {
                            expected: stringify!($ty).to_string(),
                            found: name.to_string(),
                        })
                    }
                };
                Ok(())
            }
        }

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
                $crate::reflect::ReflectRef::Scalar($crate::reflect::ScalarReflect::get_scalar(self))
            }

            fn reflect_mut(&mut self) -> $crate::reflect::ReflectMut<'_> {
                $crate::reflect::ReflectMut::Scalar(self)
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
                    kind: $crate::reflect::TypeKind::Scalar($crate::reflect::ScalarKind::Enum(
                        &[stringify!($first) $(, stringify!($rest))*],
                    )),
                    construct: Some(|| Box::new($ty::$first)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name_strips_path_and_generics() {
        assert_eq!(simple_name("a::b::Outer"), "Outer");
        assert_eq!(simple_name("a::Wrapper<b::Inner>"), "Wrapper");
        assert_eq!(simple_name("Plain"), "Plain");
    }

    #[test]
    fn test_unwrap_option() {
        let info = <Option<Option<i32>>>::type_info().unwrap_option();
        assert!(matches!(info.kind, TypeKind::Scalar(ScalarKind::I32)));
        assert!(!<Option<i32>>::type_info().is_structural());
        assert!(<Vec<i32>>::type_info().is_structural());
    }

    #[test]
    fn test_take_from_mismatch() {
        let value = boxed(5i32);
        assert!(matches!(
            String::take_from(value),
            Err(XmlbError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_downcast_through_dyn() {
        let value = boxed(String::from("x"));
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("x"));
        assert!(value.is::<String>());
    }
}
