//! Read/write access to one named slot of a bean.
//!
//! Two implementations exist:
//!
//! - [`FieldAccessor`] borrows the slot in place through a pair of field
//!   projections. Reads never allocate and writes go straight into the slot,
//!   which is the fast path for scalar fields.
//! - [`PropertyAccessor`] goes through an owned getter and an optional
//!   setter. A setter error is reported as [`XmlbError::Access`]; a setter
//!   panic unwinds unchanged.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use crate::error::{BoxError, Result, XmlbError};
use crate::reflect::{Reflect, ScalarValue, TypeInfo, Typed};
use crate::scalar;
use crate::slot::Slot;

/// A slot value, borrowed from the owner or produced by a getter.
pub enum ValueRef<'a> {
    Borrowed(&'a dyn Reflect),
    Owned(Box<dyn Reflect>),
}

impl Deref for ValueRef<'_> {
    type Target = dyn Reflect;

    fn deref(&self) -> &Self::Target {
        match self {
            ValueRef::Borrowed(value) => *value,
            ValueRef::Owned(value) => value.as_ref(),
        }
    }
}

/// Callback applied to a slot in place.
pub type SlotFn<'f> = dyn FnMut(&mut dyn Reflect) -> Result<()> + 'f;

/// Access to one slot of a bean.
pub trait Accessor: Send + Sync {
    /// Slot name, used for tags and attributes unless overridden.
    fn name(&self) -> &str;

    /// Declared type of the slot.
    fn type_info(&self) -> TypeInfo;

    fn slot(&self) -> &Slot;

    /// False for read-only fields and getter-only properties.
    fn is_writable(&self) -> bool;

    /// Whether deserialization may touch the slot at all. Read-only fields
    /// still accept structural values, which are filled in place.
    fn accepts_input(&self) -> bool;

    fn read<'a>(&self, owner: &'a dyn Reflect) -> Result<ValueRef<'a>>;

    /// Replaces the slot value.
    fn write(&self, owner: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<()>;

    /// Runs `f` against the slot value in place.
    fn modify(&self, owner: &mut dyn Reflect, f: &mut SlotFn<'_>) -> Result<()>;

    /// Scalar read without boxing.
    fn read_scalar(&self, owner: &dyn Reflect) -> Result<Option<ScalarValue<'static>>> {
        let value = self.read(owner)?;
        Ok(match value.reflect_ref() {
            crate::reflect::ReflectRef::Scalar(scalar) => Some(scalar.into_owned()),
            _ => None,
        })
    }

    /// Scalar write without boxing; `None` clears an `Option` slot.
    fn write_scalar(&self, owner: &mut dyn Reflect, value: Option<ScalarValue<'_>>) -> Result<()> {
        let mut value = Some(value);
        self.modify(owner, &mut |slot| scalar::assign(slot, value.take().flatten()))
    }
}

impl fmt::Debug for dyn Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("name", &self.name())
            .field("type", &self.type_info().type_name)
            .finish()
    }
}

fn owner_ref<B: Reflect>(owner: &dyn Reflect) -> Result<&B> {
    owner
        .downcast_ref::<B>()
        .ok_or_else(|| XmlbError::mismatch(std::any::type_name::<B>(), owner.type_name()))
}

fn owner_mut<B: Reflect>(owner: &mut dyn Reflect) -> Result<&mut B> {
    let found = owner.type_name();
    owner
        .downcast_mut::<B>()
        .ok_or_else(|| XmlbError::mismatch(std::any::type_name::<B>(), found))
}

/// Field projected in place.
pub struct FieldAccessor<B, T> {
    name: String,
    slot: Slot,
    writable: bool,
    get: fn(&B) -> &T,
    get_mut: fn(&mut B) -> &mut T,
}

impl<B, T> FieldAccessor<B, T> {
    pub fn new(
        name: impl Into<String>,
        slot: Slot,
        writable: bool,
        get: fn(&B) -> &T,
        get_mut: fn(&mut B) -> &mut T,
    ) -> Self {
        Self {
            name: name.into(),
            slot,
            writable,
            get,
            get_mut,
        }
    }
}

impl<B: Reflect, T: Typed> Accessor for FieldAccessor<B, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_info(&self) -> TypeInfo {
        T::type_info()
    }

    fn slot(&self) -> &Slot {
        &self.slot
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn accepts_input(&self) -> bool {
        self.writable || T::type_info().is_structural()
    }

    fn read<'a>(&self, owner: &'a dyn Reflect) -> Result<ValueRef<'a>> {
        let owner = owner_ref::<B>(owner)?;
        Ok(ValueRef::Borrowed((self.get)(owner)))
    }

    fn write(&self, owner: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<()> {
        let owner = owner_mut::<B>(owner)?;
        (self.get_mut)(owner).set(value)
    }

    fn modify(&self, owner: &mut dyn Reflect, f: &mut SlotFn<'_>) -> Result<()> {
        let owner = owner_mut::<B>(owner)?;
        f((self.get_mut)(owner))
    }
}

type Getter<B, T> = Box<dyn Fn(&B) -> T + Send + Sync>;
type Setter<B, T> = Box<dyn Fn(&mut B, T) -> std::result::Result<(), BoxError> + Send + Sync>;

/// Getter/setter pair over an owned value.
pub struct PropertyAccessor<B, T> {
    name: String,
    slot: Slot,
    getter: Getter<B, T>,
    setter: Option<Setter<B, T>>,
    _owner: PhantomData<fn(&B)>,
}

impl<B, T> PropertyAccessor<B, T> {
    pub fn new(name: impl Into<String>, slot: Slot, getter: Getter<B, T>, setter: Option<Setter<B, T>>) -> Self {
        Self {
            name: name.into(),
            slot,
            getter,
            setter,
            _owner: PhantomData,
        }
    }

    fn store(&self, owner: &mut B, value: T) -> Result<()> {
        let Some(setter) = &self.setter else {
            return Err(XmlbError::Access {
                slot: self.name.clone(),
                source: "property has no setter".into(),
            });
        };
        setter(owner, value).map_err(|source| XmlbError::Access {
            slot: self.name.clone(),
            source,
        })
    }
}

impl<B: Reflect, T: Typed> Accessor for PropertyAccessor<B, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_info(&self) -> TypeInfo {
        T::type_info()
    }

    fn slot(&self) -> &Slot {
        &self.slot
    }

    fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    fn accepts_input(&self) -> bool {
        self.setter.is_some()
    }

    fn read<'a>(&self, owner: &'a dyn Reflect) -> Result<ValueRef<'a>> {
        let owner = owner_ref::<B>(owner)?;
        Ok(ValueRef::Owned(Box::new((self.getter)(owner))))
    }

    fn write(&self, owner: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<()> {
        let owner = owner_mut::<B>(owner)?;
        let mut current = (self.getter)(owner);
        current.set(value)?;
        self.store(owner, current)
    }

    fn modify(&self, owner: &mut dyn Reflect, f: &mut SlotFn<'_>) -> Result<()> {
        let owner = owner_mut::<B>(owner)?;
        let mut current = (self.getter)(owner);
        f(&mut current)?;
        self.store(owner, current)
    }
}

/// Slot of an embedded parent bean, seen through the embedding field.
pub(crate) struct EmbeddedAccessor<B, P> {
    inner: std::sync::Arc<dyn Accessor>,
    get: fn(&B) -> &P,
    get_mut: fn(&mut B) -> &mut P,
}

impl<B, P> EmbeddedAccessor<B, P> {
    pub(crate) fn new(
        inner: std::sync::Arc<dyn Accessor>,
        get: fn(&B) -> &P,
        get_mut: fn(&mut B) -> &mut P,
    ) -> Self {
        Self { inner, get, get_mut }
    }
}

impl<B: Reflect, P: Reflect> Accessor for EmbeddedAccessor<B, P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn type_info(&self) -> TypeInfo {
        self.inner.type_info()
    }

    fn slot(&self) -> &Slot {
        self.inner.slot()
    }

    fn is_writable(&self) -> bool {
        self.inner.is_writable()
    }

    fn accepts_input(&self) -> bool {
        self.inner.accepts_input()
    }

    fn read<'a>(&self, owner: &'a dyn Reflect) -> Result<ValueRef<'a>> {
        let owner = owner_ref::<B>(owner)?;
        self.inner.read((self.get)(owner))
    }

    fn write(&self, owner: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<()> {
        let owner = owner_mut::<B>(owner)?;
        self.inner.write((self.get_mut)(owner), value)
    }

    fn modify(&self, owner: &mut dyn Reflect, f: &mut SlotFn<'_>) -> Result<()> {
        let owner = owner_mut::<B>(owner)?;
        self.inner.modify((self.get_mut)(owner), f)
    }
}
