//! Structural equality and natural ordering over reflected values.

use std::cmp::Ordering;

use super::{Reflect, ReflectRef, ScalarKind, ScalarValue};

/// Equality by value, walking beans slot by slot.
///
/// Beans declared `with_eq()` use their `PartialEq`; every other bean is
/// compared over its non-transient slots. Values of different runtime types
/// are never equal.
pub fn reflect_eq(a: &dyn Reflect, b: &dyn Reflect) -> bool {
    if a.reflect_info().type_id != b.reflect_info().type_id {
        return false;
    }

    match (a.reflect_ref(), b.reflect_ref()) {
        (ReflectRef::Scalar(x), ReflectRef::Scalar(y)) => x == y,
        (ReflectRef::Option(x), ReflectRef::Option(y)) => match (x, y) {
            (None, None) => true,
            (Some(x), Some(y)) => reflect_eq(x, y),
            _ => false,
        },
        (ReflectRef::Bean(info), ReflectRef::Bean(_)) => {
            if let Some(eq) = info.eq_fn() {
                return eq(a, b);
            }
            info.slots()
                .iter()
                .filter(|accessor| !accessor.slot().is_transient())
                .all(|accessor| match (accessor.read(a), accessor.read(b)) {
                    (Ok(x), Ok(y)) => reflect_eq(&*x, &*y),
                    _ => false,
                })
        }
        (ReflectRef::List(x), ReflectRef::List(y)) => {
            if x.len() != y.len() {
                return false;
            }
            if x.collection_kind().is_unordered() {
                x.items().all(|item| y.items().any(|other| reflect_eq(item, other)))
            } else {
                x.items().zip(y.items()).all(|(p, q)| reflect_eq(p, q))
            }
        }
        (ReflectRef::Map(x), ReflectRef::Map(y)) => {
            x.len() == y.len()
                && x.entries().all(|(key, value)| {
                    y.entries()
                        .find(|(other, _)| reflect_eq(key, *other))
                        .is_some_and(|(_, other)| reflect_eq(value, other))
                })
        }
        (ReflectRef::Element(x), ReflectRef::Element(y)) => x == y,
        _ => false,
    }
}

/// Natural order used to make unordered containers diff-stable on write.
///
/// Only scalars are ordered; everything else compares equal so a stable
/// sort leaves it as encountered.
pub fn compare_natural(a: &dyn Reflect, b: &dyn Reflect) -> Ordering {
    match (a.reflect_ref(), b.reflect_ref()) {
        (ReflectRef::Scalar(x), ReflectRef::Scalar(y)) => {
            compare_scalars(&x, &y, scalar_enum_names(a))
        }
        (ReflectRef::Option(x), ReflectRef::Option(y)) => match (x, y) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => compare_natural(x, y),
        },
        _ => Ordering::Equal,
    }
}

fn scalar_enum_names(value: &dyn Reflect) -> &'static [&'static str] {
    match value.reflect_info().scalar_kind() {
        Some(ScalarKind::Enum(names)) => names,
        _ => &[],
    }
}

fn compare_scalars(a: &ScalarValue<'_>, b: &ScalarValue<'_>, names: &[&str]) -> Ordering {
    match (a, b) {
        (ScalarValue::Bool(x), ScalarValue::Bool(y)) => x.cmp(y),
        (ScalarValue::Int(x), ScalarValue::Int(y)) => x.cmp(y),
        (ScalarValue::UInt(x), ScalarValue::UInt(y)) => x.cmp(y),
        (ScalarValue::Int(x), ScalarValue::UInt(y)) => i128::from(*x).cmp(&i128::from(*y)),
        (ScalarValue::UInt(x), ScalarValue::Int(y)) => i128::from(*x).cmp(&i128::from(*y)),
        (ScalarValue::Float(x), ScalarValue::Float(y)) => x.total_cmp(y),
        (ScalarValue::Char(x), ScalarValue::Char(y)) => x.cmp(y),
        (ScalarValue::Str(x), ScalarValue::Str(y)) => x.cmp(y),
        (ScalarValue::Date(x), ScalarValue::Date(y)) => x.cmp(y),
        // Declaration order, like an ordinal.
        (ScalarValue::Enum(x), ScalarValue::Enum(y)) => {
            let position = |name: &str| names.iter().position(|n| *n == name);
            position(x).cmp(&position(y))
        }
        _ => Ordering::Equal,
    }
}
