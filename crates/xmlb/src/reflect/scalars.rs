//! Reflection for primitives, strings, timestamps and durations.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{
    Reflect, ReflectMut, ReflectRef, ScalarKind, ScalarReflect, ScalarValue, TypeInfo, TypeKind,
    Typed,
};
use crate::error::{Result, XmlbError};

fn out_of_range(value: impl ToString, target: &'static str) -> XmlbError {
    XmlbError::Conversion {
        value: value.to_string(),
        target,
        message: "out of range".to_string(),
    }
}

macro_rules! reflect_scalar_common {
    ($ty:ty, $kind:expr, $default:expr) => {
        impl Reflect for $ty {
            fn reflect_info(&self) -> TypeInfo {
                <$ty as Typed>::type_info()
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn Any> {
                self
            }

            fn reflect_ref(&self) -> ReflectRef<'_> {
                ReflectRef::Scalar(self.get_scalar())
            }

            fn reflect_mut(&mut self) -> ReflectMut<'_> {
                ReflectMut::Scalar(self)
            }

            fn set(&mut self, value: Box<dyn Reflect>) -> Result<()> {
                *self = <$ty as Typed>::take_from(value)?;
                Ok(())
            }
        }

        impl Typed for $ty {
            fn type_info() -> TypeInfo {
                TypeInfo {
                    type_id: TypeId::of::<$ty>(),
                    type_name: std::any::type_name::<$ty>(),
                    kind: TypeKind::Scalar($kind),
                    construct: Some(|| Box::new($default)),
                }
            }
        }
    };
}

macro_rules! reflect_signed {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl ScalarReflect for $ty {
            fn scalar_kind(&self) -> ScalarKind {
                ScalarKind::$kind
            }

            fn get_scalar(&self) -> ScalarValue<'_> {
                ScalarValue::Int(*self as i64)
            }

            fn set_scalar(&mut self, value: ScalarValue<'_>) -> Result<()> {
                *self = match value {
                    ScalarValue::Int(i) => <$ty>::try_from(i).map_err(|_| out_of_range(i, stringify!($ty)))?,
                    ScalarValue::UInt(u) => <$ty>::try_from(u).map_err(|_| out_of_range(u, stringify!($ty)))?,
                    other => return Err(XmlbError::mismatch(stringify!($ty), other.describe())),
                };
                Ok(())
            }
        }

        reflect_scalar_common!($ty, ScalarKind::$kind, <$ty>::default());
    )*};
}

macro_rules! reflect_unsigned {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl ScalarReflect for $ty {
            fn scalar_kind(&self) -> ScalarKind {
                ScalarKind::$kind
            }

            fn get_scalar(&self) -> ScalarValue<'_> {
                ScalarValue::UInt(*self as u64)
            }

            fn set_scalar(&mut self, value: ScalarValue<'_>) -> Result<()> {
                *self = match value {
                    ScalarValue::Int(i) => <$ty>::try_from(i).map_err(|_| out_of_range(i, stringify!($ty)))?,
                    ScalarValue::UInt(u) => <$ty>::try_from(u).map_err(|_| out_of_range(u, stringify!($ty)))?,
                    other => return Err(XmlbError::mismatch(stringify!($ty), other.describe())),
                };
                Ok(())
            }
        }

        reflect_scalar_common!($ty, ScalarKind::$kind, <$ty>::default());
    )*};
}

macro_rules! reflect_float {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl ScalarReflect for $ty {
            fn scalar_kind(&self) -> ScalarKind {
                ScalarKind::$kind
            }

            fn get_scalar(&self) -> ScalarValue<'_> {
                ScalarValue::Float(*self as f64)
            }

            fn set_scalar(&mut self, value: ScalarValue<'_>) -> Result<()> {
                *self = match value {
                    ScalarValue::Float(f) => f as $ty,
                    ScalarValue::Int(i) => i as $ty,
                    ScalarValue::UInt(u) => u as $ty,
                    other => return Err(XmlbError::mismatch(stringify!($ty), other.describe())),
                };
                Ok(())
            }
        }

        reflect_scalar_common!($ty, ScalarKind::$kind, <$ty>::default());
    )*};
}

reflect_signed!(i8 => I8, i16 => I16, i32 => I32, i64 => I64);
reflect_unsigned!(u8 => U8, u16 => U16, u32 => U32, u64 => U64);
reflect_float!(f32 => F32, f64 => F64);

impl ScalarReflect for bool {
    fn scalar_kind(&self) -> ScalarKind {
        ScalarKind::Bool
    }

    fn get_scalar(&self) -> ScalarValue<'_> {
        ScalarValue::Bool(*self)
    }

    fn set_scalar(&mut self, value: ScalarValue<'_>) -> Result<()> {
        match value {
            ScalarValue::Bool(b) => *self = b,
            other => return Err(XmlbError::mismatch("bool", other.describe())),
        }
        Ok(())
    }
}

reflect_scalar_common!(bool, ScalarKind::Bool, false);

impl ScalarReflect for char {
    fn scalar_kind(&self) -> ScalarKind {
        ScalarKind::Char
    }

    fn get_scalar(&self) -> ScalarValue<'_> {
        ScalarValue::Char(*self)
    }

    fn set_scalar(&mut self, value: ScalarValue<'_>) -> Result<()> {
        match value {
            ScalarValue::Char(c) => *self = c,
            other => return Err(XmlbError::mismatch("char", other.describe())),
        }
        Ok(())
    }
}

reflect_scalar_common!(char, ScalarKind::Char, '\0');

impl ScalarReflect for String {
    fn scalar_kind(&self) -> ScalarKind {
        ScalarKind::String
    }

    fn get_scalar(&self) -> ScalarValue<'_> {
        ScalarValue::Str(Cow::Borrowed(self.as_str()))
    }

    fn set_scalar(&mut self, value: ScalarValue<'_>) -> Result<()> {
        match value {
            ScalarValue::Str(s) => *self = s.into_owned(),
            ScalarValue::Enum(name) => *self = name.to_string(),
            other => return Err(XmlbError::mismatch("String", other.describe())),
        }
        Ok(())
    }
}

reflect_scalar_common!(String, ScalarKind::String, String::new());

impl ScalarReflect for DateTime<Utc> {
    fn scalar_kind(&self) -> ScalarKind {
        ScalarKind::Date
    }

    fn get_scalar(&self) -> ScalarValue<'_> {
        ScalarValue::Date(*self)
    }

    fn set_scalar(&mut self, value: ScalarValue<'_>) -> Result<()> {
        match value {
            ScalarValue::Date(d) => *self = d,
            ScalarValue::Int(millis) => *self = DateTime::from_timestamp_millis(millis).unwrap_or_default(),
            other => return Err(XmlbError::mismatch("DateTime<Utc>", other.describe())),
        }
        Ok(())
    }
}

reflect_scalar_common!(DateTime<Utc>, ScalarKind::Date, DateTime::<Utc>::default());

/// Durations are plain milliseconds unless a converter says otherwise.
impl ScalarReflect for Duration {
    fn scalar_kind(&self) -> ScalarKind {
        ScalarKind::U64
    }

    fn get_scalar(&self) -> ScalarValue<'_> {
        ScalarValue::UInt(u64::try_from(self.as_millis()).unwrap_or(u64::MAX))
    }

    fn set_scalar(&mut self, value: ScalarValue<'_>) -> Result<()> {
        let millis = match value {
            ScalarValue::UInt(u) => u,
            ScalarValue::Int(i) => u64::try_from(i).map_err(|_| out_of_range(i, "Duration"))?,
            other => return Err(XmlbError::mismatch("Duration", other.describe())),
        };
        *self = Duration::from_millis(millis);
        Ok(())
    }
}

reflect_scalar_common!(Duration, ScalarKind::U64, Duration::ZERO);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_range_check() {
        let mut small = 0u8;
        assert!(small.set_scalar(ScalarValue::Int(255)).is_ok());
        assert_eq!(small, 255);
        assert!(matches!(
            small.set_scalar(ScalarValue::Int(256)),
            Err(XmlbError::Conversion { .. })
        ));
        assert!(small.set_scalar(ScalarValue::Int(-1)).is_err());
    }

    #[test]
    fn test_float_accepts_integers() -> Result<()> {
        let mut f = 0.0f64;
        f.set_scalar(ScalarValue::Int(3))?;
        assert_eq!(f, 3.0);
        Ok(())
    }

    #[test]
    fn test_string_rejects_bool() {
        let mut s = String::new();
        assert!(matches!(
            s.set_scalar(ScalarValue::Bool(true)),
            Err(XmlbError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_date_from_millis() -> Result<()> {
        let mut d = DateTime::<Utc>::default();
        d.set_scalar(ScalarValue::Int(1_000))?;
        assert_eq!(d.timestamp_millis(), 1_000);
        Ok(())
    }
}
