//! Two-way text conversion for values without a structural binding.
//!
//! A converter is attached to a slot with [`crate::Slot::converter`] and
//! replaces the scalar codec for that slot wherever it is written (attribute,
//! option tag, tag text). Returning `None` from [`Converter::to_string`]
//! suppresses the slot entirely; an empty string is still written.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, XmlbError};
use crate::reflect::{Reflect, ReflectRef, TypeInfo, Typed};

/// Converts one slot value to and from text.
pub trait Converter<T>: Send + Sync + 'static {
    fn from_string(&self, text: &str) -> Option<T>;

    fn to_string(&self, value: &T) -> Option<String>;
}

/// Type-erased converter stored in slot annotations.
pub(crate) trait ErasedConverter: Send + Sync {
    fn target(&self) -> TypeInfo;

    fn from_text(&self, text: &str) -> Option<Box<dyn Reflect>>;

    fn to_text(&self, value: &dyn Reflect) -> Result<Option<String>>;
}

struct Erased<T, C> {
    converter: C,
    _target: PhantomData<fn() -> T>,
}

impl<T: Typed, C: Converter<T>> ErasedConverter for Erased<T, C> {
    fn target(&self) -> TypeInfo {
        T::type_info()
    }

    fn from_text(&self, text: &str) -> Option<Box<dyn Reflect>> {
        self.converter
            .from_string(text)
            .map(|value| Box::new(value) as Box<dyn Reflect>)
    }

    fn to_text(&self, value: &dyn Reflect) -> Result<Option<String>> {
        if let Some(value) = value.downcast_ref::<T>() {
            return Ok(self.converter.to_string(value));
        }
        match value.reflect_ref() {
            ReflectRef::Option(None) => Ok(None),
            ReflectRef::Option(Some(inner)) => self.to_text(inner),
            _ => Err(XmlbError::mismatch(
                std::any::type_name::<T>(),
                value.reflect_info().type_name,
            )),
        }
    }
}

pub(crate) fn erase<T: Typed, C: Converter<T>>(converter: C) -> Arc<dyn ErasedConverter> {
    Arc::new(Erased {
        converter,
        _target: PhantomData,
    })
}

/// `Duration` as human-readable text (`1h 30m`, `250ms`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationConverter;

impl Converter<Duration> for DurationConverter {
    fn from_string(&self, text: &str) -> Option<Duration> {
        humantime::parse_duration(text.trim()).ok()
    }

    fn to_string(&self, value: &Duration) -> Option<String> {
        Some(humantime::format_duration(*value).to_string())
    }
}

/// A string list as one comma-separated value. An empty list is not written.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommaSeparatedConverter;

impl Converter<Vec<String>> for CommaSeparatedConverter {
    fn from_string(&self, text: &str) -> Option<Vec<String>> {
        Some(
            text.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    fn to_string(&self, value: &Vec<String>) -> Option<String> {
        if value.is_empty() {
            None
        } else {
            Some(value.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_round_trip() {
        let converter = DurationConverter;
        let text = converter.to_string(&Duration::from_secs(5400));
        assert_eq!(text.as_deref(), Some("1h 30m"));
        assert_eq!(
            converter.from_string("1h 30m"),
            Some(Duration::from_secs(5400))
        );
        assert_eq!(converter.from_string("soon"), None);
    }

    #[test]
    fn test_comma_separated() {
        let converter = CommaSeparatedConverter;
        assert_eq!(
            converter.from_string("a, b,,c"),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(converter.to_string(&Vec::new()), None);
    }

    #[test]
    fn test_erased_looks_through_option() -> Result<()> {
        let erased = erase(DurationConverter);
        let some = Some(Duration::from_millis(250));
        assert_eq!(erased.to_text(&some)?.as_deref(), Some("250ms"));
        assert_eq!(erased.to_text(&None::<Duration>)?, None);
        assert!(erased.to_text(&5i32).is_err());
        Ok(())
    }
}
