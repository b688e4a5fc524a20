//! Text ⇄ scalar conversion.
//!
//! | Kind | Written as | Unparsable input |
//! |------|------------|------------------|
//! | string | verbatim | n/a |
//! | bool | `true` / `false` | anything but exactly `true` reads as `false` |
//! | integers, floats | decimal | [`XmlbError::Conversion`] |
//! | char | the character | empty text is a conversion error |
//! | enum | variant name | no match leaves the slot untouched |
//! | date | milliseconds since the epoch | the epoch |

use std::borrow::Cow;

use chrono::{DateTime, Utc};

use crate::error::{Result, XmlbError};
use crate::reflect::{Reflect, ReflectMut, ReflectRef, ScalarKind, ScalarValue, TypeInfo};

/// Renders a scalar as text. `kind` keeps `f32` values from printing with
/// `f64` noise.
pub fn format(value: &ScalarValue<'_>, kind: ScalarKind) -> String {
    match value {
        ScalarValue::Bool(b) => b.to_string(),
        ScalarValue::Int(i) => i.to_string(),
        ScalarValue::UInt(u) => u.to_string(),
        ScalarValue::Float(f) if kind == ScalarKind::F32 => (*f as f32).to_string(),
        ScalarValue::Float(f) => f.to_string(),
        ScalarValue::Char(c) => c.to_string(),
        ScalarValue::Str(s) => s.to_string(),
        ScalarValue::Date(d) => d.timestamp_millis().to_string(),
        ScalarValue::Enum(name) => (*name).to_string(),
    }
}

/// Parses `text` as `kind`. `Ok(None)` means "no value": an enum name that
/// matches no variant.
pub fn parse(text: &str, kind: ScalarKind) -> Result<Option<ScalarValue<'static>>> {
    let conversion = |message: String| XmlbError::Conversion {
        value: text.to_string(),
        target: kind.name(),
        message,
    };

    let value = match kind {
        ScalarKind::String => ScalarValue::Str(Cow::Owned(text.to_string())),
        ScalarKind::Bool => ScalarValue::Bool(text == "true"),
        ScalarKind::I8 | ScalarKind::I16 | ScalarKind::I32 | ScalarKind::I64 => {
            ScalarValue::Int(text.parse::<i64>().map_err(|e| conversion(e.to_string()))?)
        }
        ScalarKind::U8 | ScalarKind::U16 | ScalarKind::U32 | ScalarKind::U64 => {
            ScalarValue::UInt(text.parse::<u64>().map_err(|e| conversion(e.to_string()))?)
        }
        ScalarKind::F32 | ScalarKind::F64 => {
            ScalarValue::Float(text.parse::<f64>().map_err(|e| conversion(e.to_string()))?)
        }
        ScalarKind::Char => match text.chars().next() {
            Some(c) => ScalarValue::Char(c),
            None => return Err(conversion("empty text".to_string())),
        },
        ScalarKind::Date => ScalarValue::Date(parse_date(text)),
        ScalarKind::Enum(names) => match names.iter().find(|name| **name == text) {
            Some(name) => ScalarValue::Enum(*name),
            None => return Ok(None),
        },
    };
    Ok(Some(value))
}

/// Millisecond timestamps; anything else is the epoch.
fn parse_date(text: &str) -> DateTime<Utc> {
    text.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}

/// Text of a scalar value (looking through `Option`); `None` for absent
/// options and non-scalars.
pub fn to_text(value: &dyn Reflect) -> Option<String> {
    match value.reflect_ref() {
        ReflectRef::Scalar(scalar) => {
            let kind = value.reflect_info().scalar_kind()?;
            Some(format(&scalar, kind))
        }
        ReflectRef::Option(Some(inner)) => to_text(inner),
        _ => None,
    }
}

/// Stores a parsed scalar into a scalar or `Option` slot.
///
/// `None` clears an `Option` slot and leaves any other slot untouched.
pub fn assign(slot: &mut dyn Reflect, value: Option<ScalarValue<'_>>) -> Result<()> {
    let type_name = slot.reflect_info().type_name;
    match slot.reflect_mut() {
        ReflectMut::Scalar(scalar) => match value {
            Some(value) => scalar.set_scalar(value),
            None => Ok(()),
        },
        ReflectMut::Option(option) => match value {
            Some(value) => assign(option.get_or_construct()?, Some(value)),
            None => {
                option.set_none();
                Ok(())
            }
        },
        _ => Err(XmlbError::mismatch("scalar", type_name)),
    }
}

/// Parses `text` according to the slot's own kind and stores it.
pub fn set_from_text(slot: &mut dyn Reflect, text: &str) -> Result<()> {
    let info = slot.reflect_info();
    let kind = info
        .scalar_kind()
        .ok_or_else(|| XmlbError::mismatch("scalar", info.type_name))?;
    assign(slot, parse(text, kind)?)
}

/// Builds a fresh value of type `info` from text.
pub fn from_text(info: TypeInfo, text: &str) -> Result<Option<Box<dyn Reflect>>> {
    let kind = info
        .scalar_kind()
        .ok_or_else(|| XmlbError::mismatch("scalar", info.type_name))?;
    let Some(value) = parse(text, kind)? else {
        return Ok(None);
    };
    let mut instance = info.new_instance()?;
    assign(&mut *instance, Some(value))?;
    Ok(Some(instance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::Typed;

    #[test]
    fn test_bool_is_case_sensitive() -> Result<()> {
        assert_eq!(parse("true", ScalarKind::Bool)?, Some(ScalarValue::Bool(true)));
        assert_eq!(parse("TRUE", ScalarKind::Bool)?, Some(ScalarValue::Bool(false)));
        assert_eq!(parse("yes", ScalarKind::Bool)?, Some(ScalarValue::Bool(false)));
        Ok(())
    }

    #[test]
    fn test_number_parse_failure() {
        let result = parse("oops", ScalarKind::I32);
        assert!(matches!(
            result,
            Err(XmlbError::Conversion { target: "i32", .. })
        ));
    }

    #[test]
    fn test_bad_date_is_epoch() -> Result<()> {
        let mut date = Utc::now();
        set_from_text(&mut date, "oops")?;
        assert_eq!(date.timestamp_millis(), 0);
        Ok(())
    }

    #[test]
    fn test_date_round_trip() -> Result<()> {
        let mut date = DateTime::<Utc>::default();
        set_from_text(&mut date, "1700000000123")?;
        assert_eq!(to_text(&date).as_deref(), Some("1700000000123"));
        Ok(())
    }

    #[test]
    fn test_f32_formatting() {
        assert_eq!(to_text(&0.1f32).as_deref(), Some("0.1"));
        assert_eq!(to_text(&2.5f64).as_deref(), Some("2.5"));
    }

    #[test]
    fn test_option_slot() -> Result<()> {
        let mut count: Option<i32> = None;
        set_from_text(&mut count, "42")?;
        assert_eq!(count, Some(42));
        assert_eq!(to_text(&count).as_deref(), Some("42"));
        assert_eq!(to_text(&None::<i32>), None);
        Ok(())
    }

    #[test]
    fn test_from_text_out_of_range() {
        assert!(from_text(u8::type_info(), "300").is_err());
    }
}
