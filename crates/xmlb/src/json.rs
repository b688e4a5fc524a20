//! JSON projection of bound values.
//!
//! Mirrors the markup mapping: beans and maps with scalar keys become
//! objects, collections become arrays, scalars become JSON primitives.
//! Dates are milliseconds since the epoch. Absent options are an explicit
//! `null`. Maps with structural keys are arrays of `{"key", "value"}`
//! objects. Opaque elements use [`Element::to_json`].

use serde_json::{Map, Number, Value};
use xmlb_dom::{Content, Element};

use crate::binding::{Ctx, clear_option, store_entries, store_items};
use crate::error::{Result, XmlbError};
use crate::reflect::{
    MapReflect, Reflect, ReflectMut, ReflectRef, ScalarValue, TypeInfo, TypeKind, compare_natural,
};
use crate::scalar;

pub(crate) fn value_to_json(value: &dyn Reflect, ctx: &Ctx<'_>) -> Result<Value> {
    let json = match value.reflect_ref() {
        ReflectRef::Scalar(scalar) => scalar_to_json(scalar),
        ReflectRef::Option(None) => Value::Null,
        ReflectRef::Option(Some(inner)) => value_to_json(inner, ctx)?,
        ReflectRef::Bean(_) => ctx.with_bean(&value.reflect_info(), |bean| bean.to_json(value, ctx))?,
        ReflectRef::List(list) => {
            let mut items: Vec<&dyn Reflect> = list.items().collect();
            if list.collection_kind().is_unordered() && ctx.config().sort_unordered_collections {
                items.sort_by(|a, b| compare_natural(*a, *b));
            }
            Value::Array(
                items
                    .into_iter()
                    .map(|item| value_to_json(item, ctx))
                    .collect::<Result<_>>()?,
            )
        }
        ReflectRef::Map(map) => map_to_json(map, ctx)?,
        ReflectRef::Element(element) => element.to_json(),
    };
    Ok(json)
}

fn scalar_to_json(scalar: ScalarValue<'_>) -> Value {
    match scalar {
        ScalarValue::Bool(flag) => Value::Bool(flag),
        ScalarValue::Int(n) => Value::from(n),
        ScalarValue::UInt(n) => Value::from(n),
        ScalarValue::Float(n) => Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null),
        ScalarValue::Char(c) => Value::String(c.to_string()),
        ScalarValue::Str(text) => Value::String(text.into_owned()),
        ScalarValue::Date(date) => Value::from(date.timestamp_millis()),
        ScalarValue::Enum(name) => Value::String(name.to_string()),
    }
}

fn map_to_json(map: &dyn MapReflect, ctx: &Ctx<'_>) -> Result<Value> {
    if map.key_info().scalar_kind().is_some() {
        let mut object = Map::new();
        for (key, value) in map.entries() {
            if let Some(key) = scalar::to_text(key) {
                object.insert(key, value_to_json(value, ctx)?);
            }
        }
        return Ok(Value::Object(object));
    }

    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map.entries() {
        let mut entry = Map::new();
        entry.insert("key".to_string(), value_to_json(key, ctx)?);
        entry.insert("value".to_string(), value_to_json(value, ctx)?);
        entries.push(Value::Object(entry));
    }
    Ok(Value::Array(entries))
}

/// Fills `target` from `json`. `null` clears options and leaves other
/// values untouched.
pub(crate) fn value_from_json(target: &mut dyn Reflect, json: &Value, ctx: &Ctx<'_>) -> Result<()> {
    let info = target.reflect_info();
    match info.kind {
        TypeKind::Option(_) => {
            if json.is_null() {
                return clear_option(target);
            }
            match target.reflect_mut() {
                ReflectMut::Option(option) => value_from_json(option.get_or_construct()?, json, ctx),
                _ => Err(XmlbError::mismatch("option", info.type_name)),
            }
        }
        TypeKind::Scalar(_) => {
            let text = match json {
                Value::Null => return Ok(()),
                Value::String(text) => text.clone(),
                Value::Bool(_) | Value::Number(_) => json.to_string(),
                other => return Err(XmlbError::mismatch(info.type_name, json_kind(other))),
            };
            scalar::set_from_text(target, &text)
        }
        TypeKind::Bean(_) => {
            if json.is_null() {
                return Ok(());
            }
            ctx.with_bean(&info, |bean| bean.set_from_json(target, json, ctx))
        }
        TypeKind::List { item, .. } => {
            let Value::Array(values) = json else {
                return Err(XmlbError::mismatch("JSON array", json_kind(json)));
            };
            let items = values
                .iter()
                .map(|value| fresh_from_json(item(), value, ctx))
                .collect::<Result<Vec<_>>>()?;
            store_items(target, items)
        }
        TypeKind::Map { key, value, .. } => {
            let entries = map_entries_from_json(key(), value(), json, ctx)?;
            store_entries(target, entries)
        }
        TypeKind::Element => match target.reflect_mut() {
            ReflectMut::Element(element) => {
                *element = element_from_json(json)?;
                Ok(())
            }
            _ => Err(XmlbError::mismatch("Element", info.type_name)),
        },
        TypeKind::Dynamic => Err(XmlbError::UnknownType {
            tag: json_kind(json).to_string(),
        }),
    }
}

fn fresh_from_json(info: TypeInfo, json: &Value, ctx: &Ctx<'_>) -> Result<Box<dyn Reflect>> {
    if matches!(info.kind, TypeKind::Dynamic) {
        return Err(XmlbError::UnknownType {
            tag: json_kind(json).to_string(),
        });
    }
    let mut value = info.new_instance()?;
    value_from_json(&mut *value, json, ctx)?;
    Ok(value)
}

fn map_entries_from_json(
    key: TypeInfo,
    value: TypeInfo,
    json: &Value,
    ctx: &Ctx<'_>,
) -> Result<Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>> {
    let mut entries = Vec::new();
    match json {
        Value::Object(object) => {
            for (text, json_value) in object {
                if let Some(key) = scalar::from_text(key, text)? {
                    entries.push((key, fresh_from_json(value, json_value, ctx)?));
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                let (Some(json_key), Some(json_value)) = (item.get("key"), item.get("value")) else {
                    return Err(XmlbError::mismatch("{\"key\", \"value\"} object", json_kind(item)));
                };
                entries.push((fresh_from_json(key, json_key, ctx)?, fresh_from_json(value, json_value, ctx)?));
            }
        }
        other => return Err(XmlbError::mismatch("JSON object or array", json_kind(other))),
    }
    Ok(entries)
}

/// Inverse of [`Element::to_json`].
fn element_from_json(json: &Value) -> Result<Element> {
    let name = json
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| XmlbError::mismatch("element object", json_kind(json)))?;
    let mut element = Element::new(name);
    if let Some(Value::Object(attributes)) = json.get("attributes") {
        for (attribute, value) in attributes {
            if let Some(value) = value.as_str() {
                element.set_attribute(attribute.as_str(), value);
            }
        }
    }
    if let Some(Value::Array(content)) = json.get("content") {
        for item in content {
            match item {
                Value::String(text) => element.content_mut().push(Content::Text(text.clone())),
                other => element.content_mut().push(Content::Element(element_from_json(other)?)),
            }
        }
    }
    Ok(element)
}

pub(crate) fn json_kind(json: &Value) -> &'static str {
    match json {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
