//! The JSON format: typed values ⇔ `serde_json::Value` and JSON text.
//!
//! Object keys follow field names; enum values are lowercase strings; map
//! keys are rendered through the line format so that any string-coercible
//! key type (including messages) survives the string-keyed JSON object.

use super::{
    check_map_key_kind, dedup_preserving_order, enum_token, line, narrow_i16, narrow_i32,
    parse_enum_token,
};
use crate::descriptors::{TypeHandle, TypeKind, TypeRegistry, resolve_subtype};
use crate::error::FormatError;
use crate::value::Value;
use serde_json::Value as Json;

/// Serializes a typed value into a JSON tree.
pub fn serialize(registry: &TypeRegistry, ty: TypeHandle, value: &Value) -> Result<Json, FormatError> {
    if value.is_null() {
        return Ok(Json::Null);
    }

    match registry.kind(ty) {
        TypeKind::Bool => match value {
            Value::Bool(v) => Ok(Json::Bool(*v)),
            other => Err(FormatError::mismatch("bool", other)),
        },
        TypeKind::Int16 => match value {
            Value::I16(v) => Ok(Json::from(*v)),
            other => Err(FormatError::mismatch("int16", other)),
        },
        TypeKind::Int32 => match value {
            Value::I32(v) => Ok(Json::from(*v)),
            other => Err(FormatError::mismatch("int32", other)),
        },
        TypeKind::Int64 => match value {
            Value::I64(v) => Ok(Json::from(*v)),
            other => Err(FormatError::mismatch("int64", other)),
        },
        TypeKind::Float => match value {
            Value::F32(v) => finite_number(f64::from(*v)),
            other => Err(FormatError::mismatch("float", other)),
        },
        TypeKind::Double => match value {
            Value::F64(v) => finite_number(*v),
            other => Err(FormatError::mismatch("double", other)),
        },
        TypeKind::String => match value {
            Value::String(v) => Ok(Json::String(v.clone())),
            other => Err(FormatError::mismatch("string", other)),
        },
        TypeKind::Enum => Ok(Json::String(enum_token(registry, ty, value)?)),
        TypeKind::List => {
            let element = element_of(registry, ty);
            let Value::List(items) = value else {
                return Err(FormatError::mismatch("list", value));
            };
            items
                .iter()
                .map(|item| serialize(registry, element, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Json::Array)
        }
        TypeKind::Set => {
            let element = set_element_of(registry, ty);
            let items = match value {
                Value::Set(items) | Value::List(items) => items,
                other => return Err(FormatError::mismatch("set", other)),
            };
            items
                .iter()
                .map(|item| serialize(registry, element, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Json::Array)
        }
        TypeKind::Map => {
            let (key, val) = map_types_of(registry, ty);
            check_map_key_kind(registry, key, "json")?;
            let Value::Map(entries) = value else {
                return Err(FormatError::mismatch("map", value));
            };
            let mut out = serde_json::Map::new();
            for (k, v) in entries {
                let key_string = line::serialize(registry, key, k)?;
                out.insert(key_string, serialize(registry, val, v)?);
            }
            Ok(Json::Object(out))
        }
        TypeKind::Message | TypeKind::Exception => serialize_message(registry, value),
        TypeKind::Object => opaque_to_json(registry, value),
        TypeKind::Void => Ok(Json::Null),
        TypeKind::Interface => Err(FormatError::Unsupported {
            kind: TypeKind::Interface,
            format: "json",
        }),
    }
}

/// Parses a JSON tree into a typed value.
pub fn parse(registry: &TypeRegistry, ty: TypeHandle, json: &Json) -> Result<Value, FormatError> {
    if json.is_null() {
        return Ok(Value::Null);
    }

    match registry.kind(ty) {
        TypeKind::Bool => match json {
            Json::Bool(v) => Ok(Value::Bool(*v)),
            other => Err(FormatError::malformed(format!("expected bool, got {other}"))),
        },
        TypeKind::Int16 => Ok(Value::I16(narrow_i16(integer(json, "int16")?)?)),
        TypeKind::Int32 => Ok(Value::I32(narrow_i32(integer(json, "int32")?)?)),
        TypeKind::Int64 => Ok(Value::I64(integer(json, "int64")?)),
        TypeKind::Float => Ok(Value::F32(float(json, "float")? as f32)),
        TypeKind::Double => Ok(Value::F64(float(json, "double")?)),
        TypeKind::String => match json {
            Json::String(v) => Ok(Value::String(v.clone())),
            other => Err(FormatError::malformed(format!(
                "expected string, got {other}"
            ))),
        },
        TypeKind::Enum => match json {
            Json::String(token) => parse_enum_token(registry, ty, token),
            other => Err(FormatError::malformed(format!(
                "expected enum string, got {other}"
            ))),
        },
        TypeKind::List => {
            let element = element_of(registry, ty);
            let Json::Array(items) = json else {
                return Err(FormatError::malformed(format!("expected array, got {json}")));
            };
            items
                .iter()
                .map(|item| parse(registry, element, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }
        TypeKind::Set => {
            let element = set_element_of(registry, ty);
            let Json::Array(items) = json else {
                return Err(FormatError::malformed(format!("expected array, got {json}")));
            };
            let parsed = items
                .iter()
                .map(|item| parse(registry, element, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Set(dedup_preserving_order(parsed)))
        }
        TypeKind::Map => {
            let (key, val) = map_types_of(registry, ty);
            check_map_key_kind(registry, key, "json")?;
            let Json::Object(entries) = json else {
                return Err(FormatError::malformed(format!(
                    "expected object, got {json}"
                )));
            };
            let mut out = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                let key_value = line::parse(registry, key, k)?;
                out.push((key_value, parse(registry, val, v)?));
            }
            Ok(Value::Map(out))
        }
        TypeKind::Message | TypeKind::Exception => parse_message(registry, ty, json),
        TypeKind::Object => Ok(json_to_opaque(json)),
        TypeKind::Void => Ok(Value::Null),
        TypeKind::Interface => Err(FormatError::Unsupported {
            kind: TypeKind::Interface,
            format: "json",
        }),
    }
}

/// Serializes a typed value into a JSON string.
pub fn to_string(
    registry: &TypeRegistry,
    ty: TypeHandle,
    value: &Value,
) -> Result<String, FormatError> {
    let json = serialize(registry, ty, value)?;
    Ok(serde_json::to_string(&json)?)
}

/// Serializes a typed value into an indented JSON string.
pub fn to_string_pretty(
    registry: &TypeRegistry,
    ty: TypeHandle,
    value: &Value,
) -> Result<String, FormatError> {
    let json = serialize(registry, ty, value)?;
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Parses a JSON string into a typed value.
pub fn from_str(registry: &TypeRegistry, ty: TypeHandle, input: &str) -> Result<Value, FormatError> {
    let json: Json = serde_json::from_str(input)?;
    parse(registry, ty, &json)
}

fn serialize_message(registry: &TypeRegistry, value: &Value) -> Result<Json, FormatError> {
    let Value::Message(message) = value else {
        return Err(FormatError::mismatch("message", value));
    };

    let concrete = message.descriptor();
    let node = registry.node(concrete);
    let descriptor = node
        .as_message()
        .ok_or_else(|| FormatError::mismatch("message", value))?;

    let mut out = serde_json::Map::new();
    for field in descriptor.fields(registry) {
        if !field.is_set(message.as_ref()) {
            continue;
        }
        let Some(field_value) = field.get(message.as_ref()) else {
            continue;
        };
        let serialized = serialize(registry, registry.resolve(field.ty()), &field_value)?;
        if serialized.is_null() {
            continue;
        }
        out.insert(field.name().to_string(), serialized);
    }

    Ok(Json::Object(out))
}

fn parse_message(registry: &TypeRegistry, ty: TypeHandle, json: &Json) -> Result<Value, FormatError> {
    let Json::Object(entries) = json else {
        return Err(FormatError::malformed(format!("expected object, got {json}")));
    };

    let concrete = resolve_subtype(registry, ty, |_, field| match entries.get(field.name()) {
        Some(Json::String(token)) => Ok(Some(token.clone())),
        Some(Json::Null) | None => Ok(None),
        Some(other) => Err(FormatError::malformed(format!(
            "discriminator '{}' must be a string, got {other}",
            field.name()
        ))),
    })?;

    let node = registry.node(concrete);
    let descriptor = node
        .as_message()
        .ok_or_else(|| FormatError::malformed(format!("expected object, got {json}")))?;

    let mut instance = descriptor.new_instance();
    for field in descriptor.fields(registry) {
        let Some(entry) = entries.get(field.name()) else {
            continue;
        };
        let parsed = parse(registry, registry.resolve(field.ty()), entry)?;
        if parsed.is_null() || field.is_discriminator() {
            continue;
        }
        field.set(instance.as_mut(), parsed);
    }

    Ok(Value::Message(instance))
}

fn integer(json: &Json, target: &str) -> Result<i64, FormatError> {
    json.as_i64()
        .ok_or_else(|| FormatError::malformed(format!("expected {target}, got {json}")))
}

fn float(json: &Json, target: &str) -> Result<f64, FormatError> {
    json.as_f64()
        .ok_or_else(|| FormatError::malformed(format!("expected {target}, got {json}")))
}

fn finite_number(value: f64) -> Result<Json, FormatError> {
    serde_json::Number::from_f64(value)
        .map(Json::Number)
        .ok_or_else(|| FormatError::malformed("non-finite floats have no JSON form".to_string()))
}

/// OBJECT values convert structurally: JSON numbers become `I64`/`F64`,
/// arrays become lists, objects become string-keyed maps.
fn json_to_opaque(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(v) => Value::Bool(*v),
        Json::Number(n) => match n.as_i64() {
            Some(v) => Value::I64(v),
            None => Value::F64(n.as_f64().unwrap_or_default()),
        },
        Json::String(v) => Value::String(v.clone()),
        Json::Array(items) => Value::List(items.iter().map(json_to_opaque).collect()),
        Json::Object(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| (Value::String(k.clone()), json_to_opaque(v)))
                .collect(),
        ),
    }
}

fn opaque_to_json(registry: &TypeRegistry, value: &Value) -> Result<Json, FormatError> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(v) => Json::Bool(*v),
        Value::I16(v) => Json::from(*v),
        Value::I32(v) => Json::from(*v),
        Value::I64(v) => Json::from(*v),
        Value::F32(v) => finite_number(f64::from(*v))?,
        Value::F64(v) => finite_number(*v)?,
        Value::String(v) | Value::Enum(v) => Json::String(v.clone()),
        Value::List(items) | Value::Set(items) => Json::Array(
            items
                .iter()
                .map(|item| opaque_to_json(registry, item))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Map(entries) => {
            let mut out = serde_json::Map::new();
            for (k, v) in entries {
                let Value::String(key) = k else {
                    return Err(FormatError::malformed(
                        "opaque map keys must be strings".to_string(),
                    ));
                };
                out.insert(key.clone(), opaque_to_json(registry, v)?);
            }
            Json::Object(out)
        }
        // A message inside an opaque value still knows its own descriptor.
        Value::Message(message) => serialize(registry, message.descriptor(), value)?,
    })
}

fn element_of(registry: &TypeRegistry, ty: TypeHandle) -> TypeHandle {
    let node = registry.node(ty);
    registry.resolve(node.as_list().expect("list descriptor").element())
}

fn set_element_of(registry: &TypeRegistry, ty: TypeHandle) -> TypeHandle {
    let node = registry.node(ty);
    registry.resolve(node.as_set().expect("set descriptor").element())
}

fn map_types_of(registry: &TypeRegistry, ty: TypeHandle) -> (TypeHandle, TypeHandle) {
    let node = registry.node(ty);
    let map = node.as_map().expect("map descriptor");
    (registry.resolve(map.key()), registry.resolve(map.value()))
}
