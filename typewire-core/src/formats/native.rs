//! The native format: typed values ⇔ plain in-memory trees.
//!
//! The plain form contains no `Message` nodes: a message serializes to an
//! insertion-ordered `Value::Map` keyed by field-name strings, in linearized
//! field order, holding only the fields that are set on the instance.

use super::{
    check_map_key_kind, dedup_preserving_order, enum_token, narrow_i16, narrow_i32,
    parse_enum_token, value_to_f64, value_to_i64,
};
use crate::descriptors::{TypeHandle, TypeKind, TypeRegistry, resolve_subtype};
use crate::error::FormatError;
use crate::value::Value;

/// Serializes a typed value into its plain native form.
pub fn serialize(
    registry: &TypeRegistry,
    ty: TypeHandle,
    value: &Value,
) -> Result<Value, FormatError> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match registry.kind(ty) {
        TypeKind::Bool => match value {
            Value::Bool(v) => Ok(Value::Bool(*v)),
            other => Err(FormatError::mismatch("bool", other)),
        },
        TypeKind::Int16 => {
            let wide = value_to_i64(value).ok_or_else(|| FormatError::mismatch("int16", value))?;
            Ok(Value::I16(narrow_i16(wide)?))
        }
        TypeKind::Int32 => {
            let wide = value_to_i64(value).ok_or_else(|| FormatError::mismatch("int32", value))?;
            Ok(Value::I32(narrow_i32(wide)?))
        }
        TypeKind::Int64 => {
            let wide = value_to_i64(value).ok_or_else(|| FormatError::mismatch("int64", value))?;
            Ok(Value::I64(wide))
        }
        TypeKind::Float => {
            let wide = value_to_f64(value).ok_or_else(|| FormatError::mismatch("float", value))?;
            Ok(Value::F32(wide as f32))
        }
        TypeKind::Double => {
            let wide = value_to_f64(value).ok_or_else(|| FormatError::mismatch("double", value))?;
            Ok(Value::F64(wide))
        }
        TypeKind::String => match value {
            Value::String(v) => Ok(Value::String(v.clone())),
            other => Err(FormatError::mismatch("string", other)),
        },
        TypeKind::Enum => Ok(Value::Enum(enum_token(registry, ty, value)?)),
        TypeKind::List => {
            let element = element_of(registry, ty);
            let items = expect_list(value)?;
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(serialize(registry, element, item)?);
            }
            Ok(Value::List(out))
        }
        TypeKind::Set => {
            let element = set_element_of(registry, ty);
            let items = expect_set(value)?;
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(serialize(registry, element, item)?);
            }
            Ok(Value::Set(dedup_preserving_order(out)))
        }
        TypeKind::Map => {
            let (key, val) = map_types_of(registry, ty);
            check_map_key_kind(registry, key, "native")?;
            let entries = expect_map(value)?;
            let mut out = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                out.push((serialize(registry, key, k)?, serialize(registry, val, v)?));
            }
            Ok(Value::Map(out))
        }
        TypeKind::Message | TypeKind::Exception => serialize_message(registry, value),
        TypeKind::Object => Ok(value.clone()),
        TypeKind::Void => Ok(Value::Null),
        TypeKind::Interface => Err(FormatError::Unsupported {
            kind: TypeKind::Interface,
            format: "native",
        }),
    }
}

/// Parses a plain native tree back into a typed value.
pub fn parse(
    registry: &TypeRegistry,
    ty: TypeHandle,
    plain: &Value,
) -> Result<Value, FormatError> {
    if plain.is_null() {
        return Ok(Value::Null);
    }

    match registry.kind(ty) {
        TypeKind::Bool => match plain {
            Value::Bool(v) => Ok(Value::Bool(*v)),
            other => Err(FormatError::mismatch("bool", other)),
        },
        TypeKind::Int16 => {
            let wide = value_to_i64(plain).ok_or_else(|| FormatError::mismatch("int16", plain))?;
            Ok(Value::I16(narrow_i16(wide)?))
        }
        TypeKind::Int32 => {
            let wide = value_to_i64(plain).ok_or_else(|| FormatError::mismatch("int32", plain))?;
            Ok(Value::I32(narrow_i32(wide)?))
        }
        TypeKind::Int64 => {
            let wide = value_to_i64(plain).ok_or_else(|| FormatError::mismatch("int64", plain))?;
            Ok(Value::I64(wide))
        }
        TypeKind::Float => {
            let wide = value_to_f64(plain).ok_or_else(|| FormatError::mismatch("float", plain))?;
            Ok(Value::F32(wide as f32))
        }
        TypeKind::Double => {
            let wide = value_to_f64(plain).ok_or_else(|| FormatError::mismatch("double", plain))?;
            Ok(Value::F64(wide))
        }
        TypeKind::String => match plain {
            Value::String(v) => Ok(Value::String(v.clone())),
            other => Err(FormatError::mismatch("string", other)),
        },
        TypeKind::Enum => match plain {
            Value::Enum(token) | Value::String(token) => parse_enum_token(registry, ty, token),
            other => Err(FormatError::mismatch("enum value", other)),
        },
        TypeKind::List => {
            let element = element_of(registry, ty);
            let items = expect_list(plain)?;
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(parse(registry, element, item)?);
            }
            Ok(Value::List(out))
        }
        TypeKind::Set => {
            let element = set_element_of(registry, ty);
            let items = expect_set(plain)?;
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(parse(registry, element, item)?);
            }
            Ok(Value::Set(dedup_preserving_order(out)))
        }
        TypeKind::Map => {
            let (key, val) = map_types_of(registry, ty);
            check_map_key_kind(registry, key, "native")?;
            let entries = expect_map(plain)?;
            let mut out = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                out.push((parse(registry, key, k)?, parse(registry, val, v)?));
            }
            Ok(Value::Map(out))
        }
        TypeKind::Message | TypeKind::Exception => parse_message(registry, ty, plain),
        TypeKind::Object => Ok(plain.clone()),
        TypeKind::Void => Ok(Value::Null),
        TypeKind::Interface => Err(FormatError::Unsupported {
            kind: TypeKind::Interface,
            format: "native",
        }),
    }
}

fn serialize_message(registry: &TypeRegistry, value: &Value) -> Result<Value, FormatError> {
    let Value::Message(message) = value else {
        return Err(FormatError::mismatch("message", value));
    };

    // The concrete descriptor comes from the instance itself: a subtype
    // passed where the base is declared serializes with all its fields, and
    // the discriminator value is whatever the subtype's own getter reports.
    let concrete = message.descriptor();
    let node = registry.node(concrete);
    let descriptor = node
        .as_message()
        .ok_or_else(|| FormatError::mismatch("message", value))?;

    let mut out = Vec::new();
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
        out.push((Value::String(field.name().to_string()), serialized));
    }

    Ok(Value::Map(out))
}

fn parse_message(
    registry: &TypeRegistry,
    ty: TypeHandle,
    plain: &Value,
) -> Result<Value, FormatError> {
    let entries = expect_map(plain)?;

    let concrete = resolve_subtype(registry, ty, |_, field| {
        match lookup(entries, field.name()) {
            Some(Value::Enum(token)) | Some(Value::String(token)) => Ok(Some(token.clone())),
            Some(Value::Null) | None => Ok(None),
            Some(other) => Err(FormatError::mismatch("discriminator value", other)),
        }
    })?;

    let node = registry.node(concrete);
    let descriptor = node
        .as_message()
        .ok_or_else(|| FormatError::mismatch("message", plain))?;

    let mut instance = descriptor.new_instance();
    for field in descriptor.fields(registry) {
        let Some(entry) = lookup(entries, field.name()) else {
            continue;
        };
        let parsed = parse(registry, registry.resolve(field.ty()), entry)?;
        // Discriminators are validated above but supplied by the concrete
        // type itself, never copied from the wire.
        if parsed.is_null() || field.is_discriminator() {
            continue;
        }
        field.set(instance.as_mut(), parsed);
    }

    Ok(Value::Message(instance))
}

fn lookup<'a>(entries: &'a [(Value, Value)], name: &str) -> Option<&'a Value> {
    entries.iter().find_map(|(k, v)| match k {
        Value::String(key) if key == name => Some(v),
        _ => None,
    })
}

fn expect_list(value: &Value) -> Result<&[Value], FormatError> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(FormatError::mismatch("list", other)),
    }
}

fn expect_set(value: &Value) -> Result<&[Value], FormatError> {
    match value {
        Value::Set(items) | Value::List(items) => Ok(items),
        other => Err(FormatError::mismatch("set", other)),
    }
}

fn expect_map(value: &Value) -> Result<&[(Value, Value)], FormatError> {
    match value {
        Value::Map(entries) => Ok(entries),
        other => Err(FormatError::mismatch("map", other)),
    }
}

fn element_of(registry: &TypeRegistry, ty: TypeHandle) -> TypeHandle {
    let node = registry.node(ty);
    let list = node.as_list().expect("list descriptor");
    registry.resolve(list.element())
}

fn set_element_of(registry: &TypeRegistry, ty: TypeHandle) -> TypeHandle {
    let node = registry.node(ty);
    let set = node.as_set().expect("set descriptor");
    registry.resolve(set.element())
}

fn map_types_of(registry: &TypeRegistry, ty: TypeHandle) -> (TypeHandle, TypeHandle) {
    let node = registry.node(ty);
    let map = node.as_map().expect("map descriptor");
    (registry.resolve(map.key()), registry.resolve(map.value()))
}
