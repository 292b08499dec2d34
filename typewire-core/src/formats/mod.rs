//! # Serialization engine
//!
//! Three wire formats over one descriptor-driven traversal:
//!
//! * [`native`]: typed values ⇔ plain in-memory [`Value`](crate::Value)
//!   trees (messages become ordered maps of field name → value).
//! * [`json`]: typed values ⇔ `serde_json::Value` and JSON text.
//! * [`line`]: typed values ⇔ the compact delimited text form used in REST
//!   paths and query parameters.
//!
//! Each format dispatches purely on the descriptor's [`TypeKind`]; they
//! share the polymorphic-resolution step (concrete descriptor before field
//! traversal), the skip-unset serialization rule, and the checked numeric
//! narrowing implemented here.

pub mod json;
pub mod line;
pub mod native;

use crate::descriptors::{TypeHandle, TypeKind, TypeRegistry};
use crate::error::FormatError;
use crate::value::Value;

/// Widens any integer value; used before checked narrowing.
pub(crate) fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::I16(v) => Some(i64::from(*v)),
        Value::I32(v) => Some(i64::from(*v)),
        Value::I64(v) => Some(*v),
        _ => None,
    }
}

/// Widens any numeric value to f64.
pub(crate) fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::F32(v) => Some(f64::from(*v)),
        Value::F64(v) => Some(*v),
        _ => value_to_i64(value).map(|v| v as f64),
    }
}

pub(crate) fn narrow_i16(value: i64) -> Result<i16, FormatError> {
    i16::try_from(value).map_err(|_| FormatError::Overflow {
        value,
        target: "int16",
    })
}

pub(crate) fn narrow_i32(value: i64) -> Result<i32, FormatError> {
    i32::try_from(value).map_err(|_| FormatError::Overflow {
        value,
        target: "int32",
    })
}

/// Resolves a wire token against an enum descriptor, case-insensitively,
/// producing the canonical `Value::Enum`.
pub(crate) fn parse_enum_token(
    registry: &TypeRegistry,
    handle: TypeHandle,
    token: &str,
) -> Result<Value, FormatError> {
    let node = registry.node(handle);
    let descriptor = node
        .as_enum()
        .ok_or_else(|| FormatError::malformed(format!("'{}' is not an enum", node.name())))?;
    descriptor
        .find(token)
        .map(|v| Value::Enum(v.to_string()))
        .ok_or_else(|| FormatError::UnknownEnumValue {
            enum_name: descriptor.name().to_string(),
            value: token.to_string(),
        })
}

/// The canonical lowercase name for an enum-typed value, validated against
/// the descriptor.
pub(crate) fn enum_token(
    registry: &TypeRegistry,
    handle: TypeHandle,
    value: &Value,
) -> Result<String, FormatError> {
    let token = match value {
        Value::Enum(name) => name.as_str(),
        Value::String(name) => name.as_str(),
        other => return Err(FormatError::mismatch("enum value", other)),
    };
    match parse_enum_token(registry, handle, token)? {
        Value::Enum(canonical) => Ok(canonical),
        _ => unreachable!(),
    }
}

/// Map keys must render as single strings: scalars, enums, and messages
/// (through the line format). Container and opaque keys are format errors.
pub(crate) fn check_map_key_kind(
    registry: &TypeRegistry,
    key: TypeHandle,
    format: &'static str,
) -> Result<(), FormatError> {
    let kind = registry.kind(key);
    if kind.is_string_coercible() {
        Ok(())
    } else {
        Err(FormatError::Unsupported { kind, format })
    }
}

/// Drops duplicate elements, keeping the first occurrence of each.
pub(crate) fn dedup_preserving_order(values: Vec<Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Kinds whose REST arguments travel as bare line-format tokens instead of
/// JSON strings.
pub(crate) fn is_line_scalar(kind: TypeKind) -> bool {
    matches!(
        kind,
        TypeKind::Bool
            | TypeKind::Int16
            | TypeKind::Int32
            | TypeKind::Int64
            | TypeKind::Float
            | TypeKind::Double
            | TypeKind::String
            | TypeKind::Enum
    )
}
