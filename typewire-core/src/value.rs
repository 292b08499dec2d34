//! # Runtime values
//!
//! [`Value`] is the single in-memory data representation shared by every
//! layer of the crate: the serialization formats read and write it, method
//! arguments and results travel as it, and generated message structs expose
//! their fields through it.
//!
//! Generated code plugs into the runtime through the [`Message`] trait: a
//! concrete struct per message type, with presence modeled structurally as
//! `Option<T>` fields. The runtime never inspects those structs directly; it
//! goes through the descriptor's field accessors, which downcast via
//! [`Message::as_any`].

use crate::descriptors::TypeHandle;
use std::any::Any;
use std::fmt::Debug;

/// A dynamically typed data value.
///
/// `Null` doubles as "absent": an unset field reads as `Null` and a `Null`
/// field value is skipped during serialization. Collections preserve
/// insertion order; `Set` additionally keeps only the first occurrence of
/// equal elements. `Enum` holds the canonical lowercase value name.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Enum(String),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Message(Box<dyn Message>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Wraps a concrete message instance.
    pub fn message(message: impl Message + 'static) -> Self {
        Value::Message(Box::new(message))
    }

    /// Wraps an enum value name, normalizing it to the canonical lowercase.
    pub fn enum_value(name: impl AsRef<str>) -> Self {
        Value::Enum(name.as_ref().to_ascii_lowercase())
    }

    /// Downcasts a `Value::Message` payload to its concrete type.
    pub fn downcast_message<M: Message + 'static>(&self) -> Option<&M> {
        match self {
            Value::Message(message) => message.as_any().downcast_ref::<M>(),
            _ => None,
        }
    }

    /// A short name of the variant, used in error messages.
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Enum(_) => "enum",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Message(_) => "message",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Message(a), Value::Message(b)) => a.eq_box(b.as_ref()),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// The boundary between the runtime and generated message structs.
///
/// Implementations are expected to be plain structs with `Option`-wrapped
/// fields, a `Default` constructor registered as the descriptor's instance
/// constructor, and derived `Clone`/`PartialEq`/`Debug` backing the dynamic
/// methods below.
pub trait Message: Debug {
    /// The handle of this instance's concrete descriptor.
    fn descriptor(&self) -> TypeHandle;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn clone_box(&self) -> Box<dyn Message>;

    /// Dynamic equality: same concrete type and equal field values.
    fn eq_box(&self, other: &dyn Message) -> bool;
}

impl Clone for Box<dyn Message> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
