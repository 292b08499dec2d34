//! Message structs and enums, written the way generated code would emit
//! them: one plain struct per message with `Option`-wrapped fields, a
//! constructor that captures the type handle, and accessor functions bound
//! into the descriptors by `schema()`.

use std::any::Any;
use typewire_core::descriptors::FieldAccessor;
use typewire_core::{Message, TypeHandle, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Entry,
    Text,
    Photo,
    Link,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Entry => "entry",
            EntryKind::Text => "text",
            EntryKind::Photo => "photo",
            EntryKind::Link => "link",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "entry" => Some(EntryKind::Entry),
            "text" => Some(EntryKind::Text),
            "photo" => Some(EntryKind::Photo),
            "link" => Some(EntryKind::Link),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    Forbidden,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotFound => "not_found",
            ErrorCode::Forbidden => "forbidden",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "not_found" => Some(ErrorCode::NotFound),
            "forbidden" => Some(ErrorCode::Forbidden),
            _ => None,
        }
    }
}

/// The polymorphic base entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    handle: TypeHandle,
    pub kind: Option<EntryKind>,
    pub id: Option<i64>,
    pub title: Option<String>,
}

impl Entry {
    pub fn new(handle: TypeHandle) -> Self {
        Self {
            handle,
            kind: Some(EntryKind::Entry),
            id: None,
            title: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextEntry {
    handle: TypeHandle,
    pub kind: Option<EntryKind>,
    pub id: Option<i64>,
    pub title: Option<String>,
    pub text: Option<String>,
}

impl TextEntry {
    pub fn new(handle: TypeHandle) -> Self {
        Self {
            handle,
            kind: Some(EntryKind::Text),
            id: None,
            title: None,
            text: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhotoEntry {
    handle: TypeHandle,
    pub kind: Option<EntryKind>,
    pub id: Option<i64>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub location: Option<Location>,
}

impl PhotoEntry {
    pub fn new(handle: TypeHandle) -> Self {
        Self {
            handle,
            kind: Some(EntryKind::Photo),
            id: None,
            title: None,
            url: None,
            width: None,
            height: None,
            location: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    handle: TypeHandle,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Location {
    pub fn new(handle: TypeHandle) -> Self {
        Self {
            handle,
            lat: None,
            lon: None,
        }
    }
}

/// The form message: RPC arguments of this type expand field-by-field into
/// query/post parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryFilter {
    handle: TypeHandle,
    pub query: Option<String>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
    pub tags: Option<Vec<String>>,
}

impl EntryFilter {
    pub fn new(handle: TypeHandle) -> Self {
        Self {
            handle,
            query: None,
            limit: None,
            offset: None,
            tags: None,
        }
    }
}

/// A small flat message used by serialization tests.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    handle: TypeHandle,
    pub string0: Option<String>,
    pub bool0: Option<bool>,
    pub short0: Option<i16>,
}

impl Sample {
    pub fn new(handle: TypeHandle) -> Self {
        Self {
            handle,
            string0: None,
            bool0: None,
            short0: None,
        }
    }
}

/// The declared application exception.
#[derive(Clone, Debug, PartialEq)]
pub struct AlbumError {
    handle: TypeHandle,
    pub code: Option<ErrorCode>,
    pub message: Option<String>,
}

impl AlbumError {
    pub fn new(handle: TypeHandle) -> Self {
        Self {
            handle,
            code: None,
            message: None,
        }
    }
}

macro_rules! impl_message {
    ($ty:ty) => {
        impl Message for $ty {
            fn descriptor(&self) -> TypeHandle {
                self.handle
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }

            fn clone_box(&self) -> Box<dyn Message> {
                Box::new(self.clone())
            }

            fn eq_box(&self, other: &dyn Message) -> bool {
                other
                    .as_any()
                    .downcast_ref::<Self>()
                    .is_some_and(|other| other == self)
            }
        }
    };
}

impl_message!(Entry);
impl_message!(TextEntry);
impl_message!(PhotoEntry);
impl_message!(Location);
impl_message!(EntryFilter);
impl_message!(Sample);
impl_message!(AlbumError);

pub(crate) fn cast<T: Message + 'static>(message: &dyn Message) -> &T {
    message
        .as_any()
        .downcast_ref::<T>()
        .expect("field accessor bound to a different message type")
}

pub(crate) fn cast_mut<T: Message + 'static>(message: &mut dyn Message) -> &mut T {
    message
        .as_any_mut()
        .downcast_mut::<T>()
        .expect("field accessor bound to a different message type")
}

/// Expands to the four accessor functions for one field. The setter trusts
/// its input variant: the runtime only feeds values parsed against the
/// field's own descriptor.
macro_rules! accessor {
    ($owner:ty, $field:ident, $get:expr, $set:expr) => {
        FieldAccessor {
            get: |m| cast::<$owner>(m).$field.clone().map($get),
            set: |m, v| cast_mut::<$owner>(m).$field = Some($set(v)),
            is_set: |m| cast::<$owner>(m).$field.is_some(),
            clear: |m| cast_mut::<$owner>(m).$field = None,
        }
    };
}

fn take_i32(value: Value) -> i32 {
    match value {
        Value::I32(v) => v,
        other => panic!("expected an i32 value, got {other:?}"),
    }
}

fn take_i16(value: Value) -> i16 {
    match value {
        Value::I16(v) => v,
        other => panic!("expected an i16 value, got {other:?}"),
    }
}

fn take_bool(value: Value) -> bool {
    match value {
        Value::Bool(v) => v,
        other => panic!("expected a bool value, got {other:?}"),
    }
}

fn take_i64(value: Value) -> i64 {
    match value {
        Value::I64(v) => v,
        other => panic!("expected an i64 value, got {other:?}"),
    }
}

fn take_f64(value: Value) -> f64 {
    match value {
        Value::F64(v) => v,
        other => panic!("expected an f64 value, got {other:?}"),
    }
}

fn take_string(value: Value) -> String {
    match value {
        Value::String(v) => v,
        other => panic!("expected a string value, got {other:?}"),
    }
}

fn take_entry_kind(value: Value) -> EntryKind {
    match value {
        Value::Enum(name) => {
            EntryKind::from_name(&name).unwrap_or_else(|| panic!("unknown entry kind '{name}'"))
        }
        other => panic!("expected an enum value, got {other:?}"),
    }
}

fn take_error_code(value: Value) -> ErrorCode {
    match value {
        Value::Enum(name) => {
            ErrorCode::from_name(&name).unwrap_or_else(|| panic!("unknown error code '{name}'"))
        }
        other => panic!("expected an enum value, got {other:?}"),
    }
}

fn take_location(value: Value) -> Location {
    match value {
        Value::Message(message) => message
            .as_any()
            .downcast_ref::<Location>()
            .cloned()
            .expect("expected a Location message"),
        other => panic!("expected a message value, got {other:?}"),
    }
}

fn take_string_list(value: Value) -> Vec<String> {
    match value {
        Value::List(items) => items.into_iter().map(take_string).collect(),
        other => panic!("expected a list value, got {other:?}"),
    }
}

fn entry_kind_value(kind: EntryKind) -> Value {
    Value::Enum(kind.as_str().to_string())
}

fn error_code_value(code: ErrorCode) -> Value {
    Value::Enum(code.as_str().to_string())
}

fn string_list_value(items: Vec<String>) -> Value {
    Value::List(items.into_iter().map(Value::String).collect())
}

// Accessor tables, one per message type, consumed by `schema()`.

pub(crate) fn entry_kind_accessor() -> FieldAccessor {
    accessor!(Entry, kind, entry_kind_value, take_entry_kind)
}

pub(crate) fn entry_id_accessor() -> FieldAccessor {
    accessor!(Entry, id, Value::I64, take_i64)
}

pub(crate) fn entry_title_accessor() -> FieldAccessor {
    accessor!(Entry, title, Value::String, take_string)
}

pub(crate) fn text_entry_kind_accessor() -> FieldAccessor {
    accessor!(TextEntry, kind, entry_kind_value, take_entry_kind)
}

pub(crate) fn text_entry_id_accessor() -> FieldAccessor {
    accessor!(TextEntry, id, Value::I64, take_i64)
}

pub(crate) fn text_entry_title_accessor() -> FieldAccessor {
    accessor!(TextEntry, title, Value::String, take_string)
}

pub(crate) fn text_entry_text_accessor() -> FieldAccessor {
    accessor!(TextEntry, text, Value::String, take_string)
}

pub(crate) fn photo_entry_kind_accessor() -> FieldAccessor {
    accessor!(PhotoEntry, kind, entry_kind_value, take_entry_kind)
}

pub(crate) fn photo_entry_id_accessor() -> FieldAccessor {
    accessor!(PhotoEntry, id, Value::I64, take_i64)
}

pub(crate) fn photo_entry_title_accessor() -> FieldAccessor {
    accessor!(PhotoEntry, title, Value::String, take_string)
}

pub(crate) fn photo_entry_url_accessor() -> FieldAccessor {
    accessor!(PhotoEntry, url, Value::String, take_string)
}

pub(crate) fn photo_entry_width_accessor() -> FieldAccessor {
    accessor!(PhotoEntry, width, Value::I32, take_i32)
}

pub(crate) fn photo_entry_height_accessor() -> FieldAccessor {
    accessor!(PhotoEntry, height, Value::I32, take_i32)
}

pub(crate) fn photo_entry_location_accessor() -> FieldAccessor {
    accessor!(PhotoEntry, location, Value::message, take_location)
}

pub(crate) fn location_lat_accessor() -> FieldAccessor {
    accessor!(Location, lat, Value::F64, take_f64)
}

pub(crate) fn location_lon_accessor() -> FieldAccessor {
    accessor!(Location, lon, Value::F64, take_f64)
}

pub(crate) fn entry_filter_query_accessor() -> FieldAccessor {
    accessor!(EntryFilter, query, Value::String, take_string)
}

pub(crate) fn entry_filter_limit_accessor() -> FieldAccessor {
    accessor!(EntryFilter, limit, Value::I32, take_i32)
}

pub(crate) fn entry_filter_offset_accessor() -> FieldAccessor {
    accessor!(EntryFilter, offset, Value::I32, take_i32)
}

pub(crate) fn entry_filter_tags_accessor() -> FieldAccessor {
    accessor!(EntryFilter, tags, string_list_value, take_string_list)
}

pub(crate) fn sample_string0_accessor() -> FieldAccessor {
    accessor!(Sample, string0, Value::String, take_string)
}

pub(crate) fn sample_bool0_accessor() -> FieldAccessor {
    accessor!(Sample, bool0, Value::Bool, take_bool)
}

pub(crate) fn sample_short0_accessor() -> FieldAccessor {
    accessor!(Sample, short0, Value::I16, take_i16)
}

pub(crate) fn album_error_code_accessor() -> FieldAccessor {
    accessor!(AlbumError, code, error_code_value, take_error_code)
}

pub(crate) fn album_error_message_accessor() -> FieldAccessor {
    accessor!(AlbumError, message, Value::String, take_string)
}
