//! Service traits and the per-method invoker functions a code generator
//! would emit.
//!
//! The invokers are the server-side dispatch table: each one downcasts the
//! opaque service object, converts the dynamic arguments to typed ones,
//! calls the trait method, and converts the outcome back. Declared
//! application exceptions become `InvokeFailure::Application`.

use crate::messages::{AlbumError, EntryFilter};
use typewire_core::descriptors::{InvokeFailure, MethodOutput};
use typewire_core::{Message, Value};
use std::any::Any;

/// The root interface of the album schema.
pub trait AlbumService {
    /// The index method: reachable at the service root path.
    fn status(&self) -> String;

    /// Chaining method: scopes further calls to one album.
    fn entries(&self, album_id: i64) -> Box<dyn EntriesService>;

    fn get(&self, id: Option<i64>) -> Result<Box<dyn Message>, AlbumError>;

    fn search(&self, filter: EntryFilter) -> Result<Vec<Box<dyn Message>>, AlbumError>;

    fn create(&self, entry: Option<Box<dyn Message>>) -> Result<Box<dyn Message>, AlbumError>;
}

/// The chained interface returned by [`AlbumService::entries`].
///
/// `list` declares no exception of its own: a raised [`AlbumError`] rides on
/// the exception type inherited from the chaining `entries` call.
pub trait EntriesService {
    fn list(&self, limit: Option<i32>) -> Result<Vec<Box<dyn Message>>, AlbumError>;

    fn count(&self) -> i32;
}

fn album(service: &dyn Any) -> Result<&dyn AlbumService, InvokeFailure> {
    service
        .downcast_ref::<Box<dyn AlbumService>>()
        .map(|b| b.as_ref())
        .ok_or_else(|| InvokeFailure::Internal("service object is not an AlbumService".to_string()))
}

fn entries(service: &dyn Any) -> Result<&dyn EntriesService, InvokeFailure> {
    service
        .downcast_ref::<Box<dyn EntriesService>>()
        .map(|b| b.as_ref())
        .ok_or_else(|| {
            InvokeFailure::Internal("service object is not an EntriesService".to_string())
        })
}

fn opt_i64(args: &[Value], index: usize) -> Result<Option<i64>, InvokeFailure> {
    match args.get(index) {
        Some(Value::I64(v)) => Ok(Some(*v)),
        Some(Value::Null) | None => Ok(None),
        Some(other) => Err(InvokeFailure::Internal(format!(
            "argument #{index} must be an int64, got {other:?}"
        ))),
    }
}

fn opt_i32(args: &[Value], index: usize) -> Result<Option<i32>, InvokeFailure> {
    match args.get(index) {
        Some(Value::I32(v)) => Ok(Some(*v)),
        Some(Value::Null) | None => Ok(None),
        Some(other) => Err(InvokeFailure::Internal(format!(
            "argument #{index} must be an int32, got {other:?}"
        ))),
    }
}

fn req_i64(args: &[Value], index: usize) -> Result<i64, InvokeFailure> {
    opt_i64(args, index)?.ok_or_else(|| {
        InvokeFailure::Internal(format!("argument #{index} is required but was null"))
    })
}

fn entry_list(entries: Vec<Box<dyn Message>>) -> Value {
    Value::List(entries.into_iter().map(Value::Message).collect())
}

pub(crate) fn invoke_album_status(
    service: &dyn Any,
    _args: &[Value],
) -> Result<MethodOutput, InvokeFailure> {
    let service = album(service)?;
    Ok(MethodOutput::Data(Value::String(service.status())))
}

pub(crate) fn invoke_album_entries(
    service: &dyn Any,
    args: &[Value],
) -> Result<MethodOutput, InvokeFailure> {
    let service = album(service)?;
    let album_id = req_i64(args, 0)?;
    Ok(MethodOutput::Service(Box::new(service.entries(album_id))))
}

pub(crate) fn invoke_album_get(
    service: &dyn Any,
    args: &[Value],
) -> Result<MethodOutput, InvokeFailure> {
    let service = album(service)?;
    match service.get(opt_i64(args, 0)?) {
        Ok(entry) => Ok(MethodOutput::Data(Value::Message(entry))),
        Err(error) => Err(InvokeFailure::Application(Value::message(error))),
    }
}

pub(crate) fn invoke_album_search(
    service: &dyn Any,
    args: &[Value],
) -> Result<MethodOutput, InvokeFailure> {
    let service = album(service)?;
    let filter = match args.first() {
        Some(Value::Message(message)) => message
            .as_any()
            .downcast_ref::<EntryFilter>()
            .cloned()
            .ok_or_else(|| {
                InvokeFailure::Internal("argument #0 must be an EntryFilter".to_string())
            })?,
        other => {
            return Err(InvokeFailure::Internal(format!(
                "argument #0 must be an EntryFilter message, got {other:?}"
            )));
        }
    };

    match service.search(filter) {
        Ok(entries) => Ok(MethodOutput::Data(entry_list(entries))),
        Err(error) => Err(InvokeFailure::Application(Value::message(error))),
    }
}

pub(crate) fn invoke_album_create(
    service: &dyn Any,
    args: &[Value],
) -> Result<MethodOutput, InvokeFailure> {
    let service = album(service)?;
    let entry = match args.first() {
        Some(Value::Message(message)) => Some(message.clone()),
        Some(Value::Null) | None => None,
        Some(other) => {
            return Err(InvokeFailure::Internal(format!(
                "argument #0 must be an entry message, got {other:?}"
            )));
        }
    };

    match service.create(entry) {
        Ok(created) => Ok(MethodOutput::Data(Value::Message(created))),
        Err(error) => Err(InvokeFailure::Application(Value::message(error))),
    }
}

pub(crate) fn invoke_entries_list(
    service: &dyn Any,
    args: &[Value],
) -> Result<MethodOutput, InvokeFailure> {
    let service = entries(service)?;
    match service.list(opt_i32(args, 0)?) {
        Ok(items) => Ok(MethodOutput::Data(entry_list(items))),
        Err(error) => Err(InvokeFailure::Application(Value::message(error))),
    }
}

pub(crate) fn invoke_entries_count(
    service: &dyn Any,
    _args: &[Value],
) -> Result<MethodOutput, InvokeFailure> {
    let service = entries(service)?;
    Ok(MethodOutput::Data(Value::I32(service.count())))
}
