//! # Error taxonomy
//!
//! Recoverable failures are split into three families:
//!
//! * [`FormatError`]: malformed wire data (bad JSON, unbalanced line-format
//!   braces, unknown enum values, numeric overflow). Always recoverable by
//!   rejecting the offending request or document.
//! * [`ProtocolError`]: REST-level failures with a defined HTTP status
//!   mapping, raised on the server while decoding a request and on the
//!   client when a non-200 response comes back.
//! * [`LinkError`]: an inconsistent descriptor graph detected by
//!   [`TypeRegistry::link`](crate::descriptors::TypeRegistry::link).
//!
//! Usage errors (wrong argument count, wrong parameterization arity) are
//! caller bugs, not data errors: those panic with a descriptive message
//! instead of returning a `Result`.
//!
//! Declared application exceptions are *data*, not errors: they travel as an
//! [`AppException`] payload inside [`CallError::Application`] and serialize
//! through the normal response envelope.

use crate::descriptors::{TypeHandle, TypeKind};
use crate::value::Value;
use http::StatusCode;

/// Malformed wire data in any of the three serialization formats.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed input: {0}")]
    Malformed(String),
    #[error("enum '{enum_name}' has no value '{value}'")]
    UnknownEnumValue { enum_name: String, value: String },
    #[error("value {value} does not fit into {target}")]
    Overflow { value: i64, target: &'static str },
    #[error("expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("{kind:?} values are not supported by the {format} format")]
    Unsupported {
        kind: TypeKind,
        format: &'static str,
    },
}

impl FormatError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        FormatError::Malformed(message.into())
    }

    pub(crate) fn mismatch(expected: &'static str, found: &Value) -> Self {
        FormatError::TypeMismatch {
            expected,
            found: found.kind_name().to_string(),
        }
    }
}

/// REST protocol failures, each with a fixed HTTP status code.
///
/// `Display` renders the bare message so it can be used directly as a
/// plain-text error response body.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Malformed arguments or an otherwise unprocessable request (400).
    #[error("{0}")]
    Client(String),
    /// No method matches the request path (404).
    #[error("{0}")]
    MethodNotFound(String),
    /// The method requires POST but another verb was used (405).
    #[error("{0}")]
    MethodNotAllowed(String),
    /// The remote endpoint cannot be reached (502/503).
    #[error("{0}")]
    ServiceUnavailable(String),
    /// Any unexpected server-side failure (500).
    #[error("{0}")]
    Server(String),
}

impl ProtocolError {
    /// The HTTP status code this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ProtocolError::Client(_) => StatusCode::BAD_REQUEST,
            ProtocolError::MethodNotFound(_) => StatusCode::NOT_FOUND,
            ProtocolError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ProtocolError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProtocolError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps an HTTP status code from a failed response back into an error.
    ///
    /// Unrecognized statuses collapse into [`ProtocolError::Server`].
    pub fn from_status(status: StatusCode, text: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => ProtocolError::Client(text),
            StatusCode::NOT_FOUND => ProtocolError::MethodNotFound(text),
            StatusCode::METHOD_NOT_ALLOWED => ProtocolError::MethodNotAllowed(text),
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
                ProtocolError::ServiceUnavailable(text)
            }
            StatusCode::INTERNAL_SERVER_ERROR => ProtocolError::Server(text),
            other => ProtocolError::Server(format!("server error, status={other}, text={text}")),
        }
    }
}

/// An inconsistency found while linking a [`TypeRegistry`](crate::descriptors::TypeRegistry).
#[derive(thiserror::Error, Debug)]
pub enum LinkError {
    #[error("type handle #{0} is declared but never defined")]
    UndefinedType(u32),
    #[error("'{message}': base has the wrong kind, found {found:?}")]
    InvalidBase { message: String, found: TypeKind },
    #[error("message '{message}': field '{field}' has non-data kind {found:?}")]
    InvalidFieldType {
        message: String,
        field: String,
        found: TypeKind,
    },
    #[error("message '{message}': discriminator field '{field}' must be enum-typed")]
    InvalidDiscriminator { message: String, field: String },
    #[error("message '{message}' has a subtype map but no discriminator field")]
    MissingDiscriminator { message: String },
    #[error("message '{message}': subtype '{value}' must map to a message, found {found:?}")]
    InvalidSubtype {
        message: String,
        value: String,
        found: TypeKind,
    },
    #[error("message '{message}': exactly one subtype entry must map to the message itself")]
    MissingSelfSubtype { message: String },
    #[error("interface '{interface}': method '{method}' declares a non-exception type {found:?}")]
    InvalidException {
        interface: String,
        method: String,
        found: TypeKind,
    },
    #[error("interface '{interface}' declares more than one index method")]
    DuplicateIndexMethod { interface: String },
}

/// A declared application exception raised by a remote method.
///
/// The payload is the deserialized exception message instance; its concrete
/// type handle is carried by the instance itself.
#[derive(Debug, Clone, PartialEq)]
pub struct AppException {
    pub value: Value,
}

impl AppException {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// The concrete descriptor of the exception instance, when it is one.
    pub fn descriptor(&self) -> Option<TypeHandle> {
        match &self.value {
            Value::Message(message) => Some(message.descriptor()),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "application exception: {:?}", self.value)
    }
}

impl std::error::Error for AppException {}

/// The client-facing failure of a remote invocation.
#[derive(thiserror::Error, Debug)]
pub enum CallError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Application(#[from] AppException),
}
