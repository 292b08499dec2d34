//! # Typewire Core
//!
//! `typewire-core` is a schema-driven data-interchange and RPC runtime: a
//! descriptor model describing data types and service interfaces, three
//! serialization formats sharing one descriptor traversal, and a REST
//! protocol codec that turns chained method calls into HTTP requests and
//! back into typed results or typed application exceptions.
//!
//! ## Key components
//!
//! * **[`TypeRegistry`]:** The descriptor arena. Schemas register messages,
//!   enums and interfaces into it, [`link`](descriptors::TypeRegistry::link)
//!   validates the graph, and generic types bind their variables through
//!   [`parameterize`](descriptors::TypeRegistry::parameterize).
//! * **[`Value`] & [`Message`]:** The dynamic data values the runtime moves
//!   around, and the trait generated message structs implement to expose
//!   their fields to it.
//! * **[`formats`]:** `native`, `json` and `line` — one traversal over the
//!   descriptor tree per wire shape.
//! * **[`invoke`]:** Invocation chains, the client-side capture proxy and
//!   the server-side dispatcher.
//! * **[`rest`]:** The protocol codec plus the thin client/server handlers
//!   around it. Transports plug in as plain functions; no HTTP stack is
//!   included.
//!
//! ## Generated code boundary
//!
//! The crate consumes from generated code only an instance constructor and
//! four accessor functions per field, registered on the descriptors at
//! schema construction time. The `album-service` fixture crate in this
//! workspace shows the full pattern by hand.

pub mod descriptors;
pub mod error;
pub mod formats;
pub mod invoke;
pub mod rest;
pub mod value;

// The types nearly every consumer touches.
pub use descriptors::{TypeHandle, TypeKind, TypeRef, TypeRegistry};
pub use error::{AppException, CallError, FormatError, LinkError, ProtocolError};
pub use value::{Message, Value};
