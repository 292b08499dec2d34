//! # REST protocol
//!
//! Maps invocation chains onto transport-neutral HTTP request/response
//! values and back. The transport itself (sockets, servlet equivalents,
//! connection pools) stays outside the crate: a client plugs in a blocking
//! sender function, a server exposes [`RestServerHandler::handle`] as a
//! plain `(&RestRequest) -> RestResponse` entry point.
//!
//! The wire mapping, in short: one path segment per chained method (none
//! for index methods), chaining arguments as positional path segments,
//! remote arguments in the query string (GET) or form body (POST), scalar
//! arguments as line-format tokens and everything else as JSON strings.
//! Results come back as a JSON envelope `{"status": "ok"|"exception",
//! "result": …}` with HTTP 200; protocol failures use bare-text bodies and
//! the status table on [`ProtocolError`](crate::error::ProtocolError).

mod client;
mod protocol;
mod request;
mod server;
pub mod urls;

pub use client::{RestClientHandler, RestSender, rest_client};
pub use protocol::RestProtocol;
pub use request::{JSON_CONTENT_TYPE, RestRequest, RestResponse, TEXT_CONTENT_TYPE};
pub use server::RestServerHandler;
