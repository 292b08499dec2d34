//! The server-side REST handler: request in, response out.

use super::protocol::RestProtocol;
use super::request::{RestRequest, RestResponse};
use crate::descriptors::{TypeHandle, TypeRegistry};
use crate::error::ProtocolError;
use crate::invoke::{Invocation, InvocationResult, ServiceInvoker};
use std::any::Any;
use std::sync::Arc;

/// Turns REST requests into invocations, executes them, and renders the
/// outcome.
///
/// Success and declared application exceptions both produce HTTP 200 with
/// the JSON envelope; protocol failures produce their mapped status with a
/// short plain-text body. Unexpected failures never leak details — the body
/// is always the generic `Internal server error`.
pub struct RestServerHandler {
    protocol: RestProtocol,
    interface: TypeHandle,
    invoker: Box<dyn Fn(&Invocation) -> Result<InvocationResult, ProtocolError>>,
}

impl RestServerHandler {
    pub fn new(
        registry: Arc<TypeRegistry>,
        interface: TypeHandle,
        invoker: Box<dyn Fn(&Invocation) -> Result<InvocationResult, ProtocolError>>,
    ) -> Self {
        Self {
            protocol: RestProtocol::new(registry),
            interface,
            invoker,
        }
    }

    /// Serves a root service object through a [`ServiceInvoker`].
    pub fn with_service(
        registry: Arc<TypeRegistry>,
        interface: TypeHandle,
        service: Box<dyn Any>,
    ) -> Self {
        let invoker = ServiceInvoker::new(Arc::clone(&registry), service);
        Self::new(
            registry,
            interface,
            Box::new(move |invocation| invoker.invoke(invocation)),
        )
    }

    /// The `(&RestRequest) -> RestResponse` entry point handed to transport
    /// code.
    pub fn handle(&self, request: &RestRequest) -> RestResponse {
        let invocation = match self.protocol.read_request(self.interface, request) {
            Ok(invocation) => invocation,
            Err(error) => {
                tracing::debug!(path = request.path(), %error, "failed to parse request");
                return error_response(&error);
            }
        };

        let result = match (self.invoker)(&invocation) {
            Ok(result) => result,
            Err(error) => return error_response(&error),
        };

        match self.protocol.write_ok_response(&invocation, &result) {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(%error, "failed to serialize result");
                error_response(&ProtocolError::Server("Internal server error".to_string()))
            }
        }
    }
}

fn error_response(error: &ProtocolError) -> RestResponse {
    let body = match error {
        // Whatever a server error carries internally, the client sees only
        // the generic text.
        ProtocolError::Server(_) => "Internal server error".to_string(),
        other => other.to_string(),
    };
    RestResponse::error(error.status(), body)
}
