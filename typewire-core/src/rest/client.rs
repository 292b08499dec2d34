//! The client-side REST handler: invocation in, typed result out.

use super::protocol::RestProtocol;
use super::request::{RestRequest, RestResponse};
use crate::descriptors::{TypeHandle, TypeRegistry};
use crate::error::ProtocolError;
use crate::invoke::{Invocation, InvocationProxy, InvocationResult};
use std::sync::Arc;

/// The blocking transport boundary: sends a request, returns a response.
/// Connection management, timeouts and cancellation live behind it.
pub type RestSender = dyn Fn(RestRequest) -> Result<RestResponse, ProtocolError>;

/// Executes invocation chains over an injected sender.
///
/// A 200 JSON response is decoded through the envelope; anything else maps
/// back from its status code into the corresponding [`ProtocolError`].
pub struct RestClientHandler {
    protocol: RestProtocol,
    sender: Box<RestSender>,
}

impl RestClientHandler {
    pub fn new(registry: Arc<TypeRegistry>, sender: Box<RestSender>) -> Self {
        Self {
            protocol: RestProtocol::new(registry),
            sender,
        }
    }

    pub fn invoke(&self, invocation: &Invocation) -> Result<InvocationResult, ProtocolError> {
        let request = self
            .protocol
            .write_request(invocation)
            .map_err(|e| ProtocolError::Client(format!("Failed to serialize invocation: {e}")))?;

        let response = (self.sender)(request)?;

        if response.has_ok_status() && response.has_json_content_type() {
            self.protocol.read_response(invocation, &response)
        } else {
            Err(error_from_response(&response))
        }
    }

    /// Wraps this handler into a proxy for the given interface, yielding the
    /// client-side service handle.
    pub fn into_proxy(self, interface: TypeHandle) -> InvocationProxy {
        let registry = Arc::clone(self.protocol.registry());
        InvocationProxy::new(
            registry,
            interface,
            Arc::new(move |invocation| self.invoke(invocation)),
        )
    }
}

/// Builds a client proxy for an interface over a sender function.
pub fn rest_client(
    registry: Arc<TypeRegistry>,
    interface: TypeHandle,
    sender: Box<RestSender>,
) -> InvocationProxy {
    RestClientHandler::new(registry, sender).into_proxy(interface)
}

fn error_from_response(response: &RestResponse) -> ProtocolError {
    let mut text = response.content().to_string();
    // Bounded so the text can live inside an error message.
    if text.len() > 255 {
        let mut end = 255;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    ProtocolError::from_status(response.status(), text)
}
