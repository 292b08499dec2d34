//! Client-side chain capture and server-side chain execution.

use super::{Invocation, InvocationResult, MethodRef};
use crate::descriptors::{InvokeFailure, MethodOutput, TypeHandle, TypeRegistry};
use crate::error::{AppException, CallError, ProtocolError};
use crate::value::Value;
use std::any::Any;
use std::sync::Arc;

/// Executes a remote-terminated invocation chain, however the execution is
/// backed: an HTTP round trip on the client, a direct service call in tests.
pub type InvocationHandler = dyn Fn(&Invocation) -> Result<InvocationResult, ProtocolError>;

/// What a proxy call produced.
pub enum CallOutcome {
    /// A chaining method: keep calling on the returned proxy.
    Proxy(InvocationProxy),
    /// A remote method: the deserialized result value.
    Value(Value),
}

/// Captures method calls against an interface descriptor, building an
/// invocation chain link by link.
///
/// Chaining methods return a new proxy advanced to the method's result
/// interface; remote methods hand the completed chain to the handler. Since
/// only chaining calls yield proxies, a chain can never extend past its
/// remote terminal by construction.
#[derive(Clone)]
pub struct InvocationProxy {
    registry: Arc<TypeRegistry>,
    interface: TypeHandle,
    parent: Option<Arc<Invocation>>,
    handler: Arc<InvocationHandler>,
}

impl InvocationProxy {
    pub fn new(
        registry: Arc<TypeRegistry>,
        interface: TypeHandle,
        handler: Arc<InvocationHandler>,
    ) -> Self {
        Self {
            registry,
            interface,
            parent: None,
            handler,
        }
    }

    pub fn interface(&self) -> TypeHandle {
        self.interface
    }

    /// Captures a call by method name.
    ///
    /// Unknown method names and argument-count mismatches panic: generated
    /// code only produces calls that exist on the descriptor.
    pub fn invoke(&self, name: &str, args: Vec<Value>) -> Result<CallOutcome, CallError> {
        let node = self.registry.node(self.interface);
        let interface = node
            .as_interface()
            .unwrap_or_else(|| panic!("'{}' is not an interface", node.name()));
        let (index, descriptor) = interface
            .find_method(&self.registry, name)
            .unwrap_or_else(|| {
                panic!("interface '{}' has no method '{name}'", interface.name())
            });

        let method = MethodRef {
            interface: self.interface,
            index,
        };
        let invocation = match &self.parent {
            Some(parent) => parent.next(&self.registry, method, args),
            None => Invocation::root(&self.registry, method, args),
        };

        if descriptor.is_remote(&self.registry) {
            let result = (self.handler)(&invocation)?;
            if result.is_ok() {
                Ok(CallOutcome::Value(result.into_data()))
            } else {
                Err(CallError::Application(AppException::new(result.into_data())))
            }
        } else {
            let next = self.registry.resolve(descriptor.result());
            Ok(CallOutcome::Proxy(Self {
                registry: Arc::clone(&self.registry),
                interface: next,
                parent: Some(invocation),
                handler: Arc::clone(&self.handler),
            }))
        }
    }

    /// Convenience for remote calls: unwraps the data outcome.
    ///
    /// Panics if the named method is a chaining method — use
    /// [`invoke`](Self::invoke) for those.
    pub fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, CallError> {
        match self.invoke(name, args)? {
            CallOutcome::Value(value) => Ok(value),
            CallOutcome::Proxy(_) => {
                panic!("method '{name}' is a chaining method, not a remote one")
            }
        }
    }

    /// Convenience for chaining calls: unwraps the next proxy.
    ///
    /// Panics if the named method is remote — use [`invoke`](Self::invoke)
    /// for those.
    pub fn chain(&self, name: &str, args: Vec<Value>) -> Result<InvocationProxy, CallError> {
        match self.invoke(name, args)? {
            CallOutcome::Proxy(proxy) => Ok(proxy),
            CallOutcome::Value(_) => panic!("method '{name}' is remote, not a chaining method"),
        }
    }
}

/// Replays invocation chains against a root service object on the server.
///
/// Each link dispatches through the method's registered invoker function;
/// chaining links thread the returned service objects forward, the remote
/// link produces the [`InvocationResult`]. A declared application exception
/// becomes an `exc` result; any other failure is logged and collapsed into
/// a generic server error that leaks nothing.
pub struct ServiceInvoker {
    registry: Arc<TypeRegistry>,
    root: Box<dyn Any>,
}

impl ServiceInvoker {
    pub fn new(registry: Arc<TypeRegistry>, root: Box<dyn Any>) -> Self {
        Self { registry, root }
    }

    pub fn invoke(&self, invocation: &Invocation) -> Result<InvocationResult, ProtocolError> {
        let chain = invocation.to_chain();
        let last = chain.len() - 1;
        let mut holder: Option<Box<dyn Any>> = None;

        for (position, link) in chain.iter().enumerate() {
            let descriptor = link.method().resolve(&self.registry);
            let invoker = descriptor.invoker().ok_or_else(|| {
                tracing::error!(
                    method = descriptor.name(),
                    "method has no registered invoker"
                );
                ProtocolError::Server("Internal server error".to_string())
            })?;

            let service: &dyn Any = match &holder {
                Some(boxed) => boxed.as_ref(),
                None => self.root.as_ref(),
            };

            match invoker(service, link.args()) {
                Ok(MethodOutput::Service(next)) => {
                    if position == last {
                        return Err(ProtocolError::MethodNotFound(
                            "The last method must be a remote one".to_string(),
                        ));
                    }
                    holder = Some(next);
                }
                Ok(MethodOutput::Data(value)) => {
                    if position != last {
                        return Err(ProtocolError::MethodNotFound(
                            "A remote method cannot be chained from".to_string(),
                        ));
                    }
                    return Ok(InvocationResult::ok(value));
                }
                Err(InvokeFailure::Application(value)) => {
                    return Ok(InvocationResult::exc(value));
                }
                Err(InvokeFailure::Internal(text)) => {
                    tracing::error!(method = descriptor.name(), error = %text, "service failure");
                    return Err(ProtocolError::Server("Internal server error".to_string()));
                }
            }
        }

        Err(ProtocolError::MethodNotFound(
            "The last method must be a remote one".to_string(),
        ))
    }
}
