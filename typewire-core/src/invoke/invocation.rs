//! The invocation chain: one captured method call per link.

use crate::descriptors::{MethodDescriptor, TypeHandle, TypeRef, TypeRegistry};
use crate::value::Value;
use std::sync::Arc;

/// Identifies a method as its interface handle plus the position in the
/// interface's linearized method list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MethodRef {
    pub interface: TypeHandle,
    pub index: usize,
}

impl MethodRef {
    /// Clones the method descriptor out of the registry.
    pub fn resolve(&self, registry: &TypeRegistry) -> MethodDescriptor {
        let node = registry.node(self.interface);
        let interface = node
            .as_interface()
            .unwrap_or_else(|| panic!("'{}' is not an interface", node.name()));
        interface.methods(registry)[self.index].clone()
    }
}

/// One captured method call, linked to the call it was chained from.
///
/// Immutable once created; the links share ownership through `Arc` so a
/// proxy can keep extending a chain without copying it.
#[derive(Clone, Debug)]
pub struct Invocation {
    method: MethodRef,
    args: Vec<Value>,
    parent: Option<Arc<Invocation>>,
}

impl Invocation {
    /// Starts a chain. Panics when the argument count does not match the
    /// method declaration — that is a caller bug, not wire data.
    pub fn root(registry: &TypeRegistry, method: MethodRef, args: Vec<Value>) -> Arc<Self> {
        Self::link(registry, method, args, None)
    }

    /// Extends the chain with another call.
    pub fn next(
        self: &Arc<Self>,
        registry: &TypeRegistry,
        method: MethodRef,
        args: Vec<Value>,
    ) -> Arc<Self> {
        Self::link(registry, method, args, Some(Arc::clone(self)))
    }

    fn link(
        registry: &TypeRegistry,
        method: MethodRef,
        args: Vec<Value>,
        parent: Option<Arc<Invocation>>,
    ) -> Arc<Self> {
        let descriptor = method.resolve(registry);
        assert_eq!(
            args.len(),
            descriptor.args().len(),
            "wrong number of arguments for method '{}': expected {}, got {}",
            descriptor.name(),
            descriptor.args().len(),
            args.len()
        );

        Arc::new(Self {
            method,
            args,
            parent,
        })
    }

    pub fn method(&self) -> MethodRef {
        self.method
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn parent(&self) -> Option<&Arc<Invocation>> {
        self.parent.as_ref()
    }

    /// The chain in root-first order.
    pub fn to_chain(&self) -> Vec<&Invocation> {
        let mut chain = match &self.parent {
            Some(parent) => parent.to_chain(),
            None => Vec::new(),
        };
        chain.push(self);
        chain
    }

    /// The result type of this link's method.
    pub fn result(&self, registry: &TypeRegistry) -> TypeRef {
        self.method.resolve(registry).result()
    }

    /// Whether this link terminates the chain with a data result.
    pub fn is_remote(&self, registry: &TypeRegistry) -> bool {
        self.method.resolve(registry).is_remote(registry)
    }

    /// The declared exception type of this link's method, falling back to
    /// the nearest ancestor's declaration when the method has none.
    pub fn exc(&self, registry: &TypeRegistry) -> Option<TypeRef> {
        match self.method.resolve(registry).exc() {
            Some(exc) => Some(exc),
            None => self.parent.as_ref().and_then(|p| p.exc(registry)),
        }
    }
}

/// The outcome of executing an invocation chain: either the remote method's
/// return value, or an instance of its declared application exception.
#[derive(Clone, Debug, PartialEq)]
pub struct InvocationResult {
    ok: bool,
    data: Value,
}

impl InvocationResult {
    pub fn ok(data: Value) -> Self {
        Self { ok: true, data }
    }

    pub fn exc(data: Value) -> Self {
        Self { ok: false, data }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }
}
