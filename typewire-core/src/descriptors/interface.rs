//! Interface descriptors: methods, arguments and the server-side dispatch
//! table.
//!
//! Java-style runtime reflection is replaced by an explicit invoker function
//! per method, registered at descriptor construction time: the generated
//! code downcasts the opaque service object, converts [`Value`] arguments to
//! typed ones, calls the trait method, and converts the result back.

use super::{TypeKind, TypeRef};
use crate::descriptors::TypeRegistry;
use crate::value::Value;
use std::any::Any;
use std::collections::HashMap;
use std::sync::OnceLock;

/// What a single method application produced on the server.
pub enum MethodOutput {
    /// A chaining method returned the next service object.
    Service(Box<dyn Any>),
    /// A remote method returned data (or void, as [`Value::Null`]).
    Data(Value),
}

/// Why a single method application failed on the server.
pub enum InvokeFailure {
    /// The method raised its declared application exception; the payload is
    /// the exception message instance.
    Application(Value),
    /// Any other failure. The text is logged server-side and never sent to
    /// the client.
    Internal(String),
}

/// The generated dispatch entry for one method.
pub type MethodInvoker = fn(&dyn Any, &[Value]) -> Result<MethodOutput, InvokeFailure>;

/// A single method argument.
#[derive(Clone, Debug)]
pub struct ArgDescriptor {
    name: String,
    ty: TypeRef,
}

impl ArgDescriptor {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> TypeRef {
        self.ty
    }
}

/// An interface method.
#[derive(Clone, Debug)]
pub struct MethodDescriptor {
    name: String,
    args: Vec<ArgDescriptor>,
    result: TypeRef,
    exc: Option<TypeRef>,
    is_index: bool,
    is_post: bool,
    invoker: Option<MethodInvoker>,
}

impl MethodDescriptor {
    pub fn builder(name: impl Into<String>) -> MethodBuilder {
        MethodBuilder {
            descriptor: MethodDescriptor {
                name: name.into(),
                args: Vec::new(),
                result: TypeRef::Concrete(TypeRegistry::VOID),
                exc: None,
                is_index: false,
                is_post: false,
                invoker: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[ArgDescriptor] {
        &self.args
    }

    pub fn result(&self) -> TypeRef {
        self.result
    }

    /// The declared application exception type, if any.
    pub fn exc(&self) -> Option<TypeRef> {
        self.exc
    }

    /// Index methods are reachable at the interface's root path and
    /// contribute no path segment of their own.
    pub fn is_index(&self) -> bool {
        self.is_index
    }

    /// POST methods carry their arguments in a form-encoded body.
    pub fn is_post(&self) -> bool {
        self.is_post
    }

    /// A method is remote when its result is data rather than another
    /// interface; a remote method terminates an invocation chain.
    pub fn is_remote(&self, registry: &TypeRegistry) -> bool {
        let handle = registry.resolve(self.result);
        registry.node(handle).kind() != TypeKind::Interface
    }

    pub fn invoker(&self) -> Option<MethodInvoker> {
        self.invoker
    }

    pub(crate) fn substituted(&self, registry: &TypeRegistry, args: &[TypeRef]) -> Self {
        Self {
            name: self.name.clone(),
            args: self
                .args
                .iter()
                .map(|a| ArgDescriptor {
                    name: a.name.clone(),
                    ty: registry.substitute(a.ty, args),
                })
                .collect(),
            result: registry.substitute(self.result, args),
            exc: self.exc.map(|e| registry.substitute(e, args)),
            is_index: self.is_index,
            is_post: self.is_post,
            invoker: self.invoker,
        }
    }
}

/// Fluent construction of a [`MethodDescriptor`], used by generated code.
pub struct MethodBuilder {
    descriptor: MethodDescriptor,
}

impl MethodBuilder {
    pub fn arg(mut self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.descriptor.args.push(ArgDescriptor::new(name, ty));
        self
    }

    pub fn result(mut self, ty: impl Into<TypeRef>) -> Self {
        self.descriptor.result = ty.into();
        self
    }

    pub fn exc(mut self, ty: impl Into<TypeRef>) -> Self {
        self.descriptor.exc = Some(ty.into());
        self
    }

    pub fn index(mut self) -> Self {
        self.descriptor.is_index = true;
        self
    }

    pub fn post(mut self) -> Self {
        self.descriptor.is_post = true;
        self
    }

    pub fn invoker(mut self, invoker: MethodInvoker) -> Self {
        self.descriptor.invoker = Some(invoker);
        self
    }

    pub fn build(self) -> MethodDescriptor {
        self.descriptor
    }
}

/// A service interface descriptor.
#[derive(Debug)]
pub struct InterfaceDescriptor {
    name: String,
    bases: Vec<TypeRef>,
    declared_methods: Vec<MethodDescriptor>,
    variables: Vec<String>,
    methods: OnceLock<Vec<MethodDescriptor>>,
    method_index: OnceLock<HashMap<String, usize>>,
}

impl InterfaceDescriptor {
    pub fn builder(name: impl Into<String>) -> InterfaceBuilder {
        InterfaceBuilder {
            descriptor: InterfaceDescriptor {
                name: name.into(),
                bases: Vec::new(),
                declared_methods: Vec::new(),
                variables: Vec::new(),
                methods: OnceLock::new(),
                method_index: OnceLock::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bases(&self) -> &[TypeRef] {
        &self.bases
    }

    pub fn declared_methods(&self) -> &[MethodDescriptor] {
        &self.declared_methods
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// The linearized method list: base methods, then declared methods, a
    /// declared method shadowing a base method of the same name in place.
    pub fn methods(&self, registry: &TypeRegistry) -> &[MethodDescriptor] {
        self.methods.get_or_init(|| {
            let mut methods: Vec<MethodDescriptor> = Vec::new();
            for base in &self.bases {
                let handle = registry.resolve(*base);
                let node = registry.node(handle);
                let base = node
                    .as_interface()
                    .unwrap_or_else(|| panic!("base of '{}' is not an interface", self.name));
                for method in base.methods(registry) {
                    match methods.iter().position(|m| m.name() == method.name()) {
                        Some(position) => methods[position] = method.clone(),
                        None => methods.push(method.clone()),
                    }
                }
            }
            for method in &self.declared_methods {
                match methods.iter().position(|m| m.name() == method.name()) {
                    Some(position) => methods[position] = method.clone(),
                    None => methods.push(method.clone()),
                }
            }
            methods
        })
    }

    /// O(1) method lookup by exact name over the linearized list.
    pub fn find_method(
        &self,
        registry: &TypeRegistry,
        name: &str,
    ) -> Option<(usize, &MethodDescriptor)> {
        let methods = self.methods(registry);
        let index = self.method_index.get_or_init(|| {
            methods
                .iter()
                .enumerate()
                .map(|(i, m)| (m.name().to_string(), i))
                .collect()
        });
        index.get(name).map(|&i| (i, &methods[i]))
    }

    /// The designated index method, if one is declared.
    pub fn index_method(&self, registry: &TypeRegistry) -> Option<(usize, &MethodDescriptor)> {
        self.methods(registry)
            .iter()
            .enumerate()
            .find(|(_, m)| m.is_index())
    }

    pub(crate) fn instantiate(
        &self,
        registry: &TypeRegistry,
        args: &[TypeRef],
    ) -> InterfaceDescriptor {
        InterfaceDescriptor {
            name: self.name.clone(),
            bases: self
                .bases
                .iter()
                .map(|b| registry.substitute(*b, args))
                .collect(),
            declared_methods: self
                .declared_methods
                .iter()
                .map(|m| m.substituted(registry, args))
                .collect(),
            variables: Vec::new(),
            methods: OnceLock::new(),
            method_index: OnceLock::new(),
        }
    }
}

/// Fluent construction of an [`InterfaceDescriptor`], used by generated code.
pub struct InterfaceBuilder {
    descriptor: InterfaceDescriptor,
}

impl InterfaceBuilder {
    pub fn base(mut self, base: impl Into<TypeRef>) -> Self {
        self.descriptor.bases.push(base.into());
        self
    }

    pub fn variable(mut self, name: impl Into<String>) -> Self {
        self.descriptor.variables.push(name.into());
        self
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.descriptor.declared_methods.push(method);
        self
    }

    pub fn build(self) -> super::TypeNode {
        super::TypeNode::new(super::NodeBody::Interface(self.descriptor))
    }
}
