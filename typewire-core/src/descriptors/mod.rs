//! # Descriptor model
//!
//! Runtime metadata describing data types and service interfaces. The model
//! is a graph of [`TypeNode`]s owned by a [`TypeRegistry`] arena and
//! addressed by stable [`TypeHandle`]s, which is what makes self-referential
//! schemas (a message whose base lists it as a subtype, an interface method
//! returning its own interface) constructible without recursive ownership:
//! a handle can be declared first and defined later.
//!
//! Everything a descriptor points at is a [`TypeRef`] — either a concrete
//! handle or a positional type variable of a generic declaration. Binding
//! variables goes through [`TypeRegistry::parameterize`], which memoizes
//! instantiations so repeated requests return the identical handle.
//!
//! The registry is an explicit value: construct one per process (or per
//! test) and pass it by reference. There is no global descriptor pool.

mod interface;
mod message;
mod polymorphism;
mod registry;

pub use interface::{
    ArgDescriptor, InterfaceBuilder, InterfaceDescriptor, InvokeFailure, MethodBuilder,
    MethodDescriptor, MethodInvoker, MethodOutput,
};
pub use message::{FieldAccessor, FieldDescriptor, MessageBuilder, MessageDescriptor};
pub use polymorphism::resolve_subtype;
pub use registry::TypeRegistry;

/// The closed set of type kinds. Every descriptor is one of these, fixed at
/// construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Bool,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    String,
    Void,
    Object,
    List,
    Set,
    Map,
    Enum,
    Message,
    Exception,
    Interface,
}

impl TypeKind {
    /// Whether values of this kind can be rendered as a single line-format
    /// token or nested message, making them usable as map keys.
    pub fn is_string_coercible(self) -> bool {
        matches!(
            self,
            TypeKind::Bool
                | TypeKind::Int16
                | TypeKind::Int32
                | TypeKind::Int64
                | TypeKind::Float
                | TypeKind::Double
                | TypeKind::String
                | TypeKind::Enum
                | TypeKind::Message
                | TypeKind::Exception
        )
    }
}

/// A stable index into a [`TypeRegistry`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeHandle(pub(crate) u32);

impl TypeHandle {
    /// The raw arena index, mainly useful in diagnostics.
    pub fn index(self) -> u32 {
        self.0
    }
}

/// A reference to a type: a concrete handle, or a positional variable of the
/// enclosing generic declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Concrete(TypeHandle),
    Variable(u32),
}

impl From<TypeHandle> for TypeRef {
    fn from(handle: TypeHandle) -> Self {
        TypeRef::Concrete(handle)
    }
}

/// One node of the descriptor graph.
#[derive(Debug)]
pub struct TypeNode {
    body: NodeBody,
    /// `(raw, args)` when this node was produced by `parameterize`.
    origin: Option<(TypeHandle, Vec<TypeRef>)>,
    free_variables: bool,
}

#[derive(Debug)]
pub(crate) enum NodeBody {
    Primitive(TypeKind),
    Enum(EnumDescriptor),
    List(ListDescriptor),
    Set(SetDescriptor),
    Map(MapDescriptor),
    Message(MessageDescriptor),
    Interface(InterfaceDescriptor),
}

impl TypeNode {
    pub(crate) fn new(body: NodeBody) -> Self {
        let free_variables = body.declares_variables();
        Self {
            body,
            origin: None,
            free_variables,
        }
    }

    pub(crate) fn instance(
        body: NodeBody,
        origin: (TypeHandle, Vec<TypeRef>),
        free_variables: bool,
    ) -> Self {
        Self {
            body,
            origin: Some(origin),
            free_variables,
        }
    }

    pub(crate) fn body(&self) -> &NodeBody {
        &self.body
    }

    pub(crate) fn origin(&self) -> Option<(TypeHandle, &[TypeRef])> {
        self.origin.as_ref().map(|(raw, args)| (*raw, args.as_slice()))
    }

    /// True when the node still contains unbound type variables and cannot
    /// describe data on its own.
    pub fn has_free_variables(&self) -> bool {
        self.free_variables
    }

    pub fn kind(&self) -> TypeKind {
        match &self.body {
            NodeBody::Primitive(kind) => *kind,
            NodeBody::Enum(_) => TypeKind::Enum,
            NodeBody::List(_) => TypeKind::List,
            NodeBody::Set(_) => TypeKind::Set,
            NodeBody::Map(_) => TypeKind::Map,
            NodeBody::Message(message) => message.kind(),
            NodeBody::Interface(_) => TypeKind::Interface,
        }
    }

    /// A human-readable name for diagnostics.
    pub fn name(&self) -> &str {
        match &self.body {
            NodeBody::Primitive(TypeKind::Bool) => "bool",
            NodeBody::Primitive(TypeKind::Int16) => "int16",
            NodeBody::Primitive(TypeKind::Int32) => "int32",
            NodeBody::Primitive(TypeKind::Int64) => "int64",
            NodeBody::Primitive(TypeKind::Float) => "float",
            NodeBody::Primitive(TypeKind::Double) => "double",
            NodeBody::Primitive(TypeKind::String) => "string",
            NodeBody::Primitive(TypeKind::Void) => "void",
            NodeBody::Primitive(TypeKind::Object) => "object",
            NodeBody::Primitive(_) => "primitive",
            NodeBody::Enum(e) => e.name(),
            NodeBody::List(_) => "list",
            NodeBody::Set(_) => "set",
            NodeBody::Map(_) => "map",
            NodeBody::Message(m) => m.name(),
            NodeBody::Interface(i) => i.name(),
        }
    }

    /// The number of type variables `parameterize` must bind.
    pub fn variable_count(&self) -> usize {
        self.body.variable_count()
    }

    pub fn as_enum(&self) -> Option<&EnumDescriptor> {
        match &self.body {
            NodeBody::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListDescriptor> {
        match &self.body {
            NodeBody::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&SetDescriptor> {
        match &self.body {
            NodeBody::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapDescriptor> {
        match &self.body {
            NodeBody::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&MessageDescriptor> {
        match &self.body {
            NodeBody::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceDescriptor> {
        match &self.body {
            NodeBody::Interface(i) => Some(i),
            _ => None,
        }
    }
}

impl NodeBody {
    fn declares_variables(&self) -> bool {
        self.variable_count() > 0
    }

    fn variable_count(&self) -> usize {
        fn var(r: &TypeRef) -> usize {
            matches!(r, TypeRef::Variable(_)) as usize
        }

        match self {
            NodeBody::Primitive(_) | NodeBody::Enum(_) => 0,
            NodeBody::List(l) => var(&l.element),
            NodeBody::Set(s) => var(&s.element),
            NodeBody::Map(m) => var(&m.key) + var(&m.value),
            NodeBody::Message(m) => m.variables().len(),
            NodeBody::Interface(i) => i.variables().len(),
        }
    }
}

/// An enumeration of named values.
///
/// Values are stored in declaration order, canonicalized to lowercase;
/// lookups are case-insensitive and the wire form is always the lowercase
/// name.
#[derive(Debug)]
pub struct EnumDescriptor {
    name: String,
    values: Vec<String>,
}

impl EnumDescriptor {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            values: values
                .into_iter()
                .map(|v| v.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Case-insensitive lookup, returning the canonical lowercase name.
    pub fn find(&self, token: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.eq_ignore_ascii_case(token))
            .map(String::as_str)
    }
}

#[derive(Debug)]
pub struct ListDescriptor {
    element: TypeRef,
}

impl ListDescriptor {
    pub(crate) fn new(element: TypeRef) -> Self {
        Self { element }
    }

    pub fn element(&self) -> TypeRef {
        self.element
    }
}

#[derive(Debug)]
pub struct SetDescriptor {
    element: TypeRef,
}

impl SetDescriptor {
    pub(crate) fn new(element: TypeRef) -> Self {
        Self { element }
    }

    pub fn element(&self) -> TypeRef {
        self.element
    }
}

#[derive(Debug)]
pub struct MapDescriptor {
    key: TypeRef,
    value: TypeRef,
}

impl MapDescriptor {
    pub(crate) fn new(key: TypeRef, value: TypeRef) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> TypeRef {
        self.key
    }

    pub fn value(&self) -> TypeRef {
        self.value
    }
}
