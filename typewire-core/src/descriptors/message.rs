//! Message descriptors: fields, accessors, inheritance and subtype maps.

use super::{NodeBody, TypeKind, TypeRef};
use crate::descriptors::TypeRegistry;
use crate::value::{Message, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

/// The accessor capability generated code binds to each field: plain `fn`s
/// that downcast the dynamic message to its concrete struct.
///
/// `get` returns `None` for an unset field; presence is structural, there is
/// no side bitmap. `set` may panic if handed a value of the wrong variant —
/// the serialization engine only ever feeds it values parsed against the
/// field's own descriptor.
#[derive(Clone, Copy)]
pub struct FieldAccessor {
    pub get: fn(&dyn Message) -> Option<Value>,
    pub set: fn(&mut dyn Message, Value),
    pub is_set: fn(&dyn Message) -> bool,
    pub clear: fn(&mut dyn Message),
}

impl std::fmt::Debug for FieldAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldAccessor")
    }
}

/// The instance constructor generated code registers for a message type.
///
/// A closure rather than a plain `fn` so it can capture the message's own
/// type handle: constructed instances report their concrete descriptor
/// without any global registry.
#[derive(Clone)]
pub(crate) struct Constructor(std::sync::Arc<dyn Fn() -> Box<dyn Message> + Send + Sync>);

impl std::fmt::Debug for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Constructor")
    }
}

/// A single field of a message descriptor.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    name: String,
    ty: TypeRef,
    is_discriminator: bool,
    accessor: FieldAccessor,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>, accessor: FieldAccessor) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            is_discriminator: false,
            accessor,
        }
    }

    /// Marks this field as the polymorphic discriminator of its message.
    pub fn discriminator(mut self) -> Self {
        self.is_discriminator = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> TypeRef {
        self.ty
    }

    pub fn is_discriminator(&self) -> bool {
        self.is_discriminator
    }

    pub fn get(&self, message: &dyn Message) -> Option<Value> {
        (self.accessor.get)(message)
    }

    pub fn set(&self, message: &mut dyn Message, value: Value) {
        (self.accessor.set)(message, value)
    }

    pub fn is_set(&self, message: &dyn Message) -> bool {
        (self.accessor.is_set)(message)
    }

    pub fn clear(&self, message: &mut dyn Message) {
        (self.accessor.clear)(message)
    }

    pub(crate) fn substituted(&self, ty: TypeRef) -> Self {
        Self {
            name: self.name.clone(),
            ty,
            is_discriminator: self.is_discriminator,
            accessor: self.accessor,
        }
    }
}

/// A message (or exception) descriptor.
///
/// The `fields()` view is the fully linearized list: base fields first, then
/// declared fields, with a declared field shadowing a base field of the same
/// name in place. The linearization and the name index are computed once,
/// either lazily on first use or eagerly by [`TypeRegistry::link`].
#[derive(Debug)]
pub struct MessageDescriptor {
    name: String,
    is_exception: bool,
    is_form: bool,
    base: Option<TypeRef>,
    declared_fields: Vec<FieldDescriptor>,
    subtypes: Vec<(String, TypeRef)>,
    variables: Vec<String>,
    constructor: Option<Constructor>,
    fields: OnceLock<Vec<FieldDescriptor>>,
    field_index: OnceLock<HashMap<String, usize>>,
}

impl MessageDescriptor {
    pub fn builder(name: impl Into<String>) -> MessageBuilder {
        MessageBuilder {
            descriptor: MessageDescriptor {
                name: name.into(),
                is_exception: false,
                is_form: false,
                base: None,
                declared_fields: Vec::new(),
                subtypes: Vec::new(),
                variables: Vec::new(),
                constructor: None,
                fields: OnceLock::new(),
                field_index: OnceLock::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        if self.is_exception {
            TypeKind::Exception
        } else {
            TypeKind::Message
        }
    }

    pub fn is_exception(&self) -> bool {
        self.is_exception
    }

    /// Whether RPC arguments of this type expand field-by-field into
    /// separate query/post parameters.
    pub fn is_form(&self) -> bool {
        self.is_form
    }

    pub fn base(&self) -> Option<TypeRef> {
        self.base
    }

    pub fn declared_fields(&self) -> &[FieldDescriptor] {
        &self.declared_fields
    }

    pub fn subtypes(&self) -> &[(String, TypeRef)] {
        &self.subtypes
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// The linearized field list: base fields, then declared fields.
    pub fn fields(&self, registry: &TypeRegistry) -> &[FieldDescriptor] {
        self.fields.get_or_init(|| {
            let mut fields: Vec<FieldDescriptor> = match self.base {
                Some(base) => {
                    let handle = registry.resolve(base);
                    let node = registry.node(handle);
                    let base = node
                        .as_message()
                        .unwrap_or_else(|| panic!("base of '{}' is not a message", self.name));
                    base.fields(registry).to_vec()
                }
                None => Vec::new(),
            };

            for field in &self.declared_fields {
                match fields.iter().position(|f| f.name() == field.name()) {
                    Some(position) => fields[position] = field.clone(),
                    None => fields.push(field.clone()),
                }
            }

            fields
        })
    }

    /// O(1) field lookup by name over the linearized list.
    pub fn find_field(&self, registry: &TypeRegistry, name: &str) -> Option<&FieldDescriptor> {
        let fields = self.fields(registry);
        let index = self.field_index.get_or_init(|| {
            fields
                .iter()
                .enumerate()
                .map(|(i, f)| (f.name().to_string(), i))
                .collect()
        });
        index.get(name).map(|&i| &fields[i])
    }

    /// The discriminator field, if this message is polymorphic.
    pub fn discriminator(&self, registry: &TypeRegistry) -> Option<&FieldDescriptor> {
        self.fields(registry).iter().find(|f| f.is_discriminator())
    }

    /// Looks up the subtype mapped to a canonical enum value name.
    pub fn subtype(&self, value: &str) -> Option<TypeRef> {
        self.subtypes
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, ty)| *ty)
    }

    /// Constructs a fresh instance with all fields unset.
    ///
    /// Panics if no constructor was registered — instantiating a descriptor
    /// that has no generated struct is a usage error.
    pub fn new_instance(&self) -> Box<dyn Message> {
        let constructor = self
            .constructor
            .as_ref()
            .unwrap_or_else(|| panic!("message '{}' has no instance constructor", self.name));
        (constructor.0)()
    }

    pub(crate) fn instantiate(
        &self,
        registry: &TypeRegistry,
        args: &[TypeRef],
    ) -> MessageDescriptor {
        MessageDescriptor {
            name: self.name.clone(),
            is_exception: self.is_exception,
            is_form: self.is_form,
            base: self.base.map(|b| registry.substitute(b, args)),
            declared_fields: self
                .declared_fields
                .iter()
                .map(|f| f.substituted(registry.substitute(f.ty(), args)))
                .collect(),
            subtypes: self
                .subtypes
                .iter()
                .map(|(v, ty)| (v.clone(), registry.substitute(*ty, args)))
                .collect(),
            variables: Vec::new(),
            constructor: self.constructor.clone(),
            fields: OnceLock::new(),
            field_index: OnceLock::new(),
        }
    }
}

/// Fluent construction of a [`MessageDescriptor`], used by generated code.
pub struct MessageBuilder {
    descriptor: MessageDescriptor,
}

impl MessageBuilder {
    /// Marks the message as an exception descriptor.
    pub fn exception(mut self) -> Self {
        self.descriptor.is_exception = true;
        self
    }

    /// Marks the message as a form (expandable RPC argument).
    pub fn form(mut self) -> Self {
        self.descriptor.is_form = true;
        self
    }

    pub fn base(mut self, base: impl Into<TypeRef>) -> Self {
        self.descriptor.base = Some(base.into());
        self
    }

    /// Declares a generic type variable. Order matters: it is the position
    /// `parameterize` binds.
    pub fn variable(mut self, name: impl Into<String>) -> Self {
        self.descriptor.variables.push(name.into());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.descriptor.declared_fields.push(field);
        self
    }

    /// Maps a discriminator enum value to a concrete subtype.
    pub fn subtype(mut self, value: impl AsRef<str>, ty: impl Into<TypeRef>) -> Self {
        self.descriptor
            .subtypes
            .push((value.as_ref().to_ascii_lowercase(), ty.into()));
        self
    }

    pub fn constructor(
        mut self,
        constructor: impl Fn() -> Box<dyn Message> + Send + Sync + 'static,
    ) -> Self {
        self.descriptor.constructor = Some(Constructor(std::sync::Arc::new(constructor)));
        self
    }

    pub fn build(self) -> super::TypeNode {
        super::TypeNode::new(NodeBody::Message(self.descriptor))
    }
}
