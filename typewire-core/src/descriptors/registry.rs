//! The descriptor arena: declaration, definition, linking and generic
//! instantiation.

use super::{
    EnumDescriptor, ListDescriptor, MapDescriptor, NodeBody, SetDescriptor, TypeHandle, TypeKind,
    TypeNode, TypeRef,
};
use crate::error::LinkError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, RwLock};

type Slot = Arc<OnceLock<Arc<TypeNode>>>;

/// The registry owning every descriptor of a schema.
///
/// Construction is two-phase to tolerate cycles: [`declare`](Self::declare)
/// reserves a handle, [`define`](Self::define) fills it exactly once, and
/// descriptors reference each other through handles only. After all
/// definitions, [`link`](Self::link) validates the graph and eagerly builds
/// the derived lookup structures; linking is idempotent and safe to call
/// from multiple threads.
///
/// Primitive descriptors are pre-seeded singletons addressed by the
/// associated constants below; `LIST`, `SET` and `MAP` are the raw generic
/// containers that [`parameterize`](Self::parameterize) binds.
pub struct TypeRegistry {
    slots: RwLock<Vec<Slot>>,
    parameterized: Mutex<HashMap<(TypeHandle, Vec<TypeRef>), TypeHandle>>,
}

impl TypeRegistry {
    pub const BOOL: TypeHandle = TypeHandle(0);
    pub const INT16: TypeHandle = TypeHandle(1);
    pub const INT32: TypeHandle = TypeHandle(2);
    pub const INT64: TypeHandle = TypeHandle(3);
    pub const FLOAT: TypeHandle = TypeHandle(4);
    pub const DOUBLE: TypeHandle = TypeHandle(5);
    pub const STRING: TypeHandle = TypeHandle(6);
    pub const VOID: TypeHandle = TypeHandle(7);
    pub const OBJECT: TypeHandle = TypeHandle(8);
    /// The raw generic `list<T>`.
    pub const LIST: TypeHandle = TypeHandle(9);
    /// The raw generic `set<T>`.
    pub const SET: TypeHandle = TypeHandle(10);
    /// The raw generic `map<K, V>`.
    pub const MAP: TypeHandle = TypeHandle(11);

    pub fn new() -> Self {
        let registry = Self {
            slots: RwLock::new(Vec::new()),
            parameterized: Mutex::new(HashMap::new()),
        };

        for kind in [
            TypeKind::Bool,
            TypeKind::Int16,
            TypeKind::Int32,
            TypeKind::Int64,
            TypeKind::Float,
            TypeKind::Double,
            TypeKind::String,
            TypeKind::Void,
            TypeKind::Object,
        ] {
            registry.register(TypeNode::new(NodeBody::Primitive(kind)));
        }
        registry.register(TypeNode::new(NodeBody::List(ListDescriptor::new(
            TypeRef::Variable(0),
        ))));
        registry.register(TypeNode::new(NodeBody::Set(SetDescriptor::new(
            TypeRef::Variable(0),
        ))));
        registry.register(TypeNode::new(NodeBody::Map(MapDescriptor::new(
            TypeRef::Variable(0),
            TypeRef::Variable(1),
        ))));

        registry
    }

    /// Reserves a handle for a node defined later, enabling cyclic
    /// references during schema registration.
    pub fn declare(&self) -> TypeHandle {
        let mut slots = self.slots.write().expect("descriptor arena poisoned");
        slots.push(Arc::new(OnceLock::new()));
        TypeHandle((slots.len() - 1) as u32)
    }

    /// Fills a declared handle. Defining the same handle twice is a usage
    /// error and panics.
    pub fn define(&self, handle: TypeHandle, node: TypeNode) {
        let slot = self.slot(handle);
        if slot.set(Arc::new(node)).is_err() {
            panic!("type handle #{} is already defined", handle.0);
        }
    }

    /// `declare` and `define` in one step, for acyclic nodes.
    pub fn register(&self, node: TypeNode) -> TypeHandle {
        let handle = self.declare();
        self.define(handle, node);
        handle
    }

    /// Registers a plain enum descriptor.
    pub fn register_enum(&self, descriptor: EnumDescriptor) -> TypeHandle {
        self.register(TypeNode::new(NodeBody::Enum(descriptor)))
    }

    /// The node behind a handle. Panics on an undeclared or undefined
    /// handle — a usage error that [`link`](Self::link) reports cleanly
    /// beforehand.
    pub fn node(&self, handle: TypeHandle) -> Arc<TypeNode> {
        self.slot(handle)
            .get()
            .cloned()
            .unwrap_or_else(|| panic!("type handle #{} is not defined", handle.0))
    }

    pub fn kind(&self, handle: TypeHandle) -> TypeKind {
        self.node(handle).kind()
    }

    /// Resolves a reference to a concrete handle. A free variable here means
    /// an unparameterized generic leaked into data traversal, which is a
    /// usage error.
    pub fn resolve(&self, reference: TypeRef) -> TypeHandle {
        match reference {
            TypeRef::Concrete(handle) => handle,
            TypeRef::Variable(index) => {
                panic!("unbound type variable #{index}; parameterize the descriptor first")
            }
        }
    }

    /// Binds the type variables of a generic descriptor, returning the
    /// canonical instance for this argument list.
    ///
    /// Instantiation is memoized: repeated calls with an equal argument list
    /// return the identical handle, and concurrent first calls publish
    /// exactly one winner. Arity mismatches panic (usage error).
    pub fn parameterize(&self, raw: TypeHandle, args: &[TypeRef]) -> TypeHandle {
        let node = self.node(raw);
        let variables = node.variable_count();
        assert!(
            variables > 0,
            "type '{}' is not generic and cannot be parameterized",
            node.name()
        );
        assert_eq!(
            args.len(),
            variables,
            "wrong number of type arguments for '{}': expected {}, got {}",
            node.name(),
            variables,
            args.len()
        );

        let key = (raw, args.to_vec());
        if let Some(&handle) = self.memo().get(&key) {
            return handle;
        }

        // Build outside the lock: instantiation may recursively parameterize
        // nested generics. The table is re-checked under the lock before
        // publishing, so concurrent first calls agree on one winner and a
        // losing build is simply discarded.
        let body = self.instantiate(&node, args);
        let free = args.iter().any(|r| self.ref_has_free_variables(*r));
        let instance = TypeNode::instance(body, (raw, args.to_vec()), free);

        let mut memo = self.memo();
        if let Some(&handle) = memo.get(&key) {
            return handle;
        }
        let handle = self.register(instance);
        memo.insert(key, handle);
        handle
    }

    /// `list<element>`.
    pub fn list_of(&self, element: TypeHandle) -> TypeHandle {
        self.parameterize(Self::LIST, &[TypeRef::Concrete(element)])
    }

    /// `set<element>`.
    pub fn set_of(&self, element: TypeHandle) -> TypeHandle {
        self.parameterize(Self::SET, &[TypeRef::Concrete(element)])
    }

    /// `map<key, value>`.
    pub fn map_of(&self, key: TypeHandle, value: TypeHandle) -> TypeHandle {
        self.parameterize(Self::MAP, &[TypeRef::Concrete(key), TypeRef::Concrete(value)])
    }

    /// Validates the whole graph and eagerly fills the derived lookup
    /// structures (linearized fields/methods, name indexes).
    ///
    /// Safe to call repeatedly and concurrently: the caches are write-once
    /// and validation only reads.
    pub fn link(&self) -> Result<(), LinkError> {
        let slots: Vec<Slot> = self.slots.read().expect("descriptor arena poisoned").clone();

        for (index, slot) in slots.iter().enumerate() {
            if slot.get().is_none() {
                return Err(LinkError::UndefinedType(index as u32));
            }
        }

        for (index, slot) in slots.iter().enumerate() {
            let handle = TypeHandle(index as u32);
            let node = slot.get().expect("checked above").clone();
            match node.body() {
                NodeBody::Message(message) => self.link_message(handle, message)?,
                NodeBody::Interface(interface) => self.link_interface(interface)?,
                _ => {}
            }
        }

        Ok(())
    }

    fn link_message(
        &self,
        handle: TypeHandle,
        message: &super::MessageDescriptor,
    ) -> Result<(), LinkError> {
        if let Some(TypeRef::Concrete(base)) = message.base() {
            let kind = self.kind(base);
            if !matches!(kind, TypeKind::Message | TypeKind::Exception) {
                return Err(LinkError::InvalidBase {
                    message: message.name().to_string(),
                    found: kind,
                });
            }
        }

        for field in message.declared_fields() {
            if let TypeRef::Concrete(ty) = field.ty() {
                let kind = self.kind(ty);
                if matches!(kind, TypeKind::Interface | TypeKind::Void) {
                    return Err(LinkError::InvalidFieldType {
                        message: message.name().to_string(),
                        field: field.name().to_string(),
                        found: kind,
                    });
                }
            }
        }

        for (value, ty) in message.subtypes() {
            if let TypeRef::Concrete(subtype) = ty {
                let kind = self.kind(*subtype);
                if !matches!(kind, TypeKind::Message | TypeKind::Exception) {
                    return Err(LinkError::InvalidSubtype {
                        message: message.name().to_string(),
                        value: value.clone(),
                        found: kind,
                    });
                }
            }
        }

        // Skip the structural checks for raw generics; their instances are
        // validated when linked in turn.
        if message.variables().is_empty() {
            let fields = message.fields(self);
            let discriminator = fields.iter().find(|f| f.is_discriminator());

            if let Some(field) = discriminator {
                if self.kind(self.resolve(field.ty())) != TypeKind::Enum {
                    return Err(LinkError::InvalidDiscriminator {
                        message: message.name().to_string(),
                        field: field.name().to_string(),
                    });
                }
            }

            // Leaf subtypes inherit the discriminator field without a map of
            // their own; the self-entry invariant binds only the messages
            // that actually branch.
            if !message.subtypes().is_empty() {
                if discriminator.is_none() {
                    return Err(LinkError::MissingDiscriminator {
                        message: message.name().to_string(),
                    });
                }
                let self_entries = message
                    .subtypes()
                    .iter()
                    .filter(|(_, ty)| *ty == TypeRef::Concrete(handle))
                    .count();
                if self_entries != 1 {
                    return Err(LinkError::MissingSelfSubtype {
                        message: message.name().to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    fn link_interface(&self, interface: &super::InterfaceDescriptor) -> Result<(), LinkError> {
        for base in interface.bases() {
            if let TypeRef::Concrete(handle) = base {
                let kind = self.kind(*handle);
                if kind != TypeKind::Interface {
                    return Err(LinkError::InvalidBase {
                        message: interface.name().to_string(),
                        found: kind,
                    });
                }
            }
        }

        if interface.variables().is_empty() {
            let methods = interface.methods(self);
            for method in methods {
                if let Some(TypeRef::Concrete(exc)) = method.exc() {
                    let kind = self.kind(exc);
                    if kind != TypeKind::Exception {
                        return Err(LinkError::InvalidException {
                            interface: interface.name().to_string(),
                            method: method.name().to_string(),
                            found: kind,
                        });
                    }
                }
            }

            let index_methods = methods.iter().filter(|m| m.is_index()).count();
            if index_methods > 1 {
                return Err(LinkError::DuplicateIndexMethod {
                    interface: interface.name().to_string(),
                });
            }
        }

        Ok(())
    }

    pub(crate) fn substitute(&self, reference: TypeRef, args: &[TypeRef]) -> TypeRef {
        match reference {
            TypeRef::Variable(index) => args[index as usize],
            TypeRef::Concrete(handle) => {
                let node = self.node(handle);
                if !node.has_free_variables() {
                    return reference;
                }
                let (raw, raw_args) = node.origin().unwrap_or_else(|| {
                    panic!(
                        "type '{}' has free variables but no instantiation origin; \
                         reference generics through parameterized instances",
                        node.name()
                    )
                });
                let bound: Vec<TypeRef> =
                    raw_args.iter().map(|a| self.substitute(*a, args)).collect();
                TypeRef::Concrete(self.parameterize(raw, &bound))
            }
        }
    }

    fn instantiate(&self, node: &TypeNode, args: &[TypeRef]) -> NodeBody {
        match node.body() {
            NodeBody::List(list) => {
                NodeBody::List(ListDescriptor::new(self.substitute(list.element(), args)))
            }
            NodeBody::Set(set) => {
                NodeBody::Set(SetDescriptor::new(self.substitute(set.element(), args)))
            }
            NodeBody::Map(map) => NodeBody::Map(MapDescriptor::new(
                self.substitute(map.key(), args),
                self.substitute(map.value(), args),
            )),
            NodeBody::Message(message) => NodeBody::Message(message.instantiate(self, args)),
            NodeBody::Interface(interface) => {
                NodeBody::Interface(interface.instantiate(self, args))
            }
            NodeBody::Primitive(_) | NodeBody::Enum(_) => {
                unreachable!("non-generic nodes are rejected before instantiation")
            }
        }
    }

    fn ref_has_free_variables(&self, reference: TypeRef) -> bool {
        match reference {
            TypeRef::Variable(_) => true,
            TypeRef::Concrete(handle) => self.node(handle).has_free_variables(),
        }
    }

    fn slot(&self, handle: TypeHandle) -> Slot {
        self.slots
            .read()
            .expect("descriptor arena poisoned")
            .get(handle.0 as usize)
            .cloned()
            .unwrap_or_else(|| panic!("unknown type handle #{}", handle.0))
    }

    fn memo(&self) -> std::sync::MutexGuard<'_, HashMap<(TypeHandle, Vec<TypeRef>), TypeHandle>> {
        self.parameterized
            .lock()
            .expect("parameterization table poisoned")
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.read().expect("descriptor arena poisoned");
        f.debug_struct("TypeRegistry")
            .field("types", &slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameterize_returns_cached_instance() {
        let registry = TypeRegistry::new();
        let a = registry.list_of(TypeRegistry::STRING);
        let b = registry.list_of(TypeRegistry::STRING);
        assert_eq!(a, b);

        let c = registry.list_of(TypeRegistry::INT32);
        assert_ne!(a, c);
    }

    #[test]
    fn parameterized_list_resolves_element() {
        let registry = TypeRegistry::new();
        let list = registry.list_of(TypeRegistry::STRING);
        let node = registry.node(list);
        assert_eq!(node.kind(), TypeKind::List);
        assert_eq!(
            node.as_list().unwrap().element(),
            TypeRef::Concrete(TypeRegistry::STRING)
        );
        assert!(!node.has_free_variables());
    }

    #[test]
    #[should_panic(expected = "wrong number of type arguments")]
    fn parameterize_with_wrong_arity_panics() {
        let registry = TypeRegistry::new();
        registry.parameterize(
            TypeRegistry::MAP,
            &[TypeRef::Concrete(TypeRegistry::STRING)],
        );
    }

    #[test]
    #[should_panic(expected = "is not generic")]
    fn parameterize_non_generic_panics() {
        let registry = TypeRegistry::new();
        registry.parameterize(
            TypeRegistry::STRING,
            &[TypeRef::Concrete(TypeRegistry::STRING)],
        );
    }

    #[test]
    fn undefined_handle_fails_link() {
        let registry = TypeRegistry::new();
        let handle = registry.declare();
        let error = registry.link().unwrap_err();
        match error {
            LinkError::UndefinedType(index) => assert_eq!(index, handle.index()),
            other => panic!("unexpected link error: {other}"),
        }
    }

    #[test]
    fn builtins_link_clean() {
        let registry = TypeRegistry::new();
        registry.link().expect("builtins must link");
        registry.link().expect("link must be idempotent");
    }
}
