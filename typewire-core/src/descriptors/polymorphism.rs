//! Discriminator-based subtype resolution.

use super::{FieldDescriptor, MessageDescriptor, TypeHandle, TypeRegistry};
use crate::error::FormatError;

/// Hard bound on subtype recursion. Well-formed schemas branch a handful of
/// levels at most; anything deeper indicates a corrupt subtype map and fails
/// closed instead of looping.
const MAX_SUBTYPE_DEPTH: usize = 32;

/// Resolves the most specific concrete message descriptor for the data at
/// hand.
///
/// `read` extracts the discriminator token from the wire carrier for the
/// current candidate descriptor (by field name or by position, depending on
/// the format) and returns `None` when it is absent.
///
/// Resolution follows the descriptor's subtype map: an absent discriminator
/// keeps the current descriptor, an enum value with no mapping falls back to
/// the current descriptor (logged, never an error, to stay compatible with
/// unknown future subtypes), a self-mapping stops, and otherwise resolution
/// recurses into the subtype, which may branch further on its own
/// discriminator.
pub fn resolve_subtype<F>(
    registry: &TypeRegistry,
    message: TypeHandle,
    mut read: F,
) -> Result<TypeHandle, FormatError>
where
    F: FnMut(&MessageDescriptor, &FieldDescriptor) -> Result<Option<String>, FormatError>,
{
    let mut current = message;

    for _ in 0..MAX_SUBTYPE_DEPTH {
        let node = registry.node(current);
        let descriptor = node.as_message().ok_or_else(|| {
            FormatError::malformed(format!("'{}' is not a message descriptor", node.name()))
        })?;

        let Some(field) = descriptor.discriminator(registry) else {
            return Ok(current);
        };
        // A leaf subtype inherits the discriminator field but branches no
        // further.
        if descriptor.subtypes().is_empty() {
            return Ok(current);
        }

        let Some(token) = read(descriptor, field)? else {
            return Ok(current);
        };

        let value = canonical_enum_value(registry, field, &token)?;
        match descriptor.subtype(&value) {
            None => {
                tracing::debug!(
                    message = descriptor.name(),
                    value,
                    "no subtype mapping for discriminator value, keeping base descriptor"
                );
                return Ok(current);
            }
            Some(subtype) => {
                let next = registry.resolve(subtype);
                if next == current {
                    return Ok(current);
                }
                current = next;
            }
        }
    }

    Err(FormatError::malformed(format!(
        "subtype resolution exceeded {MAX_SUBTYPE_DEPTH} levels; the subtype map is malformed"
    )))
}

fn canonical_enum_value(
    registry: &TypeRegistry,
    field: &FieldDescriptor,
    token: &str,
) -> Result<String, FormatError> {
    let handle = registry.resolve(field.ty());
    let node = registry.node(handle);
    let descriptor = node.as_enum().ok_or_else(|| {
        FormatError::malformed(format!(
            "discriminator field '{}' is not enum-typed",
            field.name()
        ))
    })?;

    descriptor
        .find(token)
        .map(str::to_string)
        .ok_or_else(|| FormatError::UnknownEnumValue {
            enum_name: descriptor.name().to_string(),
            value: token.to_string(),
        })
}
