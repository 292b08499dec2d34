//! The REST protocol codec: invocation chains ⇔ requests, invocation
//! results ⇔ response envelopes.

use super::request::{RestRequest, RestResponse};
use super::urls;
use crate::descriptors::{
    ArgDescriptor, TypeHandle, TypeRef, TypeRegistry, resolve_subtype,
};
use crate::error::{FormatError, ProtocolError};
use crate::formats::{is_line_scalar, json, line};
use crate::invoke::{Invocation, InvocationResult, MethodRef};
use crate::value::Value;
use std::collections::VecDeque;
use std::sync::Arc;

/// Encodes and decodes both directions of the REST mapping. Stateless apart
/// from the registry reference; client and server handlers share it.
#[derive(Clone, Debug)]
pub struct RestProtocol {
    registry: Arc<TypeRegistry>,
}

impl RestProtocol {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Serializes a remote-terminated invocation chain into a request.
    ///
    /// Panics if the chain does not end with a remote method; proxies only
    /// produce remote-terminated chains.
    pub fn write_request(&self, invocation: &Invocation) -> Result<RestRequest, FormatError> {
        let chain = invocation.to_chain();
        let terminal = chain.last().expect("chains have at least one link");
        let descriptor = terminal.method().resolve(&self.registry);
        assert!(
            descriptor.is_remote(&self.registry),
            "invocation chain must terminate with a remote method"
        );

        let mut request = if descriptor.is_post() {
            RestRequest::post()
        } else {
            RestRequest::get()
        };

        for link in chain {
            self.write_link(&mut request, link)?;
        }

        Ok(request)
    }

    fn write_link(&self, request: &mut RestRequest, link: &Invocation) -> Result<(), FormatError> {
        let descriptor = link.method().resolve(&self.registry);
        request.append_path("/");
        if !descriptor.is_index() {
            request.append_path(&urls::urlencode(descriptor.name()));
        }

        let args = link.args();
        let descriptors = descriptor.args();

        if descriptor.is_post() {
            for (argd, arg) in descriptors.iter().zip(args) {
                self.write_param(argd, arg, |name, value| {
                    request.add_post(name, value);
                })?;
            }
        } else if descriptor.is_remote(&self.registry) {
            for (argd, arg) in descriptors.iter().zip(args) {
                self.write_param(argd, arg, |name, value| {
                    request.add_query(name, value);
                })?;
            }
        } else {
            // Chaining link: arguments are positional path segments.
            for (argd, arg) in descriptors.iter().zip(args) {
                let serialized = self.arg_to_string(argd.ty(), arg)?;
                request.append_path("/");
                request.append_path(&urls::urlencode(&serialized));
            }
        }

        Ok(())
    }

    /// Serializes one named parameter. Null arguments are skipped entirely;
    /// form messages expand into one parameter per set field of the
    /// instance's concrete type, so polymorphic subtype fields travel too.
    fn write_param(
        &self,
        argd: &ArgDescriptor,
        arg: &Value,
        mut push: impl FnMut(String, String),
    ) -> Result<(), FormatError> {
        if arg.is_null() {
            return Ok(());
        }

        if self.form_descriptor(argd.ty()).is_none() {
            let serialized = self.arg_to_string(argd.ty(), arg)?;
            push(argd.name().to_string(), serialized);
            return Ok(());
        }

        let Value::Message(message) = arg else {
            return Err(FormatError::mismatch("form message", arg));
        };
        let node = self.registry.node(message.descriptor());
        let descriptor = node
            .as_message()
            .ok_or_else(|| FormatError::mismatch("form message", arg))?;

        for field in descriptor.fields(&self.registry) {
            if !field.is_set(message.as_ref()) {
                continue;
            }
            let Some(value) = field.get(message.as_ref()) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let serialized = self.arg_to_string(field.ty(), &value)?;
            push(field.name().to_string(), serialized);
        }

        Ok(())
    }

    /// Scalars and enums render as bare line-format tokens; everything else
    /// as a JSON string.
    fn arg_to_string(&self, ty: TypeRef, value: &Value) -> Result<String, FormatError> {
        let handle = self.registry.resolve(ty);
        if is_line_scalar(self.registry.kind(handle)) {
            line::serialize(&self.registry, handle, value)
        } else {
            json::to_string(&self.registry, handle, value)
        }
    }

    /// Parses a request back into an invocation chain rooted at the given
    /// interface.
    pub fn read_request(
        &self,
        interface: TypeHandle,
        request: &RestRequest,
    ) -> Result<Arc<Invocation>, ProtocolError> {
        let path = request.path().strip_prefix('/').unwrap_or(request.path());
        let mut parts: VecDeque<&str> = path.split('/').collect();

        let mut current = interface;
        let mut invocation: Option<Arc<Invocation>> = None;

        while let Some(part) = parts.pop_front() {
            let node = self.registry.node(current);
            let descriptor = node.as_interface().ok_or_else(|| {
                ProtocolError::Server("Internal server error".to_string())
            })?;

            // Exact name match first, then the interface's index method.
            let (index, method) = match descriptor.find_method(&self.registry, part) {
                Some(found) => found,
                None => descriptor.index_method(&self.registry).ok_or_else(|| {
                    ProtocolError::MethodNotFound(format!("Method not found: {part}"))
                })?,
            };
            let method = method.clone();

            // An index method has no path segment of its own; the consumed
            // part was really an argument (or a following method name).
            if method.is_index() && !part.is_empty() {
                parts.push_front(part);
            }

            if method.is_post() && !request.is_post() {
                return Err(ProtocolError::MethodNotAllowed(
                    "Method not allowed, POST required".to_string(),
                ));
            }

            let mut args = Vec::with_capacity(method.args().len());
            if method.is_post() {
                for argd in method.args() {
                    args.push(self.read_param(argd, request.post_params())?);
                }
            } else if method.is_remote(&self.registry) {
                for argd in method.args() {
                    args.push(self.read_param(argd, request.query())?);
                }
            } else {
                for argd in method.args() {
                    let part = parts.pop_front().ok_or_else(|| {
                        ProtocolError::Client("Wrong number of method args".to_string())
                    })?;
                    args.push(self.read_path_arg(argd, part)?);
                }
            }

            let method_ref = MethodRef {
                interface: current,
                index,
            };
            let next = match &invocation {
                Some(parent) => parent.next(&self.registry, method_ref, args),
                None => Invocation::root(&self.registry, method_ref, args),
            };

            if method.is_remote(&self.registry) {
                if !parts.is_empty() {
                    return Err(ProtocolError::MethodNotFound(
                        "Reached a remote method but path segments remain".to_string(),
                    ));
                }
                return Ok(next);
            }

            invocation = Some(next);
            current = self.registry.resolve(method.result());
        }

        Err(ProtocolError::MethodNotFound(
            "The last method must be a remote one".to_string(),
        ))
    }

    fn read_path_arg(&self, argd: &ArgDescriptor, part: &str) -> Result<Value, ProtocolError> {
        let decoded = urls::urldecode(part)
            .map_err(|e| ProtocolError::Client(format!("Bad path argument: {e}")))?;
        self.arg_from_string(argd.ty(), &decoded)
            .map_err(|e| ProtocolError::Client(format!("Bad argument '{}': {e}", argd.name())))
    }

    fn read_param(
        &self,
        argd: &ArgDescriptor,
        params: &[(String, String)],
    ) -> Result<Value, ProtocolError> {
        let handle = self.registry.resolve(argd.ty());

        if self.form_descriptor(argd.ty()).is_some() {
            return self
                .read_form_param(handle, params)
                .map_err(|e| ProtocolError::Client(format!("Bad argument '{}': {e}", argd.name())));
        }

        match lookup(params, argd.name()) {
            None => Ok(Value::Null),
            Some(value) => self
                .arg_from_string(argd.ty(), value)
                .map_err(|e| ProtocolError::Client(format!("Bad argument '{}': {e}", argd.name()))),
        }
    }

    /// Reassembles a form message from individual parameters, resolving the
    /// concrete subtype through the discriminator parameter first so that
    /// subtype-only fields are read too.
    fn read_form_param(
        &self,
        handle: TypeHandle,
        params: &[(String, String)],
    ) -> Result<Value, FormatError> {
        let concrete = resolve_subtype(&self.registry, handle, |_, field| {
            Ok(lookup(params, field.name())
                .filter(|v| !v.is_empty())
                .map(str::to_string))
        })?;

        let node = self.registry.node(concrete);
        let descriptor = node
            .as_message()
            .ok_or_else(|| FormatError::malformed("form argument is not a message".to_string()))?;

        let mut instance = descriptor.new_instance();
        for field in descriptor.fields(&self.registry) {
            let Some(value) = lookup(params, field.name()) else {
                continue;
            };
            let parsed = self.arg_from_string(field.ty(), value)?;
            if parsed.is_null() || field.is_discriminator() {
                continue;
            }
            field.set(instance.as_mut(), parsed);
        }

        Ok(Value::Message(instance))
    }

    fn arg_from_string(&self, ty: TypeRef, value: &str) -> Result<Value, FormatError> {
        let handle = self.registry.resolve(ty);
        let kind = self.registry.kind(handle);

        if value.is_empty() {
            // An empty parameter is an empty string for string arguments
            // and null for everything else.
            return Ok(if kind == crate::descriptors::TypeKind::String {
                Value::String(String::new())
            } else {
                Value::Null
            });
        }

        if is_line_scalar(kind) {
            line::parse(&self.registry, handle, value)
        } else {
            json::from_str(&self.registry, handle, value)
        }
    }

    /// Serializes an invocation result into the 200 JSON envelope.
    pub fn write_ok_response(
        &self,
        invocation: &Invocation,
        result: &InvocationResult,
    ) -> Result<RestResponse, FormatError> {
        let (status, ty) = if result.is_ok() {
            ("ok", self.registry.resolve(invocation.result(&self.registry)))
        } else {
            let exc = invocation.exc(&self.registry).ok_or_else(|| {
                FormatError::malformed(
                    "an application exception was raised but the method declares none".to_string(),
                )
            })?;
            ("exception", self.registry.resolve(exc))
        };

        let data = json::serialize(&self.registry, ty, result.data())?;
        let body = serde_json::json!({ "status": status, "result": data });
        Ok(RestResponse::ok_json(body.to_string()))
    }

    /// Parses a 200 JSON envelope back into an invocation result.
    pub fn read_response(
        &self,
        invocation: &Invocation,
        response: &RestResponse,
    ) -> Result<InvocationResult, ProtocolError> {
        let envelope: serde_json::Value = serde_json::from_str(response.content())
            .map_err(|e| ProtocolError::Client(format!("Invalid response JSON: {e}")))?;
        let status = envelope
            .get("status")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                ProtocolError::Client("Response envelope has no status".to_string())
            })?;
        let result = envelope.get("result").unwrap_or(&serde_json::Value::Null);

        match status {
            "ok" => {
                let ty = self.registry.resolve(invocation.result(&self.registry));
                let data = json::parse(&self.registry, ty, result)
                    .map_err(|e| ProtocolError::Client(format!("Invalid result: {e}")))?;
                Ok(InvocationResult::ok(data))
            }
            "exception" => {
                let exc = invocation.exc(&self.registry).ok_or_else(|| {
                    ProtocolError::Client("Unsupported application exception".to_string())
                })?;
                let ty = self.registry.resolve(exc);
                let data = json::parse(&self.registry, ty, result)
                    .map_err(|e| ProtocolError::Client(format!("Invalid exception: {e}")))?;
                Ok(InvocationResult::exc(data))
            }
            other => Err(ProtocolError::Client(format!(
                "Unsupported rpc response status={other}"
            ))),
        }
    }

    fn form_descriptor(&self, ty: TypeRef) -> Option<TypeHandle> {
        let handle = self.registry.resolve(ty);
        let node = self.registry.node(handle);
        node.as_message()
            .filter(|m| m.is_form())
            .map(|_| handle)
    }
}

fn lookup<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}
