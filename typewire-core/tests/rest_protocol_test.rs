use album_service::{AlbumError, AlbumSchema, EntryFilter, ErrorCode, TextEntry, schema};
use std::sync::Arc;
use typewire_core::invoke::{Invocation, InvocationResult, MethodRef};
use typewire_core::rest::{RestProtocol, RestRequest};
use typewire_core::{ProtocolError, TypeHandle, TypeRegistry, Value};

fn method_ref(registry: &TypeRegistry, interface: TypeHandle, name: &str) -> MethodRef {
    let node = registry.node(interface);
    let (index, _) = node
        .as_interface()
        .expect("interface descriptor")
        .find_method(registry, name)
        .unwrap_or_else(|| panic!("method '{name}' not found"));
    MethodRef { interface, index }
}

fn protocol(schema: &AlbumSchema) -> RestProtocol {
    RestProtocol::new(Arc::clone(&schema.registry))
}

fn chained_invocation(schema: &AlbumSchema) -> Arc<Invocation> {
    let registry = &schema.registry;
    let entries = method_ref(registry, schema.album_service, "entries");
    let list = method_ref(registry, schema.entries_service, "list");
    Invocation::root(registry, entries, vec![Value::I64(12)]).next(
        registry,
        list,
        vec![Value::I32(5)],
    )
}

#[test]
fn chaining_args_become_path_segments_and_remote_args_query_params() {
    let schema = schema();
    let request = protocol(&schema)
        .write_request(&chained_invocation(&schema))
        .unwrap();

    assert!(!request.is_post());
    assert_eq!(request.path(), "/entries/12/list");
    assert_eq!(request.query(), [("limit".to_string(), "5".to_string())]);
    assert!(request.post_params().is_empty());
}

#[test]
fn remote_get_method_maps_to_query() {
    let schema = schema();
    let registry = &schema.registry;
    let get = method_ref(registry, schema.album_service, "get");
    let invocation = Invocation::root(registry, get, vec![Value::I64(7)]);

    let request = protocol(&schema).write_request(&invocation).unwrap();
    assert_eq!(request.path(), "/get");
    assert_eq!(request.query(), [("id".to_string(), "7".to_string())]);
}

#[test]
fn index_method_adds_no_path_segment() {
    let schema = schema();
    let registry = &schema.registry;
    let status = method_ref(registry, schema.album_service, "status");
    let invocation = Invocation::root(registry, status, vec![]);

    let request = protocol(&schema).write_request(&invocation).unwrap();
    assert_eq!(request.path(), "/");
    assert!(request.query().is_empty());
}

#[test]
fn post_method_puts_args_into_the_form_body() {
    let schema = schema();
    let registry = &schema.registry;
    let create = method_ref(registry, schema.album_service, "create");

    let mut entry = TextEntry::new(schema.text_entry);
    entry.title = Some("new".to_string());
    let invocation = Invocation::root(registry, create, vec![Value::message(entry)]);

    let request = protocol(&schema).write_request(&invocation).unwrap();
    assert!(request.is_post());
    assert_eq!(request.path(), "/create");
    assert!(request.query().is_empty());

    let (name, value) = &request.post_params()[0];
    assert_eq!(name, "entry");
    assert!(value.contains("\"kind\":\"text\""));
    assert!(value.contains("\"title\":\"new\""));
}

#[test]
fn form_arguments_expand_field_by_field() {
    let schema = schema();
    let registry = &schema.registry;
    let search = method_ref(registry, schema.album_service, "search");

    let mut filter = EntryFilter::new(schema.entry_filter);
    filter.query = Some("cats".to_string());
    filter.limit = Some(3);
    filter.tags = Some(vec!["a".to_string(), "b".to_string()]);
    let invocation = Invocation::root(registry, search, vec![Value::message(filter)]);

    let request = protocol(&schema).write_request(&invocation).unwrap();
    assert_eq!(
        request.query(),
        [
            ("query".to_string(), "cats".to_string()),
            ("limit".to_string(), "3".to_string()),
            ("tags".to_string(), "[\"a\",\"b\"]".to_string()),
        ]
    );
}

#[test]
fn requests_parse_back_into_the_same_chain() {
    let schema = schema();
    let protocol = protocol(&schema);
    let registry = &schema.registry;

    let written = protocol.write_request(&chained_invocation(&schema)).unwrap();
    let parsed = protocol
        .read_request(schema.album_service, &written)
        .unwrap();

    let chain = parsed.to_chain();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].method().resolve(registry).name(), "entries");
    assert_eq!(chain[0].args(), [Value::I64(12)]);
    assert_eq!(chain[1].method().resolve(registry).name(), "list");
    assert_eq!(chain[1].args(), [Value::I32(5)]);
}

#[test]
fn the_root_path_hits_the_index_method() {
    let schema = schema();
    let mut request = RestRequest::get();
    request.set_path("/");

    let parsed = protocol(&schema)
        .read_request(schema.album_service, &request)
        .unwrap();
    let chain = parsed.to_chain();
    assert_eq!(chain.len(), 1);
    assert_eq!(
        chain[0].method().resolve(&schema.registry).name(),
        "status"
    );
}

#[test]
fn unknown_method_is_not_found() {
    let schema = schema();
    let mut request = RestRequest::get();
    request.set_path("/bogus");

    let error = protocol(&schema)
        .read_request(schema.album_service, &request)
        .unwrap_err();
    assert!(matches!(error, ProtocolError::MethodNotFound(_)));
    assert_eq!(error.status(), http::StatusCode::NOT_FOUND);
}

#[test]
fn post_method_requires_the_post_verb() {
    let schema = schema();
    let mut request = RestRequest::get();
    request.set_path("/create");

    let error = protocol(&schema)
        .read_request(schema.album_service, &request)
        .unwrap_err();
    assert!(matches!(error, ProtocolError::MethodNotAllowed(_)));
    assert_eq!(error.status(), http::StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn missing_positional_args_are_a_client_error() {
    let schema = schema();
    let mut request = RestRequest::get();
    request.set_path("/entries");

    let error = protocol(&schema)
        .read_request(schema.album_service, &request)
        .unwrap_err();
    assert!(matches!(error, ProtocolError::Client(_)));
    assert_eq!(error.status(), http::StatusCode::BAD_REQUEST);
}

#[test]
fn leftover_segments_after_a_remote_method_are_not_found() {
    let schema = schema();
    let mut request = RestRequest::get();
    request.set_path("/get/extra");

    let error = protocol(&schema)
        .read_request(schema.album_service, &request)
        .unwrap_err();
    assert!(matches!(error, ProtocolError::MethodNotFound(_)));
}

#[test]
fn ok_results_use_the_envelope() {
    let schema = schema();
    let protocol = protocol(&schema);
    let registry = &schema.registry;

    let count = method_ref(registry, schema.entries_service, "count");
    let entries = method_ref(registry, schema.album_service, "entries");
    let invocation = Invocation::root(registry, entries, vec![Value::I64(1)]).next(
        registry,
        count,
        vec![],
    );

    let response = protocol
        .write_ok_response(&invocation, &InvocationResult::ok(Value::I32(42)))
        .unwrap();
    assert!(response.has_ok_status());
    assert!(response.has_json_content_type());
    assert_eq!(response.content(), "{\"result\":42,\"status\":\"ok\"}");

    let result = protocol.read_response(&invocation, &response).unwrap();
    assert!(result.is_ok());
    assert_eq!(result.data(), &Value::I32(42));
}

#[test]
fn declared_exceptions_use_the_envelope_with_exception_status() {
    let schema = schema();
    let protocol = protocol(&schema);
    let registry = &schema.registry;

    let get = method_ref(registry, schema.album_service, "get");
    let invocation = Invocation::root(registry, get, vec![Value::I64(404)]);

    let mut error = AlbumError::new(schema.album_error);
    error.code = Some(ErrorCode::NotFound);
    error.message = Some("gone".to_string());
    let raised = Value::message(error);

    let response = protocol
        .write_ok_response(&invocation, &InvocationResult::exc(raised.clone()))
        .unwrap();
    assert!(response.has_ok_status());
    assert!(response.content().contains("\"status\":\"exception\""));

    let result = protocol.read_response(&invocation, &response).unwrap();
    assert!(!result.is_ok());
    assert_eq!(result.data(), &raised);
}

#[test]
#[should_panic(expected = "wrong number of arguments")]
fn capturing_a_call_with_the_wrong_arity_panics() {
    let schema = schema();
    let get = method_ref(&schema.registry, schema.album_service, "get");
    Invocation::root(&schema.registry, get, vec![]);
}

#[test]
fn exception_declarations_are_inherited_through_the_chain() {
    let schema = schema();
    let registry = &schema.registry;

    // `list` declares no exception; the chain falls back to the one on
    // `entries`.
    let invocation = chained_invocation(&schema);
    let exc = invocation.exc(registry).expect("inherited exception");
    assert_eq!(registry.resolve(exc), schema.album_error);
}
