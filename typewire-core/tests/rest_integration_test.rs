use album_service::{
    AlbumError, AlbumService, EntryFilter, EntryKind, ErrorCode, TextEntry, schema,
};
use std::sync::Arc;
use typewire_core::invoke::InvocationProxy;
use typewire_core::rest::{RestRequest, RestServerHandler, rest_client};
use typewire_core::{CallError, ProtocolError, Value};

mod album_service_impl;
use album_service_impl::AlbumServiceImpl;

// Client proxy wired straight into the server handler: the "transport" is a
// function call.
fn connect(schema: &Arc<album_service::AlbumSchema>) -> (InvocationProxy, Arc<RestServerHandler>) {
    let service: Box<dyn AlbumService> = Box::new(AlbumServiceImpl {
        schema: Arc::clone(schema),
    });
    let server = Arc::new(RestServerHandler::with_service(
        Arc::clone(&schema.registry),
        schema.album_service,
        Box::new(service),
    ));

    let sender_server = Arc::clone(&server);
    let client = rest_client(
        Arc::clone(&schema.registry),
        schema.album_service,
        Box::new(move |request| Ok(sender_server.handle(&request))),
    );

    (client, server)
}

#[test]
fn remote_call_round_trips_a_typed_message() {
    let schema = Arc::new(schema());
    let (client, _server) = connect(&schema);

    let result = client.call("get", vec![Value::I64(1)]).unwrap();
    let entry: &TextEntry = result.downcast_message().expect("expected a TextEntry");
    assert_eq!(entry.kind, Some(EntryKind::Text));
    assert_eq!(entry.id, Some(1));
    assert_eq!(entry.title.as_deref(), Some("found"));
}

#[test]
fn declared_exception_comes_back_typed() {
    let schema = Arc::new(schema());
    let (client, _server) = connect(&schema);

    let error = client.call("get", vec![Value::I64(404)]).unwrap_err();
    let CallError::Application(exception) = error else {
        panic!("expected an application exception, got {error:?}");
    };
    let error: &AlbumError = exception
        .value
        .downcast_message()
        .expect("expected an AlbumError");
    assert_eq!(error.code, Some(ErrorCode::NotFound));
    assert_eq!(error.message.as_deref(), Some("no such entry"));
}

#[test]
fn chained_calls_flow_through_the_path() {
    let schema = Arc::new(schema());
    let (client, _server) = connect(&schema);

    let entries = client.chain("entries", vec![Value::I64(7)]).unwrap();
    let count = entries.call("count", vec![]).unwrap();
    assert_eq!(count, Value::I32(7));
}

#[test]
fn chained_call_inherits_the_exception_declaration() {
    let schema = Arc::new(schema());
    let (client, _server) = connect(&schema);

    let entries = client.chain("entries", vec![Value::I64(403)]).unwrap();
    let error = entries.call("list", vec![Value::I32(3)]).unwrap_err();
    let CallError::Application(exception) = error else {
        panic!("expected an application exception, got {error:?}");
    };
    let error: &AlbumError = exception
        .value
        .downcast_message()
        .expect("expected an AlbumError");
    assert_eq!(error.code, Some(ErrorCode::Forbidden));
}

#[test]
fn index_method_is_called_at_the_root_path() {
    let schema = Arc::new(schema());
    let (client, _server) = connect(&schema);

    let status = client.call("status", vec![]).unwrap();
    assert_eq!(status, Value::String("ready".to_string()));
}

#[test]
fn post_method_round_trips_the_message_argument() {
    let schema = Arc::new(schema());
    let (client, _server) = connect(&schema);

    let mut entry = TextEntry::new(schema.text_entry);
    entry.id = Some(55);
    entry.title = Some("fresh".to_string());
    let sent = Value::message(entry);

    let created = client.call("create", vec![sent.clone()]).unwrap();
    assert_eq!(created, sent);
}

#[test]
fn form_argument_expands_and_reassembles() {
    let schema = Arc::new(schema());
    let (client, _server) = connect(&schema);

    let mut filter = EntryFilter::new(schema.entry_filter);
    filter.query = Some("sunsets".to_string());
    filter.limit = Some(2);
    let result = client.call("search", vec![Value::message(filter)]).unwrap();

    let Value::List(entries) = result else {
        panic!("expected a list result");
    };
    assert_eq!(entries.len(), 2);
    let first: &TextEntry = entries[0].downcast_message().expect("expected a TextEntry");
    assert_eq!(first.title.as_deref(), Some("sunsets"));
}

#[test]
fn chained_list_returns_typed_entries() {
    let schema = Arc::new(schema());
    let (client, _server) = connect(&schema);

    let entries = client.chain("entries", vec![Value::I64(1)]).unwrap();
    let result = entries.call("list", vec![Value::I32(3)]).unwrap();

    let Value::List(items) = result else {
        panic!("expected a list result");
    };
    assert_eq!(items.len(), 3);
}

#[test]
fn unknown_paths_map_to_404_responses() {
    let schema = Arc::new(schema());
    let (_client, server) = connect(&schema);

    let mut request = RestRequest::get();
    request.set_path("/entries/1/bogus");
    let response = server.handle(&request);
    assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
    assert!(!response.has_json_content_type());
}

#[test]
fn get_on_a_post_method_maps_to_405() {
    let schema = Arc::new(schema());
    let (_client, server) = connect(&schema);

    let mut request = RestRequest::get();
    request.set_path("/create");
    let response = server.handle(&request);
    assert_eq!(response.status(), http::StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn client_maps_error_statuses_back_to_protocol_errors() {
    let schema = Arc::new(schema());
    let client = rest_client(
        Arc::clone(&schema.registry),
        schema.album_service,
        Box::new(|_request| {
            Ok(typewire_core::rest::RestResponse::error(
                http::StatusCode::NOT_FOUND,
                "nope",
            ))
        }),
    );

    let error = client.call("status", vec![]).unwrap_err();
    let CallError::Protocol(ProtocolError::MethodNotFound(text)) = error else {
        panic!("expected a method-not-found error, got {error:?}");
    };
    assert_eq!(text, "nope");
}

#[test]
#[should_panic(expected = "has no method")]
fn calling_an_unknown_method_panics() {
    let schema = Arc::new(schema());
    let (client, _server) = connect(&schema);
    let _ = client.call("does_not_exist", vec![]);
}

#[test]
fn client_treats_unexpected_statuses_as_server_errors() {
    let schema = Arc::new(schema());
    let client = rest_client(
        Arc::clone(&schema.registry),
        schema.album_service,
        Box::new(|_request| {
            Ok(typewire_core::rest::RestResponse::error(
                http::StatusCode::IM_A_TEAPOT,
                "short and stout",
            ))
        }),
    );

    let error = client.call("status", vec![]).unwrap_err();
    assert!(matches!(
        error,
        CallError::Protocol(ProtocolError::Server(_))
    ));
}
