use album_service::{EntryFilter, Location, PhotoEntry, Sample, schema};
use typewire_core::formats::{json, line, native};
use typewire_core::{TypeRegistry, Value};

fn sample_value(schema: &album_service::AlbumSchema) -> Value {
    let mut sample = Sample::new(schema.sample);
    sample.string0 = Some("hi".to_string());
    sample.bool0 = Some(true);
    sample.short0 = Some(123);
    Value::message(sample)
}

fn photo_value(schema: &album_service::AlbumSchema) -> Value {
    let mut location = Location::new(schema.location);
    location.lat = Some(41.4);
    location.lon = Some(2.17);

    let mut photo = PhotoEntry::new(schema.photo_entry);
    photo.id = Some(11);
    photo.title = Some("skyline".to_string());
    photo.url = Some("http://example.com/p.jpg".to_string());
    photo.width = Some(1920);
    photo.height = Some(1080);
    photo.location = Some(location);
    Value::message(photo)
}

#[test]
fn primitives_round_trip_native_json_and_line() {
    let registry = TypeRegistry::new();
    let cases = [
        (TypeRegistry::BOOL, Value::Bool(true)),
        (TypeRegistry::INT16, Value::I16(-123)),
        (TypeRegistry::INT32, Value::I32(65000)),
        (TypeRegistry::INT64, Value::I64(9_000_000_000)),
        (TypeRegistry::FLOAT, Value::F32(1.5)),
        (TypeRegistry::DOUBLE, Value::F64(-2.25)),
        (TypeRegistry::STRING, Value::String("plain text".to_string())),
    ];

    for (ty, value) in cases {
        let plain = native::serialize(&registry, ty, &value).unwrap();
        assert_eq!(native::parse(&registry, ty, &plain).unwrap(), value);

        let text = json::to_string(&registry, ty, &value).unwrap();
        assert_eq!(json::from_str(&registry, ty, &text).unwrap(), value);

        let token = line::serialize(&registry, ty, &value).unwrap();
        assert_eq!(line::parse(&registry, ty, &token).unwrap(), value);
    }
}

#[test]
fn enums_are_lowercase_on_the_wire_and_case_insensitive_back() {
    let schema = schema();
    let registry = &schema.registry;
    let value = Value::enum_value("text");

    let text = json::to_string(registry, schema.entry_kind, &value).unwrap();
    assert_eq!(text, "\"text\"");
    assert_eq!(
        json::from_str(registry, schema.entry_kind, "\"TEXT\"").unwrap(),
        value
    );
    assert_eq!(
        line::parse(registry, schema.entry_kind, "Text").unwrap(),
        value
    );

    let error = json::from_str(registry, schema.entry_kind, "\"bogus\"").unwrap_err();
    assert!(error.to_string().contains("has no value 'bogus'"));
}

#[test]
fn containers_round_trip_native_and_json() {
    let registry = TypeRegistry::new();

    let list = registry.list_of(TypeRegistry::INT32);
    let list_value = Value::List(vec![Value::I32(1), Value::I32(2), Value::I32(3)]);
    let text = json::to_string(&registry, list, &list_value).unwrap();
    assert_eq!(text, "[1,2,3]");
    assert_eq!(json::from_str(&registry, list, &text).unwrap(), list_value);

    let plain = native::serialize(&registry, list, &list_value).unwrap();
    assert_eq!(native::parse(&registry, list, &plain).unwrap(), list_value);

    let map = registry.map_of(TypeRegistry::INT32, TypeRegistry::STRING);
    let map_value = Value::Map(vec![
        (Value::I32(1), Value::String("one".to_string())),
        (Value::I32(2), Value::String("two".to_string())),
    ]);
    let text = json::to_string(&registry, map, &map_value).unwrap();
    let parsed = json::from_str(&registry, map, &text).unwrap();
    assert_eq!(parsed, map_value);
}

#[test]
fn set_parsing_keeps_first_occurrence_order() {
    let registry = TypeRegistry::new();
    let set = registry.set_of(TypeRegistry::INT32);

    let parsed = json::from_str(&registry, set, "[3,1,3,2,1]").unwrap();
    assert_eq!(
        parsed,
        Value::Set(vec![Value::I32(3), Value::I32(1), Value::I32(2)])
    );
}

#[test]
fn messages_round_trip_native_and_json() {
    let schema = schema();
    let registry = &schema.registry;
    let photo = photo_value(&schema);

    // Serialized through the base descriptor: the concrete type drives the
    // field set either way.
    let plain = native::serialize(registry, schema.entry, &photo).unwrap();
    assert_eq!(native::parse(registry, schema.entry, &plain).unwrap(), photo);

    let text = json::to_string(registry, schema.entry, &photo).unwrap();
    assert_eq!(json::from_str(registry, schema.entry, &text).unwrap(), photo);
}

#[test]
fn unset_fields_are_skipped_and_stay_unset() {
    let schema = schema();
    let registry = &schema.registry;

    let mut sample = Sample::new(schema.sample);
    sample.bool0 = Some(false);
    let value = Value::message(sample);

    let text = json::to_string(registry, schema.sample, &value).unwrap();
    assert_eq!(text, "{\"bool0\":false}");
    assert_eq!(json::from_str(registry, schema.sample, &text).unwrap(), value);
}

#[test]
fn line_format_matches_the_field_declaration_order() {
    let schema = schema();
    let value = sample_value(&schema);

    let text = line::serialize(&schema.registry, schema.sample, &value).unwrap();
    assert_eq!(text, "hi-1-123");
    assert_eq!(
        line::parse(&schema.registry, schema.sample, &text).unwrap(),
        value
    );
}

#[test]
fn line_format_percent_encodes_structural_characters() {
    let schema = schema();
    let mut sample = Sample::new(schema.sample);
    sample.string0 = Some("50%.done/{ok}".to_string());
    sample.bool0 = Some(false);
    let value = Value::message(sample);

    let text = line::serialize(&schema.registry, schema.sample, &value).unwrap();
    assert_eq!(text, "50%25%2Edone%2F%7Bok%7D-0-");
    assert_eq!(
        line::parse(&schema.registry, schema.sample, &text).unwrap(),
        value
    );
}

#[test]
fn line_format_nests_messages_in_braces() {
    let schema = schema();
    let registry = &schema.registry;
    let photo = photo_value(&schema);

    let text = line::serialize(registry, schema.entry, &photo).unwrap();
    // kind-id-title-url-width-height-{lat-lon}
    assert_eq!(
        text,
        "photo-11-skyline-http:%2F%2Fexample%2Ecom%2Fp%2Ejpg-1920-1080-{41.4-2.17}"
    );
    assert_eq!(line::parse(registry, schema.entry, &text).unwrap(), photo);
}

#[test]
fn line_format_rejects_unbalanced_braces() {
    let schema = schema();
    assert!(line::parse(&schema.registry, schema.sample, "{1").is_err());
    assert!(line::parse(&schema.registry, schema.sample, "1}").is_err());
}

#[test]
fn line_format_rejects_containers() {
    let registry = TypeRegistry::new();
    let list = registry.list_of(TypeRegistry::INT32);
    let value = Value::List(vec![Value::I32(1)]);
    assert!(line::serialize(&registry, list, &value).is_err());
}

#[test]
fn numeric_narrowing_is_checked() {
    let schema = schema();
    let registry = &schema.registry;

    let error = json::from_str(registry, TypeRegistry::INT16, "70000").unwrap_err();
    assert!(error.to_string().contains("does not fit into int16"));

    let error = json::from_str(registry, schema.sample, "{\"short0\":70000}").unwrap_err();
    assert!(error.to_string().contains("does not fit into int16"));

    assert!(json::from_str(registry, TypeRegistry::INT32, "1.5").is_err());
}

#[test]
fn form_message_with_list_field_round_trips() {
    let schema = schema();
    let registry = &schema.registry;

    let mut filter = EntryFilter::new(schema.entry_filter);
    filter.query = Some("cats".to_string());
    filter.limit = Some(10);
    filter.tags = Some(vec!["a".to_string(), "b".to_string()]);
    let value = Value::message(filter);

    let text = json::to_string(registry, schema.entry_filter, &value).unwrap();
    assert_eq!(json::from_str(registry, schema.entry_filter, &text).unwrap(), value);
}

#[test]
fn messages_can_key_maps_through_the_line_format() {
    let schema = schema();
    let registry = &schema.registry;
    let map = registry.map_of(schema.sample, TypeRegistry::INT32);

    let value = Value::Map(vec![(sample_value(&schema), Value::I32(5))]);
    let text = json::to_string(registry, map, &value).unwrap();
    assert_eq!(text, "{\"hi-1-123\":5}");
    assert_eq!(json::from_str(registry, map, &text).unwrap(), value);
}

#[test]
fn map_keys_must_be_string_coercible() {
    let registry = TypeRegistry::new();
    let inner = registry.list_of(TypeRegistry::INT32);
    let map = registry.map_of(inner, TypeRegistry::INT32);

    let value = Value::Map(vec![(
        Value::List(vec![Value::I32(1)]),
        Value::I32(1),
    )]);
    assert!(json::serialize(&registry, map, &value).is_err());
    assert!(native::serialize(&registry, map, &value).is_err());
}

#[test]
fn void_serializes_as_absence() {
    let registry = TypeRegistry::new();
    assert_eq!(
        json::serialize(&registry, TypeRegistry::VOID, &Value::String("x".to_string())).unwrap(),
        serde_json::Value::Null
    );
    assert_eq!(
        json::parse(&registry, TypeRegistry::VOID, &serde_json::json!("x")).unwrap(),
        Value::Null
    );
}
