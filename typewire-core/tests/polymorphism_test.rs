use album_service::{Entry, EntryKind, PhotoEntry, TextEntry, schema};
use typewire_core::Value;
use typewire_core::formats::{json, line};

#[test]
fn discriminator_selects_the_concrete_subtype() {
    let schema = schema();
    let wire = r#"{"kind":"text","id":5,"title":"note","text":"the body"}"#;

    let parsed = json::from_str(&schema.registry, schema.entry, wire).unwrap();
    let entry: &TextEntry = parsed.downcast_message().expect("expected a TextEntry");
    assert_eq!(entry.kind, Some(EntryKind::Text));
    assert_eq!(entry.id, Some(5));
    // A subtype-only field is visible because resolution ran before the
    // field walk.
    assert_eq!(entry.text.as_deref(), Some("the body"));
}

#[test]
fn omitted_discriminator_yields_the_base_type() {
    let schema = schema();
    let wire = r#"{"id":5,"title":"note"}"#;

    let parsed = json::from_str(&schema.registry, schema.entry, wire).unwrap();
    let entry: &Entry = parsed.downcast_message().expect("expected the base Entry");
    assert_eq!(entry.id, Some(5));
}

#[test]
fn unmapped_discriminator_value_falls_back_to_the_base_type() {
    let schema = schema();
    // "link" is a valid enum value with no subtype mapping.
    let wire = r#"{"kind":"link","id":9}"#;

    let parsed = json::from_str(&schema.registry, schema.entry, wire).unwrap();
    let entry: &Entry = parsed.downcast_message().expect("expected the base Entry");
    assert_eq!(entry.id, Some(9));
}

#[test]
fn invalid_discriminator_value_is_a_format_error() {
    let schema = schema();
    let wire = r#"{"kind":"bogus","id":9}"#;

    let error = json::from_str(&schema.registry, schema.entry, wire).unwrap_err();
    assert!(error.to_string().contains("has no value 'bogus'"));
}

#[test]
fn subtype_serializes_its_own_discriminator_through_the_base_handle() {
    let schema = schema();
    let mut photo = PhotoEntry::new(schema.photo_entry);
    photo.id = Some(3);
    photo.url = Some("u".to_string());

    let text = json::to_string(&schema.registry, schema.entry, &Value::message(photo)).unwrap();
    assert!(text.contains("\"kind\":\"photo\""));
    assert!(text.contains("\"url\":\"u\""));
}

#[test]
fn line_format_resolves_the_discriminator_positionally() {
    let schema = schema();

    let parsed = line::parse(&schema.registry, schema.entry, "text-5-note-body").unwrap();
    let entry: &TextEntry = parsed.downcast_message().expect("expected a TextEntry");
    assert_eq!(entry.title.as_deref(), Some("note"));
    assert_eq!(entry.text.as_deref(), Some("body"));
}

#[test]
fn self_mapped_discriminator_value_stays_on_the_base() {
    let schema = schema();
    let wire = r#"{"kind":"entry","id":1}"#;

    let parsed = json::from_str(&schema.registry, schema.entry, wire).unwrap();
    assert!(parsed.downcast_message::<Entry>().is_some());
}
