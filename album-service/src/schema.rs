//! Registration of the album schema into a fresh registry — the part a
//! code generator would emit last.

use crate::messages::{
    self, AlbumError, Entry, EntryFilter, Location, PhotoEntry, Sample, TextEntry,
};
use crate::services;
use std::sync::Arc;
use typewire_core::descriptors::{
    EnumDescriptor, FieldDescriptor, InterfaceDescriptor, MessageDescriptor, MethodDescriptor,
};
use typewire_core::{TypeHandle, TypeRegistry};

/// All handles of the album schema, plus the registry that owns them.
///
/// Every call builds an independent registry, so tests never share state.
pub struct AlbumSchema {
    pub registry: Arc<TypeRegistry>,
    pub entry_kind: TypeHandle,
    pub error_code: TypeHandle,
    pub entry: TypeHandle,
    pub text_entry: TypeHandle,
    pub photo_entry: TypeHandle,
    pub location: TypeHandle,
    pub entry_filter: TypeHandle,
    pub sample: TypeHandle,
    pub album_error: TypeHandle,
    pub entry_list: TypeHandle,
    pub album_service: TypeHandle,
    pub entries_service: TypeHandle,
}

/// Builds and links the album schema.
pub fn schema() -> AlbumSchema {
    let registry = Arc::new(TypeRegistry::new());

    // Declare the cyclic participants first: the entry tree references its
    // subtypes before they are defined, and the interfaces reference each
    // other's results.
    let entry = registry.declare();
    let text_entry = registry.declare();
    let photo_entry = registry.declare();
    let location = registry.declare();
    let entry_filter = registry.declare();
    let album_error = registry.declare();
    let album_service = registry.declare();
    let entries_service = registry.declare();

    let entry_kind = registry.register_enum(EnumDescriptor::new(
        "EntryKind",
        ["entry", "text", "photo", "link"],
    ));
    let error_code =
        registry.register_enum(EnumDescriptor::new("ErrorCode", ["not_found", "forbidden"]));

    registry.define(
        entry,
        MessageDescriptor::builder("Entry")
            .field(
                FieldDescriptor::new("kind", entry_kind, messages::entry_kind_accessor())
                    .discriminator(),
            )
            .field(FieldDescriptor::new(
                "id",
                TypeRegistry::INT64,
                messages::entry_id_accessor(),
            ))
            .field(FieldDescriptor::new(
                "title",
                TypeRegistry::STRING,
                messages::entry_title_accessor(),
            ))
            .subtype("entry", entry)
            .subtype("text", text_entry)
            .subtype("photo", photo_entry)
            .constructor(move || Box::new(Entry::new(entry)))
            .build(),
    );

    registry.define(
        text_entry,
        MessageDescriptor::builder("TextEntry")
            .base(entry)
            .field(
                FieldDescriptor::new("kind", entry_kind, messages::text_entry_kind_accessor())
                    .discriminator(),
            )
            .field(FieldDescriptor::new(
                "id",
                TypeRegistry::INT64,
                messages::text_entry_id_accessor(),
            ))
            .field(FieldDescriptor::new(
                "title",
                TypeRegistry::STRING,
                messages::text_entry_title_accessor(),
            ))
            .field(FieldDescriptor::new(
                "text",
                TypeRegistry::STRING,
                messages::text_entry_text_accessor(),
            ))
            .constructor(move || Box::new(TextEntry::new(text_entry)))
            .build(),
    );

    registry.define(
        photo_entry,
        MessageDescriptor::builder("PhotoEntry")
            .base(entry)
            .field(
                FieldDescriptor::new("kind", entry_kind, messages::photo_entry_kind_accessor())
                    .discriminator(),
            )
            .field(FieldDescriptor::new(
                "id",
                TypeRegistry::INT64,
                messages::photo_entry_id_accessor(),
            ))
            .field(FieldDescriptor::new(
                "title",
                TypeRegistry::STRING,
                messages::photo_entry_title_accessor(),
            ))
            .field(FieldDescriptor::new(
                "url",
                TypeRegistry::STRING,
                messages::photo_entry_url_accessor(),
            ))
            .field(FieldDescriptor::new(
                "width",
                TypeRegistry::INT32,
                messages::photo_entry_width_accessor(),
            ))
            .field(FieldDescriptor::new(
                "height",
                TypeRegistry::INT32,
                messages::photo_entry_height_accessor(),
            ))
            .field(FieldDescriptor::new(
                "location",
                location,
                messages::photo_entry_location_accessor(),
            ))
            .constructor(move || Box::new(PhotoEntry::new(photo_entry)))
            .build(),
    );

    registry.define(
        location,
        MessageDescriptor::builder("Location")
            .field(FieldDescriptor::new(
                "lat",
                TypeRegistry::DOUBLE,
                messages::location_lat_accessor(),
            ))
            .field(FieldDescriptor::new(
                "lon",
                TypeRegistry::DOUBLE,
                messages::location_lon_accessor(),
            ))
            .constructor(move || Box::new(Location::new(location)))
            .build(),
    );

    let string_list = registry.list_of(TypeRegistry::STRING);
    registry.define(
        entry_filter,
        MessageDescriptor::builder("EntryFilter")
            .form()
            .field(FieldDescriptor::new(
                "query",
                TypeRegistry::STRING,
                messages::entry_filter_query_accessor(),
            ))
            .field(FieldDescriptor::new(
                "limit",
                TypeRegistry::INT32,
                messages::entry_filter_limit_accessor(),
            ))
            .field(FieldDescriptor::new(
                "offset",
                TypeRegistry::INT32,
                messages::entry_filter_offset_accessor(),
            ))
            .field(FieldDescriptor::new(
                "tags",
                string_list,
                messages::entry_filter_tags_accessor(),
            ))
            .constructor(move || Box::new(EntryFilter::new(entry_filter)))
            .build(),
    );

    let sample = registry.declare();
    registry.define(
        sample,
        MessageDescriptor::builder("Sample")
            .field(FieldDescriptor::new(
                "string0",
                TypeRegistry::STRING,
                messages::sample_string0_accessor(),
            ))
            .field(FieldDescriptor::new(
                "bool0",
                TypeRegistry::BOOL,
                messages::sample_bool0_accessor(),
            ))
            .field(FieldDescriptor::new(
                "short0",
                TypeRegistry::INT16,
                messages::sample_short0_accessor(),
            ))
            .constructor(move || Box::new(Sample::new(sample)))
            .build(),
    );

    registry.define(
        album_error,
        MessageDescriptor::builder("AlbumError")
            .exception()
            .field(FieldDescriptor::new(
                "code",
                error_code,
                messages::album_error_code_accessor(),
            ))
            .field(FieldDescriptor::new(
                "message",
                TypeRegistry::STRING,
                messages::album_error_message_accessor(),
            ))
            .constructor(move || Box::new(AlbumError::new(album_error)))
            .build(),
    );

    let entry_list = registry.list_of(entry);

    registry.define(
        album_service,
        InterfaceDescriptor::builder("AlbumService")
            .method(
                MethodDescriptor::builder("status")
                    .result(TypeRegistry::STRING)
                    .index()
                    .invoker(services::invoke_album_status)
                    .build(),
            )
            .method(
                MethodDescriptor::builder("entries")
                    .arg("album_id", TypeRegistry::INT64)
                    .result(entries_service)
                    .exc(album_error)
                    .invoker(services::invoke_album_entries)
                    .build(),
            )
            .method(
                MethodDescriptor::builder("get")
                    .arg("id", TypeRegistry::INT64)
                    .result(entry)
                    .exc(album_error)
                    .invoker(services::invoke_album_get)
                    .build(),
            )
            .method(
                MethodDescriptor::builder("search")
                    .arg("filter", entry_filter)
                    .result(entry_list)
                    .exc(album_error)
                    .invoker(services::invoke_album_search)
                    .build(),
            )
            .method(
                MethodDescriptor::builder("create")
                    .arg("entry", entry)
                    .result(entry)
                    .post()
                    .exc(album_error)
                    .invoker(services::invoke_album_create)
                    .build(),
            )
            .build(),
    );

    registry.define(
        entries_service,
        InterfaceDescriptor::builder("EntriesService")
            .method(
                MethodDescriptor::builder("list")
                    .arg("limit", TypeRegistry::INT32)
                    .result(entry_list)
                    .invoker(services::invoke_entries_list)
                    .build(),
            )
            .method(
                MethodDescriptor::builder("count")
                    .result(TypeRegistry::INT32)
                    .invoker(services::invoke_entries_count)
                    .build(),
            )
            .build(),
    );

    registry.link().expect("the album schema must link");

    AlbumSchema {
        registry,
        entry_kind,
        error_code,
        entry,
        text_entry,
        photo_entry,
        location,
        entry_filter,
        sample,
        album_error,
        entry_list,
        album_service,
        entries_service,
    }
}
