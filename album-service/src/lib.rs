//! # Album Service
//!
//! **INTERNAL USE ONLY**: This crate plays the role of typewire generated
//! code for integration testing `typewire-core`. It hand-writes what a code
//! generator would emit for a small photo-album schema: message structs with
//! presence-wrapped fields, field accessors, enums, service traits with
//! per-method invoker functions, and the registration code that builds the
//! descriptor graph in a fresh registry.
//!
//! The schema exercises every interesting corner of the runtime: a
//! polymorphic message tree (`Entry` → `TextEntry`/`PhotoEntry`, with the
//! `link` discriminator value deliberately unmapped), a nested message
//! (`Location`), a form message (`EntryFilter`), a declared exception
//! (`AlbumError`), and a chaining interface (`AlbumService` →
//! `EntriesService`) with index and POST methods.

mod messages;
mod schema;
mod services;

pub use messages::{
    AlbumError, Entry, EntryFilter, EntryKind, ErrorCode, Location, PhotoEntry, Sample, TextEntry,
};
pub use schema::{AlbumSchema, schema};
pub use services::{AlbumService, EntriesService};
