use album_service::{
    AlbumError, AlbumSchema, AlbumService, EntriesService, EntryFilter, ErrorCode, TextEntry,
};
use std::sync::Arc;
use typewire_core::Message;

// An in-memory album service backing the integration tests. Responses are
// derived from the arguments so tests can assert the full request flow.
pub struct AlbumServiceImpl {
    pub schema: Arc<AlbumSchema>,
}

fn text_entry(schema: &AlbumSchema, id: i64, title: &str) -> Box<dyn Message> {
    let mut entry = TextEntry::new(schema.text_entry);
    entry.id = Some(id);
    entry.title = Some(title.to_string());
    entry.text = Some(format!("body of {title}"));
    Box::new(entry)
}

fn not_found(schema: &AlbumSchema, message: &str) -> AlbumError {
    let mut error = AlbumError::new(schema.album_error);
    error.code = Some(ErrorCode::NotFound);
    error.message = Some(message.to_string());
    error
}

impl AlbumService for AlbumServiceImpl {
    fn status(&self) -> String {
        "ready".to_string()
    }

    fn entries(&self, album_id: i64) -> Box<dyn EntriesService> {
        Box::new(EntriesServiceImpl {
            schema: Arc::clone(&self.schema),
            album_id,
        })
    }

    fn get(&self, id: Option<i64>) -> Result<Box<dyn Message>, AlbumError> {
        match id {
            Some(id) if id < 100 => Ok(text_entry(&self.schema, id, "found")),
            _ => Err(not_found(&self.schema, "no such entry")),
        }
    }

    fn search(&self, filter: EntryFilter) -> Result<Vec<Box<dyn Message>>, AlbumError> {
        let title = filter.query.unwrap_or_default();
        let limit = filter.limit.unwrap_or(1).max(0) as i64;
        Ok((0..limit)
            .map(|id| text_entry(&self.schema, id, &title))
            .collect())
    }

    fn create(&self, entry: Option<Box<dyn Message>>) -> Result<Box<dyn Message>, AlbumError> {
        entry.ok_or_else(|| not_found(&self.schema, "nothing to create"))
    }
}

pub struct EntriesServiceImpl {
    schema: Arc<AlbumSchema>,
    album_id: i64,
}

impl EntriesService for EntriesServiceImpl {
    fn list(&self, limit: Option<i32>) -> Result<Vec<Box<dyn Message>>, AlbumError> {
        if self.album_id == 403 {
            let mut error = AlbumError::new(self.schema.album_error);
            error.code = Some(ErrorCode::Forbidden);
            error.message = Some("album is private".to_string());
            return Err(error);
        }

        let limit = limit.unwrap_or(1).max(0) as i64;
        Ok((0..limit)
            .map(|id| text_entry(&self.schema, id, "listed"))
            .collect())
    }

    fn count(&self) -> i32 {
        // Echoes the chained path argument back to the caller.
        self.album_id as i32
    }
}
