//! Transport-neutral request and response values.
//!
//! These decouple the protocol codec from whatever actually moves bytes.
//! The path is kept url-encoded; query and post parameters hold url-decoded
//! values in insertion order — the transport owns the query-string and
//! form-body encoding.

use http::{Method, StatusCode};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// A REST request: HTTP method, url-encoded path, and decoded query/post
/// parameter maps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    post: Vec<(String, String)>,
}

impl RestRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            path: String::new(),
            query: Vec::new(),
            post: Vec::new(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.path = path.into();
        self
    }

    pub fn append_path(&mut self, segment: &str) -> &mut Self {
        self.path.push_str(segment);
        self
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn post_params(&self) -> &[(String, String)] {
        &self.post
    }

    pub fn add_query(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn add_post(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.post.push((name.into(), value.into()));
        self
    }
}

/// A REST response: status code, decoded body, and content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestResponse {
    status: StatusCode,
    content: String,
    content_type: &'static str,
}

impl RestResponse {
    pub fn new(status: StatusCode, content: impl Into<String>, content_type: &'static str) -> Self {
        Self {
            status,
            content: content.into(),
            content_type,
        }
    }

    /// A successful JSON envelope response.
    pub fn ok_json(content: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, content, JSON_CONTENT_TYPE)
    }

    /// A plain-text error response.
    pub fn error(status: StatusCode, content: impl Into<String>) -> Self {
        Self::new(status, content, TEXT_CONTENT_TYPE)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn content_type(&self) -> &str {
        self.content_type
    }

    pub fn has_ok_status(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn has_json_content_type(&self) -> bool {
        self.content_type
            .to_ascii_lowercase()
            .starts_with("application/json")
    }
}
