//! Response sink handed to handlers.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;

/// Buffered response sink.
///
/// Handlers write a status, headers and body here; the server converts the
/// sink into the wire response after the handler returns. An untouched sink
/// becomes an empty `200 OK`.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Shorthand for the common case.
    pub fn set_content_type(&mut self, value: HeaderValue) {
        self.headers.insert(CONTENT_TYPE, value);
    }

    /// Append bytes to the body.
    pub fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn into_response(self) -> hyper::Response<Full<Bytes>> {
        let mut res = hyper::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *res.headers_mut() = self.headers;
        res
    }
}

// Lets handlers build bodies with `write!`, mirroring how they would print
// into any other sink. Formatting into a Vec cannot fail.
impl std::fmt::Write for ResponseWriter {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.body.extend_from_slice(s.as_bytes());
        Ok(())
    }
}
