//! Request data read off the wire before handler invocation.

use bytes::Bytes;
use http::{HeaderMap, Method};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ReadError {
    #[error("request body exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
    #[error("failed to read request body: {0}")]
    Read(Box<dyn std::error::Error + Send + Sync>),
}

/// An incoming request as handlers see it: metadata plus the fully
/// buffered body.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// Buffer the request off the hyper body, enforcing the configured
    /// body size cap.
    pub(crate) async fn read(req: hyper::Request<Incoming>, limit: usize) -> Result<Self, ReadError> {
        let (parts, body) = req.into_parts();
        let body = Limited::new(body, limit)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    ReadError::TooLarge { limit }
                } else {
                    ReadError::Read(e)
                }
            })?
            .to_bytes();

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}
