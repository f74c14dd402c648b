//! Response observation for request logging.
//!
//! # Responsibilities
//! - Track the status code the handler set (200 unless told otherwise)
//! - Count the body bytes sent to the client
//!
//! # Design Decisions
//! - The body is collected once so its size is exact when the completion
//!   record is written; ingestion responses are small JSON documents
//! - A body that fails mid-stream is reported as a 500 with the bytes seen so far

use axum::{
    body::{Body, Bytes},
    http::StatusCode,
    response::Response,
};

/// Status and size of an outbound response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseCapture {
    status: StatusCode,
    bytes_written: u64,
}

impl Default for ResponseCapture {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            bytes_written: 0,
        }
    }
}

impl ResponseCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the status the handler set. The last call wins.
    pub fn write_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Record `len` more body bytes.
    pub fn write(&mut self, len: usize) {
        self.bytes_written += len as u64;
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Pass `response` through, observing its status and body size.
    pub async fn observe(response: Response) -> (Response, ResponseCapture) {
        let mut capture = ResponseCapture::new();
        let (mut parts, body) = response.into_parts();
        capture.write_status(parts.status);

        match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => {
                capture.write(bytes.len());
                (Response::from_parts(parts, Body::from(bytes)), capture)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Response body failed while streaming");
                parts.status = StatusCode::INTERNAL_SERVER_ERROR;
                parts.headers.remove(axum::http::header::CONTENT_LENGTH);
                capture.write_status(parts.status);
                (Response::from_parts(parts, Body::from(Bytes::new())), capture)
            }
        }
    }
}
