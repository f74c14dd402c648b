//! Security response headers and suspicious-request logging.

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use std::borrow::Cow;

use crate::http::middleware::PipelineState;
use crate::http::request::RequestInfo;

/// Headers set on every response.
pub const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
];

/// Whether the request path differs from its own escaped form: it was sent
/// percent-encoded, or it carries bytes that must be escaped in a path.
pub fn has_encoded_path(raw_path: &str) -> bool {
    match urlencoding::decode(raw_path) {
        Ok(decoded) => decoded != escaped_path(raw_path, &decoded),
        Err(_) => true,
    }
}

/// Canonical escaped form of a path: the raw form when it is already a valid
/// encoding, otherwise the decoded path re-escaped.
fn escaped_path<'a>(raw_path: &'a str, decoded: &str) -> Cow<'a, str> {
    if raw_path.bytes().all(allowed_in_encoded_path) {
        return Cow::Borrowed(raw_path);
    }
    let mut escaped = String::with_capacity(decoded.len() * 3);
    for b in decoded.bytes() {
        if must_escape(b) {
            escaped.push_str(&format!("%{b:02X}"));
        } else {
            escaped.push(char::from(b));
        }
    }
    Cow::Owned(escaped)
}

fn allowed_in_encoded_path(b: u8) -> bool {
    matches!(
        b,
        b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'=' | b':' | b'@'
            | b'[' | b']' | b'%'
    ) || !must_escape(b)
}

/// Bytes outside the unreserved set and the path-safe sub-delimiters.
fn must_escape(b: u8) -> bool {
    !(b.is_ascii_alphanumeric()
        || matches!(b, b'-' | b'_' | b'.' | b'~' | b'$' | b'&' | b'+' | b',' | b'/' | b':' | b';' | b'=' | b'@'))
}

/// Security headers stage.
pub async fn security_headers_middleware(
    State(state): State<PipelineState>,
    request: Request,
    next: Next,
) -> Response {
    let info = RequestInfo::from_request(&request);
    let scope = info.scope();

    if info.user_agent.is_empty() {
        state
            .logger
            .at(crate::call_site!())
            .with_fields([
                ("http_method", Value::from(info.method.as_str())),
                ("http_path", Value::from(info.path.as_str())),
                ("http_remote_addr", Value::from(info.remote_addr.as_str())),
                ("request_id", Value::from(scope.request_id())),
            ])
            .warn_ctx(&scope, "Request with empty User-Agent detected");
    }

    if has_encoded_path(&info.path) {
        let decoded = urlencoding::decode(&info.path)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| info.path.clone());
        state
            .logger
            .at(crate::call_site!())
            .with_fields([
                ("http_method", Value::from(info.method.as_str())),
                ("http_path", Value::from(decoded)),
                ("escaped_path", Value::from(info.path.as_str())),
                ("http_remote_addr", Value::from(info.remote_addr.as_str())),
                ("request_id", Value::from(scope.request_id())),
            ])
            .warn_ctx(&scope, "Request with URL encoding detected");
    }

    let mut response = next.run(request).await;
    apply_security_headers(&mut response);
    response
}

pub fn apply_security_headers(response: &mut Response) {
    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
}
