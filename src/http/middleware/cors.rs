//! CORS stage.

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::http::middleware::PipelineState;
use crate::http::request::RequestInfo;

pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, POST, PUT, DELETE, OPTIONS"),
    ("access-control-allow-headers", "Content-Type, Authorization, X-Request-ID"),
];

/// Add CORS headers; answer preflight requests with 200 without going further in.
pub async fn cors_middleware(
    State(state): State<PipelineState>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let preflight = request.method() == Method::OPTIONS;

    if !origin.is_empty() {
        let info = RequestInfo::from_request(&request);
        let scope = info.scope();
        let logger = state.logger.at(crate::call_site!()).with_fields([
            ("http_method", Value::from(info.method.as_str())),
            ("http_path", Value::from(info.path.as_str())),
            ("origin", Value::from(origin.as_str())),
            ("request_id", Value::from(scope.request_id())),
        ]);
        if preflight {
            logger.debug_ctx(&scope, "CORS preflight request handled");
        } else {
            logger.debug_ctx(&scope, "CORS request received");
        }
    }

    let mut response = if preflight {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };
    apply_cors_headers(&mut response);
    response
}

pub fn apply_cors_headers(response: &mut Response) {
    let headers = response.headers_mut();
    for (name, value) in CORS_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
}
