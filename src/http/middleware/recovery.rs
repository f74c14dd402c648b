//! Panic recovery stage.
//!
//! Outermost stage. It assigns the request id for the whole chain so the
//! fallback 500 can carry it, along with the security and CORS headers the
//! inner stages never got to add.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;

use crate::http::middleware::cors::apply_cors_headers;
use crate::http::middleware::PipelineState;
use crate::http::request::{resolve_request_id, RequestInfo, X_REQUEST_ID};
use crate::observability::CorrelationScope;
use crate::security::headers::apply_security_headers;

/// Run the rest of the chain; a panic becomes a logged 500 instead of a
/// dropped connection.
pub async fn recovery_middleware(
    State(state): State<PipelineState>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = resolve_request_id(request.headers());
    let scope = request
        .extensions()
        .get::<CorrelationScope>()
        .cloned()
        .unwrap_or_default()
        .with_request_id(&request_id);
    request.extensions_mut().insert(scope);

    let info = RequestInfo::from_request(&request);
    let bypassed = state.is_bypassed(&info.path);

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let scope = info.scope();
            state
                .logger
                .at(crate::call_site!())
                .with_fields([
                    ("http_method", Value::from(info.method.as_str())),
                    ("http_path", Value::from(info.path.as_str())),
                    ("http_remote_addr", Value::from(info.remote_addr.as_str())),
                    ("request_id", Value::from(scope.request_id())),
                    ("panic", Value::from(panic_message(payload.as_ref()))),
                ])
                .error_ctx(&scope, "HTTP handler panic recovered");

            let mut response =
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
            apply_security_headers(&mut response);
            apply_cors_headers(&mut response);
            if !bypassed {
                if let Ok(value) = HeaderValue::from_str(&request_id) {
                    response.headers_mut().insert(X_REQUEST_ID.clone(), value);
                }
            }
            response
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_common_payloads() {
        let literal = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(literal.as_ref()), "boom");

        let formatted = std::panic::catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        assert_eq!(panic_message(formatted.as_ref()), "code 7");

        let other = std::panic::catch_unwind(|| std::panic::panic_any(42_u8)).unwrap_err();
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
