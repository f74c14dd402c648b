//! Per-request correlation identifiers.
//!
//! A [`CorrelationScope`] is an immutable value threaded explicitly through
//! the request path (via request extensions in the HTTP layer). Nothing is
//! stored in globals or thread-locals, so concurrent requests cannot observe
//! each other's identifiers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;
use std::sync::Arc;

/// Trace, user and request identifiers for one logical request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationScope {
    trace_id: Option<Arc<str>>,
    user_id: Option<Arc<str>>,
    request_id: Option<Arc<str>>,
}

fn non_empty(id: impl AsRef<str>) -> Option<Arc<str>> {
    let id = id.as_ref();
    (!id.is_empty()).then(|| Arc::from(id))
}

impl CorrelationScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trace_id(&self, id: impl AsRef<str>) -> Self {
        Self { trace_id: non_empty(id), ..self.clone() }
    }

    pub fn with_user_id(&self, id: impl AsRef<str>) -> Self {
        Self { user_id: non_empty(id), ..self.clone() }
    }

    pub fn with_request_id(&self, id: impl AsRef<str>) -> Self {
        Self { request_id: non_empty(id), ..self.clone() }
    }

    /// Trace id, or `""` when absent.
    pub fn trace_id(&self) -> &str {
        self.trace_id.as_deref().unwrap_or_default()
    }

    /// User id, or `""` when absent.
    pub fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or_default()
    }

    /// Request id, or `""` when absent.
    pub fn request_id(&self) -> &str {
        self.request_id.as_deref().unwrap_or_default()
    }
}

/// Handlers can take the scope directly; outside the logging stage it is empty.
impl<S> FromRequestParts<S> for CorrelationScope
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<CorrelationScope>().cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_ids_read_as_empty() {
        let scope = CorrelationScope::new();
        assert_eq!(scope.trace_id(), "");
        assert_eq!(scope.user_id(), "");
        assert_eq!(scope.request_id(), "");
    }

    #[test]
    fn setters_return_new_scopes() {
        let base = CorrelationScope::new().with_trace_id("t-1");
        let derived = base.with_user_id("u-7").with_request_id("r-9");

        assert_eq!(base.user_id(), "");
        assert_eq!(base.request_id(), "");
        assert_eq!(derived.trace_id(), "t-1");
        assert_eq!(derived.user_id(), "u-7");
        assert_eq!(derived.request_id(), "r-9");
    }

    #[test]
    fn empty_id_clears() {
        let scope = CorrelationScope::new().with_request_id("r-1").with_request_id("");
        assert_eq!(scope, CorrelationScope::new());
    }
}
