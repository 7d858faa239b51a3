//! Request scope extraction
//!
//! The scope comes from the `x-scope` header. Requests without it use the
//! default scope.

use crate::error::ApiError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use salescribe_common::models::Scope;

pub const SCOPE_HEADER: &str = "x-scope";

/// Validated scope of the current request
#[derive(Debug, Clone)]
pub struct RequestScope(pub Scope);

#[async_trait]
impl<S> FromRequestParts<S> for RequestScope
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(SCOPE_HEADER) else {
            return Ok(RequestScope(Scope::default()));
        };
        let raw = value
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("{} header is not valid text", SCOPE_HEADER)))?;
        Scope::parse(raw)
            .map(RequestScope)
            .map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}
