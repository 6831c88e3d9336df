//! Principal extraction from the upstream authentication boundary.
//!
//! Token verification happens in the gateway; by the time a request reaches
//! this backend the resolved identity travels in a trusted header. A missing
//! or empty header fails the call before the pipeline runs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;

use fieldgate_core::Principal;

use crate::api::ErrorResponse;

pub const PRINCIPAL_HEADER: &str = "x-authenticated-principal";

/// Extractor wrapping the authenticated [`Principal`].
#[derive(Debug)]
pub struct AuthPrincipal(pub Principal);

impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(PRINCIPAL_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Principal::new)
            .map(AuthPrincipal)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::unauthenticated()),
                )
            })
    }
}
