//! Axum [`extractor`](axum::extract) for the announce key path segment.
//!
//! Tracker URLs embed a per-user key in the path:
//! `/{announce_key}/announce`. A path segment that is not even shaped like
//! a key (30 hex chars) is by definition untracked, so the rejection reuses
//! the untracked-key failure reply.
use axum::async_trait;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use crate::core::auth::Key;
use crate::servers::http::v1::responses;

/// Extractor for the announce [`Key`] in the URL path.
pub struct ExtractKey(pub Key);

#[async_trait]
impl<S> FromRequestParts<S> for ExtractKey
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(Path(raw_key)) = Path::<String>::from_request_parts(parts, state).await else {
            return Err(responses::error::Error::untracked_announce_key().into_response());
        };

        match raw_key.parse::<Key>() {
            Ok(key) => Ok(ExtractKey(key)),
            Err(_) => Err(responses::error::Error::untracked_announce_key().into_response()),
        }
    }
}
