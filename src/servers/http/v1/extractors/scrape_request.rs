//! Axum [`extractor`](axum::extract) for the [`Scrape`] request.
//!
//! The scrape convention is loose: a missing or malformed query simply
//! means "scrape everything", so this extractor never rejects.
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Response;

use crate::servers::http::v1::query::Query;
use crate::servers::http::v1::requests::scrape::Scrape;

/// Extractor for the [`Scrape`] request.
pub struct ExtractRequest(pub Scrape);

#[async_trait]
impl<S> FromRequestParts<S> for ExtractRequest
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let scrape_request = parts
            .uri
            .query()
            .and_then(|raw_query| raw_query.parse::<Query>().ok())
            .map(Scrape::from)
            .unwrap_or_default();

        Ok(ExtractRequest(scrape_request))
    }
}
