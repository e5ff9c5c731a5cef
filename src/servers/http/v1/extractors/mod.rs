//! Axum extractors for the HTTP tracker requests.
pub mod announce_key;
pub mod announce_request;
pub mod scrape_request;
