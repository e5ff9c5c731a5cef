//! HTTP tracker responses. All of them are bencoded and served with a
//! `200 OK` status, including failures.
pub mod announce;
pub mod error;
pub mod scrape;
