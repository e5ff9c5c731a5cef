//! The delivery layers: the HTTP tracker itself and the JSON API.
pub mod apis;
pub mod http;
