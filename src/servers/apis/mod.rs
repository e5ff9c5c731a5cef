//! The tracker JSON API.
//!
//! Public endpoints (CORS-enabled for the configured frontend):
//!
//! - `GET /api/stats`: tracker-wide aggregates.
//! - `GET /api/infohashes`: the per-torrent listing.
//! - `GET /api/generate`: issues a new announce key.
//! - `GET /api/torrentfile`: returns a stored torrent with the caller's
//!   announce URL injected.
//!
//! Restricted endpoints (gated on the shared admin secret; disabled when no
//! secret is configured):
//!
//! - `POST /api/infohash`: registers an info-hash.
//! - `POST /api/torrentfile`: registers a torrent file upload.
//! - `DELETE /api/infohash`: removes an info-hash.
pub mod handlers;
pub mod resources;
pub mod responses;
pub mod routes;
