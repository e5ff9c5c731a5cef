//! Seedmerit: an HTTP `BitTorrent` tracker that sizes peer lists by observed
//! seeding behavior.
//!
//! A conventional tracker replies to every announce with a fixed-size random
//! sample of the swarm. Seedmerit instead computes, on every announce, how
//! many peers the requesting client deserves: each user announces through a
//! private URL carrying a per-user key, the tracker accumulates that key's
//! behavior across all torrents (torrents seeded, bytes uploaded, snatches),
//! and a configurable [peering algorithm](crate::core::algorithms) maps that
//! behavior to the peer list size. Seeding more earns faster discovery.
//!
//! The crate is organized like the tracker runs:
//!
//! - [`core`]: the domain layer. Admission, the announce pipeline, the
//!   behavior scoring policies, scrape aggregation, key lifecycle, and the
//!   persistence and cache seams.
//! - [`servers`]: the delivery layer. The bencoded HTTP tracker endpoints
//!   (`/{announce_key}/announce`, `/{announce_key}/scrape`) and the JSON
//!   API under `/api`.
//! - [`bootstrap`] and [`app`]: process setup and the long-running jobs.
//! - [`config`]: the TOML configuration record.
//! - [`shared`]: `BitTorrent` primitives and small helpers.
pub mod app;
pub mod bootstrap;
pub mod config;
pub mod core;
pub mod servers;
pub mod shared;
