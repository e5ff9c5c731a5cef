//! The application jobs: long-running tasks spawned at startup.
pub mod http_tracker;
pub mod key_prune;
