//! Modules with generic logic used by several modules of the tracker.
pub mod bit_torrent;
pub mod clock;
