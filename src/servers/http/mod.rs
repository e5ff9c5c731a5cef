//! The HTTP tracker delivery layer.
pub mod percent_encoding;
pub mod v1;
