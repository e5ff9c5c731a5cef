//! Process setup: configuration loading, logging and job wiring.
pub mod app;
pub mod jobs;
pub mod logging;
