//! Setup for the main tracker application process.
use std::sync::Arc;

use crate::bootstrap::logging;
use crate::config::Configuration;
use crate::core::Tracker;

/// It loads the configuration, initializes logging and builds the tracker.
///
/// The configuration is read from the file given as the first CLI argument;
/// without one, the defaults are used.
///
/// # Panics
///
/// Will panic if the configuration file is invalid or the database cannot
/// be set up: there is nothing to serve without either.
#[must_use]
pub fn setup() -> (Configuration, Arc<Tracker>) {
    let config = load_configuration();

    logging::setup(&config);

    let tracker = Arc::new(Tracker::new(&config).expect("could not initialize the tracker database"));

    (config, tracker)
}

fn load_configuration() -> Configuration {
    match std::env::args().nth(1) {
        Some(path) => Configuration::load_file(&path).expect("invalid configuration file"),
        None => Configuration::default(),
    }
}
