//! Setup for the application logging.
//!
//! It redirects the tracing output to the standard output with the level
//! defined in the configuration:
//!
//! - `off`
//! - `error`
//! - `warn`
//! - `info`
//! - `debug`
//! - `trace`
use std::str::FromStr;
use std::sync::Once;

use tracing::info;
use tracing::level_filters::LevelFilter;

use crate::config::Configuration;

static INIT: Once = Once::new();

/// It redirects the tracing output to the standard output with the level
/// defined in the configuration.
pub fn setup(cfg: &Configuration) {
    let level = config_level_or_default(cfg.log_level.as_deref());

    if level == LevelFilter::OFF {
        return;
    }

    INIT.call_once(|| {
        stdout_config(level);
    });
}

fn config_level_or_default(log_level: Option<&str>) -> LevelFilter {
    match log_level {
        None => LevelFilter::INFO,
        Some(level) => LevelFilter::from_str(level).unwrap_or(LevelFilter::INFO),
    }
}

fn stdout_config(filter: LevelFilter) {
    tracing_subscriber::fmt().with_max_level(filter).init();

    info!("logging initialized.");
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::config_level_or_default;

    #[test]
    fn it_should_default_to_info() {
        assert_eq!(config_level_or_default(None), LevelFilter::INFO);
        assert_eq!(config_level_or_default(Some("not-a-level")), LevelFilter::INFO);
    }

    #[test]
    fn it_should_parse_the_configured_level() {
        assert_eq!(config_level_or_default(Some("off")), LevelFilter::OFF);
        assert_eq!(config_level_or_default(Some("debug")), LevelFilter::DEBUG);
    }
}
