//! The tracker configuration, loaded from a TOML file.
//!
//! Every value has a default so a bare file (or none at all) yields a
//! working public instance:
//!
//! ```toml
//! db_path = "./storage/seedmerit.db"
//! cache_entries = 10000
//! admin_secret = "s3cr3t"
//! disable_allowlist = false
//! backend_port = 3000
//! frontend_hostname = "https://tracker.example.com"
//! algorithm = "good_seeds"
//! log_level = "info"
//! ```
//!
//! An absent `admin_secret` disables the restricted API endpoints entirely.
use serde::Deserialize;
use thiserror::Error;

use crate::core::algorithms::Algorithm;

pub const DEFAULT_BACKEND_PORT: u16 = 3000;
pub const DEFAULT_CACHE_ENTRIES: usize = 10_000;

/// The process-wide configuration record. It is constructed once at startup
/// and passed explicitly into every component that needs it.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Configuration {
    /// SQLite database path, or an SQLite URI.
    pub db_path: String,
    /// Capacity of the in-process admission cache.
    pub cache_entries: usize,
    /// Shared secret for the restricted API endpoints. `None` disables them.
    pub admin_secret: Option<String>,
    /// When set, unknown info-hashes are auto-admitted on first announce.
    pub disable_allowlist: bool,
    /// Port the HTTP server binds to.
    pub backend_port: u16,
    /// Origin allowed by CORS on the public JSON endpoints.
    pub frontend_hostname: Option<String>,
    /// The peering algorithm deciding how many peers each reply carries.
    pub algorithm: Algorithm,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: Option<String>,
}

impl Default for Configuration {
    fn default() -> Configuration {
        Configuration {
            db_path: "./storage/seedmerit.db".to_string(),
            cache_entries: DEFAULT_CACHE_ENTRIES,
            admin_secret: None,
            disable_allowlist: false,
            backend_port: DEFAULT_BACKEND_PORT,
            frontend_hostname: None,
            algorithm: Algorithm::default(),
            log_level: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Configuration {
    /// # Errors
    ///
    /// Will return an error if `data` is not valid TOML for this struct.
    pub fn load(data: &str) -> Result<Configuration, toml::de::Error> {
        toml::from_str(data)
    }

    /// # Errors
    ///
    /// Will return an error if the file cannot be read or parsed.
    pub fn load_file(path: &str) -> Result<Configuration, ConfigError> {
        Ok(Self::load(&std::fs::read_to_string(path)?)?)
    }

    /// A configuration backed by a private in-memory database. Used by
    /// tests.
    #[must_use]
    pub fn ephemeral() -> Configuration {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let instance = COUNTER.fetch_add(1, Ordering::SeqCst);

        Configuration {
            db_path: format!("file:seedmerit-ephemeral-{instance}?mode=memory&cache=shared"),
            ..Configuration::default()
        }
    }

    /// Like [`Configuration::ephemeral`], with the allowlist disabled.
    #[must_use]
    pub fn ephemeral_without_allowlist() -> Configuration {
        Configuration {
            disable_allowlist: true,
            ..Configuration::ephemeral()
        }
    }

    /// Like [`Configuration::ephemeral`], with a specific peering algorithm.
    #[must_use]
    pub fn ephemeral_with_algorithm(algorithm: Algorithm) -> Configuration {
        Configuration {
            algorithm,
            ..Configuration::ephemeral()
        }
    }
}
