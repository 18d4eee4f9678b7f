//! Runtime configuration read from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::warn;

/// Environment variable holding the public URL of the header logo.
pub const LOGO_URL_VAR: &str = "PATRIMONIO_LOGO_URL";
/// Environment variable holding the per-request fetch timeout in seconds.
pub const FETCH_TIMEOUT_VAR: &str = "PATRIMONIO_FETCH_TIMEOUT_SECS";
/// Environment variable holding the directory backing the local object store.
pub const STORAGE_DIR_VAR: &str = "PATRIMONIO_STORAGE_DIR";
/// Environment variable holding the base URL under which stored objects are served.
pub const PUBLIC_BASE_URL_VAR: &str = "PATRIMONIO_PUBLIC_BASE_URL";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STORAGE_DIR: &str = "./storage";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";

/// Settings shared by the composer and the publisher.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportConfig {
    /// Logo drawn at the top-left of the header, if any.
    pub logo_url: Option<String>,
    /// Timeout applied to every single asset request.
    pub fetch_timeout: Duration,
    /// Root directory of the local object store.
    pub storage_dir: PathBuf,
    /// Base URL prepended to object keys to build public links.
    pub public_base_url: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            logo_url: None,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_owned(),
        }
    }
}

impl ReportConfig {
    /// Builds the configuration from the `PATRIMONIO_*` environment variables, falling back to
    /// the defaults for anything unset or blank.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let fetch_timeout = match read(FETCH_TIMEOUT_VAR) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(err) => {
                    warn!(
                        "Ignoring {}={:?} ({}); using {}s",
                        FETCH_TIMEOUT_VAR, raw, err, DEFAULT_FETCH_TIMEOUT_SECS
                    );
                    defaults.fetch_timeout
                }
            },
            None => defaults.fetch_timeout,
        };

        Self {
            logo_url: read(LOGO_URL_VAR),
            fetch_timeout,
            storage_dir: read(STORAGE_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            public_base_url: read(PUBLIC_BASE_URL_VAR).unwrap_or(defaults.public_base_url),
        }
    }
}
