use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::update::date::parse_date;

// =============================================================================
// Resolution constants
// =============================================================================

/// Upper bound of the minimum security update search
pub const MAX_FIX_ITERATIONS: usize = 10;

/// Default link of the end-of-life notice for release lines
pub const END_OF_LIFE_LINK: &str = "https://getkirby.com/security/end-of-life";

/// Link of the runtime end-of-life notice
pub const RUNTIME_END_OF_LIFE_LINK: &str = "https://getkirby.com/security/php-end-of-life";

/// Resolver configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Only report security relevant updates
    pub security_only: bool,
    /// Date the license was last renewed
    pub license_renewal: Option<String>,
    /// Installed version of the host system
    pub host_version: Option<String>,
    /// Installed runtime version
    pub runtime_version: Option<String>,
    /// Directory containing the feed documents (`security.json`, `plugins/<name>.json`)
    pub feed_dir: Option<PathBuf>,
}

impl ResolverConfig {
    /// Load the configuration from `path`, or from the default location
    ///
    /// A missing default configuration is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(PathBuf::from)
            .or_else(|| Some(config_path()).filter(|p| p.exists()));

        match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config: {}", path.display()))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse config: {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    /// License renewal date; an unparseable date counts as no license
    pub fn license_renewal(&self) -> Option<DateTime<Utc>> {
        let renewal = self.license_renewal.as_deref()?;
        let parsed = parse_date(renewal);
        if parsed.is_none() {
            tracing::warn!("Invalid license renewal date: {}", renewal);
        }
        parsed
    }
}

/// Returns the path to the data directory for update-resolver.
/// Uses $XDG_DATA_HOME/update-resolver if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/update-resolver,
/// or ./update-resolver if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the default configuration file.
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("update-resolver.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("update-resolver")
}
