//! Update feed payload
//!
//! The feed is fetched and cached by an external component; this module only
//! describes its shape. Mappings keep the order of the JSON document because
//! the first matching entry wins.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::version::error::FeedError;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Feed {
    /// Latest released version of the package
    pub latest: Option<String>,
    /// Release lines keyed by version constraint
    pub versions: IndexMap<String, RawReleaseLine>,
    pub incidents: Vec<RawAdvisory>,
    /// URL templates keyed by version constraint, then by purpose
    pub urls: IndexMap<String, IndexMap<String, String>>,
    pub messages: Vec<RawMessage>,
    /// Runtime end-of-life dates keyed by `major.minor`
    pub php: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RawReleaseLine {
    pub status: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "initialRelease")]
    pub initial_release: Option<String>,
    pub latest: Option<String>,
    #[serde(rename = "status-link")]
    pub status_link: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RawAdvisory {
    pub affected: Option<String>,
    pub description: String,
    pub fixed: String,
    pub link: String,
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RawMessage {
    /// Constraint on the host system version
    #[serde(rename = "kirby")]
    pub host: Option<String>,
    /// Constraint on the plugin version
    pub plugin: Option<String>,
    /// Constraint on the runtime version
    #[serde(rename = "php")]
    pub runtime: Option<String>,
    pub text: String,
    pub link: Option<String>,
    pub icon: Option<String>,
}

impl RawMessage {
    /// Constraint declared for a filter key (`kirby`, `plugin` or `php`)
    pub fn constraint(&self, key: &str) -> Option<&str> {
        match key {
            "kirby" => self.host.as_deref(),
            "plugin" => self.plugin.as_deref(),
            "php" => self.runtime.as_deref(),
            _ => None,
        }
    }
}

impl Feed {
    pub fn from_json(content: &str) -> Result<Self, FeedError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, FeedError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// Result of fetching the feed, produced by the fetch layer
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Loaded(Feed),
    /// A previous request timed out, so no further requests were made
    TimedOut,
    Failed(String),
}

impl From<Result<Feed, FeedError>> for FetchOutcome {
    fn from(result: Result<Feed, FeedError>) -> Self {
        match result {
            Ok(feed) => FetchOutcome::Loaded(feed),
            Err(e) => FetchOutcome::Failed(e.to_string()),
        }
    }
}
