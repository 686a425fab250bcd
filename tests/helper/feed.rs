//! Feed test utilities

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use tempfile::TempDir;

use update_resolver::update::date::parse_date;
use update_resolver::update::feed::Feed;
use update_resolver::update::package::Environment;

/// Builder for feed documents
#[derive(Default)]
pub struct FeedBuilder {
    latest: Option<String>,
    versions: Map<String, Value>,
    incidents: Vec<Value>,
    urls: Map<String, Value>,
    messages: Vec<Value>,
    php: Map<String, Value>,
}

impl FeedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(mut self, latest: &str) -> Self {
        self.latest = Some(latest.to_string());
        self
    }

    pub fn version(mut self, constraint: &str, line: Value) -> Self {
        self.versions.insert(constraint.to_string(), line);
        self
    }

    pub fn incident(mut self, affected: &str, fixed: &str, severity: &str) -> Self {
        self.incidents.push(json!({
            "affected": affected,
            "description": format!("Vulnerability in {affected}"),
            "fixed": fixed,
            "link": format!("https://example.com/advisories/{}", self.incidents.len() + 1),
            "severity": severity,
        }));
        self
    }

    /// Changes and upgrade URLs for every version
    pub fn default_urls(mut self) -> Self {
        self.urls.insert(
            "*".to_string(),
            json!({
                "changes": "https://example.com/releases/{version}",
                "upgrade": "https://example.com/upgrade/{current}-{version}",
            }),
        );
        self
    }

    pub fn message(mut self, message: Value) -> Self {
        self.messages.push(message);
        self
    }

    pub fn php(mut self, release: &str, end_of_life: &str) -> Self {
        self.php
            .insert(release.to_string(), Value::String(end_of_life.to_string()));
        self
    }

    pub fn to_json(&self) -> Value {
        let mut document = json!({
            "versions": self.versions,
            "incidents": self.incidents,
            "urls": self.urls,
            "messages": self.messages,
            "php": self.php,
        });
        if let Some(latest) = &self.latest {
            document["latest"] = Value::String(latest.clone());
        }
        document
    }

    pub fn build(&self) -> Feed {
        serde_json::from_value(self.to_json()).unwrap()
    }
}

pub fn date(input: &str) -> DateTime<Utc> {
    parse_date(input).unwrap()
}

/// Environment with fixed clock and versions
pub fn environment() -> Environment {
    Environment {
        host_version: Some("3.5.0".to_string()),
        runtime_version: Some("8.2.7".to_string()),
        license_renewal: None,
        now: date("2025-06-01"),
    }
}

/// Write a feed document below `<dir>/<key>.json`
pub fn write_feed(dir: &TempDir, key: &str, feed: &FeedBuilder) -> PathBuf {
    let path = dir.path().join(format!("{key}.json"));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, feed.to_json().to_string()).unwrap();
    path
}
