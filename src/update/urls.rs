//! Changelog and upgrade guide URLs

use indexmap::IndexMap;

use crate::update::diagnostics::Diagnostics;
use crate::update::labels::template;

/// What a URL is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlPurpose {
    /// Release notes / changelog
    Changes,
    /// Upgrade guide for a new major release
    Upgrade,
}

impl UrlPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlPurpose::Changes => "changes",
            UrlPurpose::Upgrade => "upgrade",
        }
    }
}

/// URL templates keyed by version constraint, then by purpose
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlRegistry {
    entries: IndexMap<String, IndexMap<String, String>>,
}

impl UrlRegistry {
    pub fn new(entries: IndexMap<String, IndexMap<String, String>>) -> Self {
        Self { entries }
    }

    /// Find the first URL for `version` and `purpose`
    ///
    /// `{current}` and `{version}` in the template are replaced with the
    /// installed and the target version. A missing URL is recorded; callers
    /// show the status without a link.
    pub fn find(
        &self,
        version: &str,
        purpose: UrlPurpose,
        current: &str,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        for (constraint, urls) in &self.entries {
            if !diagnostics.match_version(version, constraint, "while checking URL") {
                continue;
            }

            if let Some(url) = urls.get(purpose.as_str()).filter(|url| !url.is_empty()) {
                return Some(template(url, &[("current", current), ("version", version)]));
            }
        }

        diagnostics.record(format!("No matching URL found for {{package}}@{version}"));
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> UrlRegistry {
        let mut entries = IndexMap::new();
        entries.insert(
            "4.0".to_string(),
            IndexMap::from([(
                "changes".to_string(),
                "https://example.com/releases/4".to_string(),
            )]),
        );
        entries.insert(
            ">=4.0".to_string(),
            IndexMap::from([
                (
                    "changes".to_string(),
                    "https://example.com/releases/{version}".to_string(),
                ),
                (
                    "upgrade".to_string(),
                    "https://example.com/upgrade/{current}-to-{version}".to_string(),
                ),
            ]),
        );
        entries.insert(
            "*".to_string(),
            IndexMap::from([(
                "changes".to_string(),
                "https://example.com/changelog".to_string(),
            )]),
        );
        UrlRegistry::new(entries)
    }

    #[test]
    fn find_returns_first_matching_entry() {
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            registry().find("4.0", UrlPurpose::Changes, "3.5.0", &mut diagnostics),
            Some("https://example.com/releases/4".to_string())
        );
        assert_eq!(
            registry().find("4.0.1", UrlPurpose::Changes, "3.5.0", &mut diagnostics),
            Some("https://example.com/releases/4.0.1".to_string())
        );
        assert_eq!(
            registry().find("3.5.2", UrlPurpose::Changes, "3.5.0", &mut diagnostics),
            Some("https://example.com/changelog".to_string())
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn find_skips_entries_without_the_purpose() {
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            registry().find("4.0.0", UrlPurpose::Upgrade, "3.5.0", &mut diagnostics),
            Some("https://example.com/upgrade/3.5.0-to-4.0.0".to_string())
        );
    }

    #[test]
    fn find_records_error_when_nothing_matches() {
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            registry().find("3.5.0", UrlPurpose::Upgrade, "3.5.0", &mut diagnostics),
            None
        );
        assert_eq!(
            diagnostics.errors()[0].message,
            "No matching URL found for {package}@3.5.0"
        );
    }
}
