//! Release lines and their lifecycle status

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::debug;

use crate::update::date::parse_date;
use crate::update::diagnostics::Diagnostics;
use crate::update::feed::RawReleaseLine;
use crate::version::semver::{CompareResult, compare_to_latest};

/// Lifecycle status of a release line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseStatus {
    Latest,
    NoVulnerabilities,
    Unreleased,
    EndOfLife,
}

impl ReleaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseStatus::Latest => "latest",
            ReleaseStatus::NoVulnerabilities => "no-vulnerabilities",
            ReleaseStatus::Unreleased => "unreleased",
            ReleaseStatus::EndOfLife => "end-of-life",
        }
    }
}

impl std::str::FromStr for ReleaseStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(ReleaseStatus::Latest),
            "no-vulnerabilities" => Ok(ReleaseStatus::NoVulnerabilities),
            "unreleased" => Ok(ReleaseStatus::Unreleased),
            "end-of-life" => Ok(ReleaseStatus::EndOfLife),
            _ => Err(()),
        }
    }
}

/// Metadata of one release line (a bucket of versions)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseLine {
    /// `None` for statuses without special meaning (e.g. active support)
    pub status: Option<ReleaseStatus>,
    pub description: Option<String>,
    pub initial_release: Option<DateTime<Utc>>,
    /// Latest version released in this line
    pub latest: Option<String>,
    pub link: Option<String>,
}

impl ReleaseLine {
    /// Line for versions newer than the latest release
    pub fn unreleased() -> Self {
        Self {
            status: Some(ReleaseStatus::Unreleased),
            ..Default::default()
        }
    }

    pub fn from_feed(raw: &RawReleaseLine) -> Self {
        let status: Option<ReleaseStatus> = raw.status.as_deref().and_then(|s| s.parse().ok());
        let initial_release = match status {
            Some(ReleaseStatus::Unreleased) => None,
            _ => raw.initial_release.as_deref().and_then(parse_date),
        };

        Self {
            status,
            description: raw.description.clone(),
            initial_release,
            latest: raw.latest.clone(),
            link: raw.status_link.clone(),
        }
    }

    /// Whether upgrading from `current` to this line is covered by a
    /// license renewed at `renewal`
    pub fn is_free_update(&self, current: &str, renewal: Option<DateTime<Utc>>) -> bool {
        let Some(release) = self.initial_release else {
            return false;
        };

        let is_newer = self
            .latest
            .as_deref()
            .is_some_and(|latest| compare_to_latest(current, latest) == CompareResult::Outdated);
        if !is_newer {
            return false;
        }

        renewal.is_some_and(|renewal| release < renewal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    Line(ReleaseLine),
    Unresolved,
}

/// Release lines keyed by version constraint, in feed order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseLineRegistry {
    lines: IndexMap<String, ReleaseLine>,
    resolution: Option<Resolution>,
    has_no_vulnerabilities: bool,
}

impl ReleaseLineRegistry {
    pub fn new(lines: IndexMap<String, ReleaseLine>) -> Self {
        Self {
            lines,
            resolution: None,
            has_no_vulnerabilities: false,
        }
    }

    pub fn from_feed(raw: &IndexMap<String, RawReleaseLine>) -> Self {
        Self::new(
            raw.iter()
                .map(|(constraint, line)| (constraint.clone(), ReleaseLine::from_feed(line)))
                .collect(),
        )
    }

    pub fn lines(&self) -> &IndexMap<String, ReleaseLine> {
        &self.lines
    }

    /// Find the release line of the current version
    ///
    /// The result is memoized; later calls return it without recording
    /// errors again.
    pub fn resolve(
        &mut self,
        current: &str,
        latest: Option<&str>,
        diagnostics: &mut Diagnostics,
    ) -> Option<&ReleaseLine> {
        if self.resolution.is_none() {
            let resolution = self.find(current, latest, diagnostics);
            self.resolution = Some(resolution);
        }

        self.resolved()
    }

    /// The memoized result of [`resolve`](Self::resolve)
    pub fn resolved(&self) -> Option<&ReleaseLine> {
        match &self.resolution {
            Some(Resolution::Line(line)) => Some(line),
            _ => None,
        }
    }

    /// Whether a matching line states that no vulnerabilities are known
    pub fn has_no_vulnerabilities(&self) -> bool {
        self.has_no_vulnerabilities
    }

    fn find(
        &mut self,
        current: &str,
        latest: Option<&str>,
        diagnostics: &mut Diagnostics,
    ) -> Resolution {
        if let Some(latest) = latest
            && compare_to_latest(current, latest) == CompareResult::Newer
        {
            debug!("{} is newer than the latest release {}", current, latest);
            return Resolution::Line(ReleaseLine::unreleased());
        }

        for (constraint, line) in &self.lines {
            if !diagnostics.match_version(current, constraint, "while finding version entry") {
                continue;
            }

            match line.status {
                // a later entry may carry more specific update information
                Some(ReleaseStatus::NoVulnerabilities) => {
                    self.has_no_vulnerabilities = true;
                    continue;
                }
                Some(ReleaseStatus::Latest) => {
                    self.has_no_vulnerabilities = true;
                }
                _ => {}
            }

            return Resolution::Line(line.clone());
        }

        diagnostics.record(format!(
            "No matching version entry found for {{package}}@{current}"
        ));
        Resolution::Unresolved
    }

    /// First release line that is a free update from `current`
    pub fn find_maximum_free_update(
        &self,
        current: &str,
        renewal: Option<DateTime<Utc>>,
    ) -> Option<&ReleaseLine> {
        self.lines
            .values()
            .find(|line| line.is_free_update(current, renewal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn line(status: Option<ReleaseStatus>, latest: Option<&str>) -> ReleaseLine {
        ReleaseLine {
            status,
            latest: latest.map(str::to_string),
            ..Default::default()
        }
    }

    fn registry(lines: Vec<(&str, ReleaseLine)>) -> ReleaseLineRegistry {
        ReleaseLineRegistry::new(
            lines
                .into_iter()
                .map(|(constraint, line)| (constraint.to_string(), line))
                .collect(),
        )
    }

    #[rstest]
    #[case("latest", Some(ReleaseStatus::Latest))]
    #[case("no-vulnerabilities", Some(ReleaseStatus::NoVulnerabilities))]
    #[case("unreleased", Some(ReleaseStatus::Unreleased))]
    #[case("end-of-life", Some(ReleaseStatus::EndOfLife))]
    #[case("active-support", None)]
    fn from_feed_parses_status(#[case] input: &str, #[case] expected: Option<ReleaseStatus>) {
        let raw = RawReleaseLine {
            status: Some(input.to_string()),
            ..Default::default()
        };

        assert_eq!(ReleaseLine::from_feed(&raw).status, expected);
    }

    #[test]
    fn from_feed_drops_release_date_of_unreleased_line() {
        let raw = RawReleaseLine {
            status: Some("unreleased".to_string()),
            initial_release: Some("2030-01-01".to_string()),
            ..Default::default()
        };

        assert_eq!(ReleaseLine::from_feed(&raw).initial_release, None);
    }

    #[test]
    fn resolve_returns_unreleased_line_for_versions_ahead_of_latest() {
        let mut registry = registry(vec![("*", line(Some(ReleaseStatus::Latest), None))]);
        let mut diagnostics = Diagnostics::new();

        let resolved = registry.resolve("9.9.9", Some("3.5.0"), &mut diagnostics);

        assert_eq!(resolved, Some(&ReleaseLine::unreleased()));
        assert!(!registry.has_no_vulnerabilities());
    }

    #[test]
    fn resolve_returns_first_matching_entry() {
        let mut registry = registry(vec![
            ("4.*", line(Some(ReleaseStatus::Latest), Some("4.0.1"))),
            ("3.5.*", line(None, Some("3.5.9"))),
            ("3.*", line(Some(ReleaseStatus::EndOfLife), Some("3.9.8"))),
        ]);
        let mut diagnostics = Diagnostics::new();

        let resolved = registry.resolve("3.5.0", Some("4.0.1"), &mut diagnostics);

        assert_eq!(resolved.and_then(|l| l.latest.as_deref()), Some("3.5.9"));
        assert!(!registry.has_no_vulnerabilities());
    }

    #[test]
    fn resolve_skips_no_vulnerability_entries_but_keeps_flag() {
        let mut registry = registry(vec![
            ("3.5.9", line(Some(ReleaseStatus::NoVulnerabilities), None)),
            ("3.5.*", line(None, Some("3.5.9"))),
        ]);
        let mut diagnostics = Diagnostics::new();

        let resolved = registry.resolve("3.5.9", Some("4.0.1"), &mut diagnostics);

        assert_eq!(resolved.and_then(|l| l.latest.as_deref()), Some("3.5.9"));
        assert!(registry.has_no_vulnerabilities());
    }

    #[test]
    fn resolve_latest_entry_sets_no_vulnerability_flag() {
        let mut registry = registry(vec![(
            "4.*",
            line(Some(ReleaseStatus::Latest), Some("4.0.1")),
        )]);
        let mut diagnostics = Diagnostics::new();

        let resolved = registry.resolve("4.0.1", Some("4.0.1"), &mut diagnostics);

        assert_eq!(resolved.and_then(|l| l.status), Some(ReleaseStatus::Latest));
        assert!(registry.has_no_vulnerabilities());
    }

    #[test]
    fn resolve_records_error_once_when_nothing_matches() {
        let mut registry = registry(vec![("4.*", line(Some(ReleaseStatus::Latest), None))]);
        let mut diagnostics = Diagnostics::new();

        assert_eq!(registry.resolve("3.5.0", Some("4.0.1"), &mut diagnostics), None);
        assert_eq!(registry.resolve("3.5.0", Some("4.0.1"), &mut diagnostics), None);

        assert_eq!(diagnostics.errors().len(), 1);
        assert_eq!(
            diagnostics.errors()[0].message,
            "No matching version entry found for {package}@3.5.0"
        );
    }

    #[test]
    fn resolve_skips_entries_with_invalid_constraints() {
        let mut registry = registry(vec![
            ("~~", line(Some(ReleaseStatus::Latest), None)),
            ("3.*", line(Some(ReleaseStatus::EndOfLife), None)),
        ]);
        let mut diagnostics = Diagnostics::new();

        let resolved = registry.resolve("3.5.0", None, &mut diagnostics);

        assert_eq!(resolved.and_then(|l| l.status), Some(ReleaseStatus::EndOfLife));
        assert_eq!(diagnostics.errors().len(), 1);
    }

    #[test]
    fn is_free_update_requires_release_before_renewal() {
        let renewal = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut line = line(None, Some("4.0.1"));

        line.initial_release = Some(renewal);
        assert!(!line.is_free_update("3.5.0", Some(renewal)));

        line.initial_release = Some(renewal - Duration::microseconds(1));
        assert!(line.is_free_update("3.5.0", Some(renewal)));
    }

    #[rstest]
    #[case(None, Some("4.0.1"), Some("2024-01-01"))] // unreleased
    #[case(Some("2023-11-28"), Some("3.5.0"), Some("2024-01-01"))] // not newer
    #[case(Some("2023-11-28"), None, Some("2024-01-01"))] // no latest version
    #[case(Some("2023-11-28"), Some("4.0.1"), None)] // no license
    fn is_free_update_rejects(
        #[case] initial: Option<&str>,
        #[case] latest: Option<&str>,
        #[case] renewal: Option<&str>,
    ) {
        let line = ReleaseLine {
            initial_release: initial.and_then(parse_date),
            latest: latest.map(str::to_string),
            ..Default::default()
        };

        assert!(!line.is_free_update("3.5.0", renewal.and_then(parse_date)));
    }

    #[test]
    fn find_maximum_free_update_returns_first_free_line() {
        let renewal = parse_date("2024-06-01");
        let mut old = line(None, Some("3.9.8"));
        old.initial_release = parse_date("2021-01-01");
        let mut four = line(Some(ReleaseStatus::Latest), Some("4.0.1"));
        four.initial_release = parse_date("2023-11-28");
        let mut five = line(None, Some("5.0.0"));
        five.initial_release = parse_date("2025-01-01");
        let registry = registry(vec![("5.*", five), ("4.*", four), ("3.*", old)]);

        let free = registry.find_maximum_free_update("3.5.0", renewal);

        assert_eq!(free.and_then(|l| l.latest.as_deref()), Some("4.0.1"));
    }
}
