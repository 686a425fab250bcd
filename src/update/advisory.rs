//! Security advisories and the minimum security update search

use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::config::MAX_FIX_ITERATIONS;
use crate::update::diagnostics::Diagnostics;
use crate::update::feed::RawAdvisory;
use crate::update::severity::{Severity, sort_by_severity};
use crate::version::constraint::matches;
use crate::version::semver::{compare_versions, numeric_base, same_version};

const FILTER_REASON: &str = "while filtering incidents";

/// A single known vulnerability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    /// Constraint of affected versions
    pub affected: Option<String>,
    pub description: String,
    /// Comma-separated list of fixed versions, one per release line
    pub fixed: String,
    pub link: String,
    pub severity: Severity,
}

impl Advisory {
    pub fn from_feed(raw: &RawAdvisory) -> Self {
        Self {
            affected: raw.affected.clone(),
            description: raw.description.clone(),
            fixed: raw.fixed.clone(),
            link: raw.link.clone(),
            severity: Severity::from_feed(raw.severity.as_deref()),
        }
    }

    /// Whether the advisory applies to `version`
    ///
    /// An advisory without an affected constraint is recorded and skipped.
    pub fn affects(&self, version: &str, diagnostics: &mut Diagnostics) -> bool {
        let Some(affected) = &self.affected else {
            diagnostics.record(format!(
                "Missing constraint affected for {{package}} {FILTER_REASON}"
            ));
            return false;
        };

        diagnostics.match_version(version, affected, FILTER_REASON)
    }

    /// Smallest fixed version within `[min_version, max_version]`
    ///
    /// Fixed versions of other release lines fall outside of the window
    /// and are ignored.
    pub fn find_minimum_fix(&self, min_version: &str, max_version: &str) -> Option<&str> {
        self.fixed
            .split(',')
            .map(str::trim)
            .filter(|fixed| !fixed.is_empty())
            .filter(|fixed| {
                compare_versions(fixed, min_version).is_some_and(|o| o != Ordering::Less)
                    && compare_versions(fixed, max_version).is_some_and(|o| o != Ordering::Greater)
            })
            .min_by(|a, b| compare_versions(a, b).unwrap_or(Ordering::Equal))
    }

    /// Whether `version` counts as fixed although the affected range matches it
    ///
    /// Holds when `version` reached the minimum fix within the window and the
    /// affected range also covers that fix. Such a range is broader than the
    /// fix list, so the fix list wins. A range that excludes its own fix is
    /// taken literally.
    fn declares_fix(&self, version: &str, min_version: &str, max_version: &str) -> bool {
        let Some(fixed) = self.find_minimum_fix(min_version, max_version) else {
            return false;
        };
        if compare_versions(fixed, version).is_none_or(|o| o == Ordering::Greater) {
            return false;
        }

        self.affected
            .as_deref()
            .is_some_and(|affected| matches(fixed, affected).unwrap_or(false))
    }
}

/// All advisories of a package, most severe first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvisoryRegistry {
    advisories: Vec<Advisory>,
}

impl AdvisoryRegistry {
    pub fn new(mut advisories: Vec<Advisory>) -> Self {
        sort_by_severity(&mut advisories);
        Self { advisories }
    }

    /// Build the registry from the feed
    ///
    /// When the release lines already state that the current version has no
    /// known vulnerabilities, the advisories are not considered at all.
    pub fn from_feed(raw: &[RawAdvisory], has_no_vulnerabilities: bool) -> Self {
        if has_no_vulnerabilities {
            debug!("Current version has no known vulnerabilities, skipping advisories");
            return Self::default();
        }

        Self::new(raw.iter().map(Advisory::from_feed).collect())
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// All advisories that affect `version`
    pub fn affecting(&self, version: &str, diagnostics: &mut Diagnostics) -> Vec<&Advisory> {
        self.advisories
            .iter()
            .filter(|advisory| advisory.affects(version, diagnostics))
            .collect()
    }

    /// All advisories that affect the current version
    ///
    /// Pre-release modifiers are stripped first, so `4.0.0-rc.1` is treated
    /// like `4.0.0`.
    pub fn vulnerabilities(&self, current: &str, diagnostics: &mut Diagnostics) -> Vec<Advisory> {
        self.affecting(numeric_base(current), diagnostics)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Advisories affecting `version` that are not fixed by it
    ///
    /// See `Advisory::declares_fix`. The installed version (`min_version`)
    /// never counts as its own fix.
    fn unfixed(
        &self,
        version: &str,
        min_version: &str,
        max_version: &str,
        diagnostics: &mut Diagnostics,
    ) -> Vec<&Advisory> {
        let affected = self.affecting(numeric_base(version), diagnostics);
        if same_version(version, min_version) {
            return affected;
        }

        affected
            .into_iter()
            .filter(|advisory| {
                let declared = advisory.declares_fix(version, min_version, max_version);
                if declared {
                    debug!(
                        "{} is the declared fix of \"{}\" although its range matches",
                        version, advisory.description
                    );
                }
                !declared
            })
            .collect()
    }

    /// Find the smallest version in `[min_version, max_version]` that is not
    /// affected by any advisory
    ///
    /// Returns `None` if no such version exists within the window or if the
    /// advisories contradict each other so that the search does not settle.
    pub fn find_minimum_security_update(
        &self,
        min_version: &str,
        max_version: &str,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        let mut version = min_version.to_string();

        for _ in 0..MAX_FIX_ITERATIONS {
            let affected = self.unfixed(&version, min_version, max_version, diagnostics);
            if affected.is_empty() {
                return Some(version);
            }

            // arrived at the top of the window and still affected
            if same_version(&version, max_version) {
                return None;
            }

            // the target has to fix all affected advisories,
            // so use the largest of the smallest fixes;
            // a pass without progress still counts towards the bound
            for advisory in affected {
                let candidate = match advisory.find_minimum_fix(min_version, max_version) {
                    Some(fixed) => fixed,
                    None => {
                        warn!(
                            "No fix for \"{}\" between {} and {}, trying {}",
                            advisory.description, min_version, max_version, max_version
                        );
                        max_version
                    }
                };

                if compare_versions(candidate, &version) == Some(Ordering::Greater) {
                    version = candidate.to_string();
                }
            }
        }

        warn!(
            "Minimum security update search between {} and {} did not settle",
            min_version, max_version
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn advisory(affected: &str, fixed: &str, severity: Severity) -> Advisory {
        Advisory {
            affected: Some(affected.to_string()),
            description: format!("{affected} fixed in {fixed}"),
            fixed: fixed.to_string(),
            link: "https://example.com/advisory".to_string(),
            severity,
        }
    }

    #[rstest]
    #[case("3.5.2,3.6.1", "3.5.0", "3.5.9", Some("3.5.2"))]
    #[case("3.6.1, 3.5.4, 3.5.2", "3.5.0", "3.5.9", Some("3.5.2"))]
    #[case("3.6.1", "3.5.0", "3.5.9", None)]
    #[case("3.4.9", "3.5.0", "3.5.9", None)]
    #[case("3.5.9", "3.5.0", "3.5.9", Some("3.5.9"))]
    #[case("3.5.0", "3.5.0", "3.5.9", Some("3.5.0"))]
    #[case("", "3.5.0", "3.5.9", None)]
    #[case("garbage,3.5.3", "3.5.0", "3.5.9", Some("3.5.3"))]
    #[case("3.5.2.1,3.6.1", "3.5.2", "3.5.9", Some("3.5.2.1"))]
    #[case("3.5.2.2, 3.5.2.1", "3.5.0", "3.5.9", Some("3.5.2.1"))]
    fn find_minimum_fix_stays_within_window(
        #[case] fixed: &str,
        #[case] min: &str,
        #[case] max: &str,
        #[case] expected: Option<&str>,
    ) {
        let advisory = advisory("<3.6.0", fixed, Severity::High);
        assert_eq!(advisory.find_minimum_fix(min, max), expected);
    }

    #[test]
    fn new_sorts_by_severity() {
        let registry = AdvisoryRegistry::new(vec![
            advisory("<1.0.0", "1.0.0", Severity::Low),
            advisory("<2.0.0", "2.0.0", Severity::Critical),
        ]);

        assert_eq!(registry.advisories()[0].severity, Severity::Critical);
        assert_eq!(registry.advisories()[1].severity, Severity::Low);
    }

    #[test]
    fn from_feed_is_empty_when_no_vulnerabilities_are_known() {
        let raw = vec![RawAdvisory {
            affected: Some("*".to_string()),
            ..Default::default()
        }];

        assert!(AdvisoryRegistry::from_feed(&raw, true).advisories().is_empty());
        assert_eq!(AdvisoryRegistry::from_feed(&raw, false).advisories().len(), 1);
    }

    #[test]
    fn vulnerabilities_match_pre_releases_as_their_base_version() {
        let registry = AdvisoryRegistry::new(vec![
            advisory(">=4.0.0 <4.0.2", "4.0.2", Severity::High),
            advisory("<3.0.0", "3.0.0", Severity::Low),
        ]);
        let mut diagnostics = Diagnostics::new();

        let vulnerabilities = registry.vulnerabilities("4.0.0-rc.2", &mut diagnostics);

        assert_eq!(vulnerabilities.len(), 1);
        assert_eq!(vulnerabilities[0].fixed, "4.0.2");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn vulnerabilities_skip_entries_without_affected_constraint() {
        let mut missing = advisory("*", "9.9.9", Severity::Critical);
        missing.affected = None;
        let registry =
            AdvisoryRegistry::new(vec![missing, advisory("<3.6.0", "3.5.2", Severity::Low)]);
        let mut diagnostics = Diagnostics::new();

        let vulnerabilities = registry.vulnerabilities("3.5.0", &mut diagnostics);

        assert_eq!(vulnerabilities.len(), 1);
        assert_eq!(vulnerabilities[0].severity, Severity::Low);
        assert_eq!(
            diagnostics.errors()[0].message,
            "Missing constraint affected for {package} while filtering incidents"
        );
    }

    #[test]
    fn vulnerabilities_skip_entries_with_invalid_constraint() {
        let registry = AdvisoryRegistry::new(vec![advisory("<<3.6", "3.6.0", Severity::High)]);
        let mut diagnostics = Diagnostics::new();

        assert!(registry.vulnerabilities("3.5.0", &mut diagnostics).is_empty());
        assert_eq!(diagnostics.errors().len(), 1);
    }

    #[test]
    fn find_minimum_security_update_picks_smallest_fix_in_branch() {
        let registry =
            AdvisoryRegistry::new(vec![advisory("<3.6.0", "3.5.2,3.6.1", Severity::Critical)]);
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            registry.find_minimum_security_update("3.5.0", "3.5.9", &mut diagnostics),
            Some("3.5.2".to_string())
        );
    }

    #[test]
    fn find_minimum_security_update_takes_largest_of_smallest_fixes() {
        let registry = AdvisoryRegistry::new(vec![
            advisory("<3.5.2", "3.5.2", Severity::High),
            advisory("<3.5.4", "3.5.4,4.0.1", Severity::Medium),
        ]);
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            registry.find_minimum_security_update("3.5.0", "3.5.9", &mut diagnostics),
            Some("3.5.4".to_string())
        );
    }

    #[test]
    fn find_minimum_security_update_rechecks_advisories_of_the_target() {
        // 3.5.2 fixes the first advisory but is affected by the second one
        let registry = AdvisoryRegistry::new(vec![
            advisory("<3.5.2", "3.5.2", Severity::High),
            advisory(">=3.5.1 <3.5.5", "3.5.5", Severity::Medium),
        ]);
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            registry.find_minimum_security_update("3.5.0", "3.5.9", &mut diagnostics),
            Some("3.5.5".to_string())
        );
    }

    #[test]
    fn find_minimum_security_update_returns_current_when_not_affected() {
        let registry = AdvisoryRegistry::new(vec![advisory("<3.0.0", "3.0.0", Severity::High)]);
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            registry.find_minimum_security_update("3.5.0", "3.5.9", &mut diagnostics),
            Some("3.5.0".to_string())
        );
    }

    #[test]
    fn find_minimum_security_update_falls_back_to_window_maximum() {
        let registry = AdvisoryRegistry::new(vec![advisory("<3.5.5", "4.0.0", Severity::High)]);
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            registry.find_minimum_security_update("3.5.0", "3.5.9", &mut diagnostics),
            Some("3.5.9".to_string())
        );
    }

    #[test]
    fn find_minimum_security_update_fails_when_window_maximum_is_affected() {
        let registry = AdvisoryRegistry::new(vec![advisory("<3.6.0", "3.6.1", Severity::High)]);
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            registry.find_minimum_security_update("3.5.0", "3.5.9", &mut diagnostics),
            None
        );
    }

    #[test]
    fn find_minimum_security_update_terminates_on_cyclic_data() {
        // every fix reintroduces another advisory one patch further up
        let advisories = (0..20)
            .map(|patch| {
                advisory(
                    &format!("{}.{}.{}", 1, 0, patch),
                    &format!("{}.{}.{}", 1, 0, patch + 1),
                    Severity::High,
                )
            })
            .collect();
        let registry = AdvisoryRegistry::new(advisories);
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            registry.find_minimum_security_update("1.0.0", "1.0.50", &mut diagnostics),
            None
        );
    }

    #[test]
    fn find_minimum_security_update_returns_none_for_mutually_reintroducing_advisories() {
        // the fix of each advisory is affected by the other one
        let registry = AdvisoryRegistry::new(vec![
            advisory("3.5.0 || 3.5.3", "3.5.2", Severity::High),
            advisory("3.5.2", "3.5.3", Severity::High),
        ]);
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            registry.find_minimum_security_update("3.5.0", "3.5.9", &mut diagnostics),
            None
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn find_minimum_security_update_does_not_offer_the_installed_version() {
        let registry = AdvisoryRegistry::new(vec![advisory("<=3.5.2", "3.5.2", Severity::High)]);
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            registry.find_minimum_security_update("3.5.2", "3.5.9", &mut diagnostics),
            None
        );
    }

    #[test]
    fn find_minimum_security_update_takes_range_excluding_its_fix_literally() {
        // 3.5.4 is past the fix 3.5.2, but the range names it explicitly
        let registry = AdvisoryRegistry::new(vec![
            advisory("3.5.0 || 3.5.4", "3.5.2", Severity::High),
            advisory("<3.5.4", "3.5.4", Severity::Low),
        ]);
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            registry.find_minimum_security_update("3.5.0", "3.5.9", &mut diagnostics),
            None
        );
    }

    #[test]
    fn find_minimum_security_update_reaches_four_part_fix() {
        let registry = AdvisoryRegistry::new(vec![advisory(
            ">=3.6.0 <3.6.6.1",
            "3.6.6.1,3.7.1",
            Severity::Critical,
        )]);
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            registry.find_minimum_security_update("3.6.6", "3.6.6.1", &mut diagnostics),
            Some("3.6.6.1".to_string())
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn find_minimum_security_update_never_goes_below_minimum() {
        let registry = AdvisoryRegistry::new(vec![
            advisory("<3.5.3", "3.5.1,3.5.3", Severity::High),
            advisory(">=3.5.0 <3.5.2", "3.5.2", Severity::Low),
        ]);
        let mut diagnostics = Diagnostics::new();

        let result = registry
            .find_minimum_security_update("3.5.2", "3.5.9", &mut diagnostics)
            .unwrap();

        assert_eq!(result, "3.5.3");
        assert!(registry.affecting(&result, &mut diagnostics).is_empty());
    }
}
