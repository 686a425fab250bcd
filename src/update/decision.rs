//! The update decision for a package
//!
//! Rules are evaluated in a fixed order and the first matching rule wins, so
//! that a more urgent status (a security update) is never hidden behind a
//! less urgent one (a regular update).

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::update::advisory::{Advisory, AdvisoryRegistry};
use crate::update::diagnostics::Diagnostics;
use crate::update::release::{ReleaseLineRegistry, ReleaseStatus};
use crate::update::status::UpdateStatus;
use crate::update::urls::{UrlPurpose, UrlRegistry};
use crate::version::semver::major_component;

/// Everything the decision depends on
#[derive(Debug, Clone, Copy)]
pub struct DecisionInput<'a> {
    pub current: &'a str,
    pub latest: Option<&'a str>,
    pub security_only: bool,
    pub license_renewal: Option<DateTime<Utc>>,
    /// Must already be resolved for `current`
    pub releases: &'a ReleaseLineRegistry,
    pub advisories: &'a AdvisoryRegistry,
    /// Advisories affecting `current`
    pub vulnerabilities: &'a [Advisory],
    pub urls: &'a UrlRegistry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDecision {
    pub status: UpdateStatus,
    /// Recommended version to install
    pub version: Option<String>,
    pub url: Option<String>,
}

impl UpdateDecision {
    fn new(status: UpdateStatus, version: Option<String>, url: Option<String>) -> Self {
        debug!(
            "Update decision: {} (version: {:?}, url: {:?})",
            status, version, url
        );
        Self {
            status,
            version,
            url,
        }
    }

    pub fn resolve(input: &DecisionInput<'_>, diagnostics: &mut Diagnostics) -> Self {
        let current = input.current;
        let latest = input.latest;
        let find_url = |version: &str, purpose: UrlPurpose, diagnostics: &mut Diagnostics| {
            input.urls.find(version, purpose, current, diagnostics)
        };

        let Some(line) = input.releases.resolved() else {
            return Self::new(
                UpdateStatus::Error,
                None,
                find_url(current, UrlPurpose::Changes, diagnostics),
            );
        };

        match line.status {
            Some(ReleaseStatus::Latest) => {
                return Self::new(
                    UpdateStatus::UpToDate,
                    None,
                    find_url(current, UrlPurpose::Changes, diagnostics),
                );
            }
            Some(ReleaseStatus::Unreleased) => {
                return Self::new(UpdateStatus::Unreleased, None, None);
            }
            Some(ReleaseStatus::NoVulnerabilities | ReleaseStatus::EndOfLife) | None => {}
        }

        // minimum security fixes take precedence over all other updates
        if !input.vulnerabilities.is_empty() {
            let update = line.latest.as_deref().and_then(|max_version| {
                input
                    .advisories
                    .find_minimum_security_update(current, max_version, diagnostics)
            });

            if let Some(update) = update {
                let url = find_url(&update, UrlPurpose::Changes, diagnostics);
                return Self::new(UpdateStatus::SecurityUpdate, Some(update), url);
            }

            // only a paid upgrade fixes the vulnerabilities
            let url = latest.and_then(|latest| find_url(latest, UrlPurpose::Upgrade, diagnostics));
            return Self::new(
                UpdateStatus::SecurityUpgrade,
                latest.map(str::to_string),
                url,
            );
        }

        if input.security_only {
            return Self::new(
                UpdateStatus::NotVulnerable,
                None,
                find_url(current, UrlPurpose::Changes, diagnostics),
            );
        }

        if let Some(latest) = latest
            && latest != current
        {
            let url = find_url(latest, UrlPurpose::Changes, diagnostics);
            return Self::new(UpdateStatus::Update, Some(latest.to_string()), url);
        }

        // the license may include a newer major release
        if let Some(version) = input
            .releases
            .find_maximum_free_update(current, input.license_renewal)
            .and_then(|line| line.latest.clone())
        {
            let major_release = format!("{}.0", major_component(&version));
            let url = find_url(&major_release, UrlPurpose::Changes, diagnostics);
            return Self::new(UpdateStatus::Update, Some(version), url);
        }

        let url = latest.and_then(|latest| find_url(latest, UrlPurpose::Upgrade, diagnostics));
        Self::new(UpdateStatus::Upgrade, latest.map(str::to_string), url)
    }
}
