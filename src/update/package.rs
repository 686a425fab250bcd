//! The aggregate root of a single resolution pass

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::update::advisory::{Advisory, AdvisoryRegistry};
use crate::update::decision::{DecisionInput, UpdateDecision};
use crate::update::diagnostics::{Diagnostics, ResolutionError};
use crate::update::feed::{Feed, FetchOutcome};
use crate::update::labels::{Translator, template};
use crate::update::notices::{NoticeInput, NoticeList};
use crate::update::release::{ReleaseLine, ReleaseLineRegistry};
use crate::update::status::UpdateStatus;
use crate::update::urls::UrlRegistry;

/// What is being checked for updates
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PackageKind {
    /// The host system itself
    System,
    Plugin { name: String },
}

impl PackageKind {
    /// Key of the feed document for this package
    pub fn key(&self) -> String {
        match self {
            PackageKind::System => "security".to_string(),
            PackageKind::Plugin { name } => format!("plugins/{name}"),
        }
    }

    /// Human-readable name used in error messages
    pub fn display_name(&self) -> String {
        match self {
            PackageKind::System => "Kirby".to_string(),
            PackageKind::Plugin { name } => format!("plugin \"{name}\""),
        }
    }

    pub fn plugin_name(&self) -> Option<&str> {
        match self {
            PackageKind::System => None,
            PackageKind::Plugin { name } => Some(name.as_str()),
        }
    }
}

/// Facts about the installation the package runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub host_version: Option<String>,
    pub runtime_version: Option<String>,
    pub license_renewal: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            host_version: None,
            runtime_version: None,
            license_renewal: None,
            now: Utc::now(),
        }
    }
}

/// Flat status summary for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub current_version: String,
    pub icon: String,
    pub label: String,
    pub latest_version: String,
    pub theme: String,
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_name: Option<String>,
}

/// A package with all of its update information resolved
///
/// Everything is derived once at construction. Problems with the feed data
/// never fail the construction; they are collected in [`errors`](Self::errors)
/// and the package falls back to an error status.
#[derive(Debug, Clone)]
pub struct Package {
    kind: PackageKind,
    current: String,
    latest: Option<String>,
    security_only: bool,
    releases: ReleaseLineRegistry,
    advisories: AdvisoryRegistry,
    vulnerabilities: Vec<Advisory>,
    urls: UrlRegistry,
    decision: UpdateDecision,
    notices: NoticeList,
    diagnostics: Diagnostics,
}

impl Package {
    pub fn new(
        kind: PackageKind,
        current: impl Into<String>,
        feed: Option<Feed>,
        security_only: bool,
        environment: &Environment,
    ) -> Self {
        Self::build(
            kind,
            current.into(),
            feed,
            security_only,
            environment,
            Diagnostics::new(),
        )
    }

    /// Build the package from the result of fetching its feed
    pub fn from_fetch(
        kind: PackageKind,
        current: impl Into<String>,
        outcome: FetchOutcome,
        security_only: bool,
        environment: &Environment,
    ) -> Self {
        let mut diagnostics = Diagnostics::new();
        let feed = match outcome {
            FetchOutcome::Loaded(feed) => Some(feed),
            FetchOutcome::TimedOut => {
                diagnostics.record(
                    "Could not load update data for {package}: Previous remote request timed out",
                );
                None
            }
            FetchOutcome::Failed(reason) => {
                diagnostics.record(format!(
                    "Could not load update data for {{package}}: {reason}"
                ));
                None
            }
        };

        Self::build(
            kind,
            current.into(),
            feed,
            security_only,
            environment,
            diagnostics,
        )
    }

    fn build(
        kind: PackageKind,
        current: String,
        feed: Option<Feed>,
        security_only: bool,
        environment: &Environment,
        mut diagnostics: Diagnostics,
    ) -> Self {
        info!("Resolving update status of {} {}", kind.key(), current);
        let feed = feed.unwrap_or_default();
        let latest = feed.latest.clone();

        let mut releases = ReleaseLineRegistry::from_feed(&feed.versions);
        releases.resolve(&current, latest.as_deref(), &mut diagnostics);

        let advisories =
            AdvisoryRegistry::from_feed(&feed.incidents, releases.has_no_vulnerabilities());
        let vulnerabilities = advisories.vulnerabilities(&current, &mut diagnostics);
        let urls = UrlRegistry::new(feed.urls);

        let decision = UpdateDecision::resolve(
            &DecisionInput {
                current: &current,
                latest: latest.as_deref(),
                security_only,
                license_renewal: environment.license_renewal,
                releases: &releases,
                advisories: &advisories,
                vulnerabilities: &vulnerabilities,
                urls: &urls,
            },
            &mut diagnostics,
        );

        let notices = NoticeList::build(
            &NoticeInput {
                kind: &kind,
                current: &current,
                environment,
                line: releases.resolved(),
                vulnerabilities: &vulnerabilities,
                messages: &feed.messages,
                runtime_end_of_life: &feed.php,
            },
            &mut diagnostics,
        );

        debug!(
            "Resolved {} with {} errors",
            kind.key(),
            diagnostics.errors().len()
        );

        Self {
            kind,
            current,
            latest,
            security_only,
            releases,
            advisories,
            vulnerabilities,
            urls,
            decision,
            notices,
            diagnostics,
        }
    }

    pub fn kind(&self) -> &PackageKind {
        &self.kind
    }

    pub fn key(&self) -> String {
        self.kind.key()
    }

    pub fn current_version(&self) -> &str {
        &self.current
    }

    pub fn latest_version(&self) -> Option<&str> {
        self.latest.as_deref()
    }

    pub fn security_only(&self) -> bool {
        self.security_only
    }

    pub fn releases(&self) -> &ReleaseLineRegistry {
        &self.releases
    }

    /// Release line of the installed version
    pub fn release_line(&self) -> Option<&ReleaseLine> {
        self.releases.resolved()
    }

    pub fn advisories(&self) -> &AdvisoryRegistry {
        &self.advisories
    }

    /// Advisories affecting the installed version, most severe first
    pub fn vulnerabilities(&self) -> &[Advisory] {
        &self.vulnerabilities
    }

    pub fn has_vulnerabilities(&self) -> bool {
        !self.vulnerabilities.is_empty()
    }

    pub fn urls(&self) -> &UrlRegistry {
        &self.urls
    }

    pub fn decision(&self) -> &UpdateDecision {
        &self.decision
    }

    pub fn status(&self) -> UpdateStatus {
        self.decision.status
    }

    pub fn has_update(&self) -> bool {
        matches!(
            self.decision.status,
            UpdateStatus::SecurityUpdate
                | UpdateStatus::SecurityUpgrade
                | UpdateStatus::Update
                | UpdateStatus::Upgrade
        )
    }

    pub fn icon(&self) -> &'static str {
        self.decision.status.icon()
    }

    pub fn theme(&self) -> &'static str {
        self.decision.status.theme()
    }

    pub fn url(&self) -> Option<&str> {
        self.decision.url.as_deref()
    }

    pub fn label(&self, translator: &dyn Translator) -> String {
        self.decision
            .status
            .label(self.decision.version.as_deref(), translator)
    }

    pub fn notices(&self) -> &NoticeList {
        &self.notices
    }

    /// Problems recorded while resolving, in order of occurrence
    pub fn errors(&self) -> &[ResolutionError] {
        self.diagnostics.errors()
    }

    /// Error messages with the package name filled in
    pub fn error_messages(&self) -> Vec<String> {
        let name = self.kind.display_name();
        self.errors()
            .iter()
            .map(|error| template(&error.message, &[("package", name.as_str()), ("name", name.as_str())]))
            .collect()
    }

    pub fn summary(&self, translator: &dyn Translator) -> Summary {
        Summary {
            current_version: self.current.clone(),
            icon: self.icon().to_string(),
            label: self.label(translator),
            latest_version: self.latest.clone().unwrap_or_else(|| "?".to_string()),
            theme: self.theme().to_string(),
            url: self.decision.url.clone(),
            plugin_name: self.kind.plugin_name().map(str::to_string),
        }
    }
}
