//! User-facing notices of a package
//!
//! Notices are collected from four sources, in this order:
//!
//! 1. one notice per vulnerability affecting the installed version
//! 2. custom messages from the feed whose version filters all match
//! 3. end-of-life of the installed release line
//! 4. end-of-life of the runtime release

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::config::{END_OF_LIFE_LINK, RUNTIME_END_OF_LIFE_LINK};
use crate::update::advisory::Advisory;
use crate::update::date::parse_date;
use crate::update::diagnostics::Diagnostics;
use crate::update::feed::RawMessage;
use crate::update::labels::{Translator, render};
use crate::update::package::{Environment, PackageKind};
use crate::update::release::{ReleaseLine, ReleaseStatus};

const FILTER_REASON: &str = "while filtering messages";
const DEFAULT_MESSAGE_ICON: &str = "info";
const END_OF_LIFE_ICON: &str = "bell";

/// Text of a notice, rendered on demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeText {
    /// Text taken verbatim from the feed
    Literal(String),
    /// Translation key with placeholder data
    Template {
        key: String,
        data: Vec<(String, String)>,
    },
}

impl NoticeText {
    fn template(key: &str, data: &[(&str, &str)]) -> Self {
        NoticeText::Template {
            key: key.to_string(),
            data: data
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    pub fn render(&self, translator: &dyn Translator) -> String {
        match self {
            NoticeText::Literal(text) => text.clone(),
            NoticeText::Template { key, data } => {
                let data: Vec<(&str, &str)> = data
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str()))
                    .collect();
                render(translator, key, key, &data)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: NoticeText,
    pub link: Option<String>,
    pub icon: String,
}

impl Notice {
    pub fn render(&self, translator: &dyn Translator) -> RenderedNotice {
        RenderedNotice {
            text: self.text.render(translator),
            link: self.link.clone(),
            icon: self.icon.clone(),
        }
    }
}

/// A notice with its text rendered for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedNotice {
    pub text: String,
    pub link: Option<String>,
    pub icon: String,
}

/// Everything the notices depend on
#[derive(Debug, Clone, Copy)]
pub struct NoticeInput<'a> {
    pub kind: &'a PackageKind,
    pub current: &'a str,
    pub environment: &'a Environment,
    /// Resolved release line of `current`
    pub line: Option<&'a ReleaseLine>,
    /// Advisories affecting `current`, most severe first
    pub vulnerabilities: &'a [Advisory],
    pub messages: &'a [RawMessage],
    /// Runtime end-of-life dates keyed by `major.minor`
    pub runtime_end_of_life: &'a IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticeList {
    notices: Vec<Notice>,
}

impl NoticeList {
    pub fn build(input: &NoticeInput<'_>, diagnostics: &mut Diagnostics) -> Self {
        let mut notices: Vec<Notice> = input
            .vulnerabilities
            .iter()
            .map(|advisory| vulnerability_notice(input.kind, advisory))
            .collect();

        notices.extend(
            input
                .messages
                .iter()
                .filter(|message| message_applies(message, input, diagnostics))
                .map(|message| Notice {
                    text: NoticeText::Literal(message.text.clone()),
                    link: message.link.clone(),
                    icon: message
                        .icon
                        .clone()
                        .unwrap_or_else(|| DEFAULT_MESSAGE_ICON.to_string()),
                }),
        );

        if let Some(line) = input.line
            && line.status == Some(ReleaseStatus::EndOfLife)
        {
            notices.push(end_of_life_notice(input.kind, line));
        }

        if let Some(notice) = runtime_end_of_life_notice(input) {
            notices.push(notice);
        }

        debug!("Collected {} notices for {}", notices.len(), input.kind.key());
        Self { notices }
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn render(&self, translator: &dyn Translator) -> Vec<RenderedNotice> {
        self.notices
            .iter()
            .map(|notice| notice.render(translator))
            .collect()
    }
}

fn vulnerability_notice(kind: &PackageKind, advisory: &Advisory) -> Notice {
    let text = match kind {
        PackageKind::System => NoticeText::template(
            "system.issues.vulnerability.kirby",
            &[
                ("severity", advisory.severity.as_str()),
                ("description", advisory.description.as_str()),
            ],
        ),
        PackageKind::Plugin { name } => NoticeText::template(
            "system.issues.vulnerability.plugin",
            &[
                ("severity", advisory.severity.as_str()),
                ("description", advisory.description.as_str()),
                ("plugin", name.as_str()),
            ],
        ),
    };

    Notice {
        text,
        link: Some(advisory.link.clone()),
        icon: advisory.severity.icon().to_string(),
    }
}

/// Every filter must be declared by the message and match
fn message_applies(
    message: &RawMessage,
    input: &NoticeInput<'_>,
    diagnostics: &mut Diagnostics,
) -> bool {
    // the host system is its own host version
    let host = match input.kind {
        PackageKind::System => Some(input.current),
        PackageKind::Plugin { .. } => input.environment.host_version.as_deref(),
    };
    let runtime = input.environment.runtime_version.as_deref().map(runtime_version);
    let mut filters = vec![("kirby", host), ("php", runtime)];
    if matches!(input.kind, PackageKind::Plugin { .. }) {
        filters.push(("plugin", Some(input.current)));
    }

    for (key, value) in filters {
        let Some(constraint) = message.constraint(key) else {
            diagnostics.record(format!(
                "Missing constraint {key} for {{package}} {FILTER_REASON}"
            ));
            return false;
        };

        // without a known version the message cannot apply
        let Some(value) = value else {
            return false;
        };

        if !diagnostics.match_version(value, constraint, FILTER_REASON) {
            return false;
        }
    }

    true
}

fn end_of_life_notice(kind: &PackageKind, line: &ReleaseLine) -> Notice {
    let text = match kind {
        PackageKind::System => NoticeText::template("system.issues.eol.kirby", &[]),
        PackageKind::Plugin { name } => {
            NoticeText::template("system.issues.eol.plugin", &[("plugin", name.as_str())])
        }
    };

    Notice {
        text,
        link: Some(
            line.link
                .clone()
                .unwrap_or_else(|| END_OF_LIFE_LINK.to_string()),
        ),
        icon: END_OF_LIFE_ICON.to_string(),
    }
}

fn runtime_end_of_life_notice(input: &NoticeInput<'_>) -> Option<Notice> {
    let release = runtime_release(input.environment.runtime_version.as_deref()?)?;
    let end_of_life = parse_date(input.runtime_end_of_life.get(&release)?)?;

    if end_of_life >= input.environment.now {
        return None;
    }

    Some(Notice {
        text: NoticeText::template("system.issues.eol.php", &[("release", release.as_str())]),
        link: Some(RUNTIME_END_OF_LIFE_LINK.to_string()),
        icon: END_OF_LIFE_ICON.to_string(),
    })
}

/// Strip distribution suffixes such as `8.2.7-1ubuntu1` or `8.3.0+deb12`
fn runtime_version(version: &str) -> &str {
    version.split(['~', '+', '-']).next().unwrap_or(version)
}

/// `major.minor` of a runtime version
fn runtime_release(version: &str) -> Option<String> {
    let mut parts = runtime_version(version).split('.');
    let major = parts.next().filter(|part| !part.is_empty())?;
    let minor = parts.next().filter(|part| !part.is_empty())?;
    Some(format!("{major}.{minor}"))
}
