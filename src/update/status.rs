//! Update status tags and their presentation

use serde::Serialize;

use crate::update::labels::{Translator, render};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateStatus {
    UpToDate,
    NotVulnerable,
    SecurityUpdate,
    SecurityUpgrade,
    Update,
    Upgrade,
    Unreleased,
    Error,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::UpToDate => "up-to-date",
            UpdateStatus::NotVulnerable => "not-vulnerable",
            UpdateStatus::SecurityUpdate => "security-update",
            UpdateStatus::SecurityUpgrade => "security-upgrade",
            UpdateStatus::Update => "update",
            UpdateStatus::Upgrade => "upgrade",
            UpdateStatus::Unreleased => "unreleased",
            UpdateStatus::Error => "error",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            UpdateStatus::UpToDate | UpdateStatus::NotVulnerable => "check",
            UpdateStatus::SecurityUpdate | UpdateStatus::SecurityUpgrade => "alert",
            UpdateStatus::Update | UpdateStatus::Upgrade => "info",
            UpdateStatus::Unreleased => "hidden",
            UpdateStatus::Error => "question",
        }
    }

    pub fn theme(&self) -> &'static str {
        match self {
            UpdateStatus::UpToDate | UpdateStatus::NotVulnerable => "positive",
            UpdateStatus::SecurityUpdate | UpdateStatus::SecurityUpgrade => "negative",
            UpdateStatus::Update | UpdateStatus::Upgrade => "info",
            UpdateStatus::Unreleased => "purple",
            UpdateStatus::Error => "notice",
        }
    }

    pub fn label_key(&self) -> String {
        format!("system.updateStatus.{}", self.as_str())
    }

    /// Human-readable label, `?` stands in for an unknown version
    pub fn label(&self, version: Option<&str>, translator: &dyn Translator) -> String {
        render(
            translator,
            &self.label_key(),
            "?",
            &[("version", version.unwrap_or("?"))],
        )
    }
}

impl std::fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
