//! Vulnerability severity ranking

use crate::update::advisory::Advisory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    #[default]
    Unspecified,
}

impl Severity {
    /// Parse the severity of a feed entry; unknown values are unspecified
    pub fn from_feed(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("critical") => Severity::Critical,
            Some("high") => Severity::High,
            Some("medium") => Severity::Medium,
            Some("low") => Severity::Low,
            _ => Severity::Unspecified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Unspecified => "unspecified",
        }
    }

    /// Numeric rank, higher is more severe
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Unspecified => 0,
        }
    }

    pub fn icon(&self) -> &'static str {
        "bug"
    }
}

/// Sort advisories by severity, most severe first
///
/// Advisories of equal severity keep their feed order.
pub fn sort_by_severity(advisories: &mut [Advisory]) {
    advisories.sort_by_key(|advisory| std::cmp::Reverse(advisory.severity.rank()));
}
