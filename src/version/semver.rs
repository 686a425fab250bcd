use std::cmp::Ordering;

use semver::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareResult {
    Latest,
    Outdated,
    Newer,
    Invalid,
}

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros, also when
/// a pre-release or build suffix follows. A leading `v` is ignored.
///
/// A fourth component is moved into the build metadata, which `Version`
/// orders numerically, so `3.9.8 < 3.9.8.1 < 3.9.9`. A zero fourth component
/// is dropped.
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "v1.2.3" -> Version(1, 2, 3)
/// - "4.0-rc.1" -> Version(4, 0, 0, pre: rc.1)
/// - "3.6.6.1" -> Version(3, 6, 6, build: 1)
pub fn parse_version(version: &str) -> Option<Version> {
    let version = version.trim();
    let version = version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version);

    let split_at = version.find(['-', '+']).unwrap_or(version.len());
    let (numeric, suffix) = version.split_at(split_at);

    let parts: Vec<&str> = numeric.split('.').collect();
    let normalized = match parts.as_slice() {
        [major] => format!("{major}.0.0{suffix}"),
        [major, minor] => format!("{major}.{minor}.0{suffix}"),
        [major, minor, patch, revision] => {
            format!("{major}.{minor}.{patch}{}", fold_revision(revision, suffix)?)
        }
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Suffix of a four-part version with the revision joined into the build metadata
fn fold_revision(revision: &str, suffix: &str) -> Option<String> {
    if revision.is_empty() || !revision.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let (pre, build) = suffix
        .split_once('+')
        .map_or((suffix, None), |(pre, build)| (pre, Some(build)));
    let revision = revision.trim_start_matches('0');

    let build = match (revision.is_empty(), build) {
        (true, None) => String::new(),
        (true, Some(build)) => format!("+{build}"),
        (false, None) => format!("+{revision}"),
        (false, Some(build)) => format!("+{revision}.{build}"),
    };
    Some(format!("{pre}{build}"))
}

/// Order two version strings; `None` if either one is not a version.
pub fn compare_versions(a: &str, b: &str) -> Option<Ordering> {
    Some(parse_version(a)?.cmp(&parse_version(b)?))
}

/// Whether two version strings name the same release
///
/// Falls back to string equality for strings that do not parse.
pub fn same_version(a: &str, b: &str) -> bool {
    match compare_versions(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

/// Compare the current version to the latest version
pub fn compare_to_latest(current_version: &str, latest_version: &str) -> CompareResult {
    match compare_versions(current_version, latest_version) {
        Some(Ordering::Equal) => CompareResult::Latest,
        Some(Ordering::Less) => CompareResult::Outdated,
        Some(Ordering::Greater) => CompareResult::Newer,
        None => CompareResult::Invalid,
    }
}

/// Strip every non-numeric modifier from the end of a version
///
/// Pre-releases ship before their stable release but carry the same
/// vulnerabilities, so they are matched as their numeric base.
pub fn numeric_base(version: &str) -> &str {
    let end = version
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(version.len());
    version[..end].trim_end_matches('.')
}

/// The part of a version before its first dot (the major release)
pub fn major_component(version: &str) -> &str {
    version.split_once('.').map_or(version, |(major, _)| major)
}
