//! Version constraint matcher
//!
//! Supports the Composer constraint dialect used by the update feed:
//! - `1.2.3`, `=1.2.3` - exact match (partial versions are zero-padded)
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3`, `!=1.2.3` - comparison operators
//! - `^1.2.3` - compatible with version (>=1.2.3 <2.0.0)
//! - `~1.2` / `~1.2.3` - next significant release (>=1.2 <2.0 / >=1.2.3 <1.3.0)
//! - `1.2.*`, `1.*`, `*` - wildcards
//! - `1.0 - 2.0` - hyphen range
//! - whitespace or `,` for AND, `||` or `|` for OR

use semver::{Prerelease, Version};

use crate::version::error::ConstraintError;
use crate::version::semver::parse_version;

/// Check whether `version` satisfies `constraint`
pub fn matches(version: &str, constraint: &str) -> Result<bool, ConstraintError> {
    let constraint = Constraint::parse(constraint)?;
    let version =
        parse_version(version).ok_or_else(|| ConstraintError::InvalidVersion(version.to_string()))?;

    Ok(constraint.satisfies(&version))
}

/// A parsed version constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Single range (^1.0.0, >=1.0.0, etc.)
    Single(VersionRange),
    /// AND of constraints (>=1.0.0 <2.0.0), all must satisfy
    And(Vec<Constraint>),
    /// OR of constraints (^1.0.0 || ^2.0.0), any must satisfy
    Or(Vec<Constraint>),
}

impl Constraint {
    /// Parse a constraint string
    pub fn parse(constraint: &str) -> Result<Self, ConstraintError> {
        let trimmed = constraint.trim();
        if trimmed.is_empty() {
            return Err(ConstraintError::Empty);
        }

        // OR has the lowest precedence; `|` is the legacy spelling of `||`
        let or_parts: Vec<&str> = trimmed
            .split('|')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        if or_parts.is_empty() {
            return Err(ConstraintError::Invalid(constraint.to_string()));
        }

        if or_parts.len() > 1 {
            return or_parts
                .into_iter()
                .map(|part| Self::parse_and_or_single(part, constraint))
                .collect::<Result<Vec<_>, _>>()
                .map(Constraint::Or);
        }

        Self::parse_and_or_single(or_parts[0], constraint)
    }

    /// Parse a constraint that may be AND (space or comma separated) or a single range
    fn parse_and_or_single(part: &str, original: &str) -> Result<Self, ConstraintError> {
        let tokens = Self::split_and_parts(part);

        let mut ranges = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            // `1.0 - 2.0` spans three tokens
            if tokens.get(i + 1).map(String::as_str) == Some("-") {
                let Some(to) = tokens.get(i + 2) else {
                    return Err(ConstraintError::Invalid(original.to_string()));
                };
                ranges.push(VersionRange::parse_hyphen(&tokens[i], to, original)?);
                i += 3;
                continue;
            }

            ranges.push(VersionRange::parse(&tokens[i], original)?);
            i += 1;
        }

        match ranges.len() {
            0 => Err(ConstraintError::Invalid(original.to_string())),
            1 => Ok(Constraint::Single(ranges.remove(0))),
            _ => Ok(Constraint::And(
                ranges.into_iter().map(Constraint::Single).collect(),
            )),
        }
    }

    /// Split a constraint into AND tokens
    ///
    /// An operator separated from its version by whitespace (`>= 1.0`)
    /// is joined back onto the version.
    fn split_and_parts(part: &str) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        let mut pending_operator: Option<String> = None;

        for raw in part.split([' ', '\t', ',']).filter(|t| !t.is_empty()) {
            if is_bare_operator(raw) {
                pending_operator = Some(raw.to_string());
                continue;
            }

            match pending_operator.take() {
                Some(operator) => tokens.push(format!("{operator}{raw}")),
                None => tokens.push(raw.to_string()),
            }
        }

        if let Some(operator) = pending_operator {
            tokens.push(operator);
        }

        tokens
    }

    /// Check if a version satisfies this constraint
    pub fn satisfies(&self, version: &Version) -> bool {
        match self {
            Constraint::Single(range) => range.satisfies(version),
            Constraint::And(constraints) => constraints.iter().all(|c| c.satisfies(version)),
            Constraint::Or(constraints) => constraints.iter().any(|c| c.satisfies(version)),
        }
    }
}

fn is_bare_operator(token: &str) -> bool {
    matches!(
        token,
        ">=" | ">" | "<=" | "<" | "=" | "==" | "!=" | "<>" | "^" | "~"
    )
}

/// Represents a single parsed version range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRange {
    /// Exact version match
    Exact(Version),
    /// Anything but this version
    NotEqual(Version),
    /// Greater than or equal
    Gte(Version),
    /// Greater than
    Gt(Version),
    /// Less than or equal
    Lte(Version),
    /// Less than
    Lt(Version),
    /// Half-open interval: >=from <to
    /// (caret, tilde, wildcard and partial hyphen ranges)
    Between { from: Version, to: Version },
    /// Closed interval: >=from <=to (hyphen range with a full upper version)
    Hyphen { from: Version, to: Version },
    /// Any version: * matches all versions
    Any,
}

impl VersionRange {
    /// Parse a single range token
    fn parse(token: &str, original: &str) -> Result<Self, ConstraintError> {
        let invalid = || ConstraintError::Invalid(original.to_string());

        // stability flags (`@stable`, `@dev`) do not affect matching
        let token = token.split('@').next().unwrap_or(token).trim();
        if token.is_empty() {
            return Err(invalid());
        }

        if let Some(rest) = token.strip_prefix(">=") {
            let version = parse_partial(rest).ok_or_else(invalid)?.version;
            Ok(VersionRange::Gte(floor(version)))
        } else if let Some(rest) = token.strip_prefix("<=") {
            parse_partial(rest)
                .map(|v| VersionRange::Lte(v.version))
                .ok_or_else(invalid)
        } else if let Some(rest) = token.strip_prefix("<>").or_else(|| token.strip_prefix("!=")) {
            parse_partial(rest)
                .map(|v| VersionRange::NotEqual(v.version))
                .ok_or_else(invalid)
        } else if let Some(rest) = token.strip_prefix('>') {
            parse_partial(rest)
                .map(|v| VersionRange::Gt(v.version))
                .ok_or_else(invalid)
        } else if let Some(rest) = token.strip_prefix('<') {
            let version = parse_partial(rest).ok_or_else(invalid)?.version;
            Ok(VersionRange::Lt(floor(version)))
        } else if let Some(rest) = token.strip_prefix('^') {
            parse_partial(rest).and_then(caret).ok_or_else(invalid)
        } else if let Some(rest) = token.strip_prefix('~') {
            parse_partial(rest).and_then(tilde).ok_or_else(invalid)
        } else if token == "*" || token.eq_ignore_ascii_case("x") {
            Ok(VersionRange::Any)
        } else if let Some(range) = Self::parse_wildcard(token) {
            Ok(range)
        } else {
            let rest = token
                .strip_prefix("==")
                .or_else(|| token.strip_prefix('='))
                .unwrap_or(token);
            parse_partial(rest)
                .map(|v| VersionRange::Exact(v.version))
                .ok_or_else(invalid)
        }
    }

    /// Parse hyphen range like "1.0.0 - 2.0.0"
    ///
    /// A partial upper bound excludes the next release line:
    /// `1.0 - 2.1` means `>=1.0.0 <2.2.0`.
    fn parse_hyphen(from: &str, to: &str, original: &str) -> Result<Self, ConstraintError> {
        let invalid = || ConstraintError::Invalid(original.to_string());

        let from = floor(parse_partial(from).ok_or_else(invalid)?.version);
        let to = parse_partial(to).ok_or_else(invalid)?;

        if to.components >= 3 {
            return Ok(VersionRange::Hyphen {
                from,
                to: to.version,
            });
        }

        Ok(VersionRange::Between {
            from,
            to: bump(&to.version, to.components).ok_or_else(invalid)?,
        })
    }

    /// Parse wildcard patterns like "1.*" or "1.2.x"
    fn parse_wildcard(token: &str) -> Option<Self> {
        let parts: Vec<&str> = token.trim_start_matches(['v', '=']).split('.').collect();
        let is_wildcard = |s: &str| s == "*" || s.eq_ignore_ascii_case("x");

        match parts.as_slice() {
            [major, x] if is_wildcard(x) => {
                let major = major.parse::<u64>().ok()?;
                Some(VersionRange::Between {
                    from: floor(Version::new(major, 0, 0)),
                    to: floor(Version::new(major.checked_add(1)?, 0, 0)),
                })
            }
            [major, minor, x] if is_wildcard(x) => {
                let major = major.parse::<u64>().ok()?;
                let minor = minor.parse::<u64>().ok()?;
                Some(VersionRange::Between {
                    from: floor(Version::new(major, minor, 0)),
                    to: floor(Version::new(major, minor.checked_add(1)?, 0)),
                })
            }
            [major, minor, patch, x] if is_wildcard(x) => {
                let major = major.parse::<u64>().ok()?;
                let minor = minor.parse::<u64>().ok()?;
                let patch = patch.parse::<u64>().ok()?;
                Some(VersionRange::Between {
                    from: floor(Version::new(major, minor, patch)),
                    to: floor(Version::new(major, minor, patch.checked_add(1)?)),
                })
            }
            _ => None,
        }
    }

    /// Check if a version satisfies this range
    pub fn satisfies(&self, version: &Version) -> bool {
        match self {
            VersionRange::Exact(v) => version == v,
            VersionRange::NotEqual(v) => version != v,
            VersionRange::Gte(v) => version >= v,
            VersionRange::Gt(v) => version > v,
            VersionRange::Lte(v) => version <= v,
            VersionRange::Lt(v) => version < v,
            VersionRange::Between { from, to } => version >= from && version < to,
            VersionRange::Hyphen { from, to } => version >= from && version <= to,
            VersionRange::Any => true,
        }
    }
}

/// A version together with the number of components spelled out
struct PartialVersion {
    version: Version,
    components: usize,
}

fn parse_partial(input: &str) -> Option<PartialVersion> {
    let input = input.trim();
    let numeric = input
        .trim_start_matches(['v', 'V'])
        .split(['-', '+'])
        .next()
        .unwrap_or_default();

    Some(PartialVersion {
        version: parse_version(input)?,
        components: numeric.split('.').count(),
    })
}

/// Lowest possible version of a release, including its pre-releases
///
/// `>=3.6.0` covers `3.6.0-rc.1`, `<3.6.0` excludes it.
fn floor(mut version: Version) -> Version {
    if version.pre.is_empty()
        && version.build.is_empty()
        && let Ok(pre) = Prerelease::new("0")
    {
        version.pre = pre;
    }
    version
}

/// Exclusive upper bound after the last spelled-out component
///
/// `None` once a component cannot be incremented any further.
fn bump(version: &Version, components: usize) -> Option<Version> {
    let next = match components {
        1 => Version::new(version.major.checked_add(1)?, 0, 0),
        2 => Version::new(version.major, version.minor.checked_add(1)?, 0),
        _ => Version::new(version.major, version.minor, version.patch.checked_add(1)?),
    };
    Some(floor(next))
}

/// ^1.2.3 -> >=1.2.3 <2.0.0
/// ^0.2.3 -> >=0.2.3 <0.3.0
/// ^0.0.3 -> >=0.0.3 <0.0.4
fn caret(partial: PartialVersion) -> Option<VersionRange> {
    let v = &partial.version;
    let to = if v.major > 0 || partial.components == 1 {
        Version::new(v.major.checked_add(1)?, 0, 0)
    } else if v.minor > 0 || partial.components == 2 {
        Version::new(0, v.minor.checked_add(1)?, 0)
    } else {
        Version::new(0, 0, v.patch.checked_add(1)?)
    };

    Some(VersionRange::Between {
        from: floor(partial.version),
        to: floor(to),
    })
}

/// ~1.2 -> >=1.2.0 <2.0.0
/// ~1.2.3 -> >=1.2.3 <1.3.0
/// ~1.2.3.4 -> >=1.2.3.4 <1.2.4
fn tilde(partial: PartialVersion) -> Option<VersionRange> {
    let v = &partial.version;
    let to = match partial.components {
        1 | 2 => Version::new(v.major.checked_add(1)?, 0, 0),
        3 => Version::new(v.major, v.minor.checked_add(1)?, 0),
        _ => Version::new(v.major, v.minor, v.patch.checked_add(1)?),
    };

    Some(VersionRange::Between {
        from: floor(partial.version),
        to: floor(to),
    })
}
