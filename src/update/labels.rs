//! Translation seam for user-facing texts
//!
//! The engine only produces translation keys with placeholder data.
//! Rendering them into display strings is left to a [`Translator`].

use std::sync::LazyLock;

#[cfg(test)]
use mockall::automock;
use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\s*([A-Za-z0-9_.-]+)\s*\}").expect("placeholder pattern is valid")
});

/// Looks up display strings for translation keys
#[cfg_attr(test, automock)]
pub trait Translator {
    fn translate(&self, key: &str) -> Option<String>;
}

/// Replace `{placeholder}` markers with the given values
///
/// Unknown placeholders are left untouched.
pub fn template(text: &str, data: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            data.iter()
                .find(|(key, _)| *key == name)
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
        })
        .into_owned()
}

/// Translate `key` and fill in its placeholders; `fallback` is used for
/// unknown keys
pub fn render(
    translator: &dyn Translator,
    key: &str,
    fallback: &str,
    data: &[(&str, &str)],
) -> String {
    let text = translator
        .translate(key)
        .unwrap_or_else(|| fallback.to_string());
    template(&text, data)
}

/// Built-in English texts
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishLabels;

impl Translator for EnglishLabels {
    fn translate(&self, key: &str) -> Option<String> {
        let text = match key {
            "system.updateStatus.up-to-date" => "Up to date",
            "system.updateStatus.not-vulnerable" => "No known vulnerabilities",
            "system.updateStatus.security-update" => "Free security update { version } available",
            "system.updateStatus.security-upgrade" => {
                "Upgrade { version } with security fixes available"
            }
            "system.updateStatus.update" => "Free update { version } available",
            "system.updateStatus.upgrade" => "Upgrade { version } available",
            "system.updateStatus.unreleased" => "Unreleased version",
            "system.updateStatus.error" => "Could not check for updates",
            "system.issues.vulnerability.kirby" => {
                "Your installation might be affected by the following vulnerability \
                 ({ severity } severity): { description }"
            }
            "system.issues.vulnerability.plugin" => {
                "Your installation might be affected by the following vulnerability \
                 in the { plugin } plugin ({ severity } severity): { description }"
            }
            "system.issues.eol.kirby" => {
                "Your installed version has reached end-of-life \
                 and will not receive further security updates"
            }
            "system.issues.eol.plugin" => {
                "Your installed version of the { plugin } plugin has reached end-of-life \
                 and will not receive further updates"
            }
            "system.issues.eol.php" => {
                "Your installed PHP release { release } has reached end-of-life \
                 and will not receive further security updates"
            }
            _ => return None,
        };
        Some(text.to_string())
    }
}
