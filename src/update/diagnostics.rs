//! Error accumulation for a single resolution pass
//!
//! Nothing in the engine fails hard on bad feed data. Problems are recorded
//! here and the computation continues with a safe default.

use thiserror::Error;
use tracing::debug;

use crate::version::constraint;
use crate::version::error::ConstraintError;

/// A recorded problem; `{package}` in the message stands for the package name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ResolutionError {
    pub message: String,
    #[source]
    pub cause: Option<ConstraintError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    errors: Vec<ResolutionError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("Recorded resolution error: {}", message);
        self.errors.push(ResolutionError {
            message,
            cause: None,
        });
    }

    /// Compare a version against a constraint; a constraint that cannot be
    /// evaluated is recorded and counts as not satisfied
    ///
    /// `reason` is appended to the error message (e.g. "while checking URL").
    pub fn match_version(&mut self, version: &str, constraint: &str, reason: &str) -> bool {
        match constraint::matches(version, constraint) {
            Ok(matched) => matched,
            Err(e) => {
                let message = format!(
                    "Error comparing version constraint for {{package}} {}: {}",
                    reason, e
                );
                debug!("Recorded resolution error: {}", message);
                self.errors.push(ResolutionError {
                    message,
                    cause: Some(e),
                });
                false
            }
        }
    }

    pub fn errors(&self) -> &[ResolutionError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}
