//! Version primitives shared by the update engine
//!
//! # Modules
//!
//! - [`constraint`]: Composer-style version constraint parsing and matching
//! - [`error`]: Error types for constraints and feed payloads
//! - [`semver`]: Version parsing, ordering and normalization helpers

pub mod constraint;
pub mod error;
pub mod semver;
