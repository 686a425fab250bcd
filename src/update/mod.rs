//! Update and security-advisory resolution
//!
//! Given the update feed of a package and its installed version, this module
//! decides which update to recommend and which notices to show.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Feed     │────▶│   Package   │────▶│   Summary   │
//! │  (payload)  │     │ (aggregate) │     │  (display)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!        ┌───────────────────┼───────────────────┐
//!        ▼                   ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Releases   │     │ Advisories  │     │    Urls     │
//! │(lines,free) │     │(min. fix)   │     │ (templates) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │                   │
//!        └─────────┬─────────┴───────────────────┘
//!                  ▼
//!     ┌─────────────────────────┐
//!     │ UpdateDecision, Notices │
//!     └─────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`package`]: Aggregate root computing everything once per package
//! - [`feed`]: Shape of the feed payload and the fetch outcome
//! - [`release`]: Release lines and free update detection
//! - [`advisory`]: Advisories and the minimum security update search
//! - [`severity`]: Severity ranking of advisories
//! - [`urls`]: Changelog and upgrade URL templates
//! - [`decision`]: Prioritized update decision
//! - [`status`]: Status tags with icon, theme and label
//! - [`notices`]: Vulnerability, custom and end-of-life notices
//! - [`diagnostics`]: Error accumulation
//! - [`labels`]: Translation seam
//! - [`date`]: Date parsing for feed and license dates

pub mod advisory;
pub mod date;
pub mod decision;
pub mod diagnostics;
pub mod feed;
pub mod labels;
pub mod notices;
pub mod package;
pub mod release;
pub mod severity;
pub mod status;
pub mod urls;
