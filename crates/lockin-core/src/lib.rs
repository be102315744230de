//! Lock In Core Library
//!
//! This crate provides the decision engine for the Lock In site blocker.
//! Given a URL, the current time and a settings snapshot, it answers a single
//! question: should this page be replaced by the block overlay?
//!
//! # Architecture
//!
//! The engine is pure and synchronous. Every call receives a full `Settings`
//! snapshot by reference and keeps nothing between calls, so callers can
//! invoke it on every navigation event and hand it a fresh snapshot whenever
//! the persisted settings change.
//!
//! Every failure degrades to "not blocked": a malformed URL, a broken regex or
//! a missing settings field never strands the user on a blank page.
//!
//! # Modules
//!
//! - `types`: Settings data model and decision results
//! - `url`: URL parsing and host/path normalization
//! - `pattern`: Exact, regex and glob path matchers
//! - `matcher`: Site lookup and rule matching
//! - `schedule`: Blocking window evaluation with an injectable clock
//! - `decision`: The block/allow decision
//! - `settings`: Settings loading, editing and validation
//! - `guard`: Navigation observers and block enforcement

pub mod decision;
pub mod guard;
pub mod matcher;
pub mod pattern;
pub mod schedule;
pub mod settings;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use decision::{evaluate, should_block, should_block_with_clock};
pub use guard::{BlockOverlay, Enforcement, NavigationEvent, NavigationGuard, ObserverKind};
pub use matcher::{find_site, match_site};
pub use pattern::matches_path;
pub use schedule::{is_within_schedule, is_within_schedule_at, Clock, FixedClock, SystemClock};
pub use settings::{RuleIssue, SettingsError};
pub use types::{
    DaySet, Decision, ListType, PathRule, Reason, RuleType, Schedule, Settings, SiteBlock, Verdict,
};
