//! Core type definitions for Lock In
//!
//! These types mirror the persisted settings record one-to-one and are
//! shared by the engine, the wasm bindings and the CLI.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// Null Handling
// =============================================================================

// Stored records may carry explicit `null`s; they read as the field default.

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_start_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(|| Schedule::default().start_time))
}

fn null_as_end_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(|| Schedule::default().end_time))
}

fn null_as_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

// =============================================================================
// Day Set (weekday indices, Sunday = 0)
// =============================================================================

bitflags::bitflags! {
    /// Set of weekdays on which the schedule is active.
    ///
    /// Persisted as an array of weekday indices, Sunday = 0 through Saturday = 6.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DaySet: u8 {
        const SUNDAY = 1 << 0;
        const MONDAY = 1 << 1;
        const TUESDAY = 1 << 2;
        const WEDNESDAY = 1 << 3;
        const THURSDAY = 1 << 4;
        const FRIDAY = 1 << 5;
        const SATURDAY = 1 << 6;

        /// Monday through Friday
        const WEEKDAYS = Self::MONDAY.bits()
            | Self::TUESDAY.bits()
            | Self::WEDNESDAY.bits()
            | Self::THURSDAY.bits()
            | Self::FRIDAY.bits();
        /// Saturday and Sunday
        const WEEKEND = Self::SATURDAY.bits() | Self::SUNDAY.bits();
        /// Every day
        const ALL = 0x7F;
    }
}

impl DaySet {
    /// Flag for a weekday index. Indices outside 0..=6 have no flag.
    pub fn from_index(index: i64) -> Option<Self> {
        if (0..=6).contains(&index) {
            Some(Self::from_bits_truncate(1 << index))
        } else {
            None
        }
    }

    /// Whether the weekday index is in the set.
    #[inline]
    pub fn contains_index(&self, index: u32) -> bool {
        index <= 6 && self.bits() & (1 << index) != 0
    }

    /// Weekday indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = u8> + '_ {
        (0u8..=6).filter(move |i| self.contains_index(u32::from(*i)))
    }
}

impl Default for DaySet {
    fn default() -> Self {
        Self::WEEKDAYS
    }
}

impl FromIterator<i64> for DaySet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        iter.into_iter()
            .filter_map(Self::from_index)
            .fold(Self::empty(), |acc, day| acc | day)
    }
}

impl Serialize for DaySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.indices())
    }
}

impl<'de> Deserialize<'de> for DaySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Entries that are not weekday indices can never match; drop them.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum DayEntry {
            Index(i64),
            Other(serde::de::IgnoredAny),
        }

        let entries = Vec::<DayEntry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| match entry {
                DayEntry::Index(i) => Some(i),
                DayEntry::Other(_) => None,
            })
            .collect())
    }
}

// =============================================================================
// Schedule
// =============================================================================

/// Weekly blocking window.
///
/// Times are zero-padded 24h `"HH:MM"` strings and are compared
/// lexicographically, which only orders correctly because of the fixed width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Schedule {
    #[serde(deserialize_with = "null_as_start_time")]
    pub start_time: String,
    #[serde(deserialize_with = "null_as_end_time")]
    pub end_time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub days: DaySet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            start_time: "09:00".to_string(),
            end_time: "17:00".to_string(),
            days: DaySet::WEEKDAYS,
            all_day: Some(false),
        }
    }
}

impl Schedule {
    pub fn new(start_time: &str, end_time: &str, days: DaySet) -> Self {
        Self {
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            days,
            all_day: None,
        }
    }

    /// A schedule that is always active.
    pub fn all_day() -> Self {
        Self {
            all_day: Some(true),
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_all_day(&self) -> bool {
        self.all_day.unwrap_or(false)
    }

    /// Window wraps past midnight (e.g. 22:00 to 06:00).
    #[inline]
    pub fn is_overnight(&self) -> bool {
        self.start_time > self.end_time
    }
}

// =============================================================================
// Path Rules
// =============================================================================

/// How a rule's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleType {
    /// Path equals the value, or is below it on a segment boundary
    #[default]
    Exact,
    /// Value is a regular expression searched in the path
    Regex,
    /// Value is a `*`/`?` wildcard matched against the whole path
    Glob,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Regex => "regex",
            Self::Glob => "glob",
        }
    }

    /// Parse a persisted type string. Anything unrecognised is exact.
    pub fn from_str(s: &str) -> Self {
        match s {
            "regex" => Self::Regex,
            "glob" => Self::Glob,
            _ => Self::Exact,
        }
    }
}

impl From<String> for RuleType {
    fn from(value: String) -> Self {
        Self::from_str(&value)
    }
}

impl From<RuleType> for String {
    fn from(value: RuleType) -> Self {
        value.as_str().to_string()
    }
}

/// One allow/block rule for a site's paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathRule {
    pub value: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: RuleType,
}

impl PathRule {
    pub fn new(value: &str, kind: RuleType) -> Self {
        Self {
            value: value.to_string(),
            kind,
        }
    }

    pub fn exact(value: &str) -> Self {
        Self::new(value, RuleType::Exact)
    }

    pub fn regex(value: &str) -> Self {
        Self::new(value, RuleType::Regex)
    }

    pub fn glob(value: &str) -> Self {
        Self::new(value, RuleType::Glob)
    }
}

// =============================================================================
// Site Blocks
// =============================================================================

/// What a site's rule list enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ListType {
    /// Rules list allowed paths; everything else on the domain is blocked
    #[default]
    Whitelist,
    /// Rules list blocked paths; everything else on the domain is allowed
    Blacklist,
}

impl ListType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whitelist => "whitelist",
            Self::Blacklist => "blacklist",
        }
    }

    /// Parse a persisted list type. Only `"blacklist"` selects blacklist mode.
    pub fn from_str(s: &str) -> Self {
        if s == "blacklist" {
            Self::Blacklist
        } else {
            Self::Whitelist
        }
    }
}

impl From<String> for ListType {
    fn from(value: String) -> Self {
        Self::from_str(&value)
    }
}

impl From<ListType> for String {
    fn from(value: ListType) -> Self {
        value.as_str().to_string()
    }
}

/// A blocked domain and its path rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteBlock {
    /// Registrable domain without scheme, path or leading `www.`
    pub domain: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub paths: Vec<PathRule>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub list_type: ListType,
}

impl SiteBlock {
    pub fn new(domain: &str, list_type: ListType) -> Self {
        Self {
            domain: domain.to_string(),
            paths: Vec::new(),
            list_type,
        }
    }

    pub fn with_rule(mut self, rule: PathRule) -> Self {
        self.paths.push(rule);
        self
    }
}

// =============================================================================
// Settings
// =============================================================================

/// The persisted settings record.
///
/// The engine treats this as an immutable snapshot for each decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    #[serde(deserialize_with = "null_as_default")]
    pub blocked_sites: Vec<SiteBlock>,
    #[serde(deserialize_with = "null_as_default")]
    pub schedule: Schedule,
    #[serde(deserialize_with = "null_as_true")]
    pub flash_enabled: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub custom_block_message: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            blocked_sites: Vec::new(),
            schedule: Schedule::default(),
            flash_enabled: true,
            custom_block_message: String::new(),
        }
    }
}

// =============================================================================
// Decision Result
// =============================================================================

/// Final decision for a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Block,
}

/// Why a decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// Current time is outside the blocking window
    OutsideSchedule,
    /// URL could not be parsed
    InvalidUrl,
    /// Host does not belong to any blocked site
    NoMatchingSite,
    /// Blacklist site, a rule matched the path
    BlacklistHit,
    /// Blacklist site, no rule matched the path
    BlacklistMiss,
    /// Whitelist site, a rule allowed the path
    WhitelistHit,
    /// Whitelist site, no rule allowed the path
    WhitelistMiss,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutsideSchedule => "outside-schedule",
            Self::InvalidUrl => "invalid-url",
            Self::NoMatchingSite => "no-matching-site",
            Self::BlacklistHit => "blacklist-hit",
            Self::BlacklistMiss => "blacklist-miss",
            Self::WhitelistHit => "whitelist-hit",
            Self::WhitelistMiss => "whitelist-miss",
        }
    }
}

/// Result of evaluating a URL against a settings snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub decision: Decision,
    pub reason: Reason,
    /// Index into `blocked_sites` of the site the host resolved to
    pub site_index: Option<usize>,
    /// Index into that site's `paths` of the first rule that matched
    pub rule_index: Option<usize>,
}

impl Verdict {
    pub(crate) fn allow(reason: Reason) -> Self {
        Self {
            decision: Decision::Allow,
            reason,
            site_index: None,
            rule_index: None,
        }
    }

    #[inline]
    pub fn is_block(&self) -> bool {
        self.decision == Decision::Block
    }
}
