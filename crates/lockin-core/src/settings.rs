//! Settings loading, editing and validation
//!
//! This is the configuration side of the engine: the persisted JSON record,
//! the options-page edits that keep domains normalized, and an advisory
//! validation pass. None of it runs on the decision path.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::pattern::compile_rule;
use crate::types::{ListType, PathRule, RuleType, Settings, SiteBlock};
use crate::url::normalize_domain;

/// Overlay text when no custom message is set.
pub const DEFAULT_BLOCK_MESSAGE: &str = "YOU NEED TO LOCK IN";

/// Error type for settings I/O and edits.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Domain is empty")]
    EmptyDomain,
    #[error("Site is already blocked: {0}")]
    DuplicateSite(String),
    #[error("No blocked site for domain: {0}")]
    UnknownSite(String),
}

// =============================================================================
// Persistence
// =============================================================================

impl Settings {
    /// Decode the persisted record. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = self.to_json_pretty()?;
        fs::write(path, json).map_err(|source| SettingsError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Message shown on the block overlay.
    pub fn block_message(&self) -> &str {
        if self.custom_block_message.is_empty() {
            DEFAULT_BLOCK_MESSAGE
        } else {
            &self.custom_block_message
        }
    }
}

// =============================================================================
// Edits
// =============================================================================

impl Settings {
    pub fn site(&self, domain: &str) -> Option<&SiteBlock> {
        self.blocked_sites.iter().find(|s| s.domain == domain)
    }

    fn site_mut(&mut self, domain: &str) -> Result<&mut SiteBlock, SettingsError> {
        self.blocked_sites
            .iter_mut()
            .find(|s| s.domain == domain)
            .ok_or_else(|| SettingsError::UnknownSite(domain.to_string()))
    }

    /// Add a site from user input such as `https://www.example.com/feed`.
    ///
    /// Returns the normalized domain that was stored.
    pub fn add_site(&mut self, input: &str, list_type: ListType) -> Result<String, SettingsError> {
        let domain = normalize_domain(input);
        if domain.is_empty() {
            return Err(SettingsError::EmptyDomain);
        }
        if self.site(&domain).is_some() {
            return Err(SettingsError::DuplicateSite(domain));
        }

        self.blocked_sites.push(SiteBlock::new(&domain, list_type));
        Ok(domain)
    }

    pub fn remove_site(&mut self, domain: &str) -> Result<SiteBlock, SettingsError> {
        let domain = normalize_domain(domain);
        let idx = self
            .blocked_sites
            .iter()
            .position(|s| s.domain == domain)
            .ok_or_else(|| SettingsError::UnknownSite(domain.clone()))?;
        Ok(self.blocked_sites.remove(idx))
    }

    /// Append a rule to a site. Exact values get a leading `/`.
    ///
    /// Returns `false` if an identical rule was already present.
    pub fn add_rule(&mut self, domain: &str, mut rule: PathRule) -> Result<bool, SettingsError> {
        if rule.kind == RuleType::Exact && !rule.value.starts_with('/') {
            rule.value.insert(0, '/');
        }

        let site = self.site_mut(&normalize_domain(domain))?;
        if site.paths.contains(&rule) {
            return Ok(false);
        }
        site.paths.push(rule);
        Ok(true)
    }

    /// Remove every rule on the site whose value is `value`.
    ///
    /// Returns the number of rules removed.
    pub fn remove_rule(&mut self, domain: &str, value: &str) -> Result<usize, SettingsError> {
        let site = self.site_mut(&normalize_domain(domain))?;
        let before = site.paths.len();
        site.paths.retain(|r| r.value != value);
        Ok(before - site.paths.len())
    }
}

// =============================================================================
// Validation
// =============================================================================

/// A problem found in a settings snapshot.
///
/// Issues are advisory: the engine still runs, with broken rules treated as
/// non-matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleIssue {
    InvalidPattern {
        domain: String,
        value: String,
        kind: RuleType,
        error: String,
    },
    EmptyDomain {
        index: usize,
    },
    UnnormalizedDomain {
        domain: String,
        expected: String,
    },
    DuplicateDomain {
        domain: String,
    },
    InvalidTime {
        field: &'static str,
        value: String,
    },
    NoActiveDays,
}

impl fmt::Display for RuleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern {
                domain,
                value,
                kind,
                error,
            } => write!(f, "{}: {} rule '{}' never matches: {}", domain, kind.as_str(), value, error),
            Self::EmptyDomain { index } => write!(f, "site #{} has an empty domain", index),
            Self::UnnormalizedDomain { domain, expected } => {
                write!(f, "domain '{}' should be written as '{}'", domain, expected)
            }
            Self::DuplicateDomain { domain } => write!(f, "domain '{}' is listed more than once", domain),
            Self::InvalidTime { field, value } => {
                write!(f, "schedule {} '{}' is not a zero-padded HH:MM time", field, value)
            }
            Self::NoActiveDays => write!(f, "schedule has no days and is never active"),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<RuleIssue> {
        let mut issues = Vec::new();

        for (index, site) in self.blocked_sites.iter().enumerate() {
            if site.domain.is_empty() {
                issues.push(RuleIssue::EmptyDomain { index });
                continue;
            }

            let expected = normalize_domain(&site.domain);
            if expected != site.domain {
                issues.push(RuleIssue::UnnormalizedDomain {
                    domain: site.domain.clone(),
                    expected,
                });
            }

            if self.blocked_sites[..index].iter().any(|s| s.domain == site.domain) {
                issues.push(RuleIssue::DuplicateDomain {
                    domain: site.domain.clone(),
                });
            }

            for rule in &site.paths {
                if let Err(e) = compile_rule(rule) {
                    issues.push(RuleIssue::InvalidPattern {
                        domain: site.domain.clone(),
                        value: rule.value.clone(),
                        kind: rule.kind,
                        error: e.to_string(),
                    });
                }
            }
        }

        let schedule = &self.schedule;
        if !schedule.is_all_day() {
            for (field, value) in [("start", &schedule.start_time), ("end", &schedule.end_time)] {
                if !is_hhmm(value) {
                    issues.push(RuleIssue::InvalidTime {
                        field,
                        value: value.clone(),
                    });
                }
            }
            if schedule.days.is_empty() {
                issues.push(RuleIssue::NoActiveDays);
            }
        }

        issues
    }
}

/// Zero-padded 24h `HH:MM`.
fn is_hhmm(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() != 5 || b[2] != b':' {
        return false;
    }
    if ![b[0], b[1], b[3], b[4]].iter().all(u8::is_ascii_digit) {
        return false;
    }
    let hours = (b[0] - b'0') * 10 + (b[1] - b'0');
    let minutes = (b[3] - b'0') * 10 + (b[4] - b'0');
    hours <= 23 && minutes <= 59
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DaySet, Schedule};

    #[test]
    fn test_from_json_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.schedule.start_time, "09:00");
        assert_eq!(settings.schedule.days, DaySet::WEEKDAYS);
    }

    #[test]
    fn test_from_json_full() {
        let settings = Settings::from_json(
            r#"{
                "blockedSites": [
                    {"domain": "example.com", "listType": "blacklist",
                     "paths": [{"value": "/shorts/*", "type": "glob"}]}
                ],
                "schedule": {"startTime": "22:00", "endTime": "06:00", "days": [0, 6]},
                "flashEnabled": false,
                "customBlockMessage": "Go outside"
            }"#,
        )
        .unwrap();

        assert_eq!(settings.blocked_sites[0].list_type, ListType::Blacklist);
        assert_eq!(settings.blocked_sites[0].paths[0], PathRule::glob("/shorts/*"));
        assert_eq!(settings.schedule.days, DaySet::WEEKEND);
        assert!(!settings.flash_enabled);
        assert_eq!(settings.block_message(), "Go outside");
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(Settings::from_json("not json"), Err(SettingsError::Json(_))));
    }

    #[test]
    fn test_json_round_trip_preserves_shape() {
        let mut settings = Settings::default();
        settings.add_site("example.com", ListType::Whitelist).unwrap();
        let json = settings.to_json_pretty().unwrap();
        assert!(json.contains("\"blockedSites\""));
        assert!(json.contains("\"listType\": \"whitelist\""));
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.add_site("news.ycombinator.com", ListType::Whitelist).unwrap();
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn test_default_block_message() {
        assert_eq!(Settings::default().block_message(), DEFAULT_BLOCK_MESSAGE);
    }

    #[test]
    fn test_add_site_normalizes() {
        let mut settings = Settings::default();
        let domain = settings
            .add_site("https://www.Example.com/feed", ListType::Whitelist)
            .unwrap();
        assert_eq!(domain, "example.com");
        assert_eq!(settings.blocked_sites[0].domain, "example.com");
    }

    #[test]
    fn test_add_site_rejects_duplicates_and_empty() {
        let mut settings = Settings::default();
        settings.add_site("example.com", ListType::Whitelist).unwrap();
        assert!(matches!(
            settings.add_site("www.example.com", ListType::Blacklist),
            Err(SettingsError::DuplicateSite(_))
        ));
        assert!(matches!(
            settings.add_site("   ", ListType::Whitelist),
            Err(SettingsError::EmptyDomain)
        ));
    }

    #[test]
    fn test_remove_site() {
        let mut settings = Settings::default();
        settings.add_site("example.com", ListType::Whitelist).unwrap();
        let removed = settings.remove_site("www.example.com").unwrap();
        assert_eq!(removed.domain, "example.com");
        assert!(settings.blocked_sites.is_empty());
        assert!(matches!(
            settings.remove_site("example.com"),
            Err(SettingsError::UnknownSite(_))
        ));
    }

    #[test]
    fn test_add_rule() {
        let mut settings = Settings::default();
        settings.add_site("example.com", ListType::Whitelist).unwrap();

        assert!(settings.add_rule("example.com", PathRule::exact("messages")).unwrap());
        assert!(!settings.add_rule("example.com", PathRule::exact("/messages")).unwrap());
        assert!(settings.add_rule("example.com", PathRule::glob("*.pdf")).unwrap());

        let site = settings.site("example.com").unwrap();
        assert_eq!(site.paths, vec![PathRule::exact("/messages"), PathRule::glob("*.pdf")]);

        assert!(matches!(
            settings.add_rule("other.com", PathRule::exact("/")),
            Err(SettingsError::UnknownSite(_))
        ));
    }

    #[test]
    fn test_remove_rule() {
        let mut settings = Settings::default();
        settings.add_site("example.com", ListType::Whitelist).unwrap();
        settings.add_rule("example.com", PathRule::exact("/a")).unwrap();
        settings.add_rule("example.com", PathRule::glob("/a")).unwrap();
        settings.add_rule("example.com", PathRule::exact("/b")).unwrap();

        assert_eq!(settings.remove_rule("example.com", "/a").unwrap(), 2);
        assert_eq!(settings.remove_rule("example.com", "/zzz").unwrap(), 0);
        assert_eq!(settings.site("example.com").unwrap().paths, vec![PathRule::exact("/b")]);
    }

    #[test]
    fn test_validate_clean() {
        let mut settings = Settings::default();
        settings.add_site("example.com", ListType::Blacklist).unwrap();
        settings.add_rule("example.com", PathRule::regex(r"^/item/\d+$")).unwrap();
        assert!(settings.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_issues() {
        let settings = Settings {
            blocked_sites: vec![
                SiteBlock::new("example.com", ListType::Blacklist).with_rule(PathRule::regex("((")),
                SiteBlock::new("example.com", ListType::Whitelist),
                SiteBlock::new("www.Other.com", ListType::Whitelist),
                SiteBlock::new("", ListType::Whitelist),
            ],
            schedule: Schedule::new("9:00", "17:00", DaySet::empty()),
            ..Settings::default()
        };

        let issues = settings.validate();
        assert!(issues.iter().any(|i| matches!(i, RuleIssue::InvalidPattern { value, .. } if value == "((")));
        assert!(issues.contains(&RuleIssue::DuplicateDomain {
            domain: "example.com".to_string()
        }));
        assert!(issues.contains(&RuleIssue::UnnormalizedDomain {
            domain: "www.Other.com".to_string(),
            expected: "other.com".to_string(),
        }));
        assert!(issues.contains(&RuleIssue::EmptyDomain { index: 3 }));
        assert!(issues.contains(&RuleIssue::InvalidTime {
            field: "start",
            value: "9:00".to_string(),
        }));
        assert!(issues.contains(&RuleIssue::NoActiveDays));
        assert_eq!(issues.len(), 6);
    }

    #[test]
    fn test_validate_skips_schedule_when_all_day() {
        let mut settings = Settings::default();
        settings.schedule = Schedule::new("bad", "24:00", DaySet::empty());
        settings.schedule.all_day = Some(true);
        assert!(settings.validate().is_empty());
    }

    #[test]
    fn test_is_hhmm() {
        assert!(is_hhmm("00:00"));
        assert!(is_hhmm("23:59"));
        assert!(!is_hhmm("24:00"));
        assert!(!is_hhmm("12:60"));
        assert!(!is_hhmm("9:00"));
        assert!(!is_hhmm("09-00"));
    }

    #[test]
    fn test_issue_display() {
        let issue = RuleIssue::DuplicateDomain {
            domain: "example.com".to_string(),
        };
        assert_eq!(issue.to_string(), "domain 'example.com' is listed more than once");
    }
}
