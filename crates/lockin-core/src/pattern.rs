//! Path pattern matchers
//!
//! All matchers run against the normalized pathname (single trailing `/`
//! stripped unless the path is `/`). User patterns must never break
//! navigation: a regex or glob that fails to compile is a non-match.

use regex::Regex;

use crate::types::{PathRule, RuleType};
use crate::url::{normalize_pathname, normalize_rule_path};

/// Error type for pattern compilation.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid regex '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: fancy_regex::Error,
    },
    #[error("Invalid glob '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

// =============================================================================
// Rule Dispatch
// =============================================================================

/// Whether `pathname` is matched by `rule`.
pub fn matches_path(pathname: &str, rule: &PathRule) -> bool {
    let path = normalize_pathname(pathname);
    match rule.kind {
        RuleType::Exact => matches_exact(path, &rule.value),
        RuleType::Regex => matches_regex(path, &rule.value),
        RuleType::Glob => matches_glob(path, &rule.value),
    }
}

/// Check that a rule's pattern compiles. Exact rules always do.
pub fn compile_rule(rule: &PathRule) -> Result<(), PatternError> {
    match rule.kind {
        RuleType::Exact => Ok(()),
        RuleType::Regex => compile_regex(&rule.value).map(|_| ()),
        RuleType::Glob => compile_glob(&rule.value).map(|_| ()),
    }
}

// =============================================================================
// Exact / Prefix
// =============================================================================

/// Exact or segment-bounded prefix match.
///
/// `/foo` matches `/foo` and `/foo/bar` but not `/foobar`. The root pattern
/// `/` only matches the root path.
pub fn matches_exact(path: &str, value: &str) -> bool {
    let pattern = normalize_rule_path(value);

    if path == pattern {
        return true;
    }

    pattern != "/"
        && path.len() > pattern.len()
        && path.starts_with(pattern.as_str())
        && path.as_bytes()[pattern.len()] == b'/'
}

// =============================================================================
// Regex
// =============================================================================

/// Search `path` with the regex `value`. Invalid patterns never match.
///
/// Rules are written for the browser's `RegExp`, so lookaround and
/// backreferences are accepted. A match that exceeds the backtracking limit
/// counts as a non-match.
pub fn matches_regex(path: &str, value: &str) -> bool {
    let re = match compile_regex(value) {
        Ok(re) => re,
        Err(e) => {
            log::debug!("Skipping rule: {}", e);
            return false;
        }
    };

    match re.is_match(path) {
        Ok(hit) => hit,
        Err(e) => {
            log::debug!("Skipping rule '{}': {}", value, e);
            false
        }
    }
}

fn compile_regex(value: &str) -> Result<fancy_regex::Regex, PatternError> {
    fancy_regex::Regex::new(value).map_err(|source| PatternError::Regex {
        pattern: value.to_string(),
        source,
    })
}

// =============================================================================
// Glob
// =============================================================================

/// Match the whole of `path` against the glob `value`.
///
/// `*` matches any run of characters (including `/`), `?` exactly one.
pub fn matches_glob(path: &str, value: &str) -> bool {
    match compile_glob(value) {
        Ok(re) => re.is_match(path),
        Err(e) => {
            log::debug!("Skipping rule: {}", e);
            false
        }
    }
}

/// Translate a glob into an anchored regex source.
pub fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');

    let mut buf = [0u8; 4];
    for ch in glob.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            _ => out.push_str(&regex::escape(ch.encode_utf8(&mut buf))),
        }
    }

    out.push('$');
    out
}

fn compile_glob(value: &str) -> Result<Regex, PatternError> {
    Regex::new(&glob_to_regex(value)).map_err(|source| PatternError::Glob {
        pattern: value.to_string(),
        source,
    })
}
