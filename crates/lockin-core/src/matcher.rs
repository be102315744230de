//! Site lookup and rule matching
//!
//! The matcher only answers "does any rule hit this path". Whitelist and
//! blacklist semantics are applied by the decision layer, so one rule list
//! and one matcher serve both default postures.

use crate::pattern::matches_path;
use crate::types::SiteBlock;
use crate::url::host_matches_domain;

// =============================================================================
// Site Lookup
// =============================================================================

/// First configured site whose domain covers `hostname`.
///
/// `hostname` must already have its leading `www.` stripped. Overlapping
/// domain entries are not ranked; the first one in list order wins.
pub fn find_site<'a>(hostname: &str, sites: &'a [SiteBlock]) -> Option<(usize, &'a SiteBlock)> {
    sites
        .iter()
        .enumerate()
        .find(|(_, site)| host_matches_domain(hostname, &site.domain))
}

// =============================================================================
// Rule Matching
// =============================================================================

/// Whether at least one of the site's rules matches `pathname`.
///
/// A host outside the site's domain is never a hit.
pub fn match_site(hostname: &str, pathname: &str, site: &SiteBlock) -> bool {
    host_matches_domain(hostname, &site.domain) && matching_rule(pathname, site).is_some()
}

/// Index of the first rule in `site.paths` that matches `pathname`.
///
/// Rules are OR-ed; the index is only informative.
pub fn matching_rule(pathname: &str, site: &SiteBlock) -> Option<usize> {
    site.paths.iter().position(|rule| matches_path(pathname, rule))
}
