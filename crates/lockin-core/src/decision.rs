//! Block decision
//!
//! schedule -> URL -> site -> rules -> list mode. Every step that cannot
//! proceed ends in `Allow`.

use crate::matcher::{find_site, matching_rule};
use crate::schedule::{is_within_schedule_at, Clock, SystemClock};
use crate::types::{Decision, ListType, Reason, Settings, Verdict};
use crate::url::parse_target;

/// Whether `url` should be blocked right now.
pub fn should_block(url: &str, settings: &Settings) -> bool {
    should_block_with_clock(url, settings, &SystemClock)
}

/// Whether `url` should be blocked at the clock's current time.
pub fn should_block_with_clock(url: &str, settings: &Settings, clock: &dyn Clock) -> bool {
    evaluate(url, settings, clock).is_block()
}

/// Evaluate `url` against a settings snapshot and explain the outcome.
pub fn evaluate(url: &str, settings: &Settings, clock: &dyn Clock) -> Verdict {
    if !is_within_schedule_at(&settings.schedule, clock.now()) {
        return Verdict::allow(Reason::OutsideSchedule);
    }

    let target = match parse_target(url) {
        Ok(target) => target,
        Err(e) => {
            log::debug!("Error parsing URL: {}", e);
            return Verdict::allow(Reason::InvalidUrl);
        }
    };

    let (site_index, site) = match find_site(&target.hostname, &settings.blocked_sites) {
        Some(found) => found,
        None => return Verdict::allow(Reason::NoMatchingSite),
    };

    let rule_index = matching_rule(&target.pathname, site);
    let hit = rule_index.is_some();

    let (decision, reason) = match (site.list_type, hit) {
        (ListType::Blacklist, true) => (Decision::Block, Reason::BlacklistHit),
        (ListType::Blacklist, false) => (Decision::Allow, Reason::BlacklistMiss),
        (ListType::Whitelist, true) => (Decision::Allow, Reason::WhitelistHit),
        (ListType::Whitelist, false) => (Decision::Block, Reason::WhitelistMiss),
    };

    Verdict {
        decision,
        reason,
        site_index: Some(site_index),
        rule_index,
    }
}
