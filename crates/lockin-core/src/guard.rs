//! Navigation observers and block enforcement
//!
//! The content script re-checks the page on every navigation it can see.
//! Browsers with the Navigation API report everything through a single
//! `navigate` event; older ones need the history methods patched plus
//! `popstate`, `hashchange` and same-origin link clicks. The observer variant
//! is picked once at startup and the decision itself does not care which one
//! is active.

use crate::decision::evaluate;
use crate::schedule::Clock;
use crate::types::Settings;

// =============================================================================
// Navigation Events
// =============================================================================

/// A point at which the page URL may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationEvent {
    /// Content script started on a freshly loaded document
    InitialLoad,
    /// `history.pushState`
    PushState,
    /// `history.replaceState`
    ReplaceState,
    /// Back/forward navigation
    PopState,
    /// Fragment change
    HashChange,
    /// Same-origin link click, checked after the navigation settles
    LinkClick,
    /// Navigation API `navigate` event
    Navigate,
}

impl NavigationEvent {
    pub const ALL: [NavigationEvent; 7] = [
        Self::InitialLoad,
        Self::PushState,
        Self::ReplaceState,
        Self::PopState,
        Self::HashChange,
        Self::LinkClick,
        Self::Navigate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitialLoad => "load",
            Self::PushState => "pushstate",
            Self::ReplaceState => "replacestate",
            Self::PopState => "popstate",
            Self::HashChange => "hashchange",
            Self::LinkClick => "click",
            Self::Navigate => "navigate",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == s)
    }
}

// =============================================================================
// Observer Variants
// =============================================================================

/// How navigations are observed in the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObserverKind {
    /// Navigation API: one `navigate` event covers every same-document change
    NavigateEvent,
    /// Patched `pushState`/`replaceState` plus window listeners
    HistoryPatch,
}

impl ObserverKind {
    /// Pick the observer for the running browser.
    pub fn select(has_navigation_api: bool) -> Self {
        if has_navigation_api {
            Self::NavigateEvent
        } else {
            Self::HistoryPatch
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NavigateEvent => "navigate-event",
            Self::HistoryPatch => "history-patch",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "navigate-event" => Some(Self::NavigateEvent),
            "history-patch" => Some(Self::HistoryPatch),
            _ => None,
        }
    }

    /// Whether this observer reports `event`.
    pub fn observes(&self, event: NavigationEvent) -> bool {
        match (self, event) {
            (_, NavigationEvent::InitialLoad) => true,
            (Self::NavigateEvent, NavigationEvent::Navigate) => true,
            (Self::NavigateEvent, _) => false,
            (Self::HistoryPatch, NavigationEvent::Navigate) => false,
            (Self::HistoryPatch, _) => true,
        }
    }

    /// Events to subscribe to, in subscription order.
    pub fn events(&self) -> impl Iterator<Item = NavigationEvent> + '_ {
        NavigationEvent::ALL.into_iter().filter(move |e| self.observes(*e))
    }
}

// =============================================================================
// Enforcement
// =============================================================================

/// What the overlay renderer should draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOverlay {
    pub message: String,
    pub flash: bool,
}

/// Outcome of a navigation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enforcement {
    Allow,
    Block(BlockOverlay),
}

impl Enforcement {
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block(_))
    }
}

/// Decides what to do on each observed navigation.
///
/// Holds only the observer choice; settings arrive fresh with every event.
#[derive(Debug, Clone, Copy)]
pub struct NavigationGuard {
    observer: ObserverKind,
}

impl NavigationGuard {
    pub fn new(observer: ObserverKind) -> Self {
        Self { observer }
    }

    pub fn observer(&self) -> ObserverKind {
        self.observer
    }

    /// Check `url` after `event` against the current settings snapshot.
    pub fn on_navigation(
        &self,
        event: NavigationEvent,
        url: &str,
        settings: &Settings,
        clock: &dyn Clock,
    ) -> Enforcement {
        if !self.observer.observes(event) {
            log::trace!("Ignoring {} for {} observer", event.as_str(), self.observer.as_str());
            return Enforcement::Allow;
        }

        let verdict = evaluate(url, settings, clock);
        if !verdict.is_block() {
            return Enforcement::Allow;
        }

        log::debug!("Blocking {} after {} ({})", url, event.as_str(), verdict.reason.as_str());
        Enforcement::Block(BlockOverlay {
            message: settings.block_message().to_string(),
            flash: settings.flash_enabled,
        })
    }
}
